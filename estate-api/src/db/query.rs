//! Parameterized SQL assembly for filtered list endpoints.
//!
//! A [`QueryBuilder`] accumulates `WHERE` conditions together with their
//! bound values and numbers the placeholders itself. Every placeholder is
//! cast to the parameter's SQL type (`$3::bigint`), so binding never depends
//! on server-side type inference. The same builder renders the `COUNT(*)`
//! query and the page query, so both always see the same filters and the
//! same parameter list.

use chrono::{DateTime, NaiveDate, Utc};
use estate_core::{
    ActivityType, AgentStatus, ClientStatus, ClientType, CommunicationType, DealStage, DealType,
    Direction, DocumentType, InterestLevel, ListingType, PropertyStatus, PropertyType, RelatedTo,
    ShowingStatus, ShowingType, TaskPriority, TaskStatus, TaskType, UserRole,
};
use serde_json::Value as JsonValue;
use tokio_postgres::types::ToSql;

use crate::pagination::Pagination;

// ============================================================================
// SQL PARAMETER TYPE
// ============================================================================

/// Type-erased SQL parameter. `None` binds SQL `NULL` of the variant's type.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    BigInt(Option<i64>),
    Int(Option<i32>),
    Float(Option<f64>),
    Text(Option<String>),
    Bool(Option<bool>),
    Date(Option<NaiveDate>),
    Timestamp(Option<DateTime<Utc>>),
    TextArray(Option<Vec<String>>),
    Json(Option<JsonValue>),
}

impl SqlParam {
    /// Convert this SqlParam to a reference usable with tokio_postgres.
    pub fn as_to_sql(&self) -> &(dyn ToSql + Sync) {
        match self {
            SqlParam::BigInt(v) => v,
            SqlParam::Int(v) => v,
            SqlParam::Float(v) => v,
            SqlParam::Text(v) => v,
            SqlParam::Bool(v) => v,
            SqlParam::Date(v) => v,
            SqlParam::Timestamp(v) => v,
            SqlParam::TextArray(v) => v,
            SqlParam::Json(v) => v,
        }
    }

    /// SQL type the placeholder is cast to.
    pub fn sql_type(&self) -> &'static str {
        match self {
            SqlParam::BigInt(_) => "bigint",
            SqlParam::Int(_) => "int",
            SqlParam::Float(_) => "float8",
            SqlParam::Text(_) => "text",
            SqlParam::Bool(_) => "boolean",
            SqlParam::Date(_) => "date",
            SqlParam::Timestamp(_) => "timestamptz",
            SqlParam::TextArray(_) => "text[]",
            SqlParam::Json(_) => "jsonb",
        }
    }

    pub fn is_null(&self) -> bool {
        match self {
            SqlParam::BigInt(v) => v.is_none(),
            SqlParam::Int(v) => v.is_none(),
            SqlParam::Float(v) => v.is_none(),
            SqlParam::Text(v) => v.is_none(),
            SqlParam::Bool(v) => v.is_none(),
            SqlParam::Date(v) => v.is_none(),
            SqlParam::Timestamp(v) => v.is_none(),
            SqlParam::TextArray(v) => v.is_none(),
            SqlParam::Json(v) => v.is_none(),
        }
    }
}

crate::impl_sql_param!(
    i64 => BigInt,
    i32 => Int,
    f64 => Float,
    String => Text,
    bool => Bool,
    NaiveDate => Date,
    DateTime<Utc> => Timestamp,
    Vec<String> => TextArray,
    JsonValue => Json,
);

crate::impl_sql_param_enum!(
    UserRole,
    AgentStatus,
    PropertyType,
    ListingType,
    PropertyStatus,
    DocumentType,
    ClientType,
    ClientStatus,
    DealType,
    DealStage,
    ActivityType,
    ShowingType,
    ShowingStatus,
    InterestLevel,
    CommunicationType,
    Direction,
    TaskType,
    TaskPriority,
    TaskStatus,
    RelatedTo,
);

impl From<&str> for SqlParam {
    fn from(value: &str) -> Self {
        SqlParam::Text(Some(value.to_string()))
    }
}

impl From<Option<&str>> for SqlParam {
    fn from(value: Option<&str>) -> Self {
        SqlParam::Text(value.map(str::to_string))
    }
}

/// Borrow a parameter slice in the shape tokio_postgres expects.
pub fn as_params(params: &[SqlParam]) -> Vec<&(dyn ToSql + Sync)> {
    params.iter().map(SqlParam::as_to_sql).collect()
}

/// Typed placeholder for the `index`-th (1-based) parameter.
pub fn placeholder(index: usize, param: &SqlParam) -> String {
    format!("${}::{}", index, param.sql_type())
}

// ============================================================================
// SORTING
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// Lenient parse: anything other than `ASC` (any case) sorts descending.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_uppercase()) {
            Some(s) if s == "ASC" => SortOrder::Asc,
            _ => SortOrder::Desc,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

// ============================================================================
// QUERY BUILDER
// ============================================================================

/// Accumulates `AND`-joined conditions and their parameters.
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    conditions: Vec<String>,
    params: Vec<SqlParam>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a parameter and return its typed placeholder.
    pub fn bind(&mut self, param: impl Into<SqlParam>) -> String {
        let param = param.into();
        let ph = placeholder(self.params.len() + 1, &param);
        self.params.push(param);
        ph
    }

    /// Add a condition with no parameters.
    pub fn push(&mut self, condition: impl Into<String>) -> &mut Self {
        self.conditions.push(condition.into());
        self
    }

    /// Add a condition whose `{}` markers all refer to one bound parameter.
    pub fn and_where(&mut self, template: &str, param: impl Into<SqlParam>) -> &mut Self {
        let ph = self.bind(param);
        self.conditions.push(template.replace("{}", &ph));
        self
    }

    /// `column = value` when `value` is present.
    pub fn and_eq<V: Into<SqlParam>>(&mut self, column: &str, value: Option<V>) -> &mut Self {
        self.and_cmp(column, "=", value)
    }

    /// `column <op> value` when `value` is present.
    pub fn and_cmp<V: Into<SqlParam>>(
        &mut self,
        column: &str,
        op: &str,
        value: Option<V>,
    ) -> &mut Self {
        if let Some(value) = value {
            let ph = self.bind(value);
            self.conditions.push(format!("{} {} {}", column, op, ph));
        }
        self
    }

    /// Case-insensitive substring match of `term` against any of `columns`.
    ///
    /// All columns share one placeholder.
    pub fn and_search(&mut self, columns: &[&str], term: Option<&str>) -> &mut Self {
        let term = match term.map(str::trim) {
            Some(t) if !t.is_empty() => t,
            _ => return self,
        };
        let ph = self.bind(format!("%{}%", term));
        let ors: Vec<String> = columns
            .iter()
            .map(|column| format!("{} ILIKE {}", column, ph))
            .collect();
        self.conditions.push(format!("({})", ors.join(" OR ")));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn conditions(&self) -> &[String] {
        &self.conditions
    }

    /// `" WHERE a AND b"`, or an empty string when there are no conditions.
    pub fn where_clause(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.conditions.join(" AND "))
        }
    }

    /// `SELECT COUNT(*) FROM <from> [WHERE ...]`.
    pub fn count_sql(&self, from: &str) -> String {
        format!("SELECT COUNT(*) FROM {}{}", from, self.where_clause())
    }

    /// Page query. LIMIT and OFFSET are integer literals, so the page query
    /// binds exactly the same parameters as [`count_sql`](Self::count_sql).
    pub fn page_sql(&self, select_from: &str, order_by: &str, page: &Pagination) -> String {
        format!(
            "{}{} ORDER BY {} LIMIT {} OFFSET {}",
            select_from,
            self.where_clause(),
            order_by,
            page.limit(),
            page.offset()
        )
    }

    /// Unpaginated query with an optional row cap.
    pub fn select_sql(&self, select_from: &str, order_by: &str, limit: Option<i64>) -> String {
        let mut sql = format!("{}{} ORDER BY {}", select_from, self.where_clause(), order_by);
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }
        sql
    }

    pub fn params(&self) -> &[SqlParam] {
        &self.params
    }

    pub fn sql_params(&self) -> Vec<&(dyn ToSql + Sync)> {
        as_params(&self.params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_builder_has_no_where() {
        let qb = QueryBuilder::new();
        assert_eq!(qb.where_clause(), "");
        assert_eq!(qb.count_sql("tasks t"), "SELECT COUNT(*) FROM tasks t");
        assert!(qb.params().is_empty());
    }

    #[test]
    fn test_placeholders_are_numbered_and_typed() {
        let mut qb = QueryBuilder::new();
        qb.and_eq("p.status", Some(PropertyStatus::Available))
            .and_eq::<i64>("p.agent_id", None)
            .and_cmp("p.price", ">=", Some(250_000.0_f64))
            .and_cmp("p.bedrooms", "<=", Some(4_i32));

        assert_eq!(
            qb.where_clause(),
            " WHERE p.status = $1::text AND p.price >= $2::float8 AND p.bedrooms <= $3::int"
        );
        assert_eq!(qb.params().len(), 3);
        assert_eq!(qb.params()[0], SqlParam::Text(Some("available".to_string())));
    }

    #[test]
    fn test_search_reuses_one_placeholder() {
        let mut qb = QueryBuilder::new();
        qb.and_eq("c.status", Some(ClientStatus::Lead))
            .and_search(&["c.first_name", "c.last_name", "c.email"], Some("  smith "));

        assert_eq!(
            qb.conditions()[1],
            "(c.first_name ILIKE $2::text OR c.last_name ILIKE $2::text OR c.email ILIKE $2::text)"
        );
        assert_eq!(qb.params()[1], SqlParam::Text(Some("%smith%".to_string())));
    }

    #[test]
    fn test_blank_search_is_ignored() {
        let mut qb = QueryBuilder::new();
        qb.and_search(&["u.email"], Some("   ")).and_search(&["u.email"], None);
        assert!(qb.is_empty());
    }

    #[test]
    fn test_count_and_page_share_parameters() {
        let mut qb = QueryBuilder::new();
        qb.and_eq("t.status", Some(TaskStatus::Pending))
            .and_eq("t.assigned_to", Some(7_i64));

        let page = Pagination::new(2, 10);
        let count = qb.count_sql("tasks t");
        let rows = qb.page_sql("SELECT t.* FROM tasks t", "t.created_at DESC", &page);

        assert_eq!(
            count,
            "SELECT COUNT(*) FROM tasks t WHERE t.status = $1::text AND t.assigned_to = $2::bigint"
        );
        assert_eq!(
            rows,
            "SELECT t.* FROM tasks t WHERE t.status = $1::text AND t.assigned_to = $2::bigint \
             ORDER BY t.created_at DESC LIMIT 10 OFFSET 10"
        );
        assert_eq!(qb.sql_params().len(), 2);
    }

    #[test]
    fn test_and_where_template() {
        let mut qb = QueryBuilder::new();
        qb.push("s.status = 'scheduled'")
            .and_where("s.scheduled_date >= {}", Utc::now());
        assert_eq!(
            qb.where_clause(),
            " WHERE s.status = 'scheduled' AND s.scheduled_date >= $1::timestamptz"
        );
    }

    #[test]
    fn test_null_params() {
        let p: SqlParam = Option::<i64>::None.into();
        assert!(p.is_null());
        assert_eq!(p.sql_type(), "bigint");
        let p: SqlParam = Some(DealStage::ClosedWon).into();
        assert_eq!(p, SqlParam::Text(Some("closed_won".to_string())));
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!(SortOrder::parse(Some("asc")), SortOrder::Asc);
        assert_eq!(SortOrder::parse(Some("ASC")), SortOrder::Asc);
        assert_eq!(SortOrder::parse(Some("DESC")), SortOrder::Desc);
        assert_eq!(SortOrder::parse(Some("sideways")), SortOrder::Desc);
        assert_eq!(SortOrder::parse(None), SortOrder::Desc);
    }
}
