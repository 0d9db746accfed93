//! `users` table: authentication lookups and user administration.

use estate_core::{UserId, UserRole};

use super::{delete_by_id, exists, query_json_opt, query_page, DbClient, QueryBuilder};
use crate::auth::AuthContext;
use crate::error::ApiResult;
use crate::pagination::Pagination;
use crate::response::Paginated;
use crate::types::{AgentRow, UserCredentials, UserDetail, UserFilter, UserListItem, UserRow};
use crate::validation::non_blank;

const USER_COLUMNS: &str = "u.id, u.email, u.role, u.created_at, u.updated_at";

/// Agent profile created alongside a new user.
#[derive(Debug, Clone, Copy)]
pub struct NewAgentProfile<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
}

impl DbClient {
    /// Resolve the caller behind a token. `None` when the user is gone.
    pub async fn user_auth_context(&self, user_id: UserId) -> ApiResult<Option<AuthContext>> {
        let conn = self.get_conn().await?;
        query_json_opt(
            &**conn,
            "SELECT u.id AS user_id, u.email, u.role, a.id AS agent_id
             FROM users u LEFT JOIN agents a ON a.user_id = u.id
             WHERE u.id = $1",
            &[&user_id],
        )
        .await
    }

    pub async fn user_credentials(&self, email: &str) -> ApiResult<Option<UserCredentials>> {
        let conn = self.get_conn().await?;
        query_json_opt(
            &**conn,
            "SELECT id, email, password_hash, role FROM users WHERE email = $1",
            &[&email],
        )
        .await
    }

    pub async fn user_credentials_by_id(&self, id: UserId) -> ApiResult<Option<UserCredentials>> {
        let conn = self.get_conn().await?;
        query_json_opt(
            &**conn,
            "SELECT id, email, password_hash, role FROM users WHERE id = $1",
            &[&id],
        )
        .await
    }

    pub async fn user_email_taken(&self, email: &str) -> ApiResult<bool> {
        let conn = self.get_conn().await?;
        Ok(conn
            .query_opt("SELECT 1 FROM users WHERE email = $1", &[&email])
            .await?
            .is_some())
    }

    /// Insert a user and, when requested, its agent profile in one transaction.
    pub async fn user_register(
        &self,
        email: &str,
        password_hash: &str,
        role: UserRole,
        profile: Option<NewAgentProfile<'_>>,
    ) -> ApiResult<UserRow> {
        let mut conn = self.get_conn().await?;
        let tx = conn.transaction().await?;

        let user: UserRow = super::query_json_one(
            &*tx,
            "INSERT INTO users (email, password_hash, role) VALUES ($1, $2, $3)
             RETURNING id, email, role, created_at, updated_at",
            &[&email, &password_hash, &role.as_db_str()],
        )
        .await?;

        if let Some(profile) = profile {
            tx.execute(
                "INSERT INTO agents (user_id, first_name, last_name) VALUES ($1, $2, $3)",
                &[&user.id, &profile.first_name, &profile.last_name],
            )
            .await?;
        }

        tx.commit().await?;
        tracing::info!(user_id = user.id, role = %user.role, "User registered");
        Ok(user)
    }

    pub async fn user_get(&self, id: UserId) -> ApiResult<Option<UserRow>> {
        let conn = self.get_conn().await?;
        query_json_opt(
            &**conn,
            &format!("SELECT {} FROM users u WHERE u.id = $1", USER_COLUMNS),
            &[&id],
        )
        .await
    }

    /// The user plus their agent profile.
    pub async fn user_detail(&self, id: UserId) -> ApiResult<Option<UserDetail>> {
        let Some(user) = self.user_get(id).await? else {
            return Ok(None);
        };
        let agent: Option<AgentRow> = self.agent_by_user(id).await?;
        Ok(Some(UserDetail { user, agent }))
    }

    pub async fn user_set_password(&self, id: UserId, password_hash: &str) -> ApiResult<()> {
        let conn = self.get_conn().await?;
        conn.execute(
            "UPDATE users SET password_hash = $1 WHERE id = $2",
            &[&password_hash, &id],
        )
        .await?;
        Ok(())
    }

    pub async fn user_list(
        &self,
        filter: &UserFilter,
        page: &Pagination,
    ) -> ApiResult<Paginated<UserListItem>> {
        let mut qb = QueryBuilder::new();
        qb.and_eq("u.role", non_blank(filter.role.as_deref()))
            .and_search(&["u.email"], filter.search.as_deref());

        let conn = self.get_conn().await?;
        query_page(
            &**conn,
            &qb,
            &format!("{}, a.id AS agent_id, a.first_name, a.last_name", USER_COLUMNS),
            "users u LEFT JOIN agents a ON a.user_id = u.id",
            "u.created_at DESC",
            page,
        )
        .await
    }

    /// COALESCE update. `None` when the user does not exist.
    pub async fn user_update(
        &self,
        id: UserId,
        email: Option<&str>,
        role: Option<UserRole>,
        password_hash: Option<&str>,
    ) -> ApiResult<Option<UserRow>> {
        let conn = self.get_conn().await?;
        let role = role.map(|r| r.as_db_str());
        query_json_opt(
            &**conn,
            "UPDATE users SET
                email = COALESCE($1, email),
                role = COALESCE($2, role),
                password_hash = COALESCE($3, password_hash)
             WHERE id = $4
             RETURNING id, email, role, created_at, updated_at",
            &[&email, &role, &password_hash, &id],
        )
        .await
    }

    pub async fn user_delete(&self, id: UserId) -> ApiResult<bool> {
        let conn = self.get_conn().await?;
        delete_by_id(&**conn, "users", id).await
    }

    pub async fn user_exists(&self, id: UserId) -> ApiResult<bool> {
        let conn = self.get_conn().await?;
        exists(&**conn, "users", id).await
    }
}
