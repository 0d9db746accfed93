//! Property-related API types

use estate_core::{
    AgentId, Date, DocumentType, InterestLevel, ListingType, PropertyId, PropertyStatus,
    PropertyType, ShowingId, ShowingStatus, Timestamp, UserId,
};
use serde::{Deserialize, Serialize};

use super::{lenient_date, lenient_f64, lenient_i32, lenient_i64};
use crate::error::ApiResult;
use crate::validation::{self, RequiredFields, ValidateRange};

/// A `properties` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PropertyRow {
    pub id: PropertyId,
    pub mls_number: Option<String>,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub property_type: PropertyType,
    pub listing_type: ListingType,
    pub status: PropertyStatus,
    pub price: f64,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<f64>,
    pub square_feet: Option<i32>,
    pub lot_size: Option<f64>,
    pub year_built: Option<i32>,
    pub description: Option<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub features: Option<serde_json::Value>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date"))]
    pub listing_date: Date,
    pub days_on_market: i32,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date"))]
    pub sold_date: Option<Date>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date-time"))]
    pub last_modified_date: Option<Timestamp>,
    pub agent_id: Option<AgentId>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PropertyListItem {
    #[serde(flatten)]
    pub property: PropertyRow,
    pub agent_first_name: Option<String>,
    pub agent_last_name: Option<String>,
    /// URL of the primary photo, if one is flagged.
    pub primary_photo: Option<String>,
    pub photo_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PropertyDetail {
    #[serde(flatten)]
    pub property: PropertyRow,
    pub agent_first_name: Option<String>,
    pub agent_last_name: Option<String>,
    pub agent_phone: Option<String>,
    pub agent_photo: Option<String>,
    pub agent_email: Option<String>,
    #[serde(default)]
    pub photos: Vec<PropertyPhoto>,
    #[serde(default)]
    pub documents: Vec<PropertyDocument>,
    /// Ten most recent showings.
    #[serde(default)]
    pub showings: Vec<PropertyShowing>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PropertyPhoto {
    pub id: i64,
    pub property_id: PropertyId,
    pub url: String,
    pub caption: Option<String>,
    pub is_primary: bool,
    pub display_order: i32,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PropertyDocument {
    pub id: i64,
    pub property_id: PropertyId,
    pub document_type: Option<DocumentType>,
    pub file_name: String,
    pub file_url: String,
    pub uploaded_by: Option<UserId>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub uploaded_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PropertyShowing {
    pub id: ShowingId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub scheduled_date: Timestamp,
    pub status: ShowingStatus,
    pub feedback: Option<String>,
    pub interest_level: Option<InterestLevel>,
    pub client_first_name: Option<String>,
    pub client_last_name: Option<String>,
}

// ============================================================================
// REQUESTS
// ============================================================================

/// Fields shared by create and update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PropertyFields {
    pub mls_number: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub country: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub longitude: Option<f64>,
    pub property_type: Option<String>,
    pub listing_type: Option<String>,
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_i32")]
    pub bedrooms: Option<i32>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub bathrooms: Option<f64>,
    #[serde(default, deserialize_with = "lenient_i32")]
    pub square_feet: Option<i32>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub lot_size: Option<f64>,
    #[serde(default, deserialize_with = "lenient_i32")]
    pub year_built: Option<i32>,
    pub description: Option<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub features: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "lenient_date")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date"))]
    pub listing_date: Option<Date>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub agent_id: Option<AgentId>,
}

impl PropertyFields {
    fn validate_values(&self) -> ApiResult<()> {
        validation::parse_enum::<PropertyType>(self.property_type.as_deref())?;
        validation::parse_enum::<ListingType>(self.listing_type.as_deref())?;
        validation::parse_enum::<PropertyStatus>(self.status.as_deref())?;
        self.price.validate_positive("price")?;
        Ok(())
    }

    /// `features` with JSON null treated as absent.
    pub fn features(&self) -> Option<serde_json::Value> {
        self.features.clone().filter(|v| !v.is_null())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreatePropertyRequest {
    #[serde(flatten)]
    pub fields: PropertyFields,
}

impl CreatePropertyRequest {
    pub fn validate(&self) -> ApiResult<()> {
        let f = &self.fields;
        RequiredFields::new()
            .check("address", &f.address)
            .check("city", &f.city)
            .check("state", &f.state)
            .check("zip_code", &f.zip_code)
            .check("property_type", &f.property_type)
            .check("listing_type", &f.listing_type)
            .check("price", &f.price)
            .check("listing_date", &f.listing_date)
            .finish()?;
        f.validate_values()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdatePropertyRequest {
    #[serde(flatten)]
    pub fields: PropertyFields,
    #[serde(default, deserialize_with = "lenient_date")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date"))]
    pub sold_date: Option<Date>,
}

impl UpdatePropertyRequest {
    pub fn validate(&self) -> ApiResult<()> {
        self.fields.validate_values()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AddPhotoRequest {
    pub url: Option<String>,
    pub caption: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_primary: Option<bool>,
    #[serde(default, deserialize_with = "lenient_i32")]
    pub display_order: Option<i32>,
}

impl AddPhotoRequest {
    pub fn validate(&self) -> ApiResult<()> {
        if validation::non_blank(self.url.as_deref()).is_none() {
            return Err(estate_core::ValidationError::invalid("Photo URL is required").into());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AddDocumentRequest {
    pub document_type: Option<String>,
    pub file_name: Option<String>,
    pub file_url: Option<String>,
}

impl AddDocumentRequest {
    pub fn validate(&self) -> ApiResult<()> {
        if validation::non_blank(self.file_name.as_deref()).is_none()
            || validation::non_blank(self.file_url.as_deref()).is_none()
        {
            return Err(
                estate_core::ValidationError::invalid("File name and URL are required").into(),
            );
        }
        validation::parse_enum::<DocumentType>(self.document_type.as_deref())?;
        Ok(())
    }
}

/// Multipart forms send booleans as `"true"` / `"false"`.
fn lenient_bool<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    use serde::de::Error;
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::Bool(b) => Ok(Some(b)),
        serde_json::Value::String(s) => match s.trim() {
            "" => Ok(None),
            "true" | "1" | "on" => Ok(Some(true)),
            "false" | "0" | "off" => Ok(Some(false)),
            other => Err(D::Error::custom(format!("invalid boolean: {}", other))),
        },
        serde_json::Value::Number(n) => Ok(Some(n.as_i64() != Some(0))),
        other => Err(D::Error::custom(format!("invalid boolean: {}", other))),
    }
}

pub(crate) fn parse_bool_field(raw: &str) -> Option<bool> {
    match raw.trim() {
        "true" | "1" | "on" => Some(true),
        "false" | "0" | "off" => Some(false),
        _ => None,
    }
}

// ============================================================================
// FILTERS
// ============================================================================

/// Columns a property listing may be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PropertySort {
    Price,
    #[default]
    CreatedAt,
    ListingDate,
    Bedrooms,
    SquareFeet,
    DaysOnMarket,
}

impl PropertySort {
    /// Unknown columns fall back to `created_at`.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("price") => Self::Price,
            Some("listing_date") => Self::ListingDate,
            Some("bedrooms") => Self::Bedrooms,
            Some("square_feet") => Self::SquareFeet,
            Some("days_on_market") => Self::DaysOnMarket,
            _ => Self::CreatedAt,
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            Self::Price => "p.price",
            Self::CreatedAt => "p.created_at",
            Self::ListingDate => "p.listing_date",
            Self::Bedrooms => "p.bedrooms",
            Self::SquareFeet => "p.square_feet",
            Self::DaysOnMarket => "p.days_on_market",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct PropertyFilter {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub status: Option<String>,
    pub property_type: Option<String>,
    pub listing_type: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub min_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub max_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_i32")]
    pub min_bedrooms: Option<i32>,
    #[serde(default, deserialize_with = "lenient_i32")]
    pub max_bedrooms: Option<i32>,
    #[serde(default, deserialize_with = "lenient_i32")]
    pub min_sqft: Option<i32>,
    #[serde(default, deserialize_with = "lenient_i32")]
    pub max_sqft: Option<i32>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub agent_id: Option<AgentId>,
    /// Matches address, city or MLS number.
    pub search: Option<String>,
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,
    #[serde(rename = "sortOrder")]
    pub sort_order: Option<String>,
}
