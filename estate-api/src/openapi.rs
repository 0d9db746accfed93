//! OpenAPI Specification for the EstateHub API
//!
//! Built by utoipa from the route annotations. Served as JSON at
//! `/api/openapi.json` and rendered by Swagger UI at `/docs`.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error::{ErrorCode, ErrorResponse};
use crate::pagination::PaginationMeta;
use crate::routes::{
    agent, auth, client, communication, dashboard, deal, health, property, showing, task, user,
};
use crate::telemetry::metrics;

use estate_core::{
    ActivityType, AgentStatus, ClientStatus, ClientType, CommunicationType, DealStage, DealType,
    Direction, DocumentType, InterestLevel, ListingType, PropertyStatus, PropertyType, RelatedTo,
    ShowingStatus, ShowingType, StatsPeriod, TaskPriority, TaskStatus, TaskType, UserRole,
};

/// OpenAPI document for the EstateHub API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "EstateHub API",
        description = "Real-estate CRM: listings, clients, deals, showings, communications and tasks",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:5000", description = "Local Development")
    ),
    tags(
        (name = "Auth", description = "Registration, login and the current user"),
        (name = "Users", description = "User administration (admin only)"),
        (name = "Agents", description = "Agent profiles and performance"),
        (name = "Properties", description = "Listings with photos and documents"),
        (name = "Clients", description = "Buyers, sellers, renters and landlords"),
        (name = "Deals", description = "Deals and the stage pipeline"),
        (name = "Showings", description = "Property showings and feedback"),
        (name = "Communications", description = "Client communication log"),
        (name = "Tasks", description = "Agent to-dos"),
        (name = "Dashboard", description = "Read-only aggregates"),
        (name = "Observability", description = "Health and metrics")
    ),
    paths(
        // === Auth ===
        auth::register,
        auth::login,
        auth::me,
        auth::change_password,

        // === Users ===
        user::list_users,
        user::get_user,
        user::update_user,
        user::delete_user,

        // === Agents ===
        agent::list_agents,
        agent::get_agent,
        agent::get_agent_stats,
        agent::create_agent,
        agent::update_agent,
        agent::delete_agent,

        // === Properties ===
        property::list_properties,
        property::get_property,
        property::create_property,
        property::update_property,
        property::delete_property,
        property::add_photo,
        property::delete_photo,
        property::add_document,
        property::delete_document,

        // === Clients ===
        client::list_clients,
        client::get_client,
        client::create_client,
        client::update_client,
        client::delete_client,
        client::assign_agent,
        client::update_lead_score,

        // === Deals ===
        deal::list_deals,
        deal::get_pipeline,
        deal::get_deal,
        deal::create_deal,
        deal::update_deal,
        deal::update_stage,
        deal::delete_deal,
        deal::list_activities,
        deal::add_activity,

        // === Showings ===
        showing::list_showings,
        showing::upcoming_showings,
        showing::agent_schedule,
        showing::get_showing,
        showing::create_showing,
        showing::update_showing,
        showing::cancel_showing,
        showing::add_feedback,

        // === Communications ===
        communication::list_communications,
        communication::communication_summary,
        communication::client_communications,
        communication::get_communication,
        communication::create_communication,
        communication::update_communication,
        communication::delete_communication,

        // === Tasks ===
        task::list_tasks,
        task::my_tasks,
        task::overdue_tasks,
        task::get_task,
        task::create_task,
        task::update_task,
        task::complete_task,
        task::delete_task,

        // === Dashboard ===
        dashboard::overview,
        dashboard::pipeline,
        dashboard::agent_performance,
        dashboard::recent_activity,
        dashboard::property_stats,
        dashboard::sales_stats,

        // === Observability ===
        health::health,
        metrics::metrics_handler,
    ),
    components(
        schemas(
            ErrorResponse, ErrorCode, PaginationMeta,

            // === Domain enums ===
            UserRole, AgentStatus, PropertyType, ListingType, PropertyStatus, DocumentType,
            ClientType, ClientStatus, DealType, DealStage, ActivityType, ShowingType,
            ShowingStatus, InterestLevel, CommunicationType, Direction, TaskType,
            TaskPriority, TaskStatus, RelatedTo, StatsPeriod
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` JWT scheme referenced by protected routes.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT from /api/auth/login or /api/auth/register"))
                        .build(),
                ),
            );
        }
    }
}

impl ApiDoc {
    /// The document as pretty-printed JSON.
    pub fn to_json() -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&Self::openapi())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_generation() -> Result<(), String> {
        let openapi = ApiDoc::openapi();

        assert_eq!(openapi.info.title, "EstateHub API");

        let tags = openapi
            .tags
            .as_ref()
            .ok_or_else(|| "OpenAPI tags missing".to_string())?;
        assert!(tags.len() >= 11);

        let components = openapi
            .components
            .as_ref()
            .ok_or_else(|| "OpenAPI components missing".to_string())?;
        assert!(components.security_schemes.contains_key("bearer_auth"));
        assert!(components.schemas.contains_key("ErrorResponse"));
        assert!(components.schemas.contains_key("DealStage"));
        Ok(())
    }

    #[test]
    fn test_openapi_json_serialization() -> Result<(), String> {
        let json = ApiDoc::to_json().map_err(|e| format!("Failed to serialize OpenAPI: {}", e))?;
        serde_json::from_str::<serde_json::Value>(&json)
            .map_err(|e| format!("Generated JSON invalid: {}", e))?;
        assert!(json.contains("EstateHub API"));
        assert!(json.contains("\"bearer_auth\""));
        Ok(())
    }

    fn schema_json<T: utoipa::PartialSchema>() -> Result<serde_json::Value, String> {
        serde_json::to_value(T::schema()).map_err(|e| e.to_string())
    }

    #[test]
    fn test_dates_are_documented_as_strings() -> Result<(), String> {
        let deal = schema_json::<crate::types::DealRow>()?;
        assert_eq!(deal["properties"]["created_at"]["type"], "string");
        assert_eq!(deal["properties"]["created_at"]["format"], "date-time");
        assert_eq!(deal["properties"]["actual_close_date"]["format"], "date");

        let health = schema_json::<crate::routes::health::HealthResponse>()?;
        assert_eq!(health["properties"]["timestamp"]["format"], "date-time");
        Ok(())
    }

    #[test]
    fn test_date_filters_are_documented_as_strings() -> Result<(), String> {
        use utoipa::openapi::path::ParameterIn;
        use utoipa::IntoParams;

        let params = crate::types::ShowingFilter::into_params(|| Some(ParameterIn::Query));
        let date_from = params
            .iter()
            .find(|p| p.name == "date_from")
            .ok_or_else(|| "date_from parameter missing".to_string())?;
        let json = serde_json::to_value(date_from).map_err(|e| e.to_string())?;
        assert_eq!(json["in"], "query");
        assert_eq!(json["schema"]["format"], "date-time");
        Ok(())
    }

    #[test]
    fn test_openapi_paths_exist() {
        let openapi = ApiDoc::openapi();
        let paths = &openapi.paths.paths;

        for path in [
            "/api/auth/register",
            "/api/auth/login",
            "/api/users",
            "/api/agents/{id}/stats",
            "/api/properties/{id}/photos",
            "/api/properties/{id}/documents/{docId}",
            "/api/clients/{id}/assign-agent",
            "/api/deals/{id}/stage",
            "/api/deals/pipeline",
            "/api/showings/agent/{agentId}/schedule",
            "/api/communications/client/{clientId}",
            "/api/tasks/my-tasks",
            "/api/dashboard/sales-stats",
            "/api/health",
            "/metrics",
        ] {
            assert!(paths.contains_key(path), "missing path {}", path);
        }
    }
}
