//! Dashboard REST API Routes
//!
//! Read-only aggregates for the CRM home screen.

use axum::{extract::State, response::IntoResponse, routing::get, Router};
use estate_core::StatsPeriod;

use crate::{
    db::DbClient,
    error::ApiResult,
    extractors::ApiQuery,
    response::ApiResponse,
    state::AppState,
    types::{
        ActivityFeedItem, AgentPerformance, AgentScope, DashboardOverview, PeriodQuery,
        PipelineStage, PropertyStats, RecentActivityQuery, SalesBucket,
    },
};

/// GET /api/dashboard/overview - Headline counters
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/dashboard/overview",
    tag = "Dashboard",
    params(AgentScope),
    responses((status = 200, description = "Overview counters", body = DashboardOverview)),
    security(("bearer_auth" = []))
))]
pub async fn overview(
    State(db): State<DbClient>,
    ApiQuery(scope): ApiQuery<AgentScope>,
) -> ApiResult<impl IntoResponse> {
    Ok(ApiResponse::data(db.dashboard_overview(scope.agent_id).await?))
}

/// GET /api/dashboard/pipeline
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/dashboard/pipeline",
    tag = "Dashboard",
    params(AgentScope),
    responses((status = 200, description = "Stages in pipeline order", body = Vec<PipelineStage>)),
    security(("bearer_auth" = []))
))]
pub async fn pipeline(
    State(db): State<DbClient>,
    ApiQuery(scope): ApiQuery<AgentScope>,
) -> ApiResult<impl IntoResponse> {
    Ok(ApiResponse::data(db.deal_pipeline(scope.agent_id).await?))
}

/// GET /api/dashboard/agent-performance - Top agents by closed deals
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/dashboard/agent-performance",
    tag = "Dashboard",
    params(PeriodQuery),
    responses((status = 200, description = "Top ten active agents", body = Vec<AgentPerformance>)),
    security(("bearer_auth" = []))
))]
pub async fn agent_performance(
    State(db): State<DbClient>,
    ApiQuery(query): ApiQuery<PeriodQuery>,
) -> ApiResult<impl IntoResponse> {
    Ok(ApiResponse::data(
        db.dashboard_agent_performance(query.period()).await?,
    ))
}

/// GET /api/dashboard/recent-activity - Merged activity feed
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/dashboard/recent-activity",
    tag = "Dashboard",
    params(RecentActivityQuery),
    responses((status = 200, description = "Newest items first", body = Vec<ActivityFeedItem>)),
    security(("bearer_auth" = []))
))]
pub async fn recent_activity(
    State(db): State<DbClient>,
    ApiQuery(query): ApiQuery<RecentActivityQuery>,
) -> ApiResult<impl IntoResponse> {
    let feed = db
        .dashboard_recent_activity(query.limit(), query.per_source())
        .await?;
    Ok(ApiResponse::data(feed))
}

/// GET /api/dashboard/property-stats
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/dashboard/property-stats",
    tag = "Dashboard",
    responses((status = 200, description = "Inventory breakdowns", body = PropertyStats)),
    security(("bearer_auth" = []))
))]
pub async fn property_stats(State(db): State<DbClient>) -> ApiResult<impl IntoResponse> {
    Ok(ApiResponse::data(db.dashboard_property_stats().await?))
}

/// GET /api/dashboard/sales-stats - Closed-won deals per bucket (default: year)
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/dashboard/sales-stats",
    tag = "Dashboard",
    params(PeriodQuery),
    responses((status = 200, description = "Sales buckets", body = Vec<SalesBucket>)),
    security(("bearer_auth" = []))
))]
pub async fn sales_stats(
    State(db): State<DbClient>,
    ApiQuery(query): ApiQuery<PeriodQuery>,
) -> ApiResult<impl IntoResponse> {
    let period = query.period().unwrap_or(StatsPeriod::Year);
    Ok(ApiResponse::data(db.dashboard_sales_stats(period).await?))
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/overview", get(overview))
        .route("/pipeline", get(pipeline))
        .route("/agent-performance", get(agent_performance))
        .route("/recent-activity", get(recent_activity))
        .route("/property-stats", get(property_stats))
        .route("/sales-stats", get(sales_stats))
}
