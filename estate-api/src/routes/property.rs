//! Property REST API Routes
//!
//! Listing and detail reads are public; a valid token is attached when sent.
//! Everything else, including the photo and document sub-resources, needs
//! an authenticated caller. Photos and documents take either a JSON body
//! with a URL or a multipart upload.

use std::sync::Arc;

use axum::{
    extract::State,
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::{delete, get, post},
    Router,
};

use crate::{
    config::ApiConfig,
    db::DbClient,
    error::{ApiError, ApiResult, ErrorResponse},
    extractors::{ApiJson, ApiQuery, PathId, PathIds},
    middleware::{auth_middleware, optional_auth_middleware, AuthExtractor, AuthMiddlewareState},
    pagination::Pagination,
    response::{created, ApiResponse},
    state::AppState,
    types::{
        parse_bool_field, AddDocumentRequest, AddPhotoRequest, CreatePropertyRequest,
        PropertyDetail, PropertyDocument, PropertyFilter, PropertyListItem, PropertyPhoto,
        PropertyRow, UpdatePropertyRequest,
    },
    uploads::{read_upload_form, store_upload, JsonOrMultipart, UploadKind},
};

async fn ensure_property(db: &DbClient, id: i64) -> ApiResult<()> {
    if !db.property_exists(id).await? {
        return Err(ApiError::not_found("Property not found"));
    }
    Ok(())
}

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// GET /api/properties - List properties
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/properties",
    tag = "Properties",
    params(PropertyFilter),
    responses(
        (status = 200, description = "Paginated properties", body = Vec<PropertyListItem>),
        (status = 400, description = "Invalid filter", body = ErrorResponse),
    )
))]
pub async fn list_properties(
    State(db): State<DbClient>,
    ApiQuery(filter): ApiQuery<PropertyFilter>,
) -> ApiResult<impl IntoResponse> {
    let page = Pagination::from_query(filter.page.as_deref(), filter.limit.as_deref());
    db.property_list(&filter, &page).await
}

/// GET /api/properties/:id - Property with photos, documents and showings
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/properties/{id}",
    tag = "Properties",
    params(("id" = i64, Path, description = "Property id")),
    responses(
        (status = 200, description = "Property found", body = PropertyDetail),
        (status = 404, description = "Property not found", body = ErrorResponse),
    )
))]
pub async fn get_property(
    State(db): State<DbClient>,
    PathId(id): PathId,
) -> ApiResult<impl IntoResponse> {
    let property = db
        .property_detail(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Property not found"))?;
    Ok(ApiResponse::data(property))
}

/// POST /api/properties - Create a listing
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/api/properties",
    tag = "Properties",
    request_body = CreatePropertyRequest,
    responses(
        (status = 201, description = "Property created successfully", body = PropertyRow),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
))]
pub async fn create_property(
    State(db): State<DbClient>,
    ApiJson(req): ApiJson<CreatePropertyRequest>,
) -> ApiResult<impl IntoResponse> {
    req.validate()?;
    let property = db.property_create(&req).await?;
    Ok(created(property, "Property created successfully"))
}

/// PUT /api/properties/:id - Update a listing
#[cfg_attr(feature = "openapi", utoipa::path(
    put,
    path = "/api/properties/{id}",
    tag = "Properties",
    params(("id" = i64, Path, description = "Property id")),
    request_body = UpdatePropertyRequest,
    responses(
        (status = 200, description = "Property updated successfully", body = PropertyRow),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Property not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
))]
pub async fn update_property(
    State(db): State<DbClient>,
    PathId(id): PathId,
    ApiJson(req): ApiJson<UpdatePropertyRequest>,
) -> ApiResult<impl IntoResponse> {
    req.validate()?;
    let property = db
        .property_update(id, &req)
        .await?
        .ok_or_else(|| ApiError::not_found("Property not found"))?;
    Ok(ApiResponse::data(property).with_message("Property updated successfully"))
}

/// DELETE /api/properties/:id - Remove a listing
#[cfg_attr(feature = "openapi", utoipa::path(
    delete,
    path = "/api/properties/{id}",
    tag = "Properties",
    params(("id" = i64, Path, description = "Property id")),
    responses(
        (status = 200, description = "Property deleted successfully"),
        (status = 404, description = "Property not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
))]
pub async fn delete_property(
    State(db): State<DbClient>,
    PathId(id): PathId,
) -> ApiResult<impl IntoResponse> {
    if !db.property_delete(id).await? {
        return Err(ApiError::not_found("Property not found"));
    }
    Ok(ApiResponse::message("Property deleted successfully"))
}

/// POST /api/properties/:id/photos - Attach a photo by URL or upload
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/api/properties/{id}/photos",
    tag = "Properties",
    params(("id" = i64, Path, description = "Property id")),
    request_body(
        content = AddPhotoRequest,
        description = "JSON body, or multipart/form-data with a `photo` file field"
    ),
    responses(
        (status = 201, description = "Photo added successfully", body = PropertyPhoto),
        (status = 400, description = "Missing URL or rejected upload", body = ErrorResponse),
        (status = 404, description = "Property not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
))]
pub async fn add_photo(
    State(db): State<DbClient>,
    State(config): State<Arc<ApiConfig>>,
    PathId(id): PathId,
    body: JsonOrMultipart<AddPhotoRequest>,
) -> ApiResult<impl IntoResponse> {
    ensure_property(&db, id).await?;

    let req = match body {
        JsonOrMultipart::Json(req) => req,
        JsonOrMultipart::Multipart(multipart) => {
            let form = read_upload_form(multipart, UploadKind::Photo).await?;
            let url = match form.file.clone() {
                Some(file) => Some(store_upload(&config.upload_dir, UploadKind::Photo, file).await?.url),
                None => form.text("url"),
            };
            AddPhotoRequest {
                url,
                caption: form.text("caption"),
                is_primary: form.text("is_primary").as_deref().and_then(parse_bool_field),
                display_order: form.text("display_order").and_then(|v| v.parse().ok()),
            }
        }
    };
    req.validate()?;

    let photo = db.property_add_photo(id, &req).await?;
    Ok(created(photo, "Photo added successfully"))
}

/// DELETE /api/properties/:id/photos/:photoId
#[cfg_attr(feature = "openapi", utoipa::path(
    delete,
    path = "/api/properties/{id}/photos/{photoId}",
    tag = "Properties",
    params(
        ("id" = i64, Path, description = "Property id"),
        ("photoId" = i64, Path, description = "Photo id"),
    ),
    responses(
        (status = 200, description = "Photo deleted successfully"),
        (status = 404, description = "Photo not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
))]
pub async fn delete_photo(
    State(db): State<DbClient>,
    PathIds(id, photo_id): PathIds,
) -> ApiResult<impl IntoResponse> {
    if !db.property_delete_photo(id, photo_id).await? {
        return Err(ApiError::not_found("Photo not found"));
    }
    Ok(ApiResponse::message("Photo deleted successfully"))
}

/// POST /api/properties/:id/documents - Attach a document by URL or upload
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/api/properties/{id}/documents",
    tag = "Properties",
    params(("id" = i64, Path, description = "Property id")),
    request_body(
        content = AddDocumentRequest,
        description = "JSON body, or multipart/form-data with a `document` file field"
    ),
    responses(
        (status = 201, description = "Document added successfully", body = PropertyDocument),
        (status = 400, description = "Missing file or rejected upload", body = ErrorResponse),
        (status = 404, description = "Property not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
))]
pub async fn add_document(
    State(db): State<DbClient>,
    State(config): State<Arc<ApiConfig>>,
    auth: AuthExtractor,
    PathId(id): PathId,
    body: JsonOrMultipart<AddDocumentRequest>,
) -> ApiResult<impl IntoResponse> {
    ensure_property(&db, id).await?;

    let req = match body {
        JsonOrMultipart::Json(req) => req,
        JsonOrMultipart::Multipart(multipart) => {
            let form = read_upload_form(multipart, UploadKind::Document).await?;
            let document_type = form.text("document_type");
            match form.file {
                Some(file) => {
                    let stored = store_upload(&config.upload_dir, UploadKind::Document, file).await?;
                    AddDocumentRequest {
                        document_type,
                        file_name: Some(stored.original_name),
                        file_url: Some(stored.url),
                    }
                }
                None => AddDocumentRequest {
                    document_type,
                    file_name: form.text("file_name"),
                    file_url: form.text("file_url"),
                },
            }
        }
    };
    req.validate()?;

    let document = db.property_add_document(id, &req, auth.user_id).await?;
    Ok(created(document, "Document added successfully"))
}

/// DELETE /api/properties/:id/documents/:docId
#[cfg_attr(feature = "openapi", utoipa::path(
    delete,
    path = "/api/properties/{id}/documents/{docId}",
    tag = "Properties",
    params(
        ("id" = i64, Path, description = "Property id"),
        ("docId" = i64, Path, description = "Document id"),
    ),
    responses(
        (status = 200, description = "Document deleted successfully"),
        (status = 404, description = "Document not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
))]
pub async fn delete_document(
    State(db): State<DbClient>,
    PathIds(id, doc_id): PathIds,
) -> ApiResult<impl IntoResponse> {
    if !db.property_delete_document(id, doc_id).await? {
        return Err(ApiError::not_found("Document not found"));
    }
    Ok(ApiResponse::message("Document deleted successfully"))
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn create_router(auth_state: AuthMiddlewareState) -> Router<AppState> {
    let public = Router::new()
        .route("/", get(list_properties))
        .route("/:id", get(get_property))
        .route_layer(from_fn_with_state(auth_state.clone(), optional_auth_middleware));

    let protected = Router::new()
        .route("/", post(create_property))
        .route("/:id", axum::routing::put(update_property).delete(delete_property))
        .route("/:id/photos", post(add_photo))
        .route("/:id/photos/:photoId", delete(delete_photo))
        .route("/:id/documents", post(add_document))
        .route("/:id/documents/:docId", delete(delete_document))
        .route_layer(from_fn_with_state(auth_state, auth_middleware));

    public.merge(protected)
}
