//! `properties`, `property_photos` and `property_documents` tables.

use estate_core::{PropertyId, PropertyStatus, UserId};

use super::{delete_by_id, exists, query_json, query_json_one, query_json_opt, query_page};
use super::{DbClient, QueryBuilder, SortOrder};
use crate::error::ApiResult;
use crate::pagination::Pagination;
use crate::response::Paginated;
use crate::types::{
    AddDocumentRequest, AddPhotoRequest, CreatePropertyRequest, PropertyDetail,
    PropertyDocument, PropertyFilter, PropertyListItem, PropertyPhoto, PropertyRow,
    PropertyShowing, PropertySort, UpdatePropertyRequest,
};
use crate::validation::non_blank;

const DEFAULT_COUNTRY: &str = "USA";
const RECENT_SHOWINGS: i64 = 10;

const LIST_COLUMNS: &str = "p.*,
    a.first_name AS agent_first_name, a.last_name AS agent_last_name,
    (SELECT url FROM property_photos WHERE property_id = p.id AND is_primary LIMIT 1) AS primary_photo,
    (SELECT COUNT(*) FROM property_photos WHERE property_id = p.id) AS photo_count";

impl DbClient {
    pub async fn property_exists(&self, id: PropertyId) -> ApiResult<bool> {
        let conn = self.get_conn().await?;
        exists(&**conn, "properties", id).await
    }

    pub async fn property_list(
        &self,
        filter: &PropertyFilter,
        page: &Pagination,
    ) -> ApiResult<Paginated<PropertyListItem>> {
        let mut qb = QueryBuilder::new();
        qb.and_eq("p.status", non_blank(filter.status.as_deref()))
            .and_eq("p.property_type", non_blank(filter.property_type.as_deref()))
            .and_eq("p.listing_type", non_blank(filter.listing_type.as_deref()));
        if let Some(city) = non_blank(filter.city.as_deref()) {
            qb.and_where("p.city ILIKE {}", format!("%{}%", city));
        }
        qb.and_eq("p.state", non_blank(filter.state.as_deref()))
            .and_cmp("p.price", ">=", filter.min_price)
            .and_cmp("p.price", "<=", filter.max_price)
            .and_cmp("p.bedrooms", ">=", filter.min_bedrooms)
            .and_cmp("p.bedrooms", "<=", filter.max_bedrooms)
            .and_cmp("p.square_feet", ">=", filter.min_sqft)
            .and_cmp("p.square_feet", "<=", filter.max_sqft)
            .and_eq("p.agent_id", filter.agent_id)
            .and_search(&["p.address", "p.city", "p.mls_number"], filter.search.as_deref());

        let order_by = format!(
            "{} {}",
            PropertySort::parse(filter.sort_by.as_deref()).column(),
            SortOrder::parse(filter.sort_order.as_deref()).as_sql()
        );

        let conn = self.get_conn().await?;
        query_page(
            &**conn,
            &qb,
            LIST_COLUMNS,
            "properties p LEFT JOIN agents a ON p.agent_id = a.id",
            &order_by,
            page,
        )
        .await
    }

    /// Listing with agent contact, photos, documents and recent showings.
    pub async fn property_detail(&self, id: PropertyId) -> ApiResult<Option<PropertyDetail>> {
        let conn = self.get_conn().await?;
        let detail: Option<PropertyDetail> = query_json_opt(
            &**conn,
            "SELECT p.*,
                a.first_name AS agent_first_name, a.last_name AS agent_last_name,
                a.phone AS agent_phone, a.photo_url AS agent_photo, u.email AS agent_email
             FROM properties p
             LEFT JOIN agents a ON p.agent_id = a.id
             LEFT JOIN users u ON a.user_id = u.id
             WHERE p.id = $1",
            &[&id],
        )
        .await?;
        let Some(mut detail) = detail else {
            return Ok(None);
        };

        detail.photos = query_json(
            &**conn,
            "SELECT * FROM property_photos WHERE property_id = $1
             ORDER BY display_order, is_primary DESC",
            &[&id],
        )
        .await?;

        detail.documents = query_json(
            &**conn,
            "SELECT * FROM property_documents WHERE property_id = $1 ORDER BY uploaded_at DESC",
            &[&id],
        )
        .await?;

        let showings: Vec<PropertyShowing> = query_json(
            &**conn,
            "SELECT s.id, s.scheduled_date, s.status, s.feedback, s.interest_level,
                c.first_name AS client_first_name, c.last_name AS client_last_name
             FROM showings s
             LEFT JOIN clients c ON s.client_id = c.id
             WHERE s.property_id = $1
             ORDER BY s.scheduled_date DESC
             LIMIT $2",
            &[&id, &RECENT_SHOWINGS],
        )
        .await?;
        detail.showings = showings;

        Ok(Some(detail))
    }

    pub async fn property_create(&self, req: &CreatePropertyRequest) -> ApiResult<PropertyRow> {
        let f = &req.fields;
        let status = non_blank(f.status.as_deref()).unwrap_or(PropertyStatus::Available.as_db_str());
        let country = non_blank(f.country.as_deref()).unwrap_or(DEFAULT_COUNTRY);

        let conn = self.get_conn().await?;
        let property: PropertyRow = query_json_one(
            &**conn,
            "INSERT INTO properties (
                mls_number, address, city, state, zip_code, country,
                latitude, longitude, property_type, listing_type, status,
                price, bedrooms, bathrooms, square_feet, lot_size, year_built,
                description, features, listing_date, days_on_market, agent_id
             ) VALUES (
                $1, $2, $3, $4, $5, $6,
                $7, $8, $9, $10, $11,
                $12::float8, $13, $14::float8, $15, $16, $17,
                $18, $19, $20, ABS(CURRENT_DATE - $20::date), $21
             )
             RETURNING *",
            &[
                &non_blank(f.mls_number.as_deref()),
                &non_blank(f.address.as_deref()),
                &non_blank(f.city.as_deref()),
                &non_blank(f.state.as_deref()),
                &non_blank(f.zip_code.as_deref()),
                &country,
                &f.latitude,
                &f.longitude,
                &non_blank(f.property_type.as_deref()),
                &non_blank(f.listing_type.as_deref()),
                &status,
                &f.price,
                &f.bedrooms,
                &f.bathrooms,
                &f.square_feet,
                &f.lot_size,
                &f.year_built,
                &non_blank(f.description.as_deref()),
                &f.features(),
                &f.listing_date,
                &f.agent_id,
            ],
        )
        .await?;

        tracing::info!(property_id = property.id, "Property created");
        Ok(property)
    }

    /// COALESCE update that re-derives `days_on_market` and stamps
    /// `last_modified_date`. `None` when the property does not exist.
    pub async fn property_update(
        &self,
        id: PropertyId,
        req: &UpdatePropertyRequest,
    ) -> ApiResult<Option<PropertyRow>> {
        let f = &req.fields;
        let conn = self.get_conn().await?;
        query_json_opt(
            &**conn,
            "UPDATE properties SET
                mls_number = COALESCE($1, mls_number),
                address = COALESCE($2, address),
                city = COALESCE($3, city),
                state = COALESCE($4, state),
                zip_code = COALESCE($5, zip_code),
                country = COALESCE($6, country),
                latitude = COALESCE($7, latitude),
                longitude = COALESCE($8, longitude),
                property_type = COALESCE($9, property_type),
                listing_type = COALESCE($10, listing_type),
                status = COALESCE($11, status),
                price = COALESCE($12::float8, price),
                bedrooms = COALESCE($13, bedrooms),
                bathrooms = COALESCE($14::float8, bathrooms),
                square_feet = COALESCE($15, square_feet),
                lot_size = COALESCE($16, lot_size),
                year_built = COALESCE($17, year_built),
                description = COALESCE($18, description),
                features = COALESCE($19, features),
                listing_date = COALESCE($20, listing_date),
                days_on_market = ABS(CURRENT_DATE - COALESCE($20::date, listing_date)),
                agent_id = COALESCE($21, agent_id),
                sold_date = COALESCE($22, sold_date),
                last_modified_date = NOW()
             WHERE id = $23
             RETURNING *",
            &[
                &non_blank(f.mls_number.as_deref()),
                &non_blank(f.address.as_deref()),
                &non_blank(f.city.as_deref()),
                &non_blank(f.state.as_deref()),
                &non_blank(f.zip_code.as_deref()),
                &non_blank(f.country.as_deref()),
                &f.latitude,
                &f.longitude,
                &non_blank(f.property_type.as_deref()),
                &non_blank(f.listing_type.as_deref()),
                &non_blank(f.status.as_deref()),
                &f.price,
                &f.bedrooms,
                &f.bathrooms,
                &f.square_feet,
                &f.lot_size,
                &f.year_built,
                &non_blank(f.description.as_deref()),
                &f.features(),
                &f.listing_date,
                &f.agent_id,
                &req.sold_date,
                &id,
            ],
        )
        .await
    }

    pub async fn property_delete(&self, id: PropertyId) -> ApiResult<bool> {
        let conn = self.get_conn().await?;
        delete_by_id(&**conn, "properties", id).await
    }

    // ------------------------------------------------------------------------
    // Photos
    // ------------------------------------------------------------------------

    /// Insert a photo. A primary photo demotes the current primary first.
    pub async fn property_add_photo(
        &self,
        property_id: PropertyId,
        req: &AddPhotoRequest,
    ) -> ApiResult<PropertyPhoto> {
        let is_primary = req.is_primary.unwrap_or(false);
        let display_order = req.display_order.unwrap_or(0);

        let mut conn = self.get_conn().await?;
        let tx = conn.transaction().await?;

        if is_primary {
            tx.execute(
                "UPDATE property_photos SET is_primary = FALSE WHERE property_id = $1",
                &[&property_id],
            )
            .await?;
        }

        let photo: PropertyPhoto = query_json_one(
            &*tx,
            "INSERT INTO property_photos (property_id, url, caption, is_primary, display_order)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING *",
            &[
                &property_id,
                &non_blank(req.url.as_deref()),
                &non_blank(req.caption.as_deref()),
                &is_primary,
                &display_order,
            ],
        )
        .await?;

        tx.commit().await?;
        Ok(photo)
    }

    pub async fn property_delete_photo(
        &self,
        property_id: PropertyId,
        photo_id: i64,
    ) -> ApiResult<bool> {
        let conn = self.get_conn().await?;
        let removed = conn
            .execute(
                "DELETE FROM property_photos WHERE id = $1 AND property_id = $2",
                &[&photo_id, &property_id],
            )
            .await?;
        Ok(removed > 0)
    }

    // ------------------------------------------------------------------------
    // Documents
    // ------------------------------------------------------------------------

    pub async fn property_add_document(
        &self,
        property_id: PropertyId,
        req: &AddDocumentRequest,
        uploaded_by: UserId,
    ) -> ApiResult<PropertyDocument> {
        let conn = self.get_conn().await?;
        query_json_one(
            &**conn,
            "INSERT INTO property_documents (property_id, document_type, file_name, file_url, uploaded_by)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING *",
            &[
                &property_id,
                &non_blank(req.document_type.as_deref()),
                &non_blank(req.file_name.as_deref()),
                &non_blank(req.file_url.as_deref()),
                &uploaded_by,
            ],
        )
        .await
    }

    pub async fn property_delete_document(
        &self,
        property_id: PropertyId,
        document_id: i64,
    ) -> ApiResult<bool> {
        let conn = self.get_conn().await?;
        let removed = conn
            .execute(
                "DELETE FROM property_documents WHERE id = $1 AND property_id = $2",
                &[&document_id, &property_id],
            )
            .await?;
        Ok(removed > 0)
    }
}
