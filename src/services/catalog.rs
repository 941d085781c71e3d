//! Read-only reference-data lookups (products, locations). Creation and
//! maintenance of these rows belongs to the surrounding CRUD layer; the
//! fulfillment core only resolves them by id or scanner barcode.

use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};

use crate::{
    entities::{location, product},
    errors::ServiceError,
};

pub(crate) async fn product_by_barcode<C: ConnectionTrait>(
    db: &C,
    barcode: &str,
) -> Result<product::Model, ServiceError> {
    product::Entity::find()
        .filter(product::Column::Barcode.eq(barcode))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("product with barcode {}", barcode)))
}

pub(crate) async fn product_by_id<C: ConnectionTrait>(
    db: &C,
    id: i64,
) -> Result<product::Model, ServiceError> {
    product::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("product {}", id)))
}

pub(crate) async fn location_by_barcode<C: ConnectionTrait>(
    db: &C,
    barcode: &str,
) -> Result<location::Model, ServiceError> {
    location::Entity::find()
        .filter(location::Column::Barcode.eq(barcode))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("location with barcode {}", barcode)))
}
