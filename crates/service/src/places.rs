//! Places: entity plus CRUD operations.

use sea_orm::{ActiveValue, QueryFilter, entity::prelude::*};

use crate::{ResultService, ServiceError, error, transactions};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "places")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub rating: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "crate::transactions::Entity")]
    Transactions,
}

impl Related<crate::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

fn check_fields(name: &str, rating: Option<i32>) -> ResultService<()> {
    if name.is_empty() || name.len() > 255 {
        return Err(ServiceError::ValidationFailed(
            "name must be between 1 and 255 characters".to_string(),
        ));
    }
    if let Some(rating) = rating
        && !(1..=5).contains(&rating)
    {
        return Err(ServiceError::ValidationFailed(
            "rating must be between 1 and 5".to_string(),
        ));
    }
    Ok(())
}

pub async fn get_all(db: &DatabaseConnection) -> ResultService<Vec<Model>> {
    Entity::find().all(db).await.map_err(error::translate)
}

pub async fn get_by_id(db: &DatabaseConnection, id: i32) -> ResultService<Model> {
    Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(error::translate)?
        .ok_or_else(|| ServiceError::NotFound("No place with this id exists".to_string()))
}

/// Fails when a place id does not resolve. Used before writing a transaction
/// that references it.
pub async fn check_exists(db: &DatabaseConnection, id: i32) -> ResultService<()> {
    let found = Entity::find_by_id(id)
        .count(db)
        .await
        .map_err(error::translate)?;
    if found == 0 {
        return Err(ServiceError::NotFound(
            "This place does not exist".to_string(),
        ));
    }
    Ok(())
}

/// Name uniqueness is enforced by the store; duplicates come back through the
/// translator as ValidationFailed.
pub async fn create(
    db: &DatabaseConnection,
    name: &str,
    rating: Option<i32>,
) -> ResultService<Model> {
    check_fields(name, rating)?;

    let place = ActiveModel {
        name: ActiveValue::Set(name.to_string()),
        rating: ActiveValue::Set(rating),
        ..Default::default()
    };

    place.insert(db).await.map_err(error::translate)
}

pub async fn update_by_id(
    db: &DatabaseConnection,
    id: i32,
    name: &str,
    rating: Option<i32>,
) -> ResultService<Model> {
    check_fields(name, rating)?;
    let place = get_by_id(db, id).await?;

    let mut place: ActiveModel = place.into();
    place.name = ActiveValue::Set(name.to_string());
    place.rating = ActiveValue::Set(rating);

    place.update(db).await.map_err(error::translate)
}

/// Deletes a place.
///
/// SQLite reports foreign-key violations without naming the column, so the
/// linked-transactions case is checked here to keep the 409 message exact.
pub async fn delete_by_id(db: &DatabaseConnection, id: i32) -> ResultService<()> {
    let linked = transactions::Entity::find()
        .filter(transactions::Column::PlaceId.eq(id))
        .count(db)
        .await
        .map_err(error::translate)?;
    if linked > 0 {
        return Err(ServiceError::Conflict(
            "This place is still linked to transactions".to_string(),
        ));
    }

    let result = Entity::delete_by_id(id)
        .exec(db)
        .await
        .map_err(error::translate)?;
    if result.rows_affected == 0 {
        return Err(ServiceError::NotFound(
            "No place with this id exists".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_and_oversized_names() {
        assert!(check_fields("", None).is_err());
        assert!(check_fields(&"x".repeat(256), None).is_err());
        assert!(check_fields(&"x".repeat(255), None).is_ok());
    }

    #[test]
    fn rejects_out_of_range_ratings() {
        assert!(check_fields("Loon", Some(0)).is_err());
        assert!(check_fields("Loon", Some(6)).is_err());
        assert!(check_fields("Loon", Some(1)).is_ok());
        assert!(check_fields("Loon", Some(5)).is_ok());
        assert!(check_fields("Loon", None).is_ok());
    }
}
