//! Transactions: entity, ownership scoping and the joined read model.
//!
//! Every read and write is scoped to the calling user unless the session
//! carries ADMIN. Reads come back as [`TransactionRecord`]s with the place
//! and the owning user already resolved.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, QueryFilter, Select, entity::prelude::*};

use crate::{ResultService, ServiceError, Session, error, places, users};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub amount: f64,
    pub date: DateTimeUtc,
    pub place_id: i32,
    pub user_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "crate::places::Entity",
        from = "Column::PlaceId",
        to = "crate::places::Column::Id"
    )]
    Place,
    #[sea_orm(
        belongs_to = "crate::users::Entity",
        from = "Column::UserId",
        to = "crate::users::Column::Id"
    )]
    User,
}

impl Related<crate::places::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Place.def()
    }
}

impl Related<crate::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// A transaction with its referents resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRecord {
    pub transaction: Model,
    pub place: places::Model,
    pub user: users::Model,
}

fn check_fields(amount: f64, date: DateTime<Utc>) -> ResultService<()> {
    if amount <= 0.0 {
        return Err(ServiceError::ValidationFailed(
            "amount must be greater than 0".to_string(),
        ));
    }
    if date > Utc::now() {
        return Err(ServiceError::ValidationFailed(
            "date cannot be in the future".to_string(),
        ));
    }
    Ok(())
}

/// Resolves places and users for a batch of rows with one query per table.
///
/// A dangling referent means the store let a row outlive its foreign keys;
/// that surfaces as an internal error rather than a domain one.
async fn hydrate(
    db: &DatabaseConnection,
    rows: Vec<Model>,
) -> ResultService<Vec<TransactionRecord>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let place_ids: Vec<i32> = rows.iter().map(|row| row.place_id).collect();
    let user_ids: Vec<i32> = rows.iter().map(|row| row.user_id).collect();

    let places: HashMap<i32, places::Model> = places::Entity::find()
        .filter(places::Column::Id.is_in(place_ids))
        .all(db)
        .await
        .map_err(error::translate)?
        .into_iter()
        .map(|place| (place.id, place))
        .collect();
    let users: HashMap<i32, users::Model> = users::Entity::find()
        .filter(users::Column::Id.is_in(user_ids))
        .all(db)
        .await
        .map_err(error::translate)?
        .into_iter()
        .map(|user| (user.id, user))
        .collect();

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        let place = places.get(&row.place_id).cloned().ok_or_else(|| {
            ServiceError::Internal(format!(
                "transaction {} references missing place {}",
                row.id, row.place_id
            ))
        })?;
        let user = users.get(&row.user_id).cloned().ok_or_else(|| {
            ServiceError::Internal(format!(
                "transaction {} references missing user {}",
                row.id, row.user_id
            ))
        })?;
        records.push(TransactionRecord {
            transaction: row,
            place,
            user,
        });
    }

    Ok(records)
}

fn scoped(session: &Session) -> Select<Entity> {
    let query = Entity::find();
    if session.is_admin() {
        query
    } else {
        query.filter(Column::UserId.eq(session.user_id))
    }
}

pub async fn get_all(
    db: &DatabaseConnection,
    session: &Session,
) -> ResultService<Vec<TransactionRecord>> {
    let rows = scoped(session).all(db).await.map_err(error::translate)?;
    hydrate(db, rows).await
}

pub async fn get_by_id(
    db: &DatabaseConnection,
    session: &Session,
    id: i32,
) -> ResultService<TransactionRecord> {
    let row = scoped(session)
        .filter(Column::Id.eq(id))
        .one(db)
        .await
        .map_err(error::translate)?
        .ok_or_else(|| ServiceError::NotFound("No transaction with this id exists".to_string()))?;

    let mut records = hydrate(db, vec![row]).await?;
    records
        .pop()
        .ok_or_else(|| ServiceError::Internal("hydration dropped a row".to_string()))
}

/// Records an expense for the calling user.
pub async fn create(
    db: &DatabaseConnection,
    session: &Session,
    amount: f64,
    date: DateTime<Utc>,
    place_id: i32,
) -> ResultService<TransactionRecord> {
    check_fields(amount, date)?;
    places::check_exists(db, place_id).await?;

    let transaction = ActiveModel {
        amount: ActiveValue::Set(amount),
        date: ActiveValue::Set(date),
        place_id: ActiveValue::Set(place_id),
        user_id: ActiveValue::Set(session.user_id),
        ..Default::default()
    };
    let row = transaction.insert(db).await.map_err(error::translate)?;

    let mut records = hydrate(db, vec![row]).await?;
    records
        .pop()
        .ok_or_else(|| ServiceError::Internal("hydration dropped a row".to_string()))
}

pub async fn update_by_id(
    db: &DatabaseConnection,
    session: &Session,
    id: i32,
    amount: f64,
    date: DateTime<Utc>,
    place_id: i32,
) -> ResultService<TransactionRecord> {
    check_fields(amount, date)?;
    places::check_exists(db, place_id).await?;

    let row = scoped(session)
        .filter(Column::Id.eq(id))
        .one(db)
        .await
        .map_err(error::translate)?
        .ok_or_else(|| ServiceError::NotFound("No transaction with this id exists".to_string()))?;

    let mut transaction: ActiveModel = row.into();
    transaction.amount = ActiveValue::Set(amount);
    transaction.date = ActiveValue::Set(date);
    transaction.place_id = ActiveValue::Set(place_id);
    let row = transaction.update(db).await.map_err(error::translate)?;

    let mut records = hydrate(db, vec![row]).await?;
    records
        .pop()
        .ok_or_else(|| ServiceError::Internal("hydration dropped a row".to_string()))
}

pub async fn delete_by_id(db: &DatabaseConnection, session: &Session, id: i32) -> ResultService<()> {
    let mut delete = Entity::delete_many().filter(Column::Id.eq(id));
    if !session.is_admin() {
        delete = delete.filter(Column::UserId.eq(session.user_id));
    }

    let result = delete.exec(db).await.map_err(error::translate)?;
    if result.rows_affected == 0 {
        return Err(ServiceError::NotFound(
            "No transaction with this id exists".to_string(),
        ));
    }

    Ok(())
}

/// Lists the caller's own transactions at one place. Never widened by ADMIN.
pub async fn get_by_place_id(
    db: &DatabaseConnection,
    session: &Session,
    place_id: i32,
) -> ResultService<Vec<TransactionRecord>> {
    let rows = Entity::find()
        .filter(Column::PlaceId.eq(place_id))
        .filter(Column::UserId.eq(session.user_id))
        .all(db)
        .await
        .map_err(error::translate)?;
    hydrate(db, rows).await
}
