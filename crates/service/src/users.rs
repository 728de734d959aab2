//! Users: entity plus account operations.
//!
//! Roles are stored as a JSON array in a text column (`["USER"]` by default)
//! so the set can grow without a schema change.

use sea_orm::{ActiveValue, QueryFilter, entity::prelude::*};

use crate::{ResultService, ServiceError, auth::roles, error, password, transactions};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    /// JSON-encoded array of role names.
    pub roles: String,
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

/// Decodes the roles column of a user row.
pub fn parse_roles(model: &Model) -> ResultService<Vec<String>> {
    serde_json::from_str(&model.roles).map_err(|err| {
        ServiceError::Internal(format!("user {} has malformed roles: {err}", model.id))
    })
}

/// Creates an account with the default USER role.
pub async fn register(
    db: &DatabaseConnection,
    name: &str,
    email: &str,
    password: &str,
) -> ResultService<Model> {
    let password_hash = password::hash(password)?;
    let roles = serde_json::to_string(&[roles::USER])
        .map_err(|err| ServiceError::Internal(err.to_string()))?;

    let user = ActiveModel {
        name: ActiveValue::Set(name.to_string()),
        email: ActiveValue::Set(email.to_string()),
        password_hash: ActiveValue::Set(password_hash),
        roles: ActiveValue::Set(roles),
        ..Default::default()
    };

    user.insert(db).await.map_err(error::translate)
}

/// Checks the credentials and returns the matching user.
///
/// Unknown email and wrong password produce the same error so the response
/// does not reveal which accounts exist.
pub async fn login(db: &DatabaseConnection, email: &str, password: &str) -> ResultService<Model> {
    let mismatch =
        || ServiceError::Unauthenticated("The given email and password do not match".to_string());

    let user = Entity::find()
        .filter(Column::Email.eq(email))
        .one(db)
        .await
        .map_err(error::translate)?
        .ok_or_else(mismatch)?;

    if password::verify(password, &user.password_hash)? {
        Ok(user)
    } else {
        Err(mismatch())
    }
}

pub async fn get_all(db: &DatabaseConnection) -> ResultService<Vec<Model>> {
    Entity::find().all(db).await.map_err(error::translate)
}

pub async fn get_by_id(db: &DatabaseConnection, id: i32) -> ResultService<Model> {
    Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(error::translate)?
        .ok_or_else(|| ServiceError::NotFound("No user with this id exists".to_string()))
}

pub async fn get_by_email(db: &DatabaseConnection, email: &str) -> ResultService<Model> {
    Entity::find()
        .filter(Column::Email.eq(email))
        .one(db)
        .await
        .map_err(error::translate)?
        .ok_or_else(|| ServiceError::NotFound("No user with this email exists".to_string()))
}

pub async fn update_by_id(
    db: &DatabaseConnection,
    id: i32,
    name: &str,
    email: &str,
) -> ResultService<Model> {
    let user = get_by_id(db, id).await?;

    let mut user: ActiveModel = user.into();
    user.name = ActiveValue::Set(name.to_string());
    user.email = ActiveValue::Set(email.to_string());

    user.update(db).await.map_err(error::translate)
}

/// Deletes a user.
///
/// SQLite reports foreign-key violations without naming the column, so the
/// linked-transactions case is checked here to keep the 409 message exact.
pub async fn delete_by_id(db: &DatabaseConnection, id: i32) -> ResultService<()> {
    let linked = transactions::Entity::find()
        .filter(transactions::Column::UserId.eq(id))
        .count(db)
        .await
        .map_err(error::translate)?;
    if linked > 0 {
        return Err(ServiceError::Conflict(
            "This user is still linked to transactions".to_string(),
        ));
    }

    let result = Entity::delete_by_id(id)
        .exec(db)
        .await
        .map_err(error::translate)?;
    if result.rows_affected == 0 {
        return Err(ServiceError::NotFound(
            "No user with this id exists".to_string(),
        ));
    }

    Ok(())
}

/// Replaces a user's role set. Out-of-band administration only.
pub async fn assign_roles(
    db: &DatabaseConnection,
    id: i32,
    new_roles: &[String],
) -> ResultService<Model> {
    let user = get_by_id(db, id).await?;

    let encoded =
        serde_json::to_string(new_roles).map_err(|err| ServiceError::Internal(err.to_string()))?;

    let mut user: ActiveModel = user.into();
    user.roles = ActiveValue::Set(encoded);

    user.update(db).await.map_err(error::translate)
}
