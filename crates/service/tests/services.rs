use chrono::{Duration, Utc};
use sea_orm::{Database, DatabaseConnection};

use migration::MigratorTrait;
use service::{
    ServiceError, Session,
    auth::roles,
    places, transactions, users,
};

async fn db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    db
}

fn session_for(user: &users::Model) -> Session {
    Session {
        user_id: user.id,
        roles: users::parse_roles(user).unwrap(),
    }
}

fn admin_session(user: &users::Model) -> Session {
    Session {
        user_id: user.id,
        roles: vec![roles::USER.to_string(), roles::ADMIN.to_string()],
    }
}

#[tokio::test]
async fn register_then_login_round_trips() {
    let db = db().await;

    let created = users::register(&db, "Alice", "alice@example.com", "s3cret-s3cret")
        .await
        .unwrap();
    assert_eq!(created.roles, r#"["USER"]"#);
    assert_ne!(created.password_hash, "s3cret-s3cret");

    let logged_in = users::login(&db, "alice@example.com", "s3cret-s3cret")
        .await
        .unwrap();
    assert_eq!(logged_in.id, created.id);
}

#[tokio::test]
async fn login_failures_share_one_message() {
    let db = db().await;
    users::register(&db, "Alice", "alice@example.com", "s3cret-s3cret")
        .await
        .unwrap();

    let expected = || {
        ServiceError::Unauthenticated("The given email and password do not match".to_string())
    };
    assert_eq!(
        users::login(&db, "nobody@example.com", "whatever").await,
        Err(expected())
    );
    assert_eq!(
        users::login(&db, "alice@example.com", "wrong").await,
        Err(expected())
    );
}

#[tokio::test]
async fn duplicate_email_is_a_validation_failure() {
    let db = db().await;
    users::register(&db, "Alice", "alice@example.com", "s3cret-s3cret")
        .await
        .unwrap();

    assert_eq!(
        users::register(&db, "Other Alice", "alice@example.com", "different-pw").await,
        Err(ServiceError::ValidationFailed(
            "There is already a user with this email address".to_string()
        ))
    );
}

#[tokio::test]
async fn duplicate_place_name_is_a_validation_failure() {
    let db = db().await;
    places::create(&db, "Loon", Some(4)).await.unwrap();

    assert_eq!(
        places::create(&db, "Loon", None).await,
        Err(ServiceError::ValidationFailed(
            "A place with this name already exists".to_string()
        ))
    );
}

#[tokio::test]
async fn transaction_against_missing_place_is_rejected() {
    let db = db().await;
    let user = users::register(&db, "Alice", "alice@example.com", "s3cret-s3cret")
        .await
        .unwrap();
    let session = session_for(&user);

    assert_eq!(
        transactions::create(&db, &session, 12.5, Utc::now(), 999).await,
        Err(ServiceError::NotFound("This place does not exist".to_string()))
    );
}

#[tokio::test]
async fn deleting_a_referenced_place_conflicts() {
    let db = db().await;
    let user = users::register(&db, "Alice", "alice@example.com", "s3cret-s3cret")
        .await
        .unwrap();
    let session = session_for(&user);
    let place = places::create(&db, "Loon", Some(4)).await.unwrap();
    transactions::create(&db, &session, 12.5, Utc::now(), place.id)
        .await
        .unwrap();

    assert_eq!(
        places::delete_by_id(&db, place.id).await,
        Err(ServiceError::Conflict(
            "This place is still linked to transactions".to_string()
        ))
    );
}

#[tokio::test]
async fn deleting_a_user_with_transactions_conflicts() {
    let db = db().await;
    let user = users::register(&db, "Alice", "alice@example.com", "s3cret-s3cret")
        .await
        .unwrap();
    let session = session_for(&user);
    let place = places::create(&db, "Loon", None).await.unwrap();
    transactions::create(&db, &session, 5.0, Utc::now(), place.id)
        .await
        .unwrap();

    assert_eq!(
        users::delete_by_id(&db, user.id).await,
        Err(ServiceError::Conflict(
            "This user is still linked to transactions".to_string()
        ))
    );
}

#[tokio::test]
async fn transactions_are_scoped_to_the_owner() {
    let db = db().await;
    let alice = users::register(&db, "Alice", "alice@example.com", "s3cret-s3cret")
        .await
        .unwrap();
    let bob = users::register(&db, "Bob", "bob@example.com", "s3cret-s3cret")
        .await
        .unwrap();
    let place = places::create(&db, "Loon", None).await.unwrap();

    let alice_session = session_for(&alice);
    let bob_session = session_for(&bob);
    let created = transactions::create(&db, &alice_session, 20.0, Utc::now(), place.id)
        .await
        .unwrap();

    assert_eq!(
        transactions::get_by_id(&db, &bob_session, created.transaction.id).await,
        Err(ServiceError::NotFound(
            "No transaction with this id exists".to_string()
        ))
    );
    assert!(transactions::get_all(&db, &bob_session).await.unwrap().is_empty());

    let admin = admin_session(&bob);
    let seen = transactions::get_by_id(&db, &admin, created.transaction.id)
        .await
        .unwrap();
    assert_eq!(seen.user.id, alice.id);
    assert_eq!(seen.place.name, "Loon");
}

#[tokio::test]
async fn update_and_delete_respect_ownership() {
    let db = db().await;
    let alice = users::register(&db, "Alice", "alice@example.com", "s3cret-s3cret")
        .await
        .unwrap();
    let bob = users::register(&db, "Bob", "bob@example.com", "s3cret-s3cret")
        .await
        .unwrap();
    let place = places::create(&db, "Loon", None).await.unwrap();

    let alice_session = session_for(&alice);
    let bob_session = session_for(&bob);
    let created = transactions::create(&db, &alice_session, 20.0, Utc::now(), place.id)
        .await
        .unwrap();
    let id = created.transaction.id;

    let not_found =
        || ServiceError::NotFound("No transaction with this id exists".to_string());
    assert_eq!(
        transactions::update_by_id(&db, &bob_session, id, 1.0, Utc::now(), place.id).await,
        Err(not_found())
    );
    assert_eq!(
        transactions::delete_by_id(&db, &bob_session, id).await,
        Err(not_found())
    );

    let updated = transactions::update_by_id(
        &db,
        &alice_session,
        id,
        42.0,
        Utc::now() - Duration::hours(1),
        place.id,
    )
    .await
    .unwrap();
    assert_eq!(updated.transaction.amount, 42.0);

    transactions::delete_by_id(&db, &alice_session, id)
        .await
        .unwrap();
    assert!(
        transactions::get_all(&db, &alice_session)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn place_listing_never_widens_for_admins() {
    let db = db().await;
    let alice = users::register(&db, "Alice", "alice@example.com", "s3cret-s3cret")
        .await
        .unwrap();
    let bob = users::register(&db, "Bob", "bob@example.com", "s3cret-s3cret")
        .await
        .unwrap();
    let place = places::create(&db, "Loon", None).await.unwrap();

    transactions::create(&db, &session_for(&alice), 20.0, Utc::now(), place.id)
        .await
        .unwrap();

    let bob_admin = admin_session(&bob);
    let listed = transactions::get_by_place_id(&db, &bob_admin, place.id)
        .await
        .unwrap();
    assert!(listed.is_empty());
}

#[tokio::test]
async fn email_lookup_reports_the_email_when_missing() {
    let db = db().await;
    let user = users::register(&db, "Alice", "alice@example.com", "s3cret-s3cret")
        .await
        .unwrap();

    assert_eq!(
        users::get_by_email(&db, "alice@example.com").await,
        Ok(user)
    );
    assert_eq!(
        users::get_by_email(&db, "nobody@example.com").await,
        Err(ServiceError::NotFound(
            "No user with this email exists".to_string()
        ))
    );
}

#[tokio::test]
async fn assign_roles_replaces_the_set() {
    let db = db().await;
    let user = users::register(&db, "Alice", "alice@example.com", "s3cret-s3cret")
        .await
        .unwrap();

    let promoted = users::assign_roles(
        &db,
        user.id,
        &[roles::USER.to_string(), roles::ADMIN.to_string()],
    )
    .await
    .unwrap();
    assert_eq!(
        users::parse_roles(&promoted).unwrap(),
        vec!["USER".to_string(), "ADMIN".to_string()]
    );
}
