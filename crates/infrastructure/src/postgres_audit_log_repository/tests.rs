use chrono::{Duration, Utc};
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;

use pillow_application::{AuditLogRepository, AuditStore};
use pillow_core::UserId;
use pillow_domain::{AuditEventId, AuditLogRecord};

use super::PostgresAuditLogRepository;
use crate::PostgresAuditRepository;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for postgres audit log tests: {error}");
    }

    Some(pool)
}

#[tokio::test]
async fn inserted_rows_are_read_back_newest_first() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let store = PostgresAuditRepository::new(pool.clone());
    let repository = PostgresAuditLogRepository::new(pool);
    // Future timestamps keep these rows ahead of anything already in the table.
    let base = Utc::now() + Duration::days(3650);
    let actor = UserId::new();

    let older = AuditLogRecord {
        id: AuditEventId::new(),
        user_id: Some(actor),
        action: "ROLE_CREATED".to_owned(),
        details: r#"{"before":null}"#.to_owned(),
        timestamp: base,
    };
    let newer = AuditLogRecord {
        id: AuditEventId::new(),
        user_id: None,
        action: "POST /api/roles".to_owned(),
        details: "{}".to_owned(),
        timestamp: base + Duration::seconds(1),
    };

    assert!(store.insert_record(older.clone()).await.is_ok());
    assert!(store.insert_record(newer.clone()).await.is_ok());

    let page = repository.list_recent(2, 0).await;
    assert!(page.is_ok());
    let page = page.unwrap_or_default();
    assert_eq!(page.len(), 2);
    assert_eq!(page[0].id, newer.id);
    assert_eq!(page[1].id, older.id);
    assert_eq!(page[1].user_id, Some(actor));

    let found = repository.find_by_id(older.id).await;
    assert!(matches!(found, Ok(Some(ref record)) if record.action == "ROLE_CREATED"));

    assert!(matches!(repository.count().await, Ok(total) if total >= 2));
    assert!(matches!(
        repository.find_by_id(AuditEventId::new()).await,
        Ok(None)
    ));
}

#[tokio::test]
async fn duplicate_event_id_is_reported_not_raised() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let store = PostgresAuditRepository::new(pool);
    let record = AuditLogRecord {
        id: AuditEventId::new(),
        user_id: None,
        action: "DUPLICATE".to_owned(),
        details: "{}".to_owned(),
        timestamp: Utc::now(),
    };

    assert!(store.insert_record(record.clone()).await.is_ok());
    assert!(store.insert_record(record).await.is_err());
}
