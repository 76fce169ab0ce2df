#![cfg(feature = "libsql")]

use std::sync::Arc;
use std::time::Duration;

use sql_adapter::prelude::*;
use tokio::sync::oneshot;

async fn count(db: &Database) -> Result<i64, SqlAdapterError> {
    let rs = db
        .query("SELECT COUNT(*) AS cnt FROM calendar_events", &[])
        .await?;
    rs.first()
        .and_then(|row| row.get("cnt"))
        .and_then(RowValues::as_int)
        .copied()
        .ok_or_else(|| SqlAdapterError::caller("missing count"))
}

async fn local_db(dir: &tempfile::TempDir) -> Result<Database, SqlAdapterError> {
    let descriptor = format!("libsql:file:{}", dir.path().join("cloud.db").display());
    let db = Database::open(&descriptor).await?;
    db.query(
        "CREATE TABLE IF NOT EXISTS calendar_events (
            id SERIAL PRIMARY KEY,
            title TEXT NOT NULL,
            is_all_day BOOLEAN NOT NULL,
            metadata JSONB,
            starts_at TIMESTAMP DEFAULT NOW()
        )",
        &[],
    )
    .await?;
    Ok(db)
}

#[tokio::test]
async fn local_libsql_round_trips_rows() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let db = local_db(&dir).await?;
    assert_eq!(db.kind(), BackendKind::Libsql);

    let row = db
        .insert_with_returning(
            "INSERT INTO calendar_events (title, is_all_day, metadata) VALUES ($1, $2, $3) RETURNING *",
            &[
                RowValues::Text("quarterly review".into()),
                RowValues::Bool(true),
                RowValues::JSON(serde_json::json!({"room": "4B"})),
            ],
            "calendar_events",
        )
        .await?
        .expect("inserted row");
    assert_eq!(row.get("is_all_day"), Some(&RowValues::Bool(true)));
    assert_eq!(
        row.get("metadata"),
        Some(&RowValues::JSON(serde_json::json!({"room": "4B"})))
    );
    assert!(row.get("starts_at").is_some_and(|v| !v.is_null()));

    let updated = db
        .query(
            "UPDATE calendar_events SET is_all_day = ? WHERE title = ?",
            &[RowValues::Bool(false), RowValues::Text("quarterly review".into())],
        )
        .await?;
    assert_eq!(updated.row_count, 1);

    let listed = db
        .query("SELECT title, is_all_day FROM calendar_events", &[])
        .await?;
    assert_eq!(listed.row_count, 1);
    assert_eq!(
        listed.first().and_then(|r| r.get("is_all_day")),
        Some(&RowValues::Bool(false))
    );
    db.close().await?;
    Ok(())
}

#[tokio::test]
async fn local_libsql_transaction_is_atomic() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let db = local_db(&dir).await?;
    let before = count(&db).await?;

    let result = db
        .transaction(|tx| async move {
            tx.query(
                "INSERT INTO calendar_events (title, is_all_day) VALUES ($1, $2)",
                &[RowValues::Text("standup".into()), RowValues::Bool(false)],
            )
            .await?;
            Err::<(), _>(SqlAdapterError::caller("calendar sync failed"))
        })
        .await;
    assert!(matches!(
        result,
        Err(SqlAdapterError::Transaction {
            rolled_back: true,
            ..
        })
    ));
    assert_eq!(count(&db).await?, before);

    let inserted = db
        .transaction(|tx| async move {
            let mut ids = Vec::new();
            for title in ["planning", "retro"] {
                let res = tx
                    .query(
                        "INSERT INTO calendar_events (title, is_all_day) VALUES ($1, $2)",
                        &[RowValues::Text(title.into()), RowValues::Bool(true)],
                    )
                    .await?;
                ids.push(res.last_id);
            }
            Ok(ids)
        })
        .await?;
    assert_eq!(inserted.len(), 2);
    assert!(inserted.iter().all(Option::is_some));
    assert_eq!(count(&db).await?, before + 2);
    db.close().await?;
    Ok(())
}

#[tokio::test]
async fn cancelled_libsql_transaction_rolls_back() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let db = local_db(&dir).await?;
    let before = count(&db).await?;

    let (inserted_tx, inserted_rx) = oneshot::channel();
    tokio::select! {
        result = db.transaction(|tx| async move {
            tx.query(
                "INSERT INTO calendar_events (title, is_all_day) VALUES ($1, $2)",
                &[RowValues::Text("offsite".into()), RowValues::Bool(true)],
            )
            .await?;
            let _ = inserted_tx.send(());
            std::future::pending::<()>().await;
            Ok::<(), SqlAdapterError>(())
        }) => panic!("work never finishes: {result:?}"),
        _ = inserted_rx => {}
    }
    assert_eq!(count(&db).await?, before);

    // The connection is usable for a fresh transaction afterwards.
    db.transaction(|tx| async move {
        tx.query(
            "INSERT INTO calendar_events (title, is_all_day) VALUES ($1, $2)",
            &[RowValues::Text("1:1".into()), RowValues::Bool(false)],
        )
        .await?;
        Ok(())
    })
    .await?;
    assert_eq!(count(&db).await?, before + 1);
    db.close().await?;
    Ok(())
}

#[tokio::test]
async fn libsql_statements_wait_for_open_transaction() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let db = Arc::new(local_db(&dir).await?);
    let before = count(&db).await?;

    let (inserted_tx, inserted_rx) = oneshot::channel();
    let reader_db = Arc::clone(&db);
    let reader = tokio::spawn(async move {
        inserted_rx
            .await
            .map_err(|_| SqlAdapterError::caller("writer went away"))?;
        count(&reader_db).await
    });

    let result = db
        .transaction(|tx| async move {
            tx.query(
                "INSERT INTO calendar_events (title, is_all_day) VALUES ($1, $2)",
                &[RowValues::Text("draft".into()), RowValues::Bool(false)],
            )
            .await?;
            let _ = inserted_tx.send(());
            tokio::time::sleep(Duration::from_millis(50)).await;
            Err::<(), _>(SqlAdapterError::caller("draft discarded"))
        })
        .await;
    assert!(matches!(
        result,
        Err(SqlAdapterError::Transaction {
            rolled_back: true,
            ..
        })
    ));
    assert_eq!(reader.await??, before);
    db.close().await?;
    Ok(())
}
