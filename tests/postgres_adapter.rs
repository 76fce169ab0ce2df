#![cfg(feature = "postgres")]

use sql_adapter::prelude::*;
use tokio::runtime::Runtime;

fn postgres_url() -> Option<String> {
    std::env::var("TEST_POSTGRES_URL").ok().filter(|u| !u.is_empty())
}

fn unique_table(prefix: &str) -> String {
    let ns = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    format!("{prefix}_{}_{ns}", std::process::id())
}

#[test]
fn postgres_reference_dialect() -> Result<(), Box<dyn std::error::Error>> {
    let Some(url) = postgres_url() else {
        eprintln!("TEST_POSTGRES_URL not set; skipping");
        return Ok(());
    };
    let table = unique_table("sa_users");
    let rt = Runtime::new()?;
    rt.block_on(async {
        let db = AdapterOptions::builder(url).pool_max_size(4).connect().await?;
        assert_eq!(db.kind(), BackendKind::Postgres);
        db.query(
            &format!(
                "CREATE TABLE {table} (id SERIAL PRIMARY KEY, name TEXT, is_active BOOLEAN, \
                 roles JSONB, tags TEXT[], created_at TIMESTAMPTZ DEFAULT NOW())"
            ),
            &[],
        )
        .await?;

        // Bare placeholders are numbered for Postgres.
        let sql = format!("INSERT INTO {table} (name, is_active, roles, tags) VALUES (?, ?, ?, ?) RETURNING *");
        assert!(db.convert_sql(&sql).contains("VALUES ($1, $2, $3, $4)"));
        let row = db
            .insert_with_returning(
                &sql,
                &[
                    RowValues::Text("ana".into()),
                    RowValues::Bool(true),
                    RowValues::JSON(serde_json::json!(["admin"])),
                    RowValues::Array(vec![RowValues::Text("west".into())]),
                ],
                &table,
            )
            .await?
            .expect("inserted row");
        assert_eq!(row.get("is_active"), Some(&RowValues::Bool(true)));
        assert_eq!(
            row.get("roles"),
            Some(&RowValues::JSON(serde_json::json!(["admin"])))
        );
        assert_eq!(
            row.get("tags"),
            Some(&RowValues::Array(vec![RowValues::Text("west".into())]))
        );

        let err = db
            .transaction(|tx| {
                let table = table.clone();
                async move {
                    tx.query(
                        &format!("INSERT INTO {table} (name) VALUES ($1)"),
                        &[RowValues::Text("bo".into())],
                    )
                    .await?;
                    Err::<(), _>(SqlAdapterError::caller("abort"))
                }
            })
            .await;
        assert!(matches!(
            err,
            Err(SqlAdapterError::Transaction {
                rolled_back: true,
                ..
            })
        ));

        let rs = db
            .query(&format!("SELECT COUNT(*) AS cnt FROM {table}"), &[])
            .await?;
        assert_eq!(
            rs.first().and_then(|r| r.get("cnt")).and_then(RowValues::as_int),
            Some(&1)
        );

        db.query(&format!("DROP TABLE {table}"), &[]).await?;
        db.close().await?;
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}
