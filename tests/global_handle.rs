#![cfg(feature = "sqlite")]

use sql_adapter::global;
use sql_adapter::prelude::*;

#[tokio::test]
async fn concurrent_initialize_connects_once() -> Result<(), Box<dyn std::error::Error>> {
    assert!(matches!(global::get_db(), Err(SqlAdapterError::NotInitialized)));

    // The second descriptor is unusable; it must never be opened.
    let (first, second) = tokio::join!(
        global::initialize(":memory:"),
        global::initialize("sqlitecloud://host:8860/db")
    );
    assert!(first.is_ok());
    assert!(matches!(second, Err(SqlAdapterError::AlreadyInitialized)));
    assert!(matches!(
        global::initialize(":memory:").await,
        Err(SqlAdapterError::AlreadyInitialized)
    ));

    assert_eq!(global::get_db_type()?, BackendKind::Sqlite);
    let db = global::get_db()?;
    db.query("CREATE TABLE accounts (id SERIAL PRIMARY KEY, owner TEXT)", &[])
        .await?;

    global::close().await?;
    assert!(matches!(
        db.query("SELECT * FROM accounts", &[]).await,
        Err(SqlAdapterError::Closed)
    ));
    Ok(())
}
