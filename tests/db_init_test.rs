use loreseek::db;
use tempfile::TempDir;

#[test]
fn open_creates_new_db_at_nonexistent_path() {
    let tmp = TempDir::new().unwrap();
    let db_path = tmp.path().join("subdir").join("new.db");

    assert!(!db_path.exists());

    let conn = db::open_database(&db_path).unwrap();

    assert!(db_path.exists());

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM background_items", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn open_applies_migrations() {
    let tmp = TempDir::new().unwrap();
    let conn = db::open_database(tmp.path().join("m.db")).unwrap();

    assert_eq!(
        db::migrations::get_schema_version(&conn).unwrap(),
        db::migrations::CURRENT_SCHEMA_VERSION
    );
    let columns: Vec<String> = conn
        .prepare("SELECT name FROM pragma_table_info('background_items')")
        .unwrap()
        .query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert!(columns.contains(&"embedding_model".to_string()));
}

#[test]
fn fresh_db_with_non_default_model_reports_nothing_stale() {
    use loreseek::background::store::{stale_embeddings, store_item, NewItem};
    use loreseek::background::types::BackgroundKind;

    let tmp = TempDir::new().unwrap();
    let conn = db::open_database(tmp.path().join("fresh.db")).unwrap();
    assert!(stale_embeddings(&conn, "text-embedding-3-small").unwrap().is_empty());

    store_item(
        &conn,
        "book",
        &NewItem::new(BackgroundKind::Worldview, "设定"),
        Some((&[0.1, 0.2][..], "text-embedding-3-small")),
    )
    .unwrap();

    assert!(stale_embeddings(&conn, "text-embedding-3-small").unwrap().is_empty());
    assert_eq!(stale_embeddings(&conn, "BAAI/bge-m3").unwrap()["book"], 1);
}

#[test]
fn reopening_keeps_items() {
    use loreseek::background::store::{list_items, store_item, NewItem};
    use loreseek::background::types::BackgroundKind;

    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("keep.db");
    {
        let conn = db::open_database(&path).unwrap();
        store_item(
            &conn,
            "book",
            &NewItem::new(BackgroundKind::Chapter, "序章"),
            Some((&[0.1, 0.2][..], "m")),
        )
        .unwrap();
    }

    let conn = db::open_database(&path).unwrap();
    let items = list_items(&conn, "book").unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].embedding, Some(vec![0.1, 0.2]));
}

#[test]
fn busy_timeout_is_set() {
    let tmp = TempDir::new().unwrap();
    let db_path = tmp.path().join("test.db");

    let conn = db::open_database(&db_path).unwrap();

    let timeout: i64 = conn
        .pragma_query_value(None, "busy_timeout", |row| row.get(0))
        .unwrap();
    assert_eq!(timeout, 5000);
}
