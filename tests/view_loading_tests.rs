/// View loading tests
///
/// Out-of-order page fetches, stale-but-visible rows on failure, timeouts
/// and persisted view preferences.
/// Run with: cargo test --test view_loading_tests

use gridstage::{
    Column, DataType, DatasetId, DatasetMeta, EditorSession, GridError, InMemoryRowStore, LoadOutcome,
    MemoryPreferences, PreferenceStore, Row, RowId, SessionConfig, SortSpec, StoreOp, Value, ViewState,
};
use std::sync::Arc;
use std::time::Duration;

fn dataset_id() -> DatasetId {
    DatasetId::new("people")
}

async fn seed() -> Arc<InMemoryRowStore> {
    let store = Arc::new(InMemoryRowStore::new());
    let meta = DatasetMeta::new(dataset_id(), "people", vec![
        Column::new("name", DataType::String),
        Column::new("age", DataType::Integer),
    ]);
    let rows = (1..=5i64)
        .map(|i| Row::new(format!("r{}", i)).with("name", format!("person {}", i)).with("age", i * 10))
        .collect();
    store.create_dataset(meta, rows).await.unwrap();
    store
}

fn ids(session: &EditorSession) -> Vec<String> {
    session.rows().iter().map(|row| row.id.to_string()).collect()
}

#[tokio::test]
async fn test_late_result_of_superseded_fetch_is_discarded() {
    let store = seed().await;
    let mut session = EditorSession::open(store.clone(), dataset_id(), SessionConfig::new().page_size(3))
        .await
        .unwrap();
    store.set_latency(StoreOp::FetchPage, Duration::from_millis(20)).await;

    let a = session.set_page(2).unwrap();
    let in_flight = tokio::spawn(session.fetch(&a));

    let b = session.set_page_size(2).unwrap();
    let result_b = session.fetch(&b).await;
    assert_eq!(session.apply(&b, result_b), LoadOutcome::Applied { rows: 2 });

    let result_a = in_flight.await.unwrap();
    assert!(result_a.is_ok());
    assert_eq!(session.apply(&a, result_a), LoadOutcome::Superseded { generation: a.generation });

    assert_eq!(ids(&session), vec!["r1", "r2"]);
    assert_eq!(session.params().page, 1);
    assert_eq!(session.params().page_size, 2);
    assert_eq!(session.state(), &ViewState::Loaded);
}

#[tokio::test]
async fn test_superseded_failure_does_not_touch_state() {
    let store = seed().await;
    let mut session = EditorSession::open(store.clone(), dataset_id(), SessionConfig::new().page_size(2))
        .await
        .unwrap();

    let a = session.set_page(2).unwrap();
    let b = session.set_page(3).unwrap();

    let result_b = session.fetch(&b).await;
    session.apply(&b, result_b);
    let outcome = session.apply(&a, Err(GridError::FetchFailed("late".into())));

    assert!(matches!(outcome, LoadOutcome::Superseded { .. }));
    assert_eq!(session.state(), &ViewState::Loaded);
    assert_eq!(ids(&session), vec!["r5"]);
}

#[tokio::test]
async fn test_fetch_failure_keeps_rows_and_edits() {
    let store = seed().await;
    let mut session = EditorSession::open(store.clone(), dataset_id(), SessionConfig::new().page_size(2))
        .await
        .unwrap();
    session.edit_cell(&RowId::new("r1"), "age", Value::Integer(11)).unwrap();

    store.fail_next(StoreOp::FetchPage).await;
    let err = session.go_to_page(2).await.unwrap_err();

    assert!(matches!(err, GridError::FetchFailed(_)));
    assert!(session.state().is_error());
    assert_eq!(ids(&session), vec!["r1", "r2"]);
    assert_eq!(session.changes().len(), 1);

    session.reload().await.unwrap();
    assert_eq!(ids(&session), vec!["r3", "r4"]);
}

#[tokio::test]
async fn test_slow_fetch_times_out_as_retryable() {
    let store = seed().await;
    let config = SessionConfig::new().page_size(2).request_timeout(Duration::from_millis(20));
    let mut session = EditorSession::open(store.clone(), dataset_id(), config).await.unwrap();

    store.set_latency(StoreOp::FetchPage, Duration::from_millis(500)).await;
    let err = session.go_to_page(2).await.unwrap_err();

    assert_eq!(err, GridError::Timeout(20));
    assert!(err.is_retryable());
    assert_eq!(ids(&session), vec!["r1", "r2"]);
}

#[tokio::test]
async fn test_missing_dataset_is_not_found() {
    let store = seed().await;
    let result = EditorSession::open(store, DatasetId::new("nope"), SessionConfig::default()).await;
    assert!(matches!(result, Err(GridError::NotFound { kind: "Dataset", .. })));
}

#[tokio::test]
async fn test_invalid_page_is_rejected() {
    let store = seed().await;
    let mut session = EditorSession::open(store, dataset_id(), SessionConfig::default()).await.unwrap();

    assert!(matches!(session.go_to_page(0).await, Err(GridError::InvalidParameter(_))));
    assert!(matches!(session.change_page_size(0).await, Err(GridError::InvalidParameter(_))));
    assert_eq!(session.state(), &ViewState::Loaded);
}

#[tokio::test]
async fn test_page_beyond_end_is_empty() {
    let store = seed().await;
    let mut session = EditorSession::open(store, dataset_id(), SessionConfig::new().page_size(2))
        .await
        .unwrap();

    session.go_to_page(9).await.unwrap();
    assert!(session.rows().is_empty());
    assert_eq!(session.view().total_pages(), 3);
}

#[tokio::test]
async fn test_enormous_page_number_is_empty() {
    let store = seed().await;
    let mut session = EditorSession::open(store, dataset_id(), SessionConfig::default()).await.unwrap();

    session.go_to_page(usize::MAX / 2).await.unwrap();
    assert!(session.rows().is_empty());
    assert_eq!(session.state(), &ViewState::Loaded);
    assert_eq!(session.view().total_rows(), 5);
}

#[tokio::test]
async fn test_sort_over_mixed_type_column() {
    let store = seed().await;
    let extra = vec![
        std::collections::BTreeMap::from([("age".to_string(), Value::from("25"))]),
        std::collections::BTreeMap::from([("age".to_string(), Value::from("n/a"))]),
    ];
    store.insert_rows(&dataset_id(), extra).await.unwrap();
    let mut session = EditorSession::open(store, dataset_id(), SessionConfig::default()).await.unwrap();

    session.sort_by(Some(SortSpec::asc("age"))).await.unwrap();

    let ages: Vec<String> = session.rows().iter().map(|row| row.get("age").to_text()).collect();
    assert_eq!(ages, vec!["10", "20", "25", "30", "40", "50", "n/a"]);
}

#[tokio::test]
async fn test_preferences_restored_on_reopen() {
    let store = seed().await;
    let prefs: Arc<dyn PreferenceStore> = Arc::new(MemoryPreferences::new());

    let mut session = EditorSession::open_with_preferences(
        store.clone(),
        dataset_id(),
        SessionConfig::default(),
        Some(prefs.clone()),
    )
    .await
    .unwrap();
    session.change_page_size(2).await.unwrap();
    session.toggle_sort("age").await.unwrap();
    session.toggle_sort("age").await.unwrap();

    let reopened = EditorSession::open_with_preferences(
        store,
        dataset_id(),
        SessionConfig::default(),
        Some(prefs.clone()),
    )
    .await
    .unwrap();

    assert_eq!(reopened.params().page_size, 2);
    assert_eq!(reopened.params().sort, Some(SortSpec::desc("age")));
    assert_eq!(ids(&reopened), vec!["r5", "r4"]);
    assert_eq!(prefs.load(&dataset_id()).unwrap().unwrap().page_size, Some(2));
}
