//! End-to-end tests: write records through the handler, search them back.

use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset, TimeZone, Timelike, Utc};
use tempfile::TempDir;
use uuid::Uuid;
use witness_core::{DocumentRecordHandler, Error, RecordHandler, StorageConfig};
use witness_proto::{
    keys, DataEntry, DataWrapper, FieldCondition, Flag, MatchRule, Query, QuerySession, Requester,
    SortOrder, StaticPlayerDirectory,
};

fn open_handler(dir: &TempDir) -> DocumentRecordHandler {
    DocumentRecordHandler::open(&StorageConfig::new(dir.path())).unwrap()
}

fn record(event: &str, cause: &str, created: DateTime<Utc>) -> DataWrapper {
    DataWrapper::new()
        .with(keys::EVENT_NAME, event)
        .with(keys::CAUSE, cause)
        .with(keys::CREATED, created)
        .with("location.world", "world")
        .with("location.x", 10)
        .with("location.y", 64)
        .with("location.z", -3)
}

fn session(query: Query, flags: &[Flag]) -> QuerySession {
    let mut session = QuerySession::new(Requester::console());
    session.set_query(query);
    for flag in flags {
        session.add_flag(*flag);
    }
    session
}

fn recent(hours_ago: i64) -> DateTime<Utc> {
    Utc::now() - Duration::hours(hours_ago)
}

#[tokio::test]
async fn test_round_trip_without_grouping() {
    let dir = TempDir::new().unwrap();
    let handler = open_handler(&dir);

    handler
        .write(vec![record("break", "tnt", recent(1)), record("place", "alice", recent(2))])
        .await
        .unwrap();

    let query = Query::new().with_condition(FieldCondition::equals(keys::cause(), "tnt").unwrap());
    let entries = handler.query(&session(query, &[Flag::NoGroup])).await.unwrap();

    assert_eq!(entries.len(), 1);
    let entry = &entries[0];
    assert!(!entry.is_aggregate());
    assert_eq!(entry.event(), "break");
    assert_eq!(entry.data().get_str(&keys::location("world")), Some("world"));
    assert_eq!(
        entry.data().get(&keys::location("x")).and_then(|v| v.as_i64()),
        Some(10)
    );
    assert!(entry.data().contains(&keys::created()));
}

#[tokio::test]
async fn test_grouped_rows_count_per_day() {
    let dir = TempDir::new().unwrap();
    let handler = open_handler(&dir);
    let day = Utc::now().date_naive() - chrono::Days::new(1);
    let at = |hour| Utc.from_utc_datetime(&day.and_hms_opt(hour, 15, 0).unwrap());

    handler
        .write(vec![
            record("break", "tnt", at(3)),
            record("break", "tnt", at(20)),
            record("break", "creeper", at(4)),
        ])
        .await
        .unwrap();

    let entries = handler.query(&session(Query::new(), &[])).await.unwrap();
    assert_eq!(entries.len(), 2);

    let tnt = entries
        .iter()
        .filter_map(DataEntry::as_aggregate)
        .find(|a| a.data.get_str(&keys::cause()) == Some("tnt"))
        .unwrap();
    assert_eq!(tnt.count, 2);
    assert_eq!(tnt.date.date_naive(), day);
    assert_eq!(tnt.date.hour(), 0);
    assert_eq!(tnt.data.get(&keys::count()).and_then(|v| v.as_i64()), Some(2));
}

#[tokio::test]
async fn test_grouping_uses_session_time_zone() {
    let dir = TempDir::new().unwrap();
    let handler = open_handler(&dir);
    let day = Utc::now().date_naive() - chrono::Days::new(1);
    let at = |hour| Utc.from_utc_datetime(&day.and_hms_opt(hour, 0, 0).unwrap());

    // 01:00 and 23:00 UTC fall on different days five hours west.
    handler
        .write(vec![record("break", "tnt", at(1)), record("break", "tnt", at(23))])
        .await
        .unwrap();

    let west = FixedOffset::west_opt(5 * 3600).unwrap();
    let session = session(Query::new(), &[]).with_time_zone(west);
    let entries = handler.query(&session).await.unwrap();

    assert_eq!(entries.len(), 2);
    for entry in &entries {
        let aggregate = entry.as_aggregate().unwrap();
        assert_eq!(aggregate.count, 1);
        assert_eq!(aggregate.date.offset(), &west);
    }
}

#[tokio::test]
async fn test_limit_and_sort_order() {
    let dir = TempDir::new().unwrap();
    let handler = open_handler(&dir);

    handler
        .write(vec![
            record("break", "second", recent(2)),
            record("break", "newest", recent(1)),
            record("break", "oldest", recent(3)),
        ])
        .await
        .unwrap();

    let mut ascending = session(Query::new().with_limit(2), &[Flag::NoGroup]);
    ascending.set_sort_order(SortOrder::Ascending);
    let causes: Vec<_> = handler
        .query(&ascending)
        .await
        .unwrap()
        .iter()
        .map(|e| e.data().get_str(&keys::cause()).unwrap().to_string())
        .collect();
    assert_eq!(causes, ["oldest", "second"]);

    let descending = session(Query::new().with_limit(1), &[Flag::NoGroup]);
    let entries = handler.query(&descending).await.unwrap();
    assert_eq!(entries[0].data().get_str(&keys::cause()), Some("newest"));
}

#[tokio::test]
async fn test_no_chat_excludes_messages() {
    let dir = TempDir::new().unwrap();
    let handler = open_handler(&dir);

    handler
        .write(vec![
            record("say", "alice", recent(1)).with(keys::MESSAGE, "hello"),
            record("break", "alice", recent(1)),
        ])
        .await
        .unwrap();

    let all = handler.query(&session(Query::new(), &[Flag::NoGroup])).await.unwrap();
    assert_eq!(all.len(), 2);

    let quiet = handler
        .query(&session(Query::new(), &[Flag::NoGroup, Flag::NoChat]))
        .await
        .unwrap();
    assert_eq!(quiet.len(), 1);
    assert_eq!(quiet[0].event(), "break");
}

#[tokio::test]
async fn test_expired_records_are_hidden_and_purged() {
    let dir = TempDir::new().unwrap();
    let config = StorageConfig::new(dir.path()).with_record_expiry("1d");
    let handler = DocumentRecordHandler::open(&config).unwrap();

    handler
        .write(vec![record("break", "old", recent(48)), record("break", "new", recent(1))])
        .await
        .unwrap();

    let entries = handler.query(&session(Query::new(), &[Flag::NoGroup])).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].data().get_str(&keys::cause()), Some("new"));

    let store = handler.store();
    assert_eq!(store.len(), 2);
    assert_eq!(store.purge_expired(Utc::now().timestamp_micros()).unwrap(), 1);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_player_id_resolved_into_cause() {
    let dir = TempDir::new().unwrap();
    let known = Uuid::new_v4();
    let unknown = Uuid::new_v4();
    let directory = StaticPlayerDirectory::new().with_player("Alice", known);
    let handler = open_handler(&dir).with_player_directory(Arc::new(directory));

    handler
        .write(vec![
            record("break", "player", recent(1)).with(keys::PLAYER_ID, known.to_string()),
            record("place", "player", recent(2)).with(keys::PLAYER_ID, unknown.to_string()),
        ])
        .await
        .unwrap();

    let mut session = session(Query::new(), &[Flag::NoGroup]);
    session.set_sort_order(SortOrder::Descending);
    let entries = handler.query(&session).await.unwrap();

    assert_eq!(entries[0].data().get_str(&keys::cause()), Some("Alice"));
    let fallback = unknown.to_string();
    assert_eq!(entries[1].data().get_str(&keys::cause()), Some(fallback.as_str()));
}

#[tokio::test]
async fn test_malformed_record_does_not_block_batch() {
    let dir = TempDir::new().unwrap();
    let handler = open_handler(&dir);

    let err = handler
        .write(vec![
            DataWrapper::new().with(keys::CAUSE, "nobody"),
            record("break", "tnt", recent(1)),
        ])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::BatchWrite { failed: 1, total: 2 }));

    let entries = handler.query(&session(Query::new(), &[Flag::NoGroup])).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].event(), "break");
}

#[tokio::test]
async fn test_non_finite_number_counts_as_malformed() {
    let dir = TempDir::new().unwrap();
    let handler = open_handler(&dir);

    let err = handler
        .write(vec![
            record("break", "tnt", recent(1)),
            record("place", "alice", recent(2)).with("location.x", f64::INFINITY),
        ])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::BatchWrite { failed: 1, total: 2 }));

    let entries = handler.query(&session(Query::new(), &[Flag::NoGroup])).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].event(), "break");
}

#[tokio::test]
async fn test_unrepresentable_expiry_counts_as_malformed() {
    let dir = TempDir::new().unwrap();
    let handler = open_handler(&dir);

    let err = handler
        .write(vec![
            record("break", "tnt", DateTime::<Utc>::MAX_UTC),
            record("break", "tnt", recent(1)),
        ])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::BatchWrite { failed: 1, total: 2 }));
}

#[tokio::test]
async fn test_created_lower_bound_limits_results() {
    let dir = TempDir::new().unwrap();
    let handler = open_handler(&dir);

    handler
        .write(vec![
            record("break", "tnt", recent(1)),
            record("break", "creeper", recent(30)),
            record("place", "alice", recent(60)),
        ])
        .await
        .unwrap();

    let query = Query::new().with_condition(
        FieldCondition::of(keys::created(), MatchRule::GreaterThanEqual, recent(36)).unwrap(),
    );
    let entries = handler.query(&session(query, &[Flag::NoGroup])).await.unwrap();

    let causes: Vec<&str> = entries
        .iter()
        .filter_map(|e| e.data().get_str(&keys::cause()))
        .collect();
    assert_eq!(causes, vec!["tnt", "creeper"]);
}

#[test]
fn test_unknown_handler_rejected() {
    let mut config = StorageConfig::temporary();
    config.handler = "mongodb".to_string();
    let err = DocumentRecordHandler::open(&config).err().unwrap();
    assert!(matches!(err, Error::Config(_)));
}
