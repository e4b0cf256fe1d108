//! End-to-end search compilation through the built-in registry.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use uuid::Uuid;
use witness_lang::{
    DefaultUsed, HandlerRegistry, ParameterError, ParameterHandler, PendingConditions,
    QueryBuilder, QueryConfig, RegistryError,
};
use witness_proto::{
    keys, ConditionValue, DataKey, Flag, FieldCondition, Location, MatchRule, Query,
    QuerySession, Requester, SearchCondition, StaticPlayerDirectory, ValueRange,
};

/// Minimal handler used to exercise the compiler's bookkeeping.
struct TestParameter {
    name: &'static str,
    aliases: &'static [&'static str],
    conflicts_with: Option<&'static str>,
    conflicting_value: Option<&'static str>,
    console_allowed: bool,
    defaults: Arc<AtomicUsize>,
    delay: Option<Duration>,
}

impl TestParameter {
    fn new(name: &'static str, aliases: &'static [&'static str]) -> Self {
        Self {
            name,
            aliases,
            conflicts_with: None,
            conflicting_value: None,
            console_allowed: true,
            defaults: Arc::new(AtomicUsize::new(0)),
            delay: None,
        }
    }
}

impl ParameterHandler for TestParameter {
    fn name(&self) -> &str {
        self.name
    }

    fn aliases(&self) -> &[&'static str] {
        self.aliases
    }

    fn can_run(&self, requester: &Requester) -> bool {
        self.console_allowed || !requester.is_console()
    }

    fn accepts_value(&self, _value: &str) -> bool {
        true
    }

    fn does_conflict(&self, _candidate: (&str, &str), existing: (&str, &str)) -> bool {
        self.conflicts_with == Some(existing.0)
            && self.conflicting_value.map_or(true, |value| value == existing.1)
    }

    fn build_for_query(
        &self,
        _session: &QuerySession,
        _alias: &str,
        value: &str,
        query: &mut Query,
    ) -> Result<Option<PendingConditions>, ParameterError> {
        let condition = FieldCondition::equals(DataKey::of(self.name), value)?;
        match self.delay {
            None => {
                query.add_condition(condition);
                Ok(None)
            }
            Some(delay) => Ok(Some(Box::pin(async move {
                tokio::time::sleep(delay).await;
                Ok(vec![condition.into()])
            }))),
        }
    }

    fn process_default(
        &self,
        _session: &QuerySession,
        query: &mut Query,
    ) -> Result<Option<DefaultUsed>, ParameterError> {
        self.defaults.fetch_add(1, Ordering::SeqCst);
        query.add_condition(FieldCondition::equals(DataKey::of(self.name), "default")?);
        Ok(Some(DefaultUsed::new(self.aliases[0], "default")))
    }
}

fn test_builder(handlers: Vec<TestParameter>, config: QueryConfig) -> QueryBuilder {
    let registry = HandlerRegistry::new();
    for handler in handlers {
        registry.register_parameter_handler(Arc::new(handler)).unwrap();
    }
    QueryBuilder::new(Arc::new(registry), config)
}

fn field_conditions(query: &Query) -> Vec<&FieldCondition> {
    query
        .conditions()
        .iter()
        .filter_map(|c| match c {
            SearchCondition::Field(f) => Some(f),
            SearchCondition::Group(_) => None,
        })
        .collect()
}

#[test]
fn test_alias_uniqueness() {
    let registry = HandlerRegistry::new();
    registry
        .register_parameter_handler(Arc::new(TestParameter::new("first", &["a", "alpha"])))
        .unwrap();

    let err = registry
        .register_parameter_handler(Arc::new(TestParameter::new("second", &["b", "ALPHA"])))
        .unwrap_err();
    assert_eq!(
        err,
        RegistryError::AliasConflict {
            alias: "ALPHA".into(),
            handler: "second".into(),
            existing: "first".into(),
        }
    );
    assert_eq!(registry.parameter_handlers().len(), 1);
}

#[test]
fn test_conflicting_parameters() {
    let mut second = TestParameter::new("second", &["b"]);
    second.conflicts_with = Some("a");
    let builder = test_builder(
        vec![TestParameter::new("first", &["a"]), second],
        QueryConfig::default().with_defaults_enabled(false),
    );

    let mut session = QuerySession::new(Requester::console());
    let err = builder.prepare(&mut session, &["a:1", "b:2"]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Parameter 'b:2' conflicts with other parameter: 'a:1'"
    );

    // Order matters: the conflict is only checked against earlier tokens.
    builder.prepare(&mut session, &["b:2", "a:1"]).unwrap();
}

#[test]
fn test_repeated_alias_applies_both_and_last_value_wins() {
    let mut guard = TestParameter::new("guard", &["g"]);
    guard.conflicts_with = Some("c");
    guard.conflicting_value = Some("a");
    let builder = test_builder(
        vec![TestParameter::new("cause", &["c"]), guard],
        QueryConfig::default().with_defaults_enabled(false),
    );

    let mut session = QuerySession::new(Requester::console());
    let compiled = builder.prepare(&mut session, &["c:a", "c:b", "g:1"]).unwrap();
    let values: Vec<&ConditionValue> = field_conditions(compiled.query())
        .iter()
        .map(|f| f.value())
        .collect();
    assert_eq!(
        values,
        vec![
            &ConditionValue::from("a"),
            &ConditionValue::from("b"),
            &ConditionValue::from("1"),
        ]
    );

    let err = builder.prepare(&mut session, &["c:b", "c:a", "g:1"]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Parameter 'g:1' conflicts with other parameter: 'c:a'"
    );
}

#[test]
fn test_time_window_out_of_range_is_rejected() {
    let config = QueryConfig::default();
    let registry =
        HandlerRegistry::with_builtins(&config, Arc::new(StaticPlayerDirectory::new())).unwrap();
    let builder = QueryBuilder::new(Arc::new(registry), config);

    let mut session = QuerySession::new(Requester::console());
    let err = builder
        .prepare(&mut session, &["t:100000000000000s"])
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Invalid value '100000000000000s' for parameter 't'"
    );
}

#[test]
fn test_default_injected_once_and_skipped_when_given() {
    let handler = TestParameter::new("first", &["a", "alpha"]);
    let defaults = Arc::clone(&handler.defaults);
    let builder = test_builder(vec![handler], QueryConfig::default());

    let mut session = QuerySession::new(Requester::console());
    let compiled = builder.prepare(&mut session, &[] as &[&str]).unwrap();
    assert_eq!(defaults.load(Ordering::SeqCst), 1);
    assert_eq!(compiled.query().conditions().len(), 1);
    assert_eq!(
        compiled.defaults_notice().as_deref(),
        Some("Defaults used: a:default")
    );

    let compiled = builder.prepare(&mut session, &["alpha:x"]).unwrap();
    assert_eq!(defaults.load(Ordering::SeqCst), 1);
    assert_eq!(compiled.defaults_notice(), None);
}

#[test]
fn test_default_offered_to_handlers_the_requester_cannot_run() {
    let mut handler = TestParameter::new("restricted", &["x"]);
    handler.console_allowed = false;
    let defaults = Arc::clone(&handler.defaults);
    let builder = test_builder(vec![handler], QueryConfig::default());

    let mut session = QuerySession::new(Requester::console());
    let err = builder.prepare(&mut session, &["x:1"]).unwrap_err();
    assert_eq!(err, ParameterError::NotAllowed("x".into()));

    let compiled = builder.prepare(&mut session, &[] as &[&str]).unwrap();
    assert_eq!(defaults.load(Ordering::SeqCst), 1);
    assert_eq!(
        compiled.defaults_notice().as_deref(),
        Some("Defaults used: x:default")
    );
}

#[test]
fn test_console_gets_no_radius_default() {
    let config = QueryConfig::default();
    let registry =
        HandlerRegistry::with_builtins(&config, Arc::new(StaticPlayerDirectory::new())).unwrap();
    let builder = QueryBuilder::new(Arc::new(registry), config);

    let mut session = QuerySession::new(Requester::console());
    let compiled = builder.prepare(&mut session, &["c:tnt"]).unwrap();
    assert_eq!(compiled.defaults_notice().as_deref(), Some("Defaults used: t:3d"));
    assert!(!compiled.query().references(&keys::location(keys::WORLD)));
}

#[test]
fn test_ignore_default_by_name() {
    let config = QueryConfig::default();
    let registry =
        HandlerRegistry::with_builtins(&config, Arc::new(StaticPlayerDirectory::new())).unwrap();
    let builder = QueryBuilder::new(Arc::new(registry), config);

    let mut session = QuerySession::new(Requester::console());
    let compiled = builder.prepare(&mut session, &["-id=t", "c:tnt"]).unwrap();
    assert_eq!(compiled.defaults_notice(), None);
    assert!(session.has_flag(Flag::IgnoreDefault));
    assert!(!compiled.query().references(&keys::created()));
}

#[tokio::test]
async fn test_player_no_group_radius() {
    let alice = Uuid::new_v4();
    let directory = Arc::new(StaticPlayerDirectory::new().with_player("Alice", alice));
    let config = QueryConfig::default();
    let registry = HandlerRegistry::with_builtins(&config, directory).unwrap();
    let builder = QueryBuilder::new(Arc::new(registry), config);

    let requester = Requester::player(
        "Steve",
        Uuid::new_v4(),
        Location::new("world", 100.0, 64.0, -20.0),
    );
    let mut session = QuerySession::new(requester);

    let query = builder
        .from_arguments(&mut session, &["player:Alice", "-no-group", "radius:10"])
        .await
        .unwrap();

    assert!(session.has_flag(Flag::NoGroup));
    assert_eq!(session.query(), &query);

    let fields = field_conditions(&query);
    let names: Vec<String> = fields.iter().map(|f| f.field().to_string()).collect();
    assert_eq!(
        names,
        vec![
            "location.world",
            "location.x",
            "location.y",
            "location.z",
            "created",
            "player",
        ]
    );

    let x = fields[1];
    assert_eq!(x.rule(), MatchRule::Between);
    assert_eq!(x.value(), &ConditionValue::Range(ValueRange::closed(90.0, 110.0)));

    let player = fields[5];
    assert_eq!(player.rule(), MatchRule::Equals);
    assert_eq!(player.value(), &ConditionValue::from(alice.to_string()));
}

#[tokio::test]
async fn test_pending_lookups_time_out() {
    let mut slow = TestParameter::new("slow", &["s"]);
    slow.delay = Some(Duration::from_secs(5));
    let builder = test_builder(
        vec![slow],
        QueryConfig::default()
            .with_defaults_enabled(false)
            .with_compile_timeout(Duration::from_millis(20)),
    );

    let mut session = QuerySession::new(Requester::console());
    let err = builder
        .from_arguments(&mut session, &["s:1"])
        .await
        .unwrap_err();
    assert_eq!(err, ParameterError::Timeout(Duration::from_millis(20)));
}

#[tokio::test]
async fn test_pending_conditions_follow_sync_ones() {
    let mut slow = TestParameter::new("slow", &["s"]);
    slow.delay = Some(Duration::from_millis(1));
    let builder = test_builder(
        vec![slow, TestParameter::new("fast", &["f"])],
        QueryConfig::default().with_defaults_enabled(false),
    );

    let mut session = QuerySession::new(Requester::console());
    let query = builder
        .from_arguments(&mut session, &["s:1", "f:2"])
        .await
        .unwrap();

    let names: Vec<String> = field_conditions(&query)
        .iter()
        .map(|f| f.field().to_string())
        .collect();
    assert_eq!(names, vec!["fast", "slow"]);
}

#[test]
fn test_bare_token_is_a_player_name() {
    let config = QueryConfig::default().with_defaults_enabled(false);
    let registry =
        HandlerRegistry::with_builtins(&config, Arc::new(StaticPlayerDirectory::new())).unwrap();
    let builder = QueryBuilder::new(Arc::new(registry), config);

    let mut session = QuerySession::new(Requester::console());
    let compiled = builder.prepare(&mut session, &["Alice"]).unwrap();
    assert_eq!(compiled.pending_count(), 1);
}

#[test]
fn test_radius_refused_for_console() {
    let config = QueryConfig::default();
    let registry =
        HandlerRegistry::with_builtins(&config, Arc::new(StaticPlayerDirectory::new())).unwrap();
    let builder = QueryBuilder::new(Arc::new(registry), config);

    let mut session = QuerySession::new(Requester::console());
    let err = builder.prepare(&mut session, &["r:10"]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "'r' cannot be run as the current command source"
    );
}
