//! Built-in search flags.

mod selection;

pub use selection::{Region, SelectionFlag, SelectionProvider};

use witness_proto::{Flag, Query, QuerySession, SortOrder};

use crate::error::ParameterError;
use crate::handler::{FlagHandler, PendingConditions};
use crate::parameters::split_values;

/// A value-less flag that only sets a session [`Flag`].
#[derive(Debug, Clone)]
pub struct SwitchFlag {
    name: &'static str,
    aliases: &'static [&'static str],
    flag: Flag,
}

impl SwitchFlag {
    pub fn new(name: &'static str, aliases: &'static [&'static str], flag: Flag) -> Self {
        Self {
            name,
            aliases,
            flag,
        }
    }

    pub fn extended() -> Self {
        Self::new("extended", &["extended", "ex"], Flag::Extended)
    }

    pub fn no_group() -> Self {
        Self::new("no-group", &["no-group", "ng"], Flag::NoGroup)
    }

    pub fn no_chat() -> Self {
        Self::new("no-chat", &["no-chat", "nc"], Flag::NoChat)
    }

    pub fn drain() -> Self {
        Self::new("drain", &["drain", "d"], Flag::Drain)
    }
}

impl FlagHandler for SwitchFlag {
    fn name(&self) -> &str {
        self.name
    }

    fn aliases(&self) -> &[&'static str] {
        self.aliases
    }

    fn process(
        &self,
        session: &mut QuerySession,
        _alias: &str,
        _value: Option<&str>,
        _query: &mut Query,
    ) -> Result<Option<PendingConditions>, ParameterError> {
        session.add_flag(self.flag);
        Ok(None)
    }
}

/// `-order=asc|desc` sets the result order.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderFlag;

impl FlagHandler for OrderFlag {
    fn name(&self) -> &str {
        "order"
    }

    fn aliases(&self) -> &[&'static str] {
        &["order", "o"]
    }

    fn accepts_value(&self, value: &str) -> bool {
        SortOrder::parse(value).is_some()
    }

    fn process(
        &self,
        session: &mut QuerySession,
        alias: &str,
        value: Option<&str>,
        _query: &mut Query,
    ) -> Result<Option<PendingConditions>, ParameterError> {
        let value = value.ok_or_else(|| ParameterError::MissingFlagValue(alias.to_string()))?;
        let order =
            SortOrder::parse(value).ok_or_else(|| ParameterError::invalid_value(alias, value))?;
        session.set_sort_order(order);
        Ok(None)
    }
}

/// `-ignore-default[=t,r]` skips the named defaults, or all of them.
#[derive(Debug, Clone, Copy, Default)]
pub struct IgnoreDefaultFlag;

impl FlagHandler for IgnoreDefaultFlag {
    fn name(&self) -> &str {
        "ignore-default"
    }

    fn aliases(&self) -> &[&'static str] {
        &["ignore-default", "id"]
    }

    fn accepts_value(&self, value: &str) -> bool {
        !split_values(value).is_empty()
    }

    fn process(
        &self,
        session: &mut QuerySession,
        _alias: &str,
        value: Option<&str>,
        _query: &mut Query,
    ) -> Result<Option<PendingConditions>, ParameterError> {
        session.add_flag(Flag::IgnoreDefault);
        match value {
            Some(value) => {
                for name in split_values(value) {
                    session.ignore_default(name.to_ascii_lowercase());
                }
            }
            None => session.ignore_all_defaults(),
        }
        Ok(None)
    }
}

/// `-global` drops the location-based radius default.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalFlag;

impl FlagHandler for GlobalFlag {
    fn name(&self) -> &str {
        "global"
    }

    fn aliases(&self) -> &[&'static str] {
        &["global", "g"]
    }

    fn process(
        &self,
        session: &mut QuerySession,
        _alias: &str,
        _value: Option<&str>,
        _query: &mut Query,
    ) -> Result<Option<PendingConditions>, ParameterError> {
        session.add_flag(Flag::Global);
        session.ignore_default("radius");
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use witness_proto::Requester;

    fn run(handler: &dyn FlagHandler, value: Option<&str>) -> QuerySession {
        let mut session = QuerySession::new(Requester::console());
        let mut query = Query::new();
        let alias = handler.aliases()[0];
        handler
            .process(&mut session, alias, value, &mut query)
            .unwrap();
        session
    }

    #[test]
    fn test_switch_sets_flag() {
        let session = run(&SwitchFlag::no_group(), None);
        assert!(session.has_flag(Flag::NoGroup));
        assert!(SwitchFlag::no_chat().handles("NC"));
        assert!(!SwitchFlag::no_chat().accepts_value("x"));
    }

    #[test]
    fn test_order() {
        let session = run(&OrderFlag, Some("asc"));
        assert_eq!(session.sort_order(), SortOrder::Ascending);

        let mut session = QuerySession::new(Requester::console());
        let err = OrderFlag
            .process(&mut session, "o", None, &mut Query::new())
            .err()
            .unwrap();
        assert_eq!(err, ParameterError::MissingFlagValue("o".into()));
    }

    #[test]
    fn test_ignore_default() {
        let session = run(&IgnoreDefaultFlag, Some("t,R"));
        assert!(session.is_ignored_default("t"));
        assert!(session.is_ignored_default("r"));
        assert!(!session.is_ignored_default("radius"));

        let session = run(&IgnoreDefaultFlag, None);
        assert!(session.is_ignored_default("radius"));
    }

    #[test]
    fn test_global_ignores_radius() {
        let session = run(&GlobalFlag, None);
        assert!(session.has_flag(Flag::Global));
        assert!(session.is_ignored_default("radius"));
        assert!(!session.is_ignored_default("time"));
    }
}
