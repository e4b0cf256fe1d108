use witness_proto::{keys, DataKey, Query, QuerySession};

use super::{is_identifier_list, one_of, split_values};
use crate::error::ParameterError;
use crate::handler::{ParameterHandler, PendingConditions};

/// Matches a single record field against one or more literal values.
///
/// `c:creeper` becomes an equality, `c:creeper,tnt` a membership test.
#[derive(Debug, Clone)]
pub struct FieldParameter {
    name: &'static str,
    aliases: &'static [&'static str],
    field: DataKey,
    conflicts: &'static [&'static str],
    case_sensitive: bool,
}

impl FieldParameter {
    pub fn new(name: &'static str, aliases: &'static [&'static str], field: DataKey) -> Self {
        Self {
            name,
            aliases,
            field,
            conflicts: &[],
            case_sensitive: false,
        }
    }

    /// Refuse to combine with parameters using any of `aliases`.
    pub fn conflicting_with(mut self, aliases: &'static [&'static str]) -> Self {
        self.conflicts = aliases;
        self
    }

    /// Match values exactly as given instead of lowercased.
    pub fn case_sensitive(mut self) -> Self {
        self.case_sensitive = true;
        self
    }

    pub fn field(&self) -> &DataKey {
        &self.field
    }

    pub fn world() -> Self {
        Self::new("world", &["w", "world"], keys::location(keys::WORLD))
            .conflicting_with(&["r", "radius"])
            .case_sensitive()
    }

    pub fn cause() -> Self {
        Self::new("cause", &["c", "cause"], keys::cause())
    }

    pub fn block() -> Self {
        Self::new("block", &["b", "block"], DataKey::of(keys::BLOCK))
    }

    pub fn item() -> Self {
        Self::new("item", &["i", "item"], DataKey::of(keys::ITEM).then("type"))
    }

    pub fn entity() -> Self {
        Self::new("entity", &["e", "entity"], DataKey::of(keys::ENTITY_TYPE))
    }

    pub fn target() -> Self {
        Self::new("target", &["tg", "target"], DataKey::of(keys::TARGET))
    }
}

impl ParameterHandler for FieldParameter {
    fn name(&self) -> &str {
        self.name
    }

    fn aliases(&self) -> &[&'static str] {
        self.aliases
    }

    fn accepts_value(&self, value: &str) -> bool {
        is_identifier_list(value)
    }

    fn does_conflict(&self, _candidate: (&str, &str), existing: (&str, &str)) -> bool {
        self.conflicts
            .iter()
            .any(|alias| alias.eq_ignore_ascii_case(existing.0))
    }

    fn build_for_query(
        &self,
        _session: &QuerySession,
        _alias: &str,
        value: &str,
        query: &mut Query,
    ) -> Result<Option<PendingConditions>, ParameterError> {
        let values: Vec<String> = split_values(value)
            .into_iter()
            .map(|v| {
                if self.case_sensitive {
                    v.to_string()
                } else {
                    v.to_ascii_lowercase()
                }
            })
            .collect();
        query.add_condition(one_of(self.field.clone(), values)?);
        Ok(None)
    }
}
