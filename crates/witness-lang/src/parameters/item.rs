use std::net::IpAddr;

use witness_proto::{keys, DataKey, FieldCondition, Query, QuerySession};

use super::{one_of, split_values};
use crate::error::ParameterError;
use crate::handler::{ParameterHandler, PendingConditions};

/// `cu:yes` keeps only records whose item carries custom metadata, `cu:no`
/// only those without.
#[derive(Debug, Clone, Copy, Default)]
pub struct CustomItemParameter;

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "y" | "yes" | "true" => Some(true),
        "n" | "no" | "false" => Some(false),
        _ => None,
    }
}

impl ParameterHandler for CustomItemParameter {
    fn name(&self) -> &str {
        "custom"
    }

    fn aliases(&self) -> &[&'static str] {
        &["cu", "custom"]
    }

    fn accepts_value(&self, value: &str) -> bool {
        parse_flag(value).is_some()
    }

    fn build_for_query(
        &self,
        _session: &QuerySession,
        alias: &str,
        value: &str,
        query: &mut Query,
    ) -> Result<Option<PendingConditions>, ParameterError> {
        let present =
            parse_flag(value).ok_or_else(|| ParameterError::invalid_value(alias, value))?;
        query.add_condition(FieldCondition::exists(
            DataKey::of(keys::ITEM).then(keys::META),
            present,
        )?);
        Ok(None)
    }
}

/// Matches free text such as a chat message or an item's display name.
///
/// Underscores stand in for spaces, since tokens are split on whitespace.
#[derive(Debug, Clone)]
pub struct TextParameter {
    name: &'static str,
    aliases: &'static [&'static str],
    field: DataKey,
}

impl TextParameter {
    /// `m:hello_there` matches chat records with the exact message text.
    pub fn message() -> Self {
        Self {
            name: "message",
            aliases: &["m", "message"],
            field: keys::message(),
        }
    }

    /// `iname:Excalibur` matches items by display name.
    pub fn item_name() -> Self {
        Self {
            name: "item-name",
            aliases: &["iname", "itemname"],
            field: keys::item(keys::NAME),
        }
    }

    /// `idesc:Forged_in_fire` matches items carrying the given lore line.
    pub fn item_desc() -> Self {
        Self {
            name: "item-desc",
            aliases: &["idesc", "itemdesc"],
            field: keys::item(keys::LORE),
        }
    }

    pub fn field(&self) -> &DataKey {
        &self.field
    }
}

impl ParameterHandler for TextParameter {
    fn name(&self) -> &str {
        self.name
    }

    fn aliases(&self) -> &[&'static str] {
        self.aliases
    }

    fn accepts_value(&self, value: &str) -> bool {
        !value.is_empty()
    }

    fn build_for_query(
        &self,
        _session: &QuerySession,
        _alias: &str,
        value: &str,
        query: &mut Query,
    ) -> Result<Option<PendingConditions>, ParameterError> {
        query.add_condition(FieldCondition::equals(
            self.field.clone(),
            value.replace('_', " "),
        )?);
        Ok(None)
    }
}

/// `ip:10.0.0.1,::1` matches records by the actor's network address.
#[derive(Debug, Clone, Copy, Default)]
pub struct IpParameter;

impl ParameterHandler for IpParameter {
    fn name(&self) -> &str {
        "ip"
    }

    fn aliases(&self) -> &[&'static str] {
        &["ip"]
    }

    fn accepts_value(&self, value: &str) -> bool {
        !value.is_empty() && value.split(',').all(|v| v.parse::<IpAddr>().is_ok())
    }

    fn build_for_query(
        &self,
        _session: &QuerySession,
        alias: &str,
        value: &str,
        query: &mut Query,
    ) -> Result<Option<PendingConditions>, ParameterError> {
        let addresses = split_values(value)
            .into_iter()
            .map(|v| {
                v.parse::<IpAddr>()
                    .map(|ip| ip.to_string())
                    .map_err(|_| ParameterError::invalid_value(alias, value))
            })
            .collect::<Result<Vec<_>, _>>()?;
        query.add_condition(one_of(DataKey::of(keys::IP_ADDRESS), addresses)?);
        Ok(None)
    }
}
