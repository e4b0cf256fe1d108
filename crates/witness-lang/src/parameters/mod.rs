//! Built-in search parameters.

mod event;
mod field;
mod item;
mod player;
mod radius;
mod time;

pub use event::EventParameter;
pub use field::FieldParameter;
pub use item::{CustomItemParameter, IpParameter, TextParameter};
pub use player::PlayerParameter;
pub use radius::RadiusParameter;
pub use time::TimeParameter;

use witness_proto::{DataKey, DataValue, FieldCondition, MatchRule};

use crate::error::ParameterError;

/// Split a comma separated value list, dropping empty segments.
pub(crate) fn split_values(value: &str) -> Vec<&str> {
    value
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .collect()
}

/// Equality for one value, membership for several.
pub(crate) fn one_of<V>(field: DataKey, values: Vec<V>) -> Result<FieldCondition, ParameterError>
where
    V: Into<DataValue>,
{
    let mut values: Vec<DataValue> = values.into_iter().map(Into::into).collect();
    let condition = if values.len() == 1 {
        FieldCondition::equals(field, values.remove(0))?
    } else {
        FieldCondition::of(field, MatchRule::Includes, values)?
    };
    Ok(condition)
}

/// Check that every comma separated value is non-empty and made of
/// identifier characters.
pub(crate) fn is_identifier_list(value: &str) -> bool {
    !value.is_empty()
        && value.split(',').all(|v| {
            !v.is_empty()
                && v
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | ':' | '.'))
        })
}
