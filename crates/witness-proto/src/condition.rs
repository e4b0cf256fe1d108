//! Backend-agnostic condition tree.
//!
//! A query is a list of [`SearchCondition`]s. Each is either a leaf
//! [`FieldCondition`] or a nested [`SearchConditionGroup`]. Nothing in this
//! module knows how a storage backend evaluates the tree; backends walk it
//! through a [`ConditionVisitor`], which the compiler forces to be total over
//! both variants.

use std::fmt;
use std::ops::Bound;

use crate::error::Error;
use crate::key::DataKey;
use crate::value::DataValue;

/// How a field condition's value is compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchRule {
    Equals,
    Exists,
    Includes,
    GreaterThanEqual,
    LessThanEqual,
    Between,
}

impl fmt::Display for MatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MatchRule::Equals => "EQUALS",
            MatchRule::Exists => "EXISTS",
            MatchRule::Includes => "INCLUDES",
            MatchRule::GreaterThanEqual => "GREATER_THAN_EQUAL",
            MatchRule::LessThanEqual => "LESS_THAN_EQUAL",
            MatchRule::Between => "BETWEEN",
        };
        f.write_str(name)
    }
}

/// A numeric range whose ends may be inclusive, exclusive or unbounded.
///
/// Backends must honour the bound kinds as given.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueRange {
    pub lower: Bound<f64>,
    pub upper: Bound<f64>,
}

impl ValueRange {
    /// `[lower, upper]`
    pub fn closed(lower: f64, upper: f64) -> Self {
        Self {
            lower: Bound::Included(lower),
            upper: Bound::Included(upper),
        }
    }

    /// `(lower, upper)`
    pub fn open(lower: f64, upper: f64) -> Self {
        Self {
            lower: Bound::Excluded(lower),
            upper: Bound::Excluded(upper),
        }
    }

    /// `[lower, +inf)`
    pub fn at_least(lower: f64) -> Self {
        Self {
            lower: Bound::Included(lower),
            upper: Bound::Unbounded,
        }
    }

    /// Check if both ends are bounded.
    pub fn is_two_sided(&self) -> bool {
        !matches!(self.lower, Bound::Unbounded) && !matches!(self.upper, Bound::Unbounded)
    }

    /// Check if `value` lies within the range.
    pub fn contains(&self, value: f64) -> bool {
        let lower_ok = match self.lower {
            Bound::Included(l) => value >= l,
            Bound::Excluded(l) => value > l,
            Bound::Unbounded => true,
        };
        let upper_ok = match self.upper {
            Bound::Included(u) => value <= u,
            Bound::Excluded(u) => value < u,
            Bound::Unbounded => true,
        };
        lower_ok && upper_ok
    }
}

/// The value side of a field condition.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionValue {
    /// A single primitive (including booleans).
    Scalar(DataValue),
    /// An ordered list of primitives.
    List(Vec<DataValue>),
    /// A numeric range.
    Range(ValueRange),
}

impl From<DataValue> for ConditionValue {
    fn from(v: DataValue) -> Self {
        match v {
            DataValue::List(items) => ConditionValue::List(items),
            other => ConditionValue::Scalar(other),
        }
    }
}

macro_rules! scalar_condition_value {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for ConditionValue {
                fn from(v: $ty) -> Self {
                    ConditionValue::Scalar(v.into())
                }
            }
        )*
    };
}

scalar_condition_value!(bool, i32, i64, u32, f64, String, &str, chrono::DateTime<chrono::Utc>);

impl<T: Into<DataValue>> From<Vec<T>> for ConditionValue {
    fn from(v: Vec<T>) -> Self {
        ConditionValue::List(v.into_iter().map(Into::into).collect())
    }
}

impl From<ValueRange> for ConditionValue {
    fn from(v: ValueRange) -> Self {
        ConditionValue::Range(v)
    }
}

/// Leaf of the condition tree.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldCondition {
    field: DataKey,
    rule: MatchRule,
    value: ConditionValue,
}

impl FieldCondition {
    /// Create a field condition, validating that `value` fits `rule`.
    ///
    /// - `Between` requires a two-sided range.
    /// - `Includes` requires a list.
    /// - `Exists` requires a boolean.
    /// - A range is only meaningful with `Between`.
    pub fn of(
        field: DataKey,
        rule: MatchRule,
        value: impl Into<ConditionValue>,
    ) -> Result<Self, Error> {
        if field.is_empty() {
            return Err(Error::EmptyKey);
        }
        let value = value.into();

        match (rule, &value) {
            (MatchRule::Between, ConditionValue::Range(range)) if range.is_two_sided() => {}
            (MatchRule::Between, _) => {
                return Err(Error::InvalidArgument(format!(
                    "{} on '{}' requires a two-sided value range",
                    rule, field
                )));
            }
            (MatchRule::Includes, ConditionValue::List(_)) => {}
            (MatchRule::Includes, _) => {
                return Err(Error::InvalidArgument(format!(
                    "{} on '{}' requires a list value",
                    rule, field
                )));
            }
            (MatchRule::Exists, ConditionValue::Scalar(DataValue::Bool(_))) => {}
            (MatchRule::Exists, _) => {
                return Err(Error::InvalidArgument(format!(
                    "{} on '{}' requires a boolean value",
                    rule, field
                )));
            }
            (_, ConditionValue::Range(_)) => {
                return Err(Error::InvalidArgument(format!(
                    "a value range on '{}' requires {}",
                    field,
                    MatchRule::Between
                )));
            }
            _ => {}
        }

        Ok(Self { field, rule, value })
    }

    /// Shorthand for an `Equals` condition.
    pub fn equals(field: DataKey, value: impl Into<DataValue>) -> Result<Self, Error> {
        Self::of(field, MatchRule::Equals, ConditionValue::from(value.into()))
    }

    /// Shorthand for an `Exists` condition.
    pub fn exists(field: DataKey, present: bool) -> Result<Self, Error> {
        Self::of(field, MatchRule::Exists, present)
    }

    pub fn field(&self) -> &DataKey {
        &self.field
    }

    pub fn rule(&self) -> MatchRule {
        self.rule
    }

    pub fn value(&self) -> &ConditionValue {
        &self.value
    }
}

/// Boolean operator of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupOperator {
    And,
    Or,
}

/// A nested group of conditions.
///
/// An AND group is a flat conjunction that a backend may inline into its
/// parent. An OR group is always its own disjunction scope.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConditionGroup {
    operator: GroupOperator,
    conditions: Vec<SearchCondition>,
}

impl SearchConditionGroup {
    pub fn new(operator: GroupOperator) -> Self {
        Self {
            operator,
            conditions: Vec::new(),
        }
    }

    pub fn and() -> Self {
        Self::new(GroupOperator::And)
    }

    pub fn or() -> Self {
        Self::new(GroupOperator::Or)
    }

    /// Append a child condition.
    pub fn add(&mut self, condition: impl Into<SearchCondition>) -> &mut Self {
        self.conditions.push(condition.into());
        self
    }

    /// Builder-style [`add`](Self::add).
    pub fn with(mut self, condition: impl Into<SearchCondition>) -> Self {
        self.add(condition);
        self
    }

    pub fn operator(&self) -> GroupOperator {
        self.operator
    }

    pub fn conditions(&self) -> &[SearchCondition] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

/// A node in the condition tree.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchCondition {
    Field(FieldCondition),
    Group(SearchConditionGroup),
}

impl SearchCondition {
    /// Dispatch to the visitor method for this variant.
    pub fn accept<V: ConditionVisitor>(&self, visitor: &mut V) -> V::Output {
        match self {
            SearchCondition::Field(field) => visitor.visit_field(field),
            SearchCondition::Group(group) => visitor.visit_group(group),
        }
    }

    /// Check if any leaf in this subtree targets `field`.
    pub fn references(&self, field: &DataKey) -> bool {
        match self {
            SearchCondition::Field(f) => f.field() == field,
            SearchCondition::Group(g) => g.conditions().iter().any(|c| c.references(field)),
        }
    }
}

impl From<FieldCondition> for SearchCondition {
    fn from(v: FieldCondition) -> Self {
        SearchCondition::Field(v)
    }
}

impl From<SearchConditionGroup> for SearchCondition {
    fn from(v: SearchConditionGroup) -> Self {
        SearchCondition::Group(v)
    }
}

/// Visitor over the condition tree.
pub trait ConditionVisitor {
    type Output;

    fn visit_field(&mut self, condition: &FieldCondition) -> Self::Output;

    fn visit_group(&mut self, group: &SearchConditionGroup) -> Self::Output;
}
