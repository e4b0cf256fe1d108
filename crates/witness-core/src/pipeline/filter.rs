//! Native match filters and their translation from the condition tree.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Bound;

use witness_proto::{
    ConditionValue, ConditionVisitor, DataKey, DataValue, FieldCondition, GroupOperator, MatchRule,
    SearchCondition, SearchConditionGroup,
};

use crate::codec::encode_value;
use crate::document::{Document, Value};
use crate::error::Error;

/// One comparison applied to a field.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Eq(Value),
    Exists(bool),
    In(Vec<Value>),
    Nin(Vec<Value>),
    Gte(Value),
    Gt(Value),
    Lte(Value),
    Lt(Value),
}

impl Predicate {
    fn operator(&self) -> &'static str {
        match self {
            Predicate::Eq(_) => "$eq",
            Predicate::Exists(_) => "$exists",
            Predicate::In(_) => "$in",
            Predicate::Nin(_) => "$nin",
            Predicate::Gte(_) => "$gte",
            Predicate::Gt(_) => "$gt",
            Predicate::Lte(_) => "$lte",
            Predicate::Lt(_) => "$lt",
        }
    }

    /// Evaluate against a field's value, `None` when the field is absent.
    ///
    /// An array field matches equality and membership if any element does.
    pub fn matches(&self, field: Option<&Value>) -> bool {
        match self {
            Predicate::Exists(expected) => field.is_some() == *expected,
            Predicate::Eq(expected) => {
                field.is_some_and(|v| any_element(v, |e| e.loosely_equals(expected)))
            }
            Predicate::In(values) => field.is_some_and(|v| {
                any_element(v, |e| values.iter().any(|candidate| e.loosely_equals(candidate)))
            }),
            Predicate::Nin(values) => !field.is_some_and(|v| {
                any_element(v, |e| values.iter().any(|candidate| e.loosely_equals(candidate)))
            }),
            Predicate::Gte(bound) => compare(field, bound, |o| o.is_ge()),
            Predicate::Gt(bound) => compare(field, bound, |o| o.is_gt()),
            Predicate::Lte(bound) => compare(field, bound, |o| o.is_le()),
            Predicate::Lt(bound) => compare(field, bound, |o| o.is_lt()),
        }
    }
}

fn any_element(value: &Value, test: impl Fn(&Value) -> bool) -> bool {
    match value {
        Value::Array(items) => items.iter().any(&test) || test(value),
        other => test(other),
    }
}

fn compare(field: Option<&Value>, bound: &Value, test: fn(std::cmp::Ordering) -> bool) -> bool {
    field
        .and_then(|v| v.compare(bound))
        .is_some_and(test)
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Exists(b) => write!(f, "{:?}: {}", self.operator(), b),
            Predicate::In(values) | Predicate::Nin(values) => {
                write!(f, "{:?}: {}", self.operator(), Value::Array(values.clone()))
            }
            Predicate::Eq(v)
            | Predicate::Gte(v)
            | Predicate::Gt(v)
            | Predicate::Lte(v)
            | Predicate::Lt(v) => write!(f, "{:?}: {}", self.operator(), v),
        }
    }
}

/// A conjunction of per-field predicates and disjunction groups.
///
/// Predicates on the same field collapse into one composite entry. Each
/// entry of `any_of` is an OR scope that must have at least one matching
/// branch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    fields: BTreeMap<DataKey, Vec<Predicate>>,
    any_of: Vec<Vec<Filter>>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Translate a list of conditions, joined by AND.
    pub fn from_conditions(conditions: &[SearchCondition]) -> Result<Self, Error> {
        let mut translator = FilterTranslator;
        let mut filter = Filter::new();
        for condition in conditions {
            filter.merge(condition.accept(&mut translator)?);
        }
        Ok(filter)
    }

    pub fn add(&mut self, field: DataKey, predicate: Predicate) {
        self.fields.entry(field).or_default().push(predicate);
    }

    /// Predicates on `field`, if any.
    pub fn predicates(&self, field: &DataKey) -> Option<&[Predicate]> {
        self.fields.get(field).map(Vec::as_slice)
    }

    pub fn any_of(&self) -> &[Vec<Filter>] {
        &self.any_of
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.any_of.is_empty()
    }

    /// Fold another conjunction into this one.
    pub fn merge(&mut self, other: Filter) {
        for (field, predicates) in other.fields {
            self.fields.entry(field).or_default().extend(predicates);
        }
        self.any_of.extend(other.any_of);
    }

    pub fn matches(&self, document: &Document) -> bool {
        self.fields.iter().all(|(field, predicates)| {
            let value = document.get_path(field);
            predicates.iter().all(|p| p.matches(value))
        }) && self
            .any_of
            .iter()
            .all(|branches| branches.iter().any(|branch| branch.matches(document)))
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        let mut first = true;
        for (field, predicates) in &self.fields {
            if !first {
                write!(f, ", ")?;
            }
            first = false;
            write!(f, "{:?}: {{", field.to_string())?;
            for (i, predicate) in predicates.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{predicate}")?;
            }
            write!(f, "}}")?;
        }
        for branches in &self.any_of {
            if !first {
                write!(f, ", ")?;
            }
            first = false;
            write!(f, "\"$or\": [")?;
            for (i, branch) in branches.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{branch}")?;
            }
            write!(f, "]")?;
        }
        write!(f, "}}")
    }
}

/// Walks a condition tree and produces a [`Filter`].
struct FilterTranslator;

impl FilterTranslator {
    fn scalar(condition: &FieldCondition, value: &DataValue) -> Result<Value, Error> {
        encode_value(value).ok_or_else(|| {
            Error::InvalidData(format!(
                "unsupported value for {} on '{}'",
                condition.rule(),
                condition.field()
            ))
        })
    }

    fn bound(
        condition: &FieldCondition,
        bound: Bound<f64>,
        inclusive: fn(Value) -> Predicate,
        exclusive: fn(Value) -> Predicate,
    ) -> Result<Predicate, Error> {
        match bound {
            Bound::Included(v) => Ok(inclusive(Value::Double(v))),
            Bound::Excluded(v) => Ok(exclusive(Value::Double(v))),
            Bound::Unbounded => Err(Error::InvalidData(format!(
                "{} on '{}' requires a two-sided range",
                condition.rule(),
                condition.field()
            ))),
        }
    }
}

impl ConditionVisitor for FilterTranslator {
    type Output = Result<Filter, Error>;

    fn visit_field(&mut self, condition: &FieldCondition) -> Self::Output {
        let mut filter = Filter::new();
        let field = condition.field().clone();

        match (condition.rule(), condition.value()) {
            (rule, ConditionValue::List(values)) => {
                let values = values
                    .iter()
                    .map(|v| Self::scalar(condition, v))
                    .collect::<Result<Vec<_>, _>>()?;
                if rule == MatchRule::Includes {
                    filter.add(field, Predicate::In(values));
                } else {
                    filter.add(field, Predicate::Nin(values));
                }
            }
            (MatchRule::Exists, ConditionValue::Scalar(value)) => {
                let present = value.as_bool().ok_or_else(|| {
                    Error::InvalidData(format!("EXISTS on '{}' requires a boolean", field))
                })?;
                filter.add(field, Predicate::Exists(present));
            }
            (MatchRule::Equals, ConditionValue::Scalar(value)) => {
                filter.add(field, Predicate::Eq(Self::scalar(condition, value)?));
            }
            (MatchRule::GreaterThanEqual, ConditionValue::Scalar(value)) => {
                filter.add(field, Predicate::Gte(Self::scalar(condition, value)?));
            }
            (MatchRule::LessThanEqual, ConditionValue::Scalar(value)) => {
                filter.add(field, Predicate::Lte(Self::scalar(condition, value)?));
            }
            (MatchRule::Between, ConditionValue::Range(range)) => {
                let lower = Self::bound(condition, range.lower, Predicate::Gte, Predicate::Gt)?;
                let upper = Self::bound(condition, range.upper, Predicate::Lte, Predicate::Lt)?;
                filter.add(field.clone(), lower);
                filter.add(field, upper);
            }
            (rule, value) => {
                return Err(Error::InvalidData(format!(
                    "cannot translate {} on '{}' with value {:?}",
                    rule, field, value
                )));
            }
        }

        Ok(filter)
    }

    fn visit_group(&mut self, group: &SearchConditionGroup) -> Self::Output {
        match group.operator() {
            GroupOperator::And => {
                let mut filter = Filter::new();
                for condition in group.conditions() {
                    filter.merge(condition.accept(self)?);
                }
                Ok(filter)
            }
            GroupOperator::Or => {
                let branches = group
                    .conditions()
                    .iter()
                    .map(|c| c.accept(self))
                    .collect::<Result<Vec<_>, _>>()?;
                let mut filter = Filter::new();
                if !branches.is_empty() {
                    filter.any_of.push(branches);
                }
                Ok(filter)
            }
        }
    }
}
