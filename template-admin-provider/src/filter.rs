//! In-memory record filtering.
//!
//! A filter is either an arbitrary predicate or a [`FilterSpec`], a mapping
//! of field name to wanted value. Every entry of a spec must hold for a
//! record to pass:
//!
//! - `q` matches case-insensitively against every string field of the record
//! - `<field>_lt`, `_lte`, `_gt`, `_gte` compare against the field's value
//! - an array value against an array field requires every wanted value
//! - an array value against a scalar field requires membership
//! - a string value against an array field requires membership
//! - a string value against a boolean field compares with `"true"`
//! - anything else is strict equality

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;
use template_admin_model::Record;

use crate::error::{ProviderError, ProviderResult};

/// The full-text search key.
pub const FULL_TEXT_KEY: &str = "q";

/// A caller-supplied record predicate.
pub type Predicate = Arc<dyn Fn(&Record) -> bool + Send + Sync>;

/// A record filter: a predicate or a declarative spec.
#[derive(Clone)]
pub enum Filter {
    Predicate(Predicate),
    Spec(FilterSpec),
}

impl Filter {
    pub fn predicate(f: impl Fn(&Record) -> bool + Send + Sync + 'static) -> Self {
        Filter::Predicate(Arc::new(f))
    }

    /// Records that pass the filter, in their original order.
    pub fn apply(&self, records: &[Record]) -> Vec<Record> {
        match self {
            Filter::Predicate(predicate) => records.iter().filter(|&r| predicate(r)).cloned().collect(),
            Filter::Spec(spec) => spec.apply(records),
        }
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Predicate(_) => f.write_str("Filter::Predicate(..)"),
            Filter::Spec(spec) => f.debug_tuple("Filter::Spec").field(spec).finish(),
        }
    }
}

impl From<FilterSpec> for Filter {
    fn from(spec: FilterSpec) -> Self {
        Filter::Spec(spec)
    }
}

/// Filters `records` without modifying them.
pub fn filter_records(records: &[Record], filter: &Filter) -> Vec<Record> {
    filter.apply(records)
}

/// Declarative filter: field key → wanted value, all entries ANDed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSpec(Map<String, Value>);

impl FilterSpec {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Converts a JSON filter. Only objects are filters.
    pub fn from_value(value: Value) -> ProviderResult<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(ProviderError::UnsupportedFilter(format!(
                "expected an object, got {other}"
            ))),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Prepares the spec for repeated evaluation.
    pub fn compile(&self) -> CompiledFilter {
        CompiledFilter {
            clauses: self.0.iter().map(|(k, v)| Clause::parse(k, v)).collect(),
        }
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.compile().matches(record)
    }

    /// Records that satisfy every entry, in their original order.
    pub fn apply(&self, records: &[Record]) -> Vec<Record> {
        if self.is_empty() {
            return records.to_vec();
        }
        let compiled = self.compile();
        records.iter().filter(|r| compiled.matches(r)).cloned().collect()
    }
}

impl From<Map<String, Value>> for FilterSpec {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// A [`FilterSpec`] with its full-text pattern compiled.
#[derive(Debug, Clone)]
pub struct CompiledFilter {
    clauses: Vec<Clause>,
}

impl CompiledFilter {
    pub fn matches(&self, record: &Record) -> bool {
        self.clauses.iter().all(|c| c.matches(record))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RangeOp {
    Lt,
    Lte,
    Gt,
    Gte,
}

impl RangeOp {
    fn accepts(self, ordering: Ordering) -> bool {
        match self {
            RangeOp::Lt => ordering == Ordering::Less,
            RangeOp::Lte => ordering != Ordering::Greater,
            RangeOp::Gt => ordering == Ordering::Greater,
            RangeOp::Gte => ordering != Ordering::Less,
        }
    }
}

const RANGE_SUFFIXES: [(&str, RangeOp); 4] = [
    ("_lte", RangeOp::Lte),
    ("_gte", RangeOp::Gte),
    ("_lt", RangeOp::Lt),
    ("_gt", RangeOp::Gt),
];

#[derive(Debug, Clone)]
enum Clause {
    FullText(TextPattern),
    Range {
        field: String,
        op: RangeOp,
        value: Value,
    },
    Match {
        field: String,
        value: Value,
    },
}

impl Clause {
    fn parse(key: &str, value: &Value) -> Self {
        if key == FULL_TEXT_KEY {
            return Clause::FullText(TextPattern::new(&scalar_text(value)));
        }

        for (suffix, op) in RANGE_SUFFIXES {
            if let Some(field) = key.strip_suffix(suffix).filter(|f| !f.is_empty()) {
                return Clause::Range {
                    field: field.to_string(),
                    op,
                    value: value.clone(),
                };
            }
        }

        Clause::Match {
            field: key.to_string(),
            value: value.clone(),
        }
    }

    fn matches(&self, record: &Record) -> bool {
        match self {
            // numbers and booleans, `_version` and `_deleted` included, are not searched
            Clause::FullText(pattern) => record
                .iter()
                .any(|(_, v)| v.as_str().is_some_and(|s| pattern.is_match(s))),
            Clause::Range { field, op, value } => record
                .get(field)
                .and_then(|item| range_ordering(item, value))
                .is_some_and(|ordering| op.accepts(ordering)),
            Clause::Match { field, value } => matches_value(record.get(field), value),
        }
    }
}

/// Full-text pattern: a case-insensitive regex, or a case-insensitive
/// literal when the text is not a valid regex.
#[derive(Debug, Clone)]
enum TextPattern {
    Regex(Regex),
    Literal(String),
}

impl TextPattern {
    fn new(text: &str) -> Self {
        match RegexBuilder::new(text).case_insensitive(true).build() {
            Ok(regex) => TextPattern::Regex(regex),
            Err(_) => TextPattern::Literal(text.to_lowercase()),
        }
    }

    fn is_match(&self, haystack: &str) -> bool {
        match self {
            TextPattern::Regex(regex) => regex.is_match(haystack),
            TextPattern::Literal(needle) => haystack.to_lowercase().contains(needle.as_str()),
        }
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn range_ordering(item: &Value, target: &Value) -> Option<Ordering> {
    match (item, target) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::String(a), Value::Number(b)) => a.trim().parse::<f64>().ok()?.partial_cmp(&b.as_f64()?),
        (Value::Number(a), Value::String(b)) => a.as_f64()?.partial_cmp(&b.trim().parse::<f64>().ok()?),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn matches_value(item: Option<&Value>, wanted: &Value) -> bool {
    let Some(item) = item else {
        return false;
    };
    match (item, wanted) {
        // every wanted value present in the field
        (Value::Array(items), Value::Array(values)) => values
            .iter()
            .all(|v| items.iter().any(|i| values_equal(i, v))),
        // field is one of the wanted values
        (item, Value::Array(values)) => values.iter().any(|v| values_equal(item, v)),
        (Value::Array(items), Value::String(_)) => items.iter().any(|i| values_equal(i, wanted)),
        (Value::Bool(b), Value::String(s)) => *b == (s == "true"),
        (item, wanted) => values_equal(item, wanted),
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        _ => a == b,
    }
}
