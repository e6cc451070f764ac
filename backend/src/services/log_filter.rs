//! Query/filter engine for log records.
//!
//! A request's query parameters are turned into a [`LogFilter`]: a conjunction
//! of typed [`Predicate`]s. [`FILTER_RULES`] maps every recognised parameter to
//! the function that builds its predicates, so the table below is the whole
//! matching contract:
//!
//! | key                | predicate                                           |
//! |--------------------|-----------------------------------------------------|
//! | `level`            | case-insensitive substring of `level`               |
//! | `message`          | case-insensitive substring of `message`             |
//! | `resourceId`       | exact `resourceId`                                  |
//! | `timestamp_after`  | `timestamp >= value`                                |
//! | `timestamp_before` | `timestamp <= value`                                |
//! | `traceId`          | exact `traceId`                                     |
//! | `spanId`           | exact `spanId`                                      |
//! | `commit`           | exact `commit`                                      |
//! | `parentResourceId` | case-insensitive substring of `metadata.parentResourceId` |
//! | `search`           | every term is a case-insensitive substring of one of the searchable fields |
//! | `regex`            | regular expression on `message` (`(?i)` for case-insensitive) |
//!
//! A filter is evaluated in-process ([`LogFilter::matches`]). PostgreSQL gets the
//! exact and range predicates ([`Predicate::push_sql`]); case-insensitive and
//! regex predicates always run in Rust on the fetched rows, because SQL
//! `lower()` folds case by the database locale.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use regex::Regex;
use sqlx::{Postgres, QueryBuilder};

use crate::error::{Result, ValidationErrors};
use crate::models::log_record::{parse_timestamp, LogRecord};

/// Record fields addressable by a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogField {
    Level,
    Message,
    ResourceId,
    TraceId,
    SpanId,
    Commit,
    ParentResourceId,
}

/// Fields covered by the `search` parameter.
pub const SEARCH_FIELDS: &[LogField] = &[
    LogField::Level,
    LogField::Message,
    LogField::ResourceId,
    LogField::TraceId,
    LogField::SpanId,
    LogField::Commit,
    LogField::ParentResourceId,
];

impl LogField {
    pub fn value<'a>(&self, record: &'a LogRecord) -> &'a str {
        match self {
            LogField::Level => &record.level,
            LogField::Message => &record.message,
            LogField::ResourceId => &record.resource_id,
            LogField::TraceId => &record.trace_id,
            LogField::SpanId => &record.span_id,
            LogField::Commit => &record.commit,
            LogField::ParentResourceId => &record.metadata.parent_resource_id,
        }
    }

    /// SQL expression reading this field from `log_records`.
    pub fn column(&self) -> &'static str {
        match self {
            LogField::Level => "level",
            LogField::Message => "message",
            LogField::ResourceId => "resource_id",
            LogField::TraceId => "trace_id",
            LogField::SpanId => "span_id",
            LogField::Commit => "\"commit\"",
            LogField::ParentResourceId => "(metadata->>'parentResourceId')",
        }
    }
}

/// Lowercase `s` character by character, without locale or context rules.
pub fn fold_case(s: &str) -> String {
    s.chars().flat_map(char::to_lowercase).collect()
}

/// A single test over a log record.
#[derive(Debug, Clone)]
pub enum Predicate {
    /// Case-insensitive substring; `needle` is already folded.
    Contains { field: LogField, needle: String },
    /// Exact, case-sensitive equality.
    Equals { field: LogField, value: String },
    /// Case-insensitive substring of at least one of `fields`.
    ContainsAny {
        fields: &'static [LogField],
        needle: String,
    },
    /// `timestamp >= bound`
    TimestampFrom(DateTime<Utc>),
    /// `timestamp <= bound`
    TimestampUntil(DateTime<Utc>),
    /// Regular expression on `message`.
    MessageMatches(Regex),
}

impl Predicate {
    pub fn contains(field: LogField, needle: &str) -> Self {
        Predicate::Contains {
            field,
            needle: fold_case(needle),
        }
    }

    pub fn equals(field: LogField, value: &str) -> Self {
        Predicate::Equals {
            field,
            value: value.to_string(),
        }
    }

    pub fn contains_any(fields: &'static [LogField], needle: &str) -> Self {
        Predicate::ContainsAny {
            fields,
            needle: fold_case(needle),
        }
    }

    pub fn matches(&self, record: &LogRecord) -> bool {
        match self {
            Predicate::Contains { field, needle } => {
                fold_case(field.value(record)).contains(needle.as_str())
            }
            Predicate::Equals { field, value } => field.value(record) == value.as_str(),
            Predicate::ContainsAny { fields, needle } => fields
                .iter()
                .any(|field| fold_case(field.value(record)).contains(needle.as_str())),
            Predicate::TimestampFrom(bound) => record.timestamp >= *bound,
            Predicate::TimestampUntil(bound) => record.timestamp <= *bound,
            Predicate::MessageMatches(regex) => regex.is_match(&record.message),
        }
    }

    /// Whether [`Predicate::push_sql`] can render this predicate.
    ///
    /// Only byte-exact comparisons qualify. Substring matches need locale-free
    /// case folding and regexes need the `regex` crate dialect, so both stay
    /// in-process.
    pub fn is_sql_expressible(&self) -> bool {
        matches!(
            self,
            Predicate::Equals { .. } | Predicate::TimestampFrom(_) | Predicate::TimestampUntil(_)
        )
    }

    /// Append this predicate as a boolean SQL expression.
    ///
    /// Returns `false`, leaving the builder untouched, when the predicate has
    /// no SQL form and must be evaluated on the fetched rows instead.
    pub fn push_sql(&self, qb: &mut QueryBuilder<'_, Postgres>) -> bool {
        match self {
            Predicate::Equals { field, value } => {
                qb.push(field.column()).push(" = ").push_bind(value.clone());
            }
            Predicate::TimestampFrom(bound) => {
                qb.push("\"timestamp\" >= ").push_bind(*bound);
            }
            Predicate::TimestampUntil(bound) => {
                qb.push("\"timestamp\" <= ").push_bind(*bound);
            }
            Predicate::Contains { .. }
            | Predicate::ContainsAny { .. }
            | Predicate::MessageMatches(_) => return false,
        }
        true
    }
}

type BuildResult = std::result::Result<Vec<Predicate>, String>;

/// Builds the predicates for one filter parameter from its raw value.
pub type PredicateBuilder = fn(&str) -> BuildResult;

/// Every recognised filter parameter and its predicate builder.
pub const FILTER_RULES: &[(&str, PredicateBuilder)] = &[
    ("level", level),
    ("message", message),
    ("resourceId", resource_id),
    ("timestamp_after", timestamp_after),
    ("timestamp_before", timestamp_before),
    ("traceId", trace_id),
    ("spanId", span_id),
    ("commit", commit),
    ("parentResourceId", parent_resource_id),
    ("search", search),
    ("regex", regex),
];

const INVALID_DATETIME: &str = "Enter a valid date/time.";

fn text(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty()).then_some(value)
}

fn contains_on(field: LogField, value: &str) -> BuildResult {
    Ok(text(value)
        .map(|v| Predicate::contains(field, v))
        .into_iter()
        .collect())
}

fn equals_on(field: LogField, value: &str) -> BuildResult {
    Ok(text(value)
        .map(|v| Predicate::equals(field, v))
        .into_iter()
        .collect())
}

fn level(value: &str) -> BuildResult {
    contains_on(LogField::Level, value)
}

fn message(value: &str) -> BuildResult {
    contains_on(LogField::Message, value)
}

fn resource_id(value: &str) -> BuildResult {
    equals_on(LogField::ResourceId, value)
}

fn trace_id(value: &str) -> BuildResult {
    equals_on(LogField::TraceId, value)
}

fn span_id(value: &str) -> BuildResult {
    equals_on(LogField::SpanId, value)
}

fn commit(value: &str) -> BuildResult {
    equals_on(LogField::Commit, value)
}

fn parent_resource_id(value: &str) -> BuildResult {
    contains_on(LogField::ParentResourceId, value)
}

fn timestamp_bound(value: &str, make: fn(DateTime<Utc>) -> Predicate) -> BuildResult {
    match text(value) {
        None => Ok(Vec::new()),
        Some(v) => parse_timestamp(v)
            .map(|ts| vec![make(ts)])
            .ok_or_else(|| INVALID_DATETIME.to_string()),
    }
}

fn timestamp_after(value: &str) -> BuildResult {
    timestamp_bound(value, Predicate::TimestampFrom)
}

fn timestamp_before(value: &str) -> BuildResult {
    timestamp_bound(value, Predicate::TimestampUntil)
}

fn search(value: &str) -> BuildResult {
    Ok(search_terms(value)
        .iter()
        .map(|term| Predicate::contains_any(SEARCH_FIELDS, term))
        .collect())
}

fn regex(value: &str) -> BuildResult {
    if value.is_empty() {
        return Ok(Vec::new());
    }
    Regex::new(value)
        .map(|re| vec![Predicate::MessageMatches(re)])
        .map_err(|e| format!("Invalid regular expression: {}", e))
}

/// Split a `search` value into terms.
///
/// Terms are separated by whitespace or commas; a double-quoted phrase is kept
/// as one term.
pub fn search_terms(value: &str) -> Vec<String> {
    let mut terms = Vec::new();
    let mut current = String::new();
    let mut quoted = false;

    for ch in value.chars() {
        if ch == '"' {
            flush_term(&mut terms, &mut current);
            quoted = !quoted;
        } else if !quoted && (ch.is_whitespace() || ch == ',') {
            flush_term(&mut terms, &mut current);
        } else {
            current.push(ch);
        }
    }
    flush_term(&mut terms, &mut current);
    terms
}

fn flush_term(terms: &mut Vec<String>, current: &mut String) {
    let term = current.trim();
    if !term.is_empty() {
        terms.push(term.to_string());
    }
    current.clear();
}

/// Conjunction of predicates over log records.
#[derive(Debug, Clone, Default)]
pub struct LogFilter {
    predicates: Vec<Predicate>,
}

impl LogFilter {
    /// Filter that matches every record.
    pub fn all() -> Self {
        Self::default()
    }

    /// Build a filter from query parameters.
    ///
    /// Unknown keys are ignored and a repeated key keeps its last value.
    /// Every invalid value is reported in a single validation error.
    pub fn from_params<I, K, V>(params: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let params: HashMap<String, String> = params
            .into_iter()
            .map(|(k, v)| (k.as_ref().to_string(), v.as_ref().to_string()))
            .collect();

        let mut errors = ValidationErrors::new();
        let filter = FILTER_RULES
            .iter()
            .filter_map(|(key, build)| {
                params
                    .get(*key)
                    .map(|value| (*key, build(value.as_str())))
            })
            .fold(LogFilter::all(), |filter, (key, built)| match built {
                Ok(predicates) => predicates.into_iter().fold(filter, LogFilter::and),
                Err(message) => {
                    errors.add(key, message);
                    filter
                }
            });

        errors.into_result()?;
        Ok(filter)
    }

    /// Add one more predicate to the conjunction.
    pub fn and(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn matches(&self, record: &LogRecord) -> bool {
        self.predicates.iter().all(|p| p.matches(record))
    }

    /// Keep the records this filter matches, preserving their order.
    pub fn apply<'a, I>(&self, records: I) -> Vec<LogRecord>
    where
        I: IntoIterator<Item = &'a LogRecord>,
    {
        records
            .into_iter()
            .filter(|r| self.matches(r))
            .cloned()
            .collect()
    }

    /// Predicates that must run in-process after a SQL fetch.
    pub fn residual(&self) -> LogFilter {
        LogFilter {
            predicates: self
                .predicates
                .iter()
                .filter(|p| !p.is_sql_expressible())
                .cloned()
                .collect(),
        }
    }

    /// Append ` WHERE ...` for every SQL-expressible predicate.
    pub fn push_where(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        let mut first = true;
        for predicate in self.predicates.iter().filter(|p| p.is_sql_expressible()) {
            qb.push(if first { " WHERE " } else { " AND " });
            first = false;
            predicate.push_sql(qb);
        }
    }
}
