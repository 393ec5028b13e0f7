//! Structured record filters, rendered to the backend's filter language only at the boundary.
//!
//! Values are always quoted and escaped here, so ids and user input never get spliced into an
//! expression by hand. A filter that can never match anything renders to `None`: the backend
//! rejects an empty `||` chain, so callers skip the request instead.

use std::cmp::Ordering;

use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// `field = "value"`
    Eq { field: String, value: String },
    /// `field` equals any of `values`. Matches nothing when `values` is empty.
    AnyOf { field: String, values: Vec<String> },
    /// Every member matches. Matches everything when empty.
    All(Vec<Filter>),
    /// At least one member matches. Matches nothing when empty.
    Any(Vec<Filter>),
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn any_of<V: Into<String>>(field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        Self::AnyOf {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn all(filters: impl IntoIterator<Item = Filter>) -> Self {
        Self::All(filters.into_iter().collect())
    }

    pub fn any(filters: impl IntoIterator<Item = Filter>) -> Self {
        Self::Any(filters.into_iter().collect())
    }

    /// Whether no record can ever satisfy this filter.
    pub fn matches_nothing(&self) -> bool {
        match self {
            Self::Eq { .. } => false,
            Self::AnyOf { values, .. } => values.is_empty(),
            Self::All(filters) => filters.iter().any(Self::matches_nothing),
            Self::Any(filters) => filters.iter().all(Self::matches_nothing),
        }
    }

    /// Render the filter in the backend's expression language.
    ///
    /// Returns `None` when the filter matches nothing. An empty string means "no restriction".
    pub fn to_expression(&self) -> Option<String> {
        if self.matches_nothing() {
            return None;
        }

        let expression = match self {
            Self::Eq { field, value } => format!("{field} = {}", quote(value)),
            Self::AnyOf { field, values } => join(values.iter().map(|value| format!("{field} = {}", quote(value))), "||"),
            Self::All(filters) => join(filters.iter().filter_map(Self::to_expression).filter(|e| !e.is_empty()), "&&"),
            Self::Any(filters) => {
                let clauses: Vec<String> = filters.iter().filter_map(Self::to_expression).collect();
                // an unrestricted member makes the whole alternative unrestricted
                if clauses.iter().any(String::is_empty) {
                    String::new()
                } else {
                    join(clauses.into_iter(), "||")
                }
            }
        };

        Some(expression)
    }

    /// The first value that cannot be quoted for the backend.
    ///
    /// A trailing `\` escapes the closing quote and the filter language has no other spelling for
    /// it, so such values cannot be expressed at all.
    pub fn unquotable_value(&self) -> Option<&str> {
        match self {
            Self::Eq { value, .. } => Some(value.as_str()).filter(|v| v.ends_with('\\')),
            Self::AnyOf { values, .. } => values.iter().map(String::as_str).find(|v| v.ends_with('\\')),
            Self::All(filters) | Self::Any(filters) => filters.iter().find_map(Self::unquotable_value),
        }
    }

    /// Evaluate the filter against a JSON record. Non-string fields compare by their JSON text.
    pub fn matches(&self, record: &Value) -> bool {
        match self {
            Self::Eq { field, value } => field_equals(record, field, value),
            Self::AnyOf { field, values } => values.iter().any(|value| field_equals(record, field, value)),
            Self::All(filters) => filters.iter().all(|f| f.matches(record)),
            Self::Any(filters) => filters.iter().any(|f| f.matches(record)),
        }
    }
}

fn field_equals(record: &Value, field: &str, expected: &str) -> bool {
    match record.get(field) {
        Some(Value::String(actual)) => actual == expected,
        Some(Value::Null) | None => expected.is_empty(),
        Some(other) => other.to_string() == expected,
    }
}

/// Joins rendered clauses with `operator`, parenthesizing when there is more than one.
fn join(clauses: impl Iterator<Item = String>, operator: &str) -> String {
    let clauses: Vec<String> = clauses.collect();
    match clauses.len() {
        0 => String::new(),
        1 => clauses.into_iter().next().unwrap_or_default(),
        _ => format!("({})", clauses.join(&format!(" {operator} "))),
    }
}

/// Double-quotes a value. The backend's scanner only unescapes `\"`, so backslashes pass through
/// as they are.
fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\\\""))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

impl SortOrder {
    pub fn prefix(self) -> char {
        match self {
            Self::Ascending => '+',
            Self::Descending => '-',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub field: String,
    pub order: SortOrder,
}

impl Sort {
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Ascending,
        }
    }

    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Descending,
        }
    }

    pub fn to_expression(&self) -> String {
        format!("{}{}", self.order.prefix(), self.field)
    }

    /// Order two JSON records by the sort field. Strings compare lexically, numbers numerically.
    pub fn compare(&self, a: &Value, b: &Value) -> Ordering {
        let ordering = match (a.get(&self.field), b.get(&self.field)) {
            (Some(Value::Number(a)), Some(Value::Number(b))) => a
                .as_f64()
                .partial_cmp(&b.as_f64())
                .unwrap_or(Ordering::Equal),
            (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
            (a, b) => a.map(Value::to_string).cmp(&b.map(Value::to_string)),
        };

        match self.order {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    }
}

impl std::fmt::Display for Sort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_expression())
    }
}
