//! Query builder for the hosted database's REST interface.
//!
//! A [`Query`] names a table, a set of [`Filter`]s, an ordering and an
//! optional range. It renders to the query-string dialect the REST service
//! understands (`column=eq.value`, `order=created_at.asc`, ...) and can also
//! be evaluated against JSON rows held in memory, which is how the test
//! datastore answers the exact same requests the production client sends.

use std::cmp::Ordering;

use chrono::{DateTime, FixedOffset};
use serde_json::Value;

/// A column that filters and orderings can refer to.
///
/// Entity modules expose a `Column` enum implementing this trait, so
/// repositories read like `comment::Column::PostId.eq(post_id)`.
pub trait ColumnRef {
    /// Column name as stored in the datastore.
    fn name(&self) -> &str;

    /// `column = value`
    fn eq(&self, value: impl Into<Value>) -> Filter {
        Filter::Eq(self.name().to_string(), value.into())
    }

    /// `column <> value`
    fn neq(&self, value: impl Into<Value>) -> Filter {
        Filter::Neq(self.name().to_string(), value.into())
    }

    /// `column IN (values)`
    fn is_in<I, V>(&self, values: I) -> Filter
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Filter::In(
            self.name().to_string(),
            values.into_iter().map(Into::into).collect(),
        )
    }

    /// `column IS NULL`
    fn is_null(&self) -> Filter {
        Filter::IsNull(self.name().to_string())
    }

    /// `column IS NOT NULL`
    fn is_not_null(&self) -> Filter {
        Filter::NotNull(self.name().to_string())
    }

    /// `column >= value`
    fn gte(&self, value: impl Into<Value>) -> Filter {
        Filter::Gte(self.name().to_string(), value.into())
    }

    /// `column <= value`
    fn lte(&self, value: impl Into<Value>) -> Filter {
        Filter::Lte(self.name().to_string(), value.into())
    }

    /// Case-insensitive substring match. `_` and `\` in `term` match
    /// literally; `*` and `%` are dropped.
    fn contains(&self, term: &str) -> Filter {
        let mut pattern = String::from("*");
        for c in term.chars() {
            match c {
                '*' | '%' => {}
                '_' | '\\' => {
                    pattern.push('\\');
                    pattern.push(c);
                }
                _ => pattern.push(c),
            }
        }
        pattern.push('*');
        Filter::ILike(self.name().to_string(), pattern)
    }
}

impl ColumnRef for &str {
    fn name(&self) -> &str {
        self
    }
}

/// A row predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `column = value`
    Eq(String, Value),
    /// `column <> value`
    Neq(String, Value),
    /// `column IN (values)`
    In(String, Vec<Value>),
    /// `column IS NULL`
    IsNull(String),
    /// `column IS NOT NULL`
    NotNull(String),
    /// `column >= value`
    Gte(String, Value),
    /// `column <= value`
    Lte(String, Value),
    /// Case-insensitive pattern where `*` matches any run of characters
    /// and `\` escapes the next character.
    ILike(String, String),
}

impl Filter {
    /// Render as a query-string pair, e.g. `("status", "eq.pending")`.
    #[must_use]
    pub fn to_param(&self) -> (String, String) {
        match self {
            Self::Eq(column, v) => (column.clone(), format!("eq.{}", render_value(v))),
            Self::Neq(column, v) => (column.clone(), format!("neq.{}", render_value(v))),
            Self::In(column, values) => {
                let items: Vec<String> = values
                    .iter()
                    .map(|v| quote_if_reserved(&render_value(v)))
                    .collect();
                (column.clone(), format!("in.({})", items.join(",")))
            }
            Self::IsNull(column) => (column.clone(), "is.null".to_string()),
            Self::NotNull(column) => (column.clone(), "not.is.null".to_string()),
            Self::Gte(column, v) => (column.clone(), format!("gte.{}", render_value(v))),
            Self::Lte(column, v) => (column.clone(), format!("lte.{}", render_value(v))),
            Self::ILike(column, pattern) => (column.clone(), format!("ilike.{pattern}")),
        }
    }

    /// Whether a JSON row satisfies this filter. Missing columns behave as
    /// SQL `NULL`: only `IS NULL` matches them.
    #[must_use]
    pub fn matches(&self, row: &Value) -> bool {
        match self {
            Self::Eq(column, value) => field(row, column).is_some_and(|f| values_equal(f, value)),
            Self::Neq(column, value) => {
                field(row, column).is_some_and(|f| !values_equal(f, value))
            }
            Self::In(column, values) => field(row, column)
                .is_some_and(|f| values.iter().any(|v| values_equal(f, v))),
            Self::IsNull(column) => field(row, column).is_none(),
            Self::NotNull(column) => field(row, column).is_some(),
            Self::Gte(column, value) => field(row, column)
                .and_then(|f| compare_values(f, value))
                .is_some_and(|o| o != Ordering::Less),
            Self::Lte(column, value) => field(row, column)
                .and_then(|f| compare_values(f, value))
                .is_some_and(|o| o != Ordering::Greater),
            Self::ILike(column, pattern) => field(row, column)
                .and_then(Value::as_str)
                .is_some_and(|s| glob_match(&pattern.to_lowercase(), &s.to_lowercase())),
        }
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

fn quote_if_reserved(raw: &str) -> String {
    if raw.contains([',', '(', ')', '"', ':']) {
        format!("\"{}\"", raw.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        raw.to_string()
    }
}

fn field<'a>(row: &'a Value, column: &str) -> Option<&'a Value> {
    row.get(column).filter(|v| !v.is_null())
}

fn parse_timestamp(s: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(s).ok()
}

fn values_equal(a: &Value, b: &Value) -> bool {
    a == b || compare_values(a, b) == Some(Ordering::Equal)
}

/// Orders two scalar JSON values. Strings that both parse as RFC 3339
/// timestamps compare chronologically.
fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => match (parse_timestamp(x), parse_timestamp(y)) {
            (Some(tx), Some(ty)) => Some(tx.cmp(&ty)),
            _ => Some(x.cmp(y)),
        },
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Split a pattern at unescaped `*`, resolving `\` escapes.
fn glob_parts(pattern: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '*' => parts.push(std::mem::take(&mut current)),
            '\\' => current.extend(chars.next()),
            _ => current.push(c),
        }
    }
    parts.push(current);
    parts
}

/// `*`-wildcard matching over already-lowercased input.
fn glob_match(pattern: &str, text: &str) -> bool {
    let parts = glob_parts(pattern);
    if parts.len() == 1 {
        return parts[0] == text;
    }

    let mut rest = text;
    let last = parts.len() - 1;
    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        if i == 0 {
            match rest.strip_prefix(part) {
                Some(r) => rest = r,
                None => return false,
            }
        } else if i == last {
            return rest.ends_with(part);
        } else {
            match rest.find(part) {
                Some(pos) => rest = &rest[pos + part.len()..],
                None => return false,
            }
        }
    }
    true
}

/// Sort key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    /// Column to sort by.
    pub column: String,
    /// Ascending when true.
    pub ascending: bool,
}

impl Order {
    fn render(&self) -> String {
        let direction = if self.ascending { "asc" } else { "desc" };
        format!("{}.{direction}", self.column)
    }

    /// Nulls sort last ascending and first descending, as in Postgres.
    fn compare(&self, a: &Value, b: &Value) -> Ordering {
        let ordering = match (field(a, &self.column), field(b, &self.column)) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(x), Some(y)) => compare_values(x, y).unwrap_or(Ordering::Equal),
        };
        if self.ascending { ordering } else { ordering.reverse() }
    }
}

/// A read request against one table.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    table: String,
    columns: String,
    filters: Vec<Filter>,
    order: Vec<Order>,
    limit: Option<u64>,
    offset: Option<u64>,
    count: bool,
}

impl Query {
    /// Select every column of `table`.
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: "*".to_string(),
            filters: Vec::new(),
            order: Vec::new(),
            limit: None,
            offset: None,
            count: false,
        }
    }

    /// Restrict the returned columns.
    #[must_use]
    pub fn select(mut self, columns: &[&str]) -> Self {
        self.columns = columns.join(",");
        self
    }

    /// Add a filter; all filters must match.
    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Sort ascending by `column` (after any earlier sort keys).
    #[must_use]
    pub fn order_by_asc(mut self, column: impl ColumnRef) -> Self {
        self.order.push(Order {
            column: column.name().to_string(),
            ascending: true,
        });
        self
    }

    /// Sort descending by `column` (after any earlier sort keys).
    #[must_use]
    pub fn order_by_desc(mut self, column: impl ColumnRef) -> Self {
        self.order.push(Order {
            column: column.name().to_string(),
            ascending: false,
        });
        self
    }

    /// Return at most `limit` rows.
    #[must_use]
    pub const fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skip the first `offset` rows.
    #[must_use]
    pub const fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Ask for the exact number of matching rows alongside the page.
    #[must_use]
    pub const fn with_count(mut self) -> Self {
        self.count = true;
        self
    }

    /// Table this query reads.
    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Filters applied by this query.
    #[must_use]
    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// Whether an exact count was requested.
    #[must_use]
    pub const fn counts(&self) -> bool {
        self.count
    }

    /// Render as query-string pairs.
    #[must_use]
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("select".to_string(), self.columns.clone())];
        params.extend(self.filters.iter().map(Filter::to_param));
        if !self.order.is_empty() {
            let order: Vec<String> = self.order.iter().map(Order::render).collect();
            params.push(("order".to_string(), order.join(",")));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(offset) = self.offset {
            params.push(("offset".to_string(), offset.to_string()));
        }
        params
    }

    /// Evaluate against in-memory rows: filter, sort (stable), then slice.
    /// Returns the page and the number of rows matching before slicing.
    #[must_use]
    pub fn apply(&self, rows: &[Value]) -> (Vec<Value>, u64) {
        let mut matched: Vec<&Value> = rows
            .iter()
            .filter(|row| self.filters.iter().all(|f| f.matches(row)))
            .collect();

        matched.sort_by(|a, b| {
            self.order
                .iter()
                .map(|o| o.compare(a, b))
                .find(|o| *o != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });

        let total = matched.len() as u64;
        let offset = usize::try_from(self.offset.unwrap_or(0)).unwrap_or(usize::MAX);
        let limit = self
            .limit
            .map_or(usize::MAX, |l| usize::try_from(l).unwrap_or(usize::MAX));

        let page = matched
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();
        (page, total)
    }
}
