//! Record and query types used by the store trait.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One stored record: field name to JSON value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    /// Creates a record from a field map.
    #[must_use]
    pub fn new(values: Map<String, Value>) -> Self {
        Self(values)
    }

    /// Creates a record from a JSON object. Returns `None` for other values.
    #[must_use]
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// Sets a field value.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    /// Returns a field value.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Sets a field value in place.
    pub fn insert(&mut self, field: impl Into<String>, value: Value) {
        self.0.insert(field.into(), value);
    }

    /// Returns the underlying map.
    #[must_use]
    pub fn values(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consumes the record, returning the underlying map.
    #[must_use]
    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

/// A comparison applied to one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "value", rename_all = "snake_case")]
pub enum LookupOp {
    /// Field equals the value.
    Exact(Value),
    /// Field equals one of the values.
    In(Vec<Value>),
}

impl LookupOp {
    /// Returns the lookup suffix used in filter names.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Exact(_) => "exact",
            Self::In(_) => "in",
        }
    }
}

/// A filter predicate on one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lookup {
    /// Field to compare.
    pub field: String,
    /// Comparison.
    pub op: LookupOp,
}

impl Lookup {
    /// Creates an equality lookup.
    #[must_use]
    pub fn exact(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op: LookupOp::Exact(value.into()),
        }
    }

    /// Creates a set-membership lookup.
    #[must_use]
    pub fn one_of(field: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            field: field.into(),
            op: LookupOp::In(values),
        }
    }
}

impl fmt::Display for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.op {
            LookupOp::Exact(value) => write!(f, "{}={value}", self.field),
            LookupOp::In(values) => {
                write!(f, "{}__in=", self.field)?;
                f.write_str(&Value::Array(values.clone()).to_string())
            }
        }
    }
}

/// An ordering clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    /// Field to order by.
    pub field: String,
    /// Whether to order descending.
    pub descending: bool,
}

impl OrderBy {
    /// Creates a new ordering clause.
    #[must_use]
    pub fn new(field: impl Into<String>, descending: bool) -> Self {
        Self {
            field: field.into(),
            descending,
        }
    }

    /// Parses `name` or `-name`.
    #[must_use]
    pub fn parse(term: &str) -> Self {
        match term.strip_prefix('-') {
            Some(field) => Self::new(field, true),
            None => Self::new(term, false),
        }
    }
}

impl fmt::Display for OrderBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.descending {
            write!(f, "-{}", self.field)
        } else {
            f.write_str(&self.field)
        }
    }
}

/// A filtered, ordered and windowed query over one model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordQuery {
    /// Predicates; a record must satisfy all of them.
    #[serde(default)]
    pub lookups: Vec<Lookup>,
    /// Ordering clauses, applied in sequence.
    #[serde(default)]
    pub order_by: Vec<OrderBy>,
    /// Number of matching records to skip.
    #[serde(default)]
    pub offset: usize,
    /// Maximum number of records to return.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl RecordQuery {
    /// Creates an unfiltered query.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a lookup.
    #[must_use]
    pub fn with_lookup(mut self, lookup: Lookup) -> Self {
        self.lookups.push(lookup);
        self
    }

    /// Adds an equality lookup.
    #[must_use]
    pub fn with_exact(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with_lookup(Lookup::exact(field, value))
    }

    /// Adds a set-membership lookup.
    #[must_use]
    pub fn with_in(self, field: impl Into<String>, values: Vec<Value>) -> Self {
        self.with_lookup(Lookup::one_of(field, values))
    }

    /// Adds an ordering clause.
    #[must_use]
    pub fn with_order(mut self, order: OrderBy) -> Self {
        self.order_by.push(order);
        self
    }

    /// Sets the window offset.
    #[must_use]
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Sets the window size.
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Renders the lookups for logs, e.g. `name=\"a\", id__in=[1,2]`.
    #[must_use]
    pub fn describe_lookups(&self) -> String {
        self.lookups
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// The result of a [`RecordQuery`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    /// Records inside the requested window.
    pub records: Vec<Record>,
    /// Number of matching records before windowing.
    pub total: usize,
}

impl QueryResult {
    /// Creates a new result.
    #[must_use]
    pub fn new(records: Vec<Record>, total: usize) -> Self {
        Self { records, total }
    }
}
