//! Connection-based pagination resolver.
//!
//! Implements resolvers for queries like `all_Widget(first: 10, name__in:
//! "gear,cog")`. Filters and ordering become a [`RecordQuery`]; pagination
//! follows the Relay array-connection model, where every cursor encodes an
//! offset into the filtered, ordered result.

use std::sync::Arc;
use std::time::Instant;

use async_graphql::ErrorExtensions;
use async_graphql::dynamic::{FieldFuture, FieldValue, ResolverContext, ValueAccessor};
use async_graphql::Value;
use modelgraph_core::{
    FieldDescriptor, Lookup, ModelDescriptor, OrderBy, Record, RecordQuery, StoreError,
};
use tracing::{debug, warn};

use super::{get_graphql_context, log_store_call, object_value};
use crate::error::GraphQLError;
use crate::filters::{FilterArg, FilterInput};
use crate::global_id::GlobalId;
use crate::schema::ORDER_BY_ARGUMENT;

/// Cursor encoding/decoding utilities.
pub mod cursor {
    use base64::Engine;

    /// Prefix of the decoded cursor text.
    pub const PREFIX: &str = "arrayconnection:";

    /// Encodes an offset as an opaque cursor.
    #[must_use]
    pub fn offset_to_cursor(offset: usize) -> String {
        base64::engine::general_purpose::STANDARD.encode(format!("{PREFIX}{offset}"))
    }

    /// Decodes a cursor back to its offset.
    ///
    /// Returns `None` for anything that was not produced by
    /// [`offset_to_cursor`].
    #[must_use]
    pub fn cursor_to_offset(cursor: &str) -> Option<usize> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(cursor)
            .ok()?;
        let text = String::from_utf8(bytes).ok()?;
        text.strip_prefix(PREFIX)?.parse().ok()
    }
}

/// Invalid pagination arguments.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PaginationError {
    /// A count argument is negative.
    #[error("Argument '{argument}' must be a non-negative integer.")]
    Negative {
        /// Argument name.
        argument: &'static str,
    },

    /// A count argument is above the connection limit.
    #[error(
        "Requesting {requested} records on the `{field}` connection exceeds the `{argument}` limit of {limit} records."
    )]
    ExceedsLimit {
        /// Argument name.
        argument: &'static str,
        /// Requested count.
        requested: i64,
        /// Connection field name.
        field: String,
        /// Configured limit.
        limit: usize,
    },

    /// `offset` and `before` are mutually exclusive.
    #[error(
        "You can't provide a `before` value at the same time as an `offset` value to properly paginate the `{field}` connection."
    )]
    OffsetWithBefore {
        /// Connection field name.
        field: String,
    },
}

/// Parsed pagination arguments.
///
/// `after` and `before` hold decoded cursor offsets. Unreadable cursors are
/// ignored, as if the argument was not given.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaginationArgs {
    /// Page size counted from the start of the window.
    pub first: Option<usize>,
    /// Page size counted from the end of the window.
    pub last: Option<usize>,
    /// Exclusive lower cursor.
    pub after: Option<usize>,
    /// Exclusive upper cursor.
    pub before: Option<usize>,
    /// Records to skip after the lower bound.
    pub offset: Option<usize>,
}

/// The slice of the result a page covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// First included offset.
    pub start: usize,
    /// First excluded offset.
    pub end: usize,
    /// Whether records exist before `start` within the cursor bounds.
    pub has_previous_page: bool,
    /// Whether records exist after `end` within the cursor bounds.
    pub has_next_page: bool,
}

impl PageWindow {
    /// Returns the number of records in the window.
    #[must_use]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Returns `true` if the window is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn check_count(
    argument: &'static str,
    value: Option<i64>,
    field: &str,
    max_limit: usize,
) -> Result<Option<usize>, PaginationError> {
    let Some(value) = value else {
        return Ok(None);
    };
    let count = usize::try_from(value).map_err(|_| PaginationError::Negative { argument })?;
    if count > max_limit {
        return Err(PaginationError::ExceedsLimit {
            argument,
            requested: value,
            field: field.to_string(),
            limit: max_limit,
        });
    }
    Ok(Some(count))
}

impl PaginationArgs {
    /// Validates raw argument values.
    ///
    /// # Errors
    ///
    /// Fails on negative counts, counts above `max_limit`, and on `offset`
    /// combined with `before`.
    pub fn parse(
        field: &str,
        max_limit: usize,
        first: Option<i64>,
        last: Option<i64>,
        after: Option<&str>,
        before: Option<&str>,
        offset: Option<i64>,
    ) -> Result<Self, PaginationError> {
        let first = check_count("first", first, field, max_limit)?;
        let last = check_count("last", last, field, max_limit)?;
        let offset = match offset {
            Some(value) => Some(
                usize::try_from(value).map_err(|_| PaginationError::Negative { argument: "offset" })?,
            ),
            None => None,
        };
        let before = before.and_then(cursor::cursor_to_offset);
        if offset.is_some() && before.is_some() {
            return Err(PaginationError::OffsetWithBefore {
                field: field.to_string(),
            });
        }

        Ok(Self {
            first,
            last,
            after: after.and_then(cursor::cursor_to_offset),
            before,
            offset,
        })
    }

    /// Computes the page window over `total` records.
    ///
    /// Without `first` and `last`, `max_limit` acts as `first`.
    #[must_use]
    pub fn window(&self, total: usize, max_limit: usize) -> PageWindow {
        let lower = self.after.map_or(0, |a| a.saturating_add(1)).min(total);
        let upper = self.before.map_or(total, |b| b.min(total)).max(lower);

        let first = match (self.first, self.last) {
            (None, None) => Some(max_limit),
            (first, _) => first,
        };

        let mut start = lower.saturating_add(self.offset.unwrap_or(0));
        let mut end = upper;
        if let Some(first) = first {
            end = end.min(start.saturating_add(first));
        }
        if let Some(last) = self.last {
            start = start.max(end.saturating_sub(last));
        }
        let start = start.min(end);

        PageWindow {
            start,
            end,
            has_previous_page: self.last.is_some() && start > lower,
            has_next_page: first.is_some() && end < upper,
        }
    }
}

/// Everything a connection field needs at resolve time.
#[derive(Debug, Clone)]
pub struct ConnectionSpec {
    /// Root field name, used in error messages.
    pub field_name: String,
    /// Model listed.
    pub model: Arc<ModelDescriptor>,
    /// Accepted filter arguments.
    pub filters: Vec<FilterArg>,
    /// Whether `orderBy` is accepted.
    pub order_by: bool,
    /// Page size limit.
    pub max_limit: usize,
}

/// One edge of a resolved connection.
#[derive(Debug, Clone)]
pub struct EdgeValue {
    /// Cursor of this record.
    pub cursor: String,
    /// The record.
    pub node: Record,
}

/// A resolved connection page.
#[derive(Debug, Clone)]
pub struct ConnectionPage {
    /// Edges in page order.
    pub edges: Vec<EdgeValue>,
    /// `PageInfo` object value.
    pub page_info: Value,
}

fn optional_string(value: Option<&String>) -> Value {
    value.map_or(Value::Null, |s| Value::String(s.clone()))
}

impl ConnectionPage {
    /// Builds a page from the records of a window.
    #[must_use]
    pub fn new(window: &PageWindow, records: Vec<Record>) -> Self {
        let edges: Vec<EdgeValue> = records
            .into_iter()
            .enumerate()
            .map(|(i, node)| EdgeValue {
                cursor: cursor::offset_to_cursor(window.start + i),
                node,
            })
            .collect();

        let page_info = object_value([
            ("hasNextPage", Value::Boolean(window.has_next_page)),
            ("hasPreviousPage", Value::Boolean(window.has_previous_page)),
            ("startCursor", optional_string(edges.first().map(|e| &e.cursor))),
            ("endCursor", optional_string(edges.last().map(|e| &e.cursor))),
        ]);

        Self { edges, page_info }
    }
}

/// Coerces one raw filter value for `field`.
///
/// Relation fields also accept the global id of the referenced type.
fn coerce_raw(field: &FieldDescriptor, raw: &str) -> async_graphql::Result<serde_json::Value> {
    let raw = match field.field_type.relation_target() {
        Some(to) => match GlobalId::decode(raw.trim()) {
            Ok(id) if id.type_name == to => id.id,
            _ => raw.to_string(),
        },
        None => raw.to_string(),
    };
    Ok(field.field_type.parse_raw(&field.name, &raw)?)
}

fn coerce_value(field: &FieldDescriptor, value: ValueAccessor<'_>) -> async_graphql::Result<serde_json::Value> {
    match value.as_value() {
        Value::String(raw) => coerce_raw(field, raw),
        other => other
            .clone()
            .into_json()
            .map_err(|e| async_graphql::Error::new(e.to_string())),
    }
}

fn int_arg(ctx: &ResolverContext<'_>, name: &str) -> async_graphql::Result<Option<i64>> {
    match ctx.args.get(name) {
        Some(v) if !v.is_null() => Ok(Some(v.i64()?)),
        _ => Ok(None),
    }
}

fn string_arg<'a>(ctx: &'a ResolverContext<'_>, name: &str) -> Option<&'a str> {
    ctx.args.get(name).and_then(|v| v.string().ok())
}

impl ConnectionSpec {
    fn pagination(&self, ctx: &ResolverContext<'_>) -> async_graphql::Result<PaginationArgs> {
        Ok(PaginationArgs::parse(
            &self.field_name,
            self.max_limit,
            int_arg(ctx, "first")?,
            int_arg(ctx, "last")?,
            string_arg(ctx, "after"),
            string_arg(ctx, "before"),
            int_arg(ctx, "offset")?,
        )?)
    }

    fn lookups(&self, ctx: &ResolverContext<'_>) -> async_graphql::Result<Vec<Lookup>> {
        let mut lookups = Vec::new();

        for filter in &self.filters {
            let Some(arg) = ctx.args.get(&filter.name) else {
                continue;
            };
            // Empty values disable the filter, as if it was not given.
            match arg.as_value() {
                Value::Null => continue,
                Value::String(raw) if raw.is_empty() => continue,
                _ => {}
            }
            let field = self.model.field(&filter.field).ok_or_else(|| {
                async_graphql::Error::new(format!("Unknown filter field '{}'", filter.field))
            })?;

            let lookup = match filter.input {
                FilterInput::Scalar => Lookup::exact(&field.name, coerce_value(field, arg)?),
                FilterInput::RawList => {
                    let values = arg
                        .string()?
                        .split(',')
                        .map(|item| coerce_raw(field, item))
                        .collect::<async_graphql::Result<Vec<_>>>()?;
                    Lookup::one_of(&field.name, values)
                }
            };
            lookups.push(lookup);
        }

        Ok(lookups)
    }

    fn ordering(&self, ctx: &ResolverContext<'_>) -> async_graphql::Result<Vec<OrderBy>> {
        if !self.order_by {
            return Ok(Vec::new());
        }
        let raw = match ctx.args.get(ORDER_BY_ARGUMENT) {
            Some(v) if !v.is_null() => v.string()?,
            _ => return Ok(Vec::new()),
        };
        Ok(raw
            .split(',')
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(OrderBy::parse)
            .collect())
    }
}

/// Resolver for connection-based pagination.
pub struct ConnectionResolver;

impl ConnectionResolver {
    /// Creates a resolver function for connection queries.
    ///
    /// This is used to create the `all_Widget(...)` style query fields.
    pub fn resolve(
        spec: Arc<ConnectionSpec>,
    ) -> impl Fn(ResolverContext<'_>) -> FieldFuture<'_> + Send + Sync + Clone {
        move |ctx| {
            let spec = spec.clone();
            FieldFuture::new(async move {
                let pagination = spec.pagination(&ctx)?;
                let mut query = RecordQuery::new();
                for lookup in spec.lookups(&ctx)? {
                    query = query.with_lookup(lookup);
                }
                for order in spec.ordering(&ctx)? {
                    query = query.with_order(order);
                }

                let label = spec.model.label();
                debug!(
                    model = %label,
                    lookups = %query.describe_lookups(),
                    "Resolving connection query"
                );

                let gql_ctx = get_graphql_context(&ctx)?;
                let store_error = |e: StoreError| {
                    warn!(error = %e, "Store error during connection query");
                    GraphQLError::from(e).extend()
                };

                let started = Instant::now();
                let counted = gql_ctx
                    .store
                    .query(&spec.model, &query.clone().with_limit(0))
                    .await
                    .map_err(store_error)?;
                log_store_call(gql_ctx, &label, "count", query.describe_lookups(), started);

                let window = pagination.window(counted.total, spec.max_limit);
                let records = if window.is_empty() {
                    Vec::new()
                } else {
                    let started = Instant::now();
                    let page = query
                        .clone()
                        .with_offset(window.start)
                        .with_limit(window.len());
                    let result = gql_ctx
                        .store
                        .query(&spec.model, &page)
                        .await
                        .map_err(store_error)?;
                    log_store_call(gql_ctx, &label, "query", query.describe_lookups(), started);
                    result.records
                };

                debug!(
                    model = %label,
                    total = counted.total,
                    returned = records.len(),
                    "Connection query completed"
                );

                Ok(Some(FieldValue::owned_any(ConnectionPage::new(&window, records))))
            })
        }
    }

    /// Resolver for `<Model>Connection.pageInfo`.
    pub fn page_info() -> impl Fn(ResolverContext<'_>) -> FieldFuture<'_> + Send + Sync + Clone {
        |ctx| {
            FieldFuture::new(async move {
                let page = ctx.parent_value.try_downcast_ref::<ConnectionPage>()?;
                Ok(Some(FieldValue::value(page.page_info.clone())))
            })
        }
    }

    /// Resolver for `<Model>Connection.edges`.
    pub fn edges() -> impl Fn(ResolverContext<'_>) -> FieldFuture<'_> + Send + Sync + Clone {
        |ctx| {
            FieldFuture::new(async move {
                let page = ctx.parent_value.try_downcast_ref::<ConnectionPage>()?;
                Ok(Some(FieldValue::list(
                    page.edges.iter().cloned().map(FieldValue::owned_any),
                )))
            })
        }
    }

    /// Resolver for `<Model>Edge.node`.
    pub fn edge_node() -> impl Fn(ResolverContext<'_>) -> FieldFuture<'_> + Send + Sync + Clone {
        |ctx| {
            FieldFuture::new(async move {
                let edge = ctx.parent_value.try_downcast_ref::<EdgeValue>()?;
                Ok(Some(FieldValue::owned_any(edge.node.clone())))
            })
        }
    }

    /// Resolver for `<Model>Edge.cursor`.
    pub fn edge_cursor() -> impl Fn(ResolverContext<'_>) -> FieldFuture<'_> + Send + Sync + Clone {
        |ctx| {
            FieldFuture::new(async move {
                let edge = ctx.parent_value.try_downcast_ref::<EdgeValue>()?;
                Ok(Some(Value::String(edge.cursor.clone())))
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use modelgraph_core::FieldType;
    use serde_json::json;

    use super::cursor::{cursor_to_offset, offset_to_cursor};
    use super::*;

    fn args(first: Option<usize>, last: Option<usize>) -> PaginationArgs {
        PaginationArgs {
            first,
            last,
            ..Default::default()
        }
    }

    #[test]
    fn test_cursor_format() {
        assert_eq!(offset_to_cursor(0), "YXJyYXljb25uZWN0aW9uOjA=");
        assert_eq!(cursor_to_offset("YXJyYXljb25uZWN0aW9uOjA="), Some(0));
        assert_eq!(cursor_to_offset(&offset_to_cursor(41)), Some(41));
    }

    #[test]
    fn test_cursor_decode_invalid() {
        assert!(cursor_to_offset("not-valid-base64!!!").is_none());
        assert!(cursor_to_offset("").is_none());
        // base64("hello:1")
        assert!(cursor_to_offset("aGVsbG86MQ==").is_none());
    }

    #[test]
    fn test_window_defaults_to_max_limit() {
        let window = PaginationArgs::default().window(250, 100);
        assert_eq!((window.start, window.end), (0, 100));
        assert!(window.has_next_page);
        assert!(!window.has_previous_page);

        let window = PaginationArgs::default().window(3, 100);
        assert_eq!((window.start, window.end), (0, 3));
        assert!(!window.has_next_page);
    }

    #[test]
    fn test_window_first_after() {
        let pagination = PaginationArgs {
            first: Some(2),
            after: Some(1),
            ..Default::default()
        };
        let window = pagination.window(5, 100);
        assert_eq!((window.start, window.end), (2, 4));
        assert!(window.has_next_page);
    }

    #[test]
    fn test_window_last_before() {
        let pagination = PaginationArgs {
            last: Some(2),
            before: Some(4),
            ..Default::default()
        };
        let window = pagination.window(5, 100);
        assert_eq!((window.start, window.end), (2, 4));
        assert!(window.has_previous_page);
        assert!(!window.has_next_page);

        let window = args(None, Some(10)).window(5, 100);
        assert_eq!((window.start, window.end), (0, 5));
        assert!(!window.has_previous_page);
    }

    #[test]
    fn test_window_offset() {
        let pagination = PaginationArgs {
            first: Some(2),
            offset: Some(3),
            ..Default::default()
        };
        let window = pagination.window(10, 100);
        assert_eq!((window.start, window.end), (3, 5));

        let pagination = PaginationArgs {
            offset: Some(20),
            ..Default::default()
        };
        assert!(pagination.window(10, 100).is_empty());
    }

    #[test]
    fn test_window_first_zero() {
        let window = args(Some(0), None).window(10, 100);
        assert!(window.is_empty());
        assert!(window.has_next_page);
    }

    #[test]
    fn test_parse_rejects_bad_counts() {
        let err = PaginationArgs::parse("all_Widget", 100, Some(-1), None, None, None, None)
            .unwrap_err();
        assert_eq!(err, PaginationError::Negative { argument: "first" });

        let err = PaginationArgs::parse("all_Widget", 100, None, Some(101), None, None, None)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Requesting 101 records on the `all_Widget` connection exceeds the `last` limit of 100 records."
        );

        let before = offset_to_cursor(3);
        let err = PaginationArgs::parse("all_Widget", 100, None, None, None, Some(&before), Some(1))
            .unwrap_err();
        assert!(matches!(err, PaginationError::OffsetWithBefore { .. }));
    }

    #[test]
    fn test_parse_decodes_cursors() {
        let after = offset_to_cursor(4);
        let parsed = PaginationArgs::parse("all_Widget", 100, Some(5), None, Some(&after), Some("junk"), None)
            .unwrap();
        assert_eq!(parsed.first, Some(5));
        assert_eq!(parsed.after, Some(4));
        assert_eq!(parsed.before, None);
    }

    #[test]
    fn test_connection_page() {
        let window = PageWindow {
            start: 2,
            end: 4,
            has_previous_page: true,
            has_next_page: false,
        };
        let records = vec![
            Record::default().with("id", 3),
            Record::default().with("id", 4),
        ];
        let page = ConnectionPage::new(&window, records);
        assert_eq!(page.edges.len(), 2);
        assert_eq!(cursor_to_offset(&page.edges[0].cursor), Some(2));
        assert_eq!(page.edges[1].node.get("id"), Some(&json!(4)));

        let Value::Object(info) = &page.page_info else {
            panic!("page info should be an object");
        };
        assert_eq!(info.get("hasPreviousPage"), Some(&Value::Boolean(true)));
        assert_eq!(
            info.get("endCursor"),
            Some(&Value::String(offset_to_cursor(3)))
        );
    }

    #[test]
    fn test_coerce_raw_foreign_key_accepts_global_id() {
        let field = FieldDescriptor::new("owner", FieldType::ForeignKey { to: "Owner".into() });
        assert_eq!(coerce_raw(&field, "Owner:7").unwrap(), json!(7));
        assert_eq!(coerce_raw(&field, "7").unwrap(), json!(7));
        assert_eq!(coerce_raw(&field, "acme").unwrap(), json!("acme"));

        let parts = FieldDescriptor::new("parts", FieldType::ManyToMany { to: "Widget".into() });
        assert_eq!(coerce_raw(&parts, "Widget:2").unwrap(), json!(2));
        assert_eq!(coerce_raw(&parts, "Owner:2").unwrap(), json!("Owner:2"));

        let size = FieldDescriptor::new("size", FieldType::Integer);
        assert!(coerce_raw(&size, "large").is_err());
        assert_eq!(coerce_raw(&size, " 3").unwrap(), json!(3));
    }
}
