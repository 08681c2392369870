//! Backend-independent description of the generated schema.
//!
//! Everything the schema exposes is first planned here as plain data: one
//! [`ObjectTypeDescriptor`] per model and a [`RootQueryDescriptor`] mapping
//! every root query field to what it serves. The planning step enforces all
//! naming invariants, so assembling the executable schema afterwards cannot
//! fail on user input.

use std::collections::HashSet;

use indexmap::IndexMap;
use modelgraph_core::{FieldType, ModelDescriptor};
use tracing::trace;

use crate::error::SchemaError;
use crate::filters::{FilterArg, FilterFields, FilterSet, generate_filter_fields};

/// Interface implemented by every generated object type.
pub const NODE_INTERFACE: &str = "Node";

/// Shared Relay page information type.
pub const PAGE_INFO_TYPE: &str = "PageInfo";

/// Scalar carrying JSON documents serialized as strings.
pub const JSON_STRING_SCALAR: &str = "JSONString";

/// Type of the debug field.
pub const DEBUG_INFO_TYPE: &str = "DebugInfo";

/// Element type of the debug query list.
pub const DEBUG_QUERY_TYPE: &str = "DebugQuery";

/// Root operation type.
pub const QUERY_TYPE: &str = "Query";

/// Key of the debug entry in the root query descriptor.
pub const DEBUG_ENTRY: &str = "debug";

/// GraphQL field serving the debug entry. Names starting with `__` are
/// reserved for introspection.
pub const DEBUG_FIELD_NAME: &str = "_debug";

/// Field carrying the global identifier.
pub const GLOBAL_ID_FIELD: &str = "id";

/// Field carrying the raw integer primary key.
pub const RAW_ID_FIELD: &str = "_id";

/// Prefix of connection field names.
pub const CONNECTION_FIELD_PREFIX: &str = "all_";

/// Pagination arguments accepted by every connection field.
pub const PAGINATION_ARGUMENTS: [&str; 5] = ["before", "after", "first", "last", "offset"];

/// Ordering argument accepted by every connection field.
pub const ORDER_BY_ARGUMENT: &str = "orderBy";

const BUILTIN_TYPES: [&str; 11] = [
    QUERY_TYPE,
    "String",
    "Int",
    "Float",
    "Boolean",
    "ID",
    NODE_INTERFACE,
    PAGE_INFO_TYPE,
    JSON_STRING_SCALAR,
    DEBUG_INFO_TYPE,
    DEBUG_QUERY_TYPE,
];

/// GraphQL scalar a field maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    /// `ID`
    Id,
    /// `Int`
    Int,
    /// `Float`
    Float,
    /// `Boolean`
    Boolean,
    /// `String`
    String,
    /// `JSONString`
    JsonString,
}

impl ScalarKind {
    /// Returns the GraphQL type name.
    #[must_use]
    pub fn type_name(self) -> &'static str {
        match self {
            Self::Id => "ID",
            Self::Int => "Int",
            Self::Float => "Float",
            Self::Boolean => "Boolean",
            Self::String => "String",
            Self::JsonString => JSON_STRING_SCALAR,
        }
    }

    /// Maps a field type to a scalar.
    ///
    /// Relations map to `ID`, which is how they are accepted as filter
    /// input. Arrays and generic relations have no scalar.
    #[must_use]
    pub fn of(field_type: &FieldType) -> Option<Self> {
        match field_type {
            FieldType::Auto | FieldType::Integer => Some(Self::Int),
            FieldType::Float => Some(Self::Float),
            FieldType::Boolean => Some(Self::Boolean),
            FieldType::Decimal
            | FieldType::Text
            | FieldType::Date
            | FieldType::DateTime
            | FieldType::Time
            | FieldType::Uuid => Some(Self::String),
            FieldType::ForeignKey { .. } | FieldType::ManyToMany { .. } => Some(Self::Id),
            FieldType::Json => Some(Self::JsonString),
            FieldType::Array { .. } | FieldType::GenericRelation => None,
        }
    }
}

/// What an output field of an object type resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputKind {
    /// The `Node` global id built from the primary key.
    GlobalId,
    /// The primary key as an integer, or null.
    RawId,
    /// A single scalar value.
    Scalar(ScalarKind),
    /// A list of scalar values.
    List(ScalarKind),
    /// The object referenced by a foreign key.
    Relation {
        /// Target object type.
        target: String,
    },
    /// The objects referenced by a many-to-many field.
    RelationList {
        /// Target object type.
        target: String,
    },
}

/// One output field of an object type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputField {
    /// Field name, identical to the model field it reads except for the
    /// identity fields.
    pub name: String,
    /// Resolution strategy.
    pub kind: OutputKind,
}

impl OutputField {
    fn new(name: impl Into<String>, kind: OutputKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// The object type generated for one model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectTypeDescriptor {
    /// Type name, equal to the model name.
    pub name: String,
    /// Underlying model.
    pub model: ModelDescriptor,
    /// Implemented interfaces.
    pub interfaces: Vec<String>,
    /// Declarative per-field lookups.
    pub filter_fields: FilterFields,
    /// Whether connection fields accept `orderBy`.
    pub filter_order_by: bool,
    /// Output fields in exposure order.
    pub fields: Vec<OutputField>,
}

impl ObjectTypeDescriptor {
    /// Returns the connection type name.
    #[must_use]
    pub fn connection_type_name(&self) -> String {
        format!("{}Connection", self.name)
    }

    /// Returns the edge type name.
    #[must_use]
    pub fn edge_type_name(&self) -> String {
        format!("{}Edge", self.name)
    }

    /// Looks up an output field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&OutputField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// A singular `<Model>(id: ID!)` lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeField {
    /// Root field name, equal to the model name.
    pub field_name: String,
    /// Object type served.
    pub type_name: String,
}

/// A paginated, filterable `all_<Model>` list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionField {
    /// Root field name.
    pub field_name: String,
    /// Object type of the nodes.
    pub type_name: String,
    /// Connection type name.
    pub connection_type: String,
    /// Filter set bound to the field.
    pub filterset: FilterSet,
    /// Filter arguments merged from the object's lookups and the filter set.
    pub filters: Vec<FilterArg>,
    /// Whether `orderBy` is accepted.
    pub order_by: bool,
}

impl ConnectionField {
    /// Returns every argument name in declaration order.
    #[must_use]
    pub fn argument_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = PAGINATION_ARGUMENTS.to_vec();
        if self.order_by {
            names.push(ORDER_BY_ARGUMENT);
        }
        names.extend(self.filters.iter().map(|f| f.name.as_str()));
        names
    }
}

/// The request-scoped store call log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugField {
    /// Root field name.
    pub field_name: String,
}

/// One root query entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryEntry {
    /// Singular lookup by global id.
    Node(NodeField),
    /// Paginated list.
    Connection(ConnectionField),
    /// Debug information.
    Debug(DebugField),
}

impl QueryEntry {
    /// Returns the GraphQL field name serving this entry.
    #[must_use]
    pub fn field_name(&self) -> &str {
        match self {
            Self::Node(node) => &node.field_name,
            Self::Connection(connection) => &connection.field_name,
            Self::Debug(debug) => &debug.field_name,
        }
    }
}

/// Every object type and root query field of the schema.
///
/// For `n` models there are exactly `2n + 1` entries: `<Model>` and
/// `all_<Model>` per model in registry order, then `debug`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RootQueryDescriptor {
    /// Object types by name, in registry order.
    pub objects: IndexMap<String, ObjectTypeDescriptor>,
    /// Root entries by key.
    pub entries: IndexMap<String, QueryEntry>,
}

impl RootQueryDescriptor {
    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up an entry by key.
    #[must_use]
    pub fn entry(&self, key: &str) -> Option<&QueryEntry> {
        self.entries.get(key)
    }

    /// Returns the entry keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Returns the GraphQL root field names in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.entries.values().map(QueryEntry::field_name)
    }

    /// Looks up an object type by name.
    #[must_use]
    pub fn object(&self, name: &str) -> Option<&ObjectTypeDescriptor> {
        self.objects.get(name)
    }
}

/// Plans the output fields of a model.
///
/// Relations are kept only when their target is exposed in the same
/// namespace. Generic relations are never exposed.
fn output_fields(model: &ModelDescriptor, exposed: &HashSet<&str>) -> Vec<OutputField> {
    let mut fields = vec![
        OutputField::new(GLOBAL_ID_FIELD, OutputKind::GlobalId),
        OutputField::new(RAW_ID_FIELD, OutputKind::RawId),
    ];

    for field in &model.fields {
        if field.name == GLOBAL_ID_FIELD {
            continue;
        }
        let kind = match &field.field_type {
            FieldType::GenericRelation => None,
            FieldType::ForeignKey { to } => exposed
                .contains(to.as_str())
                .then(|| OutputKind::Relation { target: to.clone() }),
            FieldType::ManyToMany { to } => exposed
                .contains(to.as_str())
                .then(|| OutputKind::RelationList { target: to.clone() }),
            FieldType::Array { item } => Some(match ScalarKind::of(item) {
                Some(kind) => OutputKind::List(kind),
                None => OutputKind::Scalar(ScalarKind::JsonString),
            }),
            other => ScalarKind::of(other).map(OutputKind::Scalar),
        };

        match kind {
            Some(kind) => fields.push(OutputField::new(field.name.clone(), kind)),
            None => trace!(model = %model.name, field = %field.name, "Field not exposed"),
        }
    }

    fields
}

/// Creates the object type descriptor for a model.
///
/// `exposed` holds the names of every model in the namespace.
#[must_use]
pub fn create_object_type(model: &ModelDescriptor, exposed: &HashSet<&str>) -> ObjectTypeDescriptor {
    ObjectTypeDescriptor {
        name: model.name.clone(),
        model: model.clone(),
        interfaces: vec![NODE_INTERFACE.to_string()],
        filter_fields: generate_filter_fields(model),
        filter_order_by: true,
        fields: output_fields(model, exposed),
    }
}

fn claim_type_name(
    taken: &mut HashSet<String>,
    name: String,
    model: &str,
) -> Result<(), SchemaError> {
    if taken.insert(name.clone()) {
        Ok(())
    } else {
        Err(SchemaError::TypeNameCollision {
            name,
            model: model.to_string(),
        })
    }
}

fn insert_entry(
    entries: &mut IndexMap<String, QueryEntry>,
    field_names: &mut HashSet<String>,
    key: String,
    entry: QueryEntry,
) -> Result<(), SchemaError> {
    if !field_names.insert(entry.field_name().to_string()) || entries.contains_key(&key) {
        return Err(SchemaError::DuplicateQueryField {
            name: entry.field_name().to_string(),
        });
    }
    entries.insert(key, entry);
    Ok(())
}

fn check_arguments(connection: &ConnectionField) -> Result<(), SchemaError> {
    let mut seen = HashSet::new();
    for name in connection.argument_names() {
        if !seen.insert(name) {
            return Err(SchemaError::ArgumentCollision {
                model: connection.type_name.clone(),
                argument: name.to_string(),
            });
        }
    }
    Ok(())
}

/// Plans the schema for the models of one namespace.
///
/// Models keep their registry order. An empty model list yields a
/// descriptor holding only the debug entry.
///
/// # Errors
///
/// Fails if a model is invalid, or if generated type, field or argument
/// names collide.
pub fn build_descriptors(models: &[ModelDescriptor]) -> Result<RootQueryDescriptor, SchemaError> {
    let exposed: HashSet<&str> = models.iter().map(|m| m.name.as_str()).collect();
    let mut taken: HashSet<String> = BUILTIN_TYPES.iter().map(|s| (*s).to_string()).collect();
    let mut descriptor = RootQueryDescriptor::default();
    let mut field_names = HashSet::new();

    for model in models {
        model.validate()?;

        let object = create_object_type(model, &exposed);
        claim_type_name(&mut taken, object.name.clone(), &model.name)?;
        claim_type_name(&mut taken, object.connection_type_name(), &model.name)?;
        claim_type_name(&mut taken, object.edge_type_name(), &model.name)?;

        let node = QueryEntry::Node(NodeField {
            field_name: model.name.clone(),
            type_name: object.name.clone(),
        });
        insert_entry(&mut descriptor.entries, &mut field_names, model.name.clone(), node)?;

        let filterset = FilterSet::for_model(model);
        let connection = ConnectionField {
            field_name: format!("{CONNECTION_FIELD_PREFIX}{}", model.name),
            type_name: object.name.clone(),
            connection_type: object.connection_type_name(),
            filters: filterset.arguments(&object.filter_fields),
            filterset,
            order_by: object.filter_order_by,
        };
        check_arguments(&connection)?;
        insert_entry(
            &mut descriptor.entries,
            &mut field_names,
            connection.field_name.clone(),
            QueryEntry::Connection(connection),
        )?;

        trace!(model = %model.name, "Planned object type and query fields");
        descriptor.objects.insert(object.name.clone(), object);
    }

    insert_entry(
        &mut descriptor.entries,
        &mut field_names,
        DEBUG_ENTRY.to_string(),
        QueryEntry::Debug(DebugField {
            field_name: DEBUG_FIELD_NAME.to_string(),
        }),
    )?;

    Ok(descriptor)
}
