//! GraphQL type generation from descriptors.
//!
//! Turns the planned [`ObjectTypeDescriptor`]s and root entries into
//! async-graphql dynamic types wired to their resolvers.

use std::collections::HashMap;
use std::sync::Arc;

use async_graphql::dynamic::{
    Field, InputValue, Interface, InterfaceField, Object, Scalar, SchemaBuilder, TypeRef,
};
use modelgraph_core::ModelDescriptor;
use tracing::trace;

use super::descriptor::{
    ConnectionField, DEBUG_INFO_TYPE, DEBUG_QUERY_TYPE, DebugField, GLOBAL_ID_FIELD,
    JSON_STRING_SCALAR, NODE_INTERFACE, NodeField, ORDER_BY_ARGUMENT, ObjectTypeDescriptor,
    OutputKind, PAGE_INFO_TYPE, ScalarKind,
};
use crate::filters::FilterInput;
use crate::resolvers::{
    ConnectionResolver, ConnectionSpec, DebugResolver, FieldResolver, NodeResolver, value_field,
};

/// Model descriptors shared by resolvers, keyed by type name.
pub(crate) type ModelIndex = HashMap<String, Arc<ModelDescriptor>>;

/// Returns the output type of an object field.
#[must_use]
pub fn output_type_ref(kind: &OutputKind) -> TypeRef {
    match kind {
        OutputKind::GlobalId => TypeRef::named_nn(TypeRef::ID),
        OutputKind::RawId => TypeRef::named(TypeRef::INT),
        OutputKind::Scalar(scalar) => TypeRef::named(scalar.type_name()),
        OutputKind::List(scalar) => TypeRef::named_list(scalar.type_name()),
        OutputKind::Relation { target } => TypeRef::named(target),
        OutputKind::RelationList { target } => TypeRef::named_list(target),
    }
}

/// Registers the types shared by every model: `JSONString`, `PageInfo`,
/// the debug types and, when any model exists, the `Node` interface.
pub(crate) fn register_shared_types(builder: SchemaBuilder, with_node: bool) -> SchemaBuilder {
    let json_string = Scalar::new(JSON_STRING_SCALAR)
        .description("A JSON document serialized as a string");

    let page_info = Object::new(PAGE_INFO_TYPE)
        .description("Information about pagination in a connection")
        .field(Field::new(
            "hasNextPage",
            TypeRef::named_nn(TypeRef::BOOLEAN),
            value_field("hasNextPage"),
        ))
        .field(Field::new(
            "hasPreviousPage",
            TypeRef::named_nn(TypeRef::BOOLEAN),
            value_field("hasPreviousPage"),
        ))
        .field(Field::new(
            "startCursor",
            TypeRef::named(TypeRef::STRING),
            value_field("startCursor"),
        ))
        .field(Field::new(
            "endCursor",
            TypeRef::named(TypeRef::STRING),
            value_field("endCursor"),
        ));

    let debug_query = Object::new(DEBUG_QUERY_TYPE)
        .description("A store call made while resolving the request")
        .field(Field::new("model", TypeRef::named_nn(TypeRef::STRING), value_field("model")))
        .field(Field::new(
            "operation",
            TypeRef::named_nn(TypeRef::STRING),
            value_field("operation"),
        ))
        .field(Field::new(
            "lookups",
            TypeRef::named_nn(TypeRef::STRING),
            value_field("lookups"),
        ))
        .field(Field::new(
            "durationMs",
            TypeRef::named(TypeRef::FLOAT),
            value_field("durationMs"),
        ));

    let debug_info = Object::new(DEBUG_INFO_TYPE)
        .description("Store calls made by the current request")
        .field(Field::new(
            "queries",
            TypeRef::named_nn_list_nn(DEBUG_QUERY_TYPE),
            DebugResolver::queries(),
        ));

    let mut builder = builder
        .register(json_string)
        .register(page_info)
        .register(debug_query)
        .register(debug_info);

    if with_node {
        let node = Interface::new(NODE_INTERFACE)
            .description("An object with a global ID")
            .field(InterfaceField::new(
                GLOBAL_ID_FIELD,
                TypeRef::named_nn(TypeRef::ID),
            ));
        builder = builder.register(node);
    }

    builder
}

/// Builds the object type of a model.
pub(crate) fn object_type(object: &ObjectTypeDescriptor, models: &ModelIndex) -> Object {
    let mut ty = Object::new(&object.name).description(format!(
        "{} ({})",
        object.name,
        object.model.label()
    ));
    for interface in &object.interfaces {
        ty = ty.implement(interface);
    }

    let primary_key = object.model.primary_key.clone();
    let integral = object
        .model
        .primary_key_field()
        .is_some_and(|f| f.field_type.is_integral());

    for field in &object.fields {
        let type_ref = output_type_ref(&field.kind);
        let name = field.name.clone();
        let gql_field = match &field.kind {
            OutputKind::GlobalId => Field::new(
                &field.name,
                type_ref,
                FieldResolver::global_id(object.name.clone(), primary_key.clone()),
            )
            .description("The ID of the object"),
            OutputKind::RawId => Field::new(
                &field.name,
                type_ref,
                FieldResolver::raw_id(primary_key.clone(), integral),
            )
            .description("The integer primary key"),
            OutputKind::Scalar(kind) => {
                Field::new(&field.name, type_ref, FieldResolver::scalar(name, *kind))
            }
            OutputKind::List(kind) => {
                Field::new(&field.name, type_ref, FieldResolver::list(name, *kind))
            }
            OutputKind::Relation { target } => match models.get(target) {
                Some(target) => Field::new(
                    &field.name,
                    type_ref,
                    FieldResolver::relation(name, target.clone()),
                ),
                None => continue,
            },
            OutputKind::RelationList { target } => match models.get(target) {
                Some(target) => Field::new(
                    &field.name,
                    type_ref,
                    FieldResolver::relation_list(name, target.clone()),
                ),
                None => continue,
            },
        };
        ty = ty.field(gql_field);
    }

    trace!(type_name = %object.name, fields = object.fields.len(), "Built object type");
    ty
}

/// Builds the connection and edge types of a model.
pub(crate) fn connection_types(object: &ObjectTypeDescriptor) -> (Object, Object) {
    let edge_name = object.edge_type_name();

    let edge = Object::new(&edge_name)
        .description(format!("A {} edge in a connection", object.name))
        .field(
            Field::new("node", TypeRef::named(&object.name), ConnectionResolver::edge_node())
                .description("The item at the end of the edge"),
        )
        .field(
            Field::new(
                "cursor",
                TypeRef::named_nn(TypeRef::STRING),
                ConnectionResolver::edge_cursor(),
            )
            .description("A cursor for use in pagination"),
        );

    let connection = Object::new(object.connection_type_name())
        .description(format!("A paginated list of {}", object.name))
        .field(
            Field::new(
                "pageInfo",
                TypeRef::named_nn(PAGE_INFO_TYPE),
                ConnectionResolver::page_info(),
            )
            .description("Pagination data for this connection"),
        )
        .field(
            Field::new(
                "edges",
                TypeRef::named_list_nn(&edge_name),
                ConnectionResolver::edges(),
            )
            .description("Contains the nodes in this connection"),
        );

    (connection, edge)
}

/// Builds a `<Model>(id: ID!)` root field.
pub(crate) fn node_field(node: &NodeField, model: Arc<ModelDescriptor>) -> Field {
    Field::new(
        &node.field_name,
        TypeRef::named(&node.type_name),
        NodeResolver::resolve(model),
    )
    .argument(InputValue::new("id", TypeRef::named_nn(TypeRef::ID)).description("The ID of the object"))
    .description(format!("Fetch a single {} by global ID", node.type_name))
}

/// Builds an `all_<Model>` root field.
pub(crate) fn connection_field(
    connection: &ConnectionField,
    model: Arc<ModelDescriptor>,
    max_limit: usize,
) -> Field {
    let spec = Arc::new(ConnectionSpec {
        field_name: connection.field_name.clone(),
        model: model.clone(),
        filters: connection.filters.clone(),
        order_by: connection.order_by,
        max_limit,
    });

    let mut field = Field::new(
        &connection.field_name,
        TypeRef::named(&connection.connection_type),
        ConnectionResolver::resolve(spec),
    )
    .description(format!("List {} records", connection.type_name))
    .argument(InputValue::new("before", TypeRef::named(TypeRef::STRING)))
    .argument(InputValue::new("after", TypeRef::named(TypeRef::STRING)))
    .argument(InputValue::new("first", TypeRef::named(TypeRef::INT)))
    .argument(InputValue::new("last", TypeRef::named(TypeRef::INT)))
    .argument(InputValue::new("offset", TypeRef::named(TypeRef::INT)));

    if connection.order_by {
        field = field.argument(
            InputValue::new(ORDER_BY_ARGUMENT, TypeRef::named(TypeRef::STRING))
                .description("Comma-separated field names; prefix with '-' for descending"),
        );
    }

    for filter in &connection.filters {
        let scalar = model
            .field(&filter.field)
            .and_then(|f| ScalarKind::of(&f.field_type))
            .unwrap_or(ScalarKind::String);
        let type_ref = match filter.input {
            FilterInput::Scalar => TypeRef::named(scalar.type_name()),
            FilterInput::RawList => TypeRef::named(TypeRef::STRING),
        };
        field = field.argument(InputValue::new(&filter.name, type_ref));
    }

    trace!(
        field = %connection.field_name,
        arguments = connection.argument_names().len(),
        "Built connection field"
    );
    field
}

/// Builds the `_debug` root field.
pub(crate) fn debug_field(debug: &DebugField) -> Field {
    Field::new(
        &debug.field_name,
        TypeRef::named(DEBUG_INFO_TYPE),
        DebugResolver::resolve(),
    )
    .description("Store calls made by this request; select it last")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_type_refs() {
        assert_eq!(output_type_ref(&OutputKind::GlobalId).to_string(), "ID!");
        assert_eq!(output_type_ref(&OutputKind::RawId).to_string(), "Int");
        assert_eq!(
            output_type_ref(&OutputKind::Scalar(ScalarKind::JsonString)).to_string(),
            "JSONString"
        );
        assert_eq!(
            output_type_ref(&OutputKind::List(ScalarKind::Int)).to_string(),
            "[Int]"
        );
        assert_eq!(
            output_type_ref(&OutputKind::Relation {
                target: "Owner".into()
            })
            .to_string(),
            "Owner"
        );
        assert_eq!(
            output_type_ref(&OutputKind::RelationList {
                target: "Tag".into()
            })
            .to_string(),
            "[Tag]"
        );
    }
}
