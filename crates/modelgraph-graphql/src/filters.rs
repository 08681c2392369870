//! Filterable-field selection and filter sets.
//!
//! Every model field is filterable by equality and set membership unless
//! its type cannot be compared that way in the store (arrays, JSON
//! documents, generic relations) or its name is on the internal exclusion
//! list. From that single selection two structures are derived:
//!
//! - [`FilterFields`], the declarative `{field: [exact, in]}` map carried by
//!   the object type descriptor;
//! - [`FilterSet`], the explicit filter set bound to the connection field,
//!   which declares one `<field>__in` filter taking a comma-separated list
//!   of raw values.
//!
//! [`FilterSet::arguments`] merges both into the argument list of the
//! connection field. A declared filter replaces a generated one of the same
//! name.

use std::collections::BTreeMap;
use std::fmt;

use modelgraph_core::{FieldDescriptor, ModelDescriptor};

/// Field names that are never filterable, whatever their type.
pub const EXEMPT_FIELD_NAMES: &[&str] = &["_field_status"];

/// Suffix joining a field name and its lookup in filter names.
pub const LOOKUP_SEPARATOR: &str = "__";

/// A filter lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LookupKind {
    /// Equality.
    Exact,
    /// Set membership.
    In,
}

impl LookupKind {
    /// All lookups enabled on a filterable field.
    pub const ALL: [Self; 2] = [Self::Exact, Self::In];

    /// Returns the lookup name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::In => "in",
        }
    }

    /// Returns the argument name for `field` with this lookup.
    ///
    /// `exact` is the implicit lookup, so it uses the bare field name.
    #[must_use]
    pub fn argument_name(self, field: &str) -> String {
        match self {
            Self::Exact => field.to_string(),
            other => format!("{field}{LOOKUP_SEPARATOR}{}", other.as_str()),
        }
    }
}

impl fmt::Display for LookupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declarative per-field lookups, ordered by field name.
pub type FilterFields = BTreeMap<String, Vec<LookupKind>>;

/// Returns `true` if the field may be filtered on.
#[must_use]
pub fn is_filterable(field: &FieldDescriptor) -> bool {
    !field.field_type.is_filter_exempt() && !EXEMPT_FIELD_NAMES.contains(&field.name.as_str())
}

/// Returns the filterable fields of a model in declaration order.
#[must_use]
pub fn filterable_fields(model: &ModelDescriptor) -> Vec<&FieldDescriptor> {
    model.fields.iter().filter(|f| is_filterable(f)).collect()
}

/// Builds the declarative filter map for a model.
#[must_use]
pub fn generate_filter_fields(model: &ModelDescriptor) -> FilterFields {
    filterable_fields(model)
        .into_iter()
        .map(|f| (f.name.clone(), LookupKind::ALL.to_vec()))
        .collect()
}

/// A declared set-membership filter over a comma-separated list of raw
/// string values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InFilter {
    /// Argument name, `<field>__in`.
    pub name: String,
    /// Field the filter applies to.
    pub field_name: String,
}

impl InFilter {
    /// Creates the `__in` filter for a field.
    #[must_use]
    pub fn for_field(field_name: &str) -> Self {
        Self {
            name: LookupKind::In.argument_name(field_name),
            field_name: field_name.to_string(),
        }
    }
}

/// The filter set bound to a model's connection field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSet {
    /// Filter set name, `<Model>InFilters`.
    pub name: String,
    /// Model the filters apply to.
    pub model: String,
    /// Fields receiving a generated `exact` filter, in declaration order.
    pub fields: Vec<String>,
    /// Explicitly declared filters by name.
    pub declared: BTreeMap<String, InFilter>,
}

/// Shape of the value a filter argument accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterInput {
    /// One value of the field's scalar type.
    Scalar,
    /// One string holding comma-separated raw values.
    RawList,
}

/// One argument of a connection field derived from a filter set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterArg {
    /// Argument name.
    pub name: String,
    /// Field compared.
    pub field: String,
    /// Comparison.
    pub lookup: LookupKind,
    /// Accepted input shape.
    pub input: FilterInput,
}

impl FilterArg {
    fn generated(field: &str, lookup: LookupKind) -> Self {
        let input = match lookup {
            LookupKind::Exact => FilterInput::Scalar,
            LookupKind::In => FilterInput::RawList,
        };
        Self {
            name: lookup.argument_name(field),
            field: field.to_string(),
            lookup,
            input,
        }
    }

    fn declared(filter: &InFilter) -> Self {
        Self {
            name: filter.name.clone(),
            field: filter.field_name.clone(),
            lookup: LookupKind::In,
            input: FilterInput::RawList,
        }
    }
}

impl FilterSet {
    /// Builds the explicit filter set for a model.
    #[must_use]
    pub fn for_model(model: &ModelDescriptor) -> Self {
        let eligible = filterable_fields(model);
        let declared = eligible
            .iter()
            .map(|f| InFilter::for_field(&f.name))
            .map(|filter| (filter.name.clone(), filter))
            .collect();

        Self {
            name: format!("{}InFilters", model.name),
            model: model.name.clone(),
            fields: eligible.into_iter().map(|f| f.name.clone()).collect(),
            declared,
        }
    }

    /// Returns the field names covered by declared `__in` filters.
    #[must_use]
    pub fn in_filter_fields(&self) -> Vec<&str> {
        self.declared.values().map(|f| f.field_name.as_str()).collect()
    }

    /// Merges the declarative lookups with this set into connection
    /// arguments, sorted by name.
    #[must_use]
    pub fn arguments(&self, filter_fields: &FilterFields) -> Vec<FilterArg> {
        let mut args: BTreeMap<String, FilterArg> = BTreeMap::new();

        for (field, lookups) in filter_fields {
            for lookup in lookups {
                let arg = FilterArg::generated(field, *lookup);
                args.insert(arg.name.clone(), arg);
            }
        }
        for field in &self.fields {
            args.entry(field.clone())
                .or_insert_with(|| FilterArg::generated(field, LookupKind::Exact));
        }
        for filter in self.declared.values() {
            args.insert(filter.name.clone(), FilterArg::declared(filter));
        }

        args.into_values().collect()
    }
}
