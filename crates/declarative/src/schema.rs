//! Attribute schemas
//!
//! A [`Schema`] lists every attribute a resource tracks together with its
//! capability tags: whether the caller must set it, whether the remote side
//! computes it, whether it is secret, and how the planner treats a change to
//! it. A change to a [`PlanModifier::RequiresReplace`] attribute can only be
//! applied by deleting and re-creating the resource.

use crate::diff::AttributeChange;
use crate::types::{Attributes, Value};
use thiserror::Error;

/// Value type of an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeType {
    String,
    Bool,
    Int64,
    StringList,
}

impl AttributeType {
    fn accepts(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (_, Value::Null)
                | (Self::String, Value::String(_))
                | (Self::Bool, Value::Bool(_))
                | (Self::Int64, Value::Int(_))
                | (Self::StringList, Value::List(_))
        )
    }
}

/// How the planner treats changes to an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanModifier {
    /// Any change forces delete + create
    RequiresReplace,
    /// A computed value that is unknown in the plan keeps its prior value
    UseStateForUnknown,
}

/// Schema entry for a single attribute
#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: &'static str,
    pub kind: AttributeType,
    pub description: &'static str,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub sensitive: bool,
    /// Allowed values for string attributes (empty means unrestricted)
    pub one_of: &'static [&'static str],
    pub modifiers: Vec<PlanModifier>,
}

impl Attribute {
    fn new(name: &'static str, kind: AttributeType) -> Self {
        Self {
            name,
            kind,
            description: "",
            required: false,
            optional: false,
            computed: false,
            sensitive: false,
            one_of: &[],
            modifiers: Vec::new(),
        }
    }

    pub fn string(name: &'static str) -> Self {
        Self::new(name, AttributeType::String)
    }

    pub fn bool(name: &'static str) -> Self {
        Self::new(name, AttributeType::Bool)
    }

    pub fn int64(name: &'static str) -> Self {
        Self::new(name, AttributeType::Int64)
    }

    pub fn string_list(name: &'static str) -> Self {
        Self::new(name, AttributeType::StringList)
    }

    pub fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn one_of(mut self, values: &'static [&'static str]) -> Self {
        self.one_of = values;
        self
    }

    pub fn requires_replace(mut self) -> Self {
        self.modifiers.push(PlanModifier::RequiresReplace);
        self
    }

    pub fn use_state_for_unknown(mut self) -> Self {
        self.modifiers.push(PlanModifier::UseStateForUnknown);
        self
    }

    pub fn has_modifier(&self, modifier: PlanModifier) -> bool {
        self.modifiers.contains(&modifier)
    }

    /// Whether changing this attribute forces the resource to be re-created
    pub fn forces_replacement(&self) -> bool {
        self.has_modifier(PlanModifier::RequiresReplace)
    }

    /// Whether a null planned value means "not known until apply"
    fn unknown_when_null(&self) -> bool {
        self.computed && (!self.optional || self.has_modifier(PlanModifier::UseStateForUnknown))
    }
}

/// Errors raised when attribute values do not satisfy a schema
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("{resource}: attribute '{attribute}' is required")]
    MissingRequired {
        resource: &'static str,
        attribute: &'static str,
    },

    #[error("{resource}: attribute '{attribute}' expects {expected:?}, got {got}")]
    TypeMismatch {
        resource: &'static str,
        attribute: &'static str,
        expected: AttributeType,
        got: &'static str,
    },

    #[error("{resource}: attribute '{attribute}' must be one of [{allowed}], got {value:?}")]
    NotAllowed {
        resource: &'static str,
        attribute: &'static str,
        value: String,
        allowed: String,
    },
}

/// Declared schema of one resource type
#[derive(Debug, Clone)]
pub struct Schema {
    pub type_name: &'static str,
    pub description: &'static str,
    pub attributes: Vec<Attribute>,
}

impl Schema {
    pub fn new(type_name: &'static str, description: &'static str, attributes: Vec<Attribute>) -> Self {
        Self {
            type_name,
            description,
            attributes,
        }
    }

    /// Look up an attribute by name
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Whether the named attribute is sensitive
    pub fn is_sensitive(&self, name: &str) -> bool {
        self.attribute(name).is_some_and(|a| a.sensitive)
    }

    /// Check required presence, value types and allowed values
    pub fn validate(&self, attrs: &Attributes) -> Result<(), SchemaError> {
        for attr in &self.attributes {
            let value = attrs.get(attr.name).unwrap_or(&Value::Null);

            if attr.required && value.is_null() {
                return Err(SchemaError::MissingRequired {
                    resource: self.type_name,
                    attribute: attr.name,
                });
            }

            if !attr.kind.accepts(value) {
                return Err(SchemaError::TypeMismatch {
                    resource: self.type_name,
                    attribute: attr.name,
                    expected: attr.kind,
                    got: value.kind(),
                });
            }

            if let Value::String(s) = value
                && !attr.one_of.is_empty()
                && !attr.one_of.contains(&s.as_str())
            {
                return Err(SchemaError::NotAllowed {
                    resource: self.type_name,
                    attribute: attr.name,
                    value: s.clone(),
                    allowed: attr.one_of.join(", "),
                });
            }
        }
        Ok(())
    }

    /// Attributes whose planned value differs from the prior value
    ///
    /// Computed attributes that are null in the plan are unknown until
    /// apply and never count as a change.
    pub fn diff(&self, prior: &Attributes, planned: &Attributes) -> Vec<AttributeChange> {
        self.attributes
            .iter()
            .filter_map(|attr| {
                let before = prior.get(attr.name).cloned().unwrap_or(Value::Null);
                let after = planned.get(attr.name).cloned().unwrap_or(Value::Null);

                if after.is_null() && attr.unknown_when_null() {
                    return None;
                }
                if before == after {
                    return None;
                }

                Some(AttributeChange {
                    attribute: attr.name.to_string(),
                    before,
                    after,
                    forces_replacement: attr.forces_replacement(),
                    sensitive: attr.sensitive,
                })
            })
            .collect()
    }

    /// Names of user-settable attributes that lack a replace trigger
    ///
    /// Resources with no in-place update endpoint keep this empty.
    pub fn updatable_attributes(&self) -> Vec<&'static str> {
        self.attributes
            .iter()
            .filter(|a| (a.required || a.optional) && !a.forces_replacement())
            .map(|a| a.name)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Schema {
        Schema::new(
            "thing",
            "Test thing",
            vec![
                Attribute::string("name").required().requires_replace(),
                Attribute::string("kind")
                    .required()
                    .one_of(&["a", "b"])
                    .requires_replace(),
                Attribute::int64("ttl").optional().computed().requires_replace(),
                Attribute::string("label").optional(),
                Attribute::string("id").computed().use_state_for_unknown(),
            ],
        )
    }

    fn attrs(pairs: &[(&str, Value)]) -> Attributes {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_validate_required() {
        let err = schema()
            .validate(&attrs(&[("kind", "a".into())]))
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::MissingRequired {
                resource: "thing",
                attribute: "name"
            }
        );
    }

    #[test]
    fn test_validate_one_of() {
        let err = schema()
            .validate(&attrs(&[("name", "x".into()), ("kind", "c".into())]))
            .unwrap_err();
        assert!(matches!(err, SchemaError::NotAllowed { attribute: "kind", .. }));
    }

    #[test]
    fn test_validate_type_mismatch() {
        let err = schema()
            .validate(&attrs(&[
                ("name", "x".into()),
                ("kind", "a".into()),
                ("ttl", "soon".into()),
            ]))
            .unwrap_err();
        assert!(matches!(err, SchemaError::TypeMismatch { attribute: "ttl", .. }));
    }

    #[test]
    fn test_diff_ignores_unknown_computed() {
        let prior = attrs(&[
            ("name", "x".into()),
            ("kind", "a".into()),
            ("id", "abc".into()),
        ]);
        let planned = attrs(&[("name", "x".into()), ("kind", "a".into())]);
        assert!(schema().diff(&prior, &planned).is_empty());
    }

    #[test]
    fn test_diff_flags_replacement() {
        let prior = attrs(&[("name", "x".into()), ("label", "old".into())]);
        let planned = attrs(&[("name", "y".into()), ("label", "new".into())]);
        let changes = schema().diff(&prior, &planned);

        assert_eq!(changes.len(), 2);
        assert!(changes[0].forces_replacement);
        assert_eq!(changes[0].attribute, "name");
        assert!(!changes[1].forces_replacement);
    }

    #[test]
    fn test_diff_null_versus_zero() {
        let prior = attrs(&[("ttl", Value::Int(0))]);
        let planned = attrs(&[("ttl", Value::Null)]);
        // optional+computed without UseStateForUnknown: null is an explicit value
        let changes = schema().diff(&prior, &planned);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].attribute, "ttl");
    }

    #[test]
    fn test_updatable_attributes() {
        assert_eq!(schema().updatable_attributes(), vec!["label"]);
    }
}
