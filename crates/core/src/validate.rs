//! Request-body validation against a declared [`Schema`].
//!
//! A schema is compiled once into a JSON Schema [`Validator`]. Validation
//! collects every violation instead of stopping at the first one, so a
//! caller can correct a request in a single round trip, and reports them in
//! schema declaration order.

use std::fmt;

use jsonschema::Validator;
use jsonschema::error::ValidationErrorKind;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::schema::{PropertyType, Schema};

/// Stable machine-readable violation codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationCode {
    Required,
    Type,
    MinLength,
    MaxLength,
    MinItems,
    Minimum,
    /// Any other schema keyword.
    Constraint,
    InvalidJson,
}

impl fmt::Display for ViolationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Required => "required",
            Self::Type => "type",
            Self::MinLength => "min_length",
            Self::MaxLength => "max_length",
            Self::MinItems => "min_items",
            Self::Minimum => "minimum",
            Self::Constraint => "constraint",
            Self::InvalidJson => "invalid_json",
        };
        f.write_str(s)
    }
}

/// A single field-level violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Dotted / indexed field path (`customer.email`, `tags[1]`). Empty for
    /// the body root.
    pub path: String,
    pub code: ViolationCode,
    pub message: String,
}

impl Violation {
    pub fn new(path: impl Into<String>, code: ViolationCode, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            code,
            message: message.into(),
        }
    }
}

/// Outcome of validating a body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Valid,
    /// Violations in schema declaration order.
    Invalid(Vec<Violation>),
}

impl Validation {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// A schema that could not be compiled into a validator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct SchemaError(String);

/// A [`Schema`] compiled for validation.
pub struct BodyValidator {
    schema: Schema,
    validator: Validator,
}

impl BodyValidator {
    /// Compile `schema`. Fails if the generated JSON Schema document is not
    /// itself valid (e.g. a non-finite `minimum`).
    pub fn compile(schema: &Schema) -> Result<Self, SchemaError> {
        let document = schema.to_json_schema();
        let validator =
            jsonschema::validator_for(&document).map_err(|e| SchemaError(e.to_string()))?;
        Ok(Self {
            schema: schema.clone(),
            validator,
        })
    }

    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Validate `body`. A `null` body is treated as an empty object so that
    /// every required field is reported.
    #[must_use]
    pub fn validate(&self, body: &Value) -> Validation {
        let empty = Value::Object(Map::new());
        let instance = if body.is_null() { &empty } else { body };

        let mut found: Vec<(Vec<usize>, Violation)> = self
            .validator
            .iter_errors(instance)
            .map(|error| {
                let mut steps = pointer_steps(instance, &error.instance_path().to_string());
                let code = match error.kind() {
                    ValidationErrorKind::Required { property } => {
                        if let Some(name) = property.as_str() {
                            steps.push(PathStep::Key(name.to_owned()));
                        }
                        ViolationCode::Required
                    }
                    ValidationErrorKind::Type { .. } => ViolationCode::Type,
                    ValidationErrorKind::MinLength { .. } => ViolationCode::MinLength,
                    ValidationErrorKind::MaxLength { .. } => ViolationCode::MaxLength,
                    ValidationErrorKind::MinItems { .. } => ViolationCode::MinItems,
                    ValidationErrorKind::Minimum { .. } => ViolationCode::Minimum,
                    _ => ViolationCode::Constraint,
                };
                let order = field_order(&self.schema, &steps);
                (order, Violation::new(render_path(&steps), code, error.to_string()))
            })
            .collect();

        if found.is_empty() {
            return Validation::Valid;
        }
        found.sort_by(|a, b| a.0.cmp(&b.0));
        Validation::Invalid(found.into_iter().map(|(_, v)| v).collect())
    }
}

impl fmt::Debug for BodyValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BodyValidator")
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

/// Validate `body` against an optional compiled schema.
///
/// With no schema the action declares no body contract and validation
/// passes trivially.
///
/// ```
/// use actroute_core::{BodyValidator, PropertyType, Schema, Validation, validate_body};
///
/// let schema = Schema::new()
///     .field("a", PropertyType::string_required())
///     .field("b", PropertyType::string_required());
/// let validator = BodyValidator::compile(&schema).unwrap();
/// let Validation::Invalid(violations) = validate_body(Some(&validator), &serde_json::json!({}))
/// else {
///     panic!("expected violations");
/// };
/// assert_eq!(violations.len(), 2);
/// ```
#[must_use]
pub fn validate_body(validator: Option<&BodyValidator>, body: &Value) -> Validation {
    validator.map_or(Validation::Valid, |v| v.validate(body))
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PathStep {
    Key(String),
    Index(usize),
}

/// Split a JSON pointer into steps, using the instance to tell array
/// indices from object keys.
fn pointer_steps(instance: &Value, pointer: &str) -> Vec<PathStep> {
    let mut steps = Vec::new();
    let mut current = Some(instance);
    for raw in pointer.split('/').skip(1) {
        let token = raw.replace("~1", "/").replace("~0", "~");
        let step = match (current, token.parse::<usize>()) {
            (Some(Value::Array(items)), Ok(i)) => {
                current = items.get(i);
                PathStep::Index(i)
            }
            (value, _) => {
                current = value.and_then(|v| v.get(&token));
                PathStep::Key(token)
            }
        };
        steps.push(step);
    }
    steps
}

fn render_path(steps: &[PathStep]) -> String {
    let mut path = String::new();
    for step in steps {
        match step {
            PathStep::Key(name) => {
                if !path.is_empty() {
                    path.push('.');
                }
                path.push_str(name);
            }
            PathStep::Index(i) => {
                path.push('[');
                path.push_str(&i.to_string());
                path.push(']');
            }
        }
    }
    path
}

/// Sort key placing a violation at its field's declaration position.
/// Unknown fields sort last.
fn field_order(schema: &Schema, steps: &[PathStep]) -> Vec<usize> {
    let mut key = Vec::with_capacity(steps.len());
    let mut object = Some(schema);
    let mut item: Option<&PropertyType> = None;

    for step in steps {
        let next = match step {
            PathStep::Key(name) => object.and_then(|s| {
                s.fields()
                    .iter()
                    .position(|f| &f.name == name)
                    .map(|i| (i, &s.fields()[i].rule))
            }),
            PathStep::Index(i) => item.map(|rule| (*i, rule)),
        };
        let Some((position, rule)) = next else {
            key.push(usize::MAX);
            break;
        };
        key.push(position);
        object = rule.properties.as_ref();
        item = rule.items.as_deref();
    }
    key
}
