//! Declarative request-body schemas.
//!
//! A [`Schema`] describes a JSON object as an ordered list of named fields,
//! each constrained by a [`PropertyType`]. Schemas are plain data: they are
//! built once alongside an action descriptor and never mutated afterwards,
//! and are compiled to a JSON Schema document for validation.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// JSON value categories a property can be constrained to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
}

impl ValueType {
    /// JSON Schema `type` keyword value.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
        }
    }
}

/// Constraints applied to a single property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyType {
    #[serde(rename = "type")]
    pub value_type: ValueType,
    /// The property must be present and not `null`.
    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,
    /// Strings must not be empty; arrays must have at least one element.
    #[serde(default, skip_serializing_if = "is_false")]
    pub not_empty: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_items: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    /// Element constraint for arrays.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<PropertyType>>,
    /// Nested field constraints for objects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Schema>,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_false(b: &bool) -> bool {
    !*b
}

impl PropertyType {
    /// An unconstrained property of the given type.
    #[must_use]
    pub fn of(value_type: ValueType) -> Self {
        Self {
            value_type,
            required: false,
            not_empty: false,
            min_length: None,
            max_length: None,
            min_items: None,
            minimum: None,
            items: None,
            properties: None,
        }
    }

    #[must_use]
    pub fn string() -> Self {
        Self::of(ValueType::String)
    }

    #[must_use]
    pub fn number() -> Self {
        Self::of(ValueType::Number)
    }

    #[must_use]
    pub fn integer() -> Self {
        Self::of(ValueType::Integer)
    }

    #[must_use]
    pub fn boolean() -> Self {
        Self::of(ValueType::Boolean)
    }

    /// An array whose elements must each satisfy `item`.
    #[must_use]
    pub fn array(item: PropertyType) -> Self {
        Self {
            items: Some(Box::new(item)),
            ..Self::of(ValueType::Array)
        }
    }

    /// A nested object described by `schema`.
    #[must_use]
    pub fn object(schema: Schema) -> Self {
        Self {
            properties: Some(schema),
            ..Self::of(ValueType::Object)
        }
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub fn not_empty(mut self) -> Self {
        self.not_empty = true;
        self
    }

    #[must_use]
    pub fn min_length(mut self, min: usize) -> Self {
        self.min_length = Some(min);
        self
    }

    #[must_use]
    pub fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    #[must_use]
    pub fn min_items(mut self, min: usize) -> Self {
        self.min_items = Some(min);
        self
    }

    #[must_use]
    pub fn minimum(mut self, min: f64) -> Self {
        self.minimum = Some(min);
        self
    }

    /// JSON Schema for this property. Optional object properties also
    /// accept `null`.
    #[must_use]
    pub fn to_json_schema(&self, nullable: bool) -> Value {
        let mut doc = Map::new();
        let ty = self.value_type.as_str();
        doc.insert(
            "type".into(),
            if nullable { json!([ty, "null"]) } else { json!(ty) },
        );

        match self.value_type {
            ValueType::String => {
                let min = match (self.min_length, self.not_empty) {
                    (Some(min), true) => Some(min.max(1)),
                    (None, true) => Some(1),
                    (min, false) => min,
                };
                if let Some(min) = min {
                    doc.insert("minLength".into(), json!(min));
                }
                if let Some(max) = self.max_length {
                    doc.insert("maxLength".into(), json!(max));
                }
            }
            ValueType::Array => {
                let min = match (self.min_items, self.not_empty) {
                    (Some(min), true) => Some(min.max(1)),
                    (None, true) => Some(1),
                    (min, false) => min,
                };
                if let Some(min) = min {
                    doc.insert("minItems".into(), json!(min));
                }
                if let Some(item) = &self.items {
                    doc.insert("items".into(), item.to_json_schema(false));
                }
            }
            ValueType::Number | ValueType::Integer => {
                if let Some(min) = self.minimum {
                    doc.insert("minimum".into(), json!(min));
                }
            }
            ValueType::Object => {
                if let Some(nested) = &self.properties {
                    nested.write_object_keywords(&mut doc);
                }
            }
            ValueType::Boolean => {}
        }

        Value::Object(doc)
    }

    // -- Presets ------------------------------------------------------------

    /// Required, non-empty string.
    #[must_use]
    pub fn string_not_empty() -> Self {
        Self::string().required().not_empty()
    }

    /// Required string (may be empty).
    #[must_use]
    pub fn string_required() -> Self {
        Self::string().required()
    }

    /// Optional string capped at `max` characters.
    #[must_use]
    pub fn string_limited(max: usize) -> Self {
        Self::string().max_length(max)
    }

    /// Required array with at least one element, each satisfying `item`.
    #[must_use]
    pub fn array_required_with(item: PropertyType) -> Self {
        Self::array(item).required().min_items(1)
    }

    /// Required number no smaller than `min`.
    #[must_use]
    pub fn number_min(min: f64) -> Self {
        Self::number().required().minimum(min)
    }
}

/// A named field within a [`Schema`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(flatten)]
    pub rule: PropertyType,
}

/// Ordered object schema. Field order determines violation order.
///
/// ```
/// use actroute_core::{PropertyType, Schema};
///
/// let schema = Schema::new()
///     .field("orderId", PropertyType::string_not_empty())
///     .field("orderName", PropertyType::string_required());
/// assert_eq!(schema.fields().len(), 2);
/// assert!(schema.get("orderName").unwrap().required);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field. Declaring the same name twice replaces the earlier
    /// rule in place.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, rule: PropertyType) -> Self {
        let name = name.into();
        if let Some(existing) = self.fields.iter_mut().find(|f| f.name == name) {
            existing.rule = rule;
        } else {
            self.fields.push(Field { name, rule });
        }
        self
    }

    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PropertyType> {
        self.fields.iter().find(|f| f.name == name).map(|f| &f.rule)
    }

    /// The schema as a JSON Schema object document.
    ///
    /// ```
    /// use actroute_core::{PropertyType, Schema};
    ///
    /// let doc = Schema::new()
    ///     .field("orderId", PropertyType::string_not_empty())
    ///     .to_json_schema();
    /// assert_eq!(doc["properties"]["orderId"]["minLength"], 1);
    /// assert_eq!(doc["required"][0], "orderId");
    /// ```
    #[must_use]
    pub fn to_json_schema(&self) -> Value {
        let mut doc = Map::new();
        doc.insert("type".into(), json!("object"));
        self.write_object_keywords(&mut doc);
        Value::Object(doc)
    }

    fn write_object_keywords(&self, doc: &mut Map<String, Value>) {
        let properties: Map<String, Value> = self
            .fields
            .iter()
            .map(|f| (f.name.clone(), f.rule.to_json_schema(!f.rule.required)))
            .collect();
        let required: Vec<&str> = self
            .fields
            .iter()
            .filter(|f| f.rule.required)
            .map(|f| f.name.as_str())
            .collect();

        doc.insert("properties".into(), Value::Object(properties));
        if !required.is_empty() {
            doc.insert("required".into(), json!(required));
        }
    }
}
