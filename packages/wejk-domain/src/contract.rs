//! Structured-output contracts: the shape a completion result must have before any caller
//! sees it.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
	Text,
	Flag,
	Number { min: f64, max: f64 },
	TextList { min_items: usize, max_items: Option<usize> },
	OneOf(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
	pub name: &'static str,
	pub kind: FieldKind,
	pub required: bool,
	pub description: &'static str,
}
impl FieldSpec {
	pub const fn required(name: &'static str, kind: FieldKind, description: &'static str) -> Self {
		Self { name, kind, required: true, description }
	}

	pub const fn optional(name: &'static str, kind: FieldKind, description: &'static str) -> Self {
		Self { name, kind, required: false, description }
	}
}

#[derive(Debug, Clone, Copy)]
pub struct OutputContract {
	pub name: &'static str,
	pub fields: &'static [FieldSpec],
}
impl OutputContract {
	/// JSON Schema in the strict structured-output dialect: every property is listed as required
	/// and optional ones accept `null` instead.
	pub fn json_schema(&self) -> Value {
		let mut properties = Map::new();

		for field in self.fields {
			let mut schema = kind_schema(field.kind);

			if !field.required {
				let base = schema.get("type").cloned().unwrap_or(Value::Null);

				schema.insert(
					"type".to_string(),
					Value::Array(vec![base, Value::String("null".to_string())]),
				);
			}

			schema.insert("description".to_string(), Value::String(field.description.to_string()));
			properties.insert(field.name.to_string(), Value::Object(schema));
		}

		serde_json::json!({
			"type": "object",
			"properties": properties,
			"required": self.fields.iter().map(|field| field.name).collect::<Vec<_>>(),
			"additionalProperties": false,
		})
	}

	/// Text placed in the prompt so providers without schema enforcement still see the shape.
	pub fn format_instructions(&self) -> String {
		let schema = serde_json::to_string_pretty(&self.json_schema())
			.unwrap_or_else(|_| format!("{{\"title\": \"{}\"}}", self.name));

		format!(
			"Output must be valid JSON only, matching this JSON Schema exactly. Do not add explanations or extra fields.\n{schema}"
		)
	}

	pub fn validate(&self, value: &Value) -> Result<(), ContractViolation> {
		let Some(object) = value.as_object() else {
			return Err(self.violation(None, "result is not a JSON object"));
		};

		for field in self.fields {
			match object.get(field.name) {
				None | Some(Value::Null) =>
					if field.required {
						return Err(self.violation(Some(field.name), "required field is missing"));
					},
				Some(raw) => self.check_field(field, raw)?,
			}
		}

		Ok(())
	}

	pub fn decode<T>(&self, value: Value) -> Result<T, ContractViolation>
	where
		T: DeserializeOwned,
	{
		self.validate(&value)?;

		serde_json::from_value(value)
			.map_err(|err| self.violation(None, &format!("result does not decode: {err}")))
	}

	fn check_field(&self, field: &FieldSpec, raw: &Value) -> Result<(), ContractViolation> {
		match field.kind {
			FieldKind::Text =>
				if !raw.is_string() {
					return Err(self.violation(Some(field.name), "expected a string"));
				},
			FieldKind::Flag =>
				if !raw.is_boolean() {
					return Err(self.violation(Some(field.name), "expected a boolean"));
				},
			FieldKind::Number { min, max } => {
				let Some(number) = raw.as_f64() else {
					return Err(self.violation(Some(field.name), "expected a number"));
				};

				if !(min..=max).contains(&number) {
					return Err(self.violation(
						Some(field.name),
						&format!("{number} is outside the range {min}-{max}"),
					));
				}
			},
			FieldKind::TextList { min_items, max_items } => {
				let Some(items) = raw.as_array() else {
					return Err(self.violation(Some(field.name), "expected an array"));
				};

				if items.iter().any(|item| !item.is_string()) {
					return Err(self.violation(Some(field.name), "expected an array of strings"));
				}
				if items.len() < min_items {
					return Err(self.violation(
						Some(field.name),
						&format!("expected at least {min_items} items, got {}", items.len()),
					));
				}
				if let Some(max) = max_items
					&& items.len() > max
				{
					return Err(self.violation(
						Some(field.name),
						&format!("expected at most {max} items, got {}", items.len()),
					));
				}
			},
			FieldKind::OneOf(allowed) => {
				let Some(text) = raw.as_str() else {
					return Err(self.violation(Some(field.name), "expected a string"));
				};

				if !allowed.contains(&text) {
					return Err(self.violation(
						Some(field.name),
						&format!("{text:?} is not one of {allowed:?}"),
					));
				}
			},
		}

		Ok(())
	}

	fn violation(&self, field: Option<&'static str>, reason: &str) -> ContractViolation {
		ContractViolation { contract: self.name, field, reason: reason.to_string() }
	}
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{contract}{}: {reason}", .field.map(|name| format!(".{name}")).unwrap_or_default())]
pub struct ContractViolation {
	pub contract: &'static str,
	pub field: Option<&'static str>,
	pub reason: String,
}

fn kind_schema(kind: FieldKind) -> Map<String, Value> {
	let value = match kind {
		FieldKind::Text => serde_json::json!({ "type": "string" }),
		FieldKind::Flag => serde_json::json!({ "type": "boolean" }),
		FieldKind::Number { min, max } =>
			serde_json::json!({ "type": "number", "minimum": min, "maximum": max }),
		FieldKind::TextList { min_items, max_items } => {
			let mut schema = serde_json::json!({
				"type": "array",
				"items": { "type": "string" },
				"minItems": min_items,
			});

			if let Some(max) = max_items {
				schema["maxItems"] = Value::from(max);
			}

			schema
		},
		FieldKind::OneOf(allowed) => serde_json::json!({ "type": "string", "enum": allowed }),
	};

	match value {
		Value::Object(map) => map,
		_ => Map::new(),
	}
}
