use super::Subject;
use crate::core::{SubjectId, ValidationErrors};
use crate::model::inflector::humanize;
use serde_json::{Map as JsonMap, Value as JsonValue};

/// Schemaless subject: a JSON field map with a list of required fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentSubject {
    id: Option<SubjectId>,
    fields: JsonMap<String, JsonValue>,
    required: Vec<String>,
    errors: ValidationErrors,
}

impl DocumentSubject {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a field as required
    pub fn require(mut self, field: &str) -> Self {
        self.required.push(field.to_string());
        self
    }

    /// Set a field
    pub fn with(mut self, field: &str, value: impl Into<JsonValue>) -> Self {
        self.fields.insert(field.to_string(), value.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&JsonValue> {
        self.fields.get(field)
    }

    pub fn fields(&self) -> &JsonMap<String, JsonValue> {
        &self.fields
    }
}

fn is_blank_json(value: Option<&JsonValue>) -> bool {
    match value {
        None | Some(JsonValue::Null) => true,
        Some(JsonValue::String(text)) => text.trim().is_empty(),
        Some(_) => false,
    }
}

impl Subject for DocumentSubject {
    fn id(&self) -> Option<SubjectId> {
        self.id
    }

    fn set_id(&mut self, id: SubjectId) {
        self.id = Some(id);
    }

    fn load(&mut self, fields: &JsonMap<String, JsonValue>) -> bool {
        if fields.is_empty() {
            return false;
        }
        for (name, value) in fields {
            self.fields.insert(name.clone(), value.clone());
        }
        true
    }

    fn validate(&mut self) -> bool {
        self.errors.clear();
        for field in &self.required {
            if is_blank_json(self.fields.get(field)) {
                self.errors
                    .add(field.clone(), format!("{} cannot be blank.", humanize(field)));
            }
        }
        self.errors.is_empty()
    }

    fn errors(&self) -> &ValidationErrors {
        &self.errors
    }
}
