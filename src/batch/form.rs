use crate::core::{MetaError, Result};
use serde_json::{Map as JsonMap, Value as JsonValue};
use std::collections::BTreeMap;

/// Decoded request payload: subject fields plus `{key: {value}}` attribute
/// pairs posted under the attribute form name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostedForm {
    pub subject_fields: JsonMap<String, JsonValue>,
    pub attributes: BTreeMap<String, Option<String>>,
}

impl PostedForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Post a value for one attribute key
    pub fn attribute(mut self, key: &str, value: &str) -> Self {
        self.attributes.insert(key.to_string(), Some(value.to_string()));
        self
    }

    /// Post one subject field
    pub fn subject_field(mut self, name: &str, value: impl Into<JsonValue>) -> Self {
        self.subject_fields.insert(name.to_string(), value.into());
        self
    }

    /// Splits a JSON object into subject fields and the attribute section
    /// found under `form_name`.
    ///
    /// Attribute entries may be `{"value": ...}` objects or bare scalars;
    /// numbers and booleans are stringified, `null` posts an absent value.
    pub fn from_json(payload: &JsonValue, form_name: &str) -> Result<Self> {
        let object = payload
            .as_object()
            .ok_or_else(|| MetaError::Serialization("form payload must be a JSON object".into()))?;

        let mut form = Self::new();
        for (name, value) in object {
            if name != form_name {
                form.subject_fields.insert(name.clone(), value.clone());
                continue;
            }

            let section = value.as_object().ok_or_else(|| {
                MetaError::Serialization(format!("'{form_name}' must be an object of attributes"))
            })?;
            for (key, entry) in section {
                let raw = match entry {
                    JsonValue::Object(fields) => fields.get("value").unwrap_or(&JsonValue::Null),
                    other => other,
                };
                form.attributes.insert(key.clone(), scalar_to_string(key, raw)?);
            }
        }
        Ok(form)
    }

    pub fn has_attributes(&self) -> bool {
        !self.attributes.is_empty()
    }

    pub fn has_subject_fields(&self) -> bool {
        !self.subject_fields.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        !self.has_attributes() && !self.has_subject_fields()
    }
}

/// Stringifies a posted scalar; `null` is an absent value.
pub(crate) fn scalar_to_string(key: &str, value: &JsonValue) -> Result<Option<String>> {
    match value {
        JsonValue::Null => Ok(None),
        JsonValue::String(text) => Ok(Some(text.clone())),
        JsonValue::Bool(flag) => Ok(Some(if *flag { "1" } else { "0" }.to_string())),
        JsonValue::Number(number) => Ok(Some(number.to_string())),
        _ => Err(MetaError::Serialization(format!(
            "value of attribute '{key}' must be a scalar"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::PostedForm;
    use serde_json::json;

    #[test]
    fn attributes_are_split_from_subject_fields() {
        let payload = json!({
            "title": "Hello",
            "UserMeta": {
                "bio": {"value": "text"},
                "age": {"value": 30},
                "newsletter": true,
                "gone": {"value": null}
            }
        });
        let form = PostedForm::from_json(&payload, "UserMeta").unwrap();

        assert_eq!(form.subject_fields.get("title"), Some(&json!("Hello")));
        assert_eq!(form.attributes["bio"].as_deref(), Some("text"));
        assert_eq!(form.attributes["age"].as_deref(), Some("30"));
        assert_eq!(form.attributes["newsletter"].as_deref(), Some("1"));
        assert_eq!(form.attributes["gone"], None);
    }

    #[test]
    fn nested_values_are_rejected() {
        let payload = json!({"UserMeta": {"bio": {"value": [1, 2]}}});
        assert!(PostedForm::from_json(&payload, "UserMeta").is_err());
        assert!(PostedForm::from_json(&json!([1]), "UserMeta").is_err());
    }

    #[test]
    fn empty_form_reports_nothing_posted() {
        let form = PostedForm::from_json(&json!({}), "UserMeta").unwrap();
        assert!(form.is_empty());
        assert!(!PostedForm::new().attribute("bio", "").is_empty());
    }
}
