use super::behavior::{AttributeBehavior, NamedBehavior};
use super::config::AttributeOptions;
use super::inflector::{form_input_name, humanize};
use super::rules::{Field, Rule, RuleDescriptor, RuleKind};
use crate::core::{
    AttributeRow, MetaError, NewAttributeRow, Result, RowId, SubjectId, ValidationErrors,
};
use crate::store::AttributeStore;
use log::debug;
use serde_json::{Map as JsonMap, Value as JsonValue, json};
use std::sync::Arc;

/// One `(subject, key, value)` attribute row plus instance-only
/// presentation and validation settings.
#[derive(Debug, Clone)]
pub struct AttributeRecord {
    id: Option<RowId>,
    foreign_key_field: String,
    pub subject_id: Option<SubjectId>,
    pub key: String,
    pub value: Option<String>,
    pub label: String,
    pub hint: String,
    pub rules: Vec<RuleDescriptor>,
    errors: ValidationErrors,
    behaviors: Vec<NamedBehavior>,
}

impl AttributeRecord {
    /// A record that is not stored yet.
    pub fn new(foreign_key_field: &str, subject_id: Option<SubjectId>, key: &str) -> Self {
        Self {
            id: None,
            foreign_key_field: foreign_key_field.to_string(),
            subject_id,
            key: key.to_string(),
            value: None,
            label: String::new(),
            hint: String::new(),
            rules: Vec::new(),
            errors: ValidationErrors::new(),
            behaviors: Vec::new(),
        }
    }

    pub fn from_row(foreign_key_field: &str, row: AttributeRow) -> Self {
        let mut record = Self::new(foreign_key_field, Some(row.subject_id), &row.key);
        record.id = Some(row.id);
        record.value = row.value;
        record
    }

    pub fn id(&self) -> Option<RowId> {
        self.id
    }

    pub fn is_new_record(&self) -> bool {
        self.id.is_none()
    }

    pub fn foreign_key_field(&self) -> &str {
        &self.foreign_key_field
    }

    /// Copies label, hint and rules from `options`. The configured default
    /// value is only taken when `with_default` is set, so a stored value is
    /// never overwritten.
    pub fn configure(&mut self, options: &AttributeOptions, with_default: bool) {
        self.label = options.label.clone();
        self.hint = options.hint.clone();
        self.rules = options.rules.clone();
        if with_default {
            self.value = options.value.clone();
        }
    }

    pub fn attach_behavior(&mut self, name: &str, behavior: Arc<dyn AttributeBehavior>) {
        self.behaviors.retain(|attached| attached.name != name);
        self.behaviors.push(NamedBehavior {
            name: name.to_string(),
            behavior,
        });
    }

    pub fn has_behavior(&self, name: &str) -> bool {
        self.behaviors.iter().any(|attached| attached.name == name)
    }

    /// Default key/foreign-key rules followed by the configured value rules.
    pub fn validation_rules(&self, max_key_length: usize) -> Vec<Rule> {
        let mut rules = Rule::defaults(max_key_length);
        rules.extend(self.rules.iter().cloned().map(Rule::for_value));
        rules
    }

    pub fn field_name(&self, field: Field) -> &str {
        match field {
            Field::SubjectForeignKey => &self.foreign_key_field,
            Field::Key => "key",
            Field::Value => "value",
        }
    }

    /// Tabular input name of this record's value, e.g. `[favoriteColor]value`.
    pub fn input_name(&self) -> String {
        form_input_name(&self.key)
    }

    fn is_value_attribute(&self, attribute: &str) -> bool {
        attribute == "value" || attribute == self.input_name()
    }

    pub fn attribute_label(&self, attribute: &str) -> String {
        if self.is_value_attribute(attribute) && !self.label.is_empty() {
            return self.label.clone();
        }
        if self.is_value_attribute(attribute) {
            return humanize("value");
        }
        humanize(attribute)
    }

    pub fn attribute_hint(&self, attribute: &str) -> String {
        if self.is_value_attribute(attribute) {
            return self.hint.clone();
        }
        String::new()
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: Field, message: impl Into<String>) {
        let name = self.field_name(field).to_string();
        self.errors.add(name, message);
    }

    /// Errors on `key` or `value`; a foreign-key error alone is not blocking.
    pub fn has_blocking_errors(&self) -> bool {
        self.errors.has("key") || self.errors.has("value")
    }

    fn field_has_errors(&self, field: Field) -> bool {
        self.errors.has(self.field_name(field))
    }

    /// Runs every rule and collects errors on the record.
    pub async fn validate(&mut self, store: &AttributeStore) -> Result<bool> {
        self.errors.clear();
        for attached in self.behaviors.clone() {
            attached.behavior.before_validate(self);
        }

        for rule in self.validation_rules(store.model().max_key_length) {
            for field in rule.fields.iter().copied() {
                if rule.skip_on_error && self.field_has_errors(field) {
                    continue;
                }
                if let Some(message) = self.check_rule(store, &rule.kind, field).await? {
                    self.add_error(field, message);
                }
            }
        }
        Ok(!self.has_errors())
    }

    async fn check_rule(
        &self,
        store: &AttributeStore,
        kind: &RuleKind,
        field: Field,
    ) -> Result<Option<String>> {
        let label = self.attribute_label(self.field_name(field));
        let message = match kind {
            RuleKind::Required => {
                let blank = match field {
                    Field::SubjectForeignKey => self.subject_id.is_none(),
                    Field::Key => self.key.is_empty(),
                    Field::Value => crate::core::is_blank(self.value.as_deref()),
                };
                blank.then(|| format!("{label} cannot be blank."))
            }
            RuleKind::KeyLength { max } => (self.key.chars().count() > *max)
                .then(|| format!("{label} should contain at most {max} characters.")),
            RuleKind::UniquePair => {
                let Some(subject_id) = self.subject_id else {
                    return Ok(None);
                };
                if self.key.is_empty() {
                    return Ok(None);
                }
                let existing = store.find(subject_id, &self.key).await?;
                existing
                    .filter(|row| Some(row.id) != self.id)
                    .map(|_| format!("{label} \"{}\" has already been taken.", self.key))
            }
            RuleKind::SubjectExists => match self.subject_id {
                Some(subject_id) if !store.subject_exists(subject_id).await? => {
                    Some(format!("{label} is invalid."))
                }
                _ => None,
            },
            RuleKind::Custom(descriptor) => descriptor.check(self.value.as_deref(), &label)?,
        };
        Ok(message)
    }

    /// Validates (when asked) and writes the row. `Ok(false)` means
    /// validation failed and the errors are on the record.
    pub async fn save(&mut self, store: &AttributeStore, run_validation: bool) -> Result<bool> {
        if run_validation && !self.validate(store).await? {
            return Ok(false);
        }
        for attached in self.behaviors.clone() {
            attached.behavior.before_save(self);
        }

        match self.id {
            Some(id) => {
                if !store.update(id, self.value.clone()).await? {
                    return Err(MetaError::Persistence {
                        key: self.key.clone(),
                        message: format!("row {id} no longer exists"),
                    });
                }
                debug!("updated attribute '{}' (row {})", self.key, id);
            }
            None => {
                let subject_id = self.subject_id.ok_or_else(|| MetaError::Persistence {
                    key: self.key.clone(),
                    message: "the subject has no id yet".to_string(),
                })?;
                let id = store
                    .insert(NewAttributeRow {
                        subject_id,
                        key: self.key.clone(),
                        value: self.value.clone(),
                    })
                    .await?;
                self.id = Some(id);
            }
        }
        Ok(true)
    }

    /// Deletes the stored row. A record that was never stored is a no-op.
    pub async fn delete(&mut self, store: &AttributeStore) -> Result<bool> {
        let Some(id) = self.id else {
            return Ok(false);
        };
        let deleted = store.delete(id).await?;
        self.id = None;
        Ok(deleted)
    }

    /// Row attributes as JSON, with the foreign key under its column name.
    pub fn to_json(&self) -> JsonValue {
        let mut map = JsonMap::new();
        map.insert("id".to_string(), json!(self.id));
        map.insert(self.foreign_key_field.clone(), json!(self.subject_id));
        map.insert("key".to_string(), json!(self.key));
        map.insert("value".to_string(), json!(self.value));
        JsonValue::Object(map)
    }
}
