use super::inflector::camelize;
use crate::core::{MetaError, Result};

/// Default maximum length of an attribute key.
pub const DEFAULT_KEY_MAX_LENGTH: usize = 100;

/// Foreign-key column naming convention: `<subject_table>_id`.
pub fn foreign_key_field_for(subject_table: &str) -> String {
    format!("{subject_table}_id")
}

/// Describes one attribute side table and the subject table it extends.
///
/// # Examples
///
/// ```
/// use metastore::AttributeModel;
///
/// let model = AttributeModel::new("user_meta", "user").key_max_length(64);
/// assert_eq!(model.foreign_key_field(), "user_id");
/// assert_eq!(model.form_name(), "UserMeta");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeModel {
    /// Attribute table name
    pub table: String,

    /// Table of the owning subject
    pub subject_table: String,

    /// Explicit foreign-key column, `None` means `<subject_table>_id`
    pub foreign_key: Option<String>,

    /// Name of the posted form section carrying attribute values
    pub form: Option<String>,

    /// Maximum length of `key`
    pub max_key_length: usize,
}

impl AttributeModel {
    pub fn new(table: &str, subject_table: &str) -> Self {
        Self {
            table: table.to_string(),
            subject_table: subject_table.to_string(),
            foreign_key: None,
            form: None,
            max_key_length: DEFAULT_KEY_MAX_LENGTH,
        }
    }

    /// Set the foreign-key column name
    pub fn foreign_key(mut self, field: &str) -> Self {
        self.foreign_key = Some(field.to_string());
        self
    }

    /// Set the posted form name
    pub fn form_name_override(mut self, name: &str) -> Self {
        self.form = Some(name.to_string());
        self
    }

    /// Set the maximum key length
    pub fn key_max_length(mut self, max: usize) -> Self {
        self.max_key_length = max;
        self
    }

    pub fn foreign_key_field(&self) -> String {
        match &self.foreign_key {
            Some(field) if !field.is_empty() => field.clone(),
            _ => foreign_key_field_for(&self.subject_table),
        }
    }

    /// Conventional form name, derived from the attribute table (`user_meta` -> `UserMeta`).
    pub fn form_name(&self) -> String {
        match &self.form {
            Some(name) if !name.is_empty() => name.clone(),
            _ => camelize(&self.table),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.table.trim().is_empty() {
            return Err(MetaError::Configuration(
                "the attribute table name must be configured".to_string(),
            ));
        }
        if self.subject_table.trim().is_empty() {
            return Err(MetaError::Configuration(
                "the subject table name must be configured".to_string(),
            ));
        }
        if self.max_key_length == 0 {
            return Err(MetaError::Configuration(
                "the maximum key length must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
