use super::record::AttributeRecord;
use std::fmt;
use std::sync::Arc;

/// Cross-cutting hook attached to an attribute record after it is built.
pub trait AttributeBehavior: Send + Sync + fmt::Debug {
    /// Runs before the record's rules are evaluated.
    fn before_validate(&self, _record: &mut AttributeRecord) {}

    /// Runs after validation passed and right before the row is written.
    fn before_save(&self, _record: &mut AttributeRecord) {}
}

/// A behavior registered under a name.
#[derive(Debug, Clone)]
pub struct NamedBehavior {
    pub name: String,
    pub behavior: Arc<dyn AttributeBehavior>,
}

impl NamedBehavior {
    pub fn new(name: impl Into<String>, behavior: impl AttributeBehavior + 'static) -> Self {
        Self {
            name: name.into(),
            behavior: Arc::new(behavior),
        }
    }
}

/// Trims surrounding whitespace from the value before validation.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrimValue;

impl AttributeBehavior for TrimValue {
    fn before_validate(&self, record: &mut AttributeRecord) {
        if let Some(value) = record.value.as_mut() {
            let trimmed = value.trim();
            if trimmed.len() != value.len() {
                *value = trimmed.to_string();
            }
        }
    }
}
