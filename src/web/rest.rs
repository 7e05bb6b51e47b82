//! Single-record attribute save for REST clients.

use crate::batch::form::scalar_to_string;
use crate::core::{MetaError, SubjectId, ValidationErrors};
use crate::model::{AttributeConfig, AttributeOptions, AttributeRecord};
use crate::store::AttributeStore;
use log::{debug, warn};
use serde::Deserialize;
use serde_json::{Map as JsonMap, Value as JsonValue};
use std::sync::Arc;

/// `{ "key": ..., "<foreign key field>": ..., "value": ... }`
#[derive(Debug, Clone, Deserialize)]
pub struct RestSaveRequest {
    pub key: String,
    #[serde(default)]
    pub value: JsonValue,
    /// Carries the subject foreign key under its column name.
    #[serde(flatten)]
    pub extra: JsonMap<String, JsonValue>,
}

impl RestSaveRequest {
    pub fn new(key: &str, foreign_key_field: &str, subject_id: SubjectId, value: &str) -> Self {
        let mut extra = JsonMap::new();
        extra.insert(foreign_key_field.to_string(), JsonValue::from(subject_id.0));
        Self {
            key: key.to_string(),
            value: JsonValue::from(value),
            extra,
        }
    }
}

/// Framework-agnostic outcome of a failed single save.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MetaServiceError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("{0}")]
    Internal(String),
}

impl From<MetaError> for MetaServiceError {
    fn from(err: MetaError) -> Self {
        match err {
            MetaError::NotFound(message) => Self::NotFound(message),
            MetaError::ConstraintViolation(message) => Self::Conflict(message),
            MetaError::Serialization(message) => Self::BadRequest(message),
            other => Self::Internal(other.to_string()),
        }
    }
}

/// Saves one attribute per call: no batch, no event.
pub struct RestSaveService {
    store: AttributeStore,
    allowed: Option<Arc<AttributeConfig>>,
}

impl RestSaveService {
    pub fn new(store: AttributeStore) -> Self {
        Self {
            store,
            allowed: None,
        }
    }

    /// Restricts keys to those declared in `config`, whose options are then
    /// applied to the saved record.
    pub fn with_config(mut self, config: AttributeConfig) -> Self {
        self.allowed = Some(Arc::new(config));
        self
    }

    pub fn store(&self) -> &AttributeStore {
        &self.store
    }

    pub async fn save(
        &self,
        request: RestSaveRequest,
    ) -> std::result::Result<AttributeRecord, MetaServiceError> {
        let options = match &self.allowed {
            Some(config) => config.get(&request.key).cloned().ok_or_else(|| {
                MetaServiceError::BadRequest(format!("attribute '{}' is not allowed", request.key))
            })?,
            None => AttributeOptions::default(),
        };

        let foreign_key_field = self.store.model().foreign_key_field();
        let subject_id = request
            .extra
            .get(&foreign_key_field)
            .and_then(parse_subject_id)
            .ok_or_else(|| {
                MetaServiceError::BadRequest(format!(
                    "'{foreign_key_field}' must be a positive integer"
                ))
            })?;
        let value = scalar_to_string(&request.key, &request.value)?;

        let mut record = self
            .store
            .get_or_create(&request.key, Some(subject_id), &options)
            .await?;
        record.value = value;

        match record.save(&self.store, true).await {
            Ok(true) => {
                debug!("saved attribute '{}' for subject {subject_id}", record.key);
                Ok(record)
            }
            Ok(false) => Err(MetaServiceError::Validation(record.errors().clone())),
            Err(err) => {
                warn!("failed to save attribute '{}': {err}", record.key);
                Err(err.into())
            }
        }
    }
}

fn parse_subject_id(value: &JsonValue) -> Option<SubjectId> {
    match value {
        JsonValue::Number(number) => number.as_u64().map(SubjectId),
        JsonValue::String(text) => text.trim().parse().ok().map(SubjectId),
        _ => None,
    }
}
