//! Contracts for the subject record that owns the attributes.
//!
//! The subject's own schema and storage live outside this crate; the
//! attribute layer only needs to find, bind, validate and save it.

pub mod document;
pub mod memory;

pub use document::DocumentSubject;
pub use memory::InMemorySubjectStore;

use crate::core::{Result, SubjectId, ValidationErrors};
use async_trait::async_trait;
use serde_json::{Map as JsonMap, Value as JsonValue};

pub trait Subject: Clone + Send + Sync + 'static {
    /// Primary key, `None` until the subject is saved.
    fn id(&self) -> Option<SubjectId>;

    fn set_id(&mut self, id: SubjectId);

    /// Binds posted fields. Returns `false` when nothing applicable was posted.
    fn load(&mut self, fields: &JsonMap<String, JsonValue>) -> bool;

    fn validate(&mut self) -> bool;

    fn errors(&self) -> &ValidationErrors;
}

/// Existence check used by the attribute foreign-key rule.
#[async_trait]
pub trait SubjectLookup: Send + Sync {
    fn table_name(&self) -> &str;

    async fn subject_exists(&self, id: SubjectId) -> Result<bool>;
}

#[async_trait]
pub trait SubjectStore<S: Subject>: SubjectLookup {
    async fn find_by_id(&self, id: SubjectId) -> Result<Option<S>>;

    /// Inserts or updates the subject, assigning an id on insert.
    async fn save(&self, subject: &mut S) -> Result<()>;
}
