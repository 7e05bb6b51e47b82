use crate::core::{AttributeRow, NewAttributeRow, Result, RowId, SubjectId};
use async_trait::async_trait;

/// Storage engine trait for attribute side tables - allows pluggable backends.
///
/// Every call is one storage round trip. Implementations must enforce the
/// uniqueness of `(subject_id, key)` per table and report a duplicate insert as
/// [`crate::MetaError::ConstraintViolation`].
#[async_trait]
pub trait AttributeStorage: Send + Sync {
    /// Look up one row. `Ok(None)` is the explicit "no row" signal.
    async fn find(&self, table: &str, subject_id: SubjectId, key: &str)
    -> Result<Option<AttributeRow>>;

    /// Insert a row and return its id.
    async fn insert(&self, table: &str, row: NewAttributeRow) -> Result<RowId>;

    /// Overwrite the value of an existing row. `Ok(false)` if the row is gone.
    async fn update(&self, table: &str, id: RowId, value: Option<String>) -> Result<bool>;

    /// Delete a row. `Ok(false)` if the row is already gone.
    async fn delete(&self, table: &str, id: RowId) -> Result<bool>;

    /// All rows holding `key`, across subjects.
    async fn scan_key(&self, table: &str, key: &str) -> Result<Vec<AttributeRow>>;

    /// All rows owned by one subject.
    async fn scan_subject(&self, table: &str, subject_id: SubjectId) -> Result<Vec<AttributeRow>>;
}
