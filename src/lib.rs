// ============================================================================
// metastore library
// ============================================================================

//! Key/value attribute side tables for subject records.
//!
//! A subject (a user, a post, ...) gains an open-ended set of named string
//! attributes stored as `(subject_id, key, value)` rows in a separate table.
//! Reads go through a per-subject cache ([`AttributeResolver`]); writes of
//! several attributes at once go through [`BatchSaveOrchestrator`].
//!
//! # Examples
//!
//! ```
//! use metastore::prelude::*;
//! use metastore::{DocumentSubject, InMemorySubjectStore};
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> metastore::Result<()> {
//! let storage = Arc::new(InMemoryStorage::with_tables(["user_meta"])?);
//! let users = Arc::new(InMemorySubjectStore::<DocumentSubject>::new("user"));
//! users.insert_with_id(SubjectId(1), DocumentSubject::new()).await;
//!
//! let store = AttributeStore::new(storage, users.clone(), AttributeModel::new("user_meta", "user"))?;
//! let config = AttributeConfig::new().with("bio", AttributeOptions::new().label("Bio"));
//! let batch = BatchSaveOrchestrator::new(store.clone(), users, config)?;
//!
//! let outcome = batch
//!     .save_attributes(SubjectId(1), &PostedForm::new().attribute("bio", "Hello"))
//!     .await?;
//! assert!(outcome.all_saved());
//!
//! let mut resolver = store.resolver(Some(SubjectId(1)));
//! assert_eq!(resolver.get("bio").await?.as_deref(), Some("Hello"));
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod core;
pub mod model;
pub mod prelude;
pub mod resolver;
pub mod storage;
pub mod store;
pub mod subject;
pub mod web;

pub use batch::{
    AccessCheck, BatchOptions, BatchOutcome, BatchReport, BatchSaveOrchestrator, InputField,
    KeyOutcome, Notice, PostedForm, RedirectPolicy, RedirectTarget, RenderContext, SaveMode,
    SaveResponse, SavedEvent, SavedListener,
};
pub use core::{
    AttributeRow, CachedValue, MetaError, NewAttributeRow, Result, RowId, SubjectId,
    ValidationErrors,
};
pub use model::{
    AttributeBehavior, AttributeConfig, AttributeModel, AttributeOptions, AttributeRecord,
    InputKind, RuleDescriptor, TrimValue, foreign_key_field_for, form_input_name,
};
pub use resolver::{AttributeJoin, AttributeResolver, PropertyLookup, SubjectQuery, ValueFilter};
pub use storage::{AttributeCache, AttributeStorage, InMemoryStorage};
pub use store::{AttributeStore, Missing};
pub use subject::{DocumentSubject, InMemorySubjectStore, Subject, SubjectLookup, SubjectStore};
