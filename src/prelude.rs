//! Common imports for application code.
//!
//! ```
//! use metastore::prelude::*;
//! ```

pub use crate::batch::{
    BatchOptions, BatchOutcome, BatchSaveOrchestrator, KeyOutcome, PostedForm, RedirectPolicy,
    RedirectTarget, SaveResponse, SavedEvent,
};
pub use crate::core::{CachedValue, MetaError, Result, SubjectId};
pub use crate::model::{AttributeConfig, AttributeModel, AttributeOptions, RuleDescriptor};
pub use crate::resolver::{AttributeResolver, PropertyLookup};
pub use crate::storage::{AttributeStorage, InMemoryStorage};
pub use crate::store::{AttributeStore, Missing};
pub use crate::subject::{Subject, SubjectLookup, SubjectStore};
