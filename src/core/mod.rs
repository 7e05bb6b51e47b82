pub mod error;
pub mod types;
pub mod validation;

pub use error::{MetaError, Result};
pub use types::{AttributeRow, CachedValue, NewAttributeRow, RowId, SubjectId, is_blank};
pub use validation::ValidationErrors;
