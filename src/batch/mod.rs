//! Multi-record save of a subject's attributes from one posted form.

pub mod event;
pub mod form;
pub mod options;
pub mod orchestrator;
pub mod response;

pub use event::{SavedEvent, SavedListener};
pub use form::PostedForm;
pub use options::{
    BatchOptions, DEFAULT_PARTIAL_SUCCESS_LOCATION, DEFAULT_SUCCESS_NOTICE, LOST_DATA_WARNING,
    RedirectPolicy, SaveMode,
};
pub use orchestrator::{AccessCheck, BatchSaveOrchestrator};
pub use response::{
    BatchOutcome, BatchReport, InputField, KeyOutcome, Notice, NoticeLevel, RedirectTarget,
    RenderContext, SaveResponse,
};
