pub const DEFAULT_SUCCESS_NOTICE: &str = "Saved Successfully";
pub const DEFAULT_PARTIAL_SUCCESS_LOCATION: &str = "update/index";
pub const LOST_DATA_WARNING: &str =
    "Some attributes could not be saved. Review the values below and try again.";

/// Which subject mutation, if any, accompanies the attribute commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaveMode {
    /// Attributes only; the subject is loaded but never modified.
    #[default]
    Standalone,
    /// A new subject is saved together with its attributes.
    CreateWithSubject,
    /// An existing subject is updated together with its attributes.
    UpdateWithSubject,
}

impl SaveMode {
    pub fn binds_subject(self) -> bool {
        !matches!(self, Self::Standalone)
    }

    /// Action name handed to the access check.
    pub fn action(self) -> &'static str {
        match self {
            Self::Standalone => "save",
            Self::CreateWithSubject => "create",
            Self::UpdateWithSubject => "update",
        }
    }
}

/// Where to send the client after a fully successful save.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RedirectPolicy {
    /// Reload the current page.
    #[default]
    Refresh,
    /// Go to a fixed location; `{id}` is replaced by the subject id.
    To(String),
    /// No redirect; re-render the input surface.
    None,
}

/// Orchestrator settings.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub redirect: RedirectPolicy,
    pub success_notice: Option<String>,
    pub fail_fast: bool,
    pub partial_success_location: String,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            redirect: RedirectPolicy::Refresh,
            success_notice: Some(DEFAULT_SUCCESS_NOTICE.to_string()),
            fail_fast: false,
            partial_success_location: DEFAULT_PARTIAL_SUCCESS_LOCATION.to_string(),
        }
    }
}

impl BatchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn redirect(mut self, redirect: RedirectPolicy) -> Self {
        self.redirect = redirect;
        self
    }

    /// Notice returned on full success; `None` disables it.
    pub fn success_notice(mut self, notice: Option<&str>) -> Self {
        self.success_notice = notice.map(str::to_string);
        self
    }

    /// Abort on the first persistence failure instead of sweeping on.
    pub fn fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    pub fn partial_success_location(mut self, location: &str) -> Self {
        self.partial_success_location = location.to_string();
        self
    }
}
