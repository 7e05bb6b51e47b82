use crate::subject::Subject;

/// Raised once per batch attempt that committed at least one posted key,
/// whether or not every key was saved.
#[derive(Debug, Clone, Copy)]
pub struct SavedEvent<'a, S> {
    pub subject: &'a S,
}

impl<'a, S: Subject> SavedEvent<'a, S> {
    pub fn new(subject: &'a S) -> Self {
        Self { subject }
    }
}

/// Synchronous observer invoked after the commit phase.
pub trait SavedListener<S: Subject>: Send + Sync {
    fn on_saved(&self, event: &SavedEvent<'_, S>);
}

impl<S, F> SavedListener<S> for F
where
    S: Subject,
    F: Fn(&SavedEvent<'_, S>) + Send + Sync,
{
    fn on_saved(&self, event: &SavedEvent<'_, S>) {
        self(event)
    }
}
