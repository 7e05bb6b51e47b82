use super::event::{SavedEvent, SavedListener};
use super::form::PostedForm;
use super::options::{BatchOptions, LOST_DATA_WARNING, RedirectPolicy, SaveMode};
use super::response::{
    BatchOutcome, BatchReport, KeyOutcome, Notice, RedirectTarget, RenderContext, SaveResponse,
};
use crate::core::{MetaError, Result, SubjectId, is_blank};
use crate::model::{AttributeConfig, AttributeRecord};
use crate::store::AttributeStore;
use crate::subject::{Subject, SubjectStore};
use log::{debug, error, warn};
use std::sync::Arc;

/// Authorization hook run after the subject is loaded and before anything
/// is bound. Returning an error aborts the batch untouched.
pub trait AccessCheck: Send + Sync {
    fn check(&self, action: &str, subject_id: Option<SubjectId>) -> Result<()>;
}

impl<F> AccessCheck for F
where
    F: Fn(&str, Option<SubjectId>) -> Result<()> + Send + Sync,
{
    fn check(&self, action: &str, subject_id: Option<SubjectId>) -> Result<()> {
        self(action, subject_id)
    }
}

/// Saves a subject's configured attributes from one posted form.
///
/// The subject and every attribute are separate commit units: a failure
/// part way through leaves earlier commits in place and is reported as
/// partial success.
pub struct BatchSaveOrchestrator<S: Subject> {
    store: AttributeStore,
    subjects: Arc<dyn SubjectStore<S>>,
    config: Arc<AttributeConfig>,
    options: BatchOptions,
    access: Option<Arc<dyn AccessCheck>>,
    listeners: Vec<Arc<dyn SavedListener<S>>>,
}

/// Records of one call, in configuration order, plus which of them were posted.
struct SaveBatch {
    records: Vec<AttributeRecord>,
    touched: Vec<usize>,
}

impl<S: Subject> BatchSaveOrchestrator<S> {
    pub fn new(
        store: AttributeStore,
        subjects: Arc<dyn SubjectStore<S>>,
        config: AttributeConfig,
    ) -> Result<Self> {
        if config.is_empty() {
            return Err(MetaError::Configuration(
                "attribute config must declare at least one key".to_string(),
            ));
        }
        config.check()?;
        Ok(Self {
            store,
            subjects,
            config: Arc::new(config),
            options: BatchOptions::default(),
            access: None,
            listeners: Vec::new(),
        })
    }

    pub fn with_options(mut self, options: BatchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn access_check(mut self, check: impl AccessCheck + 'static) -> Self {
        self.access = Some(Arc::new(check));
        self
    }

    /// Subscribe to [`SavedEvent`]; listeners run in registration order.
    pub fn on_saved(mut self, listener: impl SavedListener<S> + 'static) -> Self {
        self.listeners.push(Arc::new(listener));
        self
    }

    pub fn config(&self) -> &AttributeConfig {
        &self.config
    }

    pub fn options(&self) -> &BatchOptions {
        &self.options
    }

    /// Saves attributes of an existing subject without modifying it.
    pub async fn save_attributes(
        &self,
        subject_id: SubjectId,
        form: &PostedForm,
    ) -> Result<BatchOutcome<S>> {
        let subject = self.load_subject(subject_id).await?;
        self.run(SaveMode::Standalone, subject, form).await
    }

    /// Updates an existing subject and its attributes together.
    pub async fn update_subject(
        &self,
        subject_id: SubjectId,
        form: &PostedForm,
    ) -> Result<BatchOutcome<S>> {
        let subject = self.load_subject(subject_id).await?;
        self.run(SaveMode::UpdateWithSubject, subject, form).await
    }

    /// Creates `prototype` and its attributes together.
    pub async fn create_subject(&self, prototype: S, form: &PostedForm) -> Result<BatchOutcome<S>> {
        self.run(SaveMode::CreateWithSubject, prototype, form).await
    }

    /// Empty form surface for a subject, as shown before anything is posted.
    pub async fn prepare(&self, subject: S) -> Result<RenderContext<S>> {
        let batch = self.build_batch(subject.id(), &PostedForm::new()).await?;
        Ok(self.render_context(subject, batch))
    }

    async fn load_subject(&self, subject_id: SubjectId) -> Result<S> {
        self.subjects
            .find_by_id(subject_id)
            .await?
            .ok_or_else(|| MetaError::not_found(self.subjects.table_name(), subject_id))
    }

    async fn run(&self, mode: SaveMode, mut subject: S, form: &PostedForm) -> Result<BatchOutcome<S>> {
        if let Some(access) = &self.access {
            access.check(mode.action(), subject.id())?;
        }

        let mut batch = self.build_batch(subject.id(), form).await?;
        let nothing_posted = if mode.binds_subject() {
            !subject.load(&form.subject_fields)
        } else {
            batch.touched.is_empty()
        };

        if nothing_posted {
            debug!("nothing to save for {mode:?}; rendering the form");
            return Ok(self.render(subject, batch));
        }

        if mode.binds_subject() {
            if !self.validate_combined(mode, &mut subject, &mut batch).await? {
                return Ok(self.render(subject, batch));
            }
            self.subjects.save(&mut subject).await?;
        }

        if batch.touched.is_empty() {
            debug!("no attributes posted for {mode:?}; subject saved alone");
            let report = BatchReport {
                outcomes: Vec::new(),
                all_saved: true,
                event_fired: false,
            };
            return Ok(self.respond(subject, batch, report, true));
        }

        let outcomes = self.commit(&mut batch, subject.id()).await?;
        let all_saved = outcomes.iter().all(|(_, outcome)| !outcome.is_failure());

        let event = SavedEvent::new(&subject);
        for listener in &self.listeners {
            listener.on_saved(&event);
        }

        let report = BatchReport {
            outcomes,
            all_saved,
            event_fired: true,
        };
        let mutated = mode.binds_subject() || report.any_mutation();
        Ok(self.respond(subject, batch, report, mutated))
    }

    async fn build_batch(&self, subject_id: Option<SubjectId>, form: &PostedForm) -> Result<SaveBatch> {
        let mut records = Vec::with_capacity(self.config.len());
        let mut touched = Vec::new();

        for (key, options) in self.config.iter() {
            let mut record = self.store.get_or_create(key, subject_id, options).await?;
            if let Some(posted) = form.attributes.get(key) {
                record.value = posted.clone();
                touched.push(records.len());
            }
            records.push(record);
        }

        for key in form.attributes.keys().filter(|key| !self.config.contains(key)) {
            warn!("ignoring posted attribute '{key}': not in the attribute config");
        }
        Ok(SaveBatch { records, touched })
    }

    /// Validates the subject and every touched record. On create, a record
    /// only blocks on `key` or `value` errors since its foreign key is
    /// necessarily missing until the subject is saved.
    async fn validate_combined(
        &self,
        mode: SaveMode,
        subject: &mut S,
        batch: &mut SaveBatch,
    ) -> Result<bool> {
        let mut valid = subject.validate();
        for &index in &batch.touched {
            let record = &mut batch.records[index];
            record.validate(&self.store).await?;
            let blocking = match mode {
                SaveMode::CreateWithSubject => record.has_blocking_errors(),
                _ => record.has_errors(),
            };
            valid &= !blocking;
        }
        Ok(valid)
    }

    async fn commit(
        &self,
        batch: &mut SaveBatch,
        subject_id: Option<SubjectId>,
    ) -> Result<Vec<(String, KeyOutcome)>> {
        let mut outcomes = Vec::with_capacity(batch.touched.len());

        for &index in &batch.touched {
            let record = &mut batch.records[index];
            let save_empty = self
                .config
                .get(&record.key)
                .is_some_and(|options| options.save_empty);

            // An empty value only overwrites a stored row; it never creates one.
            let keep_empty = save_empty && !record.is_new_record();
            let outcome = if !is_blank(record.value.as_deref()) || keep_empty {
                if record.subject_id.is_none() {
                    record.subject_id = subject_id;
                }
                match record.save(&self.store, true).await {
                    Ok(true) => KeyOutcome::Saved,
                    Ok(false) => KeyOutcome::Failed(record.errors().to_string()),
                    Err(err) => KeyOutcome::Failed(err.to_string()),
                }
            } else if !record.is_new_record() {
                match record.delete(&self.store).await {
                    Ok(_) => KeyOutcome::Deleted,
                    Err(err) => KeyOutcome::Failed(err.to_string()),
                }
            } else {
                KeyOutcome::Skipped
            };

            if let KeyOutcome::Failed(reason) = &outcome {
                warn!("attribute '{}' was not saved: {reason}", record.key);
                if self.options.fail_fast {
                    error!("aborting batch on attribute '{}'", record.key);
                    return Err(MetaError::Persistence {
                        key: record.key.clone(),
                        message: reason.clone(),
                    });
                }
            }
            outcomes.push((record.key.clone(), outcome));
        }
        Ok(outcomes)
    }

    fn respond(&self, subject: S, batch: SaveBatch, report: BatchReport, mutated: bool) -> BatchOutcome<S> {
        let mut notices = Vec::new();

        if report.all_saved {
            if let Some(message) = &self.options.success_notice {
                notices.push(Notice::success(message.clone()));
            }
            let response = match (&self.options.redirect, subject.id()) {
                (RedirectPolicy::Refresh, _) => SaveResponse::Redirect(RedirectTarget::Refresh),
                (RedirectPolicy::To(location), Some(id)) => SaveResponse::Redirect(
                    RedirectTarget::Location(location.replace("{id}", &id.to_string())),
                ),
                (RedirectPolicy::To(location), None) => {
                    SaveResponse::Redirect(RedirectTarget::Location(location.clone()))
                }
                (RedirectPolicy::None, _) => SaveResponse::Render(self.render_context(subject, batch)),
            };
            return BatchOutcome {
                response,
                report,
                notices,
            };
        }

        let response = match subject.id() {
            Some(subject_id) if mutated => {
                warn!(
                    "partial save for subject {subject_id}: failed keys {:?}",
                    report.failed_keys()
                );
                notices.push(Notice::warning(LOST_DATA_WARNING));
                SaveResponse::PartialSuccess {
                    subject_id,
                    location: format!("{}?id={subject_id}", self.options.partial_success_location),
                }
            }
            _ => SaveResponse::Render(self.render_context(subject, batch)),
        };
        BatchOutcome {
            response,
            report,
            notices,
        }
    }

    fn render(&self, subject: S, batch: SaveBatch) -> BatchOutcome<S> {
        BatchOutcome {
            response: SaveResponse::Render(self.render_context(subject, batch)),
            report: BatchReport::default(),
            notices: Vec::new(),
        }
    }

    fn render_context(&self, subject: S, batch: SaveBatch) -> RenderContext<S> {
        RenderContext {
            subject,
            records: batch.records,
            config: Arc::clone(&self.config),
        }
    }
}
