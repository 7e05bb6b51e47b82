use crate::core::{SubjectId, ValidationErrors};
use crate::model::{AttributeConfig, AttributeRecord, InputKind};
use crate::subject::Subject;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::sync::Arc;

/// Redirect destination after a fully successful save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectTarget {
    Refresh,
    Location(String),
}

/// What the caller should do with the request.
#[derive(Debug, Clone)]
pub enum SaveResponse<S> {
    Redirect(RedirectTarget),
    /// Re-present the input surface with bound values and errors.
    Render(RenderContext<S>),
    /// Some data was committed and some was lost; send the client to the
    /// recovery page for this subject.
    PartialSuccess {
        subject_id: SubjectId,
        location: String,
    },
}

impl<S> SaveResponse<S> {
    pub fn is_redirect(&self) -> bool {
        matches!(self, Self::Redirect(_))
    }

    pub fn is_render(&self) -> bool {
        matches!(self, Self::Render(_))
    }

    pub fn is_partial_success(&self) -> bool {
        matches!(self, Self::PartialSuccess { .. })
    }

    pub fn render_context(&self) -> Option<&RenderContext<S>> {
        match self {
            Self::Render(context) => Some(context),
            _ => None,
        }
    }
}

/// Everything needed to re-display the editing surface.
#[derive(Debug, Clone)]
pub struct RenderContext<S> {
    pub subject: S,
    /// One record per configured key, in configuration order.
    pub records: Vec<AttributeRecord>,
    pub config: Arc<AttributeConfig>,
}

impl<S: Subject> RenderContext<S> {
    pub fn record(&self, key: &str) -> Option<&AttributeRecord> {
        self.records.iter().find(|record| record.key == key)
    }

    pub fn subject_errors(&self) -> &ValidationErrors {
        self.subject.errors()
    }

    /// Input descriptors in display order.
    pub fn inputs(&self) -> Vec<InputField> {
        self.config
            .by_position()
            .into_iter()
            .filter_map(|(key, options)| {
                let record = self.record(key)?;
                Some(InputField {
                    key: key.to_string(),
                    name: record.input_name(),
                    label: record.attribute_label("value"),
                    hint: record.attribute_hint("value"),
                    value: record.value.clone(),
                    kind: options.input.kind,
                    widget_config: options.input.widget_config.clone(),
                    errors: record.errors().on("value").to_vec(),
                })
            })
            .collect()
    }
}

/// Render-neutral description of one attribute input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputField {
    pub key: String,
    pub name: String,
    pub label: String,
    pub hint: String,
    pub value: Option<String>,
    pub kind: InputKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub widget_config: Option<JsonValue>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

/// Terminal action taken for one posted key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    Saved,
    Deleted,
    /// Empty value and no stored row; storage was not touched.
    Skipped,
    Failed(String),
}

impl KeyOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    pub fn is_mutation(&self) -> bool {
        matches!(self, Self::Saved | Self::Deleted)
    }
}

/// Per-key account of one batch attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub outcomes: Vec<(String, KeyOutcome)>,
    pub all_saved: bool,
    pub event_fired: bool,
}

impl BatchReport {
    pub fn outcome(&self, key: &str) -> Option<&KeyOutcome> {
        self.outcomes
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, outcome)| outcome)
    }

    pub fn failed_keys(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| outcome.is_failure())
            .map(|(key, _)| key.as_str())
            .collect()
    }

    pub fn any_mutation(&self) -> bool {
        self.outcomes.iter().any(|(_, outcome)| outcome.is_mutation())
    }

    pub fn touched(&self) -> usize {
        self.outcomes.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Warning,
}

/// User-facing message; delivery is left to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }
}

/// Result of one orchestrator call.
#[derive(Debug, Clone)]
pub struct BatchOutcome<S> {
    pub response: SaveResponse<S>,
    pub report: BatchReport,
    pub notices: Vec<Notice>,
}

impl<S> BatchOutcome<S> {
    pub fn all_saved(&self) -> bool {
        self.report.all_saved
    }

    pub fn event_fired(&self) -> bool {
        self.report.event_fired
    }
}

#[cfg(test)]
mod tests {
    use super::{BatchReport, KeyOutcome, RenderContext};
    use crate::core::SubjectId;
    use crate::model::{AttributeConfig, AttributeOptions, AttributeRecord, InputKind};
    use crate::subject::DocumentSubject;
    use std::sync::Arc;

    #[test]
    fn inputs_follow_position_then_declaration_order() {
        let config = AttributeConfig::new()
            .with("bio", AttributeOptions::new().label("Bio").position(2))
            .with("color", AttributeOptions::new().input(InputKind::Widget).position(1))
            .with("nickname", AttributeOptions::new().position(2));
        let records = config
            .keys()
            .map(|key| AttributeRecord::new("user_id", Some(SubjectId(1)), key))
            .map(|mut record| {
                let options = config.get(&record.key).cloned().unwrap_or_default();
                record.configure(&options, true);
                record
            })
            .collect();
        let context = RenderContext {
            subject: DocumentSubject::new(),
            records,
            config: Arc::new(config),
        };

        let inputs = context.inputs();
        let keys: Vec<_> = inputs.iter().map(|input| input.key.as_str()).collect();
        assert_eq!(keys, vec!["color", "bio", "nickname"]);
        assert_eq!(inputs[0].kind, InputKind::Widget);
        assert_eq!(inputs[1].name, "[bio]value");
        assert_eq!(inputs[1].label, "Bio");
        assert_eq!(inputs[2].label, "Value");
    }

    #[test]
    fn report_lists_failures_in_order() {
        let report = BatchReport {
            outcomes: vec![
                ("a".into(), KeyOutcome::Saved),
                ("b".into(), KeyOutcome::Failed("boom".into())),
                ("c".into(), KeyOutcome::Skipped),
            ],
            all_saved: false,
            event_fired: true,
        };
        assert_eq!(report.failed_keys(), vec!["b"]);
        assert!(report.any_mutation());
        assert_eq!(report.outcome("c"), Some(&KeyOutcome::Skipped));
        assert_eq!(report.touched(), 3);
    }
}
