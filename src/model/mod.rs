pub mod behavior;
pub mod config;
pub mod descriptor;
pub mod inflector;
pub mod record;
pub mod rules;

pub use behavior::{AttributeBehavior, NamedBehavior, TrimValue};
pub use config::{AttributeConfig, AttributeOptions, InputHint, InputKind};
pub use descriptor::{AttributeModel, DEFAULT_KEY_MAX_LENGTH, foreign_key_field_for};
pub use inflector::form_input_name;
pub use record::AttributeRecord;
pub use rules::{Field, Rule, RuleDescriptor, RuleKind};
