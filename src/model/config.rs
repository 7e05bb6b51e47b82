use super::behavior::{AttributeBehavior, NamedBehavior};
use super::rules::RuleDescriptor;
use crate::core::{MetaError, Result};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value as JsonValue;
use std::fmt;

/// How an attribute input should be presented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    #[default]
    Text,
    Textarea,
    Checkbox,
    Widget,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputHint {
    #[serde(rename = "type")]
    pub kind: InputKind,

    /// Opaque widget configuration, only meaningful for [`InputKind::Widget`]
    #[serde(rename = "widgetConfig", alias = "widget_config", skip_serializing_if = "Option::is_none")]
    pub widget_config: Option<JsonValue>,
}

/// Declarative options for one attribute key.
///
/// The JSON form mirrors the field names below; `saveEmpty` is accepted as
/// an alias for `save_empty`. Behaviors can only be attached in code.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AttributeOptions {
    /// Label of the value input
    pub label: String,

    /// Hint of the value input
    pub hint: String,

    /// Default value for records that do not exist yet
    pub value: Option<String>,

    /// Extra rules applied to the value
    pub rules: Vec<RuleDescriptor>,

    /// Persist empty posted values instead of deleting or skipping
    #[serde(alias = "saveEmpty")]
    pub save_empty: bool,

    /// Input presentation hint
    pub input: InputHint,

    /// Display order, lower first
    pub position: i32,

    #[serde(skip)]
    pub behaviors: Vec<NamedBehavior>,
}

impl AttributeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the label
    pub fn label(mut self, label: &str) -> Self {
        self.label = label.to_string();
        self
    }

    /// Set the hint
    pub fn hint(mut self, hint: &str) -> Self {
        self.hint = hint.to_string();
        self
    }

    /// Set the default value
    pub fn default_value(mut self, value: &str) -> Self {
        self.value = Some(value.to_string());
        self
    }

    /// Add a value rule
    pub fn rule(mut self, rule: RuleDescriptor) -> Self {
        self.rules.push(rule);
        self
    }

    /// Set the save-empty policy
    pub fn save_empty(mut self, save_empty: bool) -> Self {
        self.save_empty = save_empty;
        self
    }

    /// Set the input kind
    pub fn input(mut self, kind: InputKind) -> Self {
        self.input.kind = kind;
        self
    }

    /// Use a widget input with the given configuration
    pub fn widget(mut self, config: JsonValue) -> Self {
        self.input = InputHint {
            kind: InputKind::Widget,
            widget_config: Some(config),
        };
        self
    }

    /// Set the display position
    pub fn position(mut self, position: i32) -> Self {
        self.position = position;
        self
    }

    /// Attach a behavior once the record is built
    pub fn behavior(mut self, name: &str, behavior: impl AttributeBehavior + 'static) -> Self {
        self.behaviors.push(NamedBehavior::new(name, behavior));
        self
    }
}

/// Ordered mapping of attribute key to its options, declared per use site.
///
/// # Examples
///
/// ```
/// use metastore::{AttributeConfig, AttributeOptions};
///
/// let config = AttributeConfig::from_json(r#"{
///     "bio": {"label": "Biography", "rules": [{"rule": "string", "max": 1000}]},
///     "nickname": {"saveEmpty": true}
/// }"#).unwrap();
/// assert_eq!(config.keys().collect::<Vec<_>>(), vec!["bio", "nickname"]);
/// assert!(config.get("nickname").unwrap().save_empty);
/// ```
#[derive(Debug, Clone, Default)]
pub struct AttributeConfig {
    entries: Vec<(String, AttributeOptions)>,
}

impl AttributeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the options of `key`, keeping its original place.
    pub fn with(mut self, key: &str, options: AttributeOptions) -> Self {
        self.insert(key, options);
        self
    }

    pub fn insert(&mut self, key: &str, options: AttributeOptions) {
        match self.entries.iter_mut().find(|(existing, _)| existing == key) {
            Some((_, slot)) => *slot = options,
            None => self.entries.push((key.to_string(), options)),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.check()?;
        Ok(config)
    }

    pub fn get(&self, key: &str) -> Option<&AttributeOptions> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, options)| options)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeOptions)> {
        self.entries.iter().map(|(key, options)| (key.as_str(), options))
    }

    /// Entries sorted by `position`; ties keep declaration order.
    pub fn by_position(&self) -> Vec<(&str, &AttributeOptions)> {
        let mut ordered: Vec<_> = self.iter().collect();
        ordered.sort_by_key(|(_, options)| options.position);
        ordered
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rejects keys and rules that could never be validated.
    pub fn check(&self) -> Result<()> {
        for (key, options) in self.iter() {
            if key.trim().is_empty() {
                return Err(MetaError::Configuration(
                    "attribute keys must not be empty".to_string(),
                ));
            }
            for rule in &options.rules {
                rule.check_config()?;
            }
        }
        Ok(())
    }
}

impl Serialize for AttributeConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, options) in &self.entries {
            map.serialize_entry(key, options)?;
        }
        map.end()
    }
}

struct ConfigVisitor;

impl<'de> Visitor<'de> for ConfigVisitor {
    type Value = AttributeConfig;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of attribute key to attribute options")
    }

    fn visit_map<A>(self, mut access: A) -> std::result::Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut config = AttributeConfig::new();
        while let Some((key, options)) = access.next_entry::<String, AttributeOptions>()? {
            config.insert(&key, options);
        }
        Ok(config)
    }
}

impl<'de> Deserialize<'de> for AttributeConfig {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_map(ConfigVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::{AttributeConfig, AttributeOptions, InputKind};
    use crate::model::rules::RuleDescriptor;
    use serde_json::json;

    #[test]
    fn json_keeps_declaration_order() {
        let config = AttributeConfig::from_json(
            r#"{"zeta": {}, "alpha": {"position": 1}, "mid": {"position": -1}}"#,
        )
        .unwrap();
        assert_eq!(config.keys().collect::<Vec<_>>(), vec!["zeta", "alpha", "mid"]);

        let ordered: Vec<&str> = config.by_position().into_iter().map(|(key, _)| key).collect();
        assert_eq!(ordered, vec!["mid", "zeta", "alpha"]);
    }

    #[test]
    fn options_parse_input_and_rules() {
        let config = AttributeConfig::from_json(
            r#"{
                "theme": {
                    "label": "Theme",
                    "value": "light",
                    "saveEmpty": true,
                    "rules": [{"rule": "in", "range": ["light", "dark"]}],
                    "input": {"type": "widget", "widgetConfig": {"class": "Select"}}
                }
            }"#,
        )
        .unwrap();
        let theme = config.get("theme").unwrap();
        assert_eq!(theme.label, "Theme");
        assert_eq!(theme.value.as_deref(), Some("light"));
        assert!(theme.save_empty);
        assert_eq!(theme.rules, vec![RuleDescriptor::one_of(["light", "dark"])]);
        assert_eq!(theme.input.kind, InputKind::Widget);
        assert_eq!(theme.input.widget_config, Some(json!({"class": "Select"})));
    }

    #[test]
    fn invalid_rule_pattern_fails_loading() {
        let err = AttributeConfig::from_json(r#"{"code": {"rules": [{"rule": "match", "pattern": "("}]}}"#)
            .unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn insert_replaces_in_place() {
        let config = AttributeConfig::new()
            .with("a", AttributeOptions::new().label("A"))
            .with("b", AttributeOptions::new())
            .with("a", AttributeOptions::new().label("A2"));
        assert_eq!(config.len(), 2);
        assert_eq!(config.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(config.get("a").unwrap().label, "A2");
    }

    #[test]
    fn config_serializes_back_to_a_map() {
        let config = AttributeConfig::new().with("bio", AttributeOptions::new().label("Bio"));
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["bio"]["label"], "Bio");
        assert_eq!(json["bio"]["input"]["type"], "text");
    }
}
