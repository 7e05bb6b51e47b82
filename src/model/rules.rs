use crate::core::{MetaError, Result, is_blank};
use lazy_static::lazy_static;
use lru::LruCache;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

const PATTERN_CACHE_SIZE: usize = 128;

lazy_static! {
    static ref EMAIL_PATTERN: Regex =
        Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)+$")
            .expect("email pattern is valid");
    static ref PATTERN_CACHE: Mutex<LruCache<String, Arc<Regex>>> = Mutex::new(LruCache::new(
        NonZeroUsize::new(PATTERN_CACHE_SIZE).unwrap_or(NonZeroUsize::MIN)
    ));
}

fn pattern_cache() -> MutexGuard<'static, LruCache<String, Arc<Regex>>> {
    PATTERN_CACHE.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Compiled `match` pattern, shared across checks.
fn compile_pattern(pattern: &str) -> Result<Arc<Regex>> {
    if let Some(regex) = pattern_cache().get(pattern) {
        return Ok(Arc::clone(regex));
    }

    let regex = Regex::new(pattern).map_err(|err| {
        MetaError::Configuration(format!("invalid match pattern '{pattern}': {err}"))
    })?;
    let regex = Arc::new(regex);
    pattern_cache().put(pattern.to_string(), Arc::clone(&regex));
    Ok(regex)
}

/// Field of an attribute record a rule is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    SubjectForeignKey,
    Key,
    Value,
}

/// Caller-supplied validation rule, always applied to the `value` field.
///
/// Deserializes from `{"rule": "string", "max": 1000}` style objects.
/// Every rule except `required` skips blank values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum RuleDescriptor {
    Required {
        #[serde(default)]
        message: Option<String>,
    },
    String {
        #[serde(default)]
        min: Option<usize>,
        #[serde(default)]
        max: Option<usize>,
    },
    Integer {
        #[serde(default)]
        min: Option<i64>,
        #[serde(default)]
        max: Option<i64>,
    },
    Number {
        #[serde(default)]
        min: Option<f64>,
        #[serde(default)]
        max: Option<f64>,
    },
    Boolean,
    Match {
        pattern: String,
        #[serde(default)]
        not: bool,
    },
    In {
        range: Vec<String>,
    },
    Email,
}

impl RuleDescriptor {
    pub fn required() -> Self {
        Self::Required { message: None }
    }

    pub fn max_length(max: usize) -> Self {
        Self::String {
            min: None,
            max: Some(max),
        }
    }

    pub fn matches(pattern: &str) -> Self {
        Self::Match {
            pattern: pattern.to_string(),
            not: false,
        }
    }

    pub fn one_of<I, T>(range: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self::In {
            range: range.into_iter().map(Into::into).collect(),
        }
    }

    /// Rejects descriptors that can never run, such as an invalid pattern.
    pub fn check_config(&self) -> Result<()> {
        if let Self::Match { pattern, .. } = self {
            compile_pattern(pattern)?;
        }
        Ok(())
    }

    /// Returns the error message for `value`, if it violates this rule.
    pub fn check(&self, value: Option<&str>, label: &str) -> Result<Option<String>> {
        if let Self::Required { message } = self {
            if is_blank(value) {
                return Ok(Some(
                    message
                        .clone()
                        .unwrap_or_else(|| format!("{label} cannot be blank.")),
                ));
            }
            return Ok(None);
        }

        let Some(value) = value.filter(|value| !value.is_empty()) else {
            return Ok(None);
        };

        let message = match self {
            Self::Required { .. } => None,
            Self::String { min, max } => {
                let len = value.chars().count();
                if let Some(min) = min.filter(|min| len < *min) {
                    Some(format!("{label} should contain at least {min} characters."))
                } else {
                    max.filter(|max| len > *max)
                        .map(|max| format!("{label} should contain at most {max} characters."))
                }
            }
            Self::Integer { min, max } => match value.trim().parse::<i64>() {
                Err(_) => Some(format!("{label} must be an integer.")),
                Ok(number) => bounds_message(label, number, *min, *max),
            },
            Self::Number { min, max } => match value.trim().parse::<f64>() {
                Ok(number) if number.is_finite() => bounds_message(label, number, *min, *max),
                _ => Some(format!("{label} must be a number.")),
            },
            Self::Boolean => (!matches!(value, "0" | "1"))
                .then(|| format!("{label} must be either \"1\" or \"0\".")),
            Self::Match { pattern, not } => {
                let regex = compile_pattern(pattern)?;
                (regex.is_match(value) == *not).then(|| format!("{label} is invalid."))
            }
            Self::In { range } => {
                (!range.iter().any(|allowed| allowed == value)).then(|| format!("{label} is invalid."))
            }
            Self::Email => (!EMAIL_PATTERN.is_match(value))
                .then(|| format!("{label} is not a valid email address.")),
        };
        Ok(message)
    }
}

fn bounds_message<T>(label: &str, number: T, min: Option<T>, max: Option<T>) -> Option<String>
where
    T: PartialOrd + std::fmt::Display + Copy,
{
    if let Some(min) = min.filter(|min| number < *min) {
        return Some(format!("{label} must be no less than {min}."));
    }
    max.filter(|max| number > *max)
        .map(|max| format!("{label} must be no greater than {max}."))
}

/// What a rule checks.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleKind {
    Required,
    KeyLength { max: usize },
    /// `(subject foreign key, key)` must not exist on another row.
    UniquePair,
    /// The foreign key must reference an existing subject.
    SubjectExists,
    Custom(RuleDescriptor),
}

/// A rule bound to the fields it validates.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub fields: Vec<Field>,
    pub kind: RuleKind,
    /// Skip a field that already carries an error.
    pub skip_on_error: bool,
}

impl Rule {
    pub fn new(fields: Vec<Field>, kind: RuleKind) -> Self {
        Self {
            fields,
            kind,
            skip_on_error: false,
        }
    }

    pub fn skip_on_error(mut self) -> Self {
        self.skip_on_error = true;
        self
    }

    /// Rules every attribute record carries regardless of configuration.
    pub fn defaults(max_key_length: usize) -> Vec<Rule> {
        vec![
            Rule::new(vec![Field::SubjectForeignKey, Field::Key], RuleKind::Required),
            Rule::new(
                vec![Field::Key],
                RuleKind::KeyLength {
                    max: max_key_length,
                },
            ),
            Rule::new(vec![Field::Key], RuleKind::UniquePair),
            Rule::new(vec![Field::SubjectForeignKey], RuleKind::SubjectExists).skip_on_error(),
        ]
    }

    /// Scopes a caller-supplied rule to the `value` field.
    pub fn for_value(descriptor: RuleDescriptor) -> Rule {
        Rule::new(vec![Field::Value], RuleKind::Custom(descriptor))
    }
}

#[cfg(test)]
mod tests {
    use super::{Field, Rule, RuleDescriptor, RuleKind, compile_pattern};
    use std::sync::Arc;

    #[test]
    fn required_rejects_blank_only() {
        let rule = RuleDescriptor::required();
        assert_eq!(
            rule.check(Some(""), "Bio").unwrap().as_deref(),
            Some("Bio cannot be blank.")
        );
        assert!(rule.check(None, "Bio").unwrap().is_some());
        assert!(rule.check(Some("x"), "Bio").unwrap().is_none());
    }

    #[test]
    fn non_required_rules_skip_blank_values() {
        let rule = RuleDescriptor::Integer {
            min: Some(1),
            max: None,
        };
        assert!(rule.check(Some(""), "Age").unwrap().is_none());
        assert!(rule.check(None, "Age").unwrap().is_none());
    }

    #[test]
    fn string_and_number_bounds() {
        let rule = RuleDescriptor::max_length(3);
        assert!(rule.check(Some("abc"), "Code").unwrap().is_none());
        assert_eq!(
            rule.check(Some("abcd"), "Code").unwrap().as_deref(),
            Some("Code should contain at most 3 characters.")
        );

        let rule = RuleDescriptor::Integer {
            min: Some(1),
            max: Some(10),
        };
        assert_eq!(
            rule.check(Some("11"), "Age").unwrap().as_deref(),
            Some("Age must be no greater than 10.")
        );
        assert_eq!(
            rule.check(Some("x"), "Age").unwrap().as_deref(),
            Some("Age must be an integer.")
        );

        let rule = RuleDescriptor::Number {
            min: Some(0.5),
            max: None,
        };
        assert!(rule.check(Some("0.75"), "Ratio").unwrap().is_none());
        assert!(rule.check(Some("0.25"), "Ratio").unwrap().is_some());
    }

    #[test]
    fn match_in_and_email() {
        let rule = RuleDescriptor::matches("^#[0-9a-f]{6}$");
        assert!(rule.check(Some("#00ff00"), "Color").unwrap().is_none());
        assert!(rule.check(Some("green"), "Color").unwrap().is_some());

        let rule = RuleDescriptor::one_of(["small", "large"]);
        assert!(rule.check(Some("small"), "Size").unwrap().is_none());
        assert!(rule.check(Some("medium"), "Size").unwrap().is_some());

        let rule = RuleDescriptor::Email;
        assert!(rule.check(Some("dev@example.com"), "Email").unwrap().is_none());
        assert!(rule.check(Some("dev@"), "Email").unwrap().is_some());
    }

    #[test]
    fn invalid_pattern_is_a_configuration_error() {
        let rule = RuleDescriptor::matches("(");
        assert!(rule.check_config().is_err());
        assert!(rule.check(Some("x"), "Code").is_err());
    }

    #[test]
    fn match_patterns_compile_once() {
        let rule = RuleDescriptor::matches("^[a-z]+-[0-9]{3}$");
        rule.check_config().unwrap();
        let first = compile_pattern("^[a-z]+-[0-9]{3}$").unwrap();
        assert!(rule.check(Some("abc-123"), "Code").unwrap().is_none());
        let second = compile_pattern("^[a-z]+-[0-9]{3}$").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn descriptors_deserialize_from_tagged_objects() {
        let rule: RuleDescriptor = serde_json::from_str(r#"{"rule":"string","max":1000}"#).unwrap();
        assert_eq!(rule, RuleDescriptor::max_length(1000));
        let rule: RuleDescriptor = serde_json::from_str(r#"{"rule":"boolean"}"#).unwrap();
        assert_eq!(rule, RuleDescriptor::Boolean);
    }

    #[test]
    fn default_rules_cover_key_and_foreign_key() {
        let rules = Rule::defaults(100);
        assert_eq!(rules.len(), 4);
        assert!(rules[0].fields.contains(&Field::SubjectForeignKey));
        assert_eq!(rules[1].kind, RuleKind::KeyLength { max: 100 });
        assert!(rules[3].skip_on_error);
    }
}
