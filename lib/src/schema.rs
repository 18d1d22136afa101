//! Form descriptions and value validation derived from template fields.
//!
//! | placeholder type                       | form field        | validator      |
//! |----------------------------------------|-------------------|----------------|
//! | Uri, AutoEscapeUri, ExternalUri, Trusty| url input         | URL + regex    |
//! | GuidedChoice, RestrictedChoice         | searchable choice | option / regex |
//! | Text, Literal, SequenceElement         | short text        | non-empty      |
//! | LongLiteral, IntroducedResource        | multi-line text   | non-empty      |
//! | RepeatableStatement, or any field of a   | dynamic list      | string list    |
//! | repeatable statement                   |                   |                |
//! | anything else                          | short text        | plain string   |

use crate::instantiate::{FieldValue, TemplateValues};
use crate::template::{PlaceholderType, TemplateField};
use crate::terms::prefixed_value;
use crate::values::FieldOption;
use log::debug;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormFieldKind {
    UrlInput,
    SearchableChoice,
    ShortText,
    MultiLineText,
    DynamicList,
}

#[derive(Debug, Clone, Serialize)]
pub struct FormField {
    pub id: String,
    pub label: String,
    pub description: Option<String>,
    pub kind: FormFieldKind,
    pub required: bool,
    pub options: Vec<FieldOption>,
    /// Prefix prepended to bare values, and its human label.
    pub prefix: Option<String>,
    pub prefix_label: Option<String>,
    #[serde(with = "serde_regex")]
    pub pattern: Option<Regex>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Validator {
    Url {
        #[serde(with = "serde_regex")]
        pattern: Option<Regex>,
        prefix: Option<String>,
    },
    /// One of the option names or URIs; any string matching `pattern` when no
    /// options are known.
    Choice {
        options: Vec<FieldOption>,
        #[serde(with = "serde_regex")]
        pattern: Option<Regex>,
    },
    NonEmpty {
        #[serde(with = "serde_regex")]
        pattern: Option<Regex>,
    },
    PlainString,
    StringList,
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldRule {
    pub field: String,
    pub validator: Validator,
    pub optional: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
}

impl ValidationIssue {
    fn new(field: &str, message: impl Into<String>) -> Self {
        ValidationIssue {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn kind_of(field: &TemplateField) -> FormFieldKind {
    if field.multiple {
        return FormFieldKind::DynamicList;
    }
    match &field.field_type {
        t if t.is_uri() => FormFieldKind::UrlInput,
        t if t.is_choice() && !field.options_unavailable => FormFieldKind::SearchableChoice,
        PlaceholderType::LongLiteral | PlaceholderType::IntroducedResource => {
            FormFieldKind::MultiLineText
        }
        PlaceholderType::RepeatableStatement => FormFieldKind::DynamicList,
        _ => FormFieldKind::ShortText,
    }
}

pub fn form_field(field: &TemplateField) -> FormField {
    let kind = kind_of(field);
    FormField {
        id: field.id.clone(),
        label: field.label.clone(),
        description: field.description.clone(),
        kind,
        required: field.required && kind != FormFieldKind::DynamicList,
        options: field.options.clone(),
        prefix: field.prefix.clone(),
        prefix_label: field.prefix_label.clone(),
        pattern: field.regex.clone(),
    }
}

pub fn form_fields(fields: &[TemplateField]) -> Vec<FormField> {
    fields.iter().map(form_field).collect()
}

fn validator_for(field: &TemplateField) -> Validator {
    let pattern = field.regex.clone();
    match (kind_of(field), &field.field_type) {
        (FormFieldKind::UrlInput, _) => Validator::Url {
            pattern,
            prefix: field.prefix.clone(),
        },
        (FormFieldKind::SearchableChoice, _) => Validator::Choice {
            options: field.options.clone(),
            pattern,
        },
        (FormFieldKind::DynamicList, _) => Validator::StringList,
        (_, PlaceholderType::Unknown(_)) => Validator::PlainString,
        _ => Validator::NonEmpty { pattern },
    }
}

/// Per-field validation rules for a template's form.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationSchema {
    rules: Vec<FieldRule>,
}

impl ValidationSchema {
    pub fn from_fields(fields: &[TemplateField]) -> Self {
        let rules = fields
            .iter()
            .map(|field| {
                let validator = validator_for(field);
                FieldRule {
                    field: field.id.clone(),
                    optional: !field.required && !matches!(validator, Validator::StringList),
                    validator,
                }
            })
            .collect();
        ValidationSchema { rules }
    }

    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }

    pub fn rule(&self, field: &str) -> Option<&FieldRule> {
        self.rules.iter().find(|r| r.field == field)
    }

    /// Checks a JSON object of submitted values. On success returns the
    /// normalised values: list fields default to empty, empty optional entries
    /// are dropped, and choice names are replaced by their option URI.
    pub fn validate(&self, input: &Value) -> Result<TemplateValues, Vec<ValidationIssue>> {
        let Some(object) = input.as_object() else {
            return Err(vec![ValidationIssue::new("", "values must be a JSON object")]);
        };
        let mut values = TemplateValues::new();
        let mut issues = Vec::new();
        for rule in &self.rules {
            match rule.check(object.get(&rule.field)) {
                Ok(Some(value)) => {
                    values.insert(rule.field.clone(), value);
                }
                Ok(None) => {}
                Err(message) => issues.push(ValidationIssue::new(&rule.field, message)),
            }
        }
        for key in object.keys() {
            if self.rule(key).is_none() {
                debug!("Ignoring value for unknown field {}", key);
            }
        }
        if issues.is_empty() {
            Ok(values)
        } else {
            Err(issues)
        }
    }
}

impl FieldRule {
    fn check(&self, value: Option<&Value>) -> Result<Option<FieldValue>, String> {
        if let Validator::StringList = self.validator {
            return check_list(value).map(Some);
        }
        let text = match value {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.as_str()),
            Some(other) => return Err(format!("expected a string, got {}", other)),
        };
        let blank = text.map_or(true, |s| s.trim().is_empty());
        match (&self.validator, text) {
            (Validator::PlainString, Some(s)) if !(self.optional && s.is_empty()) => {
                return Ok(Some(s.into()));
            }
            _ if blank && self.optional => return Ok(None),
            (Validator::PlainString, None) => return Err("is required".to_string()),
            _ if blank => return Err("is required".to_string()),
            _ => {}
        }
        let text = text.unwrap_or_default().trim();
        match &self.validator {
            Validator::Url { pattern, prefix } => {
                let candidate = prefixed_value(prefix.as_deref(), text);
                url::Url::parse(&candidate)
                    .map_err(|e| format!("'{}' is not a valid URL: {}", text, e))?;
                check_pattern(pattern, text)?;
                Ok(Some(text.into()))
            }
            Validator::Choice { options, pattern } => {
                if options.is_empty() {
                    check_pattern(pattern, text)?;
                    return Ok(Some(text.into()));
                }
                let option = options
                    .iter()
                    .find(|o| o.uri.as_deref() == Some(text))
                    .or_else(|| options.iter().find(|o| o.name == text))
                    .ok_or_else(|| format!("'{}' is not one of the allowed options", text))?;
                Ok(Some(option.uri.clone().unwrap_or_else(|| option.name.clone()).into()))
            }
            Validator::NonEmpty { pattern } => {
                check_pattern(pattern, text)?;
                Ok(Some(text.into()))
            }
            Validator::PlainString | Validator::StringList => Ok(Some(text.into())),
        }
    }
}

fn check_pattern(pattern: &Option<Regex>, text: &str) -> Result<(), String> {
    match pattern {
        Some(re) if !re.is_match(text) => {
            Err(format!("'{}' does not match the pattern {}", text, re.as_str()))
        }
        _ => Ok(()),
    }
}

fn check_list(value: Option<&Value>) -> Result<FieldValue, String> {
    match value {
        None | Some(Value::Null) => Ok(FieldValue::List(Vec::new())),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(FieldValue::List(Vec::new())),
        Some(Value::String(s)) => Ok(FieldValue::List(vec![s.clone()])),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.clone()),
                other => Err(format!("expected a list of strings, found {}", other)),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(|items| {
                FieldValue::List(items.into_iter().filter(|s| !s.trim().is_empty()).collect())
            }),
        Some(other) => Err(format!("expected a list of strings, got {}", other)),
    }
}
