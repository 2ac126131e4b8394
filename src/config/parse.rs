//! Option token parsing
//!
//! Tokens look like `name`, `name=value` or `name:field=value,field=value`.
//! Values are typed by the option definition they belong to.

use crossplane_gen_plugin::{FieldKind, OptionField, OptionValue, OptionValueError};
use thiserror::Error;

use super::registry::{OptionArguments, OptionDefinition};

/// Errors raised while turning option tokens into a runtime
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OptionError {
    #[error("unknown option {0:?}")]
    UnknownOption(String),

    #[error("option {0:?} is already registered")]
    Duplicate(String),

    #[error("option {option:?} takes no arguments")]
    UnexpectedArguments { option: String },

    #[error("option {option:?} requires a value")]
    MissingValue { option: String },

    #[error("option {option:?} has no field {field:?}")]
    UnknownField { option: String, field: String },

    #[error("invalid {kind} value {value:?} for {option:?}")]
    InvalidValue {
        option: String,
        kind: FieldKind,
        value: String,
    },

    #[error("invalid value for field {field:?} of {option:?}: {source}")]
    Field {
        option: String,
        field: String,
        #[source]
        source: OptionValueError,
    },

    #[error("unbalanced quotes or braces in {0:?}")]
    Unbalanced(String),
}

/// Arguments parsed from a single token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedArguments {
    None,
    Value(OptionValue),
    Fields(Vec<(&'static str, OptionValue)>),
}

/// Parse the part of a token following the option name
pub fn parse_arguments(
    definition: &OptionDefinition,
    rest: &str,
) -> Result<ParsedArguments, OptionError> {
    let option = definition.name.as_str();

    match (&definition.arguments, rest.chars().next()) {
        (OptionArguments::None, None) => Ok(ParsedArguments::None),
        (OptionArguments::None, Some(_)) => Err(OptionError::UnexpectedArguments {
            option: option.to_string(),
        }),

        (OptionArguments::Anonymous(FieldKind::Bool), None) => {
            Ok(ParsedArguments::Value(OptionValue::Bool(true)))
        }
        (OptionArguments::Anonymous(_), None) => Err(OptionError::MissingValue {
            option: option.to_string(),
        }),
        (OptionArguments::Anonymous(kind), Some('=')) => {
            parse_value(option, *kind, &rest[1..]).map(ParsedArguments::Value)
        }

        (OptionArguments::Named(_), None) => Ok(ParsedArguments::Fields(Vec::new())),
        (OptionArguments::Named(fields), Some(':')) => {
            parse_fields(option, fields, &rest[1..]).map(ParsedArguments::Fields)
        }

        (_, Some(_)) => Err(OptionError::UnexpectedArguments {
            option: option.to_string(),
        }),
    }
}

fn parse_fields(
    option: &str,
    fields: &[OptionField],
    raw: &str,
) -> Result<Vec<(&'static str, OptionValue)>, OptionError> {
    let mut parsed = Vec::new();

    for part in split_top_level(raw, ',')? {
        if part.is_empty() {
            continue;
        }

        let (name, value) = match part.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (part.as_str(), None),
        };

        let field = fields
            .iter()
            .find(|field| field.name == name)
            .ok_or_else(|| OptionError::UnknownField {
                option: option.to_string(),
                field: name.to_string(),
            })?;

        let value = match (value, field.kind) {
            (Some(value), kind) => parse_value(option, kind, value)?,
            (None, FieldKind::Bool) => OptionValue::Bool(true),
            (None, _) => {
                return Err(OptionError::MissingValue {
                    option: format!("{}:{}", option, name),
                })
            }
        };

        parsed.push((field.name, value));
    }

    Ok(parsed)
}

/// Parse a raw value as the given kind
pub fn parse_value(option: &str, kind: FieldKind, raw: &str) -> Result<OptionValue, OptionError> {
    let invalid = || OptionError::InvalidValue {
        option: option.to_string(),
        kind,
        value: raw.to_string(),
    };

    match kind {
        FieldKind::Bool => match raw {
            "true" => Ok(OptionValue::Bool(true)),
            "false" => Ok(OptionValue::Bool(false)),
            _ => Err(invalid()),
        },
        FieldKind::Int => raw
            .trim()
            .parse::<i64>()
            .map(OptionValue::Int)
            .map_err(|_| invalid()),
        FieldKind::String => Ok(OptionValue::String(unquote(raw))),
        FieldKind::StringList => parse_string_list(raw).map(OptionValue::StringList),
    }
}

/// `{a,b}` or `a;b`
fn parse_string_list(raw: &str) -> Result<Vec<String>, OptionError> {
    let items = match raw
        .strip_prefix('{')
        .and_then(|inner| inner.strip_suffix('}'))
    {
        Some(inner) => split_top_level(inner, ',')?,
        None => raw.split(';').map(str::to_string).collect(),
    };

    Ok(items
        .iter()
        .map(|item| unquote(item.trim()))
        .filter(|item| !item.is_empty())
        .collect())
}

/// Strip surrounding double quotes and resolve `\"` and `\\` escapes
pub fn unquote(raw: &str) -> String {
    let Some(inner) = raw
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
    else {
        return raw.to_string();
    };

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
                continue;
            }
        }
        out.push(c);
    }
    out
}

/// Split on `separator` outside double quotes and braces
pub fn split_top_level(raw: &str, separator: char) -> Result<Vec<String>, OptionError> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut in_quotes = false;
    let mut escaped = false;

    for c in raw.chars() {
        if escaped {
            current.push(c);
            escaped = false;
            continue;
        }

        match c {
            '\\' if in_quotes => {
                escaped = true;
                current.push(c);
            }
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            '{' if !in_quotes => {
                depth += 1;
                current.push(c);
            }
            '}' if !in_quotes => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| OptionError::Unbalanced(raw.to_string()))?;
                current.push(c);
            }
            c if c == separator && !in_quotes && depth == 0 => {
                parts.push(std::mem::take(&mut current));
            }
            c => current.push(c),
        }
    }

    if in_quotes || depth != 0 {
        return Err(OptionError::Unbalanced(raw.to_string()));
    }

    parts.push(current);
    Ok(parts)
}
