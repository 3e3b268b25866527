//! Compilation of `LabelSelector`s into label matchers.
use super::validation::{is_qualified_name, is_valid_label_value};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectorError {
    #[error("key: Invalid value: {key:?}: {detail}")]
    InvalidKey { key: String, detail: String },

    #[error("values[{index}][{key}]: Invalid value: {value:?}: {detail}")]
    InvalidValue {
        key: String,
        index: usize,
        value: String,
        detail: String,
    },

    #[error("values: Invalid value: {values:?}: for '{operator}' operator, {detail}")]
    InvalidValueCount {
        operator: String,
        values: Vec<String>,
        detail: &'static str,
    },

    #[error("{0:?} is not a valid label selector operator")]
    InvalidOperator(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operator {
    In,
    NotIn,
    Exists,
    DoesNotExist,
}

/// A single compiled selector term.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Requirement {
    key: String,
    operator: Operator,
    values: Vec<String>,
}

impl Requirement {
    pub fn new(key: &str, operator: Operator, values: Vec<String>) -> Result<Self, SelectorError> {
        let errs = is_qualified_name(key);
        if !errs.is_empty() {
            return Err(SelectorError::InvalidKey {
                key: key.to_string(),
                detail: errs.join("; "),
            });
        }
        match operator {
            Operator::In | Operator::NotIn if values.is_empty() => {
                return Err(SelectorError::InvalidValueCount {
                    operator: format!("{:?}", operator),
                    values,
                    detail: "values set can't be empty",
                });
            }
            Operator::Exists | Operator::DoesNotExist if !values.is_empty() => {
                return Err(SelectorError::InvalidValueCount {
                    operator: format!("{:?}", operator),
                    values,
                    detail: "values set must be empty",
                });
            }
            _ => {}
        }
        for (index, value) in values.iter().enumerate() {
            let errs = is_valid_label_value(value);
            if !errs.is_empty() {
                return Err(SelectorError::InvalidValue {
                    key: key.to_string(),
                    index,
                    value: value.clone(),
                    detail: errs.join("; "),
                });
            }
        }
        Ok(Requirement {
            key: key.to_string(),
            operator,
            values,
        })
    }

    fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        let value = labels.get(&self.key);
        match self.operator {
            Operator::In => value.map_or(false, |v| self.values.contains(v)),
            Operator::NotIn => value.map_or(true, |v| !self.values.contains(v)),
            Operator::Exists => value.is_some(),
            Operator::DoesNotExist => value.is_none(),
        }
    }
}

/// A compiled label selector. An empty selector matches every label set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selector {
    requirements: Vec<Requirement>,
}

impl Selector {
    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        self.requirements.iter().all(|r| r.matches(labels))
    }
}

/// Compiles a `LabelSelector`, failing on malformed keys, values or operators.
pub fn label_selector_as_selector(selector: &LabelSelector) -> Result<Selector, SelectorError> {
    let mut requirements = Vec::new();
    if let Some(match_labels) = &selector.match_labels {
        for (key, value) in match_labels {
            requirements.push(Requirement::new(
                key,
                Operator::In,
                vec![value.clone()],
            )?);
        }
    }
    if let Some(match_expressions) = &selector.match_expressions {
        for expression in match_expressions {
            let operator = match expression.operator.as_str() {
                "In" => Operator::In,
                "NotIn" => Operator::NotIn,
                "Exists" => Operator::Exists,
                "DoesNotExist" => Operator::DoesNotExist,
                other => return Err(SelectorError::InvalidOperator(other.to_string())),
            };
            requirements.push(Requirement::new(
                &expression.key,
                operator,
                expression.values.clone().unwrap_or_default(),
            )?);
        }
    }
    Ok(Selector { requirements })
}
