//! Field paths and field-level validation errors, rendered the way the
//! Kubernetes API server renders them.
use serde_json::Value;
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Name(String),
    Index(usize),
    Key(String),
}

/// A structured locator of a field inside an object, e.g. `spec.template.images[3]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Path {
    segments: Vec<Segment>,
}

impl Path {
    pub fn new(name: &str) -> Self {
        Path {
            segments: vec![Segment::Name(name.to_string())],
        }
    }

    pub fn child(&self, name: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Name(name.to_string()));
        Path { segments }
    }

    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Index(index));
        Path { segments }
    }

    pub fn key(&self, key: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Key(key.to_string()));
        Path { segments }
    }

    /// Returns the path of the first segment only.
    pub fn root(&self) -> Self {
        Path {
            segments: self.segments.iter().take(1).cloned().collect(),
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Name(name) if i == 0 => write!(f, "{}", name)?,
                Segment::Name(name) => write!(f, ".{}", name)?,
                Segment::Index(index) => write!(f, "[{}]", index)?,
                Segment::Key(key) => write!(f, "[{}]", key)?,
            }
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorType {
    Invalid,
    Required,
    Forbidden,
    Duplicate,
    NotSupported,
    TooLong,
}

impl ErrorType {
    fn as_str(&self) -> &'static str {
        match self {
            ErrorType::Invalid => "Invalid value",
            ErrorType::Required => "Required value",
            ErrorType::Forbidden => "Forbidden",
            ErrorType::Duplicate => "Duplicate value",
            ErrorType::NotSupported => "Unsupported value",
            ErrorType::TooLong => "Too long",
        }
    }
}

/// A single field-level contract breach
#[derive(Clone, Debug, PartialEq)]
pub struct FieldError {
    pub error_type: ErrorType,
    pub field: String,
    pub bad_value: Option<Value>,
    pub detail: String,
}

pub type ErrorList = Vec<FieldError>;

impl FieldError {
    /// Serializes `value` for display; values that cannot be serialized are
    /// reported as null.
    fn value_of<T: serde::Serialize + ?Sized>(value: &T) -> Value {
        serde_json::to_value(value).unwrap_or(Value::Null)
    }

    pub fn invalid<T: serde::Serialize + ?Sized>(path: &Path, value: &T, detail: &str) -> Self {
        FieldError {
            error_type: ErrorType::Invalid,
            field: path.to_string(),
            bad_value: Some(Self::value_of(value)),
            detail: detail.to_string(),
        }
    }

    pub fn required(path: &Path, detail: &str) -> Self {
        FieldError {
            error_type: ErrorType::Required,
            field: path.to_string(),
            bad_value: None,
            detail: detail.to_string(),
        }
    }

    pub fn forbidden(path: &Path, detail: &str) -> Self {
        FieldError {
            error_type: ErrorType::Forbidden,
            field: path.to_string(),
            bad_value: None,
            detail: detail.to_string(),
        }
    }

    pub fn duplicate<T: serde::Serialize + ?Sized>(path: &Path, value: &T) -> Self {
        FieldError {
            error_type: ErrorType::Duplicate,
            field: path.to_string(),
            bad_value: Some(Self::value_of(value)),
            detail: String::new(),
        }
    }

    pub fn not_supported<T: serde::Serialize + ?Sized>(
        path: &Path,
        value: &T,
        valid_values: &[&str],
    ) -> Self {
        let quoted: Vec<String> = valid_values.iter().map(|v| format!("\"{}\"", v)).collect();
        FieldError {
            error_type: ErrorType::NotSupported,
            field: path.to_string(),
            bad_value: Some(Self::value_of(value)),
            detail: format!("supported values: {}", quoted.join(", ")),
        }
    }

    pub fn too_long(path: &Path, max_length: usize) -> Self {
        FieldError {
            error_type: ErrorType::TooLong,
            field: path.to_string(),
            bad_value: None,
            detail: format!("must have at most {} bytes", max_length),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.error_type.as_str())?;
        if let Some(value) = &self.bad_value {
            match value {
                Value::String(s) => write!(f, ": {:?}", s)?,
                other => write!(f, ": {}", other)?,
            }
        }
        if !self.detail.is_empty() {
            write!(f, ": {}", self.detail)?;
        }
        Ok(())
    }
}

impl std::error::Error for FieldError {}

/// Renders an error list as a single message. One error is rendered bare,
/// several are bracketed. Identical messages are only reported once.
pub fn to_aggregate(errors: &[FieldError]) -> Option<String> {
    let mut messages: Vec<String> = Vec::new();
    for message in errors.iter().map(|e| e.to_string()) {
        if !messages.contains(&message) {
            messages.push(message);
        }
    }
    match messages.len() {
        0 => None,
        1 => messages.pop(),
        _ => Some(format!("[{}]", messages.join(", "))),
    }
}
