//! Per-request render context.
//!
//! A [`RenderContext`] is an arbitrary JSON object owned by the caller. The
//! renderer reads a few well-known keys from it and passes the whole object to
//! templates as data:
//!
//! - `head`: markup appended right after the template head
//! - `styles`: already rendered inline styles
//! - `nonce`: CSP nonce for the state script
//! - `state` (configurable): value serialized for client hydration

use serde::Serialize;
use serde_json::{Map, Value};

/// Request-scoped render state.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RenderContext {
    values: Map<String, Value>,
}

impl RenderContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a context from a JSON value.
    ///
    /// Non-object values are ignored and produce an empty context.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(values) => Self { values },
            _ => Self::default(),
        }
    }

    /// Set an arbitrary key
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Set the hydration state under the default `state` key
    pub fn with_state(self, state: impl Into<Value>) -> Self {
        self.with("state", state)
    }

    pub fn with_head(self, head: impl Into<String>) -> Self {
        self.with("head", Value::String(head.into()))
    }

    pub fn with_styles(self, styles: impl Into<String>) -> Self {
        self.with("styles", Value::String(styles.into()))
    }

    pub fn with_nonce(self, nonce: impl Into<String>) -> Self {
        self.with("nonce", Value::String(nonce.into()))
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn head(&self) -> Option<&str> {
        self.get_str("head")
    }

    pub fn styles(&self) -> Option<&str> {
        self.get_str("styles")
    }

    pub fn nonce(&self) -> Option<&str> {
        self.get_str("nonce")
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The context as template data
    pub fn to_value(&self) -> Value {
        Value::Object(self.values.clone())
    }

    fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
    }
}

impl From<Map<String, Value>> for RenderContext {
    fn from(values: Map<String, Value>) -> Self {
        Self { values }
    }
}

impl From<Value> for RenderContext {
    fn from(value: Value) -> Self {
        Self::from_value(value)
    }
}

/// JavaScript truthiness of a JSON value.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
