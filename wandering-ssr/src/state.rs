// Inline state serialization

use crate::context::{RenderContext, is_truthy};
use serde_json::Value;
use std::sync::Arc;

/// Serializer turning the hydration state into a script-embeddable literal.
pub type StateSerializer = Arc<dyn Fn(&Value) -> String + Send + Sync>;

/// Where the state is read from and assigned to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateOptions {
    /// Context key holding the state (default: `state`)
    pub context_key: String,
    /// Property of `window` receiving the state (default: `__INITIAL_STATE__`)
    pub window_key: String,
}

impl StateOptions {
    pub fn new(context_key: impl Into<String>, window_key: impl Into<String>) -> Self {
        Self {
            context_key: context_key.into(),
            window_key: window_key.into(),
        }
    }
}

impl Default for StateOptions {
    fn default() -> Self {
        Self::new("state", "__INITIAL_STATE__")
    }
}

/// JSON-encode `state` so the output is safe inside a `<script>` element.
///
/// `<`, `>` and `/` are written as unicode escapes so the literal can never
/// close the surrounding tag, and the JavaScript line terminators U+2028 and
/// U+2029 are escaped as well.
pub fn serialize_state(state: &Value) -> String {
    let json = state.to_string();
    let mut out = String::with_capacity(json.len());
    for c in json.chars() {
        match c {
            '<' => out.push_str("\\u003C"),
            '>' => out.push_str("\\u003E"),
            '/' => out.push_str("\\u002F"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c => out.push(c),
        }
    }
    out
}

/// Render `<script>window.KEY=STATE</script>` for the context's state.
///
/// Returns an empty string when the state is absent or falsy.
pub fn render_state(
    context: &RenderContext,
    options: &StateOptions,
    serializer: Option<&StateSerializer>,
) -> String {
    let state = match context.get(&options.context_key) {
        Some(state) if is_truthy(state) => state,
        _ => return String::new(),
    };

    let serialized = match serializer {
        Some(serialize) => serialize(state),
        None => serialize_state(state),
    };

    let nonce = context
        .nonce()
        .map(|n| format!(" nonce=\"{}\"", escape_attribute(n)))
        .unwrap_or_default();

    format!(
        "<script{}>window.{}={}</script>",
        nonce, options.window_key, serialized
    )
}

pub(crate) fn escape_attribute(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
