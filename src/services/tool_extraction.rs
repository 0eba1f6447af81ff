//! Locating an embedded tool call in model output.
//!
//! The model is told to answer tool requests with
//! `{"tool": "<name>", "parameters": {...}}`. Only the first such object in
//! the text is used.

use std::sync::LazyLock;

use regex::Regex;

use crate::domain::models::ToolInvocation;

/// `{"tool": "<name>", "parameters": {...}}` anywhere in the text.
///
/// The parameters group is non-greedy: it ends at the first `}` that is
/// followed by the closing brace of the envelope.
static TOOL_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\{\s*"tool"\s*:\s*"([^"]+)"\s*,\s*"parameters"\s*:\s*(\{[\s\S]*?\})\s*\}"#)
        .expect("tool call regex")
});

/// First embedded tool call in `text`, if any
pub fn extract_tool_invocation(text: &str) -> Option<ToolInvocation> {
    let captures = TOOL_CALL.captures(text)?;
    Some(ToolInvocation {
        tool: captures.get(1)?.as_str().to_string(),
        raw_parameters: captures.get(2)?.as_str().to_string(),
    })
}
