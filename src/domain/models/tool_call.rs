//! Tool invocation found in model output.

/// A tool call found embedded in model output.
///
/// `raw_parameters` is the matched text, which may still fail to parse as JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    /// Requested tool name
    pub tool: String,
    /// The `parameters` object as written by the model
    pub raw_parameters: String,
}
