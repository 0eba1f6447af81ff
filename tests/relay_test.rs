mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use apirelay::domain::errors::ToolError;
use apirelay::domain::ports::Tool;
use apirelay::services::builtin_tools::EchoTool;
use apirelay::services::{RelayEnd, StreamingRelay, ToolRegistry};
use async_trait::async_trait;
use common::{ScriptedStreamer, Step};
use serde_json::{json, Value};
use tokio::sync::mpsc;

/// Counts executions and fails when asked to
#[derive(Default)]
struct Probe {
    calls: AtomicUsize,
}

#[async_trait]
impl Tool for Probe {
    fn name(&self) -> &str {
        "probe"
    }

    fn description(&self) -> &str {
        "Test probe"
    }

    fn parameter_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": { "fail": { "type": "boolean" } },
            "required": ["fail"]
        })
    }

    async fn execute(&self, parameters: Value) -> Result<String, ToolError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if parameters["fail"].as_bool() == Some(true) {
            return Err(ToolError::execution("probe exploded"));
        }
        Ok("probed".to_string())
    }
}

struct Harness {
    relay: StreamingRelay,
    probe: Arc<Probe>,
    streamer: Arc<ScriptedStreamer>,
}

fn harness(streamer: ScriptedStreamer) -> Harness {
    let probe = Arc::new(Probe::default());
    let registry = ToolRegistry::new()
        .with_tool(Arc::new(EchoTool))
        .unwrap()
        .with_tool(probe.clone())
        .unwrap();
    let streamer = Arc::new(streamer);
    Harness {
        relay: StreamingRelay::new(streamer.clone(), Arc::new(registry)),
        probe,
        streamer,
    }
}

async fn run(relay: &StreamingRelay) -> (Vec<String>, RelayEnd) {
    let (tx, mut rx) = mpsc::channel(8);
    let stream = relay.open("hello").await.unwrap();
    let pump = {
        let relay = relay.clone();
        tokio::spawn(async move { relay.pump(stream, tx).await })
    };

    let mut chunks = Vec::new();
    while let Some(chunk) = rx.recv().await {
        chunks.push(chunk);
    }
    (chunks, pump.await.unwrap())
}

#[tokio::test]
async fn test_plain_reply_passes_through_in_order() {
    let h = harness(ScriptedStreamer::tokens(&["Hel", "lo", " world"]));

    let (chunks, end) = run(&h.relay).await;
    assert_eq!(chunks, vec!["Hel", "lo", " world"]);
    assert_eq!(end, RelayEnd::Completed);
}

#[tokio::test]
async fn test_echo_call_appends_tool_output() {
    let h = harness(ScriptedStreamer::tokens(&[
        "Sure. ",
        r#"{"tool": "echo", "parameters": {"text": "hi"}}"#,
    ]));

    let (chunks, _) = run(&h.relay).await;
    assert_eq!(chunks.concat(), format!(
        "Sure. {}\n\n(Tool Output from \"echo\"):\nhi",
        r#"{"tool": "echo", "parameters": {"text": "hi"}}"#
    ));
}

#[tokio::test]
async fn test_unknown_tool_never_executes() {
    let h = harness(ScriptedStreamer::tokens(&[
        r#"{"tool": "teleport", "parameters": {"fail": false}}"#,
    ]));

    let (chunks, end) = run(&h.relay).await;
    assert_eq!(chunks.last().unwrap(), "\n\n⚠️ Unknown tool \"teleport\".");
    assert!(matches!(end, RelayEnd::ToolDispatched { tool, .. } if tool == "teleport"));
    assert_eq!(h.probe.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_schema_violation_reports_invalid_parameters() {
    let h = harness(ScriptedStreamer::tokens(&[
        r#"{"tool": "probe", "parameters": {"fail": "sometimes"}}"#,
    ]));

    let (chunks, _) = run(&h.relay).await;
    assert_eq!(chunks.last().unwrap(), "\n\n⚠️ Invalid parameters for tool \"probe\".");
    assert_eq!(h.probe.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unparseable_parameters_report_invalid_parameters() {
    let h = harness(ScriptedStreamer::tokens(&[
        r#"{"tool": "probe", "parameters": {fail: true}}"#,
    ]));

    let (chunks, _) = run(&h.relay).await;
    assert_eq!(chunks.last().unwrap(), "\n\n⚠️ Invalid parameters for tool \"probe\".");
    assert_eq!(h.probe.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_execution_error_is_reported() {
    let h = harness(ScriptedStreamer::tokens(&[
        r#"{"tool": "probe", "parameters": {"fail": true}}"#,
    ]));

    let (chunks, _) = run(&h.relay).await;
    assert_eq!(
        chunks.last().unwrap(),
        "\n\n⚠️ Error running tool \"probe\": probe exploded"
    );
    assert_eq!(h.probe.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_only_first_call_is_dispatched() {
    let h = harness(ScriptedStreamer::tokens(&[
        r#"{"tool": "probe", "parameters": {"fail": false}} and "#,
        r#"{"tool": "probe", "parameters": {"fail": true}}"#,
    ]));

    let (chunks, _) = run(&h.relay).await;
    assert_eq!(chunks.last().unwrap(), "\n\n(Tool Output from \"probe\"):\nprobed");
    assert_eq!(h.probe.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_stream_error_skips_dispatch() {
    let h = harness(ScriptedStreamer::new(vec![
        Step::Token(r#"{"tool": "probe", "parameters": {"fail": false}}"#),
        Step::Fail("upstream reset"),
        Step::Token("never sent"),
    ]));

    let (chunks, end) = run(&h.relay).await;
    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[1], "\n\n⚠️ Stream interrupted: upstream reset");
    assert_eq!(end, RelayEnd::Interrupted);
    assert_eq!(h.probe.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_open_failure_is_returned_before_output() {
    let h = harness(ScriptedStreamer::unavailable());
    assert!(h.relay.open("hello").await.is_err());
}

#[tokio::test]
async fn test_system_instruction_lists_registered_tools() {
    let h = harness(ScriptedStreamer::tokens(&["ok"]));
    run(&h.relay).await;

    let system = h.streamer.seen_system.lock().unwrap().clone().unwrap();
    assert!(system.starts_with("You are a helpful AI assistant."));
    assert!(system.contains("Tool: echo\nDescription: Echo the input string"));
    assert!(system.contains("Tool: probe\nDescription: Test probe"));
}
