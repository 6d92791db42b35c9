//! Integration tests for the decode/translate pipeline over mock lines.

mod common;

use futures::StreamExt;
use libgoose::{
    Audience, Error, ErrorKind, FinishReason, GenerationPart, GenerationStream,
};
use serde_json::json;

use common::{MockLines, ScenarioBuilder};

async fn collect_parts(stream: GenerationStream) -> Vec<GenerationPart> {
    stream.collect::<Vec<_>>().await
}

#[tokio::test]
async fn simple_text_response() {
    let lines = ScenarioBuilder::new()
        .assistant_text(&["Hello, ", "world!"])
        .complete(42)
        .build();

    let parts = collect_parts(GenerationStream::from_lines(lines, Audience::User)).await;

    assert_eq!(
        parts,
        vec![
            GenerationPart::TextStart {
                id: "text-0".into()
            },
            GenerationPart::TextDelta {
                id: "text-0".into(),
                text: "Hello, ".into()
            },
            GenerationPart::TextDelta {
                id: "text-0".into(),
                text: "world!".into()
            },
            GenerationPart::TextEnd {
                id: "text-0".into()
            },
            GenerationPart::Finish {
                reason: FinishReason::Stop,
                usage: libgoose::Usage {
                    total_tokens: 42,
                    ..Default::default()
                },
            },
        ]
    );
}

#[tokio::test]
async fn text_closes_before_tool_call() {
    let lines = ScenarioBuilder::new()
        .assistant_text_then_tool("Let me check.", "call-1", "shell", json!({"command": "ls"}))
        .complete(10)
        .build();

    let parts = collect_parts(GenerationStream::from_lines(lines, Audience::User)).await;

    let end_idx = parts
        .iter()
        .position(|p| matches!(p, GenerationPart::TextEnd { .. }))
        .expect("open segment must close");
    let call_idx = parts
        .iter()
        .position(|p| matches!(p, GenerationPart::ToolCall { .. }))
        .expect("tool call must be emitted");
    assert_eq!(call_idx, end_idx + 1, "TextEnd must immediately precede ToolCall");
}

#[tokio::test]
async fn tool_result_carries_resolved_name_and_filtered_output() {
    let lines = ScenarioBuilder::new()
        .tool_request("call-1", "shell", json!({"command": "ls"}))
        .tool_response(
            "call-1",
            json!([
                {"type": "text", "text": "assistant only", "annotations": {"audience": ["assistant"]}},
                {"type": "text", "text": "file1.txt"},
            ]),
            false,
        )
        .complete(7)
        .build();

    let parts = collect_parts(GenerationStream::from_lines(lines, Audience::User)).await;

    let result = parts
        .iter()
        .find_map(|p| match p {
            GenerationPart::ToolResult {
                name,
                output,
                is_error,
                ..
            } => Some((name.clone(), output.clone(), *is_error)),
            _ => None,
        })
        .expect("tool result must be emitted");
    assert_eq!(result.0, "shell");
    assert_eq!(result.1, "file1.txt");
    assert!(!result.2);
}

#[tokio::test]
async fn completion_closes_dangling_segment() {
    let lines = ScenarioBuilder::new()
        .assistant_text(&["partial"])
        .complete(3)
        .build();

    let parts = collect_parts(GenerationStream::from_lines(lines, Audience::User)).await;

    let end_idx = parts
        .iter()
        .position(|p| matches!(p, GenerationPart::TextEnd { .. }))
        .expect("dangling segment must close");
    let finish_idx = parts
        .iter()
        .position(|p| matches!(p, GenerationPart::Finish { .. }))
        .expect("finish must be emitted");
    assert!(end_idx < finish_idx);
}

#[tokio::test]
async fn malformed_line_is_skipped_without_failing_the_call() {
    common::init_tracing();
    let lines = ScenarioBuilder::new()
        .assistant_text(&["before"])
        .malformed()
        .assistant_text(&["after"])
        .complete(2)
        .build();

    let parts = collect_parts(GenerationStream::from_lines(lines, Audience::User)).await;

    let deltas: Vec<&str> = parts.iter().filter_map(GenerationPart::text).collect();
    assert_eq!(deltas, vec!["before", "after"]);
    assert!(
        parts.iter().all(|p| p.as_error().is_none()),
        "malformed lines must never escalate to a call-level error"
    );
    assert!(matches!(parts.last(), Some(GenerationPart::Finish { .. })));
}

#[tokio::test]
async fn upstream_error_terminates_the_stream() {
    let lines = ScenarioBuilder::new()
        .assistant_text(&["partial"])
        .error("provider rate limited")
        .assistant_text(&["never seen"])
        .build();

    let parts = collect_parts(GenerationStream::from_lines(lines, Audience::User)).await;

    // The dangling segment closes, then a single terminal Error part.
    assert!(matches!(
        parts[parts.len() - 2],
        GenerationPart::TextEnd { .. }
    ));
    let error = parts.last().unwrap().as_error().expect("terminal error");
    assert_eq!(error.kind(), ErrorKind::Upstream);
    assert!(!error.is_retryable());
    assert!(error.to_string().contains("provider rate limited"));
    assert!(
        !parts.iter().any(|p| matches!(p, GenerationPart::Finish { .. })),
        "no Finish may follow an Error"
    );
    assert!(
        !parts.iter().any(|p| p.text() == Some("never seen")),
        "nothing is emitted after the terminator"
    );
}

#[tokio::test]
async fn notifications_are_ignored() {
    let lines = ScenarioBuilder::new()
        .notification("tool starting")
        .assistant_text(&["hi"])
        .notification("tool done")
        .complete(1)
        .build();

    let parts = collect_parts(GenerationStream::from_lines(lines, Audience::User)).await;
    let deltas: Vec<&str> = parts.iter().filter_map(GenerationPart::text).collect();
    assert_eq!(deltas, vec!["hi"]);
}

#[tokio::test]
async fn eof_without_complete_still_terminates_with_finish() {
    let lines = ScenarioBuilder::new().assistant_text(&["tail"]).build();

    let parts = collect_parts(GenerationStream::from_lines(lines, Audience::User)).await;

    assert!(matches!(
        parts[parts.len() - 2],
        GenerationPart::TextEnd { .. }
    ));
    let (reason, _) = parts.last().unwrap().as_finish().expect("finish terminator");
    assert_eq!(reason, FinishReason::Unknown);
}

#[tokio::test]
async fn events_after_complete_are_dropped() {
    let lines = ScenarioBuilder::new()
        .assistant_text(&["a"])
        .complete(1)
        .assistant_text(&["late"])
        .complete(2)
        .build();

    let parts = collect_parts(GenerationStream::from_lines(lines, Audience::User)).await;

    assert_eq!(
        parts
            .iter()
            .filter(|p| matches!(p, GenerationPart::Finish { .. }))
            .count(),
        1
    );
    assert!(parts.last().unwrap().as_finish().is_some());
    assert!(!parts.iter().any(|p| p.text() == Some("late")));
}

#[tokio::test]
async fn collect_folds_text_reason_and_usage() {
    let lines = ScenarioBuilder::new()
        .assistant_text(&["The answer ", "is 42."])
        .complete(21)
        .build();

    let response = GenerationStream::from_lines(lines, Audience::User)
        .collect_all()
        .await
        .expect("should succeed");

    assert_eq!(response.text, "The answer is 42.");
    assert_eq!(response.finish_reason, FinishReason::Stop);
    assert_eq!(response.usage.total(), 21);
    assert!(!response.parts.is_empty());
}

#[tokio::test]
async fn collect_rejects_on_upstream_error() {
    let lines = ScenarioBuilder::new()
        .assistant_text(&["partial"])
        .error("boom")
        .build();

    let result = GenerationStream::from_lines(lines, Audience::User)
        .collect_all()
        .await;

    match result {
        Err(Error::Upstream { message, .. }) => assert_eq!(message, "boom"),
        other => panic!("expected upstream error, got {:?}", other),
    }
}

#[tokio::test]
async fn collect_text_convenience() {
    let lines = ScenarioBuilder::new()
        .assistant_text(&["one ", "two"])
        .complete(4)
        .build();

    let text = GenerationStream::from_lines(lines, Audience::User)
        .collect_text()
        .await
        .expect("should succeed");
    assert_eq!(text, "one two");
}

#[tokio::test]
async fn assistant_audience_sees_annotated_items() {
    let lines = ScenarioBuilder::new()
        .tool_request("call-1", "shell", json!({}))
        .tool_response(
            "call-1",
            json!([
                {"type": "text", "text": "assistant only", "annotations": {"audience": ["assistant"]}},
                {"type": "text", "text": "shared"},
            ]),
            false,
        )
        .complete(1)
        .build();

    let parts = collect_parts(GenerationStream::from_lines(lines, Audience::Assistant)).await;
    let output = parts
        .iter()
        .find_map(|p| match p {
            GenerationPart::ToolResult { output, .. } => Some(output.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(output, "assistant only\nshared");
}

#[tokio::test]
async fn tool_error_results_are_flagged() {
    let lines = ScenarioBuilder::new()
        .tool_request("call-1", "shell", json!({}))
        .tool_response(
            "call-1",
            json!([{"type": "text", "text": "command not found"}]),
            true,
        )
        .complete(1)
        .build();

    let parts = collect_parts(GenerationStream::from_lines(lines, Audience::User)).await;
    assert!(parts.iter().any(|p| matches!(
        p,
        GenerationPart::ToolResult { is_error: true, .. }
    )));
}

#[tokio::test]
async fn read_failure_surfaces_as_terminal_error() {
    let lines = MockLines::with_io_error(
        vec![json!({
            "type": "message",
            "role": "assistant",
            "content": [{"type": "text", "text": "partial"}],
        })
        .to_string()],
        std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed"),
    );

    let parts = collect_parts(GenerationStream::from_lines(lines, Audience::User)).await;

    let error = parts.last().unwrap().as_error().expect("terminal error");
    assert_eq!(error.kind(), ErrorKind::Process);
    // The partial segment still closed before the terminator.
    assert!(matches!(
        parts[parts.len() - 2],
        GenerationPart::TextEnd { .. }
    ));
}

#[tokio::test]
async fn multiple_tool_roundtrips_keep_segment_ids_fresh() {
    let lines = ScenarioBuilder::new()
        .assistant_text(&["first"])
        .tool_request("c1", "shell", json!({}))
        .tool_response("c1", json!([{"type": "text", "text": "ok"}]), false)
        .assistant_text(&["second"])
        .complete(9)
        .build();

    let parts = collect_parts(GenerationStream::from_lines(lines, Audience::User)).await;

    let starts: Vec<&str> = parts
        .iter()
        .filter_map(|p| match p {
            GenerationPart::TextStart { id } => Some(id.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(starts, vec!["text-0", "text-1"]);

    let ends = parts
        .iter()
        .filter(|p| matches!(p, GenerationPart::TextEnd { .. }))
        .count();
    assert_eq!(ends, 2, "every opened segment closes exactly once");
}
