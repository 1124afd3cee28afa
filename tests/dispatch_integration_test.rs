// Integration test for the full dispatch flow
//
// Builds the real dispatcher (file tools against a scratch directory,
// mail and calendar against a scratch token path) and drives it the way
// the conversation engine does: a JSON batch in, a JSON batch out.

use serde_json::json;

use attache::build_dispatcher;
use attache::config::Config;
use attache::tools::{catalog, definitions, ToolCallRequest};

fn scratch_config(dir: &tempfile::TempDir) -> Config {
    let mut config = Config::new(dir.path().to_path_buf());
    // Point at a token that does not exist: mail/calendar calls must
    // surface auth errors, not panics
    config.token_path = dir.path().join("token.json");
    config
}

#[test]
fn test_advertised_catalog_is_stable_and_complete() {
    let first = serde_json::to_value(definitions()).unwrap();
    let second = serde_json::to_value(definitions()).unwrap();
    assert_eq!(first, second);

    let names: Vec<&str> = catalog().iter().map(|s| s.name).collect();
    for expected in [
        "read_file",
        "write_file",
        "list_files",
        "list_emails",
        "send_email",
        "read_email",
        "delete_email",
        "list_calendars",
        "list_events",
        "create_event",
        "update_event",
        "delete_event",
        "get_event",
        "create_calendar",
        "delete_calendar",
    ] {
        assert!(names.contains(&expected), "catalog missing {}", expected);
    }

    for def in serde_json::to_value(definitions()).unwrap().as_array().unwrap() {
        assert_eq!(def["input_schema"]["type"], "object");
        assert_eq!(def["input_schema"]["additionalProperties"], false);
    }
}

#[tokio::test]
async fn test_file_tools_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let dispatcher = build_dispatcher(&scratch_config(&dir)).unwrap();

    let requests = vec![
        ToolCallRequest {
            call_id: "toolu_write".to_string(),
            tool_name: "write_file".to_string(),
            arguments: json!({"file_path": "todo.txt", "content": "buy milk"}),
        },
        ToolCallRequest {
            call_id: "toolu_read".to_string(),
            tool_name: "read_file".to_string(),
            arguments: json!({"file_path": "todo.txt"}),
        },
        ToolCallRequest {
            call_id: "toolu_list".to_string(),
            tool_name: "list_files".to_string(),
            arguments: json!({}),
        },
    ];

    let results = dispatcher.dispatch(&requests).await;

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].call_id, "toolu_write");
    assert_eq!(results[1].call_id, "toolu_read");
    assert_eq!(results[2].call_id, "toolu_list");
    assert!(!results[0].is_error());
    assert_eq!(results[1].output, "buy milk");
    assert_eq!(results[2].output, "todo.txt");
}

#[tokio::test]
async fn test_mixed_batch_isolates_failures() {
    let dir = tempfile::tempdir().unwrap();
    let dispatcher = build_dispatcher(&scratch_config(&dir)).unwrap();

    let requests = vec![
        // Unknown tool
        ToolCallRequest {
            call_id: "toolu_1".to_string(),
            tool_name: "teleport".to_string(),
            arguments: json!({}),
        },
        // Validation failure
        ToolCallRequest {
            call_id: "toolu_2".to_string(),
            tool_name: "send_email".to_string(),
            arguments: json!({"to": "a@example.com"}),
        },
        // Auth failure (no token file exists)
        ToolCallRequest {
            call_id: "toolu_3".to_string(),
            tool_name: "list_calendars".to_string(),
            arguments: json!({}),
        },
        // Success
        ToolCallRequest {
            call_id: "toolu_4".to_string(),
            tool_name: "list_files".to_string(),
            arguments: json!({}),
        },
    ];

    let results = dispatcher.dispatch(&requests).await;

    assert_eq!(results.len(), 4);
    let ids: Vec<&str> = results.iter().map(|r| r.call_id.as_str()).collect();
    assert_eq!(ids, vec!["toolu_1", "toolu_2", "toolu_3", "toolu_4"]);

    assert!(results[0].output.contains("unrecognized tool 'teleport'"));
    assert!(results[1].output.contains("missing required parameter"));
    assert!(results[2].output.contains("authentication failed"));
    assert!(!results[3].is_error());
    assert_eq!(results[3].output, "(working directory is empty)");
}

#[tokio::test]
async fn test_path_escape_is_contained() {
    let dir = tempfile::tempdir().unwrap();
    let dispatcher = build_dispatcher(&scratch_config(&dir)).unwrap();

    let requests = vec![ToolCallRequest {
        call_id: "toolu_esc".to_string(),
        tool_name: "read_file".to_string(),
        arguments: json!({"file_path": "../../etc/passwd"}),
    }];

    let results = dispatcher.dispatch(&requests).await;
    assert!(results[0].is_error());
    assert!(results[0].output.contains("outside the working directory"));
}

#[test]
fn test_requests_round_trip_through_json() {
    // The exact boundary shape the conversation driver speaks
    let input = r#"[
        {"call_id": "toolu_a", "tool_name": "list_events", "arguments": {}},
        {"call_id": "toolu_b", "tool_name": "read_file", "arguments": {"file_path": "x"}}
    ]"#;
    let requests: Vec<ToolCallRequest> = serde_json::from_str(input).unwrap();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].arguments["file_path"], "x");
}
