// Tool dispatcher
//
// Routes tool-call requests to bound operations: resolve, normalize,
// invoke, wrap. One result per request, input order preserved, and no
// failure crosses the boundary as anything but a result payload.

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use crate::error::DispatchError;
use crate::tools::catalog;
use crate::tools::normalize::normalize;
use crate::tools::registry::Registry;
use crate::tools::types::{ToolCallRequest, ToolCallResult};

pub struct Dispatcher {
    registry: Registry,
}

impl Dispatcher {
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }

    /// Dispatch a batch of tool-call requests from one conversation turn.
    ///
    /// Returns exactly one result per request, in request order. Requests
    /// are independent: a failing request yields an error payload without
    /// affecting its siblings.
    #[instrument(skip_all, fields(count = requests.len()))]
    pub async fn dispatch(&self, requests: &[ToolCallRequest]) -> Vec<ToolCallResult> {
        info!("Dispatching {} tool call(s)", requests.len());

        let mut results = Vec::with_capacity(requests.len());
        for request in requests {
            let output = match self.run_one(request).await {
                Ok(output) => output,
                Err(err) => {
                    warn!(tool = %request.tool_name, "Tool call failed: {}", err);
                    err.into_output()
                }
            };
            results.push(ToolCallResult::new(request.call_id.clone(), output));
        }
        results
    }

    #[instrument(skip(self, request), fields(tool = %request.tool_name, id = %request.call_id))]
    async fn run_one(&self, request: &ToolCallRequest) -> Result<String, DispatchError> {
        // 1. Resolve. The dispatcher trusts tool_name completely: it is a
        // mechanical router, not a second intent classifier.
        let op = self
            .registry
            .get(&request.tool_name)
            .ok_or_else(|| DispatchError::UnknownTool(request.tool_name.clone()))?;
        let spec = catalog::find(&request.tool_name)
            .ok_or_else(|| DispatchError::UnknownTool(request.tool_name.clone()))?;

        // 2. Normalize against the same descriptors the catalog advertises
        let args = normalize(spec, &request.arguments, Utc::now())?;
        debug!("Normalized arguments: {:?}", args);

        // 3-4. Invoke and wrap
        let output = op.call(&args).await?;
        info!(tool = %request.tool_name, "Tool call succeeded");
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use crate::tools::normalize::Args;
    use crate::tools::registry::Operation;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Records every invocation so tests can prove (non-)invocation
    struct SpyOp {
        calls: Arc<AtomicUsize>,
        seen_args: Arc<Mutex<Vec<Args>>>,
        response: Result<String, String>,
    }

    impl SpyOp {
        fn succeeding(output: &str) -> (Self, Arc<AtomicUsize>, Arc<Mutex<Vec<Args>>>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let seen = Arc::new(Mutex::new(Vec::new()));
            let op = Self {
                calls: calls.clone(),
                seen_args: seen.clone(),
                response: Ok(output.to_string()),
            };
            (op, calls, seen)
        }

        fn failing(message: &str) -> Self {
            Self {
                calls: Arc::new(AtomicUsize::new(0)),
                seen_args: Arc::new(Mutex::new(Vec::new())),
                response: Err(message.to_string()),
            }
        }
    }

    #[async_trait]
    impl Operation for SpyOp {
        async fn call(&self, args: &Args) -> Result<String, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen_args.lock().unwrap().push(args.clone());
            self.response
                .clone()
                .map_err(ProviderError::Operation)
        }
    }

    fn subset(names: &[&'static str]) -> Vec<crate::tools::catalog::ToolSpec> {
        names
            .iter()
            .map(|n| catalog::find(n).unwrap().clone())
            .collect()
    }

    #[tokio::test]
    async fn test_results_match_request_order_and_length() {
        let (op, _, _) = SpyOp::succeeding("files listed");
        let registry = Registry::builder()
            .register("list_files", Box::new(op))
            .finish_against(&subset(&["list_files"]))
            .unwrap();
        let dispatcher = Dispatcher::new(registry);

        let requests = vec![
            ToolCallRequest {
                call_id: "toolu_first".to_string(),
                tool_name: "list_files".to_string(),
                arguments: json!({}),
            },
            ToolCallRequest {
                call_id: "toolu_second".to_string(),
                tool_name: "list_files".to_string(),
                arguments: json!({}),
            },
        ];

        let results = dispatcher.dispatch(&requests).await;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].call_id, "toolu_first");
        assert_eq!(results[1].call_id, "toolu_second");
    }

    #[tokio::test]
    async fn test_unknown_tool_never_invokes_provider() {
        let (op, calls, _) = SpyOp::succeeding("unused");
        let registry = Registry::builder()
            .register("list_files", Box::new(op))
            .finish_against(&subset(&["list_files"]))
            .unwrap();
        let dispatcher = Dispatcher::new(registry);

        let requests = vec![ToolCallRequest {
            call_id: "toolu_x".to_string(),
            tool_name: "summon_dragon".to_string(),
            arguments: json!({}),
        }];

        let results = dispatcher.dispatch(&requests).await;
        assert_eq!(results.len(), 1);
        assert!(results[0].is_error());
        assert!(results[0].output.contains("unrecognized tool 'summon_dragon'"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_validation_failure_never_invokes_provider() {
        let (op, calls, _) = SpyOp::succeeding("unused");
        let registry = Registry::builder()
            .register("create_calendar", Box::new(op))
            .finish_against(&subset(&["create_calendar"]))
            .unwrap();
        let dispatcher = Dispatcher::new(registry);

        let requests = vec![ToolCallRequest {
            call_id: "toolu_x".to_string(),
            tool_name: "create_calendar".to_string(),
            arguments: json!({}),
        }];

        let results = dispatcher.dispatch(&requests).await;
        assert!(results[0].is_error());
        assert!(results[0]
            .output
            .contains("missing required parameter 'summary'"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_list_events_exercises_every_default() {
        let (op, calls, seen) = SpyOp::succeeding("[3 events]");
        let registry = Registry::builder()
            .register("list_events", Box::new(op))
            .finish_against(&subset(&["list_events"]))
            .unwrap();
        let dispatcher = Dispatcher::new(registry);

        let before = Utc::now();
        let requests = vec![ToolCallRequest {
            call_id: "toolu_ev".to_string(),
            tool_name: "list_events".to_string(),
            arguments: json!({}),
        }];
        let results = dispatcher.dispatch(&requests).await;
        let after = Utc::now();

        assert_eq!(results[0].output, "[3 events]");
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let seen = seen.lock().unwrap();
        let args = &seen[0];
        assert_eq!(args["calendar_id"], "primary");
        assert_eq!(args["max_results"], 10);

        let time_min: chrono::DateTime<Utc> =
            args["time_min"].as_str().unwrap().parse().unwrap();
        let time_max: chrono::DateTime<Utc> =
            args["time_max"].as_str().unwrap().parse().unwrap();
        assert!(time_min >= before - chrono::Duration::seconds(1));
        assert!(time_min <= after + chrono::Duration::seconds(1));
        assert_eq!(time_max - time_min, chrono::Duration::days(7));
    }

    #[tokio::test]
    async fn test_failure_isolation_within_batch() {
        let failing = SpyOp::failing("backend exploded");
        let (ok_op, _, _) = SpyOp::succeeding("file contents");
        let registry = Registry::builder()
            .register("list_files", Box::new(failing))
            .register("read_file", Box::new(ok_op))
            .finish_against(&subset(&["list_files", "read_file"]))
            .unwrap();
        let dispatcher = Dispatcher::new(registry);

        let requests = vec![
            ToolCallRequest {
                call_id: "toolu_bad".to_string(),
                tool_name: "list_files".to_string(),
                arguments: json!({}),
            },
            ToolCallRequest {
                call_id: "toolu_good".to_string(),
                tool_name: "read_file".to_string(),
                arguments: json!({"file_path": "notes.txt"}),
            },
        ];

        let results = dispatcher.dispatch(&requests).await;
        assert_eq!(results.len(), 2);
        assert!(results[0].is_error());
        assert!(results[0].output.contains("backend exploded"));
        assert!(!results[1].is_error());
        assert_eq!(results[1].output, "file contents");
    }
}
