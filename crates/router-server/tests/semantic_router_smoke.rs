mod support;

use router_protocol::RouterError;
use router_server::RouterService;
use router_task_pool::TaskPool;
use std::sync::Arc;
use std::time::Duration;
use support::{fixture_config, seed_tool_record, test_harness, FixedEmbedder};

const POLL_INTERVAL: Duration = Duration::from_millis(10);
const POLL_TIMEOUT: Duration = Duration::from_secs(10);

async fn poll_until_terminal(task_pool: &TaskPool, task_id: &str) -> router_protocol::Task {
    tokio::time::timeout(POLL_TIMEOUT, async {
        loop {
            let task = task_pool.poll(task_id).await.expect("task exists");
            if task.status.is_terminal() {
                return task;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    })
    .await
    .expect("task reached a terminal status before the test timeout")
}

fn router(
    configs: std::collections::HashMap<String, router_protocol::ServerConfig>,
    vector_index: Arc<router_vector_index::InProcessVectorStore>,
    supervisor: Arc<router_supervisor::ServerSupervisor>,
    task_pool: Arc<TaskPool>,
    content_store: Arc<router_content_store::ContentStore>,
) -> RouterService {
    RouterService::new(
        configs,
        vector_index,
        Arc::new(FixedEmbedder(vec![1.0, 0.0])),
        supervisor,
        task_pool,
        content_store,
    )
}

/// A tool the router has never touched starts its upstream process on the
/// first `execute_tool` call rather than requiring an explicit `manage_server`
/// start, and the call against it succeeds end to end through the real
/// fixture child process.
#[tokio::test]
async fn lazy_start_then_execute_runs_against_a_real_upstream_process() {
    let config = fixture_config("fixture", &[]).unwrap();
    let (configs, vector_index, supervisor, task_pool, content_store, _dir) =
        test_harness(vec![config], 5_000).await.unwrap();
    seed_tool_record(&vector_index, "fixture", "echo", false, vec![1.0, 0.0])
        .await
        .unwrap();

    let svc = router(configs, vector_index, supervisor.clone(), task_pool, content_store);

    assert!(supervisor.list_running().await.is_empty());

    let value = svc
        .dispatch_value(serde_json::json!({
            "operation": "execute_tool",
            "server_name": "fixture",
            "tool_name": "echo",
            "arguments": { "text": "hi there" },
        }))
        .await
        .expect("execute_tool should succeed");

    assert_eq!(value["parts"][0]["type"], "inline_text");
    assert_eq!(value["parts"][0]["text"], "hi there");

    let running = supervisor.list_running().await;
    assert_eq!(running.len(), 1, "fixture server should now be running");
    assert_eq!(running[0].server_name, "fixture");
}

/// A blocked tool is rejected before the upstream server is ever contacted,
/// regardless of whether the tool actually exists there.
#[tokio::test]
async fn blocked_tool_execution_is_rejected_without_starting_the_server() {
    let config = fixture_config("fixture", &["crash"]).unwrap();
    let (configs, vector_index, supervisor, task_pool, content_store, _dir) =
        test_harness(vec![config], 5_000).await.unwrap();
    seed_tool_record(&vector_index, "fixture", "crash", true, vec![1.0, 0.0])
        .await
        .unwrap();

    let svc = router(configs, vector_index, supervisor.clone(), task_pool, content_store);

    let err = svc
        .dispatch_value(serde_json::json!({
            "operation": "execute_tool",
            "server_name": "fixture",
            "tool_name": "crash",
            "arguments": {},
        }))
        .await
        .expect_err("blocked tool must not execute");

    assert!(matches!(err, RouterError::Blocked { .. }));
    assert!(supervisor.list_running().await.is_empty(), "blocked call must never start the server");
}

/// A result too large to inline is chunked into the content store, and the
/// full payload is recoverable chunk-by-chunk via `get_content`.
#[tokio::test]
async fn oversized_result_round_trips_through_get_content() {
    let config = fixture_config("fixture", &[]).unwrap();
    // A tiny budget forces even a short echoed string to offload.
    let (configs, vector_index, supervisor, task_pool, content_store, _dir) =
        test_harness(vec![config], 5).await.unwrap();
    seed_tool_record(&vector_index, "fixture", "echo", false, vec![1.0, 0.0])
        .await
        .unwrap();

    let svc = router(configs, vector_index, supervisor, task_pool, content_store);

    let big_text = "word ".repeat(2_000);
    let value = svc
        .dispatch_value(serde_json::json!({
            "operation": "execute_tool",
            "server_name": "fixture",
            "tool_name": "echo",
            "arguments": { "text": big_text.clone() },
        }))
        .await
        .expect("execute_tool should succeed");

    let part = &value["parts"][0];
    assert_eq!(part["type"], "content_ref_preview");
    let ref_id = part["ref_id"].as_str().unwrap().to_string();
    let total_chunks = part["total_chunks"].as_u64().unwrap() as usize;
    assert!(total_chunks > 1, "expected the echoed text to need more than one chunk");

    let mut reassembled = String::new();
    for chunk_index in 0..total_chunks {
        let chunk_value = svc
            .dispatch_value(serde_json::json!({
                "operation": "get_content",
                "ref_id": ref_id,
                "chunk_index": chunk_index,
            }))
            .await
            .expect("get_content should succeed");
        reassembled.push_str(chunk_value["chunk"]["text"].as_str().unwrap());
    }
    assert_eq!(reassembled, big_text);
}

/// A background task whose upstream server crashes mid-call surfaces its
/// failure through `poll_task_result` with the same `ERROR:<kind>:` shape a
/// synchronous failure gets, rather than a bare, unprefixed message.
#[tokio::test]
async fn background_crash_is_reported_with_a_prefixed_error_kind() {
    let config = fixture_config("fixture", &[]).unwrap();
    let (configs, vector_index, supervisor, task_pool, content_store, _dir) =
        test_harness(vec![config], 5_000).await.unwrap();
    seed_tool_record(&vector_index, "fixture", "crash", false, vec![1.0, 0.0])
        .await
        .unwrap();
    let _workers = task_pool.spawn_workers(1);

    let svc = router(configs, vector_index, supervisor, task_pool.clone(), content_store);

    let value = svc
        .dispatch_value(serde_json::json!({
            "operation": "execute_tool",
            "server_name": "fixture",
            "tool_name": "crash",
            "arguments": {},
            "in_background": true,
        }))
        .await
        .expect("submitting a background task should succeed");
    let task_id = value["task_id"].as_str().unwrap().to_string();

    let task = poll_until_terminal(&task_pool, &task_id).await;
    assert_eq!(task.status, router_protocol::TaskStatus::Failed);
    let error = task.error.expect("failed task must carry an error message");
    assert!(error.starts_with("ERROR:"), "error must carry the ERROR:<kind>: prefix, got: {error}");
    assert!(
        error.starts_with("ERROR:SERVER_CRASHED:") || error.starts_with("ERROR:PROTOCOL_ERROR:"),
        "expected the dead child process to classify as a crash or protocol failure, got: {error}"
    );
}

/// With a single worker, a higher-priority task queued after a lower-priority
/// one still runs first once the worker frees up.
#[tokio::test]
async fn higher_priority_background_task_runs_before_a_lower_priority_one() {
    let config = fixture_config("fixture", &[]).unwrap();
    let (_configs, vector_index, _supervisor, task_pool, _content_store, _dir) =
        test_harness(vec![config], 5_000).await.unwrap();
    seed_tool_record(&vector_index, "fixture", "sleep_echo", false, vec![1.0, 0.0])
        .await
        .unwrap();
    let _workers = task_pool.spawn_workers(1);

    let occupying_task = task_pool
        .submit(
            "fixture".into(),
            "sleep_echo".into(),
            serde_json::json!({ "text": "first", "delay_ms": 200 }),
            0,
        )
        .await
        .unwrap();

    // Give the single worker a chance to pick up `occupying_task` before the
    // next two are queued behind it.
    tokio::time::sleep(Duration::from_millis(30)).await;

    let low_priority = task_pool
        .submit(
            "fixture".into(),
            "sleep_echo".into(),
            serde_json::json!({ "text": "low", "delay_ms": 5 }),
            0,
        )
        .await
        .unwrap();
    let high_priority = task_pool
        .submit(
            "fixture".into(),
            "sleep_echo".into(),
            serde_json::json!({ "text": "high", "delay_ms": 5 }),
            10,
        )
        .await
        .unwrap();

    poll_until_terminal(&task_pool, &occupying_task).await;

    let deadline = tokio::time::Instant::now() + POLL_TIMEOUT;
    let mut finish_order = Vec::new();
    while finish_order.len() < 2 && tokio::time::Instant::now() < deadline {
        for (label, id) in [("high", &high_priority), ("low", &low_priority)] {
            if finish_order.contains(&label) {
                continue;
            }
            let task = task_pool.poll(id).await.unwrap();
            if task.status.is_terminal() {
                finish_order.push(label);
            }
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }

    assert_eq!(finish_order, vec!["high", "low"], "higher priority task should finish first");
}
