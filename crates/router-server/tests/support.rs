use anyhow::{Context, Result};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use router_content_store::ContentStore;
use router_protocol::ServerConfig;
use router_providers::{Embedder, ProviderError};
use router_supervisor::ServerSupervisor;
use router_task_pool::TaskPool;
use router_vector_index::InProcessVectorStore;

pub fn locate_fixture_bin() -> Result<PathBuf> {
    if let Some(path) = option_env!("CARGO_BIN_EXE_fixture-mcp-server") {
        return Ok(PathBuf::from(path));
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(target_profile_dir) = exe.parent().and_then(|p| p.parent()) {
            let candidate = target_profile_dir.join("fixture-mcp-server");
            if candidate.exists() {
                return Ok(candidate);
            }
        }
    }

    anyhow::bail!("failed to locate fixture-mcp-server binary")
}

pub fn fixture_config(name: &str, blocked_tools: &[&str]) -> Result<ServerConfig> {
    Ok(ServerConfig {
        name: name.to_string(),
        command: locate_fixture_bin()?.to_string_lossy().into_owned(),
        args: Vec::new(),
        env: HashMap::new(),
        timeout_seconds: 10,
        hints: vec!["test fixture".to_string()],
        blocked_tools: blocked_tools.iter().map(|s| s.to_string()).collect(),
        ignore: false,
        overwrite: false,
    })
}

/// Embedder that always returns the fixed vector handed to it at
/// construction, so tests don't need a real embedding provider to drive
/// `search_tools`.
pub struct FixedEmbedder(pub Vec<f32>);

#[async_trait::async_trait]
impl Embedder for FixedEmbedder {
    async fn embed(&self, _text: &str) -> std::result::Result<Vec<f32>, ProviderError> {
        Ok(self.0.clone())
    }

    fn dimensions(&self) -> usize {
        self.0.len()
    }
}

/// Indexes one `ToolRecord` per fixture tool directly into the vector
/// store, bypassing `router-indexer` so tests don't depend on a live
/// embedding provider.
pub async fn seed_tool_record(
    vector_index: &InProcessVectorStore,
    server_name: &str,
    tool_name: &str,
    blocked: bool,
    embedding_vector: Vec<f32>,
) -> Result<()> {
    use router_protocol::{tool_id, ToolRecord};
    use router_vector_index::VectorStore;

    vector_index
        .upsert(ToolRecord {
            tool_id: tool_id(server_name, tool_name),
            server_name: server_name.to_string(),
            tool_name: tool_name.to_string(),
            original_description: format!("{tool_name} fixture tool"),
            input_schema: serde_json::json!({}),
            enriched_description: format!("{tool_name} fixture tool"),
            embedding_vector,
            blocked,
        })
        .await
        .context("seed tool record")?;
    Ok(())
}

pub async fn test_harness(
    configs: Vec<ServerConfig>,
    max_result_tokens: usize,
) -> Result<(
    HashMap<String, ServerConfig>,
    Arc<InProcessVectorStore>,
    Arc<ServerSupervisor>,
    Arc<TaskPool>,
    Arc<ContentStore>,
    tempfile::TempDir,
)> {
    let dir = tempfile::tempdir().context("tempdir")?;
    let content_store = Arc::new(
        ContentStore::with_max_result_tokens(dir.path(), max_result_tokens)
            .await
            .context("content store")?,
    );
    let supervisor = Arc::new(ServerSupervisor::new(configs.clone()));
    let task_pool = Arc::new(TaskPool::new(supervisor.clone(), content_store.clone(), None, false));
    let vector_index = Arc::new(InProcessVectorStore::new(2));
    let config_map = configs.into_iter().map(|c| (c.name.clone(), c)).collect();
    Ok((config_map, vector_index, supervisor, task_pool, content_store, dir))
}

#[allow(dead_code)]
pub fn blocked_set(names: &[&str]) -> HashSet<String> {
    names.iter().map(|s| s.to_string()).collect()
}
