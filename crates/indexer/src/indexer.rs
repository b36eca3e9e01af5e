use crate::doc::build_description_document;
use crate::error::Result;
use crate::stats::IndexStats;
use router_mcp_client::MCPClient;
use router_protocol::{tool_id, ServerConfig, ToolRecord};
use router_providers::{Describer, Embedder};
use router_vector_index::{VectorFilter, VectorStore};
use std::collections::HashSet;

/// Builds the tool catalog: one pass per configured server, each
/// producing `ToolRecord`s upserted into the [`VectorStore`].
pub struct Indexer<'a> {
    pub vector_index: &'a dyn VectorStore,
    pub embedder: &'a dyn Embedder,
    pub describer: Option<&'a dyn Describer>,
}

impl<'a> Indexer<'a> {
    #[must_use]
    pub fn new(
        vector_index: &'a dyn VectorStore,
        embedder: &'a dyn Embedder,
        describer: Option<&'a dyn Describer>,
    ) -> Self {
        Self {
            vector_index,
            embedder,
            describer,
        }
    }

    pub async fn index(&self, configs: &[ServerConfig], force: bool) -> Result<IndexStats> {
        let mut stats = IndexStats::new();

        for config in configs {
            if config.ignore {
                stats.servers_skipped += 1;
                continue;
            }

            let existing = self
                .vector_index
                .scroll(&VectorFilter {
                    server_name: Some(config.name.clone()),
                    blocked: None,
                })
                .await?;

            if !existing.is_empty() && !config.overwrite && !force {
                stats.servers_skipped += 1;
                continue;
            }

            match self.index_server(config, &existing, &mut stats).await {
                Ok(()) => stats.servers_indexed += 1,
                Err(err) => {
                    stats.add_error(&config.name, &err);
                }
            }
        }

        Ok(stats)
    }

    async fn index_server(
        &self,
        config: &ServerConfig,
        existing: &[ToolRecord],
        stats: &mut IndexStats,
    ) -> Result<()> {
        let client = MCPClient::start(config, |_, _| {}).await?;
        let upstream_tools = client.list_tools().await?;
        client.shutdown().await;

        let mut seen_tool_names: HashSet<String> = HashSet::new();

        for tool in &upstream_tools {
            seen_tool_names.insert(tool.name.to_string());

            let input_schema = serde_json::to_value(tool.input_schema.as_ref())
                .unwrap_or_else(|_| serde_json::json!({}));
            let raw_description = tool.description.as_deref().unwrap_or("");

            let document =
                build_description_document(config, &tool.name, raw_description, &input_schema);

            let enriched_description = match self.describer {
                Some(describer) => match describer.describe(&document).await {
                    Ok(description) => description,
                    Err(err) => {
                        log::warn!(
                            "describer unavailable for '{}::{}', falling back to raw document: {err}",
                            config.name,
                            tool.name
                        );
                        stats.describer_fallbacks += 1;
                        document.clone()
                    }
                },
                None => document.clone(),
            };

            let mut embedding_vector = self.embedder.embed(&enriched_description).await?;
            embedding_vector.truncate(self.embedder.dimensions());

            let record = ToolRecord {
                tool_id: tool_id(&config.name, &tool.name),
                server_name: config.name.clone(),
                tool_name: tool.name.to_string(),
                original_description: raw_description.to_string(),
                input_schema,
                enriched_description,
                embedding_vector,
                blocked: config.is_blocked(&tool.name),
            };

            self.vector_index.upsert(record).await?;
            stats.tools_upserted += 1;
        }

        if config.overwrite {
            self.prune_stale(config, existing, &seen_tool_names, stats).await?;
        }

        Ok(())
    }

    async fn prune_stale(
        &self,
        config: &ServerConfig,
        existing: &[ToolRecord],
        seen_tool_names: &HashSet<String>,
        stats: &mut IndexStats,
    ) -> Result<()> {
        let stale_ids: Vec<&str> = existing
            .iter()
            .filter(|r| !seen_tool_names.contains(&r.tool_name))
            .map(|r| r.tool_id.as_str())
            .collect();
        if stale_ids.is_empty() {
            return Ok(());
        }
        log::info!(
            "removing {} tool(s) no longer offered by '{}'",
            stale_ids.len(),
            config.name
        );
        for tool_id in stale_ids {
            self.vector_index.delete(tool_id).await?;
            stats.tools_deleted += 1;
        }
        Ok(())
    }
}
