use router_protocol::{RouterError, ServerConfig};
use std::collections::HashMap;
use std::path::Path;

/// Top-level shape of the servers-config JSON: `{"mcpServers": {name: ServerConfig}}`.
#[derive(Debug, serde::Deserialize)]
struct ServersFile {
    #[serde(rename = "mcpServers")]
    mcp_servers: HashMap<String, RawServerConfig>,
}

/// `ServerConfig` minus `name`, which comes from the map key instead of the
/// record itself.
#[derive(Debug, serde::Deserialize)]
struct RawServerConfig {
    command: String,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default)]
    env: HashMap<String, String>,
    #[serde(default = "default_timeout_seconds")]
    timeout_seconds: u64,
    #[serde(default)]
    hints: Vec<String>,
    #[serde(default)]
    blocked_tools: std::collections::HashSet<String>,
    #[serde(default)]
    ignore: bool,
    #[serde(default)]
    overwrite: bool,
}

const fn default_timeout_seconds() -> u64 {
    30
}

/// Parses and shallow-validates the servers-config file: structural JSON
/// errors are rejected, and a duplicate server name simply collapses to
/// its last occurrence, since the source is a JSON object keyed by name.
pub async fn load_servers_config(path: &Path) -> Result<Vec<ServerConfig>, RouterError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|err| RouterError::ConfigError(format!("reading {}: {err}", path.display())))?;

    let parsed: ServersFile = serde_json::from_str(&raw)
        .map_err(|err| RouterError::ConfigError(format!("parsing {}: {err}", path.display())))?;

    let mut configs = Vec::with_capacity(parsed.mcp_servers.len());
    for (name, raw) in parsed.mcp_servers {
        configs.push(ServerConfig {
            name,
            command: raw.command,
            args: raw.args,
            env: raw.env,
            timeout_seconds: raw.timeout_seconds,
            hints: raw.hints,
            blocked_tools: raw.blocked_tools,
            ignore: raw.ignore,
            overwrite: raw.overwrite,
        });
    }
    Ok(configs)
}

/// Environment-variable table read by both the `index` and `serve` subcommands.
pub struct RuntimeEnv {
    pub qdrant_storage_path: String,
    pub content_storage_path: String,
    pub max_result_tokens: usize,
    pub dimensions: usize,
    pub describe_images: bool,
}

impl RuntimeEnv {
    pub fn from_env() -> Result<Self, RouterError> {
        let qdrant_storage_path = std::env::var("QDRANT_STORAGE_PATH").ok();
        if qdrant_storage_path.is_none() && std::env::var("QDRANT_URL").is_ok() {
            log::warn!(
                "QDRANT_URL is set but this build only supports the in-process vector store; \
                 set QDRANT_STORAGE_PATH to a snapshot file path instead"
            );
        }
        let qdrant_storage_path = qdrant_storage_path.ok_or_else(|| {
            RouterError::ConfigError(
                "QDRANT_STORAGE_PATH is required (QDRANT_URL is not supported by this build)"
                    .to_string(),
            )
        })?;

        let content_storage_path = std::env::var("CONTENT_STORAGE_PATH").map_err(|_| {
            RouterError::ConfigError("CONTENT_STORAGE_PATH is required".to_string())
        })?;

        let max_result_tokens = env_usize("MAX_RESULT_TOKENS", router_protocol::DEFAULT_MAX_RESULT_TOKENS)?;
        let dimensions = env_usize("DIMENSIONS", router_protocol::DEFAULT_DIMENSIONS)?;
        let describe_images = std::env::var("DESCRIBE_IMAGES")
            .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
            .unwrap_or(true);

        Ok(Self {
            qdrant_storage_path,
            content_storage_path,
            max_result_tokens,
            dimensions,
            describe_images,
        })
    }
}

fn env_usize(var: &str, default: usize) -> Result<usize, RouterError> {
    match std::env::var(var) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| RouterError::ConfigError(format!("{var} must be a positive integer, got {raw:?}"))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn loads_servers_config_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("servers.json");
        tokio::fs::write(
            &path,
            r#"{"mcpServers": {"fs": {"command": "fs-mcp", "hints": ["filesystem"]}}}"#,
        )
        .await
        .unwrap();

        let configs = load_servers_config(&path).await.unwrap();
        assert_eq!(configs.len(), 1);
        assert_eq!(configs[0].name, "fs");
        assert_eq!(configs[0].command, "fs-mcp");
        assert_eq!(configs[0].timeout_seconds, 30);
        assert_eq!(configs[0].hints, vec!["filesystem".to_string()]);
    }

    #[tokio::test]
    async fn rejects_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("servers.json");
        tokio::fs::write(&path, "not json").await.unwrap();

        let err = load_servers_config(&path).await.unwrap_err();
        assert_eq!(err.kind(), "CONFIG_ERROR");
    }
}
