use router_protocol::ServerConfig;

/// Concatenates server context, tool purpose, and a parameter-by-parameter
/// summary of the tool's input schema into the raw document the Describer
/// polishes (or that is used as-is if the Describer is unavailable).
pub fn build_description_document(
    config: &ServerConfig,
    tool_name: &str,
    tool_description: &str,
    input_schema: &serde_json::Value,
) -> String {
    let mut doc = String::new();
    doc.push_str("Server: ");
    doc.push_str(&config.name);
    doc.push('\n');

    if !config.hints.is_empty() {
        doc.push_str("Server hints: ");
        doc.push_str(&config.hints.join("; "));
        doc.push('\n');
    }

    doc.push_str("Tool: ");
    doc.push_str(tool_name);
    doc.push('\n');
    doc.push_str("Description: ");
    doc.push_str(tool_description);
    doc.push('\n');

    let params = summarize_parameters(input_schema);
    if !params.is_empty() {
        doc.push_str("Parameters:\n");
        for line in params {
            doc.push_str("- ");
            doc.push_str(&line);
            doc.push('\n');
        }
    }

    doc
}

fn summarize_parameters(input_schema: &serde_json::Value) -> Vec<String> {
    let Some(properties) = input_schema.get("properties").and_then(|v| v.as_object()) else {
        return Vec::new();
    };
    let required: Vec<&str> = input_schema
        .get("required")
        .and_then(|v| v.as_array())
        .map(|arr| arr.iter().filter_map(|v| v.as_str()).collect())
        .unwrap_or_default();

    properties
        .iter()
        .map(|(name, schema)| {
            let ty = schema.get("type").and_then(|v| v.as_str()).unwrap_or("any");
            let description = schema.get("description").and_then(|v| v.as_str()).unwrap_or("");
            let marker = if required.contains(&name.as_str()) {
                "required"
            } else {
                "optional"
            };
            if description.is_empty() {
                format!("{name} ({ty}, {marker})")
            } else {
                format!("{name} ({ty}, {marker}): {description}")
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};

    fn config() -> ServerConfig {
        ServerConfig {
            name: "filesystem".to_string(),
            command: "fs-mcp".to_string(),
            args: Vec::new(),
            env: HashMap::new(),
            timeout_seconds: 30,
            hints: vec!["sandboxed to /workspace".to_string()],
            blocked_tools: HashSet::new(),
            ignore: false,
            overwrite: false,
        }
    }

    #[test]
    fn document_includes_server_hints_and_parameters() {
        let schema = serde_json::json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "file to read" },
                "encoding": { "type": "string" }
            },
            "required": ["path"]
        });
        let doc = build_description_document(&config(), "read_file", "Reads a file", &schema);
        assert!(doc.contains("Server: filesystem"));
        assert!(doc.contains("sandboxed to /workspace"));
        assert!(doc.contains("path (string, required): file to read"));
        assert!(doc.contains("encoding (string, optional)"));
    }

    #[test]
    fn document_omits_parameters_section_when_schema_has_none() {
        let doc = build_description_document(&config(), "ping", "Pings the server", &serde_json::json!({}));
        assert!(!doc.contains("Parameters:"));
    }
}
