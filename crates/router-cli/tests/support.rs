use anyhow::{Context, Result};
use std::path::PathBuf;

pub fn locate_semantic_router_bin() -> Result<PathBuf> {
    if let Some(path) = option_env!("CARGO_BIN_EXE_semantic-router") {
        return Ok(PathBuf::from(path));
    }
    locate_in_target_dir("semantic-router")
}

pub fn locate_fixture_bin() -> Result<PathBuf> {
    if let Some(path) = option_env!("CARGO_BIN_EXE_fixture-mcp-server") {
        return Ok(PathBuf::from(path));
    }
    locate_in_target_dir("fixture-mcp-server")
}

fn locate_in_target_dir(name: &str) -> Result<PathBuf> {
    // CARGO_BIN_EXE_* isn't always visible at runtime. Derive it from the
    // test exe path instead: `.../target/{debug|release}/deps/<test>` ->
    // `.../target/{debug|release}/<name>`.
    if let Ok(exe) = std::env::current_exe() {
        if let Some(target_profile_dir) = exe.parent().and_then(|p| p.parent()) {
            let candidate = target_profile_dir.join(name);
            if candidate.exists() {
                return Ok(candidate);
            }
        }
    }

    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let repo_root = manifest_dir
        .ancestors()
        .nth(2)
        .context("failed to resolve repo root from CARGO_MANIFEST_DIR")?;
    for rel in [format!("target/debug/{name}"), format!("target/release/{name}")] {
        let candidate = repo_root.join(rel);
        if candidate.exists() {
            return Ok(candidate);
        }
    }

    anyhow::bail!("failed to locate {name} binary")
}
