/// Summary of one `index()` run, returned to the CLI for its exit-code
/// decision and surfaced in logs.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct IndexStats {
    pub servers_indexed: usize,
    pub servers_skipped: usize,
    pub tools_upserted: usize,
    pub tools_deleted: usize,
    pub describer_fallbacks: usize,
    pub errors: Vec<String>,
}

impl IndexStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, server_name: &str, error: impl std::fmt::Display) {
        self.errors.push(format!("{server_name}: {error}"));
    }

    #[must_use]
    pub fn had_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}
