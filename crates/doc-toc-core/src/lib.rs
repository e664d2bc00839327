//! Core orchestration layer for doc-toc.

use doc_toc_config::Config;
use doc_toc_ops::Operations;

/// Entry point for higher-level consumers (CLI, site build hooks, etc.).
pub struct DocToc {
    ops: Operations,
}

impl DocToc {
    /// Bootstrap the doc-toc engine from configuration.
    pub fn bootstrap(config: Config) -> Self {
        Self {
            ops: Operations::new(config),
        }
    }

    /// Access the operation bundle.
    pub fn operations(&self) -> &Operations {
        &self.ops
    }

    pub fn config(&self) -> &Config {
        self.ops.config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_toc_test_support::config_with;

    #[test]
    fn bootstrap_exposes_resolved_config() {
        let engine = DocToc::bootstrap(config_with("[headings]\nranks = [\"h1\"]\n"));
        assert_eq!(engine.config().toc.ranks, vec!["h1".to_string()]);
        assert_eq!(engine.operations().config().toc.ranks.len(), 1);
    }
}
