//! Typed configuration, per the configuration contract.
//!
//! The loader that turns a file on disk (or CLI flags) into a `Config` is
//! an external collaborator and out of scope here; this module only owns
//! the parsed shape and its defaults, plus a minimal `key=value` parser
//! good enough for tests and for embedding callers that don't want to
//! bring their own.

use std::collections::BTreeMap;

/// Parsed `biocache-index` configuration. Unknown keys are ignored.
#[derive(Debug, Clone)]
pub struct Config {
    /// `solr.home` — required; path to the embedded core, or base URL for
    /// remote/cluster modes.
    pub solr_home: String,
    /// `solr.batch.size`
    pub batch_size: usize,
    /// `solr.hardcommit.size`
    pub hard_commit_size: usize,
    /// `exclude.sensitive.values`
    pub exclude_sensitive_values: Vec<String>,
    /// `extra.misc.fields`
    pub extra_misc_fields: Vec<String>,
    /// `sample.fields`
    pub sample_fields: Vec<String>,
    /// `gridRefIndexingEnabled`
    pub grid_ref_indexing_enabled: bool,
}

pub const DEFAULT_BATCH_SIZE: usize = 500;
pub const DEFAULT_HARD_COMMIT_SIZE: usize = 5000;
pub const FACET_PAGE_SIZE: usize = 1000;
pub const INDEX_READ_PAGE_SIZE: usize = 5000;
pub const WRITE_FIELD_PAGE_SIZE: usize = 100;

impl Default for Config {
    fn default() -> Self {
        Config {
            solr_home: String::new(),
            batch_size: DEFAULT_BATCH_SIZE,
            hard_commit_size: DEFAULT_HARD_COMMIT_SIZE,
            exclude_sensitive_values: Vec::new(),
            extra_misc_fields: Vec::new(),
            sample_fields: Vec::new(),
            grid_ref_indexing_enabled: false,
        }
    }
}

impl Config {
    /// Parses a `key=value`-per-line properties blob. Blank lines and
    /// lines starting with `#` are ignored. Unknown keys are ignored.
    pub fn from_str(input: &str) -> Config {
        let mut raw = BTreeMap::new();
        for line in input.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((k, v)) = line.split_once('=') {
                raw.insert(k.trim().to_string(), v.trim().to_string());
            }
        }

        let mut config = Config::default();
        if let Some(v) = raw.get("solr.home") {
            config.solr_home = v.clone();
        }
        if let Some(v) = raw.get("solr.batch.size").and_then(|v| v.parse().ok()) {
            config.batch_size = v;
        }
        if let Some(v) = raw
            .get("solr.hardcommit.size")
            .and_then(|v| v.parse().ok())
        {
            config.hard_commit_size = v;
        }
        if let Some(v) = raw.get("exclude.sensitive.values") {
            config.exclude_sensitive_values = split_csv(v);
        }
        if let Some(v) = raw.get("extra.misc.fields") {
            config.extra_misc_fields = split_csv(v);
        }
        if let Some(v) = raw.get("sample.fields") {
            config.sample_fields = split_csv(v);
        }
        if let Some(v) = raw.get("gridRefIndexingEnabled") {
            config.grid_ref_indexing_enabled = v == "true";
        }
        config
    }
}

fn split_csv(v: &str) -> Vec<String> {
    v.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let config = Config::default();
        assert_eq!(config.batch_size, 500);
        assert_eq!(config.hard_commit_size, 5000);
        assert!(!config.grid_ref_indexing_enabled);
    }

    #[test]
    fn parses_known_keys_and_ignores_unknown() {
        let config = Config::from_str(
            "solr.home=/var/solr\n\
             solr.batch.size=250\n\
             some.unknown.key=whatever\n\
             gridRefIndexingEnabled=true\n\
             extra.misc.fields = a, b ,c\n",
        );
        assert_eq!(config.solr_home, "/var/solr");
        assert_eq!(config.batch_size, 250);
        assert_eq!(config.hard_commit_size, 5000);
        assert!(config.grid_ref_indexing_enabled);
        assert_eq!(config.extra_misc_fields, vec!["a", "b", "c"]);
    }
}
