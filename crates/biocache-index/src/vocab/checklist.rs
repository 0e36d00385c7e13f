//! `ChecklistCache`: the set of accepted taxon GUIDs used to drop
//! occurrences of non-accepted names. Backed by a
//! single-column text file, one GUID per line.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Loads the accepted-GUID set exactly once, on first `contains()` call.
/// If the source file is missing or unreadable the cache loads empty and
/// logs at warn — a missing checklist degrades membership checks, it
/// does not abort indexing.
pub struct ChecklistCache {
    path: PathBuf,
    guids: OnceLock<HashSet<String>>,
}

impl ChecklistCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ChecklistCache {
            path: path.into(),
            guids: OnceLock::new(),
        }
    }

    fn ensure_loaded(&self) -> &HashSet<String> {
        self.guids.get_or_init(|| load_guids(&self.path))
    }

    pub fn contains(&self, guid: &str) -> bool {
        self.ensure_loaded().contains(guid)
    }

    pub fn len(&self) -> usize {
        self.ensure_loaded().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn load_guids(path: &Path) -> HashSet<String> {
    match fs::read_to_string(path) {
        Ok(contents) => contents
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect(),
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "failed to load checklist cache");
            HashSet::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_guids_once_on_first_use() {
        let mut file = tempfile_with_contents("urn:lsid:a\nurn:lsid:b\n\n");
        let cache = ChecklistCache::new(file.path_buf());
        assert!(cache.contains("urn:lsid:a"));
        assert!(!cache.contains("urn:lsid:missing"));
        assert_eq!(cache.len(), 2);
        file.close();
    }

    #[test]
    fn missing_file_degrades_to_empty_set() {
        let cache = ChecklistCache::new("/nonexistent/path/does-not-exist.txt");
        assert!(!cache.contains("anything"));
        assert!(cache.is_empty());
    }

    struct TempFile {
        path: PathBuf,
    }

    impl TempFile {
        fn path_buf(&self) -> PathBuf {
            self.path.clone()
        }

        fn close(self) {
            let _ = fs::remove_file(&self.path);
        }
    }

    fn tempfile_with_contents(contents: &str) -> TempFile {
        let mut path = std::env::temp_dir();
        path.push(format!(
            "biocache-index-checklist-test-{}-{}",
            std::process::id(),
            contents.as_ptr() as usize
        ));
        let mut file = fs::File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes()).expect("write temp file");
        TempFile { path }
    }
}
