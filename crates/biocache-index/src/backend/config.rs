//! Parses the URL-shaped backend configuration value into one of three
//! deployment modes. The indexing engine never sees this
//! distinction — it talks to one `IndexBackend` trait object regardless
//! of which mode produced it.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendTarget {
    /// A path, or a path to `solr.xml`: load a core container in-process.
    Embedded { path: String },
    /// A single `http(s)://` endpoint: concurrent update client.
    Remote { url: String, threads: usize },
    /// `host:port` form: cluster client against the default collection.
    Cluster { hosts: String, collection: String },
}

pub const DEFAULT_CLUSTER_COLLECTION: &str = "biocache1";

impl BackendTarget {
    /// Classifies a raw configuration string. `http://`/`https://` is
    /// remote; a bare `host:port` (no scheme, contains `:`, no `/`) is a
    /// cluster address; anything else is treated as an embedded path.
    pub fn parse(raw: &str, threads: usize) -> BackendTarget {
        let raw = raw.trim();
        if raw.starts_with("http://") || raw.starts_with("https://") {
            BackendTarget::Remote {
                url: raw.to_string(),
                threads,
            }
        } else if looks_like_host_port(raw) {
            BackendTarget::Cluster {
                hosts: raw.to_string(),
                collection: DEFAULT_CLUSTER_COLLECTION.to_string(),
            }
        } else {
            BackendTarget::Embedded {
                path: raw.to_string(),
            }
        }
    }
}

fn looks_like_host_port(raw: &str) -> bool {
    let Some((host, port)) = raw.rsplit_once(':') else {
        return false;
    };
    !host.is_empty() && !host.contains('/') && port.chars().all(|c| c.is_ascii_digit()) && !port.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_url_is_remote() {
        assert_eq!(
            BackendTarget::parse("http://solr.example.org:8983/solr/biocache", 4),
            BackendTarget::Remote {
                url: "http://solr.example.org:8983/solr/biocache".to_string(),
                threads: 4
            }
        );
    }

    #[test]
    fn host_port_is_cluster() {
        assert_eq!(
            BackendTarget::parse("zk1:2181,zk2:2181", 4),
            BackendTarget::Cluster {
                hosts: "zk1:2181,zk2:2181".to_string(),
                collection: DEFAULT_CLUSTER_COLLECTION.to_string(),
            }
        );
    }

    #[test]
    fn bare_path_is_embedded() {
        assert_eq!(
            BackendTarget::parse("/data/solr/home", 4),
            BackendTarget::Embedded {
                path: "/data/solr/home".to_string()
            }
        );
    }
}
