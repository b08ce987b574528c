use crate::Error;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Transaction manager config options.
///
/// ```toml
/// rpc_url = "http://127.0.0.1:8114"
/// # defaults to rpc_url, the node serves the indexer RPC itself
/// indexer_url = "http://127.0.0.1:8116"
/// poll_interval = 10
/// rpc_timeout = 30
/// indexer_page_size = 100
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TxManagerConfig {
    /// Node RPC endpoint
    pub rpc_url: String,
    /// Indexer RPC endpoint
    pub indexer_url: Option<String>,
    /// The poll interval by secs
    pub poll_interval: u64,
    /// The RPC request timeout by secs
    pub rpc_timeout: u64,
    /// Number of cells requested per indexer page
    pub indexer_page_size: u32,
}

impl Default for TxManagerConfig {
    fn default() -> Self {
        TxManagerConfig {
            rpc_url: "http://127.0.0.1:8114".to_owned(),
            indexer_url: None,
            poll_interval: 10,
            rpc_timeout: 30,
            indexer_page_size: 100,
        }
    }
}

impl TxManagerConfig {
    /// Parses the config from TOML bytes.
    pub fn load_from_slice(slice: &[u8]) -> Result<Self, Error> {
        let config: Self = toml::from_slice(slice).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML config file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let content = std::fs::read(path)
            .map_err(|e| Error::Config(format!("read {}: {}", path.display(), e)))?;
        Self::load_from_slice(&content)
    }

    /// The endpoint serving `get_cells`.
    pub fn indexer_url(&self) -> &str {
        self.indexer_url.as_deref().unwrap_or(&self.rpc_url)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval)
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.rpc_timeout)
    }

    fn validate(&self) -> Result<(), Error> {
        if self.poll_interval == 0 {
            return Err(Error::Config("poll_interval should be greater than 0".to_owned()));
        }
        if self.indexer_page_size == 0 {
            return Err(Error::Config(
                "indexer_page_size should be greater than 0".to_owned(),
            ));
        }
        Ok(())
    }
}
