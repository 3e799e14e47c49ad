//! # Policy Discovery and Loading
//!
//! @title Trusted Data Configuration Loader
//! @author Ramprasad
//!
//! Walks the configured search roots for `trusted_data.json` files and merges
//! every discovered file, in discovery order, on top of the built-in baseline
//! policy. The policy is foundational: any unreadable or malformed file aborts
//! the run, since there is no safe default to fall back to.

use super::{PolicyFile, TrustPolicy};
use log::{debug, info};
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// File name the loader searches for under every root.
pub const POLICY_FILE_NAME: &str = "trusted_data.json";

/// Fatal policy loading errors.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// A discovered policy file could not be read.
    #[error("failed to read policy file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A discovered policy file is not valid policy JSON.
    #[error("malformed policy file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Discovers and merges trusted-data configuration files.
pub struct PolicyLoader {
    roots: Vec<PathBuf>,
}

impl PolicyLoader {
    /// Creates a loader over the given search roots.
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    /// Returns every policy file under the search roots, in discovery order.
    ///
    /// Within one root, files are visited in the sorted directory order
    /// walkdir provides, so merge order is stable across runs.
    pub fn discover(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();

        for root in &self.roots {
            for entry in WalkDir::new(root)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
            {
                if entry.file_type().is_file()
                    && entry.file_name().to_string_lossy() == POLICY_FILE_NAME
                {
                    debug!("discovered policy file {}", entry.path().display());
                    files.push(entry.path().to_path_buf());
                }
            }
        }

        files
    }

    /// Loads the effective policy: built-in baseline plus every discovered
    /// file, merged by deep union in discovery order.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError`] as soon as any file fails to read or parse.
    pub fn load(&self) -> Result<TrustPolicy, PolicyError> {
        let (policy, _) = self.load_with_sources()?;
        Ok(policy)
    }

    /// Like [`load`](Self::load), but also reports which files contributed.
    pub fn load_with_sources(&self) -> Result<(TrustPolicy, Vec<PathBuf>), PolicyError> {
        let files = self.discover();
        let mut policy = TrustPolicy::builtin();

        for path in &files {
            policy.merge(read_policy_file(path)?);
        }

        info!("loaded trust policy from {} file(s)", files.len());
        Ok((policy, files))
    }
}

fn read_policy_file(path: &Path) -> Result<PolicyFile, PolicyError> {
    let text = std::fs::read_to_string(path).map_err(|source| PolicyError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&text).map_err(|source| PolicyError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
