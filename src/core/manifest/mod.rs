//! Manifest retrieval from git.
//!
//! Each repository gets one working copy under a base directory. Fetches
//! are serialized by a single mutex because a checkout mutates the shared
//! working copy: two requests for different commits of the same repository
//! must not interleave.
//!
//! ## Algorithm
//!
//! 1. Clone on first use, fetch otherwise
//! 2. Check out the exact commit (detached)
//! 3. Stat the path; directories are rejected
//! 4. Read and return the file

use std::path::{Component, Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::core::domain::ManifestFetchKey;
use crate::core::validation::is_valid_commit_hash;
use crate::error::{FetchError, Result};

mod git;

pub use git::{GitCli, GitCredentials};

/// Characters of the repository hash kept in a working copy name.
const DIR_HASH_LEN: usize = 12;

/// Characters of the sanitized repository kept in a working copy name.
const DIR_LABEL_MAX: usize = 48;

/// Git operations the fetcher needs.
pub trait GitBackend: Send + Sync {
    /// Clone `repository` into `dest`, which does not exist yet.
    fn clone_repo(&self, repository: &str, dest: &Path) -> Result<()>;

    /// Update remote refs of the working copy at `dir`.
    ///
    /// Nothing to fetch is success.
    fn fetch(&self, dir: &Path) -> Result<()>;

    /// Check out `commit` detached, discarding local changes.
    fn checkout(&self, dir: &Path, commit: &str) -> Result<()>;
}

/// Normalize a repository URI so equivalent spellings share a working copy.
///
/// Trailing slashes, a trailing `.git` and letter case are ignored.
pub fn normalize_repository(repository: &str) -> String {
    let trimmed = repository.trim().trim_end_matches('/');
    let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);
    trimmed.to_ascii_lowercase()
}

/// Directory name for a repository's working copy.
///
/// Human-readable label plus a short hash of the normalized repository,
/// so different repositories never collide after sanitizing.
pub fn working_copy_name(repository: &str) -> String {
    let normalized = normalize_repository(repository);

    let mut label = String::with_capacity(normalized.len());
    for c in normalized.chars() {
        if c.is_ascii_alphanumeric() {
            label.push(c);
        } else if !label.ends_with('-') {
            label.push('-');
        }
    }
    let label = label.trim_matches('-');
    let label = &label[label.len().saturating_sub(DIR_LABEL_MAX)..];

    let digest = Sha256::digest(normalized.as_bytes());
    let hash: String = digest.iter().map(|b| format!("{:02x}", b)).collect();

    format!("{}-{}", label.trim_start_matches('-'), &hash[..DIR_HASH_LEN])
}

fn check_relative(path: &str) -> Result<&Path> {
    let relative = Path::new(path);
    let escapes = relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if path.is_empty() || escapes {
        return Err(FetchError::PathOutsideRepository(path.to_string()).into());
    }
    Ok(relative)
}

/// Retrieves files at specific commits.
pub struct ManifestFetcher {
    backend: Box<dyn GitBackend>,
    base_dir: PathBuf,
    lock: Mutex<()>,
}

impl ManifestFetcher {
    pub fn new(backend: Box<dyn GitBackend>, base_dir: PathBuf) -> Self {
        Self {
            backend,
            base_dir,
            lock: Mutex::new(()),
        }
    }

    /// Working copy directory for `repository`.
    pub fn working_copy(&self, repository: &str) -> PathBuf {
        self.base_dir.join(working_copy_name(repository))
    }

    /// Return the contents of `key.path` at `key.commit_hash`.
    ///
    /// # Errors
    ///
    /// - `FetchError::InvalidCommit` if `key.commit_hash` is not a hex commit hash
    /// - `FetchError::PathOutsideRepository` if the path is absolute or climbs out
    /// - `FetchError::Git` if clone, fetch or checkout fails
    /// - `FetchError::NotAFile` if the path is a directory
    /// - `FetchError::Read` if the path is missing or unreadable
    pub fn get_manifest_file(&self, key: &ManifestFetchKey) -> Result<Vec<u8>> {
        if !is_valid_commit_hash(&key.commit_hash) {
            return Err(FetchError::InvalidCommit(key.commit_hash.clone()).into());
        }
        let relative = check_relative(&key.path)?;

        // The guard protects the working copy on disk, not in-memory state.
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        let dir = self.working_copy(&key.repository);
        if dir.join(".git").exists() {
            debug!(repository = %key.repository, "fetching working copy");
            self.backend.fetch(&dir)?;
        } else {
            debug!(repository = %key.repository, dir = %dir.display(), "cloning working copy");
            std::fs::create_dir_all(&self.base_dir)?;
            self.backend.clone_repo(&key.repository, &dir)?;
        }

        self.backend.checkout(&dir, &key.commit_hash)?;

        let file = dir.join(relative);
        let metadata = std::fs::metadata(&file).map_err(|source| FetchError::Read {
            path: relative.to_path_buf(),
            source,
        })?;
        if metadata.is_dir() {
            return Err(FetchError::NotAFile(key.path.clone()).into());
        }

        let contents = std::fs::read(&file).map_err(|source| FetchError::Read {
            path: relative.to_path_buf(),
            source,
        })?;

        info!(
            repository = %key.repository,
            commit = %key.commit_hash,
            path = %key.path,
            bytes = contents.len(),
            "manifest fetched"
        );
        Ok(contents)
    }
}
