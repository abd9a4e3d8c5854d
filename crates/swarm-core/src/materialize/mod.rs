//! Project materialization: write the merged file map to a fresh directory.
//!
//! The destination is `<root>/<slug>-<run start ms>`. It is created
//! exclusively; when a directory of that name already exists a `-1`, `-2`,
//! ... suffix is tried instead, so two runs never share a directory. Files
//! are written concurrently and failures are collected rather than stopping
//! at the first one. There is no rollback.

use std::collections::BTreeMap;
use std::io;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::clock::RunClock;
use crate::plan::Task;

/// Upper bound on `-N` suffixes tried before giving up.
const MAX_COLLISION_SUFFIX: u32 = 1000;

/// The finished bundle reported at the end of a successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub name: String,
    pub slug: String,
    pub prompt: String,
    pub generated_at: DateTime<Utc>,
    pub files: BTreeMap<String, String>,
    pub tasks: Vec<Task>,
    pub directory: PathBuf,
}

/// One file that could not be written.
#[derive(Debug)]
pub struct WriteFailure {
    pub path: String,
    pub error: io::Error,
}

#[derive(Debug, Error)]
pub enum MaterializeError {
    #[error("failed to create project directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("no free project directory for {base} after {attempts} attempts")]
    Exhausted { base: PathBuf, attempts: u32 },

    #[error("failed to write {} file(s) into {}: {}", .failures.len(), .directory.display(), failed_paths(.failures))]
    Write {
        directory: PathBuf,
        failures: Vec<WriteFailure>,
    },
}

fn failed_paths(failures: &[WriteFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{} ({})", f.path, f.error))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Where finished projects are written.
#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// Write `files` under a fresh directory named for `slug` and the run
    /// start, returning the directory.
    async fn materialize(
        &self,
        slug: &str,
        files: &BTreeMap<String, String>,
        run: RunClock,
    ) -> Result<PathBuf, MaterializeError>;
}

/// [`ProjectStore`] on the local filesystem.
#[derive(Debug, Clone)]
pub struct FsProjectStore {
    root: PathBuf,
}

impl FsProjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the destination directory, appending `-N` on collision.
    async fn create_destination(&self, slug: &str, run: RunClock) -> Result<PathBuf, MaterializeError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|source| MaterializeError::CreateDir {
                path: self.root.clone(),
                source,
            })?;

        let base = format!("{slug}-{}", run.started_at_ms());
        for attempt in 0..=MAX_COLLISION_SUFFIX {
            let name = if attempt == 0 {
                base.clone()
            } else {
                format!("{base}-{attempt}")
            };
            let candidate = self.root.join(name);
            match tokio::fs::create_dir(&candidate).await {
                Ok(()) => return Ok(candidate),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    debug!(path = %candidate.display(), "project directory exists, trying next suffix");
                }
                Err(source) => {
                    return Err(MaterializeError::CreateDir {
                        path: candidate,
                        source,
                    });
                }
            }
        }

        Err(MaterializeError::Exhausted {
            base: self.root.join(base),
            attempts: MAX_COLLISION_SUFFIX + 1,
        })
    }
}

#[async_trait]
impl ProjectStore for FsProjectStore {
    async fn materialize(
        &self,
        slug: &str,
        files: &BTreeMap<String, String>,
        run: RunClock,
    ) -> Result<PathBuf, MaterializeError> {
        let directory = self.create_destination(slug, run).await?;

        let writes = files
            .iter()
            .map(|(path, content)| write_one(&directory, path, content));
        let failures: Vec<WriteFailure> = join_all(writes).await.into_iter().flatten().collect();

        if failures.is_empty() {
            info!(
                directory = %directory.display(),
                files = files.len(),
                "project materialized"
            );
            Ok(directory)
        } else {
            warn!(
                directory = %directory.display(),
                failed = failures.len(),
                "project materialized with write failures"
            );
            Err(MaterializeError::Write {
                directory,
                failures,
            })
        }
    }
}

/// Write one file, creating parent directories. Returns the failure, if any.
async fn write_one(directory: &Path, relative: &str, content: &str) -> Option<WriteFailure> {
    let fail = |error: io::Error| WriteFailure {
        path: relative.to_string(),
        error,
    };

    let target = match resolve_relative(directory, relative) {
        Ok(target) => target,
        Err(e) => return Some(fail(e)),
    };

    if let Some(parent) = target.parent() {
        if let Err(e) = tokio::fs::create_dir_all(parent).await {
            return Some(fail(e));
        }
    }

    tokio::fs::write(&target, content).await.err().map(fail)
}

/// Canonical `/`-joined form of a project-relative path.
///
/// `.` components are dropped, so `./docs/a.md` and `docs/a.md` map to the
/// same key. Root, prefix and `..` components are refused, as is a path
/// with no file component.
pub fn normalize_relative(relative: &str) -> io::Result<String> {
    let mut parts = Vec::new();
    for component in Path::new(relative).components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy()),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("path {relative:?} escapes the project directory"),
                ));
            }
        }
    }
    if parts.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("path {relative:?} names no file"),
        ));
    }
    Ok(parts.join("/"))
}

/// Join `relative` onto `directory`, refusing anything that could escape it.
pub fn resolve_relative(directory: &Path, relative: &str) -> io::Result<PathBuf> {
    Ok(directory.join(normalize_relative(relative)?))
}
