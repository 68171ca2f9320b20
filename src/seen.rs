//! Tracking of vacancy identifiers seen on the previous run.
//!
//! The seen-before file is plain UTF-8 text with one identifier per line, sorted.
//! It is read once at the start of a run and fully overwritten once at the end.

use crate::errors::{AppError, AppResult};
use std::collections::BTreeSet;
use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Loads and persists the seen-before identifier set.
///
/// A tracker without a path is inert: nothing is loaded and nothing is written.
#[derive(Debug, Clone, Default)]
pub struct SeenTracker {
    path: Option<PathBuf>,
}

impl SeenTracker {
    /// Creates a tracker for `path`, expanding a leading `~` to the home directory.
    pub fn new(path: Option<&str>) -> Self {
        Self {
            path: path.map(expand_home),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Reads the previously seen identifiers.
    ///
    /// Returns `None` when no path is configured or the file does not exist yet,
    /// which callers treat as "nothing is new". Tokens are whitespace separated.
    pub async fn load(&self) -> AppResult<Option<BTreeSet<String>>> {
        let Some(path) = self.path.as_deref() else {
            return Ok(None);
        };

        match tokio::fs::read_to_string(path).await {
            Ok(contents) => {
                let seen: BTreeSet<String> =
                    contents.split_whitespace().map(str::to_string).collect();
                debug!(path = %path.display(), seen = seen.len(), "Seen-before file loaded");
                Ok(Some(seen))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "Seen-before file does not exist yet");
                Ok(None)
            }
            Err(e) => Err(AppError::IoError(format!(
                "Failed to read seen-before file {}: {e}",
                path.display()
            ))),
        }
    }

    /// Overwrites the seen-before file with `current`, one identifier per line in
    /// ascending order. Does nothing when no path is configured.
    pub async fn persist(&self, current: &BTreeSet<String>) -> AppResult<()> {
        let Some(path) = self.path.as_deref() else {
            return Ok(());
        };

        let contents: String = current.iter().map(|id| format!("{id}\n")).collect();
        tokio::fs::write(path, contents).await.map_err(|e| {
            AppError::IoError(format!(
                "Failed to write seen-before file {}: {e}",
                path.display()
            ))
        })?;

        info!(path = %path.display(), ids = current.len(), "Seen-before file updated");
        Ok(())
    }
}

/// Identifiers present now that were not seen last time.
///
/// Only used to badge vacancies as new; every current vacancy is still rendered.
pub fn new_vacancies(
    current: &BTreeSet<String>,
    seen: Option<&BTreeSet<String>>,
) -> BTreeSet<String> {
    match seen {
        Some(seen) => current.difference(seen).cloned().collect(),
        None => BTreeSet::new(),
    }
}

/// Expands `~` and a leading `~/` to `$HOME`; `~user` forms are left as they are.
fn expand_home(path: &str) -> PathBuf {
    let rest = match path {
        "~" => Some(""),
        _ => path.strip_prefix("~/"),
    };
    match (rest, env::var_os("HOME")) {
        (Some(""), Some(home)) => PathBuf::from(home),
        (Some(rest), Some(home)) => PathBuf::from(home).join(rest),
        _ => PathBuf::from(path),
    }
}
