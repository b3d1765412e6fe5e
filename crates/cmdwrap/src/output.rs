use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::assemble::Artifacts;

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum WritePolicy {
    /// Stage both files next to their targets and rename only once both are
    /// staged. A failed rename restores whatever was replaced before it.
    #[default]
    Atomic,
    /// Write header then source in place.
    Direct,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteOutcome {
    Written,
    Unchanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckOutcome {
    Fresh,
    Stale,
    Missing,
}

#[derive(Debug)]
pub struct WriteError {
    pub path: PathBuf,
    pub source: std::io::Error,
}

impl std::fmt::Display for WriteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "write {}: {}", self.path.display(), self.source)
    }
}

impl std::error::Error for WriteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> WriteError + '_ {
    move |source| WriteError {
        path: path.to_path_buf(),
        source,
    }
}

pub fn artifact_paths(out_dir: &Path, artifacts: &Artifacts) -> [(PathBuf, String); 2] {
    [
        (
            out_dir.join(&artifacts.header_name),
            artifacts.header_src.clone(),
        ),
        (
            out_dir.join(&artifacts.source_name),
            artifacts.source_src.clone(),
        ),
    ]
}

fn is_unchanged(path: &Path, contents: &str) -> bool {
    matches!(std::fs::read(path), Ok(bytes) if bytes == contents.as_bytes())
}

fn temp_path_next_to(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();
    let pid = std::process::id();
    let n = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    path.with_file_name(format!(".{file_name}.{pid}.{n}.tmp"))
}

/// Writes the header, then the source. Files already holding the same bytes are
/// left alone.
pub fn write_artifacts(
    out_dir: &Path,
    artifacts: &Artifacts,
    policy: WritePolicy,
) -> Result<Vec<(PathBuf, WriteOutcome)>, WriteError> {
    std::fs::create_dir_all(out_dir).map_err(io_err(out_dir))?;

    let targets = artifact_paths(out_dir, artifacts);
    let mut outcomes = Vec::with_capacity(targets.len());
    let mut pending: Vec<(&Path, &str)> = Vec::new();
    for (path, contents) in &targets {
        if is_unchanged(path, contents) {
            tracing::debug!(path = %path.display(), "artifact unchanged");
            outcomes.push((path.clone(), WriteOutcome::Unchanged));
        } else {
            pending.push((path.as_path(), contents.as_str()));
            outcomes.push((path.clone(), WriteOutcome::Written));
        }
    }

    match policy {
        WritePolicy::Direct => {
            for (path, contents) in pending {
                std::fs::write(path, contents).map_err(io_err(path))?;
                tracing::info!(path = %path.display(), "wrote artifact");
            }
        }
        WritePolicy::Atomic => {
            let mut staged: Vec<Staged<'_>> = Vec::with_capacity(pending.len());
            for (path, contents) in &pending {
                let tmp = temp_path_next_to(path);
                if let Err(source) = std::fs::write(&tmp, contents) {
                    let _ = std::fs::remove_file(&tmp);
                    discard(&staged);
                    return Err(WriteError { path: tmp, source });
                }
                staged.push(Staged {
                    tmp,
                    target: *path,
                    backup: None,
                });
            }
            commit_staged(staged)?;
        }
    }

    Ok(outcomes)
}

/// A staged artifact: new contents in `tmp`, and a link to the previous
/// contents of `target` once one has been taken.
struct Staged<'a> {
    tmp: PathBuf,
    target: &'a Path,
    backup: Option<PathBuf>,
}

fn discard(staged: &[Staged<'_>]) {
    for s in staged {
        let _ = std::fs::remove_file(&s.tmp);
        if let Some(b) = &s.backup {
            let _ = std::fs::remove_file(b);
        }
    }
}

fn keep_previous(target: &Path) -> std::io::Result<Option<PathBuf>> {
    if !target.is_file() {
        return Ok(None);
    }
    let backup = temp_path_next_to(target);
    std::fs::hard_link(target, &backup)
        .or_else(|_| std::fs::copy(target, &backup).map(|_| ()))
        .map(|()| Some(backup))
}

/// Renames every staged file over its target. If any rename fails, targets
/// already replaced get their previous contents back (or are removed when
/// they did not exist), so the pair on disk is either all old or all new.
fn commit_staged(mut staged: Vec<Staged<'_>>) -> Result<(), WriteError> {
    for i in 0..staged.len() {
        match keep_previous(staged[i].target) {
            Ok(backup) => staged[i].backup = backup,
            Err(source) => {
                let path = staged[i].target.to_path_buf();
                discard(&staged);
                return Err(WriteError { path, source });
            }
        }
    }

    for i in 0..staged.len() {
        if let Err(source) = std::fs::rename(&staged[i].tmp, staged[i].target) {
            for done in &staged[..i] {
                let restored = match &done.backup {
                    Some(b) => std::fs::rename(b, done.target),
                    None => std::fs::remove_file(done.target),
                };
                if let Err(e) = restored {
                    tracing::error!(path = %done.target.display(), "rollback failed: {e}");
                }
            }
            discard(&staged[i..]);
            return Err(WriteError {
                path: staged[i].target.to_path_buf(),
                source,
            });
        }
    }

    for s in &staged {
        if let Some(b) = &s.backup {
            let _ = std::fs::remove_file(b);
        }
        tracing::info!(path = %s.target.display(), "wrote artifact");
    }
    Ok(())
}

/// Compares on-disk artifacts with freshly generated text; nothing is written.
pub fn check_artifacts(out_dir: &Path, artifacts: &Artifacts) -> Vec<(PathBuf, CheckOutcome)> {
    artifact_paths(out_dir, artifacts)
        .into_iter()
        .map(|(path, contents)| {
            let outcome = match std::fs::read(&path) {
                Ok(bytes) if bytes == contents.as_bytes() => CheckOutcome::Fresh,
                Ok(_) => CheckOutcome::Stale,
                Err(_) => CheckOutcome::Missing,
            };
            (path, outcome)
        })
        .collect()
}
