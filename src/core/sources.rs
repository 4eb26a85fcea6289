/// Source discovery: which table and block files make up a content set.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("cannot scan '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid sub-directory name '{0}'")]
    InvalidSubdir(String),
}

/// The files to compile, already merged with override precedence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceSet {
    /// `.tab` files; each is one table named after its stem.
    pub table_files: Vec<PathBuf>,
    /// `.tab` and `.txt` files scanned for named blocks, in the order
    /// they should be read (later files override earlier blocks).
    pub block_files: Vec<PathBuf>,
}

impl SourceSet {
    /// Collect sources from `root` and, optionally, `root/subdir`.
    ///
    /// A sub-directory file replaces the top-level file with the same
    /// (case-insensitive) file name. A sub-directory that does not exist is
    /// ignored.
    pub fn discover(root: &Path, subdir: Option<&str>) -> Result<SourceSet, SourceError> {
        let top = files_with_extensions(root, &["tab", "txt"])?;
        let sub = match subdir {
            Some(name) => {
                let dir = root.join(validate_subdir(name)?);
                if dir.is_dir() {
                    files_with_extensions(&dir, &["tab", "txt"])?
                } else {
                    debug!(subdir = name, "sub-directory not found, using top level only");
                    Vec::new()
                }
            }
            None => Vec::new(),
        };

        let block_files = merge_by_file_name(&top, &sub);
        let table_files = block_files
            .iter()
            .filter(|p| has_extension(p, "tab"))
            .cloned()
            .collect();

        Ok(SourceSet {
            table_files,
            block_files,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.table_files.is_empty() && self.block_files.is_empty()
    }
}

/// Sub-directories of `root` that can be offered as content sets, sorted.
pub fn list_subdirs(root: &Path) -> Result<Vec<String>, SourceError> {
    let entries = std::fs::read_dir(root).map_err(|source| SourceError::Io {
        path: root.to_path_buf(),
        source,
    })?;
    let mut dirs: Vec<String> = entries
        .flatten()
        .filter(|e| e.path().is_dir())
        .filter_map(|e| e.file_name().to_str().map(str::to_string))
        .filter(|name| !name.starts_with('.'))
        .collect();
    dirs.sort();
    Ok(dirs)
}

/// Only plain directory names are accepted; nothing that could leave `root`.
fn validate_subdir(name: &str) -> Result<&str, SourceError> {
    let name = name.trim();
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(SourceError::InvalidSubdir(name.to_string()));
    }
    Ok(name)
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

/// Files directly inside `dir` with one of `exts`, sorted by file name.
fn files_with_extensions(dir: &Path, exts: &[&str]) -> Result<Vec<PathBuf>, SourceError> {
    let entries = std::fs::read_dir(dir).map_err(|source| SourceError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_file() && exts.iter().any(|ext| has_extension(p, ext)))
        .collect();
    files.sort();
    Ok(files)
}

fn file_key(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// Top-level files in order, each replaced in place by a sub-directory
/// file of the same name; remaining sub-directory files appended.
fn merge_by_file_name(top: &[PathBuf], sub: &[PathBuf]) -> Vec<PathBuf> {
    let mut merged: Vec<PathBuf> = top.to_vec();
    for path in sub {
        let key = file_key(path);
        match merged.iter_mut().find(|p| file_key(p) == key) {
            Some(slot) => *slot = path.clone(),
            None => merged.push(path.clone()),
        }
    }
    merged
}
