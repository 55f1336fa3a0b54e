//! Local directory reader

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::types::Document;

/// Reads every regular file in a directory into one document per file
#[derive(Debug, Clone, Default)]
pub struct DirectoryReader {
    recursive: bool,
    extensions: Option<Vec<String>>,
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}

impl DirectoryReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Only read files with one of these extensions (case-insensitive, no dot)
    pub fn with_extensions(mut self, extensions: &[&str]) -> Self {
        self.extensions = Some(extensions.iter().map(|e| e.to_lowercase()).collect());
        self
    }

    fn accepts(&self, path: &Path) -> bool {
        match &self.extensions {
            None => true,
            Some(allowed) => path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| allowed.contains(&e.to_lowercase()))
                .unwrap_or(false),
        }
    }

    /// Load documents sorted by path
    pub fn load_data(&self, dir: &Path) -> Result<Vec<Document>> {
        let walker = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(if self.recursive { usize::MAX } else { 1 })
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e));

        let mut documents = Vec::new();
        for entry in walker {
            let entry = entry.with_context(|| format!("Failed to list {}", dir.display()))?;
            if !entry.file_type().is_file() || !self.accepts(entry.path()) {
                continue;
            }
            documents.push(read_file(entry.path())?);
        }

        debug!(dir = %dir.display(), count = documents.len(), "read local documents");
        Ok(documents)
    }

    /// PDF files directly inside `dir`, sorted
    pub fn pdf_paths(dir: &Path) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
        {
            let entry = entry.with_context(|| format!("Failed to list {}", dir.display()))?;
            let is_pdf = entry
                .path()
                .extension()
                .map(|e| e.eq_ignore_ascii_case("pdf"))
                .unwrap_or(false);
            if entry.file_type().is_file() && is_pdf {
                paths.push(entry.into_path());
            }
        }
        Ok(paths)
    }
}

fn read_file(path: &Path) -> Result<Document> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let meta = std::fs::metadata(path)
        .with_context(|| format!("Failed to stat {}", path.display()))?;

    let path_str = path.to_string_lossy().to_string();
    let mut doc = Document::from_source(&path_str, 0, String::from_utf8_lossy(&bytes));

    doc.set_metadata("file_path", path_str.as_str());
    if let Some(name) = path.file_name() {
        doc.set_metadata("file_name", name.to_string_lossy().as_ref());
    }
    if let Some(ext) = path.extension() {
        doc.set_metadata("file_type", ext.to_string_lossy().to_lowercase());
    }
    doc.set_metadata("file_size", meta.len());
    if let Ok(modified) = meta.modified() {
        let date: DateTime<Local> = modified.into();
        doc.set_metadata("last_modified_date", date.format("%Y-%m-%d").to_string());
    }

    Ok(doc)
}
