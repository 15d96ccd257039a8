//! Plain-text corpus loading: every `.txt` file under a directory becomes a
//! candidate document.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::types::CandidateDocument;

pub fn load_corpus_dir(dir: &Path) -> Result<Vec<CandidateDocument>> {
    if !dir.is_dir() {
        return Err(Error::InvalidConfig(format!("corpus directory {} does not exist", dir.display())));
    }
    let files = list_txt_files(dir);
    if files.is_empty() {
        info!(dir = %dir.display(), "no .txt files found");
        return Ok(vec![]);
    }
    let mut docs = Vec::with_capacity(files.len());
    for file_path in &files {
        let content = read_file_content(file_path)?;
        let id = extract_doc_id(dir, file_path);
        let title = file_path.strip_prefix(dir).unwrap_or(file_path).to_string_lossy().to_string();
        debug!(id = %id, bytes = content.len(), "loaded candidate");
        docs.push(CandidateDocument { id: Some(id), title: Some(title), author: None, content: Some(content) });
    }
    info!(count = docs.len(), dir = %dir.display(), "loaded corpus");
    Ok(docs)
}

fn read_file_content(file_path: &Path) -> Result<String> {
    let bytes = fs::read(file_path)
        .map_err(|e| Error::InvalidConfig(format!("failed to read {}: {}", file_path.display(), e)))?;
    match String::from_utf8(bytes) {
        Ok(content) => Ok(content),
        Err(e) => Ok(String::from_utf8_lossy(e.as_bytes()).to_string()),
    }
}

/// Path relative to the corpus root, extension dropped, `/`-separated, so
/// same-named files in different folders stay distinct.
fn extract_doc_id(root: &Path, file_path: &Path) -> String {
    file_path
        .strip_prefix(root)
        .unwrap_or(file_path)
        .with_extension("")
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn list_txt_files(root: &Path) -> Vec<PathBuf> {
    let mut txt_files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("txt"))
        .collect();
    txt_files.sort();
    txt_files
}
