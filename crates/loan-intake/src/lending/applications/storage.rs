use std::path::Path;

use mime::Mime;

/// File headed for the document bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDocument {
    pub path: String,
    pub content_type: Mime,
    pub bytes: Vec<u8>,
}

/// Object storage collaborator holding uploaded loan documents.
pub trait DocumentStore: Send + Sync {
    /// Upload (or overwrite) a document, returning the stored path.
    fn upload(&self, document: StoredDocument) -> Result<String, StorageError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("upload rejected: {0}")]
    Rejected(String),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Keep the client's file name but strip directories, NUL bytes and separators.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or_default();
    let cleaned: String = base.chars().filter(|c| *c != '\0').collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Map an applicant identifier onto characters allowed in storage keys.
pub fn sanitize_folder(folder: &str) -> String {
    let mapped: String = folder
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '/' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    mapped.trim_matches('/').to_string()
}

/// `<folder>/<stem>_<timestamp><ext>`, keeping repeated uploads of the same file apart.
pub fn storage_path(folder: &str, file_name: &str, timestamp: i64) -> String {
    let file_name = sanitize_file_name(file_name);
    let (stem, extension) = match file_name.rfind('.') {
        Some(index) if index > 0 => file_name.split_at(index),
        _ => (file_name.as_str(), ""),
    };
    let stamped = format!("{stem}_{timestamp}{extension}");

    let folder = sanitize_folder(folder);
    if folder.is_empty() {
        stamped
    } else {
        format!("{folder}/{stamped}")
    }
}

pub fn guess_content_type(file_name: &str) -> Mime {
    mime_guess::from_path(Path::new(file_name)).first_or_octet_stream()
}
