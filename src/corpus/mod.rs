//! Document Corpus Loading
//!
//! Information Hiding:
//! - Directory walking and file filtering hidden behind `DocumentLoader`
//! - Source identity and content fingerprinting hidden (used for index cache keys)

use crate::error::LoadError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::fs;

const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "md"];

/// Raw text plus the file or upload name it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub source: String,
    pub text: String,
}

impl Document {
    pub fn new(source: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            text: text.into(),
        }
    }
}

/// Anything that can produce the documents of a corpus.
#[async_trait]
pub trait DocumentLoader: Send + Sync {
    /// Load every document. Fails if the source is missing or yields nothing.
    async fn load(&self) -> Result<Vec<Document>, LoadError>;

    /// Stable identifier of where the corpus comes from.
    fn source_id(&self) -> String;

    /// Digest of the current corpus content; changes when a document is
    /// added, edited or removed. Loaders whose `source_id` already covers
    /// the content keep the default.
    async fn fingerprint(&self) -> Result<String, LoadError> {
        Ok(String::new())
    }
}

/// Loads `.txt` and `.md` files from a directory, or a single file.
pub struct DirectoryLoader {
    path: PathBuf,
}

impl DirectoryLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn is_supported(path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| SUPPORTED_EXTENSIONS.contains(&e.to_lowercase().as_str()))
            .unwrap_or(false)
    }

    /// Supported files under the path, sorted by name.
    async fn supported_files(&self) -> Result<Vec<PathBuf>, LoadError> {
        if !fs::try_exists(&self.path).await.unwrap_or(false) {
            return Err(LoadError::SourceNotFound(self.path.clone()));
        }

        let io_err = |source| LoadError::Io {
            path: self.path.clone(),
            source,
        };

        let metadata = fs::metadata(&self.path).await.map_err(io_err)?;
        let mut files = Vec::new();

        if metadata.is_file() {
            files.push(self.path.clone());
        } else {
            let mut entries = fs::read_dir(&self.path).await.map_err(io_err)?;
            while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
                let path = entry.path();
                if path.is_file() && Self::is_supported(&path) {
                    files.push(path);
                }
            }
        }

        files.sort();
        Ok(files)
    }

    async fn read_document(path: &Path) -> Result<Option<Document>, LoadError> {
        let text = fs::read_to_string(path).await.map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        if text.trim().is_empty() {
            tracing::debug!("[DirectoryLoader] Skipping empty file {:?}", path);
            return Ok(None);
        }

        let source = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        Ok(Some(Document::new(source, text)))
    }
}

#[async_trait]
impl DocumentLoader for DirectoryLoader {
    async fn load(&self) -> Result<Vec<Document>, LoadError> {
        let files = self.supported_files().await?;

        let mut documents = Vec::with_capacity(files.len());
        for file in &files {
            if let Some(doc) = Self::read_document(file).await? {
                documents.push(doc);
            }
        }

        if documents.is_empty() {
            return Err(LoadError::EmptyCorpus(self.path.display().to_string()));
        }

        tracing::info!(
            "[DirectoryLoader] Loaded {} documents from {:?}",
            documents.len(),
            self.path
        );
        Ok(documents)
    }

    fn source_id(&self) -> String {
        let path = std::fs::canonicalize(&self.path).unwrap_or_else(|_| self.path.clone());
        format!("dir:{}", path.display())
    }

    async fn fingerprint(&self) -> Result<String, LoadError> {
        let mut hasher = Sha256::new();
        for file in self.supported_files().await? {
            let bytes = fs::read(&file).await.map_err(|source| LoadError::Io {
                path: file.clone(),
                source,
            })?;
            let name = file.file_name().and_then(|n| n.to_str()).unwrap_or_default();
            hasher.update(name.as_bytes());
            hasher.update([0u8]);
            hasher.update(&bytes);
            hasher.update([0u8]);
        }
        Ok(hex::encode(hasher.finalize()))
    }
}

/// Caller-supplied documents, e.g. uploaded files.
pub struct InMemoryLoader {
    documents: Vec<Document>,
}

impl InMemoryLoader {
    pub fn new(documents: Vec<Document>) -> Self {
        Self { documents }
    }

    /// Convenience for unnamed texts; sources become `doc-0`, `doc-1`, ...
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let documents = texts
            .into_iter()
            .enumerate()
            .map(|(i, text)| Document::new(format!("doc-{}", i), text))
            .collect();
        Self { documents }
    }
}

#[async_trait]
impl DocumentLoader for InMemoryLoader {
    async fn load(&self) -> Result<Vec<Document>, LoadError> {
        let documents: Vec<Document> = self
            .documents
            .iter()
            .filter(|d| !d.text.trim().is_empty())
            .cloned()
            .collect();

        if documents.is_empty() {
            return Err(LoadError::EmptyCorpus("in-memory".to_string()));
        }
        Ok(documents)
    }

    fn source_id(&self) -> String {
        let mut hasher = Sha256::new();
        for doc in &self.documents {
            hasher.update(doc.source.as_bytes());
            hasher.update([0u8]);
            hasher.update(doc.text.as_bytes());
            hasher.update([0u8]);
        }
        format!("mem:{}", hex::encode(hasher.finalize()))
    }
}
