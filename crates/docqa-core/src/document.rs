//! Document loading: PDF and plain-text byte streams into paged text.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::traits::{ExtractedPage, PageExtractor};
use crate::types::{Document, Page};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Text,
}

impl DocumentKind {
    pub fn from_name(name: &str) -> Option<Self> {
        let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(Self::Pdf),
            "txt" => Some(Self::Text),
            _ => None,
        }
    }
}

/// Per-page PDF text extraction backed by `lopdf`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtractor;

impl PageExtractor for PdfExtractor {
    fn extract_pages(&self, bytes: &[u8]) -> anyhow::Result<Vec<ExtractedPage>> {
        let doc = lopdf::Document::load_mem(bytes)?;
        let pages = doc
            .get_pages()
            .keys()
            .map(|&number| ExtractedPage { number, text: doc.extract_text(&[number]).map_err(|e| e.to_string()) })
            .collect();
        Ok(pages)
    }
}

pub struct DocumentLoader {
    extractor: Box<dyn PageExtractor>,
}

impl Default for DocumentLoader {
    fn default() -> Self { Self { extractor: Box::new(PdfExtractor) } }
}

impl DocumentLoader {
    pub fn new() -> Self { Self::default() }

    pub fn with_extractor(extractor: Box<dyn PageExtractor>) -> Self { Self { extractor } }

    /// Load one document; the kind is taken from the extension of `source_id`.
    pub fn load_bytes(&self, source_id: &str, bytes: &[u8]) -> Result<Document> {
        match DocumentKind::from_name(source_id) {
            Some(DocumentKind::Pdf) => self.load_pdf(source_id, bytes),
            Some(DocumentKind::Text) => Ok(Document::plain_text(source_id, decode_text(bytes))),
            None => Err(Error::UnsupportedDocument(source_id.to_string())),
        }
    }

    fn load_pdf(&self, source_id: &str, bytes: &[u8]) -> Result<Document> {
        let extracted = self
            .extractor
            .extract_pages(bytes)
            .map_err(|e| Error::Extraction { source_id: source_id.to_string(), message: e.to_string() })?;
        let total = extracted.len();
        let mut pages = Vec::with_capacity(total);
        for page in extracted {
            match page.text {
                Ok(text) => pages.push(Page { number: Some(page.number), text }),
                Err(error) => warn!(source_id, page = page.number, %error, "Failed to extract page text, skipping"),
            }
        }
        debug!(source_id, total, kept = pages.len(), "Extracted PDF pages");
        Ok(Document { source_id: source_id.to_string(), pages })
    }

    /// Load a file; the source id is the file name.
    pub fn load_path(&self, path: &Path) -> Result<Document> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| Error::UnsupportedDocument(path.display().to_string()))?;
        let bytes = fs::read(path)?;
        self.load_bytes(&name, &bytes)
    }

    /// Load files and the supported documents under any directories, in order.
    pub fn load_paths(&self, paths: &[PathBuf]) -> Result<Vec<Document>> {
        let mut docs = Vec::new();
        for path in paths {
            if path.is_dir() {
                for file in collect_document_paths(path) {
                    docs.push(self.load_path(&file)?);
                }
            } else {
                docs.push(self.load_path(path)?);
            }
        }
        Ok(docs)
    }
}

fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => String::from_utf8_lossy(bytes).to_string(),
    }
}

/// Supported documents under `root`, sorted for a stable ingestion order.
pub fn collect_document_paths(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().to_str().and_then(DocumentKind::from_name).is_some())
        .map(|e| e.path().to_path_buf())
        .collect();
    files.sort();
    files
}
