use crate::messages::TransportError;
use crate::model::Field;
use crate::service::{DocumentId, DocumentSource, ExportSink, PagePreview, PersistenceSink};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

pub const FIELDS_FILE_NAME: &str = "fields.json";
pub const PREVIEW_FILE_NAME: &str = "preview.json";
pub const DOCUMENT_FILE_NAME: &str = "document.pdf";

/// Per-document file layout under a root folder:
/// `<root>/<document_id>/fields.json`, `preview.json`, `document.pdf`.
/// Implements the session's collaborator traits so the whole load/save/
/// download path can run against local files.
pub struct FileDocumentStore {
    root: PathBuf,
}

impl FileDocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn document_dir(&self, document_id: &DocumentId) -> PathBuf {
        self.root.join(document_id.as_str())
    }

    fn fields_path(&self, document_id: &DocumentId) -> PathBuf {
        self.document_dir(document_id).join(FIELDS_FILE_NAME)
    }

    fn read_fields(&self, document_id: &DocumentId) -> Result<Vec<Field>> {
        let path = self.fields_path(document_id);
        if !path.exists() {
            // A document that has never been annotated has no field file.
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("read field file {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("deserialize field file {}", path.display()))
    }

    fn write_fields(&self, document_id: &DocumentId, fields: &[Field]) -> Result<()> {
        let path = self.fields_path(document_id);
        ensure_parent(&path)?;
        let json = serde_json::to_string_pretty(fields).context("serialize fields")?;
        std::fs::write(&path, json)
            .with_context(|| format!("write field file {}", path.display()))
    }

    fn read_preview(&self, document_id: &DocumentId) -> Result<PagePreview> {
        let path = self.document_dir(document_id).join(PREVIEW_FILE_NAME);
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("read preview file {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("deserialize preview file {}", path.display()))
    }

    /// Seed the preview metadata for a document (normally written by the
    /// side that rasterizes the PDF).
    pub fn put_preview(&self, preview: &PagePreview) -> Result<()> {
        let path = self
            .document_dir(&preview.document_id)
            .join(PREVIEW_FILE_NAME);
        ensure_parent(&path)?;
        let json = serde_json::to_string_pretty(preview).context("serialize preview")?;
        std::fs::write(&path, json)
            .with_context(|| format!("write preview file {}", path.display()))
    }

    /// Store the document payload itself, e.g. after an upload.
    pub fn put_document(&self, document_id: &DocumentId, bytes: &[u8]) -> Result<()> {
        let path = self.document_dir(document_id).join(DOCUMENT_FILE_NAME);
        ensure_parent(&path)?;
        std::fs::write(&path, bytes)
            .with_context(|| format!("write document file {}", path.display()))
    }

    fn read_document(&self, document_id: &DocumentId) -> Result<Vec<u8>> {
        let path = self.document_dir(document_id).join(DOCUMENT_FILE_NAME);
        std::fs::read(&path).with_context(|| format!("read document file {}", path.display()))
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create document folder {}", parent.display()))?;
    }
    Ok(())
}

fn transport_err(err: anyhow::Error) -> TransportError {
    TransportError::Failed(format!("{err:#}"))
}

impl DocumentSource for FileDocumentStore {
    fn fetch_fields(&self, document_id: &DocumentId) -> Result<Vec<Field>, TransportError> {
        self.read_fields(document_id).map_err(transport_err)
    }

    fn fetch_preview(&self, document_id: &DocumentId) -> Result<PagePreview, TransportError> {
        self.read_preview(document_id).map_err(transport_err)
    }
}

impl PersistenceSink for FileDocumentStore {
    fn save_fields(
        &self,
        document_id: &DocumentId,
        fields: &[Field],
    ) -> Result<(), TransportError> {
        self.write_fields(document_id, fields).map_err(transport_err)
    }
}

impl ExportSink for FileDocumentStore {
    fn download(&self, document_id: &DocumentId) -> Result<Vec<u8>, TransportError> {
        self.read_document(document_id).map_err(transport_err)
    }
}
