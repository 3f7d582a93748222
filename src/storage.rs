//! Durable storage for the config document.
//!
//! The store engine loads once at construction and saves after every
//! mutation. [`FileStorage`] writes the whole document atomically;
//! [`MemoryStorage`] keeps it in memory for tests and embedding.

use std::cell::RefCell;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tempfile::NamedTempFile;

use crate::document::Document;
use crate::error::{ConfigError, ConfigResult};
use crate::format::DocumentFormat;

/// A key/value document store with load-on-construct and synchronous save.
pub trait DocumentStorage {
    /// Load the persisted document, or `None` if nothing has been saved yet.
    fn load(&self) -> ConfigResult<Option<Document>>;

    /// Persist the whole document. Returns once the write is durable.
    fn save(&self, document: &Document) -> ConfigResult<()>;

    /// Human-readable location for log messages.
    fn describe(&self) -> String;
}

/// Stores the document in a single file.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
    format: DocumentFormat,
}

impl FileStorage {
    /// Storage at `path`, with the format inferred from its extension.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let format = DocumentFormat::from_path(&path);
        Self { path, format }
    }

    /// Storage at `path` with an explicit format.
    pub fn with_format(path: impl Into<PathBuf>, format: DocumentFormat) -> Self {
        Self {
            path: path.into(),
            format,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> DocumentFormat {
        self.format
    }
}

impl DocumentStorage for FileStorage {
    fn load(&self) -> ConfigResult<Option<Document>> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ConfigError::io(&self.path, e)),
        };
        self.format.decode(&text).map(Some)
    }

    fn save(&self, document: &Document) -> ConfigResult<()> {
        let text = self.format.encode(document)?;

        // Write next to the target so the rename stays on one filesystem
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(|e| ConfigError::io(&dir, e))?;

        let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| ConfigError::io(&dir, e))?;
        tmp.write_all(text.as_bytes())
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| ConfigError::io(tmp.path(), e))?;
        tmp.persist(&self.path)
            .map_err(|e| ConfigError::io(&self.path, e.error))?;
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    document: Option<Document>,
    saves: usize,
}

/// In-memory storage. Clones share the same state, so a test can keep a
/// handle after giving one to the store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    state: Rc<RefCell<MemoryState>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage that already holds a persisted document.
    pub fn with_document(document: Document) -> Self {
        let storage = Self::default();
        storage.state.borrow_mut().document = Some(document);
        storage
    }

    /// The last saved (or seeded) document.
    pub fn snapshot(&self) -> Option<Document> {
        self.state.borrow().document.clone()
    }

    /// Number of times `save` has been called.
    pub fn saves(&self) -> usize {
        self.state.borrow().saves
    }
}

impl DocumentStorage for MemoryStorage {
    fn load(&self) -> ConfigResult<Option<Document>> {
        Ok(self.snapshot())
    }

    fn save(&self, document: &Document) -> ConfigResult<()> {
        let mut state = self.state.borrow_mut();
        state.document = Some(document.clone());
        state.saves += 1;
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
