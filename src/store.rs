//! # Configuration Store
//!
//! The cache index is read and written through [`ConfigStore`], a minimal
//! read/write-with-commit abstraction. A write is scoped: content goes into
//! a [`StoreWriter`] and only replaces the stored blob when the writer is
//! committed. Dropping an uncommitted writer discards what was written.
//!
//! [`FileStore`] is the on-disk implementation. It stages writes in a
//! temporary file beside the target and renames it into place on commit, so
//! readers only ever observe the old or the new content in full.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use log::debug;
use tempfile::NamedTempFile;

use crate::error::{Error, Result};

/// Pending content for a [`ConfigStore`]
pub trait StoreWriter: Write {
    /// Make the written content the stored content.
    fn commit(self: Box<Self>) -> Result<()>;
}

/// Atomic storage for one configuration blob
pub trait ConfigStore {
    /// Current content, or `None` when nothing has been stored yet.
    fn read(&self) -> Result<Option<Vec<u8>>>;

    /// Start replacing the content.
    fn write(&self) -> Result<Box<dyn StoreWriter + '_>>;
}

/// [`ConfigStore`] backed by a single file
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigStore for FileStore {
    fn read(&self) -> Result<Option<Vec<u8>>> {
        match fs::read(&self.path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self) -> Result<Box<dyn StoreWriter + '_>> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;
        let staged = NamedTempFile::new_in(&dir)?;
        Ok(Box::new(FileWriter {
            target: &self.path,
            staged,
        }))
    }
}

struct FileWriter<'a> {
    target: &'a Path,
    staged: NamedTempFile,
}

impl Write for FileWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.staged.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.staged.flush()
    }
}

impl StoreWriter for FileWriter<'_> {
    fn commit(self: Box<Self>) -> Result<()> {
        let FileWriter { target, mut staged } = *self;
        staged.flush()?;
        staged.as_file().sync_all()?;
        staged.persist(target).map_err(|e| e.error)?;
        debug!("Committed {}", target.display());
        Ok(())
    }
}

impl<S: ConfigStore + ?Sized> ConfigStore for Arc<S> {
    fn read(&self) -> Result<Option<Vec<u8>>> {
        (**self).read()
    }

    fn write(&self) -> Result<Box<dyn StoreWriter + '_>> {
        (**self).write()
    }
}

/// [`ConfigStore`] keeping the blob in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    content: Mutex<Option<Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `content`.
    pub fn with_content(content: impl Into<Vec<u8>>) -> Self {
        Self {
            content: Mutex::new(Some(content.into())),
        }
    }
}

fn poisoned() -> Error {
    Error::Io(io::Error::new(
        io::ErrorKind::Other,
        "memory store lock poisoned",
    ))
}

impl ConfigStore for MemoryStore {
    fn read(&self) -> Result<Option<Vec<u8>>> {
        Ok(self.content.lock().map_err(|_| poisoned())?.clone())
    }

    fn write(&self) -> Result<Box<dyn StoreWriter + '_>> {
        Ok(Box::new(MemoryWriter {
            store: self,
            buffer: Vec::new(),
        }))
    }
}

struct MemoryWriter<'a> {
    store: &'a MemoryStore,
    buffer: Vec<u8>,
}

impl Write for MemoryWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl StoreWriter for MemoryWriter<'_> {
    fn commit(self: Box<Self>) -> Result<()> {
        let MemoryWriter { store, buffer } = *self;
        *store.content.lock().map_err(|_| poisoned())? = Some(buffer);
        Ok(())
    }
}
