use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tempfile::TempDir;

use taggable::error::{Error, Result};
use taggable::store::{SqliteStore, TagStore};
use taggable::types::Tag;

pub fn test_store() -> (TempDir, Arc<SqliteStore>) {
    let temp_dir = TempDir::new().expect("create temp dir");
    let store = SqliteStore::new(temp_dir.path().join("tags.db")).expect("open store");
    store.initialize().expect("initialize schema");
    (temp_dir, Arc::new(store))
}

/// Delegating store that counts every trait call and can inject
/// failures. It deliberately does not override the bulk methods, so it
/// also exercises their default implementations.
pub struct RecordingStore {
    inner: Arc<SqliteStore>,
    calls: AtomicUsize,
    fail_persist: Option<String>,
    fail_unlink: bool,
}

impl RecordingStore {
    pub fn new(inner: Arc<SqliteStore>) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
            fail_persist: None,
            fail_unlink: false,
        }
    }

    /// Persisting a tag with this name fails with `AlreadyExists`, the
    /// recoverable uniqueness-race shape.
    pub fn failing_persist(inner: Arc<SqliteStore>, name: &str) -> Self {
        Self {
            fail_persist: Some(name.to_string()),
            ..Self::new(inner)
        }
    }

    /// Every unlink fails with a hard storage error.
    pub fn failing_unlink(inner: Arc<SqliteStore>) -> Self {
        Self {
            fail_unlink: true,
            ..Self::new(inner)
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    fn track(&self) {
        self.calls.fetch_add(1, Ordering::Relaxed);
    }
}

impl TagStore for RecordingStore {
    fn initialize(&self) -> Result<()> {
        self.track();
        self.inner.initialize()
    }

    fn create_tag(&self, tag: &Tag) -> Result<()> {
        self.track();
        if self.fail_persist.as_deref() == Some(tag.name.as_str()) {
            return Err(Error::AlreadyExists);
        }
        self.inner.create_tag(tag)
    }

    fn save_tag(&self, tag: &Tag) -> Result<()> {
        self.track();
        if self.fail_persist.as_deref() == Some(tag.name.as_str()) {
            return Err(Error::AlreadyExists);
        }
        self.inner.save_tag(tag)
    }

    fn get_tag_by_id(&self, id: &str) -> Result<Option<Tag>> {
        self.track();
        self.inner.get_tag_by_id(id)
    }

    fn get_tag_by_name(&self, name: &str) -> Result<Option<Tag>> {
        self.track();
        self.inner.get_tag_by_name(name)
    }

    fn list_tags(&self, cursor: &str, limit: i32) -> Result<Vec<Tag>> {
        self.track();
        self.inner.list_tags(cursor, limit)
    }

    fn delete_tag(&self, id: &str) -> Result<bool> {
        self.track();
        self.inner.delete_tag(id)
    }

    fn link(&self, subject_id: &str, tag_id: &str) -> Result<()> {
        self.track();
        self.inner.link(subject_id, tag_id)
    }

    fn unlink(&self, subject_id: &str, tag_id: &str) -> Result<bool> {
        self.track();
        if self.fail_unlink {
            return Err(Error::Io(std::io::Error::other("unlink failed")));
        }
        self.inner.unlink(subject_id, tag_id)
    }

    fn linked_tags(&self, subject_id: &str) -> Result<Vec<Tag>> {
        self.track();
        self.inner.linked_tags(subject_id)
    }

    fn count_tag_subjects(&self, tag_id: &str) -> Result<i64> {
        self.track();
        self.inner.count_tag_subjects(tag_id)
    }

    fn clear_associations(&self, subject_id: &str) -> Result<usize> {
        self.track();
        self.inner.clear_associations(subject_id)
    }
}
