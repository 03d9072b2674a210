mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::types::Tag;

/// TagStore defines the persistence capability the synchronizer drives.
///
/// The bulk methods have default implementations in terms of the
/// required ones; backends with a cheaper native equivalent should
/// override them.
pub trait TagStore: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // Tag operations
    fn create_tag(&self, tag: &Tag) -> Result<()>;
    /// Updates an existing tag row. Returns `Error::NotFound` if the tag
    /// was never persisted.
    fn save_tag(&self, tag: &Tag) -> Result<()>;
    fn get_tag_by_id(&self, id: &str) -> Result<Option<Tag>>;
    /// Exact, case-sensitive name match. Absence is `Ok(None)`, not an
    /// error.
    fn get_tag_by_name(&self, name: &str) -> Result<Option<Tag>>;
    fn list_tags(&self, cursor: &str, limit: i32) -> Result<Vec<Tag>>;
    fn delete_tag(&self, id: &str) -> Result<bool>;

    // Subject-Tag association operations
    fn link(&self, subject_id: &str, tag_id: &str) -> Result<()>;
    fn unlink(&self, subject_id: &str, tag_id: &str) -> Result<bool>;
    fn linked_tags(&self, subject_id: &str) -> Result<Vec<Tag>>;
    fn count_tag_subjects(&self, tag_id: &str) -> Result<i64>;
    /// Deletes every association row for a subject, returning how many
    /// were removed.
    fn clear_associations(&self, subject_id: &str) -> Result<usize>;

    // Bulk variants
    fn bulk_decrement_frequency(&self, tag_ids: &[String], delta: i64) -> Result<()> {
        for id in tag_ids {
            if let Some(mut tag) = self.get_tag_by_id(id)? {
                tag.frequency -= delta;
                self.save_tag(&tag)?;
            }
        }
        Ok(())
    }

    fn batch_insert_associations(&self, rows: &[(String, String)]) -> Result<()> {
        for (subject_id, tag_id) in rows {
            self.link(subject_id, tag_id)?;
        }
        Ok(())
    }
}
