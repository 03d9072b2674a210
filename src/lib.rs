//! # Taggable
//!
//! Diff-based tag synchronization for Rust data layers.
//!
//! A [`sync::TagSynchronizer`] keeps a subject's free-text or list
//! "tag names" attribute in step with a many-to-many subject↔tag
//! association, maintaining per-tag usage-frequency counters. On save it
//! diffs the desired names against the stored links and applies only the
//! difference; on delete it detaches everything and decrements the
//! counters.
//!
//! Persistence goes through the [`store::TagStore`] trait. A SQLite
//! reference backend is bundled; any host data layer can implement the
//! trait instead.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! taggable = "0.1"
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use taggable::store::{SqliteStore, TagStore};
//! use taggable::sync::TagSynchronizer;
//! use taggable::types::Subject;
//!
//! let store = Arc::new(SqliteStore::new("./data/tags.db").unwrap());
//! store.initialize().unwrap();
//!
//! let sync = TagSynchronizer::new(store.clone());
//!
//! let mut post = Subject::new("post-1");
//! store.create_subject(&post.id).unwrap();
//!
//! sync.set_tag_names(&mut post, "rust, database, orm");
//! sync.after_save(&mut post).unwrap();
//!
//! // Before removing the subject row:
//! sync.before_delete(&mut post).unwrap();
//! store.delete_subject(&post.id).unwrap();
//! ```

pub mod error;
pub mod store;
pub mod sync;
pub mod types;
