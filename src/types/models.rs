use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A shared, frequency-counted label. Tags are created lazily on first
/// use and are never deleted automatically when their frequency reaches
/// zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub name: String,
    /// Count of subjects currently linked to this tag. Best-effort: kept
    /// in step with the association table by the synchronizer, not
    /// enforced by the storage layer.
    pub frequency: i64,
    pub created_at: DateTime<Utc>,
}

impl Tag {
    /// Builds an unsaved tag with frequency zero.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            frequency: 0,
            created_at: Utc::now(),
        }
    }
}

/// Value of the tag-names attribute: delimited text or an ordered list.
///
/// Both forms feed the same normalization on save, so a list element may
/// itself contain commas and contribute several names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagNames {
    Text(String),
    List(Vec<String>),
}

impl From<&str> for TagNames {
    fn from(value: &str) -> Self {
        TagNames::Text(value.to_string())
    }
}

impl From<String> for TagNames {
    fn from(value: String) -> Self {
        TagNames::Text(value)
    }
}

impl From<Vec<String>> for TagNames {
    fn from(value: Vec<String>) -> Self {
        TagNames::List(value)
    }
}

impl From<Vec<&str>> for TagNames {
    fn from(value: Vec<&str>) -> Self {
        TagNames::List(value.into_iter().map(String::from).collect())
    }
}

impl From<&[&str]> for TagNames {
    fn from(value: &[&str]) -> Self {
        TagNames::List(value.iter().map(|s| s.to_string()).collect())
    }
}

/// Lifecycle of the tag-names attribute within one save cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TagState {
    /// Attribute never touched; saving performs no tag work at all.
    #[default]
    Unset,
    /// Raw assigned value, not yet persisted. Readbacks echo it verbatim.
    Pending(TagNames),
    /// Last committed desired value. Re-saving diffs against it and nets
    /// to zero changes.
    Reconciled(TagNames),
}

/// The entity being tagged. Hosts keep their own row for it; the
/// synchronizer only needs its id, a relation cache, and the attribute
/// state.
#[derive(Debug, Clone)]
pub struct Subject {
    pub id: String,
    /// In-memory cache of the linked tags, refreshed after find and
    /// after each reconciliation.
    pub tags: Vec<Tag>,
    pub tag_state: TagState,
}

impl Subject {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tags: Vec::new(),
            tag_state: TagState::Unset,
        }
    }
}
