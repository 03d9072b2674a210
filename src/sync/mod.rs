mod hooks;
mod normalize;

pub use hooks::SyncHooks;
pub use normalize::normalize;

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{Error, Result, SyncOp};
use crate::store::TagStore;
use crate::types::{Subject, Tag, TagNames, TagState};

/// Find-or-create override: maps a desired name to the tag entity that
/// should be linked. The returned tag may be unsaved; the synchronizer
/// increments its frequency and persists it.
pub type TagResolver = dyn Fn(&dyn TagStore, &str) -> Result<Tag> + Send + Sync;

/// Reconciles a subject's desired tag names against its stored
/// associations.
///
/// The caller's save/delete pipeline invokes [`after_save`] after the
/// subject row is written and [`before_delete`] strictly before it is
/// removed, ideally inside one transaction per cycle so a hard failure
/// rolls back every tag mutation along with the subject itself.
///
/// [`after_save`]: TagSynchronizer::after_save
/// [`before_delete`]: TagSynchronizer::before_delete
pub struct TagSynchronizer {
    store: Arc<dyn TagStore>,
    delimiter: String,
    as_array: bool,
    batched: bool,
    hooks: Option<Arc<dyn SyncHooks>>,
    resolver: Option<Box<TagResolver>>,
}

impl TagSynchronizer {
    pub fn new(store: Arc<dyn TagStore>) -> Self {
        Self {
            store,
            delimiter: ", ".to_string(),
            as_array: false,
            batched: false,
            hooks: None,
            resolver: None,
        }
    }

    /// Separator used when deriving the textual tag-names value.
    pub fn delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    /// Derive the tag-names value as a list instead of delimited text.
    pub fn as_array(mut self, as_array: bool) -> Self {
        self.as_array = as_array;
        self
    }

    /// Write all new associations in one multi-row insert instead of one
    /// insert per tag. The resulting mapping is identical.
    pub fn batched(mut self, batched: bool) -> Self {
        self.batched = batched;
        self
    }

    pub fn hooks(mut self, hooks: Arc<dyn SyncHooks>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    /// Replaces the default find-or-create lookup for desired names.
    pub fn resolver(mut self, resolver: Box<TagResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Stores a raw desired value on the subject. No normalization and
    /// no I/O happen here; both are deferred to [`after_save`].
    ///
    /// [`after_save`]: TagSynchronizer::after_save
    pub fn set_tag_names(&self, subject: &mut Subject, value: impl Into<TagNames>) {
        subject.tag_state = TagState::Pending(value.into());
    }

    /// Current tag-names value for the subject.
    ///
    /// While an assignment is pending the raw value is echoed back
    /// verbatim, un-normalized. Once reconciled (or when nothing was
    /// assigned) the value derives from the cached relation: names
    /// joined with the configured delimiter, or the plain list in array
    /// mode. A fresh subject yields an empty value.
    pub fn tag_names(&self, subject: &Subject) -> TagNames {
        if let TagState::Pending(raw) = &subject.tag_state {
            return raw.clone();
        }

        let items: Vec<String> = subject.tags.iter().map(|t| t.name.clone()).collect();

        if self.as_array {
            TagNames::List(items)
        } else {
            TagNames::Text(items.join(&self.delimiter))
        }
    }

    /// Loads the subject's linked tags into its relation cache. The
    /// "after find" step of the record lifecycle.
    pub fn refresh(&self, subject: &mut Subject) -> Result<()> {
        subject.tags = self.store.linked_tags(&subject.id)?;
        Ok(())
    }

    /// Reconciles the pending desired names against the stored
    /// associations: unchanged tags are kept as-is, missing tags are
    /// found or created and linked (frequency +1), dropped tags are
    /// unlinked (frequency -1).
    ///
    /// If no assignment was ever made this is a complete no-op with zero
    /// store calls. A tag whose persist fails with a uniqueness conflict
    /// is skipped with a warning; any other storage failure aborts with
    /// [`Error::Sync`].
    pub fn after_save(&self, subject: &mut Subject) -> Result<()> {
        let raw = match &subject.tag_state {
            TagState::Unset => return Ok(()),
            TagState::Pending(raw) | TagState::Reconciled(raw) => raw.clone(),
        };

        let desired = normalize(&raw);

        // An input that normalizes to nothing is "no change requested",
        // not "clear every tag"
        if desired.is_empty() {
            subject.tag_state = TagState::Reconciled(raw);
            return Ok(());
        }

        let mut old: HashMap<String, Tag> = self
            .store
            .linked_tags(&subject.id)?
            .into_iter()
            .map(|t| (t.name.clone(), t))
            .collect();

        let mut kept: Vec<Tag> = Vec::new();
        let mut to_create: Vec<String> = Vec::new();
        for name in desired {
            match old.remove(&name) {
                Some(tag) => kept.push(tag),
                None => to_create.push(name),
            }
        }
        // Whatever desired names didn't claim loses its association
        let to_delete: Vec<Tag> = old.into_values().collect();

        tracing::debug!(
            subject = %subject.id,
            keep = kept.len(),
            create = to_create.len(),
            delete = to_delete.len(),
            "reconciling tags"
        );

        let mut linked: Vec<Tag> = Vec::with_capacity(to_create.len());
        let mut rows: Vec<(String, String)> = Vec::new();

        for name in to_create {
            let mut tag = self
                .resolve(&name)
                .map_err(|e| Error::sync(SyncOp::Create, name.as_str(), e))?;

            tag.frequency += 1;
            match self.persist(&tag) {
                Ok(()) => {}
                Err(Error::AlreadyExists) => {
                    tracing::warn!(name = %name, "tag failed to save, skipping association");
                    continue;
                }
                Err(e) => return Err(Error::sync(SyncOp::Create, name.as_str(), e)),
            }

            if self.batched {
                rows.push((subject.id.clone(), tag.id.clone()));
            } else {
                self.with_hooks(|h| h.before_link(&tag));
                self.store
                    .link(&subject.id, &tag.id)
                    .map_err(|e| Error::sync(SyncOp::Link, name.as_str(), e))?;
                self.with_hooks(|h| h.after_link(&tag));
            }
            linked.push(tag);
        }

        if !rows.is_empty() {
            for tag in &linked {
                self.with_hooks(|h| h.before_link(tag));
            }
            self.store
                .batch_insert_associations(&rows)
                .map_err(|e| Error::sync(SyncOp::Link, name_list(&linked), e))?;
            for tag in &linked {
                self.with_hooks(|h| h.after_link(tag));
            }
        }

        for mut tag in to_delete {
            tag.frequency -= 1;
            self.store
                .save_tag(&tag)
                .map_err(|e| Error::sync(SyncOp::Delete, tag.name.as_str(), e))?;

            self.with_hooks(|h| h.before_unlink(&tag));
            self.store
                .unlink(&subject.id, &tag.id)
                .map_err(|e| Error::sync(SyncOp::Unlink, tag.name.as_str(), e))?;
            self.with_hooks(|h| h.after_unlink(&tag));
        }

        for tag in &kept {
            self.with_hooks(|h| h.on_keep(tag));
        }

        kept.extend(linked);
        subject.tags = kept;
        subject.tag_state = TagState::Reconciled(raw);
        Ok(())
    }

    /// Detaches every tag from the subject: each linked tag's frequency
    /// drops by one and all of the subject's association rows are
    /// deleted. Must run strictly before the subject row itself is
    /// removed.
    pub fn before_delete(&self, subject: &mut Subject) -> Result<()> {
        let detached = self.store.linked_tags(&subject.id)?;

        if !detached.is_empty() {
            for tag in &detached {
                self.with_hooks(|h| h.before_unlink(tag));
            }

            let ids: Vec<String> = detached.iter().map(|t| t.id.clone()).collect();
            self.store
                .bulk_decrement_frequency(&ids, 1)
                .map_err(|e| Error::sync(SyncOp::Delete, name_list(&detached), e))?;
            self.store
                .clear_associations(&subject.id)
                .map_err(|e| Error::sync(SyncOp::Unlink, name_list(&detached), e))?;

            for tag in &detached {
                self.with_hooks(|h| h.after_unlink(tag));
            }
        }

        subject.tags.clear();
        Ok(())
    }

    fn resolve(&self, name: &str) -> Result<Tag> {
        if let Some(resolver) = &self.resolver {
            return resolver(self.store.as_ref(), name);
        }

        match self.store.get_tag_by_name(name)? {
            Some(tag) => Ok(tag),
            None => Ok(Tag::new(name)),
        }
    }

    fn persist(&self, tag: &Tag) -> Result<()> {
        // Resolved tags may be brand new or already stored
        match self.store.save_tag(tag) {
            Err(Error::NotFound) => self.store.create_tag(tag),
            other => other,
        }
    }

    fn with_hooks(&self, f: impl Fn(&dyn SyncHooks)) {
        if let Some(hooks) = &self.hooks {
            f(hooks.as_ref());
        }
    }
}

fn name_list(tags: &[Tag]) -> String {
    tags.iter()
        .map(|t| t.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
