use crate::types::Tag;

/// Observer callbacks fired while a subject's tags are reconciled.
///
/// Every method defaults to a no-op; implement only what you need.
/// Hooks run synchronously inside the save/delete cycle, so they see the
/// tag state as it is being committed.
pub trait SyncHooks: Send + Sync {
    fn before_link(&self, _tag: &Tag) {}
    fn after_link(&self, _tag: &Tag) {}
    fn before_unlink(&self, _tag: &Tag) {}
    fn after_unlink(&self, _tag: &Tag) {}
    /// Fired once per tag that was already linked and stays linked.
    fn on_keep(&self, _tag: &Tag) {}
}
