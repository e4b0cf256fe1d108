//! Player name and identifier lookup.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

/// Resolves players between display names and stable identifiers.
///
/// Lookups may hit a remote profile service, so both directions are async.
#[async_trait]
pub trait PlayerDirectory: Send + Sync {
    /// Identifier for a display name, case-insensitive.
    async fn resolve_id(&self, name: &str) -> Option<Uuid>;

    /// Current display name for an identifier.
    async fn display_name(&self, id: Uuid) -> Option<String>;
}

/// In-memory directory populated as players are seen.
#[derive(Debug, Default)]
pub struct StaticPlayerDirectory {
    by_name: RwLock<HashMap<String, Uuid>>,
    by_id: RwLock<HashMap<Uuid, String>>,
}

impl StaticPlayerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a player, replacing any previous name for `id`.
    pub fn insert(&self, name: impl Into<String>, id: Uuid) {
        let name = name.into();
        let mut by_id = self.by_id.write();
        if let Some(previous) = by_id.insert(id, name.clone()) {
            self.by_name.write().remove(&previous.to_ascii_lowercase());
        }
        self.by_name.write().insert(name.to_ascii_lowercase(), id);
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with_player(self, name: impl Into<String>, id: Uuid) -> Self {
        self.insert(name, id);
        self
    }

    pub fn len(&self) -> usize {
        self.by_id.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.read().is_empty()
    }
}

#[async_trait]
impl PlayerDirectory for StaticPlayerDirectory {
    async fn resolve_id(&self, name: &str) -> Option<Uuid> {
        self.by_name.read().get(&name.to_ascii_lowercase()).copied()
    }

    async fn display_name(&self, id: Uuid) -> Option<String> {
        self.by_id.read().get(&id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lookup_both_ways() {
        let id = Uuid::new_v4();
        let directory = StaticPlayerDirectory::new().with_player("Alice", id);

        assert_eq!(directory.resolve_id("alice").await, Some(id));
        assert_eq!(directory.display_name(id).await.as_deref(), Some("Alice"));
        assert_eq!(directory.resolve_id("bob").await, None);
    }

    #[tokio::test]
    async fn test_rename_drops_old_name() {
        let id = Uuid::new_v4();
        let directory = StaticPlayerDirectory::new().with_player("Alice", id);
        directory.insert("Alicia", id);

        assert_eq!(directory.resolve_id("alice").await, None);
        assert_eq!(directory.resolve_id("ALICIA").await, Some(id));
        assert_eq!(directory.len(), 1);
    }
}
