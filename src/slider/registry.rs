//! Process-wide registry of live navigators

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use super::navigator::Navigator;
use super::transport::MessageId;

/// Maps an outbound message id to the navigator controlling it.
///
/// Constructed once per process and shared by `Arc`. The registry is the only
/// long-lived owner of a registered navigator.
pub struct NavigatorRegistry {
    navigators: RwLock<HashMap<MessageId, Arc<Navigator>>>,
}

impl NavigatorRegistry {
    pub fn new() -> Self {
        Self {
            navigators: RwLock::new(HashMap::new()),
        }
    }

    /// Insert or overwrite the entry for `key`
    pub async fn register(&self, key: MessageId, navigator: Arc<Navigator>) {
        let mut navigators = self.navigators.write().await;
        if navigators.insert(key.clone(), navigator).is_some() {
            debug!("Replaced navigator registered for message {}", key);
        }
        metrics::gauge!("slider_registered_navigators", navigators.len() as f64);
    }

    pub async fn lookup(&self, key: &str) -> Option<Arc<Navigator>> {
        self.navigators.read().await.get(key).cloned()
    }

    /// Remove the entry for `key`, returning whether one was present
    pub async fn remove(&self, key: &str) -> bool {
        let mut navigators = self.navigators.write().await;
        let removed = navigators.remove(key).is_some();
        metrics::gauge!("slider_registered_navigators", navigators.len() as f64);
        removed
    }

    pub async fn len(&self) -> usize {
        self.navigators.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.navigators.read().await.is_empty()
    }

    /// Snapshot of every registered navigator
    pub async fn snapshot(&self) -> Vec<Arc<Navigator>> {
        self.navigators.read().await.values().cloned().collect()
    }
}

impl Default for NavigatorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
