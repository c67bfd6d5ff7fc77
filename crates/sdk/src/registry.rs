//! Process-wide memoization of SDK handles.
//!
//! The registry is an explicit, lifetime-scoped object owned by the host
//! application (created at startup, dropped at shutdown). Handles are keyed
//! by project identity plus resolved SDK root, so re-opening a project at a
//! different path yields a fresh handle.

use crate::sdk::FlutterSdk;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Maps cache keys to memoized [`FlutterSdk`] handles.
///
/// Safe under concurrent lookups; at most one handle is constructed per key
/// even under concurrent first access (construction happens under the lock,
/// which is acceptable because it only reads a few marker files).
#[derive(Default)]
pub struct SdkRegistry {
    sdks: Mutex<HashMap<String, Arc<FlutterSdk>>>,
}

impl SdkRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the handle memoized under `key`, constructing it with `create`
    /// on first access. A `None` from `create` is not memoized, so a later
    /// lookup retries (e.g. after the SDK finishes installing).
    pub fn get_or_create(
        &self,
        key: &str,
        create: impl FnOnce() -> Option<Arc<FlutterSdk>>,
    ) -> Option<Arc<FlutterSdk>> {
        let mut sdks = self.sdks.lock();
        if let Some(sdk) = sdks.get(key) {
            return Some(Arc::clone(sdk));
        }
        let sdk = create()?;
        debug!(key, home = %sdk.home().display(), "registered SDK handle");
        sdks.insert(key.to_string(), Arc::clone(&sdk));
        Some(sdk)
    }

    /// Number of memoized handles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sdks.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sdks.lock().is_empty()
    }

    /// Drop all memoized handles.
    pub fn clear(&self) {
        self.sdks.lock().clear();
    }
}

/// Cache key for a project/SDK-root pair, e.g. `e41cfa3d:/home/dev/flutter`.
///
/// The project identity is hashed so opaque host identifiers of any length
/// produce short stable keys.
#[must_use]
pub fn cache_key(project_id: &str, sdk_root: &Path) -> String {
    let digest = Sha256::digest(project_id.as_bytes());
    let mut prefix = String::with_capacity(8);
    for byte in &digest[..4] {
        prefix.push_str(&format!("{byte:02x}"));
    }
    format!("{}:{}", prefix, sdk_root.display())
}
