//! Configuration and capability tracking.
//!
//! The manager knows which provider credentials are present, whether
//! live-only mode is enabled, and whether the current execution context can
//! reach a given upstream directly or must route through a proxy. It does
//! no network I/O; it is stored settings plus a lookup table. Credential
//! and flag changes persist to a YAML document and emit a
//! configuration-changed notification that the facade uses to invalidate
//! its caches.

use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{info, warn};

use forest_common::{Category, Route};

/// Durable per-provider credentials and the live-only flag.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub firms_map_key: Option<String>,
    #[serde(default)]
    pub openweather_api_key: Option<String>,
    #[serde(default)]
    pub gfw_api_key: Option<String>,
    /// When true, the mock step is removed from every chain and resolution
    /// failures propagate instead of silently degrading.
    #[serde(default)]
    pub live_only: bool,
}

/// Facts about the host the resolver runs in, injected at startup rather
/// than inferred from runtime globals so both contexts are testable.
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    /// Whether this context may call upstreams directly (false in a
    /// cross-origin-restricted host).
    pub can_call_direct: bool,
    /// Base URL of the proxy surface, if one is reachable.
    pub proxy_base: Option<String>,
}

impl ExecutionContext {
    /// A server-side context: direct calls allowed, no proxy needed.
    pub fn server() -> Self {
        Self {
            can_call_direct: true,
            proxy_base: None,
        }
    }

    /// A cross-origin-restricted context that routes through a proxy.
    pub fn restricted(proxy_base: impl Into<String>) -> Self {
        Self {
            can_call_direct: false,
            proxy_base: Some(proxy_base.into()),
        }
    }
}

/// Snapshot of what resolution may do for one category.
#[derive(Debug, Clone)]
pub struct Capability {
    pub category: Category,
    pub has_credential: bool,
    pub can_call_direct: bool,
    pub can_call_via_proxy: bool,
    pub live_only: bool,
}

/// Whether a category's upstream is reachable from a cross-origin-
/// restricted context. FIRMS and GFW do not serve permissive CORS headers;
/// GIBS, GBIF, and OpenWeather do.
fn direct_accessible(category: Category) -> bool {
    matches!(
        category,
        Category::Weather | Category::Biodiversity | Category::Satellite
    )
}

pub struct CapabilityManager {
    settings: RwLock<Settings>,
    context: ExecutionContext,
    path: Option<PathBuf>,
    changed_tx: broadcast::Sender<()>,
}

impl CapabilityManager {
    /// Build a manager from explicit settings, without durable storage.
    pub fn new(settings: Settings, context: ExecutionContext) -> Self {
        let (changed_tx, _) = broadcast::channel(16);
        Self {
            settings: RwLock::new(settings),
            context,
            path: None,
            changed_tx,
        }
    }

    /// Load settings from a YAML document. A missing file starts from
    /// defaults; a malformed one is a configuration error downgraded to
    /// "capability absent" with a warning, never fatal.
    pub fn load(path: impl Into<PathBuf>, context: ExecutionContext) -> Self {
        let path = path.into();
        let settings = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_yaml::from_str(&raw) {
                Ok(settings) => settings,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "malformed settings, starting from defaults");
                    Settings::default()
                }
            },
            Err(_) => {
                info!(path = %path.display(), "no settings file, starting from defaults");
                Settings::default()
            }
        };

        let (changed_tx, _) = broadcast::channel(16);
        Self {
            settings: RwLock::new(settings),
            context,
            path: Some(path),
            changed_tx,
        }
    }

    pub fn settings(&self) -> Settings {
        self.settings.read().expect("settings lock poisoned").clone()
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    pub fn has_credential(&self, category: Category) -> bool {
        let settings = self.settings.read().expect("settings lock poisoned");
        match category {
            Category::Fire => settings.firms_map_key.is_some(),
            Category::Weather => settings.openweather_api_key.is_some(),
            // GFW accepts anonymous queries; GBIF and GIBS are keyless.
            Category::Deforestation | Category::Biodiversity | Category::Satellite => true,
        }
    }

    pub fn is_live_only(&self) -> bool {
        self.settings.read().expect("settings lock poisoned").live_only
    }

    /// Preferred non-mock route for a category in this context.
    pub fn resolve_route(&self, category: Category) -> Route {
        if self.context.can_call_direct || direct_accessible(category) {
            Route::Direct
        } else {
            Route::Proxy
        }
    }

    /// Full capability snapshot for one category.
    pub fn capability(&self, category: Category) -> Capability {
        Capability {
            category,
            has_credential: self.has_credential(category),
            can_call_direct: (self.context.can_call_direct || direct_accessible(category))
                && self.has_credential(category),
            can_call_via_proxy: self.context.proxy_base.is_some(),
            live_only: self.is_live_only(),
        }
    }

    /// Subscribe to configuration-changed notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.changed_tx.subscribe()
    }

    /// Apply a settings mutation, persist, and notify subscribers.
    pub fn update(&self, mutate: impl FnOnce(&mut Settings)) {
        {
            let mut settings = self.settings.write().expect("settings lock poisoned");
            mutate(&mut settings);
        }
        self.persist();
        // Subscribers may have gone away; a send error is not a fault.
        let _ = self.changed_tx.send(());
    }

    pub fn set_live_only(&self, live_only: bool) {
        info!(live_only, "live-only mode toggled");
        self.update(|s| s.live_only = live_only);
    }

    fn persist(&self) {
        let Some(path) = &self.path else { return };
        let settings = self.settings.read().expect("settings lock poisoned").clone();

        match serde_yaml::to_string(&settings) {
            Ok(raw) => {
                if let Err(e) = write_atomically(path, &raw) {
                    warn!(path = %path.display(), error = %e, "failed to persist settings");
                }
            }
            Err(e) => warn!(error = %e, "failed to serialize settings"),
        }
    }
}

fn write_atomically(path: &Path, contents: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("yaml.tmp");
    std::fs::write(&tmp, contents)?;
    std::fs::rename(&tmp, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keyed_settings() -> Settings {
        Settings {
            firms_map_key: Some("firms-key".to_string()),
            openweather_api_key: None,
            gfw_api_key: None,
            live_only: false,
        }
    }

    #[test]
    fn test_credentials_per_category() {
        let manager = CapabilityManager::new(keyed_settings(), ExecutionContext::server());
        assert!(manager.has_credential(Category::Fire));
        assert!(!manager.has_credential(Category::Weather));
        // Keyless upstreams always count as credentialed.
        assert!(manager.has_credential(Category::Biodiversity));
        assert!(manager.has_credential(Category::Satellite));
    }

    #[test]
    fn test_route_table_in_restricted_context() {
        let manager = CapabilityManager::new(
            Settings::default(),
            ExecutionContext::restricted("http://proxy"),
        );
        // CORS-hostile upstreams must go through the proxy.
        assert_eq!(manager.resolve_route(Category::Fire), Route::Proxy);
        assert_eq!(manager.resolve_route(Category::Deforestation), Route::Proxy);
        // CORS-friendly upstreams stay direct even in a restricted context.
        assert_eq!(manager.resolve_route(Category::Weather), Route::Direct);
        assert_eq!(manager.resolve_route(Category::Biodiversity), Route::Direct);
        assert_eq!(manager.resolve_route(Category::Satellite), Route::Direct);
    }

    #[test]
    fn test_route_table_in_server_context() {
        let manager = CapabilityManager::new(Settings::default(), ExecutionContext::server());
        for category in Category::ALL {
            assert_eq!(manager.resolve_route(category), Route::Direct);
        }
    }

    #[test]
    fn test_update_notifies_subscribers() {
        let manager = CapabilityManager::new(Settings::default(), ExecutionContext::server());
        let mut rx = manager.subscribe();
        manager.set_live_only(true);

        assert!(manager.is_live_only());
        assert!(rx.try_recv().is_ok());
    }

    #[test]
    fn test_settings_round_trip_through_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.yaml");

        let manager = CapabilityManager::load(&path, ExecutionContext::server());
        manager.update(|s| s.openweather_api_key = Some("ow-key".to_string()));

        let reloaded = CapabilityManager::load(&path, ExecutionContext::server());
        assert_eq!(
            reloaded.settings().openweather_api_key.as_deref(),
            Some("ow-key")
        );
    }

    #[test]
    fn test_malformed_settings_degrade_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.yaml");
        std::fs::write(&path, ":: not yaml {{{{").unwrap();

        let manager = CapabilityManager::load(&path, ExecutionContext::server());
        assert!(!manager.is_live_only());
        assert!(!manager.has_credential(Category::Fire));
    }
}
