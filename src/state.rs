use std::sync::Arc;

use crate::auth::LoginThrottle;
use crate::config::AppConfig;
use crate::db::ContentStore;
use crate::upload::UploadStore;

/// Handles shared by every handler, injected through axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn ContentStore>,
    pub uploads: Arc<dyn UploadStore>,
    pub throttle: Arc<LoginThrottle>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        store: Arc<dyn ContentStore>,
        uploads: Arc<dyn UploadStore>,
    ) -> Self {
        let throttle = LoginThrottle::new(
            config.auth.login_max_attempts,
            config.auth.login_window_secs,
        );
        Self {
            config: Arc::new(config),
            store,
            uploads,
            throttle: Arc::new(throttle),
        }
    }

    pub fn store(&self) -> &dyn ContentStore {
        self.store.as_ref()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::db::MemoryStore;
    use crate::upload::LocalUploads;

    /// State over a memory store and a throwaway upload directory. Keep the
    /// returned `TempDir` alive for the duration of the test.
    pub fn test_state() -> (AppState, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.auth.bcrypt_cost = 4;
        config.auth.login_max_attempts = 0;
        config.uploads.dir = dir.path().display().to_string();
        let uploads = LocalUploads::new(dir.path(), "/uploads", config.uploads.max_bytes);
        let state = AppState::new(config, Arc::new(MemoryStore::new()), Arc::new(uploads));
        (state, dir)
    }
}
