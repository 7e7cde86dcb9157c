use std::sync::Arc;

use application::{PresenceHub, SessionStore, UploadStore};

#[derive(Clone)]
pub struct AppState {
    pub hub: PresenceHub,
    pub sessions: Arc<dyn SessionStore>,
    pub uploads: Arc<dyn UploadStore>,
}

impl AppState {
    pub fn new(
        hub: PresenceHub,
        sessions: Arc<dyn SessionStore>,
        uploads: Arc<dyn UploadStore>,
    ) -> Self {
        Self {
            hub,
            sessions,
            uploads,
        }
    }
}
