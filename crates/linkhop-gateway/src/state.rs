use std::sync::Arc;

use linkhop_redirector::Redirector;
use linkhop_shortener::Shortener;

#[derive(Clone)]
pub struct AppState {
    redirector: Arc<dyn Redirector>,
    shortener: Arc<dyn Shortener>,
}

impl AppState {
    pub fn new(redirector: Arc<dyn Redirector>, shortener: Arc<dyn Shortener>) -> Self {
        Self {
            redirector,
            shortener,
        }
    }

    pub fn redirector(&self) -> &dyn Redirector {
        self.redirector.as_ref()
    }

    pub fn shortener(&self) -> &dyn Shortener {
        self.shortener.as_ref()
    }
}
