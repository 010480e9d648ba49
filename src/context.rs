use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::{LanguageModelService, TicketStore};

#[derive(Clone)]
pub struct AppContext {
    pub config: AppConfig,
    pub tickets: Arc<dyn TicketStore>,
    /// `None` when no provider is configured; classification then uses defaults.
    pub language_model: Option<Arc<dyn LanguageModelService>>,
}

impl AppContext {
    pub fn new(
        config: AppConfig,
        tickets: Arc<dyn TicketStore>,
        language_model: Option<Arc<dyn LanguageModelService>>,
    ) -> Self {
        Self {
            config,
            tickets,
            language_model,
        }
    }
}
