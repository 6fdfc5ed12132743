//! # Web API Application State
//!
//! Shared state handed to every handler: settings, the drink store and the
//! token verifier. Built once at startup; nothing in it is mutated per request.

use std::sync::Arc;

use axum::extract::FromRef;

use crate::auth::TokenVerifier;
use crate::config::Settings;
use crate::storage::DrinkStore;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub drinks: Arc<dyn DrinkStore>,
    pub verifier: Arc<TokenVerifier>,
}

impl AppState {
    pub fn new(
        settings: Settings,
        drinks: Arc<dyn DrinkStore>,
        verifier: Arc<TokenVerifier>,
    ) -> Self {
        Self {
            settings: Arc::new(settings),
            drinks,
            verifier,
        }
    }

    pub fn drinks(&self) -> &dyn DrinkStore {
        self.drinks.as_ref()
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("settings", &self.settings)
            .field("verifier", &self.verifier)
            .finish_non_exhaustive()
    }
}

impl FromRef<AppState> for Arc<TokenVerifier> {
    fn from_ref(state: &AppState) -> Self {
        state.verifier.clone()
    }
}
