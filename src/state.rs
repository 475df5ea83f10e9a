//! Shared application state handed to every handler and middleware.

use std::sync::Arc;

use crate::{middleware::auth::TokenVerifier, services::car_service::CarService};

/// Constructed once in `main` (or a test) and cloned into each request.
#[derive(Clone)]
pub struct AppState {
    pub cars: CarService,
    pub tokens: Arc<TokenVerifier>,
}
