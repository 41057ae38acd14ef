use std::sync::Arc;

use crate::{gateway::Gateways, model::ModelManager};

#[derive(Debug, Clone)]
pub struct AppState {
    mm: ModelManager,
    gateways: Gateways,
    storefront: Arc<Storefront>,
}

/// Settings the checkout and upload flows need at request time.
#[derive(Debug)]
pub struct Storefront {
    /// Externally reachable base url, no trailing slash
    pub public_url: String,
    pub currency: String,
}

impl AppState {
    pub fn new(mm: ModelManager, gateways: Gateways, storefront: Storefront) -> Self {
        Self {
            mm,
            gateways,
            storefront: Arc::new(storefront),
        }
    }

    pub fn pool(&self) -> &ModelManager {
        &self.mm
    }

    pub fn gateways(&self) -> &Gateways {
        &self.gateways
    }

    pub fn storefront(&self) -> &Storefront {
        &self.storefront
    }
}
