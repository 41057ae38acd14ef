//! External collaborators: payment processor, video platform and file storage.

use std::sync::Arc;

mod error;
pub use error::{GatewayError, GatewayResult};

mod payment;
pub use payment::{
    CheckoutRequest, CheckoutSession, PaymentConfirmation, PaymentGateway, StripeGateway,
};

mod storage;
pub use storage::{FileStorage, LocalStorage};

mod video;
pub use video::{MuxVideoHost, VideoHost};

use crate::{Config, utils::uploads::get_uploads_dir};

/// Url prefix the local upload dir is served under.
pub static STATIC_PREFIX: &str = "/api/v1/static";

#[derive(Debug, Clone)]
pub struct Gateways {
    payment: Arc<dyn PaymentGateway>,
    video: Arc<dyn VideoHost>,
    storage: Arc<dyn FileStorage>,
}

impl Gateways {
    pub fn new(
        payment: Arc<dyn PaymentGateway>,
        video: Arc<dyn VideoHost>,
        storage: Arc<dyn FileStorage>,
    ) -> Self {
        Self {
            payment,
            video,
            storage,
        }
    }

    /// Production gateways built from config.
    pub fn from_config(config: &Config) -> GatewayResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        let payment = StripeGateway::new(
            client.clone(),
            config.payment().api_base(),
            config.payment().secret_key(),
        );
        let video = MuxVideoHost::new(
            client,
            config.video().api_base(),
            config.video().token_id(),
            config.video().token_secret(),
        );
        let storage = LocalStorage::new(get_uploads_dir(config.app().upload_dir())?, STATIC_PREFIX);

        Ok(Self::new(Arc::new(payment), Arc::new(video), Arc::new(storage)))
    }

    pub fn payment(&self) -> &dyn PaymentGateway {
        self.payment.as_ref()
    }

    pub fn video(&self) -> &dyn VideoHost {
        self.video.as_ref()
    }

    pub fn storage(&self) -> &dyn FileStorage {
        self.storage.as_ref()
    }
}
