use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::AppConfig;
use crate::gateway::{PaymentGateway, RazorpayGateway};
use crate::store::{PgStore, Store};
use crate::synthesis::{HttpSynthesizer, ImageSynthesizer};

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn Store>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub synthesizer: Arc<dyn ImageSynthesizer>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        let gateway = Arc::new(RazorpayGateway::new(
            &config.gateway.base_url,
            &config.gateway.key_id,
            &config.gateway.key_secret,
        )?) as Arc<dyn PaymentGateway>;

        let synthesizer = Arc::new(HttpSynthesizer::new(
            &config.synth.base_url,
            &config.synth.api_key,
        )?) as Arc<dyn ImageSynthesizer>;

        let store = Arc::new(PgStore::new(db.clone())) as Arc<dyn Store>;

        Ok(Self {
            db,
            config,
            store,
            gateway,
            synthesizer,
        })
    }

    pub fn from_parts(
        db: PgPool,
        config: Arc<AppConfig>,
        store: Arc<dyn Store>,
        gateway: Arc<dyn PaymentGateway>,
        synthesizer: Arc<dyn ImageSynthesizer>,
    ) -> Self {
        Self {
            db,
            config,
            store,
            gateway,
            synthesizer,
        }
    }

}
