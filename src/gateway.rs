use anyhow::Context;
use axum::async_trait;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Remote order as the gateway reports it. `receipt` carries the transaction
/// id we handed over at creation; it is the only link back to the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub receipt: Option<String>,
    pub status: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Creates a remote order for `amount_minor` (smallest currency unit).
    async fn create_order(
        &self,
        amount_minor: i64,
        currency: &str,
        receipt: &str,
    ) -> anyhow::Result<Order>;

    /// Fetches an order by id; Ok(None) when the gateway does not know it.
    async fn fetch_order(&self, order_id: &str) -> anyhow::Result<Option<Order>>;
}

/// HMAC-SHA256 over `"{order_id}|{payment_id}"`, hex-encoded. This is the
/// signature scheme the gateway attaches to checkout callbacks.
pub fn sign_payload(secret: &str, order_id: &str, payment_id: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("hmac accepts keys of any length");
    mac.update(format!("{}|{}", order_id, payment_id).as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time check of a gateway-supplied signature.
pub fn verify_signature(secret: &str, order_id: &str, payment_id: &str, signature: &str) -> bool {
    let Ok(expected) = hex::decode(signature) else {
        return false;
    };
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("hmac accepts keys of any length");
    mac.update(format!("{}|{}", order_id, payment_id).as_bytes());
    mac.verify_slice(&expected).is_ok()
}

/// Razorpay-style REST client: basic auth with the key pair, JSON bodies.
#[derive(Clone)]
pub struct RazorpayGateway {
    client: reqwest::Client,
    base_url: String,
    key_id: String,
    key_secret: String,
}

#[derive(Debug, Serialize)]
struct CreateOrderBody<'a> {
    amount: i64,
    currency: &'a str,
    receipt: &'a str,
}

impl RazorpayGateway {
    pub fn new(base_url: &str, key_id: &str, key_secret: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .context("build gateway http client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            key_id: key_id.to_string(),
            key_secret: key_secret.to_string(),
        })
    }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    async fn create_order(
        &self,
        amount_minor: i64,
        currency: &str,
        receipt: &str,
    ) -> anyhow::Result<Order> {
        let resp = self
            .client
            .post(format!("{}/v1/orders", self.base_url))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&CreateOrderBody {
                amount: amount_minor,
                currency,
                receipt,
            })
            .send()
            .await
            .context("gateway create order request")?;

        if !resp.status().is_success() {
            anyhow::bail!("gateway create order returned {}", resp.status());
        }
        let order = resp.json::<Order>().await.context("decode order")?;
        Ok(order)
    }

    async fn fetch_order(&self, order_id: &str) -> anyhow::Result<Option<Order>> {
        let resp = self
            .client
            .get(format!("{}/v1/orders/{}", self.base_url, order_id))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .send()
            .await
            .context("gateway fetch order request")?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            anyhow::bail!("gateway fetch order returned {}", resp.status());
        }
        let order = resp.json::<Order>().await.context("decode order")?;
        Ok(Some(order))
    }
}
