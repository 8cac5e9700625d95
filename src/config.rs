use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    pub key_id: String,
    pub key_secret: String,
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SynthConfig {
    pub api_key: String,
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub currency: String,
    pub jwt: JwtConfig,
    pub gateway: GatewayConfig,
    pub synth: SynthConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let currency = std::env::var("CURRENCY").unwrap_or_else(|_| "INR".into());
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            ttl_days: std::env::var("JWT_TTL_DAYS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(7),
        };
        let gateway = GatewayConfig {
            key_id: std::env::var("GATEWAY_KEY_ID")?,
            key_secret: std::env::var("GATEWAY_KEY_SECRET")?,
            base_url: std::env::var("GATEWAY_URL")
                .unwrap_or_else(|_| "https://api.razorpay.com".into()),
        };
        let synth = SynthConfig {
            api_key: std::env::var("SYNTH_API_KEY")?,
            base_url: std::env::var("SYNTH_URL")
                .unwrap_or_else(|_| "https://clipdrop-api.co".into()),
        };
        Ok(Self {
            database_url,
            currency,
            jwt,
            gateway,
            synth,
        })
    }
}
