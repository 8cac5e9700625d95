use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ApiError;
use crate::store::Store;
use crate::synthesis::ImageSynthesizer;

#[derive(Debug)]
pub struct GeneratedImage {
    pub credit_balance: i32,
    pub data_url: String,
}

/// Synthesizes one image for one credit.
///
/// The balance is checked before the upstream call so an empty account never
/// costs an API request; the decrement itself is conditional, so a race to
/// the last credit charges at most as many credits as exist.
pub async fn generate_image(
    store: &dyn Store,
    synthesizer: &dyn ImageSynthesizer,
    user_id: Uuid,
    prompt: &str,
) -> Result<GeneratedImage, ApiError> {
    if prompt.trim().is_empty() {
        return Err(ApiError::validation("Missing Details"));
    }

    let user = store
        .find_user_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    if user.credit_balance <= 0 {
        return Err(ApiError::InsufficientCredit {
            balance: user.credit_balance,
        });
    }

    let bytes = match synthesizer.synthesize(prompt).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(error = %e, user_id = %user_id, "image synthesis failed");
            return Err(ApiError::Upstream("Image generation failed".into()));
        }
    };

    let balance = match store.consume_credit(user_id).await? {
        Some(balance) => balance,
        // Lost a race to the last credit between the check and the decrement.
        None => return Err(ApiError::InsufficientCredit { balance: 0 }),
    };

    let data_url = format!("data:image/png;base64,{}", BASE64.encode(&bytes));
    info!(user_id = %user_id, balance, "image generated");
    Ok(GeneratedImage {
        credit_balance: balance,
        data_url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::mem::MemStore;
    use crate::store::Store;
    use crate::synthesis::mock::MockSynthesizer;
    use std::sync::atomic::Ordering;

    async fn user_with_balance(store: &MemStore, balance: i32) -> Uuid {
        let user = store.create_user("Ana", "a@x.com", "hash").await.unwrap();
        store.set_balance(user.id, balance);
        user.id
    }

    #[tokio::test]
    async fn generation_costs_exactly_one_credit() {
        let store = MemStore::new();
        let synth = MockSynthesizer::new();
        let user_id = user_with_balance(&store, 5).await;

        let out = generate_image(&store, &synth, user_id, "a red fox")
            .await
            .expect("generate");
        assert_eq!(out.credit_balance, 4);
        assert!(out.data_url.starts_with("data:image/png;base64,"));
        assert_eq!(synth.calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.balance_of(user_id), Some(4));
    }

    #[tokio::test]
    async fn zero_balance_never_reaches_upstream() {
        let store = MemStore::new();
        let synth = MockSynthesizer::new();
        let user_id = user_with_balance(&store, 0).await;

        let err = generate_image(&store, &synth, user_id, "a red fox")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InsufficientCredit { balance: 0 }));
        assert_eq!(synth.calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.balance_of(user_id), Some(0));
    }

    #[tokio::test]
    async fn last_credit_then_empty() {
        let store = MemStore::new();
        let synth = MockSynthesizer::new();
        let user_id = user_with_balance(&store, 1).await;

        let out = generate_image(&store, &synth, user_id, "first")
            .await
            .expect("first generation");
        assert_eq!(out.credit_balance, 0);

        let err = generate_image(&store, &synth, user_id, "second")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InsufficientCredit { balance: 0 }));
        assert_eq!(store.balance_of(user_id), Some(0));
        assert_eq!(synth.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn upstream_failure_does_not_charge() {
        let store = MemStore::new();
        let synth = MockSynthesizer::new();
        synth.fail.store(true, Ordering::SeqCst);
        let user_id = user_with_balance(&store, 3).await;

        let err = generate_image(&store, &synth, user_id, "a red fox")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Upstream(_)));
        assert_eq!(store.balance_of(user_id), Some(3));
    }

    #[tokio::test]
    async fn empty_prompt_is_rejected() {
        let store = MemStore::new();
        let synth = MockSynthesizer::new();
        let user_id = user_with_balance(&store, 3).await;

        let err = generate_image(&store, &synth, user_id, "   ")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(synth.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let store = MemStore::new();
        let synth = MockSynthesizer::new();
        let err = generate_image(&store, &synth, Uuid::new_v4(), "a red fox")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
