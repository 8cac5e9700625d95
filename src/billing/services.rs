use tracing::{info, warn};
use uuid::Uuid;

use crate::billing::dto::ConfirmRequest;
use crate::billing::plans::find_plan;
use crate::error::ApiError;
use crate::gateway::{verify_signature, Order, PaymentGateway};
use crate::store::{Settlement, Store};

/// Creates a pending transaction for the plan and obtains a gateway order.
///
/// The transaction's own id goes to the gateway as the order receipt; that
/// receipt is the only link confirmation can later follow back to the
/// ledger. If the gateway call fails, the transaction is left without an
/// order id (an abandoned purchase) and the error is surfaced.
pub async fn initiate_purchase(
    store: &dyn Store,
    gateway: &dyn PaymentGateway,
    currency: &str,
    user_id: Uuid,
    plan_id: &str,
) -> Result<Order, ApiError> {
    if plan_id.trim().is_empty() {
        return Err(ApiError::validation("Missing Details"));
    }

    store
        .find_user_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let plan = find_plan(plan_id).ok_or_else(|| ApiError::validation("Plan Not Found"))?;

    let tx = store
        .create_transaction(user_id, plan.id, plan.amount, plan.credits)
        .await?;

    // Gateway wants the amount in minor units.
    let order = match gateway
        .create_order(plan.amount * 100, currency, &tx.id.to_string())
        .await
    {
        Ok(order) => order,
        Err(e) => {
            warn!(error = %e, tx_id = %tx.id, "gateway order creation failed");
            return Err(ApiError::Upstream("Payment gateway unavailable".into()));
        }
    };

    store.attach_order(tx.id, &order.id).await?;
    info!(tx_id = %tx.id, order_id = %order.id, plan = plan.id, "purchase initiated");
    Ok(order)
}

/// Verifies a gateway confirmation and settles the matched transaction,
/// crediting the owner exactly once. Returns the balance and whether this
/// call did the crediting (false on an idempotent replay).
pub async fn confirm_purchase(
    store: &dyn Store,
    gateway: &dyn PaymentGateway,
    gateway_secret: &str,
    req: &ConfirmRequest,
) -> Result<(i32, bool), ApiError> {
    if req.order_id.is_empty() || req.payment_id.is_empty() || req.signature.is_empty() {
        return Err(ApiError::validation("Missing Details"));
    }

    // Authenticity first: the caller controls every field of this request,
    // so nothing is looked up before the signature checks out.
    if !verify_signature(gateway_secret, &req.order_id, &req.payment_id, &req.signature) {
        warn!(order_id = %req.order_id, "signature verification failed");
        return Err(ApiError::auth("Signature verification failed"));
    }

    let order = match gateway.fetch_order(&req.order_id).await {
        Ok(Some(order)) => order,
        Ok(None) => return Err(ApiError::not_found("Order not found")),
        Err(e) => {
            warn!(error = %e, order_id = %req.order_id, "gateway order fetch failed");
            return Err(ApiError::Upstream("Payment gateway unavailable".into()));
        }
    };

    let receipt = order
        .receipt
        .as_deref()
        .ok_or_else(|| ApiError::not_found("Receipt not found on order"))?;
    let tx_id = receipt
        .parse::<Uuid>()
        .map_err(|_| ApiError::not_found("Transaction not found"))?;

    match store.settle_and_credit(tx_id, &req.payment_id).await? {
        Settlement::Credited { balance } => {
            info!(tx_id = %tx_id, order_id = %req.order_id, balance, "purchase settled");
            Ok((balance, true))
        }
        Settlement::AlreadySettled { balance } => {
            info!(tx_id = %tx_id, order_id = %req.order_id, "duplicate confirmation ignored");
            Ok((balance, false))
        }
        Settlement::TransactionMissing => Err(ApiError::not_found("Transaction not found")),
        Settlement::UserMissing => Err(ApiError::not_found("User not found")),
    }
}
