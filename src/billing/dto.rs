use serde::{Deserialize, Serialize};

use crate::gateway::Order;

/// Request body for purchase initiation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRequest {
    pub plan_id: String,
}

/// Response carrying the freshly created gateway order; the client hands it
/// to the gateway's checkout widget.
#[derive(Debug, Serialize)]
pub struct PurchaseResponse {
    pub success: bool,
    pub order: Order,
}

/// Confirmation callback body: all three fields come from the caller, so
/// only the signature proves the gateway actually saw this payment.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmRequest {
    pub order_id: String,
    pub payment_id: String,
    pub signature: String,
}

#[derive(Debug, Serialize)]
pub struct ConfirmResponse {
    pub success: bool,
    pub message: String,
    pub credits: i32,
}
