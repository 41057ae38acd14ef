use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::entity::PurchaseOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseStatus {
    AlreadyOwned,
    Pending,
    Purchased,
    Cancelled,
}

impl From<PurchaseOutcome> for PurchaseStatus {
    fn from(value: PurchaseOutcome) -> Self {
        match value {
            PurchaseOutcome::AlreadyOwned => Self::AlreadyOwned,
            PurchaseOutcome::Purchased => Self::Purchased,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct PurchaseResponse {
    pub course_id: Uuid,
    pub status: PurchaseStatus,
    /// Set while the payment is `pending`
    pub session_id: Option<String>,
    /// Hosted payment page to redirect the client to
    pub checkout_url: Option<String>,
}

impl PurchaseResponse {
    pub fn settled(course_id: Uuid, status: PurchaseStatus) -> Self {
        Self {
            course_id,
            status,
            session_id: None,
            checkout_url: None,
        }
    }
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CheckoutSuccessQuery {
    pub session_id: String,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn purchase_status_wire_format_test() {
        let body = PurchaseResponse::settled(Uuid::nil(), PurchaseOutcome::AlreadyOwned.into());
        let raw = serde_json::to_value(&body).unwrap();
        assert_eq!(raw["status"], "already_owned");
        assert!(raw["checkout_url"].is_null());
    }
}
