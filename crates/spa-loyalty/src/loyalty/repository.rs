use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::{AppointmentSnapshot, CustomerId, CustomerProfile, PaymentRecord, Wallet};
use super::promotions::{Promotion, PromotionUsage};

/// Everything the service persists for one customer: the loyalty profile,
/// the points wallet, and the histories the evaluator and filter read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub profile: CustomerProfile,
    pub wallet: Wallet,
    #[serde(default)]
    pub payments: Vec<PaymentRecord>,
    #[serde(default)]
    pub appointments: Vec<AppointmentSnapshot>,
}

impl CustomerRecord {
    pub fn new(profile: CustomerProfile) -> Self {
        Self {
            profile,
            wallet: Wallet::default(),
            payments: Vec::new(),
            appointments: Vec::new(),
        }
    }

    pub fn status_view(&self, tier_name: Option<&str>) -> TierStatusView {
        TierStatusView {
            customer_id: self.profile.customer_id.clone(),
            tier_level: self.profile.tier_level,
            tier_name: tier_name.map(str::to_string),
            points: self.wallet.points,
            total_spending: self.profile.total_spending,
            last_tier_upgrade: self.profile.last_tier_upgrade,
        }
    }
}

/// Sanitized representation of a customer's loyalty standing for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct TierStatusView {
    pub customer_id: CustomerId,
    pub tier_level: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier_name: Option<String>,
    pub points: i64,
    pub total_spending: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_tier_upgrade: Option<NaiveDate>,
}

/// Storage abstraction so the service module can be exercised in isolation.
/// Production backs this with the relational store; tests use in-memory maps.
pub trait LoyaltyRepository: Send + Sync {
    fn insert_customer(&self, record: CustomerRecord) -> Result<CustomerRecord, RepositoryError>;
    fn update_customer(&self, record: CustomerRecord) -> Result<(), RepositoryError>;
    fn fetch_customer(&self, id: &CustomerId) -> Result<Option<CustomerRecord>, RepositoryError>;

    fn promotions(&self) -> Result<Vec<Promotion>, RepositoryError>;
    fn fetch_promotion(&self, code: &str) -> Result<Option<Promotion>, RepositoryError>;
    fn upsert_promotion(&self, promotion: Promotion) -> Result<(), RepositoryError>;

    fn record_usage(&self, usage: PromotionUsage) -> Result<(), RepositoryError>;
    fn usage_count_for(
        &self,
        code: &str,
        customer: &CustomerId,
    ) -> Result<u32, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Outbound hook for customer-facing notices (push/e-mail adapters live
/// behind this in production).
pub trait NotificationPublisher: Send + Sync {
    fn publish(&self, notice: LoyaltyNotice) -> Result<(), NotifyError>;
}

/// Notification payload so routes/tests can assert integration boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoyaltyNotice {
    pub template: String,
    pub customer_id: CustomerId,
    pub details: BTreeMap<String, String>,
}

/// Notification dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}
