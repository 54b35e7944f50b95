//! Loyalty tiers, promotion eligibility, and the service facade gluing them
//! to storage and notification ports.
//!
//! Web and mobile clients used to carry their own copies of the eligibility
//! predicate; this module is the single implementation all of them consume
//! through the JSON API.

pub mod domain;
pub mod promotions;
pub mod repository;
pub mod router;
pub mod service;
pub mod tiers;

#[cfg(test)]
mod tests;

pub use domain::{
    aggregate_spending, AppointmentSnapshot, AppointmentStatus, CustomerId, CustomerProfile,
    LadderError, PaymentRecord, PaymentStatus, Tier, TierLadder, Wallet,
};
pub use promotions::{
    EligibilityContext, EligibilityPolicy, IneligibilityReason, Promotion, PromotionUsage,
    TargetAudience,
};
pub use repository::{
    CustomerRecord, LoyaltyNotice, LoyaltyRepository, NotificationPublisher, NotifyError,
    RepositoryError, TierStatusView,
};
pub use router::loyalty_router;
pub use service::{
    LoyaltyService, LoyaltyServiceError, NewCustomer, PaymentEvent, RedemptionError,
    RedemptionRequest, SettlementError,
};
pub use tiers::{TierEvaluation, TierUpgrade, TierUpgradeEvaluator};
