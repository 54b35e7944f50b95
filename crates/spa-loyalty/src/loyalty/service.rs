use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    aggregate_spending, AppointmentSnapshot, CustomerId, CustomerProfile, PaymentRecord,
    PaymentStatus, Wallet,
};
use super::promotions::eligibility::{self, EligibilityContext, EligibilityPolicy};
use super::promotions::{IneligibilityReason, Promotion, PromotionUsage};
use super::repository::{
    CustomerRecord, LoyaltyNotice, LoyaltyRepository, NotificationPublisher, NotifyError,
    RepositoryError, TierStatusView,
};
use super::tiers::{TierEvaluation, TierUpgradeEvaluator};

/// Service composing the tier evaluator, eligibility filter, storage, and the
/// notification port. One instance per process, passed by reference; no
/// module-level state.
pub struct LoyaltyService<R, N> {
    repository: Arc<R>,
    notifications: Arc<N>,
    evaluator: TierUpgradeEvaluator,
    policy: EligibilityPolicy,
}

/// Registration payload for a new loyalty member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCustomer {
    pub customer_id: CustomerId,
    #[serde(default)]
    pub birthday: Option<NaiveDate>,
}

/// Payment-completed event delivered by the payments collaborator after the
/// gateway confirms settlement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentEvent {
    pub customer_id: CustomerId,
    pub amount: i64,
    pub status: PaymentStatus,
    /// Points granted for this payment by the points-award flow.
    #[serde(default)]
    pub points_awarded: i64,
}

/// Redemption request for a voucher applied to an appointment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedemptionRequest {
    pub customer_id: CustomerId,
    pub appointment_id: String,
    pub order_value: i64,
}

impl<R, N> LoyaltyService<R, N>
where
    R: LoyaltyRepository + 'static,
    N: NotificationPublisher + 'static,
{
    pub fn new(
        repository: Arc<R>,
        notifications: Arc<N>,
        evaluator: TierUpgradeEvaluator,
        policy: EligibilityPolicy,
    ) -> Self {
        Self {
            repository,
            notifications,
            evaluator,
            policy,
        }
    }

    /// Register a customer at the ladder's lowest tier.
    pub fn register(&self, new_customer: NewCustomer) -> Result<CustomerRecord, LoyaltyServiceError> {
        let mut profile = CustomerProfile::new(
            new_customer.customer_id,
            self.evaluator.ladder().lowest_level(),
        );
        profile.birthday = new_customer.birthday;

        let stored = self.repository.insert_customer(CustomerRecord::new(profile))?;
        Ok(stored)
    }

    /// Apply a payment event: append the row, re-aggregate spending, credit
    /// awarded points, then run the tier walk against the fresh totals. The
    /// evaluator only sees state this call just wrote, so it never decides on
    /// a stale row.
    pub fn settle_payment(
        &self,
        event: PaymentEvent,
        today: NaiveDate,
    ) -> Result<Option<TierEvaluation>, LoyaltyServiceError> {
        if event.amount < 0 {
            return Err(SettlementError::NegativeAmount(event.amount).into());
        }
        if event.points_awarded < 0 {
            return Err(SettlementError::NegativePoints(event.points_awarded).into());
        }

        let mut record = self
            .repository
            .fetch_customer(&event.customer_id)?
            .ok_or(RepositoryError::NotFound)?;

        record.payments.push(PaymentRecord {
            amount: event.amount,
            status: event.status,
        });
        record.profile.total_spending = aggregate_spending(&record.payments);
        if event.status == PaymentStatus::Paid {
            record.wallet.points += event.points_awarded;
        }

        let evaluation = self
            .evaluator
            .apply(&mut record.profile, &record.wallet, today);

        let customer_id = record.profile.customer_id.clone();
        self.repository.update_customer(record)?;

        if let Some(evaluation) = &evaluation {
            self.publish_upgrade(&customer_id, evaluation)?;
        }

        Ok(evaluation)
    }

    /// Append an appointment snapshot so the new-client gate sees current
    /// booking history.
    pub fn record_appointment(
        &self,
        customer_id: &CustomerId,
        appointment: AppointmentSnapshot,
    ) -> Result<(), LoyaltyServiceError> {
        let mut record = self
            .repository
            .fetch_customer(customer_id)?
            .ok_or(RepositoryError::NotFound)?;
        record.appointments.push(appointment);
        self.repository.update_customer(record)?;
        Ok(())
    }

    /// Current standing for API responses.
    pub fn tier_status(&self, customer_id: &CustomerId) -> Result<TierStatusView, LoyaltyServiceError> {
        let record = self
            .repository
            .fetch_customer(customer_id)?
            .ok_or(RepositoryError::NotFound)?;
        let tier_name = self
            .evaluator
            .ladder()
            .tier_for_level(record.profile.tier_level)
            .map(|tier| tier.name.as_str());
        Ok(record.status_view(tier_name))
    }

    /// Stateless tier walk over caller-supplied state, for previews. Nothing
    /// is persisted.
    pub fn preview(
        &self,
        profile: &CustomerProfile,
        wallet: &Wallet,
        today: NaiveDate,
    ) -> Option<TierEvaluation> {
        self.evaluator.evaluate(profile, wallet, today)
    }

    /// Promotions the given customer can redeem today, per the shared
    /// eligibility predicate.
    pub fn eligible_promotions(
        &self,
        customer_id: &CustomerId,
        today: NaiveDate,
    ) -> Result<Vec<Promotion>, LoyaltyServiceError> {
        let record = self
            .repository
            .fetch_customer(customer_id)?
            .ok_or(RepositoryError::NotFound)?;
        let context = EligibilityContext {
            profile: &record.profile,
            appointments: &record.appointments,
        };

        let promotions = self
            .repository
            .promotions()?
            .into_iter()
            .filter(|promotion| eligibility::is_eligible(promotion, &context, &self.policy, today))
            .collect();
        Ok(promotions)
    }

    /// The anonymous public listing: public, untargeted, active, unexpired,
    /// in stock.
    pub fn public_promotions(&self, today: NaiveDate) -> Result<Vec<Promotion>, LoyaltyServiceError> {
        let promotions = self
            .repository
            .promotions()?
            .into_iter()
            .filter(|promotion| eligibility::is_publicly_listable(promotion, today))
            .collect();
        Ok(promotions)
    }

    /// Redeem a voucher against an appointment. Runs the eligibility gates,
    /// then the redemption-only checks (minimum order value, per-customer
    /// usage limit, stock decrement), and records the usage.
    pub fn redeem(
        &self,
        code: &str,
        request: RedemptionRequest,
        today: NaiveDate,
    ) -> Result<PromotionUsage, LoyaltyServiceError> {
        let mut promotion = self
            .repository
            .fetch_promotion(code)?
            .ok_or_else(|| RedemptionError::UnknownPromotion(code.to_string()))?;

        let record = self
            .repository
            .fetch_customer(&request.customer_id)?
            .ok_or(RepositoryError::NotFound)?;
        let context = EligibilityContext {
            profile: &record.profile,
            appointments: &record.appointments,
        };

        eligibility::check(&promotion, &context, &self.policy, today)
            .map_err(RedemptionError::Ineligible)?;

        if let Some(required) = promotion.min_order_value {
            if request.order_value < required {
                return Err(RedemptionError::BelowMinimumOrder {
                    required,
                    actual: request.order_value,
                }
                .into());
            }
        }

        if let Some(limit) = promotion.usage_limit {
            let used = self
                .repository
                .usage_count_for(code, &request.customer_id)?;
            if used >= limit {
                return Err(RedemptionError::UsageLimitReached { used, limit }.into());
            }
        }

        let usage = PromotionUsage {
            customer_id: request.customer_id,
            promotion_code: promotion.code.clone(),
            appointment_id: request.appointment_id,
            used_at: Utc::now(),
        };
        self.repository.record_usage(usage.clone())?;

        promotion.usage_count += 1;
        if let Some(stock) = promotion.stock.as_mut() {
            *stock -= 1;
        }
        self.repository.upsert_promotion(promotion)?;

        Ok(usage)
    }

    fn publish_upgrade(
        &self,
        customer_id: &CustomerId,
        evaluation: &TierEvaluation,
    ) -> Result<(), LoyaltyServiceError> {
        let mut details = BTreeMap::new();
        details.insert("tier_level".to_string(), evaluation.new_level.to_string());
        if let Some(top) = evaluation.upgrades.last() {
            details.insert("tier_name".to_string(), top.tier_name.clone());
        }
        self.notifications.publish(LoyaltyNotice {
            template: "tier_upgraded".to_string(),
            customer_id: customer_id.clone(),
            details,
        })?;
        Ok(())
    }
}

/// Error raised by the loyalty service.
#[derive(Debug, thiserror::Error)]
pub enum LoyaltyServiceError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Notification(#[from] NotifyError),
    #[error(transparent)]
    Redemption(#[from] RedemptionError),
    #[error(transparent)]
    Settlement(#[from] SettlementError),
}

/// Rejected payment events. Adjustments and refunds arrive as `Refunded`
/// rows, never as negative amounts.
#[derive(Debug, thiserror::Error)]
pub enum SettlementError {
    #[error("payment amount must be non-negative, got {0}")]
    NegativeAmount(i64),
    #[error("points awarded must be non-negative, got {0}")]
    NegativePoints(i64),
}

/// Typed redemption failures surfaced to the caller unretried.
#[derive(Debug, thiserror::Error)]
pub enum RedemptionError {
    #[error("no promotion with code '{0}'")]
    UnknownPromotion(String),
    #[error("promotion not redeemable: {}", .0.summary())]
    Ineligible(IneligibilityReason),
    #[error("order value {actual} is below the promotion minimum {required}")]
    BelowMinimumOrder { required: i64, actual: i64 },
    #[error("promotion already used {used} of {limit} allowed times")]
    UsageLimitReached { used: u32, limit: u32 },
}
