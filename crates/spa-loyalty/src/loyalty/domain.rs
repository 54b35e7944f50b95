use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identifier wrapper for loyalty customers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CustomerId(pub String);

/// One rung of the loyalty ladder. Reference data, never mutated at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tier {
    pub level: u8,
    pub name: String,
    pub points_required: i64,
    /// Lifetime completed-payment spending threshold, in VND.
    pub min_spending_required: i64,
}

/// Ordered list of tiers, validated at construction so the upgrade walk can
/// assume ascending levels and non-decreasing thresholds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierLadder {
    tiers: Vec<Tier>,
}

/// Validation errors raised when assembling a tier ladder.
#[derive(Debug, thiserror::Error)]
pub enum LadderError {
    #[error("tier ladder must contain at least one tier")]
    Empty,
    #[error("tier levels must strictly increase (level {level} follows {previous})")]
    UnorderedLevels { previous: u8, level: u8 },
    #[error("tier thresholds must be non-decreasing (level {level} lowers a threshold)")]
    DecreasingThreshold { level: u8 },
}

impl TierLadder {
    pub fn new(tiers: Vec<Tier>) -> Result<Self, LadderError> {
        if tiers.is_empty() {
            return Err(LadderError::Empty);
        }

        for pair in tiers.windows(2) {
            let (lower, upper) = (&pair[0], &pair[1]);
            if upper.level <= lower.level {
                return Err(LadderError::UnorderedLevels {
                    previous: lower.level,
                    level: upper.level,
                });
            }
            if upper.points_required < lower.points_required
                || upper.min_spending_required < lower.min_spending_required
            {
                return Err(LadderError::DecreasingThreshold { level: upper.level });
            }
        }

        Ok(Self { tiers })
    }

    /// The ladder shipped with the spa product: Member through Platinum.
    pub fn standard() -> Self {
        Self::new(vec![
            Tier {
                level: 1,
                name: "Member".to_string(),
                points_required: 0,
                min_spending_required: 0,
            },
            Tier {
                level: 2,
                name: "Silver".to_string(),
                points_required: 500,
                min_spending_required: 5_000_000,
            },
            Tier {
                level: 3,
                name: "Gold".to_string(),
                points_required: 1_500,
                min_spending_required: 15_000_000,
            },
            Tier {
                level: 4,
                name: "Platinum".to_string(),
                points_required: 3_000,
                min_spending_required: 40_000_000,
            },
        ])
        .expect("standard ladder is well formed")
    }

    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    pub fn tier_for_level(&self, level: u8) -> Option<&Tier> {
        self.tiers.iter().find(|tier| tier.level == level)
    }

    pub fn lowest_level(&self) -> u8 {
        self.tiers[0].level
    }
}

/// Loyalty state owned by one customer. Mutated only through the service,
/// which delegates the tier fields to the upgrade evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerProfile {
    pub customer_id: CustomerId,
    pub tier_level: u8,
    /// Sum of completed payments, maintained by [`aggregate_spending`].
    pub total_spending: i64,
    pub last_tier_upgrade: Option<NaiveDate>,
    pub birthday: Option<NaiveDate>,
}

impl CustomerProfile {
    pub fn new(customer_id: CustomerId, starting_level: u8) -> Self {
        Self {
            customer_id,
            tier_level: starting_level,
            total_spending: 0,
            last_tier_upgrade: None,
            birthday: None,
        }
    }
}

/// Points balance. Read by the tier evaluator, credited by the points-award
/// flow, never touched by the evaluator itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub points: i64,
}

/// Settlement state of a payment or appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Paid,
    Unpaid,
    Refunded,
}

/// A single payment row as reported by the payments collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub amount: i64,
    pub status: PaymentStatus,
}

/// Sums the payments that count toward tier spending. Refunded and unpaid
/// rows are excluded.
pub fn aggregate_spending(payments: &[PaymentRecord]) -> i64 {
    payments
        .iter()
        .filter(|payment| payment.status == PaymentStatus::Paid)
        .map(|payment| payment.amount)
        .sum()
}

/// Scheduling state of an appointment, as exposed to the eligibility filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Completed,
    Upcoming,
    Scheduled,
    Cancelled,
}

impl AppointmentStatus {
    pub const fn label(self) -> &'static str {
        match self {
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Upcoming => "upcoming",
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }
}

/// Minimal appointment view consumed by the new-client gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentSnapshot {
    pub appointment_id: String,
    pub status: AppointmentStatus,
    pub payment_status: PaymentStatus,
}

impl AppointmentSnapshot {
    /// True when this appointment makes the customer an existing client:
    /// a paid booking that is completed, upcoming, or scheduled.
    pub fn counts_as_existing_business(&self) -> bool {
        self.payment_status == PaymentStatus::Paid
            && matches!(
                self.status,
                AppointmentStatus::Completed
                    | AppointmentStatus::Upcoming
                    | AppointmentStatus::Scheduled
            )
    }
}
