use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::domain::{Promotion, TargetAudience};
use crate::loyalty::domain::{AppointmentSnapshot, CustomerProfile};

const DEFAULT_VIP_FLOOR: u8 = 3;

/// Per-deployment dial for the audience gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EligibilityPolicy {
    vip_floor: u8,
}

impl EligibilityPolicy {
    pub fn new(vip_floor: u8) -> Self {
        let sanitized = if vip_floor == 0 {
            DEFAULT_VIP_FLOOR
        } else {
            vip_floor
        };
        Self {
            vip_floor: sanitized,
        }
    }

    pub fn vip_floor(&self) -> u8 {
        self.vip_floor
    }
}

impl Default for EligibilityPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_VIP_FLOOR)
    }
}

/// Everything the predicate may look at for one customer.
#[derive(Debug, Clone, Copy)]
pub struct EligibilityContext<'a> {
    pub profile: &'a CustomerProfile,
    pub appointments: &'a [AppointmentSnapshot],
}

/// Why a promotion is not currently redeemable by a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum IneligibilityReason {
    Inactive,
    Expired { expired_on: NaiveDate },
    OutOfStock,
    NotBirthday,
    NotNewClient,
    TierMismatch { required: u8, actual: u8 },
    BelowVipFloor { required: u8, actual: u8 },
}

impl IneligibilityReason {
    pub fn summary(&self) -> String {
        match self {
            IneligibilityReason::Inactive => "promotion is not active".to_string(),
            IneligibilityReason::Expired { expired_on } => {
                format!("promotion expired on {expired_on}")
            }
            IneligibilityReason::OutOfStock => "promotion is out of stock".to_string(),
            IneligibilityReason::NotBirthday => {
                "promotion is reserved for the customer's birthday".to_string()
            }
            IneligibilityReason::NotNewClient => {
                "promotion is reserved for first-time clients".to_string()
            }
            IneligibilityReason::TierMismatch { required, actual } => {
                format!("promotion requires tier level {required}, customer is level {actual}")
            }
            IneligibilityReason::BelowVipFloor { required, actual } => {
                format!("promotion requires VIP tier {required}+, customer is level {actual}")
            }
        }
    }
}

/// Evaluate the gates of the eligibility predicate in order, returning the
/// first failure. A pure function of its inputs: web, mobile, and the staff
/// portal all receive the result of this one implementation.
pub fn check(
    promotion: &Promotion,
    context: &EligibilityContext<'_>,
    policy: &EligibilityPolicy,
    today: NaiveDate,
) -> Result<(), IneligibilityReason> {
    if !promotion.is_active {
        return Err(IneligibilityReason::Inactive);
    }

    // Date-only comparison; the time of day a voucher was stored with is noise.
    if today > promotion.expires_on {
        return Err(IneligibilityReason::Expired {
            expired_on: promotion.expires_on,
        });
    }

    if let Some(stock) = promotion.stock {
        if stock <= 0 {
            return Err(IneligibilityReason::OutOfStock);
        }
    }

    audience_gate(promotion.target_audience, context, policy, today)
}

pub fn is_eligible(
    promotion: &Promotion,
    context: &EligibilityContext<'_>,
    policy: &EligibilityPolicy,
    today: NaiveDate,
) -> bool {
    check(promotion, context, policy, today).is_ok()
}

/// Gate 5: the general (anonymous) listing carries only active, unexpired,
/// in-stock promotions that are public and untargeted.
pub fn is_publicly_listable(promotion: &Promotion, today: NaiveDate) -> bool {
    promotion.is_public
        && !promotion.target_audience.is_targeted()
        && promotion.is_active
        && today <= promotion.expires_on
        && promotion.stock.map_or(true, |stock| stock > 0)
}

fn audience_gate(
    audience: TargetAudience,
    context: &EligibilityContext<'_>,
    policy: &EligibilityPolicy,
    today: NaiveDate,
) -> Result<(), IneligibilityReason> {
    match audience {
        TargetAudience::All => Ok(()),
        TargetAudience::Birthday => {
            // Month and day only; the birth year never matters. A Feb 29
            // birthday matches only in leap years.
            let matches = context.profile.birthday.is_some_and(|birthday| {
                birthday.month() == today.month() && birthday.day() == today.day()
            });
            if matches {
                Ok(())
            } else {
                Err(IneligibilityReason::NotBirthday)
            }
        }
        TargetAudience::NewClients => {
            let has_paid_booking = context
                .appointments
                .iter()
                .any(AppointmentSnapshot::counts_as_existing_business);
            if has_paid_booking {
                Err(IneligibilityReason::NotNewClient)
            } else {
                Ok(())
            }
        }
        TargetAudience::TierLevel(required) => {
            if context.profile.tier_level == required {
                Ok(())
            } else {
                Err(IneligibilityReason::TierMismatch {
                    required,
                    actual: context.profile.tier_level,
                })
            }
        }
        TargetAudience::Vip => {
            if context.profile.tier_level >= policy.vip_floor() {
                Ok(())
            } else {
                Err(IneligibilityReason::BelowVipFloor {
                    required: policy.vip_floor(),
                    actual: context.profile.tier_level,
                })
            }
        }
    }
}
