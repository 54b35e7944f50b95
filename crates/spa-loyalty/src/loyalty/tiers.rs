use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::{CustomerProfile, TierLadder, Wallet};

/// Stateless evaluator that walks the ladder and promotes a profile as far as
/// its points and spending allow.
pub struct TierUpgradeEvaluator {
    ladder: TierLadder,
}

/// One promotion step applied during an evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierUpgrade {
    pub from_level: u8,
    pub to_level: u8,
    pub tier_name: String,
}

/// Result of an evaluation that changed the profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierEvaluation {
    pub new_level: u8,
    pub upgrades: Vec<TierUpgrade>,
    pub effective_on: NaiveDate,
}

impl TierUpgradeEvaluator {
    pub fn new(ladder: TierLadder) -> Self {
        Self { ladder }
    }

    pub fn ladder(&self) -> &TierLadder {
        &self.ladder
    }

    /// Walk tiers ascending, promoting while both thresholds are met and
    /// stopping at the first unmet tier. Returns `None` when the profile is
    /// already at the highest level it qualifies for, so a second call with
    /// unchanged inputs is a no-op. This evaluator never downgrades.
    pub fn evaluate(
        &self,
        profile: &CustomerProfile,
        wallet: &Wallet,
        today: NaiveDate,
    ) -> Option<TierEvaluation> {
        let mut current_level = profile.tier_level;
        let mut upgrades = Vec::new();

        for tier in self.ladder.tiers() {
            if tier.level <= current_level {
                continue;
            }
            if wallet.points < tier.points_required
                || profile.total_spending < tier.min_spending_required
            {
                break;
            }

            upgrades.push(TierUpgrade {
                from_level: current_level,
                to_level: tier.level,
                tier_name: tier.name.clone(),
            });
            current_level = tier.level;
        }

        if upgrades.is_empty() {
            return None;
        }

        Some(TierEvaluation {
            new_level: current_level,
            upgrades,
            effective_on: today,
        })
    }

    /// Apply an evaluation to the profile, stamping the upgrade date. Returns
    /// the evaluation so callers can persist and notify.
    pub fn apply(
        &self,
        profile: &mut CustomerProfile,
        wallet: &Wallet,
        today: NaiveDate,
    ) -> Option<TierEvaluation> {
        let evaluation = self.evaluate(profile, wallet, today)?;
        profile.tier_level = evaluation.new_level;
        profile.last_tier_upgrade = Some(evaluation.effective_on);
        Some(evaluation)
    }
}
