use super::common::*;
use chrono::NaiveDate;

use crate::loyalty::domain::{LadderError, Tier, TierLadder, Wallet};
use crate::loyalty::tiers::TierUpgradeEvaluator;

#[test]
fn ladder_rejects_unordered_levels() {
    let result = TierLadder::new(vec![
        Tier {
            level: 2,
            name: "Silver".to_string(),
            points_required: 500,
            min_spending_required: 5_000_000,
        },
        Tier {
            level: 1,
            name: "Member".to_string(),
            points_required: 0,
            min_spending_required: 0,
        },
    ]);
    match result {
        Err(LadderError::UnorderedLevels { previous: 2, level: 1 }) => {}
        other => panic!("expected unordered levels error, got {other:?}"),
    }
}

#[test]
fn ladder_rejects_decreasing_thresholds() {
    let result = TierLadder::new(vec![
        Tier {
            level: 1,
            name: "Member".to_string(),
            points_required: 500,
            min_spending_required: 5_000_000,
        },
        Tier {
            level: 2,
            name: "Silver".to_string(),
            points_required: 400,
            min_spending_required: 6_000_000,
        },
    ]);
    match result {
        Err(LadderError::DecreasingThreshold { level: 2 }) => {}
        other => panic!("expected decreasing threshold error, got {other:?}"),
    }
}

#[test]
fn profile_below_every_threshold_keeps_its_level() {
    let evaluator = TierUpgradeEvaluator::new(three_tier_ladder());
    let profile = profile("idle", 1, 1_000_000);
    let wallet = Wallet { points: 100 };

    assert!(evaluator.evaluate(&profile, &wallet, today()).is_none());
}

#[test]
fn qualifying_for_tier_two_but_not_three_stops_at_two() {
    // Worked example: points 600 and spending 6_000_000 clear Silver but not Gold.
    let evaluator = TierUpgradeEvaluator::new(three_tier_ladder());
    let profile = profile("silver", 1, 6_000_000);
    let wallet = Wallet { points: 600 };

    let evaluation = evaluator
        .evaluate(&profile, &wallet, today())
        .expect("upgrade expected");
    assert_eq!(evaluation.new_level, 2);
    assert_eq!(evaluation.upgrades.len(), 1);
    assert_eq!(evaluation.upgrades[0].tier_name, "Silver");
}

#[test]
fn customer_can_climb_several_tiers_in_one_call() {
    let evaluator = TierUpgradeEvaluator::new(three_tier_ladder());
    let profile = profile("whale", 1, 20_000_000);
    let wallet = Wallet { points: 2_000 };

    let evaluation = evaluator
        .evaluate(&profile, &wallet, today())
        .expect("upgrade expected");
    assert_eq!(evaluation.new_level, 3);
    assert_eq!(
        evaluation
            .upgrades
            .iter()
            .map(|upgrade| (upgrade.from_level, upgrade.to_level))
            .collect::<Vec<_>>(),
        vec![(1, 2), (2, 3)]
    );
}

#[test]
fn unmet_middle_tier_blocks_higher_tiers() {
    // Gold-level spending but Silver-level points: the walk stops at the
    // first unmet tier rather than skipping it.
    let evaluator = TierUpgradeEvaluator::new(three_tier_ladder());
    let profile = profile("blocked", 1, 20_000_000);
    let wallet = Wallet { points: 400 };

    assert!(evaluator.evaluate(&profile, &wallet, today()).is_none());
}

#[test]
fn evaluation_is_idempotent() {
    let evaluator = TierUpgradeEvaluator::new(three_tier_ladder());
    let mut profile = profile("repeat", 1, 6_000_000);
    let wallet = Wallet { points: 600 };

    let first = evaluator.apply(&mut profile, &wallet, today());
    assert!(first.is_some());
    assert_eq!(profile.tier_level, 2);
    assert_eq!(profile.last_tier_upgrade, Some(today()));

    let second = evaluator.apply(&mut profile, &wallet, today());
    assert!(second.is_none());
    assert_eq!(profile.tier_level, 2);
}

#[test]
fn evaluator_never_downgrades() {
    let evaluator = TierUpgradeEvaluator::new(three_tier_ladder());
    // Already Gold, but points and spending no longer clear any threshold.
    let profile = profile("fallen", 3, 0);
    let wallet = Wallet { points: 0 };

    assert!(evaluator.evaluate(&profile, &wallet, today()).is_none());
}

#[test]
fn upgrade_date_is_stamped_with_evaluation_day() {
    let evaluator = TierUpgradeEvaluator::new(three_tier_ladder());
    let mut profile = profile("dated", 1, 6_000_000);
    let wallet = Wallet { points: 600 };
    let day = NaiveDate::from_ymd_opt(2026, 1, 2).expect("valid");

    evaluator.apply(&mut profile, &wallet, day).expect("upgrade");
    assert_eq!(profile.last_tier_upgrade, Some(day));
}
