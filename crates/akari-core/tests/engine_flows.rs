//! End-to-end flows through the accounting engine.
//!
//! These tests drive complete scenarios against an in-memory store: seeding
//! accounts and bets, resolving predictions, claiming rewards and computing
//! leaderboards, and check the cross-operation invariants.

use akari_core::amount::{Myst, Points};
use akari_core::campaign::{Draft, DraftInput, TaskSpec};
use akari_core::config::AkariConfig;
use akari_core::{
    AkariError, CampaignId, Denom, Engine, EventKind, MemoryStore, PredictionId, RewardId,
    RewardStatus, Tier, UserId,
};

fn engine() -> Engine<MemoryStore> {
    Engine::new(MemoryStore::new(), AkariConfig::default()).unwrap()
}

fn seeded_prediction(engine: &Engine<MemoryStore>, stakes: &[(u64, &str, u64)]) -> PredictionId {
    let id = PredictionId(1);
    engine
        .create_prediction(id, vec!["yes".into(), "no".into()], i64::MAX)
        .unwrap();
    for (user, option, stake) in stakes {
        engine.register_account(UserId(*user)).ok();
        engine
            .place_bet(id, UserId(*user), option, *stake, Denom::Points, 0)
            .unwrap();
    }
    id
}

#[test]
fn points_deltas_sum_independent_of_order() {
    let deltas = [200i64, 4_800, -1_000, 300, 700];

    let forward = engine();
    forward.register_account(UserId(1)).unwrap();
    // Reordered so no prefix overdraws.
    let backward = engine();
    backward.register_account(UserId(1)).unwrap();

    for d in deltas {
        forward.apply_points_delta(UserId(1), d).unwrap();
    }
    for d in [700, 300, 4_800, 200, -1_000] {
        backward.apply_points_delta(UserId(1), d).unwrap();
    }

    let a = forward.account(UserId(1)).unwrap();
    let b = backward.account(UserId(1)).unwrap();
    assert_eq!(a.points, Points(5_000));
    assert_eq!(a.points, b.points);
    assert_eq!(a.tier, b.tier);
    assert_eq!(a.tier, Tier(1));
}

#[test]
fn settlement_credits_winners_and_retiers() {
    let engine = engine();
    let id = seeded_prediction(&engine, &[(1, "yes", 300), (2, "yes", 700), (3, "no", 1_000)]);

    let report = engine.resolve_prediction(id, "yes").unwrap();

    assert_eq!(report.pot, 2_000);
    assert_eq!(report.house_fee, 100);
    assert_eq!(report.payout_pool, 1_900);
    assert_eq!(report.winners.len(), 2);

    // floor(300/1000 * 1900) = 570, floor(700/1000 * 1900) = 1330.
    assert_eq!(engine.account(UserId(1)).unwrap().points, Points(570));
    assert_eq!(engine.account(UserId(2)).unwrap().points, Points(1_330));
    assert_eq!(engine.account(UserId(3)).unwrap().points, Points::ZERO);
}

#[test]
fn double_resolution_fails_without_side_effects() {
    let engine = engine();
    let id = seeded_prediction(&engine, &[(1, "yes", 300), (2, "no", 700)]);

    engine.resolve_prediction(id, "yes").unwrap();
    let balance_after_first = engine.account(UserId(1)).unwrap().points;

    let second = engine.resolve_prediction(id, "yes");
    assert!(matches!(second, Err(AkariError::InvalidState(_))));
    assert_eq!(engine.account(UserId(1)).unwrap().points, balance_after_first);
}

#[test]
fn resolution_with_unknown_option_mutates_nothing() {
    let engine = engine();
    let id = seeded_prediction(&engine, &[(1, "yes", 300)]);

    let result = engine.resolve_prediction(id, "maybe");
    assert!(matches!(result, Err(AkariError::InvalidArgument(_))));
    assert_eq!(engine.account(UserId(1)).unwrap().points, Points::ZERO);

    // The prediction is still resolvable afterwards.
    engine.resolve_prediction(id, "yes").unwrap();
}

#[test]
fn resolution_with_no_winners_pays_nobody() {
    let engine = engine();
    let id = seeded_prediction(&engine, &[(1, "no", 400), (2, "no", 600)]);

    let report = engine.resolve_prediction(id, "yes").unwrap();
    assert!(report.winners.is_empty());
    assert_eq!(report.payout_pool, 950);
    assert_eq!(engine.account(UserId(1)).unwrap().points, Points::ZERO);
    assert_eq!(engine.account(UserId(2)).unwrap().points, Points::ZERO);
}

#[test]
fn claim_burns_min_of_balance_and_requirement() {
    let engine = engine();
    engine.register_account(UserId(1)).unwrap();
    // $2.00 at the default 10 MYST/USD requires 20 MYST.
    engine.grant_reward(RewardId(1), UserId(1), 200).unwrap();
    engine.credit_myst(UserId(1), Myst(25_000)).unwrap();

    let receipt = engine
        .claim_reward_with_burn(UserId(1), RewardId(1), None)
        .unwrap();

    assert_eq!(receipt.required_myst, Myst(20_000));
    assert_eq!(receipt.burned_myst, Myst(20_000));
    assert_eq!(receipt.new_balance, Myst(5_000));
    assert_eq!(receipt.status, RewardStatus::ReadyForPayout);
}

#[test]
fn short_balance_claim_still_advances_status() {
    let engine = engine();
    engine.register_account(UserId(1)).unwrap();
    engine.grant_reward(RewardId(1), UserId(1), 200).unwrap();
    engine.credit_myst(UserId(1), Myst(700)).unwrap();

    let receipt = engine
        .claim_reward_with_burn(UserId(1), RewardId(1), None)
        .unwrap();

    assert_eq!(receipt.burned_myst, Myst(700));
    assert_eq!(receipt.new_balance, Myst::ZERO);
    assert_eq!(receipt.status, RewardStatus::ReadyForPayout);
}

#[test]
fn second_claim_fails_and_burns_nothing_more() {
    let engine = engine();
    engine.register_account(UserId(1)).unwrap();
    engine.grant_reward(RewardId(1), UserId(1), 100).unwrap();
    engine.credit_myst(UserId(1), Myst(50_000)).unwrap();

    engine
        .claim_reward_with_burn(UserId(1), RewardId(1), None)
        .unwrap();
    let balance = engine.account(UserId(1)).unwrap().myst;

    let second = engine.claim_reward_with_burn(UserId(1), RewardId(1), None);
    assert!(matches!(second, Err(AkariError::InvalidState(_))));
    assert_eq!(engine.account(UserId(1)).unwrap().myst, balance);
}

#[test]
fn claim_records_payout_wallet() {
    let engine = engine();
    engine.register_account(UserId(1)).unwrap();
    engine.grant_reward(RewardId(1), UserId(1), 100).unwrap();
    engine.credit_myst(UserId(1), Myst(50_000)).unwrap();

    let wallet = format!("0:{}", "b".repeat(64));
    engine
        .claim_reward_with_burn(UserId(1), RewardId(1), Some(wallet))
        .unwrap();

    let overview = engine.rewards_overview(UserId(1)).unwrap();
    assert_eq!(overview.current.len(), 1);
    assert_eq!(overview.current[0].status, RewardStatus::ReadyForPayout);
}

#[test]
fn overview_moves_paid_rewards_to_past() {
    let engine = engine();
    engine.register_account(UserId(1)).unwrap();
    engine.grant_reward(RewardId(1), UserId(1), 300).unwrap();
    engine.credit_myst(UserId(1), Myst(50_000)).unwrap();
    engine
        .claim_reward_with_burn(UserId(1), RewardId(1), None)
        .unwrap();
    engine.mark_reward_paid(RewardId(1)).unwrap();

    let overview = engine.rewards_overview(UserId(1)).unwrap();
    assert!(overview.current.is_empty());
    assert_eq!(overview.past.len(), 1);
    assert_eq!(overview.past[0].prize_usd_cents, 300);
}

#[test]
fn campaign_scope_collects_events_and_ranks() {
    let engine = engine();
    for user in 1..=3 {
        engine.register_account(UserId(user)).unwrap();
    }

    let mut draft = Draft::new();
    draft.step(DraftInput::Title("Launch week".into())).unwrap();
    draft.step(DraftInput::Description("".into())).unwrap();
    draft
        .step(DraftInput::Budget(Points::from_whole(50).unwrap()))
        .unwrap();
    draft
        .step(DraftInput::AddTask(TaskSpec::JoinChannel {
            channel: "@akari_announcements".into(),
        }))
        .unwrap();
    draft.step(DraftInput::FinishTasks).unwrap();
    draft.step(DraftInput::Confirm).unwrap();
    let campaign = draft.build(CampaignId(4)).unwrap();
    let scope = campaign.scope_key();
    engine.create_campaign(campaign).unwrap();

    for user in [1u64, 2, 2, 3, 3, 3] {
        engine
            .record_completion(&scope, UserId(user), EventKind::TaskCompleted)
            .unwrap();
    }

    let rows = engine.compute_leaderboard(&scope, None).unwrap();
    assert_eq!(rows[0].participant, UserId(3));
    assert_eq!(rows[0].completions, 3);
    assert_eq!(rows[0].score, Points(600));
    assert_eq!(rows[2].participant, UserId(1));

    // Snapshot equals recompute; both are pure functions of the event set.
    let snapshot = engine.snapshot_leaderboard(&scope).unwrap();
    assert_eq!(snapshot, rows);
    let again = engine.compute_leaderboard(&scope, None).unwrap();
    assert_eq!(again, rows);
}

#[test]
fn global_scope_needs_no_campaign() {
    let engine = engine();
    engine.register_account(UserId(1)).unwrap();
    engine
        .record_completion("global", UserId(1), EventKind::LinkClick)
        .unwrap();
    let rows = engine.compute_leaderboard("global", Some(5)).unwrap();
    assert_eq!(rows.len(), 1);
}
