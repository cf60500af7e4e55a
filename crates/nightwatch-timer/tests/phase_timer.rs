//! Integration tests for the phase timer.
//!
//! All async tests start with tokio time paused, so sleeps resolve as
//! soon as the runtime is otherwise idle.

use std::time::Duration;

use nightwatch_protocol::{Phase, PlayerId};
use nightwatch_timer::{PhaseTimer, PhaseTimings, TimerEvent};
use tokio::time::Instant;

// =========================================================================
// Helpers
// =========================================================================

fn timings() -> PhaseTimings {
    PhaseTimings {
        phase_delay: Duration::from_millis(300),
        settlement_delay: Duration::from_millis(100),
        ai_stagger: Duration::from_millis(50),
        action_timeout: Some(Duration::from_secs(1)),
    }
}

fn pid(id: u64) -> PlayerId {
    PlayerId(id)
}

// =========================================================================
// PhaseTimings
// =========================================================================

#[test]
fn test_default_settlement_is_shorter() {
    let t = PhaseTimings::default();
    assert!(t.settlement_delay < t.phase_delay);
    assert!(t.action_timeout.is_some());
}

#[test]
fn test_delay_for_each_phase() {
    let t = timings();
    assert_eq!(t.delay_for(Phase::NightBegin), Some(t.phase_delay));
    assert_eq!(t.delay_for(Phase::DayDiscussion), Some(t.phase_delay));
    assert_eq!(t.delay_for(Phase::NightSettlement), Some(t.settlement_delay));
    assert_eq!(t.delay_for(Phase::DaySettlement), Some(t.settlement_delay));
    assert_eq!(t.delay_for(Phase::DayVoting), t.action_timeout);
    assert_eq!(t.delay_for(Phase::GameStart), None);
    assert_eq!(t.delay_for(Phase::GameOver), None);
}

#[test]
fn test_validated_clamps_out_of_range() {
    let t = PhaseTimings {
        phase_delay: Duration::from_secs(3600),
        action_timeout: Some(Duration::ZERO),
        ..timings()
    }
    .validated();
    assert_eq!(t.phase_delay, PhaseTimings::MAX_DELAY);
    assert_eq!(t.action_timeout, Some(PhaseTimings::MIN_ACTION_TIMEOUT));
    assert_eq!(t.settlement_delay, Duration::from_millis(100));
}

#[test]
fn test_validated_keeps_disabled_timeout() {
    let t = PhaseTimings {
        action_timeout: None,
        ..timings()
    }
    .validated();
    assert_eq!(t.action_timeout, None);
}

// =========================================================================
// Idle timer pends forever
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_idle_timer_never_fires() {
    let mut timer = PhaseTimer::new(timings());
    assert!(timer.is_idle());
    let result = tokio::time::timeout(Duration::from_secs(30), timer.wait()).await;
    assert!(result.is_err(), "idle timer should pend forever");
}

#[tokio::test(start_paused = true)]
async fn test_game_over_arms_nothing() {
    let mut timer = PhaseTimer::new(timings());
    timer.arm(9, Phase::GameOver, &[]);
    assert!(timer.is_idle());
    let result = tokio::time::timeout(Duration::from_secs(30), timer.wait()).await;
    assert!(result.is_err());
}

// =========================================================================
// Firing
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_auto_phase_deadline_fires_after_delay() {
    let mut timer = PhaseTimer::new(timings());
    let start = Instant::now();
    timer.arm(1, Phase::NightBegin, &[]);

    let event = timer.wait().await;
    assert_eq!(event, TimerEvent::Deadline { epoch: 1 });
    assert_eq!(start.elapsed(), Duration::from_millis(300));
    assert!(timer.is_idle());
    assert_eq!(timer.stats().deadlines_fired, 1);
}

#[tokio::test(start_paused = true)]
async fn test_ai_turns_are_staggered_in_order() {
    let mut timer = PhaseTimer::new(timings());
    let start = Instant::now();
    timer.arm(4, Phase::DayVoting, &[pid(2), pid(3), pid(5)]);
    assert_eq!(timer.queued_turns(), 3);

    for (n, expected) in [pid(2), pid(3), pid(5)].into_iter().enumerate() {
        let event = timer.wait().await;
        assert_eq!(
            event,
            TimerEvent::AiTurn {
                epoch: 4,
                actor: expected
            }
        );
        assert_eq!(start.elapsed(), Duration::from_millis(50) * (n as u32 + 1));
    }

    // Then the action timeout.
    let event = timer.wait().await;
    assert_eq!(event, TimerEvent::Deadline { epoch: 4 });
    assert_eq!(start.elapsed(), Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn test_deadline_preempts_late_ai_turns() {
    let mut timer = PhaseTimer::new(PhaseTimings {
        ai_stagger: Duration::from_millis(400),
        action_timeout: Some(Duration::from_millis(600)),
        ..timings()
    });
    timer.arm(2, Phase::NightAction, &[pid(2), pid(3)]);

    assert!(matches!(timer.wait().await, TimerEvent::AiTurn { actor, .. } if actor == pid(2)));
    assert_eq!(timer.wait().await, TimerEvent::Deadline { epoch: 2 });
    // The second AI turn is still queued; the table decides it is stale.
    assert_eq!(timer.queued_turns(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_interactive_without_timeout_only_runs_ai() {
    let mut timer = PhaseTimer::new(PhaseTimings {
        action_timeout: None,
        ..timings()
    });
    timer.arm(3, Phase::DayVoting, &[pid(4)]);
    assert!(!timer.has_deadline());

    assert_eq!(
        timer.wait().await,
        TimerEvent::AiTurn {
            epoch: 3,
            actor: pid(4)
        }
    );
    assert!(timer.is_idle());
    let result = tokio::time::timeout(Duration::from_secs(60), timer.wait()).await;
    assert!(result.is_err());
}

// =========================================================================
// Re-arming and cancelling
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_rearm_replaces_previous_schedule() {
    let mut timer = PhaseTimer::new(timings());
    timer.arm(1, Phase::DayVoting, &[pid(2), pid(3)]);
    timer.arm(2, Phase::DaySettlement, &[]);

    assert_eq!(timer.epoch(), 2);
    assert_eq!(timer.queued_turns(), 0);
    assert_eq!(timer.wait().await, TimerEvent::Deadline { epoch: 2 });
    assert_eq!(timer.stats().armed, 2);
    // Two AI turns plus the voting deadline.
    assert_eq!(timer.stats().discarded, 3);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_makes_timer_idle() {
    let mut timer = PhaseTimer::new(timings());
    timer.arm(1, Phase::DayBegin, &[]);
    timer.cancel();
    assert!(timer.is_idle());
    let result = tokio::time::timeout(Duration::from_secs(5), timer.wait()).await;
    assert!(result.is_err());
}

// =========================================================================
// Integration: select! loop pattern (mirrors the table actor)
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_select_loop_pattern() {
    let mut timer = PhaseTimer::new(timings());
    timer.arm(1, Phase::NightAction, &[pid(2), pid(3), pid(4)]);

    let (tx, mut rx) = tokio::sync::mpsc::channel::<&str>(4);
    tokio::spawn(async move {
        // Arrives after two AI turns, before the third.
        tokio::time::sleep(Duration::from_millis(120)).await;
        tx.send("stop").await.ok();
    });

    let mut turns = Vec::new();
    loop {
        tokio::select! {
            Some(cmd) = rx.recv() => {
                assert_eq!(cmd, "stop");
                break;
            }
            event = timer.wait() => {
                if let TimerEvent::AiTurn { actor, .. } = event {
                    turns.push(actor);
                }
            }
        }
    }

    assert_eq!(turns, vec![pid(2), pid(3)]);
    // The interrupted wait consumed nothing.
    assert_eq!(timer.queued_turns(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_push_turn_queues_after_existing() {
    let mut timer = PhaseTimer::new(timings());
    let start = Instant::now();
    timer.arm(6, Phase::NightAction, &[pid(3)]);
    timer.push_turn(pid(1));
    assert_eq!(timer.queued_turns(), 2);

    assert!(matches!(timer.wait().await, TimerEvent::AiTurn { actor, .. } if actor == pid(3)));
    assert_eq!(
        timer.wait().await,
        TimerEvent::AiTurn {
            epoch: 6,
            actor: pid(1)
        }
    );
    assert_eq!(start.elapsed(), Duration::from_millis(100));
}
