//! Phase deadlines and staggered AI turns for Nightwatch tables.
//!
//! A [`PhaseTimer`] holds at most one phase deadline plus a queue of AI
//! turns, all tagged with the phase epoch they were armed for. The table
//! actor re-arms it whenever the game enters a new phase; anything armed
//! for an older epoch is simply dropped.
//!
//! # Idle mode
//!
//! When nothing is armed (game not started, game over, or an interactive
//! phase with no timeout and no AI left to act), [`PhaseTimer::wait`]
//! pends forever, so it can sit in a `tokio::select!` next to the
//! command channel:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* apply command */ }
//!         event = timer.wait() => { /* deadline or AI turn */ }
//!     }
//! }
//! ```

use std::collections::VecDeque;
use std::time::Duration;

use nightwatch_protocol::{Phase, PlayerId};
use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// How long each kind of phase lasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTimings {
    /// Pause before `nightBegin`, `dayBegin` and `dayDiscussion` advance.
    pub phase_delay: Duration,
    /// Pause before a settlement phase advances. Shorter than
    /// `phase_delay` by default.
    pub settlement_delay: Duration,
    /// Gap between consecutive AI turns in an interactive phase. The
    /// first AI acts one stagger after the phase opens.
    pub ai_stagger: Duration,
    /// Hard limit on an interactive phase. `None` waits for every
    /// required actor indefinitely.
    pub action_timeout: Option<Duration>,
}

impl Default for PhaseTimings {
    fn default() -> Self {
        Self {
            phase_delay: Duration::from_secs(3),
            settlement_delay: Duration::from_secs(2),
            ai_stagger: Duration::from_millis(800),
            action_timeout: Some(Duration::from_secs(90)),
        }
    }
}

impl PhaseTimings {
    /// Longest delay any single timer may be armed with.
    pub const MAX_DELAY: Duration = Duration::from_secs(600);

    /// Shortest allowed interactive timeout.
    pub const MIN_ACTION_TIMEOUT: Duration = Duration::from_millis(100);

    /// Short delays for demos and tests that want to see a whole game.
    pub fn fast() -> Self {
        Self {
            phase_delay: Duration::from_millis(40),
            settlement_delay: Duration::from_millis(20),
            ai_stagger: Duration::from_millis(5),
            action_timeout: Some(Duration::from_secs(2)),
        }
    }

    /// Clamp out-of-range values so the timings are safe to use.
    ///
    /// Called automatically by [`PhaseTimer::new`]. Rules:
    /// - every delay is capped at [`Self::MAX_DELAY`];
    /// - `action_timeout` is raised to [`Self::MIN_ACTION_TIMEOUT`].
    pub fn validated(mut self) -> Self {
        for (name, delay) in [
            ("phase_delay", &mut self.phase_delay),
            ("settlement_delay", &mut self.settlement_delay),
            ("ai_stagger", &mut self.ai_stagger),
        ] {
            if *delay > Self::MAX_DELAY {
                warn!(field = name, ?delay, max = ?Self::MAX_DELAY, "delay too long, clamping");
                *delay = Self::MAX_DELAY;
            }
        }
        if let Some(timeout) = self.action_timeout {
            let clamped = timeout.clamp(Self::MIN_ACTION_TIMEOUT, Self::MAX_DELAY);
            if clamped != timeout {
                warn!(?timeout, ?clamped, "action_timeout out of range, clamping");
                self.action_timeout = Some(clamped);
            }
        }
        self
    }

    /// The deadline for `phase`, or `None` if it has none.
    pub fn delay_for(&self, phase: Phase) -> Option<Duration> {
        if phase.is_settlement() {
            Some(self.settlement_delay)
        } else if phase.auto_advances() {
            Some(self.phase_delay)
        } else if phase.is_interactive() {
            self.action_timeout
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Events and stats
// ---------------------------------------------------------------------------

/// What woke the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// The phase's time is up.
    Deadline { epoch: u64 },
    /// It is `actor`'s turn to act.
    AiTurn { epoch: u64, actor: PlayerId },
}

impl TimerEvent {
    pub fn epoch(&self) -> u64 {
        match self {
            Self::Deadline { epoch } | Self::AiTurn { epoch, .. } => *epoch,
        }
    }
}

/// Counters for one timer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimerStats {
    /// Times [`PhaseTimer::arm`] was called.
    pub armed: u64,
    pub deadlines_fired: u64,
    pub ai_turns_fired: u64,
    /// Deadlines or AI turns discarded by re-arming or cancelling.
    pub discarded: u64,
}

// ---------------------------------------------------------------------------
// Timer
// ---------------------------------------------------------------------------

/// One table's phase clock.
#[derive(Debug)]
pub struct PhaseTimer {
    timings: PhaseTimings,
    epoch: u64,
    deadline: Option<Instant>,
    ai_turns: VecDeque<(Instant, PlayerId)>,
    stats: TimerStats,
}

impl PhaseTimer {
    pub fn new(timings: PhaseTimings) -> Self {
        let timings = timings.validated();
        debug!(
            phase_ms = timings.phase_delay.as_millis() as u64,
            settlement_ms = timings.settlement_delay.as_millis() as u64,
            stagger_ms = timings.ai_stagger.as_millis() as u64,
            timeout = ?timings.action_timeout,
            "phase timer created"
        );
        Self {
            timings,
            epoch: 0,
            deadline: None,
            ai_turns: VecDeque::new(),
            stats: TimerStats::default(),
        }
    }

    /// Replace whatever is armed with the schedule for a new phase.
    ///
    /// `actors` are queued as AI turns in the given order, one
    /// `ai_stagger` apart.
    pub fn arm(&mut self, epoch: u64, phase: Phase, actors: &[PlayerId]) {
        self.discard();
        let now = Instant::now();
        self.epoch = epoch;
        self.deadline = self.timings.delay_for(phase).map(|d| now + d);
        self.ai_turns = actors
            .iter()
            .zip(1u32..)
            .map(|(actor, n)| (now + self.timings.ai_stagger * n, *actor))
            .collect();
        self.stats.armed += 1;
        trace!(
            epoch,
            %phase,
            deadline = ?self.timings.delay_for(phase),
            ai_turns = actors.len(),
            "timer armed"
        );
    }

    /// Queue one more turn for the current epoch, one stagger after the
    /// last queued turn (or after now, if the queue is empty).
    pub fn push_turn(&mut self, actor: PlayerId) {
        let after = self
            .ai_turns
            .back()
            .map_or_else(Instant::now, |(at, _)| *at);
        self.ai_turns.push_back((after + self.timings.ai_stagger, actor));
        trace!(epoch = self.epoch, %actor, "turn queued");
    }

    /// Drop everything armed. [`wait`](Self::wait) pends until re-armed.
    pub fn cancel(&mut self) {
        self.discard();
        trace!(epoch = self.epoch, "timer cancelled");
    }

    fn discard(&mut self) {
        let dropped = self.ai_turns.len() as u64 + u64::from(self.deadline.is_some());
        self.stats.discarded += dropped;
        self.deadline = None;
        self.ai_turns.clear();
    }

    /// Wait for the next AI turn or the phase deadline, whichever is
    /// sooner. An AI turn due at the same instant as the deadline fires
    /// first.
    ///
    /// Cancel-safe: nothing is consumed until the sleep completes.
    pub async fn wait(&mut self) -> TimerEvent {
        let next_turn = self.ai_turns.front().map(|(at, _)| *at);
        let (at, is_turn) = match (next_turn, self.deadline) {
            (Some(turn), Some(deadline)) if deadline < turn => (deadline, false),
            (Some(turn), _) => (turn, true),
            (None, Some(deadline)) => (deadline, false),
            (None, None) => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        };

        time::sleep_until(at).await;

        if is_turn {
            if let Some((_, actor)) = self.ai_turns.pop_front() {
                self.stats.ai_turns_fired += 1;
                trace!(epoch = self.epoch, %actor, "ai turn fired");
                return TimerEvent::AiTurn {
                    epoch: self.epoch,
                    actor,
                };
            }
        }

        self.deadline = None;
        self.stats.deadlines_fired += 1;
        trace!(epoch = self.epoch, "deadline fired");
        TimerEvent::Deadline { epoch: self.epoch }
    }

    /// Epoch of the current schedule.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Nothing armed; `wait` would pend forever.
    pub fn is_idle(&self) -> bool {
        self.deadline.is_none() && self.ai_turns.is_empty()
    }

    /// AI turns still queued.
    pub fn queued_turns(&self) -> usize {
        self.ai_turns.len()
    }

    pub fn has_deadline(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn timings(&self) -> &PhaseTimings {
        &self.timings
    }

    pub fn stats(&self) -> &TimerStats {
        &self.stats
    }
}
