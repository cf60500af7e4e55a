//! Table configuration and the updates a table publishes.

use nightwatch_engine::LogEntry;
use nightwatch_protocol::{Faction, Phase};
use nightwatch_timer::PhaseTimings;
use serde::{Deserialize, Serialize};
use tracing::warn;

// ---------------------------------------------------------------------------
// TableConfig
// ---------------------------------------------------------------------------

/// Settings for one table actor.
#[derive(Debug, Clone)]
pub struct TableConfig {
    /// Phase delays, AI stagger and the interactive timeout.
    pub timings: PhaseTimings,

    /// Bound of the command channel. Senders wait when it is full.
    pub channel_size: usize,

    /// Seed for role dealing, tie-breaks and AI choices. `None` draws a
    /// fresh one, which is logged so the game can be replayed.
    pub seed: Option<u64>,

    /// Let the AI policy play the human seat too.
    pub autopilot: bool,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            timings: PhaseTimings::default(),
            channel_size: 64,
            seed: None,
            autopilot: false,
        }
    }
}

impl TableConfig {
    /// Short timings and autopilot: a game that plays itself.
    pub fn autoplay(seed: u64) -> Self {
        Self {
            timings: PhaseTimings::fast(),
            seed: Some(seed),
            autopilot: true,
            ..Self::default()
        }
    }

    /// Fix out-of-range values. A zero `channel_size` becomes 1.
    pub fn validated(mut self) -> Self {
        if self.channel_size == 0 {
            warn!("channel_size of 0 is not allowed, using 1");
            self.channel_size = 1;
        }
        self.timings = self.timings.validated();
        self
    }
}

// ---------------------------------------------------------------------------
// TableUpdate
// ---------------------------------------------------------------------------

/// What subscribers of a table receive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum TableUpdate {
    /// A new line of narration, in log order.
    Narration(LogEntry),

    /// The game entered a new phase.
    PhaseChanged { phase: Phase, day: u32 },

    /// The game ended. Always the last update a table sends.
    GameOver { winner: Faction, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_table_config_default() {
        let config = TableConfig::default();
        assert_eq!(config.channel_size, 64);
        assert_eq!(config.seed, None);
        assert!(!config.autopilot);
    }

    #[test]
    fn test_validated_fixes_zero_channel() {
        let config = TableConfig {
            channel_size: 0,
            ..TableConfig::default()
        }
        .validated();
        assert_eq!(config.channel_size, 1);
    }

    #[test]
    fn test_autoplay_is_fast_and_seeded() {
        let config = TableConfig::autoplay(5);
        assert_eq!(config.seed, Some(5));
        assert!(config.autopilot);
        assert!(config.timings.phase_delay < Duration::from_secs(1));
    }

    #[test]
    fn test_update_wire_form() {
        let update = TableUpdate::PhaseChanged {
            phase: Phase::DayVoting,
            day: 2,
        };
        let json = serde_json::to_string(&update).unwrap();
        assert_eq!(json, r#"{"type":"phaseChanged","phase":"dayVoting","day":2}"#);
    }
}
