//! Core protocol types shared by the engine, the table actor and any
//! presentation layer.
//!
//! Everything here is plain data: identifiers, the role catalogue, the
//! phase graph, and the commands a client may send. None of it knows
//! about game state, which lives in `nightwatch-engine`.
//!
//! The serde attributes define the wire spelling. Phases are camelCase
//! (`"nightAction"`), death causes kebab-case (`"tied-vote"`), commands
//! are internally tagged with a SCREAMING_SNAKE_CASE `type` field.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A stable identifier for a seat at the table.
///
/// Newtype over `u64` so a `PlayerId` can never be confused with a
/// `GameId`. `#[serde(transparent)]` keeps the JSON form a bare number.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A unique identifier for one game (one table).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct GameId(pub u64);

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "G-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Roles and factions
// ---------------------------------------------------------------------------

/// Which side a role plays for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Faction {
    Good,
    Evil,
}

impl fmt::Display for Faction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Good => write!(f, "good"),
            Self::Evil => write!(f, "evil"),
        }
    }
}

/// A hidden role. Assigned once at game start and never changed.
///
/// Every `match` on a role in this workspace is exhaustive, so adding a
/// variant forces every settlement and policy rule to be revisited.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Evil. Chooses a victim every night.
    Saboteur,
    /// Evil. No night action, votes with the saboteurs.
    Accomplice,
    /// Good. No night action.
    Civilian,
    /// Good. Checks one player's alignment every night.
    Investigator,
    /// Good. Shields one player from the night attack.
    Protector,
}

impl Role {
    /// All roles, in table order.
    pub const ALL: [Role; 5] = [
        Role::Saboteur,
        Role::Accomplice,
        Role::Civilian,
        Role::Investigator,
        Role::Protector,
    ];

    /// The faction this role belongs to.
    pub fn faction(self) -> Faction {
        match self {
            Self::Saboteur | Self::Accomplice => Faction::Evil,
            Self::Civilian | Self::Investigator | Self::Protector => Faction::Good,
        }
    }

    /// Shorthand for `faction() == Faction::Evil`.
    pub fn is_evil(self) -> bool {
        self.faction() == Faction::Evil
    }

    /// The night action this role may submit, if any.
    pub fn night_action(self) -> Option<NightActionKind> {
        match self {
            Self::Saboteur => Some(NightActionKind::Disgust),
            Self::Investigator => Some(NightActionKind::Check),
            Self::Protector => Some(NightActionKind::Protect),
            Self::Accomplice | Self::Civilian => None,
        }
    }

    /// The lowercase wire name (`"saboteur"`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Saboteur => "saboteur",
            Self::Accomplice => "accomplice",
            Self::Civilian => "civilian",
            Self::Investigator => "investigator",
            Self::Protector => "protector",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Saboteur => "Saboteur",
            Self::Accomplice => "Accomplice",
            Self::Civilian => "Civilian",
            Self::Investigator => "Investigator",
            Self::Protector => "Protector",
        };
        f.write_str(name)
    }
}

impl FromStr for Role {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ProtocolError::InvalidMessage(format!("unknown role: {s}")))
    }
}

/// The role the human asks for when starting a game.
///
/// Serialized as a plain string: `"random"` or a role name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum RoleChoice {
    /// Let the assigner pick uniformly from the multiset.
    #[default]
    Random,
    /// Ask for a specific role.
    Role(Role),
}

impl fmt::Display for RoleChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Random => f.write_str("random"),
            Self::Role(role) => f.write_str(role.as_str()),
        }
    }
}

impl FromStr for RoleChoice {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("random") {
            Ok(Self::Random)
        } else {
            s.parse().map(Self::Role)
        }
    }
}

impl From<RoleChoice> for String {
    fn from(choice: RoleChoice) -> Self {
        choice.to_string()
    }
}

impl TryFrom<String> for RoleChoice {
    type Error = ProtocolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// The three night actions. Each is owned by exactly one role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NightActionKind {
    Protect,
    Check,
    Disgust,
}

impl fmt::Display for NightActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Protect => write!(f, "protect"),
            Self::Check => write!(f, "check"),
            Self::Disgust => write!(f, "disgust"),
        }
    }
}

impl FromStr for NightActionKind {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "protect" => Ok(Self::Protect),
            "check" => Ok(Self::Check),
            "disgust" => Ok(Self::Disgust),
            other => Err(ProtocolError::InvalidMessage(format!(
                "unknown night action: {other}"
            ))),
        }
    }
}

/// How a player left the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeathCause {
    /// Eliminated by a clear day-vote majority.
    Voted,
    /// Eliminated by the random tie-break between top-voted players.
    TiedVote,
    /// Killed at night by the saboteurs.
    Disgusted,
}

impl fmt::Display for DeathCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Voted => write!(f, "voted"),
            Self::TiedVote => write!(f, "tied-vote"),
            Self::Disgusted => write!(f, "disgusted"),
        }
    }
}

// ---------------------------------------------------------------------------
// Phase graph
// ---------------------------------------------------------------------------

/// A phase of the game.
///
/// The graph is a cycle after the first night:
///
/// ```text
/// GameStart → NightBegin → NightAction → NightSettlement → DayBegin
///     → DayDiscussion → DayVoting → DaySettlement → NightBegin → …
/// ```
///
/// Either settlement phase may instead jump to `GameOver` when a
/// faction has won. `GameStart` and `GameOver` never repeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    GameStart,
    NightBegin,
    NightAction,
    NightSettlement,
    DayBegin,
    DayDiscussion,
    DayVoting,
    DaySettlement,
    GameOver,
}

impl Phase {
    /// The next phase in the regular cycle, ignoring win conditions.
    ///
    /// Returns `None` only for `GameOver`.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::GameStart => Some(Self::NightBegin),
            Self::NightBegin => Some(Self::NightAction),
            Self::NightAction => Some(Self::NightSettlement),
            Self::NightSettlement => Some(Self::DayBegin),
            Self::DayBegin => Some(Self::DayDiscussion),
            Self::DayDiscussion => Some(Self::DayVoting),
            Self::DayVoting => Some(Self::DaySettlement),
            Self::DaySettlement => Some(Self::NightBegin),
            Self::GameOver => None,
        }
    }

    /// Returns `true` if moving to `target` is a legal edge.
    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == Some(target) || (self.is_settlement() && target == Self::GameOver)
    }

    /// Phases that collect actions from players.
    pub fn is_interactive(self) -> bool {
        matches!(self, Self::NightAction | Self::DayVoting)
    }

    /// Phases that show the outcome of the previous interactive phase.
    pub fn is_settlement(self) -> bool {
        matches!(self, Self::NightSettlement | Self::DaySettlement)
    }

    /// Non-interactive phases that advance on their own after a delay.
    pub fn auto_advances(self) -> bool {
        matches!(
            self,
            Self::NightBegin
                | Self::NightSettlement
                | Self::DayBegin
                | Self::DayDiscussion
                | Self::DaySettlement
        )
    }

    pub fn is_night(self) -> bool {
        matches!(
            self,
            Self::NightBegin | Self::NightAction | Self::NightSettlement
        )
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::GameStart => "gameStart",
            Self::NightBegin => "nightBegin",
            Self::NightAction => "nightAction",
            Self::NightSettlement => "nightSettlement",
            Self::DayBegin => "dayBegin",
            Self::DayDiscussion => "dayDiscussion",
            Self::DayVoting => "dayVoting",
            Self::DaySettlement => "daySettlement",
            Self::GameOver => "gameOver",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Commands and progress
// ---------------------------------------------------------------------------

/// A command accepted by the phase scheduler.
///
/// Internally tagged, so the JSON form reads
/// `{"type":"SUBMIT_VOTE","voterId":3,"targetId":5}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum GameCommand {
    /// Deal roles and begin the first night. Only legal in `gameStart`.
    StartGame {
        player_count: usize,
        #[serde(default)]
        selected_role: RoleChoice,
    },

    /// Cast a day vote. Only legal in `dayVoting`.
    SubmitVote {
        voter_id: PlayerId,
        target_id: PlayerId,
    },

    /// Submit a role's night action. Only legal in `nightAction`.
    SubmitNightAction {
        actor_id: PlayerId,
        target_id: PlayerId,
        action_type: NightActionKind,
    },

    /// Move a non-interactive phase along without waiting for its timer.
    AdvancePhase,
}

/// How many of the required actors have submitted in the current phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Progress {
    pub submitted: usize,
    pub total: usize,
}

impl Progress {
    pub fn is_complete(&self) -> bool {
        self.submitted == self.total
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.submitted, self.total)
    }
}
