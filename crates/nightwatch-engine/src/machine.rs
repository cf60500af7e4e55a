//! The phase scheduler: the only writer of [`GameState`].
//!
//! `GameMachine` is a synchronous reducer. Every command either fully
//! applies or is rejected with the state untouched. It has no clock of
//! its own: whoever drives it (the table actor, or a test) decides when
//! a phase's time is up and calls [`GameMachine::on_deadline`] with the
//! epoch the timer was armed for.
//!
//! ```text
//! GameStart → NightBegin → NightAction → NightSettlement → DayBegin
//!     → DayDiscussion → DayVoting → DaySettlement → NightBegin (day + 1)
//!                     (either settlement may jump to GameOver)
//! ```

use nightwatch_protocol::{GameCommand, GameId, NightActionKind, Phase, PlayerId, Role};
use tracing::{debug, info};

use crate::{
    ActionRecord, DayVotes, DecisionPolicy, EngineError, EntryKind, GameConfig, GameRng,
    GameState, NightAction, NightActions, Player, RecordedAction, StandardPolicy, Verdict,
    assign_roles, evaluate, settle_day, settle_night,
};

pub struct GameMachine {
    state: GameState,
    rng: GameRng,
    policy: Box<dyn DecisionPolicy>,
}

impl std::fmt::Debug for GameMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameMachine")
            .field("game_id", &self.state.game_id)
            .field("phase", &self.state.current_phase)
            .field("day", &self.state.current_day)
            .field("seed", &self.rng.seed())
            .finish_non_exhaustive()
    }
}

impl GameMachine {
    /// A machine in `gameStart` with the standard AI policy.
    pub fn new(game_id: GameId, seed: u64) -> Self {
        Self::with_policy(game_id, seed, StandardPolicy)
    }

    /// A machine with a custom AI policy.
    pub fn with_policy(game_id: GameId, seed: u64, policy: impl DecisionPolicy) -> Self {
        Self {
            state: GameState::new(game_id),
            rng: GameRng::new(seed),
            policy: Box::new(policy),
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// An owned copy of the state for readers outside the executor.
    pub fn snapshot(&self) -> GameState {
        self.state.clone()
    }

    pub fn seed(&self) -> u64 {
        self.rng.seed()
    }

    pub fn phase(&self) -> Phase {
        self.state.current_phase
    }

    pub fn epoch(&self) -> u64 {
        self.state.phase_epoch
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// Apply one command from the event API.
    pub fn apply(&mut self, command: GameCommand) -> Result<(), EngineError> {
        match command {
            GameCommand::StartGame {
                player_count,
                selected_role,
            } => self.start_game(GameConfig::new(player_count, selected_role)),
            GameCommand::SubmitVote {
                voter_id,
                target_id,
            } => self.submit_vote(voter_id, target_id),
            GameCommand::SubmitNightAction {
                actor_id,
                target_id,
                action_type,
            } => self.submit_night_action(actor_id, target_id, action_type),
            GameCommand::AdvancePhase => self.advance_phase().map(|_| ()),
        }
    }

    /// Deal roles, seat the players and begin the first night.
    pub fn start_game(&mut self, config: GameConfig) -> Result<(), EngineError> {
        self.expect_phase(Phase::GameStart, "start a game")?;
        let config = config.validated()?;
        let roles = assign_roles(&config, &mut self.rng)?;

        self.state.players = roles
            .iter()
            .enumerate()
            .map(|(index, role)| {
                let id = PlayerId(index as u64 + 1);
                if id == self.state.human_player_id {
                    Player::new(id, config.human_name.clone(), *role, false)
                } else {
                    Player::new(id, format!("Player {}", id.0), *role, true)
                }
            })
            .collect();

        info!(
            game_id = %self.state.game_id,
            players = config.player_count,
            seed = self.rng.seed(),
            "game started"
        );

        self.narrate(
            EntryKind::System,
            format!("A game of {} players begins.", config.player_count),
        );
        if let Some(human) = self.state.human_player() {
            let role = human.role;
            self.narrate(EntryKind::System, format!("You are the {role}."));
            if role.is_evil() {
                let allies: Vec<String> = self
                    .state
                    .players
                    .iter()
                    .filter(|p| p.id != self.state.human_player_id && p.role.is_evil())
                    .map(|p| format!("{} ({})", p.name, p.role))
                    .collect();
                if !allies.is_empty() {
                    self.narrate(
                        EntryKind::System,
                        format!("Your allies: {}.", allies.join(", ")),
                    );
                }
            }
        }

        self.enter(Phase::NightBegin);
        Ok(())
    }

    /// Record a day vote. Settles the day once every alive player has voted.
    pub fn submit_vote(&mut self, voter: PlayerId, target: PlayerId) -> Result<(), EngineError> {
        self.expect_phase(Phase::DayVoting, "vote")?;
        self.check_actor(voter)?;
        self.check_target(voter, target, false)?;

        let votes = self
            .state
            .current_day_votes
            .as_mut()
            .ok_or(EngineError::InvalidPhase {
                action: "vote",
                phase: Phase::DayVoting,
            })?;
        votes.submit(Phase::DayVoting, voter, target)?;
        let complete = votes.is_complete();

        self.record(voter, RecordedAction::Vote { target });
        let text = if voter == self.state.human_player_id {
            format!("You voted for {}.", self.state.name_of(target))
        } else {
            format!("{} has voted.", self.state.name_of(voter))
        };
        self.narrate(EntryKind::Vote, text);
        debug!(game_id = %self.state.game_id, %voter, %target, "vote accepted");

        if complete {
            self.settle_current();
        }
        Ok(())
    }

    /// Record a night action. Settles the night once every required actor
    /// has acted.
    pub fn submit_night_action(
        &mut self,
        actor: PlayerId,
        target: PlayerId,
        kind: NightActionKind,
    ) -> Result<(), EngineError> {
        self.expect_phase(Phase::NightAction, "act at night")?;
        let role = self.check_actor(actor)?;
        if role.night_action() != Some(kind) {
            return Err(EngineError::UnauthorizedActor {
                player: actor,
                reason: "role does not have this night action",
            });
        }
        self.check_target(actor, target, kind == NightActionKind::Protect)?;

        let actions =
            self.state
                .current_night_actions
                .as_mut()
                .ok_or(EngineError::InvalidPhase {
                    action: "act at night",
                    phase: Phase::NightAction,
                })?;
        actions.submit(Phase::NightAction, actor, NightAction { kind, target })?;
        let complete = actions.is_complete();

        self.record(actor, RecordedAction::Night { kind, target });
        if actor == self.state.human_player_id {
            let text = format!("You chose to {kind} {}.", self.state.name_of(target));
            self.narrate(EntryKind::Action, text);
        }
        debug!(game_id = %self.state.game_id, %actor, %target, %kind, "night action accepted");

        if complete {
            self.settle_current();
        }
        Ok(())
    }

    /// Move a non-interactive phase along. Returns the phase entered.
    ///
    /// # Errors
    /// `InvalidPhase` in `gameStart`, `gameOver`, and the interactive
    /// phases, which end by collection or by deadline.
    pub fn advance_phase(&mut self) -> Result<Phase, EngineError> {
        let phase = self.state.current_phase;
        if !phase.auto_advances() {
            return Err(EngineError::InvalidPhase {
                action: "advance",
                phase,
            });
        }
        self.advance_from(phase);
        Ok(self.state.current_phase)
    }

    /// Timer entry point.
    ///
    /// A stale `epoch` is ignored. A non-interactive phase advances. An
    /// interactive phase is settled with whatever has been submitted;
    /// missing actors are treated as having done nothing.
    ///
    /// Returns `true` if the state changed.
    pub fn on_deadline(&mut self, epoch: u64) -> bool {
        if epoch != self.state.phase_epoch {
            debug!(
                game_id = %self.state.game_id,
                epoch,
                current = self.state.phase_epoch,
                "stale deadline ignored"
            );
            return false;
        }

        let phase = self.state.current_phase;
        if phase.auto_advances() {
            self.advance_from(phase);
            true
        } else if phase.is_interactive() {
            let progress = match phase {
                Phase::DayVoting => self.state.vote_progress(),
                _ => self.state.night_action_progress(),
            };
            info!(
                game_id = %self.state.game_id,
                %phase,
                %progress,
                "phase timed out"
            );
            self.narrate(EntryKind::System, "Time is up.");
            self.settle_current()
        } else {
            false
        }
    }

    // -----------------------------------------------------------------------
    // AI turns
    // -----------------------------------------------------------------------

    /// AI seats that still owe an action this phase, in seat order.
    pub fn pending_ai_actors(&self) -> Vec<PlayerId> {
        self.state
            .players
            .iter()
            .filter(|p| p.is_ai && self.state.owes_action(p.id))
            .map(|p| p.id)
            .collect()
    }

    /// Let the policy decide for `actor` and submit the result.
    ///
    /// Works for any seat, the human included (autopilot). Returns
    /// `Ok(false)` when the actor owes nothing or the policy abstains.
    pub fn act_for(&mut self, actor: PlayerId) -> Result<bool, EngineError> {
        let phase = self.state.current_phase;
        if !phase.is_interactive() {
            return Err(EngineError::InvalidPhase {
                action: "act",
                phase,
            });
        }
        if !self.state.owes_action(actor) {
            return Ok(false);
        }

        match phase {
            Phase::NightAction => {
                match self.policy.night_action(&self.state, actor, &mut self.rng) {
                    Some(action) => self
                        .submit_night_action(actor, action.target, action.kind)
                        .map(|_| true),
                    None => Ok(false),
                }
            }
            _ => match self.policy.day_vote(&self.state, actor, &mut self.rng) {
                Some(target) => self.submit_vote(actor, target).map(|_| true),
                None => Ok(false),
            },
        }
    }

    /// Run every pending AI turn of the current phase, in seat order.
    ///
    /// Stops early if the phase settles. Returns how many were submitted.
    pub fn play_pending_ai(&mut self) -> Result<usize, EngineError> {
        let epoch = self.state.phase_epoch;
        let mut submitted = 0;
        for actor in self.pending_ai_actors() {
            if self.state.phase_epoch != epoch {
                break;
            }
            if self.act_for(actor)? {
                submitted += 1;
            }
        }
        Ok(submitted)
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    fn advance_from(&mut self, phase: Phase) {
        let Some(next) = phase.next() else {
            return;
        };
        if phase == Phase::DaySettlement {
            self.state.current_day += 1;
        }
        self.enter(next);
    }

    /// Enter `phase`: bump the epoch, narrate, and set up its collector.
    fn enter(&mut self, phase: Phase) {
        debug_assert!(
            self.state.current_phase.can_transition_to(phase),
            "illegal transition {} -> {}",
            self.state.current_phase,
            phase
        );
        self.state.current_phase = phase;
        self.state.phase_epoch += 1;
        let day = self.state.current_day;

        info!(
            game_id = %self.state.game_id,
            %phase,
            day,
            epoch = self.state.phase_epoch,
            "phase entered"
        );

        match phase {
            Phase::GameStart => {}
            Phase::NightBegin => {
                self.narrate(EntryKind::Phase, format!("Night {day} falls."));
            }
            Phase::NightAction => {
                let required: Vec<PlayerId> = self
                    .state
                    .alive_players()
                    .filter(|p| p.role.night_action().is_some())
                    .map(|p| p.id)
                    .collect();
                self.state.current_night_actions =
                    Some(NightActions::new(Phase::NightAction, required));
                self.narrate(
                    EntryKind::Phase,
                    "Those with night roles choose their targets.",
                );
            }
            Phase::NightSettlement => {
                self.narrate(EntryKind::Phase, "Dawn breaks.");
            }
            Phase::DayBegin => {
                let alive = self.state.alive_count();
                self.narrate(
                    EntryKind::Phase,
                    format!("Day {day} begins. {alive} players remain."),
                );
            }
            Phase::DayDiscussion => {
                self.narrate(EntryKind::Phase, "Discussion is open.");
            }
            Phase::DayVoting => {
                let required: Vec<PlayerId> =
                    self.state.alive_players().map(|p| p.id).collect();
                self.state.current_day_votes = Some(DayVotes::new(Phase::DayVoting, required));
                self.narrate(EntryKind::Phase, "Voting is open.");
            }
            Phase::DaySettlement => {
                self.narrate(EntryKind::Phase, "The votes are counted.");
            }
            Phase::GameOver => {}
        }
    }

    /// Close the current interactive phase and resolve it.
    ///
    /// Taking the collector out of the state is what makes this run at
    /// most once per phase instance: a second call finds nothing to
    /// settle. Returns `true` if a settlement ran.
    fn settle_current(&mut self) -> bool {
        match self.state.current_phase {
            Phase::NightAction => {
                let Some(actions) = self.state.current_night_actions.take() else {
                    return false;
                };
                self.enter(Phase::NightSettlement);
                let result = settle_night(&mut self.state, &actions);
                self.state.last_night_settlement = Some(result);
            }
            Phase::DayVoting => {
                let Some(votes) = self.state.current_day_votes.take() else {
                    return false;
                };
                self.enter(Phase::DaySettlement);
                let result = settle_day(&mut self.state, &votes, &mut self.rng);
                self.state.last_day_settlement = Some(result);
            }
            Phase::GameStart
            | Phase::NightBegin
            | Phase::NightSettlement
            | Phase::DayBegin
            | Phase::DayDiscussion
            | Phase::DaySettlement
            | Phase::GameOver => return false,
        }

        if let Some(verdict) = evaluate(&self.state.players) {
            self.finish(verdict);
        }
        true
    }

    fn finish(&mut self, verdict: Verdict) {
        self.state.winner = Some(verdict.winner);
        self.state.game_end_reason = Some(verdict.reason.clone());
        self.enter(Phase::GameOver);

        let reveal: Vec<String> = self
            .state
            .players
            .iter()
            .map(|p| format!("{} ({})", p.name, p.role))
            .collect();
        self.narrate(
            EntryKind::Outcome,
            format!(
                "Game over: the {} faction wins, {}.",
                verdict.winner, verdict.reason
            ),
        );
        self.narrate(EntryKind::Outcome, format!("Roles: {}.", reveal.join(", ")));

        info!(
            game_id = %self.state.game_id,
            winner = %verdict.winner,
            reason = %verdict.reason,
            day = self.state.current_day,
            "game over"
        );
    }

    // -----------------------------------------------------------------------
    // Validation helpers
    // -----------------------------------------------------------------------

    fn expect_phase(&self, expected: Phase, action: &'static str) -> Result<(), EngineError> {
        let phase = self.state.current_phase;
        if phase == expected {
            Ok(())
        } else {
            debug!(game_id = %self.state.game_id, %phase, action, "rejected: wrong phase");
            Err(EngineError::InvalidPhase { action, phase })
        }
    }

    /// The actor must exist and be alive. Returns its role.
    fn check_actor(&self, actor: PlayerId) -> Result<Role, EngineError> {
        let player = self
            .state
            .player(actor)
            .ok_or(EngineError::UnauthorizedActor {
                player: actor,
                reason: "unknown player",
            })?;
        if !player.is_alive {
            return Err(EngineError::UnauthorizedActor {
                player: actor,
                reason: "player is dead",
            });
        }
        Ok(player.role)
    }

    fn check_target(
        &self,
        actor: PlayerId,
        target: PlayerId,
        allow_self: bool,
    ) -> Result<(), EngineError> {
        let player = self
            .state
            .player(target)
            .ok_or(EngineError::InvalidTarget {
                target,
                reason: "unknown player",
            })?;
        if !player.is_alive {
            return Err(EngineError::InvalidTarget {
                target,
                reason: "player is dead",
            });
        }
        if target == actor && !allow_self {
            return Err(EngineError::InvalidTarget {
                target,
                reason: "cannot target yourself",
            });
        }
        Ok(())
    }

    fn record(&mut self, actor: PlayerId, action: RecordedAction) {
        self.state.action_history.push(ActionRecord {
            day: self.state.current_day,
            phase: self.state.current_phase,
            actor,
            action,
        });
    }

    fn narrate(&mut self, kind: EntryKind, text: impl Into<String>) {
        let day = self.state.current_day;
        let phase = self.state.current_phase;
        self.state.log.push(day, phase, kind, text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nightwatch_protocol::RoleChoice;

    fn started(players: usize, role: RoleChoice, seed: u64) -> GameMachine {
        let mut machine = GameMachine::new(GameId(1), seed);
        machine.start_game(GameConfig::new(players, role)).unwrap();
        machine
    }

    fn seat_of(machine: &GameMachine, role: Role) -> PlayerId {
        machine
            .state()
            .players
            .iter()
            .find(|p| p.role == role && p.is_alive)
            .map(|p| p.id)
            .unwrap()
    }

    #[test]
    fn test_start_enters_first_night() {
        let machine = started(7, RoleChoice::Random, 1);
        let state = machine.state();
        assert_eq!(state.current_phase, Phase::NightBegin);
        assert_eq!(state.current_day, 1);
        assert_eq!(state.players.len(), 7);
        assert_eq!(state.players.iter().filter(|p| !p.is_ai).count(), 1);
        assert!(!state.human_player().unwrap().is_ai);
    }

    #[test]
    fn test_start_twice_is_rejected() {
        let mut machine = started(5, RoleChoice::Random, 1);
        let before = machine.snapshot();
        let err = machine.start_game(GameConfig::default()).unwrap_err();
        assert!(matches!(err, EngineError::InvalidPhase { .. }));
        assert_eq!(machine.snapshot(), before);
    }

    #[test]
    fn test_invalid_config_creates_no_game() {
        let mut machine = GameMachine::new(GameId(1), 1);
        let err = machine
            .start_game(GameConfig::new(3, RoleChoice::Random))
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig(_)));
        assert_eq!(machine.phase(), Phase::GameStart);
        assert!(machine.state().players.is_empty());
    }

    #[test]
    fn test_advance_walks_to_night_action() {
        let mut machine = started(8, RoleChoice::Random, 2);
        assert_eq!(machine.advance_phase().unwrap(), Phase::NightAction);
        let required = machine.state().required_now();
        for id in &required {
            let role = machine.state().player(*id).unwrap().role;
            assert!(matches!(
                role,
                Role::Saboteur | Role::Investigator | Role::Protector
            ));
        }
        // 8 players: 1 saboteur, 1 investigator, 2 protectors.
        assert_eq!(required.len(), 4);
        assert!(matches!(
            machine.advance_phase(),
            Err(EngineError::InvalidPhase { .. })
        ));
    }

    #[test]
    fn test_wrong_role_action_is_rejected() {
        let mut machine = started(6, RoleChoice::Role(Role::Civilian), 3);
        machine.advance_phase().unwrap();
        let target = seat_of(&machine, Role::Saboteur);
        let err = machine
            .submit_night_action(PlayerId(1), target, NightActionKind::Check)
            .unwrap_err();
        assert!(matches!(err, EngineError::UnauthorizedActor { .. }));

        let investigator = seat_of(&machine, Role::Investigator);
        let err = machine
            .submit_night_action(investigator, target, NightActionKind::Disgust)
            .unwrap_err();
        assert!(matches!(err, EngineError::UnauthorizedActor { .. }));
    }

    #[test]
    fn test_vote_outside_voting_is_rejected() {
        let mut machine = started(5, RoleChoice::Random, 4);
        let err = machine.submit_vote(PlayerId(1), PlayerId(2)).unwrap_err();
        assert!(matches!(
            err,
            EngineError::InvalidPhase {
                phase: Phase::NightBegin,
                ..
            }
        ));
    }

    #[test]
    fn test_stale_deadline_is_noop() {
        let mut machine = started(5, RoleChoice::Random, 5);
        let stale = machine.epoch();
        machine.advance_phase().unwrap();
        let before = machine.snapshot();
        assert!(!machine.on_deadline(stale));
        assert_eq!(machine.snapshot(), before);
    }

    #[test]
    fn test_deadline_advances_non_interactive_phase() {
        let mut machine = started(5, RoleChoice::Random, 6);
        assert!(machine.on_deadline(machine.epoch()));
        assert_eq!(machine.phase(), Phase::NightAction);
    }

    #[test]
    fn test_timeout_settles_partial_night() {
        let mut machine = started(5, RoleChoice::Role(Role::Protector), 7);
        machine.advance_phase().unwrap();
        let epoch = machine.epoch();
        // Only the human protector acts; the saboteur never does.
        let target = seat_of(&machine, Role::Civilian);
        machine
            .submit_night_action(PlayerId(1), target, NightActionKind::Protect)
            .unwrap();
        assert_eq!(machine.phase(), Phase::NightAction);
        assert!(machine.on_deadline(epoch));
        assert_eq!(machine.phase(), Phase::NightSettlement);
        assert!(machine.state().current_night_actions.is_none());
        assert!(machine.state().last_night_settlement.as_ref().unwrap().is_peaceful());
        // The same deadline arriving again does nothing.
        assert!(!machine.on_deadline(epoch));
    }

    #[test]
    fn test_day_settlement_rolls_into_next_night() {
        let mut machine = started(7, RoleChoice::Random, 8);
        machine.advance_phase().unwrap();
        machine.play_pending_ai().unwrap();
        if machine.phase() == Phase::NightAction {
            assert!(machine.act_for(PlayerId(1)).unwrap());
        }
        while machine.phase() != Phase::DayVoting && !machine.state().is_game_over() {
            machine.advance_phase().unwrap();
        }
        if machine.state().is_game_over() {
            return;
        }
        machine.play_pending_ai().unwrap();
        if machine.phase() == Phase::DayVoting {
            machine.act_for(PlayerId(1)).unwrap();
        }
        if machine.state().is_game_over() {
            return;
        }
        assert_eq!(machine.phase(), Phase::DaySettlement);
        machine.advance_phase().unwrap();
        assert_eq!(machine.phase(), Phase::NightBegin);
        assert_eq!(machine.state().current_day, 2);
    }

    #[test]
    fn test_can_act_tracks_human_submission() {
        let mut machine = started(5, RoleChoice::Role(Role::Civilian), 9);
        machine.advance_phase().unwrap();
        // Civilians have no night action.
        assert!(!machine.state().can_act());
        machine.play_pending_ai().unwrap();
        assert_eq!(machine.phase(), Phase::NightSettlement);
    }
}
