//! Whole-game scenarios driven through the public `GameMachine` API.

use nightwatch_engine::{
    EngineError, EntryKind, GameConfig, GameMachine, GameState, SABOTEURS_ELIMINATED,
};
use nightwatch_protocol::{
    DeathCause, Faction, GameCommand, GameId, NightActionKind, Phase, PlayerId, Role, RoleChoice,
};

// =========================================================================
// Helpers
// =========================================================================

const HUMAN: PlayerId = PlayerId(1);

fn started(players: usize, role: RoleChoice, seed: u64) -> GameMachine {
    let mut machine = GameMachine::new(GameId(1), seed);
    machine
        .start_game(GameConfig::new(players, role))
        .expect("valid config");
    machine
}

fn seat_of(state: &GameState, role: Role) -> PlayerId {
    state
        .players
        .iter()
        .find(|p| p.role == role && p.is_alive)
        .map(|p| p.id)
        .expect("role is dealt")
}

fn advance_until(machine: &mut GameMachine, phase: Phase) {
    while machine.phase() != phase {
        machine.advance_phase().expect("phase auto-advances");
    }
}

/// Plays every seat with the policy until the game ends.
fn autoplay(machine: &mut GameMachine) {
    for _ in 0..10_000 {
        let phase = machine.phase();
        if phase == Phase::GameOver {
            return;
        }
        if phase.is_interactive() {
            let required: Vec<PlayerId> = machine.state().required_now().into_iter().collect();
            for id in required {
                if machine.phase() != phase {
                    break;
                }
                machine.act_for(id).expect("policy choice is valid");
            }
            if machine.phase() == phase {
                // Everyone the policy could act for has; close the phase.
                assert!(machine.on_deadline(machine.epoch()));
            }
        } else {
            machine.advance_phase().expect("phase auto-advances");
        }
    }
    panic!("game did not finish");
}

// =========================================================================
// Scenarios
// =========================================================================

#[test]
fn test_investigator_exposes_and_votes_out_saboteur() {
    let mut machine = started(5, RoleChoice::Role(Role::Investigator), 42);
    assert_eq!(machine.state().human_player().unwrap().role, Role::Investigator);
    let saboteur = seat_of(machine.state(), Role::Saboteur);

    advance_until(&mut machine, Phase::NightAction);
    assert!(machine.state().can_act());
    machine
        .submit_night_action(HUMAN, saboteur, NightActionKind::Check)
        .unwrap();
    assert!(!machine.state().can_act());
    machine.play_pending_ai().unwrap();

    // The saboteur goes after the investigator, and the protector covers them.
    let night = machine.state().last_night_settlement.clone().unwrap();
    assert!(night.deaths.is_empty());
    assert_eq!(machine.phase(), Phase::NightSettlement);
    assert!(machine.state().player(saboteur).unwrap().is_exposed_saboteur());
    assert!(machine.state().log.mentions("IS a Saboteur"));

    advance_until(&mut machine, Phase::DayVoting);
    machine.submit_vote(HUMAN, saboteur).unwrap();
    machine.play_pending_ai().unwrap();

    let state = machine.state();
    let day = state.last_day_settlement.as_ref().unwrap();
    assert_eq!(day.eliminated, Some(saboteur));
    assert_eq!(day.cause, Some(DeathCause::Voted));
    assert_eq!(day.votes_for(saboteur), 4);

    let dead = state.player(saboteur).unwrap();
    assert!(!dead.is_alive);
    assert_eq!(dead.death_cause, Some(DeathCause::Voted));
    assert_eq!(dead.death_day, Some(1));

    assert!(state.is_game_over());
    assert_eq!(state.winner, Some(Faction::Good));
    assert!(
        state
            .game_end_reason
            .as_deref()
            .unwrap()
            .contains(SABOTEURS_ELIMINATED)
    );
    assert_eq!(
        state.log.last().map(|e| e.kind),
        Some(EntryKind::Outcome)
    );
}

#[test]
fn test_fixed_seed_replays_identically() {
    for seed in [1, 7, 99] {
        let mut a = started(9, RoleChoice::Random, seed);
        let mut b = started(9, RoleChoice::Random, seed);
        autoplay(&mut a);
        autoplay(&mut b);
        assert_eq!(a.snapshot(), b.snapshot());
        assert!(a.state().winner.is_some());
    }
}

#[test]
fn test_large_table_plays_to_completion() {
    let mut machine = started(40, RoleChoice::Random, 2024);
    autoplay(&mut machine);
    let state = machine.state();
    assert!(state.is_game_over());
    assert!(state.game_end_reason.is_some());
    assert!(state.current_day >= 1);
}

#[test]
fn test_rejections_leave_state_untouched() {
    let mut machine = started(6, RoleChoice::Role(Role::Civilian), 3);
    advance_until(&mut machine, Phase::NightAction);
    let saboteur = seat_of(machine.state(), Role::Saboteur);
    let investigator = seat_of(machine.state(), Role::Investigator);
    let before = machine.snapshot();

    let attempts = [
        machine.submit_vote(HUMAN, saboteur),
        machine.submit_night_action(HUMAN, saboteur, NightActionKind::Check),
        machine.submit_night_action(investigator, investigator, NightActionKind::Check),
        machine.submit_night_action(investigator, PlayerId(77), NightActionKind::Check),
        machine.submit_night_action(PlayerId(77), saboteur, NightActionKind::Check),
        machine.advance_phase().map(|_| ()),
        machine.start_game(GameConfig::default()),
    ];
    for result in attempts {
        assert!(result.is_err());
    }
    assert_eq!(machine.snapshot(), before);
}

#[test]
fn test_duplicate_night_action_is_rejected() {
    let mut machine = started(5, RoleChoice::Role(Role::Protector), 11);
    advance_until(&mut machine, Phase::NightAction);
    let civilian = seat_of(machine.state(), Role::Civilian);

    machine
        .submit_night_action(HUMAN, civilian, NightActionKind::Protect)
        .unwrap();
    let err = machine
        .submit_night_action(HUMAN, HUMAN, NightActionKind::Protect)
        .unwrap_err();
    assert_eq!(err, EngineError::DuplicateSubmission(HUMAN));
    assert_eq!(machine.state().night_action_progress().submitted, 1);
}

#[test]
fn test_dead_player_cannot_vote_or_be_voted() {
    let mut machine = started(7, RoleChoice::Role(Role::Saboteur), 5);
    advance_until(&mut machine, Phase::NightAction);
    // The protector always covers the investigator, so a civilian stays exposed.
    let victim = seat_of(machine.state(), Role::Civilian);
    machine
        .submit_night_action(HUMAN, victim, NightActionKind::Disgust)
        .unwrap();
    machine.play_pending_ai().unwrap();

    let dead = machine.state().player(victim).unwrap();
    assert!(!dead.is_alive);
    assert_eq!(dead.death_cause, Some(DeathCause::Disgusted));
    assert!(machine.state().log.mentions("found dead"));

    advance_until(&mut machine, Phase::DayVoting);
    assert_eq!(machine.state().vote_progress().total, 6);
    let err = machine.submit_vote(victim, HUMAN).unwrap_err();
    assert!(matches!(err, EngineError::UnauthorizedActor { .. }));
    let err = machine.submit_vote(HUMAN, victim).unwrap_err();
    assert!(matches!(err, EngineError::InvalidTarget { .. }));
}

#[test]
fn test_early_completion_makes_deadline_stale() {
    let mut machine = started(5, RoleChoice::Random, 8);
    advance_until(&mut machine, Phase::NightAction);
    let armed = machine.epoch();
    autoplay_phase(&mut machine);
    assert_eq!(machine.phase(), Phase::NightSettlement);

    let before = machine.snapshot();
    assert!(!machine.on_deadline(armed));
    assert_eq!(machine.snapshot(), before);
}

#[test]
fn test_voting_timeout_settles_with_partial_votes() {
    let mut machine = started(5, RoleChoice::Role(Role::Civilian), 12);
    advance_until(&mut machine, Phase::NightAction);
    machine.play_pending_ai().unwrap();
    if machine.state().is_game_over() {
        return;
    }
    advance_until(&mut machine, Phase::DayVoting);
    let voters = machine.state().vote_progress().total;

    let saboteur = seat_of(machine.state(), Role::Saboteur);
    if machine.state().can_act() {
        machine.submit_vote(HUMAN, saboteur).unwrap();
    }
    assert!(machine.on_deadline(machine.epoch()));

    let state = machine.state();
    assert!(voters > 1);
    assert!(state.log.mentions("Time is up."));
    assert!(state.current_day_votes.is_none());
    let day = state.last_day_settlement.as_ref().unwrap();
    if state.player(HUMAN).unwrap().is_alive {
        assert_eq!(day.eliminated, Some(saboteur));
        assert_eq!(state.winner, Some(Faction::Good));
    }
}

#[test]
fn test_commands_apply_from_wire_form() {
    let mut machine = GameMachine::new(GameId(3), 31);
    let start: GameCommand =
        serde_json::from_str(r#"{"type":"START_GAME","playerCount":6,"selectedRole":"protector"}"#)
            .unwrap();
    machine.apply(start).unwrap();
    assert_eq!(machine.state().human_player().unwrap().role, Role::Protector);

    let advance: GameCommand = serde_json::from_str(r#"{"type":"ADVANCE_PHASE"}"#).unwrap();
    machine.apply(advance).unwrap();
    assert_eq!(machine.phase(), Phase::NightAction);

    let protect: GameCommand = serde_json::from_str(
        r#"{"type":"SUBMIT_NIGHT_ACTION","actorId":1,"targetId":1,"actionType":"protect"}"#,
    )
    .unwrap();
    machine.apply(protect).unwrap();
    assert!(!machine.state().can_act());
}

#[test]
fn test_absent_selected_role_is_invalid_config() {
    let mut machine = GameMachine::new(GameId(1), 1);
    let err = machine
        .start_game(GameConfig::new(5, RoleChoice::Role(Role::Accomplice)))
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidConfig(_)));
    assert_eq!(machine.phase(), Phase::GameStart);
}

/// Lets the policy act for every required seat in the current phase.
fn autoplay_phase(machine: &mut GameMachine) {
    let phase = machine.phase();
    let required: Vec<PlayerId> = machine.state().required_now().into_iter().collect();
    for id in required {
        if machine.phase() != phase {
            break;
        }
        machine.act_for(id).unwrap();
    }
}
