//! Property tests over role dealing and action collection.

use std::collections::BTreeSet;

use nightwatch_engine::{
    DayVotes, GameConfig, GameMachine, GameRng, MAX_PLAYERS, MIN_PLAYERS, RoleDistribution,
    assign_roles,
};
use nightwatch_protocol::{GameId, Phase, PlayerId, Role, RoleChoice};
use proptest::prelude::*;

fn role_choice() -> impl Strategy<Value = RoleChoice> {
    prop_oneof![
        Just(RoleChoice::Random),
        prop::sample::select(Role::ALL.to_vec()).prop_map(RoleChoice::Role),
    ]
}

proptest! {
    #[test]
    fn test_distribution_sums_to_player_count(n in MIN_PLAYERS..=MAX_PLAYERS) {
        let dist = RoleDistribution::for_player_count(n).unwrap();
        prop_assert_eq!(dist.total(), n);
        prop_assert!(dist.saboteur >= 1);
        if n > 10 {
            prop_assert!(dist.accomplice >= 1);
            prop_assert!(dist.investigator >= 2);
            prop_assert!(dist.protector >= 2);
        }
    }

    #[test]
    fn test_assigned_roles_match_distribution(
        n in MIN_PLAYERS..=MAX_PLAYERS,
        choice in role_choice(),
        seed in any::<u64>(),
    ) {
        let dist = RoleDistribution::for_player_count(n).unwrap();
        let config = GameConfig::new(n, choice);
        let Ok(config) = config.validated() else {
            // Only a role absent at this size is refused.
            let RoleChoice::Role(role) = choice else {
                return Err(TestCaseError::fail("random choice refused"));
            };
            prop_assert_eq!(dist.count(role), 0);
            return Ok(());
        };

        let roles = assign_roles(&config, &mut GameRng::new(seed)).unwrap();
        prop_assert_eq!(roles.len(), n);
        for role in Role::ALL {
            prop_assert_eq!(roles.iter().filter(|r| **r == role).count(), dist.count(role));
        }
        if let RoleChoice::Role(role) = choice {
            prop_assert_eq!(roles[0], role);
        }
    }

    #[test]
    fn test_submitted_is_subset_of_required(
        required in prop::collection::btree_set(1u64..20, 1..10),
        attempts in prop::collection::vec((0u64..25, 0u64..25), 0..40),
    ) {
        let mut votes = DayVotes::new(
            Phase::DayVoting,
            required.iter().copied().map(PlayerId),
        );
        for (voter, target) in attempts {
            let _ = votes.submit(Phase::DayVoting, PlayerId(voter), PlayerId(target));
        }
        let required: BTreeSet<PlayerId> = required.into_iter().map(PlayerId).collect();
        prop_assert!(votes.submitted().is_subset(&required));
        prop_assert_eq!(votes.submissions().len(), votes.submitted().len());
        prop_assert_eq!(votes.is_complete(), votes.submitted() == required);
    }

    #[test]
    fn test_start_seats_one_human(n in MIN_PLAYERS..=30usize, seed in any::<u64>()) {
        let mut machine = GameMachine::new(GameId(1), seed);
        machine.start_game(GameConfig::new(n, RoleChoice::Random)).unwrap();
        let state = machine.state();
        prop_assert_eq!(state.players.iter().filter(|p| !p.is_ai).count(), 1);
        prop_assert_eq!(state.human_player().map(|p| p.id), Some(state.human_player_id));
        prop_assert_eq!(state.current_phase, Phase::NightBegin);
    }
}
