//! Property tests for ground attrition.
//!
//! With the random stream held fixed, more attacking power can only make
//! things worse for the defender and better for the attacker.

use proptest::prelude::*;
use warsim_core::combat::ground::lanchester;
use warsim_core::combat::CombatOutcome;
use warsim_core::math::ratio;
use warsim_core::rng::TurnRng;
use warsim_test_utils::strategies::{arb_ordered_powers, arb_power, arb_seed, arb_strength};

proptest! {
    #[test]
    fn test_more_attack_never_helps_the_defender(
        seed in arb_seed(),
        (weak, strong) in arb_ordered_powers(),
        defense in arb_power(),
        attackers in arb_strength(),
        defenders in arb_strength(),
        steps in 1u32..=12,
    ) {
        let (weak_a, weak_d) = lanchester(&mut TurnRng::from_seed(seed), steps, (weak, attackers), (defense, defenders));
        let (strong_a, strong_d) = lanchester(&mut TurnRng::from_seed(seed), steps, (strong, attackers), (defense, defenders));

        prop_assert!(strong_d >= weak_d, "defender losses fell from {} to {}", weak_d, strong_d);
        prop_assert!(strong_a <= weak_a, "attacker losses rose from {} to {}", weak_a, strong_a);
    }

    #[test]
    fn test_losses_never_exceed_strength(
        seed in arb_seed(),
        attack in arb_power(),
        defense in arb_power(),
        attackers in arb_strength(),
        defenders in arb_strength(),
        steps in 0u32..=12,
    ) {
        let (lost_a, lost_d) = lanchester(&mut TurnRng::from_seed(seed), steps, (attack, attackers), (defense, defenders));
        prop_assert!(lost_a <= attackers);
        prop_assert!(lost_d <= defenders);
    }

    #[test]
    fn test_outcome_rank_follows_force_ratio(
        (low, high) in arb_ordered_powers(),
        defense in arb_power(),
    ) {
        let weaker = CombatOutcome::from_ratio(ratio(low, defense));
        let stronger = CombatOutcome::from_ratio(ratio(high, defense));
        prop_assert!(stronger.rank() >= weaker.rank());
    }

    #[test]
    fn test_same_stream_same_losses(
        seed in arb_seed(),
        attack in arb_power(),
        defense in arb_power(),
        attackers in arb_strength(),
        defenders in arb_strength(),
    ) {
        let first = lanchester(&mut TurnRng::from_seed(seed), 6, (attack, attackers), (defense, defenders));
        let second = lanchester(&mut TurnRng::from_seed(seed), 6, (attack, attackers), (defense, defenders));
        prop_assert_eq!(first, second);
    }
}
