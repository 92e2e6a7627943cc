//! Property-Based Tests for Requirement Quantifiers
//!
//! Property: for any list of constant children, a group evaluates exactly as
//! its quantifier's counting rule says:
//! - ALL holds iff no child fails
//! - ANY holds iff some child holds
//! - NONE holds iff no child holds
//! - ONE holds iff exactly one child holds

use proptest::prelude::*;
use requisite_core::{Quantifier, Requirement};

fn arb_quantifier() -> impl Strategy<Value = Quantifier> {
    prop_oneof![
        Just(Quantifier::All),
        Just(Quantifier::Any),
        Just(Quantifier::None),
        Just(Quantifier::One),
    ]
}

fn expected(quantifier: Quantifier, outcomes: &[bool]) -> bool {
    let holding = outcomes.iter().filter(|v| **v).count();
    match quantifier {
        Quantifier::All => holding == outcomes.len(),
        Quantifier::Any => holding > 0,
        Quantifier::None => holding == 0,
        Quantifier::One => holding == 1,
    }
}

proptest! {
    #[test]
    fn prop_group_matches_counting_rule(
        quantifier in arb_quantifier(),
        outcomes in prop::collection::vec(any::<bool>(), 0..8),
    ) {
        let children = outcomes.iter().map(|v| Requirement::constant(*v)).collect();
        let group = Requirement::group(quantifier, children);
        prop_assert_eq!(group.check().unwrap(), expected(quantifier, &outcomes));
    }

    #[test]
    fn prop_not_inverts(value in any::<bool>()) {
        let negated = Requirement::not(Requirement::constant(value));
        prop_assert_eq!(negated.check().unwrap(), !value);
    }

    #[test]
    fn prop_single_child_wrapper_only_for_none(
        quantifier in arb_quantifier(),
        value in any::<bool>(),
    ) {
        let group = Requirement::group(quantifier, vec![Requirement::constant(value)]);
        prop_assert_eq!(group.is_leaf(), quantifier != Quantifier::None);
    }
}
