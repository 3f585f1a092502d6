//! Property-based tests for the automaton algebra.

use proptest::prelude::*;

use crate::dfa::minimize;
use crate::Fst;

// Acceptor regexes over {a, b, c}.
fn regex() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![Just("a"), Just("b"), Just("c"), Just("0")].prop_map(String::from);
    leaf.prop_recursive(3, 12, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(x, y)| format!("[{} {}]", x, y)),
            (inner.clone(), inner.clone()).prop_map(|(x, y)| format!("[{} | {}]", x, y)),
            (inner.clone(), inner.clone()).prop_map(|(x, y)| format!("[{} & {}]", x, y)),
            (inner.clone(), inner.clone()).prop_map(|(x, y)| format!("[{} - {}]", x, y)),
            inner.prop_map(|x| format!("[{}]*", x)),
        ]
    })
}

fn fst(regex: &str) -> Fst {
    regex.parse().unwrap()
}

proptest! {
    #[test]
    fn union_commutative(x in regex(), y in regex()) {
        let (a, b) = (fst(&x), fst(&y));
        prop_assert!(a.union(&b).unwrap().equivalent(&b.union(&a).unwrap()).unwrap());
    }

    #[test]
    fn absorption(x in regex(), y in regex()) {
        let (a, b) = (fst(&x), fst(&y));
        let both = a.union(&b).unwrap().intersect(&a).unwrap();
        prop_assert!(a.equivalent(&both).unwrap());
    }

    #[test]
    fn intersect_with_complement_is_empty(x in regex()) {
        let a = fst(&x);
        let none = a.intersect(&a.complement().unwrap()).unwrap();
        prop_assert_eq!(none.words().unwrap().next(), None);
    }

    #[test]
    fn subset_order(x in regex(), y in regex()) {
        let (a, b) = (fst(&x), fst(&y));
        prop_assert!(a.is_subset_of(&a).unwrap());
        prop_assert!(a.is_subset_of(&a.union(&b).unwrap()).unwrap());
        prop_assert!(a.intersect(&b).unwrap().is_subset_of(&a).unwrap());
        if a.is_subset_of(&b).unwrap() && b.is_subset_of(&a).unwrap() {
            prop_assert!(a.equivalent(&b).unwrap());
        }
    }

    #[test]
    fn difference_is_disjoint(x in regex(), y in regex()) {
        let (a, b) = (fst(&x), fst(&y));
        let diff = a.subtract(&b).unwrap();
        prop_assert!(diff.intersect(&b).unwrap().is_empty().unwrap());
        prop_assert!(diff.is_subset_of(&a).unwrap());
    }

    #[test]
    fn minimize_is_idempotent(x in regex()) {
        let raw = fst(&x).unminimized().star().unwrap().into_inner().unwrap();
        let once = minimize(raw);
        let mut stale = once.clone();
        stale.minimized = false;
        prop_assert_eq!(minimize(stale), once);
    }

    #[test]
    fn words_are_accepted_shortest_first(x in regex()) {
        let a = fst(&x);
        let mut last = 0;
        for w in a.words().unwrap().take(20) {
            prop_assert!(w.len() >= last);
            last = w.len();
            prop_assert!(a.contains(&w).unwrap());
        }
    }
}
