use std::io;

use crate::regex::Regex::*;
use crate::{Definitions, Error, Fst, Multitape, ParseError, PathCount, Regex, Row};

fn fst(regex: &str) -> Fst {
    regex.parse().unwrap()
}

fn words(fst: &Fst) -> Vec<String> {
    fst.words().unwrap().collect()
}

fn sym(s: &str) -> Regex {
    Symbol(s.to_owned())
}

#[test]
fn test_regex_parse() {
    assert_eq!("abc".parse::<Regex>().unwrap(), sym("abc"));
    assert_eq!("a b".parse::<Regex>().unwrap(), Cat(vec![sym("a"), sym("b")]));
    assert_eq!(
        "{ab}".parse::<Regex>().unwrap(),
        Word(vec!["a".to_owned(), "b".to_owned()])
    );
    assert_eq!(
        "a:b".parse::<Regex>().unwrap(),
        Pair(Box::new(sym("a")), Box::new(sym("b")))
    );
    assert_eq!(
        "a|b&c".parse::<Regex>().unwrap(),
        And(vec![Alt(vec![sym("a"), sym("b")]), sym("c")])
    );
    assert_eq!(
        "a|b|c".parse::<Regex>().unwrap(),
        Alt(vec![sym("a"), sym("b"), sym("c")])
    );
    assert_eq!(
        "~a*".parse::<Regex>().unwrap(),
        Not(Box::new(Kleene(Box::new(sym("a")))))
    );
    assert_eq!(
        "a^2".parse::<Regex>().unwrap(),
        Power(Box::new(sym("a")), 2)
    );
    assert_eq!("(a)".parse::<Regex>().unwrap(), Optional(Box::new(sym("a"))));
    assert_eq!("[]".parse::<Regex>().unwrap(), Empty);
    assert_eq!("0".parse::<Regex>().unwrap(), Empty);
    assert_eq!("%|".parse::<Regex>().unwrap(), Literal("|".to_owned()));
    assert_eq!("\"a b\"".parse::<Regex>().unwrap(), Literal("a b".to_owned()));
    assert_eq!(
        "a b/c".parse::<Regex>().unwrap(),
        Cat(vec![sym("a"), Ignore(Box::new(sym("b")), Box::new(sym("c")))])
    );
    assert_eq!(
        "a .o. b | c".parse::<Regex>().unwrap(),
        Compose(Box::new(sym("a")), Box::new(Alt(vec![sym("b"), sym("c")])))
    );
    assert_eq!(
        "a.u.i".parse::<Regex>().unwrap(),
        Invert(Box::new(Upper(Box::new(sym("a")))))
    );
    assert_eq!(
        "f(a, b)".parse::<Regex>().unwrap(),
        Call("f".to_owned(), vec![sym("a"), sym("b")])
    );
}

#[test]
fn test_regex_parse_error() {
    assert!("".parse::<Regex>().is_err());
    assert!("*".parse::<Regex>().is_err());
    assert!("[a".parse::<Regex>().is_err());
    assert!("(a".parse::<Regex>().is_err());
    assert!("a^x".parse::<Regex>().is_err());
    assert!("a |".parse::<Regex>().is_err());
    assert!("}".parse::<Regex>().is_err());
    assert!("\"abc".parse::<Regex>().is_err());
    assert!("f(a".parse::<Regex>().is_err());
    assert!(matches!("a^10001".parse::<Regex>(), Err(ParseError::BadPower(_))));
    assert!(matches!("a^4000000000".parse::<Regex>(), Err(ParseError::BadPower(_))));
}

#[test]
fn test_compile_error_keeps_regex() {
    match Fst::compile("a [", &Definitions::new()) {
        Err(Error::Syntax { regex, .. }) => assert_eq!(regex, "a ["),
        other => panic!("unexpected {:?}", other),
    }
    match Fst::compile("a\u{7}b", &Definitions::new()) {
        Err(Error::Syntax {
            reason: ParseError::ReservedSymbol(_),
            ..
        }) => {}
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_words_shortest_first() {
    let f = fst("a | a b | a b c");
    assert_eq!(words(&f), ["a", "ab", "abc"]);
    assert_eq!(f.len().unwrap(), PathCount::Finite(3));

    let f = fst("[a | b]+");
    let first: Vec<_> = f.words().unwrap().take(6).collect();
    assert_eq!(first, ["a", "b", "aa", "ab", "ba", "bb"]);
    assert!(!f.words().unwrap().is_finite());
}

#[test]
fn test_length_overflow() {
    assert_eq!(fst("[a | b]^63").len().unwrap(), PathCount::Finite(1 << 63));
    assert_eq!(fst("[a | b]^64").len().unwrap(), PathCount::Overflow);
}

#[test]
fn test_cyclic_length() {
    assert!(matches!(fst("a+").len(), Err(Error::CyclicLength)));
}

#[test]
fn test_empty_language() {
    let f = fst("a & b");
    assert!(f.is_empty().unwrap());
    assert!(words(&f).is_empty());
    assert_eq!(f.len().unwrap(), PathCount::Finite(0));
}

#[test]
fn test_empty_string() {
    assert_eq!(words(&fst("0")), [""]);
    assert_eq!(words(&fst("(a)")), ["", "a"]);
}

#[test]
fn test_apply() {
    let plural = fst("c a t 0:s");
    assert_eq!(plural.apply("cat").unwrap(), ["cats"]);
    let up: Vec<_> = plural.apply_up("cats").unwrap().collect();
    assert_eq!(up, ["cat"]);
    assert!(plural.apply("dog").unwrap().is_empty());
    assert!(plural.contains("cat").unwrap());
    assert!(!plural.contains("cats").unwrap());
}

#[test]
fn test_apply_up_round_trips() {
    let f = fst("a:b | c:b | d");
    for lower in f.lower_words().unwrap() {
        let uppers: Vec<String> = f.apply_up(&lower).unwrap().collect();
        assert!(!uppers.is_empty());
        for upper in uppers {
            assert!(f.apply(&upper).unwrap().contains(&lower));
        }
    }
    let up: Vec<_> = f.apply_up("b").unwrap().collect();
    assert_eq!(up, ["a", "c"]);
}

#[test]
fn test_pair_words() {
    assert_eq!(words(&fst("a:b c")), ["a:bc"]);
    assert_eq!(words(&fst("a:0")), ["a:0"]);
}

#[test]
fn test_tokens() {
    let f = fst("ch a");
    let tokens: Vec<_> = f.upper_words().unwrap().tokens().collect();
    assert_eq!(tokens, vec![vec!["ch".to_owned(), "a".to_owned()]]);
    assert_eq!(f.apply("cha").unwrap(), ["cha"]);
}

#[test]
fn test_compose_deletion_with_insertion() {
    let f = fst("a:0").compose(&fst("0:b")).unwrap();
    assert_eq!(f.len().unwrap(), PathCount::Finite(1));
    assert_eq!(words(&f), ["a:00:b"]);
    assert!(f.equivalent(&fst("a:0 0:b")).unwrap());
    assert_eq!(f.apply("a").unwrap(), ["b"]);
}

#[test]
fn test_compose() {
    let f = fst("a:b").compose(&fst("b:c")).unwrap();
    assert_eq!(f.apply("a").unwrap(), ["c"]);
    assert!(f.equivalent(&fst("a:c")).unwrap());
    assert!(fst("a:b .o. b:c").equivalent(&f).unwrap());
}

#[test]
fn test_any_passes_unknown_symbols() {
    let f = fst("?* 0:x");
    assert_eq!(f.apply("ab").unwrap(), ["abx"]);
    let g = fst("a:b | ?");
    let mut out = g.apply("a").unwrap();
    out.sort();
    assert_eq!(out, ["a", "b"]);
    assert_eq!(g.apply("z").unwrap(), ["z"]);
}

#[test]
fn test_complement() {
    let f = fst("a").complement().unwrap();
    assert!(f.contains("").unwrap());
    assert!(f.contains("b").unwrap());
    assert!(f.contains("aa").unwrap());
    assert!(!f.contains("a").unwrap());
    let disjoint = fst("a b*").intersect(&fst("a b*").complement().unwrap()).unwrap();
    assert!(words(&disjoint).is_empty());
}

#[test]
fn test_algebra_laws() {
    let a = fst("a b*");
    let b = fst("b | a");
    let both = a.union(&b).unwrap().intersect(&a).unwrap();
    assert!(a.equivalent(&both).unwrap());
    assert!(a.union(&b).unwrap().equivalent(&b.union(&a).unwrap()).unwrap());
    assert!(!a.equivalent(&b).unwrap());
    let diff = a.subtract(&b).unwrap();
    assert!(diff.intersect(&b).unwrap().is_empty().unwrap());
}

#[test]
fn test_subsets() {
    let a = fst("a b");
    let b = fst("a b | c");
    assert!(a.is_subset_of(&a).unwrap());
    assert!(!a.is_proper_subset_of(&a).unwrap());
    assert!(a.is_subset_of(&b).unwrap());
    assert!(a.is_proper_subset_of(&b).unwrap());
    assert!(!b.is_subset_of(&a).unwrap());
}

#[test]
fn test_unary_operations() {
    assert_eq!(words(&fst("a:b").invert().unwrap()), ["b:a"]);
    assert_eq!(words(&fst("a:b").upper().unwrap()), ["a"]);
    assert_eq!(words(&fst("a:b").lower().unwrap()), ["b"]);
    assert_eq!(words(&fst("a").optional().unwrap()), ["", "a"]);
    assert_eq!(fst("a").star().unwrap().words().unwrap().take(2).collect::<Vec<_>>(), ["", "a"]);
    assert_eq!(fst("a").plus().unwrap().words().unwrap().take(2).collect::<Vec<_>>(), ["a", "aa"]);
    assert_eq!(words(&fst("a").concatenate(&fst("b")).unwrap()), ["ab"]);
    assert_eq!(words(&fst("a:0 b").flatten().unwrap()), ["a□bb"]);
}

#[test]
fn test_unminimized() {
    let a = fst("a");
    let b = fst("a | b");
    let raw = a.unminimized().union(&b).unwrap();
    assert!(!raw.stats().unwrap().minimized);
    let min = a.union(&b).unwrap();
    assert!(min.stats().unwrap().minimized);
    assert!(raw.equivalent(&min).unwrap());
    assert!(raw.stats().unwrap().states >= min.stats().unwrap().states);
}

#[test]
fn test_operands_unchanged() {
    let a = fst("a");
    let before = a.clone();
    a.union(&fst("b")).unwrap();
    a.complement().unwrap();
    assert_eq!(a, before);
}

#[test]
fn test_undefined() {
    let a = fst("a");
    let mut gone = fst("b");
    gone.destroy();
    gone.destroy();
    assert!(!gone.is_defined());
    assert!(matches!(gone.words(), Err(Error::UndefinedAutomaton)));
    assert!(matches!(a.union(&gone), Err(Error::UndefinedAutomaton)));
    assert!(matches!(a.equivalent(&gone), Err(Error::UndefinedComparison)));
    assert!(matches!(Fst::default().is_subset_of(&a), Err(Error::UndefinedComparison)));
}

#[test]
fn test_stats() {
    let stats = fst("a b | a c").stats().unwrap();
    assert_eq!(stats.states, 3);
    assert_eq!(stats.finals, 1);
    assert_eq!(stats.arity, 1);
    assert!(stats.deterministic);
    assert_eq!(stats.paths, PathCount::Finite(2));
    assert!(stats.to_string().starts_with("States: 3\n"));
    assert_eq!(fst("a:b").stats().unwrap().arity, 2);
}

#[test]
fn test_wordlist() {
    let list = Fst::wordlist(&["cat", "car"], true).unwrap();
    assert_eq!(words(&list), ["car", "cat"]);
    assert!(list.contains("cat").unwrap());
    assert!(!list.contains("ca").unwrap());
    let trie = Fst::wordlist(&["cat", "car"], false).unwrap();
    assert!(list.stats().unwrap().states <= trie.stats().unwrap().states);
    let reversed = Fst::wordlist(&["car", "cat"], true).unwrap();
    assert!(list.equivalent(&reversed).unwrap());
}

#[test]
fn test_all_accepting_stays_finite() {
    let prefixes = Fst::wordlist(&["", "a", "aa"], true).unwrap();
    assert_eq!(words(&prefixes), ["", "a", "aa"]);
    assert_eq!(prefixes.len().unwrap(), PathCount::Finite(3));
    assert_eq!(fst("(a (a))").len().unwrap(), PathCount::Finite(3));
    assert_eq!(words(&fst("(a (a))")), ["", "a", "aa"]);
}

#[test]
fn test_reserved_symbols() {
    assert!(matches!(
        Fst::wordlist(&["a\u{7}b"], true),
        Err(Error::ReservedSymbol(_))
    ));
    assert!(matches!(Fst::wordlist(&["ok", "□"], true), Err(Error::ReservedSymbol(_))));
    for regex in &["□", "a □", "□:a"] {
        assert!(matches!(
            Fst::compile(regex, &Definitions::new()),
            Err(Error::Syntax {
                reason: ParseError::ReservedSymbol(_),
                ..
            })
        ));
    }
    assert!(Multitape::compile("□:a", &Definitions::new()).is_err());
    let a = fst("a ?*");
    assert!(matches!(a.apply("a□"), Err(Error::ReservedSymbol(_))));
    assert!(matches!(a.apply_up("a\u{7}"), Err(Error::ReservedSymbol(_))));
    assert!(matches!(a.contains("□"), Err(Error::ReservedSymbol(_))));
}

#[test]
fn test_definitions() {
    let mut defs = Definitions::new();
    defs.define("V", "a | e").unwrap();
    assert!(defs.is_defined("V"));
    let f = Fst::compile("b V", &defs).unwrap();
    assert_eq!(words(&f), ["ba", "be"]);

    defs.define("V", &fst("o")).unwrap();
    assert_eq!(words(&Fst::compile("b V", &defs).unwrap()), ["bo"]);
    assert_eq!(words(&f), ["ba", "be"]);
    assert_eq!(words(&Fst::compile("b %V", &defs).unwrap()), ["bV"]);
}

#[test]
fn test_functions() {
    let mut defs = Definitions::new();
    defs.define_function("twice", &["X"], "X X").unwrap();
    assert_eq!(defs.function("twice").unwrap().arity(), 1);
    let f = Fst::compile("twice(a | b)", &defs).unwrap();
    assert_eq!(words(&f), ["aa", "ab", "ba", "bb"]);
    assert_eq!(words(&Fst::compile("twice(twice(c))", &defs).unwrap()), ["cccc"]);
    assert_eq!(words(&defs.invoke("twice", &[&fst("c")]).unwrap()), ["cc"]);
    // `XY` is a different symbol from `X`.
    defs.define_function("tag", &["X"], "XY X").unwrap();
    assert_eq!(words(&Fst::compile("tag(a)", &defs).unwrap()), ["XYa"]);

    assert!(matches!(
        Fst::compile("twice(a, b)", &defs),
        Err(Error::Syntax {
            reason: ParseError::WrongArity { expected: 1, found: 2, .. },
            ..
        })
    ));
    assert!(matches!(
        Fst::compile("nope(a)", &defs),
        Err(Error::Syntax {
            reason: ParseError::UndefinedFunction(_),
            ..
        })
    ));
    assert!(defs.invoke("twice", &[]).is_err());
    assert!(defs.define_function("bad", &["X"], "X |").is_err());
}

#[test]
fn test_recursive_function_is_bounded() {
    let mut defs = Definitions::new();
    defs.define_function("loop", &["X"], "loop(X)").unwrap();
    assert!(matches!(
        Fst::compile("loop(a)", &defs),
        Err(Error::Syntax {
            reason: ParseError::TooDeep,
            ..
        })
    ));
}

#[test]
fn test_save_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plural.fst");
    let f = fst("c a t 0:s | d o g 0:s");
    f.save(&path).unwrap();
    let g = Fst::load(&path).unwrap();
    assert_eq!(f, g);
    assert_eq!(g.apply("dog").unwrap(), ["dogs"]);
}

#[test]
fn test_load_errors() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("garbage.fst");
    std::fs::write(&path, b"not an automaton").unwrap();
    match Fst::load(&path) {
        Err(Error::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::InvalidData),
        other => panic!("unexpected {:?}", other),
    }
    match Fst::load(dir.path().join("missing.fst")) {
        Err(Error::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::NotFound),
        other => panic!("unexpected {:?}", other),
    }
    assert!(matches!(Fst::default().save(&path), Err(Error::UndefinedAutomaton)));
}

#[test]
fn test_multitape_join_tapes() {
    let defs = Definitions::new();
    let a = Multitape::compile("a:b | c:d", &defs).unwrap();
    let b = Multitape::compile("b:x", &defs).unwrap();
    let c = a.join(&b).unwrap();
    assert_eq!(c.tapes(), 3);
    let rows: Vec<Row> = c.rows().unwrap().collect();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].tape(0).as_deref(), Some("a"));
    assert_eq!(rows[0].tape(2).as_deref(), Some("x"));
    assert_eq!(c.stats().unwrap().tapes, 3);
}

fn row_tapes(row: &Row) -> Vec<String> {
    (0..row.tapes()).map(|i| row.tape(i).unwrap()).collect()
}

#[test]
fn test_multitape_join_rows_come_from_both_sides() {
    let defs = Definitions::new();
    let a = Multitape::compile("a:b | c:0 | d:b e:0", &defs).unwrap();
    let b = Multitape::compile("b:x | 0:y", &defs).unwrap();
    let c = a.join(&b).unwrap();
    assert_eq!(c.tapes(), 3);
    let a_rows: Vec<Vec<String>> = a.rows().unwrap().map(|r| row_tapes(&r)).collect();
    let b_rows: Vec<Vec<String>> = b.rows().unwrap().map(|r| row_tapes(&r)).collect();
    let mut joined: Vec<Vec<String>> = c.rows().unwrap().take(100).map(|r| row_tapes(&r)).collect();
    for row in joined.iter() {
        assert!(a_rows.iter().any(|ra| ra[..] == row[..2]), "{:?}", row);
        assert!(b_rows.iter().any(|rb| rb[..] == row[1..]), "{:?}", row);
    }
    joined.sort();
    assert_eq!(
        joined,
        vec![
            vec!["a", "b", "x"],
            vec!["c", "", "y"],
            vec!["de", "b", "x"],
        ]
    );
}

#[test]
fn test_multitape_join_one_tape() {
    let defs = Definitions::new();
    let inputs = Multitape::from_fst(fst("a b"), 1).unwrap();
    let pairs = Multitape::compile("a:x b:y | c:z", &defs).unwrap();

    let left = inputs.join(&pairs).unwrap();
    assert_eq!(left.tapes(), 2);
    let rows: Vec<Vec<String>> = left.rows().unwrap().map(|r| row_tapes(&r)).collect();
    assert_eq!(rows, vec![vec!["ab", "xy"]]);

    let outputs = Multitape::from_fst(fst("x y"), 1).unwrap();
    let right = pairs.join(&outputs).unwrap();
    assert_eq!(right.tapes(), 2);
    let rows: Vec<Vec<String>> = right.rows().unwrap().map(|r| row_tapes(&r)).collect();
    assert_eq!(rows, vec![vec!["ab", "xy"]]);
}
