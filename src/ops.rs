//! Automaton algebra. Every operation consumes its operands; callers that
//! want to keep an operand pass a clone.

use crate::dfa::{determinize, minimize, Worklist};
use crate::net::{Arc, Net, State, StateId};
use crate::sigma::{Label, Sym, EPSILON, IDENTITY, UNKNOWN};

/// Brings two automata onto one alphabet. Symbols one side has never seen
/// are added to its `?` and `@` arcs.
pub fn harmonize(mut a: Net, mut b: Net) -> (Net, Net) {
    if a.sigma == b.sigma {
        return (a, b);
    }
    let mut sigma = a.sigma.clone();
    let (map_b, new_for_a) = sigma.merge(&b.sigma);
    b.relabel(&map_b);
    let new_for_b: Vec<_> = sigma
        .symbols()
        .filter(|s| !map_b.contains(s))
        .collect();
    a.expand_unknowns(&new_for_a);
    b.expand_unknowns(&new_for_b);
    a.sigma = sigma.clone();
    b.sigma = sigma;
    (a, b)
}

/// Appends the states of `b` to `a`, returning the offset of `b`'s states.
/// Both must already share an alphabet.
fn append(a: &mut Net, b: Net) -> StateId {
    let offset = a.states.len() as StateId;
    for state in b.states.into_iter() {
        a.states.push(State {
            arcs: state
                .arcs
                .into_iter()
                .map(|arc| Arc {
                    label: arc.label,
                    target: arc.target + offset,
                })
                .collect(),
            accepting: state.accepting,
        });
    }
    a.minimized = false;
    offset
}

pub fn union(a: Net, b: Net) -> Net {
    let (mut a, b) = harmonize(a, b);
    let b_start = b.start;
    let offset = append(&mut a, b);
    let start = a.add_state(false);
    let a_start = a.start;
    a.add_arc(start, Label::epsilon(), a_start);
    a.add_arc(start, Label::epsilon(), b_start + offset);
    a.start = start;
    a
}

pub fn concat(a: Net, b: Net) -> Net {
    let (mut a, b) = harmonize(a, b);
    let b_start = b.start;
    let finals: Vec<StateId> = finals(&a);
    let offset = append(&mut a, b);
    for f in finals {
        a.states[f as usize].accepting = false;
        a.add_arc(f, Label::epsilon(), b_start + offset);
    }
    a
}

fn finals(net: &Net) -> Vec<StateId> {
    net.states
        .iter()
        .enumerate()
        .filter(|&(_, s)| s.accepting)
        .map(|(i, _)| i as StateId)
        .collect()
}

pub fn star(a: Net) -> Net {
    let mut a = plus(a);
    let start = a.add_state(true);
    let old = a.start;
    a.add_arc(start, Label::epsilon(), old);
    a.start = start;
    a
}

pub fn plus(mut a: Net) -> Net {
    let start = a.start;
    for f in finals(&a) {
        a.add_arc(f, Label::epsilon(), start);
    }
    a
}

pub fn optional(a: Net) -> Net {
    union(a, Net::epsilon())
}

/// `n` copies of `a` in sequence; `^0` is the empty string.
pub fn power(a: Net, mut n: u32) -> Net {
    let mut result = Net::epsilon();
    let mut base = minimize(a);
    while n > 0 {
        if n & 1 == 1 {
            result = minimize(concat(result, base.clone()));
        }
        n >>= 1;
        if n > 0 {
            base = minimize(concat(base.clone(), base));
        }
    }
    result
}

/// The relation containing every pair of one string of `a` and one string of
/// `b`, where both are read as acceptors.
pub fn cross(a: Net, b: Net) -> Net {
    let mut a = upper(a);
    let mut b = lower(b);
    for state in a.states.iter_mut() {
        for arc in state.arcs.iter_mut() {
            let s = if arc.label.is_identity() { UNKNOWN } else { arc.label.upper };
            arc.label = Label::new(s, EPSILON);
        }
    }
    for state in b.states.iter_mut() {
        for arc in state.arcs.iter_mut() {
            let s = if arc.label.is_identity() { UNKNOWN } else { arc.label.lower };
            arc.label = Label::new(EPSILON, s);
        }
    }
    concat(a, b)
}

pub fn invert(mut a: Net) -> Net {
    for state in a.states.iter_mut() {
        for arc in state.arcs.iter_mut() {
            arc.label = arc.label.inverted();
        }
    }
    a.minimized = false;
    a
}

fn project(mut a: Net, upper_side: bool) -> Net {
    for state in a.states.iter_mut() {
        for arc in state.arcs.iter_mut() {
            let label = arc.label;
            let s = if label.is_identity() {
                IDENTITY
            } else if upper_side {
                label.upper
            } else {
                label.lower
            };
            arc.label = match s {
                UNKNOWN => Label::same(IDENTITY),
                s => Label::same(s),
            };
        }
    }
    a.minimized = false;
    a
}

/// The acceptor of the upper (input) side.
pub fn upper(a: Net) -> Net {
    project(a, true)
}

/// The acceptor of the lower (output) side.
pub fn lower(a: Net) -> Net {
    project(a, false)
}

/// Product construction over the deterministic versions of `a` and `b`.
/// A state of `b` is `None` once `b` has no arc for the label read so far.
fn product<F>(a: Net, b: Net, accept: F, keep_dead: bool) -> Net
where
    F: Fn(bool, Option<bool>) -> bool,
{
    let (a, b) = harmonize(a, b);
    let a = determinize(a);
    let b = determinize(b);
    let mut worklist: Worklist<(StateId, Option<StateId>)> = Worklist::new();
    worklist.index((a.start, Some(b.start)));
    let mut states: Vec<State> = Vec::new();
    while let Some(((p, q), id)) = worklist.pop() {
        let sp = &a.states[p as usize];
        let sq = q.map(|q| &b.states[q as usize]);
        let mut arcs = Vec::new();
        for arc in sp.arcs.iter() {
            let next = sq.and_then(|sq| {
                sq.arcs
                    .iter()
                    .find(|x| x.label == arc.label)
                    .map(|x| x.target)
            });
            if next.is_none() && !keep_dead {
                continue;
            }
            arcs.push(Arc {
                label: arc.label,
                target: worklist.index((arc.target, next)),
            });
        }
        let accepting = accept(sp.accepting, sq.map(|s| s.accepting));
        if states.len() <= id as usize {
            states.resize(id as usize + 1, State::default());
        }
        states[id as usize] = State { arcs, accepting };
    }
    Net {
        sigma: a.sigma,
        states,
        start: 0,
        minimized: false,
    }
}

pub fn intersect(a: Net, b: Net) -> Net {
    product(a, b, |x, y| x && y == Some(true), false)
}

/// Strings (or label sequences) of `a` that `b` does not contain.
pub fn minus(a: Net, b: Net) -> Net {
    product(a, b, |x, y| x && y != Some(true), true)
}

/// `?*` over the alphabet of `net`.
pub fn universal(net: &Net) -> Net {
    let mut u = Net::epsilon();
    u.sigma = net.sigma.clone();
    u.add_arc(0, Label::same(IDENTITY), 0);
    let symbols: Vec<_> = u.sigma.symbols().collect();
    for s in symbols {
        u.add_arc(0, Label::same(s), 0);
    }
    u
}

/// Everything in `?*` that `a` does not accept.
pub fn complement(a: Net) -> Net {
    let u = universal(&a);
    minus(u, a)
}

/// `\A`: any single symbol that is not in `a`.
pub fn term_complement(a: Net) -> Net {
    minus(Net::any(), a)
}

/// `$A`: strings that contain a string of `a`.
pub fn contains(a: Net) -> Net {
    let any = star(Net::any());
    concat(concat(any.clone(), a), any)
}

/// `A/B`: strings of `a` with strings of `b` freely interspersed.
pub fn ignore(a: Net, b: Net) -> Net {
    let insert = cross(Net::epsilon(), b);
    let pass = star(union(Net::any(), insert));
    lower(compose(a, pass))
}

/// Composes the output side of `a` with the input side of `b`, pushing the
/// resulting labels into `out`. `@:@` is a linked `?:?`, so composing two
/// unlinked unknowns may produce either.
fn compose_labels(a: Label, b: Label, out: &mut Vec<Label>) {
    let a_ident = a.is_identity();
    let b_ident = b.is_identity();
    let a_mid = if a_ident { UNKNOWN } else { a.lower };
    let b_mid = if b_ident { UNKNOWN } else { b.upper };
    if a_mid != b_mid {
        return;
    }
    let up = if a_ident { UNKNOWN } else { a.upper };
    let down = if b_ident { UNKNOWN } else { b.lower };
    if up == UNKNOWN && down == UNKNOWN {
        match (a_mid == UNKNOWN, a_ident, b_ident) {
            (true, true, true) => out.push(Label::same(IDENTITY)),
            (true, true, false) | (true, false, true) => out.push(Label::new(UNKNOWN, UNKNOWN)),
            _ => {
                out.push(Label::new(UNKNOWN, UNKNOWN));
                out.push(Label::same(IDENTITY));
            }
        }
    } else {
        out.push(Label::new(up, down));
    }
}

/// Relational composition: `a` applied first, then `b`.
///
/// Between two matched moves, the `x:0` moves of `a` come before the `0:y`
/// moves of `b`. The flag in each state records that `b` has started its
/// run, so every interleaving is built once.
pub fn compose(a: Net, b: Net) -> Net {
    let (a, b) = harmonize(a, b);
    let mut worklist: Worklist<(StateId, StateId, bool)> = Worklist::new();
    worklist.index((a.start, b.start, false));
    let mut states: Vec<State> = Vec::new();
    let mut labels = Vec::new();
    while let Some(((p, q, b_moved), id)) = worklist.pop() {
        let sp = &a.states[p as usize];
        let sq = &b.states[q as usize];
        let mut arcs = Vec::new();
        if !b_moved {
            for x in sp.arcs.iter().filter(|x| x.label.lower == EPSILON) {
                arcs.push(Arc {
                    label: Label::new(x.label.upper, EPSILON),
                    target: worklist.index((x.target, q, false)),
                });
            }
        }
        for y in sq.arcs.iter().filter(|y| y.label.upper == EPSILON) {
            arcs.push(Arc {
                label: Label::new(EPSILON, y.label.lower),
                target: worklist.index((p, y.target, true)),
            });
        }
        for x in sp.arcs.iter().filter(|x| x.label.lower != EPSILON) {
            for y in sq.arcs.iter().filter(|y| y.label.upper != EPSILON) {
                labels.clear();
                compose_labels(x.label, y.label, &mut labels);
                if labels.is_empty() {
                    continue;
                }
                let target = worklist.index((x.target, y.target, false));
                for &label in labels.iter() {
                    arcs.push(Arc { label, target });
                }
            }
        }
        let accepting = sp.accepting && sq.accepting;
        if states.len() <= id as usize {
            states.resize(id as usize + 1, State::default());
        }
        states[id as usize] = State { arcs, accepting };
    }
    Net {
        sigma: a.sigma,
        states,
        start: 0,
        minimized: false,
    }
}

/// Spells every arc `a:b` as the two acceptor arcs `a` `b`, with `filler`
/// standing in for epsilon sides.
pub fn flatten(net: Net, filler: &str) -> Net {
    let (net, _) = harmonize(net, Net::symbol(filler));
    let fill = net.sigma.get(filler).unwrap_or(EPSILON);
    let side = |s: Sym| match s {
        EPSILON => Label::same(fill),
        UNKNOWN | IDENTITY => Label::same(IDENTITY),
        s => Label::same(s),
    };
    let mut flat = Net {
        sigma: net.sigma.clone(),
        states: net
            .states
            .iter()
            .map(|s| State {
                arcs: Vec::new(),
                accepting: s.accepting,
            })
            .collect(),
        start: net.start,
        minimized: false,
    };
    for (from, arc) in net.arcs() {
        let mid = flat.add_state(false);
        let (u, l) = if arc.label.is_identity() {
            (IDENTITY, IDENTITY)
        } else {
            (arc.label.upper, arc.label.lower)
        };
        flat.add_arc(from, side(u), mid);
        flat.add_arc(mid, side(l), arc.target);
    }
    flat
}

/// Whether `a` and `b` accept the same label-pair language.
pub fn equivalent(a: Net, b: Net) -> bool {
    let ab = minus(a.clone(), b.clone());
    let ba = minus(b, a);
    ab.is_empty() && ba.is_empty()
}
