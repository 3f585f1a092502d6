//! Determinization and minimization. Both treat a transducer as an acceptor
//! over label pairs, with `0:0` as the only epsilon.

use std::collections::{BTreeMap, VecDeque};
use std::hash::Hash;

use bit_set::BitSet;
use log::trace;
use rustc_hash::FxHashMap;

use crate::net::{Arc, Net, State, StateId};
use crate::sigma::Label;

/// Assigns consecutive ids to keys in discovery order, queueing new ones.
pub struct Worklist<K> {
    ids: FxHashMap<K, StateId>,
    queue: VecDeque<(K, StateId)>,
}

impl<K: Hash + Eq + Clone> Worklist<K> {
    pub fn new() -> Worklist<K> {
        Worklist {
            ids: FxHashMap::default(),
            queue: VecDeque::new(),
        }
    }

    pub fn index(&mut self, key: K) -> StateId {
        let next = self.ids.len() as StateId;
        let mut fresh = false;
        let id = *self.ids.entry(key.clone()).or_insert_with(|| {
            fresh = true;
            next
        });
        if fresh {
            self.queue.push_back((key, id));
        }
        id
    }

    pub fn pop(&mut self) -> Option<(K, StateId)> {
        self.queue.pop_front()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }
}

fn closure(net: &Net, set: &mut BitSet) {
    let mut stack: Vec<usize> = set.iter().collect();
    while let Some(s) = stack.pop() {
        for arc in net.states[s].arcs.iter() {
            if arc.label.is_epsilon() && set.insert(arc.target as usize) {
                stack.push(arc.target as usize);
            }
        }
    }
}

/// Subset construction. The result has no `0:0` arcs and at most one arc per
/// label out of every state.
pub fn determinize(net: Net) -> Net {
    if net.is_deterministic() {
        return net;
    }
    let mut start = BitSet::with_capacity(net.states.len());
    start.insert(net.start as usize);
    closure(&net, &mut start);

    let mut worklist = Worklist::new();
    worklist.index(start);
    let mut states: Vec<State> = Vec::new();

    while let Some((set, id)) = worklist.pop() {
        let mut by_label: BTreeMap<Label, BitSet> = BTreeMap::new();
        let mut accepting = false;
        for s in set.iter() {
            let state = &net.states[s];
            accepting |= state.accepting;
            for arc in state.arcs.iter().filter(|a| !a.label.is_epsilon()) {
                by_label
                    .entry(arc.label)
                    .or_insert_with(BitSet::new)
                    .insert(arc.target as usize);
            }
        }
        let mut arcs = Vec::with_capacity(by_label.len());
        for (label, mut targets) in by_label.into_iter() {
            closure(&net, &mut targets);
            let target = worklist.index(targets);
            arcs.push(Arc { label, target });
        }
        if states.len() <= id as usize {
            states.resize(id as usize + 1, State::default());
        }
        states[id as usize] = State { arcs, accepting };
    }
    trace!("determinized {} states into {}", net.states.len(), states.len());
    Net {
        sigma: net.sigma,
        states,
        start: 0,
        minimized: false,
    }
}

/// Produces the minimal deterministic automaton for the same label-pair
/// language, by partition refinement over the trimmed subset construction.
pub fn minimize(net: Net) -> Net {
    if net.minimized {
        return net;
    }
    let net = determinize(net).trim();
    let n = net.states.len();

    let mut class: Vec<usize> = net.states.iter().map(|s| s.accepting as usize).collect();
    // One class per acceptance value that actually occurs.
    let mut classes = [0, 1].iter().filter(|&&c| class.contains(&c)).count();
    loop {
        let mut signatures: BTreeMap<(usize, Vec<(Label, usize)>), usize> = BTreeMap::new();
        let mut next = vec![0; n];
        for (i, state) in net.states.iter().enumerate() {
            let mut sig: Vec<(Label, usize)> = state
                .arcs
                .iter()
                .map(|a| (a.label, class[a.target as usize]))
                .collect();
            sig.sort();
            let fresh = signatures.len();
            next[i] = *signatures.entry((class[i], sig)).or_insert(fresh);
        }
        let refined = signatures.len();
        class = next;
        if refined == classes {
            break;
        }
        classes = refined;
    }

    let mut states = vec![State::default(); classes];
    let mut done = vec![false; classes];
    for (i, state) in net.states.iter().enumerate() {
        let c = class[i];
        if done[c] {
            continue;
        }
        done[c] = true;
        let mut arcs: Vec<Arc> = state
            .arcs
            .iter()
            .map(|a| Arc {
                label: a.label,
                target: class[a.target as usize] as StateId,
            })
            .collect();
        arcs.sort_by_key(|a| a.label);
        states[c] = State {
            arcs,
            accepting: state.accepting,
        };
    }
    trace!("minimized {} states into {}", n, classes);
    let mut min = Net {
        sigma: net.sigma,
        states,
        start: class[net.start as usize] as StateId,
        minimized: true,
    };
    min.start = renumber_from_start(&mut min.states, min.start);
    min
}

/// Renumbers states in breadth-first order from the start, so that equal
/// languages get identical automata. Returns the new start, always `0`.
fn renumber_from_start(states: &mut Vec<State>, start: StateId) -> StateId {
    let mut order = Worklist::new();
    order.index(start);
    let mut seen = Vec::new();
    while let Some((s, _)) = order.pop() {
        seen.push(s);
        for arc in states[s as usize].arcs.iter() {
            order.index(arc.target);
        }
    }
    let mut renumber = vec![0; states.len()];
    for (new, &old) in seen.iter().enumerate() {
        renumber[old as usize] = new as StateId;
    }
    let mut old_states = std::mem::take(states);
    for &old in seen.iter() {
        let mut state = std::mem::take(&mut old_states[old as usize]);
        for arc in state.arcs.iter_mut() {
            arc.target = renumber[arc.target as usize];
        }
        states.push(state);
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops;

    #[test]
    fn determinize_removes_epsilons() {
        let net = ops::union(Net::symbol("a"), Net::symbol("a"));
        assert!(!net.is_deterministic());
        let det = determinize(net);
        assert!(det.is_deterministic());
        assert_eq!(det.path_count(), crate::net::PathCount::Finite(1));
    }

    #[test]
    fn minimize_merges_equivalent_states() {
        let net = ops::union(Net::word(&["a", "b"]), Net::word(&["c", "b"]));
        let min = minimize(net);
        assert_eq!(min.states.len(), 3);
        assert!(min.minimized);
    }

    #[test]
    fn minimize_all_accepting_keeps_lengths() {
        let aa = ops::optional(ops::concat(Net::symbol("a"), ops::optional(Net::symbol("a"))));
        let min = minimize(aa);
        assert_eq!(min.states.len(), 3);
        assert_eq!(min.path_count(), crate::net::PathCount::Finite(3));
        assert_eq!(min.longest_path(), Some(2));
    }

    #[test]
    fn minimize_null() {
        let min = minimize(Net::null());
        assert_eq!(min.states.len(), 1);
        assert!(min.is_empty());
    }
}
