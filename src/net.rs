//! The automaton data structure shared by every operation.

use std::collections::VecDeque;
use std::fmt;
use std::io::{self, Read, Write};

use bit_set::BitSet;
use serde::{Deserialize, Serialize};

use crate::sigma::{Label, Sigma, Sym, EPSILON, IDENTITY, UNKNOWN};

pub type StateId = u32;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arc {
    pub label: Label,
    pub target: StateId,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    pub arcs: Vec<Arc>,
    pub accepting: bool,
}

/// A finite-state transducer over label pairs. Acceptors are transducers
/// whose labels all relate a symbol to itself.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Net {
    pub sigma: Sigma,
    pub states: Vec<State>,
    pub start: StateId,
    /// Set by minimization, cleared by every other construction.
    pub minimized: bool,
}

/// One side of a symbol pair, as written `a:b` in a regex.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Side {
    Epsilon,
    Any,
    Named(String),
}

/// The number of paths through an automaton.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PathCount {
    Finite(u64),
    /// There are more paths than fit in a `u64`; the automaton is acyclic.
    Overflow,
    Cyclic,
}

/// Size and shape of an automaton.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Stats {
    pub states: usize,
    pub transitions: usize,
    pub finals: usize,
    pub arity: u8,
    pub deterministic: bool,
    pub minimized: bool,
    pub complete: bool,
    pub paths: PathCount,
    pub sigma: usize,
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "States: {}", self.states)?;
        writeln!(f, "Transitions: {}", self.transitions)?;
        writeln!(f, "Final states: {}", self.finals)?;
        writeln!(f, "Deterministic: {}", self.deterministic as u8)?;
        writeln!(f, "Minimized: {}", self.minimized as u8)?;
        writeln!(f, "Complete: {}", self.complete as u8)?;
        match self.paths {
            PathCount::Finite(n) => writeln!(f, "Paths: {}", n)?,
            PathCount::Overflow => writeln!(f, "Paths: overflow")?,
            PathCount::Cyclic => writeln!(f, "Paths: cyclic")?,
        }
        write!(f, "Arity: {}", self.arity)
    }
}

const MAGIC: &[u8; 4] = b"RFST";
const VERSION: u8 = 1;

impl Net {
    fn with_states(sigma: Sigma, n: usize) -> Net {
        Net {
            sigma,
            states: vec![State::default(); n],
            start: 0,
            minimized: false,
        }
    }

    /// The empty language.
    pub fn null() -> Net {
        Net::with_states(Sigma::new(), 1)
    }

    /// The language containing only the empty string.
    pub fn epsilon() -> Net {
        let mut net = Net::with_states(Sigma::new(), 1);
        net.states[0].accepting = true;
        net
    }

    fn single_step(sigma: Sigma, labels: Vec<Label>) -> Net {
        let mut net = Net::with_states(sigma, 2);
        net.states[1].accepting = true;
        for label in labels {
            net.states[0].arcs.push(Arc { label, target: 1 });
        }
        net
    }

    /// Accepts the one symbol `name`.
    pub fn symbol(name: &str) -> Net {
        let mut sigma = Sigma::new();
        let s = sigma.intern(name);
        Net::single_step(sigma, vec![Label::same(s)])
    }

    /// Accepts any single symbol.
    pub fn any() -> Net {
        Net::single_step(Sigma::new(), vec![Label::same(IDENTITY)])
    }

    /// Accepts the concatenation of `symbols`.
    pub fn word<S: AsRef<str>>(symbols: &[S]) -> Net {
        let mut sigma = Sigma::new();
        let labels: Vec<_> = symbols
            .iter()
            .map(|s| Label::same(sigma.intern(s.as_ref())))
            .collect();
        let mut net = Net::with_states(sigma, labels.len() + 1);
        for (i, label) in labels.into_iter().enumerate() {
            net.states[i].arcs.push(Arc {
                label,
                target: i as StateId + 1,
            });
        }
        let last = net.states.len() - 1;
        net.states[last].accepting = true;
        net
    }

    /// The relation `upper:lower` between two single symbols.
    pub fn pair(upper: &Side, lower: &Side) -> Net {
        let mut sigma = Sigma::new();
        let mut side = |s: &Side| -> Vec<Sym> {
            match *s {
                Side::Epsilon => vec![EPSILON],
                Side::Any => vec![UNKNOWN],
                Side::Named(ref n) => vec![sigma.intern(n)],
            }
        };
        let ups = side(upper);
        let downs = side(lower);
        let expand = |v: Vec<Sym>| -> Vec<Sym> {
            // `?` also stands for every symbol the pair itself names.
            if v == [UNKNOWN] {
                let mut all = vec![UNKNOWN];
                all.extend(sigma.symbols());
                all
            } else {
                v
            }
        };
        let ups = expand(ups);
        let downs = expand(downs);
        if ups == [EPSILON] && downs == [EPSILON] {
            let mut net = Net::epsilon();
            net.sigma = sigma;
            return net;
        }
        let mut labels = Vec::new();
        for &u in ups.iter() {
            for &d in downs.iter() {
                if u == UNKNOWN && d == UNKNOWN {
                    labels.push(Label::new(UNKNOWN, UNKNOWN));
                    labels.push(Label::same(IDENTITY));
                } else {
                    labels.push(Label::new(u, d));
                }
            }
        }
        Net::single_step(sigma, labels)
    }

    pub fn add_state(&mut self, accepting: bool) -> StateId {
        self.states.push(State {
            arcs: Vec::new(),
            accepting,
        });
        self.minimized = false;
        (self.states.len() - 1) as StateId
    }

    pub fn add_arc(&mut self, from: StateId, label: Label, target: StateId) {
        self.states[from as usize].arcs.push(Arc { label, target });
        self.minimized = false;
    }

    pub fn arcs(&self) -> impl Iterator<Item = (StateId, &Arc)> + '_ {
        self.states
            .iter()
            .enumerate()
            .flat_map(|(i, s)| s.arcs.iter().map(move |a| (i as StateId, a)))
    }

    pub fn arc_count(&self) -> usize {
        self.states.iter().map(|s| s.arcs.len()).sum()
    }

    pub fn is_acceptor(&self) -> bool {
        self.arcs().all(|(_, a)| a.label.is_acceptor())
    }

    pub fn is_deterministic(&self) -> bool {
        self.states.iter().all(|s| {
            let mut labels: Vec<_> = s.arcs.iter().map(|a| a.label).collect();
            labels.sort();
            let n = labels.len();
            labels.dedup();
            labels.len() == n && labels.iter().all(|l| !l.is_epsilon())
        })
    }

    /// Whether every state has an arc for every label used anywhere.
    pub fn is_complete(&self) -> bool {
        if !self.is_deterministic() {
            return false;
        }
        let mut all: Vec<_> = self.arcs().map(|(_, a)| a.label).collect();
        all.sort();
        all.dedup();
        self.states.iter().all(|s| s.arcs.len() == all.len())
    }

    /// States reachable from the start.
    pub fn accessible(&self) -> BitSet {
        let mut seen = BitSet::with_capacity(self.states.len());
        let mut stack = vec![self.start];
        seen.insert(self.start as usize);
        while let Some(s) = stack.pop() {
            for arc in self.states[s as usize].arcs.iter() {
                if seen.insert(arc.target as usize) {
                    stack.push(arc.target);
                }
            }
        }
        seen
    }

    fn reverse_adjacency(&self) -> Vec<Vec<StateId>> {
        let mut rev = vec![Vec::new(); self.states.len()];
        for (from, arc) in self.arcs() {
            rev[arc.target as usize].push(from);
        }
        rev
    }

    /// States from which an accepting state is reachable.
    pub fn coaccessible(&self) -> BitSet {
        let rev = self.reverse_adjacency();
        let mut seen = BitSet::with_capacity(self.states.len());
        let mut stack = Vec::new();
        for (i, s) in self.states.iter().enumerate() {
            if s.accepting {
                seen.insert(i);
                stack.push(i as StateId);
            }
        }
        while let Some(s) = stack.pop() {
            for &p in rev[s as usize].iter() {
                if seen.insert(p as usize) {
                    stack.push(p);
                }
            }
        }
        seen
    }

    /// For every state, the fewest arcs to an accepting state.
    pub fn distances(&self) -> Vec<Option<usize>> {
        let rev = self.reverse_adjacency();
        let mut dist = vec![None; self.states.len()];
        let mut queue = VecDeque::new();
        for (i, s) in self.states.iter().enumerate() {
            if s.accepting {
                dist[i] = Some(0);
                queue.push_back(i);
            }
        }
        while let Some(s) = queue.pop_front() {
            let d = dist[s].unwrap_or(0) + 1;
            for &p in rev[s].iter() {
                if dist[p as usize].is_none() {
                    dist[p as usize] = Some(d);
                    queue.push_back(p as usize);
                }
            }
        }
        dist
    }

    /// Removes states that are not on a path from the start to an accepting
    /// state. The start state is always kept.
    pub fn trim(self) -> Net {
        let acc = self.accessible();
        let coacc = self.coaccessible();
        let start = self.start as usize;
        if !coacc.contains(start) {
            let mut null = Net::null();
            null.sigma = self.sigma;
            return null;
        }
        let keep: Vec<bool> = (0..self.states.len())
            .map(|i| acc.contains(i) && coacc.contains(i))
            .collect();
        self.retain_states(&keep)
    }

    fn retain_states(self, keep: &[bool]) -> Net {
        let mut renumber = vec![None; self.states.len()];
        let mut next = 0;
        for (i, &k) in keep.iter().enumerate() {
            if k {
                renumber[i] = Some(next);
                next += 1;
            }
        }
        let start = renumber[self.start as usize].unwrap_or(0);
        let mut states = Vec::with_capacity(next as usize);
        for (i, state) in self.states.into_iter().enumerate() {
            if !keep[i] {
                continue;
            }
            let arcs = state
                .arcs
                .into_iter()
                .filter_map(|a| {
                    renumber[a.target as usize].map(|target| Arc {
                        label: a.label,
                        target,
                    })
                })
                .collect();
            states.push(State {
                arcs,
                accepting: state.accepting,
            });
        }
        Net {
            sigma: self.sigma,
            states,
            start,
            minimized: self.minimized,
        }
    }

    /// Whether the automaton accepts nothing.
    pub fn is_empty(&self) -> bool {
        !self.coaccessible().contains(self.start as usize)
            || !self.accessible().iter().any(|s| self.states[s].accepting)
    }

    /// Counts the paths from the start to an accepting state with a
    /// topological sort of the useful part of the automaton.
    pub fn path_count(&self) -> PathCount {
        let net = self.clone().trim();
        let n = net.states.len();
        let mut indegree = vec![0usize; n];
        for (_, arc) in net.arcs() {
            indegree[arc.target as usize] += 1;
        }
        let mut queue: VecDeque<usize> = (0..n).filter(|&i| indegree[i] == 0).collect();
        let mut paths = vec![Some(0u64); n];
        paths[net.start as usize] = Some(1);
        let mut visited = 0;
        let mut total = Some(0u64);
        while let Some(s) = queue.pop_front() {
            visited += 1;
            let here = paths[s];
            if net.states[s].accepting {
                total = match (total, here) {
                    (Some(t), Some(h)) => t.checked_add(h),
                    _ => None,
                };
            }
            for arc in net.states[s].arcs.iter() {
                let t = arc.target as usize;
                paths[t] = match (paths[t], here) {
                    (Some(a), Some(b)) => a.checked_add(b),
                    _ => None,
                };
                indegree[t] -= 1;
                if indegree[t] == 0 {
                    queue.push_back(t);
                }
            }
        }
        if visited < n {
            return PathCount::Cyclic;
        }
        if net.is_empty() {
            return PathCount::Finite(0);
        }
        match total {
            Some(t) => PathCount::Finite(t),
            None => PathCount::Overflow,
        }
    }

    /// The length of the longest accepted path, or `None` when the useful
    /// part of the automaton has a cycle.
    pub fn longest_path(&self) -> Option<usize> {
        let net = self.clone().trim();
        let n = net.states.len();
        let mut indegree = vec![0usize; n];
        for (_, arc) in net.arcs() {
            indegree[arc.target as usize] += 1;
        }
        let mut queue: VecDeque<usize> = (0..n).filter(|&i| indegree[i] == 0).collect();
        let mut depth: Vec<Option<usize>> = vec![None; n];
        depth[net.start as usize] = Some(0);
        let mut visited = 0;
        let mut longest = 0;
        while let Some(s) = queue.pop_front() {
            visited += 1;
            if let (true, Some(d)) = (net.states[s].accepting, depth[s]) {
                longest = longest.max(d);
            }
            for arc in net.states[s].arcs.iter() {
                let t = arc.target as usize;
                if let Some(d) = depth[s] {
                    depth[t] = Some(depth[t].map_or(d + 1, |e| e.max(d + 1)));
                }
                indegree[t] -= 1;
                if indegree[t] == 0 {
                    queue.push_back(t);
                }
            }
        }
        if visited < n {
            None
        } else {
            Some(longest)
        }
    }

    pub fn stats(&self) -> Stats {
        Stats {
            states: self.states.len(),
            transitions: self.arc_count(),
            finals: self.states.iter().filter(|s| s.accepting).count(),
            arity: if self.is_acceptor() { 1 } else { 2 },
            deterministic: self.is_deterministic(),
            minimized: self.minimized,
            complete: self.is_complete(),
            paths: self.path_count(),
            sigma: self.sigma.len(),
        }
    }

    /// Replaces every symbol id through `map`. Reserved ids map to
    /// themselves.
    pub fn relabel(&mut self, map: &[Sym]) {
        let tr = |s: Sym| map.get(s as usize).cloned().unwrap_or(s);
        for state in self.states.iter_mut() {
            for arc in state.arcs.iter_mut() {
                arc.label = Label::new(tr(arc.label.upper), tr(arc.label.lower));
            }
        }
    }

    /// Adds the arcs that `?` and `@` imply for symbols that just joined the
    /// alphabet.
    pub fn expand_unknowns(&mut self, added: &[Sym]) {
        if added.is_empty() {
            return;
        }
        for state in self.states.iter_mut() {
            let mut extra = Vec::new();
            for arc in state.arcs.iter() {
                let Label { upper, lower } = arc.label;
                let mut push = |label| extra.push(Arc {
                    label,
                    target: arc.target,
                });
                match (upper, lower) {
                    (IDENTITY, _) => {
                        for &x in added {
                            push(Label::same(x));
                        }
                    }
                    (UNKNOWN, UNKNOWN) => {
                        for &x in added {
                            push(Label::new(x, UNKNOWN));
                            push(Label::new(UNKNOWN, x));
                            for &y in added {
                                if x != y {
                                    push(Label::new(x, y));
                                }
                            }
                        }
                    }
                    (UNKNOWN, k) => {
                        for &x in added {
                            push(Label::new(x, k));
                        }
                    }
                    (k, UNKNOWN) => {
                        for &x in added {
                            push(Label::new(k, x));
                        }
                    }
                    _ => {}
                }
            }
            state.arcs.extend(extra);
        }
        self.minimized = false;
    }

    /// Checks the structural invariants a loaded automaton must satisfy.
    pub fn validate(&self) -> bool {
        let n = self.states.len() as StateId;
        self.start < n
            && self.sigma.is_consistent()
            && self.arcs().all(|(_, a)| {
                a.target < n && self.sigma.contains(a.label.upper) && self.sigma.contains(a.label.lower)
            })
    }

    pub fn write_to<W: Write>(&self, mut w: W) -> io::Result<()> {
        w.write_all(MAGIC)?;
        w.write_all(&[VERSION])?;
        bincode::serialize_into(&mut w, self).map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        w.flush()
    }

    pub fn read_from<R: Read>(mut r: R) -> io::Result<Net> {
        let mut header = [0u8; 5];
        r.read_exact(&mut header)?;
        if &header[..4] != MAGIC || header[4] != VERSION {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "not an automaton file"));
        }
        let net: Net = bincode::deserialize_from(r).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        if !net.validate() {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "corrupt automaton"));
        }
        Ok(net)
    }

    /// Renders a label the way words are printed: `a` for `a:a`, `a:b`
    /// otherwise.
    pub fn label_name(&self, label: Label) -> String {
        if label.upper == label.lower || label.is_identity() {
            self.sigma.name(label.upper).to_owned()
        } else {
            format!("{}:{}", self.sigma.name(label.upper), self.sigma.name(label.lower))
        }
    }
}
