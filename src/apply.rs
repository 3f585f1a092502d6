//! Lazy enumeration of the strings an automaton accepts.
//!
//! Strings come out shortest first, so cyclic automata can be enumerated
//! incrementally: each length is one bounded depth-first search, pruned by
//! the distance from every state to the nearest accepting state.

use log::trace;

use crate::net::{Arc, Net, StateId};
use crate::sigma::{Label, EPSILON};

/// How labels are printed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Render {
    /// One tape: the upper symbol of each label.
    Symbols,
    /// Both tapes: `a` for `a:a`, `a:b` otherwise.
    Pairs,
}

#[derive(Copy, Clone, Debug)]
struct Frame {
    state: StateId,
    arc: usize,
}

/// A cursor over the accepted strings of one automaton. Release it by
/// dropping it or with [`Applier::release`]; start over by asking for a new
/// one.
#[derive(Debug)]
pub struct Applier {
    net: Net,
    render: Render,
    distance: Vec<Option<usize>>,
    limit: Option<usize>,
    length: usize,
    stack: Vec<Frame>,
    path: Vec<Label>,
    exhausted: bool,
    produced: usize,
}

impl Applier {
    /// `net` must be deterministic and trimmed, as minimization leaves it.
    pub(crate) fn new(mut net: Net, render: Render) -> Applier {
        {
            let sigma = &net.sigma;
            for state in net.states.iter_mut() {
                state.arcs.sort_by(|x, y| {
                    let key = |a: &Arc| (sigma.name(a.label.upper), sigma.name(a.label.lower));
                    key(x).cmp(&key(y))
                });
            }
        }
        let distance = net.distances();
        let limit = net.longest_path();
        let exhausted = net.is_empty();
        Applier {
            net,
            render,
            distance,
            limit,
            length: 0,
            stack: Vec::new(),
            path: Vec::new(),
            exhausted,
            produced: 0,
        }
    }

    fn next_path(&mut self) -> Option<Vec<Label>> {
        while !self.exhausted {
            if self.stack.is_empty() {
                if self.limit.map_or(false, |l| self.length > l) {
                    self.exhausted = true;
                    break;
                }
                let start = self.net.start;
                if self.length == 0 {
                    self.length = 1;
                    if self.net.states[start as usize].accepting {
                        return Some(Vec::new());
                    }
                    continue;
                }
                self.stack.push(Frame { state: start, arc: 0 });
            }
            let top = self.stack.len() - 1;
            let Frame { state, arc } = self.stack[top];
            let arcs = &self.net.states[state as usize].arcs;
            if arc >= arcs.len() {
                self.stack.pop();
                if self.stack.is_empty() {
                    self.length += 1;
                } else {
                    self.path.pop();
                }
                continue;
            }
            let Arc { label, target } = arcs[arc];
            self.stack[top].arc += 1;
            let remaining = self.length - top - 1;
            match self.distance[target as usize] {
                Some(d) if d <= remaining => {}
                _ => continue,
            }
            if remaining == 0 {
                let mut path = self.path.clone();
                path.push(label);
                return Some(path);
            }
            self.path.push(label);
            self.stack.push(Frame { state: target, arc: 0 });
        }
        None
    }

    /// The next string as a list of symbols.
    pub fn next_tokens(&mut self) -> Option<Vec<String>> {
        let path = self.next_path()?;
        self.produced += 1;
        let net = &self.net;
        Some(
            path.into_iter()
                .filter(|l| !l.is_epsilon())
                .map(|l| match self.render {
                    Render::Symbols if l.upper != EPSILON => net.sigma.name(l.upper).to_owned(),
                    Render::Symbols => net.sigma.name(l.lower).to_owned(),
                    Render::Pairs => net.label_name(l),
                })
                .collect(),
        )
    }

    /// Switches to tokenized output: each item is the list of symbols.
    pub fn tokens(self) -> Tokens {
        Tokens(self)
    }

    /// Whether the sequence of strings is finite.
    pub fn is_finite(&self) -> bool {
        self.limit.is_some() || self.net.is_empty()
    }

    /// Stops the enumeration and frees the cursor.
    pub fn release(self) {}
}

impl Iterator for Applier {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.next_tokens().map(|t| t.concat())
    }
}

impl Drop for Applier {
    fn drop(&mut self) {
        trace!("released cursor after {} strings", self.produced);
    }
}

/// Tokenized enumeration, see [`Applier::tokens`].
#[derive(Debug)]
pub struct Tokens(Applier);

impl Iterator for Tokens {
    type Item = Vec<String>;

    fn next(&mut self) -> Option<Vec<String>> {
        self.0.next_tokens()
    }
}
