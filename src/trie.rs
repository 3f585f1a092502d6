use std::collections::BTreeMap;

use crate::net::{Arc, Net, State, StateId};
use crate::sigma::{Label, Sigma, Sym};

/// Builds a tree-shaped acceptor from a word list, one symbol per character.
/// Words sharing a prefix share the states of that prefix.
#[derive(Debug)]
pub struct Trie {
    sigma: Sigma,
    children: Vec<BTreeMap<Sym, StateId>>,
    accepting: Vec<bool>,
}

impl Trie {
    pub fn new() -> Trie {
        Trie {
            sigma: Sigma::new(),
            children: vec![BTreeMap::new()],
            accepting: vec![false],
        }
    }

    pub fn add_word(&mut self, word: &str) {
        let mut state = 0;
        for c in word.chars() {
            let mut buf = [0; 4];
            let s = self.sigma.intern(c.encode_utf8(&mut buf));
            let next = self.children.len() as StateId;
            state = *self.children[state as usize].entry(s).or_insert(next);
            if state == next {
                self.children.push(BTreeMap::new());
                self.accepting.push(false);
            }
        }
        self.accepting[state as usize] = true;
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accepting.iter().all(|a| !a)
    }

    pub fn finish(self) -> Net {
        let states = self
            .children
            .into_iter()
            .zip(self.accepting)
            .map(|(children, accepting)| State {
                arcs: children
                    .into_iter()
                    .map(|(s, target)| Arc {
                        label: Label::same(s),
                        target,
                    })
                    .collect(),
                accepting,
            })
            .collect();
        Net {
            sigma: self.sigma,
            states,
            start: 0,
            minimized: false,
        }
    }
}
