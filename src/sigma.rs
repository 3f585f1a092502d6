//! Symbol alphabets.
//!
//! Every automaton carries its own alphabet. Symbols outside the alphabet are
//! matched by the reserved [`UNKNOWN`] and [`IDENTITY`] symbols, so whenever two
//! automata meet their alphabets have to be merged first, see
//! [`ops::harmonize`](crate::ops::harmonize).

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A symbol id, local to one [`Sigma`].
pub type Sym = u32;

/// The empty string.
pub const EPSILON: Sym = 0;
/// Some symbol outside the alphabet. On a pair `?:?` the two sides differ.
pub const UNKNOWN: Sym = 1;
/// The same symbol outside the alphabet on both sides. Only used as `@:@`.
pub const IDENTITY: Sym = 2;
const FIRST_NAMED: Sym = 3;

/// Characters that never occur inside a symbol.
pub const SEPARATOR: char = '\u{7}';
/// The empty-cell symbol of multitape automata.
pub const FILLER: &str = "□";

/// An arc label: the upper (input) and lower (output) symbol.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Label {
    pub upper: Sym,
    pub lower: Sym,
}

impl Label {
    pub fn new(upper: Sym, lower: Sym) -> Label {
        Label { upper, lower }
    }

    /// A label accepting the single symbol `s` on both tapes.
    pub fn same(s: Sym) -> Label {
        Label { upper: s, lower: s }
    }

    pub fn epsilon() -> Label {
        Label::same(EPSILON)
    }

    pub fn is_epsilon(&self) -> bool {
        self.upper == EPSILON && self.lower == EPSILON
    }

    /// `@:@`, any unknown symbol mapped to itself.
    pub fn is_identity(&self) -> bool {
        self.upper == IDENTITY
    }

    /// Whether the label relates a symbol to itself.
    pub fn is_acceptor(&self) -> bool {
        self.upper == self.lower && self.upper != UNKNOWN
    }

    pub fn inverted(self) -> Label {
        Label { upper: self.lower, lower: self.upper }
    }
}

/// The named symbols of an automaton.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sigma {
    names: Vec<String>,
    index: BTreeMap<String, Sym>,
}

impl Sigma {
    pub fn new() -> Sigma {
        Sigma::default()
    }

    /// Looks up `name`, adding it when it is new.
    pub fn intern(&mut self, name: &str) -> Sym {
        if let Some(&s) = self.index.get(name) {
            return s;
        }
        let s = FIRST_NAMED + self.names.len() as Sym;
        self.names.push(name.to_owned());
        self.index.insert(name.to_owned(), s);
        s
    }

    pub fn get(&self, name: &str) -> Option<Sym> {
        self.index.get(name).cloned()
    }

    /// The printable form of a symbol.
    pub fn name(&self, s: Sym) -> &str {
        match s {
            EPSILON => "0",
            UNKNOWN => "?",
            IDENTITY => "@",
            _ => self.names.get((s - FIRST_NAMED) as usize).map_or("?", |n| &n[..]),
        }
    }

    /// The named symbols, in id order.
    pub fn symbols(&self) -> impl Iterator<Item = Sym> + '_ {
        (0..self.names.len() as Sym).map(|i| i + FIRST_NAMED)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.names.iter().map(|n| &n[..])
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Whether `s` is a valid id in this alphabet.
    pub fn contains(&self, s: Sym) -> bool {
        s < FIRST_NAMED + self.names.len() as Sym
    }

    /// Checks that the name table and its index agree, as after loading a
    /// file.
    pub fn is_consistent(&self) -> bool {
        self.names.len() == self.index.len()
            && self
                .names
                .iter()
                .enumerate()
                .all(|(i, n)| self.index.get(n) == Some(&(FIRST_NAMED + i as Sym)))
    }

    /// Merges `other` into `self`. Returns the translation of `other`'s ids
    /// and the ids of the symbols that were new to `self`.
    pub fn merge(&mut self, other: &Sigma) -> (Vec<Sym>, Vec<Sym>) {
        let mut map: Vec<Sym> = (0..FIRST_NAMED).collect();
        let mut added = Vec::new();
        for name in other.names.iter() {
            let before = self.names.len();
            let s = self.intern(name);
            if self.names.len() != before {
                added.push(s);
            }
            map.push(s);
        }
        (map, added)
    }

    /// Splits `word` into symbols by longest match against the alphabet.
    /// Characters that start no known symbol become single-character symbols.
    pub fn tokenize(&self, word: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut rest = word;
        while let Some(c) = rest.chars().next() {
            let len = self
                .names
                .iter()
                .filter(|n| !n.is_empty() && rest.starts_with(&n[..]))
                .map(|n| n.len())
                .max()
                .unwrap_or_else(|| c.len_utf8());
            out.push(rest[..len].to_owned());
            rest = &rest[len..];
        }
        out
    }
}

impl fmt::Display for Sigma {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{{")?;
        for (i, n) in self.names.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", n)?;
        }
        write!(f, "}}")
    }
}

/// Whether a symbol name is kept out of user alphabets: the empty name,
/// anything containing the separator, and the filler.
pub fn is_reserved(name: &str) -> bool {
    name.is_empty() || name.contains(SEPARATOR) || name == FILLER
}
