//! Automata over tuples of strings, spelled as flat acceptors.
//!
//! An automaton with `N` tapes reads columns of `N` symbols, one per tape in
//! order. The filler `□` marks a tape that advances by nothing in that
//! column.

use std::fmt;

use log::debug;

use crate::apply::Tokens;
use crate::defs::Definitions;
use crate::dfa::minimize;
use crate::error::{Error, Result};
use crate::fst::Fst;
use crate::net::{Net, Side, Stats};
use crate::ops;
use crate::sigma::{is_reserved, FILLER};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Multitape {
    fst: Fst,
    tapes: usize,
}

fn any() -> Net {
    Net::any()
}

fn fill() -> Net {
    Net::symbol(FILLER)
}

/// `0:?`, inserting any symbol.
fn insert_any() -> Net {
    Net::pair(&Side::Epsilon, &Side::Any)
}

/// `0:□`.
fn insert_fill() -> Net {
    Net::pair(&Side::Epsilon, &Side::Named(FILLER.to_owned()))
}

fn times(net: Net, n: usize) -> Net {
    minimize(ops::power(net, n as u32))
}

/// `k` symbols that are not all filler.
fn not_all_fill(k: usize) -> Net {
    minimize(ops::minus(times(any(), k), times(fill(), k)))
}

/// `k` inserted symbols that are not all filler.
fn insert_not_all_fill(k: usize) -> Net {
    minimize(ops::minus(times(insert_any(), k), times(insert_fill(), k)))
}

impl Multitape {
    /// A two-tape automaton `upper, lower` from a transducer regex.
    pub fn compile(regex: &str, defs: &Definitions) -> Result<Multitape> {
        let fst = Fst::compile(regex, defs)?.flatten()?;
        Ok(Multitape { fst, tapes: 2 })
    }

    /// Reads an already flattened acceptor as an automaton with `tapes`
    /// tapes.
    pub fn from_fst(fst: Fst, tapes: usize) -> Result<Multitape> {
        if tapes == 0 {
            return Err(Error::TapeCount(tapes));
        }
        fst.net()?;
        Ok(Multitape { fst, tapes })
    }

    pub fn tapes(&self) -> usize {
        self.tapes
    }

    pub fn as_fst(&self) -> &Fst {
        &self.fst
    }

    pub fn into_fst(self) -> Fst {
        self.fst
    }

    /// The analyses of `word`: the columns whose last tape spells `word`,
    /// with fillers allowed anywhere on that tape.
    pub fn parse(&self, word: &str) -> Result<Multitape> {
        let grammar = self.fst.net()?;
        let tokens = grammar.sigma.tokenize(word);
        if tokens.iter().any(|t| is_reserved(t)) {
            return Err(Error::ReservedSymbol(word.to_owned()));
        }
        let input = ops::ignore(Net::word(&tokens), fill());
        let column = ops::concat(times(insert_any(), self.tapes - 1), any());
        let placed = ops::lower(ops::compose(input, ops::star(column)));
        let net = minimize(ops::intersect(placed, grammar.clone()));
        debug!("parsed `{}` into {} states", word, net.states.len());
        Ok(Multitape {
            fst: Fst::from_net(net),
            tapes: self.tapes,
        })
    }

    /// Joins the last tape of `self` with the first tape of `other`. The
    /// result has the tapes of `self` followed by the remaining tapes of
    /// `other`.
    pub fn join(&self, other: &Multitape) -> Result<Multitape> {
        let (m, n) = (self.tapes, other.tapes);
        let width = m + n - 1;

        // Columns of A keep n-1 free tapes; inserted columns are filler on
        // all of A's tapes.
        let pad_a = ops::star(ops::union(
            ops::concat(times(insert_fill(), m), insert_not_all_fill(n - 1)),
            ops::concat(times(any(), m), times(insert_any(), n - 1)),
        ));
        let pad_b = ops::star(ops::union(
            ops::concat(insert_not_all_fill(m - 1), times(insert_fill(), n)),
            ops::concat(times(insert_any(), m - 1), times(any(), n)),
        ));
        let extend_a = minimize(ops::lower(ops::compose(self.fst.net()?.clone(), pad_a)));
        let extend_b = minimize(ops::lower(ops::compose(other.fst.net()?.clone(), pad_b)));

        let a_gap = ops::concat(times(fill(), m), times(any(), n - 1));
        let b_gap = ops::concat(times(any(), m - 1), times(fill(), n));
        let split = ops::concat(ops::concat(not_all_fill(m - 1), fill()), not_all_fill(n - 1));
        let bad = ops::union(
            ops::concat(a_gap.clone(), ops::union(b_gap.clone(), split.clone())),
            ops::concat(b_gap, ops::union(a_gap, split)),
        );
        let columns = ops::star(times(any(), width));
        let filter = ops::complement(minimize(ops::concat(
            ops::concat(columns, bad),
            ops::star(any()),
        )));

        let net = minimize(ops::intersect(
            minimize(ops::intersect(extend_a, extend_b)),
            filter,
        ));
        debug!("joined {} and {} tapes into {} states", m, n, net.states.len());
        Ok(Multitape {
            fst: Fst::from_net(net),
            tapes: width,
        })
    }

    /// Every accepted tuple, shortest first.
    pub fn rows(&self) -> Result<Rows> {
        Ok(Rows {
            tokens: self.fst.words()?.tokens(),
            tapes: self.tapes,
        })
    }

    pub fn stats(&self) -> Result<TapeStats> {
        Ok(TapeStats {
            tapes: self.tapes,
            stats: self.fst.stats()?,
        })
    }
}

/// See [`Multitape::rows`].
#[derive(Debug)]
pub struct Rows {
    tokens: Tokens,
    tapes: usize,
}

impl Iterator for Rows {
    type Item = Row;

    fn next(&mut self) -> Option<Row> {
        let symbols = self.tokens.next()?;
        let mut cells = vec![Vec::new(); self.tapes];
        for (i, s) in symbols.into_iter().enumerate() {
            cells[i % self.tapes].push(s);
        }
        Some(Row { cells })
    }
}

/// One accepted tuple: the cells of each tape, fillers included.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Row {
    pub cells: Vec<Vec<String>>,
}

impl Row {
    /// The string on tape `i`, without fillers.
    pub fn tape(&self, i: usize) -> Option<String> {
        self.cells.get(i).map(|cells| {
            cells
                .iter()
                .filter(|c| c.as_str() != FILLER)
                .map(String::as_str)
                .collect()
        })
    }

    pub fn tapes(&self) -> usize {
        self.cells.len()
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let columns = self.cells.first().map_or(0, Vec::len);
        let widths: Vec<usize> = (0..columns)
            .map(|c| {
                self.cells
                    .iter()
                    .filter_map(|tape| tape.get(c))
                    .map(|s| s.chars().count())
                    .max()
                    .unwrap_or(0)
            })
            .collect();
        for (t, tape) in self.cells.iter().enumerate() {
            if t > 0 {
                writeln!(f)?;
            }
            for (c, cell) in tape.iter().enumerate() {
                if c > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{:<1$}", cell, widths.get(c).cloned().unwrap_or(0))?;
            }
        }
        Ok(())
    }
}

/// Size of a multitape automaton.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TapeStats {
    pub tapes: usize,
    pub stats: Stats,
}

impl fmt::Display for TapeStats {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.stats)?;
        write!(f, "Tapes: {}", self.tapes)
    }
}
