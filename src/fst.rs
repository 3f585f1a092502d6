//! The owned automaton handle and its plainly named operations.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::str::FromStr;

use log::debug;

use crate::apply::{Applier, Render};
use crate::compile::Compiler;
use crate::defs::Definitions;
use crate::dfa::minimize;
use crate::error::{Error, Result};
use crate::net::{Net, PathCount, Stats};
use crate::ops;
use crate::regex::{ParseError, Regex};
use crate::sigma::{is_reserved, FILLER};
use crate::trie::Trie;

/// An automaton, or nothing. A value is undefined when it was never built or
/// after [`Fst::destroy`]; every operation on it then fails.
///
/// Operations never change their operands. Their results are minimized,
/// except through [`Fst::unminimized`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Fst {
    net: Option<Net>,
}

impl Fst {
    /// Compiles `regex`, resolving names through `defs`.
    pub fn compile(regex: &str, defs: &Definitions) -> Result<Fst> {
        let syntax = |reason: ParseError| Error::Syntax {
            regex: regex.to_owned(),
            reason,
        };
        let parsed: Regex = regex.parse().map_err(syntax)?;
        let net = Compiler::new(defs).compile(&parsed).map_err(syntax)?;
        debug!("compiled `{}` into {} states", regex, net.states.len());
        Ok(Fst::from_net(net))
    }

    pub fn from_net(net: Net) -> Fst {
        Fst { net: Some(net) }
    }

    /// An acceptor of exactly `words`, one symbol per character.
    pub fn wordlist<I, S>(words: I, minimized: bool) -> Result<Fst>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut trie = Trie::new();
        for w in words {
            let w = w.as_ref();
            let mut buf = [0; 4];
            if w.chars().any(|c| is_reserved(c.encode_utf8(&mut buf))) {
                return Err(Error::ReservedSymbol(w.to_owned()));
            }
            trie.add_word(w);
        }
        debug!("built word list trie with {} states", trie.len());
        let net = trie.finish();
        Ok(Fst::from_net(if minimized { minimize(net) } else { net }))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Fst> {
        let path = path.as_ref();
        let net = Net::read_from(BufReader::new(File::open(path)?))?;
        debug!("loaded {} states from {}", net.states.len(), path.display());
        Ok(Fst::from_net(net))
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let net = self.net()?;
        net.write_to(BufWriter::new(File::create(path)?))?;
        debug!("saved {} states to {}", net.states.len(), path.display());
        Ok(())
    }

    pub fn net(&self) -> Result<&Net> {
        self.net.as_ref().ok_or(Error::UndefinedAutomaton)
    }

    pub fn into_inner(self) -> Result<Net> {
        self.net.ok_or(Error::UndefinedAutomaton)
    }

    pub fn is_defined(&self) -> bool {
        self.net.is_some()
    }

    /// Frees the automaton. Destroying twice is harmless.
    pub fn destroy(&mut self) {
        self.net = None;
    }

    /// The same operations as on `Fst`, without the final minimization.
    pub fn unminimized(&self) -> Unminimized<'_> {
        Unminimized(self)
    }

    fn unary(&self, f: fn(Net) -> Net, minimized: bool) -> Result<Fst> {
        let net = f(self.net()?.clone());
        Ok(Fst::from_net(if minimized { minimize(net) } else { net }))
    }

    fn binary(&self, other: &Fst, f: fn(Net, Net) -> Net, minimized: bool) -> Result<Fst> {
        let net = f(self.net()?.clone(), other.net()?.clone());
        Ok(Fst::from_net(if minimized { minimize(net) } else { net }))
    }

    pub fn union(&self, other: &Fst) -> Result<Fst> {
        self.binary(other, ops::union, true)
    }

    pub fn intersect(&self, other: &Fst) -> Result<Fst> {
        self.binary(other, ops::intersect, true)
    }

    pub fn subtract(&self, other: &Fst) -> Result<Fst> {
        self.binary(other, ops::minus, true)
    }

    pub fn concatenate(&self, other: &Fst) -> Result<Fst> {
        self.binary(other, ops::concat, true)
    }

    /// `self` applied first, then `other`.
    pub fn compose(&self, other: &Fst) -> Result<Fst> {
        self.binary(other, ops::compose, true)
    }

    /// Every identity string over the alphabet that `self` does not accept.
    pub fn complement(&self) -> Result<Fst> {
        self.unary(ops::complement, true)
    }

    pub fn lower(&self) -> Result<Fst> {
        self.unary(ops::lower, true)
    }

    pub fn upper(&self) -> Result<Fst> {
        self.unary(ops::upper, true)
    }

    pub fn invert(&self) -> Result<Fst> {
        self.unary(ops::invert, true)
    }

    pub fn star(&self) -> Result<Fst> {
        self.unary(ops::star, true)
    }

    pub fn plus(&self) -> Result<Fst> {
        self.unary(ops::plus, true)
    }

    pub fn optional(&self) -> Result<Fst> {
        self.unary(ops::optional, true)
    }

    /// Spells each pair `a:b` as the two symbols `a b`, with `□` for an
    /// empty side.
    pub fn flatten(&self) -> Result<Fst> {
        self.unary(|n| ops::flatten(n, FILLER), true)
    }

    fn operands(&self, other: &Fst) -> Result<(Net, Net)> {
        match (&self.net, &other.net) {
            (Some(a), Some(b)) => Ok((a.clone(), b.clone())),
            _ => Err(Error::UndefinedComparison),
        }
    }

    /// Whether both relate exactly the same pairs of strings.
    pub fn equivalent(&self, other: &Fst) -> Result<bool> {
        let (a, b) = self.operands(other)?;
        Ok(ops::equivalent(a, b))
    }

    pub fn is_subset_of(&self, other: &Fst) -> Result<bool> {
        let (a, b) = self.operands(other)?;
        Ok(ops::minus(a, b).is_empty())
    }

    pub fn is_proper_subset_of(&self, other: &Fst) -> Result<bool> {
        Ok(self.is_subset_of(other)? && !self.equivalent(other)?)
    }

    fn cursor(net: Net, render: Render) -> Applier {
        Applier::new(minimize(net), render)
    }

    /// Every path, shortest first, with labels written `a` or `a:b`.
    pub fn words(&self) -> Result<Applier> {
        Ok(Fst::cursor(self.net()?.clone(), Render::Pairs))
    }

    pub fn upper_words(&self) -> Result<Applier> {
        Ok(Fst::cursor(ops::upper(self.net()?.clone()), Render::Symbols))
    }

    pub fn lower_words(&self) -> Result<Applier> {
        Ok(Fst::cursor(ops::lower(self.net()?.clone()), Render::Symbols))
    }

    /// The acceptor of `word`, split into the symbols of `net`.
    fn input(net: &Net, word: &str) -> Result<Net> {
        let tokens = net.sigma.tokenize(word);
        if tokens.iter().any(|t| is_reserved(t)) {
            return Err(Error::ReservedSymbol(word.to_owned()));
        }
        Ok(Net::word(&tokens))
    }

    /// The lower strings paired with the upper string `word`.
    pub fn apply_down(&self, word: &str) -> Result<Applier> {
        let net = self.net()?;
        let applied = ops::lower(ops::compose(Fst::input(net, word)?, net.clone()));
        Ok(Fst::cursor(applied, Render::Symbols))
    }

    /// The upper strings paired with the lower string `word`.
    pub fn apply_up(&self, word: &str) -> Result<Applier> {
        let net = self.net()?;
        let applied = ops::upper(ops::compose(net.clone(), Fst::input(net, word)?));
        Ok(Fst::cursor(applied, Render::Symbols))
    }

    /// Whether `word` is on the upper side of some path.
    pub fn contains(&self, word: &str) -> Result<bool> {
        let net = self.net()?;
        Ok(!ops::compose(Fst::input(net, word)?, net.clone()).is_empty())
    }

    /// Every output of [`Fst::apply_down`].
    pub fn apply(&self, word: &str) -> Result<Vec<String>> {
        Ok(self.apply_down(word)?.collect())
    }

    /// The number of paths. Cyclic automata have no length.
    pub fn len(&self) -> Result<PathCount> {
        match self.net()?.path_count() {
            PathCount::Cyclic => Err(Error::CyclicLength),
            n => Ok(n),
        }
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.net()?.is_empty())
    }

    pub fn stats(&self) -> Result<Stats> {
        Ok(self.net()?.stats())
    }
}

impl FromStr for Fst {
    type Err = Error;

    fn from_str(regex: &str) -> Result<Fst> {
        Fst::compile(regex, &Definitions::new())
    }
}

/// See [`Fst::unminimized`].
#[derive(Copy, Clone, Debug)]
pub struct Unminimized<'a>(&'a Fst);

impl<'a> Unminimized<'a> {
    pub fn union(self, other: &Fst) -> Result<Fst> {
        self.0.binary(other, ops::union, false)
    }

    pub fn intersect(self, other: &Fst) -> Result<Fst> {
        self.0.binary(other, ops::intersect, false)
    }

    pub fn subtract(self, other: &Fst) -> Result<Fst> {
        self.0.binary(other, ops::minus, false)
    }

    pub fn concatenate(self, other: &Fst) -> Result<Fst> {
        self.0.binary(other, ops::concat, false)
    }

    pub fn compose(self, other: &Fst) -> Result<Fst> {
        self.0.binary(other, ops::compose, false)
    }

    pub fn complement(self) -> Result<Fst> {
        self.0.unary(ops::complement, false)
    }

    pub fn lower(self) -> Result<Fst> {
        self.0.unary(ops::lower, false)
    }

    pub fn upper(self) -> Result<Fst> {
        self.0.unary(ops::upper, false)
    }

    pub fn invert(self) -> Result<Fst> {
        self.0.unary(ops::invert, false)
    }

    pub fn star(self) -> Result<Fst> {
        self.0.unary(ops::star, false)
    }

    pub fn plus(self) -> Result<Fst> {
        self.0.unary(ops::plus, false)
    }

    pub fn optional(self) -> Result<Fst> {
        self.0.unary(ops::optional, false)
    }

    pub fn flatten(self) -> Result<Fst> {
        self.0.unary(|n| ops::flatten(n, FILLER), false)
    }
}
