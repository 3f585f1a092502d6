//! Turns a parsed [`Regex`] into an automaton.

use crate::defs::Definitions;
use crate::dfa::minimize;
use crate::net::{Net, Side};
use crate::ops;
use crate::regex::{ParseError, Regex};
use crate::sigma::is_reserved;

/// Function calls may nest at most this deep.
const MAX_DEPTH: usize = 64;

pub struct Compiler<'a> {
    defs: &'a Definitions,
    args: &'a [Net],
    depth: usize,
}

type Res<T> = Result<T, ParseError>;

impl<'a> Compiler<'a> {
    pub fn new(defs: &'a Definitions) -> Compiler<'a> {
        Compiler {
            defs,
            args: &[],
            depth: 0,
        }
    }

    fn symbol(&self, name: &str) -> Res<Net> {
        if is_reserved(name) {
            return Err(ParseError::ReservedSymbol(name.to_owned()));
        }
        Ok(Net::symbol(name))
    }

    /// The single-symbol reading of one side of `a:b`, if it has one.
    fn side(&self, r: &Regex) -> Option<Side> {
        match *r {
            Regex::Symbol(ref s) | Regex::Literal(ref s) if is_reserved(s) => None,
            Regex::Symbol(ref s) if self.defs.network(s).is_none() => Some(Side::Named(s.clone())),
            Regex::Literal(ref s) => Some(Side::Named(s.clone())),
            Regex::Any => Some(Side::Any),
            Regex::Empty => Some(Side::Epsilon),
            _ => None,
        }
    }

    fn fold<F>(&self, xs: &[Regex], f: F) -> Res<Net>
    where
        F: Fn(Net, Net) -> Net,
    {
        let mut it = xs.iter();
        let mut acc = match it.next() {
            Some(x) => self.compile(x)?,
            None => return Ok(Net::epsilon()),
        };
        for x in it {
            acc = minimize(f(acc, self.compile(x)?));
        }
        Ok(acc)
    }

    fn call(&self, name: &str, args: &[Regex]) -> Res<Net> {
        let function = self
            .defs
            .function(name)
            .ok_or_else(|| ParseError::UndefinedFunction(name.to_owned()))?;
        if function.arity() != args.len() {
            return Err(ParseError::WrongArity {
                name: name.to_owned(),
                expected: function.arity(),
                found: args.len(),
            });
        }
        if self.depth >= MAX_DEPTH {
            return Err(ParseError::TooDeep);
        }
        let args = args.iter().map(|a| self.compile(a)).collect::<Res<Vec<_>>>()?;
        let body = Regex::from_tokens(function.body().to_vec())?;
        Compiler {
            defs: self.defs,
            args: &args,
            depth: self.depth + 1,
        }
        .compile(&body)
    }

    pub fn with_args(defs: &'a Definitions, args: &'a [Net]) -> Compiler<'a> {
        Compiler { defs, args, depth: 1 }
    }

    pub fn compile(&self, r: &Regex) -> Res<Net> {
        let unary = |x: &Regex, f: fn(Net) -> Net| -> Res<Net> { Ok(minimize(f(self.compile(x)?))) };
        let binary = |x: &Regex, y: &Regex, f: fn(Net, Net) -> Net| -> Res<Net> {
            Ok(minimize(f(self.compile(x)?, self.compile(y)?)))
        };
        match *r {
            Regex::Symbol(ref s) => match self.defs.network(s) {
                Some(net) => Ok(net.clone()),
                None => self.symbol(s),
            },
            Regex::Literal(ref s) => self.symbol(s),
            Regex::Word(ref w) => {
                if let Some(s) = w.iter().find(|s| is_reserved(s)) {
                    return Err(ParseError::ReservedSymbol(s.clone()));
                }
                Ok(Net::word(w))
            }
            Regex::Any => Ok(Net::any()),
            Regex::Empty => Ok(Net::epsilon()),
            Regex::Argument(i) => self
                .args
                .get(i)
                .cloned()
                .ok_or_else(|| ParseError::UnexpectedToken("argument outside a function", format!("#{}", i + 1))),
            Regex::Call(ref name, ref args) => self.call(name, args),
            Regex::Pair(ref a, ref b) => match (self.side(a), self.side(b)) {
                (Some(u), Some(l)) => Ok(Net::pair(&u, &l)),
                _ => binary(a, b, ops::cross),
            },
            Regex::Cat(ref xs) => self.fold(xs, ops::concat),
            Regex::Alt(ref xs) => self.fold(xs, ops::union),
            Regex::And(ref xs) => self.fold(xs, ops::intersect),
            Regex::Minus(ref a, ref b) => binary(a, b, ops::minus),
            Regex::Not(ref a) => unary(a, ops::complement),
            Regex::Contains(ref a) => unary(a, ops::contains),
            Regex::TermNot(ref a) => unary(a, ops::term_complement),
            Regex::Kleene(ref a) => unary(a, ops::star),
            Regex::Plus(ref a) => unary(a, ops::plus),
            Regex::Optional(ref a) => unary(a, ops::optional),
            Regex::Upper(ref a) => unary(a, ops::upper),
            Regex::Lower(ref a) => unary(a, ops::lower),
            Regex::Invert(ref a) => unary(a, ops::invert),
            Regex::Power(ref a, n) => {
                let base = self.compile(a)?;
                Ok(minimize(ops::power(base, n)))
            }
            Regex::Ignore(ref a, ref b) => binary(a, b, ops::ignore),
            Regex::Compose(ref a, ref b) => binary(a, b, ops::compose),
            Regex::Cross(ref a, ref b) => binary(a, b, ops::cross),
        }
    }
}
