//! Named automata and regex macros, consulted by every compilation.

use std::collections::BTreeMap;

use log::debug;

use crate::compile::Compiler;
use crate::error::{Error, Result};
use crate::fst::Fst;
use crate::net::Net;
use crate::regex::{lex, ParseError, Regex, Token};

/// A regex macro: a token stream with positional parameter placeholders.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Function {
    arity: usize,
    body: Vec<Token>,
}

impl Function {
    pub fn arity(&self) -> usize {
        self.arity
    }

    pub fn body(&self) -> &[Token] {
        &self.body
    }
}

/// The definition table. Callers own it and pass it to each compilation;
/// later definitions of a name replace earlier ones.
#[derive(Clone, Debug, Default)]
pub struct Definitions {
    networks: BTreeMap<String, Net>,
    functions: BTreeMap<String, Function>,
}

/// Something that can be bound to a name: an automaton or a regex.
pub trait Definable {
    fn into_net(self, defs: &Definitions) -> Result<Net>;
}

impl<'a> Definable for &'a Fst {
    fn into_net(self, _: &Definitions) -> Result<Net> {
        self.net().cloned()
    }
}

impl Definable for Fst {
    fn into_net(self, _: &Definitions) -> Result<Net> {
        self.into_inner()
    }
}

impl<'a> Definable for &'a str {
    fn into_net(self, defs: &Definitions) -> Result<Net> {
        Fst::compile(self, defs)?.into_inner()
    }
}

impl Definitions {
    pub fn new() -> Definitions {
        Definitions::default()
    }

    /// Binds `name` to an automaton or to the automaton of a regex. A regex
    /// is compiled against the definitions made so far.
    pub fn define<D: Definable>(&mut self, name: &str, definition: D) -> Result<()> {
        let net = definition.into_net(self)?;
        debug!("defined `{}` with {} states", name, net.states.len());
        self.networks.insert(name.to_owned(), net);
        Ok(())
    }

    /// Binds `name(params...)` to `body`. Tokens of the body that equal a
    /// parameter name become placeholders; partial matches inside longer
    /// symbols are left alone.
    pub fn define_function(&mut self, name: &str, params: &[&str], body: &str) -> Result<()> {
        let syntax = |reason: ParseError| Error::Syntax {
            regex: body.to_owned(),
            reason,
        };
        let tokens = lex(body).map_err(syntax)?;
        let tokens: Vec<Token> = tokens
            .into_iter()
            .map(|t| {
                if let Token::Symbol(ref s) = t {
                    if let Some(i) = params.iter().position(|p| *p == s.as_str()) {
                        return Token::Argument(i);
                    }
                }
                t
            })
            .collect();
        Regex::from_tokens(tokens.clone()).map_err(syntax)?;
        debug!("defined function `{}` of {} arguments", name, params.len());
        self.functions.insert(
            name.to_owned(),
            Function {
                arity: params.len(),
                body: tokens,
            },
        );
        Ok(())
    }

    /// Expands the function `name` with automata as arguments.
    pub fn invoke(&self, name: &str, args: &[&Fst]) -> Result<Fst> {
        let syntax = |reason: ParseError| Error::Syntax {
            regex: name.to_owned(),
            reason,
        };
        let function = self
            .function(name)
            .ok_or_else(|| syntax(ParseError::UndefinedFunction(name.to_owned())))?;
        if function.arity != args.len() {
            return Err(syntax(ParseError::WrongArity {
                name: name.to_owned(),
                expected: function.arity,
                found: args.len(),
            }));
        }
        let nets = args.iter().map(|a| a.net().cloned()).collect::<Result<Vec<_>>>()?;
        let body = Regex::from_tokens(function.body.clone()).map_err(syntax)?;
        let net = Compiler::with_args(self, &nets).compile(&body).map_err(syntax)?;
        Ok(Fst::from_net(net))
    }

    pub fn network(&self, name: &str) -> Option<&Net> {
        self.networks.get(name)
    }

    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.networks.contains_key(name) || self.functions.contains_key(name)
    }
}
