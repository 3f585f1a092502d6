use std::iter::Peekable;
use std::{fmt, str, vec};

use self::Regex::*;

/// A regular expression over symbols, in foma-like syntax.
#[derive(PartialEq, Eq, Debug, Clone)]
pub enum Regex {
    /// A bare symbol. If the name is defined it stands for that automaton.
    Symbol(String),
    /// A quoted or escaped symbol, never looked up as a definition.
    Literal(String),
    /// `{abc}`: one symbol per character, in sequence.
    Word(Vec<String>),
    /// `?`: any single symbol.
    Any,
    /// `0` or `[]`: the empty string.
    Empty,
    /// The `n`th parameter of the function being expanded.
    Argument(usize),
    /// `name(a, b, ...)`.
    Call(String, Vec<Regex>),
    /// `a:b`.
    Pair(Box<Regex>, Box<Regex>),
    /// Concatenation.
    Cat(Vec<Regex>),
    /// `|`
    Alt(Vec<Regex>),
    /// `&`
    And(Vec<Regex>),
    /// `-`
    Minus(Box<Regex>, Box<Regex>),
    /// `~`: everything the contained regex does not match.
    Not(Box<Regex>),
    /// `$`: strings containing a match.
    Contains(Box<Regex>),
    /// `\`: single symbols the contained regex does not match.
    TermNot(Box<Regex>),
    /// Kleene closure.
    Kleene(Box<Regex>),
    /// One or more repetitions.
    Plus(Box<Regex>),
    /// `^n`
    Power(Box<Regex>, u32),
    /// `(a)`
    Optional(Box<Regex>),
    /// `.u`
    Upper(Box<Regex>),
    /// `.l`
    Lower(Box<Regex>),
    /// `.i`
    Invert(Box<Regex>),
    /// `a/b`
    Ignore(Box<Regex>, Box<Regex>),
    /// `.o.`
    Compose(Box<Regex>, Box<Regex>),
    /// `.x.`
    Cross(Box<Regex>, Box<Regex>),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Op {
    LBracket,
    RBracket,
    LParen,
    RParen,
    Comma,
    Alt,
    And,
    Minus,
    Not,
    Contains,
    TermNot,
    Star,
    Plus,
    Caret,
    Colon,
    Ignore,
    Compose,
    Cross,
    Upper,
    Lower,
    Invert,
}

impl Op {
    fn text(self) -> &'static str {
        match self {
            Op::LBracket => "[",
            Op::RBracket => "]",
            Op::LParen => "(",
            Op::RParen => ")",
            Op::Comma => ",",
            Op::Alt => "|",
            Op::And => "&",
            Op::Minus => "-",
            Op::Not => "~",
            Op::Contains => "$",
            Op::TermNot => "\\",
            Op::Star => "*",
            Op::Plus => "+",
            Op::Caret => "^",
            Op::Colon => ":",
            Op::Ignore => "/",
            Op::Compose => ".o.",
            Op::Cross => ".x.",
            Op::Upper => ".u",
            Op::Lower => ".l",
            Op::Invert => ".i",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    Symbol(String),
    Literal(String),
    Word(Vec<String>),
    /// `name(`
    Call(String),
    Argument(usize),
    Any,
    Epsilon,
    Op(Op),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Token::Symbol(ref s) => write!(f, "{}", s),
            Token::Literal(ref s) => write!(f, "\"{}\"", s),
            Token::Word(ref w) => write!(f, "{{{}}}", w.concat()),
            Token::Call(ref s) => write!(f, "{}(", s),
            Token::Argument(i) => write!(f, "argument {}", i + 1),
            Token::Any => write!(f, "?"),
            Token::Epsilon => write!(f, "0"),
            Token::Op(op) => write!(f, "{}", op.text()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParseError {
    UnexpectedEof(&'static str),
    UnexpectedToken(&'static str, String),
    BadPower(String),
    ReservedSymbol(String),
    UndefinedFunction(String),
    WrongArity {
        name: String,
        expected: usize,
        found: usize,
    },
    TooDeep,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ParseError::UnexpectedEof(s) => write!(f, "{}", s),
            ParseError::UnexpectedToken(s, ref t) => write!(f, "{}: `{}`", s, t),
            ParseError::BadPower(ref t) => write!(f, "bad exponent: `{}`", t),
            ParseError::ReservedSymbol(ref s) => write!(f, "reserved symbol: `{}`", s.escape_debug()),
            ParseError::UndefinedFunction(ref s) => write!(f, "undefined function: `{}`", s),
            ParseError::WrongArity {
                ref name,
                expected,
                found,
            } => write!(f, "`{}` takes {} arguments, got {}", name, expected, found),
            ParseError::TooDeep => write!(f, "function calls nested too deeply"),
        }
    }
}

type Res<T> = Result<T, ParseError>;

/// The largest exponent accepted by `A^n`.
pub const MAX_POWER: u32 = 10_000;

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn special(c: char) -> bool {
        "[]()|&-~$\\*+^:/,{}\"%?;".contains(c) || c.is_whitespace()
    }

    /// Dot operators. `.l`, `.u` and `.i` only count when no symbol character
    /// follows them.
    fn dot_op(&self) -> Option<(Op, usize)> {
        let rest = self.rest();
        if rest.starts_with(".o.") {
            return Some((Op::Compose, 3));
        }
        if rest.starts_with(".x.") {
            return Some((Op::Cross, 3));
        }
        let mut chars = rest.chars();
        chars.next();
        let op = match chars.next()? {
            'u' | '1' => Op::Upper,
            'l' | '2' => Op::Lower,
            'i' => Op::Invert,
            _ => return None,
        };
        match chars.next() {
            Some(c) if !Lexer::special(c) && c != '.' => None,
            _ => Some((op, 2)),
        }
    }

    fn escape(&mut self) -> Res<char> {
        self.bump().ok_or(ParseError::UnexpectedEof("unfollowed '%'"))
    }

    fn quoted(&mut self) -> Res<String> {
        let mut s = String::new();
        loop {
            match self.bump() {
                Some('"') => return Ok(s),
                Some('\\') => match self.bump() {
                    Some('n') => s.push('\n'),
                    Some('t') => s.push('\t'),
                    Some(c) => s.push(c),
                    None => return Err(ParseError::UnexpectedEof("unfollowed '\\'")),
                },
                Some(c) => s.push(c),
                None => return Err(ParseError::UnexpectedEof("unterminated '\"'")),
            }
        }
    }

    fn braced(&mut self) -> Res<Vec<String>> {
        let mut v = Vec::new();
        loop {
            match self.bump() {
                Some('}') => return Ok(v),
                Some('%') => v.push(self.escape()?.to_string()),
                Some(c) => v.push(c.to_string()),
                None => return Err(ParseError::UnexpectedEof("unmatched '{'")),
            }
        }
    }

    fn symbol(&mut self) -> Res<Token> {
        let mut s = String::new();
        let mut escaped = false;
        while let Some(c) = self.peek() {
            if c == '.' && self.dot_op().is_some() {
                break;
            }
            if c == '%' {
                self.bump();
                s.push(self.escape()?);
                escaped = true;
                continue;
            }
            if Lexer::special(c) {
                break;
            }
            self.bump();
            s.push(c);
        }
        if !escaped && self.peek() == Some('(') {
            self.bump();
            return Ok(Token::Call(s));
        }
        Ok(if escaped {
            Token::Literal(s)
        } else if s == "0" {
            Token::Epsilon
        } else {
            Token::Symbol(s)
        })
    }

    fn next_token(&mut self) -> Res<Option<Token>> {
        while self.peek().map_or(false, char::is_whitespace) {
            self.bump();
        }
        if self.peek() == Some('.') {
            if let Some((op, len)) = self.dot_op() {
                self.pos += len;
                return Ok(Some(Token::Op(op)));
            }
        }
        let op = match self.peek() {
            None | Some(';') => return Ok(None),
            Some('"') => {
                self.bump();
                return self.quoted().map(|s| Some(Token::Literal(s)));
            }
            Some('{') => {
                self.bump();
                return self.braced().map(|w| Some(Token::Word(w)));
            }
            Some('?') => {
                self.bump();
                return Ok(Some(Token::Any));
            }
            Some('}') => return Err(ParseError::UnexpectedToken("unmatched", "}".to_owned())),
            Some('[') => Op::LBracket,
            Some(']') => Op::RBracket,
            Some('(') => Op::LParen,
            Some(')') => Op::RParen,
            Some(',') => Op::Comma,
            Some('|') => Op::Alt,
            Some('&') => Op::And,
            Some('-') => Op::Minus,
            Some('~') => Op::Not,
            Some('$') => Op::Contains,
            Some('\\') => Op::TermNot,
            Some('*') => Op::Star,
            Some('+') => Op::Plus,
            Some('^') => Op::Caret,
            Some(':') => Op::Colon,
            Some('/') => Op::Ignore,
            Some(_) => return self.symbol().map(Some),
        };
        self.bump();
        Ok(Some(Token::Op(op)))
    }
}

/// Splits a regex into tokens.
pub fn lex(src: &str) -> Res<Vec<Token>> {
    let mut lexer = Lexer { src, pos: 0 };
    let mut tokens = Vec::new();
    while let Some(t) = lexer.next_token()? {
        tokens.push(t);
    }
    Ok(tokens)
}

/*
Regex   : Compose
Compose : Bool
        | Compose '.o.' Bool
        | Compose '.x.' Bool
Bool    : Cat
        | Bool '|' Cat
        | Bool '&' Cat
        | Bool '-' Cat
Cat     : Ignore
        | Ignore Cat
Ignore  : Not
        | Ignore '/' Not
Not     : Kleene
        | '~' Not | '$' Not | '\' Not
Kleene  : Pair
        | Kleene '*' | Kleene '+' | Kleene '^' NUM
        | Kleene '.u' | Kleene '.l' | Kleene '.i'
Pair    : Atom
        | Atom ':' Atom
Atom    : SYMBOL | LITERAL | WORD | '?' | '0'
        | '[' ']' | '[' Regex ']' | '(' Regex ')'
        | CALL Regex (',' Regex)* ')'
*/
struct Parser {
    it: Peekable<vec::IntoIter<Token>>,
}

impl Parser {
    fn peek_op(&mut self) -> Option<Op> {
        match self.it.peek() {
            Some(&Token::Op(op)) => Some(op),
            _ => None,
        }
    }

    fn expect(&mut self, want: Op, eof: &'static str) -> Res<()> {
        match self.it.next() {
            Some(Token::Op(op)) if op == want => Ok(()),
            Some(t) => Err(ParseError::UnexpectedToken("unexpected token", t.to_string())),
            None => Err(ParseError::UnexpectedEof(eof)),
        }
    }

    fn atom_first(t: &Token) -> bool {
        match *t {
            Token::Op(op) => matches!(op, Op::LBracket | Op::LParen | Op::Not | Op::Contains | Op::TermNot),
            _ => true,
        }
    }

    fn atom(&mut self) -> Res<Regex> {
        match self.it.next() {
            Some(Token::Symbol(s)) => Ok(Symbol(s)),
            Some(Token::Literal(s)) => Ok(Literal(s)),
            Some(Token::Word(w)) => Ok(Word(w)),
            Some(Token::Any) => Ok(Any),
            Some(Token::Epsilon) => Ok(Empty),
            Some(Token::Argument(i)) => Ok(Argument(i)),
            Some(Token::Op(Op::LBracket)) => {
                if let Some(Op::RBracket) = self.peek_op() {
                    self.it.next();
                    return Ok(Empty);
                }
                let r = self.compose()?;
                self.expect(Op::RBracket, "unmatched '['")?;
                Ok(r)
            }
            Some(Token::Op(Op::LParen)) => {
                let r = self.compose()?;
                self.expect(Op::RParen, "unmatched '('")?;
                Ok(Optional(Box::new(r)))
            }
            Some(Token::Call(name)) => {
                let mut args = vec![self.compose()?];
                loop {
                    match self.it.next() {
                        Some(Token::Op(Op::Comma)) => args.push(self.compose()?),
                        Some(Token::Op(Op::RParen)) => return Ok(Call(name, args)),
                        Some(t) => return Err(ParseError::UnexpectedToken("bad argument list", t.to_string())),
                        None => return Err(ParseError::UnexpectedEof("unterminated call")),
                    }
                }
            }
            Some(t) => Err(ParseError::UnexpectedToken("unexpected token", t.to_string())),
            None => Err(ParseError::UnexpectedEof("unexpected end of regex")),
        }
    }

    fn pair(&mut self) -> Res<Regex> {
        let r = self.atom()?;
        if let Some(Op::Colon) = self.peek_op() {
            self.it.next();
            let l = self.atom()?;
            return Ok(Pair(Box::new(r), Box::new(l)));
        }
        Ok(r)
    }

    fn exponent(&mut self) -> Res<u32> {
        match self.it.next() {
            Some(Token::Epsilon) => Ok(0),
            Some(Token::Symbol(s)) => match s.parse() {
                Ok(n) if n <= MAX_POWER => Ok(n),
                _ => Err(ParseError::BadPower(s)),
            },
            Some(t) => Err(ParseError::BadPower(t.to_string())),
            None => Err(ParseError::UnexpectedEof("missing exponent")),
        }
    }

    fn kleene(&mut self) -> Res<Regex> {
        let mut r = self.pair()?;
        loop {
            let wrap: fn(Box<Regex>) -> Regex = match self.peek_op() {
                Some(Op::Star) => Kleene,
                Some(Op::Plus) => Plus,
                Some(Op::Upper) => Upper,
                Some(Op::Lower) => Lower,
                Some(Op::Invert) => Invert,
                Some(Op::Caret) => {
                    self.it.next();
                    let n = self.exponent()?;
                    r = Power(Box::new(r), n);
                    continue;
                }
                _ => break,
            };
            self.it.next();
            r = wrap(Box::new(r));
        }
        Ok(r)
    }

    fn not(&mut self) -> Res<Regex> {
        let wrap: fn(Box<Regex>) -> Regex = match self.peek_op() {
            Some(Op::Not) => Not,
            Some(Op::Contains) => Contains,
            Some(Op::TermNot) => TermNot,
            _ => return self.kleene(),
        };
        self.it.next();
        Ok(wrap(Box::new(self.not()?)))
    }

    fn ignore(&mut self) -> Res<Regex> {
        let mut r = self.not()?;
        while let Some(Op::Ignore) = self.peek_op() {
            self.it.next();
            r = Ignore(Box::new(r), Box::new(self.not()?));
        }
        Ok(r)
    }

    fn cat(&mut self) -> Res<Regex> {
        let mut r = vec![self.ignore()?];
        while self.it.peek().map_or(false, Parser::atom_first) {
            r.push(self.ignore()?);
        }
        Ok(if r.len() == 1 { r.remove(0) } else { Cat(r) })
    }

    fn boolean(&mut self) -> Res<Regex> {
        let mut r = self.cat()?;
        loop {
            let op = match self.peek_op() {
                Some(op @ Op::Alt) | Some(op @ Op::And) | Some(op @ Op::Minus) => op,
                _ => break,
            };
            self.it.next();
            let rhs = self.cat()?;
            r = match (op, r) {
                (Op::Alt, Alt(mut xs)) => {
                    xs.push(rhs);
                    Alt(xs)
                }
                (Op::Alt, x) => Alt(vec![x, rhs]),
                (Op::And, And(mut xs)) => {
                    xs.push(rhs);
                    And(xs)
                }
                (Op::And, x) => And(vec![x, rhs]),
                (_, x) => Minus(Box::new(x), Box::new(rhs)),
            };
        }
        Ok(r)
    }

    fn compose(&mut self) -> Res<Regex> {
        let mut r = self.boolean()?;
        loop {
            let wrap: fn(Box<Regex>, Box<Regex>) -> Regex = match self.peek_op() {
                Some(Op::Compose) => Compose,
                Some(Op::Cross) => Cross,
                _ => break,
            };
            self.it.next();
            r = wrap(Box::new(r), Box::new(self.boolean()?));
        }
        Ok(r)
    }

    fn parse(tokens: Vec<Token>) -> Res<Regex> {
        let mut parser = Parser {
            it: tokens.into_iter().peekable(),
        };
        if parser.it.peek().is_none() {
            return Err(ParseError::UnexpectedEof("empty regex"));
        }
        let r = parser.compose()?;
        if let Some(t) = parser.it.next() {
            Err(ParseError::UnexpectedToken("bad token in regex", t.to_string()))
        } else {
            Ok(r)
        }
    }
}

impl Regex {
    /// Parses an already tokenized regex, such as a stored function body.
    pub fn from_tokens(tokens: Vec<Token>) -> Result<Regex, ParseError> {
        Parser::parse(tokens)
    }
}

impl str::FromStr for Regex {
    type Err = ParseError;
    /// Parse a string as a regular expression.
    fn from_str(s: &str) -> Result<Regex, ParseError> {
        Parser::parse(lex(s)?)
    }
}
