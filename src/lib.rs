//! Finite-state transducers: regex compilation, the rational operations,
//! composition and lazy enumeration of the strings they relate.
//!
//! ```
//! use refst::{Definitions, Fst};
//!
//! let mut defs = Definitions::new();
//! defs.define("V", "a | e | i | o | u").unwrap();
//! let plural = Fst::compile("c a t 0:s | V:V", &defs).unwrap();
//! assert_eq!(plural.apply("cat").unwrap(), ["cats"]);
//! ```

pub use crate::apply::{Applier, Tokens};
pub use crate::defs::{Definable, Definitions, Function};
pub use crate::error::{Error, Result};
pub use crate::fst::{Fst, Unminimized};
pub use crate::multitape::{Multitape, Row, Rows, TapeStats};
pub use crate::net::{Net, PathCount, Stats};
pub use crate::regex::{ParseError, Regex};
pub use crate::sigma::{FILLER, SEPARATOR};

pub mod apply;
pub mod compile;
pub mod defs;
pub mod dfa;
pub mod error;
pub mod fst;
pub mod multitape;
pub mod net;
pub mod ops;
pub mod regex;
pub mod sigma;
pub mod trie;

#[cfg(test)]
mod proptests;
#[cfg(test)]
mod tests;
