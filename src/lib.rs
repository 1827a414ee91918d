//! A backtracking regex bytecode VM that memoizes visited states.
//!
//! Programs are written in a small assembly language, one instruction per
//! line, and run against an input from its first character. `memo` and
//! `epschk` instructions let the VM drop threads whose future is already
//! known, so every program runs in time bounded by its memo sites times the
//! input length.
//!
//! ```
//! use memorvm::Regex;
//!
//! let re = Regex::new("split 1, 3\nchar a\njmp 5\nchar a\nchar b\nmatch").unwrap();
//! assert_eq!(re.find("ab"), Some("a"));
//! ```

pub mod automata;
pub mod errors;
pub mod executor;
pub mod regex;


pub use crate::automata::assembler::{assemble, assemble_file, Record};
pub use crate::automata::program::{Inst, Program};
pub use crate::errors::{Error, Result};
pub use crate::executor::{run, Config, Executor, ExecutorType, Match, Outcome, Stats};
pub use crate::regex::Regex;
