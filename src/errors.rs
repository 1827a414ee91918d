use std::{fmt, io};

use crate::automata::program::InstPtr;

pub type Result<T> = std::result::Result<T, Error>;

/// The kind of numbered site an instruction operand refers to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SiteKind {
    Save,
    Loop,
    Memo,
}

impl fmt::Display for SiteKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            SiteKind::Save => f.write_str("save slot"),
            SiteKind::Loop => f.write_str("loop"),
            SiteKind::Memo => f.write_str("memo site"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("line {line}: unknown instruction `{mnemonic}`")]
    UnknownInstruction { line: usize, mnemonic: String },

    #[error("line {line}: `{mnemonic}` takes {expected} operand(s), found {found}")]
    Arity {
        line: usize,
        mnemonic: String,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: invalid operand `{operand}` for `{mnemonic}`")]
    InvalidOperand {
        line: usize,
        mnemonic: String,
        operand: String,
    },

    #[error("line {line}: unterminated quoted operand")]
    UnterminatedQuote { line: usize },

    #[error("program has no instructions")]
    EmptyProgram,

    #[error("instruction {ip}: target {target} is outside the program (length {len})")]
    TargetOutOfRange {
        ip: InstPtr,
        target: InstPtr,
        len: usize,
    },

    #[error("instruction {ip}: {kind} {id} is out of range ({count} declared)")]
    SiteOutOfRange {
        ip: InstPtr,
        kind: SiteKind,
        id: usize,
        count: usize,
    },

    #[error("instruction {ip}: execution falls off the end of the program")]
    FallsOffEnd { ip: InstPtr },

    #[error("step limit of {0} exceeded")]
    StepLimitExceeded(usize),

    #[error("backtrack stack exceeded {0} threads")]
    StackOverflow(usize),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    /// True when the error means the program itself is malformed, as opposed
    /// to a run that was cut short by a configured limit.
    pub fn is_invalid_program(&self) -> bool {
        !matches!(
            self,
            Error::StepLimitExceeded(_) | Error::StackOverflow(_) | Error::Io(_)
        )
    }
}
