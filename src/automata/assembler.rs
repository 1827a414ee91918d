use std::{fs, path::Path};

use crate::errors::{Error, Result};

/// One tokenized line of assembly: a mnemonic and its raw operands.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Record {
    /// 1-based source line, kept for error messages.
    pub line: usize,
    pub mnemonic: String,
    pub operands: Vec<String>,
}

/// Split assembly text into records, one per non-blank line.
///
/// Operands are separated by commas and/or whitespace. A character operand
/// can be quoted (`char ' '`, `char ','`) when the bare form would be split
/// apart. No semantic checks happen here, see [`Program::from_records`].
///
/// [`Program::from_records`]: crate::automata::program::Program::from_records
pub fn assemble(src: &str) -> Result<Vec<Record>> {
    let mut records = vec![];
    for (i, text) in src.lines().enumerate() {
        let line = i + 1;
        let mut tokens = tokenize(text, line)?.into_iter();
        let mnemonic = match tokens.next() {
            Some(m) => m,
            None => continue,
        };
        records.push(Record {
            line,
            mnemonic,
            operands: tokens.collect(),
        });
    }
    Ok(records)
}

pub fn assemble_file<P: AsRef<Path>>(path: P) -> Result<Vec<Record>> {
    let src = fs::read_to_string(path)?;
    assemble(&src)
}

fn tokenize(text: &str, line: usize) -> Result<Vec<String>> {
    let mut tokens = vec![];
    let mut chars = text.chars().peekable();
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() || c == ',' {
            chars.next();
            continue;
        }
        if c == '\'' {
            chars.next();
            match (chars.next(), chars.next()) {
                (Some(quoted), Some('\'')) => tokens.push(quoted.to_string()),
                _ => return Err(Error::UnterminatedQuote { line }),
            }
            continue;
        }
        let mut token = String::new();
        while let Some(&c) = chars.peek() {
            if c.is_whitespace() || c == ',' {
                break;
            }
            token.push(c);
            chars.next();
        }
        tokens.push(token);
    }
    Ok(tokens)
}
