use std::path::Path;

use crate::automata::assembler::{assemble, assemble_file};
use crate::automata::program::Program;
use crate::errors::Error;
use crate::executor::{self, Match};

/// An assembled, validated program ready to match against many inputs.
pub struct Regex(Program);

impl Regex {
    pub fn new(asm: &str) -> Result<Regex, Error> {
        let records = assemble(asm)?;
        Ok(Regex(Program::from_records(&records)?))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Regex, Error> {
        let records = assemble_file(path)?;
        Ok(Regex(Program::from_records(&records)?))
    }

    pub fn program(&self) -> &Program {
        &self.0
    }

    /// The prefix of `s` matched by the program, if any.
    pub fn find<'t>(&self, s: &'t str) -> Option<&'t str> {
        executor::run(&self.0, s)
    }

    pub fn captures<'t>(&self, s: &'t str) -> Option<Match<'t>> {
        executor::find(&self.0, s)
    }

    pub fn is_match(&self, s: &str) -> bool {
        self.find(s).is_some()
    }
}

impl From<Program> for Regex {
    fn from(program: Program) -> Self {
        Regex(program)
    }
}

#[cfg(test)]
mod tests {
    use super::Regex;
    use crate::errors::Error;
    use pretty_assertions::assert_eq;

    #[test]
    fn find() {
        let re = Regex::new("split 1, 3\nchar a\njmp 0\nmatch").unwrap();
        assert_eq!(re.find("aaab"), Some("aaa"));
        assert_eq!(re.find(""), Some(""));
        assert!(re.is_match("b"));
    }

    #[test]
    fn captures() {
        let re = Regex::new("char x\nsave 0\nchar y\nsave 1\nmatch").unwrap();
        let m = re.captures("xyz").unwrap();
        assert_eq!(m.as_str(), "xy");
        assert_eq!(m.group(0), Some("y"));
        assert!(re.captures("xz").is_none());
    }

    #[test]
    fn invalid_programs() {
        assert!(matches!(
            Regex::new("char a\nfork 0\nmatch"),
            Err(Error::UnknownInstruction { line: 2, .. })
        ));
        assert!(matches!(
            Regex::new("jmp 9\nmatch"),
            Err(Error::TargetOutOfRange { .. })
        ));
        assert!(matches!(Regex::new("\n\n"), Err(Error::EmptyProgram)));
    }

    #[test]
    fn missing_file() {
        let err = Regex::from_file("does/not/exist.rasm").err().unwrap();
        assert!(matches!(err, Error::Io(_)));
    }
}
