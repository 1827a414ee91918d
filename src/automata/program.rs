use std::fmt;

use tracing::debug;

use crate::automata::assembler::Record;
use crate::errors::{Error, Result, SiteKind};

pub type InstPtr = usize;
pub type SlotId = usize;
pub type LoopId = usize;
pub type MemoId = usize;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Inst {
    /// Mark the loop's entry position and make it the innermost active loop.
    EpsSet(LoopId),
    /// Leave the innermost active loop.
    EpsPop,
    /// Kill the thread when the loop made no progress since `EpsSet`.
    EpsChk(LoopId),
    Memo(MemoId),
    Save(InstSave),
    Jmp(InstPtr),
    Split(InstSplit),
    Match,
    Char(char),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct InstSave {
    pub slot: SlotId,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct InstSplit {
    pub goto1: InstPtr,
    pub goto2: InstPtr,
}

impl Inst {
    /// Decode one loader record into a typed instruction.
    ///
    /// Only the shape of the record is checked here; whether ids and targets
    /// fit the program is decided by [`Program::new`].
    pub fn decode(record: &Record) -> Result<Inst> {
        let inst = match record.mnemonic.as_str() {
            "epsset" => Inst::EpsSet(number(record, 1)?[0]),
            "epspop" => {
                arity(record, 0)?;
                Inst::EpsPop
            }
            "epschk" => Inst::EpsChk(number(record, 1)?[0]),
            "memo" => Inst::Memo(number(record, 1)?[0]),
            "save" => Inst::Save(InstSave {
                slot: number(record, 1)?[0],
            }),
            "jmp" => Inst::Jmp(number(record, 1)?[0]),
            "split" => {
                let gotos = number(record, 2)?;
                Inst::Split(InstSplit {
                    goto1: gotos[0],
                    goto2: gotos[1],
                })
            }
            "match" => {
                arity(record, 0)?;
                Inst::Match
            }
            "char" => {
                arity(record, 1)?;
                let operand = &record.operands[0];
                let mut chars = operand.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Inst::Char(c),
                    _ => return Err(invalid(record, operand)),
                }
            }
            _ => {
                return Err(Error::UnknownInstruction {
                    line: record.line,
                    mnemonic: record.mnemonic.clone(),
                })
            }
        };
        Ok(inst)
    }

    /// Whether execution continues at `ip + 1` after this instruction.
    fn falls_through(&self) -> bool {
        !matches!(*self, Inst::Jmp(_) | Inst::Split(_) | Inst::Match)
    }
}

fn arity(record: &Record, expected: usize) -> Result<()> {
    if record.operands.len() != expected {
        return Err(Error::Arity {
            line: record.line,
            mnemonic: record.mnemonic.clone(),
            expected,
            found: record.operands.len(),
        });
    }
    Ok(())
}

fn number(record: &Record, expected: usize) -> Result<Vec<usize>> {
    arity(record, expected)?;
    record
        .operands
        .iter()
        .map(|op| op.parse::<usize>().map_err(|_| invalid(record, op)))
        .collect()
}

fn invalid(record: &Record, operand: &str) -> Error {
    Error::InvalidOperand {
        line: record.line,
        mnemonic: record.mnemonic.clone(),
        operand: operand.to_string(),
    }
}

impl fmt::Display for Inst {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Inst::EpsSet(l) => write!(f, "epsset {}", l),
            Inst::EpsPop => f.write_str("epspop"),
            Inst::EpsChk(l) => write!(f, "epschk {}", l),
            Inst::Memo(m) => write!(f, "memo {}", m),
            Inst::Save(InstSave { slot }) => write!(f, "save {}", slot),
            Inst::Jmp(goto) => write!(f, "jmp {}", goto),
            Inst::Split(InstSplit { goto1, goto2 }) => write!(f, "split {}, {}", goto1, goto2),
            Inst::Match => f.write_str("match"),
            // characters the bare operand syntax would split on need quotes
            Inst::Char(c) if c.is_whitespace() || c == ',' || c == '\'' => {
                write!(f, "char '{}'", c)
            }
            Inst::Char(c) => write!(f, "char {}", c),
        }
    }
}

/// A validated, read-only instruction sequence.
///
/// The number of capture slots, loops and memo sites is the number of `save`,
/// `epsset` and `memo` instructions in the program, and every operand is
/// checked against those counts when the program is built.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Program {
    insts: Vec<Inst>,
    save_slots: usize,
    loops: usize,
    memo_sites: usize,
}

impl Program {
    pub fn new(insts: Vec<Inst>) -> Result<Program> {
        if insts.is_empty() {
            return Err(Error::EmptyProgram);
        }

        let count = |f: fn(&Inst) -> bool| insts.iter().filter(|i| f(*i)).count();
        let save_slots = count(|i| matches!(i, Inst::Save(_)));
        let loops = count(|i| matches!(i, Inst::EpsSet(_)));
        let memo_sites = count(|i| matches!(i, Inst::Memo(_)));

        let len = insts.len();
        let target = |ip: InstPtr, target: InstPtr| -> Result<()> {
            if target >= len {
                return Err(Error::TargetOutOfRange { ip, target, len });
            }
            Ok(())
        };
        let site = |ip: InstPtr, kind: SiteKind, id: usize, count: usize| -> Result<()> {
            if id >= count {
                return Err(Error::SiteOutOfRange {
                    ip,
                    kind,
                    id,
                    count,
                });
            }
            Ok(())
        };

        for (ip, inst) in insts.iter().enumerate() {
            match *inst {
                Inst::EpsSet(l) | Inst::EpsChk(l) => site(ip, SiteKind::Loop, l, loops)?,
                Inst::Memo(m) => site(ip, SiteKind::Memo, m, memo_sites)?,
                Inst::Save(InstSave { slot }) => site(ip, SiteKind::Save, slot, save_slots)?,
                Inst::Jmp(goto) => target(ip, goto)?,
                Inst::Split(InstSplit { goto1, goto2 }) => {
                    target(ip, goto1)?;
                    target(ip, goto2)?;
                }
                Inst::EpsPop | Inst::Match | Inst::Char(_) => {}
            }
        }
        if insts[len - 1].falls_through() {
            return Err(Error::FallsOffEnd { ip: len - 1 });
        }

        debug!(len, save_slots, loops, memo_sites, "program built");
        Ok(Program {
            insts,
            save_slots,
            loops,
            memo_sites,
        })
    }

    /// Decode and validate the records produced by the assembler.
    pub fn from_records(records: &[Record]) -> Result<Program> {
        let insts = records
            .iter()
            .map(Inst::decode)
            .collect::<Result<Vec<_>>>()?;
        Program::new(insts)
    }

    pub fn insts(&self) -> &[Inst] {
        &self.insts
    }

    pub fn len(&self) -> usize {
        self.insts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.insts.is_empty()
    }

    pub fn save_slots(&self) -> usize {
        self.save_slots
    }

    pub fn loops(&self) -> usize {
        self.loops
    }

    pub fn memo_sites(&self) -> usize {
        self.memo_sites
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for inst in &self.insts {
            writeln!(f, "{}", inst)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Inst, InstSave, InstSplit, Program};
    use crate::automata::assembler::{assemble, Record};
    use crate::errors::{Error, SiteKind};
    use pretty_assertions::assert_eq;

    fn record(mnemonic: &str, operands: &[&str]) -> Record {
        Record {
            line: 1,
            mnemonic: mnemonic.to_string(),
            operands: operands.iter().map(|o| o.to_string()).collect(),
        }
    }

    fn split(goto1: usize, goto2: usize) -> Inst {
        Inst::Split(InstSplit { goto1, goto2 })
    }

    #[test]
    fn decode() {
        assert_eq!(Inst::decode(&record("epsset", &["2"])).unwrap(), Inst::EpsSet(2));
        assert_eq!(Inst::decode(&record("epspop", &[])).unwrap(), Inst::EpsPop);
        assert_eq!(Inst::decode(&record("epschk", &["0"])).unwrap(), Inst::EpsChk(0));
        assert_eq!(Inst::decode(&record("memo", &["3"])).unwrap(), Inst::Memo(3));
        assert_eq!(
            Inst::decode(&record("save", &["1"])).unwrap(),
            Inst::Save(InstSave { slot: 1 })
        );
        assert_eq!(Inst::decode(&record("jmp", &["7"])).unwrap(), Inst::Jmp(7));
        assert_eq!(Inst::decode(&record("split", &["1", "3"])).unwrap(), split(1, 3));
        assert_eq!(Inst::decode(&record("match", &[])).unwrap(), Inst::Match);
        assert_eq!(Inst::decode(&record("char", &["☃"])).unwrap(), Inst::Char('☃'));
    }

    #[test]
    fn decode_errors() {
        assert!(matches!(
            Inst::decode(&record("any", &[])),
            Err(Error::UnknownInstruction { ref mnemonic, .. }) if mnemonic == "any"
        ));
        assert!(matches!(
            Inst::decode(&record("split", &["1"])),
            Err(Error::Arity {
                expected: 2,
                found: 1,
                ..
            })
        ));
        assert!(matches!(
            Inst::decode(&record("match", &["0"])),
            Err(Error::Arity {
                expected: 0,
                found: 1,
                ..
            })
        ));
        assert!(matches!(
            Inst::decode(&record("jmp", &["x"])),
            Err(Error::InvalidOperand { ref operand, .. }) if operand == "x"
        ));
        assert!(matches!(
            Inst::decode(&record("char", &["ab"])),
            Err(Error::InvalidOperand { .. })
        ));
    }

    #[test]
    fn site_counts() {
        let p = Program::from_records(
            &assemble("save 0\nepsset 0\nmemo 0\nsplit 4, 6\nchar a\njmp 1\nepspop\nsave 1\nmatch\n")
                .unwrap(),
        )
        .unwrap();
        assert_eq!(p.len(), 9);
        assert_eq!(p.save_slots(), 2);
        assert_eq!(p.loops(), 1);
        assert_eq!(p.memo_sites(), 1);
    }

    #[test]
    fn validation() {
        assert!(matches!(Program::new(vec![]), Err(Error::EmptyProgram)));
        assert!(matches!(
            Program::new(vec![split(1, 4), Inst::Char('a'), Inst::Match]),
            Err(Error::TargetOutOfRange {
                ip: 0,
                target: 4,
                len: 3
            })
        ));
        assert!(matches!(
            Program::new(vec![Inst::Jmp(3), Inst::Match]),
            Err(Error::TargetOutOfRange { ip: 0, .. })
        ));
        assert!(matches!(
            Program::new(vec![Inst::Save(InstSave { slot: 1 }), Inst::Match]),
            Err(Error::SiteOutOfRange {
                ip: 0,
                kind: SiteKind::Save,
                id: 1,
                count: 1
            })
        ));
        assert!(matches!(
            Program::new(vec![Inst::EpsChk(0), Inst::Match]),
            Err(Error::SiteOutOfRange {
                kind: SiteKind::Loop,
                count: 0,
                ..
            })
        ));
        assert!(matches!(
            Program::new(vec![Inst::Memo(0), Inst::Memo(2), Inst::Match]),
            Err(Error::SiteOutOfRange {
                ip: 1,
                kind: SiteKind::Memo,
                id: 2,
                count: 2
            })
        ));
        assert!(matches!(
            Program::new(vec![Inst::Match, Inst::Char('a')]),
            Err(Error::FallsOffEnd { ip: 1 })
        ));
    }

    #[test]
    fn validation_errors_are_program_errors() {
        let err = Program::new(vec![Inst::Char('a')]).unwrap_err();
        assert!(err.is_invalid_program());
    }

    #[test]
    fn display_reloads() {
        let src = "split 1, 3\nchar a\njmp 5\nchar ' '\nchar ','\nmatch\n";
        let p = Program::from_records(&assemble(src).unwrap()).unwrap();
        assert_eq!(p.to_string(), src);
        let reloaded = Program::from_records(&assemble(&p.to_string()).unwrap()).unwrap();
        assert_eq!(reloaded, p);
    }
}
