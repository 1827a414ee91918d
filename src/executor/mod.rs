use tracing::{debug, trace};

use crate::automata::program::{Inst, InstSave, InstSplit, Program};
use crate::errors::{Error, Result};

mod memo;
mod thread;

use memo::MemoTable;
use thread::{Thread, Threads};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ExecutorType {
    /// `memo` and `epschk` prune redundant threads.
    #[default]
    Memoized,
    /// Plain depth-first backtracking: `memo` and `epschk` are no-ops while
    /// the `epsset`/`epspop` bookkeeping still runs. Zero-width loops may not
    /// terminate, so pair it with a step limit.
    Backtracking,
}

/// Limits for a single run. Both are off by default.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Config {
    pub step_limit: Option<usize>,
    pub max_stack: Option<usize>,
}

impl Config {
    pub fn new() -> Config {
        Config::default()
    }

    pub fn step_limit(mut self, limit: usize) -> Config {
        self.step_limit = Some(limit);
        self
    }

    pub fn max_stack(mut self, max: usize) -> Config {
        self.max_stack = Some(max);
        self
    }
}

/// Counters collected during one run.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Stats {
    /// Instructions dispatched.
    pub steps: usize,
    pub forks: usize,
    pub char_failures: usize,
    pub epsilon_kills: usize,
    pub memo_kills: usize,
    pub max_stack_depth: usize,
}

/// A successful run: the matched prefix and the capture slots of the thread
/// that reached `match`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Match<'t> {
    text: &'t str,
    captures: Vec<Option<usize>>,
}

impl<'t> Match<'t> {
    pub fn as_str(&self) -> &'t str {
        self.text
    }

    /// Offset just past the match; always the matched prefix's length.
    pub fn end(&self) -> usize {
        self.text.len()
    }

    pub fn captures(&self) -> &[Option<usize>] {
        &self.captures
    }

    pub fn capture(&self, slot: usize) -> Option<usize> {
        self.captures.get(slot).copied().flatten()
    }

    /// The text between slots `2 * i` and `2 * i + 1`, if both were saved.
    pub fn group(&self, i: usize) -> Option<&'t str> {
        let start = self.capture(2 * i)?;
        let end = self.capture(2 * i + 1)?;
        self.text.get(start..end)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Outcome<'t> {
    pub matched: Option<Match<'t>>,
    pub stats: Stats,
}

pub struct Executor {
    typ: ExecutorType,
    config: Config,
}

impl Executor {
    pub fn new(typ: ExecutorType) -> Executor {
        Executor {
            typ,
            config: Config::default(),
        }
    }

    pub fn with_config(typ: ExecutorType, config: Config) -> Executor {
        Executor { typ, config }
    }

    pub fn exec<'t>(&self, program: &Program, text: &'t str) -> Result<Outcome<'t>> {
        Session::new(program, text, self.typ, self.config).run()
    }

    pub fn find<'t>(&self, program: &Program, text: &'t str) -> Result<Option<Match<'t>>> {
        Ok(self.exec(program, text)?.matched)
    }

    pub fn matches(&self, program: &Program, text: &str) -> Result<bool> {
        Ok(self.find(program, text)?.is_some())
    }
}

/// Run `program` against `text` with the memoized executor and no limits.
///
/// Returns the matched prefix of `text`, or `None` when no thread reaches
/// `match`.
pub fn run<'t>(program: &Program, text: &'t str) -> Option<&'t str> {
    find(program, text).map(|m| m.as_str())
}

/// Like [`run`], keeping the capture slots of the matching thread.
pub fn find<'t>(program: &Program, text: &'t str) -> Option<Match<'t>> {
    match Executor::new(ExecutorType::Memoized).find(program, text) {
        Ok(m) => m,
        Err(err) => unreachable!("an unlimited run cannot fail: {}", err),
    }
}

enum Step {
    Next,
    Jump,
    Kill(&'static str),
    Match,
}

struct Session<'p, 't> {
    program: &'p Program,
    text: &'t str,
    guarded: bool,
    step_limit: Option<usize>,
    memo: MemoTable,
    threads: Threads,
    stats: Stats,
}

impl<'p, 't> Session<'p, 't> {
    fn new(program: &'p Program, text: &'t str, typ: ExecutorType, config: Config) -> Self {
        Session {
            program,
            text,
            guarded: typ == ExecutorType::Memoized,
            step_limit: config.step_limit,
            memo: MemoTable::new(program.memo_sites(), text.len()),
            threads: Threads::new(config.max_stack),
            stats: Stats::default(),
        }
    }

    fn run(mut self) -> Result<Outcome<'t>> {
        debug!(
            insts = self.program.len(),
            text_len = self.text.len(),
            memo_cells = self.memo.capacity(),
            guarded = self.guarded,
            "run started"
        );
        let mut current = Some(Thread::new(self.program));
        loop {
            let next = current.take().or_else(|| self.threads.pop());
            let mut thread = match next {
                Some(thread) => thread,
                None => return Ok(self.finish(None)),
            };

            match self.step(&mut thread)? {
                Step::Next => {
                    thread.ip += 1;
                    current = Some(thread);
                }
                Step::Jump => current = Some(thread),
                Step::Kill(reason) => {
                    trace!(ip = thread.ip, sp = thread.sp, reason, "thread killed");
                }
                Step::Match => {
                    let text = self.text;
                    let m = Match {
                        text: &text[..thread.sp],
                        captures: thread.captures,
                    };
                    return Ok(self.finish(Some(m)));
                }
            }
        }
    }

    fn step(&mut self, thread: &mut Thread) -> Result<Step> {
        self.stats.steps += 1;
        if let Some(limit) = self.step_limit {
            if self.stats.steps > limit {
                return Err(Error::StepLimitExceeded(limit));
            }
        }

        let inst = self.program.insts()[thread.ip];
        trace!(ip = thread.ip, sp = thread.sp, %inst);
        let step = match inst {
            Inst::EpsSet(l) => {
                thread.enter_loop(l);
                Step::Next
            }
            Inst::EpsPop => {
                thread.leave_loop();
                Step::Next
            }
            Inst::EpsChk(l) => {
                if self.guarded && !thread.made_progress(l) {
                    self.stats.epsilon_kills += 1;
                    return Ok(Step::Kill("empty loop iteration"));
                }
                Step::Next
            }
            Inst::Memo(m) => {
                if self.guarded && !self.memo.visit(m, thread.sp, thread.loop_repeat()) {
                    self.stats.memo_kills += 1;
                    return Ok(Step::Kill("memoized state"));
                }
                Step::Next
            }
            Inst::Save(InstSave { slot }) => {
                thread.captures[slot] = Some(thread.sp);
                Step::Next
            }
            Inst::Jmp(goto) => {
                thread.ip = goto;
                Step::Jump
            }
            Inst::Split(InstSplit { goto1, goto2 }) => {
                self.threads.push(thread.fork(goto2))?;
                self.stats.forks += 1;
                thread.ip = goto1;
                Step::Jump
            }
            Inst::Match => Step::Match,
            Inst::Char(c) => {
                if !self.text[thread.sp..].starts_with(c) {
                    self.stats.char_failures += 1;
                    return Ok(Step::Kill("char mismatch"));
                }
                thread.sp += c.len_utf8();
                Step::Next
            }
        };
        Ok(step)
    }

    fn finish(self, matched: Option<Match<'t>>) -> Outcome<'t> {
        let mut stats = self.stats;
        stats.max_stack_depth = self.threads.peak();
        debug!(
            matched = matched.is_some(),
            steps = stats.steps,
            forks = stats.forks,
            memo_kills = stats.memo_kills,
            epsilon_kills = stats.epsilon_kills,
            pending = self.threads.len(),
            "run finished"
        );
        Outcome { matched, stats }
    }
}
