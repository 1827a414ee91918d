use crate::automata::program::{InstPtr, LoopId, Program};
use crate::errors::{Error, Result};

/// One backtracking continuation.
///
/// Cloning a thread copies every capture, loop mark and the loop stack, so a
/// fork parked on the backtrack stack never sees later writes of its parent.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Thread {
    pub ip: InstPtr,
    pub sp: usize,
    pub captures: Vec<Option<usize>>,
    loop_marks: Vec<Option<usize>>,
    // empty means no loop is active
    loop_stack: Vec<LoopId>,
}

impl Thread {
    pub fn new(program: &Program) -> Thread {
        Thread {
            ip: 0,
            sp: 0,
            captures: vec![None; program.save_slots()],
            loop_marks: vec![None; program.loops()],
            loop_stack: vec![],
        }
    }

    pub fn fork(&self, ip: InstPtr) -> Thread {
        Thread { ip, ..self.clone() }
    }

    pub fn innermost_loop(&self) -> Option<LoopId> {
        self.loop_stack.last().copied()
    }

    /// Record the current position for loop `l`, pushing it as the innermost
    /// loop unless it already is.
    pub fn enter_loop(&mut self, l: LoopId) {
        self.loop_marks[l] = Some(self.sp);
        if self.innermost_loop() != Some(l) {
            self.loop_stack.push(l);
        }
    }

    pub fn leave_loop(&mut self) {
        self.loop_stack.pop();
    }

    /// False when the thread is back at the position loop `l` was entered at.
    pub fn made_progress(&self, l: LoopId) -> bool {
        self.loop_marks[l] != Some(self.sp)
    }

    /// Whether the innermost active loop has consumed input since it was
    /// entered. Outer loops are not consulted.
    pub fn loop_repeat(&self) -> bool {
        match self.innermost_loop() {
            Some(l) => self.loop_marks[l].map_or(false, |mark| mark < self.sp),
            None => false,
        }
    }
}

/// The backtrack stack: suspended threads, most recent on top.
pub(crate) struct Threads {
    stack: Vec<Thread>,
    max_stack: Option<usize>,
    peak: usize,
}

impl Threads {
    pub fn new(max_stack: Option<usize>) -> Threads {
        Threads {
            stack: vec![],
            max_stack,
            peak: 0,
        }
    }

    pub fn push(&mut self, thread: Thread) -> Result<()> {
        if let Some(max) = self.max_stack {
            if self.stack.len() >= max {
                return Err(Error::StackOverflow(max));
            }
        }
        self.stack.push(thread);
        self.peak = self.peak.max(self.stack.len());
        Ok(())
    }

    pub fn pop(&mut self) -> Option<Thread> {
        self.stack.pop()
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn peak(&self) -> usize {
        self.peak
    }
}
