use crate::automata::program::MemoId;

/// Visited set over `(memo site, position, loop repeat)`, stored flat.
pub(crate) struct MemoTable {
    cells: Vec<bool>,
    positions: usize,
}

impl MemoTable {
    pub fn new(sites: usize, text_len: usize) -> MemoTable {
        let positions = text_len + 1;
        MemoTable {
            cells: vec![false; sites * positions * 2],
            positions,
        }
    }

    fn offset(&self, site: MemoId, sp: usize, repeat: bool) -> usize {
        (site * self.positions + sp) * 2 + repeat as usize
    }

    /// Mark the state as visited. Returns false if it already was.
    pub fn visit(&mut self, site: MemoId, sp: usize, repeat: bool) -> bool {
        let i = self.offset(site, sp, repeat);
        !std::mem::replace(&mut self.cells[i], true)
    }

    pub fn capacity(&self) -> usize {
        self.cells.len()
    }
}
