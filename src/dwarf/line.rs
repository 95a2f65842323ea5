use std::collections::HashMap;

/// One row of a line-number program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRow {
    pub address: u64,
    /// Index into `LineTable::files`, `None` when the row names no file.
    pub file: Option<usize>,
    pub line: u32,
}

/// A contiguous run of machine code, `start..end`, with its rows in address order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineSequence {
    pub start: u64,
    pub end: u64,
    pub rows: Vec<LineRow>,
}

/// Address → file/line mapping for a whole module.
#[derive(Debug, Default)]
pub struct LineTable {
    files: Vec<String>,
    file_index: HashMap<String, usize>,
    sequences: Vec<LineSequence>,
}

impl LineTable {
    pub fn intern_file(&mut self, path: String) -> usize {
        if let Some(&index) = self.file_index.get(&path) {
            return index;
        }
        let index = self.files.len();
        self.files.push(path.clone());
        self.file_index.insert(path, index);
        index
    }

    pub fn push_sequence(&mut self, sequence: LineSequence) {
        // Code dropped by the linker keeps its rows at address zero.
        if sequence.start == 0 || sequence.end <= sequence.start || sequence.rows.is_empty() {
            return;
        }
        self.sequences.push(sequence);
    }

    /// Sort sequences for lookup; call once after the last `push_sequence`.
    pub fn finish(&mut self) {
        self.sequences.sort_by_key(|s| s.start);
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    pub fn sequence_count(&self) -> usize {
        self.sequences.len()
    }

    /// File and line of the code at `address`. When several rows share the
    /// closest preceding address, the first one wins: at a function's entry
    /// that is the line the function is declared on.
    pub fn lookup(&self, address: u64) -> Option<(&str, u32)> {
        let after = self.sequences.partition_point(|s| s.start <= address);
        let sequence = self.sequences[..after]
            .iter()
            .rev()
            .find(|s| address < s.end)?;

        let upper = sequence.rows.partition_point(|r| r.address <= address);
        let closest = sequence.rows.get(upper.checked_sub(1)?)?.address;
        let first = sequence.rows.partition_point(|r| r.address < closest);
        let row = sequence.rows[first];

        if row.line == 0 {
            return None;
        }
        let file = self.files.get(row.file?)?;
        Some((file.as_str(), row.line))
    }
}
