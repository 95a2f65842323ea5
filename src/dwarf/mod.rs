mod parser;
mod line;

pub use parser::DwarfParser;
pub use line::{LineRow, LineSequence, LineTable};
