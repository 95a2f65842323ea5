use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("MODULE_LOAD_FAILED: Could not load test module '{path}': {reason}")]
    ModuleLoadFailed { path: String, reason: String },

    #[error("NO_DEBUG_SYMBOLS: Module has no DWARF debug info.")]
    NoDebugSymbols,

    #[error("LISTING_TIMEOUT: Test module did not list its content within {0}ms.")]
    ListingTimeout(u64),

    #[error("LISTING_PARSE_FAILED: line {line}: {reason}")]
    ListingParse { line: usize, reason: String },

    #[error("Symbol error: {0}")]
    Symbols(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
