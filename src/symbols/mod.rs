mod demangle;
pub mod matcher;
pub mod resolver;
pub mod session;

pub use demangle::demangle_symbol;
pub use matcher::{is_strong_match, is_weak_match, TEST_METHOD_SUFFIX};
pub use resolver::{
    resolve, MatchRequest, SourceLocation, SourceResolver, SymbolRecord, SymbolSource,
    UNKNOWN_LOCATION,
};
pub use session::{SymbolSession, DEFAULT_MODULE_BASE};
