use std::ops::ControlFlow;
use std::path::Path;

use super::matcher::{is_strong_match, is_weak_match};
use super::session::SymbolSession;
use crate::Result;

pub const UNKNOWN_LOCATION: &str = "unknown location";

/// Source file and line of a symbol. `file` and `line` are always set together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
}

impl SourceLocation {
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self { file: file.into(), line }
    }

    pub fn unknown() -> Self {
        Self::new(UNKNOWN_LOCATION, 0)
    }

    pub fn is_unknown(&self) -> bool {
        self.file == UNKNOWN_LOCATION
    }
}

impl Default for SourceLocation {
    fn default() -> Self {
        Self::unknown()
    }
}

/// One entry of a module's symbol table, name already demangled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolRecord {
    pub name: String,
    pub address: u64,
}

/// Debug-symbol view of one loaded module.
pub trait SymbolSource {
    /// Address the module's symbols are reported at. Zero means no usable module.
    fn module_base(&self) -> u64;

    /// Lazily enumerate the module's symbols in table order.
    fn symbols(&self) -> Result<Box<dyn Iterator<Item = &SymbolRecord> + '_>>;

    /// Map a symbol address to the source line its code starts at.
    fn address_to_line(&self, address: u64) -> Option<SourceLocation>;
}

/// Everything needed to look up one test case.
#[derive(Debug, Clone, Copy)]
pub struct MatchRequest<'a> {
    pub module_base: u64,
    pub suite_path: &'a [String],
    pub test_name: &'a str,
}

/// Accumulator threaded through one symbol enumeration. Each slot is filled
/// by the first symbol of its tier whose line lookup succeeds.
#[derive(Debug, Default)]
struct MatchResult {
    strong: SourceLocation,
    weak: SourceLocation,
}

impl MatchResult {
    fn step(
        mut self,
        symbol: &SymbolRecord,
        request: &MatchRequest<'_>,
        source: &dyn SymbolSource,
    ) -> ControlFlow<Self, Self> {
        if !symbol.name.is_empty() {
            let slot = if is_strong_match(&symbol.name, request.suite_path, request.test_name) {
                Some(&mut self.strong)
            } else if is_weak_match(&symbol.name, request.test_name) {
                Some(&mut self.weak)
            } else {
                None
            };

            if let Some(slot) = slot.filter(|s| s.is_unknown()) {
                if let Some(location) = source.address_to_line(symbol.address) {
                    *slot = location;
                }
            }
        }

        // Only a strong match ends the scan; a later symbol may still beat a weak one.
        if self.strong.is_unknown() {
            ControlFlow::Continue(self)
        } else {
            ControlFlow::Break(self)
        }
    }

    fn into_location(self) -> SourceLocation {
        if !self.strong.is_unknown() {
            self.strong
        } else {
            self.weak
        }
    }
}

/// Find where the test case named by `request` is defined.
///
/// Returns `SourceLocation::unknown()` when there is no module, when the
/// module's symbols cannot be enumerated, and when nothing matches.
pub fn resolve(source: Option<&dyn SymbolSource>, request: &MatchRequest<'_>) -> SourceLocation {
    let Some(source) = source else {
        return SourceLocation::unknown();
    };
    if request.module_base == 0 {
        return SourceLocation::unknown();
    }

    let mut symbols = match source.symbols() {
        Ok(symbols) => symbols,
        Err(e) => {
            tracing::debug!("Symbol enumeration failed: {}", e);
            return SourceLocation::unknown();
        }
    };

    let result = match symbols.try_fold(MatchResult::default(), |acc, symbol| {
        acc.step(symbol, request, source)
    }) {
        ControlFlow::Continue(result) | ControlFlow::Break(result) => result,
    };

    result.into_location()
}

/// Optional debug capability of a lister: owns the symbol session of the
/// module under inspection for the whole run.
pub struct SourceResolver {
    source: Option<Box<dyn SymbolSource>>,
}

impl SourceResolver {
    /// Load debug symbols for `module`. A module without usable debug info
    /// yields a resolver that reports every location as unknown.
    pub fn open(module: &Path, symbols_file: Option<&Path>) -> Self {
        match SymbolSession::load(module, symbols_file) {
            Ok(session) => {
                tracing::info!(
                    "Debug info loaded for {} at base {:#x}",
                    module.display(),
                    session.module_base()
                );
                Self::from_source(Box::new(session))
            }
            Err(e) => {
                tracing::warn!("Debug info unavailable for {}: {}", module.display(), e);
                Self::unavailable()
            }
        }
    }

    pub fn from_source(source: Box<dyn SymbolSource>) -> Self {
        Self { source: Some(source) }
    }

    pub fn unavailable() -> Self {
        Self { source: None }
    }

    pub fn module_base(&self) -> u64 {
        self.source.as_ref().map_or(0, |s| s.module_base())
    }

    pub fn is_debug_info_available(&self) -> bool {
        self.module_base() > 0
    }

    pub fn resolve(&self, suite_path: &[String], test_name: &str) -> SourceLocation {
        let request = MatchRequest {
            module_base: self.module_base(),
            suite_path,
            test_name,
        };
        resolve(self.source.as_deref(), &request)
    }
}
