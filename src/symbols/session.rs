use memmap2::Mmap;
use object::{BinaryFormat, Object, ObjectSegment, ObjectSymbol, SymbolKind};
use std::fs::File;
use std::path::{Path, PathBuf};

use super::demangle_symbol;
use super::resolver::{SourceLocation, SymbolRecord, SymbolSource};
use crate::dwarf::DwarfParser;
use crate::{Error, Result};

/// Base assigned to modules whose image is linked at address zero, so that a
/// successfully loaded module never reports a zero base.
pub const DEFAULT_MODULE_BASE: u64 = 0x1000_0000;

/// Symbols and line tables of one test module, held for the whole run.
/// The module stays mapped until the session is dropped.
pub struct SymbolSession {
    path: PathBuf,
    map: Mmap,
    image_base: u64,
    module_base: u64,
    symbols: Vec<SymbolRecord>,
    dwarf: DwarfParser,
}

impl SymbolSession {
    /// Read the module's symbol table and its DWARF line tables. Fails when
    /// the module cannot be parsed or carries no line information.
    pub fn load(module: &Path, symbols_file: Option<&Path>) -> Result<Self> {
        let file = File::open(module).map_err(|e| Error::ModuleLoadFailed {
            path: module.display().to_string(),
            reason: e.to_string(),
        })?;
        let map = unsafe { Mmap::map(&file)? };
        let dwarf = DwarfParser::parse_with_options(module, symbols_file)?;

        let (image_base, module_base, symbols) = {
            let object = object::File::parse(&*map)
                .map_err(|e| Error::Symbols(format!("Failed to parse binary: {}", e)))?;
            let image_base = Self::extract_image_base(&object);
            let module_base = if image_base == 0 { DEFAULT_MODULE_BASE } else { image_base };
            let symbols = Self::collect_symbols(&object, image_base, module_base);
            (image_base, module_base, symbols)
        };

        tracing::debug!(
            "Loaded {} symbols from {} (image base {:#x})",
            symbols.len(),
            module.display(),
            image_base
        );

        Ok(Self {
            path: module.to_path_buf(),
            map,
            image_base,
            module_base,
            symbols,
            dwarf,
        })
    }

    /// Extract the image base address from a binary's __TEXT segment (Mach-O) or
    /// lowest segment (ELF/PE). This is the expected load address; zero for
    /// position-independent ELF images.
    fn extract_image_base(object: &object::File) -> u64 {
        for segment in object.segments() {
            if let Some(name) = segment.name().ok().flatten() {
                if name == "__TEXT" {
                    return segment.address();
                }
            }
        }

        object
            .segments()
            .map(|segment| segment.address())
            .min()
            .unwrap_or(0)
    }

    fn collect_symbols(object: &object::File, image_base: u64, module_base: u64) -> Vec<SymbolRecord> {
        let strip_underscore = object.format() == BinaryFormat::MachO;

        let mut symbols: Vec<SymbolRecord> = object
            .symbols()
            .filter_map(|s| Self::record(&s, strip_underscore, image_base, module_base))
            .collect();

        if symbols.is_empty() {
            // Stripped static table; exported symbols are still enumerable.
            symbols = object
                .dynamic_symbols()
                .filter_map(|s| Self::record(&s, strip_underscore, image_base, module_base))
                .collect();
        }

        symbols
    }

    fn record<'data, S: ObjectSymbol<'data>>(
        symbol: &S,
        strip_underscore: bool,
        image_base: u64,
        module_base: u64,
    ) -> Option<SymbolRecord> {
        if symbol.is_undefined() || !matches!(symbol.kind(), SymbolKind::Text | SymbolKind::Data) {
            return None;
        }

        let raw = symbol.name().ok()?;
        let raw = if strip_underscore {
            raw.strip_prefix('_').unwrap_or(raw)
        } else {
            raw
        };
        if raw.is_empty() {
            return None;
        }

        Some(SymbolRecord {
            name: demangle_symbol(raw),
            address: module_base.wrapping_add(symbol.address().wrapping_sub(image_base)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    /// Size of the mapped module image.
    pub fn mapped_len(&self) -> usize {
        self.map.len()
    }
}

impl SymbolSource for SymbolSession {
    fn module_base(&self) -> u64 {
        self.module_base
    }

    fn symbols(&self) -> Result<Box<dyn Iterator<Item = &SymbolRecord> + '_>> {
        if self.symbols.is_empty() {
            return Err(Error::Symbols(format!("{} has no symbol table", self.path.display())));
        }
        Ok(Box::new(self.symbols.iter()))
    }

    fn address_to_line(&self, address: u64) -> Option<SourceLocation> {
        let unrelocated = address.checked_sub(self.module_base)?.checked_add(self.image_base)?;
        self.dwarf
            .resolve_address(unrelocated)
            .map(|(file, line)| SourceLocation::new(file, line))
    }
}

impl Drop for SymbolSession {
    fn drop(&mut self) {
        tracing::debug!(
            "Unloading symbols for {} and unmapping {} bytes",
            self.path.display(),
            self.map.len()
        );
    }
}
