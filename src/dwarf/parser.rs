use gimli::{self, RunTimeEndian, EndianSlice, SectionId};
use object::{Object, ObjectSection};
use memmap2::Mmap;
use std::borrow::Cow;
use std::fs::File;
use std::path::Path;
use crate::{Error, Result};
use super::line::{LineRow, LineSequence, LineTable};

pub struct DwarfParser {
    line_table: LineTable,
}

impl DwarfParser {
    pub fn parse(binary_path: &Path) -> Result<Self> {
        Self::parse_with_options(binary_path, None)
    }

    /// Locate and parse the line tables for `binary_path`.
    ///
    /// Tries `symbols_path` first (a separate debug file), then the binary
    /// itself, then a sibling `.dSYM` bundle.
    pub fn parse_with_options(binary_path: &Path, symbols_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = symbols_path {
            match Self::parse_file(path) {
                Ok(parser) => return Ok(parser),
                Err(e) => tracing::warn!("Ignoring symbols file {}: {}", path.display(), e),
            }
        }

        // First try the binary itself
        if let Ok(parser) = Self::parse_file(binary_path) {
            return Ok(parser);
        }

        // On macOS, check for .dSYM bundle
        let dsym_path = binary_path.with_extension("dSYM");
        if dsym_path.exists() {
            // The actual DWARF is in Contents/Resources/DWARF/<binary_name>
            if let Some(binary_name) = binary_path.file_name() {
                let dwarf_file = dsym_path
                    .join("Contents")
                    .join("Resources")
                    .join("DWARF")
                    .join(binary_name);
                if dwarf_file.exists() {
                    return Self::parse_file(&dwarf_file);
                }
            }
        }

        Err(Error::NoDebugSymbols)
    }

    fn parse_file(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };
        let object = object::File::parse(&*mmap)
            .map_err(|e| Error::Symbols(format!("Failed to parse binary: {}", e)))?;

        // Check if debug info exists
        if object.section_by_name(".debug_info").is_none()
            && object.section_by_name("__debug_info").is_none() {
            return Err(Error::NoDebugSymbols);
        }

        let endian = if object.is_little_endian() {
            RunTimeEndian::Little
        } else {
            RunTimeEndian::Big
        };

        let load_section = |id: SectionId| -> std::result::Result<Cow<[u8]>, gimli::Error> {
            let name = id.name();
            // Try both ELF and Mach-O section names
            let data = object
                .section_by_name(name)
                .or_else(|| {
                    // Mach-O uses __debug_* instead of .debug_*
                    let macho_name = name.replace(".debug_", "__debug_");
                    object.section_by_name(&macho_name)
                })
                .and_then(|section| section.uncompressed_data().ok())
                .unwrap_or(Cow::Borrowed(&[][..]));
            Ok(data)
        };

        let dwarf_cow = gimli::Dwarf::load(&load_section)
            .map_err(|e| Error::Symbols(format!("Failed to load DWARF: {}", e)))?;

        let dwarf = dwarf_cow.borrow(|section| {
            EndianSlice::new(section.as_ref(), endian)
        });

        let line_table = Self::collect_line_table(&dwarf);
        if line_table.is_empty() {
            return Err(Error::NoDebugSymbols);
        }

        tracing::debug!(
            "Parsed {} line sequences from {}",
            line_table.sequence_count(),
            path.display()
        );

        Ok(Self { line_table })
    }

    fn collect_line_table<R: gimli::Reader>(dwarf: &gimli::Dwarf<R>) -> LineTable {
        let mut table = LineTable::default();

        // Iterate through compilation units
        let mut units = dwarf.units();
        while let Ok(Some(header)) = units.next() {
            let unit = match dwarf.unit(header) {
                Ok(unit) => unit,
                Err(e) => {
                    tracing::debug!("Skipping unparsable unit: {}", e);
                    continue;
                }
            };

            let Some(program) = unit.line_program.clone() else { continue };
            let mut rows = program.rows();
            let mut current: Vec<LineRow> = Vec::new();

            loop {
                let (header, row) = match rows.next_row() {
                    Ok(Some(next)) => next,
                    Ok(None) => break,
                    Err(e) => {
                        tracing::debug!("Line program error: {}", e);
                        break;
                    }
                };

                if row.end_sequence() {
                    if let Some(first) = current.first() {
                        let start = first.address;
                        table.push_sequence(LineSequence {
                            start,
                            end: row.address(),
                            rows: std::mem::take(&mut current),
                        });
                    }
                    continue;
                }

                let file = row
                    .file(header)
                    .and_then(|entry| Self::file_path(dwarf, &unit, header, entry))
                    .map(|path| table.intern_file(path));

                current.push(LineRow {
                    address: row.address(),
                    file,
                    line: row.line().map_or(0, |l| l.get() as u32),
                });
            }
        }

        table.finish();
        table
    }

    fn file_path<R: gimli::Reader>(
        dwarf: &gimli::Dwarf<R>,
        unit: &gimli::Unit<R>,
        header: &gimli::LineProgramHeader<R>,
        entry: &gimli::FileEntry<R>,
    ) -> Option<String> {
        let mut path = Self::attr_to_string(dwarf, unit, entry.path_name())?;

        if !is_absolute(&path) {
            if let Some(dir) = entry
                .directory(header)
                .and_then(|d| Self::attr_to_string(dwarf, unit, d))
            {
                path = join_path(&dir, &path);
            }
        }

        if !is_absolute(&path) {
            if let Some(comp_dir) = unit.comp_dir.as_ref().and_then(|d| d.to_string_lossy().ok()) {
                path = join_path(&comp_dir, &path);
            }
        }

        Some(path)
    }

    fn attr_to_string<R: gimli::Reader>(
        dwarf: &gimli::Dwarf<R>,
        unit: &gimli::Unit<R>,
        value: gimli::AttributeValue<R>,
    ) -> Option<String> {
        let s = dwarf.attr_string(unit, value).ok()?;
        let cow = s.to_string_lossy().ok()?;
        Some(cow.into_owned())
    }

    /// File and line of the code at `address` (unrelocated).
    pub fn resolve_address(&self, address: u64) -> Option<(String, u32)> {
        self.line_table
            .lookup(address)
            .map(|(file, line)| (file.to_string(), line))
    }
}

fn is_absolute(path: &str) -> bool {
    let bytes = path.as_bytes();
    path.starts_with('/')
        || path.starts_with('\\')
        || (bytes.len() > 2 && bytes[1] == b':' && (bytes[2] == b'\\' || bytes[2] == b'/'))
}

fn join_path(dir: &str, file: &str) -> String {
    if dir.is_empty() {
        return file.to_string();
    }
    let separator = if dir.contains('\\') && !dir.contains('/') { '\\' } else { '/' };
    if dir.ends_with(separator) {
        format!("{}{}", dir, file)
    } else {
        format!("{}{}{}", dir, separator, file)
    }
}

#[cfg(test)]
mod path_tests {
    use super::*;

    #[test]
    fn test_absolute_paths() {
        assert!(is_absolute("/src/suite.cpp"));
        assert!(is_absolute("d:\\dev\\suite.cpp"));
        assert!(is_absolute("C:/dev/suite.cpp"));
        assert!(!is_absolute("src/suite.cpp"));
        assert!(!is_absolute("suite.cpp"));
    }

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("/home/user", "suite.cpp"), "/home/user/suite.cpp");
        assert_eq!(join_path("/home/user/", "suite.cpp"), "/home/user/suite.cpp");
        assert_eq!(join_path("d:\\dev", "suite.cpp"), "d:\\dev\\suite.cpp");
        assert_eq!(join_path("", "suite.cpp"), "suite.cpp");
    }
}
