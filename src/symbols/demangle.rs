use rustc_demangle::try_demangle as rust_demangle;
use cpp_demangle::{DemangleOptions, Symbol as CppSymbol};

/// Demangle a symbol name from any supported format (Rust, C++, or plain C).
/// Returns the demangled name, or the original if demangling fails.
///
/// C++ names are rendered without parameter lists or return types, so a test
/// body reads `Suite::Case::test_method` rather than `Suite::Case::test_method()`.
pub fn demangle_symbol(mangled: &str) -> String {
    // Rust v0 and legacy symbols; legacy ones end in `E` after the hash, which
    // an Itanium function symbol never does.
    if mangled.starts_with("_R") || (mangled.starts_with("_ZN") && mangled.ends_with('E')) {
        if let Ok(demangled) = rust_demangle(mangled) {
            return format!("{:#}", demangled);
        }
    }

    // Try C++ (Itanium ABI) demangling
    if let Ok(symbol) = CppSymbol::new(mangled) {
        let options = DemangleOptions::new().no_params().no_return_type();
        if let Ok(demangled) = symbol.demangle(&options) {
            return demangled;
        }
    }

    // Return original if no demangling worked (plain C or unknown)
    mangled.to_string()
}
