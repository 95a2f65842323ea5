use serde::Deserialize;
use std::path::Path;

pub const MIN_LISTING_TIMEOUT_MS: u64 = 1_000;
pub const MAX_LISTING_TIMEOUT_MS: u64 = 600_000;

const SETTINGS_FILE: &str = ".boost-test-lister/settings.json";

/// All configurable settings with their defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct ListerSettings {
    pub pretty_print: bool,
    pub listing_timeout_ms: u64,
    pub listing_arguments: Vec<String>,
}

impl Default for ListerSettings {
    fn default() -> Self {
        Self {
            pretty_print: true,
            listing_timeout_ms: 30_000,
            listing_arguments: vec!["--list_content=DOT".to_string()],
        }
    }
}

/// Raw JSON representation. Every field is optional so files can override a subset.
#[derive(Debug, Deserialize, Default)]
struct SettingsFile {
    #[serde(rename = "output.prettyPrint")]
    pretty_print: Option<bool>,
    #[serde(rename = "listing.timeoutMs")]
    listing_timeout_ms: Option<u64>,
    #[serde(rename = "listing.arguments")]
    listing_arguments: Option<Vec<String>>,
}

/// Resolve settings: defaults → user global → project-local.
pub fn resolve(project_root: Option<&Path>) -> ListerSettings {
    let global_path = dirs::home_dir().map(|h| h.join(SETTINGS_FILE));
    let project_path = project_root.map(|r| r.join(SETTINGS_FILE));
    resolve_with_paths(global_path.as_deref(), project_path.as_deref())
}

/// Testable resolver that accepts explicit file paths (no home dir dependency).
fn resolve_with_paths(global_path: Option<&Path>, project_path: Option<&Path>) -> ListerSettings {
    let mut settings = ListerSettings::default();

    if let Some(path) = global_path {
        apply_file(&mut settings, path);
    }
    if let Some(path) = project_path {
        apply_file(&mut settings, path);
    }

    settings
}

fn apply_file(settings: &mut ListerSettings, path: &Path) {
    let Ok(content) = std::fs::read_to_string(path) else { return };
    let Ok(file) = serde_json::from_str::<SettingsFile>(&content) else {
        tracing::warn!("Invalid settings file, ignoring: {}", path.display());
        return;
    };
    if let Some(v) = file.pretty_print {
        settings.pretty_print = v;
    }
    if let Some(v) = file.listing_timeout_ms {
        if (MIN_LISTING_TIMEOUT_MS..=MAX_LISTING_TIMEOUT_MS).contains(&v) {
            settings.listing_timeout_ms = v;
        } else {
            tracing::warn!(
                "listing.timeoutMs ({}) out of range ({}..{}), using default",
                v, MIN_LISTING_TIMEOUT_MS, MAX_LISTING_TIMEOUT_MS
            );
        }
    }
    if let Some(args) = file.listing_arguments {
        if args.is_empty() {
            tracing::warn!("listing.arguments is empty, using default");
        } else {
            settings.listing_arguments = args;
        }
    }
}
