pub mod cli;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::config::ListerSettings;
use crate::lister::TreeLister;
use crate::symbols::SourceResolver;
use crate::tree::{traverse_test_tree, ListingSource};
use crate::Result;

pub use cli::Cli;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMode {
    /// Suites and test cases only.
    Plain,
    /// Test cases also carry their source file and line.
    Debug,
}

/// Everything one listing run needs, built once from the command line.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub module: PathBuf,
    pub mode: ListMode,
    /// `None` writes to stdout.
    pub output: Option<PathBuf>,
    pub listing: Option<PathBuf>,
    pub symbols_file: Option<PathBuf>,
    pub settings: ListerSettings,
}

impl RunConfig {
    pub fn listing_source(&self) -> ListingSource {
        match &self.listing {
            Some(path) => ListingSource::File(path.clone()),
            None => ListingSource::Module {
                path: self.module.clone(),
                arguments: self.settings.listing_arguments.clone(),
                timeout_ms: self.settings.listing_timeout_ms,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListOutcome {
    Listed,
    /// The document carries a diagnostic node instead of the test tree.
    Failed,
}

impl ListOutcome {
    pub fn exit_code(self) -> u8 {
        match self {
            ListOutcome::Listed => 0,
            ListOutcome::Failed => 1,
        }
    }
}

fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout())),
    })
}

/// Write the XML listing of `config.module`.
///
/// Failing to obtain or walk the test tree is reported inside the document;
/// only a failure to write the document itself is returned as an error.
pub async fn list_tests(config: &RunConfig) -> Result<ListOutcome> {
    let out = open_output(config.output.as_deref())?;
    list_tests_to(config, out).await.map(|(outcome, _)| outcome)
}

/// `list_tests` against a caller-supplied writer, returned when done.
pub async fn list_tests_to<W: Write>(config: &RunConfig, out: W) -> Result<(ListOutcome, W)> {
    let mut lister = TreeLister::new(config.module.to_string_lossy(), out);
    lister.set_pretty_print(config.settings.pretty_print);

    if config.mode == ListMode::Debug {
        let resolver = SourceResolver::open(&config.module, config.symbols_file.as_deref());
        lister = lister.with_resolver(resolver);
    }

    lister.write_header()?;

    let outcome = match enumerate(config, &mut lister).await {
        Ok(()) => ListOutcome::Listed,
        Err(e) => {
            tracing::error!("Listing {} failed: {}", config.module.display(), e);
            lister.write_error(Some(&e.to_string()))?;
            ListOutcome::Failed
        }
    };

    lister.write_trailer()?;
    Ok((outcome, lister.into_inner()))
}

async fn enumerate<W: Write>(config: &RunConfig, lister: &mut TreeLister<W>) -> Result<()> {
    let tree = config.listing_source().load().await?;
    traverse_test_tree(&tree, lister)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn config(module: &str, listing: Option<PathBuf>, mode: ListMode) -> RunConfig {
        RunConfig {
            module: PathBuf::from(module),
            mode,
            output: None,
            listing,
            symbols_file: None,
            settings: ListerSettings::default(),
        }
    }

    async fn run(config: &RunConfig) -> (ListOutcome, String) {
        let (outcome, out) = list_tests_to(config, Vec::new()).await.unwrap();
        (outcome, String::from_utf8(out).unwrap())
    }

    #[tokio::test]
    async fn test_lists_captured_listing() {
        let dir = tempdir().unwrap();
        let listing = dir.path().join("listing.txt");
        std::fs::write(&listing, "Suite*\n    Alpha*\n    Beta*\n").unwrap();

        let (outcome, output) = run(&config("mod.dll", Some(listing), ListMode::Plain)).await;
        assert_eq!(outcome, ListOutcome::Listed);
        assert_eq!(
            output,
            "<?xml version=\"1.0\" encoding=\"UTF-8\" ?>\n\
             <BoostTestFramework source=\"mod.dll\">\n\
             \x20   <TestSuite id=\"2\" name=\"Suite\">\n\
             \x20       <TestCase id=\"65536\" name=\"Alpha\" />\n\
             \x20       <TestCase id=\"65537\" name=\"Beta\" />\n\
             \x20   </TestSuite>\n\
             </BoostTestFramework>\n"
        );
    }

    #[tokio::test]
    async fn test_missing_module_writes_diagnostic() {
        let (outcome, output) = run(&config("/nonexistent/mod.so", None, ListMode::Plain)).await;

        assert_eq!(outcome, ListOutcome::Failed);
        assert_eq!(outcome.exit_code(), 1);
        assert!(output.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\" ?>\n"));
        assert!(
            output.contains("<![CDATA[Error: Could not load /nonexistent/mod.so. Detail: MODULE_LOAD_FAILED"),
            "{}",
            output
        );
        assert!(!output.contains("<TestCase"));
        assert!(output.ends_with("</BoostTestFramework>\n"));
    }

    #[tokio::test]
    async fn test_unparsable_listing_writes_diagnostic() {
        let dir = tempdir().unwrap();
        let listing = dir.path().join("listing.txt");
        std::fs::write(&listing, "Suite*\n  Misaligned*\n").unwrap();

        let (outcome, output) = run(&config("mod.dll", Some(listing), ListMode::Plain)).await;
        assert_eq!(outcome, ListOutcome::Failed);
        assert!(output.contains("LISTING_PARSE_FAILED"), "{}", output);
    }

    #[tokio::test]
    async fn test_debug_mode_without_debug_info_matches_plain() {
        let dir = tempdir().unwrap();
        let listing = dir.path().join("listing.txt");
        std::fs::write(&listing, "Suite*\n    Alpha*\n").unwrap();

        let (_, plain) = run(&config("/nonexistent/mod.so", Some(listing.clone()), ListMode::Plain)).await;
        let (outcome, debug) = run(&config("/nonexistent/mod.so", Some(listing), ListMode::Debug)).await;
        assert_eq!(outcome, ListOutcome::Listed);
        assert_eq!(debug, plain);
    }

    #[tokio::test]
    async fn test_writes_output_file() {
        let dir = tempdir().unwrap();
        let listing = dir.path().join("listing.txt");
        let out = dir.path().join("out.xml");
        std::fs::write(&listing, "Alpha*\n").unwrap();

        let mut config = config("mod.dll", Some(listing), ListMode::Plain);
        config.output = Some(out.clone());
        config.settings.pretty_print = false;

        assert_eq!(list_tests(&config).await.unwrap(), ListOutcome::Listed);
        let written = std::fs::read_to_string(&out).unwrap();
        assert!(written.ends_with(r#"<TestCase id="65536" name="Alpha" /></BoostTestFramework>"#), "{}", written);
    }
}
