use std::path::PathBuf;

use clap::Parser;

use super::{ListMode, RunConfig};
use crate::config::ListerSettings;

/// List the Boost.Test suites and test cases of a test module as XML.
#[derive(Parser, Debug)]
#[command(name = "boost-test-lister", version, about)]
pub struct Cli {
    /// Test module to list.
    #[arg(long = "test", value_name = "MODULE")]
    pub test: PathBuf,

    /// List suites and test cases. Writes to OUT, or stdout when OUT is omitted.
    #[arg(
        long,
        value_name = "OUT",
        num_args = 0..=1,
        default_missing_value = "",
        conflicts_with = "list_debug",
        required_unless_present = "list_debug"
    )]
    pub list: Option<String>,

    /// Like --list, and add the source file and line of every test case.
    #[arg(long = "list-debug", value_name = "OUT", num_args = 0..=1, default_missing_value = "")]
    pub list_debug: Option<String>,

    /// Read a captured content listing instead of running the module.
    #[arg(long, value_name = "FILE")]
    pub listing: Option<PathBuf>,

    /// Separate file to read debug symbols from.
    #[arg(long, value_name = "FILE")]
    pub symbols: Option<PathBuf>,

    /// Write the document on a single line.
    #[arg(long)]
    pub no_pretty_print: bool,

    /// Log debug output to stderr.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn into_run_config(self, mut settings: ListerSettings) -> RunConfig {
        let (mode, output) = match (self.list, self.list_debug) {
            (_, Some(out)) => (ListMode::Debug, out),
            (Some(out), None) => (ListMode::Plain, out),
            (None, None) => (ListMode::Plain, String::new()),
        };

        if self.no_pretty_print {
            settings.pretty_print = false;
        }

        RunConfig {
            module: self.test,
            mode,
            output: Some(PathBuf::from(output)).filter(|p| !p.as_os_str().is_empty()),
            listing: self.listing,
            symbols_file: self.symbols,
            settings,
        }
    }
}
