use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use super::{parse_content, TestSuite};
use crate::{Error, Result};

/// Where the content listing of a test module comes from.
#[derive(Debug, Clone)]
pub enum ListingSource {
    /// Run the module and capture the listing it prints.
    Module {
        path: PathBuf,
        arguments: Vec<String>,
        timeout_ms: u64,
    },
    /// A listing captured earlier, e.g. for a module that cannot be run directly.
    File(PathBuf),
}

impl ListingSource {
    /// Obtain and parse the test tree. Every failure is a module-load failure.
    pub async fn load(&self) -> Result<TestSuite> {
        let text = match self {
            ListingSource::File(path) => {
                tokio::fs::read_to_string(path).await.map_err(|e| Error::ModuleLoadFailed {
                    path: path.display().to_string(),
                    reason: format!("cannot read listing: {}", e),
                })?
            }
            ListingSource::Module { path, arguments, timeout_ms } => {
                run_module_listing(path, arguments, *timeout_ms).await?
            }
        };

        let tree = parse_content(&text)?;
        tracing::info!("Listing contains {} test cases", tree.test_case_count());
        Ok(tree)
    }
}

async fn run_module_listing(path: &Path, arguments: &[String], timeout_ms: u64) -> Result<String> {
    tracing::debug!("Listing content of {} with {:?}", path.display(), arguments);

    let child = Command::new(path)
        .args(arguments)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| Error::ModuleLoadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

    let output = tokio::time::timeout(Duration::from_millis(timeout_ms), child.wait_with_output())
        .await
        .map_err(|_| Error::ListingTimeout(timeout_ms))??;

    // Boost.Test writes the content listing to its report stream, stderr by default.
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let listing = if stderr.trim().is_empty() { stdout } else { stderr };

    if !output.status.success() && listing.trim().is_empty() {
        return Err(Error::ModuleLoadFailed {
            path: path.display().to_string(),
            reason: format!("module exited with {} without listing its content", output.status),
        });
    }

    Ok(listing.into_owned())
}
