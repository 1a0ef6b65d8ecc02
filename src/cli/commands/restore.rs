//! Restore command implementation
//!
//! Replaces the pseudonyms of a plain-text document with the original
//! values recorded in a mapping file.

use crate::io::FormatRegistry;
use crate::pseudonymizer::MappingStore;
use clap::Args;
use std::fs;
use std::path::PathBuf;

/// Arguments for the restore command
#[derive(Args, Debug)]
pub struct RestoreArgs {
    /// Pseudonymized plain-text file
    pub input: PathBuf,

    /// Mapping file written by a previous run
    #[arg(short, long, value_name = "MAPPING")]
    pub mapping: PathBuf,

    /// Output file (prints to stdout when omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl RestoreArgs {
    /// Execute the restore command
    pub fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(input = %self.input.display(), "Starting restore command");

        let mapping = match MappingStore::from_file(&self.mapping) {
            Ok(m) => m,
            Err(e) => {
                crate::log_error_with_context!(&e, "Failed to load mapping");
                eprintln!("❌ Failed to load mapping {}: {e}", self.mapping.display());
                return Ok(2);
            }
        };

        let document = match FormatRegistry::new().read(&self.input) {
            Ok(d) => d,
            Err(e) => {
                eprintln!("❌ {e}");
                return Ok(1);
            }
        };

        let restored = mapping.restore_text(&document.flattened_text())?;

        match &self.output {
            Some(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    fs::create_dir_all(parent)?;
                }
                if let Err(e) = fs::write(path, restored) {
                    eprintln!("❌ Failed to write {}: {e}", path.display());
                    return Ok(5); // Fatal error exit code
                }
                println!("✅ Restored text written to {}", path.display());
            }
            None => print!("{restored}"),
        }

        Ok(0)
    }
}
