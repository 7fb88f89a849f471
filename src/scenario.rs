pub mod step;
pub mod tree;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::debug;

pub use step::{Actor, Choice, Step, StepKind, TrustHint};
pub use tree::{Debrief, Difficulty, Scenario, ScenarioMeta};

// ---------------------------------------------------------------------------
// Loading scenario documents
// ---------------------------------------------------------------------------

impl Scenario {
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("scenario JSON does not match the scenario shape")
    }
}

/// A scenario file as read from disk, before and after parsing.
#[derive(Debug)]
pub struct LoadedFile {
    pub path: PathBuf,
    /// Raw document text, kept for the legacy-field banlist.
    pub content: String,
    pub scenario: Result<Scenario>,
}

impl LoadedFile {
    /// File stem, used as the scenario id when the document fails to parse.
    pub fn name(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Read and parse one scenario document. Read and parse failures both land in
/// `LoadedFile::scenario`.
pub fn load_file(path: &Path) -> LoadedFile {
    let (content, scenario) = match fs::read_to_string(path) {
        Ok(content) => {
            let scenario = Scenario::from_json(&content)
                .with_context(|| format!("invalid scenario in {}", path.display()));
            (content, scenario)
        }
        Err(e) => (
            String::new(),
            Err(anyhow::Error::new(e).context(format!("failed to read {}", path.display()))),
        ),
    };
    LoadedFile {
        path: path.to_path_buf(),
        content,
        scenario,
    }
}

/// Read every `*.json` file in `dir`, sorted by file name. Parse failures are
/// kept per file so one broken document never hides the rest of the corpus.
pub fn load_dir(dir: &Path) -> Result<Vec<LoadedFile>> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("failed to scan scenario directory {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    debug!("Found {} scenario files in {}", paths.len(), dir.display());

    Ok(paths.iter().map(|p| load_file(p)).collect())
}
