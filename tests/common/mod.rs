pub mod pdf_assertions;

use ets::{EtsConfig, Runtime};
use lopdf::Document as LopdfDocument;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// A runtime plus a scratch directory. The script sees the output path as
/// the global `output`.
pub struct ScriptFixture {
    pub dir: TempDir,
    pub runtime: Runtime,
    pub output: PathBuf,
}

impl ScriptFixture {
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        Self::with_config(EtsConfig::default())
    }

    pub fn with_config(config: EtsConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let _ = env_logger::builder().is_test(true).try_init();
        let dir = tempfile::tempdir()?;
        let output = dir.path().join("out.pdf");
        let runtime = Runtime::new(config)?;
        runtime.lua().globals().set("output", output.display().to_string())?;
        Ok(Self { dir, runtime, output })
    }

    /// Writes `contents` to `name` inside the scratch directory.
    pub fn file(&self, name: &str, contents: &[u8]) -> std::io::Result<PathBuf> {
        let path = self.dir.path().join(name);
        std::fs::write(&path, contents)?;
        Ok(path)
    }

    /// Exposes `path` to scripts as the string global `name`.
    pub fn set_global(&self, name: &str, path: &Path) -> TestResult {
        self.runtime.lua().globals().set(name, path.display().to_string())?;
        Ok(())
    }

    pub fn pdf(&self) -> Result<GeneratedPdf, Box<dyn std::error::Error>> {
        GeneratedPdf::load(&self.output)
    }
}

/// Wrapper around a produced PDF with helper methods
pub struct GeneratedPdf {
    pub bytes: Vec<u8>,
    pub doc: LopdfDocument,
}

impl GeneratedPdf {
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let bytes = std::fs::read(path)?;
        let doc = LopdfDocument::load_mem(&bytes)?;
        Ok(Self { bytes, doc })
    }

    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }
}

/// A TrueType file installed on this machine, `None` when there is none.
#[cfg(feature = "system-fonts")]
pub fn system_font_file() -> Option<PathBuf> {
    ets::layout::FontLocator::system().fallback()?.filename
}

#[cfg(not(feature = "system-fonts"))]
pub fn system_font_file() -> Option<PathBuf> {
    None
}
