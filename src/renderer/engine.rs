//! Typst rendering engine.
//!
//! Handles the low-level details of writing Typst source to a temporary
//! directory, invoking the compiler, and reading back the output PDF.

use std::fs;
use std::process::Command;
use tempfile::tempdir;
use tempfile::TempDir;

use super::RenderError;

/// Stateless wrapper around the Typst CLI.
#[derive(Debug, Clone)]
pub struct TypstRenderEngine {
    typst_bin: String,
}

impl Default for TypstRenderEngine {
    fn default() -> Self {
        Self::new("typst")
    }
}

impl TypstRenderEngine {
    pub fn new(typst_bin: impl Into<String>) -> Self {
        Self {
            typst_bin: typst_bin.into(),
        }
    }

    /// Compile a complete Typst source string to PDF bytes.
    ///
    /// This blocks on the compiler process; async callers should run it on a
    /// blocking thread.
    pub fn render(&self, source_filename: &str, typst_source: &str) -> Result<Vec<u8>, RenderError> {
        let temp_dir = tempdir().map_err(RenderError::TempDir)?;
        let typ_path = temp_dir.path().join(source_filename);

        fs::write(&typ_path, typst_source).map_err(RenderError::WriteTypst)?;

        let output_filename = format!("{}.pdf", source_filename.trim_end_matches(".typ"));
        self.compile(&temp_dir, source_filename, &output_filename)
    }

    fn compile(
        &self,
        temp_dir: &TempDir,
        typ_filename: &str,
        output_filename: &str,
    ) -> Result<Vec<u8>, RenderError> {
        let typ_path = temp_dir.path().join(typ_filename);
        let output_path = temp_dir.path().join(output_filename);

        let status = Command::new(&self.typst_bin)
            .arg("compile")
            .arg(&typ_path)
            .arg(&output_path)
            .current_dir(temp_dir.path())
            .status()
            .map_err(RenderError::TypstIo)?;

        if !status.success() {
            let code = status.code().unwrap_or(-1);
            return Err(RenderError::TypstExit(code));
        }

        fs::read(&output_path).map_err(RenderError::ReadPdf)
    }
}
