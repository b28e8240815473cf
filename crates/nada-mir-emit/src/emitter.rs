use anyhow::{Context, Result};
use nada_mir_compiler::HirProgram;
use nada_mir_core::MirProgram;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tracing::debug;

use crate::config::{EmitterConfig, OutputStyle};

pub const MIR_EXTENSION: &str = "nada.json";
pub const HIR_EXTENSION: &str = "nada-pydsl-hir.json";

pub struct MirEmitter {
    config: EmitterConfig,
}

impl MirEmitter {
    pub fn new(config: EmitterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EmitterConfig {
        &self.config
    }

    pub fn emit<W: Write>(&self, program: &MirProgram, writer: &mut W) -> Result<()> {
        self.emit_document(program, writer)
    }

    pub fn emit_to_string(&self, program: &MirProgram) -> Result<String> {
        self.render(program)
    }

    /// Writes `<target>/<name>.nada.json`, creating the target directory if needed.
    pub fn write(&self, program: &MirProgram, name: &str) -> Result<PathBuf> {
        let contents = self.render(program)?;
        self.write_file(name, MIR_EXTENSION, &contents)
    }

    /// Writes the program graph as `<target>/<name>.nada-pydsl-hir.json`.
    pub fn write_hir(&self, hir: &HirProgram, name: &str) -> Result<PathBuf> {
        let contents = self.render(hir)?;
        self.write_file(name, HIR_EXTENSION, &contents)
    }

    fn emit_document<T: Serialize, W: Write>(&self, document: &T, writer: &mut W) -> Result<()> {
        match self.config.style {
            OutputStyle::Pretty => serde_json::to_writer_pretty(&mut *writer, document)?,
            OutputStyle::Compact => serde_json::to_writer(&mut *writer, document)?,
        }
        Ok(())
    }

    fn render<T: Serialize>(&self, document: &T) -> Result<String> {
        let mut buffer = Vec::new();
        self.emit_document(document, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    fn write_file(&self, name: &str, extension: &str, contents: &str) -> Result<PathBuf> {
        let dir = self
            .config
            .target_dir()
            .context("Failed to resolve target directory")?;
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;

        let path = dir.join(format!("{}.{}", name, extension));
        fs::write(&path, contents).with_context(|| format!("Failed to write {}", path.display()))?;

        debug!(path = %path.display(), "wrote document");
        Ok(path)
    }
}

impl Default for MirEmitter {
    fn default() -> Self {
        Self::new(EmitterConfig::default())
    }
}
