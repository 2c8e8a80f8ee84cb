use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use protorpc_codegen::{CodeGeneratorResponse, GeneratedFile};

/// Write each file under `dir`, creating intermediate directories.
pub fn write_files(dir: &Path, files: &[GeneratedFile]) -> Result<()> {
    for file in files {
        let path = dir.join(&file.name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        std::fs::write(&path, &file.content)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), "wrote");
    }
    Ok(())
}

pub fn print_files(files: &[GeneratedFile]) -> Result<()> {
    let mut out = io::stdout().lock();
    for file in files {
        writeln!(out, "// ===== {} =====", file.name)?;
        out.write_all(file.content.as_bytes())?;
    }
    Ok(())
}

pub fn print_response(response: &CodeGeneratorResponse) -> Result<()> {
    let mut out = io::stdout().lock();
    serde_json::to_writer(&mut out, response).context("failed to encode response")?;
    writeln!(out)?;
    Ok(())
}
