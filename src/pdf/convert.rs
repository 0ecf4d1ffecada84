use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::ProfilError;

const CONVERTER_NAMES: &[&str] = &["libreoffice", "soffice"];

/// DOCX to PDF via a headless office suite. The suite reproduces the DOCX
/// layout exactly, so no PDF rendering of our own is needed.
pub fn convert_to_pdf(docx: &Path, pdf: Option<&Path>) -> anyhow::Result<PathBuf> {
    let target = match pdf {
        Some(p) => p.to_path_buf(),
        None => docx.with_extension("pdf"),
    };
    let converter = find_converter().ok_or(ProfilError::ConverterUnavailable)?;

    let outdir = target
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    log::info!("converting {} via {}", docx.display(), converter.display());
    let output = Command::new(&converter)
        .arg("--headless")
        .arg("--convert-to")
        .arg("pdf")
        .arg("--outdir")
        .arg(outdir)
        .arg(docx)
        .output()
        .map_err(|e| ProfilError::Collaborator(format!("run {}: {e}", converter.display())))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ProfilError::Collaborator(format!(
            "pdf conversion failed ({}): {stderr}",
            output.status
        ))
        .into());
    }

    // The suite writes <input stem>.pdf into the outdir; rename when the
    // caller asked for a different name.
    let stem = docx
        .file_stem()
        .ok_or_else(|| ProfilError::Collaborator(format!("no file stem: {}", docx.display())))?;
    let produced = outdir.join(Path::new(stem).with_extension("pdf"));
    if produced != target {
        std::fs::rename(&produced, &target)?;
    }
    Ok(target)
}

/// Name of the converter that would be used, if any.
pub fn available_method() -> Option<String> {
    find_converter().and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
}

fn find_converter() -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    for name in CONVERTER_NAMES {
        if let Some(hit) = find_in_path(name, &path_var) {
            return Some(hit);
        }
    }
    None
}

fn find_in_path(name: &str, path_var: &std::ffi::OsStr) -> Option<PathBuf> {
    std::env::split_paths(path_var)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}
