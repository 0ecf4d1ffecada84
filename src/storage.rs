use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Local;

use crate::model::profile::Profile;

pub const TEMPLATES_DIR: &str = "templates";
pub const OUTPUT_DIR: &str = "output";

/// Copies an uploaded template into the template store, keyed by its
/// original filename.
pub fn save_template(templates_dir: &Path, source: &Path) -> anyhow::Result<PathBuf> {
    let name = source
        .file_name()
        .with_context(|| format!("template has no filename: {}", source.display()))?;
    std::fs::create_dir_all(templates_dir)
        .with_context(|| format!("create template dir: {}", templates_dir.display()))?;
    let target = templates_dir.join(name);
    std::fs::copy(source, &target)
        .with_context(|| format!("store template: {}", source.display()))?;
    log::info!("saved template {}", target.display());
    Ok(target)
}

/// Lists stored templates (`*.docx`), sorted by filename.
pub fn list_templates(templates_dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    if !templates_dir.is_dir() {
        return Ok(found);
    }
    for entry in std::fs::read_dir(templates_dir)
        .with_context(|| format!("read template dir: {}", templates_dir.display()))?
    {
        let path = entry?.path();
        let is_docx = path
            .extension()
            .map(|e| e.eq_ignore_ascii_case("docx"))
            .unwrap_or(false);
        if path.is_file() && is_docx {
            found.push(path);
        }
    }
    found.sort();
    Ok(found)
}

/// Output filename rule: `{full name, spaces to underscores}_{mode}_{stamp}.{ext}`,
/// falling back to `profil` for a nameless profile.
pub fn output_file_name(profile: &Profile, timestamp: &str, ext: &str) -> String {
    let name = profile.full_name().replace(' ', "_");
    let name = if name.is_empty() { "profil".to_string() } else { name };
    format!("{name}_{}_{timestamp}.{ext}", profile.mode.as_str())
}

/// Default output path under the output directory, stamped with the current
/// local time.
pub fn default_output_path(output_dir: &Path, profile: &Profile, ext: &str) -> PathBuf {
    let stamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
    output_dir.join(output_file_name(profile, &stamp, ext))
}
