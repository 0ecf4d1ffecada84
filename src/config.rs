use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use crate::ai::prompts::{default_prompt_files, DEFAULT_PROMPTS_DIR};

pub const CONFIG_FILENAME: &str = "profilgen.toml";

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub storage: StorageSection,
    #[serde(default)]
    pub ai: AiSection,
    #[serde(default)]
    pub prompts: PromptsSection,
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct StorageSection {
    /// Template store directory (default: "templates").
    #[serde(default)]
    pub templates_dir: Option<PathBuf>,
    /// Generated output directory (default: "output").
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AiSection {
    /// Messages API endpoint (default: the public endpoint).
    #[serde(default)]
    pub endpoint: Option<String>,
    /// API key; falls back to the ANTHROPIC_API_KEY environment variable.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct PromptsSection {
    /// Path to the extraction system prompt, relative to the config file.
    #[serde(default)]
    pub extract: Option<String>,
    /// Path to the tailoring system prompt, relative to the config file.
    #[serde(default)]
    pub tailor: Option<String>,
}

impl AppConfig {
    pub fn templates_dir(&self, config_dir: &Path) -> PathBuf {
        resolve_dir(
            config_dir,
            self.storage.templates_dir.as_deref(),
            crate::storage::TEMPLATES_DIR,
        )
    }

    pub fn output_dir(&self, config_dir: &Path) -> PathBuf {
        resolve_dir(
            config_dir,
            self.storage.output_dir.as_deref(),
            crate::storage::OUTPUT_DIR,
        )
    }
}

fn resolve_dir(config_dir: &Path, configured: Option<&Path>, default: &str) -> PathBuf {
    let p = configured
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(default));
    if p.is_relative() {
        config_dir.join(p)
    } else {
        p
    }
}

pub fn find_file_upwards(start_dir: &Path, filename: &str, max_levels: usize) -> Option<PathBuf> {
    let mut dir = start_dir;
    for _ in 0..=max_levels {
        let candidate = dir.join(filename);
        if candidate.exists() {
            return Some(candidate);
        }
        dir = dir.parent()?;
    }
    None
}

/// Search order: cwd upwards, then the executable's directory upwards.
pub fn find_default_config(filename: &str) -> Option<PathBuf> {
    if let Ok(cwd) = std::env::current_dir() {
        if let Some(p) = find_file_upwards(&cwd, filename, 8) {
            return Some(p);
        }
    }
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            if let Some(p) = find_file_upwards(dir, filename, 10) {
                return Some(p);
            }
        }
    }
    None
}

pub fn load_config(path: &Path) -> anyhow::Result<AppConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read config: {}", path.display()))?;
    let cfg: AppConfig = toml::from_str(&text).context("parse config toml")?;
    Ok(cfg)
}

/// Writes the default config and prompt files into `dir`. Existing files
/// survive unless `force` is set.
pub fn init_default_config(dir: &Path, force: bool) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("create config dir: {}", dir.display()))?;
    let cfg_path = dir.join(CONFIG_FILENAME);

    let prompts_dir = dir.join(DEFAULT_PROMPTS_DIR);
    std::fs::create_dir_all(&prompts_dir)
        .with_context(|| format!("create prompts dir: {}", prompts_dir.display()))?;
    for (fname, body) in default_prompt_files() {
        let p = prompts_dir.join(fname);
        if p.exists() && !force {
            continue;
        }
        std::fs::write(&p, body).with_context(|| format!("write prompt: {}", p.display()))?;
    }

    if cfg_path.exists() && !force {
        return Ok(cfg_path);
    }
    std::fs::write(&cfg_path, DEFAULT_CONFIG_TEXT)
        .with_context(|| format!("write config: {}", cfg_path.display()))?;
    Ok(cfg_path)
}

const DEFAULT_CONFIG_TEXT: &str = r#"# profilgen configuration

[storage]
# Directories are resolved relative to this file.
templates_dir = "templates"
output_dir = "output"

[ai]
# api_key = "..."            # default: ANTHROPIC_API_KEY environment variable
# model = "claude-sonnet-4-6"
# endpoint = "https://api.anthropic.com/v1/messages"
# timeout_secs = 180

[prompts]
# System prompt overrides, relative to this file.
extract = "prompts/extract_profile.txt"
tailor = "prompts/tailor_profile.txt"
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_text_parses_and_resolves_dirs() {
        let cfg: AppConfig = toml::from_str(DEFAULT_CONFIG_TEXT).unwrap();
        assert_eq!(
            cfg.templates_dir(Path::new("/etc/profilgen")),
            PathBuf::from("/etc/profilgen/templates")
        );
        assert_eq!(
            cfg.prompts.extract.as_deref(),
            Some("prompts/extract_profile.txt")
        );
    }

    #[test]
    fn empty_config_uses_defaults() {
        let cfg: AppConfig = toml::from_str("").unwrap();
        assert_eq!(
            cfg.output_dir(Path::new(".")),
            PathBuf::from("./output")
        );
        assert!(cfg.ai.api_key.is_none());
    }

    #[test]
    fn init_writes_config_and_prompts_once() {
        let dir = tempfile::tempdir().unwrap();
        let cfg_path = init_default_config(dir.path(), false).unwrap();
        assert!(cfg_path.exists());
        let extract = dir.path().join("prompts/extract_profile.txt");
        assert!(extract.exists());

        // Without force, a user edit survives re-init.
        std::fs::write(&extract, "angepasst").unwrap();
        init_default_config(dir.path(), false).unwrap();
        assert_eq!(std::fs::read_to_string(&extract).unwrap(), "angepasst");

        init_default_config(dir.path(), true).unwrap();
        assert_ne!(std::fs::read_to_string(&extract).unwrap(), "angepasst");
    }

    #[test]
    fn upward_search_finds_a_parent_config() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b/c");
        std::fs::create_dir_all(&nested).unwrap();
        let cfg = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&cfg, "").unwrap();

        assert_eq!(find_file_upwards(&nested, CONFIG_FILENAME, 8), Some(cfg));
        assert_eq!(find_file_upwards(&nested, "anders.toml", 8), None);
    }
}
