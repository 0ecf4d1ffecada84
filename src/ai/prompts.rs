use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::config::AppConfig;

pub const DEFAULT_PROMPTS_DIR: &str = "prompts";

pub const DEFAULT_EXTRACT: &str = "extract_profile.txt";
pub const DEFAULT_TAILOR: &str = "tailor_profile.txt";

/// System prompts for the two chat calls. Files next to the config override
/// the built-in texts; with no config at all the built-ins apply.
#[derive(Clone, Debug)]
pub struct PromptSet {
    pub extract: String,
    pub tailor: String,
}

impl Default for PromptSet {
    fn default() -> Self {
        Self {
            extract: DEFAULT_EXTRACT_TEXT.to_string(),
            tailor: DEFAULT_TAILOR_TEXT.to_string(),
        }
    }
}

impl PromptSet {
    pub fn load(config_path: &Path, cfg: &AppConfig) -> anyhow::Result<Self> {
        let config_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
        let p = &cfg.prompts;
        Ok(Self {
            extract: read_prompt(
                config_dir,
                p.extract.as_deref(),
                DEFAULT_EXTRACT,
                DEFAULT_EXTRACT_TEXT,
            )?,
            tailor: read_prompt(
                config_dir,
                p.tailor.as_deref(),
                DEFAULT_TAILOR,
                DEFAULT_TAILOR_TEXT,
            )?,
        })
    }
}

fn read_prompt(
    config_dir: &Path,
    configured: Option<&str>,
    default_filename: &str,
    default_text: &str,
) -> anyhow::Result<String> {
    let rel = configured
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(format!("{DEFAULT_PROMPTS_DIR}/{default_filename}")));
    let path = if rel.is_relative() {
        config_dir.join(&rel)
    } else {
        rel
    };
    if path.exists() {
        return std::fs::read_to_string(&path)
            .with_context(|| format!("read prompt: {}", path.display()));
    }
    // An explicitly configured file must exist; the default file is optional.
    if configured.is_some() {
        anyhow::bail!(
            "prompt file not found: {} (run: profilgen --init-config)",
            path.display()
        );
    }
    Ok(default_text.to_string())
}

pub fn render_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (k, v) in vars {
        let pat = format!("{{{{{k}}}}}");
        out = out.replace(&pat, v);
    }
    out
}

pub fn default_prompt_files() -> Vec<(&'static str, &'static str)> {
    vec![
        (DEFAULT_EXTRACT, DEFAULT_EXTRACT_TEXT),
        (DEFAULT_TAILOR, DEFAULT_TAILOR_TEXT),
    ]
}

pub const DEFAULT_EXTRACT_TEXT: &str = r#"Du bist ein erfahrener Recruiter-Assistent.
Deine Aufgabe ist es, aus einem unstrukturierten Profiltext eines Kandidaten
strukturierte Daten zu extrahieren.

Antworte AUSSCHLIESSLICH mit einem validen JSON-Objekt — ohne Erklärungen, ohne Markdown-Blöcke.

Das JSON muss folgende Struktur haben:
{
  "vorname": "",
  "nachname": "",
  "titel": "",
  "standort": "",
  "verfuegbarkeit": "",
  "stundensatz": "",
  "zusammenfassung": "",
  "kernkompetenzen": [],
  "technische_skills": {},
  "berufserfahrung": [
    {
      "titel": "",
      "unternehmen": "",
      "zeitraum": "",
      "beschreibung": "",
      "technologien": [],
      "highlights": []
    }
  ],
  "projekte": [],
  "ausbildung": [
    {
      "abschluss": "",
      "institution": "",
      "zeitraum": "",
      "zusatz": ""
    }
  ],
  "zertifikate": [],
  "sprachen": [
    {
      "sprache": "",
      "niveau": ""
    }
  ]
}
"#;

pub const DEFAULT_TAILOR_TEXT: &str = r#"Du bist ein erfahrener Recruiter-Assistent und Texter.
Deine Aufgabe ist es, ein Kandidatenprofil so anzupassen, dass es optimal
zu den Anforderungen eines bestimmten Projekts passt.

Regeln:
- Erfinde KEINE neuen Skills oder Erfahrungen — nutze nur was im Profil steht
- Hebe relevante Skills und Erfahrungen stärker hervor
- Passe Beschreibungen so an, dass sie die Projekt-Keywords aufgreifen
- Sortiere Berufserfahrung und Skills nach Relevanz für das Projekt
- Die Zusammenfassung soll das Profil gezielt auf das Projekt ausrichten
- Behalte den professionellen deutschen Stil bei
- Antworte AUSSCHLIESSLICH mit einem validen JSON-Objekt (gleiche Struktur wie Eingabe)
"#;

pub const EXTRACT_USER_TEXT: &str =
    "Extrahiere die Profildaten aus folgendem Text:\n\n{{rohtext}}";

pub const TAILOR_USER_TEXT: &str = "KANDIDATENPROFIL (JSON):\n{{profil_json}}\n\n\
PROJEKTANFORDERUNGEN:\n{{anforderungen}}\n\n\
Passe das Profil optimal auf das Projekt an. Antworte nur mit dem angepassten JSON.";

#[cfg(test)]
mod tests {
    use super::render_template;

    #[test]
    fn render_replaces_all_occurrences() {
        let out = render_template("{{a}} und {{b}} und {{a}}", &[("a", "x"), ("b", "y")]);
        assert_eq!(out, "x und y und x");
    }

    #[test]
    fn unknown_vars_stay_verbatim() {
        assert_eq!(render_template("{{weder}}", &[("noch", "x")]), "{{weder}}");
    }
}
