use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use anyhow::Context;
use serde_json::Value;

use crate::docx::package::DocxPackage;
use crate::docx::xml::{parse_xml_part, write_xml_part, XmlEvent, XmlPart};
use crate::error::ProfilError;

/// Renders `{{key}}` placeholders in a DOCX template against the flat
/// context and writes the result. Scalar values substitute verbatim, string
/// lists join with `", "`; record lists stay with the external template
/// engine and leave their placeholders untouched.
pub fn render_docx(
    template: &Path,
    context: &BTreeMap<String, Value>,
    output: &Path,
) -> anyhow::Result<()> {
    if !template.exists() {
        return Err(ProfilError::TemplateMissing(template.to_path_buf()).into());
    }

    let pkg = DocxPackage::read(template)
        .map_err(|e| ProfilError::DocumentUnreadable(format!("{e:#}")))?;

    let mut replacements: HashMap<String, Vec<u8>> = HashMap::new();
    for ent in pkg.xml_entries() {
        // Placeholder syntax is ASCII, so a byte scan is a safe fast path.
        if !contains_marker(&ent.data) {
            continue;
        }
        let mut part = parse_xml_part(&ent.name, &ent.data)
            .with_context(|| format!("parse template part {}", ent.name))?;

        if substitute_part(&mut part, context) {
            let bytes = write_xml_part(&part)
                .with_context(|| format!("serialize template part {}", ent.name))?;
            replacements.insert(ent.name.clone(), bytes);
        }
    }

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create output dir: {}", parent.display()))?;
        }
    }
    pkg.write_with_replacements(output, &replacements)
        .with_context(|| format!("write rendered docx: {}", output.display()))?;

    log::info!("rendered {} -> {}", template.display(), output.display());
    Ok(())
}

/// Applies context substitution to one XML part. Placeholders contained in
/// a single text event substitute in place; placeholders Word fragmented
/// across several runs of a paragraph are resolved in a second pass over the
/// paragraph's joined text (the joined result lands in the first run, so a
/// fragmented placeholder takes that run's formatting).
fn substitute_part(part: &mut XmlPart, context: &BTreeMap<String, Value>) -> bool {
    let mut changed = false;
    for ev in &mut part.events {
        if let XmlEvent::Text { text } = ev {
            if let Some(replaced) = substitute(text, context) {
                *text = replaced;
                changed = true;
            }
        }
    }
    changed |= coalesce_split_placeholders(part, context);
    changed
}

fn coalesce_split_placeholders(part: &mut XmlPart, context: &BTreeMap<String, Value>) -> bool {
    let mut changed = false;
    let mut i = 0;
    while i < part.events.len() {
        let opens_paragraph =
            matches!(&part.events[i], XmlEvent::Start { name, .. } if name == "w:p");
        if !opens_paragraph {
            i += 1;
            continue;
        }

        // Direct text events of this paragraph; nested paragraphs (text
        // boxes) get their own pass when the scan reaches them.
        let mut depth = 1usize;
        let mut j = i + 1;
        let mut text_idx: Vec<usize> = Vec::new();
        while j < part.events.len() && depth > 0 {
            match &part.events[j] {
                XmlEvent::Start { name, .. } if name == "w:p" => depth += 1,
                XmlEvent::End { name } if name == "w:p" => depth -= 1,
                XmlEvent::Text { .. } if depth == 1 => text_idx.push(j),
                _ => {}
            }
            j += 1;
        }

        if text_idx.len() > 1 {
            let joined: String = text_idx
                .iter()
                .filter_map(|&k| match &part.events[k] {
                    XmlEvent::Text { text } => Some(text.as_str()),
                    _ => None,
                })
                .collect();
            if let Some(replaced) = substitute(&joined, context) {
                for (n, &k) in text_idx.iter().enumerate() {
                    if let XmlEvent::Text { text } = &mut part.events[k] {
                        *text = if n == 0 { replaced.clone() } else { String::new() };
                    }
                }
                changed = true;
            }
        }
        i += 1;
    }
    changed
}

fn contains_marker(data: &[u8]) -> bool {
    data.windows(2).any(|w| w == b"{{")
}

/// Returns the substituted text, or `None` when nothing applies. Unknown
/// keys and record-valued keys keep their placeholder.
fn substitute(text: &str, context: &BTreeMap<String, Value>) -> Option<String> {
    if !text.contains("{{") {
        return None;
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    let mut changed = false;

    while let Some(start) = rest.find("{{") {
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            break;
        };
        let key = after[..end].trim();
        match context.get(key).and_then(render_value) {
            Some(v) => {
                out.push_str(&rest[..start]);
                out.push_str(&v);
                changed = true;
            }
            None => {
                out.push_str(&rest[..start + 2 + end + 2]);
            }
        }
        rest = &after[end + 2..];
    }
    if !changed {
        return None;
    }
    out.push_str(rest);
    Some(out)
}

fn render_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => {
            let mut parts = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::String(s) => parts.push(s.clone()),
                    _ => return None,
                }
            }
            Some(parts.join(", "))
        }
        _ => None,
    }
}
