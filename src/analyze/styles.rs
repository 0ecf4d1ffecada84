use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::json;

use crate::analyze::structure::{extract_structure, extract_text};
use crate::docx::reader::ParsedDocument;

/// First-section page margins in centimeters, rounded to 2 decimals.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Margins {
    #[serde(rename = "oben")]
    pub top: Option<f64>,
    #[serde(rename = "unten")]
    pub bottom: Option<f64>,
    #[serde(rename = "links")]
    pub left: Option<f64>,
    #[serde(rename = "rechts")]
    pub right: Option<f64>,
}

/// Aggregate formatting metadata of one document. Wire keys are the German
/// names of the analysis JSON contract.
#[derive(Clone, Debug, Default, Serialize)]
pub struct StyleSummary {
    /// Distinct explicit font names, lexically sorted.
    #[serde(rename = "schriftarten")]
    pub font_names: Vec<String>,
    /// Distinct explicit RGB colors as uppercase hex, lexically sorted.
    #[serde(rename = "farben")]
    pub colors: Vec<String>,
    /// Paragraph style names, de-duplicated in first-seen order.
    #[serde(rename = "absatz_stile")]
    pub paragraph_style_names: Vec<String>,
    #[serde(rename = "seitenraender_cm")]
    pub margins_cm: Option<Margins>,
    #[serde(rename = "tabellen_anzahl")]
    pub table_count: usize,
    #[serde(rename = "sektionen_anzahl")]
    pub section_count: usize,
    #[serde(rename = "hat_tabellen")]
    pub has_tables: bool,
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Pure aggregation over paragraphs and runs. Absent fonts, colors, and
/// margins degrade to empty values, never to an error.
pub fn extract_style_info(doc: &ParsedDocument) -> StyleSummary {
    let mut fonts: BTreeSet<String> = BTreeSet::new();
    let mut colors: BTreeSet<String> = BTreeSet::new();
    let mut styles: Vec<String> = Vec::new();

    for para in &doc.paragraphs {
        let style = para.style.as_deref().unwrap_or("Normal");
        if !styles.iter().any(|s| s == style) {
            styles.push(style.to_string());
        }
        for run in &para.runs {
            if let Some(f) = run.font.as_deref() {
                fonts.insert(f.to_string());
            }
            if let Some(c) = run.color_hex.as_deref() {
                colors.insert(c.to_string());
            }
        }
    }

    let margins_cm = doc.page_sections.first().map(|g| Margins {
        top: g.top_cm.map(round2),
        bottom: g.bottom_cm.map(round2),
        left: g.left_cm.map(round2),
        right: g.right_cm.map(round2),
    });

    StyleSummary {
        font_names: fonts.into_iter().collect(),
        colors: colors.into_iter().collect(),
        paragraph_style_names: styles,
        margins_cm,
        table_count: doc.tables.len(),
        section_count: doc.page_sections.len(),
        has_tables: !doc.tables.is_empty(),
    }
}

/// Full analysis payload for the `--analyze-json` mode: transcript,
/// section structure, and style summary in one object.
pub fn analysis_json(doc: &ParsedDocument) -> serde_json::Value {
    json!({
        "text": extract_text(doc),
        "struktur": extract_structure(doc),
        "stil": extract_style_info(doc),
    })
}
