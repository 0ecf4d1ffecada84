use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::docx::reader::{Paragraph, ParsedDocument};

/// Synthetic section key collecting everything before the first heading.
pub const HEADER_KEY: &str = "_header";

/// Ordered section map: heading title to content lines. Backed by a Vec so
/// insertion order survives serialization; repeated headings keep their
/// original position but restart with an empty bucket.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DocumentStructure {
    sections: Vec<(String, Vec<String>)>,
}

impl DocumentStructure {
    pub fn get(&self, title: &str) -> Option<&[String]> {
        self.sections
            .iter()
            .find(|(t, _)| t == title)
            .map(|(_, lines)| lines.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.sections
            .iter()
            .map(|(t, lines)| (t.as_str(), lines.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Makes `title` the current section. An existing bucket of the same
    /// title is emptied in place; its position in the map does not change.
    /// Returns the bucket index.
    fn open_section(&mut self, title: &str) -> usize {
        if let Some(idx) = self.sections.iter().position(|(t, _)| t == title) {
            self.sections[idx].1.clear();
            idx
        } else {
            self.sections.push((title.to_string(), Vec::new()));
            self.sections.len() - 1
        }
    }
}

impl Serialize for DocumentStructure {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.sections.len()))?;
        for (title, lines) in &self.sections {
            map.serialize_entry(title, lines)?;
        }
        map.end()
    }
}

/// Flat transcript: trimmed paragraph texts in order, then one line per
/// non-empty table row with cells joined by `" | "`. No trailing newline.
pub fn extract_text(doc: &ParsedDocument) -> String {
    let mut lines: Vec<String> = Vec::new();
    for para in &doc.paragraphs {
        let text = para.text.trim();
        if !text.is_empty() {
            lines.push(text.to_string());
        }
    }
    for table in &doc.tables {
        for row in &table.rows {
            if !row.is_empty() {
                lines.push(row.join(" | "));
            }
        }
    }
    lines.join("\n")
}

/// Heading test: an explicit heading style wins; otherwise a bold first run
/// with short text (under 60 characters) is treated as a heading.
pub fn is_heading(para: &Paragraph) -> bool {
    if let Some(style) = para.style.as_deref() {
        if style.starts_with("Heading") {
            return true;
        }
    }
    match para.runs.first() {
        Some(run) => run.bold == Some(true) && para.text.trim().chars().count() < 60,
        None => false,
    }
}

/// Buckets paragraph texts under detected headings. Table content is never
/// distributed here.
pub fn extract_structure(doc: &ParsedDocument) -> DocumentStructure {
    let mut structure = DocumentStructure::default();
    let mut current = structure.open_section(HEADER_KEY);

    for para in &doc.paragraphs {
        let text = para.text.trim();
        if text.is_empty() {
            continue;
        }
        if is_heading(para) {
            current = structure.open_section(text);
        } else {
            structure.sections[current].1.push(text.to_string());
        }
    }

    structure
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::reader::{Run, Table};

    fn plain(text: &str) -> Paragraph {
        Paragraph {
            text: text.to_string(),
            style: None,
            runs: vec![Run {
                text: text.to_string(),
                ..Default::default()
            }],
        }
    }

    fn bold(text: &str) -> Paragraph {
        Paragraph {
            text: text.to_string(),
            style: None,
            runs: vec![Run {
                text: text.to_string(),
                bold: Some(true),
                ..Default::default()
            }],
        }
    }

    fn styled(text: &str, style: &str) -> Paragraph {
        Paragraph {
            text: text.to_string(),
            style: Some(style.to_string()),
            runs: vec![Run {
                text: text.to_string(),
                ..Default::default()
            }],
        }
    }

    #[test]
    fn transcript_line_count_matches_paragraphs_plus_rows() {
        let doc = ParsedDocument {
            paragraphs: vec![plain("Anna Muster"), plain("Senior Engineer")],
            tables: vec![Table {
                rows: vec![
                    vec!["Sprachen".into(), "Deutsch".into()],
                    vec![],
                    vec!["Verfuegbarkeit".into(), "sofort".into()],
                ],
            }],
            page_sections: vec![],
        };
        let text = extract_text(&doc);
        assert_eq!(text.lines().count(), 4, "empty rows contribute no line");
        assert_eq!(
            text,
            "Anna Muster\nSenior Engineer\nSprachen | Deutsch\nVerfuegbarkeit | sofort"
        );
    }

    #[test]
    fn heading_boundary_is_strictly_under_sixty_chars() {
        let at_59 = bold(&"x".repeat(59));
        let at_60 = bold(&"x".repeat(60));
        assert!(is_heading(&at_59));
        assert!(!is_heading(&at_60));
    }

    #[test]
    fn heading_style_wins_regardless_of_formatting() {
        let para = styled(&"y".repeat(80), "Heading 2");
        assert!(is_heading(&para));
        assert!(!is_heading(&plain("kurzer text")));
    }

    #[test]
    fn paragraph_without_runs_is_never_a_heading() {
        let para = Paragraph {
            text: "kurz".to_string(),
            style: None,
            runs: vec![],
        };
        assert!(!is_heading(&para));
    }

    #[test]
    fn structure_buckets_content_under_headings() {
        let doc = ParsedDocument {
            paragraphs: vec![plain("Header text"), bold("EXPERIENCE"), plain("Did stuff")],
            tables: vec![],
            page_sections: vec![],
        };
        let s = extract_structure(&doc);
        assert_eq!(s.get(HEADER_KEY), Some(&["Header text".to_string()][..]));
        assert_eq!(s.get("EXPERIENCE"), Some(&["Did stuff".to_string()][..]));
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn buckets_preserve_paragraph_order_without_loss() {
        let doc = ParsedDocument {
            paragraphs: vec![
                plain("a"),
                bold("S1"),
                plain("b"),
                plain("c"),
                bold("S2"),
                plain("d"),
            ],
            tables: vec![],
            page_sections: vec![],
        };
        let s = extract_structure(&doc);
        let all: Vec<&str> = s
            .iter()
            .flat_map(|(_, lines)| lines.iter().map(|l| l.as_str()))
            .collect();
        assert_eq!(all, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn repeated_heading_empties_its_bucket_in_place() {
        let doc = ParsedDocument {
            paragraphs: vec![
                bold("Skills"),
                plain("alt"),
                bold("Projekte"),
                plain("p1"),
                bold("Skills"),
                plain("neu"),
            ],
            tables: vec![],
            page_sections: vec![],
        };
        let s = extract_structure(&doc);
        let titles: Vec<&str> = s.iter().map(|(t, _)| t).collect();
        assert_eq!(titles, vec![HEADER_KEY, "Skills", "Projekte"]);
        assert_eq!(s.get("Skills"), Some(&["neu".to_string()][..]));
        assert_eq!(s.get("Projekte"), Some(&["p1".to_string()][..]));
    }

    #[test]
    fn serializes_as_ordered_map() {
        let doc = ParsedDocument {
            paragraphs: vec![plain("intro"), bold("B"), plain("x"), bold("A"), plain("y")],
            tables: vec![],
            page_sections: vec![],
        };
        let json = serde_json::to_string(&extract_structure(&doc)).unwrap();
        let b = json.find("\"B\"").unwrap();
        let a = json.find("\"A\"").unwrap();
        assert!(b < a, "section order must survive serialization: {json}");
    }
}
