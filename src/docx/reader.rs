use std::collections::HashMap;
use std::path::Path;

use crate::docx::package::DocxPackage;
use crate::docx::xml::{find_attr, parse_xml_part, XmlEvent, XmlPart};
use crate::error::{ProfilError, Result};

/// One formatted run inside a paragraph. Formatting attributes are only set
/// when the run carries them explicitly; theme-based or inherited values stay
/// `None`.
#[derive(Clone, Debug, Default)]
pub struct Run {
    pub text: String,
    pub bold: Option<bool>,
    pub size_pt: Option<f64>,
    pub font: Option<String>,
    pub color_hex: Option<String>,
}

#[derive(Clone, Debug)]
pub struct Paragraph {
    /// Concatenated run texts, untrimmed.
    pub text: String,
    /// Display name of the paragraph style (resolved via styles.xml), if any.
    pub style: Option<String>,
    pub runs: Vec<Run>,
}

/// A top-level table: rows of non-empty cell texts. Cells that trim to
/// empty are dropped at parse time; rows may end up empty.
#[derive(Clone, Debug, Default)]
pub struct Table {
    pub rows: Vec<Vec<String>>,
}

/// Page geometry of one `w:sectPr`, margins converted from twips to cm.
#[derive(Clone, Copy, Debug, Default)]
pub struct PageGeometry {
    pub top_cm: Option<f64>,
    pub bottom_cm: Option<f64>,
    pub left_cm: Option<f64>,
    pub right_cm: Option<f64>,
}

/// Ephemeral result of decoding one DOCX. Owned by the caller of
/// [`parse_docx`]; nothing is cached across calls.
#[derive(Clone, Debug, Default)]
pub struct ParsedDocument {
    /// Body paragraphs with non-whitespace text, in document order.
    /// Paragraphs inside table cells are not listed here.
    pub paragraphs: Vec<Paragraph>,
    pub tables: Vec<Table>,
    pub page_sections: Vec<PageGeometry>,
}

pub fn parse_docx(path: &Path) -> Result<ParsedDocument> {
    let pkg = DocxPackage::read(path)
        .map_err(|e| ProfilError::DocumentUnreadable(format!("{e:#}")))?;

    let doc_bytes = pkg
        .entry_bytes("word/document.xml")
        .ok_or_else(|| ProfilError::DocumentUnreadable("missing word/document.xml".to_string()))?;
    let doc = parse_xml_part("word/document.xml", doc_bytes)
        .map_err(|e| ProfilError::DocumentUnreadable(format!("word/document.xml: {e:#}")))?;

    // Style display names are best-effort: a broken styles.xml degrades to
    // raw style ids, never to a parse failure.
    let styles = match pkg.entry_bytes("word/styles.xml") {
        Some(bytes) => match parse_xml_part("word/styles.xml", bytes) {
            Ok(part) => style_names(&part),
            Err(err) => {
                log::debug!("styles.xml unreadable, keeping raw style ids: {err:#}");
                HashMap::new()
            }
        },
        None => HashMap::new(),
    };

    Ok(read_document(&doc, &styles))
}

/// Maps `w:styleId` to the style's display name (`w:name`), so heading
/// styles compare like python-docx names ("Heading 1", not "Heading1").
fn style_names(part: &XmlPart) -> HashMap<String, String> {
    let mut map: HashMap<String, String> = HashMap::new();
    let mut cur_id: Option<String> = None;
    for ev in &part.events {
        match ev {
            XmlEvent::Start { name, attrs } if name == "w:style" => {
                cur_id = find_attr(attrs, "w:styleId").map(|v| v.to_string());
            }
            XmlEvent::Start { name, attrs } | XmlEvent::Empty { name, attrs }
                if name == "w:name" =>
            {
                if let (Some(id), Some(val)) = (cur_id.as_ref(), find_attr(attrs, "w:val")) {
                    let val = val.trim();
                    if !val.is_empty() {
                        map.insert(id.clone(), val.to_string());
                    }
                }
            }
            XmlEvent::End { name } if name == "w:style" => {
                cur_id = None;
            }
            _ => {}
        }
    }
    map
}

#[derive(Default)]
struct ParaCapture {
    p_stack_len: usize,
    style_id: Option<String>,
    runs: Vec<Run>,
    ppr_stack_len: Option<usize>,
    hyperlink_stack_len: Option<usize>,
    run_stack_len: Option<usize>,
    rpr_stack_len: Option<usize>,
    wt_stack_len: Option<usize>,
}

impl ParaCapture {
    fn current_run(&mut self) -> Option<&mut Run> {
        if self.run_stack_len.is_some() {
            self.runs.last_mut()
        } else {
            None
        }
    }
}

struct CellCapture {
    paragraphs: Vec<String>,
    current: String,
}

fn parse_w_bool(attrs: &[(String, String)]) -> bool {
    if let Some(v) = find_attr(attrs, "w:val") {
        let s = v.trim().to_ascii_lowercase();
        return !(s == "0" || s == "false" || s == "off" || s == "none");
    }
    true
}

fn control_char(name: &str) -> Option<char> {
    match name {
        "w:tab" | "w:ptab" => Some('\t'),
        "w:cr" | "w:br" => Some('\n'),
        "w:noBreakHyphen" => Some('-'),
        _ => None,
    }
}

fn twips_to_cm(attrs: &[(String, String)], key: &str) -> Option<f64> {
    find_attr(attrs, key)
        .and_then(|v| v.trim().parse::<f64>().ok())
        .map(|twips| twips / 1440.0 * 2.54)
}

fn apply_run_property(run: &mut Run, name: &str, attrs: &[(String, String)]) {
    match name {
        "w:b" => run.bold = Some(parse_w_bool(attrs)),
        "w:sz" => {
            // Half-points on the wire.
            if let Some(v) = find_attr(attrs, "w:val").and_then(|v| v.trim().parse::<f64>().ok()) {
                run.size_pt = Some(v / 2.0);
            }
        }
        "w:rFonts" => {
            let font = find_attr(attrs, "w:ascii").or_else(|| find_attr(attrs, "w:hAnsi"));
            if let Some(f) = font {
                let f = f.trim();
                if !f.is_empty() {
                    run.font = Some(f.to_string());
                }
            }
        }
        "w:color" => {
            // Only explicit RGB values count; "auto" and theme references
            // are skipped so style aggregation sees real colors only.
            match find_attr(attrs, "w:val") {
                Some(v) if !v.trim().is_empty() && !v.trim().eq_ignore_ascii_case("auto") => {
                    run.color_hex = Some(v.trim().to_ascii_uppercase());
                }
                _ => log::debug!("run color without explicit RGB value, skipping"),
            }
        }
        _ => {}
    }
}

fn finalize_paragraph(
    out: &mut Vec<Paragraph>,
    cap: ParaCapture,
    styles: &HashMap<String, String>,
) {
    let text: String = cap.runs.iter().map(|r| r.text.as_str()).collect();
    if text.trim().is_empty() {
        return;
    }
    let style = cap
        .style_id
        .map(|id| styles.get(&id).cloned().unwrap_or(id));
    out.push(Paragraph {
        text,
        style,
        runs: cap.runs,
    });
}

fn read_document(doc: &XmlPart, styles: &HashMap<String, String>) -> ParsedDocument {
    let mut parsed = ParsedDocument::default();

    let mut stack: Vec<String> = Vec::new();
    let mut tbl_depth = 0usize;

    let mut capturing: Option<ParaCapture> = None;
    let mut table: Option<Table> = None;
    let mut row: Option<Vec<String>> = None;
    let mut cell: Option<CellCapture> = None;
    let mut cell_in_text = false;

    let mut sect: Option<PageGeometry> = None;

    for ev in &doc.events {
        match ev {
            XmlEvent::Start { name, attrs } => {
                let parent = stack.last().map(|s| s.as_str()).unwrap_or("");

                match name.as_str() {
                    "w:tbl" => {
                        if parent == "w:body" && tbl_depth == 0 {
                            table = Some(Table::default());
                        }
                        tbl_depth += 1;
                    }
                    "w:tr" if tbl_depth == 1 && parent == "w:tbl" => {
                        row = Some(Vec::new());
                    }
                    "w:tc" if tbl_depth == 1 && parent == "w:tr" => {
                        cell = Some(CellCapture {
                            paragraphs: Vec::new(),
                            current: String::new(),
                        });
                    }
                    "w:p" => {
                        if parent == "w:body" && tbl_depth == 0 {
                            capturing = Some(ParaCapture {
                                p_stack_len: stack.len() + 1,
                                ..Default::default()
                            });
                        }
                    }
                    "w:sectPr" if parent == "w:body" || parent == "w:pPr" => {
                        sect = Some(PageGeometry::default());
                    }
                    "w:t" if tbl_depth == 1 && cell.is_some() => {
                        cell_in_text = true;
                    }
                    _ => {}
                }

                if let Some(cap) = capturing.as_mut() {
                    capture_start(cap, name, attrs, parent, stack.len());
                }

                stack.push(name.clone());
            }
            XmlEvent::Empty { name, attrs } => {
                let parent = stack.last().map(|s| s.as_str()).unwrap_or("");

                if name == "w:pgMar" && parent == "w:sectPr" {
                    if let Some(g) = sect.as_mut() {
                        g.top_cm = twips_to_cm(attrs, "w:top");
                        g.bottom_cm = twips_to_cm(attrs, "w:bottom");
                        g.left_cm = twips_to_cm(attrs, "w:left");
                        g.right_cm = twips_to_cm(attrs, "w:right");
                    }
                } else if name == "w:sectPr" && (parent == "w:body" || parent == "w:pPr") {
                    parsed.page_sections.push(PageGeometry::default());
                }

                if let Some(cap) = capturing.as_mut() {
                    capture_start(cap, name, attrs, parent, stack.len());
                    // Empty elements close immediately.
                    capture_end(cap, name, stack.len() + 1);
                } else if tbl_depth == 1 {
                    if let (Some(c), Some(ch)) = (cell.as_mut(), control_char(name)) {
                        c.current.push(ch);
                    }
                }
            }
            XmlEvent::Text { text } | XmlEvent::CData { text } => {
                if let Some(cap) = capturing.as_mut() {
                    if cap.wt_stack_len.is_some() {
                        if let Some(run) = cap.current_run() {
                            run.text.push_str(text);
                        }
                    }
                } else if cell_in_text {
                    if let Some(c) = cell.as_mut() {
                        c.current.push_str(text);
                    }
                }
            }
            XmlEvent::End { name } => {
                if let Some(cap) = capturing.as_mut() {
                    capture_end(cap, name, stack.len());
                }

                match name.as_str() {
                    "w:p" => {
                        if let Some(cap) = capturing.take() {
                            finalize_paragraph(&mut parsed.paragraphs, cap, styles);
                        } else if tbl_depth == 1 {
                            if let Some(c) = cell.as_mut() {
                                c.paragraphs.push(std::mem::take(&mut c.current));
                            }
                        }
                    }
                    "w:t" => {
                        cell_in_text = false;
                    }
                    "w:tc" => {
                        if tbl_depth == 1 {
                            if let (Some(c), Some(r)) = (cell.take(), row.as_mut()) {
                                let text = c.paragraphs.join("\n");
                                let text = text.trim();
                                if !text.is_empty() {
                                    r.push(text.to_string());
                                }
                            }
                        }
                    }
                    "w:tr" => {
                        if tbl_depth == 1 {
                            if let (Some(r), Some(t)) = (row.take(), table.as_mut()) {
                                t.rows.push(r);
                            }
                        }
                    }
                    "w:tbl" => {
                        if tbl_depth > 0 {
                            tbl_depth -= 1;
                        }
                        if tbl_depth == 0 {
                            if let Some(t) = table.take() {
                                parsed.tables.push(t);
                            }
                        }
                    }
                    "w:sectPr" => {
                        if let Some(g) = sect.take() {
                            parsed.page_sections.push(g);
                        }
                    }
                    _ => {}
                }

                let _ = stack.pop();
            }
            _ => {}
        }
    }

    parsed
}

fn capture_start(
    cap: &mut ParaCapture,
    name: &str,
    attrs: &[(String, String)],
    parent: &str,
    stack_len: usize,
) {
    match name {
        "w:pPr" => {
            if parent == "w:p" && stack_len == cap.p_stack_len {
                cap.ppr_stack_len = Some(stack_len + 1);
            }
        }
        "w:pStyle" => {
            if cap.ppr_stack_len == Some(stack_len) && parent == "w:pPr" {
                if let Some(v) = find_attr(attrs, "w:val") {
                    let v = v.trim();
                    if !v.is_empty() {
                        cap.style_id = Some(v.to_string());
                    }
                }
            }
        }
        "w:hyperlink" => {
            if parent == "w:p" && stack_len == cap.p_stack_len {
                cap.hyperlink_stack_len = Some(stack_len + 1);
            }
        }
        "w:r" => {
            let direct = parent == "w:p" && stack_len == cap.p_stack_len;
            let in_link = parent == "w:hyperlink" && cap.hyperlink_stack_len == Some(stack_len);
            if direct || in_link {
                cap.runs.push(Run::default());
                cap.run_stack_len = Some(stack_len + 1);
            }
        }
        "w:rPr" => {
            if parent == "w:r" && cap.run_stack_len == Some(stack_len) {
                cap.rpr_stack_len = Some(stack_len + 1);
            }
        }
        "w:t" => {
            if parent == "w:r" && cap.run_stack_len == Some(stack_len) {
                cap.wt_stack_len = Some(stack_len + 1);
            }
        }
        "w:b" | "w:sz" | "w:rFonts" | "w:color" => {
            if cap.rpr_stack_len == Some(stack_len) && parent == "w:rPr" {
                if let Some(run) = cap.current_run() {
                    apply_run_property(run, name, attrs);
                }
            }
        }
        "w:tab" | "w:ptab" | "w:cr" | "w:br" | "w:noBreakHyphen" => {
            if parent == "w:r" && cap.run_stack_len == Some(stack_len) {
                if let (Some(run), Some(ch)) = (cap.current_run(), control_char(name)) {
                    run.text.push(ch);
                }
            }
        }
        _ => {}
    }
}

fn capture_end(cap: &mut ParaCapture, name: &str, stack_len: usize) {
    match name {
        "w:t" => {
            if cap.wt_stack_len == Some(stack_len) {
                cap.wt_stack_len = None;
            }
        }
        "w:rPr" => {
            if cap.rpr_stack_len == Some(stack_len) {
                cap.rpr_stack_len = None;
            }
        }
        "w:r" => {
            if cap.run_stack_len == Some(stack_len) {
                cap.run_stack_len = None;
            }
        }
        "w:hyperlink" => {
            if cap.hyperlink_stack_len == Some(stack_len) {
                cap.hyperlink_stack_len = None;
                cap.run_stack_len = None;
            }
        }
        "w:pPr" => {
            if cap.ppr_stack_len == Some(stack_len) {
                cap.ppr_stack_len = None;
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::read_document;
    use crate::docx::xml::parse_xml_part;

    fn parse(body: &str, styles: &[(&str, &str)]) -> super::ParsedDocument {
        let xml = format!(
            r#"<?xml version="1.0"?><w:document><w:body>{body}</w:body></w:document>"#
        );
        let part = parse_xml_part("word/document.xml", xml.as_bytes()).expect("parse");
        let styles: HashMap<String, String> = styles
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        read_document(&part, &styles)
    }

    #[test]
    fn collects_body_paragraphs_with_run_formatting() {
        let doc = parse(
            r#"<w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr>
                 <w:r><w:rPr><w:b/><w:sz w:val="28"/><w:rFonts w:ascii="Arial"/><w:color w:val="1F4E79"/></w:rPr>
                   <w:t>Berufserfahrung</w:t></w:r></w:p>
               <w:p><w:r><w:t>Senior Engineer bei ACME</w:t></w:r></w:p>
               <w:p><w:r><w:t>   </w:t></w:r></w:p>"#,
            &[("Heading1", "Heading 1")],
        );

        assert_eq!(doc.paragraphs.len(), 2, "blank paragraph must be dropped");
        let h = &doc.paragraphs[0];
        assert_eq!(h.text, "Berufserfahrung");
        assert_eq!(h.style.as_deref(), Some("Heading 1"));
        let run = &h.runs[0];
        assert_eq!(run.bold, Some(true));
        assert_eq!(run.size_pt, Some(14.0));
        assert_eq!(run.font.as_deref(), Some("Arial"));
        assert_eq!(run.color_hex.as_deref(), Some("1F4E79"));

        assert_eq!(doc.paragraphs[1].style, None);
        assert_eq!(doc.paragraphs[1].runs[0].bold, None);
    }

    #[test]
    fn explicit_bold_off_is_not_bold() {
        let doc = parse(
            r#"<w:p><w:r><w:rPr><w:b w:val="0"/></w:rPr><w:t>Fliesstext</w:t></w:r></w:p>"#,
            &[],
        );
        assert_eq!(doc.paragraphs[0].runs[0].bold, Some(false));
    }

    #[test]
    fn auto_color_is_skipped() {
        let doc = parse(
            r#"<w:p><w:r><w:rPr><w:color w:val="auto"/></w:rPr><w:t>x</w:t></w:r></w:p>"#,
            &[],
        );
        assert_eq!(doc.paragraphs[0].runs[0].color_hex, None);
    }

    #[test]
    fn table_cells_are_collected_and_empty_cells_dropped() {
        let doc = parse(
            r#"<w:tbl><w:tr>
                 <w:tc><w:p><w:r><w:t>Sprachen</w:t></w:r></w:p></w:tc>
                 <w:tc><w:p><w:r><w:t> </w:t></w:r></w:p></w:tc>
                 <w:tc><w:p><w:r><w:t>Deutsch, Englisch</w:t></w:r></w:p></w:tc>
               </w:tr></w:tbl>"#,
            &[],
        );
        assert_eq!(doc.tables.len(), 1);
        assert_eq!(
            doc.tables[0].rows,
            vec![vec!["Sprachen".to_string(), "Deutsch, Englisch".to_string()]]
        );
        // Cell paragraphs stay out of the body paragraph list.
        assert!(doc.paragraphs.is_empty());
    }

    #[test]
    fn margins_convert_from_twips_to_cm() {
        let doc = parse(
            r#"<w:p><w:r><w:t>x</w:t></w:r></w:p>
               <w:sectPr><w:pgMar w:top="1440" w:bottom="1440" w:left="720" w:right="720"/></w:sectPr>"#,
            &[],
        );
        assert_eq!(doc.page_sections.len(), 1);
        let g = &doc.page_sections[0];
        assert!((g.top_cm.unwrap() - 2.54).abs() < 1e-9);
        assert!((g.left_cm.unwrap() - 1.27).abs() < 1e-9);
    }

    #[test]
    fn hyperlink_runs_contribute_text() {
        let doc = parse(
            r#"<w:p><w:r><w:t>Siehe </w:t></w:r>
               <w:hyperlink><w:r><w:t>profil.example.de</w:t></w:r></w:hyperlink></w:p>"#,
            &[],
        );
        assert_eq!(doc.paragraphs[0].text, "Siehe profil.example.de");
        assert_eq!(doc.paragraphs[0].runs.len(), 2);
    }
}
