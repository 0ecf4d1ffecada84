use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde_json::json;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use profilgen::analyze::structure::{extract_structure, extract_text, HEADER_KEY};
use profilgen::analyze::styles::extract_style_info;
use profilgen::docx::package::DocxPackage;
use profilgen::docx::reader::parse_docx;
use profilgen::error::ProfilError;
use profilgen::render::docx::render_docx;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
</Types>"#;

const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
<w:style w:type="paragraph" w:styleId="Ueberschrift1"><w:name w:val="Heading 1"/></w:style>
<w:style w:type="paragraph" w:styleId="Standard"><w:name w:val="Normal"/></w:style>
</w:styles>"#;

fn write_docx(path: &Path, body: &str) {
    let document = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
    );
    let mut zip = ZipWriter::new(File::create(path).unwrap());
    let opts = SimpleFileOptions::default();
    zip.start_file("[Content_Types].xml", opts).unwrap();
    zip.write_all(CONTENT_TYPES.as_bytes()).unwrap();
    zip.start_file("word/document.xml", opts).unwrap();
    zip.write_all(document.as_bytes()).unwrap();
    zip.start_file("word/styles.xml", opts).unwrap();
    zip.write_all(STYLES_XML.as_bytes()).unwrap();
    zip.finish().unwrap();
}

#[test]
fn parses_a_synthesized_resume() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lebenslauf.docx");
    write_docx(
        &path,
        r#"<w:p><w:r><w:t>Anna Muster, Senior Engineer</w:t></w:r></w:p>
<w:p><w:pPr><w:pStyle w:val="Ueberschrift1"/></w:pPr><w:r><w:rPr><w:b/><w:rFonts w:ascii="Arial"/><w:color w:val="1F4E79"/></w:rPr><w:t>Berufserfahrung</w:t></w:r></w:p>
<w:p><w:r><w:t>Backend-Entwicklung bei ACME</w:t></w:r></w:p>
<w:tbl><w:tr>
<w:tc><w:p><w:r><w:t>Sprachen</w:t></w:r></w:p></w:tc>
<w:tc><w:p><w:r><w:t>Deutsch, Englisch</w:t></w:r></w:p></w:tc>
</w:tr><w:tr>
<w:tc><w:p><w:r><w:t> </w:t></w:r></w:p></w:tc>
</w:tr></w:tbl>
<w:sectPr><w:pgMar w:top="1440" w:bottom="1440" w:left="1417" w:right="1417"/></w:sectPr>"#,
    );

    let doc = parse_docx(&path).unwrap();

    // Style ids resolve to display names via styles.xml.
    assert_eq!(doc.paragraphs[1].style.as_deref(), Some("Heading 1"));

    let text = extract_text(&doc);
    // 3 paragraphs + 1 non-empty table row; the all-empty row adds nothing.
    assert_eq!(text.lines().count(), 4);
    assert!(text.ends_with("Sprachen | Deutsch, Englisch"));

    let structure = extract_structure(&doc);
    assert_eq!(
        structure.get(HEADER_KEY),
        Some(&["Anna Muster, Senior Engineer".to_string()][..])
    );
    assert_eq!(
        structure.get("Berufserfahrung"),
        Some(&["Backend-Entwicklung bei ACME".to_string()][..])
    );

    let style = extract_style_info(&doc);
    assert_eq!(style.font_names, vec!["Arial"]);
    assert_eq!(style.colors, vec!["1F4E79"]);
    assert!(style.has_tables);
    assert_eq!(style.table_count, 1);
    let margins = style.margins_cm.unwrap();
    assert_eq!(margins.top, Some(2.54));
    assert_eq!(margins.left, Some(2.5));
}

#[test]
fn garbage_container_is_document_unreadable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("kaputt.docx");
    std::fs::write(&path, b"not a zip archive").unwrap();

    match parse_docx(&path) {
        Err(ProfilError::DocumentUnreadable(_)) => {}
        other => panic!("expected DocumentUnreadable, got {other:?}"),
    }
}

#[test]
fn renders_placeholders_into_a_template() {
    let dir = tempfile::tempdir().unwrap();
    let template = dir.path().join("vorlage.docx");
    write_docx(
        &template,
        r#"<w:p><w:r><w:t>{{vollname}} — {{titel}}</w:t></w:r></w:p>
<w:p><w:r><w:t>Skills: {{kernkompetenzen}}</w:t></w:r></w:p>"#,
    );

    let mut context: BTreeMap<String, serde_json::Value> = BTreeMap::new();
    context.insert("vollname".into(), json!("Anna Muster"));
    context.insert("titel".into(), json!("Senior Engineer"));
    context.insert("kernkompetenzen".into(), json!(["Go", "Rust"]));

    let output = dir.path().join("ausgabe.docx");
    render_docx(&template, &context, &output).unwrap();

    let rendered = parse_docx(&output).unwrap();
    let text = extract_text(&rendered);
    assert!(text.contains("Anna Muster — Senior Engineer"));
    assert!(text.contains("Skills: Go, Rust"));

    // Untouched parts survive byte-identical.
    let pkg = DocxPackage::read(&output).unwrap();
    assert_eq!(
        pkg.entry_bytes("[Content_Types].xml").unwrap(),
        CONTENT_TYPES.as_bytes()
    );
}
