use std::collections::BTreeMap;

use serde_json::{json, Value};

use crate::model::profile::Profile;

/// Render-time metadata merged into the context alongside the profile.
#[derive(Clone, Debug)]
pub struct RenderMeta {
    /// Pre-formatted creation date, e.g. `"30.08.2026"`.
    pub date_formatted: String,
}

fn s(v: &Option<String>) -> Value {
    Value::String(v.clone().unwrap_or_default())
}

/// Flattens a profile into the template context. Every optional field
/// surfaces as an empty string and every list field as an array, so the
/// result never contains null. The mapping is exhaustive and explicit:
/// a new profile field needs a new entry here before any template can
/// see it.
pub fn build_context(profile: &Profile, meta: &RenderMeta) -> BTreeMap<String, Value> {
    let mut ctx: BTreeMap<String, Value> = BTreeMap::new();

    ctx.insert("vorname".into(), json!(profile.first_name));
    ctx.insert("nachname".into(), json!(profile.last_name));
    ctx.insert("vollname".into(), json!(profile.full_name()));
    ctx.insert("titel".into(), s(&profile.title));
    ctx.insert("standort".into(), s(&profile.location));
    ctx.insert("verfuegbarkeit".into(), s(&profile.availability));
    ctx.insert("stundensatz".into(), s(&profile.rate));
    ctx.insert("zusammenfassung".into(), s(&profile.summary));

    ctx.insert("kernkompetenzen".into(), json!(profile.core_competencies));
    ctx.insert("technische_skills".into(), json!(profile.technical_skills));

    let experiences = |entries: &[crate::model::profile::Experience]| -> Value {
        Value::Array(
            entries
                .iter()
                .map(|e| {
                    json!({
                        "titel": e.title,
                        "unternehmen": e.organization.clone().unwrap_or_default(),
                        "zeitraum": e.period.clone().unwrap_or_default(),
                        "beschreibung": e.description.clone().unwrap_or_default(),
                        "technologien": e.technologies,
                        "highlights": e.highlights,
                    })
                })
                .collect(),
        )
    };
    ctx.insert("berufserfahrung".into(), experiences(&profile.experience));
    ctx.insert("projekte".into(), experiences(&profile.projects));

    ctx.insert(
        "ausbildung".into(),
        Value::Array(
            profile
                .education
                .iter()
                .map(|a| {
                    json!({
                        "abschluss": a.degree,
                        "institution": a.institution,
                        "zeitraum": a.period.clone().unwrap_or_default(),
                        "zusatz": a.note.clone().unwrap_or_default(),
                    })
                })
                .collect(),
        ),
    );
    ctx.insert(
        "zertifikate".into(),
        Value::Array(
            profile
                .certificates
                .iter()
                .map(|z| {
                    json!({
                        "name": z.name,
                        "aussteller": z.issuer.clone().unwrap_or_default(),
                        "jahr": z.year.clone().unwrap_or_default(),
                    })
                })
                .collect(),
        ),
    );
    ctx.insert(
        "sprachen".into(),
        Value::Array(
            profile
                .languages
                .iter()
                .map(|l| json!({"sprache": l.language, "niveau": l.proficiency}))
                .collect(),
        ),
    );

    ctx.insert("erstellt_datum".into(), json!(meta.date_formatted));
    ctx.insert("version".into(), json!(profile.version));
    ctx.insert("modus".into(), json!(profile.mode.as_str()));

    ctx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::profile::{Experience, Profile};

    fn meta() -> RenderMeta {
        RenderMeta {
            date_formatted: "30.08.2026".to_string(),
        }
    }

    fn assert_no_nulls(v: &Value) {
        match v {
            Value::Null => panic!("context must not contain null"),
            Value::Array(items) => items.iter().for_each(assert_no_nulls),
            Value::Object(map) => map.values().for_each(assert_no_nulls),
            _ => {}
        }
    }

    #[test]
    fn total_over_an_all_empty_profile() {
        let ctx = build_context(&Profile::default(), &meta());
        for v in ctx.values() {
            assert_no_nulls(v);
        }
        assert_eq!(ctx["titel"], "");
        assert_eq!(ctx["kernkompetenzen"], json!([]));
        assert_eq!(ctx["vollname"], "");
        assert_eq!(ctx["modus"], "standard");
        assert_eq!(ctx["version"], "1.0");
    }

    #[test]
    fn maps_the_worked_example() {
        let p = Profile {
            first_name: "Anna".into(),
            last_name: "Muster".into(),
            core_competencies: vec!["Go".into(), "Rust".into()],
            experience: vec![Experience {
                title: "Engineer".into(),
                organization: Some("ACME".into()),
                technologies: vec!["Go".into()],
                ..Default::default()
            }],
            ..Default::default()
        };
        let ctx = build_context(&p, &meta());
        assert_eq!(ctx["vollname"], "Anna Muster");
        assert_eq!(ctx["titel"], "");
        assert_eq!(ctx["kernkompetenzen"], json!(["Go", "Rust"]));

        let exp = &ctx["berufserfahrung"][0];
        assert_eq!(exp["unternehmen"], "ACME");
        assert_eq!(exp["zeitraum"], "");
        assert_eq!(exp["beschreibung"], "");
        assert_eq!(exp["highlights"], json!([]));
        assert_eq!(ctx["erstellt_datum"], "30.08.2026");
    }

    #[test]
    fn repeated_invocations_are_identical() {
        let p = Profile {
            first_name: "Max".into(),
            summary: Some("Backend".into()),
            ..Default::default()
        };
        let a = serde_json::to_vec(&build_context(&p, &meta())).unwrap();
        let b = serde_json::to_vec(&build_context(&p, &meta())).unwrap();
        assert_eq!(a, b);
    }
}
