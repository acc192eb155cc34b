//! Final assembly: dedup, re-homing, condition merging, and invariant
//! enforcement over the matched candidates.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::models::field::{Control, Field, InsuranceScope, Section};
use crate::scan::FieldCandidate;
use crate::scan::title::normalize_for_match;

/// Key/title fragments that pin a field to the insurance section wherever
/// the scan happened to place it.
const INSURANCE_SIGNALS: &[&str] = &[
    "insurance", "subscriber", "carrier", "policy", "group number", "insured",
];

/// Keys that belong in patient information when the scan left them in the
/// general section.
const PATIENT_KEYS: &[&str] = &[
    "first_name", "last_name", "full_name", "date_of_birth", "ssn", "gender",
    "marital_status",
];

/// Consolidate matched candidates into the final field sequence.
///
/// Returns the ordered fields plus non-blocking validation warnings.
pub fn consolidate(candidates: Vec<FieldCandidate>) -> (Vec<Field>, Vec<String>) {
    let mut fields: Vec<Field> = candidates.into_iter().map(FieldCandidate::into_field).collect();

    rehome_sections(&mut fields);
    merge_condition_collectors(&mut fields);
    enforce_signature(&mut fields);
    enforce_unique_keys(&mut fields);

    let warnings = validate(&fields);
    (fields, warnings)
}

/// Strong key/title signals override the scanned section.
fn rehome_sections(fields: &mut [Field]) {
    for field in fields.iter_mut() {
        let (base, scope) = InsuranceScope::strip(&field.key);
        let haystack = format!(
            "{} {}",
            base.replace('_', " "),
            normalize_for_match(&field.title)
        );

        if field.section != Section::Insurance
            && (scope != InsuranceScope::None
                || INSURANCE_SIGNALS.iter().any(|s| haystack.contains(s)))
        {
            debug!(key = %field.key, from = %field.section, "re-homing to Insurance");
            field.section = Section::Insurance;
            continue;
        }

        if field.section == Section::General
            && scope == InsuranceScope::None
            && PATIENT_KEYS.contains(&base)
        {
            debug!(key = %field.key, "re-homing to Patient Information");
            field.section = Section::PatientInformation;
        }
    }
}

/// Merge partial condition multi-selects within one medical-like section,
/// deduplicating options by normalized name.
fn merge_condition_collectors(fields: &mut Vec<Field>) {
    let mut first_by_section: HashMap<Section, usize> = HashMap::new();
    let mut merged: Vec<(usize, Vec<crate::models::field::Choice>)> = Vec::new();
    let mut drop: HashSet<usize> = HashSet::new();

    for (i, field) in fields.iter().enumerate() {
        if !field.section.is_medical_like() || !field.control.is_multi_select() {
            continue;
        }
        match first_by_section.get(&field.section) {
            None => {
                first_by_section.insert(field.section, i);
            }
            Some(&target) => {
                let options = field.control.options().unwrap_or_default().to_vec();
                merged.push((target, options));
                drop.insert(i);
            }
        }
    }

    for (target, options) in merged {
        if let Some(existing) = fields[target].control.options_mut() {
            existing.extend(options);
        }
    }

    if !drop.is_empty() {
        debug!(count = drop.len(), "merged partial condition collectors");
        let mut index = 0;
        fields.retain(|_| {
            let keep = !drop.contains(&index);
            index += 1;
            keep
        });
    }

    // Dedupe options inside every merge target.
    for field in fields.iter_mut() {
        if field.section.is_medical_like() && field.control.is_multi_select() {
            if let Some(options) = field.control.options_mut() {
                let mut seen = HashSet::new();
                options.retain(|o| seen.insert(normalize_for_match(&o.name)));
            }
        }
    }
}

/// Exactly one signature field, key fixed to `signature`.
fn enforce_signature(fields: &mut Vec<Field>) {
    let mut seen = false;
    fields.retain(|f| {
        if matches!(f.control, Control::Signature) {
            if seen {
                return false;
            }
            seen = true;
        }
        true
    });

    if let Some(signature) = fields
        .iter_mut()
        .find(|f| matches!(f.control, Control::Signature))
    {
        signature.key = "signature".to_string();
    } else {
        debug!("no signature found; synthesizing one");
        fields.push(Field::signature(Section::Authorization));
    }
}

/// Global key uniqueness: first occurrence wins, collisions get a numeric
/// suffix. The signature key is exempt (already unique by construction).
fn enforce_unique_keys(fields: &mut [Field]) {
    let mut seen: HashSet<String> = HashSet::new();
    // Tracks the latest rename of each original key so trailing
    // conditional fields keep pointing at their parent.
    let mut renames: HashMap<String, String> = HashMap::new();

    for field in fields.iter_mut() {
        if let Some(condition) = &mut field.condition {
            if let Some(new_key) = renames.get(&condition.key) {
                condition.key = new_key.clone();
            }
        }

        if matches!(field.control, Control::Signature) {
            seen.insert(field.key.clone());
            continue;
        }

        if seen.insert(field.key.clone()) {
            renames.remove(&field.key);
            continue;
        }

        let base = field.key.clone();
        let mut n = 2;
        while seen.contains(&format!("{base}_{n}")) {
            n += 1;
        }
        let unique = format!("{base}_{n}");
        debug!(key = %base, unique = %unique, "key collision");
        renames.insert(base, unique.clone());
        seen.insert(unique.clone());
        field.key = unique;
    }
}

/// Post-assembly validation: reports structural anomalies as warnings
/// without blocking output.
fn validate(fields: &[Field]) -> Vec<String> {
    let mut warnings = Vec::new();

    let signatures = fields
        .iter()
        .filter(|f| matches!(f.control, Control::Signature))
        .count();
    if signatures != 1 {
        warnings.push(format!("expected exactly one signature field, found {signatures}"));
    }

    for field in fields {
        if let Some(options) = field.control.options() {
            if options.is_empty() {
                warnings.push(format!("{}: option control with no options", field.key));
            }
            for option in options {
                if option.value.is_empty() {
                    warnings.push(format!(
                        "{}: option {:?} has an empty value",
                        field.key, option.name
                    ));
                }
            }
        }
        if field.title.trim().is_empty() && !matches!(field.control, Control::Signature) {
            warnings.push(format!("{}: empty title", field.key));
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::FormScanConfig;
    use crate::models::field::{Choice, InputKind};
    use crate::scan::ParseContext;

    fn input_candidate(title: &str, section: Section) -> FieldCandidate {
        let config = FormScanConfig::default();
        let mut ctx = ParseContext::new(&config);
        ctx.section = section;
        FieldCandidate::new(
            title,
            Control::Input {
                input_type: InputKind::Text,
            },
            &mut ctx,
            0,
        )
    }

    fn multi_candidate(title: &str, section: Section, names: &[&str]) -> FieldCandidate {
        let config = FormScanConfig::default();
        let mut ctx = ParseContext::new(&config);
        ctx.section = section;
        FieldCandidate::new(
            title,
            Control::Radio {
                options: names.iter().map(|n| Choice::tagged(*n)).collect(),
                multi: true,
            },
            &mut ctx,
            0,
        )
    }

    #[test]
    fn test_signature_synthesized_when_absent() {
        let (fields, warnings) = consolidate(vec![input_candidate("Comments", Section::General)]);

        let signatures: Vec<&Field> = fields
            .iter()
            .filter(|f| matches!(f.control, Control::Signature))
            .collect();
        assert_eq!(signatures.len(), 1);
        assert_eq!(signatures[0].key, "signature");
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_duplicate_signatures_keep_first() {
        let config = FormScanConfig::default();
        let ctx = ParseContext::new(&config);
        let first = FieldCandidate::with_key("signature", "Signature", Control::Signature, &ctx, 0);
        let second = FieldCandidate::with_key("signature", "Signature", Control::Signature, &ctx, 9);

        let (fields, _) = consolidate(vec![first, second]);
        let signatures = fields
            .iter()
            .filter(|f| matches!(f.control, Control::Signature))
            .count();
        assert_eq!(signatures, 1);
    }

    #[test]
    fn test_key_collisions_suffixed() {
        let (fields, _) = consolidate(vec![
            input_candidate("Phone", Section::General),
            input_candidate("Phone", Section::General),
            input_candidate("Phone", Section::General),
        ]);

        let keys: Vec<&str> = fields
            .iter()
            .filter(|f| !matches!(f.control, Control::Signature))
            .map(|f| f.key.as_str())
            .collect();
        assert_eq!(keys, vec!["phone", "phone_2", "phone_3"]);
    }

    #[test]
    fn test_insurance_rehoming() {
        let (fields, _) = consolidate(vec![input_candidate(
            "Insurance Company Name",
            Section::General,
        )]);
        assert_eq!(fields[0].section, Section::Insurance);
    }

    #[test]
    fn test_patient_rehoming_from_general() {
        let (fields, _) = consolidate(vec![input_candidate("Date of Birth", Section::General)]);
        assert_eq!(fields[0].section, Section::PatientInformation);
    }

    #[test]
    fn test_condition_collectors_merged() {
        let (fields, _) = consolidate(vec![
            multi_candidate(
                "Medical Conditions",
                Section::MedicalHistory,
                &["Diabetes", "Asthma"],
            ),
            input_candidate("Physician", Section::MedicalHistory),
            multi_candidate(
                "More Conditions",
                Section::MedicalHistory,
                &["Asthma", "Cancer"],
            ),
        ]);

        let collectors: Vec<&Field> = fields
            .iter()
            .filter(|f| f.control.is_multi_select())
            .collect();
        assert_eq!(collectors.len(), 1);

        let names: Vec<&str> = collectors[0]
            .control
            .options()
            .unwrap()
            .iter()
            .map(|o| o.name.as_str())
            .collect();
        assert_eq!(names, vec!["Diabetes", "Asthma", "Cancer"]);
    }

    #[test]
    fn test_empty_option_value_warned() {
        let config = FormScanConfig::default();
        let mut ctx = ParseContext::new(&config);
        let mut candidate = FieldCandidate::new(
            "Broken",
            Control::Radio {
                options: vec![Choice {
                    name: "Oops".to_string(),
                    value: crate::models::field::ChoiceValue::Tag(String::new()),
                }],
                multi: false,
            },
            &mut ctx,
            0,
        );
        candidate.section = Section::General;

        let (_, warnings) = consolidate(vec![candidate]);
        assert!(warnings.iter().any(|w| w.contains("empty value")));
    }
}
