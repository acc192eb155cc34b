//! Field descriptor models emitted by the parsing pipeline.

use serde::{Deserialize, Serialize};

/// Form sections recognized by the section tracker.
///
/// `General` is the default and always valid; the tracker moves to another
/// section when a heading line scores against its keyword table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Section {
    #[serde(rename = "General")]
    General,
    #[serde(rename = "Patient Information")]
    PatientInformation,
    #[serde(rename = "Contact Information")]
    ContactInformation,
    #[serde(rename = "Emergency Contact")]
    EmergencyContact,
    #[serde(rename = "Insurance")]
    Insurance,
    #[serde(rename = "Medical History")]
    MedicalHistory,
    #[serde(rename = "Dental History")]
    DentalHistory,
    #[serde(rename = "Medications")]
    Medications,
    #[serde(rename = "Authorization")]
    Authorization,
}

impl Section {
    /// All sections, in tie-break priority order.
    pub const ALL: [Section; 9] = [
        Section::General,
        Section::PatientInformation,
        Section::ContactInformation,
        Section::EmergencyContact,
        Section::Insurance,
        Section::MedicalHistory,
        Section::DentalHistory,
        Section::Medications,
        Section::Authorization,
    ];

    /// Display name, matching the serialized form.
    pub fn name(&self) -> &'static str {
        match self {
            Section::General => "General",
            Section::PatientInformation => "Patient Information",
            Section::ContactInformation => "Contact Information",
            Section::EmergencyContact => "Emergency Contact",
            Section::Insurance => "Insurance",
            Section::MedicalHistory => "Medical History",
            Section::DentalHistory => "Dental History",
            Section::Medications => "Medications",
            Section::Authorization => "Authorization",
        }
    }

    /// Sections whose content is dominated by condition checklists and
    /// checkbox grids.
    pub fn is_medical_like(&self) -> bool {
        matches!(
            self,
            Section::MedicalHistory | Section::DentalHistory | Section::Medications
        )
    }
}

impl Default for Section {
    fn default() -> Self {
        Section::General
    }
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Insurance scope carried by the parse context.
///
/// Disambiguates repeated insurance blocks: the same fields appear once for
/// the primary and once for the secondary policy, so keys get a
/// `__primary` / `__secondary` suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InsuranceScope {
    #[default]
    None,
    Primary,
    Secondary,
}

impl InsuranceScope {
    /// Key suffix for this scope, empty when no scope is active.
    pub fn suffix(&self) -> &'static str {
        match self {
            InsuranceScope::None => "",
            InsuranceScope::Primary => "__primary",
            InsuranceScope::Secondary => "__secondary",
        }
    }

    /// Append this scope's suffix to a base key.
    pub fn apply(&self, key: &str) -> String {
        match self {
            InsuranceScope::None => key.to_string(),
            _ => format!("{}{}", key, self.suffix()),
        }
    }

    /// Strip any scope suffix, returning the base key and the scope found.
    pub fn strip(key: &str) -> (&str, InsuranceScope) {
        if let Some(base) = key.strip_suffix("__primary") {
            (base, InsuranceScope::Primary)
        } else if let Some(base) = key.strip_suffix("__secondary") {
            (base, InsuranceScope::Secondary)
        } else {
            (key, InsuranceScope::None)
        }
    }
}

/// Input control subtypes, derived by keyword search over the cleaned title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    Name,
    Email,
    Phone,
    Ssn,
    Zip,
    Initials,
    Number,
    Text,
}

impl Default for InputKind {
    fn default() -> Self {
        InputKind::Text
    }
}

/// Date control subtypes (which direction the picker should open).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateKind {
    Past,
    Future,
}

/// The value behind a selectable option.
///
/// Yes/No options carry booleans; everything else carries a slug string.
/// Never empty: construction goes through [`Choice`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChoiceValue {
    Bool(bool),
    Tag(String),
}

impl ChoiceValue {
    /// Whether this value is empty or otherwise unusable.
    pub fn is_empty(&self) -> bool {
        match self {
            ChoiceValue::Bool(_) => false,
            ChoiceValue::Tag(s) => s.trim().is_empty(),
        }
    }
}

/// A single selectable option on a radio/dropdown control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    /// Display string.
    pub name: String,
    /// Stored value: boolean for Yes/No, slug string otherwise.
    pub value: ChoiceValue,
}

impl Choice {
    /// An affirmative Yes option.
    pub fn yes() -> Self {
        Self {
            name: "Yes".to_string(),
            value: ChoiceValue::Bool(true),
        }
    }

    /// A negative No option.
    pub fn no() -> Self {
        Self {
            name: "No".to_string(),
            value: ChoiceValue::Bool(false),
        }
    }

    /// An option whose value is the slug of its display name.
    pub fn tagged(name: impl Into<String>) -> Self {
        let name = name.into();
        let value = crate::scan::title::slugify(&name);
        Self {
            name,
            value: ChoiceValue::Tag(value),
        }
    }
}

/// Type-specific control configuration.
///
/// Serialized adjacently as `"type"` + `"control"`, so each field type's
/// payload shape is fixed at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "control", rename_all = "snake_case")]
pub enum Control {
    Input {
        input_type: InputKind,
    },
    Date {
        input_type: DateKind,
    },
    States,
    Radio {
        options: Vec<Choice>,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        multi: bool,
    },
    Dropdown {
        options: Vec<Choice>,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        multi: bool,
    },
    Terms {
        agree_text: String,
        html_text: String,
    },
    Signature,
}

impl Control {
    /// Type tag, matching the serialized `type` value.
    pub fn type_name(&self) -> &'static str {
        match self {
            Control::Input { .. } => "input",
            Control::Date { .. } => "date",
            Control::States => "states",
            Control::Radio { .. } => "radio",
            Control::Dropdown { .. } => "dropdown",
            Control::Terms { .. } => "terms",
            Control::Signature => "signature",
        }
    }

    /// Option list for radio/dropdown controls.
    pub fn options(&self) -> Option<&[Choice]> {
        match self {
            Control::Radio { options, .. } | Control::Dropdown { options, .. } => Some(options),
            _ => None,
        }
    }

    /// Mutable option list for radio/dropdown controls.
    pub fn options_mut(&mut self) -> Option<&mut Vec<Choice>> {
        match self {
            Control::Radio { options, .. } | Control::Dropdown { options, .. } => Some(options),
            _ => None,
        }
    }

    /// Whether this control is a multi-select option list.
    pub fn is_multi_select(&self) -> bool {
        matches!(
            self,
            Control::Radio { multi: true, .. } | Control::Dropdown { multi: true, .. }
        )
    }
}

/// Visibility link from a dependent field to its boolean parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldCondition {
    /// Key of the controlling field.
    pub key: String,
    /// Value of the controlling field that reveals this one.
    pub value: bool,
}

/// A finalized field descriptor, one element of the pipeline output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Globally unique key.
    pub key: String,

    /// Display title as parsed from the document.
    pub title: String,

    /// Owning section.
    pub section: Section,

    /// Whether the field may be left blank.
    #[serde(default)]
    pub optional: bool,

    /// Type tag plus type-specific configuration.
    #[serde(flatten)]
    pub control: Control,

    /// Present only on fields revealed by another field's value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<FieldCondition>,
}

impl Field {
    /// Create a field with no condition.
    pub fn new(
        key: impl Into<String>,
        title: impl Into<String>,
        section: Section,
        control: Control,
    ) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            section,
            optional: false,
            control,
            condition: None,
        }
    }

    /// The canonical synthesized signature field.
    pub fn signature(section: Section) -> Self {
        Self::new("signature", "Signature", section, Control::Signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_control_serializes_adjacently() {
        let field = Field::new(
            "gender",
            "Gender",
            Section::PatientInformation,
            Control::Radio {
                options: vec![Choice::tagged("Male"), Choice::tagged("Female")],
                multi: false,
            },
        );

        let json = serde_json::to_value(&field).unwrap();
        assert_eq!(json["type"], "radio");
        assert_eq!(json["control"]["options"][0]["name"], "Male");
        assert_eq!(json["control"]["options"][0]["value"], "male");
        assert_eq!(json["section"], "Patient Information");
        assert!(json.get("condition").is_none());
        assert!(json["control"].get("multi").is_none());
    }

    #[test]
    fn test_yes_no_values_are_booleans() {
        let json = serde_json::to_value(vec![Choice::yes(), Choice::no()]).unwrap();
        assert_eq!(json[0]["value"], true);
        assert_eq!(json[1]["value"], false);
    }

    #[test]
    fn test_field_round_trips() {
        let field = Field::new(
            "date_of_birth",
            "Date of Birth",
            Section::PatientInformation,
            Control::Date {
                input_type: DateKind::Past,
            },
        );

        let json = serde_json::to_string(&field).unwrap();
        let back: Field = serde_json::from_str(&json).unwrap();
        assert_eq!(back, field);
    }

    #[test]
    fn test_scope_suffix_round_trip() {
        let key = InsuranceScope::Secondary.apply("ssn");
        assert_eq!(key, "ssn__secondary");
        let (base, scope) = InsuranceScope::strip(&key);
        assert_eq!(base, "ssn");
        assert_eq!(scope, InsuranceScope::Secondary);
    }
}
