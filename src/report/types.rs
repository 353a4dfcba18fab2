use crate::Error;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Top-level medical image type. Selects a prompt family and report title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Cbc,
    Ecg,
    Xray,
    Microscopy,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Cbc,
        Category::Ecg,
        Category::Xray,
        Category::Microscopy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Cbc => "cbc",
            Category::Ecg => "ecg",
            Category::Xray => "xray",
            Category::Microscopy => "microscopy",
        }
    }

    /// Human-readable analysis type shown in the report body.
    pub fn display_name(&self, language: Language) -> &'static str {
        match (self, language) {
            (Category::Cbc, Language::En) => "Complete Blood Count (CBC)",
            (Category::Ecg, Language::En) => "Electrocardiogram (ECG)",
            (Category::Xray, Language::En) => "X-Ray Analysis",
            (Category::Microscopy, Language::En) => "Microscopy Analysis",
            (Category::Cbc, Language::Ar) => "صورة دم كاملة",
            (Category::Ecg, Language::Ar) => "تخطيط القلب",
            (Category::Xray, Language::Ar) => "تحليل الأشعة السينية",
            (Category::Microscopy, Language::Ar) => "التحليل المجهري",
        }
    }

    /// Filename stem for a downloaded report.
    pub fn file_stem(&self, language: Language) -> &'static str {
        match (self, language) {
            (Category::Cbc, Language::En) => "CBC_Report",
            (Category::Ecg, Language::En) => "ECG_Report",
            (Category::Xray, Language::En) => "XRay_Report",
            (Category::Microscopy, Language::En) => "Microscopy_Report",
            (Category::Cbc, Language::Ar) => "تقرير_صورة_دم",
            (Category::Ecg, Language::Ar) => "تقرير_تخطيط_قلب",
            (Category::Xray, Language::Ar) => "تقرير_أشعة",
            (Category::Microscopy, Language::Ar) => "تقرير_مجهري",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| {
                let valid: Vec<&str> = Category::ALL.iter().map(Category::as_str).collect();
                Error::invalid_input(format!(
                    "Invalid category. Must be one of: {}",
                    valid.join(", ")
                ))
            })
    }
}

/// Category as named by a PDF request. Names outside [`Category`] are kept
/// and rendered under their raw label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryLabel {
    Known(Category),
    Other(String),
}

const FALLBACK_FILE_STEM: &str = "Medical_Report";

impl CategoryLabel {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.parse::<Category>() {
            Ok(category) => Self::Known(category),
            Err(_) => Self::Other(raw.to_string()),
        }
    }

    pub fn known(&self) -> Option<Category> {
        match self {
            Self::Known(category) => Some(*category),
            Self::Other(_) => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Known(category) => category.as_str(),
            Self::Other(label) => label,
        }
    }

    /// Not HTML-safe for raw labels.
    pub fn display_name(&self, language: Language) -> &str {
        match self {
            Self::Known(category) => category.display_name(language),
            Self::Other(label) => label,
        }
    }

    /// Raw labels keep letters, digits, `-` and `_`; anything else becomes `_`.
    pub fn file_stem(&self, language: Language) -> String {
        match self {
            Self::Known(category) => category.file_stem(language).to_string(),
            Self::Other(label) => sanitize_stem(label, char::is_alphanumeric),
        }
    }

    /// ASCII-only stem for the plain `filename=` header parameter.
    pub fn ascii_file_stem(&self) -> String {
        match self {
            Self::Known(category) => category.file_stem(Language::En).to_string(),
            Self::Other(label) => sanitize_stem(label, |c| c.is_ascii_alphanumeric()),
        }
    }
}

fn sanitize_stem(label: &str, keep: impl Fn(char) -> bool) -> String {
    let stem: String = label
        .chars()
        .map(|c| if keep(c) || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if stem.chars().all(|c| c == '_') {
        FALLBACK_FILE_STEM.to_string()
    } else {
        stem
    }
}

impl From<Category> for CategoryLabel {
    fn from(category: Category) -> Self {
        Self::Known(category)
    }
}

impl fmt::Display for CategoryLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Ar,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Ar => "ar",
        }
    }

    pub fn is_rtl(&self) -> bool {
        matches!(self, Language::Ar)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Language::En),
            "ar" => Ok(Language::Ar),
            other => Err(Error::invalid_input(format!(
                "Invalid language '{}'. Must be one of: en, ar",
                other
            ))),
        }
    }
}

/// Arabic, Arabic Supplement and both presentation-form blocks.
pub fn is_arabic_script(c: char) -> bool {
    matches!(
        c,
        '\u{0600}'..='\u{06FF}' | '\u{0750}'..='\u{077F}' | '\u{FB50}'..='\u{FDFF}' | '\u{FE70}'..='\u{FEFF}'
    )
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Normal,
    Mild,
    Moderate,
    Severe,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Normal => "normal",
            Severity::Mild => "mild",
            Severity::Moderate => "moderate",
            Severity::Severe => "severe",
        }
    }

    /// Case-insensitive; `None` for anything outside the four tiers.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "normal" => Some(Severity::Normal),
            "mild" => Some(Severity::Mild),
            "moderate" => Some(Severity::Moderate),
            "severe" => Some(Severity::Severe),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of tabular lab values pulled out of the model text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub reference_range: String,
    /// Never computed from the value; always "normal" when extracted.
    #[serde(default = "default_status")]
    pub status: String,
}

impl Parameter {
    pub fn new(
        name: impl Into<String>,
        value: impl Into<String>,
        unit: impl Into<String>,
        reference_range: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            unit: unit.into(),
            reference_range: reference_range.into(),
            status: default_status(),
        }
    }
}

/// Parsed result of one model invocation.
///
/// `confidence` is a placeholder drawn from [90, 97], not a calibrated
/// certainty. See [`crate::report::ReportScorer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredReport {
    #[serde(rename = "analysis", default)]
    pub summary: String,
    #[serde(default, deserialize_with = "string_or_seq")]
    pub findings: Vec<String>,
    #[serde(default, deserialize_with = "string_or_seq")]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default, deserialize_with = "lenient_severity")]
    pub severity: Severity,
    #[serde(default = "default_confidence", deserialize_with = "lenient_confidence")]
    pub confidence: u8,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_category"
    )]
    pub category: Option<Category>,
}

fn default_status() -> String {
    "normal".to_string()
}

fn default_confidence() -> u8 {
    95
}

// Reports come back from clients on the PDF routes, so the scalar fields
// accept whatever shape the template could still print.

/// Unknown or non-string severities read as normal.
fn lenient_severity<'de, D>(deserializer: D) -> Result<Severity, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(label) => Severity::from_label(&label).unwrap_or_default(),
        _ => Severity::default(),
    })
}

/// Numbers are rounded and clamped to 0..=100; numeric strings (optionally
/// with a trailing `%`) are accepted; anything else takes the default.
fn lenient_confidence<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let number = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(number
        .filter(|n| n.is_finite())
        .map_or_else(default_confidence, |n| n.round().clamp(0.0, 100.0) as u8))
}

/// Unrecognised category names read as absent.
fn lenient_category<'de, D>(deserializer: D) -> Result<Option<Category>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(name) => name.parse().ok(),
        _ => None,
    })
}

/// Accepts either a JSON list of strings or a single string.
fn string_or_seq<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
    })
}
