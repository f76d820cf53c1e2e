//! # Document Model
//!
//! The input representation for the pipeline: a template (headline, body and
//! overlay descriptors) and the applicant's form values. Both arrive as JSON
//! from the form and template collaborators and are deserialized leniently:
//! every overlay block and field has a default, and a missing or blank image
//! reference means the overlay is disabled.

use serde::{Deserialize, Deserializer, Serialize};

use crate::position::Position;
use crate::style::Color;

/// Name of the flagship template family, which gets the extended layout
/// rule set.
pub const APPROVAL_LETTER: &str = "Loan Approval Letter";

/// A named document definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Template {
    /// Logical document name. Also selects the layout family.
    pub name: String,
    pub headline: String,
    pub body: String,
    pub background: Option<Background>,
    pub watermark: Option<Watermark>,
    pub seal: Option<Stamp>,
    pub signature: Option<Stamp>,
}

impl Template {
    pub fn new(name: &str, headline: &str, body: &str) -> Self {
        Self {
            name: name.to_string(),
            headline: headline.to_string(),
            body: body.to_string(),
            ..Default::default()
        }
    }

    pub fn family(&self) -> DocumentFamily {
        DocumentFamily::from_name(&self.name)
    }
}

/// Which body rule set a template is laid out with. A closed two-way choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFamily {
    ApprovalLetter,
    Generic,
}

impl DocumentFamily {
    pub fn from_name(name: &str) -> Self {
        if name == APPROVAL_LETTER {
            DocumentFamily::ApprovalLetter
        } else {
            DocumentFamily::Generic
        }
    }
}

/// How the background image is stretched onto the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitMode {
    /// Uniform scale until the page is covered, centered and cropped.
    #[default]
    Cover,
    /// Uniform scale until the image fits, centered.
    Contain,
    /// Anisotropic stretch to the exact page size.
    Fill,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Background {
    pub image: String,
    /// 0.0..=1.0
    pub opacity: f32,
    pub fit: FitMode,
}

impl Default for Background {
    fn default() -> Self {
        Self {
            image: String::new(),
            opacity: 1.0,
            fit: FitMode::Cover,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Watermark {
    pub text: String,
    /// Takes precedence over `text` when set.
    pub image: String,
    /// 0.0..=1.0
    pub opacity: f32,
    /// Font size for text, width for images, in layout units.
    pub size: f32,
    /// Clockwise rotation in degrees.
    pub rotation: f32,
    pub position: Position,
    pub color: Color,
}

impl Default for Watermark {
    fn default() -> Self {
        Self {
            text: String::new(),
            image: String::new(),
            opacity: 0.1,
            size: 80.0,
            rotation: -45.0,
            position: Position::Center,
            color: Color::hex("#888888"),
        }
    }
}

/// A seal or signature image.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Stamp {
    pub image: String,
    /// Rendered width in layout units.
    pub size: f32,
    pub position: Position,
    /// 0..=100
    pub opacity: f32,
}

impl Default for Stamp {
    fn default() -> Self {
        Self {
            image: String::new(),
            size: 120.0,
            position: Position::BottomRight,
            opacity: 100.0,
        }
    }
}

/// `Some(reference)` when the reference names an image, `None` for the
/// disabled state.
pub fn image_ref(reference: &str) -> Option<&str> {
    let trimmed = reference.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// The applicant/loan record bound into a template.
///
/// Numeric fields are kept as the strings the form produced; the
/// substitution engine decides how each is displayed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormValues {
    #[serde(deserialize_with = "string_or_number")]
    pub name: String,
    #[serde(deserialize_with = "string_or_number")]
    pub loan_amount: String,
    #[serde(deserialize_with = "string_or_number")]
    pub interest_rate: String,
    /// Years.
    #[serde(deserialize_with = "string_or_number")]
    pub tenure: String,
    #[serde(deserialize_with = "string_or_number")]
    pub processing_charge: String,
    #[serde(deserialize_with = "string_or_number")]
    pub account_number: String,
    #[serde(deserialize_with = "string_or_number")]
    pub ifsc_code: String,
    #[serde(deserialize_with = "string_or_number")]
    pub upi_id: String,
    pub custom_fields: Vec<CustomField>,
    /// Derived monthly installment. Filled by [`FormValues::with_computed_emi`]
    /// or by the caller.
    pub monthly_emi: Option<f64>,
}

impl FormValues {
    /// Fill `monthly_emi` from the form's own loan amount, rate and tenure.
    /// Leaves it untouched when those don't parse to positive numbers.
    pub fn with_computed_emi(mut self) -> Self {
        let principal = parse_number(&self.loan_amount);
        let rate = parse_number(&self.interest_rate);
        let years = parse_number(&self.tenure);
        if let (Some(p), Some(r), Some(y)) = (principal, rate, years) {
            if let Some(emi) = crate::emi::monthly_installment(p, r, y) {
                self.monthly_emi = Some(emi);
            }
        }
        self
    }
}

/// A user-defined `{key, value}` pair, bound to `{{custom:<key>}}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomField {
    pub key: String,
    #[serde(deserialize_with = "string_or_number")]
    pub value: String,
}

impl CustomField {
    pub fn new(key: &str, value: &str) -> Self {
        Self {
            key: key.to_string(),
            value: value.to_string(),
        }
    }
}

/// Output of substitution. Placeholder-free, recomputed per render.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenderedText {
    pub headline: String,
    pub body: String,
}

/// Parse a form number, tolerating grouping commas and surrounding blanks.
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s,
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    })
}
