//! Placeholder substitution.
//!
//! Binds a template's headline and body to the applicant's form values by
//! replacing literal `{{token}}` markers. There are no expressions, loops or
//! conditionals: a token is either one of the known field names, a
//! `custom:<label>` reference to a user-defined field, or something else
//! that is copied through untouched.
//!
//! Missing data never fails a render. A known token whose value is absent,
//! blank or (for numeric fields) non-positive becomes `[Display Name]` so the
//! gap stays visible on the page.

use crate::model::{parse_number, FormValues, RenderedText, Template};

/// Prefix of placeholders bound to user-defined fields.
pub const CUSTOM_PREFIX: &str = "custom:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    Text,
    /// Grouped, two decimals.
    Currency,
    /// Printed as entered, but only when positive.
    Number,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Name,
    LoanAmount,
    InterestRate,
    Tenure,
    MonthlyEmi,
    ProcessingCharge,
    AccountNumber,
    IfscCode,
    UpiId,
}

impl Field {
    const ALL: [Field; 9] = [
        Field::Name,
        Field::LoanAmount,
        Field::InterestRate,
        Field::Tenure,
        Field::MonthlyEmi,
        Field::ProcessingCharge,
        Field::AccountNumber,
        Field::IfscCode,
        Field::UpiId,
    ];

    fn key(self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::LoanAmount => "loanAmount",
            Field::InterestRate => "interestRate",
            Field::Tenure => "tenure",
            Field::MonthlyEmi => "monthlyEmi",
            Field::ProcessingCharge => "processingCharge",
            Field::AccountNumber => "accountNumber",
            Field::IfscCode => "ifscCode",
            Field::UpiId => "upiId",
        }
    }

    fn display_name(self) -> &'static str {
        match self {
            Field::Name => "Name",
            Field::LoanAmount => "Loan Amount",
            Field::InterestRate => "Interest Rate",
            Field::Tenure => "Tenure",
            Field::MonthlyEmi => "Monthly EMI",
            Field::ProcessingCharge => "Processing Charge",
            Field::AccountNumber => "Account Number",
            Field::IfscCode => "IFSC Code",
            Field::UpiId => "UPI ID",
        }
    }

    fn kind(self) -> FieldKind {
        match self {
            Field::LoanAmount | Field::MonthlyEmi | Field::ProcessingCharge => FieldKind::Currency,
            Field::InterestRate | Field::Tenure => FieldKind::Number,
            _ => FieldKind::Text,
        }
    }

    fn from_key(key: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|f| f.key() == key)
    }
}

/// Resolves tokens against one form record.
struct Bindings<'a> {
    values: &'a FormValues,
}

impl<'a> Bindings<'a> {
    fn new(values: &'a FormValues) -> Self {
        Self { values }
    }

    /// `None` for tokens that are not placeholders at all.
    fn resolve(&self, token: &str) -> Option<Resolved> {
        if let Some(label) = token.strip_prefix(CUSTOM_PREFIX) {
            let field = self.values.custom_fields.iter().find(|f| f.key == label)?;
            let value = field.value.trim();
            return Some(if value.is_empty() {
                Resolved::Fallback(fallback(label))
            } else {
                Resolved::Value(value.to_string())
            });
        }

        let field = Field::from_key(token)?;
        let bound = match field {
            Field::MonthlyEmi => self
                .values
                .monthly_emi
                .filter(|v| v.is_finite() && *v > 0.0)
                .map(format_currency),
            _ => bind(self.raw(field), field.kind()),
        };
        Some(match bound {
            Some(v) => Resolved::Value(v),
            None => Resolved::Fallback(fallback(field.display_name())),
        })
    }

    fn raw(&self, field: Field) -> &str {
        let v = self.values;
        match field {
            Field::Name => &v.name,
            Field::LoanAmount => &v.loan_amount,
            Field::InterestRate => &v.interest_rate,
            Field::Tenure => &v.tenure,
            Field::ProcessingCharge => &v.processing_charge,
            Field::AccountNumber => &v.account_number,
            Field::IfscCode => &v.ifsc_code,
            Field::UpiId => &v.upi_id,
            Field::MonthlyEmi => "",
        }
    }
}

enum Resolved {
    Value(String),
    Fallback(String),
}

fn bind(raw: &str, kind: FieldKind) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match kind {
        FieldKind::Text => Some(raw.to_string()),
        FieldKind::Currency => parse_number(raw)
            .filter(|v| *v > 0.0)
            .map(format_currency),
        FieldKind::Number => parse_number(raw)
            .filter(|v| *v > 0.0)
            .map(|_| raw.to_string()),
    }
}

fn fallback(display_name: &str) -> String {
    format!("[{}]", display_name)
}

/// Format an amount with three-digit comma grouping and two decimals.
pub fn format_currency(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((&fixed, "00"));

    let digits: Vec<char> = int_part.chars().collect();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*ch);
    }

    let sign = if amount < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac_part)
}

/// Substitution counters for one string, for logging.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SubstitutionStats {
    pub bound: usize,
    pub fallbacks: usize,
}

/// Replace every placeholder in `text` in a single left-to-right pass.
///
/// Inserted values are never re-scanned, so a value containing `{{…}}` is
/// emitted literally. Unknown tokens are copied verbatim.
pub fn substitute_str(text: &str, values: &FormValues) -> String {
    substitute_with_stats(text, &Bindings::new(values)).0
}

fn substitute_with_stats(text: &str, bindings: &Bindings<'_>) -> (String, SubstitutionStats) {
    let mut out = String::with_capacity(text.len());
    let mut stats = SubstitutionStats::default();
    let mut rest = text;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let resolved = after
            .find("}}")
            .and_then(|end| bindings.resolve(&after[..end]).map(|r| (end, r)));
        match resolved {
            Some((end, resolved)) => {
                match resolved {
                    Resolved::Value(v) => {
                        stats.bound += 1;
                        out.push_str(&v);
                    }
                    Resolved::Fallback(f) => {
                        stats.fallbacks += 1;
                        out.push_str(&f);
                    }
                }
                rest = &after[end + 2..];
            }
            None => {
                // Not a placeholder here; a match may still start one brace later.
                out.push('{');
                rest = &rest[start + 1..];
            }
        }
    }
    out.push_str(rest);
    (out, stats)
}

/// Bind a template's headline and body to the form values.
pub fn substitute(template: &Template, values: &FormValues) -> RenderedText {
    let bindings = Bindings::new(values);
    let (headline, h_stats) = substitute_with_stats(&template.headline, &bindings);
    let (body, b_stats) = substitute_with_stats(&template.body, &bindings);
    tracing::debug!(
        template = %template.name,
        bound = h_stats.bound + b_stats.bound,
        fallbacks = h_stats.fallbacks + b_stats.fallbacks,
        "substituted placeholders"
    );
    RenderedText { headline, body }
}

/// Every placeholder token a template can use with these values, in display
/// order. Custom fields contribute one token each (duplicates once).
pub fn placeholders(values: &FormValues) -> Vec<String> {
    let mut tokens: Vec<String> = Field::ALL
        .iter()
        .map(|f| format!("{{{{{}}}}}", f.key()))
        .collect();
    for field in &values.custom_fields {
        let token = format!("{{{{{}{}}}}}", CUSTOM_PREFIX, field.key);
        if !field.key.is_empty() && !tokens.contains(&token) {
            tokens.push(token);
        }
    }
    tokens
}
