//! Body line classification and rendering.
//!
//! Each body line is matched against an ordered rule table; the first rule
//! whose predicate accepts the line draws it. Two tables exist: the generic
//! one and the approval-letter one, which adds a boxed refundable notice and
//! vocabulary-based section headings. Both share the wrap and measure
//! primitives of the parent module.
//!
//! Every handler takes the top of the current line box and returns the top
//! of the next one, so the vertical cursor is threaded explicitly.

use super::{
    financial_tokens, has_financial_token, segment_financial, wrap_text, Token, WrappedLine,
};
use crate::config::{PageGeometry, Typography};
use crate::model::DocumentFamily;
use crate::position::Point;
use crate::style::{palette, Color, FontSpec};
use crate::surface::{Rect, Surface};

/// Visual role of one body line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineKind {
    Spacer,
    Notice,
    LabelValue,
    Heading,
    Bullet,
    Financial,
    Paragraph,
}

/// What a predicate may know besides the line itself.
#[derive(Debug, Clone, Copy)]
pub struct LineContext {
    pub index: usize,
    pub previous: Option<LineKind>,
}

/// Geometry and type sizes for body text.
#[derive(Debug, Clone, Copy)]
pub struct BodyStyle {
    pub left: f32,
    pub width: f32,
    pub font_size: f32,
    pub line_height: f32,
    pub heading_size: f32,
}

impl BodyStyle {
    pub fn new(page: &PageGeometry, typography: &Typography) -> Self {
        Self {
            left: page.margin_left,
            width: page.content_width(),
            font_size: typography.body_size,
            line_height: typography.line_height,
            heading_size: typography.heading_size,
        }
    }

    fn regular(&self) -> FontSpec {
        FontSpec::regular(self.font_size)
    }

    fn bold(&self) -> FontSpec {
        FontSpec::bold(self.font_size)
    }

    /// Top of the text inside a line box for `size`.
    fn text_top(&self, y: f32, size: f32) -> f32 {
        y + (self.line_height - size) / 2.0
    }
}

type Predicate = fn(&str, &LineContext) -> bool;
type Handler = fn(&mut dyn Surface, &str, &BodyStyle, f32) -> f32;

struct Rule {
    kind: LineKind,
    matches: Predicate,
    draw: Handler,
}

/// An ordered rule table. First match wins; the last rule always matches.
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn generic() -> Self {
        Self {
            rules: vec![
                Rule {
                    kind: LineKind::Spacer,
                    matches: is_blank,
                    draw: draw_spacer,
                },
                Rule {
                    kind: LineKind::LabelValue,
                    matches: is_labeled_identifier,
                    draw: draw_label_value,
                },
                Rule {
                    kind: LineKind::Heading,
                    matches: is_heading,
                    draw: draw_heading,
                },
                Rule {
                    kind: LineKind::Bullet,
                    matches: is_bullet,
                    draw: draw_bullet,
                },
                Rule {
                    kind: LineKind::Financial,
                    matches: is_financial,
                    draw: draw_financial,
                },
                Rule {
                    kind: LineKind::LabelValue,
                    matches: is_short_label_pair,
                    draw: draw_label_value,
                },
                Rule {
                    kind: LineKind::Paragraph,
                    matches: always,
                    draw: draw_paragraph,
                },
            ],
        }
    }

    pub fn approval_letter() -> Self {
        Self {
            rules: vec![
                Rule {
                    kind: LineKind::Spacer,
                    matches: is_blank,
                    draw: draw_spacer,
                },
                Rule {
                    kind: LineKind::Notice,
                    matches: is_refundable_notice,
                    draw: draw_notice,
                },
                Rule {
                    kind: LineKind::LabelValue,
                    matches: is_labeled_identifier,
                    draw: draw_label_value,
                },
                Rule {
                    kind: LineKind::Heading,
                    matches: is_section_title,
                    draw: draw_heading,
                },
                Rule {
                    kind: LineKind::Bullet,
                    matches: is_bullet,
                    draw: draw_bullet,
                },
                Rule {
                    kind: LineKind::Financial,
                    matches: is_financial,
                    draw: draw_financial,
                },
                Rule {
                    kind: LineKind::LabelValue,
                    matches: is_short_label_pair,
                    draw: draw_label_value,
                },
                Rule {
                    kind: LineKind::Paragraph,
                    matches: always,
                    draw: draw_paragraph,
                },
            ],
        }
    }

    pub fn for_family(family: DocumentFamily) -> Self {
        match family {
            DocumentFamily::ApprovalLetter => Self::approval_letter(),
            DocumentFamily::Generic => Self::generic(),
        }
    }

    fn rule_for(&self, line: &str, ctx: &LineContext) -> &Rule {
        self.rules
            .iter()
            .find(|rule| (rule.matches)(line, ctx))
            .unwrap_or_else(|| &self.rules[self.rules.len() - 1])
    }

    pub fn classify(&self, line: &str, ctx: &LineContext) -> LineKind {
        self.rule_for(line, ctx).kind
    }

    /// Lay out a whole body starting at `start_y`. Returns the kinds in line
    /// order and the cursor below the last line.
    pub fn layout(
        &self,
        surface: &mut dyn Surface,
        body: &str,
        style: &BodyStyle,
        start_y: f32,
    ) -> BodyLayout {
        let mut y = start_y;
        let mut kinds = Vec::new();
        let mut previous = None;

        for (index, raw) in body.lines().enumerate() {
            let line = raw.trim_end();
            let ctx = LineContext { index, previous };
            let rule = self.rule_for(line, &ctx);
            y = (rule.draw)(surface, line.trim_start(), style, y);
            kinds.push(rule.kind);
            previous = Some(rule.kind);
        }

        let count = |kind: LineKind| kinds.iter().filter(|k| **k == kind).count();
        tracing::debug!(
            lines = kinds.len(),
            headings = count(LineKind::Heading),
            bullets = count(LineKind::Bullet),
            financial = count(LineKind::Financial),
            label_values = count(LineKind::LabelValue),
            notices = count(LineKind::Notice),
            end_y = y,
            "laid out body"
        );
        BodyLayout { kinds, end_y: y }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BodyLayout {
    pub kinds: Vec<LineKind>,
    pub end_y: f32,
}

// ─── Vocabularies ───────────────────────────────────────────────

/// Labels whose value is an identifier or code.
const IDENTIFIER_LABELS: &[&str] = &[
    "application no",
    "application number",
    "application id",
    "loan id",
    "loan no",
    "loan account no",
    "loan account number",
    "account no",
    "account number",
    "a/c no",
    "ifsc",
    "ifsc code",
    "upi id",
    "reference no",
    "ref no",
    "customer id",
    "sanction no",
];

/// Headings recognized verbatim by the generic rule set.
const SECTION_HEADINGS: &[&str] = &[
    "Loan Details",
    "Loan Summary",
    "Bank Details",
    "Repayment Details",
    "Terms and Conditions",
    "Terms & Conditions",
    "Important Notes",
    "Documents Required",
];

/// Section titles of the approval letter, matched case-insensitively.
const APPROVAL_SECTIONS: &[&str] = &[
    "loan details",
    "loan summary",
    "sanction details",
    "approval details",
    "applicant details",
    "repayment details",
    "repayment schedule",
    "emi details",
    "bank details",
    "disbursement details",
    "payment details",
    "processing charges",
    "charges and fees",
    "terms and conditions",
    "terms & conditions",
    "important notes",
    "documents required",
    "next steps",
];

const BULLET_GLYPH: &str = "•";
const CURRENCY_SYMBOLS: &[char] = &['₹', '$', '€', '£', '%'];

// ─── Predicates ─────────────────────────────────────────────────

fn always(_line: &str, _ctx: &LineContext) -> bool {
    true
}

fn is_blank(line: &str, _ctx: &LineContext) -> bool {
    line.trim().is_empty()
}

fn is_labeled_identifier(line: &str, _ctx: &LineContext) -> bool {
    let Some((label, _)) = line.trim().split_once(':') else {
        return false;
    };
    let label = label.trim().trim_end_matches('.').to_lowercase();
    IDENTIFIER_LABELS.contains(&label.as_str())
}

fn is_upper_heading(text: &str) -> bool {
    text.chars().count() > 3
        && text.chars().any(char::is_alphabetic)
        && !text.chars().any(|c| c.is_lowercase() || c.is_ascii_digit())
        && !text.contains(CURRENCY_SYMBOLS)
}

fn is_heading(line: &str, _ctx: &LineContext) -> bool {
    let text = line.trim();
    SECTION_HEADINGS.contains(&text) || is_upper_heading(text)
}

/// Strip a leading "1." / "2)" style ordinal.
fn strip_ordinal(text: &str) -> &str {
    let digits = text.chars().take_while(char::is_ascii_digit).count();
    if digits == 0 {
        return text;
    }
    let rest = &text[digits..];
    match rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
        Some(after) => after.trim_start(),
        None => text,
    }
}

fn is_section_title(line: &str, _ctx: &LineContext) -> bool {
    let text = line.trim();
    let normalized = strip_ordinal(text).trim_end_matches(':').trim().to_lowercase();
    APPROVAL_SECTIONS.contains(&normalized.as_str()) || is_upper_heading(text)
}

/// The marker and the remainder of a bullet line.
fn split_bullet(line: &str) -> Option<&str> {
    let text = line.trim_start();
    let mut chars = text.chars();
    let marker = chars.next()?;
    let rest = chars.as_str();
    match marker {
        '•' | '●' | '▪' | '◦' => Some(rest.trim_start()),
        '-' | '*' | '–' if rest.starts_with(char::is_whitespace) => Some(rest.trim_start()),
        _ => None,
    }
}

fn is_bullet(line: &str, _ctx: &LineContext) -> bool {
    split_bullet(line).is_some()
}

fn is_financial(line: &str, _ctx: &LineContext) -> bool {
    has_financial_token(line)
}

fn is_short_label_pair(line: &str, _ctx: &LineContext) -> bool {
    let Some((label, value)) = line.trim().split_once(':') else {
        return false;
    };
    let label = label.trim();
    !label.is_empty() && !value.trim().is_empty() && label.chars().count() < 40
}

fn is_refundable_notice(line: &str, _ctx: &LineContext) -> bool {
    line.to_lowercase().contains("refundable")
}

// ─── Handlers ───────────────────────────────────────────────────

fn draw_spacer(_surface: &mut dyn Surface, _line: &str, style: &BodyStyle, y: f32) -> f32 {
    y + style.line_height * 0.4
}

/// Bold label, then the value in bold on a highlight. One line, no wrap.
fn draw_label_value(surface: &mut dyn Surface, line: &str, style: &BodyStyle, y: f32) -> f32 {
    let (label, value) = line.split_once(':').unwrap_or((line, ""));
    let label = format!("{}:", label.trim());
    let value = value.trim();
    let bold = style.bold();
    let top = style.text_top(y, style.font_size);

    surface.fill_text(&label, style.left, top, &bold, palette::LABEL);
    if !value.is_empty() {
        let x = style.left + surface.measure_text(&label, &bold) + surface.measure_text(" ", &bold);
        let width = surface.measure_text(value, &bold);
        draw_highlight(surface, x, top, width, style.font_size);
        surface.fill_text(value, x, top, &bold, palette::VALUE);
    }
    y + style.line_height
}

fn draw_heading(surface: &mut dyn Surface, line: &str, style: &BodyStyle, y: f32) -> f32 {
    let text = line.trim();
    let font = FontSpec::bold(style.heading_size);
    let top = style.text_top(y, style.heading_size);
    surface.fill_text(text, style.left, top, &font, palette::HEADING);

    let width = surface.measure_text(text, &font);
    let rule_y = top + style.heading_size + 3.0;
    surface.stroke_line(
        Point { x: style.left, y: rule_y },
        Point {
            x: style.left + width,
            y: rule_y,
        },
        palette::RULE,
        1.0,
    );
    y + style.line_height + 6.0
}

fn draw_bullet(surface: &mut dyn Surface, line: &str, style: &BodyStyle, y: f32) -> f32 {
    let rest = split_bullet(line).unwrap_or(line);
    let font = style.regular();
    let indent = surface.measure_text(&format!("{}  ", BULLET_GLYPH), &font);

    surface.fill_text(
        BULLET_GLYPH,
        style.left,
        style.text_top(y, style.font_size),
        &font,
        palette::TEXT,
    );

    let lines = wrap_text(surface, rest, &font, style.width - indent);
    if lines.is_empty() {
        return y + style.line_height;
    }
    draw_plain_lines(surface, &lines, style.left + indent, style, y, palette::TEXT)
}

fn draw_financial(surface: &mut dyn Surface, line: &str, style: &BodyStyle, y: f32) -> f32 {
    let font = style.regular();
    let bold = style.bold();
    let tokens = financial_tokens(surface, line, &font, &bold);
    let total: f32 = tokens.iter().map(|t| t.width).sum();

    if total <= style.width {
        // Fits: one run per segment, label text keeps its spaces.
        let top = style.text_top(y, style.font_size);
        let mut x = style.left;
        for segment in segment_financial(line) {
            if segment.financial {
                let width = surface.measure_text(segment.text, &bold);
                draw_highlight(surface, x, top, width, style.font_size);
                surface.fill_text(segment.text, x, top, &bold, palette::FINANCIAL);
                x += width;
            } else {
                if !segment.text.trim().is_empty() {
                    surface.fill_text(segment.text, x, top, &font, palette::TEXT);
                }
                x += surface.measure_text(segment.text, &font);
            }
        }
        return y + style.line_height;
    }

    let mut y = y;
    for line in &super::wrap_tokens(tokens, style.width) {
        let top = style.text_top(y, style.font_size);
        let mut x = style.left;
        for token in &line.tokens {
            draw_token(surface, token, x, top, style);
            x += token.width;
        }
        y += style.line_height;
    }
    y
}

fn draw_token(surface: &mut dyn Surface, token: &Token, x: f32, top: f32, style: &BodyStyle) {
    if token.financial {
        draw_highlight(surface, x, top, token.width, style.font_size);
        surface.fill_text(&token.text, x, top, &style.bold(), palette::FINANCIAL);
    } else if !token.is_space() {
        surface.fill_text(&token.text, x, top, &style.regular(), palette::TEXT);
    }
}

fn draw_paragraph(surface: &mut dyn Surface, line: &str, style: &BodyStyle, y: f32) -> f32 {
    let lines = wrap_text(surface, line, &style.regular(), style.width);
    draw_plain_lines(surface, &lines, style.left, style, y, palette::TEXT)
}

/// The refundable notice: wrapped text inside a padded, bordered box.
fn draw_notice(surface: &mut dyn Surface, line: &str, style: &BodyStyle, y: f32) -> f32 {
    const PADDING: f32 = 10.0;
    let font = style.regular();
    let lines = wrap_text(surface, line.trim(), &font, style.width - 2.0 * PADDING);
    let box_rect = Rect::new(
        style.left,
        y,
        style.width,
        lines.len().max(1) as f32 * style.line_height + 2.0 * PADDING,
    );
    surface.fill_rect(box_rect, palette::NOTICE_FILL);
    surface.stroke_rect(box_rect, palette::NOTICE_BORDER, 1.0);
    draw_plain_lines(
        surface,
        &lines,
        style.left + PADDING,
        style,
        y + PADDING,
        palette::TEXT,
    );
    box_rect.bottom() + 6.0
}

fn draw_plain_lines(
    surface: &mut dyn Surface,
    lines: &[WrappedLine],
    x: f32,
    style: &BodyStyle,
    y: f32,
    color: Color,
) -> f32 {
    let font = style.regular();
    let mut y = y;
    for line in lines {
        surface.fill_text(&line.text(), x, style.text_top(y, style.font_size), &font, color);
        y += style.line_height;
    }
    y
}

fn draw_highlight(surface: &mut dyn Surface, x: f32, top: f32, width: f32, size: f32) {
    surface.fill_rect(
        Rect::new(x - 2.0, top - 2.0, width + 4.0, size + 4.0),
        palette::HIGHLIGHT,
    );
}
