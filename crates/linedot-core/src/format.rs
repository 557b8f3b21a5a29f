//! Value formatting strategies
//!
//! The host hands over per-column format strings (`"#"`, `"0.00%"`,
//! `"$#,0.000;($#,0.000);$#,0.000"`, `"MMM yyyy"`, ...). A
//! [`FormatterFactory`] turns them into [`ValueFormatter`] strategies.

use crate::{PrimitiveValue, ValueType, value::display_number};
use chrono::{DateTime, Utc};
use std::sync::Arc;

// ============================================================================
// STRATEGY PATTERN: Formatter traits
// ============================================================================

/// Strategy trait for formatting a host cell
pub trait ValueFormatter: Send + Sync {
    fn format(&self, value: &PrimitiveValue) -> String;

    fn format_number(&self, value: f64) -> String {
        self.format(&PrimitiveValue::Number(value))
    }
}

/// Shared formatter handle stored on the view model
pub type SharedFormatter = Arc<dyn ValueFormatter>;

/// Strategy trait for building formatters from column metadata
pub trait FormatterFactory {
    fn create(&self, format: Option<&str>, value_type: Option<ValueType>) -> SharedFormatter;
}

/// Default factory backed by [`PatternFormatter`]
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFormatterFactory;

impl FormatterFactory for DefaultFormatterFactory {
    fn create(&self, format: Option<&str>, value_type: Option<ValueType>) -> SharedFormatter {
        Arc::new(PatternFormatter::new(format, value_type))
    }
}

// ============================================================================
// PATTERN FORMATTER
// ============================================================================

/// Formats numbers with a numeric pattern and dates with a date pattern
#[derive(Debug, Clone)]
pub struct PatternFormatter {
    number: NumberFormat,
    date: DateFormat,
}

impl PatternFormatter {
    pub fn new(format: Option<&str>, value_type: Option<ValueType>) -> Self {
        let format = format.map(str::trim).filter(|f| !f.is_empty());

        let is_date_pattern = format.is_some_and(DateFormat::is_date_pattern)
            || (format.is_none() && value_type.is_some_and(|t| t.is_date_time()));

        if is_date_pattern {
            Self {
                number: NumberFormat::General,
                date: DateFormat::parse(format.unwrap_or("d")),
            }
        } else {
            Self {
                number: format.map_or(NumberFormat::General, NumberFormat::parse),
                date: DateFormat::default(),
            }
        }
    }
}

impl ValueFormatter for PatternFormatter {
    fn format(&self, value: &PrimitiveValue) -> String {
        match value {
            PrimitiveValue::Null => String::new(),
            PrimitiveValue::Bool(b) => b.to_string(),
            PrimitiveValue::Number(n) => self.number.format(*n),
            PrimitiveValue::Date(d) => self.date.format(d),
            PrimitiveValue::Text(s) => s.clone(),
        }
    }
}

// ============================================================================
// NUMBER FORMAT
// ============================================================================

/// Parsed numeric format string with optional `positive;negative;zero` sections
#[derive(Debug, Clone, PartialEq)]
pub enum NumberFormat {
    General,
    Pattern {
        positive: NumberSection,
        negative: Option<NumberSection>,
        zero: Option<NumberSection>,
    },
}

/// One section of a numeric format
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NumberSection {
    pub prefix: String,
    pub suffix: String,
    pub min_decimals: usize,
    pub max_decimals: usize,
    pub thousands: bool,
    pub percent: bool,
}

impl NumberFormat {
    pub fn parse(format: &str) -> Self {
        if format.eq_ignore_ascii_case("general") || format == "G" || format == "g" {
            return Self::General;
        }

        let mut sections = split_sections(format).into_iter().map(|s| NumberSection::parse(&s));
        let positive = match sections.next() {
            Some(section) => section,
            None => return Self::General,
        };

        Self::Pattern {
            positive,
            negative: sections.next(),
            zero: sections.next(),
        }
    }

    pub fn format(&self, value: f64) -> String {
        if !value.is_finite() {
            return display_number(value);
        }

        match self {
            Self::General => display_number(value),
            Self::Pattern {
                positive,
                negative,
                zero,
            } => {
                if value == 0.0 {
                    if let Some(zero) = zero {
                        return zero.format(0.0);
                    }
                }

                if value < 0.0 {
                    if let Some(negative) = negative {
                        return negative.format(value.abs());
                    }
                    let formatted = positive.format(value.abs());
                    // A value that rounds to zero loses its sign
                    if formatted.chars().any(|c| c.is_ascii_digit() && c != '0') {
                        return format!("-{}", formatted);
                    }
                    return formatted;
                }

                positive.format(value)
            }
        }
    }
}

impl NumberSection {
    fn parse(section: &str) -> Self {
        let mut result = Self::default();
        let mut literal = String::new();
        let mut seen_placeholder = false;
        let mut after_point = false;
        let mut chars = section.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '"' | '\'' => {
                    for q in chars.by_ref() {
                        if q == c {
                            break;
                        }
                        literal.push(q);
                    }
                }
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        literal.push(escaped);
                    }
                }
                '0' | '#' => {
                    if !seen_placeholder {
                        result.prefix = std::mem::take(&mut literal);
                        seen_placeholder = true;
                    } else {
                        literal.clear();
                    }
                    if after_point {
                        result.max_decimals += 1;
                        if c == '0' {
                            result.min_decimals += 1;
                        }
                    }
                }
                ',' if seen_placeholder && !after_point => {
                    if matches!(chars.peek(), Some('0') | Some('#')) {
                        result.thousands = true;
                    }
                }
                '.' if seen_placeholder || matches!(chars.peek(), Some('0') | Some('#')) => {
                    if !seen_placeholder {
                        result.prefix = std::mem::take(&mut literal);
                        seen_placeholder = true;
                    }
                    after_point = true;
                }
                '%' => {
                    result.percent = true;
                    literal.push('%');
                }
                other => literal.push(other),
            }
        }

        if seen_placeholder {
            result.suffix = literal;
        } else {
            result.prefix = literal;
        }

        result
    }

    fn format(&self, value: f64) -> String {
        let scaled = if self.percent { value * 100.0 } else { value };
        let factor = 10f64.powi(self.max_decimals as i32);
        let rounded = (scaled * factor).round() / factor;

        let mut digits = format!("{:.*}", self.max_decimals, rounded);
        if let Some(point) = digits.find('.') {
            let keep = point + 1 + self.min_decimals;
            while digits.len() > keep && digits.ends_with('0') {
                digits.pop();
            }
            if digits.ends_with('.') {
                digits.pop();
            }
        }

        let (integer, fraction) = match digits.find('.') {
            Some(point) => (digits[..point].to_string(), digits[point..].to_string()),
            None => (digits, String::new()),
        };

        let integer = if self.thousands {
            group_thousands(&integer)
        } else {
            integer
        };

        format!("{}{}{}{}", self.prefix, integer, fraction, self.suffix)
    }
}

fn split_sections(format: &str) -> Vec<String> {
    let mut sections = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for c in format.chars() {
        if escaped {
            current.push(c);
            escaped = false;
            continue;
        }
        match (c, quote) {
            ('\\', _) => {
                current.push(c);
                escaped = true;
            }
            ('"' | '\'', None) => {
                quote = Some(c);
                current.push(c);
            }
            (q, Some(open)) if q == open => {
                quote = None;
                current.push(c);
            }
            (';', None) => sections.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }

    sections.push(current);
    sections
}

fn group_thousands(integer: &str) -> String {
    let (sign, digits) = match integer.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", integer),
    };

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    format!("{}{}", sign, grouped)
}

// ============================================================================
// DATE FORMAT
// ============================================================================

/// Date pattern translated to a chrono format string
#[derive(Debug, Clone, PartialEq)]
pub struct DateFormat {
    chrono_pattern: String,
}

impl Default for DateFormat {
    fn default() -> Self {
        Self {
            chrono_pattern: "%-m/%-d/%Y".to_string(),
        }
    }
}

const DATE_TOKENS: &[(&str, &str)] = &[
    ("yyyy", "%Y"),
    ("yy", "%y"),
    ("MMMM", "%B"),
    ("MMM", "%b"),
    ("MM", "%m"),
    ("M", "%-m"),
    ("dddd", "%A"),
    ("ddd", "%a"),
    ("dd", "%d"),
    ("d", "%-d"),
    ("HH", "%H"),
    ("H", "%-H"),
    ("hh", "%I"),
    ("h", "%-I"),
    ("mm", "%M"),
    ("ss", "%S"),
    ("fff", "%3f"),
    ("tt", "%p"),
];

impl DateFormat {
    /// Single-letter standard patterns
    fn standard(format: &str) -> Option<&'static str> {
        match format {
            "d" => Some("%-m/%-d/%Y"),
            "D" => Some("%A, %B %-d, %Y"),
            "f" => Some("%A, %B %-d, %Y %-I:%M %p"),
            "F" => Some("%A, %B %-d, %Y %-I:%M:%S %p"),
            "g" => Some("%-m/%-d/%Y %-I:%M %p"),
            "G" => Some("%-m/%-d/%Y %-I:%M:%S %p"),
            "t" => Some("%-I:%M %p"),
            "T" => Some("%-I:%M:%S %p"),
            "m" | "M" => Some("%B %-d"),
            "y" | "Y" => Some("%B %Y"),
            "s" => Some("%Y-%m-%dT%H:%M:%S"),
            _ => None,
        }
    }

    /// Heuristic: date tokens present and no numeric placeholders
    pub fn is_date_pattern(format: &str) -> bool {
        if Self::standard(format).is_some() {
            return true;
        }
        let unquoted = strip_quoted(format);
        !unquoted.contains(['0', '#'])
            && unquoted.contains(['y', 'M', 'd', 'H', 'h', 'm', 's'])
    }

    pub fn parse(format: &str) -> Self {
        if let Some(pattern) = Self::standard(format) {
            return Self {
                chrono_pattern: pattern.to_string(),
            };
        }

        let mut pattern = String::with_capacity(format.len() * 2);
        let mut rest = format;

        'outer: while let Some(c) = rest.chars().next() {
            if c == '"' || c == '\'' {
                let body = &rest[1..];
                match body.find(c) {
                    Some(i) => {
                        push_literal(&mut pattern, &body[..i]);
                        rest = &body[i + 1..];
                    }
                    None => {
                        push_literal(&mut pattern, body);
                        rest = "";
                    }
                }
                continue;
            }
            for (token, replacement) in DATE_TOKENS {
                if rest.starts_with(token) {
                    pattern.push_str(replacement);
                    rest = &rest[token.len()..];
                    continue 'outer;
                }
            }
            push_literal(&mut pattern, &rest[..c.len_utf8()]);
            rest = &rest[c.len_utf8()..];
        }

        Self {
            chrono_pattern: pattern,
        }
    }

    pub fn format(&self, date: &DateTime<Utc>) -> String {
        date.format(&self.chrono_pattern).to_string()
    }
}

fn push_literal(pattern: &mut String, literal: &str) {
    for c in literal.chars() {
        if c == '%' {
            pattern.push_str("%%");
        } else {
            pattern.push(c);
        }
    }
}

fn strip_quoted(format: &str) -> String {
    let mut out = String::with_capacity(format.len());
    let mut quote: Option<char> = None;
    for c in format.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '\'' => quote = Some(c),
            None => out.push(c),
        }
    }
    out
}
