// Number parsing and display helpers shared across front ends.

/// Tolerant parsing of user-typed numbers ("250kg", "5000 €", "1,20") and the
/// two-decimal display rules used in every result message.
pub mod number_format {
    use std::str::FromStr;
    use thiserror::Error;

    /// Unit and currency markers removed before parsing. Matched after lower-casing.
    const STRIPPED_TOKENS: [&str; 4] = ["kg", "€", "£", "$"];

    #[derive(Debug, Clone, PartialEq, Eq, Error)]
    pub enum NumberFormatError {
        #[error("no number found in '{raw}'")]
        Empty { raw: String },

        #[error("'{raw}' is not a plain decimal number (use a single ',' or '.' as decimal separator, no thousands separators)")]
        Malformed { raw: String },

        #[error("'{raw}' is out of range")]
        NotFinite { raw: String },
    }

    impl NumberFormatError {
        pub fn raw(&self) -> &str {
            match self {
                NumberFormatError::Empty { raw }
                | NumberFormatError::Malformed { raw }
                | NumberFormatError::NotFinite { raw } => raw,
            }
        }
    }

    /// Lower-cases, strips unit/currency markers, turns a decimal comma into a
    /// point and trims, then parses the rest as a finite `f64`.
    ///
    /// Thousands separators are not supported: "1.000,50" becomes "1.000.50"
    /// and is rejected rather than guessed at.
    pub fn normalize_number(raw: &str) -> Result<f64, NumberFormatError> {
        let mut cleaned = raw.to_lowercase();
        for token in STRIPPED_TOKENS {
            cleaned = cleaned.replace(token, "");
        }
        let cleaned = cleaned.replace(',', ".");
        let cleaned = cleaned.trim();

        if cleaned.is_empty() {
            return Err(NumberFormatError::Empty { raw: raw.to_string() });
        }
        if !is_plain_decimal(cleaned) {
            return Err(NumberFormatError::Malformed { raw: raw.to_string() });
        }

        let value = f64::from_str(cleaned)
            .map_err(|_| NumberFormatError::Malformed { raw: raw.to_string() })?;
        if !value.is_finite() {
            return Err(NumberFormatError::NotFinite { raw: raw.to_string() });
        }
        Ok(value)
    }

    // Optional sign, ASCII digits, at most one point, at least one digit.
    fn is_plain_decimal(s: &str) -> bool {
        let unsigned = s.strip_prefix(|c: char| c == '+' || c == '-').unwrap_or(s);
        unsigned.chars().all(|c| c.is_ascii_digit() || c == '.')
            && unsigned.matches('.').count() <= 1
            && unsigned.chars().any(|c| c.is_ascii_digit())
    }

    /// Rounds half away from zero to `decimals` places. Negative zero collapses to zero.
    pub fn round_to(value: f64, decimals: u32) -> f64 {
        let factor = 10f64.powi(decimals as i32);
        let scaled = value * factor;
        if !scaled.is_finite() {
            return value;
        }
        let rounded = scaled.round() / factor;
        if rounded == 0.0 {
            0.0
        } else {
            rounded
        }
    }

    /// Display rounding for monetary amounts.
    pub fn round_display(value: f64) -> f64 {
        round_to(value, 2)
    }

    /// "1234.56" style, no grouping.
    pub fn format_amount(value: f64) -> String {
        format!("{:.2}", round_display(value))
    }

    /// "1,234,567.8" style grouping with `decimals` fraction digits.
    pub fn format_grouped(value: f64, decimals: usize) -> String {
        let rounded = round_to(value, decimals as u32);
        let formatted = format!("{:.*}", decimals, rounded.abs());
        let (int_part, frac_part) = match formatted.split_once('.') {
            Some((int_part, frac_part)) => (int_part, Some(frac_part)),
            None => (formatted.as_str(), None),
        };

        let mut grouped = String::with_capacity(formatted.len() + int_part.len() / 3 + 1);
        if rounded < 0.0 {
            grouped.push('-');
        }
        for (idx, digit) in int_part.chars().enumerate() {
            if idx > 0 && (int_part.len() - idx) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(digit);
        }
        if let Some(frac_part) = frac_part {
            grouped.push('.');
            grouped.push_str(frac_part);
        }
        grouped
    }

}
