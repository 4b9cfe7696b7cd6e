// Human-readable rendering of a LiabilityResult. Rounding happens only here.
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use shared::models::{CoverageStatus, LiabilityResult, RateQuote, RateSource};
use shared::utils::number_format::{format_amount, round_display};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    En,
    De,
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "en-us" | "en-gb" | "english" => Ok(Locale::En),
            "de" | "de-de" | "de-at" | "german" | "deutsch" => Ok(Locale::De),
            other => Err(format!("unsupported language '{}' (expected 'en' or 'de')", other)),
        }
    }
}

impl Locale {
    pub fn input_error_hint(&self) -> &'static str {
        match self {
            Locale::En => "Please enter valid numbers (',' or '.' as decimal separator, no thousands separators).",
            Locale::De => "Bitte gib gültige Zahlen ein (Komma oder Punkt als Dezimaltrenner, keine Tausenderpunkte)!",
        }
    }

    pub fn field_label(&self, field: &str) -> String {
        use super::evaluator::{FIELD_GOODS_VALUE, FIELD_RATE, FIELD_WEIGHT};
        let label = match (self, field) {
            (Locale::En, FIELD_WEIGHT) => "Gross Weight (kg)",
            (Locale::En, FIELD_GOODS_VALUE) => "Value of Goods (€)",
            (Locale::En, FIELD_RATE) => "SDR Rate (XDR -> EUR)",
            (Locale::De, FIELD_WEIGHT) => "Bruttogewicht (kg)",
            (Locale::De, FIELD_GOODS_VALUE) => "Warenwert (€)",
            (Locale::De, FIELD_RATE) => "SZR-Kurs",
            (_, other) => other,
        };
        label.to_string()
    }
}

/// A result plus everything needed to show it: locale and where the rate came from.
#[derive(Debug, Clone, Copy)]
pub struct LiabilityReport {
    pub result: LiabilityResult,
    pub rate: Option<RateQuote>,
    pub locale: Locale,
}

#[derive(Serialize)]
struct ReportView<'a> {
    #[serde(flatten)]
    result: &'a LiabilityResult,
    rate_source: Option<RateSource>,
    liability_limit_display: String,
    gap_display: String,
    message: String,
}

impl LiabilityReport {
    pub fn new(result: LiabilityResult, rate: Option<RateQuote>, locale: Locale) -> Self {
        Self { result, rate, locale }
    }

    pub fn limit_line(&self) -> String {
        let amount = format_amount(self.result.liability_limit);
        match self.locale {
            Locale::En => format!("Liability Limit: {} €", amount),
            Locale::De => format!("Haftungsgrenze: {} €", amount),
        }
    }

    pub fn status_line(&self) -> String {
        let gap = format_amount(self.result.gap);
        match (self.result.status, self.locale) {
            (CoverageStatus::FullyCovered, Locale::En) => {
                "FULL COVERAGE. The carrier liability covers the entire value of goods.".to_string()
            }
            (CoverageStatus::FullyCovered, Locale::De) => "Alles gedeckt. Kein Risiko.".to_string(),
            (CoverageStatus::UnderInsured, Locale::En) => format!(
                "RISK ALERT: Under-insured! Potential Gap: {} €. Recommend extra cargo insurance.",
                gap
            ),
            (CoverageStatus::UnderInsured, Locale::De) => format!("UNTERDECKUNG: {} € Risiko!", gap),
        }
    }

    pub fn rate_line(&self) -> Option<String> {
        self.rate.map(|quote| rate_line(quote, self.locale))
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        if let Some(rate) = self.rate_line() {
            out.push_str(&rate);
            out.push('\n');
        }
        out.push_str(&self.limit_line());
        out.push('\n');
        out.push_str(&self.status_line());
        out
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        let view = ReportView {
            result: &self.result,
            rate_source: self.rate.map(|quote| quote.source),
            liability_limit_display: format_amount(self.result.liability_limit),
            gap_display: format_amount(self.result.gap),
            message: self.status_line(),
        };
        serde_json::to_string_pretty(&view)
    }

    /// Gap shown to the user; zero when covered by a margin under one cent.
    pub fn displayed_gap(&self) -> f64 {
        round_display(self.result.gap)
    }
}

impl fmt::Display for LiabilityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// One line stating the rate and whether it is live.
pub fn rate_line(quote: RateQuote, locale: Locale) -> String {
    let origin = match (quote.source, locale) {
        (RateSource::Live, Locale::En) => "live API",
        (RateSource::Fallback, Locale::En) => "fallback, live rate unavailable",
        (RateSource::Manual, Locale::En) => "manual input",
        (RateSource::Live, Locale::De) => "Auto-Geladen",
        (RateSource::Fallback, Locale::De) => "Ersatzwert, Live-Kurs nicht verfügbar",
        (RateSource::Manual, Locale::De) => "manuelle Eingabe",
    };
    match locale {
        Locale::En => format!("SDR Rate (XDR -> EUR): {:.4} ({})", quote.rate, origin),
        Locale::De => format!("SZR-Kurs: {:.4} ({})", quote.rate, origin),
    }
}
