//! Dutch presentation of advice.
//!
//! [`classify`] places a recommendation relative to today; the render
//! functions turn an [`AdviceReport`] into plain text or an HTML fragment.

use std::fmt::Write;

use bandwissel_weather::LocationOrigin;
use chrono::{Datelike, NaiveDate};

use crate::analyzer::{Basis, Recommendation, Season};
use crate::session::{AdviceReport, ForecastOrigin};

const DAY_NAMES: [&str; 7] = [
    "Zondag",
    "Maandag",
    "Dinsdag",
    "Woensdag",
    "Donderdag",
    "Vrijdag",
    "Zaterdag",
];

const MONTH_NAMES: [&str; 12] = [
    "Januari",
    "Februari",
    "Maart",
    "April",
    "Mei",
    "Juni",
    "Juli",
    "Augustus",
    "September",
    "Oktober",
    "November",
    "December",
];

/// A recommendation relative to today
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    SwitchNow,
    SwitchOn(NaiveDate),
    AlreadyDue(NaiveDate),
    NoRecommendation,
}

pub fn classify(rec: &Recommendation, today: NaiveDate) -> Verdict {
    match (rec.basis, rec.effective_date) {
        (Basis::None, _) | (_, None) => Verdict::NoRecommendation,
        (_, Some(date)) if date == today => Verdict::SwitchNow,
        (_, Some(date)) if date > today => Verdict::SwitchOn(date),
        (_, Some(date)) => Verdict::AlreadyDue(date),
    }
}

/// e.g. "Maandag 3 November 2026"
pub fn format_date_nl(date: NaiveDate) -> String {
    let day_name = DAY_NAMES[date.weekday().num_days_from_sunday() as usize];
    let month_name = MONTH_NAMES[date.month0() as usize];
    format!("{} {} {} {}", day_name, date.day(), month_name, date.year())
}

/// One Dutch sentence describing the recommendation for a season
pub fn sentence(rec: &Recommendation, today: NaiveDate) -> String {
    let tires = rec.season.tires();
    match classify(rec, today) {
        Verdict::SwitchNow => format!("Verwissel vandaag je banden naar {}.", tires),
        Verdict::SwitchOn(date) => {
            format!("Verwissel je banden naar {} op {}.", tires, format_date_nl(date))
        }
        Verdict::AlreadyDue(date) => format!(
            "Je had al op {} moeten overstappen op {}.",
            format_date_nl(date),
            tires
        ),
        Verdict::NoRecommendation => {
            format!("Geen duidelijk advies voor {}. Controleer later opnieuw.", tires)
        }
    }
}

fn basis_note(basis: Basis) -> Option<&'static str> {
    match basis {
        Basis::Forecast => Some("op basis van de weersvoorspelling"),
        Basis::Historical => Some("op basis van historische maandgemiddelden"),
        Basis::None => None,
    }
}

fn location_line(report: &AdviceReport) -> String {
    let name = report.location.location.display_name();
    match report.location.origin {
        LocationOrigin::Device => format!("Locatie: {}", name),
        LocationOrigin::Fallback => format!("Locatie: {} (standaardlocatie)", name),
    }
}

fn season_recommendations(report: &AdviceReport) -> [(Season, &Recommendation); 2] {
    [
        (Season::Winter, &report.advice.winter),
        (Season::Summer, &report.advice.summer),
    ]
}

pub fn render_text(report: &AdviceReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Optimale dag om je banden te wisselen");
    let _ = writeln!(out, "{}", location_line(report));
    if report.forecast_origin == ForecastOrigin::Synthetic {
        let _ = writeln!(
            out,
            "Let op: de weersvoorspelling was niet beschikbaar, het advies is geschat."
        );
    }
    let _ = writeln!(out);

    for (season, rec) in season_recommendations(report) {
        let label = match season {
            Season::Winter => "Winter",
            Season::Summer => "Zomer",
        };
        let _ = write!(out, "{}: {}", label, sentence(rec, report.today));
        if let Some(note) = basis_note(rec.basis) {
            let _ = write!(out, " ({})", note);
        }
        let _ = writeln!(out);
    }

    out
}

/// HTML fragment for embedding in a page; only text is escaped, the
/// markup is fixed.
pub fn render_html(report: &AdviceReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "<h3>Optimale dag om je banden te wisselen:</h3>");
    let _ = writeln!(out, "<p class=\"location\">{}</p>", escape_html(&location_line(report)));
    if report.forecast_origin == ForecastOrigin::Synthetic {
        let _ = writeln!(
            out,
            "<p class=\"warning\">De weersvoorspelling was niet beschikbaar, het advies is geschat.</p>"
        );
    }

    for (season, rec) in season_recommendations(report) {
        let class = match season {
            Season::Winter => "winter",
            Season::Summer => "summer",
        };
        let _ = write!(out, "<p class=\"{}\">", class);
        match classify(rec, report.today) {
            Verdict::NoRecommendation => {
                let _ = write!(out, "{}", escape_html(&sentence(rec, report.today)));
            }
            Verdict::SwitchNow => {
                let _ = write!(
                    out,
                    "<strong>Advies:</strong> Verwissel vandaag je banden naar <strong>{}</strong>.",
                    rec.season.tires()
                );
            }
            Verdict::SwitchOn(date) => {
                let _ = write!(
                    out,
                    "<strong>{}</strong><br><strong>Advies:</strong> Verwissel je banden naar <strong>{}</strong>.",
                    format_date_nl(date),
                    rec.season.tires()
                );
            }
            Verdict::AlreadyDue(date) => {
                let _ = write!(
                    out,
                    "<strong>Advies:</strong> Je had al op {} moeten overstappen op <strong>{}</strong>.",
                    format_date_nl(date),
                    rec.season.tires()
                );
            }
        }
        if let Some(note) = basis_note(rec.basis) {
            let _ = write!(out, " <em>({})</em>", note);
        }
        let _ = writeln!(out, "</p>");
    }

    out
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
