//! Tire-change advice.
//!
//! The [`scanner`] looks for a run of consecutive days past the threshold
//! in the forecast; when there is none, [`fallback`] picks a month from the
//! climate table. [`session`] wires location, forecast and analysis into a
//! cancellable chain and [`render`] presents the result in Dutch.

pub mod analyzer;
pub mod error;
pub mod fallback;
pub mod render;
pub mod scanner;
pub mod session;

pub use analyzer::{Advice, Analyzer, Basis, Recommendation, Season};
pub use error::AdviceError;
pub use fallback::select_month;
pub use render::{classify, format_date_nl, render_html, render_text, Verdict};
pub use scanner::{scan, Direction};
pub use session::{build_service, AdviceReport, AdviceService, ConfiguredService, ForecastOrigin};
