//! equadiag-report — Self-contained HTML rendering of diagnostic reports.

pub mod html;

pub use html::{generate_html, write_html_report};
