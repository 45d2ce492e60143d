#![warn(
    clippy::doc_markdown,
    missing_debug_implementations,
    rust_2018_idioms,
    missing_docs
)]

#![allow(clippy::needless_doctest_main)]

#![doc = include_str!("../README.md")]

///
/// Event Logs ([`EventLog`]) and their XES import
///
pub mod event_log {
    /// Activity projection of event logs (i.e., trace variants)
    pub mod activity_projection;
    /// Constants
    pub mod constants;
    /// [`EventLog`] struct and sub-structs
    pub mod event_log_struct;
    /// XES Import
    pub mod import_xes;
    /// Streaming XES Import
    pub mod stream_xes;

    pub use event_log_struct::{
        Attribute, AttributeValue, Attributes, Event, EventLog, EventLogClassifier,
        EventLogExtension, Trace, XESEditableAttribute,
    };
    #[cfg(test)]
    mod tests;
}

///
/// Variability metrics over the variants of an event log
///
pub mod metrics {
    /// Frequency-weighted edit distance variability
    pub mod edit_distance;
    /// Prefix entropy
    pub mod prefix_entropy;
    /// Combined [`VariabilityReport`] and its JSON/CSV export
    pub mod report;
    /// Number (and percentage) of variants
    pub mod variants;

    #[doc(inline)]
    pub use report::VariabilityReport;
}

/// Errors of the crate
pub mod error;
/// SVG bar charts comparing [`VariabilityReport`]s
pub mod plot;
/// Console progress bars for long-running metric computations
pub mod progress;

#[doc(inline)]
pub use error::VariabilityError;

#[doc(inline)]
pub use event_log::event_log_struct::EventLog;

#[doc(inline)]
pub use event_log::import_xes::import_xes_file;

#[doc(inline)]
pub use event_log::import_xes::import_xes_slice;

#[doc(inline)]
pub use event_log::import_xes::import_xes_str;

#[doc(inline)]
pub use event_log::import_xes::XESImportOptions;

#[doc(inline)]
pub use event_log::import_xes::XESParseError;

#[doc(inline)]
pub use event_log::stream_xes::stream_xes_from_path;

#[doc(inline)]
pub use event_log::stream_xes::stream_xes_slice;

#[doc(inline)]
pub use event_log::stream_xes::stream_xes_slice_gz;

#[doc(inline)]
pub use event_log::activity_projection::EventLogActivityProjection;

#[doc(inline)]
pub use metrics::edit_distance::{compute_edit_distance_variability, levenshtein_distance};

#[doc(inline)]
pub use metrics::prefix_entropy::compute_prefix_entropy;

#[doc(inline)]
pub use metrics::variants::{compute_variant_variability, variant_percentage};

#[doc(inline)]
pub use metrics::report::{
    compute_variability_report, compute_variability_report_observed, export_reports_csv_path,
    export_reports_json_path, ReportObserver, VariabilityMetric, VariabilityReport,
};

#[doc(inline)]
pub use plot::{render_bar_chart_svg, report_charts, BarChart};

#[doc(inline)]
pub use progress::ProgressOptions;
