//! Variability Report
//!
//! Bundles all metrics of a single log and exports collections of reports.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use super::{
    edit_distance::compute_edit_distance_variability, prefix_entropy::compute_prefix_entropy,
    variants::variant_percentage,
};
use crate::{EventLogActivityProjection, ProgressOptions, VariabilityError};

/// All variability metrics of one event log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariabilityReport {
    /// Name of the log (e.g., its file stem)
    pub log_name: String,
    /// Total number of traces
    pub trace_count: u64,
    /// Number of distinct variants
    pub variant_count: usize,
    /// Variants relative to traces, in percent
    pub variant_percentage: f64,
    /// Frequency-weighted edit distance variability
    pub edit_distance: f64,
    /// Prefix entropy (base 10)
    pub prefix_entropy: f64,
    /// Pairs of _(frequency, number of variants with that frequency)_
    pub trace_frequencies: Vec<(u64, usize)>,
    /// Seconds spent computing the metrics
    pub elapsed_secs: f64,
}

/// Flat row of the CSV summary
#[derive(Debug, Serialize)]
struct ReportRow<'a> {
    log: &'a str,
    traces: u64,
    variants: usize,
    variant_percentage: f64,
    edit_distance: f64,
    prefix_entropy: f64,
    elapsed_secs: f64,
}

impl<'a> From<&'a VariabilityReport> for ReportRow<'a> {
    fn from(r: &'a VariabilityReport) -> Self {
        ReportRow {
            log: &r.log_name,
            traces: r.trace_count,
            variants: r.variant_count,
            variant_percentage: r.variant_percentage,
            edit_distance: r.edit_distance,
            prefix_entropy: r.prefix_entropy,
            elapsed_secs: r.elapsed_secs,
        }
    }
}

/// The metrics of a [`VariabilityReport`], in the order they are computed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariabilityMetric {
    /// Number and percentage of variants
    Variants,
    /// Edit distance variability
    EditDistance,
    /// Prefix entropy
    PrefixEntropy,
}

///
/// Gets notified while [`compute_variability_report_observed`] works through the metrics
///
/// The report passed to [`ReportObserver::metric_computed`] only contains the metrics computed so far.
///
pub trait ReportObserver {
    /// Called before computing `metric`
    fn metric_started(&mut self, _metric: VariabilityMetric) {}
    /// Called once `metric` is part of `report`
    fn metric_computed(&mut self, _metric: VariabilityMetric, _report: &VariabilityReport) {}
}

impl ReportObserver for () {}

///
/// Compute all variability metrics of a projected log
///
/// `elapsed_secs` of the report covers the metric computation only.
///
pub fn compute_variability_report(
    log_name: &str,
    projection: &EventLogActivityProjection,
    progress: &ProgressOptions,
) -> VariabilityReport {
    compute_variability_report_observed(log_name, projection, progress, &mut ())
}

/// Like [`compute_variability_report`], reporting each metric to `observer`
pub fn compute_variability_report_observed<O: ReportObserver + ?Sized>(
    log_name: &str,
    projection: &EventLogActivityProjection,
    progress: &ProgressOptions,
    observer: &mut O,
) -> VariabilityReport {
    let now = Instant::now();
    let mut report = VariabilityReport {
        log_name: log_name.to_string(),
        trace_count: projection.log_size(),
        variant_count: 0,
        variant_percentage: 0.0,
        edit_distance: 0.0,
        prefix_entropy: 0.0,
        trace_frequencies: projection.trace_frequencies(),
        elapsed_secs: 0.0,
    };

    observer.metric_started(VariabilityMetric::Variants);
    report.variant_count = projection.variant_count();
    report.variant_percentage = variant_percentage(projection);
    observer.metric_computed(VariabilityMetric::Variants, &report);

    observer.metric_started(VariabilityMetric::EditDistance);
    report.edit_distance = compute_edit_distance_variability(projection, progress);
    observer.metric_computed(VariabilityMetric::EditDistance, &report);

    observer.metric_started(VariabilityMetric::PrefixEntropy);
    report.prefix_entropy = compute_prefix_entropy(projection, progress);
    observer.metric_computed(VariabilityMetric::PrefixEntropy, &report);

    report.elapsed_secs = now.elapsed().as_secs_f64();
    log::info!(
        "Computed variability of {} ({} variants) in {:?}",
        log_name,
        report.variant_count,
        now.elapsed()
    );
    report
}

///
/// Export [`VariabilityReport`]s as a JSON array to the given path
///
pub fn export_reports_json_path<P: AsRef<Path>>(
    reports: &[VariabilityReport],
    path: P,
) -> Result<(), VariabilityError> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, reports)?;
    Ok(())
}

///
/// Export a summary of [`VariabilityReport`]s (one row per log) as CSV to the given path
///
/// The trace frequency distribution is not part of the summary.
///
pub fn export_reports_csv_path<P: AsRef<Path>>(
    reports: &[VariabilityReport],
    path: P,
) -> Result<(), VariabilityError> {
    let mut writer = csv::Writer::from_path(path)?;
    for report in reports {
        writer.serialize(ReportRow::from(report))?;
    }
    writer.flush()?;
    Ok(())
}
