//! Trace Variability CLI - compare how diverse the traces of XES event logs are.
//!
//! For every log, the number of variants, the edit distance variability and the
//! prefix entropy are computed and printed; afterwards one bar chart per metric
//! compares all logs.
//!
//! ```bash
//! # Analyze xes/BPIChallenge2011.xes, xes/BPIChallenge2012.xes and xes/BPIChallenge2017.xes
//! trace-variability
//!
//! # Analyze other logs, also writing all reports as JSON
//! trace-variability logs/a.xes logs/b.xes.gz --json reports.json
//! ```

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use log::LevelFilter;
use trace_variability::{
    compute_variability_report_observed, export_reports_csv_path, export_reports_json_path,
    render_bar_chart_svg, report_charts, stream_xes_from_path, EventLogActivityProjection,
    ProgressOptions, VariabilityReport,
};

mod config;
mod output;

use config::AnalysisConfig;
use output::Printer;

/// Compare the variability of XES event logs
#[derive(Debug, Parser)]
#[command(name = "trace-variability")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// XES files to analyze (default: the BPI Challenge 2011, 2012 and 2017 logs in the XES directory)
    logs: Vec<PathBuf>,

    /// Directory containing the default logs [default: xes]
    #[arg(long)]
    xes_dir: Option<PathBuf>,

    /// Directory the charts are written to [default: plots]
    #[arg(long)]
    plots_dir: Option<PathBuf>,

    /// Use the XES classifier with this name as activity
    #[arg(long)]
    classifier: Option<String>,

    /// Do not render charts
    #[arg(long)]
    no_plots: bool,

    /// Write all reports as JSON to this file
    #[arg(long)]
    json: Option<PathBuf>,

    /// Write a CSV summary of all logs to this file
    #[arg(long)]
    csv: Option<PathBuf>,

    /// JSON config file; command line options take precedence
    #[arg(long)]
    config: Option<PathBuf>,

    /// Hide progress bars
    #[arg(short, long)]
    quiet: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn resolve_config(&self) -> anyhow::Result<AnalysisConfig> {
        let mut config = match &self.config {
            Some(path) => AnalysisConfig::from_json_path(path)?,
            None => AnalysisConfig::default(),
        };
        if !self.logs.is_empty() {
            config.logs = self.logs.clone();
        }
        if let Some(dir) = &self.xes_dir {
            config.xes_dir = dir.clone();
        }
        if let Some(dir) = &self.plots_dir {
            config.plots_dir = dir.clone();
        }
        if self.classifier.is_some() {
            config.classifier = self.classifier.clone();
        }
        if self.no_plots {
            config.plots = false;
        }
        if self.json.is_some() {
            config.json = self.json.clone();
        }
        if self.csv.is_some() {
            config.csv = self.csv.clone();
        }
        config.quiet |= self.quiet;
        Ok(config)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let printer = Printer::new(std::io::stdout().is_terminal());
    match cli.resolve_config().and_then(|config| run(&config, &printer)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            printer.error(&e);
            ExitCode::FAILURE
        }
    }
}

fn run(config: &AnalysisConfig, printer: &Printer) -> anyhow::Result<()> {
    log::debug!("Running with {:?}", config);
    let progress = ProgressOptions {
        hidden: config.quiet,
    };

    let mut reports = Vec::new();
    for (name, path) in config.log_paths() {
        reports.push(process_log(&name, &path, config, &progress, printer)?);
    }

    if config.plots {
        for chart in report_charts(&reports) {
            let path = render_bar_chart_svg(&chart, &config.plots_dir)?;
            println!("Wrote {:?}", path);
        }
    }
    if let Some(path) = &config.json {
        export_reports_json_path(&reports, path)
            .with_context(|| format!("Could not write reports to {:?}", path))?;
    }
    if let Some(path) = &config.csv {
        export_reports_csv_path(&reports, path)
            .with_context(|| format!("Could not write summary to {:?}", path))?;
    }
    Ok(())
}

fn process_log(
    name: &str,
    path: &Path,
    config: &AnalysisConfig,
    progress: &ProgressOptions,
    printer: &Printer,
) -> anyhow::Result<VariabilityReport> {
    let start = Instant::now();
    printer.log_header(path.display());

    printer.step("Step 1: Decoding log..\n");
    let (mut stream, log_data) = stream_xes_from_path(path, config.import_options())
        .with_context(|| format!("Could not import {:?}", path))?;

    printer.step("Step 2: Log processing...");
    let classifier = match &config.classifier {
        Some(classifier_name) => Some(
            log_data
                .classifiers
                .iter()
                .find(|c| &c.name == classifier_name)
                .with_context(|| {
                    format!("{:?} declares no classifier {:?}", path, classifier_name)
                })?,
        ),
        None => None,
    };
    let projection = EventLogActivityProjection::from_xes_stream(&mut stream, classifier);
    if let Some(e) = stream.check_for_errors() {
        return Err(e).with_context(|| format!("Could not import {:?}", path));
    }
    printer.trace_frequencies(projection.log_size(), &projection.trace_frequencies());

    printer.step("Step 3: Metrics computation:");
    let mut observer = *printer;
    let report = compute_variability_report_observed(name, &projection, progress, &mut observer);

    printer.elapsed(start.elapsed());
    Ok(report)
}
