use std::fmt::Display;
use std::time::Duration;

use anstyle::{AnsiColor, Style};
use trace_variability::{ReportObserver, VariabilityMetric, VariabilityReport};

const LOG_STYLE: Style = AnsiColor::Blue.on_default();
const ELAPSED_STYLE: Style = AnsiColor::Cyan.on_default();
const ERROR_STYLE: Style = AnsiColor::Red.on_default().bold();

///
/// Console report of an analysis run
///
/// Colors are only emitted if `color` is set (usually when writing to a terminal).
///
#[derive(Debug, Clone, Copy)]
pub struct Printer {
    color: bool,
}

impl Printer {
    pub fn new(color: bool) -> Self {
        Printer { color }
    }

    fn paint<T: Display>(&self, style: Style, text: T) -> String {
        if self.color {
            format!("{style}{text}{style:#}")
        } else {
            text.to_string()
        }
    }

    pub fn log_header(&self, path: impl Display) {
        println!("{}", self.paint(LOG_STYLE, format!("Log {path}")));
    }

    pub fn step(&self, step: &str) {
        println!("{step}");
    }

    pub fn trace_frequencies(&self, trace_count: u64, frequencies: &[(u64, usize)]) {
        println!("Total number of traces: {trace_count}");
        println!("Trace frequencies:");
        for (frequency, variants) in frequencies {
            println!("- {variants} traces appears {frequency} times");
        }
        println!();
    }

    pub fn elapsed(&self, elapsed: Duration) {
        let text = format!("Elapsed time: {} seconds", elapsed.as_secs());
        println!("{}\n", self.paint(ELAPSED_STYLE, text));
    }

    pub fn error(&self, error: &anyhow::Error) {
        eprintln!("{} {:#}", self.paint(ERROR_STYLE, "error:"), error);
    }
}

/// Prints every metric as soon as it is computed (progress bars appear in between)
impl ReportObserver for Printer {
    fn metric_started(&mut self, metric: VariabilityMetric) {
        match metric {
            VariabilityMetric::Variants => {}
            VariabilityMetric::EditDistance => println!("3.2: Edit distance:"),
            VariabilityMetric::PrefixEntropy => println!("3.3: Our metric:"),
        }
    }

    fn metric_computed(&mut self, metric: VariabilityMetric, report: &VariabilityReport) {
        match metric {
            VariabilityMetric::Variants => {
                println!("3.1: Number of variants: {}", report.variant_count);
                println!("     Variability (perc.): {:.3}%", report.variant_percentage);
            }
            VariabilityMetric::EditDistance => println!("     value: {:.3}", report.edit_distance),
            VariabilityMetric::PrefixEntropy => {
                println!("    Prefix entropy: {:.6}\n", report.prefix_entropy)
            }
        }
    }
}
