use std::error::Error;
use std::path::{Path, PathBuf};

use plotters::prelude::*;

use crate::{VariabilityError, VariabilityReport};

const CHART_SIZE: (u32, u32) = (900, 600);

/// Bar colors, cycled through by bar index
const BAR_COLORS: [RGBColor; 10] = [
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
    RGBColor(188, 189, 34),
    RGBColor(23, 190, 207),
    RGBColor(31, 119, 180),
];

///
/// A bar chart with one labelled bar per value
///
#[derive(Debug, Clone, PartialEq)]
pub struct BarChart {
    /// Caption of the chart
    pub title: String,
    /// File name (without extension) the chart is written to
    pub file_stem: String,
    /// Use a logarithmic y axis
    pub log_scale: bool,
    /// Bars as pairs of _(label, value)_
    pub bars: Vec<(String, f64)>,
}

impl BarChart {
    fn new<F>(title: &str, file_stem: &str, reports: &[VariabilityReport], value: F) -> Self
    where
        F: Fn(&VariabilityReport) -> f64,
    {
        BarChart {
            title: title.to_string(),
            file_stem: file_stem.to_string(),
            log_scale: false,
            bars: reports
                .iter()
                .map(|r| (r.log_name.clone(), value(r)))
                .collect(),
        }
    }

    fn max_value(&self) -> f64 {
        self.bars.iter().map(|(_, v)| *v).fold(0.0, f64::max)
    }

    /// Smallest strictly positive value (used as lower bound of logarithmic axes)
    fn min_positive_value(&self) -> Option<f64> {
        self.bars
            .iter()
            .map(|(_, v)| *v)
            .filter(|v| *v > 0.0)
            .reduce(f64::min)
    }
}

///
/// The charts comparing several logs: number of variants, percentage of variability,
/// edit distance variability (logarithmic) and prefix entropy
///
pub fn report_charts(reports: &[VariabilityReport]) -> Vec<BarChart> {
    vec![
        BarChart::new("Number of variants", "variants", reports, |r| {
            r.variant_count as f64
        }),
        BarChart::new("Percentage of variability", "perc_variants", reports, |r| {
            r.variant_percentage
        }),
        BarChart {
            log_scale: true,
            ..BarChart::new("Edit distance variability", "edit_distance", reports, |r| {
                r.edit_distance
            })
        },
        BarChart::new("Prefix entropy (our metric)", "prefix_entropy", reports, |r| {
            r.prefix_entropy
        }),
    ]
}

/// Draws the chart on `$root` for the y range `$y_range`, with bars starting at `$baseline`
macro_rules! draw_bars {
    ($root:expr, $chart:expr, $y_range:expr, $baseline:expr) => {{
        let labels: Vec<&str> = $chart.bars.iter().map(|(l, _)| l.as_str()).collect();
        let label_of = |x: &SegmentValue<usize>| match x {
            SegmentValue::CenterOf(i) => labels.get(*i).map(|l| l.to_string()).unwrap_or_default(),
            _ => String::new(),
        };
        let mut ctx = ChartBuilder::on($root)
            .caption(&$chart.title, ("sans-serif", 28))
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(80)
            .build_cartesian_2d((0..$chart.bars.len()).into_segmented(), $y_range)?;
        ctx.configure_mesh()
            .disable_x_mesh()
            .x_labels($chart.bars.len())
            .x_label_formatter(&label_of)
            .draw()?;
        ctx.draw_series($chart.bars.iter().enumerate().map(|(i, (_, value))| {
            let mut bar = Rectangle::new(
                [
                    (SegmentValue::Exact(i), $baseline),
                    (SegmentValue::Exact(i + 1), f64::max(*value, $baseline)),
                ],
                BAR_COLORS[i % BAR_COLORS.len()].filled(),
            );
            bar.set_margin(0, 0, 15, 15);
            bar
        }))?;
    }};
}

fn draw_chart(chart: &BarChart, path: &Path) -> Result<(), Box<dyn Error>> {
    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let max = chart.max_value();
    if chart.log_scale {
        let min = chart.min_positive_value().unwrap_or(1.0);
        let lower = min / 2.0;
        let upper = (max * 2.0).max(min);
        draw_bars!(&root, chart, (lower..upper).log_scale(), lower);
    } else {
        let upper = if max > 0.0 { max * 1.1 } else { 1.0 };
        draw_bars!(&root, chart, 0f64..upper, 0f64);
    }
    root.present()?;
    Ok(())
}

///
/// Render a [`BarChart`] as SVG into `dir` (created if missing)
///
/// Returns the path of the written `<file_stem>.svg` file.
///
pub fn render_bar_chart_svg<P: AsRef<Path>>(
    chart: &BarChart,
    dir: P,
) -> Result<PathBuf, VariabilityError> {
    let plot_error = |message: String| VariabilityError::Plot {
        title: chart.title.clone(),
        message,
    };
    if chart.bars.is_empty() {
        return Err(plot_error("chart has no bars".to_string()));
    }
    std::fs::create_dir_all(dir.as_ref())?;
    let path = dir.as_ref().join(format!("{}.svg", chart.file_stem));
    draw_chart(chart, &path).map_err(|e| plot_error(e.to_string()))?;
    log::info!("Wrote chart '{}' to {:?}", chart.title, path);
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(name: &str, variants: usize, edit_distance: f64) -> VariabilityReport {
        VariabilityReport {
            log_name: name.to_string(),
            trace_count: 10,
            variant_count: variants,
            variant_percentage: variants as f64 * 10.0,
            edit_distance,
            prefix_entropy: 1.5,
            trace_frequencies: vec![],
            elapsed_secs: 0.0,
        }
    }

    #[test]
    fn test_report_charts() {
        let reports = vec![report("A", 2, 0.0), report("B", 5, 1200.0)];
        let charts = report_charts(&reports);
        let stems: Vec<&str> = charts.iter().map(|c| c.file_stem.as_str()).collect();
        assert_eq!(
            stems,
            vec!["variants", "perc_variants", "edit_distance", "prefix_entropy"]
        );
        assert!(charts[2].log_scale);
        assert_eq!(
            charts[0].bars,
            vec![("A".to_string(), 2.0), ("B".to_string(), 5.0)]
        );
    }

    #[test]
    fn test_render_svg() {
        let dir = tempfile::tempdir().unwrap();
        let reports = vec![report("BPIChallenge2011", 2, 0.0), report("B", 5, 1200.0)];
        for chart in report_charts(&reports) {
            let path = render_bar_chart_svg(&chart, dir.path().join("plots")).unwrap();
            let svg = std::fs::read_to_string(&path).unwrap();
            assert!(svg.contains("<svg"));
            assert!(svg.contains(&chart.title));
        }
        assert!(dir.path().join("plots/edit_distance.svg").exists());
    }

    #[test]
    fn test_render_empty_chart_fails() {
        let dir = tempfile::tempdir().unwrap();
        let chart = BarChart {
            title: "Empty".to_string(),
            file_stem: "empty".to_string(),
            log_scale: false,
            bars: vec![],
        };
        assert!(matches!(
            render_bar_chart_svg(&chart, dir.path()),
            Err(VariabilityError::Plot { .. })
        ));
    }
}
