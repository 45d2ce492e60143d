use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use trace_variability::{
    event_log::{constants::ACTIVITY_NAME, import_xes::build_ignore_attributes},
    XESImportOptions,
};

/// Logs analyzed when none are given explicitly
pub const DEFAULT_LOG_NAMES: [&str; 3] = ["BPIChallenge2011", "BPIChallenge2012", "BPIChallenge2017"];

///
/// Settings of an analysis run
///
/// Can be read from a JSON file; missing fields take their default value.
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// XES files to analyze; if empty, the default logs are read from `xes_dir`
    pub logs: Vec<PathBuf>,
    /// Directory containing the default logs
    pub xes_dir: PathBuf,
    /// Directory the charts are written to
    pub plots_dir: PathBuf,
    /// Name of the XES classifier used as activity (instead of `concept:name`)
    pub classifier: Option<String>,
    /// Render the comparison charts
    pub plots: bool,
    /// Write all reports as JSON to this path
    pub json: Option<PathBuf>,
    /// Write a CSV summary to this path
    pub csv: Option<PathBuf>,
    /// Hide progress bars
    pub quiet: bool,
    /// Options passed on to the XES import
    pub xes_import: XESImportOptions,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            logs: Vec::new(),
            xes_dir: PathBuf::from("xes"),
            plots_dir: PathBuf::from("plots"),
            classifier: None,
            plots: true,
            json: None,
            csv: None,
            quiet: false,
            xes_import: XESImportOptions::default(),
        }
    }
}

impl AnalysisConfig {
    /// Read a config from a JSON file
    pub fn from_json_path<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let file =
            File::open(path).with_context(|| format!("Could not open config file {:?}", path))?;
        let config = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Invalid config file {:?}", path))?;
        Ok(config)
    }

    ///
    /// The logs to analyze, as pairs of _(name, path)_
    ///
    /// The name of a log is its file name without `.xes`/`.xes.gz` extension.
    ///
    pub fn log_paths(&self) -> Vec<(String, PathBuf)> {
        if self.logs.is_empty() {
            return DEFAULT_LOG_NAMES
                .iter()
                .map(|name| (name.to_string(), self.xes_dir.join(format!("{name}.xes"))))
                .collect();
        }
        self.logs
            .iter()
            .map(|path| (log_name_of(path), path.clone()))
            .collect()
    }

    ///
    /// Import options for the configured analysis
    ///
    /// Without a classifier only the activity (and the sorting key, if any) is needed per event,
    /// so all other attributes are skipped unless the config restricts them itself.
    ///
    pub fn import_options(&self) -> XESImportOptions {
        let mut options = self.xes_import.clone();
        if self.classifier.is_none() && options.ignore_event_attributes_except.is_none() {
            let keys = std::iter::once(ACTIVITY_NAME)
                .chain(options.sort_events_with_timestamp_key.as_deref());
            options.ignore_event_attributes_except = Some(build_ignore_attributes(keys));
            options
                .ignore_trace_attributes_except
                .get_or_insert_with(Default::default);
        }
        options
    }
}

fn log_name_of(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string());
    [".xes.gz", ".xes"]
        .iter()
        .find_map(|ext| file_name.strip_suffix(ext))
        .map(str::to_string)
        .unwrap_or(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_logs() {
        let config = AnalysisConfig::default();
        let paths = config.log_paths();
        assert_eq!(paths.len(), 3);
        assert_eq!(paths[0].0, "BPIChallenge2011");
        assert_eq!(paths[2].1, PathBuf::from("xes/BPIChallenge2017.xes"));
    }

    #[test]
    fn test_log_names() {
        let config = AnalysisConfig {
            logs: vec![
                PathBuf::from("data/running-example.xes.gz"),
                PathBuf::from("/tmp/BPIChallenge2012.xes"),
                PathBuf::from("other"),
            ],
            ..AnalysisConfig::default()
        };
        let names: Vec<String> = config.log_paths().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["running-example", "BPIChallenge2012", "other"]);
    }

    #[test]
    fn test_partial_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"plots": false, "classifier": "Activity", "xes_import": {"date_format": "%Y"}}"#,
        )
        .unwrap();
        let config = AnalysisConfig::from_json_path(&path).unwrap();
        assert!(!config.plots);
        assert_eq!(config.classifier.as_deref(), Some("Activity"));
        assert_eq!(config.xes_import.date_format.as_deref(), Some("%Y"));
        assert_eq!(config.plots_dir, PathBuf::from("plots"));

        assert!(AnalysisConfig::from_json_path(dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn test_import_options() {
        let mut config = AnalysisConfig::default();
        config.xes_import.sort_events_with_timestamp_key = Some("time:timestamp".to_string());
        let options = config.import_options();
        let event_keys = options.ignore_event_attributes_except.unwrap();
        assert!(event_keys.contains(ACTIVITY_NAME));
        assert!(event_keys.contains("time:timestamp"));
        assert_eq!(options.ignore_trace_attributes_except.map(|k| k.len()), Some(0));

        config.classifier = Some("Activity and Resource".to_string());
        assert!(config.import_options().ignore_event_attributes_except.is_none());
    }
}
