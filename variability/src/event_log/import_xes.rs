use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

use flate2::bufread::GzDecoder;
use quick_xml::Error as QuickXMLError;
use serde::{Deserialize, Serialize};

use super::event_log_struct::{EventLog, Trace};
use super::stream_xes::XESParsingTraceStream;

///
/// Error encountered while parsing XES
///
#[derive(Debug, Clone, thiserror::Error)]
pub enum XESParseError {
    /// An Attribute was encountered outside an open `<log>` tag
    #[error("Failed to parse XES: attribute outside of <log>")]
    AttributeOutsideLog,
    /// There is not top-level `<log>`
    #[error("Failed to parse XES: no top-level <log> element")]
    NoTopLevelLog,
    /// Parsing error: Expected to have a previously constructed event available
    #[error("Failed to parse XES: expected an open <event>")]
    MissingLastEvent,
    /// Parsing error: Expected to have a previously constructed trace available
    #[error("Failed to parse XES: expected an open <trace>")]
    MissingLastTrace,
    /// Parsing error: Expected to be in a different parsing mode than the current state suggests
    #[error("Failed to parse XES: invalid parser state")]
    InvalidMode,
    /// IO error
    #[error("Failed to read XES: {0}")]
    IOError(#[source] Arc<std::io::Error>),
    /// XML error (e.g., incorrect XML format)
    #[error("Failed to parse XES: {0}")]
    XMLParsingError(#[from] QuickXMLError),
    /// Missing key on XML element (with expected key included)
    #[error("Failed to parse XES: missing XML attribute '{0}'")]
    MissingKey(&'static str),
    /// Invalid value of XML attribute with key (with key included)
    #[error("Failed to parse XES: invalid value for XML attribute '{0}'")]
    InvalidKeyValue(&'static str),
    /// Parsing Transformation Error: Expected that `XESOuterLogData` would be emitted first
    #[error("Failed to parse XES: expected log data before the first trace")]
    ExpectedLogData,
    /// Parsing Transformation Error: Expected that a trace would be emitted now
    #[error("Failed to parse XES: expected trace data")]
    ExpectedTraceData,
}

impl From<std::io::Error> for XESParseError {
    fn from(e: std::io::Error) -> Self {
        Self::IOError(Arc::new(e))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
///
/// Options for XES Import
///
/// See also [`build_ignore_attributes`] for easy construction of attributes set to not ignore
pub struct XESImportOptions {
    /// If Some: Ignore all top-level log attributes, except attributes with keys in the provided allowlist
    pub ignore_log_attributes_except: Option<HashSet<String>>,
    /// If Some: Ignore all trace attributes, except attributes with keys in the provided allowlist
    ///
    /// Does not effect global trace attributes
    pub ignore_trace_attributes_except: Option<HashSet<String>>,
    /// If Some: Ignore all event attributes except, attributes with keys in the provided allowlist
    ///
    /// Does not effect global event attributes
    pub ignore_event_attributes_except: Option<HashSet<String>>,
    /// Optional date format to use when parsing `DateTimes` (first trying [`chrono::DateTime`] then falling back to [`chrono::NaiveDateTime`] with UTC timezone).
    ///
    /// Will fall back to default formats (e.g., rfc3339) if parsing fails using passed `date_format`
    pub date_format: Option<String>,
    /// Sort events via timestamp key directly when parsing:
    /// * If None: No sorting (i.e., events of traces are included in order of occurence in event log)
    /// * If Some(key): Sort events (stably) via the timestamp provided by key, falling back to the global event attribute with that key.
    ///   Events without a valid timestamp are sorted before all other events.
    pub sort_events_with_timestamp_key: Option<String>,
}

impl XESImportOptions {
    ///
    /// Options that only keep the attributes needed to project a log onto its activities
    ///
    /// All log and trace attributes are dropped and only the given event attribute keys are kept
    ///
    pub fn activities_only<I, S: AsRef<str>>(event_keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
    {
        XESImportOptions {
            ignore_log_attributes_except: Some(HashSet::new()),
            ignore_trace_attributes_except: Some(HashSet::new()),
            ignore_event_attributes_except: Some(build_ignore_attributes(event_keys)),
            ..XESImportOptions::default()
        }
    }
}

///
/// Construct a `HashSet<String>` from a _collection_ of String, &str, ...
///
/// Example usage: `build_ignore_attributes(vec!["concept:name"])`
///
pub fn build_ignore_attributes<I, S: AsRef<str>>(keys: I) -> HashSet<String>
where
    I: IntoIterator<Item = S>,
{
    keys.into_iter().map(|s| s.as_ref().to_string()).collect()
}

/// Parse XES from the given reader
pub fn import_xes<'a, T>(reader: T, options: XESImportOptions) -> Result<EventLog, XESParseError>
where
    T: BufRead + 'a,
{
    let (mut trace_stream, log_data) = XESParsingTraceStream::try_new(Box::new(reader), options)?;

    let traces: Vec<Trace> = (&mut trace_stream).collect();

    if let Some(e) = trace_stream.check_for_errors() {
        return Err(e);
    }
    log::debug!("Parsed {} traces from XES", traces.len());

    Ok(EventLog {
        attributes: log_data.log_attributes,
        traces,
        extensions: Some(log_data.extensions),
        classifiers: Some(log_data.classifiers),
        global_trace_attrs: Some(log_data.global_trace_attrs).filter(|attrs| !attrs.is_empty()),
        global_event_attrs: Some(log_data.global_event_attrs).filter(|attrs| !attrs.is_empty()),
    })
}

///
/// Import a XES [`EventLog`] from a file path
///
/// Files ending in `.gz` are decompressed on the fly
///
pub fn import_xes_file<P: AsRef<Path>>(
    path: P,
    options: XESImportOptions,
) -> Result<EventLog, XESParseError> {
    let path = path.as_ref();
    let file = File::open(path)?;
    log::debug!("Importing XES from {:?}", path);
    if is_gz_path(path) {
        let dec = GzDecoder::new(BufReader::new(file));
        import_xes(BufReader::new(dec), options)
    } else {
        import_xes(BufReader::new(file), options)
    }
}

///
/// Import a XES [`EventLog`] directly from a string
///
pub fn import_xes_str(xes_str: &str, options: XESImportOptions) -> Result<EventLog, XESParseError> {
    import_xes(BufReader::new(xes_str.as_bytes()), options)
}

///
/// Import a XES [`EventLog`] from a byte slice (&\[u8\])
///
/// * `is_compressed_gz`: Parse the passed `xes_data` as a compressed .gz archive
///
pub fn import_xes_slice(
    xes_data: &[u8],
    is_compressed_gz: bool,
    options: XESImportOptions,
) -> Result<EventLog, XESParseError> {
    if is_compressed_gz {
        let gz: GzDecoder<&[u8]> = GzDecoder::new(xes_data);
        return import_xes(BufReader::new(gz), options);
    }
    import_xes(BufReader::new(xes_data), options)
}

pub(crate) fn is_gz_path(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "gz")
}
