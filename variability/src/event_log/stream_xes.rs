use std::{
    fs::File,
    io::{BufRead, BufReader},
    ops::ControlFlow,
    path::Path,
    str::FromStr,
};

use chrono::{DateTime, NaiveDateTime, Utc};
use flate2::read::GzDecoder;
use quick_xml::{
    escape::unescape,
    events::{BytesStart, Event as XMLEvent},
    Error as QuickXMLError, Reader,
};
use uuid::Uuid;

use super::{
    event_log_struct::{EventLogClassifier, EventLogExtension},
    import_xes::{is_gz_path, XESImportOptions, XESParseError},
    Attribute, AttributeValue, Attributes, Event, Trace, XESEditableAttribute,
};

/// (Global) log data parsed during streaming
///
/// According to the XES standard (<https://xes-standard.org/_media/xes/xesstandarddefinition-2.0.pdf#page=11>) these must occur before the first trace.
///
/// Thus, __for XES-compliant logs this data is already complete once the first trace is parsed__.
#[derive(Default, Debug, Clone)]
pub struct XESOuterLogData {
    /// XES extensions declared by the log
    pub extensions: Vec<EventLogExtension>,
    /// Event classifiers declared by the log
    pub classifiers: Vec<EventLogClassifier>,
    /// Top-level log attributes
    pub log_attributes: Attributes,
    /// Default values for trace attributes
    pub global_trace_attrs: Attributes,
    /// Default values for event attributes
    pub global_event_attrs: Attributes,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
///
/// Current Parsing Mode (i.e., which tag is currently open / being parsed)
///
pub(crate) enum Mode {
    /// Inside `<trace>`
    Trace,
    /// Inside `<event>`
    Event,
    /// Inside a (non-empty) nested attribute
    Attribute,
    /// Inside `<global scope="trace">`
    GlobalTraceAttributes,
    /// Inside `<global scope="event">`
    GlobalEventAttributes,
    /// Inside `<log>`
    Log,
    /// Outside of any element
    None,
}

/// Elements emitted by [`StreamingXESParser`]
#[derive(Debug)]
pub(crate) enum XESNextStreamElement {
    /// A fully parsed trace
    Trace(Trace),
    /// Parsing failed; emitted at most once, after which the parser is finished
    Error(XESParseError),
    /// Global log data; emitted at most once, before the first trace
    LogData(XESOuterLogData),
}

type Step = ControlFlow<Option<XESNextStreamElement>>;

///
/// Streaming XES Parser over [`Trace`]s
///
/// Usually constructed through one of the streaming functions (e.g. [`stream_xes_from_path`], [`stream_xes_slice`], ...)
pub(crate) struct StreamingXESParser<'a> {
    reader: Reader<Box<dyn BufRead + 'a>>,
    buf: Vec<u8>,
    current_mode: Mode,
    current_trace: Option<Trace>,
    last_mode_before_attr: Mode,
    /// Stack of currently open nested attributes (innermost last)
    current_nested_attributes: Vec<Attribute>,
    options: XESImportOptions,
    /// A top-level `<log>` is required for XES files, see [`XESParseError::NoTopLevelLog`]
    encountered_log: bool,
    log_data: XESOuterLogData,
    log_data_emitted: bool,
    /// Set when an empty `<trace/>` is the first trace, so that log data is emitted first
    pending_trace: bool,
    finished: bool,
}

impl std::fmt::Debug for StreamingXESParser<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingXESParser")
            .field("current_mode", &self.current_mode)
            .field("encountered_log", &self.encountered_log)
            .field("log_data_emitted", &self.log_data_emitted)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

impl<'a> StreamingXESParser<'a> {
    fn new(reader: Box<dyn BufRead + 'a>, options: XESImportOptions) -> Self {
        let mut reader = Reader::from_reader(reader);
        reader.config_mut().trim_text(true);
        StreamingXESParser {
            reader,
            buf: Vec::new(),
            current_mode: Mode::Log,
            current_trace: None,
            last_mode_before_attr: Mode::Log,
            current_nested_attributes: Vec::new(),
            options,
            encountered_log: false,
            log_data: XESOuterLogData::default(),
            log_data_emitted: false,
            pending_trace: false,
            finished: false,
        }
    }

    /// Try to parse a next [`XESNextStreamElement`] from the current position
    ///
    /// Returns [`None`] if it encountered an error previously or there are no more traces left
    ///
    /// * `XESNextStreamElement::LogData` will be emitted at most once, before the first trace
    /// * `XESNextStreamElement::Trace` will be emitted for every trace found in the underlying XES
    /// * `XESNextStreamElement::Error` will be emitted at most once and ends the stream
    pub(crate) fn next_element(&mut self) -> Option<XESNextStreamElement> {
        if self.finished {
            return None;
        }
        if self.pending_trace && self.log_data_emitted {
            self.pending_trace = false;
            return match self.emit_trace() {
                ControlFlow::Break(next) => next,
                ControlFlow::Continue(()) => None,
            };
        }

        let mut buf = std::mem::take(&mut self.buf);
        let next = loop {
            buf.clear();
            let step = match self.reader.read_event_into(&mut buf) {
                Ok(ev) => self.handle_xml_event(ev),
                Err(e) => self.fail(XESParseError::XMLParsingError(e)),
            };
            if let ControlFlow::Break(next) = step {
                break next;
            }
        };
        self.buf = buf;
        next
    }

    fn fail(&mut self, error: XESParseError) -> Step {
        self.finished = true;
        ControlFlow::Break(Some(XESNextStreamElement::Error(error)))
    }

    fn emit_log_data(&mut self) -> Step {
        self.log_data_emitted = true;
        ControlFlow::Break(Some(XESNextStreamElement::LogData(self.log_data.clone())))
    }

    fn emit_trace(&mut self) -> Step {
        let Some(mut trace) = self.current_trace.take() else {
            return self.fail(XESParseError::MissingLastTrace);
        };
        if let Some(timestamp_key) = &self.options.sort_events_with_timestamp_key {
            let globals = &self.log_data.global_event_attrs;
            trace.events.sort_by_key(|e| {
                e.attributes
                    .get_by_key(timestamp_key)
                    .and_then(|a| a.value.try_as_date())
                    .or_else(|| {
                        globals
                            .get_by_key(timestamp_key)
                            .and_then(|a| a.value.try_as_date())
                    })
                    .copied()
            });
        }
        trace.events.shrink_to_fit();
        trace.attributes.shrink_to_fit();
        ControlFlow::Break(Some(XESNextStreamElement::Trace(trace)))
    }

    fn handle_xml_event(&mut self, ev: XMLEvent<'_>) -> Step {
        match ev {
            XMLEvent::Start(t) => self.handle_start(&t),
            XMLEvent::Empty(t) => self.handle_empty(&t),
            XMLEvent::End(t) => self.handle_end(t.name().as_ref()),
            XMLEvent::Eof => {
                if !self.encountered_log {
                    return self.fail(XESParseError::NoTopLevelLog);
                }
                if !self.log_data_emitted {
                    return self.emit_log_data();
                }
                self.finished = true;
                ControlFlow::Break(None)
            }
            _ => ControlFlow::Continue(()),
        }
    }

    fn handle_start(&mut self, t: &BytesStart<'_>) -> Step {
        match t.name().as_ref() {
            b"trace" => {
                if !self.encountered_log {
                    return self.fail(XESParseError::NoTopLevelLog);
                }
                self.current_mode = Mode::Trace;
                self.current_trace = Some(Trace {
                    attributes: Attributes::with_capacity(10),
                    events: Vec::with_capacity(10),
                });
                if !self.log_data_emitted {
                    return self.emit_log_data();
                }
            }
            b"event" => {
                self.current_mode = Mode::Event;
                match &mut self.current_trace {
                    Some(trace) => trace.events.push(Event {
                        attributes: Attributes::with_capacity(10),
                    }),
                    None => log::warn!("Invalid XES format: Event without trace"),
                }
            }
            b"global" => match t.try_get_attribute("scope") {
                Ok(Some(scope)) => match scope.value.as_ref() {
                    b"trace" => self.current_mode = Mode::GlobalTraceAttributes,
                    b"event" => self.current_mode = Mode::GlobalEventAttributes,
                    _ => return self.fail(XESParseError::InvalidKeyValue("scope")),
                },
                Ok(None) => return self.fail(XESParseError::MissingKey("scope")),
                Err(e) => return self.fail(QuickXMLError::from(e).into()),
            },
            b"log" => {
                self.encountered_log = true;
                self.current_mode = Mode::Log;
            }
            // Wrapper of list children; carries no data itself
            b"values" => {}
            _ => {
                if !self.encountered_log {
                    return self.fail(XESParseError::NoTopLevelLog);
                }
                let key = get_attribute_string(t, "key");
                let value = parse_attribute_value_from_tag(t, self.current_mode, &self.options);
                if !(key.is_empty() && matches!(value, AttributeValue::None())) {
                    self.current_nested_attributes.push(Attribute::new(key, value));
                    if self.current_mode != Mode::Attribute {
                        self.last_mode_before_attr = self.current_mode;
                    }
                    self.current_mode = Mode::Attribute;
                }
            }
        }
        ControlFlow::Continue(())
    }

    fn handle_empty(&mut self, t: &BytesStart<'_>) -> Step {
        match t.name().as_ref() {
            b"extension" => {
                self.log_data.extensions.push(EventLogExtension {
                    name: get_attribute_string(t, "name"),
                    prefix: get_attribute_string(t, "prefix"),
                    uri: get_attribute_string(t, "uri"),
                });
            }
            b"classifier" => {
                self.log_data.classifiers.push(EventLogClassifier {
                    name: get_attribute_string(t, "name"),
                    keys: get_attribute_string(t, "keys")
                        .split_whitespace()
                        .map(|s| s.to_string())
                        .collect(),
                });
            }
            b"log" => {
                self.encountered_log = true;
                self.current_mode = Mode::None;
                if !self.log_data_emitted {
                    return self.emit_log_data();
                }
            }
            b"trace" => {
                if !self.encountered_log {
                    return self.fail(XESParseError::NoTopLevelLog);
                }
                self.current_trace = Some(Trace {
                    attributes: Attributes::new(),
                    events: Vec::new(),
                });
                if !self.log_data_emitted {
                    self.pending_trace = true;
                    return self.emit_log_data();
                }
                return self.emit_trace();
            }
            b"event" => match &mut self.current_trace {
                Some(trace) => trace.events.push(Event {
                    attributes: Attributes::new(),
                }),
                None => log::warn!("Invalid XES format: Event without trace"),
            },
            b"values" => {}
            _ => {
                if !self.encountered_log {
                    return self.fail(XESParseError::NoTopLevelLog);
                }
                if !self.add_attribute_from_tag(t) {
                    return self.fail(XESParseError::AttributeOutsideLog);
                }
            }
        }
        ControlFlow::Continue(())
    }

    fn handle_end(&mut self, name: &[u8]) -> Step {
        match name {
            b"event" => self.current_mode = Mode::Trace,
            b"trace" => {
                self.current_mode = Mode::Log;
                return self.emit_trace();
            }
            b"log" => self.current_mode = Mode::None,
            b"global" => self.current_mode = Mode::Log,
            b"values" => {}
            _ if self.current_mode == Mode::Attribute => return self.close_nested_attribute(),
            other => log::debug!(
                "Ignoring closing tag '{}' in mode {:?}",
                String::from_utf8_lossy(other),
                self.current_mode
            ),
        }
        ControlFlow::Continue(())
    }

    /// Close the innermost open nested attribute, attaching it to its parent
    fn close_nested_attribute(&mut self) -> Step {
        let Some(attr) = self.current_nested_attributes.pop() else {
            log::warn!("Attribute mode but no open nested attributes");
            self.current_mode = self.last_mode_before_attr;
            return ControlFlow::Continue(());
        };
        if let Some(parent) = self.current_nested_attributes.last_mut() {
            attach_child_attribute(parent, attr);
            return ControlFlow::Continue(());
        }

        let mode = self.last_mode_before_attr;
        if self.is_ignored(mode, &attr.key) {
            self.current_mode = mode;
            return ControlFlow::Continue(());
        }
        match mode {
            Mode::Trace => match &mut self.current_trace {
                Some(trace) => trace.attributes.add_attribute(attr),
                None => return self.fail(XESParseError::MissingLastTrace),
            },
            Mode::Event => match self
                .current_trace
                .as_mut()
                .map(|trace| trace.events.last_mut())
            {
                Some(Some(event)) => event.attributes.add_attribute(attr),
                Some(None) => return self.fail(XESParseError::MissingLastEvent),
                None => return self.fail(XESParseError::MissingLastTrace),
            },
            Mode::Log => self.log_data.log_attributes.add_attribute(attr),
            Mode::GlobalTraceAttributes => self.log_data.global_trace_attrs.add_attribute(attr),
            Mode::GlobalEventAttributes => self.log_data.global_event_attrs.add_attribute(attr),
            Mode::Attribute | Mode::None => return self.fail(XESParseError::InvalidMode),
        }
        self.current_mode = mode;
        ControlFlow::Continue(())
    }

    /// Whether an attribute with `key` is dropped by the allowlists in [`XESImportOptions`]
    fn is_ignored(&self, mode: Mode, key: &str) -> bool {
        let allowlist = match mode {
            Mode::Event => &self.options.ignore_event_attributes_except,
            Mode::Trace => &self.options.ignore_trace_attributes_except,
            Mode::Log => &self.options.ignore_log_attributes_except,
            _ => return false,
        };
        allowlist
            .as_ref()
            .is_some_and(|not_ignored| !not_ignored.contains(key))
    }

    ///
    /// Add XES attribute from an empty tag to the currently active element (indicated by `current_mode`)
    ///
    /// Returns `false` if there is no element the attribute could belong to
    ///
    fn add_attribute_from_tag(&mut self, t: &BytesStart<'_>) -> bool {
        let key = get_attribute_string(t, "key");
        if self.is_ignored(self.current_mode, &key) {
            return true;
        }
        let value = parse_attribute_value_from_tag(t, self.current_mode, &self.options);
        match self.current_mode {
            Mode::Trace => match &mut self.current_trace {
                Some(trace) => trace.attributes.add_to_attributes(key, value),
                None => log::warn!(
                    "No current trace when parsing trace attribute: Key {:?}, Value {:?}",
                    key,
                    value
                ),
            },
            Mode::Event => match self
                .current_trace
                .as_mut()
                .and_then(|trace| trace.events.last_mut())
            {
                Some(event) => event.attributes.add_to_attributes(key, value),
                None => log::warn!(
                    "No current event when parsing event attribute: Key {:?}, Value {:?}",
                    key,
                    value
                ),
            },
            Mode::Log => self.log_data.log_attributes.add_to_attributes(key, value),
            Mode::GlobalTraceAttributes => {
                self.log_data.global_trace_attrs.add_to_attributes(key, value)
            }
            Mode::GlobalEventAttributes => {
                self.log_data.global_event_attrs.add_to_attributes(key, value)
            }
            Mode::Attribute => match self.current_nested_attributes.last_mut() {
                Some(parent) => attach_child_attribute(parent, Attribute::new(key, value)),
                None => return false,
            },
            Mode::None => return false,
        }
        true
    }
}

/// Lists and containers hold their children in their value, all other attributes in `own_attributes`
fn attach_child_attribute(parent: &mut Attribute, child: Attribute) {
    match &mut parent.value {
        AttributeValue::List(children) | AttributeValue::Container(children) => {
            children.push(child)
        }
        _ => parent
            .own_attributes
            .get_or_insert_with(Attributes::new)
            .add_attribute(child),
    }
}

///
/// Iterator over the [`Trace`]s of a streamed XES file
///
/// Parsing errors end the iteration; check for them afterwards using [`XESParsingTraceStream::check_for_errors`]
///
#[derive(Debug)]
pub struct XESParsingTraceStream<'a> {
    inner: StreamingXESParser<'a>,
    error: Option<XESParseError>,
}

/// A trace stream together with the already parsed global log data
pub type XESParsingStreamAndLogData<'a> = (XESParsingTraceStream<'a>, XESOuterLogData);

impl Iterator for XESParsingTraceStream<'_> {
    type Item = Trace;

    fn next(&mut self) -> Option<Self::Item> {
        if self.error.is_some() {
            return None;
        }
        match self.inner.next_element() {
            Some(XESNextStreamElement::Trace(t)) => Some(t),
            Some(XESNextStreamElement::Error(e)) => {
                self.error = Some(e);
                None
            }
            Some(XESNextStreamElement::LogData(_)) => {
                self.error = Some(XESParseError::ExpectedTraceData);
                None
            }
            None => None,
        }
    }
}

impl std::iter::FusedIterator for XESParsingTraceStream<'_> {}

impl<'a> XESParsingTraceStream<'a> {
    /// Check if any errors occured
    pub fn check_for_errors(&self) -> Option<XESParseError> {
        self.error.clone()
    }

    /// Default values for event attributes, as declared before the first trace
    pub fn global_event_attrs(&self) -> &Attributes {
        &self.inner.log_data.global_event_attrs
    }

    ///
    /// Try to construct a new [`XESParsingTraceStream`] and directly parse until the first trace
    ///
    /// As all log attributes must occur before the first trace, this already returns the parsed [`XESOuterLogData`]
    ///
    pub fn try_new(
        reader: Box<dyn BufRead + 'a>,
        options: XESImportOptions,
    ) -> Result<(Self, XESOuterLogData), XESParseError> {
        let mut inner = StreamingXESParser::new(reader, options);
        match inner.next_element() {
            Some(XESNextStreamElement::LogData(d)) => Ok((Self { inner, error: None }, d)),
            Some(XESNextStreamElement::Error(e)) => Err(e),
            Some(XESNextStreamElement::Trace(_)) | None => Err(XESParseError::ExpectedLogData),
        }
    }
}

///
/// Stream XES [`Trace`]s from byte slice
///
/// The returned [`XESParsingStreamAndLogData`] contains the [`XESOuterLogData`] and can be used to iterate over [`Trace`]s
///
pub fn stream_xes_slice(
    xes_data: &[u8],
    options: XESImportOptions,
) -> Result<XESParsingStreamAndLogData<'_>, XESParseError> {
    XESParsingTraceStream::try_new(Box::new(BufReader::new(xes_data)), options)
}

///
/// Stream XES [`Trace`]s from gzipped byte slice
///
pub fn stream_xes_slice_gz(
    xes_data: &[u8],
    options: XESImportOptions,
) -> Result<XESParsingStreamAndLogData<'_>, XESParseError> {
    let gz: GzDecoder<&[u8]> = GzDecoder::new(xes_data);
    XESParsingTraceStream::try_new(Box::new(BufReader::new(gz)), options)
}

///
/// Stream XES [`Trace`]s from path (auto-detecting gz compression from file extension)
///
pub fn stream_xes_from_path<'a, P: AsRef<Path>>(
    path: P,
    options: XESImportOptions,
) -> Result<XESParsingStreamAndLogData<'a>, XESParseError> {
    let file = File::open(path.as_ref())?;
    if is_gz_path(path.as_ref()) {
        XESParsingTraceStream::try_new(Box::new(BufReader::new(GzDecoder::new(file))), options)
    } else {
        XESParsingTraceStream::try_new(Box::new(BufReader::new(file)), options)
    }
}

fn get_attribute_string(t: &BytesStart<'_>, key: &'static str) -> String {
    if let Ok(Some(attr)) = t.try_get_attribute(key) {
        return String::from_utf8_lossy(&attr.value).to_string();
    }
    log::debug!(
        "Did not find expected XML attribute with key {}. Will assume empty string as value.",
        key
    );
    String::new()
}

fn parse_attribute_value_from_tag(
    t: &BytesStart<'_>,
    mode: Mode,
    options: &XESImportOptions,
) -> AttributeValue {
    let value = get_attribute_string(t, "value");
    let attribute_val: Option<AttributeValue> = match t.name().as_ref() {
        b"string" => Some(AttributeValue::String(
            unescape(&value).map(|s| s.into_owned()).unwrap_or(value),
        )),
        b"date" => {
            let parsed = parse_date_from_str(&value, &options.date_format);
            if parsed.is_none() {
                log::warn!("Failed to parse date from {:?}", value);
            }
            parsed.map(AttributeValue::Date)
        }
        b"int" => Some(AttributeValue::Int(parse_or_default(&value, "integer"))),
        b"float" => Some(AttributeValue::Float(parse_or_default(&value, "float"))),
        b"boolean" => Some(AttributeValue::Boolean(parse_or_default(&value, "boolean"))),
        b"id" => Some(AttributeValue::ID(parse_or_default::<Uuid>(&value, "UUID"))),
        b"container" => Some(AttributeValue::Container(Attributes::new())),
        b"list" => Some(AttributeValue::List(Vec::new())),
        name => {
            if mode != Mode::Log {
                log::warn!(
                    "Attribute type not implemented '{}' in mode {:?}",
                    String::from_utf8_lossy(name),
                    mode
                );
            }
            None
        }
    };
    attribute_val.unwrap_or(AttributeValue::None())
}

fn parse_or_default<T>(value: &str, type_name: &str) -> T
where
    T: FromStr + Default,
    T::Err: std::fmt::Display,
{
    value.parse::<T>().unwrap_or_else(|e| {
        log::warn!("Could not parse {} {:?}: Error {}", type_name, value, e);
        T::default()
    })
}

fn parse_date_from_str(value: &str, date_format: &Option<String>) -> Option<DateTime<Utc>> {
    if let Some(date_format) = &date_format {
        if let Ok(dt) = DateTime::parse_from_str(value, date_format) {
            return Some(dt.into());
        }
        // Without time-zone, assuming UTC
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, date_format) {
            return Some(dt.and_utc());
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.into());
    }

    if let Ok(dt) = DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S:%f%:z") {
        return Some(dt.into());
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.and_utc());
    }

    None
}
