use chrono::{serde::ts_milliseconds, DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::constants::ACTIVITY_NAME;

///
/// Possible attribute values according to the XES Standard
///
/// Tip: If you know the expected `AttributeValue` type, make use of the `try_as_xxx` functions (e.g., [`AttributeValue::try_as_string`])
///
/// ```rust
/// use trace_variability::event_log::AttributeValue;
/// let v = AttributeValue::String("Create Fine".to_string());
///
/// assert_eq!(v.try_as_string().map(String::as_str), Some("Create Fine"));
/// assert!(v.try_as_int().is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "content")]
pub enum AttributeValue {
    /// String values
    String(String),
    #[serde(with = "ts_milliseconds")]
    /// DateTime values
    Date(DateTime<Utc>),
    /// Integer values
    Int(i64),
    /// Float values
    Float(f64),
    /// Boolean values
    Boolean(bool),
    /// IDs (UUIDs)
    ID(Uuid),
    /// List of other Attributes (where order matters; might contain multiple child attributes with the same key)
    List(Vec<Attribute>),
    /// Container of other Attributes (where order does not matter)
    Container(Attributes),
    /// Used to represent invalid values (e.g., DateTime which could not be parsed)
    None(),
}

/// Typed accessors, each returning `None` if the value is of a different variant
impl AttributeValue {
    /// Inner value of [`AttributeValue::String`]
    pub fn try_as_string(&self) -> Option<&String> {
        match self {
            AttributeValue::String(v) => Some(v),
            _ => None,
        }
    }

    /// Inner value of [`AttributeValue::Date`]
    pub fn try_as_date(&self) -> Option<&DateTime<Utc>> {
        match self {
            AttributeValue::Date(v) => Some(v),
            _ => None,
        }
    }

    /// Inner value of [`AttributeValue::Int`]
    pub fn try_as_int(&self) -> Option<&i64> {
        match self {
            AttributeValue::Int(v) => Some(v),
            _ => None,
        }
    }

    /// Children of an [`AttributeValue::List`] (the entries of a nested XES `<list>`)
    pub fn try_as_list(&self) -> Option<&Attributes> {
        match self {
            AttributeValue::List(v) => Some(v),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
///
/// Attribute made up of the key and value
///
pub struct Attribute {
    /// Attribute key
    pub key: String,
    /// Attribute value
    pub value: AttributeValue,
    /// Child attributes (nested)
    pub own_attributes: Option<Attributes>,
}

impl Attribute {
    ///
    /// Helper to create a new attribute
    ///
    pub fn new(key: String, attribute_val: AttributeValue) -> Self {
        Self {
            key,
            value: attribute_val,
            own_attributes: None,
        }
    }
}

///
/// Attributes are [`Vec`]s of [`Attribute`]s
///
/// See the [`XESEditableAttribute`] trait for convenient functions to add, look up or remove attributes by keys.
///
/// ```rust
/// use trace_variability::event_log::{Attribute, AttributeValue, XESEditableAttribute};
/// let attrs = vec![Attribute::new("org:resource".to_string(), AttributeValue::Int(42))];
///
/// let i = attrs.get_by_key("org:resource").and_then(|a| a.value.try_as_int()).unwrap();
/// assert_eq!(*i, 42);
/// ```
pub type Attributes = Vec<Attribute>;

///
/// Trait to easily add and look up attributes
///
pub trait XESEditableAttribute {
    ///
    /// Add a new attribute (with key and value)
    ///
    /// Note: Does _not_ check if attribute was already present.
    ///
    fn add_to_attributes(&mut self, key: String, value: AttributeValue);
    ///
    /// Add a new attribute
    ///
    fn add_attribute(&mut self, attr: Attribute);
    ///
    /// Get an attribute by key
    ///
    /// _Complexity_: Does linear lookup (i.e., in O(n)).
    fn get_by_key(&self, key: &str) -> Option<&Attribute>;
    ///
    /// Get an attribute by key or the default value (e.g., provided by global event or trace attributes)
    ///
    fn get_by_key_or_global<'a>(
        &'a self,
        key: &str,
        global_attrs: &'a Option<Attributes>,
    ) -> Option<&'a Attribute>;
    ///
    /// Remove attribute with given key
    ///
    /// Returns `true` if the attribute was present and `false` otherwise
    ///
    fn remove_with_key(&mut self, key: &str) -> bool;
}

impl XESEditableAttribute for Attributes {
    fn add_to_attributes(&mut self, key: String, value: AttributeValue) {
        self.push(Attribute::new(key, value));
    }

    fn add_attribute(&mut self, a: Attribute) {
        self.push(a);
    }

    fn get_by_key(&self, key: &str) -> Option<&Attribute> {
        self.iter().find(|attr| attr.key == key)
    }

    fn get_by_key_or_global<'a>(
        &'a self,
        key: &str,
        global_attrs: &'a Option<Attributes>,
    ) -> Option<&'a Attribute> {
        self.get_by_key(key).or_else(|| {
            global_attrs
                .as_ref()
                .and_then(|globals| globals.get_by_key(key))
        })
    }

    fn remove_with_key(&mut self, key: &str) -> bool {
        match self.iter().position(|a| a.key == key) {
            Some(index) => {
                self.remove(index);
                true
            }
            None => false,
        }
    }
}

///
/// An event consists of multiple (event) attributes ([Attributes])
///
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Event {
    /// Event attributes
    pub attributes: Attributes,
}
impl Event {
    /// Create a new event with the provided activity
    ///
    /// Implicitly assumes usage of the concept XES extension (i.e., uses [`ACTIVITY_NAME`] as key)
    pub fn new(activity: String) -> Self {
        Event {
            attributes: vec![Attribute::new(
                ACTIVITY_NAME.to_string(),
                AttributeValue::String(activity),
            )],
        }
    }
}

///
/// A trace consists of a list of events and trace attributes (See also [`Event`] and [`Attributes`])
///
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Trace {
    /// Trace-level attributes
    pub attributes: Attributes,
    /// Events contained in trace
    pub events: Vec<Event>,
}

impl Trace {
    /// Create a trace of events with the given activities (and no trace attributes)
    pub fn from_activities<I, S>(activities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Trace {
            attributes: Attributes::new(),
            events: activities
                .into_iter()
                .map(|act| Event::new(act.into()))
                .collect(),
        }
    }
}

///
/// Event log consisting of a list of [`Trace`]s and log [`Attributes`]
///
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct EventLog {
    /// Top-level attributes
    pub attributes: Attributes,
    /// Traces contained in log
    pub traces: Vec<Trace>,
    /// XES Extensions
    pub extensions: Option<Vec<EventLogExtension>>,
    /// XES Event classifiers
    pub classifiers: Option<Vec<EventLogClassifier>>,
    /// Global trace attributes
    pub global_trace_attrs: Option<Attributes>,
    ///  Global event attributes
    pub global_event_attrs: Option<Attributes>,
}

impl EventLog {
    ///
    /// Try to get the [`EventLogClassifier`] with the associated name
    ///
    pub fn get_classifier_by_name<S>(&self, name: S) -> Option<EventLogClassifier>
    where
        std::string::String: PartialEq<S>,
    {
        self.classifiers
            .as_ref()
            .and_then(|classifiers| classifiers.iter().find(|c| c.name == name).cloned())
    }

    ///
    /// Get an event attribute value using a key
    ///
    /// Uses global event attributes of the event log (if any) as fallback
    ///
    pub fn get_event_attribute<'a>(&'a self, event: &'a Event, key: &str) -> Option<&'a Attribute> {
        event
            .attributes
            .get_by_key_or_global(key, &self.global_event_attrs)
    }

    /// Total number of events over all traces
    pub fn num_events(&self) -> usize {
        self.traces.iter().map(|t| t.events.len()).sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
/// An XES Extension
pub struct EventLogExtension {
    /// Extension name
    pub name: String,
    /// Prefix of attributes defined by the extension
    pub prefix: String,
    /// URI pointing to XESEXT of the XES extension
    pub uri: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
/// Event classifier
///
/// Enables classifying events by a set of attributes to consider for the _class identity_
pub struct EventLogClassifier {
    /// Name of the classifier
    pub name: String,
    /// List of attribute keys to consider for the _class identity_
    pub keys: Vec<String>,
}
impl EventLogClassifier {
    /// Delimiter for combining the values defined by the classifer to form a single class identity string
    pub const DELIMITER: &'static str = "+";
    ///
    /// Get the class identity (joined with [`EventLogClassifier::DELIMITER`])
    ///
    /// Missing attributes and attributes with a type different than [`AttributeValue::String`] are represented by an empty String.
    ///
    pub fn get_class_identity(&self, ev: &Event) -> String {
        self.get_class_identity_with_globals(ev, &None)
    }
    ///
    /// Get the class identity (joined with [`EventLogClassifier::DELIMITER`]) using the global event attributes for default values
    ///
    pub fn get_class_identity_with_globals(
        &self,
        ev: &Event,
        global_attrs: &Option<Attributes>,
    ) -> String {
        self.keys
            .iter()
            .map(|k| {
                ev.attributes
                    .get_by_key_or_global(k, global_attrs)
                    .and_then(|at| at.value.try_as_string())
                    .map(String::as_str)
                    .unwrap_or_default()
            })
            .collect::<Vec<&str>>()
            .join(Self::DELIMITER)
    }
}
