/// Common identifying field for event identities (i.e., activities)
///
/// _Note_: While the concept XES extension is the de-facto standard for identifying activity names,
/// some XES files might not use `concept:name` or have events without a `concept:name` attribute.
/// Use an [`EventLogClassifier`](super::EventLogClassifier) in that case.
pub const ACTIVITY_NAME: &str = "concept:name";
/// Activity label used for events that carry no (string) activity value
pub const NO_ACTIVITY: &str = "No Activity";
