use std::borrow::Cow;
use std::collections::HashMap;

use itertools::Itertools;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::constants::{ACTIVITY_NAME, NO_ACTIVITY};
use super::event_log_struct::{Attributes, Event, EventLog, EventLogClassifier, Trace};
use super::stream_xes::XESParsingTraceStream;
use super::XESEditableAttribute;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
/// Projection of an event log on just activity labels
///
/// Each activity gets an integer code in order of its first occurrence in the log.
/// Traces with the same activity sequence are merged into a single _variant_,
/// stored together with its frequency (in order of first occurrence).
///
/// By default the activity of an event is its [`ACTIVITY_NAME`] value; see
/// [`EventLogActivityProjection::from_event_log_with_classifier`] to use an [`EventLogClassifier`] instead.
pub struct EventLogActivityProjection {
    /// Activity labels, indexed by their code
    pub activities: Vec<String>,
    /// Lookup from activity label to code
    pub act_to_index: HashMap<String, usize>,
    /// Distinct activity code sequences (variants) with their frequency
    pub traces: Vec<(Vec<usize>, u64)>,
}

/// Incrementally assigns activity codes and merges equal traces
#[derive(Debug, Default)]
struct ProjectionBuilder {
    activities: Vec<String>,
    act_to_index: HashMap<String, usize>,
    traces: Vec<(Vec<usize>, u64)>,
    variant_positions: HashMap<Vec<usize>, usize>,
}

impl ProjectionBuilder {
    fn activity_code(&mut self, act: &str) -> usize {
        if let Some(index) = self.act_to_index.get(act) {
            return *index;
        }
        let new_act_index = self.activities.len();
        self.activities.push(act.to_string());
        self.act_to_index.insert(act.to_string(), new_act_index);
        new_act_index
    }

    fn push_trace<S: AsRef<str>>(&mut self, acts: impl IntoIterator<Item = S>) {
        let trace_acts: Vec<usize> = acts
            .into_iter()
            .map(|act| self.activity_code(act.as_ref()))
            .collect();
        match self.variant_positions.get(&trace_acts) {
            Some(pos) => self.traces[*pos].1 += 1,
            None => {
                self.variant_positions
                    .insert(trace_acts.clone(), self.traces.len());
                self.traces.push((trace_acts, 1));
            }
        }
    }

    fn finish(self) -> EventLogActivityProjection {
        EventLogActivityProjection {
            activities: self.activities,
            act_to_index: self.act_to_index,
            traces: self.traces,
        }
    }
}

/// Activity of an event, either its [`ACTIVITY_NAME`] string or the class identity of `classifier`
fn event_activity<'a>(
    event: &'a Event,
    classifier: Option<&EventLogClassifier>,
    global_event_attrs: &'a Option<Attributes>,
) -> Cow<'a, str> {
    match classifier {
        Some(classifier) => {
            Cow::Owned(classifier.get_class_identity_with_globals(event, global_event_attrs))
        }
        None => event
            .attributes
            .get_by_key_or_global(ACTIVITY_NAME, global_event_attrs)
            .and_then(|attr| attr.value.try_as_string())
            .map(|s| Cow::Borrowed(s.as_str()))
            .unwrap_or(Cow::Borrowed(NO_ACTIVITY)),
    }
}

impl EventLogActivityProjection {
    ///
    /// Project an [`EventLog`], using the class identity of `classifier` as activity
    ///
    /// Activities of traces are extracted in parallel; codes and variants are still assigned in log order.
    ///
    pub fn from_event_log_with_classifier(
        log: &EventLog,
        classifier: Option<&EventLogClassifier>,
    ) -> Self {
        let acts_per_trace: Vec<Vec<Cow<'_, str>>> = log
            .traces
            .par_iter()
            .map(|t| {
                t.events
                    .iter()
                    .map(|e| event_activity(e, classifier, &log.global_event_attrs))
                    .collect()
            })
            .collect();
        let mut builder = ProjectionBuilder::default();
        for acts in acts_per_trace {
            builder.push_trace(acts);
        }
        builder.finish()
    }

    ///
    /// Project a stream of [`Trace`]s without keeping the traces themselves in memory
    ///
    pub fn from_traces<I>(
        traces: I,
        classifier: Option<&EventLogClassifier>,
        global_event_attrs: &Option<Attributes>,
    ) -> Self
    where
        I: IntoIterator<Item = Trace>,
    {
        let mut builder = ProjectionBuilder::default();
        for t in traces {
            builder.push_trace(
                t.events
                    .iter()
                    .map(|e| event_activity(e, classifier, global_event_attrs)),
            );
        }
        builder.finish()
    }

    ///
    /// Project the remaining traces of an XES stream
    ///
    /// Global event attributes declared by the log serve as fallback values, just as for
    /// [`EventLogActivityProjection::from_event_log_with_classifier`]. Parsing errors end the
    /// stream early; check for them afterwards using [`XESParsingTraceStream::check_for_errors`].
    ///
    pub fn from_xes_stream(
        stream: &mut XESParsingTraceStream<'_>,
        classifier: Option<&EventLogClassifier>,
    ) -> Self {
        let global_event_attrs = Some(stream.global_event_attrs().clone())
            .filter(|attrs| !attrs.is_empty());
        Self::from_traces(&mut *stream, classifier, &global_event_attrs)
    }

    /// Total number of traces in the projected log (i.e., the sum of all variant frequencies)
    pub fn log_size(&self) -> u64 {
        self.traces.iter().map(|(_, frequency)| frequency).sum()
    }

    /// Number of distinct variants
    pub fn variant_count(&self) -> usize {
        self.traces.len()
    }

    ///
    /// Distribution of variant frequencies
    ///
    /// Returns pairs of _(frequency, number of variants occurring exactly that often)_,
    /// ordered by the first variant with the respective frequency.
    ///
    pub fn trace_frequencies(&self) -> Vec<(u64, usize)> {
        self.traces
            .iter()
            .map(|(_, frequency)| *frequency)
            .counts_by(|frequency| frequency)
            .into_iter()
            .sorted_by_key(|(frequency, _)| {
                self.traces
                    .iter()
                    .position(|(_, f)| f == frequency)
                    .unwrap_or(usize::MAX)
            })
            .collect()
    }

    /// Activity labels of the given codes (in the given order); unknown codes are skipped
    pub fn acts_to_names(&self, acts: &[usize]) -> Vec<&str> {
        acts.iter()
            .filter_map(|act| self.activities.get(*act))
            .map(String::as_str)
            .collect()
    }

    /// Human-readable representation of a variant, e.g. `<a, b, c>`
    pub fn format_variant(&self, acts: &[usize]) -> String {
        format!("<{}>", self.acts_to_names(acts).iter().join(", "))
    }
}

impl From<&EventLog> for EventLogActivityProjection {
    fn from(val: &EventLog) -> Self {
        Self::from_event_log_with_classifier(val, None)
    }
}

impl<'a> From<&mut XESParsingTraceStream<'a>> for EventLogActivityProjection {
    fn from(value: &mut XESParsingTraceStream<'a>) -> Self {
        Self::from_xes_stream(value, None)
    }
}
