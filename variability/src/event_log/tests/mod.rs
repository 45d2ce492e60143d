use crate::{
    compute_edit_distance_variability, compute_prefix_entropy, import_xes_slice, import_xes_str,
    stream_xes_slice, EventLogActivityProjection, ProgressOptions, XESImportOptions,
};

use super::XESEditableAttribute;

mod xes_classifier_tests;

const RUNNING_EXAMPLE: &[u8] = include_bytes!("./test_data/running-example.xes");

#[test]
fn test_event_log_attribute_helpers() {
    let mut log = import_xes_slice(RUNNING_EXAMPLE, false, XESImportOptions::default()).unwrap();
    // Global trace attribute for "concept:name" is set to "__INVALID__"
    let trace = log.traces.last_mut().unwrap();
    let concept_name = trace
        .attributes
        .get_by_key_or_global("concept:name", &log.global_trace_attrs)
        .and_then(|a| a.value.try_as_string())
        .unwrap();
    assert_eq!(concept_name, "6");
    // ...but if we remove this attribute...
    assert!(trace.attributes.remove_with_key("concept:name"));
    assert!(!trace.attributes.remove_with_key("concept:name"));
    // ...the global attribute value is used
    let concept_name_after = trace
        .attributes
        .get_by_key_or_global("concept:name", &log.global_trace_attrs)
        .and_then(|a| a.value.try_as_string())
        .unwrap();
    assert_eq!(concept_name_after, "__INVALID__");
}

#[test]
fn test_running_example_variability() {
    let log = import_xes_slice(RUNNING_EXAMPLE, false, XESImportOptions::default()).unwrap();
    let projection: EventLogActivityProjection = (&log).into();
    let progress = ProgressOptions::hidden();

    // Cases 2 and 6 share a variant
    assert_eq!(projection.log_size(), 6);
    assert_eq!(projection.variant_count(), 5);
    assert_eq!(projection.traces[1], (vec![0, 2, 5, 3, 6], 2));
    assert_eq!(
        projection.format_variant(&projection.traces[0].0),
        "<register request, examine thoroughly, check ticket, decide, reject request>"
    );

    // Distances to the first variant: 3 (weight 2), 2, 2 and 1
    let ed = compute_edit_distance_variability(&projection, &progress);
    assert_eq!(ed, 11.0 / 4.0);

    // 13 prefixes over a total variant length of 25:
    // two prefixes shared by all 5 variants, four by 2 variants and seven by a single one
    let expected: f64 = -[(2.0, 5.0), (4.0, 2.0), (7.0, 1.0)]
        .iter()
        .map(|(n, count): &(f64, f64)| {
            let p = count / 25.0;
            n * p * p.log10()
        })
        .sum::<f64>();
    let entropy = compute_prefix_entropy(&projection, &progress);
    assert!((entropy - expected).abs() < 1e-9);
}

#[test]
fn test_streamed_projection_uses_global_event_attributes() {
    let xes = r#"<?xml version="1.0" encoding="UTF-8" ?>
<log xes.version="1.0">
    <global scope="event">
        <string key="concept:name" value="DEFAULT"/>
    </global>
    <trace>
        <event><string key="concept:name" value="a"/></event>
        <event><string key="org:resource" value="Pete"/></event>
    </trace>
</log>"#;
    let log = import_xes_str(xes, XESImportOptions::default()).unwrap();
    let imported: EventLogActivityProjection = (&log).into();

    let (mut stream, _log_data) =
        stream_xes_slice(xes.as_bytes(), XESImportOptions::default()).unwrap();
    let streamed: EventLogActivityProjection = (&mut stream).into();
    assert!(stream.check_for_errors().is_none());

    assert_eq!(streamed.activities, vec!["a", "DEFAULT"]);
    assert_eq!(streamed, imported);
}

#[test]
fn test_streamed_projection_matches_import() {
    let log = import_xes_slice(RUNNING_EXAMPLE, false, XESImportOptions::default()).unwrap();
    let classifier = log.get_classifier_by_name("Activity and Resource").unwrap();

    let (mut stream, log_data) =
        stream_xes_slice(RUNNING_EXAMPLE, XESImportOptions::default()).unwrap();
    assert!(log_data.classifiers.contains(&classifier));
    let streamed = EventLogActivityProjection::from_xes_stream(&mut stream, Some(&classifier));

    assert_eq!(
        streamed,
        EventLogActivityProjection::from_event_log_with_classifier(&log, Some(&classifier))
    );
    assert_eq!(streamed.log_size(), 6);
}
