use crate::{
    event_log::tests::RUNNING_EXAMPLE, import_xes_slice, EventLogActivityProjection,
    XESImportOptions,
};

#[test]
fn test_classifiers_are_parsed() {
    let log = import_xes_slice(RUNNING_EXAMPLE, false, XESImportOptions::default()).unwrap();
    let classifiers = log.classifiers.as_ref().unwrap();
    assert_eq!(classifiers.len(), 2);
    let classifier = log.get_classifier_by_name("Activity and Resource").unwrap();
    assert_eq!(classifier.keys, vec!["concept:name", "org:resource"]);
    assert!(log.get_classifier_by_name("Missing").is_none());

    let first_event = &log.traces[0].events[0];
    assert_eq!(
        classifier.get_class_identity(first_event),
        "register request+Pete"
    );
}

#[test]
fn test_classifier_global_fallback() {
    let log = import_xes_slice(RUNNING_EXAMPLE, false, XESImportOptions::default()).unwrap();
    let classifier = crate::event_log::EventLogClassifier {
        name: "Lifecycle".to_string(),
        keys: vec!["concept:name".to_string(), "lifecycle:transition".to_string()],
    };
    let first_event = &log.traces[0].events[0];
    assert_eq!(classifier.get_class_identity(first_event), "register request+");
    assert_eq!(
        classifier.get_class_identity_with_globals(first_event, &log.global_event_attrs),
        "register request+complete"
    );
}

#[test]
fn test_projection_with_classifier() {
    let log = import_xes_slice(RUNNING_EXAMPLE, false, XESImportOptions::default()).unwrap();
    let classifier = log.get_classifier_by_name("Activity and Resource").unwrap();
    let projection =
        EventLogActivityProjection::from_event_log_with_classifier(&log, Some(&classifier));
    // Resources make cases 2 and 6 the only shared variant still
    assert_eq!(projection.variant_count(), 5);
    assert!(projection.activities.len() > 7);
    assert_eq!(projection.activities[0], "register request+Pete");
}
