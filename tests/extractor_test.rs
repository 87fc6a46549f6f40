//! Field extraction tests
//!
//! Tests that verify integers are pulled out of `smtpctl show stats` output.

use smtpd_exporter::config::default_fields;
use smtpd_exporter::error::ExporterError;
use smtpd_exporter::extractor::{extract, FieldPattern};

const STATS: &str = "bounce.envelope=0
bounce.message=0
control.session=1
mta.connector=0
queue.bounce=486
queue.evpcache.load.hit=12726
queue.evpcache.update.hit=4
scheduler.delivery.ok=5318
scheduler.delivery.permfail=972
scheduler.delivery.tempfail=4
scheduler.envelope=0
smtp.session.inet4=5707
smtp.session.local=507
uptime=1021331
uptime.human=11d19h42m11s
";

const OK_PATTERN: &str = r"scheduler\.delivery\.ok=(?P<number>\d+)";

#[test]
fn test_extract_delivery_ok() {
    // Given: Real smtpctl output and the delivery.ok pattern
    // When: Extracting
    let value = extract(OK_PATTERN, "scheduler.delivery.ok=5318");

    // Then: The integer is returned
    assert_eq!(value.unwrap(), 5318);
}

#[test]
fn test_extract_all_default_fields_from_full_output() {
    let values: Vec<u64> = default_fields()
        .iter()
        .map(|f| FieldPattern::new(&f.pattern).unwrap().extract(STATS).unwrap())
        .collect();

    assert_eq!(values, vec![5318, 972, 4]);
}

#[test]
fn test_missing_field_is_not_found() {
    // Given: Output without the delivery counters
    let raw = "bounce.envelope=0\nuptime.human=11d19h42m11s\n";

    // When: Extracting delivery.ok
    let result = extract(OK_PATTERN, raw);

    // Then: FieldNotFound is reported
    assert!(matches!(result, Err(ExporterError::FieldNotFound(_))));
}

#[test]
fn test_empty_output_is_not_found() {
    let pattern = FieldPattern::new(OK_PATTERN).unwrap();

    assert!(matches!(
        pattern.extract(""),
        Err(ExporterError::FieldNotFound(_))
    ));
}

#[test]
fn test_optional_group_that_did_not_participate_is_not_found() {
    // The group is optional, so the regex matches without capturing anything
    let pattern = FieldPattern::new(r"uptime=(\d+)?").unwrap();

    assert!(matches!(
        pattern.extract("uptime=abc"),
        Err(ExporterError::FieldNotFound(_))
    ));
}

#[test]
fn test_non_integer_capture_is_rejected() {
    // Given: A pattern whose group can capture non-digits
    let pattern = FieldPattern::new(r"uptime\.human=(\S+)").unwrap();

    // When: The captured text is not a number
    let result = pattern.extract(STATS);

    // Then: ValueNotInteger carries the offending text
    match result {
        Err(ExporterError::ValueNotInteger(text)) => assert_eq!(text, "11d19h42m11s"),
        other => panic!("expected ValueNotInteger, got {:?}", other),
    }
}

#[test]
fn test_negative_capture_is_rejected() {
    let pattern = FieldPattern::new(r"delta=(-?\d+)").unwrap();

    assert!(matches!(
        pattern.extract("delta=-12"),
        Err(ExporterError::ValueNotInteger(_))
    ));
}

#[test]
fn test_overflowing_capture_is_rejected() {
    let pattern = FieldPattern::new(r"big=(\d+)").unwrap();

    assert!(matches!(
        pattern.extract("big=99999999999999999999999"),
        Err(ExporterError::ValueNotInteger(_))
    ));
}

#[test]
fn test_first_match_wins() {
    let pattern = FieldPattern::new(r"ok=(\d+)").unwrap();

    assert_eq!(pattern.extract("ok=1\nok=2\n").unwrap(), 1);
}

#[test]
fn test_invalid_pattern_reported() {
    let result = extract(r"ok=(\d+", "ok=1");

    assert!(matches!(result, Err(ExporterError::PatternInvalid { .. })));
}

#[test]
fn test_pattern_source_is_preserved() {
    let pattern = FieldPattern::new(OK_PATTERN).unwrap();

    assert_eq!(pattern.as_str(), OK_PATTERN);
}
