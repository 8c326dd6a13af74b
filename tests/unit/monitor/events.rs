use super::*;

#[test]
fn log_keeps_arrival_order_and_last_value() {
    let log = MetricsLog::new();
    log.send(MetricEvent::new("file/video/width", 1920u32));
    log.send(MetricEvent::new("file/video/field", "upper"));
    log.send(MetricEvent::new("file/video/width", 1280u32));

    assert_eq!(log.len(), 3);
    assert_eq!(log.last("file/video/width"), Some(MetricValue::Int(1280)));
    assert_eq!(
        log.last("file/video/field"),
        Some(MetricValue::Text("upper".to_string()))
    );
    assert_eq!(log.last("file/video/codec"), None);
}

#[test]
fn values_serialize_untagged() {
    let json = serde_json::to_string(&MetricEvent::new("file/video/height", 576u32)).unwrap();
    assert_eq!(json, r#"{"path":"file/video/height","value":576}"#);
}
