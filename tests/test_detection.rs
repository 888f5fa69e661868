extern crate frame_detect;

mod common;

use frame_detect::common::{select_best, DetectionEvent};
use frame_detect::detection_runners::Pipeline;
use common::*;

#[cfg(test)]
#[test]
fn detection() {
    init_logger();

    let session = session(ScriptedEngine::new(overlapping_pair()));
    let result = session.detect_once(&frame(100, 100, 128)).unwrap();

    // element 0 is suppressed by element 1, element 2 is under the threshold
    assert_eq!(result.len(), 1);
    let best = &result.boxes[0];
    assert_eq!(best.class_id(), 1);
    assert_eq!(best.class_name(), "laptop");
    assert!((best.confidence() - 0.9).abs() < 1e-6);

    let (x1, y1, x2, y2) = best.xy1_xy2();
    assert!((x1 - 0.170_588).abs() < 1e-4);
    assert!((y1 - 0.1).abs() < 1e-4);
    assert!((x2 - 0.570_588).abs() < 1e-4);
    assert!((y2 - 0.5).abs() < 1e-4);
    assert_eq!(best.label_text(), "laptop 0.90");
}

#[test]
fn detection_through_pipeline_and_selection() {
    init_logger();

    let (pipeline, events) = Pipeline::spawn(session(ScriptedEngine::new(overlapping_pair()))).unwrap();
    assert!(pipeline.select_best().is_none());

    assert_eq!(pipeline.offer(frame(100, 100, 200)), frame_detect::Admission::Admitted);
    match events.recv_timeout(TIMEOUT).unwrap() {
        DetectionEvent::Detections { boxes, .. } => {
            assert_eq!(boxes.len(), 1);
            assert_eq!(boxes[0].class_name(), "laptop");
        }
        DetectionEvent::Empty => panic!("expected detections"),
    }

    let selection = pipeline.select_best().unwrap();
    assert_eq!(selection.bbox.class_id(), 1);
    assert!((16..=17).contains(&selection.rect.x));
    assert!((9..=10).contains(&selection.rect.y));
    assert!((39..=40).contains(&selection.rect.width));
    assert!((39..=40).contains(&selection.rect.height));
    assert_eq!(selection.crop.dimensions(), (selection.rect.width, selection.rect.height));
    assert_eq!(selection.crop.get_pixel(0, 0).0, [200, 200, 200, 200]);

    let (latest_frame, latest) = pipeline.gate().latest().unwrap();
    assert_eq!(latest_frame.width(), 100);
    assert!(select_best(&latest, &latest_frame).is_some());

    pipeline.shutdown();
}

#[test]
fn warm_up_runs_one_cycle() {
    init_logger();

    let engine = ScriptedEngine::new(overlapping_pair());
    let counters = engine.counters();
    let session = session(engine);

    frame_detect::warm_up(&session).unwrap();
    assert_eq!(counters.calls(), 1);
    assert_eq!(session.timings().n(), 1);
}
