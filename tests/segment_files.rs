//! Segment files written to disk and read back.

use eventline::{
    classify, control, ControlEvent, Entry, FrameError, LinePosition, SegmentReader,
    SegmentWriter, SubscriberId,
};
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use tempfile::TempDir;

fn writer_for(dir: &TempDir) -> SegmentWriter<BufWriter<File>> {
    let file = File::create(dir.path().join("segment.log")).unwrap();
    SegmentWriter::new(BufWriter::new(file))
}

#[test]
fn test_chunk_lifecycle_roundtrip() {
    let dir = TempDir::new().unwrap();
    let mut writer = writer_for(&dir);

    let mut activity = BTreeMap::new();
    activity.insert("/tenants/foo".to_string(), "1:0:2".to_string());

    let events = vec![
        ControlEvent::initialized(),
        ControlEvent::authority_changed(vec!["127.0.0.1:7000".to_string()]),
        ControlEvent::subscribed(SubscriberId(1)),
        ControlEvent::subscription_activity(activity),
        ControlEvent::child_created("/tenants/foo/events"),
        ControlEvent::unsubscribed(SubscriberId(1)),
        ControlEvent::rotated("/tenants/foo:1:0:127.0.0.1"),
    ];
    let payloads = ["{\"n\":1}", ".dot first", "\\slash first", ""];

    writer.append_event(&events[0]).unwrap();
    for payload in payloads {
        writer.append_data(payload).unwrap();
    }
    for event in &events[1..] {
        writer.append_event(event).unwrap();
    }
    writer.flush().unwrap();
    assert_eq!(writer.lines_written(), 11);
    drop(writer);

    let entries: Vec<Entry> = SegmentReader::open(dir.path().join("segment.log"))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(entries.len(), 11);

    let data: Vec<&str> = entries
        .iter()
        .filter_map(|e| match e {
            Entry::Data(d) => Some(d.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(data, payloads);

    let controls: Vec<&ControlEvent> = entries
        .iter()
        .filter_map(|e| match e {
            Entry::Control(c) => Some(c),
            _ => None,
        })
        .collect();
    assert_eq!(controls, events.iter().collect::<Vec<_>>());
}

#[test]
fn test_foreign_control_lines_survive_rewrite() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("segment.log");
    fs::write(
        &path,
        "a\n.FutureFeature {\"x\":1}\n.Initialized {\"ts\":\"2017-03-03T19:33:49.709Z\"}\n",
    )
    .unwrap();

    let copy_path = dir.path().join("copy.log");
    let mut copy = SegmentWriter::new(File::create(&copy_path).unwrap());
    for entry in SegmentReader::open(&path).unwrap() {
        match entry.unwrap() {
            Entry::Data(data) => copy.append_data(&data).unwrap(),
            Entry::Control(event) => copy.append_event(&event).unwrap(),
        }
    }
    copy.flush().unwrap();

    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        fs::read_to_string(&copy_path).unwrap()
    );
}

#[test]
fn test_corruption_is_located() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("segment.log");
    {
        let mut writer = SegmentWriter::new(File::create(&path).unwrap());
        writer.append_event(&ControlEvent::initialized()).unwrap();
        writer.append_data("payload").unwrap();
        writer.flush().unwrap();
    }
    let offset = fs::metadata(&path).unwrap().len();

    // A producer that bypassed escaping.
    let mut file = OpenOptions::new().append(true).open(&path).unwrap();
    file.write_all(b".oops, not escaped\nnever read\n").unwrap();

    let results: Vec<_> = SegmentReader::open(&path).unwrap().collect();
    assert_eq!(results.len(), 3);
    assert!(results[0].is_ok());
    assert!(results[1].is_ok());

    let err = results[2].as_ref().unwrap_err();
    assert_eq!(err.position(), Some(LinePosition { line: 3, offset }));
    assert_eq!(err.raw_line(), Some(".oops, not escaped"));
    match err {
        FrameError::At { source, .. } => {
            assert!(matches!(**source, FrameError::FramingViolation { .. }))
        }
        other => panic!("Expected located error, got {:?}", other),
    }
}

#[test]
fn test_manual_classification_matches_reader() {
    let text = "x\n\\.y\n.Subscribed {\"id\":3,\"ts\":\"2017-03-03T19:33:49.709Z\"}\n";
    for line in text.lines() {
        let classified = classify(line);
        if classified.is_control() {
            let event = control::parse(classified.payload()).unwrap();
            assert_eq!(event.kind(), "Subscribed");
        }
    }
}
