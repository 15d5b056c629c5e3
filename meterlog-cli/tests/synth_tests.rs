use std::fs;
use tempfile::tempdir;

use meterlog_cli::commands::synth;
use meterlog_core::{constants::ChecksumKind, scanner::scan_stream, validator::FrameValidator};

fn write_file<P: AsRef<std::path::Path>>(p: P, s: &str) {
    fs::write(p, s.as_bytes()).unwrap();
}

#[test]
fn synth_values_roundtrip_through_scanner() {
    let td = tempdir().unwrap();
    let in_path = td.path().join("values.json");
    let out_path = td.path().join("capture.bin");

    write_file(&in_path, r#"["0A1B2C3D4E", "0000000001", "ffffffffff"]"#);

    let count = synth::execute(
        in_path.to_str().unwrap(),
        out_path.to_str().unwrap(),
        /*noise*/ 9,
        ChecksumKind::Xor,
    )
    .unwrap();
    assert_eq!(count, 3);

    let bytes = fs::read(&out_path).unwrap();
    assert_eq!(bytes.len(), 3 * (9 + 110));
    assert!(bytes[..9].iter().all(|b| *b == synth::NOISE_BYTE));

    let frames = scan_stream(&bytes);
    let values: Vec<String> = frames.iter().map(|lf| lf.frame.extract().to_string()).collect();
    assert_eq!(values, vec!["0A1B2C3D4E", "0000000001", "FFFFFFFFFF"]);

    for lf in &frames {
        assert!(FrameValidator::strict().validate(&lf.frame).is_ok());
    }
}

#[test]
fn synth_sum8_trailers() {
    let td = tempdir().unwrap();
    let in_path = td.path().join("values.json");
    let out_path = td.path().join("capture_sum8.bin");

    write_file(&in_path, r#"["0102030405"]"#);
    synth::execute(
        in_path.to_str().unwrap(),
        out_path.to_str().unwrap(),
        0,
        ChecksumKind::Sum8,
    )
    .unwrap();

    let bytes = fs::read(&out_path).unwrap();
    // 1 + 2 + 3 + 4 + 5 + ETX
    assert_eq!(bytes[109], 18);
}

#[test]
fn synth_rejects_bad_values() {
    let td = tempdir().unwrap();
    let in_path = td.path().join("bad.json");
    let out_path = td.path().join("bad.bin");

    write_file(&in_path, r#"["0A1B"]"#);
    let err = synth::execute(
        in_path.to_str().unwrap(),
        out_path.to_str().unwrap(),
        0,
        ChecksumKind::Xor,
    )
    .unwrap_err();
    assert!(err.to_string().contains("not 10 hex digits"));
    assert!(!out_path.exists());

    write_file(&in_path, r#"{"not": "an array"}"#);
    assert!(synth::execute(
        in_path.to_str().unwrap(),
        out_path.to_str().unwrap(),
        0,
        ChecksumKind::Xor,
    )
    .is_err());
}
