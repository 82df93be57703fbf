use strumboard::{ChordType, Key, Patch, Performer, StrumError, WaveformType};

#[test]
fn loads_demo_patch() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/demos/harp.patch");
    let patch = Patch::load(path).unwrap();
    assert_eq!(patch.instrument.name, "Harp");
    assert_eq!(patch.instrument.waveform, WaveformType::Triangle);
    assert_eq!(patch.keymap.resolve(Key::KeyZ).unwrap().chord_type, ChordType::Major);
    assert_eq!(patch.strumplate.segments, 16);
}

#[test]
fn missing_file_is_a_file_error() {
    let err = Patch::load("/definitely/not/here.patch").unwrap_err();
    let err = err.downcast_ref::<StrumError>().unwrap();
    assert!(matches!(err, StrumError::FileError(_)));
}

#[test]
fn performer_uses_patch_octave() {
    let patch = Patch::parse("octave: 2").unwrap();
    let performer = Performer::from_patch(&patch);
    assert_eq!(performer.octave(), 2);
}
