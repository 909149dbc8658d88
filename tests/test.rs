use std::fs;
use std::path::PathBuf;

use approx::assert_relative_eq;
use rstest::rstest;

use mediameta::formats::{gif, jpeg, png};
use mediameta::{Dimensions, Error, ErrorKind, GenericMetadata, ImageFormat, ImageMetadata};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/images").join(name)
}

#[test]
fn test_png() {
    let md = mediameta::decode_png(fixture("7x39.png")).unwrap();

    assert_eq!((md.width, md.height), (7, 39));
    assert_eq!(md.bit_depth, 1);
    assert_eq!(md.color_type, 0);
    assert_eq!(md.interlace_method.as_str(), "none");
    assert_eq!(md.color_depth(), Some(1));
}

#[test]
fn test_png_indexed() {
    let md = mediameta::decode_png(fixture("alpha.png")).unwrap();

    assert_eq!((md.width, md.height), (100, 50));
    assert_eq!(md.bit_depth, 2);
    assert_eq!(md.color_type, 3);
    assert_eq!(md.typed_color_type(), Some(png::ColorType::Indexed));
    assert_eq!(md.interlace_method, png::InterlaceMethod::Disabled);
}

#[test]
fn test_gif() {
    let md = mediameta::decode_gif(fixture("7x39.gif")).unwrap();

    assert_eq!(md, gif::Metadata {
        version: Some(gif::Version::V89a),
        width: 7,
        height: 39,
        global_color_table: None,
        background_color_index: None,
        color_resolution: 0,
        pixel_aspect_ratio: 0,
        pixel_aspect_ratio_computed: None,
    });
}

#[test]
fn test_jpeg() {
    let md = mediameta::decode_jpeg(fixture("7x39.jpeg")).unwrap();

    assert_eq!(md.mime_type(), "image/jpeg");
    assert_eq!(md.dimensions(), Dimensions::from((7u16, 39u16)));
    assert_eq!(md.bits_per_sample, 8);
    assert_eq!(md.coding_process, jpeg::CodingProcess::Baseline);
}

#[test]
fn test_mp4() {
    let md = mediameta::decode_mp4(fixture("test.mp4")).unwrap();

    assert_eq!(md.timescale, 1000);
    assert_eq!(md.duration, 3640);
    assert_relative_eq!(md.duration_seconds, 3.64);
    assert_relative_eq!(md.width, 320.0);
    assert_relative_eq!(md.height, 240.0);
}

#[rstest]
#[case("7x39.png", ImageFormat::Png)]
#[case("alpha.png", ImageFormat::Png)]
#[case("7x39.gif", ImageFormat::Gif)]
#[case("7x39.jpeg", ImageFormat::Jpeg)]
fn test_detection_matches_direct_decoder(#[case] name: &str, #[case] format: ImageFormat) {
    let path = fixture(name);
    let md = mediameta::decode_image(&path).unwrap();
    assert_eq!(md.format(), format);

    let direct: GenericMetadata = match format {
        ImageFormat::Png => mediameta::decode_png(&path).unwrap().into(),
        ImageFormat::Gif => mediameta::decode_gif(&path).unwrap().into(),
        ImageFormat::Jpeg => mediameta::decode_jpeg(&path).unwrap().into(),
    };
    assert_eq!(md, direct);
}

#[test]
fn test_detection_from_buffer() {
    let data = fs::read(fixture("7x39.jpeg")).unwrap();
    let md = mediameta::load_image(&mut mediameta::ByteSource::from_buffer(&data)).unwrap();
    assert_eq!(md.as_metadata::<jpeg::Metadata>().map(|md| md.width), Some(7));
}

#[test]
fn test_detection_of_unknown_format() {
    let path = fixture("invalid.txt");
    let err = mediameta::decode_image(&path).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::UnknownFormat);
    assert!(err.to_string().contains(&*path.display().to_string()));
}

#[test]
fn test_invalid_png() {
    match mediameta::decode_png(fixture("invalid.txt")) {
        Err(Error::InvalidFormat(ref s)) => assert_eq!(s, "IHDR chunk not found"),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_invalid_gif() {
    let err = mediameta::decode_gif(fixture("invalid.txt")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ShortRead);
    assert!(err.to_string().contains("Logical screen descriptor is missing or malformed"));
}

#[test]
fn test_invalid_jpeg() {
    let err = mediameta::decode_jpeg(fixture("invalid.txt")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedStructure);
    assert!(err.to_string().contains("unknown byte value"));
}

#[test]
fn test_invalid_mp4() {
    let err = mediameta::decode_mp4(fixture("invalid.txt")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedStructure);
}

#[test]
fn test_missing_file() {
    let err = mediameta::decode_image(fixture("does-not-exist.png")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
}

#[rstest]
#[case("7x39.png", 20)]
#[case("7x39.jpeg", 100)]
#[case("test.mp4", 200)]
fn test_truncated_files_fail(#[case] name: &str, #[case] keep: usize) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(name);
    let mut data = fs::read(fixture(name)).unwrap();
    data.truncate(keep);
    fs::write(&path, &data).unwrap();

    let result = if name.ends_with(".mp4") {
        mediameta::decode_mp4(&path).map(|_| ())
    } else {
        mediameta::decode_image(&path).map(|_| ())
    };
    assert!(result.is_err());
}

#[test]
fn test_concurrent_decodes_are_independent() {
    let handles: Vec<_> = (0..4)
        .map(|_| std::thread::spawn(|| mediameta::decode_mp4(fixture("test.mp4")).unwrap()))
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap().duration, 3640);
    }
}
