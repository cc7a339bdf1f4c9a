//! Tests for writing and reading volume sets.

use super::*;
use camino::Utf8PathBuf;
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use rstest::{fixture, rstest};
use std::io::{Read, Write};
use tempfile::TempDir;

struct Media {
    _dir: TempDir,
    base: Utf8PathBuf,
}

#[fixture]
fn media() -> Media {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 temp path");
    Media {
        base: root.join("app.pak"),
        _dir: dir,
    }
}

fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

fn write_set(base: &Utf8PathBuf, options: VolumeOptions, data: &[u8]) -> VolumeSet {
    let mut writer = SpanningWriter::create(base.clone(), options).expect("create");
    writer.write_all(data).expect("write");
    writer.finish().expect("finish")
}

#[rstest]
#[case(VolumeOptions::new(100), 1000, 12)]
#[case(VolumeOptions::new(100).with_first_volume_free(50), 1000, 12)]
#[case(VolumeOptions::new(MIN_VOLUME_SIZE), 5, 5)]
#[case(VolumeOptions::default(), 4096, 1)]
fn splits_and_reassembles(
    media: Media,
    #[case] options: VolumeOptions,
    #[case] len: usize,
    #[case] expected_volumes: usize,
) {
    let data = payload(len);
    let set = write_set(&media.base, options, &data);
    assert_eq!(set.volume_count, expected_volumes);
    assert_eq!(set.payload_len, len as u64);

    for index in 0..set.volume_count {
        let size = std::fs::metadata(volume_path(&media.base, index))
            .expect("volume exists")
            .len();
        let limit = if index == 0 {
            options.first_volume_max()
        } else {
            options.max_volume_size
        };
        assert!(size <= limit, "volume {index} is {size} bytes");
    }

    let mut reader = SpanningReader::open(media.base.clone(), set.volume_count).expect("open");
    let mut back = Vec::new();
    reader.read_to_end(&mut back).expect("read");
    assert_eq!(back, data);
    assert_eq!(reader.file_pointer(), len as u64);
}

#[rstest]
fn rejects_tiny_volumes(media: Media) {
    let err = SpanningWriter::create(media.base.clone(), VolumeOptions::new(10))
        .expect_err("too small");
    assert!(matches!(err, SpanningError::VolumeTooSmall { size: 10, .. }));

    let err = SpanningWriter::create(
        media.base.clone(),
        VolumeOptions::new(100).with_first_volume_free(95),
    )
    .expect_err("first volume too small");
    assert!(matches!(err, SpanningError::VolumeTooSmall { size: 5, .. }));
}

#[rstest]
fn detects_foreign_volumes(media: Media) {
    let set = write_set(&media.base, VolumeOptions::new(50), &payload(200));
    let other = media.base.with_file_name("other.pak");
    write_set(&other, VolumeOptions::new(50), &payload(200));
    std::fs::copy(volume_path(&other, 2), volume_path(&media.base, 2)).expect("swap volume");

    let mut reader = SpanningReader::open(media.base.clone(), set.volume_count).expect("open");
    let err = reader.read_to_end(&mut Vec::new()).expect_err("corrupt");
    let inner = err.into_inner().expect("spanning error");
    assert!(matches!(
        inner.downcast_ref::<SpanningError>(),
        Some(SpanningError::CorruptVolume { .. })
    ));
}

#[rstest]
fn missing_volume_without_locator_fails(media: Media) {
    let set = write_set(&media.base, VolumeOptions::new(50), &payload(200));
    std::fs::remove_file(volume_path(&media.base, 1)).expect("remove");

    let mut reader = SpanningReader::open(media.base.clone(), set.volume_count).expect("open");
    let err = reader.read_to_end(&mut Vec::new()).expect_err("missing");
    assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
}

#[rstest]
fn locator_supplies_moved_volumes(media: Media) {
    let data = payload(200);
    let set = write_set(&media.base, VolumeOptions::new(50), &data);
    let moved = media.base.with_file_name("disc2.pak.1");
    std::fs::rename(volume_path(&media.base, 1), &moved).expect("move");

    let mut locator = MockVolumeLocator::new();
    let answer = moved.clone();
    locator
        .expect_locate()
        .withf(|expected, index| expected.as_str().ends_with("app.pak.1") && *index == 1)
        .times(1)
        .return_once(move |_, _| Some(answer));

    let mut reader =
        SpanningReader::with_locator(media.base.clone(), set.volume_count, locator).expect("open");
    let mut back = Vec::new();
    reader.read_to_end(&mut back).expect("read");
    assert_eq!(back, data);
}

#[rstest]
fn skip_crosses_volume_boundaries(media: Media) {
    let data = payload(300);
    let set = write_set(&media.base, VolumeOptions::new(40), &data);
    let mut reader = SpanningReader::open(media.base.clone(), set.volume_count).expect("open");

    assert_eq!(reader.skip(95).expect("skip"), 95);
    let mut next = [0_u8; 10];
    reader.read_exact(&mut next).expect("read");
    assert_eq!(next, data[95..105]);
    assert!(reader.current_volume() >= 3);
    assert_eq!(reader.skip(1000).expect("skip to end"), 195);
}

#[rstest]
fn gzip_payload_survives_spanning(media: Media) {
    let data: Vec<u8> = (0..20_000).map(|_| rand::random()).collect();
    let writer = SpanningWriter::create(media.base.clone(), VolumeOptions::new(1024)).expect("create");
    let mut encoder = GzEncoder::new(writer, Compression::default());
    encoder.write_all(&data).expect("compress");
    let set = encoder.finish().expect("gzip").finish().expect("finish");
    assert!(set.volume_count > 1);

    let reader = SpanningReader::open(media.base.clone(), set.volume_count).expect("open");
    let mut back = Vec::new();
    GzDecoder::new(reader).read_to_end(&mut back).expect("decompress");
    assert_eq!(back, data);
}
