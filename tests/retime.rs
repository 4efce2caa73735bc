use movrate::atom::{AtomKey, Children, FourCC};
use movrate::path::lookup;
use movrate::{decode_atom, encode_atom, DurationPolicy, Error, Retime, TrackSelect};

fn atom_bytes(fourcc: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut v = Vec::new();
    v.extend_from_slice(&((8 + payload.len()) as u32).to_be_bytes());
    v.extend_from_slice(fourcc);
    v.extend_from_slice(payload);
    v
}

fn container_bytes(fourcc: &[u8; 4], children: &[Vec<u8>]) -> Vec<u8> {
    atom_bytes(fourcc, &children.concat())
}

fn key(fourcc: &[u8; 4], index: usize) -> AtomKey {
    AtomKey::new(FourCC(*fourcc), index)
}

// version(1) flags(3) creation(4) modification(4) timescale(4) duration(4)
fn header_payload(timescale: u32, duration: u32, tail: &[u8]) -> Vec<u8> {
    let mut v = vec![0u8; 4]; // version 0, flags 0
    v.extend_from_slice(&1u32.to_be_bytes()); // creation time
    v.extend_from_slice(&2u32.to_be_bytes()); // modification time
    v.extend_from_slice(&timescale.to_be_bytes());
    v.extend_from_slice(&duration.to_be_bytes());
    v.extend_from_slice(tail);
    v
}

fn mvhd_bytes(timescale: u32, duration: u32) -> Vec<u8> {
    // preferred rate 1.0, preferred volume 1.0, reserved
    let mut tail = 0x0001_0000u32.to_be_bytes().to_vec();
    tail.extend_from_slice(&0x0100u16.to_be_bytes());
    tail.extend_from_slice(&[0u8; 10]);
    atom_bytes(b"mvhd", &header_payload(timescale, duration, &tail))
}

fn mdhd_bytes(timescale: u32, duration: u32) -> Vec<u8> {
    // language "und", quality 0
    let mut tail = 0x55C4u16.to_be_bytes().to_vec();
    tail.extend_from_slice(&0u16.to_be_bytes());
    atom_bytes(b"mdhd", &header_payload(timescale, duration, &tail))
}

fn stts_bytes(entries: &[(u32, u32)]) -> Vec<u8> {
    let mut v = vec![0u8; 4]; // version + flags
    v.extend_from_slice(&(entries.len() as u32).to_be_bytes());
    for (sample_count, sample_duration) in entries {
        v.extend_from_slice(&sample_count.to_be_bytes());
        v.extend_from_slice(&sample_duration.to_be_bytes());
    }
    atom_bytes(b"stts", &v)
}

fn trak_bytes(mdhd: Vec<u8>, stts: Option<Vec<u8>>) -> Vec<u8> {
    let stbl = container_bytes(b"stbl", &stts.into_iter().collect::<Vec<_>>());
    let minf = container_bytes(b"minf", &[stbl]);
    container_bytes(b"trak", &[container_bytes(b"mdia", &[mdhd, minf])])
}

/// The 30 fps reference movie: mvhd(600, 1200), one track with mdhd(600)
/// and a single stts run of 30 samples, 20 units each.
fn reference_moov() -> Vec<u8> {
    container_bytes(
        b"moov",
        &[
            mvhd_bytes(600, 1200),
            trak_bytes(mdhd_bytes(600, 1200), Some(stts_bytes(&[(30, 20)]))),
        ],
    )
}

fn be_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes(data[offset..offset + 4].try_into().unwrap())
}

fn header_fields(tree: &Children, path: &[AtomKey]) -> (u32, u32) {
    let payload = lookup(tree, path).unwrap().leaf_data().unwrap();
    (be_u32(payload, 12), be_u32(payload, 16))
}

fn stts_fields(tree: &Children, track: usize) -> (u32, u32, u32) {
    let path = [
        key(b"trak", track),
        key(b"mdia", 0),
        key(b"minf", 0),
        key(b"stbl", 0),
        key(b"stts", 0),
    ];
    let payload = lookup(tree, &path).unwrap().leaf_data().unwrap();
    (be_u32(payload, 4), be_u32(payload, 8), be_u32(payload, 12))
}

#[test]
fn retimes_constant_rate_movie_to_10_fps() {
    let original = reference_moov();
    let mut tree = decode_atom(&original).expect("decode failed");

    let report = Retime::new(10.0).apply(&mut tree).expect("apply failed");

    let (movie_ts, movie_dur) = header_fields(&tree, &[key(b"mvhd", 0)]);
    assert_eq!(movie_ts, 10_000);
    assert_eq!(movie_dur, 20_000); // 1200 rescaled by 10000/600

    let (media_ts, media_dur) =
        header_fields(&tree, &[key(b"trak", 0), key(b"mdia", 0), key(b"mdhd", 0)]);
    assert_eq!(media_ts, 10_000);
    assert_eq!(media_dur, 20_000);

    let (entries, sample_count, sample_duration) = stts_fields(&tree, 0);
    assert_eq!(entries, 1);
    assert_eq!(sample_count, 30); // untouched
    assert_eq!(sample_duration, 1_000); // round(10000 / 10)

    assert_eq!(report.movie.old_timescale, 600);
    assert_eq!(report.movie.new_timescale, 10_000);
    assert_eq!(report.tracks.len(), 1);
    assert_eq!(report.tracks[0].old_sample_duration, Some(20));
    assert_eq!(report.tracks[0].new_sample_duration, Some(1_000));

    // patched fields never change payload lengths
    let encoded = encode_atom(FourCC(*b"moov"), &tree).expect("encode failed");
    assert_eq!(encoded.len(), original.len());
}

#[test]
fn fractional_rates_round_the_derived_fields() {
    let mut tree = decode_atom(&reference_moov()).expect("decode failed");

    Retime::new(29.97).apply(&mut tree).expect("apply failed");

    let (movie_ts, _) = header_fields(&tree, &[key(b"mvhd", 0)]);
    assert_eq!(movie_ts, 29_970);
    let (_, _, sample_duration) = stts_fields(&tree, 0);
    assert_eq!(sample_duration, 1_000); // round(29970 / 29.97)
}

#[test]
fn keep_policy_leaves_durations_alone() {
    let mut tree = decode_atom(&reference_moov()).expect("decode failed");

    Retime::new(10.0)
        .duration_policy(DurationPolicy::Keep)
        .apply(&mut tree)
        .expect("apply failed");

    let (movie_ts, movie_dur) = header_fields(&tree, &[key(b"mvhd", 0)]);
    assert_eq!(movie_ts, 10_000);
    assert_eq!(movie_dur, 1_200);

    let (_, media_dur) =
        header_fields(&tree, &[key(b"trak", 0), key(b"mdia", 0), key(b"mdhd", 0)]);
    assert_eq!(media_dur, 1_200);
}

#[test]
fn missing_stts_fails_and_leaves_the_tree_alone() {
    let moov = container_bytes(
        b"moov",
        &[
            mvhd_bytes(600, 1200),
            trak_bytes(mdhd_bytes(600, 1200), None),
        ],
    );
    let mut tree = decode_atom(&moov).expect("decode failed");
    let before = tree.clone();

    let err = Retime::new(10.0).apply(&mut tree).unwrap_err();
    assert!(matches!(err, Error::AtomNotFound(_)));
    assert_eq!(tree, before);
}

#[test]
fn variable_frame_rate_is_rejected_before_any_write() {
    let moov = container_bytes(
        b"moov",
        &[
            mvhd_bytes(600, 1200),
            trak_bytes(mdhd_bytes(600, 1200), Some(stts_bytes(&[(10, 20), (5, 40)]))),
        ],
    );
    let mut tree = decode_atom(&moov).expect("decode failed");
    let before = tree.clone();

    let err = Retime::new(10.0).apply(&mut tree).unwrap_err();
    assert!(matches!(err, Error::VariableFrameRate { entries: 2 }));
    assert_eq!(tree, before);
}

#[test]
fn empty_sample_table_patches_headers_only() {
    let moov = container_bytes(
        b"moov",
        &[
            mvhd_bytes(600, 1200),
            trak_bytes(mdhd_bytes(600, 1200), Some(stts_bytes(&[]))),
        ],
    );
    let mut tree = decode_atom(&moov).expect("decode failed");

    let report = Retime::new(10.0).apply(&mut tree).expect("apply failed");

    let (media_ts, _) =
        header_fields(&tree, &[key(b"trak", 0), key(b"mdia", 0), key(b"mdhd", 0)]);
    assert_eq!(media_ts, 10_000);
    assert_eq!(report.tracks[0].sample_count, None);
    assert_eq!(report.tracks[0].new_sample_duration, None);
}

#[test]
fn track_subset_leaves_other_tracks_untouched() {
    let moov = container_bytes(
        b"moov",
        &[
            mvhd_bytes(600, 1200),
            trak_bytes(mdhd_bytes(600, 1200), Some(stts_bytes(&[(30, 20)]))),
            trak_bytes(mdhd_bytes(48_000, 96_000), Some(stts_bytes(&[(100, 1024)]))),
        ],
    );
    let mut tree = decode_atom(&moov).expect("decode failed");

    let report = Retime::new(10.0)
        .tracks(TrackSelect::Indices(vec![0]))
        .apply(&mut tree)
        .expect("apply failed");

    assert_eq!(report.tracks.len(), 1);
    assert_eq!(report.tracks[0].track, 0);

    let (ts0, _) = header_fields(&tree, &[key(b"trak", 0), key(b"mdia", 0), key(b"mdhd", 0)]);
    assert_eq!(ts0, 10_000);

    // the audio track keeps its original timing
    let (ts1, dur1) =
        header_fields(&tree, &[key(b"trak", 1), key(b"mdia", 0), key(b"mdhd", 0)]);
    assert_eq!((ts1, dur1), (48_000, 96_000));
    let (_, count1, delta1) = stts_fields(&tree, 1);
    assert_eq!((count1, delta1), (100, 1024));
}

#[test]
fn out_of_range_track_index_is_not_found() {
    let mut tree = decode_atom(&reference_moov()).expect("decode failed");
    let before = tree.clone();

    let err = Retime::new(10.0)
        .tracks(TrackSelect::Indices(vec![3]))
        .apply(&mut tree)
        .unwrap_err();
    assert!(matches!(err, Error::AtomNotFound(_)));
    assert_eq!(tree, before);
}

#[test]
fn non_positive_and_non_finite_rates_are_rejected() {
    for fps in [0.0, -24.0, f64::NAN, f64::INFINITY] {
        let mut tree = decode_atom(&reference_moov()).expect("decode failed");
        let before = tree.clone();

        let err = Retime::new(fps).apply(&mut tree).unwrap_err();
        assert!(matches!(err, Error::InvalidRate(_)), "fps {fps} accepted");
        assert_eq!(tree, before);
    }
}

#[test]
fn version_1_movie_header_is_rejected() {
    let mut moov = reference_moov();
    // mvhd payload starts right after moov header + mvhd header
    moov[16] = 1; // version byte

    let mut tree = decode_atom(&moov).expect("decode failed");
    let err = Retime::new(10.0).apply(&mut tree).unwrap_err();
    assert!(matches!(
        err,
        Error::UnsupportedVersion { version: 1, .. }
    ));
}

#[test]
fn rescaled_duration_overflowing_32_bits_is_rejected() {
    let moov = container_bytes(
        b"moov",
        &[
            mvhd_bytes(1, u32::MAX),
            trak_bytes(mdhd_bytes(600, 1200), Some(stts_bytes(&[(30, 20)]))),
        ],
    );
    let mut tree = decode_atom(&moov).expect("decode failed");
    let before = tree.clone();

    let err = Retime::new(10.0).apply(&mut tree).unwrap_err();
    assert!(matches!(err, Error::DurationOverflow { .. }));
    assert_eq!(tree, before);
}
