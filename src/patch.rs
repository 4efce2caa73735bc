//! Field-level timing patches for the three timing-bearing atom types.
//!
//! A [`Retime`] applies one target frame rate to the movie header
//! (`mvhd`), each selected track's media header (`mdhd`) and its
//! time-to-sample table (`stts`). All work is plan-then-commit: every
//! selected atom is located, bounds-checked and its new field values
//! computed before a single byte of the tree is touched, so a failing
//! track can never leave a half-patched tree behind.

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use serde::Serialize;
use std::io::{Cursor, Read};

use crate::atom::{self, Atom, AtomKey, Children, FourCC};
use crate::error::{Error, Result};
use crate::path::{lookup, lookup_mut};

// mvhd and mdhd share this prefix: version(1) flags(3) creation(4)
// modification(4) timescale(4) duration(4). Bytes past the duration
// (rate/volume for mvhd, language/quality for mdhd) are copied through
// unmodified.
const TIMESCALE_OFFSET: usize = 12;
const HEADER_NEED: usize = 20;

// stts: version+flags(4) entry_count(4) then (sample_count, sample_duration)
// pairs of 4 bytes each.
const STTS_DELTA_OFFSET: usize = 12;

/// What happens to the 32-bit duration fields when the time scale changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DurationPolicy {
    /// Rescale durations by new/old time scale, preserving the wall-clock
    /// length of the movie.
    #[default]
    Rescale,
    /// Leave raw duration values alone; playback length drifts instead.
    Keep,
}

/// Which `trak` atoms receive the media-header and sample-table patch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackSelect {
    All,
    /// Zero-based `trak` occurrence indices. An index with no matching
    /// track is an error, not a silent skip.
    Indices(Vec<usize>),
}

/// A single target frame rate plus the policies governing its application.
#[derive(Debug, Clone)]
pub struct Retime {
    pub fps: f64,
    pub duration: DurationPolicy,
    pub tracks: TrackSelect,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct HeaderChange {
    pub old_timescale: u32,
    pub new_timescale: u32,
    pub old_duration: u32,
    pub new_duration: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrackChange {
    pub track: usize,
    pub media: HeaderChange,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_sample_duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_sample_duration: Option<u32>,
}

/// Everything one [`Retime::apply`] changed, old and new values included.
#[derive(Debug, Clone, Serialize)]
pub struct RetimeReport {
    pub fps: f64,
    pub movie: HeaderChange,
    pub tracks: Vec<TrackChange>,
}

struct SttsPlan {
    sample_count: u32,
    old_delta: u32,
    new_delta: u32,
}

impl Retime {
    pub fn new(fps: f64) -> Self {
        Retime {
            fps,
            duration: DurationPolicy::default(),
            tracks: TrackSelect::All,
        }
    }

    pub fn duration_policy(mut self, policy: DurationPolicy) -> Self {
        self.duration = policy;
        self
    }

    pub fn tracks(mut self, tracks: TrackSelect) -> Self {
        self.tracks = tracks;
        self
    }

    /// Apply the target frame rate to a decoded moov tree.
    ///
    /// Patched fields change contents but never length, so the re-encoded
    /// tree stays byte-for-byte as long as the original.
    pub fn apply(&self, moov: &mut Children) -> Result<RetimeReport> {
        let new_ts = target_timescale(self.fps)?;

        let mvhd_path = [AtomKey::new(atom::MVHD, 0)];
        let movie = self.plan_header(lookup(moov, &mvhd_path)?, new_ts)?;

        let track_indices: Vec<usize> = match &self.tracks {
            TrackSelect::All => (0..moov.count_of(atom::TRAK)).collect(),
            TrackSelect::Indices(indices) => indices.clone(),
        };

        let mut plans = Vec::new();
        for &i in &track_indices {
            let media = self.plan_header(lookup(moov, &mdhd_path(i))?, new_ts)?;
            // The new sample duration is derived from the track's own
            // time scale as it will stand after the header patch.
            let stts = plan_stts(lookup(moov, &stts_path(i))?, media.new_timescale, self.fps)?;
            plans.push((i, media, stts));
        }

        commit_header(lookup_mut(moov, &mvhd_path)?, &movie)?;

        let mut tracks = Vec::new();
        for (i, media, stts) in plans {
            commit_header(lookup_mut(moov, &mdhd_path(i))?, &media)?;
            if let Some(plan) = &stts {
                commit_stts(lookup_mut(moov, &stts_path(i))?, plan.new_delta)?;
            }
            tracks.push(TrackChange {
                track: i,
                media,
                sample_count: stts.as_ref().map(|p| p.sample_count),
                old_sample_duration: stts.as_ref().map(|p| p.old_delta),
                new_sample_duration: stts.as_ref().map(|p| p.new_delta),
            });
        }

        Ok(RetimeReport { fps: self.fps, movie, tracks })
    }

    fn plan_header(&self, header: &Atom, new_ts: u32) -> Result<HeaderChange> {
        let payload = leaf_payload(header, HEADER_NEED)?;
        let mut cur = Cursor::new(payload);

        let version = cur.read_u8()?;
        if version != 0 {
            return Err(Error::UnsupportedVersion { fourcc: header.fourcc, version });
        }
        let mut _flags = [0u8; 3];
        cur.read_exact(&mut _flags)?;
        let _creation = cur.read_u32::<BigEndian>()?;
        let _modification = cur.read_u32::<BigEndian>()?;
        let old_timescale = cur.read_u32::<BigEndian>()?;
        let old_duration = cur.read_u32::<BigEndian>()?;

        let new_duration = match self.duration {
            DurationPolicy::Keep => old_duration,
            DurationPolicy::Rescale => {
                rescale_duration(header.fourcc, old_duration, old_timescale, new_ts)?
            }
        };

        Ok(HeaderChange {
            old_timescale,
            new_timescale: new_ts,
            old_duration,
            new_duration,
        })
    }
}

fn mdhd_path(track: usize) -> [AtomKey; 3] {
    [
        AtomKey::new(atom::TRAK, track),
        AtomKey::new(atom::MDIA, 0),
        AtomKey::new(atom::MDHD, 0),
    ]
}

fn stts_path(track: usize) -> [AtomKey; 5] {
    [
        AtomKey::new(atom::TRAK, track),
        AtomKey::new(atom::MDIA, 0),
        AtomKey::new(atom::MINF, 0),
        AtomKey::new(atom::STBL, 0),
        AtomKey::new(atom::STTS, 0),
    ]
}

fn leaf_payload(a: &Atom, need: usize) -> Result<&[u8]> {
    let payload = a.leaf_data().ok_or(Error::ShortPayload {
        fourcc: a.fourcc,
        len: 0,
        need,
    })?;
    if payload.len() < need {
        return Err(Error::ShortPayload {
            fourcc: a.fourcc,
            len: payload.len(),
            need,
        });
    }
    Ok(payload)
}

fn target_timescale(fps: f64) -> Result<u32> {
    if !fps.is_finite() || fps <= 0.0 {
        return Err(Error::InvalidRate(fps));
    }
    let ts = (fps * 1000.0).round();
    if ts < 1.0 || ts > u32::MAX as f64 {
        return Err(Error::InvalidRate(fps));
    }
    Ok(ts as u32)
}

fn rescale_duration(fourcc: FourCC, duration: u32, old_ts: u32, new_ts: u32) -> Result<u32> {
    if duration == 0 {
        return Ok(0);
    }
    if old_ts == 0 {
        return Err(Error::ZeroTimescale { fourcc });
    }
    let scaled = (duration as f64 * new_ts as f64 / old_ts as f64).round();
    if scaled > u32::MAX as f64 {
        return Err(Error::DurationOverflow { fourcc, value: scaled as u64 });
    }
    Ok(scaled as u32)
}

fn plan_stts(stts: &Atom, timescale: u32, fps: f64) -> Result<Option<SttsPlan>> {
    let payload = leaf_payload(stts, 8)?;
    let mut cur = Cursor::new(payload);

    let _version_flags = cur.read_u32::<BigEndian>()?;
    let entries = cur.read_u32::<BigEndian>()?;
    match entries {
        0 => Ok(None),
        1 => {
            if payload.len() < 16 {
                return Err(Error::ShortPayload {
                    fourcc: stts.fourcc,
                    len: payload.len(),
                    need: 16,
                });
            }
            let sample_count = cur.read_u32::<BigEndian>()?;
            let old_delta = cur.read_u32::<BigEndian>()?;
            let new_delta = sample_duration(timescale, fps)?;
            Ok(Some(SttsPlan { sample_count, old_delta, new_delta }))
        }
        n => Err(Error::VariableFrameRate { entries: n }),
    }
}

fn sample_duration(timescale: u32, fps: f64) -> Result<u32> {
    let delta = (timescale as f64 / fps).round();
    if delta < 1.0 || delta > u32::MAX as f64 {
        return Err(Error::InvalidRate(fps));
    }
    Ok(delta as u32)
}

// Commit writers. Bounds were already validated at plan time against the
// same atoms.

fn commit_header(header: &mut Atom, change: &HeaderChange) -> Result<()> {
    let payload = leaf_payload_mut(header, HEADER_NEED)?;
    let mut w = &mut payload[TIMESCALE_OFFSET..TIMESCALE_OFFSET + 8];
    w.write_u32::<BigEndian>(change.new_timescale)?;
    w.write_u32::<BigEndian>(change.new_duration)?;
    Ok(())
}

fn commit_stts(stts: &mut Atom, new_delta: u32) -> Result<()> {
    let payload = leaf_payload_mut(stts, 16)?;
    let mut w = &mut payload[STTS_DELTA_OFFSET..STTS_DELTA_OFFSET + 4];
    w.write_u32::<BigEndian>(new_delta)?;
    Ok(())
}

fn leaf_payload_mut(a: &mut Atom, need: usize) -> Result<&mut Vec<u8>> {
    let fourcc = a.fourcc;
    let payload = a.leaf_data_mut().ok_or(Error::ShortPayload { fourcc, len: 0, need })?;
    if payload.len() < need {
        return Err(Error::ShortPayload { fourcc, len: payload.len(), need });
    }
    Ok(payload)
}
