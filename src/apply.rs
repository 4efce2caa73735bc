use std::fs::OpenOptions;
use std::io::{Seek, SeekFrom, Write};
use std::path::Path;

use crate::atom;
use crate::decode::decode_atom;
use crate::encode::encode_atom;
use crate::error::Error;
use crate::locate::find_top_level;
use crate::patch::{Retime, RetimeReport};

/// Result of one retime invocation against a file.
#[derive(Debug)]
pub struct PatchOutcome {
    pub report: RetimeReport,
    pub moov_offset: u64,
    pub moov_len: usize,
    pub written: bool,
}

/// Locate the moov record, retime it in memory, and overwrite it in place.
///
/// Decode, patch, encode and the length check all run before any byte goes
/// back to disk; a failure in any of them leaves the file untouched. With
/// `dry_run` the final write is skipped as well.
pub fn retime_file(
    path: impl AsRef<Path>,
    retime: &Retime,
    dry_run: bool,
) -> anyhow::Result<PatchOutcome> {
    let mut f = OpenOptions::new()
        .read(true)
        .write(!dry_run)
        .open(path.as_ref())?;

    let moov = find_top_level(&mut f, atom::MOOV)?;
    let mut tree = decode_atom(&moov.data)?;
    let report = retime.apply(&mut tree)?;
    let encoded = encode_atom(atom::MOOV, &tree)?;

    // The caller overwrites a fixed-size region; a conformant patch never
    // changes the encoded length, so a mismatch here is a hard stop.
    if encoded.len() != moov.data.len() {
        return Err(Error::LengthInvariant {
            before: moov.data.len(),
            after: encoded.len(),
        }
        .into());
    }

    if !dry_run {
        f.seek(SeekFrom::Start(moov.offset))?;
        f.write_all(&encoded)?;
    }

    Ok(PatchOutcome {
        report,
        moov_offset: moov.offset,
        moov_len: moov.data.len(),
        written: !dry_run,
    })
}
