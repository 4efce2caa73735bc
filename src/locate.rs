use std::io::{Read, Seek, SeekFrom};

use crate::atom::FourCC;
use crate::error::{Error, Result};

/// A top-level record pulled out of a stream: its absolute file offset and
/// its full bytes, 8-byte header included.
#[derive(Debug, Clone)]
pub struct Located {
    pub offset: u64,
    pub data: Vec<u8>,
}

/// Linear scan over sibling top-level atoms for `target`, starting at the
/// stream's current position.
///
/// Non-matching atoms are seeked over, never read, so the memory footprint
/// stays bounded by the matched record (media data is skipped, not loaded).
/// On success the stream is positioned immediately after the record. Fails
/// if the stream is exhausted without a match.
pub fn find_top_level<R: Read + Seek>(r: &mut R, target: FourCC) -> Result<Located> {
    loop {
        let offset = r.stream_position()?;

        let mut header = [0u8; 8];
        let got = read_fully(r, &mut header)?;
        if got == 0 {
            return Err(Error::AtomNotFound(format!("top-level '{target}'")));
        }
        if got < 8 {
            return Err(Error::TruncatedHeader { offset, remaining: got as u64 });
        }

        let size = u32::from_be_bytes(header[0..4].try_into().unwrap());
        let fourcc = FourCC(header[4..8].try_into().unwrap());

        if size == 1 {
            return Err(Error::Largesize { fourcc, offset });
        }
        if size < 8 {
            return Err(Error::BadAtomSize { fourcc, offset, size });
        }

        if fourcc == target {
            let mut data = vec![0u8; size as usize];
            data[..8].copy_from_slice(&header);
            r.read_exact(&mut data[8..])?;
            return Ok(Located { offset, data });
        }

        r.seek(SeekFrom::Current(i64::from(size) - 8))?;
    }
}

// read_exact would error on a clean EOF; we need to tell "no more atoms"
// apart from "header cut short".
fn read_fully<R: Read>(r: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut n = 0;
    while n < buf.len() {
        let got = r.read(&mut buf[n..])?;
        if got == 0 {
            break;
        }
        n += got;
    }
    Ok(n)
}
