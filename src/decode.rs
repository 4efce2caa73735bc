use crate::atom::{is_container, Atom, Children, FourCC};
use crate::error::{Error, Result};

/// Decode the full byte range of one container atom, its own 8-byte header
/// included, into its children.
///
/// Decoding starts at offset 8: the bytes right after the input's header
/// are the first child's header. Each child advances the cursor by its
/// declared size; the walk must land exactly on the input length. A child
/// size below 8 (zero included) or one overrunning the input fails fast,
/// so malformed data can neither loop forever nor be silently truncated.
pub fn decode_atom(buf: &[u8]) -> Result<Children> {
    if buf.len() < 8 {
        return Err(Error::TruncatedHeader { offset: 0, remaining: buf.len() as u64 });
    }
    decode_children(buf, 0)
}

fn decode_children(buf: &[u8], base: u64) -> Result<Children> {
    let mut kids = Children::new();
    let mut cursor = 8usize; // skip this container's own header

    while cursor < buf.len() {
        let remaining = buf.len() - cursor;
        if remaining < 8 {
            return Err(Error::TruncatedHeader {
                offset: base + cursor as u64,
                remaining: remaining as u64,
            });
        }

        let size = u32::from_be_bytes(buf[cursor..cursor + 4].try_into().unwrap());
        let fourcc = FourCC(buf[cursor + 4..cursor + 8].try_into().unwrap());
        let offset = base + cursor as u64;

        // size == 1 marks a 64-bit "largesize" header; reject it rather
        // than misread the extended size as payload.
        if size == 1 {
            return Err(Error::Largesize { fourcc, offset });
        }
        if size < 8 {
            return Err(Error::BadAtomSize { fourcc, offset, size });
        }
        if size as usize > remaining {
            return Err(Error::Overrun {
                fourcc,
                offset,
                size,
                container_len: buf.len() as u64,
            });
        }

        let body = &buf[cursor..cursor + size as usize];
        let child = if is_container(fourcc) {
            Atom::container(fourcc, decode_children(body, offset)?)
        } else {
            Atom::leaf(fourcc, body[8..].to_vec())
        };
        kids.push(child);

        cursor += size as usize;
    }

    Ok(kids)
}
