use byteorder::{BigEndian, WriteBytesExt};

use crate::atom::{Atom, Children, FourCC, Payload};
use crate::error::{Error, Result};

/// Serialize a tree back to bytes, exact inverse of the decoder.
///
/// Every size field is recomputed bottom-up from current payload lengths;
/// a stale size can never survive a patch. Children are emitted in stored
/// decode order, never re-sorted. The root container carries no header of
/// its own, so the caller supplies the outermost identifier (e.g. `moov`)
/// and a synthetic header is emitted for it.
pub fn encode_atom(fourcc: FourCC, children: &Children) -> Result<Vec<u8>> {
    let total = 8 + children.encoded_size();
    let size = size_field(fourcc, total)?;

    let mut out = Vec::with_capacity(total as usize);
    out.write_u32::<BigEndian>(size)?;
    out.extend_from_slice(&fourcc.0);
    for (_, child) in children.iter() {
        encode_into(&mut out, child)?;
    }
    Ok(out)
}

fn encode_into(out: &mut Vec<u8>, atom: &Atom) -> Result<()> {
    let size = size_field(atom.fourcc, atom.encoded_size())?;
    out.write_u32::<BigEndian>(size)?;
    out.extend_from_slice(&atom.fourcc.0);

    match &atom.payload {
        Payload::Leaf(data) => out.extend_from_slice(data),
        Payload::Container(kids) => {
            for (_, child) in kids.iter() {
                encode_into(out, child)?;
            }
        }
    }
    Ok(())
}

fn size_field(fourcc: FourCC, size: u64) -> Result<u32> {
    u32::try_from(size).map_err(|_| Error::Oversize { fourcc, size })
}
