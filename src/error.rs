//! Errors raised by the atom codec and the retime engine.
//!
//! Every variant is fatal to the current invocation: nothing is retried and
//! no bytes are written back once any of these has been raised.

use crate::atom::FourCC;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("truncated atom header at offset {offset}: {remaining} bytes remain")]
    TruncatedHeader { offset: u64, remaining: u64 },

    #[error("atom '{fourcc}' at offset {offset} declares size {size}; a box is at least 8 bytes")]
    BadAtomSize { fourcc: FourCC, offset: u64, size: u32 },

    #[error("atom '{fourcc}' at offset {offset} declares size {size}, overrunning its container of {container_len} bytes")]
    Overrun { fourcc: FourCC, offset: u64, size: u32, container_len: u64 },

    #[error("atom '{fourcc}' at offset {offset} uses a 64-bit size, which is not supported")]
    Largesize { fourcc: FourCC, offset: u64 },

    #[error("atom not found: {0}")]
    AtomNotFound(String),

    #[error("cannot descend past leaf atom at {0}")]
    NotAContainer(String),

    #[error("'{fourcc}' payload is {len} bytes, need at least {need}")]
    ShortPayload { fourcc: FourCC, len: usize, need: usize },

    #[error("'{fourcc}' version {version} uses 64-bit timing fields, which is not supported")]
    UnsupportedVersion { fourcc: FourCC, version: u8 },

    #[error("stts has {entries} entries; variable frame rate is not supported")]
    VariableFrameRate { entries: u32 },

    #[error("'{fourcc}' has a zero time scale")]
    ZeroTimescale { fourcc: FourCC },

    #[error("invalid target frame rate {0}")]
    InvalidRate(f64),

    #[error("rescaled duration {value} does not fit the 32-bit field of '{fourcc}'")]
    DurationOverflow { fourcc: FourCC, value: u64 },

    #[error("atom '{fourcc}' encodes to {size} bytes, beyond the 32-bit size field")]
    Oversize { fourcc: FourCC, size: u64 },

    #[error("re-encoded moov is {after} bytes, original was {before}; refusing to write")]
    LengthInvariant { before: usize, after: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
