pub mod apply;
pub mod atom;
pub mod decode;
pub mod encode;
pub mod error;
pub mod locate;
pub mod patch;
pub mod path;
pub mod summary;

pub use apply::{retime_file, PatchOutcome};
pub use atom::{Atom, AtomKey, Children, FourCC, Payload};
pub use decode::decode_atom;
pub use encode::encode_atom;
pub use error::{Error, Result};
pub use locate::{find_top_level, Located};
pub use patch::{DurationPolicy, Retime, RetimeReport, TrackSelect};
pub use summary::{summarize, AtomSummary};
