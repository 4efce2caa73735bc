use std::fmt;

/// Four-byte atom identifier. ASCII-like but not guaranteed printable.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    pub fn from_str(s: &str) -> Option<Self> {
        let b = s.as_bytes();
        if b.len() == 4 {
            Some(FourCC([b[0], b[1], b[2], b[3]]))
        } else { None }
    }
    pub fn as_str_lossy(&self) -> String {
        self.0.iter().map(|&c| if (32..=126).contains(&c) { c as char } else { '.' })
            .collect()
    }
}
impl fmt::Debug for FourCC { fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.as_str_lossy()) } }
impl fmt::Display for FourCC { fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.as_str_lossy()) } }

pub const MOOV: FourCC = FourCC(*b"moov");
pub const MVHD: FourCC = FourCC(*b"mvhd");
pub const TRAK: FourCC = FourCC(*b"trak");
pub const MDIA: FourCC = FourCC(*b"mdia");
pub const MDHD: FourCC = FourCC(*b"mdhd");
pub const MINF: FourCC = FourCC(*b"minf");
pub const STBL: FourCC = FourCC(*b"stbl");
pub const STTS: FourCC = FourCC(*b"stts");

/// The closed set of identifiers whose payload is a sequence of child atoms.
/// Everything else is treated as an opaque leaf regardless of its contents.
pub fn is_container(cc: FourCC) -> bool {
    matches!(&cc.0,
        b"moov" | b"trak" | b"mdia" | b"minf" | b"stbl" |
        b"dinf" | b"clip" | b"udta" | b"matt" | b"edts"
    )
}

/// Identifier plus occurrence index, unique within one container level.
///
/// The index is assigned at decode time: a zero-based counter over atoms
/// with the same identifier seen so far at that level, in encounter order.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct AtomKey {
    pub fourcc: FourCC,
    pub index: usize,
}

impl AtomKey {
    pub fn new(fourcc: FourCC, index: usize) -> Self {
        AtomKey { fourcc, index }
    }
}

impl fmt::Debug for AtomKey { fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}[{}]", self.fourcc, self.index) } }
impl fmt::Display for AtomKey { fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}[{}]", self.fourcc, self.index) } }

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Leaf(Vec<u8>),
    Container(Children),
}

/// A single box: identifier plus leaf bytes or child atoms. The on-disk
/// size field is not stored; [`Atom::encoded_size`] recomputes it from the
/// current payload so a patched tree can never carry a stale size.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    pub fourcc: FourCC,
    pub payload: Payload,
}

impl Atom {
    pub fn leaf(fourcc: FourCC, data: Vec<u8>) -> Self {
        Atom { fourcc, payload: Payload::Leaf(data) }
    }

    pub fn container(fourcc: FourCC, children: Children) -> Self {
        Atom { fourcc, payload: Payload::Container(children) }
    }

    /// Total encoded size including the 8-byte header.
    pub fn encoded_size(&self) -> u64 {
        8 + match &self.payload {
            Payload::Leaf(data) => data.len() as u64,
            Payload::Container(kids) => kids.encoded_size(),
        }
    }

    pub fn children(&self) -> Option<&Children> {
        match &self.payload {
            Payload::Container(kids) => Some(kids),
            Payload::Leaf(_) => None,
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Children> {
        match &mut self.payload {
            Payload::Container(kids) => Some(kids),
            Payload::Leaf(_) => None,
        }
    }

    pub fn leaf_data(&self) -> Option<&[u8]> {
        match &self.payload {
            Payload::Leaf(data) => Some(data),
            Payload::Container(_) => None,
        }
    }

    pub fn leaf_data_mut(&mut self) -> Option<&mut Vec<u8>> {
        match &mut self.payload {
            Payload::Leaf(data) => Some(data),
            Payload::Container(_) => None,
        }
    }
}

/// Ordered children of one container level.
///
/// Insertion order is the on-disk order and is reproduced verbatim by the
/// encoder; keys are never re-sorted. Within one level every key is unique.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Children {
    entries: Vec<(AtomKey, Atom)>,
}

impl Children {
    pub fn new() -> Self {
        Children { entries: Vec::new() }
    }

    /// Append an atom, assigning the next occurrence index for its
    /// identifier at this level. Returns the key it was stored under.
    pub fn push(&mut self, atom: Atom) -> AtomKey {
        let key = AtomKey::new(atom.fourcc, self.count_of(atom.fourcc));
        self.entries.push((key, atom));
        key
    }

    pub fn get(&self, key: AtomKey) -> Option<&Atom> {
        self.entries.iter().find(|(k, _)| *k == key).map(|(_, a)| a)
    }

    pub fn get_mut(&mut self, key: AtomKey) -> Option<&mut Atom> {
        self.entries.iter_mut().find(|(k, _)| *k == key).map(|(_, a)| a)
    }

    /// Number of entries with the given identifier at this level.
    pub fn count_of(&self, fourcc: FourCC) -> usize {
        self.entries.iter().filter(|(k, _)| k.fourcc == fourcc).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(AtomKey, Atom)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of the encoded sizes of all entries (headers included).
    pub fn encoded_size(&self) -> u64 {
        self.entries.iter().map(|(_, a)| a.encoded_size()).sum()
    }
}
