/// Every archive, nested ones included, starts with these two bytes.
pub(crate) const SIGNATURE: &[u8; 2] = b"KA";

/// Keys and values stored back to back as string/value variant pairs.
pub const VERSION_STRING_MAP: u8 = 1;
/// Keys replaced by 32-bit hashes resolved through a key registry.
pub const VERSION_REGISTER_MAP: u8 = 2;

/// Body layout of a [`VERSION_REGISTER_MAP`] archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapTag {
    Empty,
    /// Carries the key table every nested archive resolves against.
    Top,
    /// Reuses the key table of the enclosing top archive.
    Sub,
}

impl MapTag {
    pub const fn id(self) -> u8 {
        match self {
            MapTag::Empty => 0,
            MapTag::Top => 1,
            MapTag::Sub => 2,
        }
    }

    pub const fn from_id(id: u8) -> Option<MapTag> {
        match id {
            0 => Some(MapTag::Empty),
            1 => Some(MapTag::Top),
            2 => Some(MapTag::Sub),
            _ => None,
        }
    }
}

/// The four leading bytes: signature, version and map tag.
///
/// StringMap writers historically emit the version as a little-endian `u16`,
/// which lands as version `1` followed by a zero tag byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ArchiveHeader {
    pub(crate) version: u8,
    pub(crate) tag: u8,
}

impl ArchiveHeader {
    pub(crate) fn string_map() -> ArchiveHeader {
        ArchiveHeader {
            version: VERSION_STRING_MAP,
            tag: 0,
        }
    }
}

/// Wire layout of an encoded archive, as announced by its header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    StringMap,
    RegisterMap(MapTag),
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Format::StringMap => f.write_str("StringMap"),
            Format::RegisterMap(tag) => write!(f, "RegisterMap ({:?})", tag),
        }
    }
}

/// Inspects the first four bytes of `data` without decoding the body.
/// Returns `None` when they do not form a known header.
pub fn describe(data: &[u8]) -> Option<Format> {
    if data.len() < 4 || &data[..2] != SIGNATURE {
        return None;
    }
    match data[2] {
        VERSION_STRING_MAP => Some(Format::StringMap),
        VERSION_REGISTER_MAP => MapTag::from_id(data[3]).map(Format::RegisterMap),
        _ => None,
    }
}
