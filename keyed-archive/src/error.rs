use std::path::PathBuf;

use crate::variant::VariantType;

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Failed to read archive data.")]
    Io(#[from] std::io::Error),

    #[error("Could not open archive. Path: '{}'", .1.display())]
    OpenFailed(#[source] std::io::Error, PathBuf),

    #[error("Cannot load an archive from an empty buffer.")]
    EmptyBuffer,

    #[error("Invalid signature {0:02x?}. Is this a keyed archive?")]
    InvalidSignature([u8; 2]),

    #[error("Unsupported archive version: {0}")]
    UnsupportedVersion(u8),

    #[error("Unknown registered map tag: {0}")]
    UnknownMapTag(u8),

    #[error("Sub-archive found without an enclosing key registry.")]
    MissingRegistry,

    #[error("Key hash {0} is not present in the key registry.")]
    UnknownKeyHash(u32),

    #[error("Archive nesting exceeds {0} levels.")]
    TooDeep(u32),

        #[error("Unknown variant type code: {0}")]
    UnknownVariantType(u8),

    #[error("Archive keys must be strings, found {0}.")]
    InvalidKey(VariantType),

    #[error("String payload is not valid UTF-8.")]
    InvalidString(#[from] std::string::FromUtf8Error),

    #[error("Wide string payload is not valid UTF-16.")]
    InvalidWideString(#[from] std::string::FromUtf16Error),
}

#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("Failed to write archive data.")]
    Io(#[from] std::io::Error),

    #[error("Could not create archive. Path: '{}'", .1.display())]
    CreateFailed(#[source] std::io::Error, PathBuf),

    #[error("Payload of {0} bytes does not fit a 32-bit length prefix.")]
    TooLarge(usize),
}

#[derive(Debug, thiserror::Error)]
pub enum YamlError {
    #[error("Failed to parse YAML document.")]
    Parse(#[source] serde_yaml::Error),

    #[error("Failed to emit YAML document.")]
    Emit(#[source] serde_yaml::Error),

    #[error("YAML document has no `{}` node.", crate::yaml::ARCHIVE_NODE)]
    MissingArchiveNode,

    #[error("Failed to access YAML file. Path: '{}'", .1.display())]
    Io(#[source] std::io::Error, PathBuf),
}
