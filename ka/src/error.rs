use std::path::PathBuf;

use keyed_archive::{LoadError, SaveError, YamlError};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Cannot open archive `{}`", .path.display())]
    OpenArchive {
        path: PathBuf,
        #[source]
        source: LoadError,
    },

    #[error("Cannot read file `{}`", .path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot write archive `{}`", .path.display())]
    SaveArchive {
        path: PathBuf,
        #[source]
        source: SaveError,
    },

    #[error("Cannot convert YAML document")]
    Yaml {
        #[source]
        source: YamlError,
    },

    #[error("Cannot write to standard output")]
    Stdout {
        #[source]
        source: std::io::Error,
    },

    #[error("`{}` is not a keyed archive", .path.display())]
    UnknownFormat { path: PathBuf },

    #[error("No entry found for key `{key}`")]
    MissingKey { key: String },
}
