pub mod dump;
pub mod get;
pub mod info;
pub mod yaml;

pub use dump::run as dump;
pub use get::run as get;
pub use info::run as info;
pub use yaml::{from_yaml, to_yaml};

use std::path::Path;

use keyed_archive::KeyedArchive;

use crate::error::{Error, Result};

/// Opens either a binary archive or, judging by the extension, its YAML form.
pub(crate) fn open(path: &Path) -> Result<KeyedArchive> {
    let mut archive = KeyedArchive::new();

    if is_yaml(path) {
        archive
            .load_from_yaml_file(path)
            .map_err(|source| Error::Yaml { source })?;
    } else {
        archive
            .load_from_file(path)
            .map_err(|source| Error::OpenArchive {
                path: path.to_path_buf(),
                source,
            })?;
    }

    Ok(archive)
}

pub(crate) fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_extensions() {
        assert!(is_yaml(Path::new("level.yaml")));
        assert!(is_yaml(Path::new("LEVEL.YML")));
        assert!(!is_yaml(Path::new("level.ka")));
        assert!(!is_yaml(Path::new("yaml")));
    }
}
