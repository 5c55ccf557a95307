use std::io::Write;
use std::path::PathBuf;

use keyed_archive::KeyedArchive;

use crate::error::{Error, Result};

pub fn to_yaml(path: PathBuf, output: Option<PathBuf>) -> Result<()> {
    let mut archive = KeyedArchive::new();
    archive
        .load_from_file(&path)
        .map_err(|source| Error::OpenArchive {
            path: path.clone(),
            source,
        })?;

    match output {
        Some(output) => {
            archive
                .save_to_yaml_file(&output)
                .map_err(|source| Error::Yaml { source })?;
            tracing::debug!(input = %path.display(), output = %output.display(), "converted to yaml");
        }
        None => {
            let text = archive
                .save_to_yaml_string()
                .map_err(|source| Error::Yaml { source })?;
            let stdout = std::io::stdout();
            let mut stdout = stdout.lock();
            stdout
                .write_all(text.as_bytes())
                .and_then(|_| stdout.flush())
                .map_err(|source| Error::Stdout { source })?;
        }
    }

    Ok(())
}

pub fn from_yaml(path: PathBuf, output: PathBuf) -> Result<()> {
    let mut archive = KeyedArchive::new();
    archive
        .load_from_yaml_file(&path)
        .map_err(|source| Error::Yaml { source })?;

    archive
        .save_to_file(&output)
        .map_err(|source| Error::SaveArchive {
            path: output.clone(),
            source,
        })?;

    tracing::debug!(
        input = %path.display(),
        output = %output.display(),
        entries = archive.len(),
        "converted from yaml"
    );
    Ok(())
}
