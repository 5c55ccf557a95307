use std::path::PathBuf;

use keyed_archive::{KeyedArchive, Variant};

use crate::error::{Error, Result};

const PATH_SEP: char = '/';

pub fn run(path: PathBuf, key: String) -> Result<()> {
    let archive = super::open(&path)?;

    let value = lookup(&archive, &key).ok_or_else(|| Error::MissingKey { key: key.clone() })?;

    match value {
        Variant::KeyedArchive(inner) => print!("{}", inner.dump()),
        value => println!("{} [{}] : {}", key, value.variant_type(), value),
    }

    Ok(())
}

/// Resolves `a/b/c` by descending through nested archives.
fn lookup<'a>(archive: &'a KeyedArchive, key: &str) -> Option<&'a Variant> {
    if let Some(value) = archive.get_variant(key) {
        return Some(value);
    }

    let (head, rest) = split_once(key)?;
    lookup(archive.get_archive(head)?, rest)
}

fn split_once(key: &str) -> Option<(&str, &str)> {
    let idx = key.find(PATH_SEP)?;
    Some((&key[..idx], &key[idx + 1..]))
}
