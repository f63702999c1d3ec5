use std::collections::BTreeMap;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};

/// Default batch destination mask: next to the source, `.csv` extension
pub const DEFAULT_MASK: &str = "*/*.csv";

/// Map a source workbook path onto a destination using a wildcard mask.
///
/// The first `*/` in the mask becomes the source's directory (`.` for a
/// bare file name) and the first remaining `*` of the mask, before or after
/// it, becomes the source's file name without its extension. Text taken
/// from the source path is never searched for wildcards. A mask without
/// wildcards is returned as is.
pub fn resolve_destination(mask: &str, source: &Path) -> PathBuf {
    let normalized = source.to_string_lossy().replace('\\', "/");
    let (dir, file) = match normalized.rfind('/') {
        Some(i) => (&normalized[..i], &normalized[i + 1..]),
        None => (".", normalized.as_str()),
    };
    let stem = match file.rfind('.') {
        Some(i) if i > 0 => &file[..i],
        _ => file,
    };

    let mask = mask.replace('\\', "/");
    let mut resolved = String::with_capacity(mask.len() + normalized.len());

    match mask.split_once("*/") {
        Some((head, tail)) => {
            let stem_used = push_with_stem(&mut resolved, head, stem);
            resolved.push_str(dir);
            resolved.push('/');
            if stem_used {
                resolved.push_str(tail);
            } else {
                push_with_stem(&mut resolved, tail, stem);
            }
        }
        None => {
            push_with_stem(&mut resolved, &mask, stem);
        }
    }

    if MAIN_SEPARATOR != '/' {
        resolved = resolved.replace('/', &MAIN_SEPARATOR.to_string());
    }
    PathBuf::from(resolved)
}

/// Append `part` with its first `*` replaced by `stem`; true if one was
fn push_with_stem(out: &mut String, part: &str, stem: &str) -> bool {
    match part.split_once('*') {
        Some((before, after)) => {
            out.push_str(before);
            out.push_str(stem);
            out.push_str(after);
            true
        }
        None => {
            out.push_str(part);
            false
        }
    }
}

/// Destinations claimed by more than one source, with the sources in
/// encounter order
pub fn find_collisions<'a, I>(pairs: I) -> Vec<(PathBuf, Vec<PathBuf>)>
where
    I: IntoIterator<Item = (&'a Path, &'a Path)>,
{
    let mut claims: BTreeMap<PathBuf, Vec<PathBuf>> = BTreeMap::new();
    for (source, destination) in pairs {
        claims
            .entry(destination.to_path_buf())
            .or_default()
            .push(source.to_path_buf());
    }

    claims
        .into_iter()
        .filter(|(_, sources)| sources.len() > 1)
        .collect()
}
