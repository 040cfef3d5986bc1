//! Resume scanning of `blockdir`/`tardir` (§4.2 step 1).

use std::path::Path;

use archive_name::parse_archive_name;

/// Scans `blockdir` for files whose names are plain integers; returns
/// the max round found and the full set of present rounds.
pub fn scan_blockdir(blockdir: &Path) -> std::io::Result<(Option<u64>, std::collections::BTreeSet<u64>)> {
    let mut stored = std::collections::BTreeSet::new();
    let mut max = None;
    for entry in std::fs::read_dir(blockdir)? {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        match name.parse::<u64>() {
            Ok(round) => {
                stored.insert(round);
                max = Some(max.map_or(round, |m: u64| m.max(round)));
            }
            Err(_) => tracing::warn!(file = %name, "junk in blockdir"),
        }
    }
    Ok((max, stored))
}

/// Scans `tardir` for `<lo>_<hi>.tar.<codec>` files; returns the max
/// `hi` found (§4.2 step 1, §6 Archive filename).
pub fn scan_tardir(tardir: &Path) -> std::io::Result<Option<u64>> {
    let mut max = None;
    for entry in std::fs::read_dir(tardir)? {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy().to_string();
        match parse_archive_name(&name) {
            Some((_lo, hi)) => max = Some(max.map_or(hi, |m: u64| m.max(hi))),
            None => tracing::warn!(file = %name, "junk in tardir"),
        }
    }
    Ok(max)
}

/// Resolves the `last` round to resume fetching after (§4.2 step 1):
/// prefer `blockdir`, then `tardir`, else `0` (meaning "fetch round 0
/// first").
pub fn resume_last_round(blockdir: &Path, tardir: &Path) -> std::io::Result<u64> {
    let (block_max, _) = scan_blockdir(blockdir)?;
    if let Some(last) = block_max {
        return Ok(last);
    }
    if let Some(last) = scan_tardir(tardir)? {
        return Ok(last);
    }
    Ok(0)
}

/// Tiny hand-rolled parser for the archive filename shape, avoiding a
/// regex dependency for a single fixed pattern.
mod archive_name {
    pub fn parse_archive_name(name: &str) -> Option<(u64, u64)> {
        let rest = name.strip_suffix(".tar.bz2").or_else(|| name.strip_suffix(".tar.gz"))?;
        let (lo, hi) = rest.split_once('_')?;
        Some((lo.parse().ok()?, hi.parse().ok()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn resumes_from_blockdir_when_present() {
        let blockdir = TempDir::new().unwrap();
        let tardir = TempDir::new().unwrap();
        std::fs::write(blockdir.path().join("1500"), b"x").unwrap();
        std::fs::write(blockdir.path().join("junk"), b"x").unwrap();
        assert_eq!(
            resume_last_round(blockdir.path(), tardir.path()).unwrap(),
            1500
        );
    }

    #[test]
    fn resumes_from_tardir_when_blockdir_empty() {
        let blockdir = TempDir::new().unwrap();
        let tardir = TempDir::new().unwrap();
        std::fs::write(tardir.path().join("0_999.tar.bz2"), b"x").unwrap();
        std::fs::write(tardir.path().join("1000_1999.tar.bz2"), b"x").unwrap();
        assert_eq!(
            resume_last_round(blockdir.path(), tardir.path()).unwrap(),
            1999
        );
    }

    #[test]
    fn resumes_from_zero_when_both_empty() {
        let blockdir = TempDir::new().unwrap();
        let tardir = TempDir::new().unwrap();
        assert_eq!(
            resume_last_round(blockdir.path(), tardir.path()).unwrap(),
            0
        );
    }
}
