//! Archive enumeration in lexicographic order of lo-bound (§4.3
//! Algorithm: "enumerate archives in lexicographic order of their
//! lo-bound").

use std::path::{Path, PathBuf};

/// Lists `tardir`'s `<lo>_<hi>.tar.bz2` archives sorted by `lo`.
/// Anything else in the directory is skipped, mirroring
/// `indexer2testload.py`'s `glob.glob('*_*.tar.bz2')`.
pub fn enumerate_archives(tardir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for entry in std::fs::read_dir(tardir)? {
        let entry = entry?;
        let path = entry.path();
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if let Some(lo) = lo_bound(&name) {
            found.push((lo, path));
        } else {
            tracing::warn!(file = %name, "junk in tardir, skipping");
        }
    }
    found.sort_by_key(|(lo, _)| *lo);
    Ok(found.into_iter().map(|(_, path)| path).collect())
}

fn lo_bound(name: &str) -> Option<u64> {
    let rest = name
        .strip_suffix(".tar.bz2")
        .or_else(|| name.strip_suffix(".tar.gz"))?;
    let (lo, _hi) = rest.split_once('_')?;
    lo.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn sorts_by_numeric_lo_bound_not_lexical() {
        let dir = TempDir::new().unwrap();
        for name in ["9000_9999.tar.bz2", "0_999.tar.bz2", "1000_1999.tar.bz2", "readme.txt"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        let archives = enumerate_archives(dir.path()).unwrap();
        let names: Vec<_> = archives
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(
            names,
            vec!["0_999.tar.bz2", "1000_1999.tar.bz2", "9000_9999.tar.bz2"]
        );
    }
}
