//! Archive sealing (§4.2 step 4, §8 "Archive coverage").

use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
};

use bzip2::{write::BzEncoder, Compression};
use tar::Builder;

use crate::error::IndexerError;

/// Given the currently `stored` rounds and the configured `stride`,
/// seals the earliest fully-present run into a compressed tar, deletes
/// its per-round files, and returns the range that was sealed
/// (`None` if no full run is present yet).
///
/// Stale blocks (round below the run's floor) are discarded with a
/// warning rather than archived (§4.2 step 4).
pub fn maybe_seal(
    blockdir: &Path,
    tardir: &Path,
    stored: &mut BTreeSet<u64>,
    stride: u64,
) -> Result<Option<(u64, u64)>, IndexerError> {
    let Some(&min_round) = stored.iter().next() else {
        return Ok(None);
    };

    let lo = (min_round / stride) * stride;
    let hi_exclusive = lo + stride;

    if !(lo..hi_exclusive).all(|r| stored.contains(&r)) {
        return Ok(None);
    }

    for stale in stored.iter().take_while(|&&r| r < lo).copied().collect::<Vec<_>>() {
        tracing::warn!(round = stale, "stale block in blockdir, discarding");
        let _ = std::fs::remove_file(blockdir.join(stale.to_string()));
        stored.remove(&stale);
    }

    let archive_name = format!("{lo}_{}.tar.bz2", hi_exclusive - 1);
    let archive_path = tardir.join(&archive_name);
    seal_archive(blockdir, &archive_path, lo, hi_exclusive)?;

    for round in lo..hi_exclusive {
        std::fs::remove_file(blockdir.join(round.to_string()))?;
        stored.remove(&round);
    }

    Ok(Some((lo, hi_exclusive - 1)))
}

fn seal_archive(
    blockdir: &Path,
    archive_path: &Path,
    lo: u64,
    hi_exclusive: u64,
) -> Result<(), IndexerError> {
    let tmp_path: PathBuf = archive_path.with_extension("tar.bz2.tmp");
    {
        let file = std::fs::File::create(&tmp_path)?;
        let encoder = BzEncoder::new(file, Compression::best());
        let mut builder = Builder::new(encoder);
        for round in lo..hi_exclusive {
            let path = blockdir.join(round.to_string());
            builder.append_path_with_name(&path, round.to_string())?;
        }
        builder.into_inner()?.finish()?;
    }
    // Rename into place so a crash mid-write never leaves a partial
    // archive visible under its final name (§4.2 "no partial archive
    // is ever written").
    std::fs::rename(&tmp_path, archive_path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_blocks(dir: &Path, rounds: impl IntoIterator<Item = u64>) -> BTreeSet<u64> {
        let mut set = BTreeSet::new();
        for r in rounds {
            std::fs::write(dir.join(r.to_string()), format!("block-{r}")).unwrap();
            set.insert(r);
        }
        set
    }

    #[test]
    fn seals_a_full_run_and_removes_the_files() {
        let blockdir = TempDir::new().unwrap();
        let tardir = TempDir::new().unwrap();
        let mut stored = write_blocks(blockdir.path(), 0..4);

        let sealed = maybe_seal(blockdir.path(), tardir.path(), &mut stored, 4)
            .unwrap()
            .expect("a full run should seal");
        assert_eq!(sealed, (0, 3));
        assert!(stored.is_empty());
        assert!(tardir.path().join("0_3.tar.bz2").exists());
        for r in 0..4 {
            assert!(!blockdir.path().join(r.to_string()).exists());
        }
    }

    #[test]
    fn does_not_seal_an_incomplete_run() {
        let blockdir = TempDir::new().unwrap();
        let tardir = TempDir::new().unwrap();
        let mut stored = write_blocks(blockdir.path(), [0, 1, 3]);

        let sealed = maybe_seal(blockdir.path(), tardir.path(), &mut stored, 4).unwrap();
        assert!(sealed.is_none());
        assert_eq!(stored.len(), 3);
    }

    #[test]
    fn discards_stale_blocks_below_the_run_floor() {
        let blockdir = TempDir::new().unwrap();
        let tardir = TempDir::new().unwrap();
        // round 1 predates the run that starts at 4 for stride 4.
        let mut stored = write_blocks(blockdir.path(), [1, 4, 5, 6, 7]);

        let sealed = maybe_seal(blockdir.path(), tardir.path(), &mut stored, 4)
            .unwrap()
            .expect("run 4..8 should seal");
        assert_eq!(sealed, (4, 7));
        assert!(!blockdir.path().join("1").exists());
    }
}
