//! File-system bookkeeping for the rotating file sink: discovery of the
//! numbered history, the free-slot/evict/shift algorithm, and the line
//! counter used to resume an existing file after restart.

use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::LogError;

/// Widest numeric suffix recognized as part of a rotated history.
const MAX_SUFFIX_DIGITS: usize = 6;

/// Chunk size for [`count_lines`].
const LINE_COUNT_BUF: usize = 8 * 1024;

/// Parse the numeric suffix out of `name`. The name must be exactly
/// `<base>.<digits>` with a 1..=6 digit tail; anything else is not part of
/// this sink's history. Valid suffixes start at 1: slot 0 is never written,
/// and admitting it would let the shift land on the slot the active file is
/// about to take.
pub fn parse_rotation_suffix(name: &str, base: &str) -> Option<u32> {
    let rest = name.strip_prefix(base)?.strip_prefix('.')?;
    if rest.is_empty() || rest.len() > MAX_SUFFIX_DIGITS {
        return None;
    }
    if !rest.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    match rest.parse::<u32>() {
        Ok(0) | Err(_) => None,
        Ok(num) => Some(num),
    }
}

/// Build the numbering index for `base` from a fresh listing of `dir`.
///
/// Suffixes at or above the retention cap are left out of the index, so the
/// shifter never touches them: such files stay on disk untouched.
pub fn numbered_files(
    dir: &Path,
    base: &str,
    max_files: usize,
) -> Result<BTreeMap<u32, PathBuf>, LogError> {
    let entries =
        fs::read_dir(dir).map_err(|e| LogError::ListDir(format!("{:?}: {}", dir, e)))?;
    let mut index = BTreeMap::new();
    for entry in entries {
        let entry = entry.map_err(|e| LogError::ListDir(format!("{:?}: {}", dir, e)))?;
        let name = entry.file_name();
        let name = match name.to_str() {
            Some(v) => v,
            None => continue,
        };
        if let Some(num) = parse_rotation_suffix(name, base) {
            if max_files == 0 || (num as usize) < max_files {
                index.insert(num, entry.path());
            }
        }
    }
    Ok(index)
}

/// Lowest unused slot, scanning upward from 1 only as far as the occupied
/// set requires.
pub fn free_slot(index: &BTreeMap<u32, PathBuf>) -> u32 {
    let mut free = 1;
    for n in index.keys() {
        if *n != free {
            break;
        }
        free += 1;
    }
    free
}

/// `<filename>.NNNN`, zero-padded to 4 digits.
pub fn numbered_name(filename: &str, num: u32) -> String {
    format!("{}.{:04}", filename, num)
}

/// Relocate the active file into the numbered history.
///
/// With a cap of 1 no history is kept: the active file is deleted outright.
/// Otherwise, once the cap is reached the numerically highest occupied
/// suffix (the oldest retained file) is evicted, occupied slots below the
/// free slot are renamed one up in descending order so a rename never lands
/// on an unmoved file, and the active file takes slot 1. Gaps in the
/// numbering are reused as the free slot but otherwise preserved.
pub fn shift_rotated_files(filename: &str, max_files: usize) -> Result<(), LogError> {
    if max_files == 1 {
        return fs::remove_file(filename)
            .map_err(|e| LogError::Remove(format!("{:?}: {}", filename, e)));
    }
    let path = Path::new(filename);
    let base = match path.file_name().and_then(|v| v.to_str()) {
        Some(v) => v.to_string(),
        None => return Err(LogError::Rename(format!("{:?}: no file name", filename))),
    };
    let dir = match path.parent() {
        Some(v) if !v.as_os_str().is_empty() => v.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let mut index = numbered_files(&dir, &base, max_files)?;
    let free = free_slot(&index);

    if max_files > 0 && free as usize >= max_files {
        let oldest = index.keys().next_back().copied();
        if let Some(oldest) = oldest {
            if let Some(victim) = index.remove(&oldest) {
                fs::remove_file(&victim)
                    .map_err(|e| LogError::Remove(format!("{:?}: {}", victim, e)))?;
            }
        }
    }

    if free > 1 {
        // descending, so n+1 is always vacant by the time n moves into it
        for (&num, old_path) in index.iter().rev() {
            if num >= free {
                continue;
            }
            let target = numbered_name(filename, num + 1);
            fs::rename(old_path, &target).map_err(|e| {
                LogError::Rename(format!("{:?} -> {:?}: {}", old_path, target, e))
            })?;
        }
    }

    let slot_one = numbered_name(filename, 1);
    fs::rename(filename, &slot_one)
        .map_err(|e| LogError::Rename(format!("{:?} -> {:?}: {}", filename, slot_one, e)))
}

/// Count newline-delimited records in an existing file, streaming in fixed
/// chunks. End of file is not an error.
pub fn count_lines(path: &str) -> std::io::Result<usize> {
    let mut file = fs::File::open(path)?;
    let mut buf = [0u8; LINE_COUNT_BUF];
    let mut count = 0;
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        count += buf[..n].iter().filter(|b| **b == b'\n').count();
    }
    Ok(count)
}

#[cfg(test)]
mod test {
    use std::collections::BTreeMap;
    use std::fs;
    use std::path::PathBuf;

    use super::{
        count_lines, free_slot, numbered_files, numbered_name, parse_rotation_suffix,
        shift_rotated_files,
    };

    #[test]
    fn test_parse_rotation_suffix() {
        assert_eq!(parse_rotation_suffix("app.log.0001", "app.log"), Some(1));
        assert_eq!(parse_rotation_suffix("app.log.42", "app.log"), Some(42));
        assert_eq!(parse_rotation_suffix("app.log.123456", "app.log"), Some(123456));
        // 7 digits is no longer a rotation suffix
        assert_eq!(parse_rotation_suffix("app.log.1234567", "app.log"), None);
        assert_eq!(parse_rotation_suffix("app.log", "app.log"), None);
        assert_eq!(parse_rotation_suffix("app.log.", "app.log"), None);
        assert_eq!(parse_rotation_suffix("app.log.0000", "app.log"), None);
        assert_eq!(parse_rotation_suffix("app.log.01a", "app.log"), None);
        // foreign files never join the history
        assert_eq!(parse_rotation_suffix("other.log.0001", "app.log"), None);
        assert_eq!(parse_rotation_suffix("app.log.0001.bak", "app.log"), None);
    }

    fn index_of(nums: &[u32]) -> BTreeMap<u32, PathBuf> {
        nums.iter()
            .map(|n| (*n, PathBuf::from(format!("app.log.{:04}", n))))
            .collect()
    }

    #[test]
    fn test_free_slot() {
        assert_eq!(free_slot(&index_of(&[])), 1);
        assert_eq!(free_slot(&index_of(&[1, 2])), 3);
        assert_eq!(free_slot(&index_of(&[1, 3])), 2);
        assert_eq!(free_slot(&index_of(&[2, 3])), 1);
        assert_eq!(free_slot(&index_of(&[1, 2, 3, 7])), 4);
    }

    #[test]
    fn test_numbered_name_padding() {
        assert_eq!(numbered_name("app.log", 1), "app.log.0001");
        assert_eq!(numbered_name("app.log", 12345), "app.log.12345");
    }

    #[test]
    fn test_index_ignores_foreign_and_capped() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "app.log",
            "app.log.0001",
            "app.log.0003",
            "app.log.0009",
            "other.log.0002",
            "app.log.abc",
        ] {
            fs::write(dir.path().join(name), name).unwrap();
        }
        let index = numbered_files(dir.path(), "app.log", 5).unwrap();
        assert_eq!(index.keys().copied().collect::<Vec<_>>(), vec![1, 3]);
        let unlimited = numbered_files(dir.path(), "app.log", 0).unwrap();
        assert_eq!(unlimited.keys().copied().collect::<Vec<_>>(), vec![1, 3, 9]);
    }

    #[test]
    fn test_shift_contiguous_does_not_clobber() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("app.log");
        let file = file.to_str().unwrap();
        fs::write(file, "active").unwrap();
        fs::write(numbered_name(file, 1), "one").unwrap();
        fs::write(numbered_name(file, 2), "two").unwrap();
        fs::write(numbered_name(file, 3), "three").unwrap();

        shift_rotated_files(file, 0).unwrap();

        assert_eq!(fs::read_to_string(numbered_name(file, 1)).unwrap(), "active");
        assert_eq!(fs::read_to_string(numbered_name(file, 2)).unwrap(), "one");
        assert_eq!(fs::read_to_string(numbered_name(file, 3)).unwrap(), "two");
        assert_eq!(fs::read_to_string(numbered_name(file, 4)).unwrap(), "three");
        assert!(!fs::metadata(file).is_ok());
    }

    #[test]
    fn test_shift_gap_is_reused() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("app.log");
        let file = file.to_str().unwrap();
        fs::write(file, "active").unwrap();
        fs::write(numbered_name(file, 1), "one").unwrap();
        fs::write(numbered_name(file, 3), "three").unwrap();
        fs::write(numbered_name(file, 4), "four").unwrap();

        shift_rotated_files(file, 0).unwrap();

        // free slot was 2: only slot 1 shifts, the tail past the gap stays
        assert_eq!(fs::read_to_string(numbered_name(file, 1)).unwrap(), "active");
        assert_eq!(fs::read_to_string(numbered_name(file, 2)).unwrap(), "one");
        assert_eq!(fs::read_to_string(numbered_name(file, 3)).unwrap(), "three");
        assert_eq!(fs::read_to_string(numbered_name(file, 4)).unwrap(), "four");
    }

    #[test]
    fn test_eviction_at_cap_orphans_out_of_range() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("app.log");
        let file = file.to_str().unwrap();
        fs::write(file, "active").unwrap();
        fs::write(numbered_name(file, 1), "one").unwrap();
        fs::write(numbered_name(file, 2), "two").unwrap();
        fs::write(numbered_name(file, 3), "three").unwrap();

        shift_rotated_files(file, 3).unwrap();

        // slot 3 sits at the cap and is invisible to the index; slot 2 was
        // the oldest retained file and got evicted
        assert_eq!(fs::read_to_string(numbered_name(file, 1)).unwrap(), "active");
        assert_eq!(fs::read_to_string(numbered_name(file, 2)).unwrap(), "one");
        assert_eq!(fs::read_to_string(numbered_name(file, 3)).unwrap(), "three");
        assert!(!fs::metadata(numbered_name(file, 4)).is_ok());
    }

    #[test]
    fn test_cap_of_one_keeps_no_history() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("app.log");
        let file = file.to_str().unwrap();
        fs::write(file, "active").unwrap();

        shift_rotated_files(file, 1).unwrap();

        assert!(!fs::metadata(file).is_ok());
        assert!(!fs::metadata(numbered_name(file, 1)).is_ok());
    }

    #[test]
    fn test_count_lines() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("c.log");
        let file = file.to_str().unwrap();

        fs::write(file, "").unwrap();
        assert_eq!(count_lines(file).unwrap(), 0);

        fs::write(file, "a\nb\n").unwrap();
        assert_eq!(count_lines(file).unwrap(), 2);

        // a truncated final line does not count
        fs::write(file, "a\nb\nc").unwrap();
        assert_eq!(count_lines(file).unwrap(), 2);

        assert!(count_lines(dir.path().join("missing").to_str().unwrap()).is_err());
    }

    #[test]
    fn test_count_lines_across_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("big.log");
        let file = file.to_str().unwrap();
        let line = "x".repeat(100) + "\n";
        fs::write(file, line.repeat(1000)).unwrap();
        assert_eq!(count_lines(file).unwrap(), 1000);
    }
}
