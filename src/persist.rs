//! Writing pass results into an output directory.

use crate::canon::escapes_root;
use crate::snapshot::{Content, Snapshot};
use anyhow::bail;
use rustc_hash::FxHashMap;
use std::path::PathBuf;

/// Mirrors output snapshots onto disk, rewriting only files whose content
/// changed identity since the last write.
///
/// Retired outputs are found by comparing what this writer has on disk
/// against the snapshot it is given, not from a single pass's report, so a
/// deletion that failed is attempted again on the next call.
pub struct Writer {
    root: PathBuf,
    written: FxHashMap<String, Content>,
}

impl Writer {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Writer {
            root: root.into(),
            written: FxHashMap::default(),
        }
    }

    /// Remove files written earlier that `output` no longer holds, then write
    /// its new or changed ones.  Returns the number of files written.
    pub fn apply(&mut self, output: &Snapshot) -> anyhow::Result<usize> {
        let mut stale: Vec<String> = self
            .written
            .keys()
            .filter(|path| !output.contains(path))
            .cloned()
            .collect();
        stale.sort_unstable();
        for path in stale {
            let full = self.root.join(&path);
            match std::fs::remove_file(&full) {
                Ok(()) => {}
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => bail!("remove {}: {}", full.display(), err),
            }
            self.written.remove(&path);
        }

        let mut count = 0;
        for path in output.paths() {
            let content = match output.get(path) {
                Some(content) => content,
                None => continue,
            };
            if let Some(prev) = self.written.get(path) {
                if prev.same(content) {
                    continue;
                }
            }
            if escapes_root(path) {
                bail!("refusing to write {:?} outside the output directory", path);
            }
            let full = self.root.join(path);
            if let Some(parent) = full.parent() {
                std::fs::create_dir_all(parent)?;
            }
            if let Err(err) = std::fs::write(&full, content.as_bytes()) {
                bail!("write {}: {}", full.display(), err);
            }
            self.written.insert(path.to_owned(), content.clone());
            count += 1;
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_removal_is_retried() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let mut writer = Writer::new(dir.path());
        let first: Snapshot = [("a.txt", "a"), ("b.txt", "b")].into_iter().collect();
        assert_eq!(writer.apply(&first)?, 2);

        // Something else replaced a.txt with a directory; it can't be removed.
        let blocked = dir.path().join("a.txt");
        std::fs::remove_file(&blocked)?;
        std::fs::create_dir_all(blocked.join("inner"))?;
        let mut second = first.clone();
        second.remove("a.txt");
        assert!(writer.apply(&second).is_err());

        std::fs::remove_dir_all(&blocked)?;
        std::fs::write(&blocked, "stale")?;
        assert_eq!(writer.apply(&second)?, 0);
        assert!(!blocked.exists());
        assert!(dir.path().join("b.txt").exists());
        Ok(())
    }

    #[test]
    fn unchanged_content_is_not_rewritten() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let mut writer = Writer::new(dir.path());
        let mut output: Snapshot = [("a.txt", "a"), ("sub/b.txt", "b")].into_iter().collect();
        assert_eq!(writer.apply(&output)?, 2);
        assert_eq!(writer.apply(&output)?, 0);
        output.insert("a.txt", "a2");
        assert_eq!(writer.apply(&output)?, 1);
        assert_eq!(std::fs::read_to_string(dir.path().join("a.txt"))?, "a2");
        Ok(())
    }

    #[test]
    fn escaping_output_is_refused() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let mut writer = Writer::new(dir.path().join("out"));
        let output: Snapshot = [("../x.txt", "x")].into_iter().collect();
        assert!(writer.apply(&output).is_err());
        assert!(!dir.path().join("x.txt").exists());
        Ok(())
    }
}
