use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use std::io::Write;
use std::path::Path;

/// Write an export file atomically
///
/// The file is either fully replaced or left untouched; a failed export never
/// leaves a truncated table behind.
pub fn write_export(path: &Path, contents: &str) -> Result<()> {
    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;

    file.write_all(contents.as_bytes())
        .context("Failed to write export")?;
    if !contents.ends_with('\n') {
        file.write_all(b"\n").context("Failed to write export")?;
    }

    file.commit()
        .with_context(|| format!("Failed to save export to {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_export() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("standings.tsv");

        write_export(&path, "Pos\tEntrant\n1\tVER").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "Pos\tEntrant\n1\tVER\n");

        // Overwrites an existing export
        write_export(&path, "Pos\tEntrant\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "Pos\tEntrant\n");
    }

    #[test]
    fn test_write_export_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("standings.tsv");
        assert!(write_export(&path, "x").is_err());
    }
}
