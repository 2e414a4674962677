//! Enumeration of batch input files.

use std::path::Path;

use anyhow::Result;
use walkdir::WalkDir;

use engine::value::Value;

/// Lists regular files under `dir`, optionally filtered by case-insensitive
/// extension, sorted by path for a stable batch order.
pub fn list_files(dir: &Path, extension: Option<&str>) -> Result<Vec<Value>> {
    let mut paths = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        if let Some(wanted) = extension {
            let matches = entry
                .path()
                .extension()
                .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case(wanted))
                .unwrap_or(false);
            if !matches {
                continue;
            }
        }

        paths.push(entry.into_path());
    }

    paths.sort();
    Ok(paths.into_iter().map(Value::File).collect())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use googletest::prelude::*;

    use super::*;

    fn touch(path: &Path) -> anyhow::Result<()> {
        fs::write(path, b"")?;
        Ok(())
    }

    #[gtest]
    fn test_lists_matching_files_sorted() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        touch(&dir.path().join("b.txt"))?;
        touch(&dir.path().join("a.TXT"))?;
        touch(&dir.path().join("c.csv"))?;
        fs::create_dir(dir.path().join("sub"))?;
        touch(&dir.path().join("sub/d.txt"))?;

        let values = list_files(dir.path(), Some("txt"))?;
        let labels: Vec<String> = values.iter().map(Value::label).collect();

        expect_that!(labels, eq(&vec!["a.TXT", "b.txt", "d.txt"]));

        Ok(())
    }

    #[gtest]
    fn test_no_filter_lists_everything() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        touch(&dir.path().join("a.txt"))?;
        touch(&dir.path().join("b.csv"))?;

        let values = list_files(dir.path(), None)?;

        expect_that!(values.len(), eq(2));

        Ok(())
    }
}
