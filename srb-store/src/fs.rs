//! Capability-based filesystem helpers built on `cap-std` and `camino`.

use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};

/// Open a UTF-8 file path using ambient authority.
pub(crate) fn open_utf8_file(path: &Utf8Path) -> io::Result<fs_utf8::File> {
    fs_utf8::File::open_ambient(path, ambient_authority())
}

/// Ensure the directory holding `path` exists.
pub(crate) fn ensure_parent_dir(path: &Utf8Path) -> io::Result<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_str().is_empty() || parent == Utf8Path::new("/") {
        return Ok(());
    }

    let (base_dir, relative) = base_dir_and_relative(parent)?;
    if relative.as_str().is_empty() {
        return Ok(());
    }
    base_dir.create_dir_all(&relative)
}

fn base_dir_and_relative(parent: &Utf8Path) -> io::Result<(fs_utf8::Dir, Utf8PathBuf)> {
    let (base, relative) = if parent.is_absolute() {
        ("/", parent.strip_prefix("/").unwrap_or(parent))
    } else {
        (".", parent)
    };
    let dir = fs_utf8::Dir::open_ambient_dir(base, ambient_authority())?;
    Ok((dir, relative.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    #[rstest]
    fn creates_nested_parent_directories() {
        let dir = TempDir::new().expect("create temp dir");
        let target = Utf8PathBuf::from_path_buf(dir.path().join("a/b/srb.db")).expect("utf-8 path");

        ensure_parent_dir(&target).expect("create parents");

        assert!(target.parent().is_some_and(Utf8Path::is_dir));
    }

    #[rstest]
    fn bare_file_names_need_no_directory() {
        ensure_parent_dir(Utf8Path::new("srb.db")).expect("nothing to create");
    }

    #[rstest]
    fn missing_files_report_not_found() {
        let dir = TempDir::new().expect("create temp dir");
        let missing =
            Utf8PathBuf::from_path_buf(dir.path().join("missing.json")).expect("utf-8 path");
        let error = open_utf8_file(&missing).expect_err("missing file should fail");
        assert_eq!(error.kind(), io::ErrorKind::NotFound);
    }
}
