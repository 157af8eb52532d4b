use std::{
    fs::{File, OpenOptions},
    io::{BufReader, Write},
    path::{Path, PathBuf},
};

use getref::format::CiteFormat;

use eyre::{eyre, Context, Result};
use log::trace;

/// Read the references file, one reference per line.
pub fn read_references(path: &Path) -> Result<Vec<String>> {
    trace!("Opening '{}' for reading", path.display());
    let file = File::open(path)
        .wrap_err_with(|| format!("Failed to open the '{}' file for reading.", path.display()))?;

    getref::reference::read_references(BufReader::new(file))
        .wrap_err_with(|| eyre!("Cannot read the references in '{}'", path.display()))
}

/// Write the rendered records to `path`, adding the extension of `format` when the path has
/// none. Returns the path written to.
pub fn write_records(path: &Path, format: CiteFormat, rendered: &str) -> Result<PathBuf> {
    let path = if path.extension().is_some() {
        path.to_path_buf()
    } else {
        path.with_extension(format.ext())
    };

    trace!("Writing {} records to '{}'", format.name(), path.display());
    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&path)
        .wrap_err_with(|| format!("Failed to open the '{}' file for writing.", path.display()))?;

    file.write_all(rendered.as_bytes())
        .wrap_err_with(|| eyre!("Cannot write records to file"))?;

    Ok(path)
}

#[cfg(test)]
mod tests {

    use super::*;

    use assert_fs::{
        fixture::{FileWriteStr, PathChild},
        NamedTempFile, TempDir,
    };

    #[test]
    #[should_panic(expected = "Failed to open the 'file does not exist.txt' file for reading")]
    fn err_when_trying_to_open_refs_file_that_does_not_exist() {
        read_references(Path::new("file does not exist.txt")).unwrap();
    }

    #[test]
    fn read_refs_file_line_by_line() {
        let file = NamedTempFile::new("refs.txt").expect("Cannot create temp file for test");
        file.write_str("[1] Deep Learning, Goodfellow et al.\n[2] Attention is all you need\n")
            .unwrap();

        let refs = read_references(file.path()).unwrap();
        file.close().unwrap();

        assert_eq!(
            vec![
                "[1] Deep Learning, Goodfellow et al.",
                "[2] Attention is all you need"
            ],
            refs
        );
    }

    #[test]
    fn format_extension_added_when_missing() {
        let dir = TempDir::new().expect("Cannot create temp directory for test");

        let path = write_records(dir.child("refs").path(), CiteFormat::BibTex, "@misc{a,}\n\n")
            .unwrap();

        assert_eq!(Some(std::ffi::OsStr::new("bib")), path.extension());
        assert_eq!("@misc{a,}\n\n", std::fs::read_to_string(&path).unwrap());
    }

    #[test]
    fn given_extension_is_kept() {
        let dir = TempDir::new().expect("Cannot create temp directory for test");

        let path =
            write_records(dir.child("out.txt").path(), CiteFormat::RefMan, "TY  - JOUR\n")
                .unwrap();

        assert_eq!(dir.child("out.txt").path(), path);
    }

    #[test]
    fn existing_file_is_overwritten() {
        let dir = TempDir::new().expect("Cannot create temp directory for test");
        let child = dir.child("out.enw");
        child.write_str("old content that is longer").unwrap();

        write_records(child.path(), CiteFormat::EndNote, "%0 Book\n").unwrap();

        assert_eq!("%0 Book\n", std::fs::read_to_string(child.path()).unwrap());
    }
}
