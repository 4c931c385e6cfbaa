//! Theme archives
//!
//! The command line accepts either a single zip archive, used as is, or a
//! list of directories that get packed into a fresh archive. [`classify`]
//! decides which of the two a path list is (or rejects it), and
//! [`package`] produces the file that is eventually uploaded.

use crate::error::{Error, Result};
use crate::paths::{absolutize, to_slash};
use std::collections::HashSet;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// What a list of command-line paths turned out to be
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// An existing archive, uploaded without repacking
    Archive(PathBuf),
    /// Directories to pack, as absolute paths, in command-line order
    Directories(Vec<PathBuf>),
}

/// Result of checking whether a regular file is a readable zip archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveProbe {
    Valid { entries: usize },
    NotAnArchive(String),
}

/// Check whether `path` opens as a zip archive.
///
/// Files that are not archives (or are corrupt ones) yield
/// [`ArchiveProbe::NotAnArchive`]; failing to read the file at all, such as
/// on a permission error, is an [`Error::Io`].
pub fn probe_archive(path: &Path) -> Result<ArchiveProbe> {
    let file = File::open(path)?;
    match ZipArchive::new(file) {
        Ok(archive) => Ok(ArchiveProbe::Valid {
            entries: archive.len(),
        }),
        Err(ZipError::Io(err)) if err.kind() != io::ErrorKind::UnexpectedEof => Err(err.into()),
        Err(err) => Ok(ArchiveProbe::NotAnArchive(err.to_string())),
    }
}

/// Decide whether `paths` name a single archive or a set of directories.
/// Relative paths are taken relative to `cwd`.
pub fn classify(paths: &[PathBuf], cwd: &Path) -> Result<Payload> {
    let first = paths.first().ok_or_else(|| {
        Error::usage("a single archive file or a list of directories must be present")
    })?;
    let first = absolutize(first, cwd);

    if first.is_file() {
        match probe_archive(&first)? {
            ArchiveProbe::Valid { entries } => {
                if paths.len() != 1 {
                    return Err(Error::usage("specify a single archive file only"));
                }
                tracing::debug!(path = %first.display(), entries, "uploading existing archive");
                Ok(Payload::Archive(first))
            }
            ArchiveProbe::NotAnArchive(reason) => {
                tracing::debug!(path = %first.display(), %reason, "not a zip archive");
                Err(neither(paths))
            }
        }
    } else {
        let directories: Vec<PathBuf> = paths.iter().map(|path| absolutize(path, cwd)).collect();
        if directories.iter().all(|path| path.is_dir()) {
            Ok(Payload::Directories(directories))
        } else {
            Err(neither(paths))
        }
    }
}

fn neither(paths: &[PathBuf]) -> Error {
    let listed: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
    Error::usage(format!(
        "{} is neither a single archive nor a list of directories",
        listed.join(" ")
    ))
}

/// Archive ready for upload. When it was built from directories it lives in
/// a temporary directory that is removed on drop.
#[derive(Debug)]
pub struct PackagedArchive {
    path: PathBuf,
    file_name: String,
    workdir: Option<TempDir>,
}

impl PackagedArchive {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name the archive is uploaded under
    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

/// Produce the archive to upload for `payload`.
///
/// Directories are nested under `prefix/` inside the archive when a
/// non-empty prefix is given, and the archive is then named `{prefix}.zip`;
/// otherwise it is named after the first directory.
pub fn package(payload: &Payload, prefix: Option<&str>, cwd: &Path) -> Result<PackagedArchive> {
    match payload {
        Payload::Archive(path) => Ok(PackagedArchive {
            path: path.clone(),
            file_name: file_name_of(path),
            workdir: None,
        }),
        Payload::Directories(directories) => {
            let prefix = prefix.map(str::trim).filter(|p| !p.is_empty());
            let stem = match prefix {
                Some(prefix) => prefix.replace(['/', '\\'], "_"),
                None => directories
                    .first()
                    .map(|dir| file_name_of(dir))
                    .unwrap_or_default(),
            };
            let file_name = format!("{}.zip", stem);

            let workdir = tempfile::Builder::new().prefix("djupload-").tempdir()?;
            let path = workdir.path().join(&file_name);
            write_archive(&path, directories, prefix, cwd)?;

            Ok(PackagedArchive {
                path,
                file_name,
                workdir: Some(workdir),
            })
        }
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "theme".to_string())
}

/// Location of a directory inside the archive: its path relative to `cwd`,
/// or its base name when it lies outside `cwd`.
fn archive_root(dir: &Path, cwd: &Path) -> String {
    let cwd = absolutize(cwd, Path::new("/"));
    match dir.strip_prefix(&cwd) {
        Ok(relative) => to_slash(relative),
        Err(_) => file_name_of(dir),
    }
}

fn join_entry(parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("/")
}

fn entry_options(mode: u32) -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(mode)
}

fn write_archive(
    dest: &Path,
    directories: &[PathBuf],
    prefix: Option<&str>,
    cwd: &Path,
) -> Result<()> {
    let mut zip = ZipWriter::new(File::create(dest)?);
    // Overlapping or repeated directories yield the same entry names
    let mut written: HashSet<String> = HashSet::new();
    let mut files = 0usize;

    for dir in directories {
        let root = join_entry(&[prefix.unwrap_or(""), &archive_root(dir, cwd)]);

        for entry in WalkDir::new(dir).follow_links(true).sort_by_file_name() {
            let entry = entry.map_err(io::Error::from)?;
            let relative = match entry.path().strip_prefix(dir) {
                Ok(relative) => to_slash(relative),
                Err(_) => continue,
            };
            let name = join_entry(&[&root, &relative]);
            if name.is_empty() || !written.insert(name.clone()) {
                continue;
            }

            if entry.file_type().is_dir() {
                zip.add_directory(name, entry_options(0o755))?;
            } else if entry.file_type().is_file() {
                zip.start_file(name, entry_options(0o644))?;
                let mut source = File::open(entry.path())?;
                io::copy(&mut source, &mut zip)?;
                files += 1;
            }
        }
    }

    zip.finish()?;
    tracing::info!(path = %dest.display(), files, "packed theme archive");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;

    fn theme_tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("templates/emails")).unwrap();
        fs::create_dir_all(dir.path().join("static/css")).unwrap();
        fs::write(dir.path().join("templates/index.html"), "<html></html>").unwrap();
        fs::write(dir.path().join("templates/emails/welcome.eml"), "hello").unwrap();
        fs::write(dir.path().join("static/css/base.css"), "body {}").unwrap();
        fs::write(dir.path().join("notes.txt"), "not an archive").unwrap();
        dir
    }

    fn write_zip(path: &Path) {
        let mut zip = ZipWriter::new(File::create(path).unwrap());
        zip.start_file("templates/index.html", SimpleFileOptions::default())
            .unwrap();
        zip.write_all(b"<html></html>").unwrap();
        zip.finish().unwrap();
    }

    fn entry_names(path: &Path) -> Vec<String> {
        let archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
        let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
        names.sort();
        names
    }

    #[test]
    fn test_classify_empty_list() {
        let err = classify(&[], Path::new("/")).unwrap_err();
        assert!(matches!(err, Error::Usage(_)));
        assert!(err.to_string().contains("must be present"));
    }

    #[test]
    fn test_classify_missing_path() {
        let dir = theme_tree();
        let err = classify(&[PathBuf::from("missing")], dir.path()).unwrap_err();
        assert!(matches!(err, Error::Usage(_)));
        assert!(err.to_string().contains("neither a single archive"));
    }

    #[test]
    fn test_classify_single_archive() {
        let dir = theme_tree();
        write_zip(&dir.path().join("bundle.zip"));

        let payload = classify(&[PathBuf::from("bundle.zip")], dir.path()).unwrap();

        assert_eq!(payload, Payload::Archive(dir.path().join("bundle.zip")));
    }

    #[test]
    fn test_classify_archive_with_extra_paths() {
        let dir = theme_tree();
        write_zip(&dir.path().join("bundle.zip"));

        let err = classify(
            &[PathBuf::from("bundle.zip"), PathBuf::from("templates")],
            dir.path(),
        )
        .unwrap_err();

        assert!(err.to_string().contains("single archive file only"));
    }

    #[test]
    fn test_classify_plain_file() {
        let dir = theme_tree();
        let err = classify(&[PathBuf::from("notes.txt")], dir.path()).unwrap_err();
        assert!(err.to_string().contains("neither a single archive"));
    }

    #[test]
    fn test_classify_directories() {
        let dir = theme_tree();
        let payload = classify(
            &[PathBuf::from("templates/"), PathBuf::from("static")],
            dir.path(),
        )
        .unwrap();

        assert_eq!(
            payload,
            Payload::Directories(vec![dir.path().join("templates"), dir.path().join("static")])
        );
    }

    #[test]
    fn test_classify_mixed_directories_and_files() {
        let dir = theme_tree();
        let err = classify(
            &[PathBuf::from("templates"), PathBuf::from("notes.txt")],
            dir.path(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Usage(_)));
    }

    #[test]
    fn test_probe_not_an_archive() {
        let dir = theme_tree();
        let probe = probe_archive(&dir.path().join("notes.txt")).unwrap();
        assert!(matches!(probe, ArchiveProbe::NotAnArchive(_)));
    }

    #[test]
    fn test_probe_missing_file_is_io_error() {
        let dir = theme_tree();
        let err = probe_archive(&dir.path().join("absent.zip")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_package_existing_archive_is_used_directly() {
        let dir = theme_tree();
        let path = dir.path().join("bundle.zip");
        write_zip(&path);

        let archive = package(&Payload::Archive(path.clone()), Some("demo"), dir.path()).unwrap();

        assert_eq!(archive.path(), path);
        assert_eq!(archive.file_name(), "bundle.zip");
        assert!(archive.workdir.is_none());
    }

    #[test]
    fn test_package_directories_under_prefix() {
        let dir = theme_tree();
        let payload = classify(
            &[PathBuf::from("templates/"), PathBuf::from("static/")],
            dir.path(),
        )
        .unwrap();

        let archive = package(&payload, Some("mytheme"), dir.path()).unwrap();

        assert_eq!(archive.file_name(), "mytheme.zip");
        assert!(archive.workdir.is_some());
        assert_eq!(
            entry_names(archive.path()),
            vec![
                "mytheme/static/",
                "mytheme/static/css/",
                "mytheme/static/css/base.css",
                "mytheme/templates/",
                "mytheme/templates/emails/",
                "mytheme/templates/emails/welcome.eml",
                "mytheme/templates/index.html",
            ]
        );
    }

    #[test]
    fn test_package_without_prefix_is_named_after_first_directory() {
        let dir = theme_tree();
        let payload = classify(&[PathBuf::from("templates")], dir.path()).unwrap();

        let archive = package(&payload, None, dir.path()).unwrap();

        assert_eq!(archive.file_name(), "templates.zip");
        assert!(entry_names(archive.path()).contains(&"templates/index.html".to_string()));
    }

    #[test]
    fn test_package_overlapping_directories() {
        let dir = theme_tree();
        let payload = classify(
            &[PathBuf::from("templates"), PathBuf::from("templates/emails")],
            dir.path(),
        )
        .unwrap();

        let archive = package(&payload, None, dir.path()).unwrap();

        assert_eq!(
            entry_names(archive.path()),
            vec![
                "templates/",
                "templates/emails/",
                "templates/emails/welcome.eml",
                "templates/index.html",
            ]
        );
    }

    #[test]
    fn test_package_repeated_directory() {
        let dir = theme_tree();
        let payload = classify(
            &[PathBuf::from("templates"), PathBuf::from("templates/")],
            dir.path(),
        )
        .unwrap();

        let archive = package(&payload, Some("mytheme"), dir.path()).unwrap();

        let names = entry_names(archive.path());
        assert_eq!(names.len(), 4);
        assert!(names.contains(&"mytheme/templates/index.html".to_string()));
    }

    #[test]
    fn test_temporary_archive_is_removed_on_drop() {
        let dir = theme_tree();
        let payload = classify(&[PathBuf::from("static")], dir.path()).unwrap();
        let archive = package(&payload, Some("demo"), dir.path()).unwrap();
        let path = archive.path().to_path_buf();
        assert!(path.exists());

        drop(archive);

        assert!(!path.exists());
    }

    #[test]
    fn test_directory_outside_cwd_uses_base_name() {
        let dir = theme_tree();
        let elsewhere = TempDir::new().unwrap();

        assert_eq!(
            archive_root(&dir.path().join("templates"), elsewhere.path()),
            "templates"
        );
        assert_eq!(archive_root(dir.path(), dir.path()), "");
    }
}
