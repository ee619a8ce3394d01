use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use walkdir::WalkDir;

// @module: File and directory utilities

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_dir()
    }

    /// Find files whose extension matches one of the given extensions
    /// (case-insensitive, without the leading dot).
    ///
    /// The walk is recursive and sorted by file name so that runs are
    /// reproducible. Entries that cannot be read are skipped rather than
    /// failing the whole traversal.
    pub fn find_files_with_extensions<P: AsRef<Path>>(
        dir: P,
        extensions: &[&str],
    ) -> Vec<PathBuf> {
        let mut result = Vec::new();

        for entry in WalkDir::new(dir.as_ref())
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();

            if path.is_file() {
                if let Some(ext) = path.extension() {
                    let ext = ext.to_string_lossy();
                    if extensions.iter().any(|e| ext.eq_ignore_ascii_case(e)) {
                        result.push(path.to_path_buf());
                    }
                }
            }
        }

        result
    }

    /// Compute the sidecar path for a media file: same directory, same base
    /// name, the given extension.
    pub fn sidecar_path<P: AsRef<Path>>(media_file: P, extension: &str) -> PathBuf {
        media_file.as_ref().with_extension(extension)
    }

    /// Read a file to a string, replacing undecodable bytes instead of
    /// failing. Metadata files in the wild are frequently mis-encoded.
    pub fn read_to_string_lossy<P: AsRef<Path>>(path: P) -> Result<String> {
        let bytes = fs::read(&path)
            .with_context(|| format!("Failed to read file: {:?}", path.as_ref()))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Atomically replace a file's content: write to a temporary file in the
    /// same directory, then rename over the target. The original file is
    /// preserved untouched until the new content is fully on disk.
    pub fn write_atomic<P: AsRef<Path>>(path: P, content: &[u8]) -> Result<()> {
        let path = path.as_ref();
        let dir = path.parent().unwrap_or_else(|| Path::new("."));

        let mut temp = NamedTempFile::new_in(dir)
            .with_context(|| format!("Failed to create temporary file in {:?}", dir))?;
        temp.write_all(content)
            .with_context(|| format!("Failed to write temporary file for {:?}", path))?;
        temp.persist(path)
            .with_context(|| format!("Failed to replace file: {:?}", path))?;

        Ok(())
    }
}
