use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{Result, VidpipeError};

/// One entry of the pipeline's output directory
#[derive(Debug, Clone, PartialEq)]
pub struct OutputEntry {
    /// Path relative to the output directory
    pub name: PathBuf,
    pub size: u64,
    pub is_dir: bool,
}

/// List the direct children of the output directory, sorted by name
pub fn list_output_files<P: AsRef<Path>>(dir: P) -> Result<Vec<OutputEntry>> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(VidpipeError::FileNotFound(dir.display().to_string()));
    }

    let mut entries = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| VidpipeError::Io(e.into()))?;
        let metadata = entry.metadata().map_err(|e| VidpipeError::Io(e.into()))?;
        let name = pathdiff::diff_paths(entry.path(), dir)
            .unwrap_or_else(|| PathBuf::from(entry.file_name()));

        entries.push(OutputEntry {
            name,
            size: if metadata.is_dir() { 0 } else { metadata.len() },
            is_dir: metadata.is_dir(),
        });
    }
    Ok(entries)
}

/// Format a byte count as a human readable size
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
    }

    #[test]
    fn test_lists_direct_children_sorted() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("video_with_watermark.mp4").write_binary(&[0u8; 2048]).unwrap();
        temp.child("video_chinese.srt").write_str("1\n").unwrap();
        temp.child("frames").create_dir_all().unwrap();
        temp.child("frames/0001.png").touch().unwrap();

        let entries = list_output_files(temp.path()).unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.to_string_lossy().to_string()).collect();
        assert_eq!(names, vec!["frames", "video_chinese.srt", "video_with_watermark.mp4"]);
        assert!(entries[0].is_dir);
        assert_eq!(entries[2].size, 2048);
    }

    #[test]
    fn test_missing_directory() {
        let temp = assert_fs::TempDir::new().unwrap();
        let err = list_output_files(temp.path().join("nope")).unwrap_err();
        assert!(matches!(err, VidpipeError::FileNotFound(_)));
    }
}
