use anyhow::{Result, Context};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use serde::Serialize;

use crate::captions::CaptionTrack;

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

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)?;
        }
        Ok(())
    }

    // @generates: Output path next to a caption file
    // @params: input_file, output_dir, suffix, extension
    pub fn generate_output_path<P1: AsRef<Path>, P2: AsRef<Path>>(
        input_file: P1,
        output_dir: P2,
        suffix: &str,
        extension: &str,
    ) -> PathBuf {
        let stem = input_file.as_ref().file_stem().unwrap_or_default();

        let mut output_filename = stem.to_string_lossy().to_string();
        output_filename.push('.');
        output_filename.push_str(suffix);
        output_filename.push('.');
        output_filename.push_str(extension);

        output_dir.as_ref().join(output_filename)
    }

    /// Find files with a specific extension in a directory
    pub fn find_files<P: AsRef<Path>>(dir: P, extension: &str) -> Result<Vec<PathBuf>> {
        let mut result = Vec::new();
        let normalized_ext = extension.trim_start_matches('.');

        for entry in WalkDir::new(dir.as_ref()).follow_links(true) {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if path.is_file() {
                if let Some(ext) = path.extension() {
                    if ext.to_string_lossy().eq_ignore_ascii_case(normalized_ext) {
                        result.push(path.to_path_buf());
                    }
                }
            }
        }

        result.sort();
        Ok(result)
    }

    /// Caption files below `input`, or `input` itself when it is a file
    pub fn caption_inputs<P: AsRef<Path>>(input: P) -> Result<Vec<PathBuf>> {
        let input = input.as_ref();
        if Self::file_exists(input) {
            Ok(vec![input.to_path_buf()])
        } else if Self::dir_exists(input) {
            Self::find_files(input, "json")
        } else {
            Err(anyhow::anyhow!("Input path does not exist: {:?}", input))
        }
    }

    /// Read a file to a string
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        fs::read_to_string(&path)
            .with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    /// Read and decode a caption JSON file
    pub fn read_caption_track<P: AsRef<Path>>(path: P) -> Result<CaptionTrack> {
        let content = Self::read_to_string(&path)?;
        CaptionTrack::from_json(&content)
            .with_context(|| format!("Failed to parse caption file: {:?}", path.as_ref()))
    }

    /// Write a string to a file
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        // Ensure the parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        fs::write(&path, content)
            .with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Serialize `value` as pretty JSON into `path`
    pub fn write_json<P: AsRef<Path>, T: Serialize>(path: P, value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)
            .context("Failed to serialize value to JSON")?;
        Self::write_to_file(path, &json)
    }

    /// Video id implied by a caption file name (`<id>.json`, `<id>.<lang>.json`)
    pub fn video_id_from_path<P: AsRef<Path>>(path: P) -> String {
        let stem = path.as_ref().file_stem().unwrap_or_default().to_string_lossy().to_string();
        stem.split('.').next().unwrap_or_default().to_string()
    }
}
