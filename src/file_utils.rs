use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

// @module: File and directory utilities

/// Extensions of documents the pipeline accepts
pub const TEMPLATE_EXTENSIONS: &[&str] = &["handlebars", "hbs", "html", "htm"];

/// Marker inserted between stem and extension of output files
pub const TRANSLATED_MARKER: &str = "translated";

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)
                .with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(())
    }

    // @returns: `<stem>.translated.<ext>` for the input's file name
    pub fn output_file_name<P: AsRef<Path>>(input_file: P) -> String {
        let input_file = input_file.as_ref();
        let stem = input_file.file_stem().unwrap_or_default().to_string_lossy();

        match input_file.extension() {
            Some(ext) => format!("{}.{}.{}", stem, TRANSLATED_MARKER, ext.to_string_lossy()),
            None => format!("{}.{}", stem, TRANSLATED_MARKER),
        }
    }

    // @generates: Output path for a translated template
    // @params: input_file, output_dir (defaults to the input's directory)
    pub fn generate_output_path<P: AsRef<Path>>(input_file: P, output_dir: Option<&Path>) -> PathBuf {
        let input_file = input_file.as_ref();
        let directory = output_dir
            .map(Path::to_path_buf)
            .or_else(|| input_file.parent().map(Path::to_path_buf))
            .unwrap_or_default();

        directory.join(Self::output_file_name(input_file))
    }

    // @checks: Template extension, excluding earlier outputs
    pub fn is_template_file<P: AsRef<Path>>(path: P) -> bool {
        let path = path.as_ref();
        let has_template_ext = path
            .extension()
            .map(|ext| {
                let ext = ext.to_string_lossy();
                TEMPLATE_EXTENSIONS.iter().any(|t| ext.eq_ignore_ascii_case(t))
            })
            .unwrap_or(false);

        has_template_ext && !Self::is_translated_output(path)
    }

    // @checks: File name ends in `.translated.<ext>`
    pub fn is_translated_output<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref()
            .file_stem()
            .and_then(|stem| Path::new(stem).extension())
            .map(|inner| inner == TRANSLATED_MARKER)
            .unwrap_or(false)
    }

    /// Find template files below a directory, sorted by path
    pub fn find_template_files<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
        let mut result = Vec::new();

        for entry in WalkDir::new(dir.as_ref()).follow_links(true) {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if path.is_file() && Self::is_template_file(path) {
                result.push(path.to_path_buf());
            }
        }

        result.sort();
        Ok(result)
    }

    /// Read a file to a string
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        fs::read_to_string(&path).with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }
}
