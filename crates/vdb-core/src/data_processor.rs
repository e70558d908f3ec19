//! Walks a directory and cuts text files into line-ranged documents ready to
//! be embedded and inserted.

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::types::{Metadata, VectorDocument};

#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    pub max_lines: usize,
    pub overlap_lines: usize,
    pub extensions: Vec<String>,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_lines: 40,
            overlap_lines: 5,
            extensions: ["txt", "md", "rs", "py", "ts", "js", "go", "java", "toml"].iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Default)]
pub struct DataProcessor {
    chunking_config: ChunkingConfig,
}

impl DataProcessor {
    pub fn new() -> Self { Self::default() }

    pub fn with_config(chunking_config: ChunkingConfig) -> Self { Self { chunking_config } }

    pub fn process_directory(&self, data_dir: &Path) -> Result<Vec<VectorDocument>> {
        self.process_files(data_dir, self.list_files(data_dir))
    }

    pub fn process_directory_limited(&self, data_dir: &Path, limit: usize) -> Result<Vec<VectorDocument>> {
        let mut files = self.list_files(data_dir);
        if files.len() > limit { files.truncate(limit); info!("limited to first {} files", limit); }
        self.process_files(data_dir, files)
    }

    fn process_files(&self, data_dir: &Path, files: Vec<PathBuf>) -> Result<Vec<VectorDocument>> {
        if files.is_empty() {
            info!("no matching files found under {}", data_dir.display());
            return Ok(vec![]);
        }
        let mut all_chunks = Vec::new();
        for (file_index, file_path) in files.iter().enumerate() {
            debug!("processing file {}/{}: {}", file_index + 1, files.len(), file_path.display());
            let content = self.read_file_content(file_path)?;
            let relative_path = file_path.strip_prefix(data_dir).unwrap_or(file_path).to_string_lossy().replace('\\', "/");
            let extension = file_path.extension().and_then(|s| s.to_str()).unwrap_or_default();
            all_chunks.extend(self.chunk_content(&content, &relative_path, extension));
        }
        info!("processed {} files into {} chunks", files.len(), all_chunks.len());
        Ok(all_chunks)
    }

    fn read_file_content(&self, file_path: &Path) -> Result<String> {
        match fs::read_to_string(file_path) {
            Ok(content) => Ok(content),
            Err(_) => Ok(String::from_utf8_lossy(&fs::read(file_path)?).to_string()),
        }
    }

    /// Splits `content` into windows of at most `max_lines` lines, each window
    /// starting `max_lines - overlap_lines` after the previous one. Blank
    /// windows are skipped. Line numbers are 1-based and inclusive.
    pub fn chunk_content(&self, content: &str, relative_path: &str, extension: &str) -> Vec<VectorDocument> {
        let lines: Vec<&str> = content.lines().collect();
        let max_lines = self.chunking_config.max_lines.max(1);
        let step = max_lines.saturating_sub(self.chunking_config.overlap_lines).max(1);
        let mut chunks = Vec::new();
        let mut start = 0;
        while start < lines.len() {
            let end = (start + max_lines).min(lines.len());
            let text = lines[start..end].join("\n");
            if !text.trim().is_empty() {
                let (start_line, end_line) = (start as i64 + 1, end as i64);
                chunks.push(VectorDocument {
                    id: format!("{}:{}-{}", relative_path, start_line, end_line),
                    vector: Vec::new(),
                    content: text,
                    relative_path: relative_path.to_string(),
                    start_line,
                    end_line,
                    file_extension: if extension.is_empty() { String::new() } else { format!(".{}", extension) },
                    metadata: Metadata::new(),
                });
            }
            if end >= lines.len() { break; }
            start += step;
        }
        chunks
    }

    fn list_files(&self, root: &Path) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for entry in walkdir::WalkDir::new(root).into_iter().filter_map(|e| e.ok()).filter(|e| e.file_type().is_file()) {
            let path = entry.path();
            let ext = path.extension().and_then(|s| s.to_str()).unwrap_or_default();
            if self.chunking_config.extensions.iter().any(|e| e == ext) { files.push(path.to_path_buf()); }
        }
        files.sort(); files
    }
}
