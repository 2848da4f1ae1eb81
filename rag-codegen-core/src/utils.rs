//! File and model-output helpers

use regex_utils::code_fence;
use regex_utils::language::from_fence_tag;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// A fenced code block from a model response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    /// Language name derived from the fence tag
    pub language: Option<String>,
    /// Path from a `# filepath:` comment on the first line
    pub path: Option<String>,
    pub code: String,
}

/// Split a model response into its fenced code blocks.
///
/// A response without any fence is treated as a single block of code. An
/// unclosed trailing block is kept.
pub fn extract_code_blocks(response: &str) -> Vec<CodeBlock> {
    let mut blocks = Vec::new();
    let mut current: Option<CodeBlock> = None;
    let mut saw_fence = false;

    for line in response.lines() {
        if let Some(tag) = code_fence::fence_language(line) {
            saw_fence = true;
            match current.take() {
                Some(block) => {
                    if !block.code.trim().is_empty() {
                        blocks.push(block);
                    }
                }
                None => {
                    current = Some(CodeBlock {
                        language: from_fence_tag(&tag),
                        path: None,
                        code: String::new(),
                    });
                }
            }
            continue;
        }

        if let Some(block) = current.as_mut() {
            if block.code.is_empty() && block.path.is_none() {
                if let Some(path) = code_fence::filepath_hint(line) {
                    block.path = Some(path);
                    continue;
                }
            }
            block.code.push_str(line);
            block.code.push('\n');
        }
    }

    if let Some(block) = current.filter(|b| !b.code.trim().is_empty()) {
        blocks.push(block);
    }

    if !saw_fence && !response.trim().is_empty() {
        blocks.push(CodeBlock { language: None, path: None, code: response.to_string() });
    }

    blocks
}

/// The code worth saving from a response: its first block, or the whole
/// text when there is no fence
pub fn primary_code(response: &str) -> String {
    extract_code_blocks(response)
        .into_iter()
        .next()
        .map(|block| block.code)
        .unwrap_or_else(|| response.to_string())
}

/// Write content to a named temporary file with the given extension.
/// The file is removed when the handle is dropped.
pub fn save_to_temp_file(content: &str, extension: &str) -> std::io::Result<NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix("rag-codegen-")
        .suffix(&format!(".{}", extension.trim_start_matches('.')))
        .tempfile()?;
    file.write_all(content.as_bytes())?;
    file.flush()?;
    Ok(file)
}

/// Lowercased extension with its leading dot, or an empty string
pub fn get_file_extension(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

pub fn is_python_file(path: &Path) -> bool {
    get_file_extension(path) == ".py"
}

/// `path` relative to `base`, or `path` itself when it is not under `base`
pub fn relative_path(path: &Path, base: &Path) -> PathBuf {
    path.strip_prefix(base).map(Path::to_path_buf).unwrap_or_else(|_| path.to_path_buf())
}

pub fn detect_language_from_path(path: &Path) -> Option<String> {
    let ext = get_file_extension(path);
    from_fence_tag(ext.trim_start_matches('.'))
}
