//! Regex utilities for rag-codegen
//! Extracted to a separate crate for compilation optimization

use once_cell::sync::Lazy;
use regex::Regex;

/// Tokenising patterns used for text embeddings
pub mod tokens {
    use super::*;

    /// Identifiers, numbers and single punctuation marks that carry meaning in code
    pub static WORD_PATTERN: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"[A-Za-z_][A-Za-z0-9_]*|[0-9]+|==|!=|<=|>=|->|=>|[{}()\[\]<>=+\-*/%.:]")
            .expect("Invalid regex pattern")
    });

    static CAMEL_BOUNDARY: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"[A-Z]+[a-z0-9]*|[a-z]+[0-9]*|[0-9]+").expect("Invalid regex pattern")
    });

    /// Split a single identifier into its snake_case / camelCase parts.
    ///
    /// Returns an empty vector when the identifier has only one part.
    pub fn sub_words(identifier: &str) -> Vec<String> {
        let parts: Vec<String> = identifier
            .split('_')
            .filter(|part| !part.is_empty())
            .flat_map(|part| {
                CAMEL_BOUNDARY.find_iter(part).map(|m| m.as_str().to_lowercase()).collect::<Vec<_>>()
            })
            .collect();

        if parts.len() > 1 { parts } else { Vec::new() }
    }
}

/// Markdown code fence patterns found in model responses
pub mod code_fence {
    use super::*;

    /// Opening or closing fence, with an optional language tag
    pub static FENCE_PATTERN: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"^\s*```\s*([A-Za-z0-9_+#.\-]*)\s*$").expect("Invalid regex pattern")
    });

    /// `# filepath: src/app.py` or `// file: main.rs` on the first line of a block
    pub static FILEPATH_PATTERN: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"^\s*(?://|#)\s*(?:filepath|file)\s*:\s*(\S+)\s*$")
            .expect("Invalid regex pattern")
    });

    /// Returns `Some(language)` when the line is a fence; the language may be empty
    pub fn fence_language(line: &str) -> Option<String> {
        FENCE_PATTERN
            .captures(line)
            .map(|caps| caps.get(1).map(|m| m.as_str().to_lowercase()).unwrap_or_default())
    }

    /// Extract a file path hint from a comment line
    pub fn filepath_hint(line: &str) -> Option<String> {
        FILEPATH_PATTERN.captures(line).and_then(|caps| caps.get(1)).map(|m| m.as_str().to_string())
    }
}

/// Language detection patterns
pub mod language {
    use super::*;

    pub struct LanguageMatcher {
        patterns: Vec<(Regex, &'static str)>,
    }

    impl LanguageMatcher {
        pub fn new() -> Self {
            // Order matters: JavaScript must be tried before Java.
            let raw = [
                (r"\bpython\b|\bdjango\b|\bflask\b|\bfastapi\b|\bpandas\b", "Python"),
                (r"\brust\b|\bcargo\b", "Rust"),
                (r"\btypescript\b", "TypeScript"),
                (r"\bjavascript\b|\bnode\.?js\b", "JavaScript"),
                (r"\bjava\b", "Java"),
                (r"\bc#|\bcsharp\b", "C#"),
                (r"\bgolang\b|\bgo\b", "Go"),
                (r"\bc\+\+|\bcpp\b", "C++"),
                (r"\bruby\b", "Ruby"),
            ];

            Self {
                patterns: raw
                    .iter()
                    .map(|(pattern, name)| {
                        (Regex::new(pattern).expect("Invalid regex pattern"), *name)
                    })
                    .collect(),
            }
        }

        pub fn detect(&self, text: &str) -> Option<String> {
            let text_lower = text.to_lowercase();

            self.patterns
                .iter()
                .find(|(re, _)| re.is_match(&text_lower))
                .map(|(_, name)| name.to_string())
        }
    }

    impl Default for LanguageMatcher {
        fn default() -> Self {
            Self::new()
        }
    }

    /// Map a code fence tag (`py`, `python3`, `rs`) to a language name
    pub fn from_fence_tag(tag: &str) -> Option<String> {
        let name = match tag.to_lowercase().as_str() {
            "py" | "python" | "python3" => "Python",
            "rs" | "rust" => "Rust",
            "js" | "javascript" => "JavaScript",
            "ts" | "typescript" => "TypeScript",
            "go" | "golang" => "Go",
            "java" => "Java",
            "rb" | "ruby" => "Ruby",
            "cpp" | "c++" => "C++",
            _ => return None,
        };
        Some(name.to_string())
    }
}
