//! Markdown corpus loading.
//!
//! [`DocumentLoader`] walks a directory, selects files whose relative path
//! matches a glob, and turns each one into a [`Document`] whose text is the
//! Markdown reduced to plain text by [`markdown_to_text`].

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use glob::{MatchOptions, Pattern};
use regex::Regex;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::RagConfig;
use crate::document::Document;
use crate::error::{RagError, Result};

/// `*` and `?` never cross a `/`; only `**` spans directories.
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Loads Markdown files from a directory.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::DocumentLoader;
///
/// let docs = DocumentLoader::new("./docs", "*.md")?.load()?;
/// ```
#[derive(Debug, Clone)]
pub struct DocumentLoader {
    base_path: PathBuf,
    pattern: Pattern,
}

impl DocumentLoader {
    /// Create a loader for `base_path` selecting files that match `glob`.
    ///
    /// The glob is matched against the `/`-separated path relative to
    /// `base_path`, so `*.md` selects top-level files only while `**/*.md`
    /// and `docs/**/*.md` descend into subdirectories. Character classes
    /// such as `[ab].md` are supported.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if the glob is empty or malformed.
    pub fn new(base_path: impl Into<PathBuf>, glob: &str) -> Result<Self> {
        let glob = glob.trim();
        if glob.is_empty() {
            return Err(RagError::ConfigError("glob must not be empty".to_string()));
        }
        let pattern = Pattern::new(glob)
            .map_err(|e| RagError::ConfigError(format!("invalid glob '{glob}': {e}")))?;
        Ok(Self { base_path: base_path.into(), pattern })
    }

    /// Create a loader from the pipeline configuration.
    pub fn from_config(config: &RagConfig) -> Result<Self> {
        Self::new(&config.base_path, &config.glob)
    }

    /// The corpus directory.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Load every matching file, sorted by path.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::IoError`] if the corpus directory is missing, is
    /// not a directory, or cannot be listed. Matching files that cannot be
    /// read as UTF-8 text are skipped with a warning.
    pub fn load(&self) -> Result<Vec<Document>> {
        let metadata = std::fs::metadata(&self.base_path)
            .map_err(|e| RagError::io(&self.base_path, e))?;
        if !metadata.is_dir() {
            return Err(RagError::io(
                &self.base_path,
                std::io::Error::new(std::io::ErrorKind::NotADirectory, "corpus path is not a directory"),
            ));
        }
        std::fs::read_dir(&self.base_path).map_err(|e| RagError::io(&self.base_path, e))?;

        let mut walker = WalkDir::new(&self.base_path).min_depth(1).sort_by_file_name();
        let glob = self.pattern.as_str();
        if !glob.contains("**") {
            walker = walker.max_depth(glob.split('/').count());
        }

        let mut documents = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "skipping unreadable corpus entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&self.base_path) else {
                continue;
            };
            let relative = relative_key(relative);
            if !self.pattern.matches_with(&relative, MATCH_OPTIONS) {
                continue;
            }

            let raw = match std::fs::read_to_string(entry.path()) {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(path = %entry.path().display(), error = %e, "skipping unreadable document");
                    continue;
                }
            };
            let text = markdown_to_text(&raw);
            debug!(path = %entry.path().display(), chars = text.chars().count(), "loaded document");
            documents.push(Document::new(relative, text, entry.path().display().to_string()));
        }

        documents.sort_by(|a, b| a.id.cmp(&b.id));
        info!(base_path = %self.base_path.display(), document_count = documents.len(), "loaded corpus");
        Ok(documents)
    }
}

fn relative_key(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

static IMAGE_OR_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!?\[([^\]]*)\]\([^)]*\)").expect("valid regex"));
static REFERENCE_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\[[^\]]*\]").expect("valid regex"));
static INLINE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`+([^`]+)`+").expect("valid regex"));
static STRONG_STARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("valid regex"));
static STRONG_UNDERSCORES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b__(.+?)__\b").expect("valid regex"));
static EMPHASIS_STAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*([^*\s][^*]*?)\*").expect("valid regex"));
static EMPHASIS_UNDERSCORE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b_([^_\s][^_]*?)_\b").expect("valid regex"));
static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<!--.*?-->|</?[A-Za-z][^>\n]*>").expect("valid regex"));
static LIST_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:[-*+]|\d+[.)])\s+").expect("valid regex"));
static HORIZONTAL_RULE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:(?:-\s*){3,}|(?:\*\s*){3,}|(?:_\s*){3,}|=+\s*)$").expect("valid regex"));
static TABLE_DIVIDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\|?\s*:?-+:?\s*(?:\|\s*:?-+:?\s*)+\|?\s*$").expect("valid regex"));

/// Reduce Markdown to plain text.
///
/// Block structure survives as blank-line separated paragraphs; markup
/// characters are removed. Fenced code keeps its body verbatim. A leading
/// YAML frontmatter block is dropped.
pub fn markdown_to_text(markdown: &str) -> String {
    let normalized = markdown.replace("\r\n", "\n");
    let body = strip_frontmatter(&normalized);

    let mut lines: Vec<String> = Vec::new();
    let mut in_fence = false;

    for line in body.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            lines.push(line.trim_end().to_string());
            continue;
        }
        if HORIZONTAL_RULE.is_match(line) || TABLE_DIVIDER.is_match(line) {
            lines.push(String::new());
            continue;
        }

        let mut text = trimmed.to_string();
        while let Some(rest) = text.strip_prefix('>') {
            text = rest.trim_start().to_string();
        }
        if text.starts_with('#') {
            text = text.trim_start_matches('#').trim_end_matches('#').trim().to_string();
        }
        text = LIST_MARKER.replace(&text, "").into_owned();
        if text.starts_with('|') {
            text = text
                .trim_matches('|')
                .split('|')
                .map(str::trim)
                .collect::<Vec<_>>()
                .join(" ");
        }

        lines.push(strip_inline(&text).trim_end().to_string());
    }

    collapse_blank_lines(&lines)
}

fn strip_frontmatter(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("---\n") else {
        return text;
    };
    match rest.find("\n---") {
        Some(end) => {
            let after = &rest[end + 4..];
            after.strip_prefix('\n').unwrap_or(after)
        }
        None => text,
    }
}

fn strip_inline(text: &str) -> String {
    let text = IMAGE_OR_LINK.replace_all(text, "$1");
    let text = REFERENCE_LINK.replace_all(&text, "$1");
    let text = INLINE_CODE.replace_all(&text, "$1");
    let text = HTML_TAG.replace_all(&text, "");
    let text = STRONG_STARS.replace_all(&text, "$1");
    let text = STRONG_UNDERSCORES.replace_all(&text, "$1");
    let text = EMPHASIS_STAR.replace_all(&text, "$1");
    EMPHASIS_UNDERSCORE.replace_all(&text, "$1").into_owned()
}

fn collapse_blank_lines(lines: &[String]) -> String {
    let mut out = String::new();
    let mut blank_run = false;
    for line in lines {
        if line.trim().is_empty() {
            blank_run = !out.is_empty();
            continue;
        }
        if blank_run {
            out.push_str("\n\n");
        } else if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(line);
        blank_run = false;
    }
    out
}
