use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

// Include default patterns at compile time
const DEFAULT_PATTERNS_BYTES: &[u8] = include_bytes!("../default_editor_patterns.txt");

pub const DEFAULT_PATTERN_FILE: &str = "editor_patterns.txt";

const SEPARATOR: &str = "=>";

/// One `created_by LIKE pattern` -> editor label rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditorPattern {
    pub pattern: String,
    pub label: String,
}

impl EditorPattern {
    pub fn new(pattern: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            label: label.into(),
        }
    }
}

fn parse_line(line: &str) -> Option<Result<EditorPattern, String>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let Some((pattern, label)) = line.split_once(SEPARATOR) else {
        return Some(Err(format!("expected `pattern {SEPARATOR} label`, got {line:?}")));
    };
    let (pattern, label) = (pattern.trim(), label.trim());
    if pattern.is_empty() || label.is_empty() {
        return Some(Err(format!("empty pattern or label in {line:?}")));
    }
    Some(Ok(EditorPattern::new(pattern, label)))
}

/// Parses a pattern file, failing on the first malformed line.
pub fn parse_patterns(content: &str) -> Result<Vec<EditorPattern>> {
    let mut patterns = Vec::new();
    for (line_num, line) in content.lines().enumerate() {
        match parse_line(line) {
            Some(Ok(pattern)) => patterns.push(pattern),
            Some(Err(e)) => anyhow::bail!("Invalid editor pattern at line {}: {}", line_num + 1, e),
            None => {}
        }
    }
    Ok(patterns)
}

fn parse_patterns_lenient(content: &str, component: &str) -> Vec<EditorPattern> {
    let mut patterns = Vec::new();
    for (line_num, line) in content.lines().enumerate() {
        match parse_line(line) {
            Some(Ok(pattern)) => patterns.push(pattern),
            Some(Err(e)) => {
                warn!(action = "parse", component = component, line_number = line_num + 1, error = %e, "Invalid editor pattern")
            }
            None => {}
        }
    }
    patterns
}

pub fn default_patterns() -> Result<Vec<EditorPattern>> {
    let default_content = std::str::from_utf8(DEFAULT_PATTERNS_BYTES)
        .context("Failed to decode embedded default patterns")?;
    parse_patterns(default_content)
}

/// Resolves the ordered editor pattern list: an explicit file, else `editor_patterns.txt` in the
/// working directory, else the embedded defaults.
pub fn load_editor_patterns(pattern_file_path: Option<&Path>) -> Result<Vec<EditorPattern>> {
    let start_time = Instant::now();
    info!(
        action = "start",
        component = "pattern_loading",
        "Starting editor pattern loading"
    );

    let mut patterns = Vec::new();

    if let Some(path) = pattern_file_path {
        info!(action = "load", component = "pattern_file", file_path = ?path, "Loading patterns from specified file");
        if !path.exists() {
            anyhow::bail!("Pattern file not found: {:?}", path);
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read pattern file {:?}", path))?;
        patterns = parse_patterns(&content)?;
        if patterns.is_empty() {
            anyhow::bail!("Pattern file {:?} contains no patterns", path);
        }
        info!(action = "loaded", component = "pattern_file", pattern_count = patterns.len(), file_path = ?path, "Loaded patterns from file");
    } else {
        let default_file = Path::new(DEFAULT_PATTERN_FILE);
        if default_file.exists() {
            info!(action = "load", component = "default_pattern_file", file_path = ?default_file, "Loading patterns from default file");
            let content = fs::read_to_string(default_file)?;
            patterns = parse_patterns_lenient(&content, "default_pattern_file");
            info!(action = "loaded", component = "default_pattern_file", pattern_count = patterns.len(), file_path = ?default_file, "Loaded patterns from default file");
        }

        if patterns.is_empty() {
            info!(
                action = "load",
                component = "embedded_patterns",
                "Using embedded default patterns"
            );
            patterns = default_patterns()?;
        }
    }

    info!(
        action = "complete",
        component = "pattern_loading",
        pattern_count = patterns.len(),
        duration_ms = start_time.elapsed().as_millis(),
        "Editor patterns ready"
    );
    Ok(patterns)
}

pub fn init_default_patterns() -> Result<()> {
    let default_file = Path::new(DEFAULT_PATTERN_FILE);

    if default_file.exists() {
        anyhow::bail!(
            "{} already exists. Remove it first if you want to reinitialize.",
            DEFAULT_PATTERN_FILE
        );
    }

    let default_content = std::str::from_utf8(DEFAULT_PATTERNS_BYTES)
        .context("Failed to decode embedded default patterns")?;

    fs::write(default_file, default_content)?;
    println!("Created {} with default patterns", DEFAULT_PATTERN_FILE);

    Ok(())
}
