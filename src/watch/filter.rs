//! Event filtering and change-kind resolution.

use std::path::Path;

use regex::Regex;

/// What happened to a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Changed,
    Removed,
}

impl ChangeKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Changed => "changed",
            Self::Removed => "removed",
        }
    }
}

/// Resolve the change kind for a debounced path by checking current
/// existence. Notify backends report ambiguous rename/metadata events; the
/// filesystem is the authority by the time the quiet period has elapsed.
pub fn resolve_kind(path: &Path, was_known: bool) -> ChangeKind {
    if !path.exists() {
        ChangeKind::Removed
    } else if was_known {
        ChangeKind::Changed
    } else {
        ChangeKind::Added
    }
}

/// Ignore-pattern list (glob-style) plus an extension allow-list.
pub struct EventFilter {
    ignore: Vec<Regex>,
    /// Empty list allows every extension.
    extensions: Vec<String>,
}

impl EventFilter {
    pub fn new(ignore_globs: &[String], extensions: &[String]) -> Self {
        let ignore = ignore_globs
            .iter()
            .filter_map(|glob| Regex::new(&glob_to_regex(glob)).ok())
            .collect();
        Self {
            ignore,
            extensions: extensions.to_vec(),
        }
    }

    /// Whether an event for `path` should enter the debouncer.
    pub fn accepts(&self, path: &Path) -> bool {
        if is_temp_file(path) {
            return false;
        }

        let text = path.to_string_lossy();
        if self.ignore.iter().any(|re| re.is_match(&text)) {
            return false;
        }

        if self.extensions.is_empty() {
            return true;
        }
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|allowed| allowed == ext))
    }
}

/// Translate a glob pattern to an anchored regex. Supports `*` (within a
/// segment), `**` (across segments) and `?`.
fn glob_to_regex(glob: &str) -> String {
    let mut re = String::with_capacity(glob.len() * 2);
    re.push('^');
    let mut chars = glob.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' => {
                if chars.peek() == Some(&'*') {
                    chars.next();
                    // Swallow a following slash so `**/` also matches zero dirs
                    if chars.peek() == Some(&'/') {
                        chars.next();
                        re.push_str("(?:.*/)?");
                    } else {
                        re.push_str(".*");
                    }
                } else {
                    re.push_str("[^/]*");
                }
            }
            '?' => re.push_str("[^/]"),
            c => {
                if regex_syntax_char(c) {
                    re.push('\\');
                }
                re.push(c);
            }
        }
    }
    re.push('$');
    re
}

fn regex_syntax_char(c: char) -> bool {
    matches!(
        c,
        '.' | '+' | '(' | ')' | '[' | ']' | '{' | '}' | '^' | '$' | '|' | '\\'
    )
}

/// Editor temp/backup artifacts that never count as content changes.
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}
