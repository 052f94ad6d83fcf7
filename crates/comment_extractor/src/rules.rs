// crates/comment_extractor/src/rules.rs

//! Built-in comment rules, keyed by file extension.

use std::path::Path;

use crate::{BlockSyntax, CommentRule};

/// `/* ... */` blocks with `//` line comments (C, C++, Java, JS, Go, PHP).
/// A block must open its line, so `"src/*.c"` in code is not a comment.
/// Line comments are not searched.
pub fn c_style() -> CommentRule {
    CommentRule {
        name: "/* ... */".to_string(),
        blocks: vec![BlockSyntax::new("/*", "*/").at_line_start()],
        line_prefix: Some("//".to_string()),
        line_comments_searchable: false,
        strip_decoration: true,
        whole_file: false,
    }
}

/// Triple-quoted strings; `#` comments are not searched.
pub fn python() -> CommentRule {
    CommentRule {
        name: "''' ... ''' or \"\"\" ... \"\"\"".to_string(),
        blocks: vec![BlockSyntax::new("\"\"\"", "\"\"\""), BlockSyntax::new("'''", "'''")],
        line_prefix: Some("#".to_string()),
        line_comments_searchable: false,
        strip_decoration: false,
        whole_file: false,
    }
}

/// Runs of `#` comments are searched (shell, PowerShell).
pub fn hash(name: &str) -> CommentRule {
    CommentRule {
        name: name.to_string(),
        blocks: Vec::new(),
        line_prefix: Some("#".to_string()),
        line_comments_searchable: true,
        strip_decoration: false,
        whole_file: false,
    }
}

/// `#` comment runs plus `=begin`/`=end` documentation blocks.
pub fn ruby() -> CommentRule {
    CommentRule {
        blocks: vec![BlockSyntax::new("=begin", "=end")],
        ..hash("# ... or =begin ... =end")
    }
}

/// Fenced code and HTML comments.
pub fn markdown() -> CommentRule {
    CommentRule {
        name: "``` ... ``` or <!-- ... -->".to_string(),
        blocks: vec![BlockSyntax::new("```", "```"), BlockSyntax::new("<!--", "-->")],
        line_prefix: None,
        line_comments_searchable: false,
        strip_decoration: false,
        whole_file: false,
    }
}

/// Returns the rule for a file extension (without the dot). Extensions are
/// matched case-insensitively.
pub fn for_extension(ext: &str) -> Option<CommentRule> {
    match ext.to_lowercase().as_str() {
        "c" | "h" | "cc" | "cpp" | "cxx" | "hpp" | "hh" | "js" | "mjs" | "cjs" | "java"
        | "go" | "php" => Some(c_style()),
        "py" => Some(python()),
        "rb" => Some(ruby()),
        "sh" | "bash" | "ps1" => Some(hash("# ...")),
        "md" | "markdown" => Some(markdown()),
        "txt" | "rst" => Some(CommentRule::whole_file("no delimiter")),
        _ => None,
    }
}

/// Same as [`for_extension`], using the extension of `path`.
pub fn for_path(path: &Path) -> Option<CommentRule> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(for_extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_extension_is_case_insensitive() {
        assert_eq!(for_extension("CPP"), Some(c_style()));
        assert_eq!(for_extension("Py"), Some(python()));
    }

    #[test]
    fn test_unknown_extension() {
        assert!(for_extension("xyz").is_none());
        assert!(for_path(Path::new("Makefile")).is_none());
    }

    #[test]
    fn test_ruby_searches_hash_comments() {
        let rule = for_path(Path::new("lib/foo.rb")).unwrap();
        assert!(rule.line_comments_searchable);
        assert_eq!(rule.blocks, vec![BlockSyntax::new("=begin", "=end")]);
    }

    #[test]
    fn test_plain_text_is_whole_file() {
        assert!(for_extension("rst").unwrap().whole_file);
    }
}
