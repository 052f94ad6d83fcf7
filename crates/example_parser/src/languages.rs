// crates/example_parser/src/languages.rs

//! Prompt conventions, one entry per language tag.

use thiserror::Error;

/// Primary and continuation prompt of one language.
///
/// Markers include their trailing space: `">>> "`, `"... "`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRule {
    pub language: String,
    pub primary: String,
    pub continuation: String,
}

impl PromptRule {
    pub fn new(
        language: impl Into<String>,
        primary: impl Into<String>,
        continuation: impl Into<String>,
    ) -> Self {
        Self {
            language: language.into(),
            primary: primary.into(),
            continuation: continuation.into(),
        }
    }

    /// Strips the continuation marker from an (unindented) line. A bare
    /// marker without its trailing space counts as an empty line.
    pub(crate) fn strip_continuation<'l>(&self, trimmed: &'l str) -> Option<&'l str> {
        if let Some(rest) = trimmed.strip_prefix(self.continuation.as_str()) {
            return Some(rest);
        }
        let bare = self.continuation.trim_end();
        if !bare.is_empty() && trimmed.trim_end() == bare {
            return Some("");
        }
        None
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RulesError {
    #[error("languages `{first}` and `{second}` share the prompt `{marker}`")]
    AmbiguousMarker {
        first: String,
        second: String,
        marker: String,
    },
    #[error("language `{0}` has an empty prompt marker")]
    EmptyMarker(String),
    #[error("language `{0}` is configured twice")]
    DuplicateLanguage(String),
    #[error("unknown language `{0}`")]
    UnknownLanguage(String),
}

/// The prompt table used by the parser.
///
/// Lookup is by longest primary prefix, so `>>> ` wins over `>> ` for
/// `>>> x` even though both are configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageRules {
    // sorted by primary marker length, longest first
    rules: Vec<PromptRule>,
}

impl LanguageRules {
    /// Validates and builds a prompt table.
    pub fn new(rules: Vec<PromptRule>) -> Result<Self, RulesError> {
        for (i, rule) in rules.iter().enumerate() {
            if rule.primary.trim().is_empty() || rule.continuation.trim().is_empty() {
                return Err(RulesError::EmptyMarker(rule.language.clone()));
            }
            for other in &rules[..i] {
                if other.language == rule.language {
                    return Err(RulesError::DuplicateLanguage(rule.language.clone()));
                }
                if other.primary == rule.primary {
                    return Err(RulesError::AmbiguousMarker {
                        first: other.language.clone(),
                        second: rule.language.clone(),
                        marker: rule.primary.clone(),
                    });
                }
            }
        }
        Ok(Self::sorted(rules))
    }

    /// Python, Ruby, shell and C++ (cling) conventions.
    pub fn builtin() -> Self {
        Self::sorted(vec![
            PromptRule::new("python", ">>> ", "... "),
            PromptRule::new("ruby", ">> ", "?> "),
            PromptRule::new("shell", "$ ", "> "),
            PromptRule::new("cpp", "?: ", ":: "),
        ])
    }

    fn sorted(mut rules: Vec<PromptRule>) -> Self {
        // stable: equal lengths keep their configured order
        rules.sort_by(|a, b| b.primary.len().cmp(&a.primary.len()));
        Self { rules }
    }

    /// Restricts the table to `languages`, failing on unknown tags.
    pub fn select<S: AsRef<str>>(&self, languages: &[S]) -> Result<Self, RulesError> {
        let mut selected = Vec::with_capacity(languages.len());
        for language in languages {
            let language: &str = language.as_ref();
            let rule = self
                .get(language)
                .ok_or_else(|| RulesError::UnknownLanguage(language.to_string()))?;
            if !selected.contains(rule) {
                selected.push(rule.clone());
            }
        }
        Ok(Self::sorted(selected))
    }

    pub fn get(&self, language: &str) -> Option<&PromptRule> {
        self.rules.iter().find(|r| r.language == language)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PromptRule> {
        self.rules.iter()
    }

    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.language.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// If `line` opens an example returns its rule, its indentation and the
    /// statement text after the marker.
    pub fn match_primary<'l>(&self, line: &'l str) -> Option<(&PromptRule, &'l str, &'l str)> {
        let trimmed = line.trim_start();
        let indent = &line[..line.len() - trimmed.len()];
        self.rules
            .iter()
            .find(|r| trimmed.starts_with(r.primary.as_str()))
            .map(|r| (r, indent, &trimmed[r.primary.len()..]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_longest_prefix_wins() {
        let rules = LanguageRules::new(vec![
            PromptRule::new("short", "> ", ". "),
            PromptRule::new("long", ">> ", ".. "),
        ])
        .unwrap();
        let (rule, indent, rest) = rules.match_primary("  >> x").unwrap();
        assert_eq!(rule.language, "long");
        assert_eq!(indent, "  ");
        assert_eq!(rest, "x");

        let (rule, _, rest) = rules.match_primary("> y").unwrap();
        assert_eq!(rule.language, "short");
        assert_eq!(rest, "y");
    }

    #[test]
    fn test_ambiguous_marker_rejected() {
        let err = LanguageRules::new(vec![
            PromptRule::new("a", "$ ", "> "),
            PromptRule::new("b", "$ ", ". "),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            RulesError::AmbiguousMarker {
                first: "a".into(),
                second: "b".into(),
                marker: "$ ".into()
            }
        );
    }

    #[test]
    fn test_empty_and_duplicate_rejected() {
        assert_eq!(
            LanguageRules::new(vec![PromptRule::new("a", " ", "> ")]).unwrap_err(),
            RulesError::EmptyMarker("a".into())
        );
        assert_eq!(
            LanguageRules::new(vec![
                PromptRule::new("a", "$ ", "> "),
                PromptRule::new("a", "% ", "> "),
            ])
            .unwrap_err(),
            RulesError::DuplicateLanguage("a".into())
        );
    }

    #[test]
    fn test_select_restricts_table() {
        let rules = LanguageRules::builtin().select(&["python", "cpp"]).unwrap();
        assert_eq!(rules.languages().collect::<Vec<_>>(), vec!["python", "cpp"]);
        assert!(rules.match_primary("$ ls").is_none());
        assert_eq!(
            LanguageRules::builtin().select(&["cobol"]).unwrap_err(),
            RulesError::UnknownLanguage("cobol".into())
        );
    }

    #[test]
    fn test_python_is_not_taken_for_ruby() {
        let rules = LanguageRules::builtin();
        let (rule, _, rest) = rules.match_primary(">>> 1 + 2").unwrap();
        assert_eq!(rule.language, "python");
        assert_eq!(rest, "1 + 2");
        let (rule, _, _) = rules.match_primary(">> 2 + 2").unwrap();
        assert_eq!(rule.language, "ruby");
    }

    #[test]
    fn test_bare_continuation() {
        let rule = PromptRule::new("python", ">>> ", "... ");
        assert_eq!(rule.strip_continuation("...   x"), Some("  x"));
        assert_eq!(rule.strip_continuation("..."), Some(""));
        assert_eq!(rule.strip_continuation("....x"), None);
    }
}
