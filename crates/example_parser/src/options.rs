// crates/example_parser/src/options.rs

//! Per-example flags written after `byexample:` on a statement line.
//!
//! ```text
//! >>> print("a   b")     # byexample: +norm-ws +timeout=5
//! ```

use std::time::Duration;

use example_markers::{OPTIONS_TAG, OPTION_TRAILERS};

/// Flags of a single example. `None` means "use the run-wide setting".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExampleOptions {
    pub skip: bool,
    pub pass: bool,
    /// Replace `<name>` tags in the statements and expected output with
    /// values captured by earlier examples.
    pub paste: bool,
    pub norm_ws: Option<bool>,
    pub tags: Option<bool>,
    pub span_lines: Option<bool>,
    pub timeout: Option<Duration>,
}

impl ExampleOptions {
    /// Collects the options of every statement line. On failure returns the
    /// offending token.
    pub fn from_statements<S: AsRef<str>>(statements: &[S]) -> Result<Self, String> {
        let mut options = Self::default();
        for statement in statements {
            let statement: &str = statement.as_ref();
            if let Some(at) = statement.find(OPTIONS_TAG) {
                options.apply(&statement[at + OPTIONS_TAG.len()..])?;
            }
        }
        Ok(options)
    }

    fn apply(&mut self, flags: &str) -> Result<(), String> {
        let mut flags = flags.trim_end();
        for trailer in OPTION_TRAILERS {
            if let Some(rest) = flags.strip_suffix(trailer) {
                flags = rest;
            }
        }
        for token in flags.split_whitespace() {
            self.apply_token(token).ok_or_else(|| token.to_string())?;
        }
        Ok(())
    }

    fn apply_token(&mut self, token: &str) -> Option<()> {
        if let Some(secs) = token.strip_prefix("+timeout=") {
            let secs: f64 = secs.parse().ok()?;
            if secs <= 0.0 {
                return None;
            }
            self.timeout = Some(Duration::try_from_secs_f64(secs).ok()?);
            return Some(());
        }
        let (enabled, name) = if let Some(name) = token.strip_prefix('+') {
            (true, name)
        } else {
            (false, token.strip_prefix('-')?)
        };
        match (name, enabled) {
            ("skip", true) => self.skip = true,
            ("pass", true) => self.pass = true,
            ("paste", true) => self.paste = true,
            ("norm-ws", _) => self.norm_ws = Some(enabled),
            ("tags", _) => self.tags = Some(enabled),
            ("span-lines", _) => self.span_lines = Some(enabled),
            _ => return None,
        }
        Some(())
    }

    /// Parses a bare run-wide flag string such as `"+norm-ws -tags"`.
    pub fn from_flags(flags: &str) -> Result<Self, String> {
        let mut options = Self::default();
        options.apply(flags)?;
        Ok(options)
    }

    /// Fills every unset field from `defaults`.
    pub fn with_defaults(&self, defaults: &ExampleOptions) -> ExampleOptions {
        ExampleOptions {
            skip: self.skip || defaults.skip,
            pass: self.pass || defaults.pass,
            paste: self.paste || defaults.paste,
            norm_ws: self.norm_ws.or(defaults.norm_ws),
            tags: self.tags.or(defaults.tags),
            span_lines: self.span_lines.or(defaults.span_lines),
            timeout: self.timeout.or(defaults.timeout),
        }
    }

    /// True when the example is sent to the interpreter.
    pub fn executes(&self) -> bool {
        !self.skip
    }

    /// True when the output is compared against the expectation.
    pub fn checks_output(&self) -> bool {
        !self.skip && !self.pass
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_options() {
        let options = ExampleOptions::from_statements(&["1 + 2"]).unwrap();
        assert_eq!(options, ExampleOptions::default());
        assert!(options.checks_output());
    }

    #[test]
    fn test_flags_across_lines() {
        let options = ExampleOptions::from_statements(&[
            "def f():  # byexample: +norm-ws -tags",
            "    return 1  # byexample: +timeout=0.5",
        ])
        .unwrap();
        assert_eq!(options.norm_ws, Some(true));
        assert_eq!(options.tags, Some(false));
        assert_eq!(options.span_lines, None);
        assert_eq!(options.timeout, Some(Duration::from_millis(500)));
    }

    #[test]
    fn test_comment_trailer_ignored() {
        let options =
            ExampleOptions::from_statements(&["foo();  /* byexample: +pass */"]).unwrap();
        assert!(options.pass);
        assert!(options.executes());
        assert!(!options.checks_output());
    }

    #[test]
    fn test_skip() {
        let options = ExampleOptions::from_statements(&["rm -rf /tmp/x # byexample: +skip"]).unwrap();
        assert!(!options.executes());
    }

    #[test]
    fn test_paste() {
        let options = ExampleOptions::from_statements(&["kill <pid>  # byexample: +paste"]).unwrap();
        assert!(options.paste);
        assert!(options.with_defaults(&ExampleOptions::default()).paste);
        assert!(ExampleOptions::from_flags("-paste").is_err());
    }

    #[test]
    fn test_example_flags_override_defaults() {
        let defaults = ExampleOptions::from_flags("+norm-ws +timeout=8").unwrap();
        let example = ExampleOptions::from_statements(&["x # byexample: -norm-ws"]).unwrap();
        let merged = example.with_defaults(&defaults);
        assert_eq!(merged.norm_ws, Some(false));
        assert_eq!(merged.timeout, Some(Duration::from_secs(8)));
        assert_eq!(merged.tags, None);
    }

    #[test]
    fn test_invalid_tokens() {
        for bad in [
            "+frobnicate",
            "skip",
            "+timeout=0",
            "+timeout=soon",
            "+timeout=1e300",
            "+timeout=inf",
            "-skip",
        ] {
            let statement = format!("x # byexample: {bad}");
            assert_eq!(
                ExampleOptions::from_statements(&[statement]).unwrap_err(),
                bad
            );
        }
    }
}
