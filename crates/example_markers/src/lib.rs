// crates/example_markers/src/lib.rs

//! Marker strings shared by the extractor, parser, matcher and sessions.

/// Unnamed wildcard inside an expected output block.
pub const WILDCARD_TAG: &str = "<...>";

/// Introduces inline options inside a statement line,
/// e.g. `>>> slow()  # byexample: +timeout=10`.
pub const OPTIONS_TAG: &str = "byexample:";

/// Prefix of the token a session echoes once an example's output is complete.
/// The full token also carries the process id and a running counter.
pub const SENTINEL_PREFIX: &str = "__run_examples_done";

/// Comment closers that may trail an options string on the same line.
pub const OPTION_TRAILERS: &[&str] = &["*/", "-->"];
