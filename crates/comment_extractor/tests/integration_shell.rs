// crates/comment_extractor/tests/integration_shell.rs

#[cfg(test)]
mod integration_shell {
    use comment_extractor::{extract, rules};

    /// Consecutive `#` lines form one block, code lines split runs.
    #[test]
    fn test_shell_comment_runs() {
        let source = concat!(
            "#!/bin/sh\n",
            "\n",
            "# $ echo hi\n",
            "# hi\n",
            "echo done\n",
            "  # $ true\n",
        );
        let rule = rules::for_extension("sh").unwrap();
        let out = extract(source, &rule);
        assert_eq!(out.blocks.len(), 3);
        assert_eq!(out.blocks[0].line, 1);
        assert_eq!(out.blocks[1].line, 3);
        assert_eq!(out.blocks[1].text, "  $ echo hi\n  hi");
        assert_eq!(out.blocks[2].line, 6);
        assert_eq!(out.blocks[2].text, "  $ true");
    }

    #[test]
    fn test_ruby_begin_end_block() {
        let source = "=begin\n >> 2 + 2\n => 4\n=end\nputs 1\n";
        let rule = rules::for_extension("rb").unwrap();
        let out = extract(source, &rule);
        assert_eq!(out.blocks.len(), 1);
        assert_eq!(out.blocks[0].text, "\n >> 2 + 2\n => 4\n");
    }
}
