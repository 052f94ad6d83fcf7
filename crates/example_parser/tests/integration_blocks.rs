// crates/example_parser/tests/integration_blocks.rs

#[cfg(test)]
mod integration_blocks {
    use comment_extractor::{extract, rules};
    use example_parser::{parse, LanguageRules, ParseError};

    const CPP_SOURCE: &str = concat!(
        "/*\n",
        " * ?: void hello() {\n",
        " * ::     std::cout << \"hello!\\n\";\n",
        " * :: }\n",
        " *\n",
        " * ?: hello();\n",
        " * hello!\n",
        " */\n",
        "void hello();\n",
    );

    #[test]
    fn test_cpp_definition_and_call() {
        let extraction = extract(CPP_SOURCE, &rules::c_style());
        assert_eq!(extraction.blocks.len(), 1);
        let block = &extraction.blocks[0];

        let rules = LanguageRules::builtin();
        let found: Vec<_> = parse(&block.text, block.line, &rules)
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].language, "cpp");
        assert_eq!(
            found[0].statements,
            vec!["void hello() {", "    std::cout << \"hello!\\n\";", "}"]
        );
        assert!(found[0].expected.is_empty());
        assert_eq!(found[0].line, 2);

        assert_eq!(found[1].source(), "hello();");
        assert_eq!(found[1].expected, vec!["hello!"]);
        assert_eq!(found[1].line, 6);
    }

    #[test]
    fn test_mixed_languages_in_markdown() {
        let source = concat!(
            "# Title\n",
            "\n",
            "```\n",
            "$ echo hi\n",
            "hi\n",
            "\n",
            ">> [1, 2].size\n",
            "=> 2\n",
            "```\n",
            "\n",
            "<!--\n",
            ">>> 1 +\n",
            "-->\n",
        );
        let extraction = extract(source, &rules::markdown());
        assert_eq!(extraction.blocks.len(), 2);

        let rules = LanguageRules::builtin();
        let mut all = Vec::new();
        for block in &extraction.blocks {
            all.extend(parse(&block.text, block.line, &rules));
        }
        let found: Vec<_> = all.into_iter().collect::<Result<Vec<_>, _>>().unwrap();
        let summary: Vec<_> = found
            .iter()
            .map(|e| (e.language.as_str(), e.line, e.expected.clone()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("shell", 4, vec!["hi".to_string()]),
                ("ruby", 7, vec!["=> 2".to_string()]),
                ("python", 12, vec![]),
            ]
        );
    }

    #[test]
    fn test_malformed_example_does_not_hide_the_rest() {
        let text = "$ ls # byexample: +nope\nfile\n\n$ echo ok\nok\n";
        let rules = LanguageRules::builtin();
        let results: Vec<_> = parse(text, 1, &rules).collect();
        assert_eq!(results.len(), 2);
        assert!(matches!(
            &results[0],
            Err(ParseError::InvalidOption { line: 1, option }) if option == "+nope"
        ));
        assert_eq!(results[1].as_ref().unwrap().line, 4);
    }

    #[test]
    fn test_early_termination() {
        let mut text = String::new();
        for i in 0..1000 {
            text.push_str(&format!(">>> {i}\n{i}\n"));
        }
        let rules = LanguageRules::builtin();
        let first_two: Vec<_> = parse(&text, 1, &rules).take(2).map(|r| r.unwrap()).collect();
        assert_eq!(first_two[1].statements, vec!["1"]);
        assert_eq!(first_two[1].line, 3);
    }

    #[test]
    fn test_selected_languages_ignore_other_prompts() {
        let rules = LanguageRules::builtin().select(&["python"]).unwrap();
        let found: Vec<_> = parse("$ echo no\n>>> 'yes'\n'yes'\n", 1, &rules)
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].language, "python");
    }
}
