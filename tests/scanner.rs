#[cfg(test)]
mod scanner_tests {
    use pretty_assertions::assert_eq;

    use rox::scanner::*;
    use rox::token::*;

    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let scanner = Scanner::new(source);
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        assert_eq!(tokens.len(), expected.len());

        for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
            assert_eq!(actual.token_type, *expected_type);
            assert_eq!(actual.lexeme, *expected_lexeme);
        }
    }

    #[test]
    fn test_scanner_01_symbols() {
        assert_token_sequence(
            "({*.,+*})",
            &[
                (TokenType::LEFT_PAREN, "("),
                (TokenType::LEFT_BRACE, "{"),
                (TokenType::STAR, "*"),
                (TokenType::DOT, "."),
                (TokenType::COMMA, ","),
                (TokenType::PLUS, "+"),
                (TokenType::STAR, "*"),
                (TokenType::RIGHT_BRACE, "}"),
                (TokenType::RIGHT_PAREN, ")"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_02_extended_operators() {
        assert_token_sequence(
            "a ** b << 2 >> 1 ... [x] => ?:",
            &[
                (TokenType::IDENTIFIER, "a"),
                (TokenType::STAR_STAR, "**"),
                (TokenType::IDENTIFIER, "b"),
                (TokenType::LESS_LESS, "<<"),
                (TokenType::INTEGER(2), "2"),
                (TokenType::GREATER_GREATER, ">>"),
                (TokenType::INTEGER(1), "1"),
                (TokenType::ELLIPSIS, "..."),
                (TokenType::LEFT_BRACKET, "["),
                (TokenType::IDENTIFIER, "x"),
                (TokenType::RIGHT_BRACKET, "]"),
                (TokenType::ARROW, "=>"),
                (TokenType::QUESTION, "?"),
                (TokenType::COLON, ":"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_03_keywords() {
        assert_token_sequence(
            "foreach in try catch finally throw static enum import",
            &[
                (TokenType::FOREACH, "foreach"),
                (TokenType::IN, "in"),
                (TokenType::TRY, "try"),
                (TokenType::CATCH, "catch"),
                (TokenType::FINALLY, "finally"),
                (TokenType::THROW, "throw"),
                (TokenType::STATIC, "static"),
                (TokenType::ENUM, "enum"),
                (TokenType::IMPORT, "import"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_numbers_and_bignums() {
        let (tokens, errors) = scan_all("12 3.5 42n 99999999999999999999");

        assert!(errors.is_empty());

        let lines: Vec<String> = tokens.iter().map(ToString::to_string).collect();

        assert_eq!(
            lines,
            vec![
                "INTEGER 12 12",
                "FLOAT 3.5 3.5",
                "BIGNUM 42n 42",
                "BIGNUM 99999999999999999999 99999999999999999999",
                "EOF  null",
            ]
        );
    }

    #[test]
    fn test_string_quotes() {
        let (tokens, errors) = scan_all(r#""a\tb" 'a\tb'"#);

        assert!(errors.is_empty());
        assert_eq!(tokens[0].token_type, TokenType::STRING("a\tb".into()));
        assert_eq!(tokens[0].quote, Some('"'));

        match &tokens[1].token_type {
            TokenType::STRING(s) => assert_eq!(s, "a\\tb"),
            other => panic!("expected a string, got {:?}", other),
        }
        assert_eq!(tokens[1].quote, Some('\''));
    }

    #[test]
    fn test_unexpected_chars_token_sequence() {
        let source = ",.$(#";
        let scanner = Scanner::new(source);

        // Collect all results (both tokens and errors)
        let results: Vec<_> = scanner.collect();

        // 0: COMMA ','
        // 1: DOT '.'
        // 2: Error for '$'
        // 3: LEFT_PAREN '('
        // 4: Error for '#'
        // 5: EOF
        assert_eq!(results.len(), 6, "Expected 6 items in result");

        assert_token_matches(&results[0], TokenType::COMMA, ",");
        assert_token_matches(&results[1], TokenType::DOT, ".");
        assert_token_matches(&results[3], TokenType::LEFT_PAREN, "(");
        assert_token_matches(&results[5], TokenType::EOF, "");

        let errors: Vec<String> = results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .map(ToString::to_string)
            .collect();

        assert_eq!(
            errors,
            vec![
                "[line 1] Error: Unexpected character: $",
                "[line 1] Error: Unexpected character: #",
            ]
        );

        fn assert_token_matches(
            result: &rox::error::Result<Token>,
            expected_type: TokenType,
            expected_lexeme: &str,
        ) {
            match result {
                Ok(token) => {
                    assert_eq!(
                        token.token_type, expected_type,
                        "Expected token type {:?}, got {:?}",
                        expected_type, token.token_type
                    );
                    assert_eq!(
                        token.lexeme, expected_lexeme,
                        "Expected lexeme '{}', got '{}'",
                        expected_lexeme, token.lexeme
                    );
                }
                Err(e) => panic!("Expected token but got error: {}", e),
            }
        }
    }

    #[test]
    fn test_unterminated_string_reports_line() {
        let (_, errors) = scan_all("\n\"abc");

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].to_string(), "[line 2] Error: Unterminated string.");
    }

    #[test]
    fn test_tokens_serialize_to_json() {
        let (tokens, _) = scan_all("x");
        let json = serde_json::to_value(&tokens[0]).unwrap();

        assert_eq!(json["lexeme"], "x");
        assert_eq!(json["line"], 1);
        assert!(json.get("quote").is_none());
    }
}
