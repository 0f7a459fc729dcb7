#[cfg(test)]
mod scanner_tests {
    use crate::error::ErrorKind;
    use crate::scanner::token::TokenKind;
    use crate::scanner::Scanner;

    /// Drain the scanner, asserting no errors along the way.
    fn scan_ok(input: &str) -> Vec<TokenKind> {
        let mut scanner = Scanner::new(input).expect("unexpected scan error");
        let mut kinds = Vec::new();
        loop {
            let kind = scanner.kind().clone();
            let done = kind == TokenKind::Eof;
            kinds.push(kind);
            if done {
                return kinds;
            }
            scanner.next_token().expect("unexpected scan error");
        }
    }

    /// Scan until the first error and return its kind.
    fn scan_error(input: &str) -> ErrorKind {
        let mut scanner = match Scanner::new(input) {
            Err(diag) => return diag.kind,
            Ok(scanner) => scanner,
        };
        loop {
            if scanner.kind() == &TokenKind::Eof {
                panic!("expected a scan error in {input:?}");
            }
            if let Err(diag) = scanner.next_token() {
                return diag.kind;
            }
        }
    }

    #[test]
    fn empty_input() {
        assert_eq!(scan_ok(""), vec![TokenKind::Eof]);
    }

    #[test]
    fn whitespace_and_comments_only() {
        assert_eq!(scan_ok("  \t\n# a comment\n   \n"), vec![TokenKind::Eof]);
    }

    #[test]
    fn all_reserved_words() {
        let kinds = scan_ok("and begin code do else end if int not or proc string then value while");
        assert_eq!(
            kinds,
            vec![
                TokenKind::And,
                TokenKind::Begin,
                TokenKind::Code,
                TokenKind::Do,
                TokenKind::Else,
                TokenKind::End,
                TokenKind::If,
                TokenKind::Int,
                TokenKind::Not,
                TokenKind::Or,
                TokenKind::Proc,
                TokenKind::StringKeyword,
                TokenKind::Then,
                TokenKind::Value,
                TokenKind::While,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn punctuation() {
        let kinds = scan_ok("[ ] ( ) , ; : := = < <= <> > >= + - * /");
        assert_eq!(
            kinds,
            vec![
                TokenKind::OpenBracket,
                TokenKind::CloseBracket,
                TokenKind::OpenParen,
                TokenKind::CloseParen,
                TokenKind::Comma,
                TokenKind::Semicolon,
                TokenKind::Colon,
                TokenKind::Assign,
                TokenKind::Equal,
                TokenKind::Less,
                TokenKind::LessEqual,
                TokenKind::NotEqual,
                TokenKind::Greater,
                TokenKind::GreaterEqual,
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::Star,
                TokenKind::Slash,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn compound_punctuation_without_spaces() {
        // `:=` must not scan as colon-equal, `<>` not as less-greater.
        let kinds = scan_ok("x:=1<>2<=3>=4");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Name("x".into()),
                TokenKind::Assign,
                TokenKind::IntConstant(1, "1".into()),
                TokenKind::NotEqual,
                TokenKind::IntConstant(2, "2".into()),
                TokenKind::LessEqual,
                TokenKind::IntConstant(3, "3".into()),
                TokenKind::GreaterEqual,
                TokenKind::IntConstant(4, "4".into()),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn names_with_digits() {
        let kinds = scan_ok("foo bar2 whileish");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Name("foo".into()),
                TokenKind::Name("bar2".into()),
                TokenKind::Name("whileish".into()),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn integer_constants() {
        assert_eq!(
            scan_ok("0 42 2147483647"),
            vec![
                TokenKind::IntConstant(0, "0".into()),
                TokenKind::IntConstant(42, "42".into()),
                TokenKind::IntConstant(2147483647, "2147483647".into()),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn integer_overflow_is_an_error() {
        assert_eq!(
            scan_error("2147483648"),
            ErrorKind::InvalidIntegerConstant
        );
    }

    #[test]
    fn string_constant() {
        assert_eq!(
            scan_ok("\"hello, world\""),
            vec![
                TokenKind::StringConstant("hello, world".into()),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn empty_string_constant() {
        assert_eq!(
            scan_ok("\"\""),
            vec![TokenKind::StringConstant(String::new()), TokenKind::Eof]
        );
    }

    #[test]
    fn unterminated_string() {
        assert_eq!(scan_error("\"no end\nint x"), ErrorKind::MissingClosingQuote);
    }

    #[test]
    fn unterminated_string_at_eof() {
        assert_eq!(scan_error("\"no end"), ErrorKind::MissingClosingQuote);
    }

    #[test]
    fn unrecognized_symbol() {
        assert_eq!(scan_error("int x % 3"), ErrorKind::UnrecognizedSymbol);
    }

    #[test]
    fn comment_runs_to_end_of_line() {
        let kinds = scan_ok("int # everything here is ignored := \" \nx");
        assert_eq!(
            kinds,
            vec![TokenKind::Int, TokenKind::Name("x".into()), TokenKind::Eof]
        );
    }

    #[test]
    fn spans_track_lines_and_columns() {
        let mut scanner = Scanner::new("int x;\n  while").unwrap();
        assert_eq!((scanner.span().line, scanner.span().col), (1, 1));
        scanner.next_token().unwrap(); // x
        assert_eq!((scanner.span().line, scanner.span().col), (1, 5));
        scanner.next_token().unwrap(); // ;
        assert_eq!((scanner.span().line, scanner.span().col), (1, 6));
        scanner.next_token().unwrap(); // while
        assert_eq!((scanner.span().line, scanner.span().col), (2, 3));
    }

    #[test]
    fn unterminated_string_reports_opening_line() {
        let mut scanner = Scanner::new("int x\n\"oops\nint y").unwrap();
        let diag = loop {
            match scanner.next_token() {
                Err(diag) => break diag,
                Ok(()) => {}
            }
        };
        assert_eq!(diag.span.line, 2);
    }
}
