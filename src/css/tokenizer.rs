use crate::error::{Error, Result, Span};

/// https://www.w3.org/TR/css-syntax-3/#tokenization
#[derive(Clone, Debug, PartialEq)]
pub enum CssToken {
    Ident(String),
    Function(String),
    AtKeyword(String),
    Hash(String, HashType),
    String(String),
    Url(String),
    Delim(char),
    Number(NumericValue),
    Percentage(NumericValue),
    Dimension(NumericValue, String),
    Whitespace,
    Cdo,
    Cdc,
    Colon,
    Semicolon,
    Comma,
    OpenSquareBracket,
    CloseSquareBracket,
    OpenParenthesis,
    CloseParenthesis,
    OpenBrace,
    CloseBrace,

    /// EOF is a special token that is used to indicate the end of the input stream.
    Eof,
}

/// The default hash type is unrestricted.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum HashType {
    Id,
    Unrestricted,
}

/// The default type flag is integer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TypeFlag {
    Integer,
    Number,
}

/// A numeric token value. The source representation is kept as written so that
/// serialization never reformats numbers.
#[derive(Clone, Debug, PartialEq)]
pub struct NumericValue {
    pub repr: String,
    pub type_flag: TypeFlag,
}

impl NumericValue {
    pub fn new(repr: impl Into<String>, type_flag: TypeFlag) -> Self {
        Self {
            repr: repr.into(),
            type_flag,
        }
    }

    pub fn integer(repr: impl Into<String>) -> Self {
        Self::new(repr, TypeFlag::Integer)
    }

    pub fn number(repr: impl Into<String>) -> Self {
        Self::new(repr, TypeFlag::Number)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SpannedToken {
    pub token: CssToken,
    pub span: Span,
}

/// A lazy CSS tokenizer. Iterating yields tokens up to and including [`CssToken::Eof`],
/// or stops after the first error.
#[derive(Clone, Debug)]
pub struct CssTokenizer {
    input: Vec<char>,
    current_pos: usize,

    // The last code point to have been consumed
    current_char: Option<char>,

    // Char offsets at which each line begins
    line_starts: Vec<usize>,
    finished: bool,
}

impl CssTokenizer {
    pub fn new(input: &str) -> Self {
        let input = Self::preprocess(input);
        let line_starts = std::iter::once(0)
            .chain(
                input
                    .iter()
                    .enumerate()
                    .filter(|(_, c)| **c == '\n')
                    .map(|(i, _)| i + 1),
            )
            .collect();
        Self {
            input,
            current_pos: 0,
            current_char: None,
            line_starts,
            finished: false,
        }
    }

    /// Rewinds the tokenizer to the start of the input.
    pub fn restart(&mut self) {
        self.current_pos = 0;
        self.current_char = None;
        self.finished = false;
    }

    /// Collects the whole token stream, ending with [`CssToken::Eof`].
    pub fn tokenize(&mut self) -> Result<Vec<SpannedToken>> {
        self.by_ref().collect()
    }

    /// https://www.w3.org/TR/css-syntax-3/#input-preprocessing
    fn preprocess(input: &str) -> Vec<char> {
        let input = input.strip_prefix('\u{FEFF}').unwrap_or(input);
        let mut chars = Vec::with_capacity(input.len());
        let mut iter = input.chars().peekable();
        while let Some(c) = iter.next() {
            match c {
                '\r' => {
                    iter.next_if_eq(&'\n');
                    chars.push('\n');
                }
                '\u{000C}' => chars.push('\n'),
                '\0' => chars.push('\u{FFFD}'),
                c => chars.push(c),
            }
        }
        chars
    }

    fn span_at(&self, pos: usize) -> Span {
        let pos = pos.min(self.input.len());
        let line = self.line_starts.partition_point(|start| *start <= pos);
        Span::new(line, pos - self.line_starts[line - 1] + 1)
    }

    /// Returns the next character from the input stream and advances the current position.
    fn consume_char(&mut self) -> Option<char> {
        let c = self.input.get(self.current_pos).copied();
        self.current_char = c;
        self.current_pos += 1;
        c
    }

    /// https://www.w3.org/TR/css-syntax-3/#reconsume-the-current-input-code-point
    fn reconsume(&mut self) {
        self.current_pos -= 1;
    }

    /// Returns the next character from the input stream without consuming it.
    fn peek_char(&self) -> Option<char> {
        self.input.get(self.current_pos).copied()
    }

    /// Returns the next `len` characters from the input stream without consuming them.
    fn peek_chars(&self, len: usize) -> Vec<Option<char>> {
        (0..len)
            .map(|i| self.input.get(self.current_pos + i).copied())
            .collect()
    }

    /// Returns the next `len` characters from the input stream, including the current character, without consuming them.
    fn peek_chars_with_curr_char(&self, len: usize) -> Vec<Option<char>> {
        let mut ret = vec![self.current_char];
        ret.extend(self.peek_chars(len - 1));
        ret
    }

    /// Consumes `count` characters and appends them to `repr`.
    fn push_consumed(&mut self, repr: &mut String, count: usize) {
        for _ in 0..count {
            if let Some(c) = self.consume_char() {
                repr.push(c);
            }
        }
    }

    fn push_consumed_digits(&mut self, repr: &mut String) {
        while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
            self.push_consumed(repr, 1);
        }
    }

    fn next_token(&mut self) -> Result<SpannedToken> {
        self.consume_comments()?;
        let start = self.current_pos;
        let token = self.consume_token(start)?;
        Ok(SpannedToken {
            token,
            span: self.span_at(start),
        })
    }

    /// https://www.w3.org/TR/css-syntax-3/#consume-token
    fn consume_token(&mut self, start: usize) -> Result<CssToken> {
        match self.consume_char() {
            Some(c) => match c {
                c if Self::is_whitespace(c) => {
                    // Comments between whitespace runs collapse into a single token.
                    loop {
                        while self.peek_char().is_some_and(Self::is_whitespace) {
                            self.consume_char();
                        }
                        if self.peek_chars(2)[..] == [Some('/'), Some('*')] {
                            self.consume_comments()?;
                            continue;
                        }
                        break;
                    }
                    Ok(CssToken::Whitespace)
                }
                '"' | '\'' => self.consume_string_token(c, start),
                '#' => {
                    if self.peek_char().is_some_and(Self::is_ident_char)
                        || Self::are_valid_escape(&self.peek_chars(2))
                    {
                        let type_flag = if Self::would_start_ident(&self.peek_chars(3)) {
                            HashType::Id
                        } else {
                            HashType::Unrestricted
                        };
                        Ok(CssToken::Hash(self.consume_ident_sequence()?, type_flag))
                    } else {
                        Ok(CssToken::Delim(c))
                    }
                }
                '(' => Ok(CssToken::OpenParenthesis),
                ')' => Ok(CssToken::CloseParenthesis),
                '+' | '.' => {
                    if Self::starts_with_number(&self.peek_chars_with_curr_char(3)) {
                        self.reconsume();
                        self.consume_numeric_token()
                    } else {
                        Ok(CssToken::Delim(c))
                    }
                }
                ',' => Ok(CssToken::Comma),
                '-' => {
                    if Self::starts_with_number(&self.peek_chars_with_curr_char(3)) {
                        self.reconsume();
                        self.consume_numeric_token()
                    } else if self.peek_chars(2)[..] == [Some('-'), Some('>')] {
                        self.consume_char();
                        self.consume_char();
                        Ok(CssToken::Cdc)
                    } else if Self::would_start_ident(&self.peek_chars_with_curr_char(3)) {
                        self.reconsume();
                        self.consume_ident_like_sequence(start)
                    } else {
                        Ok(CssToken::Delim(c))
                    }
                }
                ':' => Ok(CssToken::Colon),
                ';' => Ok(CssToken::Semicolon),
                '<' => {
                    if self.peek_chars(3)[..] == [Some('!'), Some('-'), Some('-')] {
                        self.consume_char();
                        self.consume_char();
                        self.consume_char();
                        Ok(CssToken::Cdo)
                    } else {
                        Ok(CssToken::Delim(c))
                    }
                }
                '@' => {
                    if Self::would_start_ident(&self.peek_chars(3)) {
                        Ok(CssToken::AtKeyword(self.consume_ident_sequence()?))
                    } else {
                        Ok(CssToken::Delim(c))
                    }
                }
                '[' => Ok(CssToken::OpenSquareBracket),
                '\\' => {
                    if Self::are_valid_escape(&self.peek_chars_with_curr_char(2)) {
                        self.reconsume();
                        self.consume_ident_like_sequence(start)
                    } else {
                        Err(Error::syntax(
                            self.span_at(start),
                            "invalid escape: backslash followed by a newline",
                        ))
                    }
                }
                ']' => Ok(CssToken::CloseSquareBracket),
                '{' => Ok(CssToken::OpenBrace),
                '}' => Ok(CssToken::CloseBrace),
                '0'..='9' => {
                    self.reconsume();
                    self.consume_numeric_token()
                }
                c if Self::is_ident_start_char(c) => {
                    self.reconsume();
                    self.consume_ident_like_sequence(start)
                }
                _ => Ok(CssToken::Delim(c)),
            },
            None => {
                self.reconsume();
                Ok(CssToken::Eof)
            }
        }
    }

    /// https://www.w3.org/TR/css-syntax-3/#ident-start-code-point
    pub(crate) fn is_ident_start_char(c: char) -> bool {
        c.is_ascii_alphabetic() || c >= '\u{0080}' || c == '_'
    }

    /// https://www.w3.org/TR/css-syntax-3/#ident-code-point
    pub(crate) fn is_ident_char(c: char) -> bool {
        Self::is_ident_start_char(c) || c.is_ascii_digit() || c == '-'
    }

    /// https://w3.org/TR/css-syntax-3/#whitespace
    fn is_whitespace(c: char) -> bool {
        matches!(c, '\n' | '\t' | ' ')
    }

    /// https://www.w3.org/TR/css-syntax-3/#consume-string-token
    ///
    /// Unlike browsers, a string cut by a newline or the end of input is an error.
    fn consume_string_token(&mut self, ending_char: char, start: usize) -> Result<CssToken> {
        let mut string = String::new();

        loop {
            match self.consume_char() {
                Some(c) if c == ending_char => return Ok(CssToken::String(string)),
                Some('\n') => {
                    return Err(Error::syntax(
                        self.span_at(start),
                        "unterminated string: newline before the closing quote",
                    ));
                }
                Some('\\') => match self.peek_char() {
                    None => break,
                    // Escaped newlines are line continuations.
                    Some('\n') => {
                        self.consume_char();
                    }
                    Some(_) => string.push(self.consume_escaped_char()?),
                },
                Some(c) => string.push(c),
                None => break,
            }
        }
        Err(Error::syntax(
            self.span_at(start),
            "unterminated string: end of input before the closing quote",
        ))
    }

    /// https://www.w3.org/TR/css-syntax-3/#consume-numeric-token
    fn consume_numeric_token(&mut self) -> Result<CssToken> {
        let number = self.consume_number();

        if Self::would_start_ident(&self.peek_chars(3)) {
            Ok(CssToken::Dimension(number, self.consume_ident_sequence()?))
        } else if self.peek_char() == Some('%') {
            self.consume_char();
            Ok(CssToken::Percentage(number))
        } else {
            Ok(CssToken::Number(number))
        }
    }

    /// https://www.w3.org/TR/css-syntax-3/#consume-comment
    fn consume_comments(&mut self) -> Result<()> {
        while self.peek_chars(2)[..] == [Some('/'), Some('*')] {
            let start = self.current_pos;
            self.consume_char();
            self.consume_char();
            let mut consumed_asterisk = false;
            loop {
                match self.consume_char() {
                    Some('*') => consumed_asterisk = true,
                    Some('/') if consumed_asterisk => break,
                    None => {
                        self.reconsume();
                        return Err(Error::syntax(self.span_at(start), "unterminated comment"));
                    }
                    _ => consumed_asterisk = false,
                }
            }
        }
        Ok(())
    }

    /// https://www.w3.org/TR/css-syntax-3/#consume-ident-like-token
    fn consume_ident_like_sequence(&mut self, start: usize) -> Result<CssToken> {
        let string = self.consume_ident_sequence()?;
        if string.eq_ignore_ascii_case("url") && self.peek_char() == Some('(') {
            self.consume_char();
            while self
                .peek_chars(2)
                .iter()
                .all(|c| c.is_some_and(Self::is_whitespace))
            {
                self.consume_char();
            }
            match self.peek_chars(2)[..] {
                [Some('"' | '\''), _] => Ok(CssToken::Function(string)),
                [Some(c), Some('"' | '\'')] if Self::is_whitespace(c) => {
                    Ok(CssToken::Function(string))
                }
                _ => self.consume_url_token(start),
            }
        } else if self.peek_char() == Some('(') {
            self.consume_char();
            Ok(CssToken::Function(string))
        } else {
            Ok(CssToken::Ident(string))
        }
    }

    /// https://www.w3.org/TR/css-syntax-3/#consume-url-token
    ///
    /// Bad urls are reported as errors instead of producing a `<bad-url-token>`.
    fn consume_url_token(&mut self, start: usize) -> Result<CssToken> {
        let mut url = String::new();
        while self.peek_char().is_some_and(Self::is_whitespace) {
            self.consume_char();
        }
        loop {
            match self.consume_char() {
                Some(')') => return Ok(CssToken::Url(url)),
                Some(
                    '"'
                    | '\''
                    | '('
                    | '\u{0000}'..='\u{0008}'
                    | '\u{000B}'
                    | '\u{000E}'..='\u{001F}'
                    | '\u{007F}',
                ) => {
                    return Err(Error::syntax(
                        self.span_at(self.current_pos - 1),
                        "invalid character in unquoted url",
                    ));
                }
                Some('\\') => {
                    if Self::are_valid_escape(&self.peek_chars_with_curr_char(2)) {
                        url.push(self.consume_escaped_char()?);
                    } else {
                        return Err(Error::syntax(
                            self.span_at(self.current_pos - 1),
                            "invalid escape in url",
                        ));
                    }
                }
                Some(c) if Self::is_whitespace(c) => {
                    while self.peek_char().is_some_and(Self::is_whitespace) {
                        self.consume_char();
                    }
                    match self.peek_char() {
                        Some(')') => {
                            self.consume_char();
                            return Ok(CssToken::Url(url));
                        }
                        None => break,
                        Some(_) => {
                            return Err(Error::syntax(
                                self.span_at(self.current_pos),
                                "unexpected whitespace in unquoted url",
                            ));
                        }
                    }
                }
                Some(c) => url.push(c),
                None => break,
            }
        }
        Err(Error::syntax(self.span_at(start), "unterminated url"))
    }

    /// https://www.w3.org/TR/css-syntax-3/#consume-name
    fn consume_ident_sequence(&mut self) -> Result<String> {
        let mut result = String::new();
        loop {
            match self.consume_char() {
                Some(c) if Self::is_ident_char(c) => result.push(c),
                Some('\\') if Self::are_valid_escape(&self.peek_chars_with_curr_char(2)) => {
                    result.push(self.consume_escaped_char()?);
                }
                _ => {
                    self.reconsume();
                    return Ok(result);
                }
            }
        }
    }

    /// https://www.w3.org/TR/css-syntax-3/#consume-escaped-code-point
    fn consume_escaped_char(&mut self) -> Result<char> {
        match self.consume_char() {
            Some(c) if c.is_ascii_hexdigit() => {
                let mut hex = String::from(c);
                while hex.len() < 6 && self.peek_char().is_some_and(|c| c.is_ascii_hexdigit()) {
                    self.push_consumed(&mut hex, 1);
                }
                if self.peek_char().is_some_and(Self::is_whitespace) {
                    self.consume_char();
                }
                // Zero, surrogates and values above U+10FFFF become the replacement character.
                Ok(u32::from_str_radix(&hex, 16)
                    .ok()
                    .filter(|code| *code != 0)
                    .and_then(char::from_u32)
                    .unwrap_or('\u{FFFD}'))
            }
            Some(c) => Ok(c),
            None => {
                self.reconsume();
                Err(Error::syntax(
                    self.span_at(self.current_pos),
                    "unexpected end of input in escape sequence",
                ))
            }
        }
    }

    /// https://www.w3.org/TR/css-syntax-3/#consume-number
    fn consume_number(&mut self) -> NumericValue {
        let mut repr = String::new();
        let mut type_flag = TypeFlag::Integer;

        if let Some('+' | '-') = self.peek_char() {
            self.push_consumed(&mut repr, 1);
        }
        self.push_consumed_digits(&mut repr);

        if let [Some('.'), Some('0'..='9')] = self.peek_chars(2)[..] {
            self.push_consumed(&mut repr, 2);
            self.push_consumed_digits(&mut repr);
            type_flag = TypeFlag::Number;
        }

        if let [Some('E' | 'e'), Some('0'..='9')] = self.peek_chars(2)[..] {
            self.push_consumed(&mut repr, 2);
            self.push_consumed_digits(&mut repr);
            type_flag = TypeFlag::Number;
        } else if let [Some('E' | 'e'), Some('+' | '-'), Some('0'..='9')] = self.peek_chars(3)[..] {
            self.push_consumed(&mut repr, 3);
            self.push_consumed_digits(&mut repr);
            type_flag = TypeFlag::Number;
        }

        NumericValue::new(repr, type_flag)
    }

    /// Check if two code points are a valid escape.
    /// https://www.w3.org/TR/css-syntax-3/#check-if-two-code-points-are-a-valid-escape
    fn are_valid_escape(chars: &[Option<char>]) -> bool {
        if chars[0] != Some('\\') {
            false
        } else {
            chars[1] != Some('\n')
        }
    }

    /// Check if three code points would start an ident sequence.
    /// https://www.w3.org/TR/css-syntax-3/#would-start-an-identifier
    fn would_start_ident(chars: &[Option<char>]) -> bool {
        match (chars[0], chars[1], chars[2]) {
            (Some('-'), Some('-'), _) => true,
            (Some('-'), Some(c), _) if Self::is_ident_start_char(c) => true,
            (Some('-'), c1, c2) if Self::are_valid_escape(&[c1, c2]) => true,
            (Some('\\'), c, _) if Self::are_valid_escape(&[Some('\\'), c]) => true,
            (Some(c), _, _) if Self::is_ident_start_char(c) => true,
            _ => false,
        }
    }

    /// Check if three code points would start a number.
    /// https://www.w3.org/TR/css-syntax-3/#starts-with-a-number
    fn starts_with_number(chars: &[Option<char>]) -> bool {
        matches!(
            (chars[0], chars[1], chars[2]),
            (Some('0'..='9'), _, _)
                | (Some('+' | '-' | '.'), Some('0'..='9'), _)
                | (Some('+' | '-'), Some('.'), Some('0'..='9'))
        )
    }
}

impl Iterator for CssTokenizer {
    type Item = Result<SpannedToken>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let token = self.next_token();
        self.finished = match &token {
            Ok(spanned) => spanned.token == CssToken::Eof,
            Err(_) => true,
        };
        Some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize(css: &str) -> Result<Vec<CssToken>> {
        Ok(CssTokenizer::new(css)
            .tokenize()?
            .into_iter()
            .map(|t| t.token)
            .collect())
    }

    #[test]
    fn consume_valid_comment() {
        let css = "/* hello, world! */";
        assert_eq!(tokenize(css).unwrap(), vec![CssToken::Eof]);

        let css = "/* hello, world! *//* Hello, World! */";
        assert_eq!(tokenize(css).unwrap(), vec![CssToken::Eof]);
    }

    #[test]
    fn consume_invalid_comment() {
        let css = "a {}\n  /* hello, world!";
        let err = tokenize(css).unwrap_err();
        assert!(matches!(err, Error::Syntax { .. }));
        assert_eq!(err.span(), Some(Span::new(2, 3)));
    }

    #[test]
    fn comments_between_whitespace_collapse() {
        let css = "a /* one */ /* two */ b";
        assert_eq!(
            tokenize(css).unwrap(),
            vec![
                CssToken::Ident("a".to_string()),
                CssToken::Whitespace,
                CssToken::Ident("b".to_string()),
                CssToken::Eof
            ]
        );
    }

    #[test]
    fn tokenize_number_with_whitespace() {
        let css = "12345 67890";
        assert_eq!(
            tokenize(css).unwrap(),
            vec![
                CssToken::Number(NumericValue::integer("12345")),
                CssToken::Whitespace,
                CssToken::Number(NumericValue::integer("67890")),
                CssToken::Eof
            ]
        );
    }

    #[test]
    fn tokenize_numbers_keep_their_representation() {
        let css = "+.5 -1e3 10% 1.50em";
        assert_eq!(
            tokenize(css).unwrap(),
            vec![
                CssToken::Number(NumericValue::number("+.5")),
                CssToken::Whitespace,
                CssToken::Number(NumericValue::number("-1e3")),
                CssToken::Whitespace,
                CssToken::Percentage(NumericValue::integer("10")),
                CssToken::Whitespace,
                CssToken::Dimension(NumericValue::number("1.50"), "em".to_string()),
                CssToken::Eof
            ]
        );
    }

    #[test]
    fn tokenize_hash() {
        assert_eq!(
            tokenize("#12345").unwrap(),
            vec![
                CssToken::Hash("12345".to_string(), HashType::Unrestricted),
                CssToken::Eof
            ]
        );
        assert_eq!(
            tokenize("#main").unwrap(),
            vec![
                CssToken::Hash("main".to_string(), HashType::Id),
                CssToken::Eof
            ]
        );
    }

    #[test]
    fn tokenize_escapes() {
        let css = r#".\31 0 "a\"b\41" \@media"#;
        assert_eq!(
            tokenize(css).unwrap(),
            vec![
                CssToken::Delim('.'),
                CssToken::Ident("10".to_string()),
                CssToken::Whitespace,
                CssToken::String("a\"bA".to_string()),
                CssToken::Whitespace,
                CssToken::Ident("@media".to_string()),
                CssToken::Eof
            ]
        );
    }

    #[test]
    fn out_of_range_escape_becomes_replacement_char() {
        assert_eq!(
            tokenize(r"\110000 \0 \D800 ").unwrap(),
            vec![CssToken::Ident("\u{FFFD}\u{FFFD}\u{FFFD}".to_string()), CssToken::Eof]
        );
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let err = tokenize("a { content: \"abc }").unwrap_err();
        assert!(matches!(err, Error::Syntax { .. }));
        assert_eq!(err.span(), Some(Span::new(1, 14)));

        let err = tokenize("a { content: 'abc\n' }").unwrap_err();
        assert!(matches!(err, Error::Syntax { .. }));
    }

    #[test]
    fn escaped_newline_in_string_continues_the_line() {
        assert_eq!(
            tokenize("'ab\\\ncd'").unwrap(),
            vec![CssToken::String("abcd".to_string()), CssToken::Eof]
        );
    }

    #[test]
    fn invalid_escapes_are_errors() {
        assert!(matches!(
            tokenize("a\\\nb").unwrap_err(),
            Error::Syntax { .. }
        ));
        assert!(matches!(tokenize("a\\").unwrap_err(), Error::Syntax { .. }));
    }

    #[test]
    fn tokenize_urls() {
        assert_eq!(
            tokenize("url( img/a.png ) url(\"b.png\")").unwrap(),
            vec![
                CssToken::Url("img/a.png".to_string()),
                CssToken::Whitespace,
                CssToken::Function("url".to_string()),
                CssToken::String("b.png".to_string()),
                CssToken::CloseParenthesis,
                CssToken::Eof
            ]
        );
        assert!(tokenize("url(a b)").is_err());
        assert!(tokenize("url(a").is_err());
    }

    #[test]
    fn newlines_are_normalized_for_spans() {
        let tokens = CssTokenizer::new("a\r\nb\rc\u{000C}d").tokenize().unwrap();
        let spans = tokens.iter().map(|t| t.span).collect::<Vec<_>>();
        assert_eq!(spans[0], Span::new(1, 1));
        assert_eq!(spans[2], Span::new(2, 1));
        assert_eq!(spans[4], Span::new(3, 1));
        assert_eq!(spans[6], Span::new(4, 1));
    }

    #[test]
    fn tokenizer_is_lazy_and_restartable() {
        let mut tokenizer = CssTokenizer::new("a b");
        let first = tokenizer.next().unwrap().unwrap();
        assert_eq!(first.token, CssToken::Ident("a".to_string()));

        tokenizer.restart();
        let all = tokenizer.by_ref().collect::<Result<Vec<_>>>().unwrap();
        assert_eq!(all.len(), 4);
        assert_eq!(all[0], first);
        assert!(tokenizer.next().is_none());
    }

    #[test]
    fn iteration_stops_after_an_error() {
        let mut tokenizer = CssTokenizer::new("a 'b");
        assert!(tokenizer.next().unwrap().is_ok());
        assert!(tokenizer.next().unwrap().is_ok());
        assert!(tokenizer.next().unwrap().is_err());
        assert!(tokenizer.next().is_none());
    }

    #[test]
    fn tokenize_simple_style() {
        // https://developer.mozilla.org/en-US/docs/Learn/CSS/First_steps/Styling_a_biography_page
        let css = r#"h1 {
            color: #375e97;
            font-size: 2em;
            font-family: Georgia, 'Times New Roman', Times, serif;
          }"#;

        assert_eq!(
            tokenize(css).unwrap(),
            vec![
                CssToken::Ident("h1".to_string()),
                CssToken::Whitespace,
                CssToken::OpenBrace,
                CssToken::Whitespace,
                CssToken::Ident("color".to_string()),
                CssToken::Colon,
                CssToken::Whitespace,
                CssToken::Hash("375e97".to_string(), HashType::Unrestricted),
                CssToken::Semicolon,
                CssToken::Whitespace,
                CssToken::Ident("font-size".to_string()),
                CssToken::Colon,
                CssToken::Whitespace,
                CssToken::Dimension(NumericValue::integer("2"), "em".to_string()),
                CssToken::Semicolon,
                CssToken::Whitespace,
                CssToken::Ident("font-family".to_string()),
                CssToken::Colon,
                CssToken::Whitespace,
                CssToken::Ident("Georgia".to_string()),
                CssToken::Comma,
                CssToken::Whitespace,
                CssToken::String("Times New Roman".to_string()),
                CssToken::Comma,
                CssToken::Whitespace,
                CssToken::Ident("Times".to_string()),
                CssToken::Comma,
                CssToken::Whitespace,
                CssToken::Ident("serif".to_string()),
                CssToken::Semicolon,
                CssToken::Whitespace,
                CssToken::CloseBrace,
                CssToken::Eof,
            ]
        )
    }

    #[test]
    fn tokenize_simple_style_with_complex_selector() {
        let css = r#"a[href^="https"] > p:hover {}"#;

        assert_eq!(
            tokenize(css).unwrap(),
            vec![
                CssToken::Ident("a".to_string()),
                CssToken::OpenSquareBracket,
                CssToken::Ident("href".to_string()),
                CssToken::Delim('^'),
                CssToken::Delim('='),
                CssToken::String("https".to_string()),
                CssToken::CloseSquareBracket,
                CssToken::Whitespace,
                CssToken::Delim('>'),
                CssToken::Whitespace,
                CssToken::Ident("p".to_string()),
                CssToken::Colon,
                CssToken::Ident("hover".to_string()),
                CssToken::Whitespace,
                CssToken::OpenBrace,
                CssToken::CloseBrace,
                CssToken::Eof,
            ]
        )
    }
}
