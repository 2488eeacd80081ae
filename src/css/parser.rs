use tracing::{debug, trace};

use crate::css::cssom::{
    AtRule, ComponentValue, Declaration, KeyframeBlock, KeyframesRule, MarginRule, MediaRule,
    PageRule, Rule, StyleRule, StyleSheet, SupportsRule,
};
use crate::css::encoding;
use crate::css::selector::SelectorParser;
use crate::css::tokenizer::{CssToken, CssTokenizer, SpannedToken};
use crate::error::{Error, Result, Span};

/// Parses a stylesheet from decoded text.
pub fn parse(css: &str) -> Result<StyleSheet> {
    CssParser::new(CssTokenizer::new(css).tokenize()?).parse()
}

/// Decodes `bytes` (see [`encoding::decode`]) and parses the result.
pub fn parse_bytes(bytes: &[u8], encoding_hint: Option<&str>) -> Result<StyleSheet> {
    parse(&encoding::decode(bytes, encoding_hint)?)
}

/// Parses a standalone selector list such as `h1, .nav > a`.
#[cfg(test)]
pub(crate) fn parse_selectors(css: &str) -> Result<Vec<crate::css::selector::Selector>> {
    let mut parser = CssParser::new(CssTokenizer::new(css).tokenize()?);
    let span = parser.peek_span();
    let mut values = Vec::new();
    loop {
        match parser.consume_token() {
            CssToken::Eof => break,
            _ => {
                parser.reconsume();
                values.push(parser.consume_component_value()?);
            }
        }
    }
    SelectorParser::new(normalize_whitespace(values), span).parse()
}

/// Deepest nesting of blocks, functions and group rules the parser accepts.
const MAX_NESTING_DEPTH: usize = 128;

#[derive(Debug)]
pub struct CssParser {
    input: Vec<SpannedToken>,
    current_pos: usize,
    current_token: Option<SpannedToken>,
    depth: usize,
}

impl CssParser {
    pub fn new(tokens: Vec<SpannedToken>) -> Self {
        Self {
            input: tokens,
            current_pos: 0,
            current_token: None,
            depth: 0,
        }
    }

    /// Runs `consume` one nesting level deeper, failing once the input nests
    /// past [`MAX_NESTING_DEPTH`].
    fn nested<T>(&mut self, consume: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(self.error("nesting too deep"));
        }
        self.depth += 1;
        let result = consume(self);
        self.depth -= 1;
        result
    }

    /// This is `Parse a stylesheet` entry point (normal parser entry point).
    /// https://www.w3.org/TR/css-syntax-3/#parse-stylesheet
    ///
    /// Any syntax error fails the whole stylesheet; invalid rules are never skipped.
    pub fn parse(&mut self) -> Result<StyleSheet> {
        let charset = self.consume_charset_rule()?;
        let mut style_sheet = StyleSheet::new(self.consume_list_of_rules(true)?);
        style_sheet.charset = charset;
        Ok(style_sheet)
    }

    /// Returns the next token in the input stream and advances the current position.
    fn consume_token(&mut self) -> CssToken {
        let Some(token) = self.input.get(self.current_pos) else {
            // Whenever the list of tokens is empty, the next input token is always an <EOF-token>.
            self.current_pos += 1;
            return CssToken::Eof;
        };
        self.current_token = Some(token.clone());
        self.current_pos += 1;
        token.token.clone()
    }

    /// Returns the next token in the input stream without consuming it.
    fn peek_token(&self) -> &CssToken {
        self.input
            .get(self.current_pos)
            .map_or(&CssToken::Eof, |t| &t.token)
    }

    /// https://www.w3.org/TR/css-syntax-3/#reconsume-the-current-input-token
    fn reconsume(&mut self) {
        self.current_pos -= 1;
    }

    fn peek_span(&self) -> Span {
        self.input
            .get(self.current_pos)
            .or(self.input.last())
            .map_or_else(Span::default, |t| t.span)
    }

    fn current_span(&self) -> Span {
        self.current_token
            .as_ref()
            .map_or_else(|| self.peek_span(), |t| t.span)
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::parse(self.current_span(), message)
    }

    /// Consumes a leading `@charset "<label>";` rule and returns the label.
    /// https://www.w3.org/TR/css-syntax-3/#charset-rule
    fn consume_charset_rule(&mut self) -> Result<Option<String>> {
        if !matches!(self.peek_token(), CssToken::AtKeyword(name) if name == "charset") {
            return Ok(None);
        }
        self.consume_token();
        let (prelude, has_block) = self.consume_at_rule_prelude()?;
        match (&prelude[..], has_block) {
            ([ComponentValue::PreservedToken(CssToken::String(label))], false) => {
                Ok(Some(label.clone()))
            }
            _ => Err(self.error("malformed @charset rule")),
        }
    }

    /// https://www.w3.org/TR/css-syntax-3/#consume-list-of-rules
    ///
    /// A nested list (the body of a conditional group rule) ends at the closing `}`.
    fn consume_list_of_rules(&mut self, top_level: bool) -> Result<Vec<Rule>> {
        let mut rules = Vec::new();

        loop {
            match self.consume_token() {
                CssToken::Whitespace => continue,
                CssToken::Eof if top_level => return Ok(rules),
                CssToken::Eof => return Err(self.error("unterminated block: expected \"}\"")),
                CssToken::CloseBrace if top_level => {
                    return Err(self.error("unexpected \"}\" outside of a block"));
                }
                CssToken::CloseBrace => return Ok(rules),
                CssToken::Cdo | CssToken::Cdc if top_level => continue,
                CssToken::AtKeyword(_) => {
                    self.reconsume();
                    if let Some(rule) = self.consume_at_rule()? {
                        rules.push(rule);
                    }
                }
                _ => {
                    self.reconsume();
                    rules.push(Rule::Style(self.consume_qualified_rule()?));
                }
            }
        }
    }

    /// https://www.w3.org/TR/css-syntax-3/#consume-at-rule
    fn consume_at_rule(&mut self) -> Result<Option<Rule>> {
        let name = match self.consume_token() {
            CssToken::AtKeyword(name) => name,
            t => return Err(self.error(format!("expected an at-rule but found {:?}", t))),
        };
        let (prelude, has_block) = self.consume_at_rule_prelude()?;
        let keyword = name.to_ascii_lowercase();

        let requires_block = |parser: &Self| -> Result<()> {
            if has_block {
                Ok(())
            } else {
                Err(parser.error(format!("expected a block after @{}", name)))
            }
        };

        let rule = match keyword.as_str() {
            "charset" => {
                if has_block {
                    return Err(self.error("unexpected block after @charset"));
                }
                debug!("ignoring @charset rule that is not at the start of the stylesheet");
                return Ok(None);
            }
            "media" => {
                requires_block(self)?;
                Rule::Media(MediaRule {
                    media_queries: normalize_condition(prelude),
                    rules: self.nested(|parser| parser.consume_list_of_rules(false))?,
                })
            }
            "supports" => {
                requires_block(self)?;
                Rule::AtRule(AtRule::Supports(SupportsRule {
                    condition: normalize_condition(prelude),
                    rules: self.nested(|parser| parser.consume_list_of_rules(false))?,
                }))
            }
            "page" => {
                requires_block(self)?;
                let (declarations, margin_rules) = self.consume_page_block()?;
                Rule::AtRule(AtRule::Page(PageRule {
                    selector: prelude,
                    declarations,
                    margin_rules,
                }))
            }
            k if k == "keyframes" || k.ends_with("-keyframes") => {
                requires_block(self)?;
                Rule::AtRule(AtRule::Keyframes(KeyframesRule {
                    keyword: name,
                    name: prelude,
                    blocks: self.consume_keyframe_blocks()?,
                }))
            }
            k if k == "font-face" || k == "counter-style" || k.ends_with("viewport") => {
                requires_block(self)?;
                Rule::AtRule(AtRule::Declarations {
                    name,
                    prelude,
                    declarations: self.consume_list_of_declarations()?,
                })
            }
            "import" | "namespace" if has_block => {
                return Err(self.error(format!("unexpected block after @{}", name)));
            }
            _ if has_block => {
                trace!("keeping the block of @{} verbatim", name);
                Rule::AtRule(AtRule::Unknown {
                    name,
                    prelude,
                    block: self.consume_block_contents()?,
                })
            }
            _ => Rule::AtRule(AtRule::Statement { name, prelude }),
        };
        Ok(Some(rule))
    }

    /// Consumes component values up to `;` or `{`. Returns whether a block follows.
    fn consume_at_rule_prelude(&mut self) -> Result<(Vec<ComponentValue>, bool)> {
        let mut prelude = Vec::new();
        loop {
            match self.consume_token() {
                CssToken::Semicolon => return Ok((normalize_whitespace(prelude), false)),
                CssToken::OpenBrace => return Ok((normalize_whitespace(prelude), true)),
                CssToken::Eof => {
                    return Err(self.error("unexpected end of input in at-rule prelude"));
                }
                CssToken::CloseBrace => return Err(self.error("unexpected \"}\" in at-rule prelude")),
                _ => {
                    self.reconsume();
                    prelude.push(self.consume_component_value()?);
                }
            }
        }
    }

    /// Consumes component values up to and including `{`.
    fn consume_qualified_rule_prelude(&mut self) -> Result<(Vec<ComponentValue>, Span)> {
        let span = self.peek_span();
        let mut prelude = Vec::new();
        loop {
            match self.consume_token() {
                CssToken::OpenBrace => return Ok((normalize_whitespace(prelude), span)),
                CssToken::Eof => {
                    return Err(self.error("unexpected end of input: expected \"{\" after selector"));
                }
                CssToken::Semicolon => return Err(self.error("unexpected \";\" in selector")),
                CssToken::CloseBrace => return Err(self.error("unexpected \"}\" in selector")),
                _ => {
                    self.reconsume();
                    prelude.push(self.consume_component_value()?);
                }
            }
        }
    }

    /// https://www.w3.org/TR/css-syntax-3/#consume-a-qualified-rule
    fn consume_qualified_rule(&mut self) -> Result<StyleRule> {
        let (prelude, span) = self.consume_qualified_rule_prelude()?;

        // The prelude of the qualified rule is parsed as a <selector-list>. If the selector parsing
        // fails, the whole stylesheet is rejected instead of ignoring the rule.
        let selectors = SelectorParser::new(prelude, span).parse()?;

        Ok(StyleRule {
            selectors,
            declarations: self.consume_list_of_declarations()?,
        })
    }

    /// https://www.w3.org/TR/css-syntax-3/#consume-simple-block
    fn consume_simple_block(&mut self) -> Result<ComponentValue> {
        let associated_token = match &self.current_token {
            Some(SpannedToken { token, .. }) => token.clone(),
            None => return Err(self.error("expected the start of a block")),
        };
        let ending_token = match associated_token {
            CssToken::OpenBrace => CssToken::CloseBrace,
            CssToken::OpenParenthesis => CssToken::CloseParenthesis,
            CssToken::OpenSquareBracket => CssToken::CloseSquareBracket,
            _ => return Err(self.error("expected the start of a block")),
        };
        let mut values = Vec::new();

        loop {
            match self.consume_token() {
                t if t == ending_token => {
                    return Ok(ComponentValue::SimpleBlock {
                        associated_token,
                        values: normalize_whitespace(values),
                    });
                }
                CssToken::Eof => {
                    return Err(self.error(format!(
                        "unterminated block: expected {:?}",
                        ending_token
                    )));
                }
                _ => {
                    self.reconsume();
                    values.push(self.consume_component_value()?);
                }
            }
        }
    }

    /// Consumes the contents of a `{}` block whose `{` was already consumed, keeping them verbatim.
    fn consume_block_contents(&mut self) -> Result<Vec<ComponentValue>> {
        let mut values = Vec::new();
        loop {
            match self.consume_token() {
                CssToken::CloseBrace => return Ok(normalize_whitespace(values)),
                CssToken::Eof => return Err(self.error("unterminated block: expected \"}\"")),
                _ => {
                    self.reconsume();
                    values.push(self.consume_component_value()?);
                }
            }
        }
    }

    /// https://www.w3.org/TR/css-syntax-3/#consume-list-of-declarations
    ///
    /// Expects the opening `{` to be consumed and consumes up to the matching `}`.
    fn consume_list_of_declarations(&mut self) -> Result<Vec<Declaration>> {
        let mut declarations = Vec::new();

        loop {
            match self.consume_token() {
                CssToken::CloseBrace => return Ok(declarations),
                CssToken::Whitespace | CssToken::Semicolon => {}
                CssToken::Eof => {
                    return Err(self.error("unterminated declaration block: expected \"}\""));
                }
                CssToken::AtKeyword(name) => {
                    return Err(self.error(format!(
                        "unexpected at-rule @{} in a declaration block",
                        name
                    )));
                }
                CssToken::Ident(_) => {
                    self.reconsume();
                    declarations.push(self.consume_declaration()?);
                }
                t => {
                    return Err(self.error(format!(
                        "unexpected token in a declaration block: {:?}",
                        t
                    )));
                }
            }
        }
    }

    /// The body of `@page`: declarations mixed with margin at-rules.
    fn consume_page_block(&mut self) -> Result<(Vec<Declaration>, Vec<MarginRule>)> {
        let mut declarations = Vec::new();
        let mut margin_rules = Vec::new();

        loop {
            match self.consume_token() {
                CssToken::CloseBrace => return Ok((declarations, margin_rules)),
                CssToken::Whitespace | CssToken::Semicolon => {}
                CssToken::Eof => return Err(self.error("unterminated @page block: expected \"}\"")),
                CssToken::AtKeyword(name) => {
                    let (prelude, has_block) = self.consume_at_rule_prelude()?;
                    if !prelude.is_empty() || !has_block {
                        return Err(self.error(format!("malformed margin rule @{}", name)));
                    }
                    margin_rules.push(MarginRule {
                        name,
                        declarations: self.consume_list_of_declarations()?,
                    });
                }
                CssToken::Ident(_) => {
                    self.reconsume();
                    declarations.push(self.consume_declaration()?);
                }
                t => {
                    return Err(self.error(format!("unexpected token in @page block: {:?}", t)));
                }
            }
        }
    }

    /// https://www.w3.org/TR/css-animations-1/#keyframes
    fn consume_keyframe_blocks(&mut self) -> Result<Vec<KeyframeBlock>> {
        let mut blocks = Vec::new();

        loop {
            match self.consume_token() {
                CssToken::CloseBrace => return Ok(blocks),
                CssToken::Whitespace => {}
                CssToken::Eof => {
                    return Err(self.error("unterminated @keyframes block: expected \"}\""));
                }
                _ => {
                    self.reconsume();
                    let (prelude, _) = self.consume_qualified_rule_prelude()?;
                    let selectors = prelude
                        .split(|v| *v == ComponentValue::PreservedToken(CssToken::Comma))
                        .map(|s| s.to_vec())
                        .collect::<Vec<_>>();
                    if selectors.iter().any(Vec::is_empty) {
                        return Err(self.error("empty keyframe selector"));
                    }
                    blocks.push(KeyframeBlock {
                        selectors,
                        declarations: self.consume_list_of_declarations()?,
                    });
                }
            }
        }
    }

    /// https://www.w3.org/TR/css-syntax-3/#consume-declaration
    fn consume_declaration(&mut self) -> Result<Declaration> {
        let name = match self.consume_token() {
            CssToken::Ident(name) => name,
            t => return Err(self.error(format!("expected a property name but found {:?}", t))),
        };

        while self.peek_token() == &CssToken::Whitespace {
            self.consume_token();
        }
        if self.consume_token() != CssToken::Colon {
            return Err(self.error(format!("expected \":\" after property name \"{}\"", name)));
        }

        let mut value = Vec::new();
        while !matches!(
            self.peek_token(),
            CssToken::Semicolon | CssToken::CloseBrace | CssToken::Eof
        ) {
            value.push(self.consume_component_value()?);
        }
        let mut value = normalize_whitespace(value);

        let important = Self::strip_important(&mut value);
        if value.is_empty() && !name.starts_with("--") {
            return Err(self.error(format!("empty value for property \"{}\"", name)));
        }

        Ok(Declaration {
            name,
            value,
            important,
        })
    }

    /// Removes a trailing `!important` from a normalized value.
    fn strip_important(value: &mut Vec<ComponentValue>) -> bool {
        let Some(ComponentValue::PreservedToken(CssToken::Ident(s))) = value.last() else {
            return false;
        };
        if !s.eq_ignore_ascii_case("important") {
            return false;
        }
        let mut bang = value.len() - 1;
        while bang > 0 && value[bang - 1] == ComponentValue::PreservedToken(CssToken::Whitespace) {
            bang -= 1;
        }
        if bang == 0 || value[bang - 1] != ComponentValue::PreservedToken(CssToken::Delim('!')) {
            return false;
        }
        value.truncate(bang - 1);
        while value.last() == Some(&ComponentValue::PreservedToken(CssToken::Whitespace)) {
            value.pop();
        }
        true
    }

    /// https://www.w3.org/TR/css-syntax-3/#consume-a-component-value
    fn consume_component_value(&mut self) -> Result<ComponentValue> {
        match self.consume_token() {
            CssToken::OpenParenthesis | CssToken::OpenSquareBracket | CssToken::OpenBrace => {
                self.nested(Self::consume_simple_block)
            }
            CssToken::Function(name) => self.nested(|parser| parser.consume_function(name)),
            t @ (CssToken::CloseParenthesis | CssToken::CloseSquareBracket | CssToken::CloseBrace) => {
                Err(self.error(format!("unbalanced {:?}", t)))
            }
            CssToken::Eof => Err(self.error("unexpected end of input")),
            t => Ok(ComponentValue::PreservedToken(t)),
        }
    }

    /// https://www.w3.org/TR/css-syntax-3/#consume-function
    fn consume_function(&mut self, name: String) -> Result<ComponentValue> {
        let mut values = Vec::new();

        loop {
            match self.consume_token() {
                CssToken::CloseParenthesis => {
                    return Ok(ComponentValue::Function {
                        name,
                        values: normalize_whitespace(values),
                    });
                }
                CssToken::Eof => {
                    return Err(self.error(format!(
                        "unterminated function {}(: expected \")\"",
                        name
                    )));
                }
                _ => {
                    self.reconsume();
                    values.push(self.consume_component_value()?);
                }
            }
        }
    }
}

/// Drops whitespace that carries no meaning: at either end of a list and around commas.
/// Pretty and minified output therefore parse back to the same values.
fn normalize_whitespace(values: Vec<ComponentValue>) -> Vec<ComponentValue> {
    let is_whitespace = |v: &ComponentValue| *v == ComponentValue::PreservedToken(CssToken::Whitespace);
    let is_comma = |v: &ComponentValue| *v == ComponentValue::PreservedToken(CssToken::Comma);

    let mut normalized: Vec<ComponentValue> = Vec::with_capacity(values.len());
    for value in values {
        if is_whitespace(&value) {
            if normalized
                .last()
                .map_or(true, |last| is_whitespace(last) || is_comma(last))
            {
                continue;
            }
        } else if is_comma(&value) && normalized.last().is_some_and(is_whitespace) {
            normalized.pop();
        }
        normalized.push(value);
    }
    while normalized.last().is_some_and(is_whitespace) {
        normalized.pop();
    }
    normalized
}

/// Drops whitespace around `:` inside the parenthesized features of a
/// `@media` or `@supports` condition, where it carries no meaning.
/// Functions such as `selector(a :hover)` are left alone.
fn normalize_condition(values: Vec<ComponentValue>) -> Vec<ComponentValue> {
    let is_whitespace = |v: &ComponentValue| *v == ComponentValue::PreservedToken(CssToken::Whitespace);
    let is_colon = |v: &ComponentValue| *v == ComponentValue::PreservedToken(CssToken::Colon);

    values
        .into_iter()
        .map(|value| match value {
            ComponentValue::SimpleBlock {
                associated_token: CssToken::OpenParenthesis,
                values,
            } => {
                let mut normalized: Vec<ComponentValue> = Vec::with_capacity(values.len());
                for value in normalize_condition(values) {
                    if is_whitespace(&value) && normalized.last().is_some_and(is_colon) {
                        continue;
                    }
                    if is_colon(&value) && normalized.last().is_some_and(is_whitespace) {
                        normalized.pop();
                    }
                    normalized.push(value);
                }
                ComponentValue::SimpleBlock {
                    associated_token: CssToken::OpenParenthesis,
                    values: normalized,
                }
            }
            value => value,
        })
        .collect()
}
