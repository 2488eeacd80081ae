use crate::css::cssom::{
    AtRule, ComponentValue, Declaration, KeyframesRule, PageRule, Rule, StyleRule, StyleSheet,
};
use crate::css::selector::{Combinator, Selector, SelectorMember, SimpleSelector};
use crate::css::tokenizer::{CssToken, CssTokenizer, HashType};

const INDENT: &str = "  ";

/// Output options for [`serialize`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SerializerOptions {
    pub minified: bool,

    /// Starts the output with `@charset "UTF-8";`.
    pub emit_charset: bool,

    /// Written as a comment after the charset rule.
    pub header_text: Option<String>,
}

/// Renders a stylesheet as CSS text. The output parses back to an equal tree.
pub fn serialize(style_sheet: &StyleSheet, options: &SerializerOptions) -> String {
    let mut serializer = Serializer {
        out: String::new(),
        minified: options.minified,
    };

    if options.emit_charset {
        serializer.out.push_str("@charset \"UTF-8\";");
        serializer.newline();
    }
    if let Some(header) = &options.header_text {
        serializer.write_header(header);
    }
    serializer.write_rules(&style_sheet.rules, 0);
    serializer.out
}

/// Renders a single selector, e.g. for log output or tests.
pub(crate) fn selector_text(selector: &Selector, minified: bool) -> String {
    let mut serializer = Serializer {
        out: String::new(),
        minified,
    };
    serializer.write_selector(selector);
    serializer.out
}

struct Serializer {
    out: String,
    minified: bool,
}

impl Serializer {
    fn newline(&mut self) {
        if !self.minified {
            self.out.push('\n');
        }
    }

    fn indent(&mut self, depth: usize) {
        if !self.minified {
            self.out.push_str(&INDENT.repeat(depth));
        }
    }

    fn write_header(&mut self, header: &str) {
        // A `*/` in the text would end the comment early.
        let header = header.replace("*/", "* /");
        if self.minified {
            self.out.push_str("/* ");
            self.out.push_str(&header);
            self.out.push_str(" */");
        } else {
            self.out.push_str("/*\n");
            for line in header.lines() {
                self.out.push_str(" * ");
                self.out.push_str(line);
                self.out.push('\n');
            }
            self.out.push_str(" */\n");
        }
    }

    fn write_rules(&mut self, rules: &[Rule], depth: usize) {
        for (i, rule) in rules.iter().enumerate() {
            if i > 0 && depth == 0 {
                self.newline();
            }
            match rule {
                Rule::Style(style_rule) => self.write_style_rule(style_rule, depth),
                Rule::Media(media_rule) => self.write_group_rule(
                    "media",
                    &media_rule.media_queries,
                    &media_rule.rules,
                    depth,
                ),
                Rule::AtRule(at_rule) => self.write_at_rule(at_rule, depth),
            }
        }
    }

    fn write_style_rule(&mut self, style_rule: &StyleRule, depth: usize) {
        for (i, selector) in style_rule.selectors.iter().enumerate() {
            if i > 0 {
                self.out.push(',');
                self.newline();
            }
            self.indent(depth);
            self.write_selector(selector);
        }
        self.write_declaration_block(&style_rule.declarations, depth);
    }

    /// Writes ` {`, the declarations and the closing `}` followed by a newline.
    fn write_declaration_block(&mut self, declarations: &[Declaration], depth: usize) {
        self.open_block();
        for (i, declaration) in declarations.iter().enumerate() {
            self.indent(depth + 1);
            self.write_declaration(declaration);
            // The last semicolon is optional.
            if !self.minified || i + 1 < declarations.len() {
                self.out.push(';');
            }
            self.newline();
        }
        self.close_block(depth);
    }

    fn open_block(&mut self) {
        if self.minified {
            self.out.push('{');
        } else {
            self.out.push_str(" {\n");
        }
    }

    fn close_block(&mut self, depth: usize) {
        self.indent(depth);
        self.out.push('}');
        self.newline();
    }

    fn write_declaration(&mut self, declaration: &Declaration) {
        self.out.push_str(&escape_ident(&declaration.name));
        self.out.push(':');
        if !self.minified && !declaration.value.is_empty() {
            self.out.push(' ');
        }
        self.write_values(&declaration.value);
        if declaration.important {
            if !self.minified {
                self.out.push(' ');
            }
            self.out.push_str("!important");
        }
    }

    /// `@media` and `@supports`.
    fn write_group_rule(
        &mut self,
        name: &str,
        prelude: &[ComponentValue],
        rules: &[Rule],
        depth: usize,
    ) {
        self.indent(depth);
        self.write_at_rule_prelude(name, &layout_condition(prelude, self.minified));
        self.open_block();
        self.write_rules(rules, depth + 1);
        self.close_block(depth);
    }

    fn write_at_rule(&mut self, at_rule: &AtRule, depth: usize) {
        match at_rule {
            AtRule::Supports(supports_rule) => self.write_group_rule(
                "supports",
                &supports_rule.condition,
                &supports_rule.rules,
                depth,
            ),
            AtRule::Page(page_rule) => self.write_page_rule(page_rule, depth),
            AtRule::Keyframes(keyframes_rule) => self.write_keyframes_rule(keyframes_rule, depth),
            AtRule::Declarations {
                name,
                prelude,
                declarations,
            } => {
                self.indent(depth);
                self.write_at_rule_prelude(name, prelude);
                self.write_declaration_block(declarations, depth);
            }
            AtRule::Statement { name, prelude } => {
                self.indent(depth);
                self.write_at_rule_prelude(name, prelude);
                self.out.push(';');
                self.newline();
            }
            AtRule::Unknown {
                name,
                prelude,
                block,
            } => {
                self.indent(depth);
                self.write_at_rule_prelude(name, prelude);
                if self.minified {
                    self.out.push('{');
                    self.write_values(block);
                    self.out.push('}');
                } else if block.is_empty() {
                    self.out.push_str(" {}\n");
                } else {
                    self.out.push_str(" { ");
                    self.write_values(block);
                    self.out.push_str(" }\n");
                }
            }
        }
    }

    fn write_page_rule(&mut self, page_rule: &PageRule, depth: usize) {
        self.indent(depth);
        self.write_at_rule_prelude("page", &page_rule.selector);
        self.open_block();
        let count = page_rule.declarations.len() + page_rule.margin_rules.len();
        for (i, declaration) in page_rule.declarations.iter().enumerate() {
            self.indent(depth + 1);
            self.write_declaration(declaration);
            if !self.minified || i + 1 < count {
                self.out.push(';');
            }
            self.newline();
        }
        for margin_rule in &page_rule.margin_rules {
            self.indent(depth + 1);
            self.out.push('@');
            self.out.push_str(&escape_ident(&margin_rule.name));
            self.write_declaration_block(&margin_rule.declarations, depth + 1);
        }
        self.close_block(depth);
    }

    fn write_keyframes_rule(&mut self, keyframes_rule: &KeyframesRule, depth: usize) {
        self.indent(depth);
        self.write_at_rule_prelude(&keyframes_rule.keyword, &keyframes_rule.name);
        self.open_block();
        for block in &keyframes_rule.blocks {
            self.indent(depth + 1);
            for (i, selector) in block.selectors.iter().enumerate() {
                if i > 0 {
                    self.out.push_str(if self.minified { "," } else { ", " });
                }
                self.write_values(selector);
            }
            self.write_declaration_block(&block.declarations, depth + 1);
        }
        self.close_block(depth);
    }

    /// Writes `@name prelude`, separating the two only where needed when minified.
    fn write_at_rule_prelude(&mut self, name: &str, prelude: &[ComponentValue]) {
        let at_keyword = CssToken::AtKeyword(name.to_string());
        self.out.push_str(&token_text(&at_keyword));

        let mut tokens = Vec::new();
        flatten(prelude, &mut tokens);
        if let Some(first) = tokens.first() {
            if !self.minified || needs_separator(&at_keyword, first) {
                self.out.push(' ');
            }
            self.write_tokens(&tokens);
        }
    }

    fn write_values(&mut self, values: &[ComponentValue]) {
        let mut tokens = Vec::new();
        flatten(values, &mut tokens);
        self.write_tokens(&tokens);
    }

    /// https://www.w3.org/TR/css-syntax-3/#serialization
    fn write_tokens(&mut self, tokens: &[CssToken]) {
        let mut previous: Option<&CssToken> = None;
        for token in tokens {
            match previous {
                Some(CssToken::Comma)
                    if !self.minified
                        && !matches!(
                            token,
                            CssToken::CloseParenthesis | CssToken::CloseSquareBracket
                        ) =>
                {
                    self.out.push(' ');
                }
                Some(prev) if needs_separator(prev, token) => self.out.push_str("/**/"),
                _ => {}
            }
            self.out.push_str(&token_text(token));
            previous = Some(token);
        }
    }

    fn write_selector(&mut self, selector: &Selector) {
        for member in &selector.members {
            match member {
                SelectorMember::Simple(simple) => self.write_simple_selector(simple),
                SelectorMember::Combinator(combinator) => {
                    let text = match (combinator, self.minified) {
                        (Combinator::Whitespace, _) => " ",
                        (Combinator::Deep, _) => Combinator::DEEP_TEXT,
                        (Combinator::GreaterThan, true) => ">",
                        (Combinator::GreaterThan, false) => " > ",
                        (Combinator::Plus, true) => "+",
                        (Combinator::Plus, false) => " + ",
                        (Combinator::Tilde, true) => "~",
                        (Combinator::Tilde, false) => " ~ ",
                    };
                    self.out.push_str(text);
                }
            }
        }
    }

    fn write_simple_selector(&mut self, simple: &SimpleSelector) {
        match simple {
            SimpleSelector::Type {
                namespace_prefix,
                name,
            } => {
                self.write_namespace_prefix(namespace_prefix.as_deref());
                self.out.push_str(&escape_ident(name));
            }
            SimpleSelector::Universal(namespace_prefix) => {
                self.write_namespace_prefix(namespace_prefix.as_deref());
                self.out.push('*');
            }
            SimpleSelector::Attribute {
                namespace_prefix,
                name,
                op,
                value,
            } => {
                self.out.push('[');
                self.write_namespace_prefix(namespace_prefix.as_deref());
                self.out.push_str(&escape_ident(name));
                if let (Some(op), Some(value)) = (op, value) {
                    self.out.push_str(op);
                    if self.minified && !value.is_empty() && escape_ident(value) == *value {
                        self.out.push_str(value);
                    } else {
                        self.out.push_str(&quote_string(value));
                    }
                }
                self.out.push(']');
            }
            SimpleSelector::Class(name) => {
                self.out.push('.');
                self.out.push_str(&escape_ident(name));
            }
            SimpleSelector::Id(name) => {
                self.out.push('#');
                self.out.push_str(&escape_ident(name));
            }
            SimpleSelector::PseudoClass(name) => {
                self.out.push(':');
                self.out.push_str(&escape_ident(name));
            }
            SimpleSelector::PseudoElement(name) => {
                self.out.push_str("::");
                self.out.push_str(&escape_ident(name));
            }
            SimpleSelector::FunctionalPseudoClass { name, arguments } => {
                self.out.push(':');
                self.write_values(&[ComponentValue::Function {
                    name: name.clone(),
                    values: arguments.clone(),
                }]);
            }
            SimpleSelector::FunctionalPseudoElement { name, arguments } => {
                self.out.push_str("::");
                self.write_values(&[ComponentValue::Function {
                    name: name.clone(),
                    values: arguments.clone(),
                }]);
            }
        }
    }

    fn write_namespace_prefix(&mut self, namespace_prefix: Option<&str>) {
        match namespace_prefix {
            None => {}
            Some("*") => self.out.push_str("*|"),
            Some(prefix) => {
                self.out.push_str(&escape_ident(prefix));
                self.out.push('|');
            }
        }
    }
}

/// Turns nested component values back into the flat token stream they came from.
fn flatten(values: &[ComponentValue], tokens: &mut Vec<CssToken>) {
    for value in values {
        match value {
            ComponentValue::PreservedToken(token) => tokens.push(token.clone()),
            ComponentValue::Function { name, values } => {
                tokens.push(CssToken::Function(name.clone()));
                flatten(values, tokens);
                tokens.push(CssToken::CloseParenthesis);
            }
            ComponentValue::SimpleBlock {
                associated_token,
                values,
            } => {
                tokens.push(associated_token.clone());
                flatten(values, tokens);
                tokens.push(match associated_token {
                    CssToken::OpenParenthesis => CssToken::CloseParenthesis,
                    CssToken::OpenSquareBracket => CssToken::CloseSquareBracket,
                    _ => CssToken::CloseBrace,
                });
            }
        }
    }
}

/// Lays out `:` inside the parenthesized features of a condition:
/// `(min-width: 10px)` when pretty, `(min-width:10px)` when minified.
fn layout_condition(values: &[ComponentValue], minified: bool) -> Vec<ComponentValue> {
    let whitespace = ComponentValue::PreservedToken(CssToken::Whitespace);
    let colon = ComponentValue::PreservedToken(CssToken::Colon);

    values
        .iter()
        .map(|value| match value {
            ComponentValue::SimpleBlock {
                associated_token: CssToken::OpenParenthesis,
                values,
            } => {
                let mut laid_out: Vec<ComponentValue> = Vec::with_capacity(values.len());
                for value in layout_condition(values, minified) {
                    let after_colon = laid_out.last() == Some(&colon);
                    if value == whitespace && after_colon {
                        continue;
                    }
                    if value == colon && laid_out.last() == Some(&whitespace) {
                        laid_out.pop();
                    } else if after_colon && !minified {
                        laid_out.push(whitespace.clone());
                    }
                    laid_out.push(value);
                }
                ComponentValue::SimpleBlock {
                    associated_token: CssToken::OpenParenthesis,
                    values: laid_out,
                }
            }
            value => value.clone(),
        })
        .collect()
}

/// Whether `prev` and `next` would tokenize differently when written back to back.
fn needs_separator(prev: &CssToken, next: &CssToken) -> bool {
    if !may_merge(prev, next) {
        return false;
    }
    let text = format!("{}{}", token_text(prev), token_text(next));
    match CssTokenizer::new(&text).tokenize() {
        Ok(tokens) => !matches!(
            tokens.as_slice(),
            [a, b, eof] if a.token == *prev && b.token == *next && eof.token == CssToken::Eof
        ),
        Err(_) => true,
    }
}

/// Pairs that can merge at all. Cheap filter in front of [`needs_separator`].
/// https://www.w3.org/TR/css-syntax-3/#serialization
fn may_merge(prev: &CssToken, next: &CssToken) -> bool {
    let ident_like = matches!(
        next,
        CssToken::Ident(_) | CssToken::Function(_) | CssToken::Url(_)
    );
    let numeric = matches!(
        next,
        CssToken::Number(_) | CssToken::Percentage(_) | CssToken::Dimension(..)
    );

    match prev {
        CssToken::Ident(_) => {
            ident_like
                || numeric
                || matches!(
                    next,
                    CssToken::Delim('-') | CssToken::Cdc | CssToken::OpenParenthesis
                )
        }
        CssToken::AtKeyword(_) | CssToken::Hash(..) | CssToken::Dimension(..) => {
            ident_like || numeric || matches!(next, CssToken::Delim('-') | CssToken::Cdc)
        }
        CssToken::Delim('#') | CssToken::Delim('-') => {
            ident_like || numeric || matches!(next, CssToken::Delim('-'))
        }
        CssToken::Number(_) => ident_like || numeric || matches!(next, CssToken::Delim('%')),
        CssToken::Delim('@') => ident_like || matches!(next, CssToken::Delim('-')),
        CssToken::Delim('.') | CssToken::Delim('+') => numeric,
        CssToken::Delim('/') => matches!(next, CssToken::Delim('*')),
        _ => false,
    }
}

fn token_text(token: &CssToken) -> String {
    match token {
        CssToken::Ident(s) => escape_ident(s),
        CssToken::Function(s) => format!("{}(", escape_ident(s)),
        CssToken::AtKeyword(s) => format!("@{}", escape_ident(s)),
        CssToken::Hash(s, HashType::Id) => format!("#{}", escape_ident(s)),
        CssToken::Hash(s, HashType::Unrestricted) => format!("#{}", escape_name(s)),
        CssToken::String(s) => quote_string(s),
        CssToken::Url(s) => format!("url({})", escape_url(s)),
        CssToken::Delim(c) => c.to_string(),
        CssToken::Number(n) => n.repr.clone(),
        CssToken::Percentage(n) => format!("{}%", n.repr),
        CssToken::Dimension(n, unit) => format!("{}{}", n.repr, escape_unit(unit)),
        CssToken::Whitespace => " ".to_string(),
        CssToken::Cdo => "<!--".to_string(),
        CssToken::Cdc => "-->".to_string(),
        CssToken::Colon => ":".to_string(),
        CssToken::Semicolon => ";".to_string(),
        CssToken::Comma => ",".to_string(),
        CssToken::OpenSquareBracket => "[".to_string(),
        CssToken::CloseSquareBracket => "]".to_string(),
        CssToken::OpenParenthesis => "(".to_string(),
        CssToken::CloseParenthesis => ")".to_string(),
        CssToken::OpenBrace => "{".to_string(),
        CssToken::CloseBrace => "}".to_string(),
        CssToken::Eof => String::new(),
    }
}

fn hex_escape(c: char) -> String {
    format!("\\{:x} ", c as u32)
}

/// https://www.w3.org/TR/cssom-1/#serialize-an-identifier
fn escape_ident(ident: &str) -> String {
    let mut out = String::with_capacity(ident.len());
    let starts_with_hyphen = ident.starts_with('-');
    let is_lone_hyphen = ident == "-";

    for (i, c) in ident.chars().enumerate() {
        match c {
            '\0' => out.push('\u{FFFD}'),
            '\u{1}'..='\u{1f}' | '\u{7f}' => out.push_str(&hex_escape(c)),
            '0'..='9' if i == 0 || (i == 1 && starts_with_hyphen) => out.push_str(&hex_escape(c)),
            '-' if is_lone_hyphen => out.push_str("\\-"),
            c if CssTokenizer::is_ident_char(c) => out.push(c),
            c => {
                out.push('\\');
                out.push(c);
            }
        }
    }
    out
}

/// Like [`escape_ident`] but without restrictions on the first characters.
fn escape_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        match c {
            '\0' => out.push('\u{FFFD}'),
            '\u{1}'..='\u{1f}' | '\u{7f}' => out.push_str(&hex_escape(c)),
            c if CssTokenizer::is_ident_char(c) => out.push(c),
            c => {
                out.push('\\');
                out.push(c);
            }
        }
    }
    out
}

/// A unit such as `e3` would merge with the number into scientific notation.
fn escape_unit(unit: &str) -> String {
    let mut chars = unit.chars();
    let first = chars.next();
    let rest = chars.as_str();
    let looks_like_exponent = matches!(first, Some('e' | 'E'))
        && (rest.starts_with(|c: char| c.is_ascii_digit())
            || ((rest.starts_with('+') || rest.starts_with('-'))
                && rest[1..].starts_with(|c: char| c.is_ascii_digit())));

    match first {
        Some(e) if looks_like_exponent => format!("{}{}", hex_escape(e), escape_name(rest)),
        _ => escape_ident(unit),
    }
}

/// https://www.w3.org/TR/cssom-1/#serialize-a-string
fn quote_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\0' => out.push('\u{FFFD}'),
            '\u{1}'..='\u{1f}' | '\u{7f}' => out.push_str(&hex_escape(c)),
            '"' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn escape_url(url: &str) -> String {
    let mut out = String::with_capacity(url.len());
    for c in url.chars() {
        match c {
            '\0' => out.push('\u{FFFD}'),
            c if c.is_whitespace() || c.is_control() => out.push_str(&hex_escape(c)),
            '"' | '\'' | '(' | ')' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out
}
