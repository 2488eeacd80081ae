use std::fmt;
use std::iter::Peekable;
use std::vec::IntoIter;

use crate::css::cssom::ComponentValue;
use crate::css::serializer;
use crate::css::tokenizer::{CssToken, HashType};
use crate::error::{Error, Result, Span};

/// - https://www.w3.org/TR/selectors-3/#simple-selectors
/// - https://www.w3.org/TR/selectors-3/#grammar
#[derive(Clone, Debug, PartialEq)]
pub enum SimpleSelector {
    Type {
        namespace_prefix: Option<String>,
        name: String,
    },
    Universal(Option<String>), // Option<namespace prefix>
    Attribute {
        namespace_prefix: Option<String>,
        name: String,
        op: Option<String>,
        value: Option<String>,
    },
    Class(String),
    Id(String),
    PseudoClass(String),
    PseudoElement(String),

    // Arguments of functional pseudos (`:nth-child(2n+1)`, `:not(.a)`) are kept as written.
    FunctionalPseudoClass {
        name: String,
        arguments: Vec<ComponentValue>,
    },
    FunctionalPseudoElement {
        name: String,
        arguments: Vec<ComponentValue>,
    },
}

impl SimpleSelector {
    /// Creates an element-name selector without a namespace prefix.
    pub fn element(name: impl Into<String>) -> Self {
        SimpleSelector::Type {
            namespace_prefix: None,
            name: name.into(),
        }
    }

    /// Returns the element name if this is a type selector without a namespace prefix.
    pub fn element_name(&self) -> Option<&str> {
        match self {
            SimpleSelector::Type {
                namespace_prefix: None,
                name,
            } => Some(name),
            _ => None,
        }
    }
}

/// https://www.w3.org/TR/selectors-3/#combinators
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Combinator {
    Whitespace,
    GreaterThan,
    Plus,
    Tilde,

    /// The shadow-piercing ` /deep/ ` combinator.
    Deep,
}

impl Combinator {
    /// The literal text of the deep combinator, surrounding spaces included.
    pub const DEEP_TEXT: &'static str = " /deep/ ";
}

#[derive(Clone, Debug, PartialEq)]
pub enum SelectorMember {
    Simple(SimpleSelector),
    Combinator(Combinator),
}

/// A complex selector as a flat, left-to-right sequence of members.
/// https://www.w3.org/TR/selectors-3/#selector-syntax
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Selector {
    pub members: Vec<SelectorMember>,
}

impl Selector {
    pub fn new(members: Vec<SelectorMember>) -> Self {
        Self { members }
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn first_member(&self) -> Option<&SelectorMember> {
        self.members.first()
    }

    /// Inserts `member` at `index`, shifting later members right.
    pub fn insert_member(&mut self, index: usize, member: SelectorMember) {
        self.members.insert(index, member);
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&serializer::selector_text(self, false))
    }
}

#[derive(Debug)]
pub struct SelectorParser {
    input: Peekable<IntoIter<ComponentValue>>,

    // Where the prelude being parsed starts, for error reporting.
    span: Span,
}

impl SelectorParser {
    pub fn new(values: Vec<ComponentValue>, span: Span) -> Self {
        Self {
            input: values.into_iter().peekable(),
            span,
        }
    }

    /// https://www.w3.org/TR/selectors-3/#w3cselgrammar
    pub fn parse(&mut self) -> Result<Vec<Selector>> {
        self.parse_selectors_group()
    }

    fn error(&self, message: String) -> Error {
        Error::parse(self.span, message)
    }

    fn skip_whitespace(&mut self) -> bool {
        let mut skipped = false;
        while self
            .input
            .next_if_eq(&ComponentValue::PreservedToken(CssToken::Whitespace))
            .is_some()
        {
            skipped = true;
        }
        skipped
    }

    fn peek_chunk(&self, size: usize) -> Vec<ComponentValue> {
        self.input.clone().take(size).collect()
    }

    // selectors_group
    //   : selector [ COMMA S* selector ]*
    //   ;
    fn parse_selectors_group(&mut self) -> Result<Vec<Selector>> {
        let mut selectors = Vec::new();
        self.skip_whitespace();
        selectors.push(self.parse_selector()?);
        loop {
            match self.input.next() {
                Some(ComponentValue::PreservedToken(CssToken::Comma)) => {
                    self.skip_whitespace();
                    selectors.push(self.parse_selector()?);
                }
                Some(v) => {
                    return Err(self.error(format!(
                        "Unexpected token when parsing CSS selectors: {:?}",
                        v
                    )));
                }
                None => break,
            }
        }
        Ok(selectors)
    }

    // selector
    //   : simple_selector_sequence [ combinator simple_selector_sequence ]*
    //   ;
    fn parse_selector(&mut self) -> Result<Selector> {
        let mut members = Vec::new();
        loop {
            members.extend(
                self.parse_simple_selector_seq()?
                    .into_iter()
                    .map(SelectorMember::Simple),
            );

            match self.input.peek() {
                Some(ComponentValue::PreservedToken(
                    CssToken::Delim('+' | '>' | '~' | '/') | CssToken::Whitespace,
                )) => match self.parse_combinator()? {
                    Some(combinator) => members.push(SelectorMember::Combinator(combinator)),
                    None => break,
                },
                _ => break,
            }
        }
        Ok(Selector::new(members))
    }

    // combinator
    //   /* combinators can be surrounded by whitespace */
    //   : PLUS S* | GREATER S* | TILDE S* | '/deep/' S* | S+
    //   ;
    //
    // Returns `None` for whitespace that only trails the selector.
    fn parse_combinator(&mut self) -> Result<Option<Combinator>> {
        let is_detected_space = self.skip_whitespace();

        let combinator = match self.input.peek() {
            Some(ComponentValue::PreservedToken(CssToken::Delim('+'))) => Combinator::Plus,
            Some(ComponentValue::PreservedToken(CssToken::Delim('>'))) => Combinator::GreaterThan,
            Some(ComponentValue::PreservedToken(CssToken::Delim('~'))) => Combinator::Tilde,
            Some(ComponentValue::PreservedToken(CssToken::Delim('/'))) => {
                self.parse_deep_combinator()?;
                self.skip_whitespace();
                return Ok(Some(Combinator::Deep));
            }
            None | Some(ComponentValue::PreservedToken(CssToken::Comma)) if is_detected_space => {
                return Ok(None);
            }
            _ if is_detected_space => return Ok(Some(Combinator::Whitespace)),
            v => {
                let message = format!(
                    "Expected \"+\", \">\", \"~\", \"/deep/\", or whitespace but found {:?} when parsing CSS selectors",
                    v
                );
                return Err(self.error(message));
            }
        };
        self.input.next();
        self.skip_whitespace();
        Ok(Some(combinator))
    }

    fn parse_deep_combinator(&mut self) -> Result<()> {
        let v = self.input.by_ref().take(3).collect::<Vec<_>>();
        match &v[..] {
            [ComponentValue::PreservedToken(CssToken::Delim('/')), ComponentValue::PreservedToken(CssToken::Ident(s)), ComponentValue::PreservedToken(CssToken::Delim('/'))]
                if s.eq_ignore_ascii_case("deep") =>
            {
                Ok(())
            }
            _ => Err(self.error(format!(
                "Expected \"/deep/\" but found {:?} when parsing CSS selectors",
                v
            ))),
        }
    }

    fn starts_namespace_prefix(&self, allow_universal_name: bool) -> bool {
        let v = self.peek_chunk(3);
        match (v.first(), v.get(1), v.get(2)) {
            (
                Some(ComponentValue::PreservedToken(CssToken::Ident(_) | CssToken::Delim('*'))),
                Some(ComponentValue::PreservedToken(CssToken::Delim('|'))),
                Some(ComponentValue::PreservedToken(CssToken::Ident(_))),
            )
            | (
                Some(ComponentValue::PreservedToken(CssToken::Delim('|'))),
                Some(ComponentValue::PreservedToken(CssToken::Ident(_))),
                _,
            ) => true,
            (
                Some(ComponentValue::PreservedToken(CssToken::Ident(_) | CssToken::Delim('*'))),
                Some(ComponentValue::PreservedToken(CssToken::Delim('|'))),
                Some(ComponentValue::PreservedToken(CssToken::Delim('*'))),
            )
            | (
                Some(ComponentValue::PreservedToken(CssToken::Delim('|'))),
                Some(ComponentValue::PreservedToken(CssToken::Delim('*'))),
                _,
            ) => allow_universal_name,
            _ => false,
        }
    }

    // simple_selector_sequence
    //   : [ type_selector | universal ]
    //     [ HASH | class | attrib | pseudo | negation ]*
    //   | [ HASH | class | attrib | pseudo | negation ]+
    //   ;
    fn parse_simple_selector_seq(&mut self) -> Result<Vec<SimpleSelector>> {
        let mut selector_seq = Vec::new();

        if self.starts_namespace_prefix(true) {
            let namespace_prefix = self.parse_namespace_prefix()?;
            match self.input.next() {
                Some(ComponentValue::PreservedToken(CssToken::Ident(name))) => {
                    selector_seq.push(SimpleSelector::Type {
                        namespace_prefix: Some(namespace_prefix),
                        name,
                    })
                }
                Some(ComponentValue::PreservedToken(CssToken::Delim('*'))) => {
                    selector_seq.push(SimpleSelector::Universal(Some(namespace_prefix)))
                }
                v => {
                    return Err(self.error(format!(
                        "Expected element name or \"*\" but found {:?} when parsing CSS selectors",
                        v
                    )));
                }
            }
        } else {
            match self.input.peek() {
                Some(ComponentValue::PreservedToken(CssToken::Ident(_))) => {
                    selector_seq.push(SimpleSelector::element(self.parse_ident("element name")?))
                }
                Some(ComponentValue::PreservedToken(CssToken::Delim('*'))) => {
                    self.input.next();
                    selector_seq.push(SimpleSelector::Universal(None))
                }
                _ => {}
            }
        }

        loop {
            match self.input.peek() {
                Some(ComponentValue::PreservedToken(CssToken::Hash(..))) => {
                    selector_seq.push(self.parse_hash()?)
                }
                Some(ComponentValue::PreservedToken(CssToken::Delim('.'))) => {
                    selector_seq.push(self.parse_class()?)
                }
                Some(ComponentValue::SimpleBlock { .. }) => selector_seq.push(self.parse_attrib()?),
                Some(ComponentValue::PreservedToken(CssToken::Colon)) => {
                    selector_seq.push(self.parse_pseudo()?)
                }
                _ => break,
            }
        }

        if selector_seq.is_empty() {
            let message = format!(
                "Expected type selector, universal selector, hash, class, attribute, or pseudo but found {:?} when parsing CSS selectors",
                self.input.peek()
            );
            return Err(self.error(message));
        }

        Ok(selector_seq)
    }

    // namespace_prefix
    //   : [ IDENT | '*' ]? '|'
    //   ;
    fn parse_namespace_prefix(&mut self) -> Result<String> {
        let prefix = match self.input.next() {
            Some(ComponentValue::PreservedToken(CssToken::Delim('|'))) => return Ok(String::new()),
            Some(ComponentValue::PreservedToken(CssToken::Ident(s))) => s,
            Some(ComponentValue::PreservedToken(CssToken::Delim('*'))) => "*".to_string(),
            v => {
                return Err(self.error(format!(
                    "Expected \"|\", ident, or \"*\" but found {:?} when parsing CSS selectors",
                    v
                )));
            }
        };
        match self.input.next() {
            Some(ComponentValue::PreservedToken(CssToken::Delim('|'))) => Ok(prefix),
            v => Err(self.error(format!(
                "Expected \"|\" but found {:?} when parsing CSS selectors",
                v
            ))),
        }
    }

    fn parse_ident(&mut self, what: &str) -> Result<String> {
        match self.input.next() {
            Some(ComponentValue::PreservedToken(CssToken::Ident(s))) => Ok(s),
            v => Err(self.error(format!(
                "Expected {} but found {:?} when parsing CSS selectors",
                what, v
            ))),
        }
    }

    // HASH
    //   : '#' name
    //   ;
    fn parse_hash(&mut self) -> Result<SimpleSelector> {
        match self.input.next() {
            Some(ComponentValue::PreservedToken(CssToken::Hash(s, HashType::Id))) => {
                Ok(SimpleSelector::Id(s))
            }
            v => Err(self.error(format!(
                "Expected an identifier after \"#\" but found {:?} when parsing CSS selectors",
                v
            ))),
        }
    }

    // class
    //   : '.' IDENT
    //   ;
    fn parse_class(&mut self) -> Result<SimpleSelector> {
        match self.input.next() {
            Some(ComponentValue::PreservedToken(CssToken::Delim('.'))) => {
                Ok(SimpleSelector::Class(self.parse_ident("class name")?))
            }
            v => Err(self.error(format!(
                "Expected \".\" but found {:?} when parsing CSS selectors",
                v
            ))),
        }
    }

    // attrib
    //   : '[' S* [ namespace_prefix ]? IDENT S*
    //         [ [ PREFIXMATCH |
    //             SUFFIXMATCH |
    //             SUBSTRINGMATCH |
    //             '=' |
    //             INCLUDES |
    //             DASHMATCH ] S* [ IDENT | STRING ] S*
    //         ]? ']'
    //   ;
    fn parse_attrib(&mut self) -> Result<SimpleSelector> {
        let values = match self.input.next() {
            Some(ComponentValue::SimpleBlock {
                associated_token: CssToken::OpenSquareBracket,
                values,
            }) => values,
            v => {
                return Err(self.error(format!(
                    "Expected \"[\" but found {:?} when parsing CSS selectors",
                    v
                )));
            }
        };
        let mut block = SelectorParser::new(values, self.span);

        block.skip_whitespace();
        let namespace_prefix = if block.starts_namespace_prefix(false) {
            Some(block.parse_namespace_prefix()?)
        } else {
            None
        };
        let name = block.parse_ident("attribute name")?;
        block.skip_whitespace();

        let (op, value) = match block.input.next() {
            None => (None, None),
            Some(ComponentValue::PreservedToken(CssToken::Delim(c))) => {
                let op = match c {
                    '=' => "=".to_string(),
                    '^' | '$' | '*' | '~' | '|' => match block.input.next() {
                        Some(ComponentValue::PreservedToken(CssToken::Delim('='))) => {
                            format!("{}=", c)
                        }
                        v => {
                            return Err(self.error(format!(
                                "Expected \"=\" but found {:?} when parsing CSS selectors",
                                v
                            )));
                        }
                    },
                    _ => {
                        return Err(self.error(format!(
                            "Expected \"=\", \"^=\", \"$=\", \"*=\", \"~=\", \"|=\" but found {:?} when parsing CSS selectors",
                            c
                        )));
                    }
                };
                block.skip_whitespace();
                let value = match block.input.next() {
                    Some(ComponentValue::PreservedToken(
                        CssToken::Ident(s) | CssToken::String(s),
                    )) => s,
                    v => {
                        return Err(self.error(format!(
                            "Expected ident or string but found {:?} when parsing CSS selectors",
                            v
                        )));
                    }
                };
                block.skip_whitespace();
                (Some(op), Some(value))
            }
            Some(v) => {
                return Err(self.error(format!(
                    "Unexpected token when parsing CSS selectors in an attribute selector: {:?}",
                    v
                )));
            }
        };

        if let Some(v) = block.input.next() {
            return Err(self.error(format!(
                "Expected \"]\" but found {:?} when parsing CSS selectors",
                v
            )));
        }

        Ok(SimpleSelector::Attribute {
            namespace_prefix,
            name,
            op,
            value,
        })
    }

    // pseudo
    //     : ':' ':'? [ IDENT | functional_pseudo ]
    //     ;
    fn parse_pseudo(&mut self) -> Result<SimpleSelector> {
        self.input.next();
        let is_element = self
            .input
            .next_if_eq(&ComponentValue::PreservedToken(CssToken::Colon))
            .is_some();

        match self.input.next() {
            Some(ComponentValue::PreservedToken(CssToken::Ident(name))) => Ok(if is_element {
                SimpleSelector::PseudoElement(name)
            } else {
                SimpleSelector::PseudoClass(name)
            }),
            Some(ComponentValue::Function { name, values }) => Ok(if is_element {
                SimpleSelector::FunctionalPseudoElement {
                    name,
                    arguments: values,
                }
            } else {
                SimpleSelector::FunctionalPseudoClass {
                    name,
                    arguments: values,
                }
            }),
            v => Err(self.error(format!(
                "Expected ident or function but found {:?} when parsing CSS selectors",
                v
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::css::parser::parse_selectors;
    use crate::css::tokenizer::NumericValue;

    #[test]
    fn parse_selector_with_combinator() {
        assert_eq!(
            parse_selectors("div > p").unwrap(),
            vec![Selector::new(vec![
                SelectorMember::Simple(SimpleSelector::element("div")),
                SelectorMember::Combinator(Combinator::GreaterThan),
                SelectorMember::Simple(SimpleSelector::element("p")),
            ])]
        );
    }

    #[test]
    fn parse_selectors_with_comma() {
        assert_eq!(
            parse_selectors("div > p , a + b,c~d e").unwrap(),
            vec![
                Selector::new(vec![
                    SelectorMember::Simple(SimpleSelector::element("div")),
                    SelectorMember::Combinator(Combinator::GreaterThan),
                    SelectorMember::Simple(SimpleSelector::element("p")),
                ]),
                Selector::new(vec![
                    SelectorMember::Simple(SimpleSelector::element("a")),
                    SelectorMember::Combinator(Combinator::Plus),
                    SelectorMember::Simple(SimpleSelector::element("b")),
                ]),
                Selector::new(vec![
                    SelectorMember::Simple(SimpleSelector::element("c")),
                    SelectorMember::Combinator(Combinator::Tilde),
                    SelectorMember::Simple(SimpleSelector::element("d")),
                    SelectorMember::Combinator(Combinator::Whitespace),
                    SelectorMember::Simple(SimpleSelector::element("e")),
                ]),
            ]
        );
    }

    #[test]
    fn parse_compound_selector() {
        assert_eq!(
            parse_selectors("a#main.x.y[title=\"hello\"]:hover::before").unwrap(),
            vec![Selector::new(vec![
                SelectorMember::Simple(SimpleSelector::element("a")),
                SelectorMember::Simple(SimpleSelector::Id("main".to_string())),
                SelectorMember::Simple(SimpleSelector::Class("x".to_string())),
                SelectorMember::Simple(SimpleSelector::Class("y".to_string())),
                SelectorMember::Simple(SimpleSelector::Attribute {
                    namespace_prefix: None,
                    name: "title".to_string(),
                    op: Some("=".to_string()),
                    value: Some("hello".to_string()),
                }),
                SelectorMember::Simple(SimpleSelector::PseudoClass("hover".to_string())),
                SelectorMember::Simple(SimpleSelector::PseudoElement("before".to_string())),
            ])]
        );
    }

    #[test]
    fn parse_namespaced_selectors() {
        assert_eq!(
            parse_selectors("svg|rect, *|*, |a, [xlink|href], [lang|=en]").unwrap(),
            vec![
                Selector::new(vec![SelectorMember::Simple(SimpleSelector::Type {
                    namespace_prefix: Some("svg".to_string()),
                    name: "rect".to_string(),
                })]),
                Selector::new(vec![SelectorMember::Simple(SimpleSelector::Universal(
                    Some("*".to_string())
                ))]),
                Selector::new(vec![SelectorMember::Simple(SimpleSelector::Type {
                    namespace_prefix: Some(String::new()),
                    name: "a".to_string(),
                })]),
                Selector::new(vec![SelectorMember::Simple(SimpleSelector::Attribute {
                    namespace_prefix: Some("xlink".to_string()),
                    name: "href".to_string(),
                    op: None,
                    value: None,
                })]),
                Selector::new(vec![SelectorMember::Simple(SimpleSelector::Attribute {
                    namespace_prefix: None,
                    name: "lang".to_string(),
                    op: Some("|=".to_string()),
                    value: Some("en".to_string()),
                })]),
            ]
        );
    }

    #[test]
    fn parse_functional_pseudo() {
        assert_eq!(
            parse_selectors("li:nth-child(2n+1)").unwrap(),
            vec![Selector::new(vec![
                SelectorMember::Simple(SimpleSelector::element("li")),
                SelectorMember::Simple(SimpleSelector::FunctionalPseudoClass {
                    name: "nth-child".to_string(),
                    arguments: vec![
                        ComponentValue::PreservedToken(CssToken::Dimension(
                            NumericValue::integer("2"),
                            "n".to_string()
                        )),
                        ComponentValue::PreservedToken(CssToken::Number(NumericValue::integer(
                            "+1"
                        ))),
                    ],
                }),
            ])]
        );
    }

    #[test]
    fn parse_deep_combinator() {
        assert_eq!(
            parse_selectors("body /deep/ .card").unwrap(),
            vec![Selector::new(vec![
                SelectorMember::Simple(SimpleSelector::element("body")),
                SelectorMember::Combinator(Combinator::Deep),
                SelectorMember::Simple(SimpleSelector::Class("card".to_string())),
            ])]
        );
    }

    #[test]
    fn invalid_selectors_are_rejected() {
        for css in ["a >", "> a", "a,", ".", "#1", "a / b", "[=x]", "a:", "a::1"] {
            assert!(
                matches!(parse_selectors(css), Err(Error::Parse { .. })),
                "{css:?} should not parse"
            );
        }
    }

    #[test]
    fn combinator_must_follow_a_compound_selector() {
        let values = vec![ComponentValue::PreservedToken(CssToken::Ident("a".to_string()))];
        let err = SelectorParser::new(values, Span::new(3, 7))
            .parse_combinator()
            .unwrap_err();
        assert_eq!(err.span(), Some(Span::new(3, 7)));
        assert!(err.to_string().contains("but found Some(PreservedToken(Ident(\"a\")))"));
    }

    #[test]
    fn element_name_ignores_namespaced_types() {
        assert_eq!(SimpleSelector::element("body").element_name(), Some("body"));
        assert_eq!(
            SimpleSelector::Type {
                namespace_prefix: Some("svg".to_string()),
                name: "body".to_string(),
            }
            .element_name(),
            None
        );
        assert_eq!(SimpleSelector::Class("body".to_string()).element_name(), None);
    }
}
