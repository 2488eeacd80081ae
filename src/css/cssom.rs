use crate::css::selector::Selector;
use crate::css::tokenizer::CssToken;

/// https://www.w3.org/TR/cssom-1/#cssstylesheet
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StyleSheet {
    pub rules: Vec<Rule>,

    /// The encoding label of a leading `@charset` rule, if the source had one.
    pub charset: Option<String>,
}

impl StyleSheet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self {
            rules,
            charset: None,
        }
    }

    /// Returns all style rules in document order, including those nested in
    /// conditional group rules.
    pub fn style_rules(&self) -> Vec<&StyleRule> {
        fn collect<'a>(rules: &'a [Rule], out: &mut Vec<&'a StyleRule>) {
            for rule in rules {
                match rule {
                    Rule::Style(style_rule) => out.push(style_rule),
                    Rule::Media(media_rule) => collect(&media_rule.rules, out),
                    Rule::AtRule(AtRule::Supports(supports_rule)) => {
                        collect(&supports_rule.rules, out)
                    }
                    Rule::AtRule(_) => {}
                }
            }
        }

        let mut out = Vec::new();
        collect(&self.rules, &mut out);
        out
    }
}

/// A CSS document is a series of style rules and at-rules.
/// - https://www.w3.org/TR/css-syntax-3/#syntax-description
/// - https://www.w3.org/TR/cssom-1/#cssrule
#[derive(Clone, Debug, PartialEq)]
pub enum Rule {
    Style(StyleRule),
    Media(MediaRule),
    AtRule(AtRule),
}

/// - https://www.w3.org/TR/css-syntax-3/#style-rules
/// - https://www.w3.org/TR/cssom-1/#the-cssstylerule-interface
#[derive(Clone, Debug, PartialEq)]
pub struct StyleRule {
    // https://www.w3.org/TR/selectors-3/#grouping
    pub selectors: Vec<Selector>,

    pub declarations: Vec<Declaration>,
}

/// https://www.w3.org/TR/css-conditional-3/#at-media
#[derive(Clone, Debug, PartialEq)]
pub struct MediaRule {
    /// The media query list, trimmed of surrounding whitespace.
    pub media_queries: Vec<ComponentValue>,
    pub rules: Vec<Rule>,
}

/// - https://www.w3.org/TR/css-syntax-3/#declaration
/// - https://www.w3.org/TR/cssom-1/#css-declarations
#[derive(Clone, Debug, PartialEq)]
pub struct Declaration {
    pub name: String,
    pub value: Vec<ComponentValue>,
    pub important: bool,
}

/// https://www.w3.org/TR/css-syntax-3/#component-value
#[derive(Clone, Debug, PartialEq)]
pub enum ComponentValue {
    PreservedToken(CssToken),
    Function {
        name: String,
        values: Vec<ComponentValue>,
    },
    SimpleBlock {
        associated_token: CssToken,
        values: Vec<ComponentValue>,
    },
}

/// - https://www.w3.org/TR/css-syntax-3/#at-rules
/// - https://www.w3.org/TR/cssom-1/#the-cssimportrule-interface and subsequent sections for at-rule interfaces
#[derive(Clone, Debug, PartialEq)]
pub enum AtRule {
    Supports(SupportsRule),
    Page(PageRule),
    Keyframes(KeyframesRule),

    /// At-rules whose block is a plain declaration list, such as `@font-face`.
    Declarations {
        name: String,
        prelude: Vec<ComponentValue>,
        declarations: Vec<Declaration>,
    },

    /// Block-less at-rules such as `@import` and `@namespace`.
    Statement {
        name: String,
        prelude: Vec<ComponentValue>,
    },

    /// At-rules with a block this crate has no grammar for. The block is kept verbatim.
    Unknown {
        name: String,
        prelude: Vec<ComponentValue>,
        block: Vec<ComponentValue>,
    },
}

/// https://www.w3.org/TR/css-conditional-3/#at-supports
#[derive(Clone, Debug, PartialEq)]
pub struct SupportsRule {
    pub condition: Vec<ComponentValue>,
    pub rules: Vec<Rule>,
}

/// https://www.w3.org/TR/css-page-3/#at-page-rule
#[derive(Clone, Debug, PartialEq)]
pub struct PageRule {
    pub selector: Vec<ComponentValue>,
    pub declarations: Vec<Declaration>,
    pub margin_rules: Vec<MarginRule>,
}

/// `@top-left { ... }` and friends inside `@page`.
#[derive(Clone, Debug, PartialEq)]
pub struct MarginRule {
    pub name: String,
    pub declarations: Vec<Declaration>,
}

/// https://www.w3.org/TR/css-animations-1/#keyframes
#[derive(Clone, Debug, PartialEq)]
pub struct KeyframesRule {
    /// The at-keyword without `@`, which may carry a vendor prefix (`-webkit-keyframes`).
    pub keyword: String,
    pub name: Vec<ComponentValue>,
    pub blocks: Vec<KeyframeBlock>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct KeyframeBlock {
    /// `from`, `to` or percentages, one entry per comma-separated selector.
    pub selectors: Vec<Vec<ComponentValue>>,
    pub declarations: Vec<Declaration>,
}
