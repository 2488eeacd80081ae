use tracing::trace;

use crate::css::cssom::{AtRule, Rule, StyleSheet};
use crate::css::selector::{Combinator, Selector, SelectorMember, SimpleSelector};

/// Element names that already scope a selector to the document root.
const ROOT_ELEMENTS: [&str; 2] = ["body", "html"];

/// Counts of selectors touched by [`rewrite`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteSummary {
    pub rewritten: usize,
    pub skipped: usize,
}

/// Prefixes every style rule selector with `body /deep/`, unless it already
/// starts with a `body` or `html` element selector. Descends into `@media` and
/// `@supports` bodies.
pub fn rewrite(style_sheet: &mut StyleSheet) -> RewriteSummary {
    let mut summary = RewriteSummary::default();
    rewrite_rules(&mut style_sheet.rules, &mut summary);
    summary
}

fn rewrite_rules(rules: &mut [Rule], summary: &mut RewriteSummary) {
    for rule in rules {
        match rule {
            Rule::Style(style_rule) => {
                for selector in &mut style_rule.selectors {
                    if rewrite_selector(selector) {
                        summary.rewritten += 1;
                    } else {
                        summary.skipped += 1;
                    }
                }
            }
            Rule::Media(media_rule) => rewrite_rules(&mut media_rule.rules, summary),
            Rule::AtRule(AtRule::Supports(supports_rule)) => {
                rewrite_rules(&mut supports_rule.rules, summary)
            }
            Rule::AtRule(_) => {}
        }
    }
}

/// Returns whether the selector was changed.
fn rewrite_selector(selector: &mut Selector) -> bool {
    // Only the leading member decides; `div body` is still rewritten.
    let is_rooted = match selector.first_member() {
        None => return false,
        Some(SelectorMember::Simple(simple)) => simple.element_name().is_some_and(|name| {
            let name = name.trim().to_ascii_lowercase();
            ROOT_ELEMENTS.contains(&name.as_str())
        }),
        Some(SelectorMember::Combinator(_)) => false,
    };
    if is_rooted {
        trace!("keeping rooted selector {}", selector);
        return false;
    }

    selector.insert_member(0, SelectorMember::Combinator(Combinator::Deep));
    selector.insert_member(0, SelectorMember::Simple(SimpleSelector::element("body")));
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::css::parser::parse;

    fn rewritten_selectors(css: &str) -> Vec<String> {
        let mut style_sheet = parse(css).unwrap();
        rewrite(&mut style_sheet);
        style_sheet
            .style_rules()
            .iter()
            .flat_map(|rule| rule.selectors.iter().map(|s| s.to_string()))
            .collect()
    }

    #[test]
    fn rewrite_prepends_body_and_deep_combinator() {
        let mut style_sheet = parse("div.foo { color: red }").unwrap();
        let summary = rewrite(&mut style_sheet);
        assert_eq!(
            summary,
            RewriteSummary {
                rewritten: 1,
                skipped: 0
            }
        );

        let selector = &style_sheet.style_rules()[0].selectors[0];
        assert_eq!(selector.member_count(), 4);
        assert_eq!(
            selector.first_member(),
            Some(&SelectorMember::Simple(SimpleSelector::element("body")))
        );
        assert_eq!(selector.to_string(), "body /deep/ div.foo");
    }

    #[test]
    fn rewrite_keeps_root_selectors() {
        assert_eq!(
            rewritten_selectors("body {} Body {} html {} body .inner {} html > p {}"),
            vec!["body", "Body", "html", "body .inner", "html > p"]
        );
    }

    #[test]
    fn rewrite_inspects_only_the_first_member() {
        assert_eq!(
            rewritten_selectors("div body {} .body {} #html {} svg|body {} *, a > b {}"),
            vec![
                "body /deep/ div body",
                "body /deep/ .body",
                "body /deep/ #html",
                "body /deep/ svg|body",
                "body /deep/ *",
                "body /deep/ a > b",
            ]
        );
    }

    #[test]
    fn rewrite_descends_into_conditional_rules() {
        assert_eq!(
            rewritten_selectors(
                "@media screen { a { color: red } @media print { p {} } } \
                 @supports (display: grid) { .grid {} }"
            ),
            vec!["body /deep/ a", "body /deep/ p", "body /deep/ .grid"]
        );
    }

    #[test]
    fn rewrite_leaves_other_at_rules_alone() {
        let css = "@keyframes spin { from { opacity: 0 } to { opacity: 1 } } \
                   @page :first { margin: 0 } \
                   @font-face { font-family: x }";
        let mut style_sheet = parse(css).unwrap();
        let before = style_sheet.clone();
        assert_eq!(rewrite(&mut style_sheet), RewriteSummary::default());
        assert_eq!(style_sheet, before);
    }

    #[test]
    fn rewrite_is_idempotent() {
        let mut style_sheet = parse("a, body p {} @media print { .x {} }").unwrap();
        rewrite(&mut style_sheet);
        let once = style_sheet.clone();
        let summary = rewrite(&mut style_sheet);
        assert_eq!(style_sheet, once);
        assert_eq!(
            summary,
            RewriteSummary {
                rewritten: 0,
                skipped: 3
            }
        );
    }

    #[test]
    fn rewrite_skips_empty_selectors() {
        let mut selector = Selector::default();
        assert!(!rewrite_selector(&mut selector));
        assert_eq!(selector.member_count(), 0);
    }
}
