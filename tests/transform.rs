use std::fs;

use csstransform::{
    parse, parse_bytes, rewrite, serialize, Config, Error, Runner, SerializerOptions, Span,
};

const SITE_CSS: &str = r#"
@charset "UTF-8";
@import url("base.css");

html, body { margin: 0 }

.card > h2::after, ul li:nth-child(2n+1) {
  content: "\2014";
  color: #333 !important;
}

@media screen and (max-width: 600px) {
  .card { padding: 0 8px }
  @supports (display: grid) {
    .grid { display: grid }
  }
}

@keyframes fade { from { opacity: 0 } to { opacity: 1 } }
"#;

#[test]
fn deep_output_reparses_to_the_rewritten_tree() {
    let mut style_sheet = parse(SITE_CSS).unwrap();
    let summary = rewrite(&mut style_sheet);
    assert_eq!(summary.rewritten, 4);
    assert_eq!(summary.skipped, 2);

    for minified in [false, true] {
        let options = SerializerOptions {
            minified,
            emit_charset: true,
            header_text: Some("generated".to_string()),
        };
        let text = serialize(&style_sheet, &options);
        let reparsed = parse(&text).unwrap();
        assert_eq!(reparsed.rules, style_sheet.rules);
        assert_eq!(reparsed.charset.as_deref(), Some("UTF-8"));

        // Already rewritten selectors are left alone.
        let mut again = reparsed.clone();
        assert_eq!(rewrite(&mut again).rewritten, 0);
        assert_eq!(again, reparsed);
    }
}

#[test]
fn deep_selectors_in_pretty_output() {
    let mut style_sheet = parse(SITE_CSS).unwrap();
    rewrite(&mut style_sheet);
    let text = serialize(&style_sheet, &SerializerOptions::default());

    assert!(text.contains("html,\nbody {\n  margin: 0;\n}\n"));
    assert!(text.contains("body /deep/ .card > h2::after,\nbody /deep/ ul li:nth-child("));
    assert!(text.contains("  color: #333 !important;\n"));
    assert!(text.contains("@media screen and (max-width: 600px) {\n  body /deep/ .card {\n"));
    assert!(text.contains("    body /deep/ .grid {\n"));
    assert!(text.contains("@keyframes fade {\n  from {\n"));
}

#[test]
fn latin1_input_is_decoded() {
    let style_sheet = parse_bytes(b"a { content: \"caf\xE9\" }", Some("iso-8859-1")).unwrap();
    let text = serialize(
        &style_sheet,
        &SerializerOptions {
            minified: true,
            ..Default::default()
        },
    );
    assert_eq!(text, "a{content:\"caf\u{e9}\"}");
}

#[test]
fn errors_carry_positions() {
    let err = parse("a {\n  content: \"oops\n}").unwrap_err();
    assert!(matches!(err, Error::Syntax { .. }));
    assert_eq!(err.span(), Some(Span::new(2, 12)));
    assert!(err.to_string().starts_with("syntax error at 2:12: "));
}

#[test]
fn runner_writes_nothing_for_invalid_files() {
    let dir = tempfile::tempdir().unwrap();
    let valid = dir.path().join("site.css");
    let invalid = dir.path().join("broken.css");
    fs::write(&valid, SITE_CSS).unwrap();
    fs::write(&invalid, "a { content: \"unterminated }").unwrap();

    let result = Runner::new(Config::new(vec![valid.clone(), invalid])).run();
    assert!(result.is_err());

    let mut names = fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().into_string().unwrap())
        .collect::<Vec<_>>();
    names.sort();
    assert_eq!(
        names,
        vec![
            "broken.css",
            "site.css",
            "site.min.css",
            "site_deep.css",
            "site_deep.min.css"
        ]
    );

    let deep = fs::read_to_string(dir.path().join("site_deep.css")).unwrap();
    assert!(deep.starts_with(
        "@charset \"UTF-8\";\n/*\n * This file was generated by CssTransform: \
         https://github.com/KarstenB/csstransform\n */\n"
    ));
}
