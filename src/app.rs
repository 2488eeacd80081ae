use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context as _, Result};
use tracing::{debug, error, info, warn};

use crate::css::parser::parse_bytes;
use crate::css::rewriter::{rewrite, RewriteSummary};
use crate::css::serializer::{serialize, SerializerOptions};
use crate::error::Error;

pub const DEFAULT_HEADER_TEXT: &str =
    "This file was generated by CssTransform: https://github.com/KarstenB/csstransform";

#[derive(Debug, Clone)]
pub struct Config {
    pub inputs: Vec<PathBuf>,

    /// Comment written at the top of every output. `None` writes no comment.
    pub header_text: Option<String>,

    pub emit_charset: bool,

    /// Encoding of inputs that have neither a BOM nor a `@charset` rule.
    pub encoding_hint: Option<String>,
}

impl Config {
    pub fn new(inputs: Vec<PathBuf>) -> Self {
        Self {
            inputs,
            header_text: Some(DEFAULT_HEADER_TEXT.to_string()),
            emit_charset: true,
            encoding_hint: None,
        }
    }
}

/// Files written for one input, all in the input's directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    /// `name.min.css`: the original rules, minified.
    pub minified: PathBuf,
    /// `name_deep.css`: the rewritten rules.
    pub deep: PathBuf,
    /// `name_deep.min.css`: the rewritten rules, minified.
    pub deep_minified: PathBuf,
}

/// Derives the output paths for `input`, which must end in `.css`.
pub fn output_paths(input: &Path) -> crate::error::Result<OutputPaths> {
    let stem = input
        .file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| name.strip_suffix(".css"))
        .filter(|stem| !stem.is_empty())
        .ok_or_else(|| {
            Error::InvalidInput(format!(
                "{} does not have a .css file name",
                input.display()
            ))
        })?;

    Ok(OutputPaths {
        minified: input.with_file_name(format!("{}.min.css", stem)),
        deep: input.with_file_name(format!("{}_deep.css", stem)),
        deep_minified: input.with_file_name(format!("{}_deep.min.css", stem)),
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub input: PathBuf,
    pub outputs: OutputPaths,
    pub summary: RewriteSummary,
}

#[derive(Debug)]
pub struct Runner {
    config: Config,
}

impl Runner {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Transforms every input. A failing file does not stop the batch; the
    /// returned error counts the failures after all files were tried.
    pub fn run(&self) -> Result<Vec<FileReport>> {
        let mut reports = Vec::new();
        let mut failed = 0;

        for input in &self.config.inputs {
            if !input.is_file() {
                warn!("{} does not exist, skipping", input.display());
                failed += 1;
                continue;
            }
            match self.transform_file(input) {
                Ok(report) => {
                    info!(
                        "{}: rewrote {} selectors, kept {}",
                        input.display(),
                        report.summary.rewritten,
                        report.summary.skipped
                    );
                    reports.push(report);
                }
                Err(e) => {
                    error!("{:#}", e);
                    failed += 1;
                }
            }
        }

        if failed > 0 {
            bail!(
                "{} of {} files could not be transformed",
                failed,
                self.config.inputs.len()
            );
        }
        Ok(reports)
    }

    /// Parses `input` and writes its three outputs. Nothing is written unless
    /// all of them could be rendered.
    pub fn transform_file(&self, input: &Path) -> Result<FileReport> {
        let outputs = output_paths(input)?;
        let bytes = fs::read(input)
            .map_err(Error::Io)
            .with_context(|| format!("failed to read {}", input.display()))?;
        let mut style_sheet = parse_bytes(&bytes, self.config.encoding_hint.as_deref())
            .with_context(|| format!("failed to parse {}", input.display()))?;
        debug!("parsed {} top-level rules from {}", style_sheet.rules.len(), input.display());

        let minified = serialize(&style_sheet, &self.serializer_options(true));
        let summary = rewrite(&mut style_sheet);
        let deep = serialize(&style_sheet, &self.serializer_options(false));
        let deep_minified = serialize(&style_sheet, &self.serializer_options(true));

        for (path, text) in [
            (&outputs.minified, minified),
            (&outputs.deep, deep),
            (&outputs.deep_minified, deep_minified),
        ] {
            fs::write(path, text)
                .map_err(Error::Io)
                .with_context(|| format!("failed to write {}", path.display()))?;
            debug!("wrote {}", path.display());
        }

        Ok(FileReport {
            input: input.to_path_buf(),
            outputs,
            summary,
        })
    }

    fn serializer_options(&self, minified: bool) -> SerializerOptions {
        SerializerOptions {
            minified,
            emit_charset: self.config.emit_charset,
            header_text: self.config.header_text.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_paths_replace_the_css_suffix() {
        let outputs = output_paths(Path::new("styles/site.css")).unwrap();
        assert_eq!(
            outputs,
            OutputPaths {
                minified: PathBuf::from("styles/site.min.css"),
                deep: PathBuf::from("styles/site_deep.css"),
                deep_minified: PathBuf::from("styles/site_deep.min.css"),
            }
        );

        // Only the trailing suffix is replaced.
        let outputs = output_paths(Path::new("a.css.d/theme.css.css")).unwrap();
        assert_eq!(outputs.deep, PathBuf::from("a.css.d/theme.css_deep.css"));
    }

    #[test]
    fn output_paths_reject_other_names() {
        for input in ["site.scss", "site", ".css", "site.CSS"] {
            assert!(
                matches!(output_paths(Path::new(input)), Err(Error::InvalidInput(_))),
                "{input:?} should be rejected"
            );
        }
    }

    #[test]
    fn transform_file_writes_all_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("site.css");
        fs::write(&input, "div.foo { color: red }\nbody { margin: 0 }\n").unwrap();

        let mut config = Config::new(vec![input.clone()]);
        config.header_text = None;
        config.emit_charset = false;
        let report = Runner::new(config).transform_file(&input).unwrap();

        assert_eq!(
            report.summary,
            RewriteSummary {
                rewritten: 1,
                skipped: 1
            }
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("site.min.css")).unwrap(),
            "div.foo{color:red}body{margin:0}"
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("site_deep.css")).unwrap(),
            "body /deep/ div.foo {\n  color: red;\n}\n\nbody {\n  margin: 0;\n}\n"
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("site_deep.min.css")).unwrap(),
            "body /deep/ div.foo{color:red}body{margin:0}"
        );
    }

    #[test]
    fn outputs_carry_charset_and_header() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("a.css");
        fs::write(&input, "a{b:c}").unwrap();

        Runner::new(Config::new(vec![input.clone()]))
            .transform_file(&input)
            .unwrap();
        assert_eq!(
            fs::read_to_string(dir.path().join("a_deep.min.css")).unwrap(),
            format!(
                "@charset \"UTF-8\";/* {} */body /deep/ a{{b:c}}",
                DEFAULT_HEADER_TEXT
            )
        );
    }

    #[test]
    fn parse_errors_write_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("broken.css");
        fs::write(&input, "a { content: \"unterminated }").unwrap();

        let err = Runner::new(Config::new(vec![input.clone()]))
            .transform_file(&input)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::Syntax { .. })
        ));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn run_continues_after_failures() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.css");
        let bad = dir.path().join("bad.css");
        fs::write(&good, "p { color: red }").unwrap();
        fs::write(&bad, "p { color: red } }").unwrap();
        let missing = dir.path().join("missing.css");

        let runner = Runner::new(Config::new(vec![bad, missing, good]));
        let err = runner.run().unwrap_err();
        assert_eq!(err.to_string(), "2 of 3 files could not be transformed");
        assert!(dir.path().join("good_deep.css").is_file());
        assert!(!dir.path().join("bad_deep.css").exists());
    }

    #[test]
    fn run_reports_every_file() {
        let dir = tempfile::tempdir().unwrap();
        let inputs = ["one.css", "two.css"].map(|name| {
            let path = dir.path().join(name);
            fs::write(&path, "@media print { .a, html .b {} }").unwrap();
            path
        });

        let reports = Runner::new(Config::new(inputs.to_vec())).run().unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[1].input, inputs[1]);
        assert_eq!(
            reports[0].summary,
            RewriteSummary {
                rewritten: 1,
                skipped: 1
            }
        );
    }
}
