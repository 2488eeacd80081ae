use std::path::PathBuf;

use clap::{ArgAction, Parser};

/// Creates `_deep.css` variants of stylesheets whose selectors are scoped with
/// `body /deep/`, plus minified copies, next to each input file.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Args {
    #[arg(
        required = true,
        value_name = "FILES",
        help = "The CSS files to transform; NAME.css produces NAME.min.css, NAME_deep.css and NAME_deep.min.css"
    )]
    pub files: Vec<PathBuf>,

    #[arg(
        long,
        short,
        action = ArgAction::Count,
        help = "Increase the logging verbosity (-v for debug, -vv for trace)"
    )]
    pub verbose: u8,

    #[arg(
        long,
        value_name = "LABEL",
        help = "The encoding of inputs without a byte order mark or @charset rule"
    )]
    pub encoding: Option<String>,

    #[arg(long, help = "Do not write the generated-file comment")]
    pub no_header: bool,

    #[arg(long, help = "Do not write a leading @charset rule")]
    pub no_charset: bool,
}
