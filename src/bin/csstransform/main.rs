#![deny(unsafe_code)]

mod cli;

use clap::Parser as _;
use tracing::Level;

use csstransform::{Config, Runner, DEFAULT_HEADER_TEXT};

fn main() -> anyhow::Result<()> {
    let args = cli::Args::parse();

    let max_level = match args.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(max_level)
        .with_writer(std::io::stderr)
        .init();

    let config = Config {
        inputs: args.files,
        header_text: (!args.no_header).then(|| DEFAULT_HEADER_TEXT.to_string()),
        emit_charset: !args.no_charset,
        encoding_hint: args.encoding,
    };

    Runner::new(config).run()?;
    Ok(())
}
