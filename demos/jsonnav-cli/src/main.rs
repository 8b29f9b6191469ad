//! Standalone harness for exercising `json_nav::Document` from the command
//! line: opens a file and either dumps one path or lists every leaf.
//!
//! ```text
//! jsonnav-cli document.json            # list every leaf path and value
//! jsonnav-cli document.json /one/two   # dump a single path
//! ```

use std::env;
use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn run() -> Result<()> {
    let mut args = env::args().skip(1);
    let path = args
        .next()
        .context("usage: jsonnav-cli <file.json> [path]")?;
    let target_path = args.next();

    json_nav::Document::open_file(&path, |doc| -> json_nav::Result<()> {
        match target_path {
            Some(target) => match doc.dump(Some(&target))? {
                Some(dumped) => println!("{dumped}"),
                None => eprintln!("path not found: {target}"),
            },
            None => {
                doc.each_leaf(None, |leaf| -> json_nav::Result<()> {
                    let value = leaf
                        .dump(None)?
                        .expect("each_leaf only visits already-resolved nodes");
                    println!("{}\t{}", leaf.where_path(), value);
                    Ok(())
                })?;
            }
        }
        Ok(())
    })
    .with_context(|| format!("failed to open {path}"))??;
    Ok(())
}
