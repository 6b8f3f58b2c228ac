//! CLI module for pagewiki

mod args;

pub use args::Args;

use crate::config::{Config, DEFAULT_CONFIG_FILE};
use crate::error::{Error, Result};
use crate::render::{Renderer, TerminalRenderer};
use crate::wiki::Wiki;
use std::path::Path;
use std::process::ExitCode;

/// Run the CLI application
pub fn run(args: Args) -> ExitCode {
    match execute(args) {
        Ok(code) => code,
        Err(Error::PageNotFound { query, suggestions }) => {
            eprintln!("Page not found: {}", query);
            if !suggestions.is_empty() {
                eprintln!("Did you mean: {}?", suggestions.join(", "));
            }
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn execute(args: Args) -> Result<ExitCode> {
    // An explicit config file must exist; the default one is optional
    let mut cfg = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(Path::new(DEFAULT_CONFIG_FILE))?,
    };
    cfg.merge_cli(args.roots.clone(), args.strict, args.no_color);
    if !console::colors_enabled() {
        cfg.render.color = false;
    }

    let wiki = Wiki::open(&cfg)?;
    let query = args.query();

    if args.doctor {
        let report = wiki.doctor()?;
        for problem in &report.problems {
            match &problem.location {
                Some(location) => {
                    println!("{} ({}): {}", problem.path, location.display(), problem.error)
                }
                None => println!("{}: {}", problem.path, problem.error),
            }
        }
        println!(
            "Checked {} pages, {} unreadable",
            report.visited,
            report.problems.len()
        );
        return Ok(if report.is_healthy() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }

    if args.list {
        for name in wiki.list(&query)? {
            println!("{}", name);
        }
        return Ok(ExitCode::SUCCESS);
    }

    let resolved = wiki.resolve(&query)?;
    tracing::debug!(path = ?resolved.path, "resolved page");

    let renderer = TerminalRenderer::new(cfg.render.color).with_line_numbers(cfg.render.line_numbers);
    println!("{}", renderer.render(&resolved.text, &resolved.style));
    Ok(ExitCode::SUCCESS)
}
