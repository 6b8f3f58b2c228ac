//! CLI argument parsing

use clap::Parser;
use std::path::PathBuf;

/// Browse a personal wiki of cheat-sheet pages
#[derive(Parser, Debug)]
#[command(name = "wiki")]
#[command(about = "Browse a personal wiki of cheat-sheet pages")]
#[command(version)]
pub struct Args {
    /// Page to show, e.g. `git` or `git.commit`
    #[arg(required_unless_present_any = ["list", "doctor"])]
    pub main_page: Option<String>,

    /// Sub-pages below the main page
    pub sub_pages: Vec<String>,

    /// List the sub-pages instead of showing the page
    #[arg(short, long)]
    pub list: bool,

    /// Check that every page can be read
    #[arg(long)]
    pub doctor: bool,

    /// Only match names exactly, level by level
    #[arg(long)]
    pub strict: bool,

    /// Wiki root directory (can be repeated)
    #[arg(long = "root", value_name = "DIR")]
    pub roots: Vec<PathBuf>,

    /// Config file path
    #[arg(short, long, env = "PAGEWIKI_CONFIG")]
    pub config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn parse_args() -> Self {
        Parser::parse()
    }

    /// Query fragments in the order given
    pub fn query(&self) -> Vec<String> {
        self.main_page
            .iter()
            .chain(self.sub_pages.iter())
            .cloned()
            .collect()
    }
}
