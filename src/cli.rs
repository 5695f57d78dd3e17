use clap::{ArgAction, Parser};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "albite",
    version,
    about = "Inspect packaged e-books and their saved reading progress.",
    long_about = None
)]
pub struct Cli {
    /// Use a specific configuration file
    #[clap(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print the table of contents
    #[clap(short, long)]
    pub toc: bool,

    /// Print the text of chapter N
    #[clap(short, long, value_name = "N", allow_negative_numbers = true)]
    pub dump: Option<i64>,

    /// Print the token stream of chapter N
    #[clap(short = 'k', long, value_name = "N", allow_negative_numbers = true)]
    pub tokens: Option<i64>,

    /// Tokenize with the markup dialect instead of plain text
    #[clap(short, long)]
    pub markup: bool,

    /// Make chapter N current and save reading progress
    #[clap(short, long, value_name = "N", allow_negative_numbers = true)]
    pub goto: Option<i64>,

    /// Increase verbosity (-v, -vv)
    #[clap(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Enable debug output
    #[clap(long)]
    pub debug: bool,

    /// Path of the packaged book
    #[clap(name = "BOOK")]
    pub book: PathBuf,
}
