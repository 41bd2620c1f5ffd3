use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::{sheet, template::TemplateMode};

#[derive(Debug, Parser)]
#[command(author, version, about = "Locate headers and extract bound columns from spreadsheets", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the 0-based index of the header row
    Locate(LocateArgs),
    /// Write the rows after the header, projected onto the bound columns
    Extract(ExtractArgs),
}

#[derive(Debug, Args)]
pub struct BindingArgs {
    /// Expected column names, in header order
    #[arg(short = 'C', long = "columns", value_delimiter = ',', required_unless_present = "profile")]
    pub columns: Vec<String>,
    /// YAML binding profile (columns, annotation key, template mode, lookahead, encoding)
    #[arg(short, long, conflicts_with = "columns")]
    pub profile: Option<PathBuf>,
    /// Header validation mode (strict, lenient, disabled)
    #[arg(long, value_parser = parse_mode)]
    pub mode: Option<TemplateMode>,
    /// Number of leading rows searched for the header
    #[arg(long)]
    pub lookahead: Option<usize>,
    /// Field delimiter for text inputs: a single character or comma, tab, semicolon, pipe
    #[arg(long, value_parser = sheet::parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of text inputs (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct LocateArgs {
    /// Workbook or delimited file to inspect
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    #[command(flatten)]
    pub binding: BindingArgs,
}

#[derive(Debug, Args)]
pub struct ExtractArgs {
    /// Workbook or delimited file to read
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Output CSV file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Emit one JSON object per row instead of CSV
    #[arg(long)]
    pub json: bool,
    #[command(flatten)]
    pub binding: BindingArgs,
}

pub fn parse_mode(value: &str) -> Result<TemplateMode, String> {
    value.parse()
}
