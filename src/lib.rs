//! Bidirectional binding between spreadsheet rows and typed Rust records.
//!
//! Describe a record's columns once with [`record!`], build a [`Converter`]
//! for the expected header, then [`Converter::decode_all`] a workbook or CSV
//! file into a `Vec` of records, or [`Converter::encode_all`] records back
//! out.

pub mod cell;
pub mod cli;
pub mod columns;
pub mod config;
pub mod converter;
pub mod decode;
pub mod encode;
pub mod error;
pub mod record;
pub mod sheet;
pub mod template;
pub mod walker;

use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
    sync::OnceLock,
};

use anyhow::{Context, Result};
use clap::Parser;
use csv::QuoteStyle;
use log::{debug, info};

pub use crate::{
    cell::{CellData, CellValue, FromCell, ToCell},
    columns::ColumnIndex,
    config::Profile,
    converter::{Converter, Options},
    error::{BindError, CellError},
    record::{Fields, Nested, Record},
    template::TemplateMode,
};

use crate::cli::{BindingArgs, Cli, Commands, ExtractArgs, LocateArgs};

static LOGGER: OnceLock<()> = OnceLock::new();

/// `RUST_LOG` wins over the default of crate-level info messages.
fn init_logging() {
    LOGGER.get_or_init(|| {
        let env = env_logger::Env::default()
            .default_filter_or(concat!(env!("CARGO_CRATE_NAME"), "=info"));
        let _ = env_logger::Builder::from_env(env)
            .format_timestamp_millis()
            .format_target(false)
            .try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Locate(args) => handle_locate(&args),
        Commands::Extract(args) => handle_extract(&args),
    }
}

fn build_converter(args: &BindingArgs) -> Result<Converter> {
    let mut profile = match &args.profile {
        Some(path) => {
            Profile::load(path).with_context(|| format!("Loading binding profile {path:?}"))?
        }
        None => Profile::new(
            args.columns
                .iter()
                .map(|c| c.trim())
                .filter(|c| !c.is_empty())
                .map(|c| c.to_string())
                .collect(),
        ),
    };
    if let Some(mode) = args.mode {
        profile.template_mode = mode;
    }
    if let Some(lookahead) = args.lookahead {
        profile.lookahead = lookahead;
    }
    if let Some(label) = &args.input_encoding {
        profile.encoding = Some(label.clone());
    }
    debug!("Binding columns: {:?}", profile.columns);
    let mut options = profile.options()?;
    if args.delimiter.is_some() {
        options.delimiter = args.delimiter;
    }
    Ok(Converter::try_with_options(
        profile.columns.iter().cloned(),
        options,
    )?)
}

fn handle_locate(args: &LocateArgs) -> Result<()> {
    let converter = build_converter(&args.binding)?;
    let format = sheet::SheetFormat::resolve(&args.input, converter.options().delimiter)?;
    let rows = sheet::read_rows(&args.input, format, converter.options().encoding)
        .with_context(|| format!("Reading {:?}", args.input))?;
    let header = converter
        .locate_header(&rows)
        .ok_or_else(|| BindError::InvalidTemplate {
            origin: args.input.display().to_string(),
        })?;
    info!(
        "Header of {:?} found at row {} ({} mode)",
        args.input,
        header,
        converter.options().template_mode
    );
    println!("{header}");
    Ok(())
}

fn handle_extract(args: &ExtractArgs) -> Result<()> {
    let converter = build_converter(&args.binding)?;
    let rows = converter
        .read_data_rows(&args.input)
        .with_context(|| format!("Extracting rows from {:?}", args.input))?;
    let columns = converter.columns().names();
    let projected = rows
        .into_iter()
        .map(|mut row| {
            row.resize(columns.len(), String::new());
            row
        })
        .collect::<Vec<_>>();

    let output = open_output(args.output.as_deref())?;
    if args.json {
        write_json_rows(output, columns, &projected)?;
    } else {
        write_csv_rows(output, columns, &projected)?;
    }
    info!(
        "Extracted {} row(s) across {} column(s) from {:?}",
        projected.len(),
        columns.len(),
        args.input
    );
    Ok(())
}

fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    match path {
        Some(p) if p != Path::new("-") => Ok(Box::new(BufWriter::new(
            File::create(p).with_context(|| format!("Creating output file {p:?}"))?,
        ))),
        _ => Ok(Box::new(io::stdout())),
    }
}

fn write_csv_rows(output: Box<dyn Write>, columns: &[String], rows: &[Vec<String>]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .from_writer(output);
    writer.write_record(columns)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_json_rows(
    mut output: Box<dyn Write>,
    columns: &[String],
    rows: &[Vec<String>],
) -> Result<()> {
    for row in rows {
        let object = columns
            .iter()
            .cloned()
            .zip(row.iter().cloned().map(serde_json::Value::String))
            .collect::<serde_json::Map<_, _>>();
        serde_json::to_writer(&mut output, &object)?;
        writeln!(output)?;
    }
    output.flush()?;
    Ok(())
}
