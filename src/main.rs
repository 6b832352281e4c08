use anyhow::Context;
use clap::{ArgAction, Parser};
use compute::{IndexName, Statement};
use read::{read_statement, StatementFormat};
use std::path::PathBuf;
use write::write_index;

mod compute;
mod data;
mod read;
mod write;

/// Aggregates a bank statement export by day of month, month or entity
#[derive(Debug, Parser)]
#[command(version)]
struct Args {
    /// Tab separated statement export
    file: PathBuf,
    /// Index to query: dom, month or entity
    index: String,
    /// Aggregate field to sort by, e.g. debit.sum
    #[arg(short, long)]
    sort: Option<String>,
    /// Sort direction
    #[arg(short, long, default_value_t = true, action = ArgAction::Set)]
    descending: bool,
    /// Number of header lines before the first transaction
    #[arg(long, default_value_t = StatementFormat::default().header_lines)]
    header_lines: usize,
    /// Number of summary lines after the last transaction
    #[arg(long, default_value_t = StatementFormat::default().footer_lines)]
    footer_lines: usize,
}

fn main() -> Result<(), anyhow::Error> {
    env_logger::init();
    let args = Args::parse();
    let name: IndexName = args.index.parse()?;
    let format = StatementFormat {
        header_lines: args.header_lines,
        footer_lines: args.footer_lines,
        ..StatementFormat::default()
    };

    let file = std::fs::File::open(&args.file)
        .with_context(|| format!("Could not open statement {:?}", args.file))?;
    let mut statement = Statement::new();
    read_statement(file, &format, &mut statement)?;
    write_index(
        std::io::stdout().lock(),
        &statement.index(),
        name,
        args.sort.as_deref(),
        args.descending,
    )?;
    Ok(())
}
