//! tabwright CLI - table layout and wiring for XLSX workbooks

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tabwright::{TableDefaults, WorkbookOperator};

#[derive(Parser)]
#[command(name = "tabwright")]
#[command(
    author,
    version,
    about = "Lay out, name and wire structured tables in XLSX workbooks"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show sheets, tables and defined names
    Info {
        /// Workbook file
        file: PathBuf,
    },

    /// Create a blank workbook with one sheet
    New {
        /// Workbook file to create
        file: PathBuf,
    },

    /// Add an empty table next to the existing tables of a sheet
    AddTable {
        /// Workbook file
        file: PathBuf,

        /// Sheet to add the table to
        #[arg(short, long)]
        sheet: String,

        /// Loose table name, turned into TBL_<NAME>
        #[arg(short, long)]
        name: String,

        /// Column headers
        #[arg(long, value_delimiter = ',', required = true)]
        headers: Vec<String>,

        /// Number of blank data rows
        #[arg(short, long, default_value_t = TableDefaults::default().empty_table_rows)]
        rows: u32,
    },

    /// Add a sorted one-column lookup table and name its data range
    AddList {
        /// Workbook file
        file: PathBuf,

        /// Sheet to add the table to
        #[arg(short, long)]
        sheet: String,

        /// Column header (camelCase is split into words)
        #[arg(long)]
        header: String,

        /// Values of the list
        #[arg(required = true)]
        values: Vec<String>,
    },

    /// Turn data already on a sheet into a table
    Wrap {
        /// Workbook file
        file: PathBuf,

        /// Sheet holding the data
        #[arg(short, long)]
        sheet: String,

        /// Header cell at the top-left of the data
        #[arg(long, default_value = "A1")]
        start: String,
    },

    /// Add a sheet, optionally with an empty table named after it
    AddSheet {
        /// Workbook file
        file: PathBuf,

        /// Name of the new sheet
        name: String,

        /// Column headers of the sheet's table
        #[arg(long, value_delimiter = ',')]
        headers: Vec<String>,
    },

    /// Restrict a table column to the values of a named range
    Dropdown {
        /// Workbook file
        file: PathBuf,

        /// Sheet holding the table
        #[arg(short, long)]
        sheet: String,

        /// Table name
        #[arg(short, long)]
        table: String,

        /// Column header
        #[arg(short, long)]
        column: String,

        /// Workbook-level named range supplying the values
        #[arg(short, long)]
        range: String,
    },

    /// Hide the gridlines of a sheet
    HideGridlines {
        /// Workbook file
        file: PathBuf,

        /// Sheet name
        #[arg(short, long)]
        sheet: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Info { file } => show_info(&file),
        Commands::New { file } => new_workbook(&file),
        Commands::AddTable {
            file,
            sheet,
            name,
            headers,
            rows,
        } => add_table(&file, &sheet, &name, &headers, rows),
        Commands::AddList {
            file,
            sheet,
            header,
            values,
        } => add_list(&file, &sheet, &header, &values),
        Commands::Wrap { file, sheet, start } => wrap(&file, &sheet, &start),
        Commands::AddSheet {
            file,
            name,
            headers,
        } => add_sheet(&file, &name, &headers),
        Commands::Dropdown {
            file,
            sheet,
            table,
            column,
            range,
        } => dropdown(&file, &sheet, &table, &column, &range),
        Commands::HideGridlines { file, sheet } => hide_gridlines(&file, &sheet),
    }
}

fn open(file: &Path) -> Result<WorkbookOperator> {
    WorkbookOperator::open(file).with_context(|| format!("Failed to open '{}'", file.display()))
}

fn save(book: WorkbookOperator) -> Result<()> {
    let path = book.path().to_path_buf();
    book.write_changes()
        .with_context(|| format!("Failed to write '{}'", path.display()))?;
    eprintln!("Saved '{}'", path.display());
    Ok(())
}

fn show_info(file: &Path) -> Result<()> {
    let book = open(file)?;
    let workbook = book.workbook();

    println!("File: {}", file.display());
    println!("Sheets: {}", workbook.sheet_count());

    for (i, sheet) in workbook.worksheets().enumerate() {
        println!();
        println!("  Sheet {}: \"{}\"", i, sheet.name());
        if !sheet.show_gridlines() {
            println!("    Gridlines: hidden");
        }
        for table in sheet.tables() {
            let columns: Vec<_> = table.columns().iter().map(|c| c.name.as_str()).collect();
            println!(
                "    Table {} ({}): {} [{}]",
                table.name,
                table.region,
                table
                    .style
                    .as_ref()
                    .map(|s| s.name.as_str())
                    .unwrap_or("no style"),
                columns.join(", ")
            );
        }
        for validation in sheet.data_validations() {
            println!(
                "    Validation {}: {}",
                validation.sqref(),
                validation.validation_type.xlsx_type()
            );
        }
    }

    let names = workbook.named_ranges();
    if !names.is_empty() {
        println!();
        println!("Defined names: {}", names.len());
        for name in names.iter() {
            println!("  {} = {}", name.name, name.refers_to);
        }
    }

    Ok(())
}

fn new_workbook(file: &Path) -> Result<()> {
    if file.exists() {
        anyhow::bail!("'{}' already exists", file.display());
    }
    save(WorkbookOperator::create(file))
}

fn add_table(file: &Path, sheet: &str, name: &str, headers: &[String], rows: u32) -> Result<()> {
    let mut book = open(file)?;
    {
        let mut sheet_op = book.sheet(sheet)?;
        let table = sheet_op
            .add_empty_table(headers, name, rows)
            .with_context(|| format!("Failed to add table to sheet '{}'", sheet))?;
        eprintln!("Added table {} at {}", table.name(), table.table()?.region);
    }
    save(book)
}

fn add_list(file: &Path, sheet: &str, header: &str, values: &[String]) -> Result<()> {
    let mut book = open(file)?;
    {
        let mut sheet_op = book.sheet(sheet)?;
        let mut table = sheet_op
            .add_named_value_range_table(values, header)
            .with_context(|| format!("Failed to add list to sheet '{}'", sheet))?;
        let column = table.table()?.columns()[0].name.clone();
        let range = table.add_defined_name_for_column(&column)?;
        eprintln!(
            "Added table {} with {} values, named range {}",
            table.name(),
            values.len(),
            range.name
        );
    }
    save(book)
}

fn wrap(file: &Path, sheet: &str, start: &str) -> Result<()> {
    let mut book = open(file)?;
    {
        let mut sheet_op = book.sheet(sheet)?;
        let table = sheet_op
            .create_table_on_sheet_with_data(start)
            .with_context(|| format!("Failed to wrap data at {}!{}", sheet, start))?;
        eprintln!("Wrapped {} as table {}", table.table()?.region, table.name());
    }
    save(book)
}

fn add_sheet(file: &Path, name: &str, headers: &[String]) -> Result<()> {
    let mut book = open(file)?;
    if headers.is_empty() {
        book.add_sheet(name)?;
        eprintln!("Added sheet '{}'", name);
    } else {
        let sheet_op = book.add_sheet_and_empty_table(name, headers)?;
        eprintln!(
            "Added sheet '{}' with table {}",
            name,
            sheet_op.table_names()?.join(", ")
        );
    }
    save(book)
}

fn dropdown(file: &Path, sheet: &str, table: &str, column: &str, range: &str) -> Result<()> {
    let mut book = open(file)?;
    let named_range = book
        .find_name(range)
        .cloned()
        .with_context(|| format!("No workbook-level name '{}'", range))?;
    {
        let mut sheet_op = book.sheet(sheet)?;
        let mut table_op = sheet_op.table(table)?;
        table_op
            .add_drop_down_validation_to_column(column, &named_range)
            .with_context(|| format!("Failed to add dropdown to {}[{}]", table, column))?;
    }
    eprintln!("Column {}[{}] now lists ={}", table, column, named_range.name);
    save(book)
}

fn hide_gridlines(file: &Path, sheet: &str) -> Result<()> {
    let mut book = open(file)?;
    book.sheet(sheet)?.disable_grid_lines()?;
    save(book)
}
