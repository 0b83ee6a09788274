//! Colsplit CLI - export selected CSV columns to a new file
//!
//! # Commands
//!
//! ```bash
//! colsplit columns input.csv                 # List columns (alphabetical)
//! colsplit columns input.csv --filter mail   # Case-insensitive search
//! colsplit export input.csv -c id -c email   # Write selected_input.csv
//! colsplit export input.csv --all -o out.csv # Re-encode every column
//! colsplit detect input.csv                  # Show the detected encoding
//! ```
//!
//! Log output goes to stderr and is controlled by `COLSPLIT_LOG`
//! (`-v` / `-vv` raise the default level).

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use colsplit::{
    default_output_path, detect, display_order, export_with_options, filter_columns, inspect,
    ExportOptions, ExportResult, OutputFormat, SelectionSet,
};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "colsplit")]
#[command(about = "Export a chosen subset of CSV columns to a new file", long_about = None)]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the columns of a CSV file
    Columns {
        /// Input CSV file
        input: PathBuf,

        /// Only show columns containing this text (case-insensitive)
        #[arg(short, long)]
        filter: Option<String>,

        /// Keep the file's column order instead of sorting
        #[arg(long)]
        source_order: bool,
    },

    /// Export selected columns to a new file
    Export {
        /// Input CSV file
        input: PathBuf,

        /// Column to export (repeatable)
        #[arg(short = 'c', long = "column", required_unless_present = "all")]
        columns: Vec<String>,

        /// Export every column
        #[arg(long, conflicts_with = "columns")]
        all: bool,

        /// Output file (default: selected_<input> next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = FormatArg::Csv)]
        format: FormatArg,

        /// Split the output into files of at most this many rows
        #[arg(long)]
        rows_per_file: Option<NonZeroUsize>,

        /// Write the output file directly instead of replacing it on success
        #[arg(long)]
        in_place: bool,
    },

    /// Show the detected encoding of a file
    Detect {
        /// Input CSV file
        input: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Csv,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Csv => OutputFormat::Csv,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Columns {
            input,
            filter,
            source_order,
        } => cmd_columns(&input, filter.as_deref(), source_order),

        Commands::Export {
            input,
            columns,
            all,
            output,
            format,
            rows_per_file,
            in_place,
        } => {
            let options = ExportOptions {
                format: format.into(),
                rows_per_file: rows_per_file.map(NonZeroUsize::get),
                atomic: !in_place,
            };
            cmd_export(&input, columns, all, output, &options)
        }

        Commands::Detect { input } => cmd_detect(&input),
    };

    if let Err(e) = result {
        eprintln!("❌ Error [{}]: {}", e.category(), e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let default_directive = match verbose {
        0 => "colsplit=warn",
        1 => "colsplit=info",
        _ => "colsplit=debug",
    };
    let filter = EnvFilter::try_from_env("COLSPLIT_LOG").unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn cmd_columns(input: &Path, filter: Option<&str>, source_order: bool) -> ExportResult<()> {
    let info = inspect(input)?;

    eprintln!("📄 {}", input.display());
    eprintln!("   Encoding: {}", info.encoding);

    let ordered = if source_order {
        info.columns.clone()
    } else {
        display_order(&info.columns)
    };
    let shown = match filter {
        Some(query) => filter_columns(&ordered, query),
        None => ordered,
    };

    eprintln!("   Columns: {} ({} shown)", info.columns.len(), shown.len());
    for column in &shown {
        println!("{}", column);
    }
    Ok(())
}

fn cmd_export(
    input: &Path,
    columns: Vec<String>,
    all: bool,
    output: Option<PathBuf>,
    options: &ExportOptions,
) -> ExportResult<()> {
    eprintln!("📄 Processing: {}", input.display());

    let selected = if all {
        SelectionSet::all(&inspect(input)?.columns)
    } else {
        columns.into_iter().collect()
    };

    let destination = output.unwrap_or_else(|| {
        let path = default_output_path(input);
        match options.format {
            OutputFormat::Csv => path,
            OutputFormat::Json => path.with_extension(OutputFormat::Json.extension()),
        }
    });

    let summary = export_with_options(input, &selected, &destination, options)?;

    eprintln!("   Encoding: {}", summary.source_encoding);
    eprintln!("   Columns: {}", summary.columns.join(", "));
    eprintln!("✅ Exported {} rows", summary.rows_written);
    for path in &summary.outputs {
        eprintln!("💾 Output written to: {}", path.display());
    }
    Ok(())
}

fn cmd_detect(input: &Path) -> ExportResult<()> {
    let encoding = detect(input)?;
    println!("{}", encoding);
    Ok(())
}
