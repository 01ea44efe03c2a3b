use clap::{Parser, Subcommand};
use effi::bench::{self, BenchOptions};
use effi::compress::Compressor;
use effi::file::{EffiFile, WriterOptions};
use effi::schema::Schema;
use effi::tabular;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "effi", about = "Fixed-width bit-packed row files")]
struct Cli {
    /// Log at debug level (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode headerless integer/text CSV rows into an Effi file.
    /// Appending to a file that is not a whole number of slots fails.
    Encode {
        /// JSON schema sidecar
        #[arg(short, long)]
        schema: PathBuf,
        #[arg(short, long)]
        input:  PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// Append to an existing file instead of replacing it
        #[arg(short, long)]
        append: bool,
    },
    /// Decode an Effi file and print its rows as CSV
    Decode {
        #[arg(short, long)]
        schema: PathBuf,
        input:  PathBuf,
        /// Print each slot as hex before the decoded row
        #[arg(long)]
        hex: bool,
    },
    /// Show the resolved layout of a schema, and the row count of a file
    Info {
        #[arg(short, long)]
        schema: PathBuf,
        input:  Option<PathBuf>,
    },
    /// Compare Effi against CSV, raw and compressed
    Bench {
        #[arg(short, long, default_value_t = bench::DEFAULT_ROWS)]
        rows: u64,
        #[arg(short, long, default_value = ".")]
        dir:  PathBuf,
        /// Compressors: gzip, xz, zstd, lz4, brotli, lzma (default: all)
        #[arg(short, long, num_args = 1..)]
        compressor: Vec<String>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {

        // ── Encode ───────────────────────────────────────────────────────────
        Commands::Encode { schema, input, output, append } => {
            let schema = load_schema(&schema)?;
            let rows   = tabular::read_rows(&schema, BufReader::new(File::open(&input)?))?;
            let file   = EffiFile::new(&output, schema);
            let mut w  = file.writer(WriterOptions { truncate: !append, ..Default::default() })?;
            w.write_rows(&rows)?;
            let slot = w.layout().slot_bytes();
            let n    = w.finish()?;
            println!("Wrote {} rows ({} B/row) to {}", n, slot, output.display());
        }

        // ── Decode ───────────────────────────────────────────────────────────
        Commands::Decode { schema, input, hex } => {
            let schema = load_schema(&schema)?;
            let file   = EffiFile::new(&input, schema.clone());
            let reader = file.reader()?;
            if hex {
                let layout = reader.layout();
                let bytes  = effi::store::read_all(&input)?;
                layout.row_count(bytes.len() as u64)?;
                for slot in bytes.chunks_exact(layout.slot_bytes()) {
                    let row = layout.decode_slot(slot)?;
                    println!("{}  {}", hex::encode(slot), tabular::format_row(&schema, &row)?.join(","));
                }
            } else {
                let rows = reader.rows()?.collect::<effi::Result<Vec<_>>>()?;
                tabular::write_rows(&schema, io::stdout().lock(), &rows)?;
            }
        }

        // ── Info ─────────────────────────────────────────────────────────────
        Commands::Info { schema, input } => {
            let schema = load_schema(&schema)?;
            let layout = effi::RowLayout::new(&schema)?;
            println!("── Effi schema ──────────────────────────────────────────");
            println!("  Format version {}", schema.format_version);
            println!("  Fields         {}", layout.field_count());
            println!("  {:<20} {:>8} {:>10} {:>6}", "Field", "Kind", "Declared", "Bits");
            for (field, width) in schema.fields().iter().zip(layout.widths().as_slice()) {
                println!("  {:<20} {:>8} {:>10} {:>6}",
                    field.name, format!("{:?}", field.kind), field.declared_width, width);
            }
            println!("  Field bits     {}", layout.sum_bits());
            println!("  Slot           {} bits ({} B, {} padding bits)",
                layout.slot_bits(), layout.slot_bytes(), layout.padding_bits());
            if let Some(path) = input {
                let rows = EffiFile::new(&path, schema).reader()?.row_count()?;
                println!("  Rows           {} in {}", rows, path.display());
            }
        }

        // ── Bench ────────────────────────────────────────────────────────────
        Commands::Bench { rows, dir, compressor, json } => {
            let compressors = if compressor.is_empty() {
                Compressor::ALL.to_vec()
            } else {
                compressor.iter().map(|s| parse_compressor(s)).collect::<Result<Vec<_>, _>>()?
            };
            let report = bench::run(&BenchOptions { rows, dir, compressors })?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("Rows           {}", report.rows);
                println!("Effi           {} B ({} B/row)", report.effi_bytes, report.slot_bytes);
                println!("CSV            {} B", report.csv_bytes);
                for c in &report.compressed {
                    println!("{:<14} effi {:>10} B   csv {:>10} B", c.compressor, c.effi_bytes, c.csv_bytes);
                }
            }
        }
    }

    Ok(())
}

// ── helpers ──────────────────────────────────────────────────────────────────

fn init_tracing(verbose: bool) {
    let default = if verbose { "effi=debug" } else { "effi=warn" };
    let filter  = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
}

fn load_schema(path: &Path) -> Result<Schema, Box<dyn std::error::Error>> {
    Ok(Schema::from_json(&std::fs::read_to_string(path)?)?)
}

fn parse_compressor(s: &str) -> Result<Compressor, String> {
    Compressor::from_name(s).ok_or_else(|| format!("Unknown compressor '{s}'"))
}
