//! imm-capsule CLI: export and validate provenance capsules.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use imm_capsule::capsule::config::CapsuleConfig;
use imm_capsule::capsule::export::{CapsuleExporter, ExportInput};
use imm_capsule::capsule::validate::{self, FileStatus};
use imm_capsule::cnf::CnfFormula;
use imm_capsule::cnf::tseitin::{TseitinInstance, certificate_sha256};
use imm_capsule::provenance::sha256_hex;

#[derive(Parser)]
#[command(name = "imm-capsule", version, about = "Provenance capsule exporter")]
struct Cli {
    /// Capsule metadata config (TOML). Defaults to the built-in v3.6 values.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export a capsule set from a run description.
    Export {
        /// JSON file with glyph, scores, motif_trail, motif_affinity, drift_window.
        #[arg(long)]
        input: PathBuf,

        /// Instrument name used in the file stem.
        #[arg(long)]
        instrument: String,

        /// Output directory; capsules land in its Capsules/ subdirectory.
        #[arg(long)]
        out_dir: PathBuf,
    },

    /// Validate exported capsules in a directory.
    Validate {
        /// Directory holding capsule records.
        dir: PathBuf,

        /// Write a machine-readable summary to this path.
        #[arg(long)]
        json: Option<PathBuf>,
    },

    /// Print the motif-chain CNF for a trail, or check an existing DIMACS file.
    Dimacs {
        /// Comma-separated motif labels.
        #[arg(long, default_value = "")]
        motifs: String,

        /// Parse this DIMACS file and print its counts and hashes instead.
        #[arg(long)]
        check: Option<PathBuf>,
    },

    /// Write a Tseitin expander benchmark and print its certificate hash.
    Tseitin {
        /// Even vertex count.
        #[arg(long, default_value = "60")]
        vertices: usize,

        /// Charged vertices (comma-separated); defaults to vertex 0.
        #[arg(long)]
        charged: Option<String>,

        /// Output DIMACS path.
        #[arg(long)]
        out: PathBuf,
    },

    /// Print the effective configuration as TOML.
    Config,
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = CapsuleConfig::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Export {
            input,
            instrument,
            out_dir,
        } => {
            let content = std::fs::read_to_string(&input).into_diagnostic()?;
            let run: ExportInput = serde_json::from_str(&content).into_diagnostic()?;

            let exporter = CapsuleExporter::with_collapse_engine(config);
            let files = exporter.export_now(run.into_request(instrument), &out_dir)?;
            for path in files.files() {
                println!("{}", path.display());
            }
        }

        Commands::Validate { dir, json } => {
            let report = validate::validate_dir(&dir, &config.version)?;
            if report.validated.is_empty() && report.ignored.is_empty() {
                println!("No capsules found under {}. Nothing to validate.", dir.display());
            }
            if !report.ignored.is_empty() {
                println!("Ignored files:");
                for file in &report.ignored {
                    println!("  - {file}");
                }
                println!();
            }
            for file in &report.validated {
                let name = Path::new(&file.file)
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| file.file.clone());
                match file.status {
                    FileStatus::Ok => println!("[OK]  {name}"),
                    FileStatus::Error => {
                        println!("[ERR] {name}");
                        for message in &file.messages {
                            println!("      - {message}");
                        }
                    }
                }
            }

            println!("\nSummary:");
            println!("  validated: {}", report.validated.len());
            println!("  ignored:   {}", report.ignored.len());
            println!("  invalid:   {}", report.invalid_total);

            if let Some(path) = json {
                report.write_json(&path)?;
            }
            if !report.is_valid() {
                miette::bail!("{} capsule(s) failed validation", report.invalid_total);
            }
        }

        Commands::Dimacs {
            check: Some(path), ..
        } => {
            let text = std::fs::read_to_string(&path).into_diagnostic()?;
            let cnf = CnfFormula::parse(&text)?;
            println!(
                "{}: {} vars, {} clauses",
                path.display(),
                cnf.variable_count(),
                cnf.clause_count()
            );
            println!("sha256: {}", sha256_hex(cnf.text()));
            println!("certificate sha256: {}", certificate_sha256(cnf.text()));
        }

        Commands::Dimacs { motifs, check: None } => {
            let trail: Vec<&str> = motifs
                .split(',')
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .collect();
            let cnf = CnfFormula::from_motifs(&trail);
            print!("{cnf}");
            eprintln!("sha256: {}", sha256_hex(cnf.text()));
        }

        Commands::Tseitin {
            vertices,
            charged,
            out,
        } => {
            let charged: Option<Vec<usize>> = charged
                .map(|list| {
                    list.split(',')
                        .map(|v| v.trim().parse::<usize>())
                        .collect::<std::result::Result<Vec<_>, _>>()
                })
                .transpose()
                .into_diagnostic()?;
            let instance = TseitinInstance::new(vertices, charged.as_deref())?;
            instance.write_dimacs(&out)?;
            println!(
                "Wrote {} ({} vars, {} clauses)",
                out.display(),
                instance.formula.variable_count(),
                instance.formula.clause_count()
            );
            println!("certificate sha256: {}", instance.certificate_sha256());
        }

        Commands::Config => {
            let text = config.to_toml().map_err(|e| miette::miette!("{e}"))?;
            print!("{text}");
        }
    }

    Ok(())
}
