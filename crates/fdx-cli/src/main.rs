//! 🚀 fdx-cli: the front door: load config, set up logging, call the library, print.
//!
//! 🎬 *[narrator voice]* "It all started with a simple main() function..."
//! Rows come out as NDJSON on stdout. Drive listings come out as tables. Logs go to stderr,
//! filtered by `RUST_LOG`, so piping `fdx rows contacts | jq` stays clean. 🦆

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table, presets::UTF8_FULL};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use fdx::{AppConfig, Browse, EndpointFamily, RowLimit, UploadOutcome};

/// fdx - paged record reads and a path-addressed drive over SaaS APIs
#[derive(Parser, Debug)]
#[command(name = "fdx")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TOML configuration file; skipped when it does not exist
    #[arg(long, short, global = true, default_value = "fdx.toml", env = "FDX_CONFIG")]
    config: PathBuf,

    /// Which provider profile to use (defaults: records for `rows`, files for the rest)
    #[arg(long, global = true, value_enum)]
    family: Option<FamilyArg>,

    #[command(subcommand)]
    command: Command,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum FamilyArg {
    Records,
    Files,
}

impl From<FamilyArg> for EndpointFamily {
    fn from(arg: FamilyArg) -> Self {
        match arg {
            FamilyArg::Records => EndpointFamily::Records,
            FamilyArg::Files => EndpointFamily::Files,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Stream a table as NDJSON
    Rows {
        table: String,
        /// Maximum rows to emit; -1 for all of them
        #[arg(long, default_value_t = -1, allow_hyphen_values = true)]
        limit: i64,
    },
    #[command(flatten)]
    Drive(DriveCommand),
}

/// 🗄️ Everything that talks to the drive facade.
#[derive(Subcommand, Debug)]
enum DriveCommand {
    /// Show size, type and modification time of a path
    Stat { path: String },
    /// List a folder's direct children
    Ls {
        #[arg(default_value = "/")]
        path: String,
    },
    /// Recursively list every file below a path
    Find {
        #[arg(default_value = "/")]
        path: String,
        #[arg(long)]
        first_non_empty: bool,
    },
    /// Move a file or folder to the trash
    Rm { path: String },
    /// Rename and/or move a file or folder
    Mv { from: String, to: String },
    /// Download a file
    Get {
        path: String,
        #[arg(long)]
        max_bytes: Option<usize>,
        /// Write here instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Upload a local file
    Put { local: PathBuf, remote: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    // 📡 Logs to stderr; stdout belongs to the data.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = run(cli).await;

    if let Err(err) = result {
        error!("💀 error: {}", err);
        // -- 🧅 peel the onion of sadness, one tear-jerking layer at a time
        let mut the_vibes_are_giving_connection_issues = false;
        for cause in err.chain().skip(1) {
            error!("⚠️  cause: {}", cause);
            let cause_str = cause.to_string();
            if cause_str.contains("produced no response")
                || cause_str.contains("error sending request")
                || cause_str.contains("Connection refused")
                || cause_str.contains("connection refused")
                || cause_str.contains("dns error")
            {
                the_vibes_are_giving_connection_issues = true;
            }
        }
        if the_vibes_are_giving_connection_issues {
            error!(
                "🔧 hint: the API isn't reachable. Check network access and the profile \
                 base_url in your config, or raise retry.max_retries if the link is flaky. ☕"
            );
        }
        std::process::exit(1);
    }

    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let config_file = existing_config_file(&cli.config)?;
    let app_config = fdx::load_config(config_file)
        .context("💀 In fdx-cli we couldn't load the config. Check the file and the FDX_* variables.")?;
    let family_override = cli.family.map(EndpointFamily::from);

    match cli.command {
        Command::Rows { table, limit } => {
            let family = pick_family(&app_config, family_override, EndpointFamily::Records);
            let client = app_config.client(family)?;
            let mut reader = app_config.rows(client, family, &table, RowLimit::from_sentinel(limit))?;
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            let mut count: u64 = 0;
            while let Some(row) = reader.next_row().await? {
                serde_json::to_writer(&mut out, &row).context("💀 Failed to write a row to stdout")?;
                writeln!(out)?;
                count += 1;
            }
            info!(
                "🏁 {} row(s) from '{}' in {} page(s)",
                count,
                table,
                reader.pages_fetched()
            );
        }
        Command::Drive(command) => run_drive(&app_config, family_override, command).await?,
    }
    Ok(())
}

async fn run_drive(
    app_config: &AppConfig,
    family_override: Option<EndpointFamily>,
    command: DriveCommand,
) -> Result<()> {
    let family = pick_family(app_config, family_override, EndpointFamily::Files);
    let client = app_config.client(family)?;
    let drive = app_config.drive(client, family)?;

    match command {
        DriveCommand::Stat { path } => match drive.stat(&path).await? {
            Some(stat) => {
                let mut table = new_table(vec!["path", "type", "size", "last modified (ms)"]);
                table.add_row(vec![
                    Cell::new(&stat.path),
                    Cell::new(if stat.is_directory { "folder" } else { "file" }),
                    Cell::new(stat.size).set_alignment(CellAlignment::Right),
                    Cell::new(display_millis(stat.last_modified)),
                ]);
                println!("{table}");
            }
            None => anyhow::bail!("🔍 '{}' does not exist", path),
        },
        DriveCommand::Ls { path } => match drive.browse(&path).await? {
            Browse::Missing => anyhow::bail!("🔍 '{}' does not exist", path),
            Browse::File {
                path,
                size,
                last_modified,
            } => {
                let mut table = new_table(vec!["path", "type", "size", "last modified (ms)"]);
                table.add_row(vec![
                    Cell::new(path),
                    Cell::new("file"),
                    Cell::new(size).set_alignment(CellAlignment::Right),
                    Cell::new(display_millis(last_modified)),
                ]);
                println!("{table}");
            }
            Browse::Folder { children, .. } => {
                let mut table = new_table(vec!["path", "type", "size", "last modified (ms)"]);
                for child in children {
                    table.add_row(vec![
                        Cell::new(child.full_path),
                        Cell::new(if child.is_directory { "folder" } else { "file" }),
                        Cell::new(child.size).set_alignment(CellAlignment::Right),
                        Cell::new(display_millis(child.last_modified)),
                    ]);
                }
                println!("{table}");
            }
        },
        DriveCommand::Find {
            path,
            first_non_empty,
        } => match drive.enumerate(&path, first_non_empty).await? {
            Some(entries) => {
                let mut table = new_table(vec!["path", "size", "last modified (ms)"]);
                for entry in entries {
                    table.add_row(vec![
                        Cell::new(entry.path),
                        Cell::new(entry.size).set_alignment(CellAlignment::Right),
                        Cell::new(display_millis(entry.last_modified)),
                    ]);
                }
                println!("{table}");
            }
            None => anyhow::bail!("🔍 '{}' does not exist", path),
        },
        DriveCommand::Rm { path } => {
            let files = drive.delete(&path).await?;
            println!("🗑️ trashed '{}' ({} file(s))", path, files);
        }
        DriveCommand::Mv { from, to } => {
            if !drive.move_item(&from, &to).await? {
                anyhow::bail!("🔍 '{}' does not exist, nothing moved", from);
            }
            println!("🚚 '{}' → '{}'", from, to);
        }
        DriveCommand::Get {
            path,
            max_bytes,
            output,
        } => {
            let bytes = drive.read(&path, max_bytes).await?;
            match output {
                Some(file) => {
                    tokio::fs::write(&file, &bytes)
                        .await
                        .with_context(|| format!("💀 Failed to write '{}'", file.display()))?;
                    info!("📥 {} byte(s) → {}", bytes.len(), file.display());
                }
                None => std::io::stdout().lock().write_all(&bytes)?,
            }
        }
        DriveCommand::Put { local, remote } => {
            let bytes = tokio::fs::read(&local)
                .await
                .with_context(|| format!("💀 Failed to read local file '{}'", local.display()))?;
            match drive.write(&remote, bytes).await? {
                UploadOutcome::Streamed { bytes } => {
                    println!("📤 '{}' uploaded in one request ({} bytes)", remote, bytes)
                }
                UploadOutcome::Committed {
                    upload_id,
                    chunks,
                    bytes,
                } => println!(
                    "📤 '{}' uploaded in {} chunk(s) ({} bytes, session {})",
                    remote, chunks, bytes, upload_id
                ),
            }
        }
    }
    Ok(())
}

/// 🔒 The file is optional; a missing one means "env vars only". An unreadable path is an error.
fn existing_config_file(config: &Path) -> Result<Option<&Path>> {
    let exists = config.try_exists().with_context(|| {
        format!(
            "💀 Couldn't check whether the configuration file exists. If it's a relative path, \
             try an absolute one. Was checking here: '{}'",
            config.display()
        )
    })?;
    Ok(exists.then_some(config))
}

fn pick_family(app_config: &AppConfig, cli: Option<EndpointFamily>, natural: EndpointFamily) -> EndpointFamily {
    cli.unwrap_or_else(|| app_config.family_or(natural))
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn display_millis(millis: Option<i64>) -> String {
    millis.map_or_else(|| "-".to_string(), |m| m.to_string())
}
