use clap::{Parser, Subcommand};
use gifpress::batch;
use gifpress::config::OptimizationConfig;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "gifpress")]
#[command(about = "Batch GIF optimizer with a target file size")]
#[command(long_about = "\
Batch GIF optimizer with a target file size

Point gifpress at a folder of GIF files and a target size. Each file is
decoded, scaled toward the target (square root of the size ratio, since
pixel count drives encoded size), re-encoded, and written next to the
originals:

  photos/
  ├── a.gif                        # inputs, processed in name order
  ├── b.GIF                        # extension match is case-insensitive
  └── optimized/
      ├── optimized_a.gif          # outputs
      ├── optimized_b.GIF
      └── originals/               # source backups (disable with --no-backup)

Animated GIFs keep their frame count, per-frame timing, and loop count.
A file that fails to decode or encode is recorded and skipped; the batch
always runs to completion. Only a bad configuration or an unusable folder
aborts the run, and only before any file is touched.

Per-file actions and the final summary are appended to the run log
(gifpress.log by default).")]
#[command(version)]
struct Cli {
    /// Run log file, appended one line per event
    #[arg(long, default_value = "gifpress.log", global = true)]
    log_file: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Optimize every GIF directly inside a folder
    Optimize(OptimizeArgs),
}

#[derive(clap::Args)]
struct OptimizeArgs {
    /// Folder containing the GIF files to optimize
    input_folder: PathBuf,

    /// Target file size in KB
    #[arg(long, value_name = "N")]
    target_size_kb: u32,

    /// Quantization effort (0-100)
    #[arg(long, short = 'q', default_value_t = 85)]
    quality: u8,

    /// Palette size per encoded image (1-256)
    #[arg(long, default_value_t = 256)]
    colors: u16,

    /// Use a local palette per frame instead of one shared global palette
    #[arg(long)]
    no_optimize: bool,

    /// Re-encode only the first frame of animated GIFs
    #[arg(long)]
    no_preserve_animation: bool,

    /// Skip copying originals into optimized/originals/
    #[arg(long)]
    no_backup: bool,

    /// Print the final statistics as JSON on stdout
    #[arg(long)]
    json: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Optimize(args) => {
            // Keep the log worker alive for the whole run.
            let _guard = init_logging(&cli.log_file, args.json);

            let config = OptimizationConfig {
                target_size_kb: args.target_size_kb,
                quality: args.quality,
                color_count: args.colors,
                optimize: !args.no_optimize,
                preserve_animation: !args.no_preserve_animation,
                backup_original: !args.no_backup,
                ..Default::default()
            };

            let quiet = args.json;
            let mut last_percent = None;
            let mut observer = move |percent: u8| {
                if !quiet && last_percent != Some(percent) {
                    println!("Progress: {percent:>3}%");
                    last_percent = Some(percent);
                }
            };

            let stats = batch::process_folder(&args.input_folder, &config, &mut observer)?;

            if args.json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            }
        }
    }

    Ok(())
}

/// Install the tracing subscriber: console output (unless the caller wants
/// clean JSON on stdout) plus the append-only run log file.
fn init_logging(log_file: &Path, quiet_console: bool) -> WorkerGuard {
    let dir = match log_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file_name = log_file
        .file_name()
        .unwrap_or_else(|| OsStr::new("gifpress.log"));
    std::fs::create_dir_all(dir).ok();
    let appender = tracing_appender::rolling::never(dir, file_name);
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    let console_layer = (!quiet_console).then(|| fmt::layer().with_target(false).compact());

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(console_layer)
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(file_writer),
        )
        .init();

    guard
}
