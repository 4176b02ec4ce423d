use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing_subscriber::EnvFilter;

use jpeg_target::batch::{BatchOutcome, Upload, process_uploads};
use jpeg_target::config;
use jpeg_target::config::compression::CompressionConfig;
use jpeg_target::store::ArchiveStore;

const USAGE: &str = "\
Usage: jpeg_target [OPTIONS] <input>...
       jpeg_target --fetch <TOKEN> --store <DIR> [--output <FILE>]

  Convert images, PDF pages and ZIP archives of either into JPEGs sized
  within the target range, packaged into one ZIP archive.

Options:
  --settings <FILE>    settings YAML (default: ./settings.yaml if present)
  -o, --output <FILE>  output archive path (default: settings master_name)
  --store <DIR>        also keep the archive in DIR under a token
  --fetch <TOKEN>      write a stored archive back out
  -h, --help           show this help
  -V, --version        show version";

#[derive(Debug, Default)]
struct CliArgs {
    settings: Option<PathBuf>,
    output: Option<PathBuf>,
    store: Option<PathBuf>,
    fetch: Option<String>,
    inputs: Vec<PathBuf>,
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.is_empty() || args.iter().any(|a| a == "--help" || a == "-h") {
        eprintln!("{USAGE}");
        return if args.is_empty() {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        };
    }

    if args.iter().any(|a| a == "--version" || a == "-V") {
        eprintln!("jpeg_target {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    init_tracing();

    let cli = match parse_args(&args) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("ERROR: {msg}");
            eprintln!("{USAGE}");
            return ExitCode::FAILURE;
        }
    };

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let mut settings = match config::load_settings(cli.settings.as_deref(), &cwd) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("ERROR: Failed to load settings: {e}");
            return ExitCode::FAILURE;
        }
    };
    let speed_env = std::env::var("SPEED_PRESET").ok();
    let threads_env = std::env::var("THREADS").ok();
    if let Err(e) = settings.apply_env_overrides(speed_env.as_deref(), threads_env.as_deref()) {
        eprintln!("ERROR: {e}");
        return ExitCode::FAILURE;
    }

    let output_path = cli
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(&settings.master_name));
    let store = cli
        .store
        .clone()
        .or_else(|| settings.store_dir.clone())
        .map(ArchiveStore::new);

    if let Some(token) = &cli.fetch {
        return fetch_archive(store.as_ref(), token, &output_path);
    }

    let compression = match CompressionConfig::try_from(&settings) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("ERROR: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut uploads = Vec::with_capacity(cli.inputs.len());
    for path in &cli.inputs {
        match std::fs::read(path) {
            Ok(data) => uploads.push(Upload {
                file_name: file_name_of(path),
                data,
            }),
            Err(e) => eprintln!("ERROR: Failed to read {}: {e}", path.display()),
        }
    }

    let loose_label = format!("compressed_pict_{}", unix_seconds());
    let outcome = match process_uploads(uploads, &loose_label, &compression, settings.threads) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("ERROR: {e}");
            return ExitCode::FAILURE;
        }
    };

    report(&outcome);

    if outcome.completed_jobs == 0 {
        eprintln!("No valid inputs found (need images/PDFs, or ZIP archives containing them).");
        return ExitCode::SUCCESS;
    }

    let archive = match outcome.to_archive() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("ERROR: Failed to build archive: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = std::fs::write(&output_path, &archive) {
        eprintln!("ERROR: Failed to write {}: {e}", output_path.display());
        return ExitCode::FAILURE;
    }
    eprintln!("OK: {} ({} bytes)", output_path.display(), archive.len());

    if let Some(store) = &store {
        match store.store(&archive, &outcome.summary_lines()) {
            Ok(token) => eprintln!("TOKEN: {token}"),
            Err(e) => {
                eprintln!("ERROR: Failed to store archive: {e}");
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn parse_args(args: &[String]) -> Result<CliArgs, String> {
    let mut cli = CliArgs::default();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        let mut value = |flag: &str| {
            iter.next()
                .cloned()
                .ok_or_else(|| format!("{flag} requires a value"))
        };
        match arg.as_str() {
            "--settings" => cli.settings = Some(PathBuf::from(value("--settings")?)),
            "--output" | "-o" => cli.output = Some(PathBuf::from(value("--output")?)),
            "--store" => cli.store = Some(PathBuf::from(value("--store")?)),
            "--fetch" => cli.fetch = Some(value("--fetch")?),
            flag if flag.starts_with("--") => return Err(format!("unknown option: {flag}")),
            input => cli.inputs.push(PathBuf::from(input)),
        }
    }

    if cli.fetch.is_none() && cli.inputs.is_empty() {
        return Err("no input files given".to_string());
    }
    Ok(cli)
}

fn fetch_archive(store: Option<&ArchiveStore>, token: &str, output_path: &Path) -> ExitCode {
    let Some(store) = store else {
        eprintln!("ERROR: --fetch requires --store <DIR> (or store_dir in settings)");
        return ExitCode::FAILURE;
    };
    match store.retrieve(token) {
        Ok(Some(stored)) => {
            if let Err(e) = std::fs::write(output_path, &stored.bytes) {
                eprintln!("ERROR: Failed to write {}: {e}", output_path.display());
                return ExitCode::FAILURE;
            }
            for line in &stored.metadata.summary {
                println!("{line}");
            }
            eprintln!("OK: {} ({} bytes)", output_path.display(), stored.bytes.len());
            ExitCode::SUCCESS
        }
        Ok(None) => {
            eprintln!("ERROR: Not found: {token}");
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("ERROR: {e}");
            ExitCode::FAILURE
        }
    }
}

fn report(outcome: &BatchOutcome) {
    for line in outcome.summary_lines() {
        println!("{line}");
    }
    for (label, lines) in &outcome.skipped {
        for line in lines {
            eprintln!("SKIPPED: {label}: {line}");
        }
    }
    for (label, lines) in &outcome.failures {
        for line in lines {
            eprintln!("ERROR: {label}: {line}");
        }
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn unix_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
