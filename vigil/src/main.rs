use anyhow::Result;
#[cfg(feature = "scan")]
use anyhow::anyhow;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
#[cfg(any(feature = "scan", feature = "status"))]
use std::sync::Arc;

#[cfg(any(feature = "scan", feature = "status"))]
use history_store::{HistoryStore, JsonFileStore};

mod config;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat { Text, Json }

#[cfg(feature = "scan")]
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum ScanKind { File, Hash, Url, Ip }

#[cfg(feature = "scan")]
impl From<ScanKind> for vigil_core::TargetKind {
    fn from(kind: ScanKind) -> Self {
        match kind {
            ScanKind::File => vigil_core::TargetKind::File,
            ScanKind::Hash => vigil_core::TargetKind::Hash,
            ScanKind::Url => vigil_core::TargetKind::Url,
            ScanKind::Ip => vigil_core::TargetKind::Ip,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "vigil", version, about = "Reputation scans, scan history, and secure delete")]
struct Cli {
    /// Optional config file (YAML). If omitted, loads ./vigil.yaml if present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print version information
    Version,
    /// Scan a file, hash, URL, or IP and record the verdict
    #[cfg(feature = "scan")]
    Scan {
        /// What the target is
        #[arg(value_enum)]
        kind: ScanKind,
        /// Hash, URL, or IP value (not used for file scans)
        target: Option<String>,
        /// File to upload when kind is file
        #[arg(long)]
        file: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        /// Also write the verdict as a JSON document into this directory
        #[arg(long)]
        export_dir: Option<PathBuf>,
        /// Data directory holding the local store (default: ./vigil-data)
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Store this API key before scanning
        #[arg(long)]
        api_key: Option<String>,
        /// Alternative API base URL
        #[arg(long)]
        base_url: Option<String>,
    },
    /// Save the analysis service API key
    #[cfg(any(feature = "scan", feature = "status"))]
    SetKey {
        key: String,
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Remove the stored API key
    #[cfg(any(feature = "scan", feature = "status"))]
    ClearKey {
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Show the device trust status derived from scan history
    #[cfg(feature = "status")]
    Status {
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// List or clear recorded scans
    #[cfg(feature = "status")]
    History {
        /// Delete all recorded scans
        #[arg(long)]
        clear: bool,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Delete a file, securely when a native eraser is available
    #[cfg(feature = "shred")]
    Shred {
        file: PathBuf,
        /// Overwrite passes for the native eraser
        #[arg(long, default_value_t = shred::DEFAULT_PASSES)]
        passes: u32,
        /// Sandbox directory fallback deletes are confined to
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
}

#[cfg(any(feature = "scan", feature = "status", feature = "shred"))]
fn resolve_data_dir(flag: Option<PathBuf>, cfg: &Option<config::Config>) -> PathBuf {
    flag.or_else(|| cfg.as_ref().and_then(|c| c.data_dir.clone()))
        .unwrap_or_else(|| PathBuf::from("vigil-data"))
}

#[cfg(any(feature = "scan", feature = "status"))]
fn open_store(data_dir: &std::path::Path) -> Result<Arc<HistoryStore>> {
    std::fs::create_dir_all(data_dir)?;
    let kv = JsonFileStore::open(data_dir.join("store.json"))?;
    Ok(Arc::new(HistoryStore::new(Arc::new(kv))))
}

#[cfg(feature = "scan")]
fn file_handle(path: &std::path::Path) -> Result<vigil_core::FileHandle> {
    let meta = std::fs::metadata(path)?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload.bin")
        .to_string();
    let mime_type = infer::get_from_path(path)
        .ok()
        .flatten()
        .map(|kind| kind.mime_type().to_string());
    Ok(vigil_core::FileHandle { path: path.to_path_buf(), name, size: Some(meta.len()), mime_type })
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    #[cfg(any(feature = "scan", feature = "status", feature = "shred"))]
    let loaded_cfg = config::load_config(cli.config.as_deref());
    #[cfg(not(any(feature = "scan", feature = "status", feature = "shred")))]
    let _loaded_cfg: Option<config::Config> = None;
    match cli.command {
        Commands::Version => {
            println!("vigil {} (core {})", env!("CARGO_PKG_VERSION"), vigil_core::version());
        }
        #[cfg(any(feature = "scan", feature = "status"))]
        Commands::SetKey { key, data_dir } => {
            let store = open_store(&resolve_data_dir(data_dir, &loaded_cfg))?;
            store.set_api_key(&key)?;
            println!("API key saved");
        }
        #[cfg(any(feature = "scan", feature = "status"))]
        Commands::ClearKey { data_dir } => {
            let store = open_store(&resolve_data_dir(data_dir, &loaded_cfg))?;
            store.clear_api_key()?;
            println!("API key cleared");
        }
        #[cfg(feature = "status")]
        Commands::Status { format, data_dir } => {
            let store = open_store(&resolve_data_dir(data_dir, &loaded_cfg))?;
            let entries = store.entries()?;
            let status = vigil_core::derive_status(&entries, time::OffsetDateTime::now_utc());
            match format {
                OutputFormat::Json => {
                    let obj = serde_json::json!({
                        "status": status,
                        "scans": entries.len(),
                        "last_scan": entries.first().map(|e| e.date.clone()),
                    });
                    println!("{}", serde_json::to_string(&obj)?);
                }
                OutputFormat::Text => {
                    println!("Device status: {status}");
                    match entries.first() {
                        Some(last) => println!("Last scan: {} ({})", last.date, last.target),
                        None => println!("Last scan: never"),
                    }
                    println!("Recorded scans: {}", entries.len());
                }
            }
        }
        #[cfg(feature = "status")]
        Commands::History { clear, format, data_dir } => {
            let store = open_store(&resolve_data_dir(data_dir, &loaded_cfg))?;
            if clear {
                store.clear()?;
                println!("Scan history cleared");
            } else {
                let entries = store.entries()?;
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
                    OutputFormat::Text => {
                        for e in entries {
                            println!(
                                "{}  {:<10}  {:<4}  {}  ({} malicious, {} suspicious)",
                                e.date, e.status, e.kind, e.target,
                                e.result.malicious, e.result.suspicious
                            );
                        }
                    }
                }
            }
        }
        #[cfg(feature = "scan")]
        Commands::Scan { kind, target, file, format, export_dir, data_dir, api_key, base_url } => {
            let store = open_store(&resolve_data_dir(data_dir, &loaded_cfg))?;
            let cfg_key = loaded_cfg.as_ref().and_then(|c| c.api_key.clone());
            if let Some(key) = api_key.or(cfg_key) {
                store.set_api_key(&key)?;
            }

            let mut engine = scanner::Scanner::new(store);
            let cfg_base = loaded_cfg.as_ref().and_then(|c| c.base_url.clone());
            if let Some(base) = base_url.or(cfg_base) {
                engine = engine.with_base_url(base);
            }

            let kind: vigil_core::TargetKind = kind.into();
            let scan_target = match kind {
                vigil_core::TargetKind::File => {
                    let path = file.ok_or_else(|| anyhow!("--file is required for file scans"))?;
                    classify::classify_file(file_handle(&path)?)?
                }
                _ => {
                    let raw = target.ok_or_else(|| anyhow!("a target value is required"))?;
                    classify::classify(kind, &raw)?
                }
            };

            let rt = tokio::runtime::Runtime::new()?;
            let outcome = rt.block_on(async {
                let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
                let printer = tokio::spawn(async move {
                    while let Some(event) = rx.recv().await {
                        if let intel::UploadEvent::Progress { percent } = event {
                            eprintln!("upload {percent}%");
                        }
                    }
                });
                let result = engine
                    .scan(scan_target, Some(tx), &vigil_core::CancelToken::new())
                    .await;
                let _ = printer.await;
                result
            })?;

            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcome.verdict)?),
                OutputFormat::Text => {
                    println!("Status: {}", outcome.verdict.status());
                    println!("Malicious: {}", outcome.verdict.stats.malicious);
                    println!("Suspicious: {}", outcome.verdict.stats.suspicious);
                    println!("Harmless: {}", outcome.verdict.stats.harmless);
                    println!("Undetected: {}", outcome.verdict.stats.undetected);
                    println!("Scan date: {}", outcome.verdict.scan_date);
                    if let Some(meta) = &outcome.verdict.file_meta {
                        if let Some(sha256) = &meta.sha256 {
                            println!("SHA-256: {sha256}");
                        }
                    }
                }
            }
            if let Err(e) = &outcome.recorded {
                eprintln!("warning: verdict not recorded in history: {e}");
            }
            let cfg_export = loaded_cfg.as_ref().and_then(|c| c.export_dir.clone());
            if let Some(dir) = export_dir.or(cfg_export) {
                let path = scanner::export::export_verdict(&dir, &outcome.verdict)?;
                println!("Exported to {}", path.display());
            }
        }
        #[cfg(feature = "shred")]
        Commands::Shred { file, passes, data_dir } => {
            let sandbox = resolve_data_dir(data_dir, &loaded_cfg);
            let shredder = shred::Shredder::new(&sandbox);
            let rt = tokio::runtime::Runtime::new()?;
            let outcome = rt.block_on(shredder.shred(&file, passes))?;
            match outcome {
                shred::ShredOutcome::SecureOverwrite { passes } => {
                    println!("Securely erased {} ({passes} passes)", file.display());
                }
                shred::ShredOutcome::FallbackDelete => {
                    println!("Deleted {} (no secure overwrite available)", file.display());
                }
            }
        }
    }
    Ok(())
}
