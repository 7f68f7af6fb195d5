use anyhow::{Context, Result};
use kboard::{
    config::Config,
    logging,
    store::{BoardStore, Database, MemoryStorage},
    tui,
};
use std::path::PathBuf;

const USAGE: &str = "\
Usage: kboard [--db <path>] [--memory]

  --db <path>   Store the board in this SQLite file
  --memory      Keep the board in memory only; nothing is saved
  -h, --help    Show this help
";

/// Where the board lives for this run
#[derive(Debug, PartialEq)]
enum StorageChoice {
    Configured,
    File(PathBuf),
    Memory,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(choice) = parse_args(&args)? else {
        print!("{}", USAGE);
        return Ok(());
    };

    let (config, config_error) = config_or_default(Config::load());

    // Keep the guard alive so buffered log lines are flushed on exit
    let log_dir = Config::data_dir().map(|dir| dir.join("logs"));
    let _log_guard = match log_dir.and_then(|dir| logging::init_logging(&config.log, &dir)) {
        Ok(guard) => Some(guard),
        Err(err) => {
            eprintln!("kboard: logging disabled: {:#}", err);
            None
        }
    };
    if let Some(err) = config_error {
        tracing::warn!(error = %err, "config unreadable, using defaults");
    }

    let (store, title) = match choice {
        StorageChoice::Memory => (
            BoardStore::new(Box::new(MemoryStorage::new())),
            "in memory".to_string(),
        ),
        StorageChoice::File(path) => open_store(path)?,
        StorageChoice::Configured => open_store(config.database_path()?)?,
    };

    // Initialize and run the app
    let mut app = tui::App::new(store, &config, title)?;
    app.run().await?;

    Ok(())
}

fn open_store(path: PathBuf) -> Result<(BoardStore, String)> {
    let db = Database::open(&path)
        .with_context(|| format!("Failed to open database at {:?}", path))?;
    Ok((BoardStore::new(Box::new(db)), path.display().to_string()))
}

/// Fall back to the default config, keeping the reason for later reporting
fn config_or_default(loaded: Result<Config>) -> (Config, Option<String>) {
    match loaded {
        Ok(config) => (config, None),
        Err(err) => (Config::default(), Some(format!("{:#}", err))),
    }
}

/// `Ok(None)` means help was requested
fn parse_args(args: &[String]) -> Result<Option<StorageChoice>> {
    let mut choice = StorageChoice::Configured;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(None),
            "--memory" => choice = StorageChoice::Memory,
            "--db" => {
                let path = iter.next().context("--db needs a path")?;
                choice = StorageChoice::File(PathBuf::from(path));
            }
            other => anyhow::bail!("Unknown argument '{}'\n\n{}", other, USAGE),
        }
    }
    Ok(Some(choice))
}
