use std::fmt;
use std::path::{Path, PathBuf};

use clap::Parser;
use services::{AppServices, Clock};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use trener_core::model::UserId;

mod cli;
mod commands;
mod config;
mod format;

use cli::{Cli, Commands, PlanCommand, UserArg};
use config::Config;

#[derive(Debug)]
enum ArgsError {
    MissingUser,
    InvalidUser { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingUser => write!(
                f,
                "no user given: pass --user, set {} or user_id in the config file",
                config::ENV_USER_ID
            ),
            ArgsError::InvalidUser { raw } => write!(f, "invalid --user value: {raw:?}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn resolve_user(arg: &UserArg, config: &Config) -> Result<UserId, ArgsError> {
    let raw = config
        .user_id(arg.user.as_deref())
        .ok_or(ArgsError::MissingUser)?;
    UserId::new(raw.as_str()).map_err(|_| ArgsError::InvalidUser { raw })
}

fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

const MEMORY_URL: &str = "sqlite::memory:";

/// Turn a `--db` value or config entry into an absolute `sqlite://` URL.
///
/// Plain paths, `sqlite:` paths and `~/` paths are accepted; new database
/// files are created on first open (`mode=rwc`). Full `sqlite://` URLs pass
/// through untouched.
fn normalize_sqlite_url(raw: &str) -> Result<String, ArgsError> {
    let raw = raw.trim();
    let invalid = || ArgsError::InvalidDbUrl {
        raw: raw.to_owned(),
    };
    if raw == MEMORY_URL || raw.starts_with("sqlite://") {
        return Ok(raw.to_owned());
    }

    let path = raw.strip_prefix("sqlite:").unwrap_or(raw);
    if path.is_empty() {
        return Err(invalid());
    }
    let path = match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir().ok_or_else(invalid)?.join(rest),
        None => PathBuf::from(path),
    };
    let absolute = std::path::absolute(&path).map_err(|_| invalid())?;
    Ok(format!("sqlite://{}?mode=rwc", absolute.display()))
}

/// Create the directory a file-backed database lives in.
fn ensure_database_dir(db_url: &str) -> std::io::Result<()> {
    let Some(rest) = db_url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    let file = rest.split('?').next().unwrap_or(rest);
    match Path::new(file).parent() {
        Some(dir) if !dir.as_os_str().is_empty() => std::fs::create_dir_all(dir),
        _ => Ok(()),
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?.with_env(|key| std::env::var(key).ok());
    init_tracing(&config.log_filter(cli.log.as_deref(), std::env::var("RUST_LOG").ok()));

    let db_url = normalize_sqlite_url(&config.db_url(cli.db.as_deref()))?;
    // Services and storage never touch the filesystem themselves.
    ensure_database_dir(&db_url)?;
    let services = AppServices::new_sqlite(&db_url, Clock::default()).await?;
    tracing::debug!(db = %db_url, "storage ready");

    match cli.cmd {
        Commands::Run(args) => {
            let user_id = resolve_user(&args.user, &config)?;
            let plan = commands::run::resolve_plan(&services, &user_id, &args).await?;
            commands::run::run(&services, user_id, plan).await
        }
        Commands::History { user, limit } => {
            let user_id = resolve_user(&user, &config)?;
            commands::report::history(&services, &user_id, limit).await
        }
        Commands::Stats { user } => {
            let user_id = resolve_user(&user, &config)?;
            commands::report::stats(&services, &user_id).await
        }
        Commands::Show { id } => commands::report::show(&services, id).await,
        Commands::Plan(PlanCommand::Add(args)) => {
            let user_id = resolve_user(&args.user, &config)?;
            commands::plan::add(&services, user_id, args).await
        }
        Commands::Plan(PlanCommand::List { user }) => {
            let user_id = resolve_user(&user, &config)?;
            commands::plan::list(&services, &user_id).await
        }
        Commands::Plan(PlanCommand::Remove { user, plan_name }) => {
            let user_id = resolve_user(&user, &config)?;
            commands::plan::remove(&services, &user_id, &plan_name).await
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        // Binary glue: report once and exit non-zero.
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_paths_become_absolute_urls() {
        let url = normalize_sqlite_url("sqlite:data/trener.sqlite3").unwrap();
        assert!(url.starts_with("sqlite:///") || url.starts_with("sqlite://"));
        assert!(url.ends_with("data/trener.sqlite3?mode=rwc"));

        let plain = normalize_sqlite_url(" data/trener.sqlite3 ").unwrap();
        assert_eq!(plain, url);
    }

    #[test]
    fn memory_and_full_urls_pass_through() {
        assert_eq!(normalize_sqlite_url(MEMORY_URL).unwrap(), MEMORY_URL);
        assert_eq!(
            normalize_sqlite_url("sqlite:///tmp/t.db").unwrap(),
            "sqlite:///tmp/t.db"
        );
    }

    #[test]
    fn empty_database_path_is_rejected() {
        assert!(matches!(
            normalize_sqlite_url("sqlite:"),
            Err(ArgsError::InvalidDbUrl { .. })
        ));
        assert!(normalize_sqlite_url("  ").is_err());
    }

    #[test]
    fn database_dir_is_created() {
        let dir = std::env::temp_dir().join(format!("trener-dir-{}", std::process::id()));
        let url = format!("sqlite://{}?mode=rwc", dir.join("db.sqlite3").display());
        ensure_database_dir(&url).unwrap();
        assert!(dir.is_dir());
        std::fs::remove_dir_all(&dir).unwrap();
        ensure_database_dir(MEMORY_URL).unwrap();
    }

    #[test]
    fn user_comes_from_flag_then_config() {
        let config = Config {
            user_id: Some("from-config".into()),
            ..Config::default()
        };
        let flag = UserArg {
            user: Some("from-flag".into()),
        };
        assert_eq!(resolve_user(&flag, &config).unwrap().as_str(), "from-flag");
        let none = UserArg { user: None };
        assert_eq!(resolve_user(&none, &config).unwrap().as_str(), "from-config");
        assert!(matches!(
            resolve_user(&none, &Config::default()),
            Err(ArgsError::MissingUser)
        ));
        let blank = UserArg {
            user: Some("  ".into()),
        };
        assert!(matches!(
            resolve_user(&blank, &config),
            Err(ArgsError::InvalidUser { .. })
        ));
    }
}
