use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_SUBJECT: &str = "mailto:admin@example.com";

pub(crate) enum RunOutcome {
    Serve(notifyd::config::AppConfig),
    Exit(i32),
}

pub(crate) fn run() -> RunOutcome {
    let cli = Cli::parse();
    if let Some(Command::Init(args)) = cli.command {
        let code = run_init(args);
        return RunOutcome::Exit(code);
    }

    match resolve_config(cli) {
        Ok(config) => RunOutcome::Serve(config),
        Err(err) => {
            eprintln!("error: {err}");
            RunOutcome::Exit(2)
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "notifyd",
    version,
    about = "Toast queue and web push notification service"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
    #[arg(long, env = "NOTIFICATIONS_DB_PATH", default_value = "notifications.db")]
    database_path: PathBuf,
    #[arg(long, env = "NOTIFICATIONS_LISTEN", default_value = "127.0.0.1:8001")]
    listen: SocketAddr,
    #[arg(long, env = "NOTIFICATIONS_VAPID_PRIVATE_KEY")]
    vapid_private_key: Option<String>,
    #[arg(long, env = "NOTIFICATIONS_VAPID_PUBLIC_KEY")]
    vapid_public_key: Option<String>,
    #[arg(long, env = "NOTIFICATIONS_VAPID_EMAIL", default_value = DEFAULT_SUBJECT)]
    vapid_subject: String,
    #[arg(long, env = "NOTIFICATIONS_DEFAULT_ICON", default_value = "/assets/logo.png")]
    default_icon: String,
    /// Seconds the push service may hold an undelivered message.
    #[arg(long, env = "NOTIFICATIONS_PUSH_TTL", default_value_t = 3600)]
    push_ttl: u64,
    /// Seconds to wait for a single push service before giving up on it.
    #[arg(long, env = "NOTIFICATIONS_PUSH_TIMEOUT", default_value_t = 10)]
    push_timeout: u64,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a VAPID key pair and print it as environment variables.
    Init(InitArgs),
}

#[derive(Args, Debug)]
struct InitArgs {
    #[arg(long)]
    subject: Option<String>,
}

fn run_init(args: InitArgs) -> i32 {
    let credentials = match notifyd::generate_vapid_credentials() {
        Ok(credentials) => credentials,
        Err(err) => {
            eprintln!("failed to generate VAPID credentials: {err}");
            return 1;
        }
    };
    let (subject, show_subject_note) = match args.subject {
        Some(subject) => (subject, false),
        None => (DEFAULT_SUBJECT.to_string(), true),
    };

    println!("VAPID credentials generated.");
    println!();
    println!("NOTIFICATIONS_VAPID_PRIVATE_KEY=\"{}\"", credentials.private_key);
    println!("NOTIFICATIONS_VAPID_PUBLIC_KEY=\"{}\"", credentials.public_key);
    println!("NOTIFICATIONS_VAPID_EMAIL=\"{subject}\"");
    if show_subject_note {
        println!();
        println!("Note: replace NOTIFICATIONS_VAPID_EMAIL with a contact URI you control.");
    }
    0
}

fn resolve_config(cli: Cli) -> Result<notifyd::config::AppConfig, String> {
    if cli.vapid_subject.trim().is_empty() {
        return Err("VAPID subject cannot be empty".to_string());
    }
    if cli.push_timeout == 0 {
        return Err("push timeout must be greater than 0".to_string());
    }

    Ok(notifyd::config::AppConfig {
        database_path: cli.database_path,
        listen: cli.listen,
        vapid_private_key: cli.vapid_private_key,
        vapid_public_key: cli.vapid_public_key,
        vapid_subject: cli.vapid_subject.trim().to_string(),
        default_icon: cli.default_icon,
        push_ttl: Duration::from_secs(cli.push_ttl),
        push_timeout: Duration::from_secs(cli.push_timeout),
    })
}
