use chic_session::net::RequestBody;
use chic_session::{
    ActionError, ApiError, ConfigError, FileStorage, RequestOptions, SessionConfig, SessionController, SessionEvent,
    SessionPhase, ViewState,
};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tokio::sync::broadcast;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("http client setup failed: {0}")]
    Client(#[from] reqwest::Error),
    #[error("{0}")]
    Action(#[from] ActionError),
    #[error("{0}")]
    Api(#[from] ApiError),
    #[error("invalid HTTP method: {0}")]
    InvalidMethod(String),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("not signed in")]
    NotSignedIn,
}

#[derive(Parser, Debug)]
#[command(name = "chic", about = "Chic blog session CLI")]
struct Cli {
    /// Overrides `CHIC_BASE_URL`.
    #[arg(long)]
    base_url: Option<String>,

    /// Overrides `CHIC_TOKEN_PATH`.
    #[arg(long)]
    token_path: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and keep the token for later commands.
    Login {
        username: String,
        #[arg(long, env = "CHIC_PASSWORD")]
        password: String,
    },
    /// Create an account. Does not sign in.
    Register {
        email: String,
        username: String,
        #[arg(long, env = "CHIC_PASSWORD")]
        password: String,
    },
    /// Forget the stored token.
    Logout,
    /// Verify the stored token and print the signed-in user.
    Whoami,
    /// Send an authenticated request and print the response body.
    Request {
        method: String,
        path: String,
        #[arg(long)]
        data: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let mut config = SessionConfig::from_env()?;
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url.trim_end_matches('/').to_owned();
    }
    if let Some(path) = cli.token_path {
        config.token_path = Some(path);
    }

    let storage = FileStorage::new(config.require_token_path()?.clone());
    let controller = SessionController::from_config(&config, Box::new(storage))?;
    let mut events = controller.subscribe();
    let mut view = ViewState::new();

    let result = run(&controller, cli.command).await;
    render(&mut events, &mut view);
    result
}

async fn run(controller: &SessionController, command: Command) -> Result<(), CliError> {
    match command {
        Command::Login { username, password } => {
            controller.login(&username, &password).await?;
            Ok(())
        }
        Command::Register { email, username, password } => {
            controller.register(&email, &username, &password).await?;
            Ok(())
        }
        Command::Logout => {
            controller.logout();
            Ok(())
        }
        Command::Whoami => {
            if controller.verify().await != SessionPhase::Authenticated {
                return Err(CliError::NotSignedIn);
            }
            let user = controller.user().ok_or(CliError::NotSignedIn)?;
            print_json(&serde_json::to_value(user)?)
        }
        Command::Request { method, path, data } => run_request(controller, &method, &path, data.as_deref()).await,
    }
}

async fn run_request(
    controller: &SessionController,
    method: &str,
    path: &str,
    data: Option<&str>,
) -> Result<(), CliError> {
    let method = reqwest::Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .map_err(|_| CliError::InvalidMethod(method.to_owned()))?;
    let mut options = RequestOptions::method(method);
    if let Some(data) = data {
        options = options.body(RequestBody::Json(serde_json::from_str::<Value>(data)?));
    }

    let response = controller.request(path, options).await?;
    eprintln!("HTTP {}", response.status());
    match serde_json::from_str::<Value>(response.text()) {
        Ok(json) => print_json(&json)?,
        Err(_) if response.text().is_empty() => {}
        Err(_) => println!("{}", response.text()),
    }
    response.error_for_status()?;
    Ok(())
}

/// Apply whatever the controller emitted and show it on stderr.
fn render(events: &mut broadcast::Receiver<SessionEvent>, view: &mut ViewState) {
    while let Ok(event) = events.try_recv() {
        view.apply(&event);
    }
    for shown in &view.notifications {
        let n = &shown.notification;
        eprintln!("[{}] {}", n.severity, n.message);
    }
    if !view.login_username.is_empty() {
        eprintln!("next: chic login {} --password ...", view.login_username);
    }
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
