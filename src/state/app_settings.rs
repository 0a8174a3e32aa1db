use crate::state::session::default_session_path;
use clap::Parser;
use log::LevelFilter;
use std::path::PathBuf;
use std::time::Duration;
use tennis_api::MatchStatus;
use tennis_api::client::{DEFAULT_BASE_URL, ScoreMethod};

#[derive(Parser, Debug)]
#[command(name = "tennis-hub")]
#[command(about = "Terminal client for the Tennis Hub tournament platform")]
#[command(version)]
#[command(long_about = r#"
Tennis Hub in the terminal: team, referee and admin dashboards, tournament
rosters, match entry and rankings.

ENVIRONMENT VARIABLES:
  TENNIS_HUB_API_URL       Base URL of the API server
  TENNIS_HUB_TIMEOUT_SECS  Per-request timeout in seconds
  TENNIS_HUB_LOG           Log level shown in the log pane
  TENNIS_HUB_MATCH_STATUS  Status given to newly recorded matches
  TENNIS_HUB_SCORE_METHOD  HTTP method for referee score updates
  TENNIS_HUB_SESSION_FILE  Where the login session is kept
"#)]
pub struct Cli {
    /// Base URL of the API server
    #[arg(long, env = "TENNIS_HUB_API_URL", default_value = DEFAULT_BASE_URL)]
    pub api_url: String,

    /// Per-request timeout in seconds
    #[arg(long, env = "TENNIS_HUB_TIMEOUT_SECS", default_value_t = 10)]
    pub timeout_secs: u64,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, env = "TENNIS_HUB_LOG", default_value = "error")]
    pub log_level: LevelFilter,

    /// Status of newly recorded matches (scheduled, in_progress, completed)
    #[arg(long, env = "TENNIS_HUB_MATCH_STATUS", default_value = "completed", value_parser = parse_match_status)]
    pub match_status: MatchStatus,

    /// HTTP method for referee score updates (post, put)
    #[arg(long, env = "TENNIS_HUB_SCORE_METHOD", default_value = "post", value_parser = parse_score_method)]
    pub referee_score_method: ScoreMethod,

    /// Session file (default: $XDG_CONFIG_HOME/tennis-hub/session.json)
    #[arg(long, env = "TENNIS_HUB_SESSION_FILE")]
    pub session_file: Option<PathBuf>,

    /// Start without the tab bar
    #[arg(long)]
    pub full_screen: bool,
}

#[derive(Debug, Clone)]
pub struct AppSettings {
    pub api_url: String,
    pub timeout: Duration,
    pub log_level: LevelFilter,
    pub match_status: MatchStatus,
    pub score_method: ScoreMethod,
    pub session_file: PathBuf,
    pub full_screen: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
            log_level: LevelFilter::Error,
            match_status: MatchStatus::Completed,
            score_method: ScoreMethod::Post,
            session_file: default_session_path(),
            full_screen: false,
        }
    }
}

impl AppSettings {
    pub fn from_cli(cli: Cli) -> Self {
        Self {
            api_url: cli.api_url,
            timeout: Duration::from_secs(cli.timeout_secs.max(1)),
            log_level: cli.log_level,
            match_status: cli.match_status,
            score_method: cli.referee_score_method,
            session_file: cli.session_file.unwrap_or_else(default_session_path),
            full_screen: cli.full_screen,
        }
    }
}

fn parse_match_status(raw: &str) -> Result<MatchStatus, String> {
    MatchStatus::parse(raw)
        .ok_or_else(|| format!("unknown match status '{raw}' (scheduled, in_progress, completed)"))
}

fn parse_score_method(raw: &str) -> Result<ScoreMethod, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "post" => Ok(ScoreMethod::Post),
        "put" => Ok(ScoreMethod::Put),
        other => Err(format!("unknown method '{other}' (post, put)")),
    }
}
