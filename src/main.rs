use std::process::ExitCode;

use teamforge::config::Settings;
use teamforge::models::{ErrorResponse, RawRecord};
use teamforge::FormationError;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const EXIT_FAILURE: u8 = 1;
const EXIT_INVALID_INPUT: u8 = 2;
const EXIT_INTERNAL: u8 = 70;

fn init_logging(settings: &Settings) {
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| settings.logging.level.clone());
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| settings.logging.format.clone());

    let filter = EnvFilter::try_new(&log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    // Logs go to stderr; stdout carries the teams
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true);

    match log_format.as_str() {
        "pretty" => subscriber.pretty().init(),
        "compact" => subscriber.compact().init(),
        _ => subscriber.init(),
    }
}

fn print_error(error: &str, message: String) {
    let body = ErrorResponse {
        error: error.to_string(),
        message,
    };
    match serde_json::to_string_pretty(&body) {
        Ok(json) => eprintln!("{}", json),
        Err(_) => eprintln!("{}: {}", body.error, body.message),
    }
}

fn main() -> ExitCode {
    // Load .env file if present
    dotenv::dotenv().ok();

    let loaded = match std::env::var("TEAMFORGE_CONFIG") {
        Ok(path) => Settings::load_from(path),
        Err(_) => Settings::load(),
    };
    let settings = match loaded {
        Ok(settings) => settings,
        Err(e) => {
            print_error("invalid_configuration", e.to_string());
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    init_logging(&settings);

    let Some(path) = std::env::args().nth(1) else {
        print_error("usage", "usage: teamforge <records.json>".to_string());
        return ExitCode::from(EXIT_FAILURE);
    };

    let contents = match std::fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(e) => {
            error!("Failed to read {}: {}", path, e);
            print_error("io_error", format!("{}: {}", path, e));
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    let records: Vec<RawRecord> = match serde_json::from_str(&contents) {
        Ok(records) => records,
        Err(e) => {
            print_error("invalid_json", format!("Invalid JSON: {}", e));
            return ExitCode::from(EXIT_INVALID_INPUT);
        }
    };

    info!("Loaded {} records from {}", records.len(), path);

    let matcher = settings.matching.matcher();
    info!(
        "Matcher initialized with weights: {:?}, duplicate policy: {:?}",
        matcher.weights(),
        matcher.options().duplicate_policy
    );

    match matcher.form_teams(&records) {
        Ok(formation) => match serde_json::to_string_pretty(&formation.to_response()) {
            Ok(json) => {
                println!("{}", json);
                ExitCode::SUCCESS
            }
            Err(e) => {
                print_error("serialization_error", e.to_string());
                ExitCode::from(EXIT_FAILURE)
            }
        },
        Err(e @ FormationError::Validation(_)) => {
            error!("Input rejected: {}", e);
            print_error("validation_failed", e.to_string());
            ExitCode::from(EXIT_INVALID_INPUT)
        }
        Err(e @ FormationError::Invariant(_)) => {
            error!("Team formation defect: {}", e);
            print_error("internal_error", e.to_string());
            ExitCode::from(EXIT_INTERNAL)
        }
    }
}
