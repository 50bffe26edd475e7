//! Application configuration loaded from environment variables.
//!
//! Read once at startup and passed explicitly to every component; nothing
//! consults the environment afterwards.

use chrono::NaiveDate;
use std::env;

use crate::models::{ExerciseKinds, Office, RepWindow};
use crate::services::report::USER_KEY;
use crate::time_utils::{month_end, month_start, parse_day};

/// Domain used for the derived ingestion address.
pub const INGEST_DOMAIN: &str = "countmyreps.com";

/// How strictly the recipient must match the ingestion address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipientMatch {
    /// Case-insensitive equality with an accepted address
    Exact,
    /// Accepted address appears anywhere in the recipient
    Contains,
}

/// Which `RepStore` implementation to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Firestore,
    Memory,
}

/// Which `Notifier` implementation to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyMode {
    SendGrid,
    Off,
}

/// Settings for the ingestion pipeline.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Ordered kinds that subject tokens map onto
    pub kinds: ExerciseKinds,
    /// Current ingestion address
    pub address: String,
    /// Older addresses still accepted
    pub aliases: Vec<String>,
    pub recipient_match: RecipientMatch,
    /// Accept an office name as the subject
    pub office_assignment: bool,
}

impl IngestConfig {
    /// Every address a submission may be sent to.
    pub fn accepted_addresses(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.address.as_str()).chain(self.aliases.iter().map(String::as_str))
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// GCP project ID (Firestore)
    pub gcp_project_id: String,
    pub store_backend: StoreBackend,
    pub ingest: IngestConfig,
    /// Office roster with display names and headcounts
    pub offices: Vec<Office>,
    /// First day included in reports; the current month's first day if unset
    pub report_start: Option<NaiveDate>,
    /// Last day included in reports; the current month's last day if unset
    pub report_end: Option<NaiveDate>,
    pub notify: NotifyMode,
    /// SendGrid API key
    pub sendgrid_api_key: String,
    /// From address for outbound notices
    pub mail_from: String,
    /// Receives a copy of every rejection notice
    pub operator_email: String,
    /// Send a summary after each accepted submission
    pub success_emails: bool,
}

impl Config {
    /// Default config for testing only.
    pub fn test_default() -> Self {
        let kinds = ExerciseKinds::default();
        Self {
            port: 8080,
            gcp_project_id: "test-project".to_string(),
            store_backend: StoreBackend::Memory,
            ingest: IngestConfig {
                address: kinds.default_address(INGEST_DOMAIN),
                kinds,
                aliases: vec!["pullups-pushups-squats-situps@countmyreps.com".to_string()],
                recipient_match: RecipientMatch::Exact,
                office_assignment: true,
            },
            offices: vec![
                Office {
                    name: "OC".to_string(),
                    display_name: "Orange County".to_string(),
                    headcount: 40,
                },
                Office {
                    name: "Denver".to_string(),
                    display_name: "Denver".to_string(),
                    headcount: 0,
                },
            ],
            report_start: None,
            report_end: None,
            notify: NotifyMode::Off,
            sendgrid_api_key: String::new(),
            mail_from: "automailer@countmyreps.com".to_string(),
            operator_email: "operator@countmyreps.com".to_string(),
            success_emails: true,
        }
    }

    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let kinds = match env::var("EXERCISE_KINDS") {
            Ok(raw) => parse_kinds(&raw)?,
            Err(_) => ExerciseKinds::default(),
        };
        let address = env::var("INGEST_ADDRESS")
            .map(|v| v.trim().to_string())
            .unwrap_or_else(|_| kinds.default_address(INGEST_DOMAIN));
        let aliases = env::var("INGEST_ADDRESS_ALIASES")
            .map(|v| parse_list(&v))
            .unwrap_or_default();

        let recipient_match = match env::var("RECIPIENT_MATCH").as_deref() {
            Err(_) | Ok("exact") => RecipientMatch::Exact,
            Ok("contains") => RecipientMatch::Contains,
            Ok(_) => {
                return Err(ConfigError::Invalid {
                    var: "RECIPIENT_MATCH",
                    reason: "expected 'exact' or 'contains'".to_string(),
                })
            }
        };

        let store_backend = match env::var("STORE_BACKEND").as_deref() {
            Err(_) | Ok("firestore") => StoreBackend::Firestore,
            Ok("memory") => StoreBackend::Memory,
            Ok(_) => {
                return Err(ConfigError::Invalid {
                    var: "STORE_BACKEND",
                    reason: "expected 'firestore' or 'memory'".to_string(),
                })
            }
        };

        let notify = match env::var("NOTIFY").as_deref() {
            Err(_) | Ok("sendgrid") => NotifyMode::SendGrid,
            Ok("off") => NotifyMode::Off,
            Ok(_) => {
                return Err(ConfigError::Invalid {
                    var: "NOTIFY",
                    reason: "expected 'sendgrid' or 'off'".to_string(),
                })
            }
        };

        let sendgrid_api_key = match notify {
            NotifyMode::SendGrid => env::var("SENDGRID_API_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("SENDGRID_API_KEY"))?,
            NotifyMode::Off => String::new(),
        };

        let report_start = day_var("REPORT_START")?;
        let report_end = day_var("REPORT_END")?;
        if let (Some(start), Some(end)) = (report_start, report_end) {
            if end < start {
                return Err(ConfigError::Invalid {
                    var: "REPORT_END",
                    reason: "must not be before REPORT_START".to_string(),
                });
            }
        }

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            store_backend,
            ingest: IngestConfig {
                kinds,
                address,
                aliases,
                recipient_match,
                office_assignment: bool_var("OFFICE_ASSIGNMENT", true)?,
            },
            offices: match env::var("OFFICES") {
                Ok(raw) => parse_offices(&raw)?,
                Err(_) => Vec::new(),
            },
            report_start,
            report_end,
            notify,
            sendgrid_api_key,
            mail_from: env::var("MAIL_FROM")
                .unwrap_or_else(|_| "automailer@countmyreps.com".to_string()),
            operator_email: env::var("OPERATOR_EMAIL")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("OPERATOR_EMAIL"))?,
            success_emails: bool_var("SUCCESS_EMAILS", true)?,
        })
    }

    /// Reporting window as of `today`.
    ///
    /// Unset bounds follow the calendar: the month containing `today`, or
    /// the month of an explicit bound when only one is set.
    pub fn report_window(&self, today: NaiveDate) -> RepWindow {
        let anchor = self.report_end.map_or(today, |end| today.min(end));
        let start = self.report_start.unwrap_or_else(|| month_start(anchor));
        let end = self
            .report_end
            .unwrap_or_else(|| month_end(today.max(start)));
        RepWindow::new(start, end)
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse `EXERCISE_KINDS`, e.g. `pullups,pushups,airsquats,situps`.
pub fn parse_kinds(raw: &str) -> Result<ExerciseKinds, ConfigError> {
    let kinds = parse_list(raw);
    if kinds.is_empty() {
        return Err(ConfigError::Invalid {
            var: "EXERCISE_KINDS",
            reason: "at least one exercise kind is required".to_string(),
        });
    }
    Ok(ExerciseKinds::new(kinds))
}

/// Parse `OFFICES`, e.g. `OC:Orange County:55;Denver:Denver:20`.
pub fn parse_offices(raw: &str) -> Result<Vec<Office>, ConfigError> {
    let invalid = |reason: String| ConfigError::Invalid {
        var: "OFFICES",
        reason,
    };

    raw.split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let parts: Vec<&str> = entry.split(':').map(str::trim).collect();
            let [name, display_name, headcount] = parts.as_slice() else {
                return Err(invalid(format!(
                    "expected name:display name:headcount, got '{}'",
                    entry
                )));
            };
            if name.is_empty() {
                return Err(invalid(format!("empty office name in '{}'", entry)));
            }
            // Shares the feed's key space with the requesting user
            if name.eq_ignore_ascii_case(USER_KEY) {
                return Err(invalid(format!("office name '{}' is reserved", name)));
            }
            let headcount = headcount
                .parse()
                .map_err(|_| invalid(format!("bad headcount in '{}'", entry)))?;
            Ok(Office {
                name: name.to_string(),
                display_name: display_name.to_string(),
                headcount,
            })
        })
        .collect()
}

fn day_var(var: &'static str) -> Result<Option<NaiveDate>, ConfigError> {
    match env::var(var) {
        Ok(raw) => parse_day(&raw).map(Some).ok_or(ConfigError::Invalid {
            var,
            reason: "expected YYYY-MM-DD".to_string(),
        }),
        Err(_) => Ok(None),
    }
}

fn bool_var(var: &'static str, default: bool) -> Result<bool, ConfigError> {
    match env::var(var).as_deref().map(str::trim) {
        Err(_) => Ok(default),
        Ok("1") | Ok("true") | Ok("yes") => Ok(true),
        Ok("0") | Ok("false") | Ok("no") => Ok(false),
        Ok(_) => Err(ConfigError::Invalid {
            var,
            reason: "expected true or false".to_string(),
        }),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}
