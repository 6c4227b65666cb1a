use std::net::IpAddr;

use chrono::{DateTime, NaiveDateTime, TimeZone};
use chrono_tz::Tz;

#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub session_secret: String,
    pub host: IpAddr,
    pub port: u16,
    pub max_body_size: usize,
    pub log_level: String,
    pub intake: IntakeConfig,
    pub storage: StorageConfig,
    pub smtp: SmtpConfig,
    pub admin: AdminConfig,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub service_url: Option<String>,
}

impl DatabaseConfig {
    /// The privileged connection string wins when configured so admin
    /// listing is not filtered by row-level policies.
    pub fn effective_url(&self) -> &str {
        self.service_url.as_deref().unwrap_or(&self.url)
    }
}

#[derive(Debug, Clone)]
pub struct IntakeConfig {
    pub timezone: Tz,
    pub org_deadline: Option<DateTime<Tz>>,
    pub student_deadline: Option<DateTime<Tz>>,
    pub poster_deadline: Option<DateTime<Tz>>,
    pub cc_email: String,
    pub signed_url_ttl_secs: u64,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub url: String,
    pub anon_key: String,
    pub service_key: Option<String>,
    pub grants_bucket: String,
    pub posters_bucket: String,
}

impl StorageConfig {
    pub fn api_key(&self) -> &str {
        self.service_key.as_deref().unwrap_or(&self.anon_key)
    }
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: Option<String>,
    pub pass: Option<String>,
    pub from: Option<String>,
    pub from_name: String,
}

impl SmtpConfig {
    /// Credential, secret and from-address must all be non-empty before a
    /// send is attempted.
    pub fn is_complete(&self) -> bool {
        [&self.user, &self.pass, &self.from]
            .iter()
            .all(|v| v.as_deref().is_some_and(|s| !s.trim().is_empty()))
    }
}

#[derive(Debug, Clone)]
pub struct AdminConfig {
    pub credential: Option<AdminCredential>,
    pub session_minutes: i64,
}

#[derive(Debug, Clone)]
pub enum AdminCredential {
    Plain(String),
    Hash(String),
}

pub const DEFAULT_TIMEZONE: &str = "America/New_York";
pub const DEFAULT_ORG_DEADLINE: &str = "2025-10-17 16:59";
pub const DEFAULT_STUDENT_DEADLINE: &str = "2025-10-19 23:59";
pub const SIGNED_URL_TTL_SECS: u64 = 60 * 60 * 24 * 7;
pub const MAX_SESSION_MINUTES: i64 = 60 * 24 * 7;

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database = DatabaseConfig {
            url: env_required("DATABASE_URL")?,
            service_url: env_optional("DATABASE_SERVICE_URL"),
        };
        let session_secret = env_required("GRANTDESK_SESSION_SECRET")?;

        let host: IpAddr = env_or("GRANTDESK_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid GRANTDESK_HOST: {e}"))?;

        let port: u16 = env_or("GRANTDESK_PORT", "3000")
            .parse()
            .map_err(|e| format!("Invalid GRANTDESK_PORT: {e}"))?;

        let max_body_size: usize = env_or("GRANTDESK_MAX_BODY_SIZE", "26214400")
            .parse()
            .map_err(|e| format!("Invalid GRANTDESK_MAX_BODY_SIZE: {e}"))?;

        let log_level = env_or("GRANTDESK_LOG_LEVEL", "info");

        let timezone: Tz = env_or("GRANTDESK_TIMEZONE", DEFAULT_TIMEZONE)
            .parse()
            .map_err(|e| format!("Invalid GRANTDESK_TIMEZONE: {e}"))?;

        let intake = IntakeConfig {
            timezone,
            org_deadline: Some(parse_deadline(
                &env_or("GRANTDESK_ORG_DEADLINE", DEFAULT_ORG_DEADLINE),
                timezone,
            )?),
            student_deadline: Some(parse_deadline(
                &env_or("GRANTDESK_STUDENT_DEADLINE", DEFAULT_STUDENT_DEADLINE),
                timezone,
            )?),
            poster_deadline: env_optional("GRANTDESK_POSTER_DEADLINE")
                .map(|s| parse_deadline(&s, timezone))
                .transpose()?,
            cc_email: env_or("GRANTDESK_CC_EMAIL", "nhcma@lutinemanagement.com"),
            signed_url_ttl_secs: SIGNED_URL_TTL_SECS,
        };

        let storage = StorageConfig {
            url: env_required("GRANTDESK_STORAGE_URL")?,
            anon_key: env_required("GRANTDESK_STORAGE_ANON_KEY")?,
            service_key: env_optional("GRANTDESK_STORAGE_SERVICE_KEY"),
            grants_bucket: env_or("GRANTDESK_GRANTS_BUCKET", "nhcma-uploads"),
            posters_bucket: env_or("GRANTDESK_POSTERS_BUCKET", "nhcma-posters"),
        };

        let user = env_optional("GRANTDESK_SMTP_USER");
        let smtp = SmtpConfig {
            host: env_or("GRANTDESK_SMTP_HOST", "smtp.office365.com"),
            port: env_or("GRANTDESK_SMTP_PORT", "587")
                .parse()
                .map_err(|e| format!("Invalid GRANTDESK_SMTP_PORT: {e}"))?,
            pass: env_optional("GRANTDESK_SMTP_PASS"),
            from: env_optional("GRANTDESK_SMTP_FROM").or_else(|| user.clone()),
            user,
            from_name: env_or("GRANTDESK_SMTP_FROM_NAME", "NHCMA Foundation"),
        };

        let credential = match (
            env_optional("GRANTDESK_ADMIN_PASSWORD_HASH"),
            env_optional("GRANTDESK_ADMIN_PASSWORD"),
        ) {
            (Some(hash), _) => Some(AdminCredential::Hash(hash)),
            (None, Some(plain)) => Some(AdminCredential::Plain(plain)),
            (None, None) => None,
        };
        let admin = AdminConfig {
            credential,
            session_minutes: parse_session_minutes(&env_or("GRANTDESK_ADMIN_SESSION_MINUTES", "60"))
                .map_err(|e| format!("Invalid GRANTDESK_ADMIN_SESSION_MINUTES: {e}"))?,
        };

        Ok(Config {
            database,
            session_secret,
            host,
            port,
            max_body_size,
            log_level,
            intake,
            storage,
            smtp,
            admin,
        })
    }
}

/// Admin session length in minutes, from one minute up to one week.
pub fn parse_session_minutes(value: &str) -> Result<i64, String> {
    let minutes: i64 = value.trim().parse().map_err(|e| format!("{e}"))?;
    if !(1..=MAX_SESSION_MINUTES).contains(&minutes) {
        return Err(format!("{minutes} is outside 1..={MAX_SESSION_MINUTES}"));
    }
    Ok(minutes)
}

/// Accepts `YYYY-MM-DD HH:MM` (wall clock in `tz`) or RFC 3339.
pub fn parse_deadline(value: &str, tz: Tz) -> Result<DateTime<Tz>, String> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&tz));
    }

    let naive = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M")
        .map_err(|e| format!("Invalid deadline '{value}': {e}"))?;

    tz.from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| format!("Deadline '{value}' does not exist in {tz}"))
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_optional(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
