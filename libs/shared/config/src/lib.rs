use std::env;
use tracing::warn;

const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_service_role_key: String,
    pub port: u16,
    /// Check bookings against the doctor's declared weekly windows.
    pub enforce_availability: bool,
    /// Restrict status changes to the lifecycle adjacency table instead of
    /// accepting any target status.
    pub strict_status_transitions: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            supabase_url: String::new(),
            supabase_anon_key: String::new(),
            supabase_service_role_key: String::new(),
            port: DEFAULT_PORT,
            enforce_availability: false,
            strict_status_transitions: false,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            supabase_service_role_key: env::var("SUPABASE_SERVICE_ROLE_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_SERVICE_ROLE_KEY not set, falling back to anon key");
                    String::new()
                }),
            port: env::var("PORT")
                .ok()
                .and_then(|value| match value.parse() {
                    Ok(port) => Some(port),
                    Err(_) => {
                        warn!("PORT={} is not a valid port, using {}", value, DEFAULT_PORT);
                        None
                    }
                })
                .unwrap_or(DEFAULT_PORT),
            enforce_availability: env_flag("ENFORCE_AVAILABILITY"),
            strict_status_transitions: env_flag("STRICT_STATUS_TRANSITIONS"),
        };

        if !config.is_configured() {
            warn!("Supabase not configured - scheduling data will be kept in memory");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty() && !self.supabase_anon_key.is_empty()
    }

    /// Key used as bearer token for store calls.
    pub fn store_api_key(&self) -> &str {
        if self.supabase_service_role_key.is_empty() {
            &self.supabase_anon_key
        } else {
            &self.supabase_service_role_key
        }
    }
}

fn env_flag(name: &str) -> bool {
    match env::var(name) {
        Ok(value) => parse_flag(&value).unwrap_or_else(|| {
            warn!("{}={} is not a boolean, treating as false", name, value);
            false
        }),
        Err(_) => false,
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
