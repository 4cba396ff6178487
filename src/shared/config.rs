//! Application configuration. Portal location, paths, reminder defaults, profile.

use crate::domain::Profile;
use serde::Deserialize;

/// Default minutes between a reminder and the start of its class.
pub const DEFAULT_LEAD_MINUTES: u32 = 10;

pub const DEFAULT_PORTAL_BASE_URL: &str = "https://timetable.sruniv.com";

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    /// Portal origin, without trailing slash. Read from TIMETABLE_SYNC_PORTAL_BASE_URL.
    #[serde(default)]
    pub portal_base_url: Option<String>,

    /// User-Agent sent to the portal. Read from TIMETABLE_SYNC_USER_AGENT.
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Per-request timeout in seconds (default 20). Read from TIMETABLE_SYNC_REQUEST_TIMEOUT_SECS.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    /// Directory for reminder state. Read from TIMETABLE_SYNC_DATA_DIR.
    #[serde(default)]
    pub data_dir: Option<String>,

    /// Listen address of the JSON API (`serve`). Read from TIMETABLE_SYNC_BIND_ADDR.
    #[serde(default)]
    pub bind_addr: Option<String>,

    /// Reminder lead time in minutes. Read from TIMETABLE_SYNC_LEAD_MINUTES.
    #[serde(default)]
    pub lead_minutes: Option<u32>,

    // ─────────────────────────────────────────────────────────────────────────
    // Profile (normally owned by the account store; env/file is the local fallback)
    // ─────────────────────────────────────────────────────────────────────────
    #[serde(default)]
    pub degree: Option<String>,

    #[serde(default)]
    pub year: Option<String>,

    #[serde(default)]
    pub batch: Option<String>,

    #[serde(default)]
    pub full_name: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();
        let mut c = config::Config::builder();
        c = c.add_source(config::Environment::with_prefix("TIMETABLE_SYNC"));
        if let Ok(path) = std::env::var("TIMETABLE_SYNC_CONFIG") {
            c = c.add_source(config::File::with_name(&path));
        }
        c.build()?.try_deserialize()
    }

    /// Returns the portal origin without trailing slash.
    pub fn portal_base_url_or_default(&self) -> String {
        self.portal_base_url
            .as_deref()
            .unwrap_or(DEFAULT_PORTAL_BASE_URL)
            .trim_end_matches('/')
            .to_string()
    }

    pub fn user_agent_or_default(&self) -> String {
        self.user_agent
            .clone()
            .unwrap_or_else(|| "Mozilla/5.0".to_string())
    }

    pub fn request_timeout_secs_or_default(&self) -> u64 {
        self.request_timeout_secs.unwrap_or(20)
    }

    pub fn data_dir_or_default(&self) -> String {
        self.data_dir.clone().unwrap_or_else(|| "./data".to_string())
    }

    pub fn bind_addr_or_default(&self) -> String {
        self.bind_addr
            .clone()
            .unwrap_or_else(|| "127.0.0.1:8080".to_string())
    }

    pub fn lead_minutes_or_default(&self) -> u32 {
        self.lead_minutes.unwrap_or(DEFAULT_LEAD_MINUTES)
    }

    /// Profile assembled from config. May be incomplete; callers check `is_complete`.
    pub fn profile(&self) -> Profile {
        Profile {
            degree: self.degree.clone().unwrap_or_default(),
            year: self.year.clone().unwrap_or_default(),
            batch: self.batch.clone().unwrap_or_default(),
            full_name: self.full_name.clone().filter(|n| !n.trim().is_empty()),
        }
    }
}

/// Upstream paths. The portal is undocumented; these are the endpoints observed to work,
/// listed in the order they are tried.
#[derive(Debug, Clone)]
pub struct PortalEndpoints {
    /// Page that hands out the session cookie and CSRF token.
    pub session_page: String,
    /// GET `?degree=` returning every batch record of a degree.
    pub years_by_degree: String,
    /// POST fallbacks for years (form: `_token`, `degree`).
    pub years_post: Vec<String>,
    /// POST candidates for batches (form: `_token`, `degree`, `year`).
    pub batches_post: Vec<String>,
    /// GET `?degree=&year=` for batches.
    pub batches_by_year: String,
    /// POST search (form: `_token`, `degree`, `year`, `batch`).
    pub search: String,
}

impl Default for PortalEndpoints {
    fn default() -> Self {
        Self {
            session_page: "/batchReport".to_string(),
            years_by_degree: "/get-yearbpublic".to_string(),
            years_post: vec![
                "/getYearByDegreePublic".to_string(),
                "/get-yearbpublic".to_string(),
            ],
            batches_post: vec![
                "/getBatchByYearPublic".to_string(),
                "/get-batchbpublic".to_string(),
            ],
            batches_by_year: "/get-batchbpublic".to_string(),
            search: "/searchBatchReport2Public".to_string(),
        }
    }
}

/// Everything the portal client needs to talk to upstream.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    pub base_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub endpoints: PortalEndpoints,
}

impl PortalConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            user_agent: "Mozilla/5.0".to_string(),
            timeout_secs: 20,
            endpoints: PortalEndpoints::default(),
        }
    }
}

impl From<&AppConfig> for PortalConfig {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            base_url: cfg.portal_base_url_or_default(),
            user_agent: cfg.user_agent_or_default(),
            timeout_secs: cfg.request_timeout_secs_or_default(),
            endpoints: PortalEndpoints::default(),
        }
    }
}
