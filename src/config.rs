//! Application configuration loaded from environment variables.
//!
//! Every service role reads the same variables; each role only looks at the
//! ones it needs.

use std::env;
use std::str::FromStr;

/// Default exchange activity events are published to.
pub const DEFAULT_EXCHANGE: &str = "fitness.exchange";
/// Default routing key for activity events.
pub const DEFAULT_ROUTING_KEY: &str = "activity.tracking";
/// Default queue the recommendation listener consumes.
pub const DEFAULT_QUEUE: &str = "activity.queue";

/// Which service(s) this process runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceRole {
    /// Users, activities and recommendations in one process.
    All,
    Users,
    Activities,
    Recommendations,
    Gateway,
}

impl FromStr for ServiceRole {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(ServiceRole::All),
            "users" | "userservice" => Ok(ServiceRole::Users),
            "activities" | "activityservice" => Ok(ServiceRole::Activities),
            "recommendations" | "aiservice" => Ok(ServiceRole::Recommendations),
            "gateway" => Ok(ServiceRole::Gateway),
            _ => Err(ConfigError::Invalid("SERVICE_ROLE", s.to_string())),
        }
    }
}

impl ServiceRole {
    pub fn serves_users(self) -> bool {
        matches!(self, ServiceRole::All | ServiceRole::Users)
    }

    pub fn serves_activities(self) -> bool {
        matches!(self, ServiceRole::All | ServiceRole::Activities)
    }

    pub fn serves_recommendations(self) -> bool {
        matches!(self, ServiceRole::All | ServiceRole::Recommendations)
    }
}

/// Where records are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Firestore,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "firestore" => Ok(StoreBackend::Firestore),
            _ => Err(ConfigError::Invalid("STORE_BACKEND", s.to_string())),
        }
    }
}

/// Transport behind the event channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventBackend {
    InProcess,
    Kafka,
}

impl FromStr for EventBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "in-process" | "inprocess" | "memory" => Ok(EventBackend::InProcess),
            "kafka" => Ok(EventBackend::Kafka),
            _ => Err(ConfigError::Invalid("EVENT_BACKEND", s.to_string())),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub role: ServiceRole,
    /// Server port
    pub port: u16,
    /// Frontend URL allowed by CORS
    pub frontend_url: String,

    // --- Persistence ---
    pub store_backend: StoreBackend,
    /// GCP project ID (Firestore backend)
    pub gcp_project_id: String,

    // --- Downstream services ---
    pub user_service_url: String,
    pub activity_service_url: String,
    pub recommendation_service_url: String,

    // --- Messaging ---
    pub event_backend: EventBackend,
    pub exchange: String,
    pub routing_key: String,
    pub queue: String,
    /// Kafka bootstrap servers (Kafka backend)
    pub kafka_brokers: String,

    // --- Secrets ---
    /// JWT verification key for the gateway (raw bytes)
    pub jwt_signing_key: Vec<u8>,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            role: ServiceRole::All,
            port: 8080,
            frontend_url: "http://localhost:5173".to_string(),
            store_backend: StoreBackend::Memory,
            gcp_project_id: "test-project".to_string(),
            user_service_url: "http://localhost:8081".to_string(),
            activity_service_url: "http://localhost:8082".to_string(),
            recommendation_service_url: "http://localhost:8083".to_string(),
            event_backend: EventBackend::InProcess,
            exchange: DEFAULT_EXCHANGE.to_string(),
            routing_key: DEFAULT_ROUTING_KEY.to_string(),
            queue: DEFAULT_QUEUE.to_string(),
            kafka_brokers: "localhost:9092".to_string(),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let role: ServiceRole = env::var("SERVICE_ROLE")
            .unwrap_or_else(|_| "all".to_string())
            .parse()?;

        let store_backend: StoreBackend = env::var("STORE_BACKEND")
            .unwrap_or_else(|_| "memory".to_string())
            .parse()?;

        let event_backend: EventBackend = env::var("EVENT_BACKEND")
            .unwrap_or_else(|_| "in-process".to_string())
            .parse()?;

        // Only the gateway verifies tokens
        let jwt_signing_key = match env::var("JWT_SIGNING_KEY") {
            Ok(key) => key.trim().as_bytes().to_vec(),
            Err(_) if role == ServiceRole::Gateway => {
                return Err(ConfigError::Missing("JWT_SIGNING_KEY"))
            }
            Err(_) => Vec::new(),
        };

        let gcp_project_id = match env::var("GCP_PROJECT_ID") {
            Ok(id) => id,
            Err(_) if store_backend == StoreBackend::Firestore => {
                return Err(ConfigError::Missing("GCP_PROJECT_ID"))
            }
            Err(_) => "local-dev".to_string(),
        };

        let port: u16 = env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .unwrap_or(8080);

        Ok(Self {
            role,
            port,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            store_backend,
            gcp_project_id,
            user_service_url: service_url(
                "USER_SERVICE_URL",
                &default_user_service_url(role, port),
            ),
            activity_service_url: service_url("ACTIVITY_SERVICE_URL", "http://localhost:8082"),
            recommendation_service_url: service_url(
                "RECOMMENDATION_SERVICE_URL",
                "http://localhost:8083",
            ),
            event_backend,
            exchange: env::var("RABBITMQ_EXCHANGE").unwrap_or_else(|_| DEFAULT_EXCHANGE.to_string()),
            routing_key: env::var("RABBITMQ_ROUTING_KEY")
                .unwrap_or_else(|_| DEFAULT_ROUTING_KEY.to_string()),
            queue: env::var("RABBITMQ_QUEUE").unwrap_or_else(|_| DEFAULT_QUEUE.to_string()),
            kafka_brokers: env::var("KAFKA_BROKERS")
                .unwrap_or_else(|_| "localhost:9092".to_string()),
            jwt_signing_key,
        })
    }
}

/// Directory URL when `USER_SERVICE_URL` is unset. The `all` role serves
/// the directory itself, so it validates against its own port.
fn default_user_service_url(role: ServiceRole, port: u16) -> String {
    match role {
        ServiceRole::All => format!("http://localhost:{}", port),
        _ => "http://localhost:8081".to_string(),
    }
}

/// Read a base URL, dropping any trailing slash so paths can be appended.
fn service_url(var: &str, default: &str) -> String {
    env::var(var)
        .unwrap_or_else(|_| default.to_string())
        .trim_end_matches('/')
        .to_string()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
