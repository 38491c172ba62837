// [apps/gateway/src/config.rs]
/*!
 * =================================================================
 * APARATO: GATEWAY ENVIRONMENT CAPTURE (V11.0 - BOOT IMMUTABLE)
 * CLASIFICACIÓN: APPLICATION CONFIG (ESTRATO L1-APP)
 * RESPONSABILIDAD: CAPTURA ÚNICA E INMUTABLE DEL ENTORNO DEL DESPLIEGUE
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. READ ONCE: El entorno se captura exactamente una vez en el boot;
 *    mutaciones posteriores del proceso no son observadas por diseño
 *    del contrato, no por descuido.
 * 2. TOTAL DEFAULTS: Todo campo ausente adopta un default documentado;
 *    un despliegue vacío arranca en modo degradado pero coherente.
 * =================================================================
 */

use enclagent_domain_models::config::VerificationBackend;
use enclagent_domain_models::session::ProvisioningSource;
use std::env;

/// Defaults del contrato de entorno.
const DEFAULT_SESSION_TTL_SECONDS: i64 = 86_400;
const DEFAULT_CHALLENGE_TTL_SECONDS: i64 = 600;
const DEFAULT_EXPIRY_SWEEP_INTERVAL_MS: u64 = 5_000;
const DEFAULT_SSE_QUEUE_CAPACITY: usize = 512;
const DEFAULT_POLL_INTERVAL_MS: u64 = 3_000;
const DEFAULT_PROVISIONING_TIMEOUT_MS: u64 = 180_000;

/// Captura inmutable del entorno, viva durante todo el proceso.
#[derive(Debug, Clone)]
pub struct GatewayEnvironment {
    pub frontdoor_enabled: bool,
    pub require_privy: bool,
    pub privy_app_id: Option<String>,
    pub privy_client_id: Option<String>,
    pub provisioning_backend: ProvisioningSource,
    pub provisioning_command: Option<String>,
    pub provisioning_timeout_ms: u64,
    pub default_instance_url: Option<String>,
    pub session_ttl_seconds: i64,
    pub challenge_ttl_seconds: i64,
    pub expiry_sweep_interval_ms: u64,
    pub sse_queue_capacity: usize,
    pub poll_interval_ms: u64,
    pub verification_default_backend: VerificationBackend,
    pub verification_default_fallback_enabled: bool,
}

fn capture_flag(variable_name: &str, default_value: bool) -> bool {
    env::var(variable_name)
        .map(|raw_value| {
            matches!(
                raw_value.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            )
        })
        .unwrap_or(default_value)
}

fn capture_scalar<T: std::str::FromStr>(variable_name: &str, default_value: T) -> T {
    env::var(variable_name)
        .ok()
        .and_then(|raw_value| raw_value.trim().parse().ok())
        .unwrap_or(default_value)
}

fn capture_optional(variable_name: &str) -> Option<String> {
    env::var(variable_name)
        .ok()
        .map(|raw_value| raw_value.trim().to_string())
        .filter(|value| !value.is_empty())
}

impl GatewayEnvironment {
    /// Captura el entorno completo del proceso. Invocar una sola vez.
    pub fn capture() -> Self {
        let provisioning_backend = match env::var("PROVISIONING_BACKEND")
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase()
            .as_str()
        {
            "command" => ProvisioningSource::Command,
            "default_instance_url" => ProvisioningSource::DefaultInstanceUrl,
            _ => ProvisioningSource::Unconfigured,
        };

        let verification_default_backend = match env::var("VERIFICATION_DEFAULT_BACKEND")
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase()
            .as_str()
        {
            "fallback_only" => VerificationBackend::FallbackOnly,
            _ => VerificationBackend::EigencloudPrimary,
        };

        Self {
            frontdoor_enabled: capture_flag("FRONTDOOR_ENABLED", true),
            require_privy: capture_flag("REQUIRE_PRIVY", false),
            privy_app_id: capture_optional("PRIVY_APP_ID"),
            privy_client_id: capture_optional("PRIVY_CLIENT_ID"),
            provisioning_backend,
            provisioning_command: capture_optional("PROVISIONING_COMMAND"),
            provisioning_timeout_ms: capture_scalar(
                "PROVISIONING_TIMEOUT_MS",
                DEFAULT_PROVISIONING_TIMEOUT_MS,
            ),
            default_instance_url: capture_optional("DEFAULT_INSTANCE_URL"),
            session_ttl_seconds: capture_scalar("SESSION_TTL_SECONDS", DEFAULT_SESSION_TTL_SECONDS),
            challenge_ttl_seconds: capture_scalar(
                "CHALLENGE_TTL_SECONDS",
                DEFAULT_CHALLENGE_TTL_SECONDS,
            ),
            expiry_sweep_interval_ms: capture_scalar(
                "EXPIRY_SWEEP_INTERVAL_MS",
                DEFAULT_EXPIRY_SWEEP_INTERVAL_MS,
            ),
            sse_queue_capacity: capture_scalar("SSE_QUEUE_CAPACITY", DEFAULT_SSE_QUEUE_CAPACITY),
            poll_interval_ms: capture_scalar("POLL_INTERVAL_MS", DEFAULT_POLL_INTERVAL_MS),
            verification_default_backend,
            verification_default_fallback_enabled: capture_flag(
                "VERIFICATION_DEFAULT_FALLBACK_ENABLED",
                true,
            ),
        }
    }

    /// El backend 'command' exige un comando; 'default_instance_url' una URL.
    /// Cualquier incoherencia degrada a 'unconfigured'.
    pub fn effective_provisioning_source(&self) -> ProvisioningSource {
        match self.provisioning_backend {
            ProvisioningSource::Command if self.provisioning_command.is_some() => {
                ProvisioningSource::Command
            }
            ProvisioningSource::DefaultInstanceUrl if self.default_instance_url.is_some() => {
                ProvisioningSource::DefaultInstanceUrl
            }
            _ => ProvisioningSource::Unconfigured,
        }
    }
}
