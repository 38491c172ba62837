// [libs/domain/models/src/errors.rs]
/*!
 * =================================================================
 * APARATO: GATEWAY FAULT TAXONOMY (V27.0 - EXHAUSTIVE CATALOG)
 * CLASIFICACIÓN: DOMAIN ENTITIES (ESTRATO L2)
 * RESPONSABILIDAD: CATALOGACIÓN SEMÁNTICA EXHAUSTIVA DE FALLOS DE CABLE
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. ONE FAULT PER CAUSE: Exactamente una variante por condición
 *    disparadora; nada queda sin clasificar salvo 'Internal'.
 * 2. WIRE ENVELOPE: Cada variante conoce su 'error_code', su estatus
 *    HTTP y su 'operator_hint'; el adaptador L4 solo transporta.
 * 3. SECRET HYGIENE: Ninguna variante transporta firmas ni claves;
 *    solo razones, campos y estados.
 * =================================================================
 */

use thiserror::Error;

use crate::control::RuntimeControlAction;
use crate::session::RuntimeState;

/// Catálogo exhaustivo de fallos visibles en el cable.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum GatewayError {
    // --- ESTRATO DE CONFIGURACIÓN DEL DESPLIEGUE ---
    #[error("the gateway frontdoor is disabled by deployment configuration")]
    FrontdoorDisabled,

    #[error("no provisioning backend is configured; launches cannot proceed")]
    ProvisioningBackendUnconfigured,

    #[error("embedded identity is required but no privy app id is configured")]
    PrivyAppIdMissing,

    // --- ESTRATO DE IDENTIDAD Y SESIÓN ---
    #[error("wallet address is not a canonical 0x-prefixed 40-hex string: {0}")]
    InvalidWalletAddress(String),

    #[error("session id is not a well-formed uuid: {0}")]
    InvalidSessionId(String),

    #[error("no session exists for id {0}")]
    SessionNotFound(String),

    #[error("the challenge for this session has expired; request a new challenge")]
    ChallengeExpired,

    #[error("the presented wallet does not match the wallet bound to this challenge")]
    ChallengeWalletMismatch,

    // --- ESTRATO DE FIRMA ---
    #[error("signature is malformed: {0}")]
    SignatureMalformed(String),

    #[error("signed message bytes differ from the stored challenge message")]
    SignatureMessageMismatch,

    #[error("signature recovers to {recovered}, expected {expected}")]
    SignatureWalletMismatch { expected: String, recovered: String },

    // --- ESTRATO DE POLÍTICA ---
    #[error("config field '{field}' is invalid: {reason}")]
    ConfigInvalid { field: String, reason: String },

    // --- ESTRATO DE ONBOARDING ---
    #[error("onboarding precondition violated: {0}")]
    OnboardingPrecondition(String),

    #[error("onboarding has unresolved required fields")]
    OnboardingRequiredVariables { missing_fields: Vec<String> },

    #[error("onboarding conversation is not available for this session phase: {0}")]
    OnboardingSessionMismatch(String),

    // --- ESTRATO DE PREFLIGHT Y APROVISIONAMIENTO ---
    #[error("funding preflight failed at check '{failure_category}'")]
    PreflightFailed { failure_category: String },

    #[error("provisioning backend failed: {0}")]
    ProvisioningFailure(String),

    #[error("provisioning backend exceeded its deadline of {timeout_ms} ms")]
    ProvisioningTimeout { timeout_ms: u64 },

    #[error("provisioning backend produced an undecodable result: {0}")]
    ProvisioningMalformedResult(String),

    // --- ESTRATO DE CONTROL DE RUNTIME ---
    #[error("runtime control '{action}' is blocked from state '{from_state:?}'")]
    RuntimeControlBlocked {
        from_state: RuntimeState,
        action: RuntimeControlAction,
    },

    // --- ESTRATO DE CONCURRENCIA ---
    #[error("concurrent mutation detected; re-read the session and retry")]
    VersionConflict,

    // --- COMODÍN FINAL ---
    #[error("internal gateway fault: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Código estable de la taxonomía para el campo `error_code`.
    pub fn error_code(&self) -> &'static str {
        match self {
            GatewayError::FrontdoorDisabled => "frontdoor_disabled",
            GatewayError::ProvisioningBackendUnconfigured => "provisioning_backend_unconfigured",
            GatewayError::PrivyAppIdMissing => "privy_app_id_missing",
            GatewayError::InvalidWalletAddress(_) => "invalid_wallet_address",
            GatewayError::InvalidSessionId(_) => "invalid_session_id",
            GatewayError::SessionNotFound(_) => "session_not_found",
            GatewayError::ChallengeExpired => "challenge_expired",
            GatewayError::ChallengeWalletMismatch => "challenge_wallet_mismatch",
            GatewayError::SignatureMalformed(_) => "signature_malformed",
            GatewayError::SignatureMessageMismatch => "signature_message_mismatch",
            GatewayError::SignatureWalletMismatch { .. } => "signature_wallet_mismatch",
            GatewayError::ConfigInvalid { .. } => "config_invalid",
            GatewayError::OnboardingPrecondition(_) => "onboarding_precondition",
            GatewayError::OnboardingRequiredVariables { .. } => "onboarding_required_variables",
            GatewayError::OnboardingSessionMismatch(_) => "onboarding_session_mismatch",
            GatewayError::PreflightFailed { .. } => "preflight_failed",
            GatewayError::ProvisioningFailure(_) => "provisioning_failure",
            GatewayError::ProvisioningTimeout { .. } => "provisioning_timeout",
            GatewayError::ProvisioningMalformedResult(_) => "provisioning_malformed_result",
            GatewayError::RuntimeControlBlocked { .. } => "runtime_control_blocked",
            GatewayError::VersionConflict => "version_conflict",
            GatewayError::Internal(_) => "internal_error",
        }
    }

    /// Estatus HTTP canónico de la variante.
    ///
    /// 400 fallo de cliente, 404 sesión desconocida, 409 conflicto de
    /// versión o control bloqueado, 422 política/onboarding, 500 interno.
    pub fn http_status(&self) -> u16 {
        match self {
            GatewayError::SessionNotFound(_) => 404,
            GatewayError::VersionConflict | GatewayError::RuntimeControlBlocked { .. } => 409,
            GatewayError::ConfigInvalid { .. }
            | GatewayError::OnboardingPrecondition(_)
            | GatewayError::OnboardingRequiredVariables { .. }
            | GatewayError::OnboardingSessionMismatch(_) => 422,
            GatewayError::Internal(_) => 500,
            _ => 400,
        }
    }

    /// Pista accionable para el operador del despliegue.
    pub fn operator_hint(&self) -> String {
        match self {
            GatewayError::FrontdoorDisabled => {
                "set FRONTDOOR_ENABLED=true in the gateway environment".to_string()
            }
            GatewayError::ProvisioningBackendUnconfigured => {
                "configure PROVISIONING_BACKEND=command with PROVISIONING_COMMAND, or default_instance_url with DEFAULT_INSTANCE_URL".to_string()
            }
            GatewayError::PrivyAppIdMissing => {
                "set PRIVY_APP_ID or disable REQUIRE_PRIVY".to_string()
            }
            GatewayError::ChallengeExpired => {
                "the client must POST /challenge again; consider raising CHALLENGE_TTL_SECONDS".to_string()
            }
            GatewayError::PreflightFailed { failure_category } => {
                format!("inspect the '{}' check in GET /session/{{id}}/funding-preflight", failure_category)
            }
            GatewayError::ProvisioningTimeout { .. } => {
                "raise PROVISIONING_TIMEOUT_MS or inspect the provisioning command".to_string()
            }
            GatewayError::VersionConflict => {
                "benign under concurrency; clients should re-read the session and retry".to_string()
            }
            GatewayError::Internal(_) => {
                "inspect gateway logs around this timestamp".to_string()
            }
            _ => "client-side fault; no operator action required".to_string(),
        }
    }

    /// Sobre de fallo de cable `{error, error_code, operator_hint}` más
    /// los portadores estructurados de la variante.
    pub fn to_wire_envelope(&self) -> serde_json::Value {
        let mut envelope = serde_json::json!({
            "error": self.to_string(),
            "error_code": self.error_code(),
            "operator_hint": self.operator_hint(),
        });

        let envelope_map = envelope.as_object_mut().expect("envelope is an object");
        match self {
            GatewayError::ConfigInvalid { field, reason } => {
                envelope_map.insert("field".into(), serde_json::json!(field));
                envelope_map.insert("reason".into(), serde_json::json!(reason));
            }
            GatewayError::OnboardingRequiredVariables { missing_fields } => {
                envelope_map.insert("missing_fields".into(), serde_json::json!(missing_fields));
            }
            GatewayError::PreflightFailed { failure_category } => {
                envelope_map.insert("failure_category".into(), serde_json::json!(failure_category));
            }
            GatewayError::RuntimeControlBlocked { from_state, action } => {
                envelope_map.insert("from_state".into(), serde_json::json!(from_state.as_wire_label()));
                envelope_map.insert("action".into(), serde_json::json!(action.to_string()));
            }
            _ => {}
        }

        envelope
    }
}
