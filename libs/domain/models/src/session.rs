// [libs/domain/models/src/session.rs]
/*!
 * =================================================================
 * APARATO: SESSION DOMAIN CONTRACT (V41.0 - LIFECYCLE MASTER)
 * CLASIFICACIÓN: DOMAIN ENTITIES (ESTRATO L2)
 * RESPONSABILIDAD: REGISTRO AUTORITATIVO DE SESIÓN Y SUS INVARIANTES
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. LIFECYCLE DAG: La legalidad de transición de estado vive junto al
 *    tipo; ningún adaptador puede representar un salto ilegal.
 * 2. INVARIANT SHIELD: 'audit_mutation' certifica cada propuesta de
 *    mutación antes del commit CAS del almacén (Estrato L3).
 * 3. FINGERPRINT ONLY: El registro jamás transporta claves ni firmas;
 *    solo huellas SHA-256 del material rotado.
 * 4. TYPESHARE SYNERGY: Snapshot íntegro consumible por el shell web.
 *
 * # Mathematical Proof (Version Monotonicity):
 * Toda mutación observable pasa por el CAS del almacén que incrementa
 * 'version' en exactamente 1. La cadena de versiones de una sesión es
 * por tanto estrictamente creciente y sin huecos, lo que permite a un
 * cliente detectar snapshots perdidos por simple aritmética.
 * =================================================================
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use typeshare::typeshare;
use uuid::Uuid;

use crate::config::{PolicyConfig, VerificationBackend, VerificationLevel};

/// Estado mayor del ciclo de vida de una sesión.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Challenge emitido; esperando la firma de la wallet.
    PendingSignature,
    /// Firma aceptada; el backend de aprovisionamiento está en vuelo.
    Provisioning,
    /// Runtime dedicado operativo; el sub-estado gobierna el control.
    Ready,
    /// Terminal: firma rechazada, política inválida o colapso de despliegue.
    Failed,
    /// Terminal: el challenge o el aprovisionamiento excedió su TTL.
    Expired,
}

impl SessionStatus {
    /// Etiqueta nominal de cable (snake_case).
    pub fn as_wire_label(&self) -> &'static str {
        match self {
            SessionStatus::PendingSignature => "pending_signature",
            SessionStatus::Provisioning => "provisioning",
            SessionStatus::Ready => "ready",
            SessionStatus::Failed => "failed",
            SessionStatus::Expired => "expired",
        }
    }

    /// Certifica la legalidad de una transición según el DAG soberano.
    ///
    /// # Logic:
    /// pending_signature -> {provisioning, failed, expired}
    /// provisioning      -> {ready, failed, expired}
    /// ready/failed/expired -> terminales (ready nunca retrocede).
    pub fn may_transition_to(&self, proposed_status: SessionStatus) -> bool {
        if *self == proposed_status {
            return true;
        }
        matches!(
            (self, proposed_status),
            (SessionStatus::PendingSignature, SessionStatus::Provisioning)
                | (SessionStatus::PendingSignature, SessionStatus::Failed)
                | (SessionStatus::PendingSignature, SessionStatus::Expired)
                | (SessionStatus::Provisioning, SessionStatus::Ready)
                | (SessionStatus::Provisioning, SessionStatus::Failed)
                | (SessionStatus::Provisioning, SessionStatus::Expired)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Failed | SessionStatus::Expired)
    }
}

/// Sub-estado del runtime dedicado; significativo solo en 'ready'.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeState {
    NotStarted,
    Running,
    Paused,
    /// Absorbente: una vez observado, ningún snapshot posterior cambia.
    Terminated,
}

impl RuntimeState {
    pub fn as_wire_label(&self) -> &'static str {
        match self {
            RuntimeState::NotStarted => "not_started",
            RuntimeState::Running => "running",
            RuntimeState::Paused => "paused",
            RuntimeState::Terminated => "terminated",
        }
    }
}

/// Mecanismo que produjo (o producirá) el endpoint del runtime.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProvisioningSource {
    /// Subproceso externo configurado (despliegue dedicado).
    Command,
    /// URL fija de instancia compartida (modo degradado).
    DefaultInstanceUrl,
    /// Sin backend configurado; el launch se rechaza antes de firmar.
    Unconfigured,
}

impl ProvisioningSource {
    pub fn as_wire_label(&self) -> &'static str {
        match self {
            ProvisioningSource::Command => "command",
            ProvisioningSource::DefaultInstanceUrl => "default_instance_url",
            ProvisioningSource::Unconfigured => "unconfigured",
        }
    }
}

/// Veredicto agregado de la batería de preflight de fondos.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FundingPreflightStatus {
    NotRun,
    Passed,
    Failed,
}

/// Veredicto individual de un chequeo de la batería.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PreflightCheckStatus {
    Passed,
    Failed,
    Skipped,
}

/// Registro ordenado de un chequeo ejecutado.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PreflightCheckRecord {
    /// Identificador canónico del chequeo (ej: "wallet_binding").
    pub check_id: String,
    pub status: PreflightCheckStatus,
    /// Detalle humano corto para el panel del operador.
    pub detail: String,
}

/// Registro autoritativo de sesión. Propiedad exclusiva del almacén;
/// el resto del sistema opera sobre snapshots de solo lectura.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    /// UUIDv4 inmutable asignado en la creación.
    pub session_id: Uuid,
    /// Dirección canónica (0x + 40 hex minúsculas), inmutable.
    pub wallet_address: String,
    /// Identificador opaco del vendor de identidad embebida.
    pub privy_user_id: Option<String>,
    /// Cadena EVM vinculada al challenge (None = "any").
    #[typeshare(serialized_as = "number")]
    pub chain_id: Option<u64>,
    /// Contador estrictamente creciente; incrementa en cada mutación.
    #[typeshare(serialized_as = "number")]
    pub version: u64,
    pub status: SessionStatus,
    pub runtime_state: RuntimeState,
    /// Bytes exactos a firmar; se fija una sola vez en la creación.
    pub challenge_message: String,
    pub challenge_created_at: DateTime<Utc>,
    pub challenge_expires_at: DateTime<Utc>,
    /// Política validada; no-nula desde la aceptación de firma, inmutable.
    pub config: Option<PolicyConfig>,
    pub profile_name: Option<String>,
    pub profile_domain: Option<String>,
    pub provisioning_source: ProvisioningSource,
    pub dedicated_instance: bool,
    pub launched_on_eigencloud: bool,
    pub instance_url: Option<String>,
    pub verify_url: Option<String>,
    pub eigen_app_id: Option<String>,
    pub verification_backend: Option<VerificationBackend>,
    pub verification_level: Option<VerificationLevel>,
    pub verification_fallback_enabled: bool,
    pub verification_fallback_require_signed_receipts: bool,
    /// Sellado por el preflight: el fallback atendió la verificación.
    pub verification_fallback_used: bool,
    /// Latencia observada del backend de verificación en el preflight.
    #[typeshare(serialized_as = "number")]
    pub verification_latency_ms: Option<u64>,
    pub funding_preflight_status: FundingPreflightStatus,
    pub funding_preflight_failure_category: Option<String>,
    pub funding_preflight_checks: Vec<PreflightCheckRecord>,
    /// Huella SHA-256 (hex) de la clave de mando activa; jamás la clave.
    pub auth_key_fingerprint: Option<String>,
    /// Derivados del feed de TODOs; recalculados en cada commit.
    pub todo_open_required_count: u32,
    pub todo_open_recommended_count: u32,
    pub todo_status_summary: String,
    /// Razón terminal de fallo, preservada para auditoría.
    pub error: Option<String>,
    /// Progreso humano de la fase actual.
    pub detail: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// TTL absoluto de la sesión (retención del registro).
    pub expires_at: DateTime<Utc>,
}

/// Violación de invariante detectada antes del commit.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("[L2_SESSION_FAULT]: IMMUTABLE_FIELD_MUTATED -> {0}")]
    ImmutableFieldMutated(&'static str),

    #[error("[L2_SESSION_FAULT]: ILLEGAL_STATUS_TRANSITION -> {from} => {to}")]
    IllegalStatusTransition { from: &'static str, to: &'static str },

    #[error("[L2_SESSION_FAULT]: CONFIG_REWRITE_REJECTED")]
    ConfigRewriteRejected,

    #[error("[L2_SESSION_FAULT]: RUNTIME_STATE_BEFORE_READY")]
    RuntimeStateBeforeReady,

    #[error("[L2_SESSION_FAULT]: TERMINATED_IS_ABSORBING")]
    TerminatedIsAbsorbing,

    #[error("[L2_SESSION_FAULT]: READY_WITHOUT_ENDPOINT")]
    ReadyWithoutEndpoint,

    #[error("[L2_SESSION_FAULT]: CUSTODY_WALLET_DIVERGENCE")]
    CustodyWalletDivergence,
}

impl SessionRecord {
    /// Certifica una propuesta de mutación contra los invariantes del
    /// dominio. El almacén invoca esta auditoría antes de todo commit;
    /// una violación aborta el apply sin efectos observables.
    pub fn audit_mutation(
        previous_snapshot: &SessionRecord,
        proposed_snapshot: &SessionRecord,
    ) -> Result<(), InvariantViolation> {
        // 1. CAMPOS INMUTABLES DE NACIMIENTO
        if proposed_snapshot.session_id != previous_snapshot.session_id {
            return Err(InvariantViolation::ImmutableFieldMutated("session_id"));
        }
        if proposed_snapshot.wallet_address != previous_snapshot.wallet_address {
            return Err(InvariantViolation::ImmutableFieldMutated("wallet_address"));
        }
        if proposed_snapshot.challenge_message != previous_snapshot.challenge_message {
            return Err(InvariantViolation::ImmutableFieldMutated("challenge_message"));
        }
        if proposed_snapshot.created_at != previous_snapshot.created_at {
            return Err(InvariantViolation::ImmutableFieldMutated("created_at"));
        }

        // 2. LEGALIDAD DEL DAG DE ESTADO
        if !previous_snapshot.status.may_transition_to(proposed_snapshot.status) {
            return Err(InvariantViolation::IllegalStatusTransition {
                from: previous_snapshot.status.as_wire_label(),
                to: proposed_snapshot.status.as_wire_label(),
            });
        }

        // 3. POLÍTICA SET-ONCE
        if let Some(anchored_config) = &previous_snapshot.config {
            match &proposed_snapshot.config {
                Some(candidate_config) if candidate_config == anchored_config => {}
                _ => return Err(InvariantViolation::ConfigRewriteRejected),
            }
        }

        // 4. DISCIPLINA DEL SUB-ESTADO DE RUNTIME
        if proposed_snapshot.status != SessionStatus::Ready
            && proposed_snapshot.runtime_state != RuntimeState::NotStarted
        {
            return Err(InvariantViolation::RuntimeStateBeforeReady);
        }
        if previous_snapshot.runtime_state == RuntimeState::Terminated
            && proposed_snapshot.runtime_state != RuntimeState::Terminated
        {
            return Err(InvariantViolation::TerminatedIsAbsorbing);
        }

        // 5. ENDPOINT OBLIGATORIO EN 'READY'
        let has_live_endpoint = proposed_snapshot
            .instance_url
            .as_deref()
            .map(|url| !url.is_empty())
            .unwrap_or(false)
            || proposed_snapshot
                .verify_url
                .as_deref()
                .map(|url| !url.is_empty())
                .unwrap_or(false);
        if proposed_snapshot.status == SessionStatus::Ready && !has_live_endpoint {
            return Err(InvariantViolation::ReadyWithoutEndpoint);
        }

        // 6. PARIDAD DE CUSTODIA WALLET <-> POLÍTICA
        if let Some(policy) = &proposed_snapshot.config {
            if let Some(user_wallet) = &policy.user_wallet_address {
                if user_wallet != &proposed_snapshot.wallet_address {
                    return Err(InvariantViolation::CustodyWalletDivergence);
                }
            }
        }

        Ok(())
    }
}
