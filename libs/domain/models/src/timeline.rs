// [libs/domain/models/src/timeline.rs]
/*!
 * =================================================================
 * APARATO: TIMELINE DOMAIN CONTRACT (V14.0 - APPEND ONLY)
 * CLASIFICACIÓN: DOMAIN ENTITIES (ESTRATO L2)
 * RESPONSABILIDAD: REGISTRO ORDENADO E INMUTABLE DE EVENTOS DE SESIÓN
 *
 * # Mathematical Proof (Sequence Contiguity):
 * 'seq_id' nace en 1 y el grabador lo deriva de MAX(seq_id)+1 dentro de
 * la misma transacción del commit, garantizando una secuencia contigua
 * 1..N sin huecos ni reordenamientos para cada sesión.
 * =================================================================
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use typeshare::typeshare;
use uuid::Uuid;

/// Actor responsable de la emisión de un evento de timeline.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TimelineActor {
    /// El propio plano de control (transiciones, sweeps).
    System,
    /// Acción directa del usuario (firma, chat, controles).
    User,
    /// Subproceso de aprovisionamiento (stdout/stderr relay).
    Provisioner,
    /// Aplicador de controles de runtime.
    ControlPlane,
}

impl TimelineActor {
    pub fn as_wire_label(&self) -> &'static str {
        match self {
            TimelineActor::System => "system",
            TimelineActor::User => "user",
            TimelineActor::Provisioner => "provisioner",
            TimelineActor::ControlPlane => "control_plane",
        }
    }
}

/// Catálogo nominal de tipos de evento del timeline.
pub mod event_types {
    pub const CHALLENGE_ISSUED: &str = "challenge_issued";
    pub const SIGNATURE_VERIFIED: &str = "signature_verified";
    pub const CONFIG_ACCEPTED: &str = "config_accepted";
    pub const CONFIG_REJECTED: &str = "config_rejected";
    pub const PREFLIGHT_PASSED: &str = "preflight_passed";
    pub const PREFLIGHT_FAILED: &str = "preflight_failed";
    pub const PROVISIONING_STARTED: &str = "provisioning_started";
    pub const PROVISIONING_OUTPUT: &str = "provisioning_output";
    pub const PROVISIONING_SUCCEEDED: &str = "provisioning_succeeded";
    pub const PROVISIONING_FAILED: &str = "provisioning_failed";
    pub const SESSION_EXPIRED: &str = "session_expired";
    pub const RUNTIME_PAUSED: &str = "runtime_paused";
    pub const RUNTIME_RESUMED: &str = "runtime_resumed";
    pub const RUNTIME_TERMINATED: &str = "runtime_terminated";
    pub const AUTH_KEY_ROTATED: &str = "auth_key_rotated";
}

/// Tupla inmutable del registro append-only.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub session_id: Uuid,
    /// Secuencia estrictamente creciente por sesión, desde 1, sin huecos.
    #[typeshare(serialized_as = "number")]
    pub seq_id: u64,
    /// Tipo canónico del evento (ver `event_types`).
    pub event_type: String,
    /// Estado corto asociado ("ok", "error", "info").
    pub status: String,
    /// Detalle humano del evento.
    pub detail: String,
    pub actor: TimelineActor,
    pub created_at: DateTime<Utc>,
}
