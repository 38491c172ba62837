// [libs/domain/control/src/lib.rs]
/*!
 * =================================================================
 * APARATO: RUNTIME CONTROL APPLIER (V9.0 - GUARDED TRANSITIONS)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: APLICACIÓN DE MANDOS SOBRE EL SUB-ESTADO DE RUNTIME
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. GUARDED MATRIX: La matriz de transición vive en un único match
 *    exhaustivo; un mando ilegal produce 'runtime_control_blocked' con
 *    el par (from_state, action) ofensor.
 * 2. ABSORBING TERMINATE: 'terminate' sobre 'terminated' es un no-op
 *    exitoso; ningún mando resucita un runtime terminado.
 * 3. FINGERPRINT ONLY: La rotación de clave forja material fresco, sella
 *    su huella SHA-256 y descarta la clave en el mismo turno; la entrega
 *    al runtime viaja por el canal de aprovisionamiento, jamás por aquí.
 * =================================================================
 */

use enclagent_domain_models::control::RuntimeControlAction;
use enclagent_domain_models::errors::GatewayError;
use enclagent_domain_models::session::{RuntimeState, SessionRecord, SessionStatus};
use enclagent_domain_models::timeline::event_types;
use rand::RngCore;
use sha2::{Digest, Sha256};
use tracing::{debug, instrument};

/// Bytes de material fresco forjados en cada rotación.
const ROTATED_KEY_MATERIAL_BYTES: usize = 32;

/// Resultado de un mando aplicado con éxito.
#[derive(Debug, Clone)]
pub struct ControlOutcome {
    pub next_runtime_state: RuntimeState,
    /// Tipo de evento a sellar en el timeline (actor=control_plane).
    pub timeline_event_type: &'static str,
    pub detail: String,
    /// Huella hex de la clave recién forjada; solo en rotaciones.
    pub rotated_key_fingerprint: Option<String>,
}

/// Huella SHA-256 en hexadecimal de una clave de mando.
pub fn fingerprint_auth_key(auth_key_material: &str) -> String {
    hex::encode(Sha256::digest(auth_key_material.as_bytes()))
}

/// Forja material de clave fresco y devuelve únicamente su huella.
fn forge_rotated_key_fingerprint() -> String {
    let mut fresh_key_material = [0u8; ROTATED_KEY_MATERIAL_BYTES];
    rand::thread_rng().fill_bytes(&mut fresh_key_material);
    // La clave efímera muere al final de este scope; solo la huella sale.
    hex::encode(Sha256::digest(fresh_key_material))
}

fn blocked(from_state: RuntimeState, action: RuntimeControlAction) -> GatewayError {
    GatewayError::RuntimeControlBlocked { from_state, action }
}

/// Aplica un mando de runtime sobre un snapshot de sesión.
///
/// # Errors:
/// - `runtime_control_blocked` si la sesión no está 'ready' o el par
///   (estado, acción) es ilegal según la matriz soberana.
#[instrument(skip(session), fields(session_id = %session.session_id, action = %action))]
pub fn apply_runtime_control(
    session: &SessionRecord,
    action: RuntimeControlAction,
) -> Result<ControlOutcome, GatewayError> {
    // Los mandos solo existen sobre sesiones listas.
    if session.status != SessionStatus::Ready {
        return Err(blocked(session.runtime_state, action));
    }

    let from_state = session.runtime_state;
    debug!(
        "🎛️ [CONTROL]: Applying '{}' from state '{}'.",
        action,
        from_state.as_wire_label()
    );

    let outcome = match (from_state, action) {
        // --- SUSPENSIÓN Y REANUDACIÓN ---
        (RuntimeState::Running, RuntimeControlAction::Pause) => ControlOutcome {
            next_runtime_state: RuntimeState::Paused,
            timeline_event_type: event_types::RUNTIME_PAUSED,
            detail: "runtime paused by control plane".to_string(),
            rotated_key_fingerprint: None,
        },
        (RuntimeState::Paused, RuntimeControlAction::Resume) => ControlOutcome {
            next_runtime_state: RuntimeState::Running,
            timeline_event_type: event_types::RUNTIME_RESUMED,
            detail: "runtime resumed by control plane".to_string(),
            rotated_key_fingerprint: None,
        },

        // --- TERMINACIÓN (ABSORBENTE) ---
        (RuntimeState::Running | RuntimeState::Paused, RuntimeControlAction::Terminate) => {
            ControlOutcome {
                next_runtime_state: RuntimeState::Terminated,
                timeline_event_type: event_types::RUNTIME_TERMINATED,
                detail: "runtime terminated; this state is final".to_string(),
                rotated_key_fingerprint: None,
            }
        }
        (RuntimeState::Terminated, RuntimeControlAction::Terminate) => ControlOutcome {
            next_runtime_state: RuntimeState::Terminated,
            timeline_event_type: event_types::RUNTIME_TERMINATED,
            detail: "runtime already terminated; no-op".to_string(),
            rotated_key_fingerprint: None,
        },

        // --- ROTACIÓN DE CLAVE (PRESERVA EL SUB-ESTADO) ---
        (RuntimeState::Running | RuntimeState::Paused, RuntimeControlAction::RotateAuthKey) => {
            let fresh_fingerprint = forge_rotated_key_fingerprint();
            ControlOutcome {
                next_runtime_state: from_state,
                timeline_event_type: event_types::AUTH_KEY_ROTATED,
                detail: format!("auth key rotated; fingerprint {}", &fresh_fingerprint[..16]),
                rotated_key_fingerprint: Some(fresh_fingerprint),
            }
        }

        // --- TODO LO DEMÁS: BLOQUEADO ---
        (illegal_from_state, illegal_action) => {
            return Err(blocked(illegal_from_state, illegal_action))
        }
    };

    Ok(outcome)
}
