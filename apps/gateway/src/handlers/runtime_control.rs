// [apps/gateway/src/handlers/runtime_control.rs]
/*!
 * =================================================================
 * APARATO: RUNTIME CONTROL HANDLER (V14.0 - GUARDED COMMANDS)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L4)
 * RESPONSABILIDAD: APLICACIÓN DE MANDOS CON GUARDAS DE TRANSICIÓN
 *
 * # Logic:
 * La legalidad del mando se evalúa DENTRO del turno CAS sobre el
 * snapshot fresco; una carrera con otro mando se resuelve releyendo,
 * jamás aplicando sobre estado obsoleto.
 * =================================================================
 */

use axum::extract::{Json, Path, State};
use chrono::{DateTime, Utc};
use enclagent_domain_control::apply_runtime_control;
use enclagent_domain_models::control::RuntimeControlAction;
use enclagent_domain_models::events::StreamChannel;
use enclagent_infra_store::{MutationProposal, TimelineSeed};
use enclagent_domain_models::timeline::TimelineActor;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::api::{map_store_fault, parse_session_identifier, ApiFailure};
use crate::state::AppState;

/// Solicitud de mando de runtime.
#[derive(Debug, Deserialize)]
pub struct RuntimeControlRequest {
    pub action: RuntimeControlAction,
    /// Identidad declarada del emisor, sellada en el detalle del timeline.
    pub actor: Option<String>,
}

/// Sobre de respuesta del mando aplicado.
#[derive(Debug, Serialize)]
pub struct RuntimeControlResponse {
    pub session_id: Uuid,
    pub action: String,
    pub status: String,
    pub runtime_state: String,
    pub detail: String,
    pub updated_at: DateTime<Utc>,
}

pub struct RuntimeControlHandler;

impl RuntimeControlHandler {
    /**
     * Endpoint: POST /session/{id}/runtime-control
     *
     * # Errors:
     * - `runtime_control_blocked` con (from_state, action) si el par es
     *   ilegal o la sesión no está 'ready'.
     */
    #[instrument(skip(application_state, control_request), fields(action = %control_request.action))]
    pub async fn handle_runtime_control(
        State(application_state): State<AppState>,
        Path(raw_session_id): Path<String>,
        Json(control_request): Json<RuntimeControlRequest>,
    ) -> Result<Json<RuntimeControlResponse>, ApiFailure> {
        let session_id = parse_session_identifier(&raw_session_id)?;
        let requested_action = control_request.action;
        let declared_actor = control_request
            .actor
            .unwrap_or_else(|| "operator_console".to_string());

        let committed_record = application_state
            .session_repository
            .apply(&session_id, |current_snapshot| {
                // La legalidad se certifica sobre el snapshot del turno.
                let control_outcome = apply_runtime_control(current_snapshot, requested_action)?;

                let mut proposed_record = current_snapshot.clone();
                proposed_record.runtime_state = control_outcome.next_runtime_state;
                proposed_record.detail = control_outcome.detail.clone();
                if let Some(rotated_fingerprint) = &control_outcome.rotated_key_fingerprint {
                    proposed_record.auth_key_fingerprint = Some(rotated_fingerprint.clone());
                }

                Ok(MutationProposal {
                    record: proposed_record,
                    timeline: vec![TimelineSeed::ok(
                        control_outcome.timeline_event_type,
                        format!("{} (actor: {})", control_outcome.detail, declared_actor),
                        TimelineActor::ControlPlane,
                    )],
                })
            })
            .await
            .map_err(|store_fault| map_store_fault(store_fault, &session_id))?;

        info!(
            "🎛️ [CONTROL_APPLIED]: Session {} -> '{}' now '{}'.",
            session_id,
            requested_action,
            committed_record.runtime_state.as_wire_label()
        );

        application_state.event_bus.publish(
            StreamChannel::Job,
            &session_id,
            "job_status",
            serde_json::json!({
                "status": "control_applied",
                "action": requested_action.to_string(),
                "runtime_state": committed_record.runtime_state.as_wire_label(),
            }),
        );

        Ok(Json(RuntimeControlResponse {
            session_id,
            action: requested_action.to_string(),
            status: "ok".to_string(),
            runtime_state: committed_record.runtime_state.as_wire_label().to_string(),
            detail: committed_record.detail.clone(),
            updated_at: committed_record.updated_at,
        }))
    }
}
