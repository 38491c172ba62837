// [apps/gateway/src/handlers/ingest.rs]
/*!
 * =================================================================
 * APARATO: RUNTIME EVENT INGEST (V10.0 - RELAY INLET)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L4)
 * RESPONSABILIDAD: INGESTA AUTENTICADA DE EVENTOS DEL RUNTIME
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. FINGERPRINT AUTH: El runtime se autentica con su clave de mando;
 *    el gateway compara huellas SHA-256, jamás claves.
 * 2. CLOSED VOCABULARY: Solo nombres del catálogo SSE cruzan el inlet;
 *    cualquier otro nombre se rechaza en la frontera.
 * =================================================================
 */

use axum::extract::{Json, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use enclagent_domain_control::fingerprint_auth_key;
use enclagent_domain_models::events::{is_recognized_event_name, StreamChannel};
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::api::{map_store_fault, parse_session_identifier};
use crate::state::AppState;

/// Trama entrante del runtime.
#[derive(Debug, Deserialize)]
pub struct IngestEventRequest {
    pub session_id: String,
    /// Familia de canal: "chat" | "log" | "job".
    pub channel: String,
    /// Nombre de evento del catálogo SSE cerrado.
    pub event: String,
    pub payload: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct IngestEventResponse {
    pub session_id: Uuid,
    pub channel: String,
    pub event: String,
    pub sequence: u64,
}

pub struct RuntimeIngestHandler;

impl RuntimeIngestHandler {
    /**
     * Endpoint: POST /runtime/ingest-event
     *
     * Autenticación máquina-a-máquina: 'Authorization: Bearer <clave>'
     * cuya huella debe coincidir con la sellada en la sesión. Un
     * rechazo de autenticación responde con estatus plano, sin sobre
     * de taxonomía (inlet M2M, no superficie de operador).
     */
    #[instrument(skip(application_state, request_headers, ingest_request), fields(session_id = %ingest_request.session_id))]
    pub async fn handle_runtime_event_ingest(
        State(application_state): State<AppState>,
        request_headers: HeaderMap,
        Json(ingest_request): Json<IngestEventRequest>,
    ) -> Result<Json<IngestEventResponse>, Response> {
        let session_id = parse_session_identifier(&ingest_request.session_id)
            .map_err(IntoResponse::into_response)?;

        let session_snapshot = application_state
            .session_repository
            .fetch_snapshot(&session_id)
            .await
            .map_err(|store_fault| map_store_fault(store_fault, &session_id).into_response())?;

        // --- AUTENTICACIÓN POR HUELLA DE CLAVE ---
        let presented_key = request_headers
            .get(header::AUTHORIZATION)
            .and_then(|header_value| header_value.to_str().ok())
            .and_then(|header_text| header_text.strip_prefix("Bearer "));

        let is_authenticated = match (presented_key, &session_snapshot.auth_key_fingerprint) {
            (Some(candidate_key), Some(sealed_fingerprint)) => {
                &fingerprint_auth_key(candidate_key) == sealed_fingerprint
            }
            _ => false,
        };
        if !is_authenticated {
            warn!("❌ [INGEST_REJECTION]: Fingerprint mismatch for session {}.", session_id);
            return Err(StatusCode::UNAUTHORIZED.into_response());
        }

        // --- VOCABULARIO CERRADO ---
        if !is_recognized_event_name(&ingest_request.event) {
            return Err(StatusCode::BAD_REQUEST.into_response());
        }
        let channel = match ingest_request.channel.as_str() {
            "chat" => StreamChannel::Chat,
            "log" => StreamChannel::Log,
            "job" => StreamChannel::Job,
            _ => return Err(StatusCode::BAD_REQUEST.into_response()),
        };

        let stamped_sequence = application_state.event_bus.publish(
            channel,
            &session_id,
            &ingest_request.event,
            ingest_request.payload,
        );

        Ok(Json(IngestEventResponse {
            session_id,
            channel: ingest_request.channel,
            event: ingest_request.event,
            sequence: stamped_sequence,
        }))
    }
}
