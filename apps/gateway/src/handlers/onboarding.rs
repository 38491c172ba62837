// [apps/gateway/src/handlers/onboarding.rs]
/*!
 * =================================================================
 * APARATO: ONBOARDING CHAT HANDLER (V16.0 - CONVERSATION GATE)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L4)
 * RESPONSABILIDAD: TRANSPORTE DE TURNOS HACIA EL MOTOR CONVERSACIONAL
 *
 * # Logic:
 * El handler transporta; el motor L2 decide. La conversación está
 * ligada a la fase pre-firma: una sesión ya lanzada rechaza turnos con
 * 'onboarding_session_mismatch'.
 * =================================================================
 */

use axum::extract::{Json, Query, State};
use chrono::Utc;
use enclagent_domain_models::errors::GatewayError;
use enclagent_domain_models::events::StreamChannel;
use enclagent_domain_models::onboarding::OnboardingState;
use enclagent_domain_models::session::SessionStatus;
use enclagent_domain_onboarding::advance_conversation;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use crate::api::{map_store_fault, parse_session_identifier, ApiFailure};
use crate::state::AppState;

/// Turno de chat del usuario.
#[derive(Debug, Deserialize)]
pub struct OnboardingChatRequest {
    pub session_id: String,
    pub message: String,
}

/// Sobre de respuesta de un turno aceptado.
#[derive(Debug, Serialize)]
pub struct OnboardingChatResponse {
    pub session_id: Uuid,
    pub assistant_message: String,
    pub state: OnboardingState,
}

/// Parámetros de lectura del estado conversacional.
#[derive(Debug, Deserialize)]
pub struct OnboardingStateQuery {
    pub session_id: String,
}

pub struct OnboardingHandler;

impl OnboardingHandler {
    /**
     * Endpoint: POST /onboarding/chat
     *
     * # Errors:
     * - `onboarding_session_mismatch` si la sesión ya superó la fase
     *   de firma.
     * - `onboarding_precondition` si el turno viola el peldaño actual.
     */
    #[instrument(skip(application_state, chat_request), fields(session_id = %chat_request.session_id))]
    pub async fn handle_onboarding_chat(
        State(application_state): State<AppState>,
        Json(chat_request): Json<OnboardingChatRequest>,
    ) -> Result<Json<OnboardingChatResponse>, ApiFailure> {
        let session_id = parse_session_identifier(&chat_request.session_id)?;

        let session_snapshot = application_state
            .session_repository
            .fetch_snapshot(&session_id)
            .await
            .map_err(|store_fault| map_store_fault(store_fault, &session_id))?;

        if session_snapshot.status != SessionStatus::PendingSignature {
            return Err(GatewayError::OnboardingSessionMismatch(format!(
                "session is in phase '{}'; the conversation belongs to 'pending_signature'",
                session_snapshot.status.as_wire_label()
            ))
            .into());
        }

        let current_state = application_state
            .onboarding_repository
            .load_or_genesis(&session_id, Utc::now())
            .await
            .map_err(|store_fault| map_store_fault(store_fault, &session_id))?;

        let turn_outcome = advance_conversation(&current_state, &chat_request.message, Utc::now())
            .map_err(ApiFailure::from)?;

        application_state
            .onboarding_repository
            .save(&turn_outcome.state)
            .await
            .map_err(|store_fault| map_store_fault(store_fault, &session_id))?;

        // Relay del turno hacia los consoladores conectados.
        application_state.event_bus.publish(
            StreamChannel::Chat,
            &session_id,
            "response",
            serde_json::json!({
                "role": "assistant",
                "message": turn_outcome.assistant_message,
                "step": turn_outcome.state.current_step.as_wire_label(),
            }),
        );

        Ok(Json(OnboardingChatResponse {
            session_id,
            assistant_message: turn_outcome.assistant_message,
            state: turn_outcome.state,
        }))
    }

    /// Endpoint: GET /onboarding/state?session_id=… — lectura sin efectos.
    #[instrument(skip(application_state))]
    pub async fn handle_onboarding_state(
        State(application_state): State<AppState>,
        Query(state_query): Query<OnboardingStateQuery>,
    ) -> Result<Json<OnboardingState>, ApiFailure> {
        let session_id = parse_session_identifier(&state_query.session_id)?;

        // La sesión debe existir; la conversación puede no haber comenzado.
        application_state
            .session_repository
            .fetch_snapshot(&session_id)
            .await
            .map_err(|store_fault| map_store_fault(store_fault, &session_id))?;

        let conversational_state = application_state
            .onboarding_repository
            .load(&session_id)
            .await
            .map_err(|store_fault| map_store_fault(store_fault, &session_id))?
            .unwrap_or_else(|| OnboardingState::genesis(session_id, Utc::now()));

        Ok(Json(conversational_state))
    }
}
