// [apps/gateway/src/handlers/challenge.rs]
/*!
 * =================================================================
 * APARATO: CHALLENGE ISSUANCE HANDLER (V12.0 - FRONTDOOR GATE)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L4)
 * RESPONSABILIDAD: EMISIÓN DEL CHALLENGE DE AUTORIZACIÓN POR WALLET
 *
 * # Logic:
 * 1. Guardas de configuración del despliegue (frontdoor, privy).
 * 2. Forja de la sesión pendiente con su challenge canónico.
 * 3. Respuesta tipada {session_id, message, version, expires_at}.
 * =================================================================
 */

use axum::extract::{Json, State};
use chrono::{DateTime, Utc};
use enclagent_domain_models::errors::GatewayError;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::api::{map_store_fault, ApiFailure};
use crate::state::AppState;

/// Solicitud de emisión de challenge.
#[derive(Debug, Deserialize)]
pub struct ChallengeRequest {
    pub wallet_address: String,
    pub privy_user_id: Option<String>,
    pub chain_id: Option<u64>,
}

/// Sobre de respuesta de la emisión.
#[derive(Debug, Serialize)]
pub struct ChallengeResponse {
    pub session_id: Uuid,
    /// Bytes exactos que la wallet debe firmar (EIP-191 personal_sign).
    pub message: String,
    pub version: u64,
    pub expires_at: DateTime<Utc>,
}

pub struct ChallengeHandler;

impl ChallengeHandler {
    /**
     * Endpoint: POST /challenge
     *
     * # Errors:
     * - `frontdoor_disabled` si el despliegue tiene la puerta cerrada.
     * - `privy_app_id_missing` si se exige identidad embebida sin app id.
     * - `invalid_wallet_address` si la wallet no es canónica.
     */
    #[instrument(skip(application_state, request_payload))]
    pub async fn handle_challenge_issuance(
        State(application_state): State<AppState>,
        Json(request_payload): Json<ChallengeRequest>,
    ) -> Result<Json<ChallengeResponse>, ApiFailure> {
        let environment = &application_state.environment;

        // 1. GUARDAS DE CONFIGURACIÓN DEL DESPLIEGUE
        if !environment.frontdoor_enabled {
            return Err(GatewayError::FrontdoorDisabled.into());
        }
        if environment.require_privy && environment.privy_app_id.is_none() {
            return Err(GatewayError::PrivyAppIdMissing.into());
        }

        // 2. FORJA DE LA SESIÓN PENDIENTE
        let genesis_record = application_state
            .session_repository
            .create_pending(
                &request_payload.wallet_address,
                request_payload.privy_user_id,
                request_payload.chain_id,
                environment.effective_provisioning_source(),
                environment.challenge_ttl_seconds,
                environment.session_ttl_seconds,
            )
            .await
            .map_err(|store_fault| map_store_fault(store_fault, &Uuid::nil()))?;

        info!(
            "🪪 [CHALLENGE_ISSUED]: Session {} awaiting signature.",
            genesis_record.session_id
        );

        Ok(Json(ChallengeResponse {
            session_id: genesis_record.session_id,
            message: genesis_record.challenge_message,
            version: genesis_record.version,
            expires_at: genesis_record.challenge_expires_at,
        }))
    }
}
