// [apps/gateway/src/api.rs]
/*!
 * =================================================================
 * APARATO: WIRE FAULT PROJECTOR (V8.0 - ENVELOPE AUTHORITY)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L4)
 * RESPONSABILIDAD: PROYECCIÓN DE FALLOS DE DOMINIO AL SOBRE DE CABLE
 *
 * # Logic:
 * Todo handler devuelve 'Result<Json<T>, ApiFailure>'. El sobre de
 * fallo es siempre {error, error_code, operator_hint} más los campos
 * estructurados de la variante, con el estatus HTTP canónico.
 * =================================================================
 */

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use enclagent_domain_models::errors::GatewayError;
use enclagent_infra_store::StoreError;
use uuid::Uuid;

/// Envoltorio de fallo listo para el cable.
#[derive(Debug)]
pub struct ApiFailure(pub GatewayError);

impl From<GatewayError> for ApiFailure {
    fn from(domain_fault: GatewayError) -> Self {
        Self(domain_fault)
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let http_status = StatusCode::from_u16(self.0.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (http_status, Json(self.0.to_wire_envelope())).into_response()
    }
}

/// Proyecta un fallo de persistencia al sobre de cable, restaurando el
/// identificador real de la sesión para el mensaje humano.
pub fn map_store_fault(store_fault: StoreError, session_id: &Uuid) -> ApiFailure {
    match store_fault {
        StoreError::SessionNotFound => {
            ApiFailure(GatewayError::SessionNotFound(session_id.to_string()))
        }
        other_fault => ApiFailure(other_fault.into_gateway_error()),
    }
}

/// Certifica que un identificador de sesión es un UUID bien formado.
pub fn parse_session_identifier(raw_session_id: &str) -> Result<Uuid, ApiFailure> {
    Uuid::parse_str(raw_session_id.trim())
        .map_err(|_| ApiFailure(GatewayError::InvalidSessionId(raw_session_id.to_string())))
}
