// [apps/gateway/src/handlers/bootstrap.rs]
/*!
 * =================================================================
 * APARATO: BOOTSTRAP DESCRIPTOR HANDLER (V9.0 - CAPABILITY PROBE)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L4)
 * RESPONSABILIDAD: DESCRIPTOR DE CAPACIDADES Y SONDA DE VIDA
 * =================================================================
 */

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

/// Descriptor de capacidades consumido por el shell en el arranque.
#[derive(Debug, Serialize)]
pub struct BootstrapDescriptor {
    pub enabled: bool,
    pub require_privy: bool,
    pub privy_app_id: Option<String>,
    pub provisioning_backend: String,
    pub poll_interval_ms: u64,
}

pub struct BootstrapHandler;

impl BootstrapHandler {
    /// Endpoint: GET /bootstrap — capacidades vigentes del despliegue.
    pub async fn handle_bootstrap_descriptor(
        State(application_state): State<AppState>,
    ) -> Json<BootstrapDescriptor> {
        let environment = &application_state.environment;

        Json(BootstrapDescriptor {
            enabled: environment.frontdoor_enabled,
            require_privy: environment.require_privy,
            privy_app_id: environment.privy_app_id.clone(),
            provisioning_backend: environment
                .effective_provisioning_source()
                .as_wire_label()
                .to_string(),
            poll_interval_ms: environment.poll_interval_ms,
        })
    }

    /// Endpoint: GET /healthz — sonda de vida de la plataforma.
    pub async fn handle_liveness_probe() -> &'static str {
        "STATUS_OK"
    }
}
