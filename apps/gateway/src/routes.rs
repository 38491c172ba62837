// [apps/gateway/src/routes.rs]
/*!
 * =================================================================
 * APARATO: SOVEREIGN ROUTING MATRIX (V22.0 - CONTROL PLANE TOPOLOGY)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L4)
 * RESPONSABILIDAD: TOPOLOGÍA DE RUTAS HTTP Y TÚNELES SSE
 *
 * VISION HIPER-HOLÍSTICA:
 * La topología expone tres familias:
 * 1. LAUNCH (challenge/verify/onboarding/suggest-config).
 * 2. EVIDENCE (session snapshots, timeline, todos, preflight).
 * 3. RELAY (SSE por canal + inlet de ingesta del runtime).
 * =================================================================
 */

use crate::handlers::{
    bootstrap, challenge, ingest, onboarding, policy, runtime_control, session, stream, verify,
};
use crate::state::AppState;
use axum::{
    http::{header, Method},
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};

pub fn create_gateway_router(application_shared_state: AppState) -> Router {
    // Escudo de Red: CORS permisivo para el shell y herramientas de Ops.
    let network_security_shield = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(Duration::from_secs(3600));

    // ESTRATO DE LAUNCH: autorización y composición de política.
    let launch_stratum = Router::new()
        .route("/challenge", post(challenge::ChallengeHandler::handle_challenge_issuance))
        .route("/verify", post(verify::VerifyHandler::handle_signature_verification))
        .route("/onboarding/chat", post(onboarding::OnboardingHandler::handle_onboarding_chat))
        .route("/onboarding/state", get(onboarding::OnboardingHandler::handle_onboarding_state))
        .route("/suggest-config", post(policy::PolicySurfaceHandler::handle_suggest_config))
        .route("/policy-templates", get(policy::PolicySurfaceHandler::handle_policy_templates))
        .route("/experience/manifest", get(policy::PolicySurfaceHandler::handle_experience_manifest))
        .route("/config-contract", get(policy::PolicySurfaceHandler::handle_config_contract))
        .route("/bootstrap", get(bootstrap::BootstrapHandler::handle_bootstrap_descriptor));

    // ESTRATO DE EVIDENCIA: superficies tipadas de solo lectura + control.
    let evidence_stratum = Router::new()
        .route("/sessions", get(session::SessionReadHandler::handle_list_sessions))
        .route("/session/:id", get(session::SessionReadHandler::handle_get_session))
        .route("/session/:id/timeline", get(session::SessionReadHandler::handle_get_timeline))
        .route(
            "/session/:id/verification-explanation",
            get(session::SessionReadHandler::handle_verification_explanation),
        )
        .route(
            "/session/:id/gateway-todos",
            get(session::SessionReadHandler::handle_gateway_todos),
        )
        .route(
            "/session/:id/funding-preflight",
            get(session::SessionReadHandler::handle_funding_preflight),
        )
        .route(
            "/session/:id/runtime-control",
            post(runtime_control::RuntimeControlHandler::handle_runtime_control),
        );

    // ESTRATO DE RELAY: túneles SSE por canal + inlet del runtime.
    let relay_stratum = Router::new()
        .route("/chat/events", get(stream::establish_chat_event_stream))
        .route("/logs/events", get(stream::establish_log_event_stream))
        .route("/jobs/events", get(stream::establish_job_event_stream))
        .route(
            "/runtime/ingest-event",
            post(ingest::RuntimeIngestHandler::handle_runtime_event_ingest),
        );

    // COMPOSICIÓN GLOBAL (Root Topology)
    Router::new()
        .route("/healthz", get(bootstrap::BootstrapHandler::handle_liveness_probe))
        .merge(launch_stratum)
        .merge(evidence_stratum)
        .merge(relay_stratum)
        .layer(network_security_shield)
        .with_state(application_shared_state)
}
