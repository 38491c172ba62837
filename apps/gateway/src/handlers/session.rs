// [apps/gateway/src/handlers/session.rs]
/*!
 * =================================================================
 * APARATO: SESSION READ SURFACES (V17.0 - TYPED SNAPSHOTS)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L4)
 * RESPONSABILIDAD: SUPERFICIES TIPADAS DE SOLO LECTURA POR SESIÓN
 *
 * # Logic:
 * Todas las superficies operan sobre snapshots profundos del almacén;
 * ninguna muta estado. La evidencia derivada (TODOs, explicación de
 * verificación) se calcula en el momento de la lectura.
 * =================================================================
 */

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use enclagent_domain_evidence::{derive_gateway_todos, explain_verification, summarize_todos};
use enclagent_domain_models::session::{PreflightCheckRecord, SessionRecord};
use enclagent_domain_models::timeline::TimelineEvent;
use enclagent_domain_models::todo::GatewayTodo;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use crate::api::{map_store_fault, parse_session_identifier, ApiFailure};
use crate::state::AppState;

/// Parámetros del listado por wallet.
#[derive(Debug, Deserialize)]
pub struct WalletListingQuery {
    pub wallet_address: String,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct SessionListingResponse {
    pub sessions: Vec<SessionRecord>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct TimelineResponse {
    pub session_id: Uuid,
    pub events: Vec<TimelineEvent>,
}

#[derive(Debug, Serialize)]
pub struct GatewayTodosResponse {
    pub session_id: Uuid,
    pub todos: Vec<GatewayTodo>,
    pub todo_open_required_count: u32,
    pub todo_open_recommended_count: u32,
    pub todo_status_summary: String,
}

#[derive(Debug, Serialize)]
pub struct FundingPreflightResponse {
    pub session_id: Uuid,
    pub status: String,
    pub failure_category: Option<String>,
    pub checks: Vec<PreflightCheckRecord>,
    pub updated_at: DateTime<Utc>,
}

pub struct SessionReadHandler;

impl SessionReadHandler {
    /// Endpoint: GET /session/{id} — snapshot íntegro del registro.
    #[instrument(skip(application_state))]
    pub async fn handle_get_session(
        State(application_state): State<AppState>,
        Path(raw_session_id): Path<String>,
    ) -> Result<Json<SessionRecord>, ApiFailure> {
        let session_id = parse_session_identifier(&raw_session_id)?;
        let snapshot = application_state
            .session_repository
            .fetch_snapshot(&session_id)
            .await
            .map_err(|store_fault| map_store_fault(store_fault, &session_id))?;
        Ok(Json(snapshot))
    }

    /// Endpoint: GET /sessions?wallet_address=…&limit=… — recencia desc.
    #[instrument(skip(application_state))]
    pub async fn handle_list_sessions(
        State(application_state): State<AppState>,
        Query(listing_query): Query<WalletListingQuery>,
    ) -> Result<Json<SessionListingResponse>, ApiFailure> {
        let snapshots = application_state
            .session_repository
            .list_for_wallet(
                &listing_query.wallet_address,
                listing_query.limit.unwrap_or(20),
            )
            .await
            .map_err(|store_fault| ApiFailure(store_fault.into_gateway_error()))?;

        let total = snapshots.len();
        Ok(Json(SessionListingResponse {
            sessions: snapshots,
            total,
        }))
    }

    /// Endpoint: GET /session/{id}/timeline — registro append-only 1..N.
    #[instrument(skip(application_state))]
    pub async fn handle_get_timeline(
        State(application_state): State<AppState>,
        Path(raw_session_id): Path<String>,
    ) -> Result<Json<TimelineResponse>, ApiFailure> {
        let session_id = parse_session_identifier(&raw_session_id)?;

        // La existencia de la sesión es precondición del timeline.
        application_state
            .session_repository
            .fetch_snapshot(&session_id)
            .await
            .map_err(|store_fault| map_store_fault(store_fault, &session_id))?;

        let events = application_state
            .timeline_repository
            .list_for_session(&session_id)
            .await
            .map_err(|store_fault| map_store_fault(store_fault, &session_id))?;

        Ok(Json(TimelineResponse { session_id, events }))
    }

    /// Endpoint: GET /session/{id}/verification-explanation.
    #[instrument(skip(application_state))]
    pub async fn handle_verification_explanation(
        State(application_state): State<AppState>,
        Path(raw_session_id): Path<String>,
    ) -> Result<Json<enclagent_domain_evidence::VerificationExplanation>, ApiFailure> {
        let session_id = parse_session_identifier(&raw_session_id)?;
        let snapshot = application_state
            .session_repository
            .fetch_snapshot(&session_id)
            .await
            .map_err(|store_fault| map_store_fault(store_fault, &session_id))?;

        Ok(Json(explain_verification(&snapshot)))
    }

    /// Endpoint: GET /session/{id}/gateway-todos — checklist derivado.
    #[instrument(skip(application_state))]
    pub async fn handle_gateway_todos(
        State(application_state): State<AppState>,
        Path(raw_session_id): Path<String>,
    ) -> Result<Json<GatewayTodosResponse>, ApiFailure> {
        let session_id = parse_session_identifier(&raw_session_id)?;
        let snapshot = application_state
            .session_repository
            .fetch_snapshot(&session_id)
            .await
            .map_err(|store_fault| map_store_fault(store_fault, &session_id))?;

        let derived_todos = derive_gateway_todos(&snapshot);
        let summary = summarize_todos(&derived_todos);

        Ok(Json(GatewayTodosResponse {
            session_id,
            todos: derived_todos,
            todo_open_required_count: summary.open_required_count,
            todo_open_recommended_count: summary.open_recommended_count,
            todo_status_summary: summary.status_summary,
        }))
    }

    /// Endpoint: GET /session/{id}/funding-preflight — última batería.
    #[instrument(skip(application_state))]
    pub async fn handle_funding_preflight(
        State(application_state): State<AppState>,
        Path(raw_session_id): Path<String>,
    ) -> Result<Json<FundingPreflightResponse>, ApiFailure> {
        let session_id = parse_session_identifier(&raw_session_id)?;
        let snapshot = application_state
            .session_repository
            .fetch_snapshot(&session_id)
            .await
            .map_err(|store_fault| map_store_fault(store_fault, &session_id))?;

        let status_label = match snapshot.funding_preflight_status {
            enclagent_domain_models::session::FundingPreflightStatus::NotRun => "not_run",
            enclagent_domain_models::session::FundingPreflightStatus::Passed => "passed",
            enclagent_domain_models::session::FundingPreflightStatus::Failed => "failed",
        };

        Ok(Json(FundingPreflightResponse {
            session_id,
            status: status_label.to_string(),
            failure_category: snapshot.funding_preflight_failure_category.clone(),
            checks: snapshot.funding_preflight_checks.clone(),
            updated_at: snapshot.updated_at,
        }))
    }
}
