// [libs/domain/evidence/src/lib.rs]
/*!
 * =================================================================
 * APARATO: SESSION EVIDENCE DERIVER (V12.0 - PURE CHECKLIST)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: DERIVACIÓN PURA DE TODOS Y EXPLICACIÓN DE VERIFICACIÓN
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. ZERO OWN STATE: Todo artefacto de este estrato es función pura del
 *    snapshot de sesión; el feed no puede derivar ni desincronizarse.
 * 2. MODULE PROJECTION: La proyección de módulo del shell se evalúa como
 *    lista ordenada contra el snapshot; sin retro-referencias.
 * =================================================================
 */

use enclagent_domain_models::session::{
    FundingPreflightStatus, ProvisioningSource, RuntimeState, SessionRecord, SessionStatus,
};
use enclagent_domain_models::todo::{
    EvidenceRefs, GatewayTodo, TodoOwner, TodoSeverity, TodoStatus,
};
use serde::{Deserialize, Serialize};
use typeshare::typeshare;
use uuid::Uuid;

/// Resumen agregado del checklist, sellado en el snapshot de sesión.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoSummary {
    pub open_required_count: u32,
    pub open_recommended_count: u32,
    pub status_summary: String,
}

/// Explicación de verificación servida por el gateway.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationExplanation {
    pub session_id: Uuid,
    /// Backend declarado por la política ("eigencloud_primary" | "fallback_only").
    pub backend: Option<String>,
    /// Nivel de garantía propagado desde la política.
    pub level: Option<String>,
    pub fallback_used: bool,
    #[typeshare(serialized_as = "number")]
    pub latency_ms: Option<u64>,
    pub failure_reason: Option<String>,
}

/// Proyección del módulo del shell que corresponde al snapshot.
/// Cadena unidireccional: identity -> policy -> verification ->
/// provisioning -> runtime -> evidence.
pub fn project_module_state(session: &SessionRecord) -> &'static str {
    match session.status {
        SessionStatus::PendingSignature => "policy",
        SessionStatus::Provisioning => "provisioning",
        SessionStatus::Ready => {
            if session.runtime_state == RuntimeState::Terminated {
                "evidence"
            } else {
                "runtime"
            }
        }
        SessionStatus::Failed | SessionStatus::Expired => "evidence",
    }
}

fn evidence_refs(session: &SessionRecord) -> EvidenceRefs {
    EvidenceRefs {
        session_id: session.session_id,
        provisioning_source: session.provisioning_source.as_wire_label().to_string(),
        verification_level: session
            .verification_level
            .map(|level| serde_json::to_value(level))
            .and_then(Result::ok)
            .and_then(|value| value.as_str().map(str::to_string)),
        module_state: project_module_state(session).to_string(),
        control_state: session.runtime_state.as_wire_label().to_string(),
    }
}

fn todo(
    session: &SessionRecord,
    todo_id: &str,
    severity: TodoSeverity,
    status: TodoStatus,
    owner: TodoOwner,
    action: &str,
) -> GatewayTodo {
    GatewayTodo {
        todo_id: todo_id.to_string(),
        severity,
        status,
        owner,
        action: action.to_string(),
        evidence_refs: evidence_refs(session),
    }
}

/// Deriva el checklist completo del gateway para un snapshot de sesión.
pub fn derive_gateway_todos(session: &SessionRecord) -> Vec<GatewayTodo> {
    let mut derived_todos = Vec::with_capacity(6);

    // 1. AUTORIZACIÓN FIRMADA (requerido, usuario)
    let signature_status = match session.status {
        SessionStatus::PendingSignature => TodoStatus::Open,
        SessionStatus::Failed | SessionStatus::Expired => TodoStatus::Blocked,
        _ => TodoStatus::Satisfied,
    };
    derived_todos.push(todo(
        session,
        "sign_authorization",
        TodoSeverity::Required,
        signature_status,
        TodoOwner::User,
        "sign the gateway authorization challenge with the bound wallet",
    ));

    // 2. POLÍTICA ANCLADA (requerido, usuario)
    let policy_status = if session.config.is_some() {
        TodoStatus::Satisfied
    } else if session.status == SessionStatus::PendingSignature {
        TodoStatus::Open
    } else {
        TodoStatus::Blocked
    };
    derived_todos.push(todo(
        session,
        "anchor_policy_config",
        TodoSeverity::Required,
        policy_status,
        TodoOwner::User,
        "complete onboarding and submit a validated policy configuration",
    ));

    // 3. BACKEND DE APROVISIONAMIENTO (requerido, operador)
    let backend_status = if session.provisioning_source == ProvisioningSource::Unconfigured {
        TodoStatus::Open
    } else {
        TodoStatus::Satisfied
    };
    derived_todos.push(todo(
        session,
        "configure_provisioning_backend",
        TodoSeverity::Required,
        backend_status,
        TodoOwner::Operator,
        "configure a provisioning command or a default instance url",
    ));

    // 4. RESERVA DE FONDOS (requerido, usuario)
    let funding_status = match (session.funding_preflight_status, &session.funding_preflight_failure_category) {
        (FundingPreflightStatus::Passed, _) => TodoStatus::Satisfied,
        (FundingPreflightStatus::NotRun, _) => TodoStatus::Open,
        (FundingPreflightStatus::Failed, Some(category))
            if category == "gas_reserve_estimate" || category == "fee_budget_reserve" =>
        {
            TodoStatus::Open
        }
        (FundingPreflightStatus::Failed, _) => TodoStatus::Blocked,
    };
    derived_todos.push(todo(
        session,
        "fund_gas_and_fee_reserve",
        TodoSeverity::Required,
        funding_status,
        TodoOwner::User,
        "fund the wallet so the preflight reserve checks pass",
    ));

    // 5. REVISIÓN DE EVIDENCIA (recomendado, usuario)
    let evidence_status = match session.status {
        SessionStatus::Ready if session.verification_fallback_used => TodoStatus::Open,
        SessionStatus::Ready => TodoStatus::Satisfied,
        _ => TodoStatus::Blocked,
    };
    derived_todos.push(todo(
        session,
        "review_verification_evidence",
        TodoSeverity::Recommended,
        evidence_status,
        TodoOwner::User,
        "review the verification explanation and the fallback receipt chain",
    ));

    // 6. ROTACIÓN DE CLAVE (recomendado, operador)
    let rotation_status = match (session.status, session.runtime_state) {
        (SessionStatus::Ready, RuntimeState::Running | RuntimeState::Paused) => TodoStatus::Open,
        (SessionStatus::Ready, RuntimeState::Terminated) => TodoStatus::Blocked,
        _ => TodoStatus::Blocked,
    };
    derived_todos.push(todo(
        session,
        "rotate_auth_key_periodically",
        TodoSeverity::Recommended,
        rotation_status,
        TodoOwner::Operator,
        "rotate the runtime auth key on a regular cadence",
    ));

    derived_todos
}

/// Agrega los contadores derivados que el almacén sella en el snapshot.
pub fn summarize_todos(derived_todos: &[GatewayTodo]) -> TodoSummary {
    let open_required_count = derived_todos
        .iter()
        .filter(|item| item.severity == TodoSeverity::Required && item.status == TodoStatus::Open)
        .count() as u32;
    let open_recommended_count = derived_todos
        .iter()
        .filter(|item| {
            item.severity == TodoSeverity::Recommended && item.status == TodoStatus::Open
        })
        .count() as u32;

    let status_summary = if open_required_count == 0 && open_recommended_count == 0 {
        "all clear".to_string()
    } else {
        format!(
            "{} required / {} recommended open",
            open_required_count, open_recommended_count
        )
    };

    TodoSummary {
        open_required_count,
        open_recommended_count,
        status_summary,
    }
}

/// Construye la explicación de verificación desde el snapshot.
pub fn explain_verification(session: &SessionRecord) -> VerificationExplanation {
    let failure_reason = match &session.funding_preflight_failure_category {
        Some(category) if category == "verification_backend_reachable" => session
            .funding_preflight_checks
            .iter()
            .find(|check| check.check_id == "verification_backend_reachable")
            .map(|check| check.detail.clone()),
        _ => None,
    };

    VerificationExplanation {
        session_id: session.session_id,
        backend: session
            .verification_backend
            .map(|backend| serde_json::to_value(backend))
            .and_then(Result::ok)
            .and_then(|value| value.as_str().map(str::to_string)),
        level: session
            .verification_level
            .map(|level| serde_json::to_value(level))
            .and_then(Result::ok)
            .and_then(|value| value.as_str().map(str::to_string)),
        fallback_used: session.verification_fallback_used,
        latency_ms: session.verification_latency_ms,
        failure_reason,
    }
}
