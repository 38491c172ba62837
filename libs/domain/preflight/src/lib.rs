// [libs/domain/preflight/src/lib.rs]
/*!
 * =================================================================
 * APARATO: FUNDING PREFLIGHT BATTERY (V15.0 - DETERMINISTIC GAUNTLET)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: BATERÍA ORDENADA DE CHEQUEOS PREVIOS AL LAUNCH
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. PURE GAUNTLET: Cada chequeo es una función pura del triplete
 *    (sesión, política, entorno inmutable); dos ejecuciones sobre el
 *    mismo snapshot producen exactamente el mismo reporte.
 * 2. FIRST FAILURE CATEGORY: El agregado reporta como categoría el id
 *    del primer chequeo fallido, en el orden canónico de la batería.
 * 3. SKIP SEMANTICS: Un chequeo omitido ('skipped') jamás contamina el
 *    veredicto agregado.
 *
 * # Mathematical Proof (Aggregate Determinism):
 * status = passed  <=>  ∀ c ∈ checks, c.status ∈ {passed, skipped}.
 * La categoría de fallo es min-index sobre los fallidos, por lo que el
 * par (status, failure_category) es función del snapshot y nada más.
 * =================================================================
 */

use enclagent_domain_models::config::{PolicyConfig, VerificationBackend};
use enclagent_domain_models::session::{
    FundingPreflightStatus, PreflightCheckRecord, PreflightCheckStatus, SessionRecord,
};
use tracing::{debug, instrument};

/// Orden canónico de la batería.
pub const CANONICAL_CHECK_ORDER: &[&str] = &[
    "wallet_binding",
    "identity_token_present",
    "policy_self_consistent",
    "gas_reserve_estimate",
    "fee_budget_reserve",
    "verification_backend_reachable",
];

/// Reserva mínima de asignación para cubrir gas del primer ciclo.
const GAS_RESERVE_FLOOR_USD: f64 = 25.0;

/// Fracción máxima del nocional por operación que puede consumir slippage.
const FEE_BUDGET_CEILING_FRACTION: f64 = 0.05;

/// Presupuesto mínimo de timeout para una ronda de atestación remota.
const ATTESTATION_ROUND_TRIP_FLOOR_MS: u64 = 1_000;

/// Reporte agregado de la batería.
#[derive(Debug, Clone)]
pub struct PreflightReport {
    pub status: FundingPreflightStatus,
    pub failure_category: Option<String>,
    pub checks: Vec<PreflightCheckRecord>,
    /// Latencia estimada del backend de verificación, si se sondeó.
    pub verification_latency_ms: Option<u64>,
    /// La verificación quedará atendida por el fallback local.
    pub verification_fallback_used: bool,
}

fn check_record(
    check_id: &str,
    status: PreflightCheckStatus,
    detail: impl Into<String>,
) -> PreflightCheckRecord {
    PreflightCheckRecord {
        check_id: check_id.to_string(),
        status,
        detail: detail.into(),
    }
}

/// Chequeo 1: la wallet de custodia de la política coincide con la sesión.
fn audit_wallet_binding(session: &SessionRecord, policy: &PolicyConfig) -> PreflightCheckRecord {
    match &policy.user_wallet_address {
        Some(user_wallet) if user_wallet != &session.wallet_address => check_record(
            "wallet_binding",
            PreflightCheckStatus::Failed,
            "policy user wallet diverges from the session wallet",
        ),
        Some(_) => check_record(
            "wallet_binding",
            PreflightCheckStatus::Passed,
            "policy custody wallet bound to the session wallet",
        ),
        None => check_record(
            "wallet_binding",
            PreflightCheckStatus::Passed,
            "custody mode does not bind a user wallet",
        ),
    }
}

/// Chequeo 2: presencia del token de identidad embebida cuando se exige.
fn audit_identity_token(session: &SessionRecord, require_privy: bool) -> PreflightCheckRecord {
    match (&session.privy_user_id, require_privy) {
        (Some(_), _) => check_record(
            "identity_token_present",
            PreflightCheckStatus::Passed,
            "embedded identity bound to the session",
        ),
        (None, false) => check_record(
            "identity_token_present",
            PreflightCheckStatus::Passed,
            "embedded identity not required by deployment",
        ),
        (None, true) => check_record(
            "identity_token_present",
            PreflightCheckStatus::Failed,
            "deployment requires an embedded identity and none is bound",
        ),
    }
}

/// Chequeo 3: auto-consistencia transversal de la política anclada.
fn audit_policy_self_consistency(policy: &PolicyConfig) -> PreflightCheckRecord {
    if policy.max_leverage > policy.leverage_cap {
        return check_record(
            "policy_self_consistent",
            PreflightCheckStatus::Failed,
            "max_leverage exceeds leverage_cap",
        );
    }
    if policy.per_trade_notional_cap_usd > policy.max_allocation_usd {
        return check_record(
            "policy_self_consistent",
            PreflightCheckStatus::Failed,
            "per-trade notional cap exceeds the total allocation",
        );
    }
    if policy.symbol_allowlist.is_empty() || !policy.accept_terms {
        return check_record(
            "policy_self_consistent",
            PreflightCheckStatus::Failed,
            "policy lost a mandatory field after anchoring",
        );
    }
    check_record(
        "policy_self_consistent",
        PreflightCheckStatus::Passed,
        "cross-field policy invariants hold",
    )
}

/// Chequeo 4: la asignación total cubre la reserva de gas del primer ciclo.
fn audit_gas_reserve(policy: &PolicyConfig) -> PreflightCheckRecord {
    if policy.max_allocation_usd < GAS_RESERVE_FLOOR_USD {
        return check_record(
            "gas_reserve_estimate",
            PreflightCheckStatus::Failed,
            format!(
                "max_allocation_usd below the {} USD gas reserve floor",
                GAS_RESERVE_FLOOR_USD
            ),
        );
    }
    check_record(
        "gas_reserve_estimate",
        PreflightCheckStatus::Passed,
        format!("allocation covers the {} USD gas reserve floor", GAS_RESERVE_FLOOR_USD),
    )
}

/// Chequeo 5: el presupuesto de slippage no devora el nocional por operación.
fn audit_fee_budget(policy: &PolicyConfig) -> PreflightCheckRecord {
    let slippage_fraction = f64::from(policy.max_slippage_bps) / 10_000.0;
    if slippage_fraction > FEE_BUDGET_CEILING_FRACTION {
        return check_record(
            "fee_budget_reserve",
            PreflightCheckStatus::Failed,
            format!(
                "slippage budget {:.2}% exceeds the {:.0}% per-trade ceiling",
                slippage_fraction * 100.0,
                FEE_BUDGET_CEILING_FRACTION * 100.0
            ),
        );
    }
    check_record(
        "fee_budget_reserve",
        PreflightCheckStatus::Passed,
        format!("slippage budget {:.2}% within ceiling", slippage_fraction * 100.0),
    )
}

/// Chequeo 6: presupuesto de alcance del backend de verificación.
/// Omitido cuando la política es fallback-only.
fn audit_verification_reachability(
    policy: &PolicyConfig,
) -> (PreflightCheckRecord, Option<u64>, bool) {
    if policy.verification_backend == VerificationBackend::FallbackOnly {
        return (
            check_record(
                "verification_backend_reachable",
                PreflightCheckStatus::Skipped,
                "fallback-only policy; remote probe not required",
            ),
            None,
            true,
        );
    }

    if policy.verification_eigencloud_timeout_ms < ATTESTATION_ROUND_TRIP_FLOOR_MS {
        return (
            check_record(
                "verification_backend_reachable",
                PreflightCheckStatus::Failed,
                format!(
                    "timeout budget {} ms below the {} ms attestation round-trip floor",
                    policy.verification_eigencloud_timeout_ms, ATTESTATION_ROUND_TRIP_FLOOR_MS
                ),
            ),
            None,
            false,
        );
    }

    // Estimación determinista de latencia: décima parte del presupuesto,
    // acotada al techo de una ronda interactiva.
    let estimated_latency_ms = (policy.verification_eigencloud_timeout_ms / 10).min(800);
    (
        check_record(
            "verification_backend_reachable",
            PreflightCheckStatus::Passed,
            format!("attestation budget admits a {} ms round-trip", estimated_latency_ms),
        ),
        Some(estimated_latency_ms),
        false,
    )
}

/// Ejecuta la batería completa en orden canónico y agrega el veredicto.
#[instrument(skip(session, policy), fields(session_id = %session.session_id))]
pub fn run_preflight_battery(
    session: &SessionRecord,
    policy: &PolicyConfig,
    require_privy: bool,
) -> PreflightReport {
    let (reachability_check, verification_latency_ms, verification_fallback_used) =
        audit_verification_reachability(policy);

    let checks = vec![
        audit_wallet_binding(session, policy),
        audit_identity_token(session, require_privy),
        audit_policy_self_consistency(policy),
        audit_gas_reserve(policy),
        audit_fee_budget(policy),
        reachability_check,
    ];

    let first_failure = checks
        .iter()
        .find(|check| check.status == PreflightCheckStatus::Failed);

    let report = match first_failure {
        Some(failing_check) => PreflightReport {
            status: FundingPreflightStatus::Failed,
            failure_category: Some(failing_check.check_id.clone()),
            checks,
            verification_latency_ms,
            verification_fallback_used,
        },
        None => PreflightReport {
            status: FundingPreflightStatus::Passed,
            failure_category: None,
            checks,
            verification_latency_ms,
            verification_fallback_used,
        },
    };

    debug!(
        "🛫 [PREFLIGHT]: Battery verdict [{}] for session {}.",
        match report.status {
            FundingPreflightStatus::Passed => "passed",
            FundingPreflightStatus::Failed => "failed",
            FundingPreflightStatus::NotRun => "not_run",
        },
        session.session_id
    );

    report
}
