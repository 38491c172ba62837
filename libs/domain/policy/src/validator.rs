// [libs/domain/policy/src/validator.rs]
/*!
 * =================================================================
 * APARATO: TOTAL CONFIG VALIDATOR (V19.0 - INVARIANT GATEKEEPER)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: NORMALIZACIÓN Y VALIDACIÓN TOTAL DEL BORRADOR DE POLÍTICA
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. TOTAL DECODING: Todo borrador produce o bien una política inmutable
 *    o bien un fallo tipado con (field, reason); no existen estados grises.
 * 2. FIRST FAULT WINS: El validador reporta el primer campo ofensor en
 *    orden de declaración, produciendo diagnósticos deterministas.
 * 3. NORMALIZATION FIRST: Direcciones a minúsculas canónicas, símbolos a
 *    mayúsculas sin duplicados, antes de cualquier chequeo de rango.
 * =================================================================
 */

use enclagent_domain_models::config::{
    CustodyMode, InformationSharingScope, PaperLivePolicy, PolicyConfig, PolicyConfigDraft,
    VerificationBackend, VerificationLevel,
};
use enclagent_domain_models::errors::GatewayError;
use enclagent_domain_models::wallet::normalize_wallet_address;

use crate::DEFAULT_PROFILE_DOMAIN;

// --- DEFAULTS DEL CONTRATO (aplicados a campos ausentes del borrador) ---

const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 15_000;
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_RETRY_BACKOFF_MS: u64 = 2_000;
const DEFAULT_MAX_POSITION_SIZE_USD: f64 = 10_000.0;
const DEFAULT_LEVERAGE_CAP: f64 = 5.0;
const DEFAULT_MAX_LEVERAGE: f64 = 2.0;
const DEFAULT_MAX_ALLOCATION_USD: f64 = 25_000.0;
const DEFAULT_PER_TRADE_NOTIONAL_CAP_USD: f64 = 5_000.0;
const DEFAULT_MAX_SLIPPAGE_BPS: u32 = 50;
const DEFAULT_EIGENCLOUD_TIMEOUT_MS: u64 = 30_000;

fn config_fault(field: &str, reason: impl Into<String>) -> GatewayError {
    GatewayError::ConfigInvalid {
        field: field.to_string(),
        reason: reason.into(),
    }
}

/// Certifica un rango cerrado para magnitudes enteras.
fn audit_integer_range(
    field: &'static str,
    value: u64,
    lower_bound: u64,
    upper_bound: u64,
) -> Result<u64, GatewayError> {
    if value < lower_bound || value > upper_bound {
        return Err(config_fault(
            field,
            format!("must be within [{}, {}], got {}", lower_bound, upper_bound, value),
        ));
    }
    Ok(value)
}

/// Certifica un rango cerrado para magnitudes monetarias/apalancamiento.
fn audit_decimal_range(
    field: &'static str,
    value: f64,
    lower_bound: f64,
    upper_bound: f64,
) -> Result<f64, GatewayError> {
    if !value.is_finite() || value < lower_bound || value > upper_bound {
        return Err(config_fault(
            field,
            format!("must be within [{}, {}], got {}", lower_bound, upper_bound, value),
        ));
    }
    Ok(value)
}

/// Normaliza una lista de símbolos: mayúsculas, sin blancos, sin duplicados,
/// preservando el orden de primera aparición.
fn normalize_symbol_list(raw_symbols: &[String]) -> Vec<String> {
    let mut normalized_symbols: Vec<String> = Vec::with_capacity(raw_symbols.len());
    for raw_symbol in raw_symbols {
        let candidate = raw_symbol.trim().to_ascii_uppercase();
        if !candidate.is_empty() && !normalized_symbols.contains(&candidate) {
            normalized_symbols.push(candidate);
        }
    }
    normalized_symbols
}

/// Valida y normaliza un borrador de política contra los invariantes del
/// dominio, anclándolo a la wallet de la sesión.
///
/// # Errors:
/// `GatewayError::ConfigInvalid { field, reason }` con el primer campo
/// ofensor en orden de declaración.
pub fn validate_policy_draft(
    draft: &PolicyConfigDraft,
    session_wallet_address: &str,
) -> Result<PolicyConfig, GatewayError> {
    // 1. IDENTIDAD DEL PERFIL
    let profile_name = draft
        .profile_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| config_fault("profile_name", "profile_name is required"))?
        .to_string();

    let profile_domain = draft
        .profile_domain
        .as_deref()
        .map(str::trim)
        .filter(|domain| !domain.is_empty())
        .unwrap_or(DEFAULT_PROFILE_DOMAIN)
        .to_ascii_lowercase();

    let objective = draft
        .objective
        .as_deref()
        .map(str::trim)
        .filter(|objective| !objective.is_empty())
        .ok_or_else(|| config_fault("objective", "objective is required"))?
        .to_string();

    // 2. CUSTODIA Y DIRECCIONES CANÓNICAS
    let custody_mode = draft.custody_mode.unwrap_or(CustodyMode::UserWallet);

    let operator_wallet_address = match &draft.operator_wallet_address {
        Some(raw_address) => Some(
            normalize_wallet_address(raw_address)
                .map_err(|_| config_fault("operator_wallet_address", "not a canonical EVM address"))?,
        ),
        None => None,
    };
    let user_wallet_address = match &draft.user_wallet_address {
        Some(raw_address) => Some(
            normalize_wallet_address(raw_address)
                .map_err(|_| config_fault("user_wallet_address", "not a canonical EVM address"))?,
        ),
        None => None,
    };

    if matches!(custody_mode, CustodyMode::OperatorWallet | CustodyMode::DualMode)
        && operator_wallet_address.is_none()
    {
        return Err(config_fault(
            "operator_wallet_address",
            "required for operator_wallet and dual_mode custody",
        ));
    }
    if matches!(custody_mode, CustodyMode::UserWallet | CustodyMode::DualMode) {
        match &user_wallet_address {
            None => {
                return Err(config_fault(
                    "user_wallet_address",
                    "required for user_wallet and dual_mode custody",
                ))
            }
            Some(address) if address != session_wallet_address => {
                return Err(config_fault(
                    "user_wallet_address",
                    "must equal the session wallet address",
                ))
            }
            Some(_) => {}
        }
    }

    // 3. UNIVERSO DE SÍMBOLOS
    let symbol_allowlist = normalize_symbol_list(draft.symbol_allowlist.as_deref().unwrap_or(&[]));
    if symbol_allowlist.is_empty() {
        return Err(config_fault("symbol_allowlist", "allowlist must not be empty"));
    }
    let symbol_denylist = normalize_symbol_list(draft.symbol_denylist.as_deref().unwrap_or(&[]));

    // 4. RANGOS NUMÉRICOS SOBERANOS
    let request_timeout_ms = audit_integer_range(
        "request_timeout_ms",
        draft.request_timeout_ms.unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS),
        1_000,
        120_000,
    )?;
    let max_retries = audit_integer_range(
        "max_retries",
        u64::from(draft.max_retries.unwrap_or(DEFAULT_MAX_RETRIES)),
        0,
        10,
    )? as u32;
    let retry_backoff_ms = audit_integer_range(
        "retry_backoff_ms",
        draft.retry_backoff_ms.unwrap_or(DEFAULT_RETRY_BACKOFF_MS),
        0,
        30_000,
    )?;
    let max_position_size_usd = audit_decimal_range(
        "max_position_size_usd",
        draft.max_position_size_usd.unwrap_or(DEFAULT_MAX_POSITION_SIZE_USD),
        1.0,
        10_000_000.0,
    )?;
    let leverage_cap = audit_decimal_range(
        "leverage_cap",
        draft.leverage_cap.unwrap_or(DEFAULT_LEVERAGE_CAP),
        1.0,
        20.0,
    )?;
    let max_leverage = audit_decimal_range(
        "max_leverage",
        draft.max_leverage.unwrap_or(DEFAULT_MAX_LEVERAGE),
        1.0,
        20.0,
    )?;
    if max_leverage > leverage_cap {
        return Err(config_fault(
            "max_leverage",
            format!("must not exceed leverage_cap ({})", leverage_cap),
        ));
    }
    let max_allocation_usd = audit_decimal_range(
        "max_allocation_usd",
        draft.max_allocation_usd.unwrap_or(DEFAULT_MAX_ALLOCATION_USD),
        1.0,
        10_000_000.0,
    )?;
    let per_trade_notional_cap_usd = audit_decimal_range(
        "per_trade_notional_cap_usd",
        draft
            .per_trade_notional_cap_usd
            .unwrap_or(DEFAULT_PER_TRADE_NOTIONAL_CAP_USD),
        1.0,
        10_000_000.0,
    )?;
    if per_trade_notional_cap_usd > max_allocation_usd {
        return Err(config_fault(
            "per_trade_notional_cap_usd",
            format!("must not exceed max_allocation_usd ({})", max_allocation_usd),
        ));
    }
    let max_slippage_bps = audit_integer_range(
        "max_slippage_bps",
        u64::from(draft.max_slippage_bps.unwrap_or(DEFAULT_MAX_SLIPPAGE_BPS)),
        1,
        5_000,
    )? as u32;
    let verification_eigencloud_timeout_ms = audit_integer_range(
        "verification_eigencloud_timeout_ms",
        draft
            .verification_eigencloud_timeout_ms
            .unwrap_or(DEFAULT_EIGENCLOUD_TIMEOUT_MS),
        1,
        120_000,
    )?;

    // 5. CLAVE DE MANDO DEL RUNTIME
    let gateway_auth_key = draft
        .gateway_auth_key
        .as_deref()
        .ok_or_else(|| config_fault("gateway_auth_key", "gateway_auth_key is required"))?
        .to_string();
    if gateway_auth_key.len() < 16 || gateway_auth_key.len() > 128 {
        return Err(config_fault(
            "gateway_auth_key",
            "length must be within [16, 128] characters",
        ));
    }
    if gateway_auth_key.chars().any(char::is_whitespace) {
        return Err(config_fault("gateway_auth_key", "must not contain whitespace"));
    }

    // 6. ESTRATO DE VERIFICACIÓN
    let verification_backend = draft
        .verification_backend
        .unwrap_or(VerificationBackend::EigencloudPrimary);
    let verification_fallback_enabled = draft.verification_fallback_enabled.unwrap_or(false);
    if verification_backend == VerificationBackend::FallbackOnly && !verification_fallback_enabled {
        return Err(config_fault(
            "verification_backend",
            "fallback_only requires verification_fallback_enabled=true",
        ));
    }
    let verification_level = draft.verification_level.unwrap_or(match verification_backend {
        VerificationBackend::EigencloudPrimary => VerificationLevel::Attested,
        VerificationBackend::FallbackOnly => VerificationLevel::SignedReceipts,
    });
    let verification_fallback_chain_path = match draft.verification_fallback_chain_path.as_deref() {
        Some(raw_path) => {
            if raw_path.contains('\n') || raw_path.contains('\r') {
                return Err(config_fault(
                    "verification_fallback_chain_path",
                    "must not contain line terminators",
                ));
            }
            Some(raw_path.to_string())
        }
        None => None,
    };

    // 7. ACEPTACIÓN EXPLÍCITA DE TÉRMINOS
    if !draft.accept_terms.unwrap_or(false) {
        return Err(config_fault("accept_terms", "terms must be accepted"));
    }

    Ok(PolicyConfig {
        profile_name,
        profile_domain,
        objective,
        user_wallet_address,
        operator_wallet_address,
        custody_mode,
        paper_live_policy: draft.paper_live_policy.unwrap_or(PaperLivePolicy::PaperFirst),
        symbol_allowlist,
        symbol_denylist,
        request_timeout_ms,
        max_retries,
        retry_backoff_ms,
        max_position_size_usd,
        leverage_cap,
        max_leverage,
        max_allocation_usd,
        per_trade_notional_cap_usd,
        max_slippage_bps,
        gateway_auth_key,
        verification_backend,
        verification_level,
        verification_fallback_enabled,
        verification_fallback_require_signed_receipts: draft
            .verification_fallback_require_signed_receipts
            .unwrap_or(true),
        verification_fallback_chain_path,
        verification_eigencloud_timeout_ms,
        information_sharing_scope: draft
            .information_sharing_scope
            .unwrap_or(InformationSharingScope::Aggregated),
        accept_terms: true,
    })
}
