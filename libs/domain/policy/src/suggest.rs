// [libs/domain/policy/src/suggest.rs]
/*!
 * =================================================================
 * APARATO: POLICY SUGGESTION SYNTHESIZER (V13.0 - SUGGEST CONFIG)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: SÍNTESIS DE POLÍTICA VALIDADA DESDE INTENCIÓN LIBRE
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. TEMPLATE ANCHORING: Toda sugerencia nace de una plantilla del
 *    catálogo; la intención libre solo selecciona y matiza.
 * 2. SELF CONSISTENCY: El artefacto sugerido atraviesa el validador
 *    total antes de abandonar este estrato; una sugerencia inválida es
 *    un defecto del gateway, no del cliente.
 * 3. HONEST ASSUMPTIONS: Cada default asumido se declara en la lista
 *    de 'assumptions'; cada esquina afilada en 'warnings'.
 * =================================================================
 */

use enclagent_domain_models::config::{PolicyConfig, PolicyConfigDraft, VerificationBackend};
use enclagent_domain_models::errors::GatewayError;
use enclagent_domain_models::template::{PolicyTemplate, RiskPosture};
use rand::RngCore;
use tracing::{debug, instrument};

use crate::templates::{all_templates, find_template_by_domain};
use crate::validator::validate_policy_draft;

/// Artefacto de síntesis devuelto por suggest-config.
#[derive(Debug, Clone)]
pub struct SuggestedPolicy {
    pub config: PolicyConfig,
    pub assumptions: Vec<String>,
    pub warnings: Vec<String>,
}

/// Palabras clave de selección por dominio cuando el cliente no lo fija.
const DOMAIN_KEYWORD_MAP: &[(&str, &str)] = &[
    ("momentum", "perps_trading"),
    ("perp", "perps_trading"),
    ("futures", "perps_trading"),
    ("yield", "defi_yield"),
    ("lending", "defi_yield"),
    ("stablecoin", "defi_yield"),
    ("dca", "spot_accumulation"),
    ("accumulate", "spot_accumulation"),
    ("market making", "market_making"),
    ("spread", "market_making"),
    ("liquidity", "market_making"),
];

/// Selecciona la plantilla ancla: dominio explícito primero, después
/// escaneo de palabras clave sobre la intención, después la primera del
/// catálogo como refugio.
fn select_anchor_template(
    intent_text: &str,
    requested_domain: Option<&str>,
) -> (&'static PolicyTemplate, bool) {
    if let Some(domain_label) = requested_domain {
        if let Some(template) = find_template_by_domain(domain_label) {
            return (template, false);
        }
    }

    let lowered_intent = intent_text.to_ascii_lowercase();
    for (keyword, domain_label) in DOMAIN_KEYWORD_MAP {
        if lowered_intent.contains(keyword) {
            if let Some(template) = find_template_by_domain(domain_label) {
                return (template, false);
            }
        }
    }

    (&all_templates()[0], true)
}

/// Genera una clave de mando fresca de 32 caracteres hexadecimales.
fn generate_gateway_auth_key() -> String {
    let mut entropy_buffer = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut entropy_buffer);
    hex::encode(entropy_buffer)
}

/// Sintetiza una política validada desde (wallet, intención, dominio).
///
/// # Errors:
/// - `GatewayError::InvalidWalletAddress` si la wallet no es canónica.
/// - `GatewayError::ConfigInvalid` solo ante un defecto del propio
///   sintetizador (la sugerencia siempre debe auto-validar).
#[instrument(skip(intent_text, preset_gateway_auth_key), fields(domain = ?requested_domain))]
pub fn synthesize_policy_suggestion(
    wallet_address: &str,
    intent_text: &str,
    requested_domain: Option<&str>,
    preset_gateway_auth_key: Option<String>,
) -> Result<SuggestedPolicy, GatewayError> {
    let canonical_wallet = enclagent_domain_models::wallet::normalize_wallet_address(wallet_address)?;

    let (anchor_template, is_refuge_selection) =
        select_anchor_template(intent_text, requested_domain);
    debug!("🧭 [SUGGEST]: Anchored on template [{}].", anchor_template.template_id);

    let mut assumptions: Vec<String> = Vec::new();
    let mut warnings: Vec<String> = Vec::new();

    if is_refuge_selection {
        assumptions.push(format!(
            "no domain matched the intent; defaulted to template '{}'",
            anchor_template.template_id
        ));
    } else {
        assumptions.push(format!(
            "anchored on template '{}' for domain '{}'",
            anchor_template.template_id, anchor_template.domain
        ));
    }

    let trimmed_intent = intent_text.trim();
    let objective = if trimmed_intent.is_empty() {
        assumptions.push("empty intent; adopted the template objective verbatim".to_string());
        anchor_template.objective.clone()
    } else {
        trimmed_intent.to_string()
    };

    let gateway_auth_key = match preset_gateway_auth_key {
        Some(preset_key) => preset_key,
        None => {
            assumptions.push("generated a fresh 32-hex gateway_auth_key".to_string());
            generate_gateway_auth_key()
        }
    };

    // Universo de símbolos por dominio ancla.
    let symbol_allowlist: Vec<String> = match anchor_template.domain.as_str() {
        "defi_yield" => vec!["USDC".into(), "USDT".into(), "DAI".into()],
        "spot_accumulation" => vec!["BTC".into(), "ETH".into()],
        "market_making" => vec!["ETH".into(), "SOL".into(), "ARB".into()],
        _ => vec!["BTC".into(), "ETH".into(), "SOL".into()],
    };
    assumptions.push(format!(
        "symbol allowlist seeded from the '{}' domain default",
        anchor_template.domain
    ));

    if anchor_template.risk_profile.posture == RiskPosture::Aggressive {
        warnings.push(
            "aggressive risk posture: review position and leverage bounds before signing".to_string(),
        );
    }
    if anchor_template.config.verification_backend == VerificationBackend::FallbackOnly {
        warnings.push("verification runs on the local receipt chain only".to_string());
    }

    let draft = PolicyConfigDraft {
        profile_name: Some(format!("{}_v1", anchor_template.domain)),
        profile_domain: Some(anchor_template.domain.clone()),
        objective: Some(objective),
        user_wallet_address: Some(canonical_wallet.clone()),
        operator_wallet_address: None,
        custody_mode: Some(anchor_template.config.custody_mode),
        paper_live_policy: Some(anchor_template.config.paper_live_policy),
        symbol_allowlist: Some(symbol_allowlist),
        symbol_denylist: None,
        request_timeout_ms: None,
        max_retries: None,
        retry_backoff_ms: None,
        max_position_size_usd: Some(anchor_template.risk_profile.max_position_size_usd),
        leverage_cap: Some(anchor_template.risk_profile.max_leverage.max(1.0)),
        max_leverage: Some(anchor_template.risk_profile.max_leverage),
        max_allocation_usd: None,
        per_trade_notional_cap_usd: None,
        max_slippage_bps: Some(anchor_template.risk_profile.max_slippage_bps),
        gateway_auth_key: Some(gateway_auth_key),
        verification_backend: Some(anchor_template.config.verification_backend),
        verification_level: None,
        verification_fallback_enabled: Some(true),
        verification_fallback_require_signed_receipts: Some(
            anchor_template.config.verification_fallback_require_signed_receipts,
        ),
        verification_fallback_chain_path: None,
        verification_eigencloud_timeout_ms: None,
        information_sharing_scope: Some(anchor_template.config.information_sharing_scope),
        accept_terms: Some(true),
    };

    // Custodia de operador sin dirección de operador: degradar a custodia
    // de usuario y declararlo.
    let draft = if matches!(
        anchor_template.config.custody_mode,
        enclagent_domain_models::config::CustodyMode::OperatorWallet
            | enclagent_domain_models::config::CustodyMode::DualMode
    ) {
        assumptions.push(
            "no operator wallet available at suggestion time; downgraded custody to user_wallet"
                .to_string(),
        );
        PolicyConfigDraft {
            custody_mode: Some(enclagent_domain_models::config::CustodyMode::UserWallet),
            ..draft
        }
    } else {
        draft
    };

    let config = validate_policy_draft(&draft, &canonical_wallet)?;

    Ok(SuggestedPolicy {
        config,
        assumptions,
        warnings,
    })
}
