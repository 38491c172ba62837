// [libs/domain/policy/src/templates.rs]
/*!
 * =================================================================
 * APARATO: POLICY TEMPLATE CATALOG (V10.0 - DOMAIN LIBRARY)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: CATÁLOGO INMUTABLE DE PLANTILLAS ETIQUETADAS POR DOMINIO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. RUNTIME IMMUTABILITY: El catálogo se cristaliza una única vez vía
 *    'once_cell::Lazy'; ninguna superficie puede mutarlo tras el boot.
 * 2. EDITORIAL RATIONALE: Cada plantilla transporta su justificación
 *    para que el operador entienda qué está delegando.
 * =================================================================
 */

use enclagent_domain_models::config::{
    CustodyMode, InformationSharingScope, PaperLivePolicy, VerificationBackend,
};
use enclagent_domain_models::template::{
    PolicyTemplate, RiskPosture, RiskProfile, TemplateConfigDefaults,
};
use once_cell::sync::Lazy;

/// Catálogo soberano, cristalizado en el primer acceso.
static TEMPLATE_CATALOG: Lazy<Vec<PolicyTemplate>> = Lazy::new(|| {
    vec![
        PolicyTemplate {
            template_id: "perps_momentum_balanced".into(),
            domain: "perps_trading".into(),
            title: "Perpetuals Momentum (Balanced)".into(),
            objective: "Trade liquid perpetual futures on momentum signals with strict drawdown control".into(),
            rationale: "Momentum on deep-liquidity perps keeps slippage predictable; balanced sizing caps tail risk while leaving room for trend capture.".into(),
            module_plan: vec![
                "market_data".into(),
                "momentum_signals".into(),
                "risk_guard".into(),
                "execution".into(),
                "verification".into(),
                "reporting".into(),
            ],
            risk_profile: RiskProfile {
                posture: RiskPosture::Balanced,
                max_position_size_usd: 10_000.0,
                max_leverage: 3.0,
                max_slippage_bps: 40,
            },
            config: TemplateConfigDefaults {
                paper_live_policy: PaperLivePolicy::PaperFirst,
                custody_mode: CustodyMode::UserWallet,
                verification_backend: VerificationBackend::EigencloudPrimary,
                verification_fallback_require_signed_receipts: true,
                information_sharing_scope: InformationSharingScope::Aggregated,
            },
        },
        PolicyTemplate {
            template_id: "defi_yield_conservative".into(),
            domain: "defi_yield".into(),
            title: "DeFi Yield Rotation (Conservative)".into(),
            objective: "Rotate stablecoin liquidity across audited lending markets for steady yield".into(),
            rationale: "Stablecoin-only rotation avoids price exposure entirely; the conservative posture restricts the venue set to audited bluechip markets.".into(),
            module_plan: vec![
                "market_data".into(),
                "yield_scanner".into(),
                "risk_guard".into(),
                "execution".into(),
                "verification".into(),
                "reporting".into(),
            ],
            risk_profile: RiskProfile {
                posture: RiskPosture::Conservative,
                max_position_size_usd: 25_000.0,
                max_leverage: 1.0,
                max_slippage_bps: 15,
            },
            config: TemplateConfigDefaults {
                paper_live_policy: PaperLivePolicy::PaperFirst,
                custody_mode: CustodyMode::UserWallet,
                verification_backend: VerificationBackend::EigencloudPrimary,
                verification_fallback_require_signed_receipts: true,
                information_sharing_scope: InformationSharingScope::Private,
            },
        },
        PolicyTemplate {
            template_id: "spot_dca_conservative".into(),
            domain: "spot_accumulation".into(),
            title: "Spot Accumulation DCA (Conservative)".into(),
            objective: "Accumulate a fixed basket of majors on a volatility-aware dollar-cost schedule".into(),
            rationale: "Schedule-driven spot buys carry no liquidation surface; volatility awareness merely modulates tranche size, never direction.".into(),
            module_plan: vec![
                "market_data".into(),
                "dca_scheduler".into(),
                "execution".into(),
                "verification".into(),
                "reporting".into(),
            ],
            risk_profile: RiskProfile {
                posture: RiskPosture::Conservative,
                max_position_size_usd: 5_000.0,
                max_leverage: 1.0,
                max_slippage_bps: 25,
            },
            config: TemplateConfigDefaults {
                paper_live_policy: PaperLivePolicy::Live,
                custody_mode: CustodyMode::UserWallet,
                verification_backend: VerificationBackend::EigencloudPrimary,
                verification_fallback_require_signed_receipts: false,
                information_sharing_scope: InformationSharingScope::Private,
            },
        },
        PolicyTemplate {
            template_id: "mm_spread_aggressive".into(),
            domain: "market_making".into(),
            title: "Market Making Spread Capture (Aggressive)".into(),
            objective: "Quote two-sided liquidity on mid-cap pairs and capture spread with fast inventory recycling".into(),
            rationale: "Spread capture demands operator-grade key latency, hence operator custody; the aggressive posture widens inventory bounds in exchange for tighter kill-switches.".into(),
            module_plan: vec![
                "market_data".into(),
                "quote_engine".into(),
                "inventory_guard".into(),
                "execution".into(),
                "verification".into(),
                "reporting".into(),
            ],
            risk_profile: RiskProfile {
                posture: RiskPosture::Aggressive,
                max_position_size_usd: 50_000.0,
                max_leverage: 5.0,
                max_slippage_bps: 80,
            },
            config: TemplateConfigDefaults {
                paper_live_policy: PaperLivePolicy::PaperFirst,
                custody_mode: CustodyMode::OperatorWallet,
                verification_backend: VerificationBackend::EigencloudPrimary,
                verification_fallback_require_signed_receipts: true,
                information_sharing_scope: InformationSharingScope::Aggregated,
            },
        },
    ]
});

/// Acceso de solo lectura al catálogo completo.
pub fn all_templates() -> &'static [PolicyTemplate] {
    &TEMPLATE_CATALOG
}

/// Busca la primera plantilla de un dominio (comparación insensible).
pub fn find_template_by_domain(domain_label: &str) -> Option<&'static PolicyTemplate> {
    let normalized_domain = domain_label.trim().to_ascii_lowercase();
    TEMPLATE_CATALOG
        .iter()
        .find(|template| template.domain == normalized_domain)
}

/// Busca una plantilla por su slug unívoco.
pub fn find_template_by_id(template_identifier: &str) -> Option<&'static PolicyTemplate> {
    TEMPLATE_CATALOG
        .iter()
        .find(|template| template.template_id == template_identifier)
}
