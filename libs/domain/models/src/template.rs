// [libs/domain/models/src/template.rs]
/*!
 * =================================================================
 * APARATO: POLICY TEMPLATE CONTRACT (V9.0 - CATALOG DTO)
 * CLASIFICACIÓN: DOMAIN ENTITIES (ESTRATO L2)
 * RESPONSABILIDAD: PLANTILLAS INMUTABLES DE POLÍTICA POR DOMINIO
 * =================================================================
 */

use serde::{Deserialize, Serialize};
use typeshare::typeshare;

use crate::config::{
    CustodyMode, InformationSharingScope, PaperLivePolicy, VerificationBackend,
};

/// Postura de riesgo declarada por una plantilla.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RiskPosture {
    Conservative,
    Balanced,
    Aggressive,
}

/// Perfil de riesgo agregado de la plantilla.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskProfile {
    pub posture: RiskPosture,
    pub max_position_size_usd: f64,
    pub max_leverage: f64,
    pub max_slippage_bps: u32,
}

/// Defaults de configuración aportados por la plantilla.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TemplateConfigDefaults {
    pub paper_live_policy: PaperLivePolicy,
    pub custody_mode: CustodyMode,
    pub verification_backend: VerificationBackend,
    pub verification_fallback_require_signed_receipts: bool,
    pub information_sharing_scope: InformationSharingScope,
}

/// Plantilla inmutable del catálogo de políticas.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PolicyTemplate {
    /// Slug unívoco del catálogo (ej: "perps_momentum_balanced").
    pub template_id: String,
    /// Dominio operativo que la plantilla cubre.
    pub domain: String,
    pub title: String,
    /// Objetivo sugerido en lenguaje natural.
    pub objective: String,
    /// Justificación editorial de la plantilla para el operador.
    pub rationale: String,
    /// Plan ordenado de módulos que el runtime activará.
    pub module_plan: Vec<String>,
    pub risk_profile: RiskProfile,
    pub config: TemplateConfigDefaults,
}
