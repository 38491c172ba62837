// [libs/domain/policy/src/lib.rs]
/*!
 * =================================================================
 * APARATO: POLICY STRATUM REGISTRY (V14.0)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: EXPOSICIÓN NOMINAL DE CATÁLOGO, VALIDADOR Y SÍNTESIS
 * =================================================================
 */

pub mod suggest;
pub mod templates;
pub mod validator;

pub use suggest::{synthesize_policy_suggestion, SuggestedPolicy};
pub use templates::{all_templates, find_template_by_domain, find_template_by_id};
pub use validator::validate_policy_draft;

/// Versión vigente del contrato de configuración expuesto por el gateway.
pub const CURRENT_CONFIG_VERSION: u32 = 3;

/// Dominio de perfil por defecto del contrato.
pub const DEFAULT_PROFILE_DOMAIN: &str = "perps_trading";
