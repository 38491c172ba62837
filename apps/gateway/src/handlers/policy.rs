// [apps/gateway/src/handlers/policy.rs]
/*!
 * =================================================================
 * APARATO: POLICY SURFACE HANDLER (V15.0 - CATALOG & SYNTHESIS)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L4)
 * RESPONSABILIDAD: SUGGEST-CONFIG, CATÁLOGO Y CONTRATOS ESTÁTICOS
 * =================================================================
 */

use axum::extract::Json;
use chrono::{DateTime, Utc};
use enclagent_domain_models::config::PolicyConfig;
use enclagent_domain_models::template::PolicyTemplate;
use enclagent_domain_policy::{
    all_templates, synthesize_policy_suggestion, CURRENT_CONFIG_VERSION, DEFAULT_PROFILE_DOMAIN,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::api::ApiFailure;

/// Solicitud de síntesis de política.
#[derive(Debug, Deserialize)]
pub struct SuggestConfigRequest {
    pub wallet_address: String,
    pub intent: String,
    pub domain: Option<String>,
    pub gateway_auth_key: Option<String>,
}

/// Sobre de la política sugerida.
#[derive(Debug, Serialize)]
pub struct SuggestConfigResponse {
    pub config: PolicyConfig,
    pub assumptions: Vec<String>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct PolicyTemplatesResponse {
    pub generated_at: DateTime<Utc>,
    pub templates: Vec<PolicyTemplate>,
}

/// Paso del manifiesto de experiencia del shell.
#[derive(Debug, Serialize)]
pub struct ExperienceStep {
    pub step_id: String,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct ExperienceManifestResponse {
    pub manifest_version: u32,
    pub steps: Vec<ExperienceStep>,
}

#[derive(Debug, Serialize)]
pub struct ConfigContractDefaults {
    pub profile_domain: String,
}

#[derive(Debug, Serialize)]
pub struct ConfigContractResponse {
    pub current_config_version: u32,
    pub defaults: ConfigContractDefaults,
}

pub struct PolicySurfaceHandler;

impl PolicySurfaceHandler {
    /**
     * Endpoint: POST /suggest-config
     *
     * # Errors:
     * - `invalid_wallet_address` si la wallet no es canónica.
     */
    #[instrument(skip(suggest_request))]
    pub async fn handle_suggest_config(
        Json(suggest_request): Json<SuggestConfigRequest>,
    ) -> Result<Json<SuggestConfigResponse>, ApiFailure> {
        let suggestion = synthesize_policy_suggestion(
            &suggest_request.wallet_address,
            &suggest_request.intent,
            suggest_request.domain.as_deref(),
            suggest_request.gateway_auth_key,
        )
        .map_err(ApiFailure::from)?;

        Ok(Json(SuggestConfigResponse {
            config: suggestion.config,
            assumptions: suggestion.assumptions,
            warnings: suggestion.warnings,
        }))
    }

    /// Endpoint: GET /policy-templates — catálogo inmutable completo.
    pub async fn handle_policy_templates() -> Json<PolicyTemplatesResponse> {
        Json(PolicyTemplatesResponse {
            generated_at: Utc::now(),
            templates: all_templates().to_vec(),
        })
    }

    /// Endpoint: GET /experience/manifest — cadena de módulos del shell.
    pub async fn handle_experience_manifest() -> Json<ExperienceManifestResponse> {
        let steps = vec![
            ExperienceStep {
                step_id: "identity".into(),
                title: "Connect wallet".into(),
                description: "Bind a wallet identity and request the authorization challenge".into(),
            },
            ExperienceStep {
                step_id: "policy".into(),
                title: "Compose policy".into(),
                description: "Converse through onboarding and anchor a validated operating policy".into(),
            },
            ExperienceStep {
                step_id: "verification".into(),
                title: "Choose verification".into(),
                description: "Select the attestation backend and fallback receipt posture".into(),
            },
            ExperienceStep {
                step_id: "provisioning".into(),
                title: "Provision runtime".into(),
                description: "Sign the challenge and watch the dedicated runtime come up".into(),
            },
            ExperienceStep {
                step_id: "runtime".into(),
                title: "Operate runtime".into(),
                description: "Pause, resume, terminate or rotate the auth key of the running instance".into(),
            },
            ExperienceStep {
                step_id: "evidence".into(),
                title: "Review evidence".into(),
                description: "Audit the timeline, TODO checklist and verification explanation".into(),
            },
        ];

        Json(ExperienceManifestResponse {
            manifest_version: 2,
            steps,
        })
    }

    /// Endpoint: GET /config-contract — versión vigente y defaults.
    pub async fn handle_config_contract() -> Json<ConfigContractResponse> {
        Json(ConfigContractResponse {
            current_config_version: CURRENT_CONFIG_VERSION,
            defaults: ConfigContractDefaults {
                profile_domain: DEFAULT_PROFILE_DOMAIN.to_string(),
            },
        })
    }
}
