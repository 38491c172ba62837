// [apps/gateway/src/handlers/verify.rs]
/*!
 * =================================================================
 * APARATO: SIGNATURE VERIFY ORCHESTRATOR (V31.0 - LAUNCH AUTHORITY)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L4)
 * RESPONSABILIDAD: VERIFICACIÓN DE FIRMA Y ORQUESTACIÓN DEL LAUNCH
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. LAUNCH PIPELINE: firma -> política -> onboarding -> preflight ->
 *    transición a provisioning en un único turno CAS; el despacho del
 *    backend ocurre exactamente una vez, en el escritor que ganó el turno.
 * 2. IDEMPOTENT RESUBMISSION: Un /verify repetido sobre una sesión ya
 *    lanzada devuelve el estado vigente sin segundo despacho.
 * 3. NON-PUNITIVE SIGNATURES: Un fallo de firma deja la sesión en
 *    'pending_signature' para permitir el reintento con la wallet
 *    correcta; política inválida y preflight fallido sí son terminales.
 * 4. SECRET HYGIENE: Ni la firma ni tokens de identidad se persisten;
 *    de la clave de mando solo sobrevive la huella SHA-256.
 * =================================================================
 */

use axum::extract::{Json, State};
use chrono::Utc;
use enclagent_core_signature::eip191::{
    normalize_client_message, verify_personal_sign, SignatureFault,
};
use enclagent_domain_models::config::PolicyConfigDraft;
use enclagent_domain_models::errors::GatewayError;
use enclagent_domain_models::events::StreamChannel;
use enclagent_domain_models::session::{
    ProvisioningSource, RuntimeState, SessionRecord, SessionStatus,
};
use enclagent_domain_models::timeline::{event_types, TimelineActor};
use enclagent_domain_models::wallet::normalize_wallet_address;
use enclagent_domain_onboarding::catch_up_from_policy;
use enclagent_domain_policy::validate_policy_draft;
use enclagent_domain_preflight::run_preflight_battery;
use enclagent_infra_store::{MutationProposal, StoreError, TimelineSeed};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::api::{map_store_fault, parse_session_identifier, ApiFailure};
use crate::services::spawn_provisioning_dispatch;
use crate::state::AppState;

/// Solicitud de verificación y launch.
///
/// Los tokens de identidad embebida que el cliente pueda adjuntar se
/// descartan en esta frontera; jamás se persisten.
#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub session_id: String,
    /// Firma personal_sign en hexadecimal (con o sin prefijo 0x).
    pub signature: String,
    /// Eco opcional del mensaje firmado (utf-8 o hex con prefijo 0x).
    pub message: Option<String>,
    /// Wallet declarada por el cliente para el chequeo de binding.
    pub wallet_address: Option<String>,
    /// Borrador de política a anclar en la sesión.
    pub config: Option<PolicyConfigDraft>,
    pub privy_user_id: Option<String>,
}

/// Sobre de respuesta del launch.
#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub session_id: Uuid,
    pub status: String,
    pub version: u64,
}

pub struct VerifyHandler;

impl VerifyHandler {
    /**
     * Endpoint: POST /verify
     *
     * # Errors:
     * El catálogo completo de la taxonomía de launch: expiración de
     * challenge, fallos de firma, política inválida, precondiciones de
     * onboarding, preflight fallido y backend sin configurar.
     */
    #[instrument(skip(application_state, request_payload), fields(session_id = %request_payload.session_id))]
    pub async fn handle_signature_verification(
        State(application_state): State<AppState>,
        Json(request_payload): Json<VerifyRequest>,
    ) -> Result<Json<VerifyResponse>, ApiFailure> {
        let environment = application_state.environment.clone();
        let session_id = parse_session_identifier(&request_payload.session_id)?;

        // 1. GUARDAS DE CONFIGURACIÓN DEL DESPLIEGUE
        if !environment.frontdoor_enabled {
            return Err(GatewayError::FrontdoorDisabled.into());
        }
        if environment.require_privy && environment.privy_app_id.is_none() {
            return Err(GatewayError::PrivyAppIdMissing.into());
        }
        if environment.effective_provisioning_source() == ProvisioningSource::Unconfigured {
            return Err(GatewayError::ProvisioningBackendUnconfigured.into());
        }

        // 2. SNAPSHOT VIGENTE E IDEMPOTENCIA
        let current_snapshot = application_state
            .session_repository
            .fetch_snapshot(&session_id)
            .await
            .map_err(|store_fault| map_store_fault(store_fault, &session_id))?;

        match current_snapshot.status {
            SessionStatus::Provisioning | SessionStatus::Ready | SessionStatus::Failed => {
                // Reenvío idempotente: el estado terminal vigente es la verdad.
                return Ok(Json(VerifyResponse {
                    session_id,
                    status: current_snapshot.status.as_wire_label().to_string(),
                    version: current_snapshot.version,
                }));
            }
            SessionStatus::Expired => return Err(GatewayError::ChallengeExpired.into()),
            SessionStatus::PendingSignature => {}
        }

        // 3. TTL DEL CHALLENGE
        if Utc::now() > current_snapshot.challenge_expires_at {
            let expiry_outcome = application_state
                .session_repository
                .apply(&session_id, |snapshot| {
                    if snapshot.status != SessionStatus::PendingSignature {
                        return Err(GatewayError::VersionConflict);
                    }
                    let mut proposed_record = snapshot.clone();
                    proposed_record.status = SessionStatus::Expired;
                    proposed_record.detail = "challenge expired before signature".to_string();
                    proposed_record.error = Some("challenge_expired".to_string());
                    Ok(MutationProposal {
                        record: proposed_record,
                        timeline: vec![TimelineSeed::error(
                            event_types::SESSION_EXPIRED,
                            "challenge TTL elapsed at verification",
                            TimelineActor::System,
                        )],
                    })
                })
                .await;

            if let Err(expiry_fault) = expiry_outcome {
                warn!("⚠️ [EXPIRY_SEAL_BYPASS]: {}", expiry_fault);
            }
            return Err(GatewayError::ChallengeExpired.into());
        }

        // 4. BINDING DE WALLET DECLARADA
        if let Some(declared_wallet) = &request_payload.wallet_address {
            let canonical_declared_wallet = normalize_wallet_address(declared_wallet)
                .map_err(ApiFailure::from)?;
            if canonical_declared_wallet != current_snapshot.wallet_address {
                return Err(GatewayError::ChallengeWalletMismatch.into());
            }
        }

        // 5. PARIDAD DEL MENSAJE FIRMADO (eco opcional del cliente)
        let challenge_bytes = current_snapshot.challenge_message.as_bytes();
        if let Some(echoed_message) = &request_payload.message {
            if normalize_client_message(echoed_message) != challenge_bytes {
                return Err(GatewayError::SignatureMessageMismatch.into());
            }
        }

        // 6. VERIFICACIÓN DE FIRMA (la sesión permanece pendiente si falla)
        verify_personal_sign(
            challenge_bytes,
            &request_payload.signature,
            &current_snapshot.wallet_address,
        )
        .map_err(|signature_fault| match signature_fault {
            SignatureFault::Malformed(reason) => GatewayError::SignatureMalformed(reason),
            SignatureFault::RecoveryRejected(reason) => GatewayError::SignatureMalformed(reason),
            SignatureFault::WalletMismatch { expected, recovered } => {
                GatewayError::SignatureWalletMismatch { expected, recovered }
            }
        })?;

        // 7. VALIDACIÓN TOTAL DE POLÍTICA (terminal si es inválida)
        // Los defaults de verificación del despliegue rellenan lo que el
        // borrador del cliente no fija.
        let mut policy_draft = request_payload.config.clone().unwrap_or_default();
        if policy_draft.verification_backend.is_none() {
            policy_draft.verification_backend = Some(environment.verification_default_backend);
        }
        if policy_draft.verification_fallback_enabled.is_none() {
            policy_draft.verification_fallback_enabled =
                Some(environment.verification_default_fallback_enabled);
        }
        let validated_policy =
            match validate_policy_draft(&policy_draft, &current_snapshot.wallet_address) {
                Ok(validated_policy) => validated_policy,
                Err(config_fault) => {
                    let terminal_reason = format!("config_invalid: {}", config_fault);
                    let _ = application_state
                        .session_repository
                        .apply(&session_id, |snapshot| {
                            if snapshot.status != SessionStatus::PendingSignature {
                                return Err(GatewayError::VersionConflict);
                            }
                            let mut proposed_record = snapshot.clone();
                            proposed_record.status = SessionStatus::Failed;
                            proposed_record.error = Some(terminal_reason.clone());
                            proposed_record.detail =
                                "policy rejected by the validator".to_string();
                            Ok(MutationProposal {
                                record: proposed_record,
                                timeline: vec![TimelineSeed::error(
                                    event_types::CONFIG_REJECTED,
                                    terminal_reason.clone(),
                                    TimelineActor::System,
                                )],
                            })
                        })
                        .await;
                    return Err(config_fault.into());
                }
            };

        // 8. PRECONDICIÓN DE ONBOARDING (catch-up determinista)
        let onboarding_state = application_state
            .onboarding_repository
            .load_or_genesis(&session_id, Utc::now())
            .await
            .map_err(|store_fault| map_store_fault(store_fault, &session_id))?;

        if !(onboarding_state.completed && onboarding_state.is_signature_ready()) {
            let caught_up_state =
                catch_up_from_policy(&onboarding_state, &validated_policy, Utc::now())
                    .map_err(ApiFailure::from)?;
            application_state
                .onboarding_repository
                .save(&caught_up_state)
                .await
                .map_err(|store_fault| map_store_fault(store_fault, &session_id))?;
        }

        // 9. PREFLIGHT DE FONDOS (terminal si falla)
        let preflight_report = run_preflight_battery(
            &current_snapshot,
            &validated_policy,
            environment.require_privy,
        );

        if let Some(failure_category) = preflight_report.failure_category.clone() {
            let terminal_reason = format!("preflight_failed: {}", failure_category);
            let preflight_checks = preflight_report.checks.clone();
            let _ = application_state
                .session_repository
                .apply(&session_id, |snapshot| {
                    if snapshot.status != SessionStatus::PendingSignature {
                        return Err(GatewayError::VersionConflict);
                    }
                    let mut proposed_record = snapshot.clone();
                    proposed_record.status = SessionStatus::Failed;
                    proposed_record.funding_preflight_status = preflight_report.status;
                    proposed_record.funding_preflight_failure_category =
                        Some(failure_category.clone());
                    proposed_record.funding_preflight_checks = preflight_checks.clone();
                    proposed_record.error = Some(terminal_reason.clone());
                    proposed_record.detail = "funding preflight failed".to_string();
                    Ok(MutationProposal {
                        record: proposed_record,
                        timeline: vec![TimelineSeed::error(
                            event_types::PREFLIGHT_FAILED,
                            terminal_reason.clone(),
                            TimelineActor::System,
                        )],
                    })
                })
                .await;
            return Err(GatewayError::PreflightFailed { failure_category }.into());
        }

        // 10. TRANSICIÓN CAS: PENDING -> PROVISIONING (turno único)
        let provisioning_source = environment.effective_provisioning_source();
        let auth_key_fingerprint =
            enclagent_domain_control::fingerprint_auth_key(&validated_policy.gateway_auth_key);

        let launch_commit = application_state
            .session_repository
            .apply(&session_id, |snapshot| {
                if snapshot.status != SessionStatus::PendingSignature {
                    return Err(GatewayError::VersionConflict);
                }

                let mut proposed_record = snapshot.clone();
                anchor_policy_onto_record(
                    &mut proposed_record,
                    &validated_policy,
                    &auth_key_fingerprint,
                    request_payload.privy_user_id.clone(),
                );
                proposed_record.status = SessionStatus::Provisioning;
                proposed_record.funding_preflight_status = preflight_report.status;
                proposed_record.funding_preflight_failure_category = None;
                proposed_record.funding_preflight_checks = preflight_report.checks.clone();
                proposed_record.verification_latency_ms = preflight_report.verification_latency_ms;
                proposed_record.verification_fallback_used =
                    preflight_report.verification_fallback_used;
                proposed_record.provisioning_source = provisioning_source;
                proposed_record.detail = "signature accepted; provisioning runtime".to_string();

                Ok(MutationProposal {
                    record: proposed_record,
                    timeline: vec![
                        TimelineSeed::ok(
                            event_types::SIGNATURE_VERIFIED,
                            "wallet signature recovered and matched",
                            TimelineActor::User,
                        ),
                        TimelineSeed::ok(
                            event_types::CONFIG_ACCEPTED,
                            "policy validated and anchored to the session",
                            TimelineActor::System,
                        ),
                        TimelineSeed::ok(
                            event_types::PREFLIGHT_PASSED,
                            "funding preflight battery passed",
                            TimelineActor::System,
                        ),
                        TimelineSeed::ok(
                            event_types::PROVISIONING_STARTED,
                            "provisioning dispatch engaged",
                            TimelineActor::System,
                        ),
                    ],
                })
            })
            .await;

        let provisioning_record = match launch_commit {
            Ok(committed_record) => committed_record,
            Err(StoreError::DomainRejection(GatewayError::VersionConflict)) => {
                // Un /verify concurrente ganó el turno; reflejar su verdad.
                let superseding_snapshot = application_state
                    .session_repository
                    .fetch_snapshot(&session_id)
                    .await
                    .map_err(|store_fault| map_store_fault(store_fault, &session_id))?;
                return Ok(Json(VerifyResponse {
                    session_id,
                    status: superseding_snapshot.status.as_wire_label().to_string(),
                    version: superseding_snapshot.version,
                }));
            }
            Err(store_fault) => return Err(map_store_fault(store_fault, &session_id)),
        };

        application_state.event_bus.publish(
            StreamChannel::Job,
            &session_id,
            "job_started",
            serde_json::json!({ "phase": "provisioning" }),
        );

        // 11. DESPACHO SEGÚN LA FUENTE CONFIGURADA
        let final_record = match provisioning_source {
            ProvisioningSource::Command => {
                spawn_provisioning_dispatch(application_state.clone(), session_id);
                provisioning_record
            }
            ProvisioningSource::DefaultInstanceUrl => {
                Self::seal_fallback_instance(&application_state, &session_id).await?
            }
            ProvisioningSource::Unconfigured => {
                // Inalcanzable: la guarda del paso 1 corta antes.
                return Err(GatewayError::ProvisioningBackendUnconfigured.into());
            }
        };

        info!(
            "✅ [VERIFY_ACCEPTED]: Session {} advanced to [{}].",
            session_id,
            final_record.status.as_wire_label()
        );

        Ok(Json(VerifyResponse {
            session_id,
            status: final_record.status.as_wire_label().to_string(),
            version: final_record.version,
        }))
    }

    /// Modo degradado: sin despacho; la URL fija se adopta como endpoint.
    async fn seal_fallback_instance(
        application_state: &AppState,
        session_id: &Uuid,
    ) -> Result<SessionRecord, ApiFailure> {
        let fixed_instance_url = application_state
            .environment
            .default_instance_url
            .clone()
            .ok_or(GatewayError::ProvisioningBackendUnconfigured)?;

        let ready_record = application_state
            .session_repository
            .apply(session_id, |snapshot| {
                if snapshot.status != SessionStatus::Provisioning {
                    return Err(GatewayError::VersionConflict);
                }
                let mut proposed_record = snapshot.clone();
                proposed_record.status = SessionStatus::Ready;
                proposed_record.runtime_state = RuntimeState::Running;
                proposed_record.instance_url = Some(fixed_instance_url.clone());
                proposed_record.verify_url = None;
                proposed_record.dedicated_instance = false;
                proposed_record.launched_on_eigencloud = false;
                proposed_record.detail = "shared instance adopted; runtime running".to_string();
                Ok(MutationProposal {
                    record: proposed_record,
                    timeline: vec![TimelineSeed::ok(
                        event_types::PROVISIONING_SUCCEEDED,
                        "fixed instance url adopted without dispatch",
                        TimelineActor::System,
                    )],
                })
            })
            .await
            .map_err(|store_fault| map_store_fault(store_fault, session_id))?;

        application_state.event_bus.publish(
            StreamChannel::Job,
            session_id,
            "job_status",
            serde_json::json!({
                "status": "ready",
                "instance_url": ready_record.instance_url,
            }),
        );

        Ok(ready_record)
    }
}

/// Ancla la política validada y sus campos propagados sobre el registro.
fn anchor_policy_onto_record(
    record: &mut SessionRecord,
    validated_policy: &enclagent_domain_models::config::PolicyConfig,
    auth_key_fingerprint: &str,
    privy_user_id: Option<String>,
) {
    record.config = Some(validated_policy.clone());
    record.profile_name = Some(validated_policy.profile_name.clone());
    record.profile_domain = Some(validated_policy.profile_domain.clone());
    record.verification_backend = Some(validated_policy.verification_backend);
    record.verification_level = Some(validated_policy.verification_level);
    record.verification_fallback_enabled = validated_policy.verification_fallback_enabled;
    record.verification_fallback_require_signed_receipts =
        validated_policy.verification_fallback_require_signed_receipts;
    record.auth_key_fingerprint = Some(auth_key_fingerprint.to_string());
    if privy_user_id.is_some() {
        record.privy_user_id = privy_user_id;
    }
}
