// [apps/gateway/src/services/provisioning.rs]
/*!
 * =================================================================
 * APARATO: PROVISIONING DRIVE SERVICE (V16.0 - SINGLE DISPATCH)
 * CLASIFICACIÓN: APPLICATION SERVICES (ESTRATO L4)
 * RESPONSABILIDAD: CONDUCCIÓN DEL DESPACHO Y CAPTURA DEL RESULTADO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. SINGLE DISPATCH GUARD: Solo el escritor que ganó la transición
 *    CAS 'pending_signature -> provisioning' invoca este servicio; la
 *    idempotencia de /verify queda garantizada por construcción.
 * 2. LIVE RELAY: Cada línea del subproceso se sella en el timeline
 *    (actor=provisioner) y se difunde como trama 'log' en simultáneo.
 * 3. EXACTLY-ONE ENDPOINT: Si el backend reporta ambos endpoints, el
 *    'instance_url' prevalece y 'verify_url' se descarta para preservar
 *    la unicidad del endpoint vivo.
 * =================================================================
 */

use enclagent_domain_models::errors::GatewayError;
use enclagent_domain_models::events::StreamChannel;
use enclagent_domain_models::session::{RuntimeState, SessionStatus};
use enclagent_domain_models::timeline::{event_types, TimelineActor};
use enclagent_infra_provisioner::{CommandProvisioner, OutputChannel, ProvisionLine, ProvisionerError};
use enclagent_infra_store::{MutationProposal, TimelineSeed};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::state::AppState;

/// Capacidad del buffer de relay de líneas del subproceso.
const LINE_RELAY_BUFFER_CAPACITY: usize = 256;

/// Lanza la conducción completa del aprovisionamiento de una sesión.
/// Invocar exactamente una vez, tras ganar la transición a 'provisioning'.
pub fn spawn_provisioning_dispatch(application_state: AppState, session_id: Uuid) {
    tokio::spawn(async move {
        drive_provisioning(application_state, session_id).await;
    });
}

async fn drive_provisioning(application_state: AppState, session_id: Uuid) {
    let environment = application_state.environment.clone();

    let command_line = match &environment.provisioning_command {
        Some(configured_command) => configured_command.clone(),
        None => {
            // Guard imposible por contrato: la fuente 'command' exige comando.
            seal_provisioning_failure(
                &application_state,
                &session_id,
                GatewayError::ProvisioningBackendUnconfigured,
            )
            .await;
            return;
        }
    };

    // --- RELAY DE LÍNEAS: SUBPROCESO -> TIMELINE + BUS ---
    let (line_sender, mut line_receiver) = mpsc::channel::<ProvisionLine>(LINE_RELAY_BUFFER_CAPACITY);
    let relay_state = application_state.clone();
    let relay_task = tokio::spawn(async move {
        while let Some(provision_line) = line_receiver.recv().await {
            let line_status = match provision_line.channel {
                OutputChannel::Stdout => "ok",
                OutputChannel::Stderr => "error",
            };

            if let Err(timeline_fault) = relay_state
                .timeline_repository
                .append(
                    &session_id,
                    event_types::PROVISIONING_OUTPUT,
                    line_status,
                    &provision_line.content,
                    TimelineActor::Provisioner,
                    chrono::Utc::now(),
                )
                .await
            {
                warn!("⚠️ [PROVISION_RELAY]: Timeline seal failed: {}", timeline_fault);
            }

            relay_state.event_bus.publish(
                StreamChannel::Log,
                &session_id,
                "log",
                serde_json::json!({
                    "source": "provisioner",
                    "level": line_status,
                    "message": provision_line.content,
                }),
            );
        }
    });

    // --- DESPACHO ÚNICO Y ACOTADO ---
    let provisioner = CommandProvisioner::new(command_line, environment.provisioning_timeout_ms);
    let dispatch_result = provisioner.dispatch(&session_id, line_sender).await;
    let _ = relay_task.await;

    match dispatch_result {
        Ok(outcome) => {
            let commit_result = application_state
                .session_repository
                .apply(&session_id, |current_snapshot| {
                    if current_snapshot.status != SessionStatus::Provisioning {
                        return Err(GatewayError::VersionConflict);
                    }

                    let mut proposed_record = current_snapshot.clone();
                    proposed_record.status = SessionStatus::Ready;
                    proposed_record.runtime_state = RuntimeState::Running;
                    proposed_record.dedicated_instance = outcome.dedicated_instance;
                    proposed_record.launched_on_eigencloud = outcome.launched_on_eigencloud;
                    proposed_record.eigen_app_id = outcome.eigen_app_id.clone();

                    // Unicidad del endpoint vivo: instance_url prevalece.
                    let live_instance_url = outcome
                        .instance_url
                        .as_deref()
                        .filter(|url| !url.is_empty())
                        .map(str::to_string);
                    if live_instance_url.is_some() {
                        proposed_record.instance_url = live_instance_url;
                        proposed_record.verify_url = None;
                    } else {
                        proposed_record.instance_url = None;
                        proposed_record.verify_url = outcome
                            .verify_url
                            .as_deref()
                            .filter(|url| !url.is_empty())
                            .map(str::to_string);
                    }

                    proposed_record.detail = "runtime provisioned and running".to_string();

                    Ok(MutationProposal {
                        record: proposed_record,
                        timeline: vec![TimelineSeed::ok(
                            event_types::PROVISIONING_SUCCEEDED,
                            "provisioning backend reported a live endpoint",
                            TimelineActor::Provisioner,
                        )],
                    })
                })
                .await;

            match commit_result {
                Ok(ready_record) => {
                    info!("🚀 [PROVISION_READY]: Session {} reached ready.", session_id);
                    application_state.event_bus.publish(
                        StreamChannel::Job,
                        &session_id,
                        "job_status",
                        serde_json::json!({
                            "status": "ready",
                            "instance_url": ready_record.instance_url,
                            "verify_url": ready_record.verify_url,
                        }),
                    );
                }
                Err(commit_fault) => {
                    error!("💀 [PROVISION_COMMIT_FAULT]: {}", commit_fault);
                }
            }
        }
        Err(dispatch_fault) => {
            let gateway_fault = match dispatch_fault {
                ProvisionerError::Timeout { timeout_ms } => {
                    GatewayError::ProvisioningTimeout { timeout_ms }
                }
                ProvisionerError::MalformedResult(reason) => {
                    GatewayError::ProvisioningMalformedResult(reason)
                }
                other_fault => GatewayError::ProvisioningFailure(other_fault.to_string()),
            };
            seal_provisioning_failure(&application_state, &session_id, gateway_fault).await;
        }
    }
}

/// Transiciona la sesión a 'failed' preservando la razón terminal.
async fn seal_provisioning_failure(
    application_state: &AppState,
    session_id: &Uuid,
    gateway_fault: GatewayError,
) {
    warn!("❌ [PROVISION_FAILED]: Session {} -> {}", session_id, gateway_fault);

    let terminal_reason = format!("{}: {}", gateway_fault.error_code(), gateway_fault);
    let commit_result = application_state
        .session_repository
        .apply(session_id, |current_snapshot| {
            if current_snapshot.status != SessionStatus::Provisioning {
                return Err(GatewayError::VersionConflict);
            }

            let mut proposed_record = current_snapshot.clone();
            proposed_record.status = SessionStatus::Failed;
            proposed_record.error = Some(terminal_reason.clone());
            proposed_record.detail = "provisioning failed; session is terminal".to_string();

            Ok(MutationProposal {
                record: proposed_record,
                timeline: vec![TimelineSeed::error(
                    event_types::PROVISIONING_FAILED,
                    terminal_reason.clone(),
                    TimelineActor::Provisioner,
                )],
            })
        })
        .await;

    if let Err(commit_fault) = commit_result {
        error!("💀 [PROVISION_SEAL_FAULT]: {}", commit_fault);
    }

    application_state.event_bus.publish(
        StreamChannel::Job,
        session_id,
        "job_status",
        serde_json::json!({
            "status": "failed",
            "error_code": gateway_fault.error_code(),
        }),
    );
}
