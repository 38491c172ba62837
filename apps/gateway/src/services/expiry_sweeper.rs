// [apps/gateway/src/services/expiry_sweeper.rs]
/*!
 * =================================================================
 * APARATO: EXPIRY SWEEPER DAEMON (V8.0 - TTL REAPER)
 * CLASIFICACIÓN: APPLICATION SERVICES (ESTRATO L4)
 * RESPONSABILIDAD: BARRIDO PERIÓDICO DE CHALLENGES Y SESIONES VENCIDAS
 *
 * # Logic:
 * Cada intervalo configurado, el daemon delega en el almacén la
 * transición 'expired' de toda sesión elegible y difunde el veredicto
 * por el canal de jobs para los clientes conectados.
 * =================================================================
 */

use enclagent_domain_models::events::StreamChannel;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{error, info};

use crate::state::AppState;

/// Lanza el daemon de barrido de expiración.
pub fn spawn_expiry_sweeper(application_state: AppState) {
    let sweep_interval_ms = application_state.environment.expiry_sweep_interval_ms.max(250);

    tokio::spawn(async move {
        info!("⏳ [SWEEPER_ONLINE]: Expiry daemon armed at {} ms cadence.", sweep_interval_ms);
        let mut sweep_timer = interval(Duration::from_millis(sweep_interval_ms));
        sweep_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            sweep_timer.tick().await;

            match application_state
                .session_repository
                .expire_due(chrono::Utc::now())
                .await
            {
                Ok(expired_session_ids) => {
                    for expired_session_id in expired_session_ids {
                        application_state.event_bus.publish(
                            StreamChannel::Job,
                            &expired_session_id,
                            "job_status",
                            serde_json::json!({
                                "status": "expired",
                                "detail": "challenge/provisioning expired",
                            }),
                        );
                    }
                }
                Err(sweep_fault) => {
                    error!("💀 [SWEEPER_FAULT]: Expiry pass collapsed: {}", sweep_fault);
                }
            }

            // Destrucción definitiva tras la ventana de retención.
            if let Err(purge_fault) = application_state
                .session_repository
                .purge_retired(
                    chrono::Utc::now(),
                    application_state.environment.session_ttl_seconds,
                )
                .await
            {
                error!("💀 [RETENTION_FAULT]: Purge pass collapsed: {}", purge_fault);
            }
        }
    });
}
