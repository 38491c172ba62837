// [apps/gateway/src/state/mod.rs]
/*!
 * =================================================================
 * APARATO: GATEWAY STATE ORCHESTRATOR (V13.0 - COMPOSITION HUB)
 * CLASIFICACIÓN: APPLICATION STATE (ESTRATO L1-APP)
 * RESPONSABILIDAD: ORQUESTACIÓN DE REPOSITORIOS, BUS Y ENTORNO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. COMPOSITION ROOT: Centraliza el rastro de los repositorios y el
 *    bus; ningún handler accede a singletons ambientales.
 * 2. IMMUTABLE ENVIRONMENT: El entorno capturado viaja en Arc y jamás
 *    se relee tras el boot.
 * 3. NOMINAL PURITY: Uso de 'Arc<T>' para inmutabilidad compartida.
 * =================================================================
 */

use std::sync::Arc;

use enclagent_infra_store::{
    GatewayStoreClient, OnboardingRepository, SessionRepository, TimelineRepository,
};
use tracing::debug;

use crate::config::GatewayEnvironment;
use crate::services::event_bus::EventBus;

/**
 * Contenedor de estado compartido (Thread-Safe) para el Gateway.
 * Actúa como la placa base donde se conectan todos los estratos.
 */
#[derive(Clone)]
pub struct AppState {
    /// Cliente del motor de persistencia libSQL.
    pub store_client: GatewayStoreClient,
    /// Entorno inmutable capturado en el boot.
    pub environment: Arc<GatewayEnvironment>,
    /// Bus de eventos para el relay SSE en tiempo real.
    pub event_bus: Arc<EventBus>,
    /// Autoridad del ciclo de vida de sesiones (CAS).
    pub session_repository: Arc<SessionRepository>,
    /// Lector del timeline append-only.
    pub timeline_repository: Arc<TimelineRepository>,
    /// Documentos conversacionales de onboarding.
    pub onboarding_repository: Arc<OnboardingRepository>,
}

impl AppState {
    /**
     * Forja una nueva instancia del Estado Maestro inyectando todas
     * las dependencias del plano de control.
     */
    pub fn new(store_client: GatewayStoreClient, environment: GatewayEnvironment) -> Self {
        debug!("🧬 [APP_STATE]: Executing gateway ignition sequence V13.0...");

        let event_bus_instance = Arc::new(EventBus::new(environment.sse_queue_capacity));

        Self {
            session_repository: Arc::new(SessionRepository::new(store_client.clone())),
            timeline_repository: Arc::new(TimelineRepository::new(store_client.clone())),
            onboarding_repository: Arc::new(OnboardingRepository::new(store_client.clone())),
            event_bus: event_bus_instance,
            environment: Arc::new(environment),
            store_client,
        }
    }
}
