// [apps/gateway/src/services/mod.rs]
/**
 * =================================================================
 * APARATO: SERVICE ORCHESTRATION HUB (V11.0)
 * CLASIFICACIÓN: APPLICATION SERVICES (ESTRATO L4)
 * RESPONSABILIDAD: EXPOSICIÓN NOMINAL DE DAEMONS Y MOTORES
 * =================================================================
 */

pub mod event_bus;
pub mod expiry_sweeper;
pub mod provisioning;

// --- RE-EXPORTACIONES SOBERANAS (NOMINAL ACCESS) ---

pub use event_bus::EventBus;
pub use expiry_sweeper::spawn_expiry_sweeper;
pub use provisioning::spawn_provisioning_dispatch;
