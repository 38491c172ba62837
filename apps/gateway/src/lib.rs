// [apps/gateway/src/lib.rs]
/*!
 * =================================================================
 * APARATO: GATEWAY LIBRARY ROOT (V9.0 - SOVEREIGN AUTHORITY)
 * CLASIFICACIÓN: CRATE ROOT (ESTRATO L4)
 * RESPONSABILIDAD: DEFINICIÓN SUPREMA DEL ÁRBOL DE MÓDULOS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. MODULE HIERARCHY HARDENING: Autoridad única de módulos para que
 *    'crate::' resuelva de forma determinista en librería y binario.
 * 2. PUBLIC INTERFACE: Expone 'prelude' para la ignición mínima del
 *    Kernel desde 'main.rs' y desde los bancos de prueba.
 * =================================================================
 */

// --- ESTRATO DE CONFIGURACIÓN Y ESTADO (L1-APP) ---
/// Captura inmutable del entorno del despliegue.
pub mod config;
/// Gestor del sistema nervioso central del gateway.
pub mod state;

// --- ESTRATO DE TRANSPORTE Y ACCIÓN ---
/// Proyección de fallos del dominio al sobre de cable.
pub mod api;
/// Adaptadores de entrada para ráfagas HTTP y flujos SSE.
pub mod handlers;
/// Núcleo de mando para la ignición de servicios.
pub mod kernel;
/// Definición de rutas y topología de red.
pub mod routes;

// --- ESTRATO DE SERVICIOS DE FONDO ---
/// Bus de eventos, barrido de expiración y despacho de aprovisionamiento.
pub mod services;

/**
 * PRELUDIO DEL GATEWAY
 *
 * Re-exportación estratégica de los componentes de ignición mínima.
 */
pub mod prelude {
    pub use crate::config::GatewayEnvironment;
    pub use crate::kernel::GatewayKernel;
    pub use crate::state::AppState;
}
