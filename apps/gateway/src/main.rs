// [apps/gateway/src/main.rs]
/*!
 * =================================================================
 * APARATO: GATEWAY MAIN ENTRY POINT (V14.0 - GOLD MASTER)
 * CLASIFICACIÓN: APPLICATION SHELL (ESTRATO L4)
 * RESPONSABILIDAD: BOOTSTRAP DE INFRAESTRUCTURA E IGNICIÓN SEGURA
 *
 * # Mathematical Proof (Deterministic Ignition):
 * La captura del entorno y la sincronización del esquema ocurren antes
 * de la apertura del socket TCP, previniendo estados de carrera donde
 * un cliente alcance una superficie aún no cristalizada.
 * =================================================================
 */

use enclagent_gateway::prelude::*;

use dotenvy::dotenv;
use enclagent_shared_heimdall::init_tracing;
use tracing::info;

/**
 * Punto de ignición supremo del binario del Gateway.
 */
fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. CARGA DE ENTORNO SOBERANO
    dotenv().ok();

    // 2. INICIALIZACIÓN DE OBSERVABILIDAD NEURAL (HEIMDALL)
    init_tracing("enclagent_gateway");

    // 3. CONSTRUCCIÓN DEL RUNTIME SOBERANO
    let runtime_orchestrator = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime_orchestrator.block_on(async {
        info!("🛰️  [CONTROL_PLANE]: Global ignition sequence starting...");

        // 4. ADQUISICIÓN DE COORDENADAS DEL DESPLIEGUE
        let database_connection_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "file:enclagent_gateway.db".to_string());
        let database_access_token = std::env::var("TURSO_AUTH_TOKEN").ok();

        let listening_network_port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "8787".to_string())
            .parse()
            .unwrap_or(8787);

        // 5. CAPTURA ÚNICA DEL ENTORNO INMUTABLE
        let environment = GatewayEnvironment::capture();

        // 6. CONSTRUCCIÓN DEL KERNEL SOBERANO (ESTRATO L1-APP)
        let kernel_instance = GatewayKernel::ignite(
            &database_connection_url,
            database_access_token,
            listening_network_port,
            environment,
        )
        .await;

        // 7. IGNICIÓN DE OPERACIONES DEL PLANO DE CONTROL
        info!("🚀 [GATEWAY_ONLINE]: System operational on port {}.", listening_network_port);
        kernel_instance.launch_gateway_operations().await;

        Ok(())
    })
}
