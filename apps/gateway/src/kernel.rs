// [apps/gateway/src/kernel.rs]
/**
 * =================================================================
 * APARATO: GATEWAY SOVEREIGN KERNEL (V18.0 - GUARD ACTIVE)
 * CLASIFICACIÓN: COMPOSITION ROOT (ESTRATO L1-APP)
 * RESPONSABILIDAD: BOOTSTRAP DE INFRAESTRUCTURA E IGNICIÓN SEGURA
 *
 * VISION HIPER-HOLÍSTICA:
 * Actúa como la placa base donde se conectan todos los servicios:
 * persistencia, barrido de expiración y el transporte HTTP/SSE.
 * =================================================================
 */

use crate::config::GatewayEnvironment;
use crate::routes::create_gateway_router;
use crate::services::spawn_expiry_sweeper;
use crate::state::AppState;
use enclagent_infra_store::GatewayStoreClient;
use std::net::{IpAddr, SocketAddr};
use tracing::{error, info, instrument};

pub struct GatewayKernel {
    pub server_network_port: u16,
    pub application_shared_state: AppState,
}

impl GatewayKernel {
    /**
     * Realiza la ignición del cliente de persistencia y el estado maestro.
     * Establece la conexión a la base de datos antes de levantar servicios.
     */
    #[instrument(skip(database_access_token, environment))]
    pub async fn ignite(
        database_connection_url: &str,
        database_access_token: Option<String>,
        listening_port: u16,
        environment: GatewayEnvironment,
    ) -> Self {
        let store_client = GatewayStoreClient::connect(database_connection_url, database_access_token)
            .await
            .expect("FATAL: Database link collapse. Ignition aborted.");

        Self {
            server_network_port: listening_port,
            application_shared_state: AppState::new(store_client, environment),
        }
    }

    /**
     * Lanza la ejecución de todas las operaciones autónomas del gateway.
     * Configura los daemons de fondo y el servidor HTTP principal.
     */
    pub async fn launch_gateway_operations(self) {
        let shared_application_state = self.application_shared_state.clone();

        // --- 1. DAEMON DE BARRIDO DE EXPIRACIÓN (TTL REAPER) ---
        spawn_expiry_sweeper(shared_application_state.clone());

        // --- 2. IGNICIÓN DEL TRANSPORTE HTTP/SSE (AXUM) ---
        let gateway_router = create_gateway_router(shared_application_state);

        let bind_address = SocketAddr::new(
            "0.0.0.0".parse::<IpAddr>().expect("static address"),
            self.server_network_port,
        );

        info!("🚀 [KERNEL_ONLINE]: Enclagent Gateway listening at {}", bind_address);

        let tcp_listener = tokio::net::TcpListener::bind(bind_address)
            .await
            .expect("CRITICAL_FAULT: Failed to bind network port.");

        if let Err(server_error) = axum::serve(tcp_listener, gateway_router).await {
            error!("💀 [KERNEL_COLLAPSE]: Runtime failure: {}", server_error);
            std::process::exit(1);
        }
    }
}
// FIN DEL ARCHIVO [apps/gateway/src/kernel.rs]
