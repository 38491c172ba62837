// [libs/infra/store/src/client.rs]
/*!
 * =================================================================
 * APARATO: STORE CONNECTION CLIENT (V16.0 - LOCATION TYPED)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: CLASIFICACIÓN DEL DESTINO DE PERSISTENCIA Y BOOTSTRAP
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. TYPED LOCATION: El destino (RAM compartida, fichero local, cluster
 *    remoto) se clasifica a un tipo cerrado ANTES de tocar el motor;
 *    cada brazo del match lleva sus propias exigencias (token, ancla).
 * 2. SINGLE GENESIS PATH: Un único camino de bootstrap: una conexión
 *    génesis aplica pragmas y esquema; en modo RAM esa misma conexión
 *    queda retenida como línea de vida del segmento compartido.
 * 3. WRITE-LOCK PATIENCE: El presupuesto de espera ante candados de
 *    escritura se fija en el génesis; los turnos CAS concurrentes del
 *    repositorio de sesiones esperan en vez de colapsar con SQLITE_BUSY.
 *
 * # Mathematical Proof (Lifeline Retention):
 * Un segmento 'mode=memory&cache=shared' vive mientras exista al menos
 * una conexión abierta. Retener la conexión génesis durante toda la vida
 * del cliente garantiza esquema y datos visibles para cada conexión
 * posterior del mismo proceso.
 * =================================================================
 */

use crate::errors::StoreError;
use crate::schema::apply_gateway_schema;
use libsql::{Builder, Connection, Database};
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

/// Presupuesto de espera ante candados de escritura del motor (ms).
const WRITE_LOCK_PATIENCE_MS: u32 = 5_000;

/// Clasificación cerrada del destino de persistencia del ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    /// Segmento de RAM compartido; exige línea de vida retenida.
    Memory(String),
    /// Fichero sqlite local (default de un despliegue single-node).
    LocalFile(String),
    /// Cluster libSQL remoto; exige token de acceso.
    Remote(String),
}

impl StoreLocation {
    /// Clasifica una URL de conexión a su estrato de persistencia.
    ///
    /// # Errors:
    /// - `StoreError::ConfigurationError` ante una URL vacía.
    pub fn classify(database_connection_url: &str) -> Result<StoreLocation, StoreError> {
        let trimmed_url = database_connection_url.trim();
        if trimmed_url.is_empty() {
            return Err(StoreError::ConfigurationError(
                "DATABASE_URL_UNDEFINED".into(),
            ));
        }

        let is_remote_scheme = ["libsql://", "https://", "http://"]
            .iter()
            .any(|scheme| trimmed_url.starts_with(scheme));
        if is_remote_scheme {
            return Ok(StoreLocation::Remote(trimmed_url.to_string()));
        }

        let is_memory_segment =
            trimmed_url.contains(":memory:") || trimmed_url.contains("mode=memory");
        if is_memory_segment {
            return Ok(StoreLocation::Memory(trimmed_url.to_string()));
        }

        Ok(StoreLocation::LocalFile(trimmed_url.to_string()))
    }

    /// Etiqueta nominal del estrato para el rastro de ignición.
    pub fn strata_label(&self) -> &'static str {
        match self {
            StoreLocation::Memory(_) => "memory",
            StoreLocation::LocalFile(_) => "local_file",
            StoreLocation::Remote(_) => "remote",
        }
    }
}

/// Cliente del ledger de sesiones; clonable y compartible entre handlers.
#[derive(Clone)]
pub struct GatewayStoreClient {
    database_engine: Arc<Database>,
    /// Conexión génesis retenida; solo poblada en el estrato de RAM.
    memory_lifeline: Option<Arc<Connection>>,
}

impl GatewayStoreClient {
    /**
     * Ancla el ledger de sesiones: clasifica el destino, forja el motor,
     * aplica pragmas y esquema sobre la conexión génesis, y retiene la
     * línea de vida cuando el estrato es RAM.
     *
     * # Errors:
     * - `ConfigurationError`: URL vacía o cluster remoto sin token.
     * - `ConnectionError`: el motor rechazó la ignición o el esquema.
     */
    #[instrument(skip(database_access_token))]
    pub async fn connect(
        database_connection_url: &str,
        database_access_token: Option<String>,
    ) -> Result<Self, StoreError> {
        let ledger_location = StoreLocation::classify(database_connection_url)?;
        info!(
            "🔌 [STORE]: Anchoring session ledger on the '{}' stratum.",
            ledger_location.strata_label()
        );

        // 1. FORJA DEL MOTOR SEGÚN EL ESTRATO CLASIFICADO
        let database_engine = match &ledger_location {
            StoreLocation::Remote(remote_url) => {
                let access_token = database_access_token.ok_or_else(|| {
                    StoreError::ConfigurationError(
                        "REMOTE_LEDGER_TOKEN_MISSING: set TURSO_AUTH_TOKEN".into(),
                    )
                })?;
                Builder::new_remote(remote_url.clone(), access_token)
                    .build()
                    .await
            }
            StoreLocation::Memory(local_url) | StoreLocation::LocalFile(local_url) => {
                Builder::new_local(local_url.clone()).build().await
            }
        }
        .map_err(|ignition_fault| {
            StoreError::ConnectionError(format!("ENGINE_IGNITION_REJECTED: {}", ignition_fault))
        })?;
        let database_engine = Arc::new(database_engine);

        // 2. CONEXIÓN GÉNESIS: PRAGMAS + ESQUEMA EN UN ÚNICO CAMINO
        let genesis_connection = database_engine.connect().map_err(|genesis_fault| {
            StoreError::ConnectionError(format!("GENESIS_LINK_REJECTED: {}", genesis_fault))
        })?;

        // Paciencia ante candados de escritura para los turnos CAS.
        if genesis_connection
            .query(
                &format!("PRAGMA busy_timeout = {}", WRITE_LOCK_PATIENCE_MS),
                (),
            )
            .await
            .is_err()
        {
            debug!("⚪ [STORE]: busy_timeout pragma unsupported on this stratum; continuing.");
        }

        apply_gateway_schema(&genesis_connection)
            .await
            .map_err(|schema_fault| {
                StoreError::ConnectionError(format!("SCHEMA_SYNC_FAULT: {}", schema_fault))
            })?;

        // 3. RETENCIÓN CONDICIONAL DE LA LÍNEA DE VIDA
        let memory_lifeline = match ledger_location {
            StoreLocation::Memory(_) => {
                info!("⚓ [STORE]: Genesis connection retained as memory lifeline.");
                Some(Arc::new(genesis_connection))
            }
            _ => None,
        };

        Ok(Self {
            database_engine,
            memory_lifeline,
        })
    }

    /// Asigna una conexión fresca del motor para un turno de trabajo.
    pub fn get_connection(&self) -> Result<Connection, StoreError> {
        self.database_engine.connect().map_err(|allocation_fault| {
            error!("⚠️ [POOL_FAULT]: Connection allocation failed: {}", allocation_fault);
            StoreError::ConnectionError(allocation_fault.to_string())
        })
    }

    /// El estrato de RAM mantiene viva su línea de vida.
    pub fn has_memory_lifeline(&self) -> bool {
        self.memory_lifeline.is_some()
    }
}
