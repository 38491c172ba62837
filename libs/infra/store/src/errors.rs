// [libs/infra/store/src/errors.rs]
/*!
 * =================================================================
 * APARATO: STORE ERROR CATALOG (V11.0 - SEMANTIC FAULTS)
 * CLASIFICACIÓN: INFRASTRUCTURE CORE (ESTRATO L3)
 * RESPONSABILIDAD: CATALOGACIÓN SEMÁNTICA DE FALLOS DE PERSISTENCIA
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. CAS AWARENESS: 'VersionConflict' distingue la pérdida benigna de
 *    un turno CAS de cualquier fallo físico del motor.
 * 2. DOMAIN BRIDGE: 'DomainRejection' transporta sin pérdida el fallo
 *    tipado producido por un mutador de dominio.
 * 3. PANOPTICON COMPLIANCE: Prefijos de estrato para el renderizado
 *    cromático del panel de operaciones.
 * =================================================================
 */

use enclagent_domain_models::errors::GatewayError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    /// Error de enlace físico o de red con el motor libSQL.
    #[error("[L3_STORE_NET_FAULT]: DATABASE_UPLINK_SEVERED -> {0}")]
    ConnectionError(String),

    /// Fallo en la configuración del entorno (URL vacía o token ausente).
    #[error("[L3_STORE_CONFIG_FAULT]: STRATEGIC_ENV_VOID -> {0}")]
    ConfigurationError(String),

    /// Error de sintaxis o ejecución devuelto por el motor libSQL.
    #[error("[L3_STORE_QUERY_FAULT]: SQL_QUERY_REJECTED -> {0}")]
    QueryError(#[from] libsql::Error),

    /// Fallo en la transformación de tipos entre SQLite y el Dominio.
    #[error("[L3_STORE_MAPPING_FAULT]: DATA_MAPPING_VIOLATION -> {0}")]
    MappingError(String),

    // --- ESTRATO DE CICLO DE VIDA DE SESIÓN ---

    /// La sesión solicitada no existe en el almacén.
    #[error("[L3_SESSION_FAULT]: IDENTIFIER_NOT_FOUND")]
    SessionNotFound,

    /// Pérdida del turno CAS: otro escritor comprometió una versión
    /// más reciente entre la lectura y el commit.
    #[error("[L3_SESSION_FAULT]: VERSION_CAS_LOST")]
    VersionConflict,

    /// La propuesta del mutador viola un invariante del dominio.
    #[error("[L3_SESSION_FAULT]: INVARIANT_VIOLATION -> {0}")]
    InvariantViolation(String),

    /// El mutador de dominio rechazó la mutación con un fallo tipado.
    #[error("[L3_SESSION_FAULT]: DOMAIN_REJECTION -> {0}")]
    DomainRejection(GatewayError),
}

impl StoreError {
    /// Proyecta el fallo de persistencia a la taxonomía de cable.
    pub fn into_gateway_error(self) -> GatewayError {
        match self {
            StoreError::SessionNotFound => {
                GatewayError::SessionNotFound("unknown".to_string())
            }
            StoreError::VersionConflict => GatewayError::VersionConflict,
            StoreError::DomainRejection(domain_fault) => domain_fault,
            other_fault => GatewayError::Internal(other_fault.to_string()),
        }
    }
}
