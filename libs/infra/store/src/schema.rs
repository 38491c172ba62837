// [libs/infra/store/src/schema.rs]
/**
 * =================================================================
 * APARATO: GATEWAY DATABASE SCHEMA (V20.0 - SESSION LEDGER)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: GOBERNANZA ESTRUCTURAL E IDEMPOTENCIA TOTAL
 *
 * VISION HIPER-HOLÍSTICA:
 * 1. SESSION LEDGER: Registro autoritativo de sesiones con columnas de
 *    acceso caliente (status, wallet, expiries) junto al JSON canónico.
 * 2. APPEND-ONLY TIMELINE: Clave primaria (session_id, seq_id) que hace
 *    físicamente imposible el reordenamiento o la duplicación.
 * 3. IDEMPOTENCIA: Gestión de errores para migraciones en caliente.
 * 4. PERFORMANCE: Índices de aceleración para listados por wallet.
 * =================================================================
 */

use anyhow::{Context, Result};
use libsql::Connection;
use tracing::{debug, info, instrument, warn};

/**
 * ESTRATO 1: SOLIDIFICACIÓN (Génesis de Tablas)
 * Define las entidades base del plano de control.
 */
const CONTROL_PLANE_TABLES: &[(&str, &str)] = &[
    ("TABLE_SESSIONS", r#"
        CREATE TABLE IF NOT EXISTS sessions (
            session_id TEXT PRIMARY KEY,
            wallet_address TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending_signature',
            version INTEGER NOT NULL DEFAULT 1,
            record_json TEXT NOT NULL,
            challenge_expires_at DATETIME NOT NULL,
            expires_at DATETIME NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );
    "#),
    ("TABLE_TIMELINE_EVENTS", r#"
        CREATE TABLE IF NOT EXISTS timeline_events (
            session_id TEXT NOT NULL,
            seq_id INTEGER NOT NULL,
            event_type TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'ok',
            detail TEXT NOT NULL DEFAULT '',
            actor TEXT NOT NULL DEFAULT 'system',
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY(session_id, seq_id)
        );
    "#),
    ("TABLE_ONBOARDING_STATES", r#"
        CREATE TABLE IF NOT EXISTS onboarding_states (
            session_id TEXT PRIMARY KEY,
            state_json TEXT NOT NULL,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );
    "#),
];

/**
 * ESTRATO 2: EVOLUCIÓN (Mutaciones de Columna)
 * Asegura que despliegues previos adquieran las nuevas capacidades.
 */
const EVOLUTIONARY_STRATA: &[(&str, &str)] = &[
    ("SESSION_PRIVY_ID", "ALTER TABLE sessions ADD COLUMN privy_user_id TEXT"),
    ("SESSION_ERROR", "ALTER TABLE sessions ADD COLUMN error TEXT"),
];

/**
 * ESTRATO 3: ENDURECIMIENTO (Índices de Aceleración)
 */
const ACCELERATION_INDEXES: &[(&str, &str)] = &[
    ("IDX_SESSIONS_WALLET", "CREATE INDEX IF NOT EXISTS idx_sessions_wallet ON sessions(wallet_address, updated_at);"),
    ("IDX_SESSIONS_EXPIRY", "CREATE INDEX IF NOT EXISTS idx_sessions_expiry ON sessions(status, challenge_expires_at, expires_at);"),
];

/**
 * Ejecuta la secuencia maestra de sincronización del esquema estructural.
 *
 * # Errors:
 * Retorna error si alguna tabla base falla en solidificarse, indicando
 * un colapso en el enlace con el motor.
 */
#[instrument(skip(database_connection))]
pub async fn apply_gateway_schema(database_connection: &Connection) -> Result<()> {
    info!("🏗️ [SCHEMA_ENGINE]: Initiating structural synchronization V20.0...");

    solidify_base_strata(database_connection).await?;
    execute_evolutionary_repair(database_connection).await?;
    harden_access_layer(database_connection).await?;

    info!("✅ [SCHEMA_ENGINE]: Session Ledger V20.0 level and certified.");
    Ok(())
}

async fn solidify_base_strata(db: &Connection) -> Result<()> {
    for (identifier, sql) in CONTROL_PLANE_TABLES {
        debug!("  ↳ Solidifying: {}", identifier);
        db.execute(*sql, ()).await
            .with_context(|| format!("CRITICAL_SOLIDIFICATION_FAULT: {}", identifier))?;
    }
    Ok(())
}

async fn execute_evolutionary_repair(db: &Connection) -> Result<()> {
    for (identifier, sql) in EVOLUTIONARY_STRATA {
        match db.execute(*sql, ()).await {
            Ok(_) => info!("  🟢 [REPAIR_OK]: Applied evolutionary stratum {}", identifier),
            Err(repair_fault) => {
                let message = repair_fault.to_string();
                if message.contains("duplicate column name") {
                    debug!("  ⚪ [REPAIR_SKIP]: {} already level.", identifier);
                } else {
                    warn!("  ⚠️ [REPAIR_BYPASS]: {} check incomplete: {}", identifier, message);
                }
            }
        }
    }
    Ok(())
}

async fn harden_access_layer(db: &Connection) -> Result<()> {
    for (identifier, sql) in ACCELERATION_INDEXES {
        debug!("  ↳ Hardening: {}", identifier);
        db.execute(*sql, ()).await
            .with_context(|| format!("CRITICAL_HARDENING_FAULT: {}", identifier))?;
    }
    Ok(())
}
