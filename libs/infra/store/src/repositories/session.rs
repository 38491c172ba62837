// [libs/infra/store/src/repositories/session.rs]
/*!
 * =================================================================
 * APARATO: SESSION REPOSITORY (V33.0 - CAS AUTHORITY)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: CICLO DE VIDA AUTORITATIVO DE SESIONES CON CAS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. CAS SOVEREIGNTY: Toda escritura atraviesa el compare-and-swap por
 *    versión (UPDATE ... WHERE version = leída); la pérdida del turno se
 *    reintenta localmente y solo tras agotar reintentos aflora
 *    'VersionConflict'.
 * 2. INVARIANT SHIELD: El auditor del dominio certifica cada propuesta
 *    antes del commit; los contadores derivados del checklist se
 *    recalculan en el mismo turno para que todo snapshot sea coherente.
 * 3. SNAPSHOT DISCIPLINE: Las lecturas devuelven copias profundas
 *    deserializadas; ningún llamador toca estado mutable del almacén.
 *
 * # Mathematical Proof (Per-Session Serialization):
 * El par (version leída, UPDATE condicional) forma un semáforo de
 * exclusión mutua a nivel de fila: de N escritores concurrentes sobre la
 * misma sesión exactamente uno compromete cada versión, y los demás
 * observan rows_affected = 0. Las escrituras a sesiones distintas no
 * comparten fila y por tanto proceden en paralelo.
 * =================================================================
 */

use crate::client::GatewayStoreClient;
use crate::errors::StoreError;
use crate::repositories::timeline::TimelineRepository;
use chrono::{DateTime, Duration, Utc};
use enclagent_core_signature::challenge::{
    compose_challenge_message, generate_challenge_nonce, ChallengeSpec,
};
use enclagent_domain_evidence::{derive_gateway_todos, summarize_todos};
use enclagent_domain_models::errors::GatewayError;
use enclagent_domain_models::session::{
    FundingPreflightStatus, ProvisioningSource, RuntimeState, SessionRecord, SessionStatus,
};
use enclagent_domain_models::timeline::{event_types, TimelineActor};
use enclagent_domain_models::wallet::normalize_wallet_address;
use libsql::{params, Row};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Reintentos locales del turno CAS antes de aflorar el conflicto.
const CAS_RETRY_CEILING: usize = 3;

/// Tope duro del parámetro 'limit' en listados por wallet.
const WALLET_LISTING_LIMIT_CEILING: i64 = 100;

const INSERT_SESSION: &str = "
    INSERT INTO sessions (
        session_id, wallet_address, status, version, record_json,
        challenge_expires_at, expires_at, created_at, updated_at,
        privy_user_id, error
    )
    VALUES (?1, ?2, ?3, 1, ?4, ?5, ?6, ?7, ?7, ?8, NULL)
";

const FETCH_SESSION_RECORD: &str = "
    SELECT record_json FROM sessions WHERE session_id = ?1
";

const LIST_SESSIONS_FOR_WALLET: &str = "
    SELECT record_json FROM sessions
    WHERE wallet_address = ?1
    ORDER BY datetime(updated_at) DESC
    LIMIT ?2
";

const CAS_UPDATE_SESSION: &str = "
    UPDATE sessions
    SET record_json = ?1, version = ?2, status = ?3, updated_at = ?4,
        expires_at = ?5, privy_user_id = ?6, error = ?7
    WHERE session_id = ?8 AND version = ?9
";

const SELECT_EXPIRY_CANDIDATES: &str = "
    SELECT session_id FROM sessions
    WHERE (status = 'pending_signature' AND datetime(challenge_expires_at) < datetime(?1))
       OR (status IN ('pending_signature', 'provisioning') AND datetime(expires_at) < datetime(?1))
";

const SELECT_RETIRED_SESSIONS: &str = "
    SELECT session_id FROM sessions
    WHERE status = 'expired' AND datetime(updated_at) < datetime(?1)
";

const PURGE_SESSION_ROW: &str = "DELETE FROM sessions WHERE session_id = ?1";
const PURGE_TIMELINE_ROWS: &str = "DELETE FROM timeline_events WHERE session_id = ?1";
const PURGE_ONBOARDING_ROW: &str = "DELETE FROM onboarding_states WHERE session_id = ?1";

/// Semilla de evento de timeline a sellar junto al commit.
#[derive(Debug, Clone)]
pub struct TimelineSeed {
    pub event_type: String,
    pub status: String,
    pub detail: String,
    pub actor: TimelineActor,
}

impl TimelineSeed {
    pub fn ok(event_type: &str, detail: impl Into<String>, actor: TimelineActor) -> Self {
        Self {
            event_type: event_type.to_string(),
            status: "ok".to_string(),
            detail: detail.into(),
            actor,
        }
    }

    pub fn error(event_type: &str, detail: impl Into<String>, actor: TimelineActor) -> Self {
        Self {
            event_type: event_type.to_string(),
            status: "error".to_string(),
            detail: detail.into(),
            actor,
        }
    }
}

/// Propuesta atómica devuelta por un mutador de dominio.
#[derive(Debug, Clone)]
pub struct MutationProposal {
    pub record: SessionRecord,
    pub timeline: Vec<TimelineSeed>,
}

/// Repositorio de autoridad única del registro de sesiones.
pub struct SessionRepository {
    database_client: GatewayStoreClient,
    timeline_recorder: TimelineRepository,
}

impl SessionRepository {
    pub fn new(client: GatewayStoreClient) -> Self {
        Self {
            timeline_recorder: TimelineRepository::new(client.clone()),
            database_client: client,
        }
    }

    /**
     * Forja una sesión pendiente de firma con su challenge canónico.
     *
     * # Errors:
     * - `StoreError::DomainRejection(invalid_wallet_address)` si la
     *   wallet no es canónica.
     */
    #[instrument(skip(self, privy_user_id), fields(wallet = %raw_wallet_address))]
    pub async fn create_pending(
        &self,
        raw_wallet_address: &str,
        privy_user_id: Option<String>,
        chain_id: Option<u64>,
        provisioning_source: ProvisioningSource,
        challenge_ttl_seconds: i64,
        session_ttl_seconds: i64,
    ) -> Result<SessionRecord, StoreError> {
        let wallet_address = normalize_wallet_address(raw_wallet_address)
            .map_err(StoreError::DomainRejection)?;

        let genesis_instant = Utc::now();
        let session_id = Uuid::new_v4();
        let challenge_expires_at = genesis_instant + Duration::seconds(challenge_ttl_seconds);
        let session_expires_at = genesis_instant + Duration::seconds(session_ttl_seconds);

        let challenge_message = compose_challenge_message(&ChallengeSpec {
            session_id,
            wallet_address: wallet_address.clone(),
            chain_id,
            nonce: generate_challenge_nonce(),
            issued_at: genesis_instant,
            expires_at: challenge_expires_at,
        });

        let mut genesis_record = SessionRecord {
            session_id,
            wallet_address: wallet_address.clone(),
            privy_user_id: privy_user_id.clone(),
            chain_id,
            version: 1,
            status: SessionStatus::PendingSignature,
            runtime_state: RuntimeState::NotStarted,
            challenge_message,
            challenge_created_at: genesis_instant,
            challenge_expires_at,
            config: None,
            profile_name: None,
            profile_domain: None,
            provisioning_source,
            dedicated_instance: false,
            launched_on_eigencloud: false,
            instance_url: None,
            verify_url: None,
            eigen_app_id: None,
            verification_backend: None,
            verification_level: None,
            verification_fallback_enabled: false,
            verification_fallback_require_signed_receipts: false,
            verification_fallback_used: false,
            verification_latency_ms: None,
            funding_preflight_status: FundingPreflightStatus::NotRun,
            funding_preflight_failure_category: None,
            funding_preflight_checks: Vec::new(),
            auth_key_fingerprint: None,
            todo_open_required_count: 0,
            todo_open_recommended_count: 0,
            todo_status_summary: String::new(),
            error: None,
            detail: "challenge issued; awaiting wallet signature".to_string(),
            created_at: genesis_instant,
            updated_at: genesis_instant,
            expires_at: session_expires_at,
        };

        refresh_derived_todo_counters(&mut genesis_record);

        let record_json = serialize_record(&genesis_record)?;
        let database_connection = self.database_client.get_connection()?;

        database_connection
            .execute(
                INSERT_SESSION,
                params![
                    session_id.to_string(),
                    wallet_address,
                    genesis_record.status.as_wire_label(),
                    record_json,
                    challenge_expires_at.to_rfc3339(),
                    session_expires_at.to_rfc3339(),
                    genesis_instant.to_rfc3339(),
                    privy_user_id,
                ],
            )
            .await?;

        self.timeline_recorder
            .append(
                &session_id,
                event_types::CHALLENGE_ISSUED,
                "ok",
                "authorization challenge issued to wallet",
                TimelineActor::System,
                genesis_instant,
            )
            .await?;

        info!("🪪 [SESSION_GENESIS]: Session {} forged for wallet strata.", session_id);
        Ok(genesis_record)
    }

    /// Snapshot profundo de solo lectura.
    pub async fn fetch_snapshot(&self, session_id: &Uuid) -> Result<SessionRecord, StoreError> {
        let database_connection = self.database_client.get_connection()?;
        let mut query_results = database_connection
            .query(FETCH_SESSION_RECORD, params![session_id.to_string()])
            .await?;

        match query_results.next().await? {
            Some(data_row) => deserialize_record_row(data_row),
            None => Err(StoreError::SessionNotFound),
        }
    }

    /// Listado por wallet, ordenado por recencia, con tope [1, 100].
    pub async fn list_for_wallet(
        &self,
        raw_wallet_address: &str,
        requested_limit: i64,
    ) -> Result<Vec<SessionRecord>, StoreError> {
        let wallet_address = normalize_wallet_address(raw_wallet_address)
            .map_err(StoreError::DomainRejection)?;
        let effective_limit = requested_limit.clamp(1, WALLET_LISTING_LIMIT_CEILING);

        let database_connection = self.database_client.get_connection()?;
        let mut query_results = database_connection
            .query(LIST_SESSIONS_FOR_WALLET, params![wallet_address, effective_limit])
            .await?;

        let mut snapshots_collection = Vec::new();
        while let Some(data_row) = query_results.next().await? {
            snapshots_collection.push(deserialize_record_row(data_row)?);
        }
        Ok(snapshots_collection)
    }

    /**
     * Aplica una mutación atómica bajo el turno CAS por versión.
     *
     * El mutador recibe el snapshot vigente y propone el siguiente junto a
     * las semillas de timeline a sellar. El repositorio audita invariantes,
     * recalcula los derivados del checklist, incrementa la versión y
     * compromete con UPDATE condicional. La pérdida del turno se reintenta
     * hasta `CAS_RETRY_CEILING` veces releyendo el snapshot.
     *
     * # Errors:
     * - `StoreError::DomainRejection` si el mutador rechaza la mutación.
     * - `StoreError::InvariantViolation` si la propuesta viola el dominio.
     * - `StoreError::VersionConflict` tras agotar los reintentos CAS.
     */
    #[instrument(skip(self, mutator), fields(session_id = %session_id))]
    pub async fn apply<F>(
        &self,
        session_id: &Uuid,
        mutator: F,
    ) -> Result<SessionRecord, StoreError>
    where
        F: Fn(&SessionRecord) -> Result<MutationProposal, GatewayError>,
    {
        for cas_attempt in 0..CAS_RETRY_CEILING {
            let current_snapshot = self.fetch_snapshot(session_id).await?;
            let observed_version = current_snapshot.version;

            let proposal = mutator(&current_snapshot).map_err(StoreError::DomainRejection)?;
            let mut proposed_record = proposal.record;

            SessionRecord::audit_mutation(&current_snapshot, &proposed_record)
                .map_err(|violation| StoreError::InvariantViolation(violation.to_string()))?;

            let commit_instant = Utc::now();
            proposed_record.version = observed_version + 1;
            proposed_record.updated_at = commit_instant;
            refresh_derived_todo_counters(&mut proposed_record);

            let record_json = serialize_record(&proposed_record)?;
            let database_connection = self.database_client.get_connection()?;

            let rows_affected_count = database_connection
                .execute(
                    CAS_UPDATE_SESSION,
                    params![
                        record_json,
                        proposed_record.version as i64,
                        proposed_record.status.as_wire_label(),
                        commit_instant.to_rfc3339(),
                        proposed_record.expires_at.to_rfc3339(),
                        proposed_record.privy_user_id.clone(),
                        proposed_record.error.clone(),
                        session_id.to_string(),
                        observed_version as i64,
                    ],
                )
                .await?;

            if rows_affected_count == 0 {
                warn!(
                    "🔁 [CAS_TURN_LOST]: Session {} attempt {} superseded; re-reading.",
                    session_id, cas_attempt
                );
                continue;
            }

            for timeline_seed in &proposal.timeline {
                self.timeline_recorder
                    .append(
                        session_id,
                        &timeline_seed.event_type,
                        &timeline_seed.status,
                        &timeline_seed.detail,
                        timeline_seed.actor,
                        commit_instant,
                    )
                    .await?;
            }

            debug!(
                "💾 [CAS_COMMIT]: Session {} advanced to version {}.",
                session_id, proposed_record.version
            );
            return Ok(proposed_record);
        }

        Err(StoreError::VersionConflict)
    }

    /**
     * Barrido de expiración: transiciona a 'expired' toda sesión elegible
     * cuyo challenge o TTL global haya vencido. Las sesiones terminales
     * listas quedan intactas.
     */
    #[instrument(skip(self))]
    pub async fn expire_due(&self, sweep_instant: DateTime<Utc>) -> Result<Vec<Uuid>, StoreError> {
        let database_connection = self.database_client.get_connection()?;
        let mut query_results = database_connection
            .query(SELECT_EXPIRY_CANDIDATES, params![sweep_instant.to_rfc3339()])
            .await?;

        let mut candidate_identifiers = Vec::new();
        while let Some(data_row) = query_results.next().await? {
            let raw_identifier: String = data_row.get(0)?;
            if let Ok(parsed_identifier) = Uuid::parse_str(&raw_identifier) {
                candidate_identifiers.push(parsed_identifier);
            }
        }

        let mut expired_identifiers = Vec::new();
        for candidate_identifier in candidate_identifiers {
            let sweep_outcome = self
                .apply(&candidate_identifier, |current_snapshot| {
                    // Un escritor concurrente pudo completar el launch.
                    if !matches!(
                        current_snapshot.status,
                        SessionStatus::PendingSignature | SessionStatus::Provisioning
                    ) {
                        return Err(GatewayError::VersionConflict);
                    }

                    let mut proposed_record = current_snapshot.clone();
                    proposed_record.status = SessionStatus::Expired;
                    proposed_record.detail = "challenge/provisioning expired".to_string();
                    proposed_record.error = Some("challenge/provisioning expired".to_string());

                    Ok(MutationProposal {
                        record: proposed_record,
                        timeline: vec![TimelineSeed::error(
                            event_types::SESSION_EXPIRED,
                            "session expired by sweeper",
                            TimelineActor::System,
                        )],
                    })
                })
                .await;

            match sweep_outcome {
                Ok(_) => expired_identifiers.push(candidate_identifier),
                Err(StoreError::DomainRejection(GatewayError::VersionConflict)) => {
                    debug!("⏭️ [SWEEP_SKIP]: Session {} escaped expiry.", candidate_identifier);
                }
                Err(sweep_fault) => return Err(sweep_fault),
            }
        }

        if !expired_identifiers.is_empty() {
            info!("⏳ [SWEEP]: {} session(s) expired.", expired_identifiers.len());
        }
        Ok(expired_identifiers)
    }

    /**
     * Destrucción definitiva: borra toda sesión 'expired' cuya ventana
     * de retención haya vencido, junto a su timeline y su documento de
     * onboarding. Las sesiones terminales 'ready'/'failed' se retienen.
     */
    #[instrument(skip(self))]
    pub async fn purge_retired(
        &self,
        sweep_instant: DateTime<Utc>,
        retention_seconds: i64,
    ) -> Result<u64, StoreError> {
        let retention_cutoff = sweep_instant - Duration::seconds(retention_seconds.max(0));
        let database_connection = self.database_client.get_connection()?;

        let mut query_results = database_connection
            .query(SELECT_RETIRED_SESSIONS, params![retention_cutoff.to_rfc3339()])
            .await?;

        let mut purged_count = 0u64;
        while let Some(data_row) = query_results.next().await? {
            let retired_identifier: String = data_row.get(0)?;
            database_connection
                .execute(PURGE_TIMELINE_ROWS, params![retired_identifier.clone()])
                .await?;
            database_connection
                .execute(PURGE_ONBOARDING_ROW, params![retired_identifier.clone()])
                .await?;
            database_connection
                .execute(PURGE_SESSION_ROW, params![retired_identifier])
                .await?;
            purged_count += 1;
        }

        if purged_count > 0 {
            info!("🗑️ [RETENTION]: {} retired session(s) incinerated.", purged_count);
        }
        Ok(purged_count)
    }
}

// --- ESTRATO DE MAPEO (PRIVATE SSoT) ---

fn refresh_derived_todo_counters(record: &mut SessionRecord) {
    let derived_todos = derive_gateway_todos(record);
    let summary = summarize_todos(&derived_todos);
    record.todo_open_required_count = summary.open_required_count;
    record.todo_open_recommended_count = summary.open_recommended_count;
    record.todo_status_summary = summary.status_summary;
}

fn serialize_record(record: &SessionRecord) -> Result<String, StoreError> {
    serde_json::to_string(record)
        .map_err(|serialization_fault| StoreError::MappingError(serialization_fault.to_string()))
}

fn deserialize_record_row(data_row: Row) -> Result<SessionRecord, StoreError> {
    let record_json: String = data_row.get(0)?;
    serde_json::from_str(&record_json)
        .map_err(|deserialization_fault| StoreError::MappingError(deserialization_fault.to_string()))
}
