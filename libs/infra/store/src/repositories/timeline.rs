// [libs/infra/store/src/repositories/timeline.rs]
/*!
 * =================================================================
 * APARATO: TIMELINE RECORDER (V13.0 - APPEND ONLY LEDGER)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: SELLADO ORDENADO E INMUTABLE DE EVENTOS DE SESIÓN
 *
 * # Mathematical Proof (Contiguous Sequencing):
 * El INSERT deriva seq_id de COALESCE(MAX(seq_id), 0) + 1 dentro de la
 * misma sentencia; bajo la serialización por sesión del almacén, la
 * secuencia resultante es exactamente 1..N, sin huecos ni duplicados
 * (la clave primaria compuesta rechaza físicamente la colisión).
 * =================================================================
 */

use crate::client::GatewayStoreClient;
use crate::errors::StoreError;
use chrono::{DateTime, Utc};
use enclagent_domain_models::timeline::{TimelineActor, TimelineEvent};
use libsql::{params, Row};
use tracing::{debug, instrument};
use uuid::Uuid;

const APPEND_TIMELINE_EVENT: &str = "
    INSERT INTO timeline_events (session_id, seq_id, event_type, status, detail, actor, created_at)
    VALUES (
        ?1,
        (SELECT COALESCE(MAX(seq_id), 0) + 1 FROM timeline_events WHERE session_id = ?1),
        ?2, ?3, ?4, ?5, ?6
    )
";

const LIST_TIMELINE_EVENTS: &str = "
    SELECT session_id, seq_id, event_type, status, detail, actor, created_at
    FROM timeline_events
    WHERE session_id = ?1
    ORDER BY seq_id ASC
";

/// Grabador de autoridad única del timeline append-only.
pub struct TimelineRepository {
    database_client: GatewayStoreClient,
}

impl TimelineRepository {
    pub fn new(client: GatewayStoreClient) -> Self {
        Self { database_client: client }
    }

    /**
     * Sella un evento al final del timeline de la sesión.
     *
     * # Errors:
     * - `StoreError::QueryError` si el motor rechaza el sellado.
     */
    #[instrument(skip(self, detail), fields(session_id = %session_id, event_type = %event_type))]
    pub async fn append(
        &self,
        session_id: &Uuid,
        event_type: &str,
        status: &str,
        detail: &str,
        actor: TimelineActor,
        sealed_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let database_connection = self.database_client.get_connection()?;

        database_connection
            .execute(
                APPEND_TIMELINE_EVENT,
                params![
                    session_id.to_string(),
                    event_type,
                    status,
                    detail,
                    actor.as_wire_label(),
                    sealed_at.to_rfc3339(),
                ],
            )
            .await?;

        debug!("🧾 [TIMELINE]: Event [{}] sealed for session {}.", event_type, session_id);
        Ok(())
    }

    /// Recupera el timeline completo de una sesión en orden de sellado.
    pub async fn list_for_session(
        &self,
        session_id: &Uuid,
    ) -> Result<Vec<TimelineEvent>, StoreError> {
        let database_connection = self.database_client.get_connection()?;
        let mut query_results = database_connection
            .query(LIST_TIMELINE_EVENTS, params![session_id.to_string()])
            .await?;

        let mut events_collection = Vec::new();
        while let Some(data_row) = query_results.next().await? {
            events_collection.push(map_row_to_timeline_event(data_row)?);
        }
        Ok(events_collection)
    }
}

fn map_row_to_timeline_event(data_row: Row) -> Result<TimelineEvent, StoreError> {
    let session_identifier_raw: String = data_row.get(0)?;
    let actor_raw: String = data_row.get(5)?;
    let created_at_raw: String = data_row.get(6)?;

    let actor = match actor_raw.as_str() {
        "user" => TimelineActor::User,
        "provisioner" => TimelineActor::Provisioner,
        "control_plane" => TimelineActor::ControlPlane,
        _ => TimelineActor::System,
    };

    Ok(TimelineEvent {
        session_id: Uuid::parse_str(&session_identifier_raw)
            .map_err(|parse_fault| StoreError::MappingError(parse_fault.to_string()))?,
        seq_id: data_row.get::<i64>(1)? as u64,
        event_type: data_row.get(2)?,
        status: data_row.get(3)?,
        detail: data_row.get(4)?,
        actor,
        created_at: DateTime::parse_from_rfc3339(&created_at_raw)
            .map(|parsed| parsed.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
    })
}
