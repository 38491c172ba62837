// [libs/infra/store/src/repositories/onboarding.rs]
/*!
 * =================================================================
 * APARATO: ONBOARDING STATE REPOSITORY (V9.0 - DOCUMENT STORE)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: PERSISTENCIA DEL DOCUMENTO CONVERSACIONAL POR SESIÓN
 * =================================================================
 */

use crate::client::GatewayStoreClient;
use crate::errors::StoreError;
use chrono::{DateTime, Utc};
use enclagent_domain_models::onboarding::OnboardingState;
use libsql::params;
use tracing::{debug, instrument};
use uuid::Uuid;

const UPSERT_ONBOARDING_STATE: &str = "
    INSERT INTO onboarding_states (session_id, state_json, updated_at)
    VALUES (?1, ?2, ?3)
    ON CONFLICT(session_id) DO UPDATE SET
        state_json = excluded.state_json,
        updated_at = excluded.updated_at
";

const FETCH_ONBOARDING_STATE: &str = "
    SELECT state_json FROM onboarding_states WHERE session_id = ?1
";

/// Repositorio del documento de onboarding (uno por sesión).
pub struct OnboardingRepository {
    database_client: GatewayStoreClient,
}

impl OnboardingRepository {
    pub fn new(client: GatewayStoreClient) -> Self {
        Self { database_client: client }
    }

    /// Recupera el documento, o None si la conversación no ha comenzado.
    pub async fn load(&self, session_id: &Uuid) -> Result<Option<OnboardingState>, StoreError> {
        let database_connection = self.database_client.get_connection()?;
        let mut query_results = database_connection
            .query(FETCH_ONBOARDING_STATE, params![session_id.to_string()])
            .await?;

        match query_results.next().await? {
            Some(data_row) => {
                let state_json: String = data_row.get(0)?;
                let state = serde_json::from_str(&state_json).map_err(|mapping_fault| {
                    StoreError::MappingError(mapping_fault.to_string())
                })?;
                Ok(Some(state))
            }
            None => Ok(None),
        }
    }

    /// Recupera el documento o lo forja en su estado génesis.
    pub async fn load_or_genesis(
        &self,
        session_id: &Uuid,
        genesis_instant: DateTime<Utc>,
    ) -> Result<OnboardingState, StoreError> {
        if let Some(existing_state) = self.load(session_id).await? {
            return Ok(existing_state);
        }
        let genesis_state = OnboardingState::genesis(*session_id, genesis_instant);
        self.save(&genesis_state).await?;
        Ok(genesis_state)
    }

    /**
     * Cristaliza el documento completo (Protocolo Upsert).
     */
    #[instrument(skip(self, state), fields(session_id = %state.session_id))]
    pub async fn save(&self, state: &OnboardingState) -> Result<(), StoreError> {
        let state_json = serde_json::to_string(state)
            .map_err(|mapping_fault| StoreError::MappingError(mapping_fault.to_string()))?;

        let database_connection = self.database_client.get_connection()?;
        database_connection
            .execute(
                UPSERT_ONBOARDING_STATE,
                params![
                    state.session_id.to_string(),
                    state_json,
                    state.updated_at.to_rfc3339(),
                ],
            )
            .await?;

        debug!(
            "💬 [ONBOARDING_SYNC]: Document crystallized at step [{}].",
            state.current_step.as_wire_label()
        );
        Ok(())
    }
}
