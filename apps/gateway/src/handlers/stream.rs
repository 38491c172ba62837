// [apps/gateway/src/handlers/stream.rs]
/*!
 * =================================================================
 * APARATO: SSE RELAY HANDLER (V19.0 - PURE CONSUMER)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L4)
 * RESPONSABILIDAD: RETRANSMISIÓN SSE DE TRAMAS DEL BUS POR CANAL
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. PURE CONSUMER: El camino de stream jamás muta sesiones; publica
 *    el camino de escritura, retransmite este estrato.
 * 2. LAG TRANSPARENCY: El desborde de la cola acotada del suscriptor se
 *    materializa como evento sintético 'lagged' con el conteo exacto.
 * 3. RESOURCE RELEASE: La cola del suscriptor muere con la conexión;
 *    la desconexión del cliente libera el handle sin ceremonia.
 * =================================================================
 */

use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use chrono::Utc;
use enclagent_domain_models::events::{StreamChannel, StreamFrame};
use futures::stream::Stream;
use futures::StreamExt;
use serde::Deserialize;
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::api::{map_store_fault, parse_session_identifier, ApiFailure};
use crate::state::AppState;

/// Cadencia del latido de keep-alive (proxies capa 7).
const KEEPALIVE_INTERVAL_SECONDS: u64 = 15;

/// Parámetros de conexión de un túnel SSE.
#[derive(Debug, Deserialize)]
pub struct StreamQuery {
    /// Identificador de sesión; 'thread_id' se acepta como alias.
    pub session_id: Option<String>,
    pub thread_id: Option<String>,
}

impl StreamQuery {
    fn resolve_identifier(&self) -> Result<Uuid, ApiFailure> {
        let raw_identifier = self
            .session_id
            .as_deref()
            .or(self.thread_id.as_deref())
            .unwrap_or_default();
        parse_session_identifier(raw_identifier)
    }
}

/// Endpoint: GET /chat/events?session_id=…
#[instrument(skip(application_state, stream_query))]
pub async fn establish_chat_event_stream(
    State(application_state): State<AppState>,
    Query(stream_query): Query<StreamQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiFailure> {
    forge_channel_stream(application_state, stream_query, StreamChannel::Chat).await
}

/// Endpoint: GET /logs/events?session_id=…
#[instrument(skip(application_state, stream_query))]
pub async fn establish_log_event_stream(
    State(application_state): State<AppState>,
    Query(stream_query): Query<StreamQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiFailure> {
    forge_channel_stream(application_state, stream_query, StreamChannel::Log).await
}

/// Endpoint: GET /jobs/events?session_id=…
#[instrument(skip(application_state, stream_query))]
pub async fn establish_job_event_stream(
    State(application_state): State<AppState>,
    Query(stream_query): Query<StreamQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiFailure> {
    forge_channel_stream(application_state, stream_query, StreamChannel::Job).await
}

/// Forja el túnel SSE de un canal para una sesión existente.
async fn forge_channel_stream(
    application_state: AppState,
    stream_query: StreamQuery,
    channel: StreamChannel,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiFailure> {
    let session_id = stream_query.resolve_identifier()?;

    // La sesión debe existir antes de abrir el túnel.
    application_state
        .session_repository
        .fetch_snapshot(&session_id)
        .await
        .map_err(|store_fault| map_store_fault(store_fault, &session_id))?;

    let bus_subscriber = application_state.event_bus.subscribe(channel, &session_id);
    debug!("🔌 [SSE_OPEN]: Channel tunnel established for session {}.", session_id);

    let event_stream = BroadcastStream::new(bus_subscriber).map(move |frame_reception| {
        let sse_event = match frame_reception {
            Ok(stream_frame) => Event::default()
                .event(stream_frame.event_name.clone())
                .data(stream_frame.payload.to_string()),
            Err(BroadcastStreamRecvError::Lagged(dropped_frame_count)) => {
                // Cola acotada desbordada: reporte sintético de congestión.
                let lagged_frame = StreamFrame::lagged(session_id, dropped_frame_count, Utc::now());
                Event::default()
                    .event(lagged_frame.event_name.clone())
                    .data(lagged_frame.payload.to_string())
            }
        };
        Ok::<Event, Infallible>(sse_event)
    });

    Ok(Sse::new(event_stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(KEEPALIVE_INTERVAL_SECONDS))
            .text("keepalive"),
    ))
}
