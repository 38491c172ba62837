// [libs/domain/models/src/events.rs]
/*!
 * =================================================================
 * APARATO: STREAM FRAME CONTRACT (V16.0 - RELAY VOCABULARY)
 * CLASIFICACIÓN: DOMAIN ENTITIES (ESTRATO L2)
 * RESPONSABILIDAD: TRAMAS DE EVENTO EN TIEMPO REAL Y CANALES DEL BUS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. CLOSED VOCABULARY: El catálogo de nombres de evento SSE es cerrado;
 *    el inlet de ingesta rechaza cualquier nombre fuera del catálogo.
 * 2. CHANNEL KEYING: Las claves de canal se derivan de forma determinista
 *    del par (familia, session_id), evitando colisiones entre sesiones.
 * =================================================================
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use typeshare::typeshare;
use uuid::Uuid;

/// Evento sintético inyectado cuando un suscriptor pierde tramas.
pub const SSE_EVENT_LAGGED: &str = "lagged";

/// Catálogo cerrado de nombres de evento del relay en tiempo real.
pub const SSE_EVENT_CATALOG: &[&str] = &[
    "response",
    "thinking",
    "tool_started",
    "tool_completed",
    "stream_chunk",
    "status",
    "job_started",
    "approval_needed",
    "auth_required",
    "auth_completed",
    "error",
    "job_message",
    "job_tool_use",
    "job_tool_result",
    "job_status",
    "job_result",
    "log",
];

/// Certifica que un nombre de evento pertenece al catálogo cerrado.
pub fn is_recognized_event_name(candidate_event_name: &str) -> bool {
    SSE_EVENT_CATALOG.contains(&candidate_event_name)
}

/// Familia de canal del bus de eventos.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StreamChannel {
    /// Turnos de conversación y actividad de herramientas.
    Chat,
    /// Líneas de log del runtime y del aprovisionador.
    Log,
    /// Progreso de jobs de larga duración.
    Job,
}

impl StreamChannel {
    /// Clave determinista del canal para una sesión concreta.
    pub fn channel_key(&self, session_id: &Uuid) -> String {
        match self {
            StreamChannel::Chat => format!("chat_events:{}", session_id),
            StreamChannel::Log => format!("log_events:{}", session_id),
            StreamChannel::Job => format!("job_events:{}", session_id),
        }
    }
}

/// Trama atómica publicada en el bus y retransmitida por SSE.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamFrame {
    /// Nombre de evento SSE (`event:`) del catálogo cerrado.
    pub event_name: String,
    pub session_id: Uuid,
    /// Secuencia monótona por sesión para detección de pérdidas.
    #[typeshare(serialized_as = "number")]
    pub sequence: u64,
    /// Carga JSON del evento (`data:`), siempre con session_id embebido.
    pub payload: serde_json::Value,
    pub emitted_at: DateTime<Utc>,
}

impl StreamFrame {
    /// Trama sintética de congestión: el suscriptor perdió `dropped_count`
    /// tramas por desborde de su cola acotada.
    pub fn lagged(session_id: Uuid, dropped_count: u64, emitted_at: DateTime<Utc>) -> Self {
        Self {
            event_name: SSE_EVENT_LAGGED.to_string(),
            session_id,
            sequence: 0,
            payload: serde_json::json!({
                "session_id": session_id,
                "dropped_count": dropped_count,
            }),
            emitted_at,
        }
    }
}
