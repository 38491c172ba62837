// [apps/gateway/src/services/event_bus.rs]
/*!
 * =================================================================
 * APARATO: SESSION EVENT BUS (V24.0 - CHANNELED BROADCASTER)
 * CLASIFICACIÓN: APPLICATION SERVICES (ESTRATO L4)
 * RESPONSABILIDAD: FAN-OUT POR CANAL CON COLAS ACOTADAS POR SUSCRIPTOR
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. CHANNEL REGISTRY: Un emisor broadcast por clave de canal
 *    (familia:sesión), creado perezosamente en el primer uso.
 * 2. BOUNDED SUBSCRIBERS: Cada suscriptor posee su propia cola acotada;
 *    el desborde descarta lo más antiguo de ESA cola y se reporta como
 *    evento sintético 'lagged' con el conteo exacto de pérdidas.
 * 3. SEQUENCE STAMPING: Toda trama publicada recibe una secuencia
 *    monótona por sesión para detección de huecos en el cliente.
 *
 * # Mathematical Proof (Signal Propagation):
 * El despacho es O(1) respecto al número de receptores y jamás bloquea
 * al publicador. La pérdida de un suscriptor lento no afecta ni al
 * publicador ni a los demás receptores (colas independientes).
 * =================================================================
 */

use chrono::Utc;
use enclagent_domain_models::events::{StreamChannel, StreamFrame};
use std::collections::HashMap;
use std::sync::{Mutex, RwLock};
use tokio::sync::broadcast;
use tracing::{debug, trace};
use uuid::Uuid;

/**
 * Orquestador central de señales en tiempo real del gateway.
 */
pub struct EventBus {
    /// Capacidad de la cola acotada de cada suscriptor.
    subscriber_queue_capacity: usize,
    /// Registro perezoso de emisores por clave de canal.
    channel_registry: RwLock<HashMap<String, broadcast::Sender<StreamFrame>>>,
    /// Contadores de secuencia monótona por sesión.
    sequence_counters: Mutex<HashMap<Uuid, u64>>,
}

impl EventBus {
    pub fn new(subscriber_queue_capacity: usize) -> Self {
        Self {
            subscriber_queue_capacity: subscriber_queue_capacity.max(1),
            channel_registry: RwLock::new(HashMap::new()),
            sequence_counters: Mutex::new(HashMap::new()),
        }
    }

    /// Emisor del canal, creado en el primer acceso.
    fn sender_for(&self, channel_key: &str) -> broadcast::Sender<StreamFrame> {
        if let Some(existing_sender) = self
            .channel_registry
            .read()
            .expect("FATAL: channel registry lock poisoned")
            .get(channel_key)
        {
            return existing_sender.clone();
        }

        let mut registry_guard = self
            .channel_registry
            .write()
            .expect("FATAL: channel registry lock poisoned");
        registry_guard
            .entry(channel_key.to_string())
            .or_insert_with(|| {
                debug!("📡 [EVENT_BUS]: Forging channel [{}].", channel_key);
                broadcast::channel(self.subscriber_queue_capacity).0
            })
            .clone()
    }

    /**
     * Genera un receptor acotado para el túnel SSE de un canal.
     *
     * # Performance:
     * El coste de suscripción es despreciable; la cola pertenece en
     * exclusiva al receptor y muere con él al desconectar.
     */
    pub fn subscribe(
        &self,
        channel: StreamChannel,
        session_id: &Uuid,
    ) -> broadcast::Receiver<StreamFrame> {
        self.sender_for(&channel.channel_key(session_id)).subscribe()
    }

    /**
     * Publica una trama en el canal de una sesión (no bloqueante).
     *
     * La carga recibe 'session_id' y 'sequence' embebidos antes del
     * fan-out; devuelve la secuencia estampada.
     */
    pub fn publish(
        &self,
        channel: StreamChannel,
        session_id: &Uuid,
        event_name: &str,
        payload: serde_json::Value,
    ) -> u64 {
        let stamped_sequence = {
            let mut counters_guard = self
                .sequence_counters
                .lock()
                .expect("FATAL: sequence counter lock poisoned");
            let counter = counters_guard.entry(*session_id).or_insert(0);
            *counter += 1;
            *counter
        };

        let mut enriched_payload = match payload {
            serde_json::Value::Object(object_body) => serde_json::Value::Object(object_body),
            other_shape => serde_json::json!({ "data": other_shape }),
        };
        if let Some(payload_map) = enriched_payload.as_object_mut() {
            payload_map.insert("session_id".into(), serde_json::json!(session_id));
            payload_map.insert("sequence".into(), serde_json::json!(stamped_sequence));
        }

        let frame = StreamFrame {
            event_name: event_name.to_string(),
            session_id: *session_id,
            sequence: stamped_sequence,
            payload: enriched_payload,
            emitted_at: Utc::now(),
        };

        match self.sender_for(&channel.channel_key(session_id)).send(frame) {
            Ok(subscriber_count) => {
                trace!("📡 [EVENT_BUS]: Frame broadcasted to {} active links.", subscriber_count);
            }
            Err(_) => {
                // Silencio nominal: sin operadores conectados a este canal.
                trace!("💤 [EVENT_BUS]: Frame discarded. No active links.");
            }
        }

        stamped_sequence
    }
}
