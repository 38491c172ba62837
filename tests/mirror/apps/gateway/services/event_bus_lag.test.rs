// [tests/mirror/apps/gateway/services/event_bus_lag.test.rs]
/**
 * =================================================================
 * APARATO: EVENT BUS LAG CERTIFIER (V5.0 - CONGESTION EVIDENCE)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L4-SERVICES
 * RESPONSABILIDAD: COLAS ACOTADAS, ORDEN POR CANAL Y EVENTO 'LAGGED'
 *
 * # Mathematical Proof (Bounded Queue Semantics):
 * Con capacidad C y C+K publicaciones sin consumo, el suscriptor debe
 * observar exactamente un reporte de congestión con dropped_count=K
 * seguido de las últimas C tramas en orden de publicación.
 * =================================================================
 */

#[cfg(test)]
mod tests {
    use enclagent_gateway::services::event_bus::EventBus;
    use enclagent_domain_models::events::StreamChannel;
    use tokio::sync::broadcast::error::RecvError;
    use uuid::Uuid;

    const LAB_QUEUE_CAPACITY: usize = 64;
    const OVERFLOW_SURPLUS: usize = 10;

    /**
     * CERTIFICACIÓN: Desborde de cola acotada -> 'lagged' con conteo exacto.
     */
    #[tokio::test]
    async fn certify_bounded_queue_lag_semantics() {
        println!("\n📡 [PROVING_GROUNDS]: Auditing bounded-queue congestion...");

        let event_bus = EventBus::new(LAB_QUEUE_CAPACITY);
        let session_id = Uuid::new_v4();
        let mut congested_subscriber = event_bus.subscribe(StreamChannel::Job, &session_id);

        // Ráfaga sin consumo: capacidad + excedente.
        for burst_index in 0..(LAB_QUEUE_CAPACITY + OVERFLOW_SURPLUS) {
            event_bus.publish(
                StreamChannel::Job,
                &session_id,
                "job_message",
                serde_json::json!({ "burst_index": burst_index }),
            );
        }

        // Primera lectura: reporte de congestión con el conteo exacto.
        match congested_subscriber.recv().await {
            Err(RecvError::Lagged(dropped_frame_count)) => {
                assert_eq!(
                    dropped_frame_count as usize, OVERFLOW_SURPLUS,
                    "L4_LAG_DRIFT: wrong dropped count."
                );
                println!("   ✅ Lag report: {} frames dropped.", dropped_frame_count);
            }
            other_reception => panic!("INTEGRITY_COLLAPSE: expected lag, got {:?}", other_reception),
        }

        // Después: exactamente las últimas C tramas, en orden de publicación.
        let mut observed_frames = Vec::new();
        while let Ok(stream_frame) = congested_subscriber.try_recv() {
            observed_frames.push(stream_frame);
        }
        assert_eq!(observed_frames.len(), LAB_QUEUE_CAPACITY);

        let first_surviving_index = observed_frames[0].payload["burst_index"].as_u64().unwrap();
        assert_eq!(first_surviving_index as usize, OVERFLOW_SURPLUS);
        for (offset, stream_frame) in observed_frames.iter().enumerate() {
            let burst_index = stream_frame.payload["burst_index"].as_u64().unwrap() as usize;
            assert_eq!(burst_index, OVERFLOW_SURPLUS + offset, "L4_ORDER_DRIFT detected.");
        }

        println!("   ✅ Bounded-queue semantics certified (last {} frames).", LAB_QUEUE_CAPACITY);
    }

    /**
     * CERTIFICACIÓN: Aislamiento entre canales y secuencia por sesión.
     */
    #[tokio::test]
    async fn certify_channel_isolation_and_sequencing() {
        let event_bus = EventBus::new(LAB_QUEUE_CAPACITY);
        let session_id = Uuid::new_v4();
        let foreign_session_id = Uuid::new_v4();

        let mut chat_subscriber = event_bus.subscribe(StreamChannel::Chat, &session_id);
        let mut log_subscriber = event_bus.subscribe(StreamChannel::Log, &session_id);

        let first_sequence = event_bus.publish(
            StreamChannel::Chat,
            &session_id,
            "response",
            serde_json::json!({ "message": "hello" }),
        );
        let second_sequence = event_bus.publish(
            StreamChannel::Log,
            &session_id,
            "log",
            serde_json::json!({ "message": "line" }),
        );
        event_bus.publish(
            StreamChannel::Chat,
            &foreign_session_id,
            "response",
            serde_json::json!({ "message": "other session" }),
        );

        // La secuencia es monótona por sesión, compartida entre canales.
        assert_eq!(first_sequence, 1);
        assert_eq!(second_sequence, 2);

        // Cada suscriptor observa únicamente su canal y su sesión.
        let chat_frame = chat_subscriber.recv().await.expect("chat frame");
        assert_eq!(chat_frame.event_name, "response");
        assert_eq!(chat_frame.session_id, session_id);
        assert_eq!(chat_frame.payload["sequence"].as_u64(), Some(1));

        let log_frame = log_subscriber.recv().await.expect("log frame");
        assert_eq!(log_frame.event_name, "log");

        assert!(chat_subscriber.try_recv().is_err(), "foreign frame leaked across channels");

        println!("   ✅ Channel isolation and sequencing certified.");
    }
}
