// [tests/mirror/apps/gateway/handlers/runtime_control_api.test.rs]
/**
 * =================================================================
 * APARATO: RUNTIME CONTROL API CERTIFIER (V6.0 - DAG OVER THE WIRE)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L4-HANDLERS
 * RESPONSABILIDAD: MATRIZ DE MANDOS A TRAVÉS DEL ROUTER REAL
 * =================================================================
 */

#[cfg(test)]
mod tests {
    use enclagent_gateway::config::GatewayEnvironment;
    use enclagent_gateway::routes::create_gateway_router;
    use enclagent_gateway::state::AppState;
    use enclagent_infra_store::{GatewayStoreClient, MutationProposal, SessionRepository, TimelineSeed};
    use enclagent_domain_models::session::{ProvisioningSource, RuntimeState, SessionStatus};
    use enclagent_domain_models::timeline::{event_types, TimelineActor};
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;
    use uuid::Uuid;

    const LAB_WALLET: &str = "0xabcdef0123456789abcdef0123456789abcdef01";

    async fn dispatch_control(
        router: &axum::Router,
        session_id: &Uuid,
        action: &str,
    ) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method("POST")
            .uri(format!("/session/{}/runtime-control", session_id))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                serde_json::json!({ "action": action, "actor": "ops_console" }).to_string(),
            ))
            .expect("request");

        let response = router.clone().oneshot(request).await.expect("dispatch");
        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        (status, serde_json::from_slice(&body_bytes).unwrap_or(serde_json::Value::Null))
    }

    /// Conduce una sesión de laboratorio hasta 'ready' con runtime activo.
    async fn forge_ready_session(session_repository: &SessionRepository) -> Uuid {
        let genesis_record = session_repository
            .create_pending(LAB_WALLET, None, None, ProvisioningSource::Command, 600, 86_400)
            .await
            .expect("genesis");
        let session_id = genesis_record.session_id;

        session_repository
            .apply(&session_id, |snapshot| {
                let mut proposed_record = snapshot.clone();
                proposed_record.status = SessionStatus::Provisioning;
                proposed_record.detail = "lab provisioning".into();
                Ok(MutationProposal {
                    record: proposed_record,
                    timeline: vec![TimelineSeed::ok(
                        event_types::PROVISIONING_STARTED,
                        "lab",
                        TimelineActor::System,
                    )],
                })
            })
            .await
            .expect("to provisioning");

        session_repository
            .apply(&session_id, |snapshot| {
                let mut proposed_record = snapshot.clone();
                proposed_record.status = SessionStatus::Ready;
                proposed_record.runtime_state = RuntimeState::Running;
                proposed_record.instance_url = Some("https://i.example".into());
                proposed_record.dedicated_instance = true;
                proposed_record.auth_key_fingerprint = Some("ab".repeat(32));
                Ok(MutationProposal {
                    record: proposed_record,
                    timeline: vec![TimelineSeed::ok(
                        event_types::PROVISIONING_SUCCEEDED,
                        "lab",
                        TimelineActor::Provisioner,
                    )],
                })
            })
            .await
            .expect("to ready");

        session_id
    }

    /**
     * CERTIFICACIÓN: Recorrido completo de la matriz sobre el cable.
     * pause -> ok; pause -> 409; resume -> ok; terminate -> ok;
     * rotate -> 409; terminate -> ok (no-op).
     */
    #[tokio::test]
    async fn certify_control_matrix_over_the_wire() {
        println!("\n🎛️ [PROVING_GROUNDS]: Auditing runtime control over HTTP...");

        let environment = GatewayEnvironment::capture();
        let store_client =
            GatewayStoreClient::connect("file:mem_control_api?mode=memory&cache=shared", None)
                .await
                .expect("memory anchor");
        let session_repository = SessionRepository::new(store_client.clone());
        let router = create_gateway_router(AppState::new(store_client, environment));

        let session_id = forge_ready_session(&session_repository).await;

        // pause: running -> paused
        let (pause_status, pause_body) = dispatch_control(&router, &session_id, "pause").await;
        assert_eq!(pause_status, StatusCode::OK);
        assert_eq!(pause_body["status"].as_str(), Some("ok"));
        assert_eq!(pause_body["runtime_state"].as_str(), Some("paused"));

        // pause repetido: bloqueado con el par ofensor.
        let (blocked_status, blocked_body) = dispatch_control(&router, &session_id, "pause").await;
        assert_eq!(blocked_status, StatusCode::CONFLICT);
        assert_eq!(blocked_body["error_code"].as_str(), Some("runtime_control_blocked"));
        assert_eq!(blocked_body["from_state"].as_str(), Some("paused"));
        assert_eq!(blocked_body["action"].as_str(), Some("pause"));

        // resume: paused -> running
        let (resume_status, resume_body) = dispatch_control(&router, &session_id, "resume").await;
        assert_eq!(resume_status, StatusCode::OK);
        assert_eq!(resume_body["runtime_state"].as_str(), Some("running"));

        // rotate: running preservado, huella fresca sellada.
        let (rotate_status, rotate_body) =
            dispatch_control(&router, &session_id, "rotate_auth_key").await;
        assert_eq!(rotate_status, StatusCode::OK);
        assert_eq!(rotate_body["runtime_state"].as_str(), Some("running"));
        let rotated_snapshot = session_repository
            .fetch_snapshot(&session_id)
            .await
            .expect("snapshot");
        let seeded_fingerprint = "ab".repeat(32);
        assert_ne!(
            rotated_snapshot.auth_key_fingerprint.as_deref(),
            Some(seeded_fingerprint.as_str()),
            "rotation must replace the sealed fingerprint"
        );
        assert_eq!(rotated_snapshot.auth_key_fingerprint.map(|f| f.len()), Some(64));

        // terminate: running -> terminated
        let (terminate_status, terminate_body) =
            dispatch_control(&router, &session_id, "terminate").await;
        assert_eq!(terminate_status, StatusCode::OK);
        assert_eq!(terminate_body["runtime_state"].as_str(), Some("terminated"));

        // rotate sobre terminated: bloqueado.
        let (dead_rotate_status, dead_rotate_body) =
            dispatch_control(&router, &session_id, "rotate_auth_key").await;
        assert_eq!(dead_rotate_status, StatusCode::CONFLICT);
        assert_eq!(dead_rotate_body["from_state"].as_str(), Some("terminated"));

        // terminate repetido: no-op exitoso y absorbente.
        let (noop_status, noop_body) = dispatch_control(&router, &session_id, "terminate").await;
        assert_eq!(noop_status, StatusCode::OK);
        assert_eq!(noop_body["status"].as_str(), Some("ok"));
        assert_eq!(noop_body["runtime_state"].as_str(), Some("terminated"));

        println!("   ✅ Control matrix over the wire certified.");
    }

    /**
     * CERTIFICACIÓN: Los mandos sobre una sesión pendiente se bloquean.
     */
    #[tokio::test]
    async fn certify_pending_session_guard() {
        let environment = GatewayEnvironment::capture();
        let store_client =
            GatewayStoreClient::connect("file:mem_control_guard?mode=memory&cache=shared", None)
                .await
                .expect("memory anchor");
        let session_repository = SessionRepository::new(store_client.clone());
        let router = create_gateway_router(AppState::new(store_client, environment));

        let pending_record = session_repository
            .create_pending(LAB_WALLET, None, None, ProvisioningSource::Command, 600, 86_400)
            .await
            .expect("genesis");

        let (status, body) = dispatch_control(&router, &pending_record.session_id, "pause").await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error_code"].as_str(), Some("runtime_control_blocked"));
        assert_eq!(body["from_state"].as_str(), Some("not_started"));
    }
}
