// [tests/mirror/apps/gateway/handlers/launch_fallback_e2e.test.rs]
/**
 * =================================================================
 * APARATO: FALLBACK LAUNCH E2E CERTIFIER (V7.0 - FULL PIPELINE)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L4-HANDLERS
 * RESPONSABILIDAD: LAUNCH COMPLETO EN MODO URL FIJA SOBRE EL ROUTER REAL
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. REAL TOPOLOGY: Todas las ráfagas atraviesan el router soberano
 *    (tower oneshot), no los handlers sueltos.
 * 2. FALLBACK SEMANTICS: En modo 'default_instance_url' la sesión
 *    transiciona directa a 'ready' con instancia compartida.
 * 3. IDEMPOTENT VERIFY: El reenvío de /verify no re-lanza nada.
 * =================================================================
 */

#[cfg(test)]
mod tests {
    use enclagent_gateway::config::GatewayEnvironment;
    use enclagent_gateway::routes::create_gateway_router;
    use enclagent_gateway::state::AppState;
    use enclagent_infra_store::GatewayStoreClient;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use secp256k1::{Message, PublicKey, SecretKey, SECP256K1};
    use sha3::{Digest, Keccak256};
    use tower::ServiceExt;

    const PERSONAL_SIGN_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n";

    /// Forja la firma personal_sign y la wallet de un escalar de laboratorio.
    fn forge_lab_signature(message_bytes: &[u8], secret_scalar: &[u8; 32]) -> (String, String) {
        let secret_key = SecretKey::from_slice(secret_scalar).expect("lab scalar");
        let public_point = PublicKey::from_secret_key(SECP256K1, &secret_key);

        let mut digest_engine = Keccak256::new();
        digest_engine.update(PERSONAL_SIGN_PREFIX);
        digest_engine.update(message_bytes.len().to_string().as_bytes());
        digest_engine.update(message_bytes);
        let digest: [u8; 32] = digest_engine.finalize().into();

        let signed_digest = Message::from_digest_slice(&digest).expect("digest width");
        let recoverable = SECP256K1.sign_ecdsa_recoverable(&signed_digest, &secret_key);
        let (recovery_id, compact_body) = recoverable.serialize_compact();

        let mut wire_signature = [0u8; 65];
        wire_signature[..64].copy_from_slice(&compact_body);
        wire_signature[64] = 27 + recovery_id.to_i32() as u8;

        let uncompressed = public_point.serialize_uncompressed();
        let point_digest = Keccak256::digest(&uncompressed[1..]);
        let wallet_address = format!("0x{}", hex::encode(&point_digest[12..]));

        (format!("0x{}", hex::encode(wire_signature)), wallet_address)
    }

    /// Entorno de laboratorio construido sin tocar el entorno del proceso,
    /// para que las suites concurrentes no compartan estado ambiental.
    fn arm_fallback_environment() -> GatewayEnvironment {
        GatewayEnvironment {
            frontdoor_enabled: true,
            require_privy: false,
            privy_app_id: None,
            privy_client_id: None,
            provisioning_backend: enclagent_domain_models::session::ProvisioningSource::DefaultInstanceUrl,
            provisioning_command: None,
            provisioning_timeout_ms: 10_000,
            default_instance_url: Some("https://fixed.example".into()),
            session_ttl_seconds: 86_400,
            challenge_ttl_seconds: 600,
            expiry_sweep_interval_ms: 5_000,
            sse_queue_capacity: 512,
            poll_interval_ms: 3_000,
            verification_default_backend:
                enclagent_domain_models::config::VerificationBackend::EigencloudPrimary,
            verification_default_fallback_enabled: true,
        }
    }

    async fn dispatch_json(
        router: &axum::Router,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let request_builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");

        let request = match body {
            Some(json_body) => request_builder
                .body(Body::from(json_body.to_string()))
                .expect("request body"),
            None => request_builder.body(Body::empty()).expect("empty body"),
        };

        let response = router.clone().oneshot(request).await.expect("router dispatch");
        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let parsed_body = if body_bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(serde_json::Value::Null)
        };
        (status, parsed_body)
    }

    /**
     * CERTIFICACIÓN: Launch completo (challenge -> chat -> sign -> ready).
     */
    #[tokio::test]
    async fn certify_fallback_launch_pipeline() {
        println!("\n🚀 [PROVING_GROUNDS]: Auditing the full fallback launch...");

        let environment = arm_fallback_environment();
        let store_client =
            GatewayStoreClient::connect("file:mem_e2e_fallback?mode=memory&cache=shared", None)
                .await
                .expect("CRITICAL_FAULT: memory anchor failed.");
        let router = create_gateway_router(AppState::new(store_client, environment));

        let (_, wallet_address) = forge_lab_signature(b"probe", &[21u8; 32]);

        // 1. FASE DE CHALLENGE
        let (challenge_status, challenge_body) = dispatch_json(
            &router,
            "POST",
            "/challenge",
            Some(serde_json::json!({ "wallet_address": wallet_address })),
        )
        .await;
        assert_eq!(challenge_status, StatusCode::OK);
        let session_id = challenge_body["session_id"].as_str().expect("session id").to_string();
        let challenge_message = challenge_body["message"].as_str().expect("message").to_string();
        assert!(challenge_message.starts_with("Enclagent Gateway Authorization\n"));
        assert_eq!(challenge_body["version"].as_u64(), Some(1));

        // 2. FASE DE ONBOARDING (cuatro peldaños interactivos)
        for chat_turn in [
            "launch momentum strategy",
            "profile_name=alpha_v1, gateway_auth_key=k0123456789abcdef, accept_terms=true",
            "confirm plan",
            "confirm sign",
        ] {
            let (chat_status, chat_body) = dispatch_json(
                &router,
                "POST",
                "/onboarding/chat",
                Some(serde_json::json!({ "session_id": session_id, "message": chat_turn })),
            )
            .await;
            assert_eq!(chat_status, StatusCode::OK, "chat turn rejected: {}", chat_turn);
            assert!(chat_body["assistant_message"].as_str().is_some());
        }

        let (_, onboarding_state) = dispatch_json(
            &router,
            "GET",
            &format!("/onboarding/state?session_id={}", session_id),
            None,
        )
        .await;
        assert_eq!(onboarding_state["current_step"].as_str(), Some("ready_to_sign"));
        assert_eq!(onboarding_state["completed"].as_bool(), Some(true));

        // 3. FASE DE FIRMA Y VERIFICACIÓN
        let (signature_hex, _) = forge_lab_signature(challenge_message.as_bytes(), &[21u8; 32]);
        let verify_payload = serde_json::json!({
            "session_id": session_id,
            "signature": signature_hex,
            "message": challenge_message,
            "wallet_address": wallet_address,
            "config": {
                "profile_name": "alpha_v1",
                "objective": "launch momentum strategy",
                "user_wallet_address": wallet_address,
                "custody_mode": "user_wallet",
                "symbol_allowlist": ["BTC", "ETH"],
                "gateway_auth_key": "k0123456789abcdef",
                "accept_terms": true
            }
        });

        let (verify_status, verify_body) =
            dispatch_json(&router, "POST", "/verify", Some(verify_payload.clone())).await;
        assert_eq!(verify_status, StatusCode::OK);
        assert_eq!(verify_body["status"].as_str(), Some("ready"), "fallback must reach ready");

        // 4. FASE DE EVIDENCIA
        let (_, session_snapshot) =
            dispatch_json(&router, "GET", &format!("/session/{}", session_id), None).await;
        assert_eq!(session_snapshot["status"].as_str(), Some("ready"));
        assert_eq!(session_snapshot["instance_url"].as_str(), Some("https://fixed.example"));
        assert_eq!(session_snapshot["dedicated_instance"].as_bool(), Some(false));
        assert_eq!(session_snapshot["launched_on_eigencloud"].as_bool(), Some(false));
        assert_eq!(session_snapshot["runtime_state"].as_str(), Some("running"));
        assert_eq!(session_snapshot["funding_preflight_status"].as_str(), Some("passed"));

        let (_, timeline_body) = dispatch_json(
            &router,
            "GET",
            &format!("/session/{}/timeline", session_id),
            None,
        )
        .await;
        let sealed_events = timeline_body["events"].as_array().expect("events");
        let sealed_types: Vec<&str> = sealed_events
            .iter()
            .filter_map(|event| event["event_type"].as_str())
            .collect();
        for mandatory_event in [
            "challenge_issued",
            "signature_verified",
            "preflight_passed",
            "provisioning_started",
            "provisioning_succeeded",
        ] {
            assert!(
                sealed_types.contains(&mandatory_event),
                "timeline lacks {}",
                mandatory_event
            );
        }
        for (position, sealed_event) in sealed_events.iter().enumerate() {
            assert_eq!(sealed_event["seq_id"].as_u64(), Some((position + 1) as u64));
        }

        // 5. FASE DE IDEMPOTENCIA: reenvío de /verify sin segundo launch.
        let (resubmit_status, resubmit_body) =
            dispatch_json(&router, "POST", "/verify", Some(verify_payload)).await;
        assert_eq!(resubmit_status, StatusCode::OK);
        assert_eq!(resubmit_body["status"].as_str(), Some("ready"));

        println!("   ✅ Fallback launch pipeline certified.");
    }

    /**
     * CERTIFICACIÓN: La wallet equivocada firma -> mismatch sin transición.
     */
    #[tokio::test]
    async fn certify_wrong_wallet_signature_rejection() {
        let environment = arm_fallback_environment();
        let store_client =
            GatewayStoreClient::connect("file:mem_e2e_mismatch?mode=memory&cache=shared", None)
                .await
                .expect("CRITICAL_FAULT: memory anchor failed.");
        let router = create_gateway_router(AppState::new(store_client, environment));

        let (_, wallet_alpha) = forge_lab_signature(b"probe", &[31u8; 32]);

        let (_, challenge_body) = dispatch_json(
            &router,
            "POST",
            "/challenge",
            Some(serde_json::json!({ "wallet_address": wallet_alpha })),
        )
        .await;
        let session_id = challenge_body["session_id"].as_str().expect("session id").to_string();
        let challenge_message = challenge_body["message"].as_str().expect("message").to_string();

        // La llave de BETA firma el challenge de ALPHA.
        let (foreign_signature, _) = forge_lab_signature(challenge_message.as_bytes(), &[32u8; 32]);

        let (verify_status, verify_body) = dispatch_json(
            &router,
            "POST",
            "/verify",
            Some(serde_json::json!({
                "session_id": session_id,
                "signature": foreign_signature,
                "config": {
                    "profile_name": "alpha_v1",
                    "objective": "launch momentum strategy",
                    "user_wallet_address": wallet_alpha,
                    "symbol_allowlist": ["BTC"],
                    "gateway_auth_key": "k0123456789abcdef",
                    "accept_terms": true
                }
            })),
        )
        .await;

        assert_eq!(verify_status, StatusCode::BAD_REQUEST);
        assert_eq!(verify_body["error_code"].as_str(), Some("signature_wallet_mismatch"));
        assert!(verify_body["operator_hint"].as_str().is_some());

        // La sesión permanece pendiente para el reintento legítimo.
        let (_, session_snapshot) =
            dispatch_json(&router, "GET", &format!("/session/{}", session_id), None).await;
        assert_eq!(session_snapshot["status"].as_str(), Some("pending_signature"));

        println!("   ✅ Wrong-wallet rejection certified.");
    }
}
