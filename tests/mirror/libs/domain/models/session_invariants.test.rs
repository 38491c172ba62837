// [tests/mirror/libs/domain/models/session_invariants.test.rs]
/**
 * =================================================================
 * APARATO: SESSION INVARIANT CERTIFIER (V5.0 - DAG EVIDENCE)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L2-MODELS
 * RESPONSABILIDAD: AUDITORÍA DEL DAG DE ESTADO Y CAMPOS INMUTABLES
 * =================================================================
 */

#[cfg(test)]
mod tests {
    use enclagent_domain_models::session::{
        FundingPreflightStatus, InvariantViolation, ProvisioningSource, RuntimeState,
        SessionRecord, SessionStatus,
    };
    use chrono::Utc;
    use uuid::Uuid;

    fn forge_pending_record() -> SessionRecord {
        let genesis_instant = Utc::now();
        SessionRecord {
            session_id: Uuid::new_v4(),
            wallet_address: "0xabcdef0123456789abcdef0123456789abcdef01".into(),
            privy_user_id: None,
            chain_id: None,
            version: 1,
            status: SessionStatus::PendingSignature,
            runtime_state: RuntimeState::NotStarted,
            challenge_message: "Enclagent Gateway Authorization\nSession: lab".into(),
            challenge_created_at: genesis_instant,
            challenge_expires_at: genesis_instant + chrono::Duration::seconds(600),
            config: None,
            profile_name: None,
            profile_domain: None,
            provisioning_source: ProvisioningSource::Command,
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
            detail: "challenge issued".into(),
            created_at: genesis_instant,
            updated_at: genesis_instant,
            expires_at: genesis_instant + chrono::Duration::hours(24),
        }
    }

    /**
     * CERTIFICACIÓN: El DAG soberano admite exactamente sus aristas.
     */
    #[test]
    fn certify_status_dag_edges() {
        println!("\n🧭 [PROVING_GROUNDS]: Auditing the session status DAG...");

        // Aristas legales
        assert!(SessionStatus::PendingSignature.may_transition_to(SessionStatus::Provisioning));
        assert!(SessionStatus::PendingSignature.may_transition_to(SessionStatus::Failed));
        assert!(SessionStatus::PendingSignature.may_transition_to(SessionStatus::Expired));
        assert!(SessionStatus::Provisioning.may_transition_to(SessionStatus::Ready));
        assert!(SessionStatus::Provisioning.may_transition_to(SessionStatus::Failed));
        assert!(SessionStatus::Provisioning.may_transition_to(SessionStatus::Expired));

        // 'ready' jamás retrocede
        assert!(!SessionStatus::Ready.may_transition_to(SessionStatus::PendingSignature));
        assert!(!SessionStatus::Ready.may_transition_to(SessionStatus::Provisioning));
        assert!(!SessionStatus::Ready.may_transition_to(SessionStatus::Failed));

        // Terminales absolutos
        assert!(!SessionStatus::Failed.may_transition_to(SessionStatus::Ready));
        assert!(!SessionStatus::Expired.may_transition_to(SessionStatus::PendingSignature));

        println!("   ✅ DAG edge set certified.");
    }

    /**
     * CERTIFICACIÓN: Los campos de nacimiento son inmutables.
     */
    #[test]
    fn certify_immutable_birth_fields() {
        let previous_snapshot = forge_pending_record();

        let mut mutated_wallet = previous_snapshot.clone();
        mutated_wallet.wallet_address = "0x1111111111111111111111111111111111111111".into();
        assert_eq!(
            SessionRecord::audit_mutation(&previous_snapshot, &mutated_wallet).unwrap_err(),
            InvariantViolation::ImmutableFieldMutated("wallet_address")
        );

        let mut mutated_challenge = previous_snapshot.clone();
        mutated_challenge.challenge_message = "tampered".into();
        assert_eq!(
            SessionRecord::audit_mutation(&previous_snapshot, &mutated_challenge).unwrap_err(),
            InvariantViolation::ImmutableFieldMutated("challenge_message")
        );

        println!("   ✅ Birth-field immutability certified.");
    }

    /**
     * CERTIFICACIÓN: 'ready' exige endpoint vivo; 'terminated' absorbe.
     */
    #[test]
    fn certify_ready_endpoint_and_absorbing_terminate() {
        let mut provisioning_snapshot = forge_pending_record();
        provisioning_snapshot.status = SessionStatus::Provisioning;

        // Propuesta de 'ready' sin endpoint: rechazada.
        let mut hollow_ready = provisioning_snapshot.clone();
        hollow_ready.status = SessionStatus::Ready;
        hollow_ready.runtime_state = RuntimeState::Running;
        assert_eq!(
            SessionRecord::audit_mutation(&provisioning_snapshot, &hollow_ready).unwrap_err(),
            InvariantViolation::ReadyWithoutEndpoint
        );

        // Propuesta de 'ready' con endpoint: aceptada.
        let mut live_ready = hollow_ready.clone();
        live_ready.instance_url = Some("https://i.example".into());
        assert!(SessionRecord::audit_mutation(&provisioning_snapshot, &live_ready).is_ok());

        // 'terminated' es absorbente.
        let mut terminated_snapshot = live_ready.clone();
        terminated_snapshot.runtime_state = RuntimeState::Terminated;
        let mut resurrection_attempt = terminated_snapshot.clone();
        resurrection_attempt.runtime_state = RuntimeState::Running;
        assert_eq!(
            SessionRecord::audit_mutation(&terminated_snapshot, &resurrection_attempt).unwrap_err(),
            InvariantViolation::TerminatedIsAbsorbing
        );

        println!("   ✅ Ready-endpoint and absorbing-terminate certified.");
    }

    /**
     * CERTIFICACIÓN: El sub-estado de runtime exige la fase 'ready'.
     */
    #[test]
    fn certify_runtime_state_requires_ready_phase() {
        let pending_snapshot = forge_pending_record();
        let mut premature_runtime = pending_snapshot.clone();
        premature_runtime.runtime_state = RuntimeState::Running;

        assert_eq!(
            SessionRecord::audit_mutation(&pending_snapshot, &premature_runtime).unwrap_err(),
            InvariantViolation::RuntimeStateBeforeReady
        );
        println!("   ✅ Runtime-state phase discipline certified.");
    }
}
