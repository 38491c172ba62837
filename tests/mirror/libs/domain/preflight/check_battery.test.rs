// [tests/mirror/libs/domain/preflight/check_battery.test.rs]
/**
 * =================================================================
 * APARATO: PREFLIGHT BATTERY CERTIFIER (V5.0 - GAUNTLET EVIDENCE)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L2-PREFLIGHT
 * RESPONSABILIDAD: AUDITORÍA DEL ORDEN CANÓNICO Y EL AGREGADO
 * =================================================================
 */

#[cfg(test)]
mod tests {
    use enclagent_domain_models::config::{
        CustodyMode, InformationSharingScope, PaperLivePolicy, PolicyConfig, VerificationBackend,
        VerificationLevel,
    };
    use enclagent_domain_models::session::{
        FundingPreflightStatus, PreflightCheckStatus, ProvisioningSource, RuntimeState,
        SessionRecord, SessionStatus,
    };
    use enclagent_domain_preflight::{run_preflight_battery, CANONICAL_CHECK_ORDER};
    use chrono::Utc;
    use uuid::Uuid;

    const LAB_WALLET: &str = "0xabcdef0123456789abcdef0123456789abcdef01";

    fn forge_session() -> SessionRecord {
        let genesis_instant = Utc::now();
        SessionRecord {
            session_id: Uuid::new_v4(),
            wallet_address: LAB_WALLET.into(),
            privy_user_id: Some("privy:lab".into()),
            chain_id: None,
            version: 1,
            status: SessionStatus::PendingSignature,
            runtime_state: RuntimeState::NotStarted,
            challenge_message: "lab".into(),
            challenge_created_at: genesis_instant,
            challenge_expires_at: genesis_instant,
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
            detail: String::new(),
            created_at: genesis_instant,
            updated_at: genesis_instant,
            expires_at: genesis_instant,
        }
    }

    fn forge_policy() -> PolicyConfig {
        PolicyConfig {
            profile_name: "alpha_v1".into(),
            profile_domain: "perps_trading".into(),
            objective: "launch momentum strategy".into(),
            user_wallet_address: Some(LAB_WALLET.into()),
            operator_wallet_address: None,
            custody_mode: CustodyMode::UserWallet,
            paper_live_policy: PaperLivePolicy::PaperFirst,
            symbol_allowlist: vec!["BTC".into(), "ETH".into()],
            symbol_denylist: Vec::new(),
            request_timeout_ms: 15_000,
            max_retries: 3,
            retry_backoff_ms: 2_000,
            max_position_size_usd: 10_000.0,
            leverage_cap: 5.0,
            max_leverage: 2.0,
            max_allocation_usd: 25_000.0,
            per_trade_notional_cap_usd: 5_000.0,
            max_slippage_bps: 50,
            gateway_auth_key: "k0123456789abcdef".into(),
            verification_backend: VerificationBackend::EigencloudPrimary,
            verification_level: VerificationLevel::Attested,
            verification_fallback_enabled: true,
            verification_fallback_require_signed_receipts: true,
            verification_fallback_chain_path: None,
            verification_eigencloud_timeout_ms: 30_000,
            information_sharing_scope: InformationSharingScope::Aggregated,
            accept_terms: true,
        }
    }

    /**
     * CERTIFICACIÓN: Orden canónico y veredicto 'passed' nominal.
     */
    #[test]
    fn certify_canonical_order_and_nominal_pass() {
        println!("\n🛫 [PROVING_GROUNDS]: Auditing the preflight gauntlet...");

        let report = run_preflight_battery(&forge_session(), &forge_policy(), false);

        assert_eq!(report.status, FundingPreflightStatus::Passed);
        assert!(report.failure_category.is_none());
        assert_eq!(report.checks.len(), CANONICAL_CHECK_ORDER.len());
        for (executed_check, canonical_id) in report.checks.iter().zip(CANONICAL_CHECK_ORDER) {
            assert_eq!(&executed_check.check_id, canonical_id, "L2_ORDER_DRIFT detected.");
        }
        assert!(report.verification_latency_ms.is_some());
        assert!(!report.verification_fallback_used);

        println!("   ✅ Canonical order and nominal pass certified.");
    }

    /**
     * CERTIFICACIÓN: La primera falla fija la categoría del agregado.
     */
    #[test]
    fn certify_first_failure_category() {
        // Wallet divergente (chequeo 1) + slippage desbordado (chequeo 5):
        // la categoría debe ser la del primero.
        let mut divergent_policy = forge_policy();
        divergent_policy.user_wallet_address =
            Some("0x1111111111111111111111111111111111111111".into());
        divergent_policy.max_slippage_bps = 1_000;

        let report = run_preflight_battery(&forge_session(), &divergent_policy, false);
        assert_eq!(report.status, FundingPreflightStatus::Failed);
        assert_eq!(report.failure_category.as_deref(), Some("wallet_binding"));

        println!("   ✅ First-failure category certified.");
    }

    /**
     * CERTIFICACIÓN: Identidad embebida exigida sin binding -> falla.
     */
    #[test]
    fn certify_identity_requirement() {
        let mut unbound_session = forge_session();
        unbound_session.privy_user_id = None;

        let report = run_preflight_battery(&unbound_session, &forge_policy(), true);
        assert_eq!(report.status, FundingPreflightStatus::Failed);
        assert_eq!(report.failure_category.as_deref(), Some("identity_token_present"));

        println!("   ✅ Identity requirement certified.");
    }

    /**
     * CERTIFICACIÓN: Política fallback-only omite la sonda y la declara.
     */
    #[test]
    fn certify_fallback_only_skip_semantics() {
        let mut fallback_policy = forge_policy();
        fallback_policy.verification_backend = VerificationBackend::FallbackOnly;

        let report = run_preflight_battery(&forge_session(), &fallback_policy, false);
        assert_eq!(report.status, FundingPreflightStatus::Passed);
        assert!(report.verification_fallback_used);

        let reachability_check = report
            .checks
            .iter()
            .find(|check| check.check_id == "verification_backend_reachable")
            .expect("reachability check present");
        assert_eq!(reachability_check.status, PreflightCheckStatus::Skipped);

        println!("   ✅ Skip semantics certified.");
    }

    /**
     * CERTIFICACIÓN: Reservas de gas y fees en sus fronteras.
     */
    #[test]
    fn certify_reserve_boundaries() {
        let mut starved_policy = forge_policy();
        starved_policy.max_allocation_usd = 24.0;
        starved_policy.per_trade_notional_cap_usd = 10.0;
        let gas_report = run_preflight_battery(&forge_session(), &starved_policy, false);
        assert_eq!(gas_report.failure_category.as_deref(), Some("gas_reserve_estimate"));

        let mut slipping_policy = forge_policy();
        slipping_policy.max_slippage_bps = 501;
        let fee_report = run_preflight_battery(&forge_session(), &slipping_policy, false);
        assert_eq!(fee_report.failure_category.as_deref(), Some("fee_budget_reserve"));

        println!("   ✅ Reserve boundaries certified.");
    }
}
