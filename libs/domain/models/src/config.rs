// [libs/domain/models/src/config.rs]
/*!
 * =================================================================
 * APARATO: POLICY CONFIG CONTRACT (V22.0 - TOTAL DECODER READY)
 * CLASIFICACIÓN: DOMAIN ENTITIES (ESTRATO L2)
 * RESPONSABILIDAD: DEFINICIÓN DEL CONTRATO DE POLÍTICA OPERATIVA
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. DUAL STRATA: 'PolicyConfigDraft' captura el objeto laxo del cliente
 *    con campos opcionales explícitos; 'PolicyConfig' es el artefacto
 *    inmutable que emerge del validador total. Campos desconocidos se
 *    descartan en la frontera de deserialización.
 * 2. TYPESHARE SYNERGY: Paridad bit-perfecta con el shell de navegador.
 * 3. NOMINAL PURITY: Sin abreviaciones; unidades explícitas en cada campo.
 *
 * # Mathematical Proof (Config Immutability):
 * 'PolicyConfig' solo puede construirse mediante el validador del estrato
 * de política. Una vez anclado a una sesión, el almacén rechaza cualquier
 * mutación posterior, garantizando que la política firmada por la wallet
 * es exactamente la política ejecutada.
 * =================================================================
 */

use serde::{Deserialize, Serialize};
use typeshare::typeshare;

/// Modo de custodia de fondos pactado con el operador.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CustodyMode {
    /// El operador custodia y firma; el usuario delega.
    OperatorWallet,
    /// El usuario custodia; el runtime propone y el usuario firma.
    UserWallet,
    /// Custodia compartida con doble aprobación.
    DualMode,
}

/// Política de transición papel -> real.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaperLivePolicy {
    /// Ejecución exclusivamente simulada.
    PaperOnly,
    /// Simulación obligatoria antes de habilitar capital real.
    PaperFirst,
    /// Capital real habilitado desde el arranque.
    Live,
}

/// Backend primario de verificación de evidencia.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VerificationBackend {
    /// EigenCloud como autoridad primaria de atestación.
    EigencloudPrimary,
    /// Solo la cadena local de recibos firmados.
    FallbackOnly,
}

/// Nivel de garantía de verificación propagado a la sesión.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VerificationLevel {
    /// Atestación remota completa del enclave.
    Attested,
    /// Cadena de recibos firmados sin atestación remota.
    SignedReceipts,
    /// Telemetría básica sin evidencia criptográfica.
    Basic,
}

/// Alcance de compartición de señales con la red de agregación.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InformationSharingScope {
    /// Nada abandona la instancia dedicada.
    Private,
    /// Solo métricas agregadas y anonimizadas.
    Aggregated,
    /// Señales completas publicadas al mercado de estrategias.
    Public,
}

/// Borrador laxo recibido del cliente antes del validador total.
///
/// Cada campo es opcional de forma explícita; el validador decide el
/// default, normaliza y rechaza con fallo tipado. Campos desconocidos
/// del objeto JSON de origen no se propagan.
#[typeshare]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicyConfigDraft {
    pub profile_name: Option<String>,
    pub profile_domain: Option<String>,
    pub objective: Option<String>,
    pub user_wallet_address: Option<String>,
    pub operator_wallet_address: Option<String>,
    pub custody_mode: Option<CustodyMode>,
    pub paper_live_policy: Option<PaperLivePolicy>,
    pub symbol_allowlist: Option<Vec<String>>,
    pub symbol_denylist: Option<Vec<String>>,
    #[typeshare(serialized_as = "number")]
    pub request_timeout_ms: Option<u64>,
    pub max_retries: Option<u32>,
    #[typeshare(serialized_as = "number")]
    pub retry_backoff_ms: Option<u64>,
    pub max_position_size_usd: Option<f64>,
    pub leverage_cap: Option<f64>,
    pub max_leverage: Option<f64>,
    pub max_allocation_usd: Option<f64>,
    pub per_trade_notional_cap_usd: Option<f64>,
    pub max_slippage_bps: Option<u32>,
    pub gateway_auth_key: Option<String>,
    pub verification_backend: Option<VerificationBackend>,
    pub verification_level: Option<VerificationLevel>,
    pub verification_fallback_enabled: Option<bool>,
    pub verification_fallback_require_signed_receipts: Option<bool>,
    pub verification_fallback_chain_path: Option<String>,
    #[typeshare(serialized_as = "number")]
    pub verification_eigencloud_timeout_ms: Option<u64>,
    pub information_sharing_scope: Option<InformationSharingScope>,
    pub accept_terms: Option<bool>,
}

/// Política operativa validada e inmutable de una sesión.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PolicyConfig {
    /// Nombre nominal del perfil operativo (slug).
    pub profile_name: String,
    /// Dominio del perfil (ej: "perps_trading", "defi_yield").
    pub profile_domain: String,
    /// Objetivo declarado por el usuario durante el onboarding.
    pub objective: String,
    /// Dirección canónica del usuario (requerida según custodia).
    pub user_wallet_address: Option<String>,
    /// Dirección canónica del operador (requerida según custodia).
    pub operator_wallet_address: Option<String>,
    pub custody_mode: CustodyMode,
    pub paper_live_policy: PaperLivePolicy,
    /// Lista blanca de símbolos en mayúsculas, sin duplicados, no vacía.
    pub symbol_allowlist: Vec<String>,
    /// Lista negra de símbolos en mayúsculas, sin duplicados.
    pub symbol_denylist: Vec<String>,
    #[typeshare(serialized_as = "number")]
    pub request_timeout_ms: u64,
    pub max_retries: u32,
    #[typeshare(serialized_as = "number")]
    pub retry_backoff_ms: u64,
    pub max_position_size_usd: f64,
    pub leverage_cap: f64,
    pub max_leverage: f64,
    pub max_allocation_usd: f64,
    pub per_trade_notional_cap_usd: f64,
    pub max_slippage_bps: u32,
    /// Clave simétrica de mando del runtime (16-128 chars, sin blancos).
    pub gateway_auth_key: String,
    pub verification_backend: VerificationBackend,
    pub verification_level: VerificationLevel,
    pub verification_fallback_enabled: bool,
    pub verification_fallback_require_signed_receipts: bool,
    /// Ruta del ledger local de recibos; jamás contiene saltos de línea.
    pub verification_fallback_chain_path: Option<String>,
    #[typeshare(serialized_as = "number")]
    pub verification_eigencloud_timeout_ms: u64,
    pub information_sharing_scope: InformationSharingScope,
    /// Aceptación explícita de términos; siempre 'true' tras validar.
    pub accept_terms: bool,
}
