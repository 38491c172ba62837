// [libs/core/signature/src/challenge.rs]
/*!
 * =================================================================
 * APARATO: CHALLENGE MESSAGE COMPOSER (V7.0 - CANONICAL BYTES)
 * CLASIFICACIÓN: CORE CRYPTO (ESTRATO L1)
 * RESPONSABILIDAD: COMPOSICIÓN BIT-PERFECTA DEL MENSAJE A FIRMAR
 *
 * # Mathematical Proof (Challenge Binding):
 * El mensaje vincula {wallet, session, chain, nonce, issued, expires} en
 * un orden fijo con terminador '\n'. Dos composiciones con los mismos
 * insumos producen bytes idénticos; cualquier divergencia de un byte en
 * la verificación delata manipulación del cliente.
 * =================================================================
 */

use chrono::{DateTime, SecondsFormat, Utc};
use rand::RngCore;
use uuid::Uuid;

/// Bytes de entropía del nonce (32 caracteres hexadecimales).
const CHALLENGE_NONCE_BYTES: usize = 16;

/// Insumos canónicos de un challenge de autorización.
#[derive(Debug, Clone)]
pub struct ChallengeSpec {
    pub session_id: Uuid,
    /// Dirección canónica 0x + 40 hex minúsculas.
    pub wallet_address: String,
    /// Cadena EVM vinculada; None se serializa como "any".
    pub chain_id: Option<u64>,
    /// 32 caracteres hexadecimales de entropía fresca.
    pub nonce: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Genera los 32 caracteres hexadecimales de entropía del challenge.
pub fn generate_challenge_nonce() -> String {
    let mut entropy_buffer = [0u8; CHALLENGE_NONCE_BYTES];
    rand::thread_rng().fill_bytes(&mut entropy_buffer);
    hex::encode(entropy_buffer)
}

/// Compone el mensaje canónico UTF-8 que la wallet firmará vía EIP-191.
///
/// Formato (terminador '\n', sin salto final):
/// ```text
/// Enclagent Gateway Authorization
/// Session: <uuidv4>
/// Wallet: <0x+40hex minúsculas>
/// Chain: <id decimal | "any">
/// Nonce: <32 hex>
/// Issued: <RFC3339 UTC>
/// Expires: <RFC3339 UTC>
/// ```
pub fn compose_challenge_message(challenge_spec: &ChallengeSpec) -> String {
    let chain_label = challenge_spec
        .chain_id
        .map(|chain_identifier| chain_identifier.to_string())
        .unwrap_or_else(|| "any".to_string());

    format!(
        "Enclagent Gateway Authorization\nSession: {}\nWallet: {}\nChain: {}\nNonce: {}\nIssued: {}\nExpires: {}",
        challenge_spec.session_id,
        challenge_spec.wallet_address,
        chain_label,
        challenge_spec.nonce,
        challenge_spec
            .issued_at
            .to_rfc3339_opts(SecondsFormat::Secs, true),
        challenge_spec
            .expires_at
            .to_rfc3339_opts(SecondsFormat::Secs, true),
    )
}
