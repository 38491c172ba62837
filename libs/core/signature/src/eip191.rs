// [libs/core/signature/src/eip191.rs]
/*!
 * =================================================================
 * APARATO: EIP-191 RECOVERY ENGINE (V12.0 - PERSONAL SIGN MASTER)
 * CLASIFICACIÓN: CORE CRYPTO (ESTRATO L1)
 * RESPONSABILIDAD: RECUPERACIÓN DE WALLET DESDE FIRMAS PERSONAL_SIGN
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. RECOVERY SOVEREIGNTY: Recuperación completa del punto público sobre
 *    secp256k1 a partir de la firma compacta de 65 bytes (r || s || v).
 * 2. V NORMALIZATION: Acepta tanto el sufijo legado {27, 28} como el
 *    par crudo {0, 1} de libraries modernas.
 * 3. SECRET HYGIENE: Ni la firma ni material intermedio se registran en
 *    el rastro de tracing; los fallos transportan solo longitudes.
 *
 * # Mathematical Proof (Address Recovery):
 * digest = keccak256("\x19Ethereum Signed Message:\n" || len(m) || m).
 * La recuperación produce el punto público P; la dirección es el sufijo
 * de 20 bytes de keccak256(P_uncompressed[1..65]). La igualdad de
 * direcciones certifica la posesión de la clave privada de la wallet.
 * =================================================================
 */

use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, SECP256K1};
use sha3::{Digest, Keccak256};
use thiserror::Error;

/// Prefijo canónico EIP-191 para personal_sign.
const PERSONAL_SIGN_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n";

/// Longitud de la firma compacta con byte de recuperación.
const COMPACT_SIGNATURE_WITH_RECOVERY_BYTES: usize = 65;

/// Fallos del estrato de firma; jamás transportan material criptográfico.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureFault {
    /// Entrada no-hex, longitud errónea o byte de recuperación ilegal.
    #[error("[L1_SIG_FAULT]: MALFORMED_SIGNATURE -> {0}")]
    Malformed(String),

    /// La curva rechazó la recuperación del punto público.
    #[error("[L1_SIG_FAULT]: RECOVERY_REJECTED -> {0}")]
    RecoveryRejected(String),

    /// La dirección recuperada no coincide con la wallet esperada.
    #[error("[L1_SIG_FAULT]: WALLET_MISMATCH -> expected {expected}, recovered {recovered}")]
    WalletMismatch { expected: String, recovered: String },
}

/// Normaliza el intento de codificación del cliente: un mensaje recibido
/// como "0x…" hexadecimal se decodifica a bytes; cualquier otra cosa se
/// trata como UTF-8 literal.
pub fn normalize_client_message(raw_client_message: &str) -> Vec<u8> {
    if let Some(hexadecimal_body) = raw_client_message.strip_prefix("0x") {
        if !hexadecimal_body.is_empty() && hexadecimal_body.len() % 2 == 0 {
            if let Ok(decoded_bytes) = hex::decode(hexadecimal_body) {
                return decoded_bytes;
            }
        }
    }
    raw_client_message.as_bytes().to_vec()
}

/// Digesto EIP-191 del mensaje: keccak256(prefijo || len || mensaje).
fn personal_sign_digest(message_bytes: &[u8]) -> [u8; 32] {
    let mut digest_engine = Keccak256::new();
    digest_engine.update(PERSONAL_SIGN_PREFIX);
    digest_engine.update(message_bytes.len().to_string().as_bytes());
    digest_engine.update(message_bytes);
    digest_engine.finalize().into()
}

/// Decodifica la firma hex (con o sin prefijo 0x) a su forma compacta.
fn decode_compact_signature(
    signature_hexadecimal: &str,
) -> Result<([u8; 64], RecoveryId), SignatureFault> {
    let hexadecimal_body = signature_hexadecimal
        .strip_prefix("0x")
        .unwrap_or(signature_hexadecimal);

    let raw_signature_bytes = hex::decode(hexadecimal_body)
        .map_err(|_| SignatureFault::Malformed("non-hex signature body".to_string()))?;

    if raw_signature_bytes.len() != COMPACT_SIGNATURE_WITH_RECOVERY_BYTES {
        return Err(SignatureFault::Malformed(format!(
            "expected 65 bytes, got {}",
            raw_signature_bytes.len()
        )));
    }

    // Normalización del byte de recuperación: {27, 28} -> {0, 1}.
    let recovery_suffix_raw = raw_signature_bytes[64];
    let recovery_suffix_normalized = match recovery_suffix_raw {
        0 | 1 => recovery_suffix_raw,
        27 | 28 => recovery_suffix_raw - 27,
        illegal_suffix => {
            return Err(SignatureFault::Malformed(format!(
                "illegal recovery byte {}",
                illegal_suffix
            )))
        }
    };

    let recovery_id = RecoveryId::from_i32(i32::from(recovery_suffix_normalized))
        .map_err(|curve_fault| SignatureFault::Malformed(curve_fault.to_string()))?;

    let mut compact_signature_body = [0u8; 64];
    compact_signature_body.copy_from_slice(&raw_signature_bytes[..64]);

    Ok((compact_signature_body, recovery_id))
}

/// Recupera la dirección canónica (0x + 40 hex minúsculas) que produjo la
/// firma personal_sign sobre `message_bytes`.
///
/// # Errors:
/// - `SignatureFault::Malformed` si la firma no decodifica.
/// - `SignatureFault::RecoveryRejected` si la curva rechaza la operación.
pub fn recover_personal_sign_wallet(
    message_bytes: &[u8],
    signature_hexadecimal: &str,
) -> Result<String, SignatureFault> {
    let (compact_signature_body, recovery_id) = decode_compact_signature(signature_hexadecimal)?;

    let recoverable_signature =
        RecoverableSignature::from_compact(&compact_signature_body, recovery_id)
            .map_err(|curve_fault| SignatureFault::Malformed(curve_fault.to_string()))?;

    let signed_digest = Message::from_digest_slice(&personal_sign_digest(message_bytes))
        .map_err(|curve_fault| SignatureFault::RecoveryRejected(curve_fault.to_string()))?;

    let recovered_public_point = SECP256K1
        .recover_ecdsa(&signed_digest, &recoverable_signature)
        .map_err(|curve_fault| SignatureFault::RecoveryRejected(curve_fault.to_string()))?;

    // Dirección EVM: sufijo de 20 bytes del keccak del punto sin comprimir.
    let uncompressed_point = recovered_public_point.serialize_uncompressed();
    let point_digest = Keccak256::digest(&uncompressed_point[1..]);

    Ok(format!("0x{}", hex::encode(&point_digest[12..])))
}

/// Certifica que la firma sobre `message_bytes` recupera exactamente la
/// wallet esperada (comparación insensible a mayúsculas).
pub fn verify_personal_sign(
    message_bytes: &[u8],
    signature_hexadecimal: &str,
    expected_wallet_address: &str,
) -> Result<(), SignatureFault> {
    let recovered_wallet_address =
        recover_personal_sign_wallet(message_bytes, signature_hexadecimal)?;

    if recovered_wallet_address != expected_wallet_address.to_ascii_lowercase() {
        return Err(SignatureFault::WalletMismatch {
            expected: expected_wallet_address.to_ascii_lowercase(),
            recovered: recovered_wallet_address,
        });
    }

    Ok(())
}
