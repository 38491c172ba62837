// [libs/domain/models/src/wallet.rs]
/*!
 * =================================================================
 * APARATO: WALLET ADDRESS CANONICALIZER (V4.0)
 * CLASIFICACIÓN: DOMAIN ENTITIES (ESTRATO L2)
 * RESPONSABILIDAD: NORMALIZACIÓN CANÓNICA DE DIRECCIONES EVM
 * =================================================================
 */

use crate::errors::GatewayError;

/// Longitud del cuerpo hexadecimal de una dirección EVM (sin el prefijo 0x).
const WALLET_HEX_BODY_LENGTH: usize = 40;

/// Normaliza una dirección de billetera al formato canónico de cable:
/// `0x` + 40 caracteres hexadecimales en minúsculas.
///
/// # Errors:
/// - `GatewayError::InvalidWalletAddress` si el prefijo, la longitud o el
///   alfabeto hexadecimal no se cumplen.
pub fn normalize_wallet_address(raw_wallet_input: &str) -> Result<String, GatewayError> {
    let trimmed_candidate = raw_wallet_input.trim();

    let hexadecimal_body = trimmed_candidate
        .strip_prefix("0x")
        .or_else(|| trimmed_candidate.strip_prefix("0X"))
        .ok_or_else(|| GatewayError::InvalidWalletAddress(raw_wallet_input.to_string()))?;

    if hexadecimal_body.len() != WALLET_HEX_BODY_LENGTH {
        return Err(GatewayError::InvalidWalletAddress(raw_wallet_input.to_string()));
    }

    if !hexadecimal_body.chars().all(|symbol| symbol.is_ascii_hexdigit()) {
        return Err(GatewayError::InvalidWalletAddress(raw_wallet_input.to_string()));
    }

    Ok(format!("0x{}", hexadecimal_body.to_ascii_lowercase()))
}
