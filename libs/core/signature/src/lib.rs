// [libs/core/signature/src/lib.rs]
/*!
 * =================================================================
 * APARATO: SIGNATURE CORE REGISTRY (V8.0)
 * CLASIFICACIÓN: CORE CRYPTO (ESTRATO L1)
 * RESPONSABILIDAD: EXPOSICIÓN NOMINAL DEL VERIFICADOR Y DEL CHALLENGE
 * =================================================================
 */

pub mod challenge;
pub mod eip191;

pub use challenge::{compose_challenge_message, generate_challenge_nonce, ChallengeSpec};
pub use eip191::{
    normalize_client_message, recover_personal_sign_wallet, verify_personal_sign, SignatureFault,
};
