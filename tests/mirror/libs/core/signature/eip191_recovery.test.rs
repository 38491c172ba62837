// [tests/mirror/libs/core/signature/eip191_recovery.test.rs]
/**
 * =================================================================
 * APARATO: EIP-191 RECOVERY CERTIFIER (V4.0 - CURVE EVIDENCE)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L1-CRYPTO
 * RESPONSABILIDAD: AUDITORÍA DE RECUPERACIÓN Y DISCRIMINACIÓN DE FALLOS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. BIT-FLIP DISCRIMINATION: Un bit alterado en la firma produce una
 *    wallet distinta (mismatch), jamás un falso positivo.
 * 2. MESSAGE TAMPER: Un byte alterado en el mensaje desplaza el digesto
 *    y por tanto la wallet recuperada.
 * 3. V NORMALIZATION: Paridad entre sufijos {0,1} y {27,28}.
 * =================================================================
 */

#[cfg(test)]
mod tests {
    use enclagent_core_signature::challenge::{
        compose_challenge_message, generate_challenge_nonce, ChallengeSpec,
    };
    use enclagent_core_signature::eip191::{
        recover_personal_sign_wallet, verify_personal_sign, SignatureFault,
    };
    use secp256k1::{Message, PublicKey, SecretKey, SECP256K1};
    use sha3::{Digest, Keccak256};
    use chrono::Utc;
    use uuid::Uuid;

    const PERSONAL_SIGN_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n";

    /// Forja una firma personal_sign de laboratorio y su wallet canónica.
    fn forge_lab_signature(message_bytes: &[u8], secret_scalar: &[u8; 32]) -> (Vec<u8>, String) {
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

        let mut wire_signature = vec![0u8; 65];
        wire_signature[..64].copy_from_slice(&compact_body);
        wire_signature[64] = 27 + recovery_id.to_i32() as u8;

        let uncompressed = public_point.serialize_uncompressed();
        let point_digest = Keccak256::digest(&uncompressed[1..]);
        let wallet_address = format!("0x{}", hex::encode(&point_digest[12..]));

        (wire_signature, wallet_address)
    }

    /**
     * CERTIFICACIÓN: Recuperación nominal sobre el mensaje de challenge.
     */
    #[test]
    fn certify_nominal_recovery_over_challenge_message() {
        println!("\n🔐 [PROVING_GROUNDS]: Auditing EIP-191 recovery strata...");

        let genesis_instant = Utc::now();
        let challenge_message = compose_challenge_message(&ChallengeSpec {
            session_id: Uuid::new_v4(),
            wallet_address: "0x0000000000000000000000000000000000000000".into(),
            chain_id: Some(8453),
            nonce: generate_challenge_nonce(),
            issued_at: genesis_instant,
            expires_at: genesis_instant + chrono::Duration::seconds(600),
        });

        let (wire_signature, wallet_address) =
            forge_lab_signature(challenge_message.as_bytes(), &[42u8; 32]);
        let signature_hex = format!("0x{}", hex::encode(&wire_signature));

        let recovered_wallet =
            recover_personal_sign_wallet(challenge_message.as_bytes(), &signature_hex)
                .expect("CRITICAL_FAULT: Nominal recovery collapsed.");
        assert_eq!(recovered_wallet, wallet_address, "L1_CURVE_DRIFT: wallet mismatch.");

        assert!(verify_personal_sign(
            challenge_message.as_bytes(),
            &signature_hex,
            &wallet_address
        )
        .is_ok());

        println!("   ✅ Nominal recovery certified for wallet {}.", wallet_address);
    }

    /**
     * CERTIFICACIÓN: Un bit alterado en la firma produce wallet mismatch.
     */
    #[test]
    fn certify_bit_flip_yields_wallet_mismatch() {
        let lab_message = b"Enclagent Gateway Authorization\nSession: bitflip";
        let (mut wire_signature, wallet_address) = forge_lab_signature(lab_message, &[9u8; 32]);

        // Un único bit del escalar 'r' se invierte.
        wire_signature[3] ^= 0b0000_0100;
        let tampered_hex = format!("0x{}", hex::encode(&wire_signature));

        let verdict = verify_personal_sign(lab_message, &tampered_hex, &wallet_address);
        match verdict {
            Err(SignatureFault::WalletMismatch { .. }) => {
                println!("   ✅ Bit-flip discrimination: WalletMismatch confirmed.");
            }
            Err(SignatureFault::RecoveryRejected(_)) => {
                // Frontera válida: el punto alterado puede caer fuera de la curva.
                println!("   ✅ Bit-flip discrimination: curve rejection confirmed.");
            }
            other_outcome => panic!("INTEGRITY_COLLAPSE: unexpected verdict {:?}", other_outcome),
        }
    }

    /**
     * CERTIFICACIÓN: Un byte alterado del mensaje desplaza la wallet.
     */
    #[test]
    fn certify_message_tamper_shifts_recovered_wallet() {
        let original_message = b"authorize runtime launch".to_vec();
        let (wire_signature, wallet_address) = forge_lab_signature(&original_message, &[7u8; 32]);
        let signature_hex = format!("0x{}", hex::encode(&wire_signature));

        let mut tampered_message = original_message.clone();
        tampered_message[0] ^= 0xFF;

        let verdict = verify_personal_sign(&tampered_message, &signature_hex, &wallet_address);
        assert!(
            matches!(verdict, Err(SignatureFault::WalletMismatch { .. })),
            "INTEGRITY_COLLAPSE: tampered message verified against the original wallet."
        );
        println!("   ✅ Message tamper discrimination certified.");
    }

    /**
     * CERTIFICACIÓN: Paridad de sufijos de recuperación {0,1} vs {27,28}.
     */
    #[test]
    fn certify_recovery_suffix_normalization() {
        let lab_message = b"suffix parity";
        let (mut wire_signature, wallet_address) = forge_lab_signature(lab_message, &[3u8; 32]);

        // Forma moderna: sufijo crudo {0, 1}.
        wire_signature[64] -= 27;
        let modern_hex = format!("0x{}", hex::encode(&wire_signature));

        let recovered = recover_personal_sign_wallet(lab_message, &modern_hex)
            .expect("modern suffix rejected");
        assert_eq!(recovered, wallet_address);
        println!("   ✅ Suffix normalization parity certified.");
    }

    /**
     * CERTIFICACIÓN: Entradas malformadas se rechazan con el fallo tipado.
     */
    #[test]
    fn certify_malformed_signature_rejection() {
        let short_fault = recover_personal_sign_wallet(b"m", "0xdeadbeef").unwrap_err();
        assert!(matches!(short_fault, SignatureFault::Malformed(_)));

        let nonhex_fault = recover_personal_sign_wallet(b"m", "0xZZ").unwrap_err();
        assert!(matches!(nonhex_fault, SignatureFault::Malformed(_)));

        println!("   ✅ Malformed rejection certified.");
    }
}
