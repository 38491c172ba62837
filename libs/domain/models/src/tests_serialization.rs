// [libs/domain/models/src/tests_serialization.rs]
/**
 * =================================================================
 * APARATO: DOMAIN SERIALIZATION TEST (V6.0 - INTEGRATION LEVEL)
 * CLASIFICACIÓN: TRINITY EVIDENCE (ESTRATO L2-MODELS)
 * RESPONSABILIDAD: CERTIFICACIÓN DE PARIDAD JSON DEL CONTRATO DE SESIÓN
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. WIRE PARITY: Valida que todos los discriminadores de estado viajen
 *    en snake_case exacto, tal como los consume el shell de navegador.
 * 2. SECRET HYGIENE: Certifica que el snapshot serializado jamás
 *    transporta material de clave, solo huellas.
 * =================================================================
 */
