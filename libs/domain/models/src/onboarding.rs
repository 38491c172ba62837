// [libs/domain/models/src/onboarding.rs]
/*!
 * =================================================================
 * APARATO: ONBOARDING STATE CONTRACT (V18.0 - FOUR STEP LADDER)
 * CLASIFICACIÓN: DOMAIN ENTITIES (ESTRATO L2)
 * RESPONSABILIDAD: ESTADO CONVERSACIONAL PREVIO A LA FIRMA
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. LADDER DETERMINISTA: Cuatro peldaños con precondiciones duras;
 *    el motor L2 es la única autoridad de avance.
 * 2. TRANSCRIPT INTEGRITY: Cada turno queda sellado en orden de llegada
 *    con su rol y marca temporal.
 * =================================================================
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use typeshare::typeshare;
use uuid::Uuid;

/// Peldaño actual de la escalera conversacional.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingStep {
    /// Paso 1: capturar el objetivo operativo del usuario.
    CollectObjective,
    /// Paso 2: capturar asignaciones clave=valor requeridas.
    CollectAssignments,
    /// Paso 3: esperar el token literal "confirm plan".
    ConfirmAndSign,
    /// Paso 4: terminal; la firma EIP-191 puede producirse.
    ReadyToSign,
}

impl OnboardingStep {
    pub fn as_wire_label(&self) -> &'static str {
        match self {
            OnboardingStep::CollectObjective => "collect_objective",
            OnboardingStep::CollectAssignments => "collect_assignments",
            OnboardingStep::ConfirmAndSign => "confirm_and_sign",
            OnboardingStep::ReadyToSign => "ready_to_sign",
        }
    }
}

/// Rol de un turno del transcript.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TranscriptRole {
    User,
    Assistant,
}

/// Turno sellado del transcript conversacional.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub role: TranscriptRole,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Payload emitido al alcanzar el peldaño terminal (paso 4).
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SignaturePlanPayload {
    pub ready_to_sign: bool,
    pub confirmation_required: bool,
    pub unresolved_required_fields: Vec<String>,
    /// Acción esperada del cliente: "produce_eip191_personal_sign".
    pub signature_action: String,
}

impl SignaturePlanPayload {
    /// Artefacto canónico del peldaño terminal.
    pub fn terminal() -> Self {
        Self {
            ready_to_sign: true,
            confirmation_required: false,
            unresolved_required_fields: Vec::new(),
            signature_action: "produce_eip191_personal_sign".to_string(),
        }
    }
}

/// Estado conversacional completo de una sesión.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnboardingState {
    pub session_id: Uuid,
    pub current_step: OnboardingStep,
    /// 'true' solo tras el turno "confirm sign" posterior al paso 4.
    pub completed: bool,
    pub objective: Option<String>,
    /// Campos requeridos pendientes, ordenados y sin duplicados.
    pub missing_fields: Vec<String>,
    pub step4_payload: Option<SignaturePlanPayload>,
    pub transcript: Vec<TranscriptEntry>,
    pub updated_at: DateTime<Utc>,
}

impl OnboardingState {
    /// Estado génesis de una sesión recién creada.
    pub fn genesis(session_id: Uuid, genesis_instant: DateTime<Utc>) -> Self {
        Self {
            session_id,
            current_step: OnboardingStep::CollectObjective,
            completed: false,
            objective: None,
            missing_fields: vec!["objective".to_string()],
            step4_payload: None,
            transcript: Vec::new(),
            updated_at: genesis_instant,
        }
    }

    /// Precondición de launch: terminal y sin campos pendientes.
    pub fn is_signature_ready(&self) -> bool {
        self.current_step == OnboardingStep::ReadyToSign && self.missing_fields.is_empty()
    }
}
