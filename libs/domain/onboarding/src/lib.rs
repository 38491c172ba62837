// [libs/domain/onboarding/src/lib.rs]
/*!
 * =================================================================
 * APARATO: ONBOARDING CONVERSATION ENGINE (V21.0 - LADDER MASTER)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: AVANCE DETERMINISTA DE LA ESCALERA DE CUATRO PELDAÑOS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. SNAPSHOT PURITY: El motor recibe un snapshot y propone el siguiente;
 *    jamás muta estado compartido. La persistencia pertenece al L3.
 * 2. HARD PRECONDITIONS: Un turno que viola el peldaño actual se rechaza
 *    sin efectos: ni transcript, ni remociones, ni avance.
 * 3. IDEMPOTENT ASSIGNMENTS: Repetir una línea de asignaciones ya
 *    satisfecha no re-añade campos ni duplica remociones.
 * 4. POLICY CATCH-UP: Secuencia determinista de recuperación derivada de
 *    una política validada, para la precondición de firma del launch.
 *
 * # Mathematical Proof (Ladder Monotonicity):
 * El peldaño solo avanza (1->2->3->4) y 'completed' solo asciende
 * (false->true). No existe operación de retroceso, por lo que el estado
 * conversacional converge en a lo sumo |turnos| pasos.
 * =================================================================
 */

use chrono::{DateTime, Utc};
use enclagent_domain_models::config::PolicyConfig;
use enclagent_domain_models::errors::GatewayError;
use enclagent_domain_models::onboarding::{
    OnboardingState, OnboardingStep, SignaturePlanPayload, TranscriptEntry, TranscriptRole,
};
use tracing::{debug, instrument};

/// Campos requeridos del peldaño de asignaciones, en orden canónico.
pub const REQUIRED_ASSIGNMENT_FIELDS: &[&str] =
    &["profile_name", "accept_terms", "gateway_auth_key"];

/// Token literal que sella el plan en el peldaño 3.
const CONFIRM_PLAN_TOKEN: &str = "confirm plan";

/// Token literal que completa la conversación tras el peldaño 4.
const CONFIRM_SIGN_TOKEN: &str = "confirm sign";

/// Tope duro de turnos de la secuencia de catch-up.
const CATCH_UP_TURN_CEILING: usize = 6;

/// Resultado de un turno aceptado.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// Snapshot propuesto tras aplicar el turno.
    pub state: OnboardingState,
    /// Respuesta del asistente, ya sellada en el transcript.
    pub assistant_message: String,
}

fn seal_turn(
    state: &mut OnboardingState,
    user_message: &str,
    assistant_message: &str,
    turn_instant: DateTime<Utc>,
) {
    state.transcript.push(TranscriptEntry {
        role: TranscriptRole::User,
        message: user_message.to_string(),
        created_at: turn_instant,
    });
    state.transcript.push(TranscriptEntry {
        role: TranscriptRole::Assistant,
        message: assistant_message.to_string(),
        created_at: turn_instant,
    });
    state.updated_at = turn_instant;
}

/// Interpreta una línea de asignaciones "clave=valor, clave=valor".
/// Devuelve los pares reconocidos; una línea sin ningún par es ilegible.
fn parse_assignment_pairs(raw_assignment_line: &str) -> Vec<(String, String)> {
    raw_assignment_line
        .split(',')
        .filter_map(|raw_fragment| {
            let (raw_key, raw_value) = raw_fragment.split_once('=')?;
            let key = raw_key.trim().to_ascii_lowercase();
            let value = raw_value.trim().to_string();
            if key.is_empty() || value.is_empty() {
                return None;
            }
            Some((key, value))
        })
        .collect()
}

/// Certifica si un valor satisface su campo requerido.
fn assignment_satisfies_field(field_name: &str, candidate_value: &str) -> bool {
    match field_name {
        // La aceptación de términos exige afirmación explícita.
        "accept_terms" => candidate_value.eq_ignore_ascii_case("true"),
        // La clave de mando no admite blancos internos.
        "gateway_auth_key" => !candidate_value.chars().any(char::is_whitespace),
        _ => !candidate_value.is_empty(),
    }
}

/// Avanza la conversación con un turno de usuario.
///
/// # Errors:
/// `GatewayError::OnboardingPrecondition` si el turno viola el peldaño
/// actual; el snapshot de entrada queda intacto.
#[instrument(skip(current_state, user_message), fields(step = %current_state.current_step.as_wire_label()))]
pub fn advance_conversation(
    current_state: &OnboardingState,
    user_message: &str,
    turn_instant: DateTime<Utc>,
) -> Result<TurnOutcome, GatewayError> {
    let trimmed_message = user_message.trim();
    if trimmed_message.is_empty() {
        return Err(GatewayError::OnboardingPrecondition(
            "empty turns are not accepted".to_string(),
        ));
    }

    let mut proposed_state = current_state.clone();

    let assistant_message = match current_state.current_step {
        // --- PELDAÑO 1: OBJETIVO ---
        OnboardingStep::CollectObjective => {
            // Una línea de asignaciones antes del objetivo viola el peldaño.
            if !parse_assignment_pairs(trimmed_message).is_empty() {
                return Err(GatewayError::OnboardingPrecondition(
                    "assignments are not accepted before the objective".to_string(),
                ));
            }

            proposed_state.objective = Some(trimmed_message.to_string());
            proposed_state.current_step = OnboardingStep::CollectAssignments;
            proposed_state.missing_fields = REQUIRED_ASSIGNMENT_FIELDS
                .iter()
                .map(|field| field.to_string())
                .collect();

            format!(
                "Objective recorded. Now provide the remaining assignments as comma-separated key=value pairs: {}.",
                REQUIRED_ASSIGNMENT_FIELDS.join(", ")
            )
        }

        // --- PELDAÑO 2: ASIGNACIONES ---
        OnboardingStep::CollectAssignments => {
            let assignment_pairs = parse_assignment_pairs(trimmed_message);
            if assignment_pairs.is_empty() {
                return Err(GatewayError::OnboardingPrecondition(
                    "expected comma-separated key=value assignments".to_string(),
                ));
            }

            for (field_name, candidate_value) in &assignment_pairs {
                if assignment_satisfies_field(field_name, candidate_value) {
                    proposed_state
                        .missing_fields
                        .retain(|missing_field| missing_field != field_name);
                }
            }

            if proposed_state.missing_fields.is_empty() {
                proposed_state.current_step = OnboardingStep::ConfirmAndSign;
                "All required assignments satisfied. Reply with the literal token 'confirm plan' to seal the plan.".to_string()
            } else {
                format!(
                    "Assignments received. Still missing: {}.",
                    proposed_state.missing_fields.join(", ")
                )
            }
        }

        // --- PELDAÑO 3: SELLO DEL PLAN ---
        OnboardingStep::ConfirmAndSign => {
            if !trimmed_message.eq_ignore_ascii_case(CONFIRM_PLAN_TOKEN) {
                return Err(GatewayError::OnboardingPrecondition(format!(
                    "awaiting the literal token '{}'",
                    CONFIRM_PLAN_TOKEN
                )));
            }

            proposed_state.current_step = OnboardingStep::ReadyToSign;
            proposed_state.step4_payload = Some(SignaturePlanPayload::terminal());

            "Plan sealed. Produce the EIP-191 personal_sign signature, then reply 'confirm sign' to complete onboarding.".to_string()
        }

        // --- PELDAÑO 4: TERMINAL ---
        OnboardingStep::ReadyToSign => {
            if !trimmed_message.eq_ignore_ascii_case(CONFIRM_SIGN_TOKEN) {
                return Err(GatewayError::OnboardingPrecondition(format!(
                    "terminal step accepts only the literal token '{}'",
                    CONFIRM_SIGN_TOKEN
                )));
            }

            if proposed_state.completed {
                // Repetición inofensiva del cierre.
                "Onboarding already completed.".to_string()
            } else {
                proposed_state.completed = true;
                "Onboarding completed. The gateway will verify your signature and launch the runtime.".to_string()
            }
        }
    };

    seal_turn(&mut proposed_state, trimmed_message, &assistant_message, turn_instant);

    Ok(TurnOutcome {
        state: proposed_state,
        assistant_message,
    })
}

/// Secuencia determinista de catch-up derivada de una política validada:
/// objetivo -> asignaciones -> "confirm plan" -> "confirm sign".
///
/// Lleva cualquier estado intermedio hasta 'completed=true'. Se invoca en
/// la precondición de firma cuando la conversación no alcanzó el peldaño
/// terminal por la vía interactiva.
///
/// # Errors:
/// `GatewayError::OnboardingRequiredVariables` si la secuencia no logra
/// vaciar los campos requeridos dentro del tope de turnos.
#[instrument(skip(current_state, policy))]
pub fn catch_up_from_policy(
    current_state: &OnboardingState,
    policy: &PolicyConfig,
    turn_instant: DateTime<Utc>,
) -> Result<OnboardingState, GatewayError> {
    let mut rolling_state = current_state.clone();

    for _catch_up_turn in 0..CATCH_UP_TURN_CEILING {
        if rolling_state.completed {
            return Ok(rolling_state);
        }

        let synthetic_user_message = match rolling_state.current_step {
            OnboardingStep::CollectObjective => policy.objective.clone(),
            OnboardingStep::CollectAssignments => format!(
                "profile_name={}, accept_terms=true, gateway_auth_key={}",
                policy.profile_name, policy.gateway_auth_key
            ),
            OnboardingStep::ConfirmAndSign => CONFIRM_PLAN_TOKEN.to_string(),
            OnboardingStep::ReadyToSign => CONFIRM_SIGN_TOKEN.to_string(),
        };

        debug!(
            "🪜 [CATCH_UP]: Injecting synthetic turn at step [{}].",
            rolling_state.current_step.as_wire_label()
        );

        rolling_state = advance_conversation(&rolling_state, &synthetic_user_message, turn_instant)?
            .state;
    }

    if rolling_state.completed {
        Ok(rolling_state)
    } else {
        Err(GatewayError::OnboardingRequiredVariables {
            missing_fields: rolling_state.missing_fields,
        })
    }
}
