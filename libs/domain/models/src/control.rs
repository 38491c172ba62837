// [libs/domain/models/src/control.rs]
/*!
 * =================================================================
 * APARATO: RUNTIME CONTROL VOCABULARY (V6.0)
 * CLASIFICACIÓN: DOMAIN ENTITIES (ESTRATO L2)
 * RESPONSABILIDAD: ACCIONES DE MANDO SOBRE EL RUNTIME DEDICADO
 * =================================================================
 */

use serde::{Deserialize, Serialize};
use std::fmt;
use typeshare::typeshare;

/// Acción de mando aplicable a una sesión en estado 'ready'.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeControlAction {
    /// Suspende el bucle del agente preservando su estado.
    Pause,
    /// Reanuda un runtime previamente pausado.
    Resume,
    /// Apaga el runtime de forma definitiva (absorbente).
    Terminate,
    /// Rota la clave de mando; solo la huella queda registrada.
    RotateAuthKey,
}

impl fmt::Display for RuntimeControlAction {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nominal_label = match self {
            RuntimeControlAction::Pause => "pause",
            RuntimeControlAction::Resume => "resume",
            RuntimeControlAction::Terminate => "terminate",
            RuntimeControlAction::RotateAuthKey => "rotate_auth_key",
        };
        write!(formatter, "{}", nominal_label)
    }
}
