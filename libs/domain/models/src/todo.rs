// [libs/domain/models/src/todo.rs]
/*!
 * =================================================================
 * APARATO: GATEWAY TODO CONTRACT (V11.0 - DERIVED CHECKLIST)
 * CLASIFICACIÓN: DOMAIN ENTITIES (ESTRATO L2)
 * RESPONSABILIDAD: ITEMS DE CHECKLIST DERIVADOS DEL SNAPSHOT DE SESIÓN
 *
 * # Mathematical Proof (Pure Derivation):
 * Un GatewayTodo es una función pura del snapshot de sesión: dos lecturas
 * del mismo snapshot producen exactamente el mismo checklist. No existe
 * estado propio del feed; por tanto no existe deriva posible.
 * =================================================================
 */

use serde::{Deserialize, Serialize};
use typeshare::typeshare;
use uuid::Uuid;

/// Severidad de un item del checklist.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TodoSeverity {
    Required,
    Recommended,
}

/// Estado de resolución de un item.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    Open,
    Satisfied,
    /// Imposible de resolver en el estado actual (ej: sesión fallida).
    Blocked,
}

/// Responsable de resolver el item.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TodoOwner {
    User,
    Operator,
}

/// Referencias de evidencia que anclan el item a su snapshot de origen.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceRefs {
    pub session_id: Uuid,
    pub provisioning_source: String,
    pub verification_level: Option<String>,
    /// Módulo del shell que renderiza el item (proyección UI).
    pub module_state: String,
    /// Sub-estado de control del runtime en el momento de derivar.
    pub control_state: String,
}

/// Item derivado del checklist del gateway.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayTodo {
    /// Slug estable del item (ej: "sign_authorization").
    pub todo_id: String,
    pub severity: TodoSeverity,
    pub status: TodoStatus,
    pub owner: TodoOwner,
    /// Acción concreta en imperativo para el responsable.
    pub action: String,
    pub evidence_refs: EvidenceRefs,
}
