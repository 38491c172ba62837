// [libs/domain/models/src/lib.rs]
/*!
 * =================================================================
 * APARATO: DOMAIN MODELS REGISTRY (V30.0 - SINGLE SOURCE OF TRUTH)
 * CLASIFICACIÓN: DOMAIN ENTITIES (ESTRATO L2)
 * RESPONSABILIDAD: EXPOSICIÓN NOMINAL DE CONTRATOS DEL PLANO DE CONTROL
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. SSoT ABSOLUTO: Toda entidad que cruza un límite de crate o de red
 *    nace en este estrato; los adaptadores L3/L4 solo la transportan.
 * 2. TYPESHARE SYNERGY: Sello bit-perfect para la generación de
 *    interfaces TypeScript del shell de navegador.
 * 3. HYGIENE: Re-exportación plana para sinapsis ergonómica.
 * =================================================================
 */

pub mod config;
pub mod control;
pub mod errors;
pub mod events;
pub mod onboarding;
pub mod session;
pub mod template;
pub mod timeline;
pub mod todo;
pub mod wallet;

pub use config::{
    CustodyMode, InformationSharingScope, PaperLivePolicy, PolicyConfig, PolicyConfigDraft,
    VerificationBackend, VerificationLevel,
};
pub use control::RuntimeControlAction;
pub use errors::GatewayError;
pub use events::{StreamChannel, StreamFrame, SSE_EVENT_LAGGED};
pub use onboarding::{
    OnboardingState, OnboardingStep, SignaturePlanPayload, TranscriptEntry, TranscriptRole,
};
pub use session::{
    FundingPreflightStatus, PreflightCheckRecord, PreflightCheckStatus, ProvisioningSource,
    RuntimeState, SessionRecord, SessionStatus,
};
pub use template::{PolicyTemplate, RiskPosture, RiskProfile, TemplateConfigDefaults};
pub use timeline::{TimelineActor, TimelineEvent};
pub use todo::{EvidenceRefs, GatewayTodo, TodoOwner, TodoSeverity, TodoStatus};
pub use wallet::normalize_wallet_address;
