// [libs/infra/store/src/repositories/mod.rs]
/*!
 * =================================================================
 * APARATO: REPOSITORY REGISTRY (V7.0)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: REGISTRO NOMINAL DE REPOSITORIOS DEL PLANO DE CONTROL
 * =================================================================
 */

pub mod onboarding;
pub mod session;
pub mod timeline;

pub use onboarding::OnboardingRepository;
pub use session::SessionRepository;
pub use timeline::TimelineRepository;
