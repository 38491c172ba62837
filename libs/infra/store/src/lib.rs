// [libs/infra/store/src/lib.rs]
/*!
 * =================================================================
 * APARATO: STORE INFRASTRUCTURE REGISTRY (V16.0)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: EXPOSICIÓN NOMINAL DEL CLIENTE Y LOS REPOSITORIOS
 * =================================================================
 */

pub mod client;
pub mod errors;
pub mod repositories;
pub mod schema;

pub use client::{GatewayStoreClient, StoreLocation};
pub use errors::StoreError;
pub use repositories::onboarding::OnboardingRepository;
pub use repositories::session::{MutationProposal, SessionRepository, TimelineSeed};
pub use repositories::timeline::TimelineRepository;
