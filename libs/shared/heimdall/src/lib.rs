// [libs/shared/heimdall/src/lib.rs]
/*!
 * =================================================================
 * APARATO: HEIMDALL NEURAL OBSERVER (V27.0 - MODE RESOLVED)
 * CLASIFICACIÓN: SHARED UTILITY (ESTRATO L4/L6)
 * RESPONSABILIDAD: BOOTSTRAP DE TELEMETRÍA Y CAPTURA DE COLAPSOS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. MODE RESOLUTION: El formato de emisión se resuelve en cadena:
 *    LOG_FORMAT del operador primero, perfil de compilación después.
 * 2. NOISE FLOOR TABLE: El piso de ruido de los vecinos de
 *    infraestructura vive en una tabla declarativa, no incrustado en un
 *    format string; RUST_LOG del operador lo anula por completo.
 * 3. CHAINED COLLAPSE HOOK: El hook de pánico sella hilo, coordenadas y
 *    análisis del payload, y después cede al hook heredado para
 *    preservar el backtrace estándar del runtime.
 * 4. IDEMPOTENT IGNITION: Una segunda ignición (bancos de prueba) se
 *    degrada a aviso en vez de colapsar el proceso.
 * =================================================================
 */

use std::panic;
use std::thread;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Piso de ruido declarativo de los vecinos de infraestructura.
/// RUST_LOG, cuando está presente, sustituye la tabla entera.
const NOISE_FLOOR_DIRECTIVES: &[(&str, &str)] = &[
    ("tower_http", "warn"),
    ("hyper", "warn"),
    ("h2", "warn"),
    ("libsql", "error"),
];

/// Formato de emisión del estrato de telemetría.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelemetryMode {
    /// Tramas JSON planas para la ingesta del agregador del despliegue.
    Structured,
    /// Salida compacta y legible para la consola del Arquitecto.
    Interactive,
}

impl TelemetryMode {
    /// Cadena de resolución: LOG_FORMAT explícito > perfil de compilación.
    pub fn resolve() -> Self {
        match std::env::var("LOG_FORMAT")
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase()
            .as_str()
        {
            "json" => TelemetryMode::Structured,
            "pretty" | "compact" => TelemetryMode::Interactive,
            _ if cfg!(debug_assertions) => TelemetryMode::Interactive,
            _ => TelemetryMode::Structured,
        }
    }
}

/// Construye el filtro ambiental: la directiva del dominio del servicio
/// más el piso de ruido tabulado, salvo que el operador dicte RUST_LOG.
fn forge_environmental_filter(service_nominal_identifier: &str) -> EnvFilter {
    if let Ok(operator_dictated_filter) = EnvFilter::try_from_default_env() {
        return operator_dictated_filter;
    }

    let domain_level = if cfg!(debug_assertions) { "debug" } else { "info" };
    let mut directive_chain = format!("{}={}", service_nominal_identifier, domain_level);
    for (noisy_neighbor, floor_level) in NOISE_FLOOR_DIRECTIVES {
        directive_chain.push_str(&format!(",{}={}", noisy_neighbor, floor_level));
    }

    EnvFilter::new(directive_chain)
}

/// Instala el hook de colapso encadenado (Phoenix Shield).
///
/// Sella la evidencia forense del pánico y después invoca el hook
/// heredado, de modo que el backtrace estándar no se pierde.
fn install_collapse_hook(service_nominal_identifier: &str) {
    let service_id_snapshot = service_nominal_identifier.to_string();
    let inherited_hook = panic::take_hook();

    panic::set_hook(Box::new(move |panic_metadata| {
        let collapsed_thread_name = thread::current()
            .name()
            .unwrap_or("unnamed_thread")
            .to_string();

        let collapse_coordinates = panic_metadata
            .location()
            .map(|location| format!("{}:{}", location.file(), location.line()))
            .unwrap_or_else(|| "unknown_coordinates".to_string());

        let collapse_analysis = panic_metadata
            .payload()
            .downcast_ref::<String>()
            .cloned()
            .or_else(|| {
                panic_metadata
                    .payload()
                    .downcast_ref::<&str>()
                    .map(|payload_text| payload_text.to_string())
            })
            .unwrap_or_else(|| "OPAQUE_PANIC_PAYLOAD".to_string());

        error!(
            target: "collapse_monitor",
            service = %service_id_snapshot,
            thread = %collapsed_thread_name,
            coordinates = %collapse_coordinates,
            "🔥 [CRITICAL_PANIC]: Thread collapsed. Analysis: {}",
            collapse_analysis
        );

        inherited_hook(panic_metadata);
    }));
}

/// Ignición del estrato de telemetría Heimdall para un servicio.
///
/// # Comportamiento:
/// - `Structured`: JSON plano sin span ambiental, listo para ingesta.
/// - `Interactive`: salida compacta sin targets para la consola.
/// - Una ignición repetida emite aviso y no toca el suscriptor vigente.
pub fn init_tracing(service_nominal_identifier: &str) {
    let environmental_filter = forge_environmental_filter(service_nominal_identifier);
    let subscriber_builder = tracing_subscriber::fmt().with_env_filter(environmental_filter);

    let ignition_outcome = match TelemetryMode::resolve() {
        TelemetryMode::Structured => subscriber_builder
            .json()
            .flatten_event(true)
            .with_current_span(false)
            .try_init(),
        TelemetryMode::Interactive => subscriber_builder
            .compact()
            .with_target(false)
            .try_init(),
    };

    match ignition_outcome {
        Ok(()) => {
            install_collapse_hook(service_nominal_identifier);
            info!(
                "👁️  [HEIMDALL_ONLINE]: Telemetry stratum level for [{}]. Phoenix Shield ACTIVE.",
                service_nominal_identifier
            );
        }
        Err(_already_ignited) => {
            warn!(
                "⚪ [HEIMDALL_REPEAT]: Telemetry already ignited; [{}] joins the active stratum.",
                service_nominal_identifier
            );
        }
    }
}
