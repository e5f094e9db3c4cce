use std::sync::OnceLock;

use tracing::{info, warn};

const FALLBACK_CONCURRENCY: usize = 10;
const MIN_CONCURRENCY: usize = 20;
const MAX_CONCURRENCY: usize = 100;

/// Download parallelism derived from the CPU count, computed once per process.
///
/// `clamp(cores * 2.5, 20, 100)`, or 10 when the CPU count is unavailable.
/// Callers apply their own secondary caps.
pub fn optimal_concurrency() -> usize {
    static GOVERNOR: OnceLock<usize> = OnceLock::new();
    *GOVERNOR.get_or_init(|| match cpu_count() {
        Some(cores) => {
            let value = concurrency_for_cores(cores);
            info!("CPU cores: {}, optimal concurrency: {}", cores, value);
            value
        }
        None => {
            warn!(
                "CPU detection failed, using default concurrency {}",
                FALLBACK_CONCURRENCY
            );
            FALLBACK_CONCURRENCY
        }
    })
}

pub fn concurrency_for_cores(cores: usize) -> usize {
    let scaled = (cores as f64 * 2.5).floor() as usize;
    scaled.clamp(MIN_CONCURRENCY, MAX_CONCURRENCY)
}

fn cpu_count() -> Option<usize> {
    let system = sysinfo::System::new_all();
    let cores = system.cpus().len();
    (cores > 0).then_some(cores)
}

/// Default heap size in GB for a machine with `total_gb` of memory.
pub fn default_ram_for_total(total_gb: u64) -> u32 {
    match total_gb {
        t if t >= 16 => 8,
        t if t >= 8 => 4,
        _ => 2,
    }
}

pub fn system_default_ram_gb() -> u32 {
    let mut system = sysinfo::System::new();
    system.refresh_memory();
    default_ram_for_total(system.total_memory() / 1024 / 1024 / 1024)
}
