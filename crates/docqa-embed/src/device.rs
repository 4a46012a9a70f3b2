//! Compute device for candle models.

use candle_core::Device;
use tracing::info;

/// Metal when built with the `metal` feature and `APP_FORCE_CPU` is unset,
/// otherwise CPU.
pub fn select_device() -> Device {
    #[cfg(feature = "metal")]
    {
        let force_cpu = std::env::var("APP_FORCE_CPU").is_ok_and(|v| v == "1" || v.eq_ignore_ascii_case("true"));
        if !force_cpu {
            match Device::new_metal(0) {
                Ok(dev) => { info!(device = "metal", "Selected compute device"); return dev; }
                Err(e) => tracing::warn!(error = %e, "Metal unavailable, falling back to CPU"),
            }
        }
    }
    info!(device = "cpu", "Selected compute device");
    Device::Cpu
}
