use candle_core::Device;
use tracing::info;

/// Metal when compiled with the `metal` feature and a GPU is present, else CPU.
pub fn select_device() -> Device {
    #[cfg(feature = "metal")]
    {
        match Device::new_metal(0) {
            Ok(dev) => {
                info!("embedding device: metal");
                return dev;
            }
            Err(e) => tracing::warn!(error = %e, "metal unavailable, falling back to cpu"),
        }
    }
    info!("embedding device: cpu");
    Device::Cpu
}
