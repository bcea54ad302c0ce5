use candle_core::Device;
use tracing::debug;

pub fn select_device() -> Device {
    #[cfg(feature = "metal")]
    {
        if let Ok(dev) = Device::new_metal(0) {
            debug!("inference device: Metal");
            return dev;
        }
    }
    debug!("inference device: CPU");
    Device::Cpu
}
