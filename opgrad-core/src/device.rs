use std::fmt;

/// Represents the physical location where tensor data is stored.
///
/// The reference runtime keeps every buffer in host memory; the device is a
/// tag carried by the tensor so that rules can be checked for placing their
/// gradients on the right device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StorageDevice {
    /// Main system memory (RAM). This is the default device.
    #[default]
    CPU,
    /// A GPU identified by its ordinal.
    GPU(u32),
}

impl fmt::Display for StorageDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageDevice::CPU => write!(f, "cpu"),
            StorageDevice::GPU(index) => write!(f, "gpu:{}", index),
        }
    }
}
