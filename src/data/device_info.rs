//! Device information read during the discovery handshake.

/// Manufacturer details cached for the current session.
///
/// Populated once per discovery handshake, in the fixed order
/// manufacturer → firmware revision; overwritten only by a fresh handshake.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ManufacturerInfo {
    /// Manufacturer name string.
    pub manufacturer: String,
    /// Firmware revision string.
    pub firmware_revision: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_empty() {
        let info = ManufacturerInfo::default();
        assert!(info.manufacturer.is_empty());
        assert!(info.firmware_revision.is_empty());
    }
}
