//! FreightGate Devices - the Device Trust Registry
//!
//! Binds a device fingerprint to a user and role and adjudicates trust on
//! each request. A device is trusted only while it is active and its
//! current fingerprint matches the registered one exactly on the trust
//! subset. Devices are deactivated, never deleted.

pub mod device;
pub mod error;
pub mod fingerprint;
pub mod registry;
pub mod store;

pub use device::RegisteredDevice;
pub use error::{DeviceError, DeviceResult};
pub use fingerprint::DeviceFingerprint;
pub use registry::{
    DeviceRegistry, PushConsent, PushConsentError, RegistryConfig, StaticToken, TrustReason,
    TrustResult,
};
pub use store::{DeviceStore, StoreError};
