//! Compute backend selection.
//!
//! - [`CapabilityProbe`] answers whether an accelerator exists and whether its
//!   runtime libraries can be found
//! - [`RuntimeEnvironment`] makes those libraries visible to worker processes
//! - [`AdaptiveModelLoader`] picks device and precision and retries
//!   initialization through a fallback cascade

mod environment;
mod errors;
mod loader;
mod probe;
mod profile;

pub use environment::{ProcessEnvironment, RuntimeEnvironment};
pub use errors::{InferenceError, InitFailure, InitializationError};
pub use loader::{
    plan_load, AdaptiveModelLoader, LoadPlan, LoadPolicy, LoadRequest, LoadedModel,
    ModelInitializer,
};
pub use probe::{AcceleratorInfo, CapabilityProbe, RuntimeSupport, SystemProbe};
pub use profile::{BackendProfile, DeviceKind, ModelKind, Precision};
