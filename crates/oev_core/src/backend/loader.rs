//! Adaptive model loading.
//!
//! Planning is pure: [`plan_load`] turns a policy, a requested model and the
//! probe answers into a device, a model and an ordered list of precisions.
//! [`AdaptiveModelLoader::load`] then walks that list through a
//! [`ModelInitializer`] until one attempt succeeds.

use std::sync::Arc;

use super::environment::RuntimeEnvironment;
use super::errors::{InitFailure, InitializationError};
use super::probe::{AcceleratorInfo, CapabilityProbe, RuntimeSupport};
use super::profile::{BackendProfile, DeviceKind, ModelKind, Precision};
use crate::config::{BackendSettings, TranscriptionSettings, TranslationSettings};
use crate::logging::LogSink;
use crate::translation::LanguagePair;

/// Model selection rules for one model family.
#[derive(Debug, Clone)]
pub struct LoadPolicy {
    pub kind: ModelKind,
    /// Used when nothing is requested and no large model is auto-selected.
    pub default_model: String,
    /// Replacement for variants that are unstable on the accelerator.
    pub stable_model: String,
    pub unstable_on_accelerator: Vec<String>,
    /// Variants that need at least `memory_threshold_gib` of accelerator memory.
    pub large_models: Vec<String>,
    /// Picked automatically when nothing is requested and memory allows.
    pub auto_large_model: Option<String>,
    pub memory_threshold_gib: f64,
    pub force_cpu: bool,
}

impl LoadPolicy {
    pub fn speech(settings: &TranscriptionSettings, backend: &BackendSettings) -> Self {
        Self {
            kind: ModelKind::Speech,
            default_model: settings.default_model.clone(),
            stable_model: settings.stable_model.clone(),
            unstable_on_accelerator: settings.unsafe_models.clone(),
            large_models: Vec::new(),
            auto_large_model: None,
            memory_threshold_gib: 0.0,
            force_cpu: backend.force_cpu,
        }
    }

    pub fn translation(settings: &TranslationSettings, backend: &BackendSettings) -> Self {
        Self {
            kind: ModelKind::Translation,
            default_model: settings.small_model.clone(),
            stable_model: settings.small_model.clone(),
            unstable_on_accelerator: Vec::new(),
            large_models: vec![settings.large_model.clone()],
            auto_large_model: Some(settings.large_model.clone()),
            memory_threshold_gib: settings.large_model_min_gib,
            force_cpu: backend.force_cpu,
        }
    }
}

/// Outcome of planning, before any initialization is attempted.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadPlan {
    pub kind: ModelKind,
    pub requested: Option<String>,
    pub model: String,
    pub device: DeviceKind,
    pub accelerator_memory_gib: f64,
    /// Precisions in attempt order, without repeats.
    pub candidates: Vec<Precision>,
    /// Warnings produced by the overrides.
    pub notices: Vec<String>,
}

impl LoadPlan {
    /// Profiles in attempt order.
    pub fn profiles(&self) -> impl Iterator<Item = BackendProfile> + '_ {
        self.candidates.iter().map(|precision| BackendProfile {
            device: self.device,
            precision: *precision,
            accelerator_memory_gib: self.accelerator_memory_gib,
        })
    }
}

/// Decide model, device and precision candidates.
pub fn plan_load(
    policy: &LoadPolicy,
    requested: Option<&str>,
    accelerator: AcceleratorInfo,
    support: &RuntimeSupport,
) -> LoadPlan {
    let requested = requested
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string);
    let mut notices = Vec::new();

    let accelerator_usable = !policy.force_cpu && accelerator.available && support.is_usable();
    if accelerator.available && !support.is_usable() && !policy.force_cpu {
        tracing::info!("Accelerator present but runtime libraries missing, using CPU");
    }
    let mut device = if accelerator_usable {
        DeviceKind::Accelerator
    } else {
        DeviceKind::HostCpu
    };

    let mut model = match (&requested, &policy.auto_large_model) {
        (Some(name), _) => name.clone(),
        (None, Some(large))
            if accelerator_usable && accelerator.memory_gib >= policy.memory_threshold_gib =>
        {
            large.clone()
        }
        _ => policy.default_model.clone(),
    };

    if device == DeviceKind::Accelerator && policy.unstable_on_accelerator.contains(&model) {
        notices.push(format!(
            "{} model '{}' on CUDA has been unstable on this setup. Overriding to '{}' for reliability.",
            policy.kind.label(),
            model,
            policy.stable_model
        ));
        model = policy.stable_model.clone();
    }

    if device == DeviceKind::Accelerator
        && policy.large_models.contains(&model)
        && accelerator.memory_gib < policy.memory_threshold_gib
    {
        notices.push(format!(
            "{} model '{}' is too large for this GPU ({:.1} GiB < {:.1} GiB). Falling back to CPU to avoid running out of memory.",
            policy.kind.label(),
            model,
            accelerator.memory_gib,
            policy.memory_threshold_gib
        ));
        device = DeviceKind::HostCpu;
    }

    let mut candidates = Vec::with_capacity(3);
    let mut seed = vec![device.initial_precision(), Precision::FullFloat];
    if device == DeviceKind::Accelerator {
        seed.push(Precision::Int8);
    }
    for precision in seed {
        if precision.requires_accelerator() && device == DeviceKind::HostCpu {
            continue;
        }
        if !candidates.contains(&precision) {
            candidates.push(precision);
        }
    }

    LoadPlan {
        kind: policy.kind,
        requested,
        model,
        device,
        accelerator_memory_gib: accelerator.memory_gib,
        candidates,
        notices,
    }
}

/// Everything an initializer needs for one attempt.
#[derive(Debug, Clone, Copy)]
pub struct LoadRequest<'a> {
    pub kind: ModelKind,
    pub model: &'a str,
    pub profile: BackendProfile,
    pub languages: Option<&'a LanguagePair>,
}

/// Creates a model handle for one configuration.
pub trait ModelInitializer: Send + Sync {
    type Handle;

    fn initialize(&self, request: &LoadRequest<'_>) -> Result<Self::Handle, InitFailure>;
}

/// A handle together with the configuration that produced it.
#[derive(Debug)]
pub struct LoadedModel<H> {
    pub handle: H,
    pub model: String,
    pub profile: BackendProfile,
}

/// Probes, plans and walks the precision cascade.
///
/// Holds no model handles; every call loads afresh.
#[derive(Clone)]
pub struct AdaptiveModelLoader {
    probe: Arc<dyn CapabilityProbe>,
    environment: Arc<dyn RuntimeEnvironment>,
}

impl AdaptiveModelLoader {
    pub fn new(probe: Arc<dyn CapabilityProbe>, environment: Arc<dyn RuntimeEnvironment>) -> Self {
        Self { probe, environment }
    }

    /// Plan against the current hardware without loading anything.
    pub fn plan(&self, policy: &LoadPolicy, requested: Option<&str>) -> LoadPlan {
        let accelerator = self.probe.probe();
        let support = self.probe.runtime_support();
        plan_load(policy, requested, accelerator, &support)
    }

    /// Load a model, trying each precision candidate in order.
    pub fn load<I: ModelInitializer + ?Sized>(
        &self,
        initializer: &I,
        policy: &LoadPolicy,
        requested: Option<&str>,
        languages: Option<&LanguagePair>,
        log: &dyn LogSink,
    ) -> Result<LoadedModel<I::Handle>, InitializationError> {
        let accelerator = self.probe.probe();
        let support = self.probe.runtime_support();
        let plan = plan_load(policy, requested, accelerator, &support);

        for notice in &plan.notices {
            log.warn(notice);
        }

        if plan.device == DeviceKind::Accelerator {
            self.environment.prepare_accelerator(&support, log);
        }

        let mut attempts = 0;
        let mut last = InitFailure::new("no candidate configuration");
        for profile in plan.profiles() {
            attempts += 1;
            log.info(&format!(
                "Loading {} model '{}' on device '{}' (compute_type={})",
                plan.kind.label(),
                plan.model,
                profile.device,
                profile.precision
            ));

            let request = LoadRequest {
                kind: plan.kind,
                model: &plan.model,
                profile,
                languages,
            };
            match initializer.initialize(&request) {
                Ok(handle) => {
                    tracing::info!("Loaded '{}' with {}", plan.model, profile);
                    return Ok(LoadedModel {
                        handle,
                        model: plan.model.clone(),
                        profile,
                    });
                }
                Err(e) => {
                    log.warn(&format!(
                        "Model init failed with {}, model='{}': {}",
                        profile, plan.model, e
                    ));
                    last = e;
                }
            }
        }

        Err(InitializationError {
            kind: plan.kind,
            model: plan.model,
            device: plan.device,
            attempts,
            last,
        })
    }
}
