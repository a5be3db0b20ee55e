//! Accelerator capability probing.
//!
//! Two independent questions are answered: is an accelerator present (and how
//! much memory does it have), and can its runtime libraries be found. Both
//! must agree before the loader picks the accelerator.

use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use crate::config::BackendSettings;
use crate::process::{command_exists, run_with_timeout};

/// Result of the accelerator query.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AcceleratorInfo {
    pub available: bool,
    pub memory_gib: f64,
}

impl AcceleratorInfo {
    /// The conservative answer.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_memory(memory_gib: f64) -> Self {
        Self {
            available: true,
            memory_gib,
        }
    }
}

/// Accelerator runtime libraries found on this machine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuntimeSupport {
    /// Directories holding at least one runtime library.
    pub library_dirs: Vec<PathBuf>,
    pub has_runtime: bool,
    pub has_blas: bool,
    pub has_dnn: bool,
}

impl RuntimeSupport {
    /// Runtime and BLAS are both required to initialize on the accelerator.
    pub fn is_usable(&self) -> bool {
        self.has_runtime && self.has_blas
    }
}

/// Side-effect free hardware queries.
///
/// Implementations must never panic or fail; any problem resolves to "no
/// accelerator".
pub trait CapabilityProbe: Send + Sync {
    fn probe(&self) -> AcceleratorInfo;

    fn runtime_support(&self) -> RuntimeSupport;
}

/// Probe backed by `nvidia-smi` and a library directory scan.
pub struct SystemProbe {
    nvidia_smi: String,
    timeout: Duration,
    extra_dirs: Vec<PathBuf>,
}

impl SystemProbe {
    pub fn new(nvidia_smi: impl Into<String>, timeout: Duration) -> Self {
        Self {
            nvidia_smi: nvidia_smi.into(),
            timeout,
            extra_dirs: Vec::new(),
        }
    }

    pub fn from_settings(settings: &BackendSettings) -> Self {
        Self::new(
            settings.nvidia_smi.clone(),
            Duration::from_millis(settings.probe_timeout_ms),
        )
        .with_library_dirs(settings.cuda_library_dirs.iter().map(PathBuf::from))
    }

    /// Additional directories searched before the environment-derived ones.
    pub fn with_library_dirs(mut self, dirs: impl IntoIterator<Item = PathBuf>) -> Self {
        self.extra_dirs.extend(dirs);
        self
    }

    fn query_memory(&self) -> Option<f64> {
        if !command_exists(&self.nvidia_smi) {
            tracing::debug!("{} not found, assuming no accelerator", self.nvidia_smi);
            return None;
        }

        let mut command = Command::new(&self.nvidia_smi);
        command.args([
            "--query-gpu=memory.total",
            "--format=csv,noheader,nounits",
        ]);

        let output = match run_with_timeout(command, self.timeout) {
            Ok(output) => output,
            Err(e) => {
                tracing::debug!("Accelerator query failed: {}", e);
                return None;
            }
        };
        if !output.status.success() {
            tracing::debug!("Accelerator query exited with {}", output.status);
            return None;
        }

        parse_memory_gib(&String::from_utf8_lossy(&output.stdout))
    }

    fn candidate_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = self.extra_dirs.clone();

        for var in ["CUDA_PATH", "CUDA_HOME"] {
            if let Some(root) = env::var_os(var) {
                let root = PathBuf::from(root);
                dirs.push(root.join("bin"));
                dirs.push(root.join("lib64"));
                dirs.push(root.join("lib"));
            }
        }

        let search_var = if cfg!(windows) { "PATH" } else { "LD_LIBRARY_PATH" };
        if let Some(paths) = env::var_os(search_var) {
            dirs.extend(env::split_paths(&paths));
        }

        if cfg!(unix) {
            dirs.push(PathBuf::from("/usr/local/cuda/lib64"));
        }

        dirs
    }
}

impl CapabilityProbe for SystemProbe {
    fn probe(&self) -> AcceleratorInfo {
        if devices_hidden(env::var("CUDA_VISIBLE_DEVICES").ok().as_deref()) {
            tracing::debug!("CUDA_VISIBLE_DEVICES hides all accelerators");
            return AcceleratorInfo::none();
        }

        match self.query_memory() {
            Some(memory) => {
                tracing::info!("Accelerator detected with {:.1} GiB", memory);
                AcceleratorInfo::with_memory(memory)
            }
            None => AcceleratorInfo::none(),
        }
    }

    fn runtime_support(&self) -> RuntimeSupport {
        scan_library_dirs(&self.candidate_dirs())
    }
}

/// `CUDA_VISIBLE_DEVICES` set to "" or "-1" disables every device.
pub(crate) fn devices_hidden(value: Option<&str>) -> bool {
    matches!(value.map(str::trim), Some("") | Some("-1"))
}

/// First line of `nvidia-smi` memory output (MiB) converted to GiB.
pub(crate) fn parse_memory_gib(stdout: &str) -> Option<f64> {
    let first = stdout.lines().map(str::trim).find(|line| !line.is_empty())?;
    let mib: f64 = first.parse().ok()?;
    if mib <= 0.0 {
        return None;
    }
    Some(mib / 1024.0)
}

#[derive(Clone, Copy)]
enum Library {
    Runtime,
    Blas,
    Dnn,
}

fn classify(file_name: &str) -> Option<Library> {
    let name = file_name.to_ascii_lowercase();
    let is_library = name.ends_with(".dll") || name.contains(".so");
    if !is_library {
        return None;
    }
    let stem = name.strip_prefix("lib").unwrap_or(&name);
    if stem.starts_with("cudart") {
        Some(Library::Runtime)
    } else if stem.starts_with("cublas") {
        Some(Library::Blas)
    } else if stem.starts_with("cudnn") {
        Some(Library::Dnn)
    } else {
        None
    }
}

/// Look for runtime libraries in each directory, keeping first-seen order.
pub(crate) fn scan_library_dirs(dirs: &[PathBuf]) -> RuntimeSupport {
    let mut support = RuntimeSupport::default();
    let mut seen = BTreeSet::new();

    for dir in dirs {
        if !seen.insert(dir.clone()) || !dir.is_dir() {
            continue;
        }
        let mut found_here = false;
        for library in libraries_in(dir) {
            found_here = true;
            match library {
                Library::Runtime => support.has_runtime = true,
                Library::Blas => support.has_blas = true,
                Library::Dnn => support.has_dnn = true,
            }
        }
        if found_here {
            support.library_dirs.push(dir.clone());
        }
    }

    support
}

fn libraries_in(dir: &Path) -> Vec<Library> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    entries
        .flatten()
        .filter_map(|entry| classify(&entry.file_name().to_string_lossy()))
        .collect()
}
