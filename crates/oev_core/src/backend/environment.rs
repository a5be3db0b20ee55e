//! Runtime environment adjustments for the accelerator path.
//!
//! Nothing here touches the current process environment. Library directories
//! discovered by the probe are recorded once and applied to the commands that
//! spawn inference workers.

use std::env;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Command;

use parking_lot::Mutex;

use super::probe::RuntimeSupport;
use crate::logging::LogSink;

const ALLOCATOR_VAR: &str = "PYTORCH_CUDA_ALLOC_CONF";
const ALLOCATOR_HINT: &str = "expandable_segments:True";

/// Capability to make accelerator libraries discoverable.
pub trait RuntimeEnvironment: Send + Sync {
    /// Record what is needed for the accelerator. Idempotent and infallible.
    fn prepare_accelerator(&self, support: &RuntimeSupport, log: &dyn LogSink);

    /// Apply recorded adjustments to a child command.
    fn apply_to(&self, command: &mut Command);
}

#[derive(Debug, Default)]
struct Prepared {
    library_dirs: Vec<PathBuf>,
}

/// Environment adapter for spawned worker processes.
#[derive(Debug, Default)]
pub struct ProcessEnvironment {
    prepared: Mutex<Option<Prepared>>,
}

impl ProcessEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `prepare_accelerator` has been called.
    pub fn is_prepared(&self) -> bool {
        self.prepared.lock().is_some()
    }

    /// Recorded library directories.
    pub fn library_dirs(&self) -> Vec<PathBuf> {
        self.prepared
            .lock()
            .as_ref()
            .map(|p| p.library_dirs.clone())
            .unwrap_or_default()
    }
}

impl RuntimeEnvironment for ProcessEnvironment {
    fn prepare_accelerator(&self, support: &RuntimeSupport, log: &dyn LogSink) {
        let mut guard = self.prepared.lock();
        let prepared = guard.get_or_insert_with(Prepared::default);

        let mut added = 0;
        for dir in &support.library_dirs {
            if !prepared.library_dirs.contains(dir) {
                prepared.library_dirs.push(dir.clone());
                added += 1;
            }
        }

        if added > 0 {
            log.info(&format!(
                "Accelerator libraries registered from {} director{}",
                added,
                if added == 1 { "y" } else { "ies" }
            ));
        }
    }

    fn apply_to(&self, command: &mut Command) {
        let guard = self.prepared.lock();
        let Some(prepared) = guard.as_ref() else {
            return;
        };

        let search_var = if cfg!(windows) { "PATH" } else { "LD_LIBRARY_PATH" };
        if let Some(joined) = prepend_paths(&prepared.library_dirs, env::var_os(search_var)) {
            command.env(search_var, joined);
        }

        if env::var_os("CUDA_PATH").is_none() {
            if let Some(root) = prepared.library_dirs.first().and_then(|d| d.parent()) {
                command.env("CUDA_PATH", root);
            }
        }

        if env::var_os(ALLOCATOR_VAR).is_none() {
            command.env(ALLOCATOR_VAR, ALLOCATOR_HINT);
        }
    }
}

/// Prepend `dirs` to an existing search path value, skipping duplicates.
fn prepend_paths(dirs: &[PathBuf], existing: Option<OsString>) -> Option<OsString> {
    let current: Vec<PathBuf> = existing
        .as_ref()
        .map(|value| env::split_paths(value).collect())
        .unwrap_or_default();

    let mut merged: Vec<PathBuf> = dirs
        .iter()
        .filter(|dir| !current.contains(dir))
        .cloned()
        .collect();
    if merged.is_empty() {
        return None;
    }
    merged.extend(current);

    match env::join_paths(merged) {
        Ok(joined) => Some(joined),
        Err(e) => {
            tracing::warn!("Cannot extend library search path: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NullSink;

    fn support(dirs: &[&str]) -> RuntimeSupport {
        RuntimeSupport {
            library_dirs: dirs.iter().map(PathBuf::from).collect(),
            has_runtime: true,
            has_blas: true,
            has_dnn: false,
        }
    }

    #[test]
    fn prepare_is_idempotent() {
        let env = ProcessEnvironment::new();
        assert!(!env.is_prepared());

        env.prepare_accelerator(&support(&["/opt/cuda/lib64"]), &NullSink);
        env.prepare_accelerator(&support(&["/opt/cuda/lib64", "/opt/cudnn/lib"]), &NullSink);

        assert_eq!(
            env.library_dirs(),
            vec![PathBuf::from("/opt/cuda/lib64"), PathBuf::from("/opt/cudnn/lib")]
        );
    }

    #[test]
    fn unprepared_environment_leaves_command_alone() {
        let env = ProcessEnvironment::new();
        let mut command = Command::new("worker");
        env.apply_to(&mut command);
        assert_eq!(command.get_envs().count(), 0);
    }

    #[test]
    fn prepared_environment_sets_search_path() {
        let env = ProcessEnvironment::new();
        env.prepare_accelerator(&support(&["/opt/oev-cuda/lib64"]), &NullSink);

        let mut command = Command::new("worker");
        env.apply_to(&mut command);

        let search_var = if cfg!(windows) { "PATH" } else { "LD_LIBRARY_PATH" };
        let value = command
            .get_envs()
            .find(|(key, _)| *key == search_var)
            .and_then(|(_, value)| value)
            .unwrap();
        assert!(value.to_string_lossy().starts_with("/opt/oev-cuda/lib64"));
    }

    #[test]
    fn prepend_skips_existing_entries() {
        let existing = env::join_paths([PathBuf::from("/a")]).unwrap();
        assert!(prepend_paths(&[PathBuf::from("/a")], Some(existing.clone())).is_none());
        let joined = prepend_paths(&[PathBuf::from("/b")], Some(existing)).unwrap();
        let parts: Vec<PathBuf> = env::split_paths(&joined).collect();
        assert_eq!(parts, vec![PathBuf::from("/b"), PathBuf::from("/a")]);
    }
}
