//! Bridge to the external inference worker.
//!
//! Model weights and ML runtimes live in a separate process that speaks
//! newline-delimited JSON on stdin/stdout. Each loaded model owns its own
//! worker; dropping the handle shuts the worker down.

mod models;
mod process;
mod protocol;

pub use models::{
    WorkerSpeechInitializer, WorkerSpeechModel, WorkerTranslationInitializer,
    WorkerTranslationModel,
};
pub use process::{WorkerCommand, WorkerError, WorkerProcess, WorkerResult};
pub use protocol::{WorkerRequest, WorkerResponse};
