//! Shared fixture loading for integration tests

use std::path::{Path, PathBuf};
use trackside::{MemoryLoader, Result};

pub fn test_data_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("test-data")
}

/// Loader over the saved streams of `test-data/sessions/<subject_key>/`.
pub fn load_session(subject_key: &str) -> Result<MemoryLoader> {
    MemoryLoader::from_session_dir(subject_key, test_data_dir().join("sessions").join(subject_key))
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_env_filter("trackside=debug").with_test_writer().try_init();
}
