//! Host-side plumbing for `skilltree-core`.
//!
//! Ready-made port implementations for embedding the engine without a
//! full game host: file- and memory-backed save stores, a map-backed
//! owner context, and buffering message/replication sinks.
pub mod host;
pub mod store;
pub use host::{BufferedMessageBus, CountingReplicationSink, RecordingAbilityHost, SimpleOwner};
pub use store::{FileSaveStore, MemorySaveStore};

/// Installs a global tracing subscriber honoring `RUST_LOG`.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}
