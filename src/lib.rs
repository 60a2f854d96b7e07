//! gconvert - guarded marshalling between a scripting runtime's values and
//! native C buffers
//!
//! Every conversion into native memory follows one protocol: allocate,
//! fill element by element, then either hand the buffer over or release it
//! before the error propagates. Strings and filenames go through the same
//! protocol with charset transcoding on top.
//!
//! Startup is explicit: `init` (or `init_with_config`) sets up logging and
//! resolves the filename charset once, producing the process-wide
//! `Marshaller`. Everything else takes that context by reference.

pub mod config;
pub mod error;
pub mod logging;
pub mod marshal;
pub mod native;
pub mod options;
pub mod transcode;
pub mod value;

// Re-export commonly used items
pub use config::{Config, ConfigError};
pub use error::{ErrorKind, MarshalError, Result};
pub use marshal::{FromValue, IntoValue, Marshaller, Strv};
pub use native::{
    GBoolean, NativeAllocator, NativeBuffer, NativeStr, OwnedCStr, StringList, SystemAllocator,
    TrackingAllocator,
};
pub use options::{extract_options, scan_options, OptionSlot};
pub use transcode::{Charset, FilenameCodec};
pub use value::{Array, Hash, RString, Value};

use once_cell::sync::OnceCell;

/// Process-wide conversion context, written once at startup
static MARSHALLER: OnceCell<Marshaller> = OnceCell::new();

/// Initialize with `.gconvert.toml` (if any) and the environment
pub fn init() -> &'static Marshaller {
    MARSHALLER.get_or_init(|| startup(&Config::discover(), "discovered"))
}

/// Initialize with an explicit configuration
///
/// Only the first initialization takes effect; later calls return the
/// context already in place.
pub fn init_with_config(config: &Config) -> &'static Marshaller {
    MARSHALLER.get_or_init(|| startup(config, "explicit"))
}

/// The process-wide context, initializing with defaults if startup was skipped
pub fn marshaller() -> &'static Marshaller {
    MARSHALLER.get_or_init(|| startup(&Config::default(), "default"))
}

fn startup(config: &Config, source: &str) -> Marshaller {
    logging::init_with_config(logging::LogConfig::from(&config.logging).with_env());
    let _perf = logging::perf::track("gconvert_init");
    logging::log_init(source);
    Marshaller::new(config.filename_codec())
}

/// Library initialization for native hosts
#[no_mangle]
pub extern "C" fn gconvert_init() {
    init();
}
