pub mod constants;
pub(crate) mod defaults;
pub mod models;
pub mod utils;

pub use models::*;
pub use utils::*;

use eyre::Result;

pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn user_agent() -> String {
    format!("{}/{}", APP_NAME, VERSION)
}

pub fn version() -> String {
    format!("{} version: {}", APP_NAME, VERSION)
}

#[cfg(not(test))]
static CONFIG: std::sync::OnceLock<Configuration> = std::sync::OnceLock::new();

// Tests run on many threads at once, each one gets its own configuration.
#[cfg(test)]
thread_local! {
    static CONFIG: std::cell::Cell<&'static Configuration> =
        std::cell::Cell::new(Box::leak(Box::new(Configuration::default())));
}

impl Configuration {
    /// The configuration installed by [`Configuration::init`]. Panics when
    /// called before it, the binary installs it right after parsing the
    /// command line.
    #[cfg(not(test))]
    pub fn instance() -> &'static Configuration {
        CONFIG.get().expect("Config not initialized")
    }

    #[cfg(not(test))]
    pub fn init(config: Configuration) -> Result<()> {
        CONFIG
            .set(config)
            .map_err(|_| eyre::eyre!("Config already initialized"))
    }

    #[cfg(test)]
    pub fn instance() -> &'static Configuration {
        CONFIG.with(|config| config.get())
    }

    #[cfg(test)]
    pub fn init(config: Configuration) -> Result<()> {
        CONFIG.with(|slot| slot.set(Box::leak(Box::new(config))));
        Ok(())
    }
}

/// Prints to stderr when `general.verbose` is set.
#[macro_export]
macro_rules! verbose {
    ($($arg:tt)*) => {
        if $crate::config::Configuration::instance().general.verbose {
            eprintln!($($arg)*);
        }
    };
}

pub use verbose;
