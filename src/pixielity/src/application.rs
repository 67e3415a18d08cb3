//! The application: a container with a one-shot boot lifecycle.

use std::error::Error;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::ops::Deref;

use parking_lot::Mutex;
use snafu::prelude::*;
use tracing::{debug, info, warn};

use crate::container::Container;

/// The framework version.
pub const VERSION: &str = "1.0.0-dev";

type BootResult = Result<(), Box<dyn Error + Send + Sync>>;

type BootHook = Box<dyn Fn(&Container) -> BootResult + Send + Sync>;

#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum ApplicationError {
    #[snafu(display("could not boot the application: hook `{hook}` failed"))]
    #[non_exhaustive]
    BootFailure {
        hook: String,
        source: Box<dyn Error + Send + Sync>,
    },
}

/// A [`Container`] that boots once.
///
/// The application dereferences to its container, so bindings are
/// registered and resolved on it directly.
pub struct Application {
    container: Container,
    state: Mutex<BootState>,
}

struct BootState {
    booted: bool,
    hooks: Vec<(String, BootHook)>,
}

impl Application {
    pub fn new() -> Self {
        Self {
            container: Container::new(),
            state: Mutex::new(BootState {
                booted: false,
                hooks: Vec::new(),
            }),
        }
    }

    /// Registers a hook run by [`Application::boot`], after the hooks
    /// registered before it.
    ///
    /// Hooks are run while the application is locked for booting and must not
    /// call back into the application itself; they are given its container
    /// instead.
    pub fn booting<F, E>(&self, name: impl Into<String>, hook: F)
    where
        F: Fn(&Container) -> Result<(), E> + Send + Sync + 'static,
        E: Into<Box<dyn Error + Send + Sync>>,
    {
        let name = name.into();
        let mut state = self.state.lock();
        if state.booted {
            warn!(hook = %name, "boot hook registered after the application booted, it will not run");
        }
        let hook: BootHook = Box::new(move |container: &Container| -> BootResult {
            hook(container).map_err(Into::into)
        });
        state.hooks.push((name, hook));
    }

    /// Boots the application by running every boot hook in registration
    /// order.
    ///
    /// Booting an application that already booted does nothing. If a hook
    /// fails, the application stays unbooted and a later call runs every
    /// hook again.
    pub fn boot(&self) -> Result<(), ApplicationError> {
        let mut state = self.state.lock();
        if state.booted {
            debug!("application already booted");
            return Ok(());
        }

        for (name, hook) in &state.hooks {
            debug!(hook = %name, "running boot hook");
            hook(&self.container).context(BootFailureSnafu { hook: name.as_str() })?;
        }

        state.booted = true;
        info!(version = VERSION, hooks = state.hooks.len(), "application booted");
        Ok(())
    }

    pub fn is_booted(&self) -> bool {
        self.state.lock().booted
    }

    pub fn version(&self) -> &'static str {
        VERSION
    }

    pub fn container(&self) -> &Container {
        &self.container
    }
}

impl Deref for Application {
    type Target = Container;

    fn deref(&self) -> &Self::Target {
        &self.container
    }
}

impl Debug for Application {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let state = self.state.lock();
        f.debug_struct("Application")
            .field("version", &VERSION)
            .field("booted", &state.booted)
            .field("hooks", &state.hooks.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use crate::key;

    use super::*;

    #[test]
    fn application_version_succeeds() {
        let app = Application::new();

        assert_eq!(app.version(), "1.0.0-dev");
        assert_eq!(app.version(), VERSION);
    }

    #[test]
    fn application_boot_is_idempotent() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        let app = Application::new();
        app.booting("count", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, Infallible>(())
        });

        assert!(!app.is_booted());
        app.boot().unwrap();
        assert!(app.is_booted());
        app.boot().unwrap();
        assert!(app.is_booted());
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn application_boot_runs_hooks_in_registration_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let app = Application::new();
        for name in ["config", "database", "routes"] {
            let order = Arc::clone(&order);
            app.booting(name, move |_| {
                order.lock().push(name);
                Ok::<_, Infallible>(())
            });
        }

        app.boot().unwrap();
        assert_eq!(*order.lock(), ["config", "database", "routes"]);
    }

    #[test]
    fn application_boot_fails_when_hook_fails() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);
        let app = Application::new();
        app.booting("database", move |_| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err("connection refused")
            } else {
                Ok(())
            }
        });

        let Err(ApplicationError::BootFailure { hook, source }) = app.boot() else {
            panic!("the first boot should fail");
        };
        assert_eq!(hook, "database");
        assert_eq!(source.to_string(), "connection refused");
        assert!(!app.is_booted());

        app.boot().unwrap();
        assert!(app.is_booted());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn application_dereferences_to_its_container() {
        let app = Application::new();
        app.instance(key::named::<str>("app.name"), Arc::from("pixielity"));
        app.booting("check", |container: &Container| {
            container.get(key::named::<str>("app.name")).map(|_| ())
        });

        assert!(app.has(key::named::<str>("app.name")));
        app.boot().unwrap();
        assert!(app.container().has(key::named::<str>("app.name")));
    }
}
