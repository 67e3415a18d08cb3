use std::error::Error;
use std::sync::Arc;

use pixielity::prelude::*;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let app = Application::new();
    app.instance(key::named::<str>("app.name"), Arc::from("playground"));
    app.singleton(
        key::of::<dyn Logger>(),
        Some(Concrete::upcast(key::of::<ConsoleLogger>(), |logger| logger)),
    );

    app.booting("banner", |container: &Container| {
        let logger = container.make(key::of::<dyn Logger>())?;
        logger.log(&format!(
            "Pixielity Enterprise Application [v{VERSION}] Booted from Playground!"
        ));
        Ok::<_, ContainerError>(())
    });
    app.boot()?;

    let service = app.make(key::of::<Service>())?;
    service.execute();
    Ok(())
}

trait Logger: Send + Sync {
    fn log(&self, message: &str);
}

struct ConsoleLogger {
    app_name: Arc<str>,
}

#[injectable]
impl ConsoleLogger {
    #[inject]
    fn new(#[named("app.name")] app_name: Arc<str>) -> Self {
        Self { app_name }
    }
}

impl Logger for ConsoleLogger {
    fn log(&self, message: &str) {
        println!("[{}] {}", self.app_name, message);
    }
}

struct Service {
    logger: Arc<dyn Logger>,
}

#[injectable]
impl Service {
    #[inject]
    fn new(logger: Arc<dyn Logger>) -> Self {
        Self { logger }
    }

    fn execute(&self) {
        self.logger.log("PackageA Enterprise Action Executed");
    }
}
