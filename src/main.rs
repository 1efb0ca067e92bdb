//! Redron - an edge redirect dispatcher for publisher ad traffic
//!
//! Runs as a single HTTP server process. The entry point loads the
//! configuration, initializes logging and hands off to the runtime.

use color_eyre::Result;
use dotenv::dotenv;

use redron::config;
use redron::runtime;
use redron::system::logging;

#[actix_web::main]
async fn main() -> Result<(), color_eyre::Report> {
    // Setup global error handling
    color_eyre::install()?;

    // Load environment variables
    dotenv().ok();

    // Initialize configuration system
    config::init_config();
    let config = config::get_config();

    // Initialize logging (guard must stay alive for the process lifetime)
    let _logging = logging::init_logging(config);

    runtime::run_server(config)
        .await
        .map_err(|e| color_eyre::eyre::eyre!(e.to_string()))?;

    Ok(())
}
