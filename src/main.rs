mod app;
mod config;
mod ecs;
mod error;
mod geometry;
mod hunger;
mod pet;
mod settings;
mod sim;
mod species;
mod store;
mod util;

fn main() {
    env_logger::init();
    log::info!("PetToy starting up");

    let config = config::AppConfig::load_or_default();
    if let Err(e) = app::run(config) {
        log::error!("Fatal error: {e}");
        std::process::exit(1);
    }
}
