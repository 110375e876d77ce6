mod app;
mod config;
mod load;
mod platform;
mod playback;
mod schedule;
mod sprite;
mod tray;

fn main() {
    env_logger::init();
    log::info!("run-neko starting up");

    if let Err(e) = app::run() {
        log::error!("Fatal error: {e}");
        std::process::exit(1);
    }
}
