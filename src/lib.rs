// ==================== Imports ====================
use wasm_bindgen::prelude::*;

#[macro_use]
pub mod browser;
pub mod engine;
pub mod game;
pub mod settings;
pub mod world;

use crate::engine::GameLoop;
use crate::game::ZombieShooter;

// ==================== Main Functions ====================
/// Main entry for Webassembly module
/// - routes panics to the console
/// - loads settings and sprite
/// - starts the frame loop
#[wasm_bindgen]
pub fn main_js() -> Result<(), JsValue> {
    // setup better panic messages for debugging
    console_error_panic_hook::set_once();

    // wasm has no blocking, the loop starts once loading resolves
    browser::spawn_local(async move {
        let game = ZombieShooter::new();
        if let Err(err) = GameLoop::start(game).await {
            error!("Could not start game : {:#?}", err);
        }
    });

    Ok(())
}
