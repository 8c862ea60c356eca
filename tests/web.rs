//! Browser smoke tests, run with `wasm-pack test --headless --firefox`
#![cfg(target_arch = "wasm32")]

use wasm_bindgen_test::*;
use zombie_flashlight::browser;
use zombie_flashlight::engine;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn performance_clock_moves_forward() {
    let first = browser::now().unwrap();
    let second = browser::now().unwrap();
    assert!(second >= first);
}

#[wasm_bindgen_test]
fn image_element_can_be_created() {
    assert!(browser::create_html_image_element().is_ok());
}

#[wasm_bindgen_test]
fn missing_canvas_is_an_error() {
    assert!(browser::canvas().is_err());
}

#[wasm_bindgen_test]
async fn missing_image_is_an_error() {
    assert!(engine::load_image("does-not-exist.png").await.is_err());
}

#[wasm_bindgen_test]
async fn missing_settings_file_is_an_error() {
    let settings =
        browser::fetch_json::<zombie_flashlight::settings::Settings>("does-not-exist.json").await;
    assert!(settings.is_err());
}

#[wasm_bindgen_test]
async fn default_sprite_loads() {
    let sprite = zombie_flashlight::settings::Settings::default().sprite;
    let image = engine::load_image(&sprite).await.unwrap();
    assert!(image.natural_width() > 0);
}
