#![cfg(target_arch = "wasm32")]
//! Browser tests for the `HtmlAudioElement` player.

use bridge_traits::audio::{
    AudioPlayer, AudioPlayerFactory, AudioResource, PlayerCallbacks, PlayerError,
};
use bridge_wasm::{HtmlAudioPlayer, HtmlAudioPlayerFactory};
use std::cell::Cell;
use std::rc::Rc;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn silent_callbacks() -> PlayerCallbacks {
    PlayerCallbacks::from_fns(|| {}, |_| {})
}

#[wasm_bindgen_test]
async fn controls_before_load_report_not_loaded() {
    let player = HtmlAudioPlayer::new();

    assert_eq!(player.play().await, Err(PlayerError::NotLoaded));
    assert_eq!(player.pause().await, Err(PlayerError::NotLoaded));
    assert_eq!(player.stop().await, Err(PlayerError::NotLoaded));
    assert!(!player.is_playing());
}

#[wasm_bindgen_test]
async fn load_does_not_start_playback() {
    let player = HtmlAudioPlayer::new();
    let resource = AudioResource::new(vec![0u8; 128], "audio/mpeg");

    player.load(resource, silent_callbacks(), 0.8).await.unwrap();
    assert!(!player.is_playing());
    assert_eq!(player.stop().await, Ok(()));

    player.unload().await;
    player.unload().await;
    assert_eq!(player.pause().await, Err(PlayerError::NotLoaded));
}

#[wasm_bindgen_test]
async fn unload_silences_pending_hooks() {
    let finished = Rc::new(Cell::new(0));
    let counter = Rc::clone(&finished);
    let callbacks = PlayerCallbacks::from_fns(move || counter.set(counter.get() + 1), |_| {});

    let player = HtmlAudioPlayerFactory.create();
    player
        .load(AudioResource::new(vec![1u8; 32], "audio/mpeg"), callbacks, 1.0)
        .await
        .unwrap();
    player.unload().await;

    gloo_timers::future::TimeoutFuture::new(50).await;
    assert_eq!(finished.get(), 0);
}

#[wasm_bindgen_test]
fn factory_names_its_backend() {
    assert_eq!(HtmlAudioPlayerFactory.name(), "html-audio");
}
