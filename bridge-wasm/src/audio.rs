//! `HtmlAudioElement` implementation of the audio player bridge.
//!
//! Each load wraps the synthesized bytes in a `Blob`, points a fresh audio
//! element at its object URL and listens for `ended` and `error`. `unload`
//! detaches the listeners and revokes the URL so the blob can be collected.

use crate::error::WasmError;
use async_trait::async_trait;
use bridge_traits::audio::{
    AudioPlayer, AudioPlayerFactory, AudioResource, CallbackSlot, PlayerCallbacks, PlayerError,
    PlayerResult,
};
use js_sys::{Array, Uint8Array};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use tracing::debug;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Blob, BlobPropertyBag, Event, HtmlAudioElement, Url};

/// Element and listeners of the current load.
struct Loaded {
    element: HtmlAudioElement,
    url: String,
    on_ended: Closure<dyn FnMut()>,
    on_error: Closure<dyn FnMut(Event)>,
}

impl Loaded {
    fn release(self) {
        let _ = self
            .element
            .remove_event_listener_with_callback("ended", self.on_ended.as_ref().unchecked_ref());
        let _ = self
            .element
            .remove_event_listener_with_callback("error", self.on_error.as_ref().unchecked_ref());
        let _ = self.element.pause();
        let _ = self.element.remove_attribute("src");
        self.element.load();
        let _ = Url::revoke_object_url(&self.url);
    }
}

/// Browser audio player for one synthesized chunk at a time.
pub struct HtmlAudioPlayer {
    slot: Rc<CallbackSlot>,
    loaded: RefCell<Option<Loaded>>,
}

impl HtmlAudioPlayer {
    /// Create an unloaded player.
    pub fn new() -> Self {
        Self {
            slot: Rc::new(CallbackSlot::new()),
            loaded: RefCell::new(None),
        }
    }

    fn element(&self) -> PlayerResult<HtmlAudioElement> {
        self.loaded
            .borrow()
            .as_ref()
            .map(|loaded| loaded.element.clone())
            .ok_or(PlayerError::NotLoaded)
    }
}

impl Default for HtmlAudioPlayer {
    fn default() -> Self {
        Self::new()
    }
}

fn object_url(resource: &AudioResource) -> Result<String, WasmError> {
    let bytes = Uint8Array::from(resource.data.as_ref());
    let parts = Array::of1(&bytes);
    let options = BlobPropertyBag::new();
    options.set_type(&resource.mime_type);
    let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &options)?;
    Ok(Url::create_object_url_with_blob(&blob)?)
}

fn media_error_message(element: &HtmlAudioElement) -> String {
    match element.error() {
        Some(error) if !error.message().is_empty() => {
            format!("media error {}: {}", error.code(), error.message())
        }
        Some(error) => format!("media error {}", error.code()),
        None => "unknown media error".to_string(),
    }
}

#[async_trait(?Send)]
impl AudioPlayer for HtmlAudioPlayer {
    async fn load(
        &self,
        resource: AudioResource,
        callbacks: PlayerCallbacks,
        volume: f32,
    ) -> PlayerResult<()> {
        if let Some(previous) = self.loaded.borrow_mut().take() {
            previous.release();
        }

        let url = object_url(&resource).map_err(|e| PlayerError::LoadFailed(e.to_string()))?;
        let element = match HtmlAudioElement::new_with_src(&url) {
            Ok(element) => element,
            Err(e) => {
                let _ = Url::revoke_object_url(&url);
                return Err(PlayerError::LoadFailed(WasmError::from(e).to_string()));
            }
        };
        element.set_preload("auto");
        element.set_volume(f64::from(volume.clamp(0.0, 1.0)));

        self.slot.arm(callbacks);

        let on_ended = {
            let slot = Rc::clone(&self.slot);
            Closure::wrap(Box::new(move || {
                slot.fire_finish();
            }) as Box<dyn FnMut()>)
        };
        let on_error = {
            let slot = Rc::clone(&self.slot);
            let target = element.clone();
            Closure::wrap(Box::new(move |_event: Event| {
                slot.fire_error(PlayerError::PlaybackFailed(media_error_message(&target)));
            }) as Box<dyn FnMut(Event)>)
        };
        let _ = element
            .add_event_listener_with_callback("ended", on_ended.as_ref().unchecked_ref());
        let _ = element
            .add_event_listener_with_callback("error", on_error.as_ref().unchecked_ref());

        debug!(bytes = resource.len(), mime = %resource.mime_type, "Audio element ready");
        *self.loaded.borrow_mut() = Some(Loaded {
            element,
            url,
            on_ended,
            on_error,
        });
        Ok(())
    }

    async fn play(&self) -> PlayerResult<()> {
        let element = self.element()?;
        let promise = element
            .play()
            .map_err(|e| PlayerError::PlaybackFailed(WasmError::from(e).to_string()))?;

        match JsFuture::from(promise).await {
            Ok(_) => Ok(()),
            Err(e) => {
                let error = WasmError::from(e);
                if error.is_not_allowed() {
                    Err(PlayerError::PermissionDenied(error.to_string()))
                } else {
                    Err(PlayerError::PlaybackFailed(error.to_string()))
                }
            }
        }
    }

    async fn pause(&self) -> PlayerResult<()> {
        self.element()?
            .pause()
            .map_err(|e| PlayerError::PlaybackFailed(WasmError::from(e).to_string()))
    }

    async fn stop(&self) -> PlayerResult<()> {
        let element = self.element()?;
        element
            .pause()
            .map_err(|e| PlayerError::PlaybackFailed(WasmError::from(e).to_string()))?;
        element.set_current_time(0.0);
        Ok(())
    }

    async fn unload(&self) {
        self.slot.disarm();
        if let Some(loaded) = self.loaded.borrow_mut().take() {
            loaded.release();
        }
    }

    fn is_playing(&self) -> bool {
        self.loaded
            .borrow()
            .as_ref()
            .is_some_and(|loaded| !loaded.element.paused() && !loaded.element.ended())
    }
}

/// Creates [`HtmlAudioPlayer`]s.
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlAudioPlayerFactory;

impl AudioPlayerFactory for HtmlAudioPlayerFactory {
    fn name(&self) -> &'static str {
        "html-audio"
    }

    fn create(&self) -> Arc<dyn AudioPlayer> {
        Arc::new(HtmlAudioPlayer::new())
    }
}
