//! Sound card output on rodio
//!
//! rodio's `OutputStream` is `!Send`, so one OS thread owns the stream and
//! every sink. Elements send it commands over `std::sync::mpsc` and mirror
//! their own state, so reads never wait on the audio thread. End of media is
//! detected by polling the sinks.

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc as sync_mpsc;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use tracing::{debug, error, warn};

use super::blob_store::BlobStore;
use crate::ports::outbound::{AudioElementPort, AudioOutputPort, EndedCallback, MediaError};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

type SharedCallback = Arc<dyn Fn() + Send + Sync>;
type Bytes = Arc<[u8]>;

fn decoder(bytes: &Bytes) -> Result<Decoder<Cursor<Bytes>>, MediaError> {
    Decoder::new(Cursor::new(bytes.clone()))
        .map_err(|e| MediaError::PlaybackBlocked(format!("Decode error: {e}")))
}

enum Command {
    Load {
        id: u64,
        bytes: Bytes,
        element: Arc<ElementShared>,
    },
    Play(u64),
    Pause(u64),
    SetVolume(u64, f32),
    Release(u64),
    Shutdown,
}

#[derive(Debug, Clone, Copy)]
struct ElementState {
    volume: f64,
    paused: bool,
    looping: bool,
    cleared: bool,
}

/// State shared between an element handle and the audio thread.
struct ElementShared {
    url: String,
    state: Mutex<ElementState>,
    ended: Mutex<Option<SharedCallback>>,
}

impl ElementShared {
    fn state(&self) -> MutexGuard<'_, ElementState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ended(&self) -> Option<SharedCallback> {
        self.ended
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

pub struct DeviceElement {
    id: u64,
    shared: Arc<ElementShared>,
    /// Why this element can never play, if it cannot
    unplayable: Option<MediaError>,
    cmd_tx: sync_mpsc::Sender<Command>,
}

impl DeviceElement {
    fn new(
        id: u64,
        url: &str,
        unplayable: Option<MediaError>,
        cmd_tx: sync_mpsc::Sender<Command>,
    ) -> Self {
        Self {
            id,
            shared: Arc::new(ElementShared {
                url: url.to_string(),
                state: Mutex::new(ElementState {
                    volume: 0.0,
                    paused: true,
                    looping: false,
                    cleared: false,
                }),
                ended: Mutex::new(None),
            }),
            unplayable,
            cmd_tx,
        }
    }

    fn send(&self, command: Command) -> bool {
        self.cmd_tx.send(command).is_ok()
    }
}

impl AudioElementPort for DeviceElement {
    fn play(&self) -> Result<(), MediaError> {
        let mut state = self.shared.state();
        if state.cleared {
            return Err(MediaError::NoSource);
        }
        if let Some(err) = &self.unplayable {
            return Err(err.clone());
        }
        if !self.send(Command::Play(self.id)) {
            return Err(MediaError::PlaybackBlocked("Audio output closed".into()));
        }
        state.paused = false;
        Ok(())
    }

    fn pause(&self) {
        self.shared.state().paused = true;
        self.send(Command::Pause(self.id));
    }

    fn is_paused(&self) -> bool {
        self.shared.state().paused
    }

    fn volume(&self) -> f64 {
        self.shared.state().volume
    }

    fn set_volume(&self, volume: f64) {
        let volume = if volume.is_finite() {
            volume.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.shared.state().volume = volume;
        self.send(Command::SetVolume(self.id, volume as f32));
    }

    fn set_looping(&self, looping: bool) {
        self.shared.state().looping = looping;
    }

    fn is_looping(&self) -> bool {
        self.shared.state().looping
    }

    fn clear_source(&self) {
        {
            let mut state = self.shared.state();
            state.cleared = true;
            state.paused = true;
        }
        self.send(Command::Release(self.id));
    }

    fn on_ended(&self, callback: EndedCallback) {
        *self
            .shared
            .ended
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::from(callback));
    }
}

impl Drop for DeviceElement {
    fn drop(&mut self) {
        self.send(Command::Release(self.id));
    }
}

/// Plays object URLs from a [`BlobStore`] on the default output device.
pub struct DeviceAudioOutput {
    blobs: Arc<BlobStore>,
    cmd_tx: sync_mpsc::Sender<Command>,
    next_id: AtomicU64,
}

impl DeviceAudioOutput {
    /// Open the default output device on a dedicated thread.
    pub fn open(blobs: Arc<BlobStore>) -> Result<Self, MediaError> {
        let (cmd_tx, cmd_rx) = sync_mpsc::channel();
        let (ready_tx, ready_rx) = sync_mpsc::sync_channel(1);

        std::thread::Builder::new()
            .name("audio-output".into())
            .spawn(move || audio_thread(cmd_rx, ready_tx))
            .map_err(|e| MediaError::PlaybackBlocked(format!("Audio thread: {e}")))?;

        ready_rx
            .recv()
            .map_err(|_| MediaError::PlaybackBlocked("Audio thread exited".into()))??;

        Ok(Self {
            blobs,
            cmd_tx,
            next_id: AtomicU64::new(0),
        })
    }
}

impl AudioOutputPort for DeviceAudioOutput {
    fn create_element(&self, url: &str) -> Arc<dyn AudioElementPort> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let bytes: Option<Bytes> = self.blobs.get(url).map(Bytes::from);

        let unplayable = match &bytes {
            None => Some(MediaError::NoSource),
            Some(bytes) => decoder(bytes).err(),
        };
        if let Some(err) = &unplayable {
            warn!(url, error = %err, "Audio element cannot play");
        }

        let element = DeviceElement::new(id, url, unplayable, self.cmd_tx.clone());
        if let (Some(bytes), None) = (bytes, &element.unplayable) {
            element.send(Command::Load {
                id,
                bytes,
                element: element.shared.clone(),
            });
        }
        Arc::new(element)
    }
}

impl Drop for DeviceAudioOutput {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(Command::Shutdown);
    }
}

// ============================================================================
// Audio thread
// ============================================================================

struct Track {
    sink: Sink,
    bytes: Bytes,
    element: Arc<ElementShared>,
    playing: bool,
}

#[derive(Default)]
struct Tracks(HashMap<u64, Track>);

impl Tracks {
    fn load(
        &mut self,
        handle: &OutputStreamHandle,
        id: u64,
        bytes: Bytes,
        element: Arc<ElementShared>,
    ) {
        let sink = match Sink::try_new(handle) {
            Ok(sink) => sink,
            Err(e) => {
                error!(url = %element.url, error = %e, "Failed to open audio sink");
                return;
            }
        };
        sink.pause();
        sink.set_volume(element.state().volume as f32);
        match decoder(&bytes) {
            Ok(source) => sink.append(source),
            Err(e) => {
                warn!(url = %element.url, error = %e, "Audio decode failed");
                return;
            }
        }
        self.0.insert(
            id,
            Track {
                sink,
                bytes,
                element,
                playing: false,
            },
        );
    }

    fn apply(&mut self, command: Command) {
        match command {
            Command::Play(id) => {
                if let Some(track) = self.0.get_mut(&id) {
                    track.sink.play();
                    track.playing = true;
                }
            }
            Command::Pause(id) => {
                if let Some(track) = self.0.get_mut(&id) {
                    track.sink.pause();
                    track.playing = false;
                }
            }
            Command::SetVolume(id, volume) => {
                if let Some(track) = self.0.get(&id) {
                    track.sink.set_volume(volume);
                }
            }
            Command::Release(id) => {
                if let Some(track) = self.0.remove(&id) {
                    track.sink.stop();
                }
            }
            Command::Load { .. } | Command::Shutdown => {}
        }
    }

    /// Restart drained looping tracks; collect end callbacks of the others.
    fn finish_drained(&mut self) -> Vec<SharedCallback> {
        let mut finished = Vec::new();
        for track in self.0.values_mut() {
            if !track.playing || !track.sink.empty() {
                continue;
            }
            if track.element.state().looping {
                match decoder(&track.bytes) {
                    Ok(source) => {
                        track.sink.append(source);
                        continue;
                    }
                    Err(e) => {
                        warn!(url = %track.element.url, error = %e, "Audio loop restart failed");
                    }
                }
            }
            track.playing = false;
            track.element.state().paused = true;
            debug!(url = %track.element.url, "Audio element ended");
            finished.extend(track.element.ended());
        }
        finished
    }

    fn stop_all(&mut self) {
        for (_, track) in self.0.drain() {
            track.sink.stop();
        }
    }
}

fn audio_thread(
    cmd_rx: sync_mpsc::Receiver<Command>,
    ready_tx: sync_mpsc::SyncSender<Result<(), MediaError>>,
) {
    let (_stream, handle) = match OutputStream::try_default() {
        Ok(output) => {
            let _ = ready_tx.send(Ok(()));
            output
        }
        Err(e) => {
            error!(error = %e, "Failed to open audio output");
            let _ = ready_tx.send(Err(MediaError::PlaybackBlocked(format!(
                "Audio output: {e}"
            ))));
            return;
        }
    };

    let mut tracks = Tracks::default();
    loop {
        match cmd_rx.recv_timeout(POLL_INTERVAL) {
            Ok(Command::Load { id, bytes, element }) => tracks.load(&handle, id, bytes, element),
            Ok(Command::Shutdown) | Err(sync_mpsc::RecvTimeoutError::Disconnected) => {
                tracks.stop_all();
                return;
            }
            Ok(command) => tracks.apply(command),
            Err(sync_mpsc::RecvTimeoutError::Timeout) => {}
        }

        for callback in tracks.finish_drained() {
            callback();
        }
    }
}
