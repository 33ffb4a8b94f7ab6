//! Append-only store of captured frames with synchronous subscribers.

use super::CapturedFrame;
use log::debug;

type Listener = Box<dyn FnMut(&CapturedFrame, &[CapturedFrame]) + Send>;

/// Handle returned by [`FrameBuffer::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Default)]
pub struct FrameBuffer {
    frames: Vec<CapturedFrame>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_id: u64,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a frame, then call every subscriber with it and the whole sequence
    pub fn add(&mut self, frame: CapturedFrame) {
        self.frames.push(frame);
        let frames = self.frames.as_slice();
        if let Some(latest) = frames.last() {
            for (_, listener) in self.listeners.iter_mut() {
                listener(latest, frames);
            }
        }
    }

    pub fn subscribe(
        &mut self,
        listener: impl FnMut(&CapturedFrame, &[CapturedFrame]) + Send + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns false when the subscription was already removed
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    pub fn latest(&self) -> Option<&CapturedFrame> {
        self.frames.last()
    }

    pub fn frames(&self) -> &[CapturedFrame] {
        &self.frames
    }

    /// Drop every frame. Subscribers are kept and not notified.
    pub fn clear(&mut self) {
        debug!("Clearing {} captured frames", self.frames.len());
        self.frames.clear();
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}
