//! Audio boost registry
//!
//! Four independent signed gain offsets (headphones, headset, speaker, mic)
//! consumed by an external audio driver. Values are clamped to the channel
//! limits at write time; reads never fail.
//!
//! The four channels carry no cross-channel invariant and are advisory
//! tunables, so they use plain relaxed atomics with no coordination —
//! concurrent writers race last-writer-wins.

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

use tracing::{debug, info};

use crate::attr::{Attr, AttrGroup};

/// Boost offset limits, symmetric for every channel
pub const BOOST_MIN: i32 = -20;
pub const BOOST_MAX: i32 = 20;

/// One boost channel: a clamped signed offset
///
/// Invariant: `min <= value <= max` after every write.
pub struct BoostChannel {
    name: &'static str,
    value: AtomicI32,
    min: i32,
    max: i32,
}

impl BoostChannel {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            value: AtomicI32::new(0),
            min: BOOST_MIN,
            max: BOOST_MAX,
        }
    }

    /// Current offset. No side effects.
    pub fn get(&self) -> i32 {
        self.value.load(Ordering::Relaxed)
    }

    /// Request a new offset.
    ///
    /// Equal-to-current requests are a complete no-op (no log). Anything
    /// else is routed through the clamp: at-or-beyond a limit lands on the
    /// limit (inclusive comparison, so a request exactly at the boundary is
    /// accepted unchanged).
    pub fn set(&self, requested: i32) {
        if requested == self.get() {
            return;
        }

        let new_val = if requested <= self.min {
            self.min
        } else if requested >= self.max {
            self.max
        } else {
            requested
        };

        info!("New {}: {}", self.name, new_val);
        self.value.store(new_val, Ordering::Relaxed);
    }

    /// Parse raw attribute input and apply it.
    ///
    /// Malformed text leaves the value unchanged; the only trace is a
    /// diagnostic log line.
    fn store(&self, input: &str) {
        match input.trim().parse::<i32>() {
            Ok(requested) => self.set(requested),
            Err(_) => debug!("{}: unparseable input, ignored", self.name),
        }
    }
}

/// The four boost channels, created once at startup
pub struct BoostRegistry {
    pub headphones: BoostChannel,
    pub headset: BoostChannel,
    pub speaker: BoostChannel,
    pub mic: BoostChannel,
}

impl BoostRegistry {
    pub fn new() -> Self {
        Self {
            headphones: BoostChannel::new("headphones_boost"),
            headset: BoostChannel::new("headset_boost"),
            speaker: BoostChannel::new("speaker_boost"),
            mic: BoostChannel::new("mic_boost"),
        }
    }

    /// Build the `soundcontrol` attribute group.
    ///
    /// Attr names match the historical surface: the headphones channel is
    /// published as `volume_boost`, the rest under their own names. All are
    /// read-write, format `%d\n`.
    pub fn attr_group(self: &Arc<Self>) -> AttrGroup {
        fn boost_attr(
            name: &'static str,
            registry: &Arc<BoostRegistry>,
            channel: fn(&BoostRegistry) -> &BoostChannel,
        ) -> Attr {
            let show_reg = Arc::clone(registry);
            let store_reg = Arc::clone(registry);
            Attr::read_write(
                name,
                move || format!("{}\n", channel(&show_reg).get()),
                move |input| channel(&store_reg).store(input),
            )
        }

        AttrGroup::new(
            "soundcontrol",
            vec![
                boost_attr("volume_boost", self, |r| &r.headphones),
                boost_attr("headset_boost", self, |r| &r.headset),
                boost_attr("speaker_boost", self, |r| &r.speaker),
                boost_attr("mic_boost", self, |r| &r.mic),
            ],
        )
    }

    #[cfg(test)]
    fn channels(&self) -> [&BoostChannel; 4] {
        [&self.headphones, &self.headset, &self.speaker, &self.mic]
    }
}

impl Default for BoostRegistry {
    fn default() -> Self {
        Self::new()
    }
}
