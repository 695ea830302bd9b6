//! Player state management for mediacore
//!
//! The two state enumerations an engine reports, and a tracker that applies
//! their transition rules and notifies clients about every change.

use crate::player::client::Client;
use crate::utils::error::{MediaError, Result};
use log::{debug, warn};
use std::fmt;

/// How much playable data is available around the playhead
///
/// Ordered: `state >= HaveFutureData` reads as "at least that much data".
#[repr(i8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VideoReadyState {
    /// No content attached
    NotAttached = -1,

    /// Content attached, nothing known yet
    HaveNothing = 0,

    /// Duration and tracks are known
    HaveMetadata = 1,

    /// The frame at the playhead is available
    HaveCurrentData = 2,

    /// Enough data to advance the playhead a little
    HaveFutureData = 3,

    /// Enough data to play through without stalling
    HaveEnoughData = 4,
}

impl VideoReadyState {
    pub fn as_i8(self) -> i8 {
        self as i8
    }
}

impl TryFrom<i8> for VideoReadyState {
    type Error = MediaError;

    fn try_from(value: i8) -> Result<Self> {
        match value {
            -1 => Ok(Self::NotAttached),
            0 => Ok(Self::HaveNothing),
            1 => Ok(Self::HaveMetadata),
            2 => Ok(Self::HaveCurrentData),
            3 => Ok(Self::HaveFutureData),
            4 => Ok(Self::HaveEnoughData),
            other => Err(MediaError::invalid_input(format!("ready state {}", other))),
        }
    }
}

impl fmt::Display for VideoReadyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Why, or whether, the playhead is moving
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VideoPlaybackState {
    /// No content attached
    Detached,

    /// Content attached; waiting for the first frame
    Initializing,

    Paused,

    /// Waiting for data at a new playhead position
    Seeking,

    /// Playing, but out of buffered data
    Buffering,

    /// Playing, but a frame's decryption key is missing
    WaitingForKey,

    Playing,

    /// The playhead reached the duration
    Ended,

    /// Unrecoverable failure; only detaching leaves this state
    Errored,
}

impl VideoPlaybackState {
    /// Whether moving from `self` to `next` is a legal transition
    ///
    /// Staying in the same state is not a transition.
    pub fn can_transition_to(self, next: VideoPlaybackState) -> bool {
        use VideoPlaybackState::*;

        if self == next {
            return false;
        }

        match (self, next) {
            (_, Detached) => true,
            (Detached, Initializing) => true,
            (Detached, _) => false,
            (Errored, _) => false,
            (_, Errored) => true,
            (_, Initializing) => false,
            (Initializing, Paused | Playing) => true,
            (Initializing, _) => false,
            (WaitingForKey, Ended) => false,
            _ => true,
        }
    }

    pub fn is_attached(self) -> bool {
        self != VideoPlaybackState::Detached
    }
}

impl fmt::Display for VideoPlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Current ready state, playback state and rate of one engine
///
/// Every successful change is reported to the given client before the
/// method returns.
#[derive(Debug, Clone)]
pub struct StateTracker {
    ready: VideoReadyState,
    playback: VideoPlaybackState,
    rate: f64,
}

impl StateTracker {
    pub fn new(rate: f64) -> Self {
        Self {
            ready: VideoReadyState::NotAttached,
            playback: VideoPlaybackState::Detached,
            rate,
        }
    }

    pub fn ready(&self) -> VideoReadyState {
        self.ready
    }

    pub fn playback(&self) -> VideoPlaybackState {
        self.playback
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Move the ready state forward to `target`
    ///
    /// Returns `false` without notifying if `target` is not ahead of the
    /// current state.
    pub fn advance_ready_state(&mut self, target: VideoReadyState, client: &dyn Client) -> bool {
        if target <= self.ready {
            return false;
        }
        self.reset_ready_state(target, client);
        true
    }

    /// Set the ready state in either direction, for a new load or a detach
    pub fn reset_ready_state(&mut self, target: VideoReadyState, client: &dyn Client) {
        if target == self.ready {
            return;
        }

        let old = std::mem::replace(&mut self.ready, target);
        debug!("Ready state {} -> {}", old, target);
        client.on_ready_state_changed(old, target);
    }

    /// Check a playback transition without applying it
    pub fn check_transition(&self, next: VideoPlaybackState) -> Result<()> {
        if self.playback.can_transition_to(next) {
            Ok(())
        } else {
            Err(MediaError::InvalidState(format!("{} -> {}", self.playback, next)))
        }
    }

    /// Apply a playback transition
    ///
    /// Illegal transitions are logged and ignored. Returns whether the state
    /// changed.
    pub fn set_playback_state(&mut self, next: VideoPlaybackState, client: &dyn Client) -> bool {
        if next == self.playback {
            return false;
        }
        if let Err(e) = self.check_transition(next) {
            warn!("Ignoring playback transition: {}", e);
            return false;
        }

        let old = std::mem::replace(&mut self.playback, next);
        debug!("Playback state {} -> {}", old, next);
        client.on_playback_state_changed(old, next);
        true
    }

    /// Change the playback rate, notifying if it differs
    pub fn set_rate(&mut self, rate: f64, client: &dyn Client) -> bool {
        if rate == self.rate {
            return false;
        }

        let old = std::mem::replace(&mut self.rate, rate);
        debug!("Playback rate {} -> {}", old, rate);
        client.on_playback_rate_changed(old, rate);
        true
    }

    /// Change the rate without notifying anyone
    pub(crate) fn reset_rate(&mut self, rate: f64) {
        self.rate = rate;
    }
}
