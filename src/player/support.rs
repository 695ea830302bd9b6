//! Which engine answers capability queries before a specific one is chosen

use crate::media::{MediaCapabilitiesInfo, MediaDecodingConfiguration};
use crate::player::MediaPlayer;
use crate::utils::ObserverSet;
use log::debug;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::sync::{Arc, Weak};

static GLOBAL: Lazy<SupportChecks> = Lazy::new(SupportChecks::new);

/// Registry of engines that can answer support checks
///
/// Holds an optional explicit choice plus every registered live engine, all
/// weakly. Queries go to the explicit choice while it is alive, otherwise
/// to the first live engine.
pub struct SupportChecks {
    chosen: RwLock<Option<Weak<dyn MediaPlayer>>>,
    live: ObserverSet<dyn MediaPlayer>,
}

impl SupportChecks {
    pub fn new() -> Self {
        Self {
            chosen: RwLock::new(None),
            live: ObserverSet::new(),
        }
    }

    /// The process-wide registry
    pub fn global() -> &'static SupportChecks {
        &GLOBAL
    }

    /// Choose the engine for support checks, or clear the choice with `None`
    pub fn set_player(&self, player: Option<&Arc<dyn MediaPlayer>>) {
        *self.chosen.write() = player.map(Arc::downgrade);
    }

    /// The explicitly chosen engine, if still alive
    pub fn player(&self) -> Option<Arc<dyn MediaPlayer>> {
        self.chosen.read().as_ref().and_then(Weak::upgrade)
    }

    /// Make a live engine available for support checks
    pub fn register(&self, player: &Arc<dyn MediaPlayer>) {
        self.live.add(player);
    }

    pub fn unregister(&self, player: &dyn MediaPlayer) {
        self.live.remove(player);
    }

    /// The engine a support check would go to right now
    pub fn current(&self) -> Option<Arc<dyn MediaPlayer>> {
        self.player()
            .or_else(|| self.live.snapshot().into_iter().next())
    }

    /// Answer a decoding query; unsupported when no engine is available
    pub fn decoding_info(&self, config: &MediaDecodingConfiguration) -> MediaCapabilitiesInfo {
        match self.current() {
            Some(player) => player.decoding_info(config),
            None => {
                debug!("No engine available for support checks");
                MediaCapabilitiesInfo::unsupported()
            }
        }
    }
}

impl Default for SupportChecks {
    fn default() -> Self {
        Self::new()
    }
}

/// Choose, or with `None` clear, the process-wide engine for support checks
pub fn set_media_player_for_support_checks(player: Option<&Arc<dyn MediaPlayer>>) {
    SupportChecks::global().set_player(player);
}

/// The process-wide engine for support checks, if one is set and alive
pub fn media_player_for_support_checks() -> Option<Arc<dyn MediaPlayer>> {
    SupportChecks::global().player()
}
