//! Animation clips and the built-in clip clock.
//!
//! Every archetype has a static clip table taken from its sprite sheets. The
//! [`Animator`] plays one clip at a time, reports `progress()` in `[0, 1]`
//! and raises a [`Completion`] when a one-shot clip finishes. States that
//! care about the completion register a one-shot watch with their
//! [`Activation`]; the token travels back to the state machine, which drops
//! it if the state has been left in the meantime.
//!
//! Hosts that drive animation themselves can ignore [`Animator::advance`] and
//! report completion through [`Animator::finish`] instead.

use tracing::warn;
use wispwood_fsm::Activation;

/// One animation clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clip {
    /// Clip name, matching the state that plays it.
    pub name: &'static str,
    /// Number of frames.
    pub frames: u16,
    /// Whether the clip loops forever.
    pub repeat: bool,
}

impl Clip {
    /// A clip that plays once and completes.
    #[must_use]
    pub const fn once(name: &'static str, frames: u16) -> Self {
        Self {
            name,
            frames,
            repeat: false,
        }
    }

    /// A clip that loops and never completes.
    #[must_use]
    pub const fn looping(name: &'static str, frames: u16) -> Self {
        Self {
            name,
            frames,
            repeat: true,
        }
    }

    /// Duration of one pass in seconds.
    #[must_use]
    pub fn duration(&self, frame_rate: f32) -> f32 {
        f32::from(self.frames) / frame_rate
    }
}

// =============================================================================
// Clip tables
// =============================================================================

/// Player clips.
pub const PLAYER_CLIPS: &[Clip] = &[
    Clip::looping("idle", 13),
    Clip::looping("run", 8),
    Clip::once("attack1", 7),
    Clip::once("sheathe1", 3),
    Clip::once("attack2", 6),
    Clip::once("sheathe2", 4),
    Clip::once("attack3", 10),
    Clip::once("hurt", 4),
    Clip::once("death", 7),
    Clip::once("cast", 6),
    Clip::once("roll", 5),
    Clip::once("disappear", 9),
];

/// Wisp companion clips.
pub const WISP_CLIPS: &[Clip] = &[
    Clip::looping("idle", 13),
    Clip::looping("illuminate", 8),
    Clip::once("flicker", 5),
    Clip::once("death", 10),
];

/// Boss clips.
pub const BOSS_CLIPS: &[Clip] = &[
    Clip::looping("idle", 8),
    Clip::looping("run", 8),
    Clip::once("attack", 5),
    Clip::once("hurt", 4),
    Clip::once("death", 6),
];

/// Twig clips.
pub const TWIG_CLIPS: &[Clip] = &[
    Clip::looping("idle", 4),
    Clip::looping("run", 8),
    Clip::once("attack", 6),
    Clip::once("hurt", 5),
    Clip::once("death", 5),
];

/// Leshy clips.
pub const LESHY_CLIPS: &[Clip] = &[
    Clip::looping("idle", 8),
    Clip::looping("run", 8),
    Clip::once("attack", 7),
    Clip::once("hurt", 4),
    Clip::once("death", 5),
];

// =============================================================================
// Animator
// =============================================================================

/// A finished one-shot clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    /// Name of the clip that finished.
    pub clip: &'static str,
    /// Activation that watched the clip, if any.
    pub watcher: Option<Activation>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Playback {
    clip: Clip,
    reverse: bool,
    elapsed: f32,
    finished: bool,
}

/// Plays clips from one archetype's table.
#[derive(Debug, Clone, PartialEq)]
pub struct Animator {
    clips: &'static [Clip],
    frame_rate: f32,
    playing: Option<Playback>,
    watch: Option<Activation>,
    paused: bool,
}

impl Animator {
    /// Creates an idle animator over `clips`.
    #[must_use]
    pub fn new(clips: &'static [Clip], frame_rate: f32) -> Self {
        Self {
            clips,
            frame_rate,
            playing: None,
            watch: None,
            paused: false,
        }
    }

    /// Starts `name` from its first frame, restarting it if already playing.
    ///
    /// Any outstanding watch is dropped. An unknown clip name stops playback.
    pub fn play(&mut self, name: &str) {
        self.start(name, false);
    }

    /// Starts `name` from its last frame, playing backwards.
    pub fn play_reverse(&mut self, name: &str) {
        self.start(name, true);
    }

    fn start(&mut self, name: &str, reverse: bool) {
        self.watch = None;
        self.paused = false;
        self.playing = self
            .clips
            .iter()
            .find(|clip| clip.name == name)
            .map(|&clip| Playback {
                clip,
                reverse,
                elapsed: 0.0,
                finished: false,
            });
        if self.playing.is_none() {
            warn!(clip = name, "no such clip");
        }
    }

    /// Registers a one-shot completion watch for the current clip.
    pub fn watch(&mut self, activation: Activation) {
        self.watch = Some(activation);
    }

    /// Returns the watching activation, if any.
    #[must_use]
    pub fn watcher(&self) -> Option<Activation> {
        self.watch
    }

    /// Freezes the current frame.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Returns `true` while frozen.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Returns the name of the current clip.
    #[must_use]
    pub fn clip_name(&self) -> Option<&'static str> {
        self.playing.map(|p| p.clip.name)
    }

    /// Returns `true` if the current clip plays backwards.
    #[must_use]
    pub fn is_reversed(&self) -> bool {
        self.playing.is_some_and(|p| p.reverse)
    }

    /// Returns `true` once a one-shot clip has finished.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.playing.is_some_and(|p| p.finished)
    }

    /// Fraction of the current pass that has played, in `[0, 1]`.
    #[must_use]
    pub fn progress(&self) -> f32 {
        let Some(playback) = self.playing else {
            return 0.0;
        };
        let duration = playback.clip.duration(self.frame_rate);
        if duration <= 0.0 {
            return 1.0;
        }
        let ratio = playback.elapsed / duration;
        if playback.clip.repeat {
            ratio.fract()
        } else {
            ratio.clamp(0.0, 1.0)
        }
    }

    /// Advances the clip clock.
    ///
    /// Returns the completion once a one-shot clip reaches its end. Looping
    /// clips never complete; paused animators do not move.
    pub fn advance(&mut self, dt: f32) -> Option<Completion> {
        let frame_rate = self.frame_rate;
        let playback = self.playing.as_mut()?;
        if self.paused || playback.finished {
            return None;
        }
        playback.elapsed += dt;
        if !playback.clip.repeat && playback.elapsed >= playback.clip.duration(frame_rate) {
            return self.finish();
        }
        None
    }

    /// Ends the current one-shot clip immediately.
    ///
    /// Returns `None` if nothing is playing, the clip loops, or it already
    /// finished.
    pub fn finish(&mut self) -> Option<Completion> {
        let frame_rate = self.frame_rate;
        let playback = self.playing.as_mut()?;
        if playback.clip.repeat || playback.finished {
            return None;
        }
        playback.finished = true;
        playback.elapsed = playback.clip.duration(frame_rate);
        Some(Completion {
            clip: playback.clip.name,
            watcher: self.watch.take(),
        })
    }
}
