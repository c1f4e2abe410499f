//! Entity actions as seen by the world: what animation and sound to use,
//! whether the action is finished, and whether it may be interrupted.

pub const CAST_ANIMATION: &str = "cast";
pub const CAST_SOUND: &str = "fireball";
pub const WAVE_ANIMATION: &str = "wave";

pub const DEFAULT_CAST_SECONDS: f32 = 1.0;
pub const DEFAULT_WAVE_SECONDS: f32 = 0.5;

/// Anything that can start a named sound effect.
pub trait AudioSink {
    fn play_sound(&mut self, sound_name: &str);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActionKind {
    /// Locks the actor in place until the spell finishes.
    Cast { duration_seconds: f32 },
    Wave { duration_seconds: f32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    kind: ActionKind,
    elapsed_seconds: f32,
    sound_playing: bool,
}

impl Action {
    pub fn new(kind: ActionKind) -> Self {
        Self {
            kind,
            elapsed_seconds: 0.0,
            sound_playing: false,
        }
    }

    pub fn cast() -> Self {
        Self::new(ActionKind::Cast {
            duration_seconds: DEFAULT_CAST_SECONDS,
        })
    }

    pub fn wave() -> Self {
        Self::new(ActionKind::Wave {
            duration_seconds: DEFAULT_WAVE_SECONDS,
        })
    }

    pub fn kind(&self) -> ActionKind {
        self.kind
    }

    pub fn update(&mut self, dt_seconds: f32) {
        if dt_seconds.is_finite() && dt_seconds > 0.0 {
            self.elapsed_seconds += dt_seconds;
        }
    }

    pub fn is_done(&self) -> bool {
        self.elapsed_seconds >= self.duration_seconds()
    }

    pub fn is_interruptible(&self) -> bool {
        match self.kind {
            ActionKind::Cast { .. } => false,
            ActionKind::Wave { .. } => true,
        }
    }

    pub fn animation_name(&self) -> &'static str {
        match self.kind {
            ActionKind::Cast { .. } => CAST_ANIMATION,
            ActionKind::Wave { .. } => WAVE_ANIMATION,
        }
    }

    pub fn sound_name(&self) -> Option<&'static str> {
        match self.kind {
            ActionKind::Cast { .. } => Some(CAST_SOUND),
            ActionKind::Wave { .. } => None,
        }
    }

    /// Starts the action's sound once; later calls are no-ops.
    pub fn play_sound<A: AudioSink + ?Sized>(&mut self, audio: &mut A) {
        if self.sound_playing {
            return;
        }
        if let Some(sound) = self.sound_name() {
            audio.play_sound(sound);
            self.sound_playing = true;
        }
    }

    fn duration_seconds(&self) -> f32 {
        match self.kind {
            ActionKind::Cast { duration_seconds } | ActionKind::Wave { duration_seconds } => {
                duration_seconds
            }
        }
    }
}
