//! The five kruzhok effects and their ffmpeg filter parameters.
//!
//! Every effect runs after the common scale-and-square-crop step. Photo clips
//! are only 5 seconds long, so they get a stronger parameterization of the same
//! effect than video clips.

use strum::{Display, EnumIter, IntoEnumIterator};

use super::media::MediaKind;

/// Visual effect applied while transcoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum Effect {
    /// Square crop only
    Plain = 1,
    /// Progressive zoom-in
    Zoom = 2,
    Blur = 3,
    /// Hue rotation cycling over time, saturation boosted
    HueCycle = 4,
    /// Continuous rotation
    Rotate = 5,
}

impl Effect {
    /// Maps a button id to an effect. Unknown ids fall back to [`Effect::Plain`].
    pub fn from_id(id: u8) -> Self {
        Self::try_from_id(id).unwrap_or(Effect::Plain)
    }

    pub fn try_from_id(id: u8) -> Option<Self> {
        Effect::iter().find(|e| e.id() == id)
    }

    pub fn id(self) -> u8 {
        self as u8
    }

    /// Name shown to users and stored in history
    pub fn label(self) -> &'static str {
        match self {
            Effect::Plain => "Oddiy doira",
            Effect::Zoom => "Yaqinlashtirish",
            Effect::Blur => "Xiralashtirish",
            Effect::HueCycle => "Rang o'yini",
            Effect::Rotate => "Aylanish",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Effect::Plain => "⭕",
            Effect::Zoom => "🔍",
            Effect::Blur => "🌫",
            Effect::HueCycle => "🌈",
            Effect::Rotate => "🔄",
        }
    }

    /// Parameters for this effect on the given media kind
    pub fn params(self, kind: MediaKind) -> EffectParams {
        match (self, kind) {
            (Effect::Plain, _) => EffectParams::Identity,
            (Effect::Zoom, MediaKind::Video) => EffectParams::Zoom {
                step_per_frame: 0.0015,
                max_factor: 1.5,
            },
            (Effect::Zoom, MediaKind::Photo) => EffectParams::Zoom {
                step_per_frame: 0.004,
                max_factor: 2.0,
            },
            (Effect::Blur, MediaKind::Video) => EffectParams::Blur { sigma: 6.0 },
            (Effect::Blur, MediaKind::Photo) => EffectParams::Blur { sigma: 12.0 },
            (Effect::HueCycle, MediaKind::Video) => EffectParams::HueCycle {
                period_secs: 6.0,
                saturation: 1.5,
            },
            (Effect::HueCycle, MediaKind::Photo) => EffectParams::HueCycle {
                period_secs: 2.5,
                saturation: 2.0,
            },
            (Effect::Rotate, MediaKind::Video) => EffectParams::Rotate { period_secs: 8.0 },
            (Effect::Rotate, MediaKind::Photo) => EffectParams::Rotate { period_secs: 4.0 },
        }
    }
}

/// Concrete transformation applied after the square crop
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EffectParams {
    Identity,
    /// Zoom grows by `step_per_frame` every output frame until `max_factor`
    Zoom { step_per_frame: f64, max_factor: f64 },
    Blur { sigma: f64 },
    /// One full hue turn every `period_secs`
    HueCycle { period_secs: f64, saturation: f64 },
    /// One full turn every `period_secs`
    Rotate { period_secs: f64 },
}

impl EffectParams {
    /// ffmpeg filter for this transformation, `None` for the identity
    pub fn filter(&self, size: u32, fps: u32) -> Option<String> {
        match *self {
            EffectParams::Identity => None,
            EffectParams::Zoom {
                step_per_frame,
                max_factor,
            } => Some(format!(
                "zoompan=z='min(1+{}*on,{})':x='iw/2-(iw/zoom/2)':y='ih/2-(ih/zoom/2)':d=1:s={}x{}:fps={}",
                step_per_frame, max_factor, size, size, fps
            )),
            EffectParams::Blur { sigma } => Some(format!("gblur=sigma={}", sigma)),
            EffectParams::HueCycle {
                period_secs,
                saturation,
            } => Some(format!("hue=H='2*PI*t/{}':s={}", period_secs, saturation)),
            EffectParams::Rotate { period_secs } => Some(format!(
                "rotate='2*PI*t/{}':ow={}:oh={}:c=black",
                period_secs, size, size
            )),
        }
    }
}

/// Full `-vf` chain: square crop, effect, pixel format
pub fn filter_chain(effect: Effect, kind: MediaKind, size: u32, fps: u32) -> String {
    let mut filters = vec![format!(
        "scale={}:{}:force_original_aspect_ratio=increase,crop={}:{}",
        size, size, size, size
    )];
    if let Some(filter) = effect.params(kind).filter(size, fps) {
        filters.push(filter);
    }
    filters.push("format=yuv420p".to_string());
    filters.join(",")
}
