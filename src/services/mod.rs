//! 业务能力层
//!
//! 描述"我能做什么"，不关心流程顺序

pub mod effects;

pub use effects::{CompletionEffects, DesktopEffects, RecordedEffect, RecordingEffects};
