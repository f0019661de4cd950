use serde::{Deserialize, Serialize};

use super::catalog;

pub const DEFAULT_PITCH: &str = "+0Hz";
pub const DEFAULT_RATE: &str = "+0%";
pub const DEFAULT_VOLUME: &str = "+0%";

/// Per-call overrides supplied by the caller. All fields optional; later
/// layers win over the base configuration during resolution.
///
/// `style`, `styledegree` and `role` are accepted for backwards
/// compatibility but no longer functional: they trigger a warning and are
/// otherwise ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pitch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub styledegree: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// Fully resolved options for one synthesis call. `voice` is always
/// non-empty by construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SynthesisOptions {
    pub language: String,
    pub voice: String,
    pub pitch: String,
    pub rate: String,
    pub volume: String,
}

/// Merge the base configuration, the requested language and the per-call
/// overrides into one effective option set.
///
/// Precedence, later wins: base config language -> language/voice derived
/// from `requested_language` -> call options. If `requested_language` is
/// itself a voice id it counts as an explicit voice selection and its
/// catalog language replaces the language field. The final voice falls back
/// through explicit override, catalog default for the language, then
/// [`catalog::FALLBACK_VOICE`].
///
/// This function is total: it never fails and is deterministic for
/// identical inputs.
pub fn resolve(
    requested_language: Option<&str>,
    base_language: &str,
    options: &CallOptions,
) -> SynthesisOptions {
    let mut language = base_language.to_string();
    let mut derived_voice: Option<String> = None;

    if let Some(requested) = requested_language {
        if let Some(lang) = catalog::language_of(requested) {
            // A voice id was passed where a language tag was expected.
            language = lang.to_string();
            derived_voice = Some(requested.to_string());
        } else {
            language = requested.to_string();
        }
    }

    warn_deprecated(options);

    let voice = options
        .voice
        .clone()
        .or(derived_voice)
        .or_else(|| catalog::default_voice(&language).map(str::to_string))
        .unwrap_or_else(|| catalog::FALLBACK_VOICE.to_string());

    SynthesisOptions {
        language,
        voice,
        pitch: options.pitch.clone().unwrap_or_else(|| DEFAULT_PITCH.into()),
        rate: options.rate.clone().unwrap_or_else(|| DEFAULT_RATE.into()),
        volume: options
            .volume
            .clone()
            .unwrap_or_else(|| DEFAULT_VOLUME.into()),
    }
}

fn warn_deprecated(options: &CallOptions) {
    if options.style.is_some() || options.styledegree.is_some() || options.role.is_some() {
        tracing::warn!(
            "style/styledegree/role options are no longer supported and will be ignored; \
             please remove them from the request"
        );
    }
}
