//! Model and voice names accepted by the OpenAI speech API.
//!
//! Names are matched case-insensitively. Anything else is rejected so a typo
//! in configuration fails at startup instead of playing a different voice.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpenAITTSModel {
    #[default]
    Tts1,
    Tts1Hd,
    Gpt4oMiniTts,
}

impl OpenAITTSModel {
    pub const ALL: [Self; 3] = [Self::Tts1, Self::Tts1Hd, Self::Gpt4oMiniTts];

    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tts1 => "tts-1",
            Self::Tts1Hd => "tts-1-hd",
            Self::Gpt4oMiniTts => "gpt-4o-mini-tts",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|model| model.as_str().eq_ignore_ascii_case(name))
    }
}

impl std::fmt::Display for OpenAITTSModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Voices every model above can speak. The relay uses `shimmer` unless
/// configured otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpenAIVoice {
    Alloy,
    Coral,
    Echo,
    Fable,
    Nova,
    Onyx,
    Sage,
    #[default]
    Shimmer,
}

impl OpenAIVoice {
    pub const ALL: [Self; 8] = [
        Self::Alloy,
        Self::Coral,
        Self::Echo,
        Self::Fable,
        Self::Nova,
        Self::Onyx,
        Self::Sage,
        Self::Shimmer,
    ];

    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Alloy => "alloy",
            Self::Coral => "coral",
            Self::Echo => "echo",
            Self::Fable => "fable",
            Self::Nova => "nova",
            Self::Onyx => "onyx",
            Self::Sage => "sage",
            Self::Shimmer => "shimmer",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|voice| voice.as_str().eq_ignore_ascii_case(name))
    }
}

impl std::fmt::Display for OpenAIVoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
