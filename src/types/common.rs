//! Common enums and identity types used across the library.

use serde::{Deserialize, Serialize};

/// Backend family a model belongs to.
///
/// Used only for finalizer dispatch and decoder selection; the core does not
/// interpret provider identity beyond equality and pattern matching.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
    Gemini,
    Custom(String),
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OpenAi => write!(f, "openai"),
            Self::Anthropic => write!(f, "anthropic"),
            Self::Gemini => write!(f, "gemini"),
            Self::Custom(name) => write!(f, "{name}"),
        }
    }
}

impl ProviderKind {
    /// Construct a ProviderKind from a provider name string.
    /// Known names map to concrete variants; others map to Custom(name).
    pub fn from_name(name: &str) -> Self {
        match name {
            "openai" => Self::OpenAi,
            "anthropic" => Self::Anthropic,
            "gemini" => Self::Gemini,
            other => Self::Custom(other.to_string()),
        }
    }
}

/// Identity of the model behind an exchange.
///
/// `stateful` marks backends of a family that expose a continuation-style
/// API (the exchange returns an identifier a later turn can reference
/// instead of resending history). It is a dispatch sub-flag, nothing more.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelId {
    pub provider: ProviderKind,
    pub model: String,
    #[serde(default)]
    pub stateful: bool,
}

impl ModelId {
    pub fn new(provider: ProviderKind, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            stateful: false,
        }
    }

    pub fn openai(model: impl Into<String>) -> Self {
        Self::new(ProviderKind::OpenAi, model)
    }

    pub fn anthropic(model: impl Into<String>) -> Self {
        Self::new(ProviderKind::Anthropic, model)
    }

    pub fn gemini(model: impl Into<String>) -> Self {
        Self::new(ProviderKind::Gemini, model)
    }

    pub fn custom(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self::new(ProviderKind::Custom(provider.into()), model)
    }

    /// Mark this model as using a stateful continuation-style API.
    pub fn with_stateful(mut self, stateful: bool) -> Self {
        self.stateful = stateful;
        self
    }
}

/// Reason why the model stopped generating tokens.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Model generated a stop sequence or completed naturally.
    Stop,
    /// Model reached the maximum number of tokens.
    Length,
    /// Model requested tool/function calls.
    ToolCalls,
    /// Content was filtered due to safety/policy violations.
    ContentFilter,
    /// Model stopped due to a custom stop sequence.
    StopSequence,
    /// An error occurred during generation.
    Error,
    /// Other provider-specific finish reason.
    Other(String),
    /// The provider did not report a recognizable finish reason.
    Unknown,
}

impl FinishReason {
    /// Map a provider-reported finish reason string onto the unified enum.
    /// Unrecognized values are preserved as `Other`.
    pub fn from_provider_str(raw: &str) -> Self {
        match raw {
            "stop" | "end_turn" | "STOP" => Self::Stop,
            "length" | "max_tokens" | "MAX_TOKENS" => Self::Length,
            "tool_calls" | "tool_use" => Self::ToolCalls,
            "content_filter" | "SAFETY" => Self::ContentFilter,
            "stop_sequence" => Self::StopSequence,
            other => Self::Other(other.to_string()),
        }
    }

    /// Whether this is the generic "stop" value, in either its tagged or
    /// string-equivalent form.
    pub fn is_generic_stop(&self) -> bool {
        match self {
            Self::Stop => true,
            Self::Other(s) => s.eq_ignore_ascii_case("stop"),
            _ => false,
        }
    }
}

/// Usage statistics for one exchange.
///
/// `cached_tokens` and `reasoning_tokens` default to zero when a provider
/// does not report them, so downstream consumers see a stable schema rather
/// than conditionally-present keys.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Usage {
    /// Input tokens used
    pub prompt_tokens: u32,
    /// Output tokens generated
    pub completion_tokens: u32,
    /// Total tokens used
    pub total_tokens: u32,
    /// Prompt tokens served from a provider-side cache
    #[serde(default)]
    pub cached_tokens: u32,
    /// Tokens spent on internal reasoning
    #[serde(default)]
    pub reasoning_tokens: u32,
}

impl Usage {
    /// Create usage statistics from prompt/completion counts.
    pub const fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
            cached_tokens: 0,
            reasoning_tokens: 0,
        }
    }

    /// Fold a later snapshot into this one. Providers may report usage in
    /// pieces (prompt counts early, completion counts at the end); a
    /// non-zero field in the newer snapshot supersedes, a zero field keeps
    /// what was already known.
    pub fn merge(&mut self, other: &Usage) {
        if other.prompt_tokens > 0 {
            self.prompt_tokens = other.prompt_tokens;
        }
        if other.completion_tokens > 0 {
            self.completion_tokens = other.completion_tokens;
        }
        if other.cached_tokens > 0 {
            self.cached_tokens = other.cached_tokens;
        }
        if other.reasoning_tokens > 0 {
            self.reasoning_tokens = other.reasoning_tokens;
        }
        self.total_tokens = if other.total_tokens > 0 {
            other.total_tokens
        } else {
            self.prompt_tokens + self.completion_tokens
        };
    }
}

/// Role of a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    System,
    User,
    Assistant,
    Tool,
}

/// A conversation-context message.
///
/// The core carries the conversation context through to the result untouched;
/// it never inspects message content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}
