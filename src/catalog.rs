//! Static configuration tables shared by every panel.
//!
//! These mirror what the backend knows about platforms, providers and agents.
//! They are never mutated at runtime; panels consult them for defaults and
//! display metadata when the backend is silent.

/// The local provider. Always configured, never needs a key.
pub const OLLAMA: &str = "ollama";

pub const DEFAULT_TIMEZONE: &str = "Asia/Kolkata";

pub const TIMEZONES: &[&str] = &[
    "Asia/Kolkata",
    "America/New_York",
    "America/Chicago",
    "America/Los_Angeles",
    "Europe/London",
    "Europe/Paris",
    "Europe/Berlin",
    "Asia/Tokyo",
    "Asia/Singapore",
    "Australia/Sydney",
    "Pacific/Auckland",
    "UTC",
];

/// Indexed by `analytics_day_of_week`.
pub const DAYS: &[&str] = &[
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

#[derive(Debug)]
pub struct FieldSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub placeholder: &'static str,
}

#[derive(Debug)]
pub struct PlatformSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub fields: &'static [FieldSpec],
}

pub const PLATFORMS: &[PlatformSpec] = &[
    PlatformSpec {
        key: "instagram",
        label: "Instagram",
        fields: &[
            FieldSpec { key: "access_token", label: "Access Token", placeholder: "EAABwzLixnjY..." },
            FieldSpec { key: "business_account_id", label: "Business Account ID", placeholder: "17841400000000000" },
            FieldSpec { key: "app_secret", label: "App Secret", placeholder: "abc123def456..." },
        ],
    },
    PlatformSpec {
        key: "facebook",
        label: "Facebook",
        fields: &[
            FieldSpec { key: "access_token", label: "Access Token", placeholder: "EAABwzLixnjY..." },
            FieldSpec { key: "page_id", label: "Page ID", placeholder: "100000000000000" },
            FieldSpec { key: "app_secret", label: "App Secret", placeholder: "def456ghi789..." },
        ],
    },
    PlatformSpec {
        key: "twitter",
        label: "Twitter",
        fields: &[
            FieldSpec { key: "api_key", label: "API Key", placeholder: "xAi1234567890..." },
            FieldSpec { key: "api_secret", label: "API Secret", placeholder: "xAs1234567890..." },
            FieldSpec { key: "access_token", label: "Access Token", placeholder: "1234567890-..." },
            FieldSpec { key: "access_token_secret", label: "Access Token Secret", placeholder: "ExampleAccess..." },
            FieldSpec { key: "bearer_token", label: "Bearer Token", placeholder: "AAAAAAAAAA..." },
        ],
    },
    PlatformSpec {
        key: "youtube",
        label: "YouTube",
        fields: &[
            FieldSpec { key: "api_key", label: "API Key", placeholder: "AIzaSy..." },
            FieldSpec { key: "client_id", label: "Client ID", placeholder: "123456789012-..." },
            FieldSpec { key: "client_secret", label: "Client Secret", placeholder: "GOCSPX-..." },
            FieldSpec { key: "refresh_token", label: "Refresh Token", placeholder: "1//0Example..." },
        ],
    },
];

#[derive(Debug)]
pub struct ProviderSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    pub models: &'static [&'static str],
}

pub const PROVIDERS: &[ProviderSpec] = &[
    ProviderSpec {
        key: OLLAMA,
        label: "Ollama",
        description: "Free, local inference",
        models: &["llama3", "llama3.1", "llama3.2", "mistral", "gemma2", "phi3", "codellama", "deepseek-r1"],
    },
    ProviderSpec {
        key: "openai",
        label: "OpenAI",
        description: "GPT-4o, GPT-4o-mini",
        models: &["gpt-4o", "gpt-4o-mini", "gpt-4-turbo", "gpt-3.5-turbo", "o1", "o1-mini"],
    },
    ProviderSpec {
        key: "gemini",
        label: "Google Gemini",
        description: "Gemini 2.0 Flash, 2.5 Pro",
        models: &["gemini-2.0-flash", "gemini-2.5-pro", "gemini-2.5-flash", "gemini-1.5-pro"],
    },
    ProviderSpec {
        key: "anthropic",
        label: "Anthropic",
        description: "Claude Sonnet, Opus",
        models: &["claude-sonnet-4-20250514", "claude-opus-4-20250514", "claude-haiku-3-20240307"],
    },
    ProviderSpec {
        key: "groq",
        label: "Groq",
        description: "Ultra-fast inference",
        models: &["llama-3.3-70b-versatile", "llama-3.1-8b-instant", "mixtral-8x7b-32768", "gemma2-9b-it"],
    },
];

#[derive(Debug)]
pub struct AgentSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub description: &'static str,
}

pub const AGENTS: &[AgentSpec] = &[
    AgentSpec { key: "content_creator", label: "Content Creator", description: "Generates post text, captions, CTAs" },
    AgentSpec { key: "hashtag_generator", label: "Hashtag Generator", description: "Generates niche & broad hashtags" },
    AgentSpec { key: "review_agent", label: "Review Agent", description: "Scores content quality & compliance" },
    AgentSpec { key: "engagement_bot", label: "Engagement Bot", description: "Generates replies to comments" },
    AgentSpec { key: "analytics_agent", label: "Analytics Agent", description: "Generates weekly summary reports" },
];

pub fn platform(key: &str) -> Option<&'static PlatformSpec> {
    PLATFORMS.iter().find(|spec| spec.key == key)
}

/// Required fields for a platform; unknown platforms have none.
pub fn platform_fields(key: &str) -> &'static [FieldSpec] {
    platform(key).map(|spec| spec.fields).unwrap_or(&[])
}

pub fn provider(key: &str) -> Option<&'static ProviderSpec> {
    PROVIDERS.iter().find(|spec| spec.key == key)
}

/// Display label, falling back to the raw key.
pub fn provider_label(key: &str) -> &str {
    provider(key).map(|spec| spec.label).unwrap_or(key)
}

pub fn default_models(key: &str) -> &'static [&'static str] {
    provider(key).map(|spec| spec.models).unwrap_or(&[])
}

pub fn agent(key: &str) -> Option<&'static AgentSpec> {
    AGENTS.iter().find(|spec| spec.key == key)
}

pub fn agent_label(key: &str) -> &str {
    agent(key).map(|spec| spec.label).unwrap_or(key)
}

pub fn platform_label(key: &str) -> &str {
    platform(key).map(|spec| spec.label).unwrap_or(key)
}

/// The (provider, model) pair every agent starts on.
pub fn default_assignment() -> (&'static str, &'static str) {
    let model = default_models(OLLAMA).first().copied().unwrap_or_default();
    (OLLAMA, model)
}

pub fn day_name(day: u8) -> &'static str {
    DAYS.get(day as usize).copied().unwrap_or("?")
}
