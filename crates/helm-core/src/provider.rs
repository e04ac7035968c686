use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
    Google,
    Mistral,
    Custom,
}

impl ProviderKind {
    pub fn label(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Google => "google",
            ProviderKind::Mistral => "mistral",
            ProviderKind::Custom => "custom",
        }
    }

    pub fn from_label(value: &str) -> Self {
        match value {
            "openai" => ProviderKind::OpenAi,
            "anthropic" => ProviderKind::Anthropic,
            "google" => ProviderKind::Google,
            "mistral" => ProviderKind::Mistral,
            _ => ProviderKind::Custom,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Provider {
    pub id: Uuid,
    pub kind: ProviderKind,
    pub name: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub enabled: bool,
    pub accent_color: String,
    pub icon: String,
}

impl Provider {
    pub fn new(
        name: impl Into<String>,
        kind: ProviderKind,
        accent_color: impl Into<String>,
        icon: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            name: name.into(),
            api_key: String::new(),
            enabled: false,
            accent_color: accent_color.into(),
            icon: icon.into(),
        }
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    pub fn seed_defaults() -> Vec<Provider> {
        vec![
            Provider::new("OpenAI GPT-4", ProviderKind::OpenAi, "#10A37F", "🤖"),
            Provider::new("Claude (Anthropic)", ProviderKind::Anthropic, "#D97706", "🧠"),
            Provider::new("Google Gemini", ProviderKind::Google, "#4285F4", "✨"),
            Provider::new("Mistral AI", ProviderKind::Mistral, "#FF6B35", "🌊"),
        ]
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderPatch {
    pub name: Option<String>,
    pub kind: Option<ProviderKind>,
    pub api_key: Option<String>,
    pub enabled: Option<bool>,
    pub accent_color: Option<String>,
    pub icon: Option<String>,
}

impl ProviderPatch {
    pub fn enabled(value: bool) -> Self {
        Self {
            enabled: Some(value),
            ..Self::default()
        }
    }

    pub fn api_key(value: impl Into<String>) -> Self {
        Self {
            api_key: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn apply(&self, provider: &mut Provider) {
        if let Some(name) = &self.name {
            provider.name = name.clone();
        }
        if let Some(kind) = self.kind {
            provider.kind = kind;
        }
        if let Some(api_key) = &self.api_key {
            provider.api_key = api_key.clone();
        }
        if let Some(enabled) = self.enabled {
            provider.enabled = enabled;
        }
        if let Some(accent_color) = &self.accent_color {
            provider.accent_color = accent_color.clone();
        }
        if let Some(icon) = &self.icon {
            provider.icon = icon.clone();
        }
    }
}
