//! Workload configuration generation
//!
//! Produces the two documents the gateway expects on first boot so it starts
//! without its interactive onboarding wizard:
//!
//! - `openclaw.json` ([`WorkloadConfig`]): gateway, agent and channel settings.
//!   LLM credentials appear here only as profile placeholders.
//! - `auth-profiles.json` ([`CredentialProfileSet`]): the actual API keys,
//!   keyed by the same profile names.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::DeployError;
use crate::workload::secrets::GeneratedSecrets;

/// Gateway port when none is requested
pub const DEFAULT_GATEWAY_PORT: u16 = 18789;

/// Gateway release the generated documents are stamped with
pub const WORKLOAD_VERSION: &str = "2026.2.12";

const REDACTED: &str = "***";

/// LLM credential providers the workload understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    Anthropic,
    OpenAi,
}

impl LlmProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            LlmProvider::Anthropic => "anthropic",
            LlmProvider::OpenAi => "openai",
        }
    }

    /// Profile slot name, `<provider>:default`
    pub fn profile_name(&self) -> String {
        format!("{}:default", self.as_str())
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            LlmProvider::Anthropic => "Anthropic",
            LlmProvider::OpenAi => "OpenAI",
        }
    }
}

/// User supplied deployment input
#[derive(Debug, Default)]
pub struct WorkloadInput {
    pub anthropic_key: Option<SecretString>,
    pub openai_key: Option<SecretString>,
    pub bot_token: Option<SecretString>,
    /// Telegram user id allowed to DM the bot
    pub allowed_principal: Option<String>,
    pub webhook_url: Option<String>,
    pub port: Option<u16>,
}

impl WorkloadInput {
    /// Present LLM credentials, in profile order
    pub fn llm_credentials(&self) -> Vec<(LlmProvider, &str)> {
        [
            (LlmProvider::Anthropic, &self.anthropic_key),
            (LlmProvider::OpenAi, &self.openai_key),
        ]
        .into_iter()
        .filter_map(|(provider, key)| non_empty_secret(key).map(|k| (provider, k)))
        .collect()
    }

    pub fn bot_token(&self) -> Option<&str> {
        non_empty_secret(&self.bot_token)
    }

    pub fn allowed_principal(&self) -> Option<&str> {
        self.allowed_principal.as_deref().filter(|p| !p.is_empty())
    }

    /// Fail fast on missing input, before anything touches the network
    pub fn validate(&self) -> Result<(), DeployError> {
        if self.llm_credentials().is_empty() {
            return Err(DeployError::Config(
                "Need at least one LLM key: anthropic or openai".to_string(),
            ));
        }
        if self.bot_token().is_none() {
            return Err(DeployError::Config(
                "Missing Telegram bot token (get one from @BotFather)".to_string(),
            ));
        }
        if self.allowed_principal().is_none() {
            return Err(DeployError::Config(
                "Missing allowed Telegram user id".to_string(),
            ));
        }
        Ok(())
    }
}

fn non_empty_secret(secret: &Option<SecretString>) -> Option<&str> {
    secret
        .as_ref()
        .map(|s| s.expose_secret())
        .filter(|s| !s.is_empty())
}

// ================================ openclaw.json ================================== //

/// The gateway's main configuration document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkloadConfig {
    pub meta: Meta,
    pub wizard: Wizard,
    pub auth: AuthSection,
    pub agents: AgentsSection,
    pub messages: MessagesSection,
    pub commands: CommandsSection,
    pub hooks: HooksSection,
    pub channels: ChannelsSection,
    pub gateway: GatewaySection,
    pub skills: SkillsSection,
    pub plugins: PluginsSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    pub last_touched_version: String,
    pub last_touched_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wizard {
    pub last_run_at: String,
    pub last_run_version: String,
    pub last_run_command: String,
    pub last_run_mode: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSection {
    pub profiles: BTreeMap<String, ProfilePlaceholder>,
}

/// Which provider a profile slot belongs to; never the secret itself
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfilePlaceholder {
    pub provider: String,
    pub mode: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentsSection {
    pub defaults: AgentDefaults,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentDefaults {
    pub workspace: String,
    pub compaction: Compaction,
    pub max_concurrent: u32,
    pub subagents: Subagents,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Compaction {
    pub mode: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subagents {
    pub max_concurrent: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagesSection {
    pub ack_reaction_scope: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandsSection {
    pub native: String,
    pub native_skills: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HooksSection {
    pub internal: InternalHooks,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InternalHooks {
    pub enabled: bool,
    pub entries: BTreeMap<String, Toggle>,
}

/// `{ "enabled": bool }`, used by hook and plugin entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Toggle {
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelsSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telegram: Option<TelegramChannel>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelegramChannel {
    pub enabled: bool,
    pub commands: ChannelCommands,
    pub dm_policy: String,
    pub bot_token: String,
    pub allow_from: Vec<String>,
    pub group_policy: String,
    pub stream_mode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_secret: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelCommands {
    pub native: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewaySection {
    pub port: u16,
    pub mode: String,
    pub bind: String,
    pub auth: GatewayAuth,
    pub tailscale: Tailscale,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayAuth {
    pub mode: String,
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tailscale {
    pub mode: String,
    pub reset_on_exit: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillsSection {
    pub install: SkillsInstall,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillsInstall {
    pub node_manager: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PluginsSection {
    pub entries: BTreeMap<String, Toggle>,
}

impl WorkloadConfig {
    /// Copy with every secret-bearing field masked, for dry-run display
    pub fn redacted(&self) -> WorkloadConfig {
        let mut safe = self.clone();
        safe.gateway.auth.token = REDACTED.to_string();
        if let Some(telegram) = safe.channels.telegram.as_mut() {
            telegram.bot_token = REDACTED.to_string();
            if telegram.webhook_secret.is_some() {
                telegram.webhook_secret = Some(REDACTED.to_string());
            }
        }
        safe
    }
}

// ============================== auth-profiles.json =============================== //

/// The credential document, kept apart from [`WorkloadConfig`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialProfileSet {
    pub version: u32,
    pub profiles: BTreeMap<String, CredentialProfile>,
    pub last_good: Map<String, Value>,
    pub usage_stats: Map<String, Value>,
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialProfile {
    #[serde(rename = "type")]
    pub kind: String,
    pub provider: String,
    pub token: String,
}

impl fmt::Debug for CredentialProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialProfile")
            .field("kind", &self.kind)
            .field("provider", &self.provider)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

// ================================= builder ====================================== //

/// Everything generated for one deployment attempt
#[derive(Debug, Clone)]
pub struct WorkloadBundle {
    pub config: WorkloadConfig,
    pub profiles: CredentialProfileSet,
    pub secrets: GeneratedSecrets,
}

impl WorkloadBundle {
    /// Every credential profile has a placeholder in the config and vice versa
    pub fn profiles_consistent(&self) -> bool {
        self.config
            .auth
            .profiles
            .keys()
            .eq(self.profiles.profiles.keys())
    }
}

/// Assembles [`WorkloadConfig`] and [`CredentialProfileSet`] from user input
pub struct ConfigBuilder<'a> {
    input: &'a WorkloadInput,
    default_port: u16,
}

impl<'a> ConfigBuilder<'a> {
    pub fn new(input: &'a WorkloadInput) -> Self {
        Self {
            input,
            default_port: DEFAULT_GATEWAY_PORT,
        }
    }

    /// Port used when the input does not name one
    pub fn with_default_port(mut self, port: u16) -> Self {
        self.default_port = port;
        self
    }

    /// Build with fresh secrets and the current time
    pub fn build(&self) -> Result<WorkloadBundle, DeployError> {
        self.input.validate()?;
        self.build_with(Utc::now(), GeneratedSecrets::generate()?)
    }

    /// Build with the given timestamp and secrets; otherwise deterministic
    pub fn build_with(
        &self,
        now: DateTime<Utc>,
        secrets: GeneratedSecrets,
    ) -> Result<WorkloadBundle, DeployError> {
        self.input.validate()?;

        let timestamp = now.to_rfc3339_opts(SecondsFormat::Millis, true);
        let mut config = base_config(
            &timestamp,
            self.input.port.unwrap_or(self.default_port),
            &secrets.gateway_token,
        );
        let mut profiles = CredentialProfileSet {
            version: 1,
            profiles: BTreeMap::new(),
            last_good: Map::new(),
            usage_stats: Map::new(),
        };

        for (provider, key) in self.input.llm_credentials() {
            let name = provider.profile_name();
            config.auth.profiles.insert(
                name.clone(),
                ProfilePlaceholder {
                    provider: provider.as_str().to_string(),
                    mode: "token".to_string(),
                },
            );
            profiles.profiles.insert(
                name,
                CredentialProfile {
                    kind: "token".to_string(),
                    provider: provider.as_str().to_string(),
                    token: key.to_string(),
                },
            );
        }

        if let Some(bot_token) = self.input.bot_token() {
            let webhook_url = self.input.webhook_url.clone().filter(|u| !u.is_empty());
            let webhook_secret = webhook_url
                .as_ref()
                .map(|_| secrets.webhook_secret.clone());

            config.channels.telegram = Some(TelegramChannel {
                enabled: true,
                commands: ChannelCommands { native: false },
                dm_policy: "allowlist".to_string(),
                bot_token: bot_token.to_string(),
                allow_from: self
                    .input
                    .allowed_principal()
                    .map(|p| vec![p.to_string()])
                    .unwrap_or_default(),
                group_policy: "allowlist".to_string(),
                stream_mode: "partial".to_string(),
                webhook_url,
                webhook_secret,
            });
            config
                .plugins
                .entries
                .insert("telegram".to_string(), Toggle { enabled: true });
        }

        Ok(WorkloadBundle {
            config,
            profiles,
            secrets,
        })
    }
}

fn base_config(timestamp: &str, port: u16, gateway_token: &str) -> WorkloadConfig {
    WorkloadConfig {
        meta: Meta {
            last_touched_version: WORKLOAD_VERSION.to_string(),
            last_touched_at: timestamp.to_string(),
        },
        wizard: Wizard {
            last_run_at: timestamp.to_string(),
            last_run_version: WORKLOAD_VERSION.to_string(),
            last_run_command: "onboard".to_string(),
            last_run_mode: "local".to_string(),
        },
        auth: AuthSection {
            profiles: BTreeMap::new(),
        },
        agents: AgentsSection {
            defaults: AgentDefaults {
                workspace: "/app/workspace".to_string(),
                compaction: Compaction {
                    mode: "safeguard".to_string(),
                },
                max_concurrent: 4,
                subagents: Subagents { max_concurrent: 8 },
            },
        },
        messages: MessagesSection {
            ack_reaction_scope: "group-mentions".to_string(),
        },
        commands: CommandsSection {
            native: "auto".to_string(),
            native_skills: "auto".to_string(),
        },
        hooks: HooksSection {
            internal: InternalHooks {
                enabled: true,
                entries: BTreeMap::from([("command-logger".to_string(), Toggle { enabled: true })]),
            },
        },
        channels: ChannelsSection::default(),
        gateway: GatewaySection {
            port,
            mode: "local".to_string(),
            // all interfaces inside the container
            bind: "0.0.0.0".to_string(),
            auth: GatewayAuth {
                mode: "token".to_string(),
                token: gateway_token.to_string(),
            },
            tailscale: Tailscale {
                mode: "off".to_string(),
                reset_on_exit: false,
            },
        },
        skills: SkillsSection {
            install: SkillsInstall {
                node_manager: "pnpm".to_string(),
            },
        },
        plugins: PluginsSection::default(),
    }
}
