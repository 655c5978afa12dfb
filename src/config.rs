//! Debate variants and process settings
//!
//! Variants (topics, prompts, timing, turn structure) are compiled in.
//! Only the endpoint, credentials, port and variant selection come from the
//! environment.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;

/// Completion endpoint used when `DEBATE_ENDPOINT` is unset
pub const DEFAULT_ENDPOINT: &str = "https://onmars--aaa7a55dacaa4ff1be82c0987204a122.web.val.run/";

/// Variant used when `DEBATE_VARIANT` is unset
pub const DEFAULT_VARIANT: &str = "classic";

const DEFAULT_PORT: u16 = 8000;

/// Placeholder substituted with the topic display name in prompt templates
const TOPIC_PLACEHOLDER: &str = "{TOPIC}";

// ============================================================================
// Topics and generation parameters
// ============================================================================

/// A debate topic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub id: String,
    pub display_name: String,
    pub opening_prompt: String,
}

impl Topic {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        opening_prompt: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            opening_prompt: opening_prompt.into(),
        }
    }
}

/// Fixed sampling parameters for one kind of call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_tokens: u32,
    /// Ask the service for a JSON object reply
    pub json_output: bool,
}

/// How one exchange maps onto completion calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnStructure {
    /// One side per call; `user`/`assistant` tags swap between calls.
    /// Replies carry their text in `reply_field` when structured.
    Alternating { reply_field: String },
    /// Both sides in a single structured reply, revealed one after the other
    Paired {
        first_field: String,
        second_field: String,
        reveal_delay: Duration,
    },
}

/// Speaker labels used in the moderator transcript
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptLabels {
    pub user: String,
    pub assistant: String,
    pub first: String,
    pub second: String,
}

/// User-facing notices rendered as system entries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notices {
    pub concluding: String,
    pub moderator_thinking: String,
    pub choose_topic: String,
    pub missing_summary: String,
}

impl Default for Notices {
    fn default() -> Self {
        Self {
            concluding: "The debate has reached peak silliness. The moderator will now summarize."
                .to_string(),
            moderator_thinking: "Moderator is thinking...".to_string(),
            choose_topic: "Please choose a new topic.".to_string(),
            missing_summary: "Moderator could not provide a summary.".to_string(),
        }
    }
}

// ============================================================================
// Debate configuration
// ============================================================================

/// Errors found while selecting or validating a variant
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unknown debate variant: {0}")]
    UnknownVariant(String),
    #[error("Variant has no topics")]
    NoTopics,
    #[error("Duplicate topic id: {0}")]
    DuplicateTopic(String),
    #[error("Topic {0} has an empty opening prompt")]
    EmptyOpeningPrompt(String),
    #[error("Exchange threshold must be at least 1")]
    ZeroThreshold,
    #[error("Tick interval must be non-zero")]
    ZeroTickInterval,
    #[error("Paired turn fields must differ (both are {0:?})")]
    IdenticalPairFields(String),
    #[error("Reveal delay {delay:?} must be shorter than the tick interval {interval:?}")]
    RevealDelayTooLong { delay: Duration, interval: Duration },
}

/// One debate variant
#[derive(Debug, Clone, PartialEq)]
pub struct DebateConfig {
    pub variant: String,
    /// Persona and rules, `{TOPIC}` is replaced with the display name
    pub instruction_template: String,
    /// Moderator instruction for the summary call
    pub moderator_template: String,
    pub topics: Vec<Topic>,
    pub exchange_threshold: u32,
    pub tick_interval: Duration,
    /// Number of exchange messages kept after the instruction message
    pub history_window: usize,
    pub turn_structure: TurnStructure,
    pub debate_params: GenerationParams,
    pub summary_params: GenerationParams,
    pub labels: TranscriptLabels,
    pub notices: Notices,
}

impl DebateConfig {
    /// Names of the compiled-in variants
    pub const VARIANTS: &'static [&'static str] = &["classic", "paired", "freeform"];

    /// Look up a compiled-in variant by name
    pub fn preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "classic" => Ok(Self::classic()),
            "paired" => Ok(Self::paired()),
            "freeform" => Ok(Self::freeform()),
            other => Err(ConfigError::UnknownVariant(other.to_string())),
        }
    }

    /// Alternating turns with a `{"response": ...}` envelope
    pub fn classic() -> Self {
        Self {
            variant: "classic".to_string(),
            instruction_template: concat!(
                "You are in a debate with an antagonist about \"{TOPIC}\".\n",
                "The 'user' message is the antagonist's previous point. You must counter it.\n",
                "Give the antagonist a hard time! Keep your responses concise. 2 sentences max.\n",
                "Respond in JSON format: {\"response\": \"Your debate point here.\"}"
            )
            .to_string(),
            moderator_template: moderator_template(),
            topics: silly_topics(),
            exchange_threshold: 7,
            tick_interval: Duration::from_secs(10),
            history_window: 10,
            turn_structure: TurnStructure::Alternating {
                reply_field: "response".to_string(),
            },
            debate_params: GenerationParams {
                temperature: 0.9,
                max_tokens: 250,
                json_output: true,
            },
            summary_params: summary_params(),
            labels: TranscriptLabels::default(),
            notices: Notices::default(),
        }
    }

    /// Both sides scripted in one reply, revealed with a pause between them
    pub fn paired() -> Self {
        Self {
            variant: "paired".to_string(),
            instruction_template: concat!(
                "You are scripting a lively debate about \"{TOPIC}\" between a protagonist and an antagonist.\n",
                "Continue from the last exchange: the protagonist makes a new point and the antagonist rebuts it.\n",
                "Each side gets 1-2 sentences. Never repeat an earlier argument.\n",
                "Respond in JSON format: {\"protagonist\": \"...\", \"antagonist\": \"...\"}"
            )
            .to_string(),
            moderator_template: moderator_template(),
            topics: vec![
                Topic::new(
                    "pineapplePizza",
                    "Does Pineapple Belong on Pizza?",
                    "Open the debate: does pineapple belong on pizza?",
                ),
                Topic::new(
                    "hotdogSandwich",
                    "Is a Hotdog a Sandwich?",
                    "Open the debate: is a hotdog a sandwich?",
                ),
                Topic::new(
                    "gifPronunciation",
                    "GIF: Hard G or Soft G?",
                    "Open the debate: is it pronounced GIF with a hard G or a soft G?",
                ),
            ],
            exchange_threshold: 5,
            tick_interval: Duration::from_secs(12),
            history_window: 8,
            turn_structure: TurnStructure::Paired {
                first_field: "protagonist".to_string(),
                second_field: "antagonist".to_string(),
                reveal_delay: Duration::from_secs(3),
            },
            debate_params: GenerationParams {
                temperature: 0.9,
                max_tokens: 300,
                json_output: true,
            },
            summary_params: summary_params(),
            labels: TranscriptLabels::default(),
            notices: Notices::default(),
        }
    }

    /// Alternating turns with plain-text replies
    pub fn freeform() -> Self {
        Self {
            variant: "freeform".to_string(),
            instruction_template: concat!(
                "You are a passionate debater arguing about \"{TOPIC}\".\n",
                "The 'user' message is your opponent's last point. Rebut it and add one new argument.\n",
                "Reply in plain text, 2 sentences max, no preamble."
            )
            .to_string(),
            moderator_template: moderator_template(),
            topics: silly_topics(),
            exchange_threshold: 6,
            tick_interval: Duration::from_secs(8),
            history_window: 6,
            turn_structure: TurnStructure::Alternating {
                reply_field: "response".to_string(),
            },
            debate_params: GenerationParams {
                temperature: 1.0,
                max_tokens: 200,
                json_output: false,
            },
            summary_params: summary_params(),
            labels: TranscriptLabels::default(),
            notices: Notices::default(),
        }
    }

    /// Reject configurations the driver cannot run
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.topics.is_empty() {
            return Err(ConfigError::NoTopics);
        }

        let mut seen = HashSet::new();
        for topic in &self.topics {
            if !seen.insert(topic.id.as_str()) {
                return Err(ConfigError::DuplicateTopic(topic.id.clone()));
            }
            if topic.opening_prompt.trim().is_empty() {
                return Err(ConfigError::EmptyOpeningPrompt(topic.id.clone()));
            }
        }

        if self.exchange_threshold == 0 {
            return Err(ConfigError::ZeroThreshold);
        }
        if self.tick_interval.is_zero() {
            return Err(ConfigError::ZeroTickInterval);
        }

        if let TurnStructure::Paired {
            first_field,
            second_field,
            reveal_delay,
        } = &self.turn_structure
        {
            if first_field == second_field {
                return Err(ConfigError::IdenticalPairFields(first_field.clone()));
            }
            if *reveal_delay >= self.tick_interval {
                return Err(ConfigError::RevealDelayTooLong {
                    delay: *reveal_delay,
                    interval: self.tick_interval,
                });
            }
        }

        Ok(())
    }

    pub fn topic(&self, id: &str) -> Option<&Topic> {
        self.topics.iter().find(|t| t.id == id)
    }

    pub fn instruction_for(&self, topic: &Topic) -> String {
        self.instruction_template
            .replace(TOPIC_PLACEHOLDER, &topic.display_name)
    }

    pub fn moderator_instruction_for(&self, topic: &Topic) -> String {
        self.moderator_template
            .replace(TOPIC_PLACEHOLDER, &topic.display_name)
    }
}

impl Default for TranscriptLabels {
    fn default() -> Self {
        Self {
            user: "Challenger".to_string(),
            assistant: "AI Debater".to_string(),
            first: "Protagonist".to_string(),
            second: "Antagonist".to_string(),
        }
    }
}

fn moderator_template() -> String {
    concat!(
        "You are an impartial and insightful moderator.\n",
        "The following is a debate on the topic of \"{TOPIC}\".\n",
        "Please provide a concise (3 sentences) summary of the main arguments presented by both sides ",
        "and perhaps a lighthearted concluding thought. Do not declare a winner.\n",
        "Your response should be plain text, not JSON."
    )
    .to_string()
}

fn summary_params() -> GenerationParams {
    GenerationParams {
        temperature: 0.5,
        max_tokens: 200,
        json_output: false,
    }
}

fn silly_topics() -> Vec<Topic> {
    vec![
        Topic::new(
            "zebraStripes",
            "Zebra Stripes: Black on White or White on Black?",
            "The eternal question: Are zebras white with black stripes, or black with white stripes? Present your irrefutable argument!",
        ),
        Topic::new(
            "hotdogSandwich",
            "Is a Hotdog a Sandwich?",
            "Alright, settle it once and for all: is a hotdog a sandwich? I need a definitive, well-reasoned answer.",
        ),
        Topic::new(
            "cerealSoup",
            "Is Cereal a Soup?",
            "Controversial opinion time: Is cereal technically a type of soup? Defend your position with gusto!",
        ),
        Topic::new(
            "flatEarth",
            "Convince Me the Earth is Flat",
            "I'm feeling open-minded today. Try to convince me the Earth is flat. What's your most compelling 'evidence'?",
        ),
    ]
}

// ============================================================================
// Process settings
// ============================================================================

/// Settings read from the environment at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub variant: String,
    pub port: u16,
    /// Per-call timeout; unset means a hung call stalls the debate
    pub request_timeout: Option<Duration>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            endpoint: non_empty("DEBATE_ENDPOINT").unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            api_key: non_empty("DEBATE_API_KEY"),
            model: non_empty("DEBATE_MODEL"),
            variant: non_empty("DEBATE_VARIANT").unwrap_or_else(|| DEFAULT_VARIANT.to_string()),
            port: non_empty("DEBATE_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            request_timeout: non_empty("DEBATE_REQUEST_TIMEOUT_SECS")
                .and_then(|s| s.parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
        }
    }
}
