// ── Infrastructure ───────────────────────────────────────────────────────────
pub mod http_client;
pub mod scrub;
pub mod traits;

// ── Provider implementations ────────────────────────────────────────────────
pub mod anthropic;
pub mod openai_image;

// ── Decorator layers ────────────────────────────────────────────────────────
pub mod reliable;

pub use http_client::build_provider_client_with_timeout;
pub use scrub::{api_error, sanitize_api_error, scrub_secret_patterns};
pub use traits::{ImageClient, NarrativeClient, TurnRole, interleave_turns};

pub use anthropic::AnthropicNarrativeClient;
pub use openai_image::OpenAiImageClient;
pub use reliable::RetryPolicy;
