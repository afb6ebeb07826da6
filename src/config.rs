use std::env;
use std::time::Duration;

/// Model identifier is compiled in, matching the deployment this serves.
pub const MODEL_ID: &str = "meta-llama/Llama-3.2-1B";

const DEFAULT_ADDR: &str = "0.0.0.0:5000";
const DEFAULT_QA_PATH: &str = "qnatemplate.json";
const DEFAULT_GEN_TIMEOUT_SECS: u64 = 120;

/// Runtime settings, read from the environment once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_addr: String,
    pub qa_path: String,
    pub hf_token: Option<String>,
    pub generation_timeout: Duration,
}

impl Settings {
    pub fn from_env() -> Self {
        let bind_addr = env::var("CHATBOT_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
        let qa_path = env::var("CHATBOT_QA_PATH").unwrap_or_else(|_| DEFAULT_QA_PATH.to_string());
        let hf_token = env::var("HUGGINGFACE_TOKEN").ok().filter(|t| !t.is_empty());
        let generation_timeout = env::var("CHATBOT_GEN_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_GEN_TIMEOUT_SECS));

        Self {
            bind_addr,
            qa_path,
            hf_token,
            generation_timeout,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_ADDR.to_string(),
            qa_path: DEFAULT_QA_PATH.to_string(),
            hf_token: None,
            generation_timeout: Duration::from_secs(DEFAULT_GEN_TIMEOUT_SECS),
        }
    }
}
