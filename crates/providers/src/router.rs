//! Provider selection from configuration.
//!
//! No usable API key means the offline simulator; otherwise the configured
//! backend family, pointed at its `api_url` override when one is set.

use std::sync::Arc;
use std::time::Duration;

use agentflow_config::AppConfig;
use agentflow_core::provider::{Provider, ProviderKind};
use tracing::info;

use crate::anthropic::AnthropicProvider;
use crate::google::GeminiProvider;
use crate::openai::OpenAiProvider;
use crate::simulator::SimulatorProvider;

/// Build the provider the agent should talk to.
pub fn build_provider(config: &AppConfig) -> Arc<dyn Provider> {
    let credentials = config.credentials();
    let Some(api_key) = credentials.api_key() else {
        info!("No API key configured, using the offline simulator");
        return Arc::new(SimulatorProvider::new());
    };

    let timeout = Duration::from_secs(config.agent.provider_timeout_secs);
    let base_url = config.api_url(config.provider);

    info!(
        provider = %config.provider,
        model = %config.effective_model(),
        custom_url = base_url.is_some(),
        "Using live provider"
    );

    match config.provider {
        ProviderKind::OpenAi => {
            let mut provider = OpenAiProvider::new(api_key).with_timeout(timeout);
            if let Some(url) = base_url {
                provider = provider.with_base_url(url);
            }
            Arc::new(provider)
        }
        ProviderKind::Anthropic => {
            let mut provider = AnthropicProvider::new(api_key).with_timeout(timeout);
            if let Some(url) = base_url {
                provider = provider.with_base_url(url);
            }
            Arc::new(provider)
        }
        ProviderKind::Google => {
            let mut provider = GeminiProvider::new(api_key).with_timeout(timeout);
            if let Some(url) = base_url {
                provider = provider.with_base_url(url);
            }
            Arc::new(provider)
        }
    }
}
