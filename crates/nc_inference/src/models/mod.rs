use std::sync::Arc;

use nc_core::{InferenceModel, Result};
use tracing::info;

use crate::{Config, ModelProvider};

pub mod dummy;
pub mod openai;

pub use dummy::DummyModel;
pub use openai::OpenAiModel;

/// Build the model named on the command line ("openai", "deepseek", "dummy").
pub fn create_model(name: &str, config: Config) -> Result<Arc<dyn InferenceModel>> {
    let provider: ModelProvider = name.parse()?;
    let config = if config.provider == provider {
        config
    } else {
        Config {
            provider,
            embedding_dim: provider.default_embedding_dim(),
            ..config
        }
    };
    let model: Arc<dyn InferenceModel> = match provider {
        ModelProvider::OpenAi | ModelProvider::DeepSeek => Arc::new(OpenAiModel::new(config)?),
        ModelProvider::Dummy => Arc::new(DummyModel::new(Some(config))),
    };
    info!("🤖 Using {} model", model.name());
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_model_by_name() {
        let model = create_model("dummy", Config::default()).unwrap();
        assert_eq!(model.name(), "Dummy");

        let model = create_model("deepseek", Config::default().with_api_key("key")).unwrap();
        assert_eq!(model.name(), "DeepSeek");
    }

    #[test]
    fn test_create_model_rejects_unknown_or_keyless() {
        assert!(create_model("langchain", Config::default()).is_err());
        assert!(create_model("openai", Config::new(ModelProvider::OpenAi)).is_err());
    }
}
