use std::error::Error;
use std::str::FromStr;
use std::sync::Arc;

use assistant::{Assistant, AssistantConfig};
use llm_gateway::{GatewayConfig, LlmGateway, ModelId, telemetry};
use rag_retriever::{RetrievalConfig, Retriever, ScopeFilter};
use tracing_subscriber::{Layer, filter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Load environment variables from .env file.
    // Fails if .env file not found, not readable or invalid.
    dotenvy::dotenv()?;

    // Gateway events go through the library-scoped layer; everything else
    // through a plain fmt layer, filtered apart to avoid double printing.
    let env_filter = telemetry::env_filter_with_level("info", tracing::Level::INFO);
    let general = fmt::layer().with_target(false).with_filter(filter::filter_fn(
        |meta| !meta.target().starts_with(telemetry::TARGET_PREFIX),
    ));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(telemetry::layer())
        .with(general)
        .init();

    let gateway = Arc::new(LlmGateway::new(GatewayConfig::from_env()?)?);
    let retriever = Retriever::new(RetrievalConfig::from_env()?, gateway.embedder().clone())?;
    let assistant = Assistant::new(gateway, retriever, AssistantConfig::from_env());

    let query = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    let query = if query.is_empty() {
        "Welche Kurse gibt es zum Thema Deep Learning?".to_string()
    } else {
        query
    };

    let model = match std::env::var("CHAT_MODEL") {
        Ok(name) => ModelId::from_str(&name)?,
        Err(_) => ModelId::Gpt4,
    };

    let scope = match (env_i64("CHAT_COURSE_ID"), env_i64("CHAT_MODULE_ID")) {
        (Some(course), Some(module)) => ScopeFilter::module(course, module),
        (Some(course), None) => ScopeFilter::course(course),
        _ => ScopeFilter::unscoped(),
    };

    let outcome = if scope.is_scoped() {
        assistant.chat_with_scope(&query, model, scope, &[]).await?
    } else {
        assistant.chat(&query, model, &[]).await?
    };

    println!("[{}]", outcome.conversation_id);
    println!("{}", outcome.message);

    Ok(())
}

fn env_i64(key: &str) -> Option<i64> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
