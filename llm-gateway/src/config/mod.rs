//! Gateway configuration: backend configs, provider kinds, model ids, and
//! strict environment loading.

pub mod backend_config;
pub mod default_config;
pub mod model_id;
pub mod provider;

pub use backend_config::BackendConfig;
pub use default_config::GatewayConfig;
pub use model_id::ModelId;
pub use provider::BackendProvider;
