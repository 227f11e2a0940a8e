//! Turn relay core: forwards one voice utterance to the conversation backend
//! and turns the backend's tagged response into what the host should say.

pub mod agent;
pub mod backend;
pub mod endpoint;
pub mod protocol;
pub mod router;
pub mod side_effects;
pub mod turn;

pub use agent::{AgentSettings, ConversationAgent};
pub use backend::{ClientError, ConversationBackend, HttpBackendClient};
pub use endpoint::{DynamicEndpointSource, Endpoint, EndpointResolver};
pub use side_effects::{SideEffectError, SideEffectPort};
pub use turn::{TurnRequest, TurnResult};
