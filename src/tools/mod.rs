// Tool dispatch system
//
// Catalog of invocable operations, argument normalization, and the
// dispatcher that routes tool-call requests to capability providers.

pub mod catalog;
pub mod dispatcher;
pub mod normalize;
pub mod registry;
pub mod types;

pub use catalog::{catalog, definitions, ToolSpec};
pub use dispatcher::Dispatcher;
pub use registry::{Operation, Registry};
pub use types::{ToolCallRequest, ToolCallResult, ToolDefinition, ToolInputSchema};
