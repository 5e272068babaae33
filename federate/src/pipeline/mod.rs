mod chain;
mod context;

pub use chain::{HandlerFn, Pipeline};
pub use context::{Flow, MessageContext, PendingClaim};
