use std::collections::HashMap;

use fedsim_shared::{Message, MessageKind};

use crate::error::FederateError;
use crate::handlers;
use crate::pipeline::{Flow, MessageContext};

pub type HandlerFn = fn(&mut MessageContext, &Message) -> Result<Flow, FederateError>;

/// Static handler chains, one per message kind and direction.
///
/// Every chain is assembled once at construction; dispatch is a map lookup
/// followed by an in-order walk. A handler returning `Flow::Continue` hands
/// the message to the next entry, anything else stops the chain. A kind with
/// no registered chain falls through as `Flow::Continue`.
pub struct Pipeline {
    outgoing: HashMap<MessageKind, Vec<HandlerFn>>,
    incoming: HashMap<MessageKind, Vec<HandlerFn>>,
}

impl Pipeline {
    pub fn new() -> Self {
        let mut outgoing: HashMap<MessageKind, Vec<HandlerFn>> = HashMap::new();
        let mut incoming: HashMap<MessageKind, Vec<HandlerFn>> = HashMap::new();

        for (kind, chain) in handlers::outgoing_chains() {
            outgoing.insert(kind, chain);
        }
        for (kind, chain) in handlers::incoming_chains() {
            incoming.insert(kind, chain);
        }

        Pipeline { outgoing, incoming }
    }

    pub fn run_outgoing(
        &self,
        ctx: &mut MessageContext,
        message: &Message,
    ) -> Result<Flow, FederateError> {
        Self::run(&self.outgoing, ctx, message)
    }

    pub fn run_incoming(
        &self,
        ctx: &mut MessageContext,
        message: &Message,
    ) -> Result<Flow, FederateError> {
        Self::run(&self.incoming, ctx, message)
    }

    fn run(
        chains: &HashMap<MessageKind, Vec<HandlerFn>>,
        ctx: &mut MessageContext,
        message: &Message,
    ) -> Result<Flow, FederateError> {
        let Some(chain) = chains.get(&message.kind()) else {
            return Ok(Flow::Continue);
        };
        for handler in chain {
            match handler(ctx, message)? {
                Flow::Continue => continue,
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Continue)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Pipeline::new()
    }
}
