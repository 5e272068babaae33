use fedsim_shared::Envelope;

/// The transport seam. The coordination core never frames, encrypts or
/// routes messages itself; it only needs these two primitives from
/// whatever connection implementation the embedding runtime provides.
pub trait Connection: Send + Sync {
    /// Best-effort send to every other federation member, in-order per
    /// sender. No delivery guarantee beyond that.
    fn broadcast(&self, envelope: Envelope);

    /// Broadcast, then block the calling thread for the connection's
    /// configured wait window. The transport knows how long claims take to
    /// propagate, so the window length lives with it rather than in the
    /// coordination core.
    fn broadcast_and_sleep(&self, envelope: Envelope);
}
