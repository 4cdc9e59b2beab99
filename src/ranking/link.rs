/// Party interested in the actors linked to an engine.
///
/// Subscribers are notified after the linked set changed, outside of any engine lock.
pub trait LinkSubscriber<A>: Send + Sync {
    fn actor_linked(&self, actor: &A);

    fn actor_unlinked(&self, actor: &A);
}
