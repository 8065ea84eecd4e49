//! Event subscribers.

use std::{borrow::Cow, future::Future, sync::Arc};

use crate::ws::{Client, ClientEvent};

/// Subscriber can be register to a dispatcher and process event.
#[async_trait::async_trait]
pub trait Subscriber {
    /// subscriber name
    fn name(&self) -> Cow<'static, str>;
    /// callback will be execute when a dispatcher load this subscriber, with a client for calls
    async fn on_loaded(&mut self, client: Client);
    /// callback will be execute for every event passed subscriber's filter
    async fn on_event(self: Arc<Self>, event: Arc<ClientEvent>);
}

#[async_trait::async_trait]
impl<F, Fut> Subscriber for F
where
    F: Fn(Arc<ClientEvent>) -> Fut + Send + Sync,
    Fut: Future<Output = ()> + Send,
{
    fn name(&self) -> Cow<'static, str> {
        "Anonymous Fn Subscriber".into()
    }

    async fn on_loaded(&mut self, _client: Client) {}

    async fn on_event(self: Arc<Self>, event: Arc<ClientEvent>) {
        self(event).await
    }
}
