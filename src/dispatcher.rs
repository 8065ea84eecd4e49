use std::{fmt, sync::Arc};

use futures_util::StreamExt;
use snafu::prelude::*;

use crate::{
    config::Config,
    error,
    filter::Filter,
    subscriber::Subscriber,
    ws::{Client, ClientEvent, Connector, TungsteniteConnector},
    Result,
};

type BoxedFilter = Box<dyn Filter + Send + Sync>;
type BoxedSubscriber = Box<dyn Subscriber + Send + Sync>;

/// Runs a client and feeds its events to subscribers.
pub struct Dispatcher {
    config: Config,
    connector: Arc<dyn Connector>,
    subscribers: Vec<(BoxedFilter, BoxedSubscriber)>,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.subscribers.iter().map(|(_, s)| s.name()).collect();
        f.debug_struct("Dispatcher")
            .field("config", &self.config)
            .field("connector", &self.connector)
            .field("subscribers", &names)
            .finish()
    }
}

impl Dispatcher {
    /// Create dispatcher using the default websocket connector
    pub fn new(config: Config) -> Self {
        Self::with_connector(config, Arc::new(TungsteniteConnector))
    }

    /// Create dispatcher from server url, with default timings and no credentials
    pub fn from_url<S: AsRef<str> + ?Sized>(url: &S) -> Result<Self> {
        let config = Config::new(url).context(error::InvalidConfig)?;
        Ok(Self::new(config))
    }

    /// Create dispatcher using a custom connector
    pub fn with_connector(config: Config, connector: Arc<dyn Connector>) -> Self {
        Self {
            config,
            connector,
            subscribers: vec![],
        }
    }

    /// Register a subscriber, it receives every event passing `filter`
    pub fn subscribe<F, S>(&mut self, filter: F, subscriber: S) -> &mut Self
    where
        F: Filter + Send + Sync + 'static,
        S: Subscriber + Send + Sync + 'static,
    {
        log::debug!("Subscriber {} registered", subscriber.name());

        self.subscribers
            .push((Box::new(filter), Box::new(subscriber)));
        self
    }

    /// Connect and dispatch events until the client stops.
    ///
    /// Returns [ServerReload](crate::Error::ServerReload) if the server asked for a reload,
    /// the caller decides how to restart.
    pub async fn run(self) -> Result<()> {
        let (client, mut events) = Client::connect_with(self.config, self.connector);

        let mut subscribers = Vec::with_capacity(self.subscribers.len());
        for (filter, mut subscriber) in self.subscribers {
            subscriber.on_loaded(client.clone()).await;
            log::info!("Subscriber {} loaded", subscriber.name());

            let subscriber: Arc<dyn Subscriber + Send + Sync> = Arc::from(subscriber);
            subscribers.push((filter, subscriber));
        }

        while let Some(event) = events.next().await {
            let reload = matches!(event, ClientEvent::Reload);
            let event = Arc::new(event);

            for (filter, subscriber) in subscribers.iter() {
                if filter.filter_event(&event) {
                    log::trace!("Dispatch {} event to {}", event.name(), subscriber.name());
                    Arc::clone(subscriber).on_event(Arc::clone(&event)).await;
                }
            }

            if reload {
                log::info!("Server requested reload, dispatcher stop");
                return error::ServerReload.fail();
            }
        }

        log::info!("Event stream ended, dispatcher stop");

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;
    use crate::{
        error::Error,
        filter::{self, FilterExt},
        ws::mock::MockConnector,
    };

    #[tokio::test(start_paused = true)]
    async fn test_dispatch_until_reload() {
        let (connector, mut servers) = MockConnector::new();
        let config = Config::new("ws://127.0.0.1:8375/ws/world/sample/")
            .unwrap()
            .client_id("anon-1");

        let seen = Arc::new(Mutex::new(vec![]));
        let sink = Arc::clone(&seen);

        let mut dispatcher = Dispatcher::with_connector(config, connector);
        dispatcher.subscribe(
            filter::heartbeat().not().and(filter::kind("log").not()),
            move |event: Arc<ClientEvent>| {
                let sink = Arc::clone(&sink);
                async move {
                    sink.lock().unwrap().push(event.name());
                }
            },
        );

        let server = tokio::spawn(async move {
            let mut server = servers.recv().await.unwrap();
            assert_eq!(
                server.recv().await.unwrap(),
                json!(["authenticate", {"client_id": "anon-1"}])
            );
            server.send(json!(["authenticated", {}]));
            server.send(json!(["chat.event", {}]));
            server.send(json!(["connection.reload"]));
            while server.recv().await.is_some() {}
        });

        let result = dispatcher.run().await;
        assert!(matches!(result, Err(Error::ServerReload)));
        server.await.unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec!["open", "joined", "message", "closed", "reload"]
        );
    }

    #[test]
    fn test_from_url_rejects_http() {
        let err = Dispatcher::from_url("http://127.0.0.1/").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));
    }
}
