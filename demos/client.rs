use std::{borrow::Cow, sync::Arc};

use serde_json::json;
use venueless_ws::{
    filter::{self, FilterExt},
    subscriber::Subscriber,
    ws::{Client, ClientEvent},
    Config, Dispatcher, Error,
};

#[derive(Debug, Default)]
struct Profile {
    client: Option<Client>,
}

#[async_trait::async_trait]
impl Subscriber for Profile {
    fn name(&self) -> Cow<'static, str> {
        "profile".into()
    }

    async fn on_loaded(&mut self, client: Client) {
        self.client = Some(client);
    }

    async fn on_event(self: Arc<Self>, _event: Arc<ClientEvent>) {
        let client = match self.client {
            Some(ref client) => client.clone(),
            None => return,
        };

        // don't block event dispatching while waiting the response
        tokio::spawn(async move {
            match client
                .call("user.update", &json!({"profile": {"display_name": "demo"}}))
                .await
            {
                Ok(result) => log::info!("Profile updated: {}", result),
                Err(err) => log::warn!("Update profile failed: {}", err),
            }
        });
    }
}

#[tokio::main]
async fn main() {
    pretty_env_logger::init();

    let url = std::env::var("VENUELESS_URL")
        .map_err(|_| {
            println!("No VENUELESS_URL env var or invalid");
            std::process::exit(1);
        })
        .unwrap();

    let mut config = Config::new(&url).unwrap();
    if let Ok(token) = std::env::var("VENUELESS_TOKEN") {
        config = config.token(token);
    }
    if let Ok(client_id) = std::env::var("VENUELESS_CLIENT_ID") {
        config = config.client_id(client_id);
    }

    let mut dispatcher = Dispatcher::new(config);
    dispatcher
        .subscribe(filter::heartbeat().not(), |event: Arc<ClientEvent>| async move {
            log::info!("Event: {:?}", event)
        })
        .subscribe(filter::kind("joined"), Profile::default());

    match dispatcher.run().await {
        Ok(()) => log::info!("Client stopped"),
        Err(Error::ServerReload) => log::info!("Server requested reload, restart the demo"),
        Err(err) => log::error!("Client failed: {}", err),
    }
}
