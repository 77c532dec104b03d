//! MongoDB database wrapper.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use mongodb::event::EventHandler;
use mongodb::event::sdam::SdamEvent;
use mongodb::{Client, Collection, options::ClientOptions};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use super::strategy::{ConnectionProbe, ConnectionStatus};
use crate::error::Result;

/// Driver options for the built-in strategy.
#[derive(Debug, Clone, Default)]
pub struct MongoOptions {
    pub app_name: Option<String>,
    pub max_pool_size: Option<u32>,
    pub connect_timeout: Option<Duration>,
}

/// Database wrapper for MongoDB operations.
///
/// Tracks connection state from the connect/shutdown lifecycle and from the
/// driver's server heartbeats.
#[derive(Debug, Clone)]
pub struct Database {
    client: Client,
    db: mongodb::Database,
    status: Arc<RwLock<ConnectionStatus>>,
}

impl Database {
    /// Connect to MongoDB with the given URI and database name.
    ///
    /// # Errors
    /// Returns error if the URI is invalid or the initial ping fails.
    pub async fn connect(uri: &str, db_name: &str, opts: &MongoOptions) -> Result<Self> {
        let status = Arc::new(RwLock::new(ConnectionStatus::Connecting));

        match Self::open(uri, db_name, opts, &status).await {
            Ok((client, db)) => {
                *status.write() = ConnectionStatus::Connected;
                info!("Successfully connected to MongoDB database '{}'", db_name);
                Ok(Self { client, db, status })
            }
            Err(e) => {
                *status.write() = ConnectionStatus::Disconnected;
                Err(e)
            }
        }
    }

    async fn open(
        uri: &str,
        db_name: &str,
        opts: &MongoOptions,
        status: &Arc<RwLock<ConnectionStatus>>,
    ) -> Result<(Client, mongodb::Database)> {
        let mut options = ClientOptions::parse(uri).await?;

        if let Some(app_name) = &opts.app_name {
            options.app_name = Some(app_name.clone());
        }
        if let Some(max_pool_size) = opts.max_pool_size {
            options.max_pool_size = Some(max_pool_size);
        }
        if let Some(timeout) = opts.connect_timeout {
            options.connect_timeout = Some(timeout);
        }
        options.sdam_event_handler = Some(heartbeat_handler(Arc::clone(status)));

        let client = Client::with_options(options)?;

        // Ping the database to verify connection
        client
            .database("admin")
            .run_command(mongodb::bson::doc! { "ping": 1 })
            .await?;

        let db = client.database(db_name);
        Ok((client, db))
    }

    /// Current connection state.
    pub fn status(&self) -> ConnectionStatus {
        *self.status.read()
    }

    /// Get a typed collection from the database.
    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.db.collection(name)
    }

    /// Close all connections. Status passes through `disconnecting`.
    pub async fn shutdown(&self) {
        *self.status.write() = ConnectionStatus::Disconnecting;
        self.client.clone().shutdown().await;
        *self.status.write() = ConnectionStatus::Disconnected;
        info!("MongoDB connection closed");
    }
}

impl ConnectionProbe for Database {
    fn is_connected(&self) -> bool {
        self.status() == ConnectionStatus::Connected
    }

    fn connection_status(&self) -> ConnectionStatus {
        self.status()
    }
}

/// Last heartbeat result per server. The deployment is reachable while any
/// server answered its latest heartbeat.
#[derive(Debug)]
struct ServerHealth<K> {
    servers: HashMap<K, bool>,
}

impl<K: Hash + Eq> ServerHealth<K> {
    fn new() -> Self {
        Self {
            servers: HashMap::new(),
        }
    }

    /// Record one heartbeat and return the resulting deployment status.
    fn record(&mut self, server: K, healthy: bool) -> ConnectionStatus {
        self.servers.insert(server, healthy);
        if self.servers.values().any(|healthy| *healthy) {
            ConnectionStatus::Connected
        } else {
            ConnectionStatus::Disconnected
        }
    }
}

/// Map server heartbeats onto the shared connection state.
fn heartbeat_handler(status: Arc<RwLock<ConnectionStatus>>) -> EventHandler<SdamEvent> {
    let health = Mutex::new(ServerHealth::new());

    EventHandler::callback(move |event: SdamEvent| {
        let next = match event {
            SdamEvent::ServerHeartbeatSucceeded(event) => {
                health.lock().record(event.server_address, true)
            }
            SdamEvent::ServerHeartbeatFailed(event) => {
                debug!("MongoDB heartbeat to {} failed", event.server_address);
                health.lock().record(event.server_address, false)
            }
            _ => return,
        };

        let mut current = status.write();
        // connect() and shutdown() own the transitional states
        if matches!(
            *current,
            ConnectionStatus::Connecting | ConnectionStatus::Disconnecting
        ) {
            return;
        }
        if *current != next {
            match next {
                ConnectionStatus::Disconnected => {
                    warn!("No MongoDB server answered its heartbeat, marking disconnected")
                }
                _ => info!("MongoDB reachable again, marking connected"),
            }
            *current = next;
        }
    })
}
