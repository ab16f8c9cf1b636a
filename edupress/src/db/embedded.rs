//! Embedded PostgreSQL database support
//!
//! Runs a bundled PostgreSQL instance alongside the application, so a single binary can serve
//! without an external database. With `persistent: true` the data directory survives restarts
//! and so do identities and refresh sessions.
//!
//! The binaries are bundled at compile time by the `embedded-db` feature.

#[cfg(feature = "embedded-db")]
use postgresql_embedded::{PostgreSQL, Settings, V16};
#[cfg(feature = "embedded-db")]
use std::path::PathBuf;
#[cfg(feature = "embedded-db")]
use tracing::{debug, info};

#[cfg(feature = "embedded-db")]
pub struct EmbeddedDatabase {
    postgres: PostgreSQL,
    connection_string: String,
}

#[cfg(feature = "embedded-db")]
impl EmbeddedDatabase {
    /// Set up and start an embedded PostgreSQL instance on an OS-assigned port.
    ///
    /// `data_dir` defaults to `$HOME/.edupress_data/postgres`. When `persistent` is false the
    /// instance is temporary and its data is removed on shutdown.
    pub async fn start(data_dir: Option<PathBuf>, persistent: bool) -> anyhow::Result<Self> {
        let data_dir = data_dir.unwrap_or_else(|| match std::env::home_dir() {
            Some(home) => home.join(".edupress_data").join("postgres"),
            None => PathBuf::from(".edupress_data/postgres"),
        });

        if persistent {
            debug!("Starting embedded PostgreSQL with data directory: {}", data_dir.display());
        } else {
            debug!("Starting ephemeral embedded PostgreSQL");
        }

        let settings = Settings {
            version: V16.clone(),
            port: 0,
            username: "postgres".to_string(),
            password: "password".to_string(),
            temporary: !persistent,
            installation_dir: data_dir.join("installation"),
            data_dir: data_dir.join("data"),
            ..Default::default()
        };

        let mut postgres = PostgreSQL::new(settings);

        postgres
            .setup()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to setup embedded PostgreSQL: {}", e))?;
        postgres
            .start()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to start embedded PostgreSQL: {}", e))?;

        let database_name = "edupress";
        // Already present when a persistent data directory is reused
        if !postgres
            .database_exists(database_name)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to look up database '{}': {}", database_name, e))?
        {
            postgres
                .create_database(database_name)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to create database '{}': {}", database_name, e))?;
        }

        let connection_string = postgres.settings().url(database_name);
        info!("Embedded PostgreSQL started on port {}", postgres.settings().port);

        Ok(Self {
            postgres,
            connection_string,
        })
    }

    pub fn connection_string(&self) -> &str {
        &self.connection_string
    }

    /// Stop the embedded PostgreSQL instance
    pub async fn stop(self) -> anyhow::Result<()> {
        info!("Stopping embedded PostgreSQL...");
        self.postgres
            .stop()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to stop embedded PostgreSQL: {}", e))?;
        info!("Embedded PostgreSQL stopped");
        Ok(())
    }
}

#[cfg(not(feature = "embedded-db"))]
pub struct EmbeddedDatabase;

#[cfg(not(feature = "embedded-db"))]
impl EmbeddedDatabase {
    pub async fn start(_data_dir: Option<std::path::PathBuf>, _persistent: bool) -> anyhow::Result<Self> {
        anyhow::bail!(
            "Embedded database feature is not enabled. \
             Rebuild with --features embedded-db to use this feature."
        )
    }

    pub fn connection_string(&self) -> &str {
        ""
    }

    pub async fn stop(self) -> anyhow::Result<()> {
        Ok(())
    }
}
