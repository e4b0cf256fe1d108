//! Server wiring: storage, compiler, write queue and console commands.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use witness_core::{DocumentRecordHandler, EntryQueue, FlushTask};
use witness_lang::{HandlerRegistry, QueryBuilder};
use witness_proto::{PlayerDirectory, Requester, StaticPlayerDirectory};

use crate::config::ServerConfig;
use crate::console::{ConsoleCommand, HELP};
use crate::error::Error;
use crate::search::{describe, SearchCommand};

/// A running witness instance.
pub struct Witness {
    handler: Arc<DocumentRecordHandler>,
    search: SearchCommand,
    queue: Arc<EntryQueue>,
}

impl Witness {
    /// Open storage and build the search compiler.
    ///
    /// Fails if the store cannot be opened; callers should treat that as
    /// fatal.
    pub fn open(config: &ServerConfig) -> Result<Self, Error> {
        config.validate()?;

        let players = StaticPlayerDirectory::new();
        for (name, id) in &config.players {
            players.insert(name.clone(), *id);
        }
        let directory: Arc<dyn PlayerDirectory> = Arc::new(players);

        let handler = Arc::new(
            DocumentRecordHandler::open(&config.storage)?
                .with_player_directory(Arc::clone(&directory)),
        );
        let registry = Arc::new(HandlerRegistry::with_builtins(&config.query, directory)?);
        let builder = QueryBuilder::new(registry, config.query.clone());
        let search = SearchCommand::new(
            builder,
            handler.clone(),
            config.query_timeout,
            config.time_zone,
        );

        Ok(Self {
            handler,
            search,
            queue: Arc::new(EntryQueue::new()),
        })
    }

    pub fn handler(&self) -> &Arc<DocumentRecordHandler> {
        &self.handler
    }

    pub fn search(&self) -> &SearchCommand {
        &self.search
    }

    pub fn queue(&self) -> &Arc<EntryQueue> {
        &self.queue
    }

    /// Start the periodic write-queue flush.
    pub fn start_flusher(&self, config: &ServerConfig) -> FlushTask {
        FlushTask::start(
            Arc::clone(&self.queue),
            self.handler.clone(),
            config.flush_interval,
        )
    }

    /// Remove expired records from disk.
    pub async fn purge_expired(&self) -> Result<usize, Error> {
        let store = Arc::clone(self.handler.store());
        let now_us = Utc::now().timestamp_micros();
        let removed = tokio::task::spawn_blocking(move || store.purge_expired(now_us))
            .await
            .map_err(witness_core::Error::from)??;
        if removed > 0 {
            info!(removed, "Purged expired records");
        }
        Ok(removed)
    }

    /// Write queued records and sync the store to disk.
    pub async fn flush(&self) -> Result<usize, Error> {
        let written = self.queue.flush(self.handler.as_ref()).await?;
        self.handler.store().flush()?;
        Ok(written)
    }

    /// Run a console command as the console requester and render the reply.
    pub async fn execute(&self, command: ConsoleCommand) -> String {
        match command {
            ConsoleCommand::Search(arguments) => {
                match self.search.run(Requester::console(), &arguments).await {
                    Ok(results) => {
                        let mut lines: Vec<String> = results.defaults_notice.into_iter().collect();
                        if results.entries.is_empty() {
                            lines.push("No results found.".to_string());
                        }
                        lines.extend(results.entries.iter().map(describe));
                        lines.join("\n")
                    }
                    Err(message) => message,
                }
            }
            ConsoleCommand::Record { event, data } => {
                self.queue.submit(&event, data);
                format!("Queued {event} record ({} pending)", self.queue.len())
            }
            ConsoleCommand::Flush => match self.flush().await {
                Ok(written) => format!("Flushed {written} records"),
                Err(e) => {
                    warn!(error = %e, "Manual flush failed");
                    format!("Flush failed: {e}")
                }
            },
            ConsoleCommand::Purge => match self.purge_expired().await {
                Ok(removed) => format!("Purged {removed} expired records"),
                Err(e) => {
                    warn!(error = %e, "Purge failed");
                    format!("Purge failed: {e}")
                }
            },
            ConsoleCommand::Help => HELP.to_string(),
            ConsoleCommand::Quit => "Shutting down".to_string(),
        }
    }
}
