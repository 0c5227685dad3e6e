//! Thin adapter around `neo4rs` to isolate driver usage.
//!
//! Every mutation in the crate funnels through [`GraphClient::execute_write`];
//! reads that need no isolation use the auto-commit helpers. The rest of the
//! crate never names a driver type except `Txn`/`Row` passed through here.

use neo4rs::{ConfigBuilder, Graph, Query, Row, Txn};
use tracing::{debug, info, warn};

use crate::config::GraphConfig;
use crate::errors::{GraphError, Result};

#[derive(Clone)]
pub struct GraphClient {
    graph: Graph,
}

impl GraphClient {
    /// Connects and verifies connectivity with a trivial round trip.
    ///
    /// # Errors
    /// Returns `GraphError::Driver` when the server is unreachable or the
    /// credentials are rejected.
    pub async fn connect(cfg: &GraphConfig) -> Result<Self> {
        let config = ConfigBuilder::default()
            .uri(&cfg.uri)
            .user(&cfg.user)
            .password(&cfg.password)
            .build()?;
        let graph = Graph::connect(config).await?;
        graph.run(neo4rs::query("RETURN 1")).await?;
        info!(uri = %cfg.uri, "connection to the graph store established");
        Ok(Self { graph })
    }

    /// Runs `f` inside a write transaction; commits on success, rolls back
    /// on any error before propagating it.
    pub async fn execute_write<T, F>(&self, f: F) -> Result<T>
    where
        F: AsyncFnOnce(&mut Txn) -> Result<T>,
    {
        let mut txn = self.graph.start_txn().await?;
        let outcome = f(&mut txn).await;
        match outcome {
            Ok(value) => {
                txn.commit().await?;
                Ok(value)
            }
            Err(err) => {
                debug!("write transaction failed, rolling back: {err}");
                if let Err(rollback_err) = txn.rollback().await {
                    warn!("rollback failed: {rollback_err}");
                }
                Err(err)
            }
        }
    }

    /// Auto-commit statement without results.
    pub async fn run(&self, q: Query) -> Result<()> {
        self.graph.run(q).await?;
        Ok(())
    }

    /// Auto-commit read returning the first row, if any.
    pub async fn single(&self, q: Query) -> Result<Option<Row>> {
        let mut stream = self.graph.execute(q).await?;
        Ok(stream.next().await?)
    }

    /// Auto-commit read returning every row.
    pub async fn all(&self, q: Query) -> Result<Vec<Row>> {
        let mut stream = self.graph.execute(q).await?;
        let mut rows = Vec::new();
        while let Some(row) = stream.next().await? {
            rows.push(row);
        }
        Ok(rows)
    }
}

/// First row of a statement executed inside `tx`.
pub async fn txn_single(tx: &mut Txn, q: Query) -> Result<Option<Row>> {
    let mut stream = tx.execute(q).await?;
    let row = stream.next(tx.handle()).await?;
    Ok(row)
}

/// Every row of a statement executed inside `tx`.
pub async fn txn_all(tx: &mut Txn, q: Query) -> Result<Vec<Row>> {
    let mut stream = tx.execute(q).await?;
    let mut rows = Vec::new();
    while let Some(row) = stream.next(tx.handle()).await? {
        rows.push(row);
    }
    Ok(rows)
}

/// First row, or a `NotFound` with the given message.
pub async fn txn_required(tx: &mut Txn, q: Query, missing: impl Into<String>) -> Result<Row> {
    txn_single(tx, q)
        .await?
        .ok_or_else(|| GraphError::NotFound(missing.into()))
}
