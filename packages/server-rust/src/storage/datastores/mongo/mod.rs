//! `MongoDB`-backed [`VehicleStore`].
//!
//! Queries run server-side as aggregation pipelines (see [`pipeline`]) and
//! their result documents are decoded by [`decode`]. The client keeps its
//! own connection pool; one store instance is created at startup and shared
//! for the life of the process.

pub mod decode;
pub mod pipeline;

use anyhow::Context;
use async_trait::async_trait;
use carlens_core::{
    CorrelationRow, FilterOptions, FuelDistribution, OverviewStats, PriceRow, VehicleFilter,
    VehicleRow,
};
use mongodb::bson::{doc, Document};
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection};
use tracing::{debug, info};

use crate::storage::config::StoreConfig;
use crate::storage::error::StoreError;
use crate::traits::VehicleStore;

/// Vehicle collection in a `MongoDB` database.
pub struct MongoVehicleStore {
    client: Client,
    database: String,
    collection: Collection<Document>,
}

impl MongoVehicleStore {
    /// Connects and verifies liveness with a `ping` command.
    ///
    /// There is no retry: an unreachable store is reported once and the
    /// caller decides whether to abort.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unreachable`] if the connection string is
    /// invalid or the server does not answer within
    /// [`StoreConfig::connect_timeout`].
    pub async fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        let address = config.redacted_uri();
        let unreachable = |reason: String| StoreError::Unreachable {
            address: address.clone(),
            reason,
        };

        let mut options = ClientOptions::parse(&config.uri)
            .await
            .map_err(|e| unreachable(e.to_string()))?;
        options.server_selection_timeout = Some(config.connect_timeout);
        options.app_name = Some("carlens".to_string());

        let client = Client::with_options(options).map_err(|e| unreachable(e.to_string()))?;
        let store = Self {
            collection: client
                .database(&config.database)
                .collection::<Document>(&config.collection),
            database: config.database.clone(),
            client,
        };

        store.ping().await.map_err(|e| unreachable(format!("{e:#}")))?;
        info!(
            address = %address,
            database = %config.database,
            collection = %config.collection,
            "connected to document store"
        );
        Ok(store)
    }

    /// Runs `pipeline` and collects every result document.
    async fn aggregate(
        &self,
        query: &'static str,
        pipeline: Vec<Document>,
    ) -> anyhow::Result<Vec<Document>> {
        let mut cursor = self
            .collection
            .aggregate(pipeline)
            .await
            .with_context(|| format!("{query} aggregation failed"))?;

        let mut docs = Vec::new();
        while cursor
            .advance()
            .await
            .with_context(|| format!("{query} cursor failed"))?
        {
            docs.push(
                cursor
                    .deserialize_current()
                    .with_context(|| format!("{query} returned an unreadable document"))?,
            );
        }
        debug!(query, documents = docs.len(), "aggregation complete");
        Ok(docs)
    }

    /// Runs a row-per-document pipeline and decodes each document.
    async fn rows<T: Send>(
        &self,
        query: &'static str,
        pipeline: Vec<Document>,
        decode: fn(&Document) -> Result<T, StoreError>,
    ) -> anyhow::Result<Vec<T>> {
        let docs = self.aggregate(query, pipeline).await?;
        docs.iter()
            .map(|doc| decode(doc).map_err(anyhow::Error::from))
            .collect()
    }
}

#[async_trait]
impl VehicleStore for MongoVehicleStore {
    fn backend(&self) -> &'static str {
        "mongodb"
    }

    async fn ping(&self) -> anyhow::Result<()> {
        self.client
            .database(&self.database)
            .run_command(doc! { "ping": 1 })
            .await
            .context("ping failed")?;
        Ok(())
    }

    async fn filter_options(&self) -> anyhow::Result<FilterOptions> {
        let docs = self
            .aggregate("filter options", pipeline::filter_options())
            .await?;
        decode::filter_options(docs.first())?.ok_or_else(|| StoreError::Empty.into())
    }

    async fn overview(&self, filter: &VehicleFilter) -> anyhow::Result<OverviewStats> {
        let docs = self.aggregate("overview", pipeline::overview(filter)).await?;
        Ok(decode::overview(docs.first())?)
    }

    async fn price_distribution(&self, filter: &VehicleFilter) -> anyhow::Result<Vec<PriceRow>> {
        self.rows(
            "price distribution",
            pipeline::price_distribution(filter),
            decode::price_row,
        )
        .await
    }

    async fn fuel_distribution(
        &self,
        filter: &VehicleFilter,
    ) -> anyhow::Result<FuelDistribution> {
        let docs = self
            .aggregate("fuel distribution", pipeline::fuel_distribution(filter))
            .await?;
        Ok(decode::fuel_distribution(&docs)?)
    }

    async fn correlation_rows(
        &self,
        filter: &VehicleFilter,
    ) -> anyhow::Result<Vec<CorrelationRow>> {
        self.rows(
            "correlation",
            pipeline::correlation_rows(filter),
            decode::correlation_row,
        )
        .await
    }

    async fn vehicle_rows(&self, filter: &VehicleFilter) -> anyhow::Result<Vec<VehicleRow>> {
        self.rows(
            "vehicle table",
            pipeline::vehicle_rows(filter),
            decode::vehicle_row,
        )
        .await
    }
}
