//! NUT collector: fans out over targets and merges per-device batches.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;

use crate::protocol::{Client, ClientOptions};

use super::mapping::map_variables;
use super::observation::Observation;
use super::target::Target;
use super::traits::{Collector, TargetDevices};

/// Collector settings, the `nut:` block of the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NutConfig {
    /// Servers to poll, in output order.
    pub targets: Vec<Target>,
    /// Dial deadline per connection.
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
    /// Deadline per read or write.
    #[serde(with = "humantime_serde")]
    pub io_timeout: Duration,
    /// Bound on a whole round; partial results are returned on expiry.
    #[serde(with = "humantime_serde")]
    pub round_timeout: Option<Duration>,
    /// Targets collected at the same time.
    pub concurrency: usize,
}

impl Default for NutConfig {
    fn default() -> Self {
        let options = ClientOptions::default();
        Self {
            targets: vec![Target::from("localhost")],
            connect_timeout: options.connect_timeout,
            io_timeout: options.io_timeout,
            round_timeout: None,
            concurrency: 4,
        }
    }
}

impl NutConfig {
    /// Configuration for `targets` with default timeouts and concurrency.
    pub fn new<I, T>(targets: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Target>,
    {
        Self {
            targets: targets.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Set the TCP connect deadline.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the per-read and per-write deadline.
    pub fn with_io_timeout(mut self, timeout: Duration) -> Self {
        self.io_timeout = timeout;
        self
    }

    /// Bound a whole collection round; unset means unbounded.
    pub fn with_round_timeout(mut self, timeout: Duration) -> Self {
        self.round_timeout = Some(timeout);
        self
    }

    /// Set how many targets are collected at once.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Per-connection deadlines.
    pub fn client_options(&self) -> ClientOptions {
        ClientOptions::default()
            .with_connect_timeout(self.connect_timeout)
            .with_io_timeout(self.io_timeout)
    }
}

/// Observations of one device, tagged with the index of its target.
#[derive(Debug)]
struct DeviceBatch {
    target: usize,
    observations: Vec<Observation>,
}

/// Collects observations from every configured NUT server.
///
/// Rounds are stateless: each one dials fresh connections and closes them
/// before returning.
#[derive(Debug, Clone)]
pub struct NutCollector {
    config: NutConfig,
}

impl NutCollector {
    /// Create a collector; targets are not contacted until a round runs.
    pub fn new(config: NutConfig) -> Self {
        Self { config }
    }

    /// Active configuration.
    pub fn config(&self) -> &NutConfig {
        &self.config
    }

    /// Run one round, bounded by `round_timeout` when configured.
    pub async fn collect(&self) -> Vec<Observation> {
        match self.config.round_timeout {
            Some(limit) => self.collect_until(tokio::time::sleep(limit)).await,
            None => self.collect_until(std::future::pending()).await,
        }
    }

    /// Run one round, stopping early when `cancel` resolves.
    ///
    /// On cancellation every worker is aborted, which drops its connection,
    /// and the devices already finished are returned.
    pub async fn collect_until<F>(&self, cancel: F) -> Vec<Observation>
    where
        F: Future<Output = ()>,
    {
        let started = Instant::now();
        let targets = &self.config.targets;
        let options = self.config.client_options();
        let permits = Arc::new(Semaphore::new(self.config.concurrency.max(1)));
        let (tx, mut rx) = mpsc::unbounded_channel::<DeviceBatch>();

        let mut workers = JoinSet::new();
        for (index, target) in targets.iter().cloned().enumerate() {
            let permits = Arc::clone(&permits);
            let tx = tx.clone();
            workers.spawn(async move {
                let Ok(_permit) = permits.acquire_owned().await else {
                    return;
                };
                collect_target(index, &target, &options, &tx).await;
            });
        }
        drop(tx);

        let mut buckets: Vec<Vec<Observation>> = (0..targets.len()).map(|_| Vec::new()).collect();
        tokio::pin!(cancel);

        loop {
            tokio::select! {
                batch = rx.recv() => match batch {
                    Some(batch) => buckets[batch.target].extend(batch.observations),
                    None => break,
                },
                () = &mut cancel => {
                    tracing::warn!(
                        elapsed = ?started.elapsed(),
                        "Collection round cancelled, returning partial results"
                    );
                    workers.shutdown().await;
                    while let Ok(batch) = rx.try_recv() {
                        buckets[batch.target].extend(batch.observations);
                    }
                    break;
                }
            }
        }

        while let Some(joined) = workers.join_next().await {
            match joined {
                Err(e) if e.is_panic() => {
                    tracing::error!(error = %e, "Collector worker panicked");
                }
                _ => {}
            }
        }

        let observations: Vec<Observation> = buckets.into_iter().flatten().collect();
        tracing::debug!(
            targets = targets.len(),
            observations = observations.len(),
            elapsed = ?started.elapsed(),
            "Collection round finished"
        );
        observations
    }

    /// List the devices of every target, in configured order.
    pub async fn enumerate_devices(&self) -> Vec<TargetDevices> {
        let options = self.config.client_options();
        let permits = Arc::new(Semaphore::new(self.config.concurrency.max(1)));

        let mut workers = JoinSet::new();
        for (index, target) in self.config.targets.iter().cloned().enumerate() {
            let permits = Arc::clone(&permits);
            workers.spawn(async move {
                let Ok(_permit) = permits.acquire_owned().await else {
                    return (index, Err("collector shutting down".to_string()));
                };
                let listing = list_target(&target, &options).await;
                (index, listing)
            });
        }

        let mut results: Vec<TargetDevices> = self
            .config
            .targets
            .iter()
            .map(|target| TargetDevices {
                target: target.clone(),
                devices: Vec::new(),
                error: Some("worker did not complete".to_string()),
            })
            .collect();

        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok((index, Ok(devices))) => {
                    results[index].devices = devices;
                    results[index].error = None;
                }
                Ok((index, Err(error))) => results[index].error = Some(error),
                Err(e) => tracing::error!(error = %e, "Enumeration worker failed"),
            }
        }
        results
    }
}

#[async_trait]
impl Collector for NutCollector {
    async fn collect(&self) -> Vec<Observation> {
        NutCollector::collect(self).await
    }

    async fn enumerate_devices(&self) -> Vec<TargetDevices> {
        NutCollector::enumerate_devices(self).await
    }
}

/// Collect every device of one target, sending one batch per device.
async fn collect_target(
    index: usize,
    target: &Target,
    options: &ClientOptions,
    tx: &mpsc::UnboundedSender<DeviceBatch>,
) {
    let mut client = match Client::dial(&target.dial_address(), options).await {
        Ok(client) => client,
        Err(e) => {
            tracing::warn!(server = %target, error = %e, "Skipping unreachable NUT server");
            return;
        }
    };

    let devices = match client.list_devices().await {
        Ok(devices) => devices,
        Err(e) => {
            tracing::warn!(server = %target, error = %e, "Failed to list devices");
            let _ = client.close().await;
            return;
        }
    };

    for device in devices {
        match client.list_variables(&device).await {
            Ok(variables) => {
                let observations = map_variables(&device, &variables);
                let batch = DeviceBatch {
                    target: index,
                    observations,
                };
                if tx.send(batch).is_err() {
                    break;
                }
            }
            Err(e) if e.is_in_sync() => {
                tracing::warn!(server = %target, device = %device, error = %e,
                    "Skipping device"
                );
            }
            Err(e) => {
                tracing::warn!(server = %target, device = %device, error = %e,
                    "Connection out of sync, skipping remaining devices"
                );
                break;
            }
        }
    }

    if let Err(e) = client.close().await {
        tracing::debug!(server = %target, error = %e, "Failed to close connection");
    }
}

async fn list_target(target: &Target, options: &ClientOptions) -> Result<Vec<String>, String> {
    let mut client = Client::dial(&target.dial_address(), options)
        .await
        .map_err(|e| e.to_string())?;
    let devices = client.list_devices().await.map_err(|e| e.to_string());
    if let Err(e) = client.close().await {
        tracing::debug!(server = %target, error = %e, "Failed to close connection");
    }
    devices
}
