//! # Listener - Subscription Pump and Shard Workers
//!
//! ## Purpose
//! Pulls raw deliveries from the inbound subscription and drives each one
//! through decode, correlate, notify, and publish. Each delivery is handled
//! to completion (or to a reported failure) before its shard accepts the
//! next one.
//!
//! ## Ordering Model
//! One worker task per shard, fed over a bounded channel: deliveries from
//! the same shard are processed strictly in order, while different shards
//! proceed in parallel. Workers share no mutable state beyond the transport
//! client and the metrics counters.
//!
//! ## Error Handling
//! Every failure is contained at this boundary:
//! - malformed payloads are logged and skipped
//! - a rejected publish is logged and counted; the subscription stays live
//! - a failed observer push is logged and counted, nothing more
//!
//! Nothing that happens to a single delivery can take the process down.

use crate::correlate::{CorrelatedReply, CorrelationEngine};
use crate::metrics::BridgeMetrics;
use crate::notify::Notifier;
use crate::publish::Publisher;
use crate::transport::{Delivery, ShardId, Subscription, TransportError};
use config::{ReplySettings, UndeliverablePolicy};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument, warn};

/// Consumes the inbound subscription until it ends.
pub struct Listener {
    subscription: Box<dyn Subscription>,
    shard_buffer: usize,
    ctx: Arc<ProcessingContext>,
}

struct ProcessingContext {
    engine: CorrelationEngine,
    publisher: Publisher,
    notifier: Notifier,
    reply_policy: ReplySettings,
    metrics: Arc<RwLock<BridgeMetrics>>,
}

impl Listener {
    pub fn new(
        subscription: Box<dyn Subscription>,
        engine: CorrelationEngine,
        publisher: Publisher,
        notifier: Notifier,
        reply_policy: ReplySettings,
        shard_buffer: usize,
        metrics: Arc<RwLock<BridgeMetrics>>,
    ) -> Self {
        Self {
            subscription,
            shard_buffer,
            ctx: Arc::new(ProcessingContext {
                engine,
                publisher,
                notifier,
                reply_policy,
                metrics,
            }),
        }
    }

    /// Pump the subscription, dispatching deliveries to shard workers.
    /// Returns once the subscription ends and all in-flight work drained.
    pub async fn run(mut self) -> Result<(), TransportError> {
        info!("listener started");

        let mut workers: HashMap<ShardId, mpsc::Sender<Delivery>> = HashMap::new();
        let mut tasks = JoinSet::new();

        while let Some(delivery) = self.subscription.pull().await? {
            let shard = delivery.shard;
            let sender = workers.entry(shard).or_insert_with(|| {
                let (sender, receiver) = mpsc::channel(self.shard_buffer);
                tasks.spawn(shard_worker(shard, receiver, Arc::clone(&self.ctx)));
                sender
            });
            if sender.send(delivery).await.is_err() {
                // Workers only stop when their channel closes, so this is
                // unreachable in practice; log it rather than guess.
                error!(shard, "shard worker gone, delivery dropped");
                workers.remove(&shard);
            }
        }

        info!("subscription ended, draining shard workers");
        drop(workers);
        while tasks.join_next().await.is_some() {}

        info!("listener stopped");
        Ok(())
    }
}

async fn shard_worker(
    shard: ShardId,
    mut deliveries: mpsc::Receiver<Delivery>,
    ctx: Arc<ProcessingContext>,
) {
    debug!(shard, "shard worker started");
    while let Some(delivery) = deliveries.recv().await {
        ctx.process(delivery).await;
    }
    debug!(shard, "shard worker stopped");
}

impl ProcessingContext {
    /// Handle one delivery to completion.
    #[instrument(skip_all, fields(shard = delivery.shard))]
    async fn process(&self, delivery: Delivery) {
        let request = match codec::decode(&delivery.payload) {
            Ok(Some(request)) => request,
            Ok(None) => {
                debug!("empty delivery, nothing to process");
                self.metrics.write().await.empty_deliveries += 1;
                return;
            }
            Err(e) => {
                warn!(error = %e, "skipping malformed envelope");
                self.metrics.write().await.malformed_envelopes += 1;
                return;
            }
        };

        info!(
            envelope_id = request.id(),
            event_type = request.event_type(),
            "received envelope"
        );
        self.metrics.write().await.envelopes_received += 1;

        let CorrelatedReply { reply, destination } = self.engine.correlate(&request);

        if !self.notifier.notify(&request, &reply).await {
            self.metrics.write().await.notifications_failed += 1;
        }

        let destination = match destination {
            Some(destination) => destination,
            None => match self.undeliverable_destination(&reply).await {
                Some(destination) => destination,
                None => return,
            },
        };

        match self.publisher.publish(&reply, &destination).await {
            Ok(()) => {
                self.metrics.write().await.replies_published += 1;
                debug!(envelope_id = reply.id(), destination = %destination, "reply published");
            }
            Err(e) => {
                // Reported, not fatal: the next delivery is still accepted
                error!(error = %e, destination = %destination, "failed to publish reply");
                self.metrics.write().await.delivery_failures += 1;
            }
        }
    }

    /// Apply the configured policy to a reply whose request named no
    /// return topic. `None` means the reply is dropped.
    async fn undeliverable_destination(&self, reply: &types::Envelope) -> Option<String> {
        self.metrics.write().await.undeliverable_replies += 1;
        match self.reply_policy.undeliverable {
            UndeliverablePolicy::Redirect => match &self.reply_policy.undeliverable_topic {
                Some(topic) => {
                    warn!(
                        envelope_id = reply.id(),
                        topic = %topic,
                        "request named no return topic, redirecting reply"
                    );
                    Some(topic.clone())
                }
                None => {
                    // Config validation rejects this combination up front
                    error!(
                        envelope_id = reply.id(),
                        "redirect policy without a topic, dropping reply"
                    );
                    None
                }
            },
            UndeliverablePolicy::Drop => {
                warn!(
                    envelope_id = reply.id(),
                    "request named no return topic, dropping reply"
                );
                None
            }
        }
    }
}
