// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Event channel connecting the activity tracker to the recommendation
//! listener.
//!
//! The model is a direct exchange: publishers address an exchange with a
//! routing key, consumers bind a named queue to an (exchange, routing key)
//! pair, and every publish is delivered to each queue whose binding matches.
//! Delivery guarantees belong to the transport, not to callers.

use crate::config::{Config, EventBackend};
use async_trait::async_trait;
use dashmap::DashMap;
use futures_util::stream::{self, BoxStream, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Where a publisher sends events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishTarget {
    pub exchange: String,
    pub routing_key: String,
}

impl PublishTarget {
    pub fn from_config(config: &Config) -> Self {
        Self {
            exchange: config.exchange.clone(),
            routing_key: config.routing_key.clone(),
        }
    }
}

/// A consumer queue and the events it is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueBinding {
    pub queue: String,
    pub exchange: String,
    pub routing_key: String,
}

impl QueueBinding {
    pub fn from_config(config: &Config) -> Self {
        Self {
            queue: config.queue.clone(),
            exchange: config.exchange.clone(),
            routing_key: config.routing_key.clone(),
        }
    }

    fn matches(&self, target: &PublishTarget) -> bool {
        self.exchange == target.exchange && self.routing_key == target.routing_key
    }
}

/// One message handed to a consumer.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub routing_key: String,
    pub payload: Vec<u8>,
}

/// Stream of deliveries for one queue. Ends when the channel shuts down.
pub type Deliveries = BoxStream<'static, Delivery>;

#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("Failed to serialize event: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to publish event: {0}")]
    Publish(String),

    #[error("Failed to subscribe: {0}")]
    Subscribe(String),

    #[error("Event backend unavailable: {0}")]
    Unavailable(String),
}

/// Publish/subscribe transport.
#[async_trait]
pub trait EventChannel: Send + Sync {
    /// Hand `payload` to the transport. Success means the transport accepted
    /// it, not that any consumer received it.
    async fn publish(&self, target: &PublishTarget, payload: Vec<u8>) -> Result<(), EventError>;

    /// Start consuming the queue described by `binding`.
    async fn subscribe(&self, binding: &QueueBinding) -> Result<Deliveries, EventError>;
}

/// Serialize `event` as JSON and publish it.
pub async fn publish_json<T: Serialize + ?Sized>(
    channel: &dyn EventChannel,
    target: &PublishTarget,
    event: &T,
) -> Result<(), EventError> {
    let payload = serde_json::to_vec(event)?;
    channel.publish(target, payload).await
}

/// Build the channel selected in `config`.
pub fn channel_from_config(config: &Config) -> Result<Arc<dyn EventChannel>, EventError> {
    match config.event_backend {
        EventBackend::InProcess => Ok(Arc::new(InProcessBroker::new())),
        #[cfg(feature = "kafka")]
        EventBackend::Kafka => Ok(Arc::new(kafka::KafkaChannel::new(&config.kafka_brokers)?)),
        #[cfg(not(feature = "kafka"))]
        EventBackend::Kafka => Err(EventError::Unavailable(
            "built without the `kafka` feature".to_string(),
        )),
    }
}

// ─── In-process broker ───────────────────────────────────────────

struct BoundQueue {
    binding: QueueBinding,
    sender: mpsc::UnboundedSender<Delivery>,
}

/// Direct exchange living inside this process.
///
/// Messages published while no queue matches are dropped, like an
/// unroutable message on a real broker. A queue has a single consumer;
/// subscribing again replaces the previous one.
#[derive(Default)]
pub struct InProcessBroker {
    queues: DashMap<String, BoundQueue>,
}

impl InProcessBroker {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventChannel for InProcessBroker {
    async fn publish(&self, target: &PublishTarget, payload: Vec<u8>) -> Result<(), EventError> {
        let mut delivered = 0usize;

        for queue in self.queues.iter() {
            if !queue.binding.matches(target) {
                continue;
            }

            let delivery = Delivery {
                routing_key: target.routing_key.clone(),
                payload: payload.clone(),
            };

            if queue.sender.send(delivery).is_ok() {
                delivered += 1;
            } else {
                tracing::debug!(queue = %queue.key(), "Consumer gone, message not delivered");
            }
        }

        if delivered == 0 {
            tracing::debug!(
                exchange = %target.exchange,
                routing_key = %target.routing_key,
                "No queue bound, message dropped"
            );
        }

        Ok(())
    }

    async fn subscribe(&self, binding: &QueueBinding) -> Result<Deliveries, EventError> {
        let (sender, receiver) = mpsc::unbounded_channel();

        self.queues.insert(
            binding.queue.clone(),
            BoundQueue {
                binding: binding.clone(),
                sender,
            },
        );

        tracing::info!(
            queue = %binding.queue,
            exchange = %binding.exchange,
            routing_key = %binding.routing_key,
            "Queue bound"
        );

        Ok(stream::unfold(receiver, |mut receiver| async move {
            receiver.recv().await.map(|delivery| (delivery, receiver))
        })
        .boxed())
    }
}

// ─── Kafka ───────────────────────────────────────────────────────

/// Kafka transport: exchange -> topic, routing key -> record key,
/// queue -> consumer group.
#[cfg(feature = "kafka")]
pub mod kafka {
    use super::{Deliveries, Delivery, EventChannel, EventError, PublishTarget, QueueBinding};
    use async_trait::async_trait;
    use futures_util::stream::{self, StreamExt};
    use rdkafka::config::ClientConfig;
    use rdkafka::consumer::{Consumer, StreamConsumer};
    use rdkafka::message::Message;
    use rdkafka::producer::{FutureProducer, FutureRecord};
    use std::sync::Arc;
    use std::time::Duration;

    pub struct KafkaChannel {
        producer: FutureProducer,
        brokers: String,
    }

    impl KafkaChannel {
        pub fn new(brokers: &str) -> Result<Self, EventError> {
            let producer: FutureProducer = ClientConfig::new()
                .set("bootstrap.servers", brokers)
                .set("message.timeout.ms", "5000")
                .create()
                .map_err(|e| {
                    EventError::Unavailable(format!("Failed to create Kafka producer: {}", e))
                })?;

            tracing::info!(brokers = %brokers, "Kafka event channel initialized");

            Ok(Self {
                producer,
                brokers: brokers.to_string(),
            })
        }
    }

    #[async_trait]
    impl EventChannel for KafkaChannel {
        async fn publish(
            &self,
            target: &PublishTarget,
            payload: Vec<u8>,
        ) -> Result<(), EventError> {
            let record = FutureRecord::to(&target.exchange)
                .key(&target.routing_key)
                .payload(&payload);

            match self.producer.send(record, Duration::from_secs(5)).await {
                Ok(delivery) => {
                    tracing::debug!(
                        topic = %target.exchange,
                        delivery = ?delivery,
                        "Event published to Kafka"
                    );
                    Ok(())
                }
                Err((e, _)) => Err(EventError::Publish(e.to_string())),
            }
        }

        async fn subscribe(&self, binding: &QueueBinding) -> Result<Deliveries, EventError> {
            let consumer: StreamConsumer = ClientConfig::new()
                .set("bootstrap.servers", &self.brokers)
                .set("group.id", &binding.queue)
                .set("enable.auto.commit", "true")
                .set("auto.offset.reset", "earliest")
                .set("enable.partition.eof", "false")
                .create()
                .map_err(|e| {
                    EventError::Subscribe(format!("Failed to create Kafka consumer: {}", e))
                })?;

            consumer
                .subscribe(&[binding.exchange.as_str()])
                .map_err(|e| EventError::Subscribe(e.to_string()))?;

            tracing::info!(
                group = %binding.queue,
                topic = %binding.exchange,
                "Subscribed to Kafka topic"
            );

            let state = (Arc::new(consumer), binding.routing_key.clone());
            Ok(stream::unfold(state, |(consumer, routing_key)| async move {
                loop {
                    let delivery = match consumer.recv().await {
                        Ok(message) => {
                            if message.key() != Some(routing_key.as_bytes()) {
                                continue;
                            }
                            Delivery {
                                routing_key: routing_key.clone(),
                                payload: message.payload().map(<[u8]>::to_vec).unwrap_or_default(),
                            }
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Kafka receive failed");
                            tokio::time::sleep(Duration::from_secs(1)).await;
                            continue;
                        }
                    };
                    return Some((delivery, (consumer, routing_key)));
                }
            })
            .boxed())
        }
    }
}
