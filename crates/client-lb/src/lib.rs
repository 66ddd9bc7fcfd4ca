//! A client-side load balancer.
//!
//! Combines a pluggable [`NodeProvider`] (where nodes come from), a
//! pluggable [`Strategy`] (how one is picked), and a [`LoadBalancer`]
//! orchestrator that refreshes membership on a TTL, deduplicates
//! concurrent refreshes and exiles via single-flight, and evicts nodes
//! whose observed failure ratio crosses a configurable threshold.
//!
//! ```no_run
//! use client_lb::{LoadBalancer, LoadBalancerConfig, RoundRobinStrategy, StaticProvider, StringNode};
//! use std::sync::Arc;
//!
//! # async fn example() {
//! let provider = StaticProvider::new(vec![
//!     Arc::new(StringNode::new("10.0.0.1:8080")),
//!     Arc::new(StringNode::new("10.0.0.2:8080")),
//! ]);
//! let lb = LoadBalancer::new(provider, RoundRobinStrategy::new(), LoadBalancerConfig::builder().build()).await;
//!
//! let node = lb.next().await.unwrap();
//! // ... use `node` ...
//! lb.node_failed(&node).await;
//! # }
//! ```

mod balancer;
mod config;
mod events;
mod group;
mod metrics;
mod node;
mod provider;
mod singleflight;
mod strategy;

pub use balancer::LoadBalancer;
pub use config::{
    LoadBalancerConfig, LoadBalancerConfigBuilder, DEFAULT_MIN_SAMPLE_SIZE, HEALTHY_NODE_ANY,
    HEALTHY_NODE_MUST_ALL, NODE_COUNT_UNLIMITED, NODE_FAILED_ANY, NODE_FAILED_UNLIMITED,
    TTL_NONE, TTL_UNLIMITED,
};
pub use events::BalancerEvent;
pub use metrics::FailureMetrics;
pub use node::{Node, SharedNode, StringNode};
pub use provider::{NodeProvider, RoundRobinDnsProvider, StaticProvider};
pub use strategy::{HashedStrategy, RoundRobinStrategy, Strategy};

pub use client_lb_core::LbError;
