//! Concrete events the balancer emits through its [`EventListeners`].

use client_lb_core::LoadBalancerEvent;
use std::time::Instant;

/// Events emitted by a [`crate::balancer::LoadBalancer`] over its lifetime.
#[derive(Debug, Clone)]
pub enum BalancerEvent {
    /// A membership refresh completed (whether or not it changed anything).
    Refreshed {
        balancer: String,
        node_count: usize,
        timestamp: Instant,
    },
    /// A node was exiled for exceeding its failure ratio.
    NodeExiled {
        balancer: String,
        node_key: String,
        failure_ratio: f64,
        timestamp: Instant,
    },
    /// The healthy-node floor (`min_healthy_node_ratio`) was breached,
    /// triggering a synchronous refresh.
    HealthyFloorBreached {
        balancer: String,
        original_count: i64,
        current_count: i64,
        timestamp: Instant,
    },
}

impl LoadBalancerEvent for BalancerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            BalancerEvent::Refreshed { .. } => "refreshed",
            BalancerEvent::NodeExiled { .. } => "node_exiled",
            BalancerEvent::HealthyFloorBreached { .. } => "healthy_floor_breached",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            BalancerEvent::Refreshed { timestamp, .. } => *timestamp,
            BalancerEvent::NodeExiled { timestamp, .. } => *timestamp,
            BalancerEvent::HealthyFloorBreached { timestamp, .. } => *timestamp,
        }
    }

    fn balancer_name(&self) -> &str {
        match self {
            BalancerEvent::Refreshed { balancer, .. } => balancer,
            BalancerEvent::NodeExiled { balancer, .. } => balancer,
            BalancerEvent::HealthyFloorBreached { balancer, .. } => balancer,
        }
    }
}
