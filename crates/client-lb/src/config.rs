//! Tunables for a [`crate::balancer::LoadBalancer`].

use crate::events::BalancerEvent;
use client_lb_core::EventListeners;
use std::time::Duration;

/// `MaxNodeCount`: keep every node the provider returns.
pub const NODE_COUNT_UNLIMITED: usize = usize::MAX;

/// `TTL`: the cache never expires on its own; refresh only happens on a
/// failed selection or an exile that breaches the healthy floor.
pub const TTL_UNLIMITED: Duration = Duration::from_secs(u64::MAX / 1000);

/// `TTL`: refresh before every single selection call.
pub const TTL_NONE: Duration = Duration::ZERO;

/// `MinHealthyNodeRatio`: never force a refresh due to exiles alone.
pub const HEALTHY_NODE_ANY: f64 = 0.0;

/// `MinHealthyNodeRatio`: force a refresh the moment a single node is
/// exiled.
pub const HEALTHY_NODE_MUST_ALL: f64 = 1.0;

/// `MaxNodeFailedRatio`: exile on the very first reported failure.
pub const NODE_FAILED_ANY: f64 = 0.0;

/// `MaxNodeFailedRatio`: disables failure accounting entirely — no node is
/// ever exiled and no `FailureMetrics` instance is created.
pub const NODE_FAILED_UNLIMITED: f64 = 1.0;

/// Default `MinSampleSize`.
pub const DEFAULT_MIN_SAMPLE_SIZE: u64 = 10;

/// Configuration for a [`crate::balancer::LoadBalancer`].
pub struct LoadBalancerConfig {
    pub(crate) max_node_count: usize,
    pub(crate) ttl: Duration,
    pub(crate) min_healthy_node_ratio: f64,
    pub(crate) max_node_failed_ratio: f64,
    pub(crate) min_sample_size: u64,
    pub(crate) event_listeners: EventListeners<BalancerEvent>,
    pub(crate) name: String,
}

impl LoadBalancerConfig {
    /// Creates a new configuration builder: unlimited node count,
    /// unlimited TTL, any healthy ratio accepted, failure accounting
    /// disabled.
    pub fn builder() -> LoadBalancerConfigBuilder {
        LoadBalancerConfigBuilder::new()
    }
}

/// Builder for [`LoadBalancerConfig`].
pub struct LoadBalancerConfigBuilder {
    max_node_count: usize,
    ttl: Duration,
    min_healthy_node_ratio: f64,
    max_node_failed_ratio: f64,
    min_sample_size: u64,
    event_listeners: EventListeners<BalancerEvent>,
    name: String,
}

impl LoadBalancerConfigBuilder {
    pub fn new() -> Self {
        Self {
            max_node_count: NODE_COUNT_UNLIMITED,
            ttl: TTL_UNLIMITED,
            min_healthy_node_ratio: HEALTHY_NODE_ANY,
            max_node_failed_ratio: NODE_FAILED_UNLIMITED,
            min_sample_size: DEFAULT_MIN_SAMPLE_SIZE,
            event_listeners: EventListeners::new(),
            name: String::from("<unnamed>"),
        }
    }

    /// Caps how many nodes are exposed per selection snapshot.
    ///
    /// Default: [`NODE_COUNT_UNLIMITED`].
    pub fn max_node_count(mut self, n: usize) -> Self {
        self.max_node_count = n;
        self
    }

    /// How long a membership snapshot is trusted before a background
    /// refresh is triggered on the next selection call.
    ///
    /// Default: [`TTL_UNLIMITED`].
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// The floor, as a fraction of the original membership size, below
    /// which exiles trigger a synchronous refresh instead of just shrinking
    /// the live set.
    ///
    /// Default: [`HEALTHY_NODE_ANY`].
    pub fn min_healthy_node_ratio(mut self, ratio: f64) -> Self {
        self.min_healthy_node_ratio = ratio;
        self
    }

    /// The failure ratio above which a node is exiled. Set to
    /// [`NODE_FAILED_UNLIMITED`] to disable failure accounting altogether.
    ///
    /// Default: [`NODE_FAILED_UNLIMITED`].
    pub fn max_node_failed_ratio(mut self, ratio: f64) -> Self {
        self.max_node_failed_ratio = ratio;
        self
    }

    /// How many times a node must be selected before its failure ratio is
    /// considered meaningful.
    ///
    /// Default: [`DEFAULT_MIN_SAMPLE_SIZE`].
    pub fn min_sample_size(mut self, n: u64) -> Self {
        self.min_sample_size = n;
        self
    }

    /// Give this balancer a human-readable name for observability.
    ///
    /// Default: `<unnamed>`.
    pub fn name<N: Into<String>>(mut self, n: N) -> Self {
        self.name = n.into();
        self
    }

    /// Register a callback for completed refreshes.
    pub fn on_refresh<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        use client_lb_core::FnListener;
        self.event_listeners
            .add(FnListener::new(move |event: &BalancerEvent| {
                if let BalancerEvent::Refreshed { node_count, .. } = event {
                    f(*node_count);
                }
            }));
        self
    }

    /// Register a callback for node exiles.
    pub fn on_exile<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, f64) + Send + Sync + 'static,
    {
        use client_lb_core::FnListener;
        self.event_listeners
            .add(FnListener::new(move |event: &BalancerEvent| {
                if let BalancerEvent::NodeExiled {
                    node_key,
                    failure_ratio,
                    ..
                } = event
                {
                    f(node_key, *failure_ratio);
                }
            }));
        self
    }

    /// Register a callback for healthy-floor breaches.
    pub fn on_healthy_floor_breached<F>(mut self, f: F) -> Self
    where
        F: Fn(i64, i64) + Send + Sync + 'static,
    {
        use client_lb_core::FnListener;
        self.event_listeners
            .add(FnListener::new(move |event: &BalancerEvent| {
                if let BalancerEvent::HealthyFloorBreached {
                    original_count,
                    current_count,
                    ..
                } = event
                {
                    f(*original_count, *current_count);
                }
            }));
        self
    }

    /// Builds the configuration.
    ///
    /// # Panics
    ///
    /// Panics if `max_node_failed_ratio` or `min_healthy_node_ratio` is
    /// outside `[0.0, 1.0]`, or if `min_sample_size` is `0` — all three are
    /// misconfigurations, not runtime conditions.
    pub fn build(self) -> LoadBalancerConfig {
        assert!(
            (0.0..=1.0).contains(&self.max_node_failed_ratio),
            "max_node_failed_ratio must be within [0.0, 1.0], got {}",
            self.max_node_failed_ratio
        );
        assert!(
            (0.0..=1.0).contains(&self.min_healthy_node_ratio),
            "min_healthy_node_ratio must be within [0.0, 1.0], got {}",
            self.min_healthy_node_ratio
        );
        assert!(
            self.min_sample_size > 0,
            "min_sample_size must be positive, got 0"
        );

        LoadBalancerConfig {
            max_node_count: self.max_node_count,
            ttl: self.ttl,
            min_healthy_node_ratio: self.min_healthy_node_ratio,
            max_node_failed_ratio: self.max_node_failed_ratio,
            min_sample_size: self.min_sample_size,
            event_listeners: self.event_listeners,
            name: self.name,
        }
    }
}

impl Default for LoadBalancerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
