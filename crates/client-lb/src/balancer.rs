//! The balancer orchestrator: ties a [`NodeProvider`], a [`Strategy`], and
//! the failure/refresh machinery together.

use crate::config::{LoadBalancerConfig, NODE_FAILED_UNLIMITED, TTL_UNLIMITED};
use crate::events::BalancerEvent;
use crate::group::Group;
use crate::metrics::FailureMetrics;
use crate::node::SharedNode;
use crate::provider::NodeProvider;
use crate::singleflight::SingleFlight;
use crate::strategy::Strategy;
use client_lb_core::LbError;
use parking_lot::Mutex;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[cfg(feature = "tracing")]
use tracing::debug;

/// Pushes a due TTL deadline this far into the future once it fires, so a
/// burst of concurrent callers after expiry only triggers one background
/// refresh rather than one per caller; the real deadline is installed once
/// that refresh actually completes.
const TTL_REARM_GUARD: Duration = Duration::from_secs(315_360_000);

/// Coordinates node selection across a membership that refreshes on a TTL
/// and shrinks as nodes are reported failed.
///
/// `Input` is the type [`LoadBalancer::next_for`] accepts, matching the
/// strategy's own `Input` parameter; round-robin balancers can leave it at
/// the default `()` and just use [`LoadBalancer::next`].
pub struct LoadBalancer<P, S, Input: ?Sized = ()>
where
    P: NodeProvider,
    S: Strategy<Input>,
{
    provider: P,
    strategy: S,
    config: LoadBalancerConfig,
    nodes: Group,
    metrics: Option<FailureMetrics>,
    sf: SingleFlight<String, ()>,
    ttl_deadline: Option<Mutex<Instant>>,
    _input: PhantomData<fn(&Input)>,
}

impl<P, S, Input> LoadBalancer<P, S, Input>
where
    P: NodeProvider,
    S: Strategy<Input>,
    Input: ?Sized,
{
    /// Builds a balancer and performs its initial synchronous refresh
    /// before returning, so the first call to [`LoadBalancer::next`] never
    /// has to refresh-and-retry against an empty set.
    pub async fn new(provider: P, strategy: S, config: LoadBalancerConfig) -> Arc<Self> {
        let metrics = if config.max_node_failed_ratio >= NODE_FAILED_UNLIMITED {
            None
        } else {
            Some(FailureMetrics::new(config.min_sample_size))
        };

        let ttl_deadline = if config.ttl == TTL_UNLIMITED {
            None
        } else {
            Some(Mutex::new(Instant::now() + config.ttl))
        };

        let lb = Arc::new(Self {
            nodes: Group::new(config.max_node_count),
            provider,
            strategy,
            metrics,
            sf: SingleFlight::new(),
            ttl_deadline,
            config,
            _input: PhantomData,
        });

        lb.refresh().await;
        lb
    }

    /// Returns the next node from the strategy's current sequence,
    /// refreshing once and retrying if the sequence is empty.
    pub async fn next(self: &Arc<Self>) -> Result<SharedNode, LbError> {
        self.select_or_refresh(|| self.strategy.next()).await
    }

    /// Returns the node the strategy assigns to `input`, refreshing once
    /// and retrying if the sequence is empty.
    pub async fn next_for(self: &Arc<Self>, input: &Input) -> Result<SharedNode, LbError> {
        self.select_or_refresh(|| self.strategy.next_for(input))
            .await
    }

    /// Reports that a previously returned node failed. Once the node's
    /// failure ratio (over at least `min_sample_size` selections) exceeds
    /// `max_node_failed_ratio`, it is exiled from the membership. A no-op
    /// if failure accounting is disabled (`max_node_failed_ratio` at
    /// [`crate::config::NODE_FAILED_UNLIMITED`]).
    pub async fn node_failed(self: &Arc<Self>, node: &SharedNode) {
        let Some(metrics) = self.metrics.as_ref() else {
            return;
        };
        let key = node.key();
        metrics.record_failed(&key);

        let Some(ratio) = metrics.ratio(&key) else {
            return;
        };
        if ratio <= self.config.max_node_failed_ratio {
            return;
        }

        let this = Arc::clone(self);
        let node = Arc::clone(node);
        let sf_key = format!("node-failed.{key}");
        let _ = self
            .sf
            .run(sf_key, move || {
                let this = Arc::clone(&this);
                async move { this.exile_node(node, ratio).await }
            })
            .await;
    }

    /// Size of the membership at the last refresh.
    pub fn original_node_count(&self) -> i64 {
        self.nodes.original_count()
    }

    /// Size of the membership after any exiles since the last refresh.
    pub fn current_node_count(&self) -> i64 {
        self.nodes.current_count()
    }

    async fn select_or_refresh<F>(self: &Arc<Self>, pick: F) -> Result<SharedNode, LbError>
    where
        F: Fn() -> Result<SharedNode, LbError>,
    {
        let mut result = pick();
        if result.is_err() {
            self.refresh().await;
            result = pick();
        }

        if self.ttl_due() {
            let this = Arc::clone(self);
            tokio::spawn(async move { this.refresh().await });
        }

        if let Ok(node) = &result {
            if let Some(metrics) = &self.metrics {
                metrics.record_served(&node.key());
            }
        }

        result
    }

    /// Whether the TTL deadline has passed, and if so atomically rearms it
    /// with a long guard value so only the caller that observes the
    /// expiry triggers a background refresh.
    fn ttl_due(&self) -> bool {
        let Some(deadline) = &self.ttl_deadline else {
            return false;
        };
        let mut guard = deadline.lock();
        if Instant::now() < *guard {
            return false;
        }
        *guard = guard.checked_add(TTL_REARM_GUARD).unwrap_or(*guard);
        true
    }

    async fn refresh(self: &Arc<Self>) {
        let this = Arc::clone(self);
        let _ = self
            .sf
            .run("refresh".to_string(), move || {
                let this = Arc::clone(&this);
                async move { this.do_refresh().await }
            })
            .await;
    }

    async fn do_refresh(self: Arc<Self>) {
        self.provider.refresh().await;

        if let Some(metrics) = &self.metrics {
            metrics.reset_all();
        }

        let nodes = self.provider.nodes();
        self.nodes.set(nodes);
        self.strategy.set_nodes(self.nodes.get());

        if let Some(deadline) = &self.ttl_deadline {
            *deadline.lock() = Instant::now() + self.config.ttl;
        }

        #[cfg(feature = "tracing")]
        debug!(
            balancer = self.config.name.as_str(),
            node_count = self.nodes.current_count(),
            "refreshed node membership"
        );

        #[cfg(feature = "metrics")]
        {
            let result = if self.nodes.current_count() > 0 {
                "ok"
            } else {
                "empty"
            };
            metrics::counter!(
                "load_balancer_refresh_total",
                "balancer" => self.config.name.clone(),
                "result" => result,
            )
            .increment(1);
            metrics::gauge!("load_balancer_current_nodes", "balancer" => self.config.name.clone())
                .set(self.nodes.current_count() as f64);
        }

        self.config.event_listeners.emit(&BalancerEvent::Refreshed {
            balancer: self.config.name.clone(),
            node_count: self.nodes.current_count().max(0) as usize,
            timestamp: Instant::now(),
        });
    }

    async fn exile_node(self: Arc<Self>, node: SharedNode, failure_ratio: f64) {
        let key = node.key();
        if let Some(metrics) = &self.metrics {
            metrics.reset(&key);
        }
        // The callback, healthy-floor check, and refresh-or-reinstall
        // always run regardless of whether this exile actually removed
        // anything — a racing `refresh()` may have already dropped the
        // node from membership via `Group::set`.
        self.nodes.exile(&key);
        {
            let this = Arc::clone(&self);
            let node = node.clone();
            tokio::spawn(async move {
                let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                    this.provider.on_node_evicted(&node);
                }));
                if outcome.is_err() {
                    #[cfg(feature = "tracing")]
                    tracing::warn!("node eviction callback panicked");
                }
            });
        }

        #[cfg(feature = "tracing")]
        debug!(
            balancer = self.config.name.as_str(),
            node = key.as_str(),
            failure_ratio,
            "exiled node"
        );

        #[cfg(feature = "metrics")]
        metrics::counter!("load_balancer_exile_total", "balancer" => self.config.name.clone())
            .increment(1);

        self.config.event_listeners.emit(&BalancerEvent::NodeExiled {
            balancer: self.config.name.clone(),
            node_key: key,
            failure_ratio,
            timestamp: Instant::now(),
        });

        let remaining = self.nodes.get();
        let original = self.nodes.original_count();
        let current = self.nodes.current_count();
        let floor_breached = remaining.is_empty()
            || (original as f64 * self.config.min_healthy_node_ratio).round() > current as f64;

        if floor_breached {
            self.config
                .event_listeners
                .emit(&BalancerEvent::HealthyFloorBreached {
                    balancer: self.config.name.clone(),
                    original_count: original,
                    current_count: current,
                    timestamp: Instant::now(),
                });
            self.refresh().await;
        } else {
            self.strategy.set_nodes(remaining);
        }
    }
}
