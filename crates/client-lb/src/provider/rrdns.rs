use super::NodeProvider;
use crate::node::SharedNode;
use arc_swap::ArcSwap;
use std::net::IpAddr;
use std::sync::Arc;

/// Round-robin DNS: resolves a fixed list of hostnames to their A/AAAA
/// records on every refresh and exposes the union as the node set.
///
/// A hostname that fails to resolve is dropped from this refresh's result
/// silently — it does not fail the whole refresh, and a hostname with no
/// previous successful resolution simply contributes no nodes.
pub struct RoundRobinDnsProvider {
    hostnames: Vec<String>,
    ipv4: bool,
    ipv6: bool,
    nodes: ArcSwap<Vec<SharedNode>>,
}

impl RoundRobinDnsProvider {
    pub fn new(hostnames: Vec<String>, ipv4: bool, ipv6: bool) -> Self {
        Self {
            hostnames,
            ipv4,
            ipv6,
            nodes: ArcSwap::from_pointee(Vec::new()),
        }
    }
}

impl NodeProvider for RoundRobinDnsProvider {
    fn nodes(&self) -> Vec<SharedNode> {
        (**self.nodes.load()).clone()
    }

    async fn refresh(&self) {
        let mut resolved: Vec<SharedNode> = Vec::new();
        for host in &self.hostnames {
            let addrs = match tokio::net::lookup_host((host.as_str(), 0)).await {
                Ok(addrs) => addrs,
                Err(_err) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(hostname = host.as_str(), error = %_err, "hostname failed to resolve, skipping");
                    continue;
                }
            };
            for addr in addrs {
                let ip = addr.ip();
                let keep = match ip {
                    IpAddr::V4(_) => self.ipv4,
                    IpAddr::V6(_) => self.ipv6,
                };
                if keep {
                    resolved.push(Arc::new(ip) as SharedNode);
                }
            }
        }
        self.nodes.store(Arc::new(resolved));
    }
}
