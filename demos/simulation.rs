//! Drives a HashRing from several threads: one thread routes random requests,
//! one joins random servers and one removes random servers
//!
//! RUST_LOG=debug shows every join and leave of the ring itself
//! SIM_MAX_NODES and SIM_DURATION_SECS override the defaults

use std::env;
use std::error::Error;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use consistent_ring::{HashRing, RingError};
use parking_lot::Mutex;
use rand::Rng;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

struct SimulationConfig {
    max_nodes: usize,
    request_ids: u32,
    server_ids: u32,
    duration: Duration,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            max_nodes: 10,
            request_ids: 100,
            server_ids: 100,
            duration: Duration::from_secs(10),
        }
    }
}

impl SimulationConfig {
    fn from_env() -> Result<Self, Box<dyn Error>> {
        let mut config = SimulationConfig::default();
        if let Ok(max_nodes) = env::var("SIM_MAX_NODES") {
            config.max_nodes = max_nodes.parse()?;
        }
        if let Ok(secs) = env::var("SIM_DURATION_SECS") {
            config.duration = Duration::from_secs(secs.parse()?);
        }
        Ok(config)
    }
}

fn pause(max_millis: u64) {
    thread::sleep(Duration::from_millis(rand::rng().random_range(0..max_millis)));
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_thread_names(true)
        .init();

    let config = Arc::new(SimulationConfig::from_env()?);
    let ring = Arc::new(HashRing::new());
    let done = Arc::new(AtomicBool::new(false));
    // the size check and the join/leave have to happen as one step
    let membership = Arc::new(Mutex::new(()));

    info!(
        max_nodes = config.max_nodes,
        duration = ?config.duration,
        "starting simulation"
    );

    let requests = {
        let (ring, done, config) = (ring.clone(), done.clone(), config.clone());
        thread::Builder::new()
            .name("requests".into())
            .spawn(move || {
                while !done.load(Ordering::Relaxed) {
                    let request = format!("request{}", rand::rng().random_range(0..config.request_ids));
                    match ring.get(&request) {
                        Ok(lookup) => match lookup.alternate {
                            Some(alternate) => info!(%request, server = %lookup.primary, %alternate, "routed"),
                            None => info!(%request, server = %lookup.primary, "routed"),
                        },
                        Err(RingError::Unavailable) => warn!(%request, "no nodes available"),
                        Err(err) => warn!(%request, %err, "lookup failed"),
                    }
                    pause(1000);
                }
            })?
    };

    let joins = {
        let (ring, done, config, membership) =
            (ring.clone(), done.clone(), config.clone(), membership.clone());
        thread::Builder::new()
            .name("joins".into())
            .spawn(move || {
                while !done.load(Ordering::Relaxed) {
                    let server = format!("server{}", rand::rng().random_range(0..config.server_ids));
                    {
                        let _guard = membership.lock();
                        if ring.len() < config.max_nodes {
                            ring.join(server.as_str());
                            info!(%server, "added node");
                        }
                        info!(size = ring.len(), "current size of the ring");
                    }
                    pause(1000);
                }
            })?
    };

    let leaves = {
        let (ring, done, membership) = (ring.clone(), done.clone(), membership.clone());
        thread::Builder::new()
            .name("leaves".into())
            .spawn(move || {
                while !done.load(Ordering::Relaxed) {
                    {
                        let _guard = membership.lock();
                        let members = ring.members();
                        if !members.is_empty() {
                            let server = members[rand::rng().random_range(0..members.len())].id();
                            if ring.leave(server).is_ok() {
                                info!(%server, "removed node");
                            }
                        }
                    }
                    pause(5000);
                }
            })?
    };

    let started = Instant::now();
    thread::sleep(config.duration);
    done.store(true, Ordering::Relaxed);

    for handle in [requests, joins, leaves] {
        if handle.join().is_err() {
            return Err("simulation thread panicked".into());
        }
    }

    info!(
        elapsed = ?started.elapsed(),
        nodes = ?ring.iter().collect::<Vec<_>>(),
        "simulation finished"
    );

    Ok(())
}
