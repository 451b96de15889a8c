//! Concurrent connection admission.
//!
//! # Responsibilities
//! - Bound the total number of open connections
//! - Bound open connections per source IP
//! - Release every admitted slot exactly once
//!
//! # Design Decisions
//! - One mutex over both counters; held for O(1) map work, never across I/O
//! - `0` means unlimited for either bound
//! - Slots are released by dropping an `AdmissionGuard`, so every exit path
//!   of a connection handler (including panics) gives the slot back

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::observability::metrics;

#[derive(Debug, Default)]
struct AdmissionCounters {
    total: u32,
    per_ip: HashMap<IpAddr, u32>,
}

/// Shared open-connection accounting.
#[derive(Debug, Default)]
pub struct AdmissionController {
    counters: Mutex<AdmissionCounters>,
}

impl AdmissionController {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, AdmissionCounters> {
        // Counters are updated in one step under the lock, so a poisoned
        // guard still holds consistent values.
        self.counters.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Take a slot for `ip` if both bounds allow it.
    ///
    /// On failure nothing is mutated.
    pub fn try_admit(&self, ip: IpAddr, max_total: u32, max_per_ip: u32) -> bool {
        let mut counters = self.lock();
        let open_for_ip = counters.per_ip.get(&ip).copied().unwrap_or(0);
        if (max_total > 0 && counters.total >= max_total)
            || (max_per_ip > 0 && open_for_ip >= max_per_ip)
        {
            return false;
        }

        *counters.per_ip.entry(ip).or_insert(0) += 1;
        counters.total += 1;
        metrics::record_open_connections(counters.total);
        true
    }

    /// Give back a slot taken by `try_admit`.
    pub fn release(&self, ip: IpAddr) {
        let mut counters = self.lock();
        match counters.per_ip.get_mut(&ip) {
            Some(count) if *count > 1 => *count -= 1,
            Some(_) => {
                counters.per_ip.remove(&ip);
            }
            None => {
                tracing::error!(%ip, "Release without matching admission");
                return;
            }
        }
        counters.total = counters.total.saturating_sub(1);
        metrics::record_open_connections(counters.total);
    }

    /// `try_admit` returning a guard that releases the slot on drop.
    pub fn admit(
        self: &Arc<Self>,
        ip: IpAddr,
        max_total: u32,
        max_per_ip: u32,
    ) -> Option<AdmissionGuard> {
        self.try_admit(ip, max_total, max_per_ip).then(|| AdmissionGuard {
            controller: Arc::clone(self),
            ip,
        })
    }

    /// Total open connections.
    pub fn open_total(&self) -> u32 {
        self.lock().total
    }

    /// Open connections from `ip`.
    pub fn open_for(&self, ip: IpAddr) -> u32 {
        self.lock().per_ip.get(&ip).copied().unwrap_or(0)
    }

    /// Number of distinct source IPs with at least one open connection.
    pub fn tracked_ips(&self) -> usize {
        self.lock().per_ip.len()
    }
}

/// An admitted slot. Released when dropped.
#[derive(Debug)]
pub struct AdmissionGuard {
    controller: Arc<AdmissionController>,
    ip: IpAddr,
}

impl Drop for AdmissionGuard {
    fn drop(&mut self) {
        self.controller.release(self.ip);
        tracing::trace!(ip = %self.ip, "Admission slot released");
    }
}
