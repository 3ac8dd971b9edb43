//! Derived display data: progress steps and per-status counts.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::shipment::{Shipment, ShipmentStatus};

/// Number of steps in the progress bar.
pub const PROGRESS_STEPS: u8 = 4;

/// Progress bar position: pending 0, in transit 1, out for delivery 2,
/// delivered 3. Failed attempts and exceptions sit at 1.
pub fn progress_step(status: ShipmentStatus) -> u8 {
    match status {
        ShipmentStatus::Pending => 0,
        ShipmentStatus::InTransit => 1,
        ShipmentStatus::OutForDelivery => 2,
        ShipmentStatus::Delivered => 3,
        ShipmentStatus::FailedAttempt | ShipmentStatus::Exception => 1,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ShipmentStats {
    pub total: usize,
    pub active: usize,
    pub by_status: BTreeMap<ShipmentStatus, usize>,
}

impl ShipmentStats {
    pub fn compute<'a>(shipments: impl IntoIterator<Item = &'a Shipment>) -> Self {
        let mut stats = Self::default();
        for shipment in shipments {
            stats.total += 1;
            if !shipment.status.is_delivered() {
                stats.active += 1;
            }
            *stats.by_status.entry(shipment.status).or_default() += 1;
        }
        stats
    }

    pub fn count(&self, status: ShipmentStatus) -> usize {
        self.by_status.get(&status).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shipment::Carrier;
    use chrono::Utc;

    #[test]
    fn progress_steps_follow_fixed_mapping() {
        assert_eq!(progress_step(ShipmentStatus::Pending), 0);
        assert_eq!(progress_step(ShipmentStatus::InTransit), 1);
        assert_eq!(progress_step(ShipmentStatus::OutForDelivery), 2);
        assert_eq!(progress_step(ShipmentStatus::Delivered), 3);
        assert_eq!(progress_step(ShipmentStatus::Exception), 1);
        assert_eq!(progress_step(ShipmentStatus::FailedAttempt), 1);
    }

    #[test]
    fn counts_by_status() {
        let mut shipments = Vec::new();
        for (n, status) in [
            ("A", ShipmentStatus::Delivered),
            ("B", ShipmentStatus::InTransit),
            ("C", ShipmentStatus::InTransit),
        ] {
            let mut s = Shipment::draft(n, Carrier::Auto, None, Utc::now());
            s.status = status;
            shipments.push(s);
        }

        let stats = ShipmentStats::compute(&shipments);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.active, 2);
        assert_eq!(stats.count(ShipmentStatus::InTransit), 2);
        assert_eq!(stats.count(ShipmentStatus::Pending), 0);
    }
}
