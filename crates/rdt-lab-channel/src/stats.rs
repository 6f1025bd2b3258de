use serde::Serialize;
use tracing::info;

/// Process-lifetime relay counters. Updated only from the relay's main
/// receive loop, so no synchronization is needed; the delayed-forward task
/// never touches them.
#[derive(Debug, Default, Clone, Serialize)]
pub struct RelayStats {
    pub from_sender: u64,
    pub from_receiver: u64,
    pub forwarded: u64,
    pub lost: u64,
    pub delayed: u64,
    pub corrupted: u64,
}

impl RelayStats {
    pub fn received_total(&self) -> u64 {
        self.from_sender + self.from_receiver
    }

    /// Statistics are reported on every 5th inbound packet.
    pub fn due_for_report(&self) -> bool {
        let total = self.received_total();
        total > 0 && total % 5 == 0
    }

    pub fn log_report(&self) {
        info!(
            from_sender = self.from_sender,
            from_receiver = self.from_receiver,
            received = self.received_total(),
            forwarded = self.forwarded,
            lost = self.lost,
            delayed = self.delayed,
            corrupted = self.corrupted,
            "relay statistics"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_fires_on_every_fifth_packet() {
        let mut stats = RelayStats::default();
        assert!(!stats.due_for_report());

        for received in 1..=11u64 {
            if received % 2 == 0 {
                stats.from_receiver += 1;
            } else {
                stats.from_sender += 1;
            }
            assert_eq!(stats.due_for_report(), received % 5 == 0);
        }
    }

    #[test]
    fn clean_run_counters_stay_consistent() {
        let stats = RelayStats {
            from_sender: 4,
            from_receiver: 4,
            forwarded: 8,
            ..Default::default()
        };
        assert_eq!(stats.forwarded, stats.received_total());
        assert_eq!(stats.lost + stats.delayed + stats.corrupted, 0);
    }
}
