/// Sink for attendance transitions. Implementations decide persistence;
/// the state machine only reports arrivals and departures.
pub trait AttendanceLedger: Send {
    fn record_arrival(&mut self, name: &str, timestamp: f64);
    fn record_departure(&mut self, name: &str, timestamp: f64);
}

#[derive(Clone, Debug, PartialEq)]
pub enum AttendanceEvent {
    Arrival { name: String, timestamp: f64 },
    Departure { name: String, timestamp: f64 },
}

/// In-memory ledger, used by tests and short-lived sessions.
#[derive(Default)]
pub struct MemoryLedger {
    events: Vec<AttendanceEvent>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[AttendanceEvent] {
        &self.events
    }
}

impl AttendanceLedger for MemoryLedger {
    fn record_arrival(&mut self, name: &str, timestamp: f64) {
        self.events.push(AttendanceEvent::Arrival {
            name: name.to_string(),
            timestamp,
        });
    }

    fn record_departure(&mut self, name: &str, timestamp: f64) {
        self.events.push(AttendanceEvent::Departure {
            name: name.to_string(),
            timestamp,
        });
    }
}

/// Ledger that writes transitions to the application log.
#[derive(Default)]
pub struct LogLedger;

impl AttendanceLedger for LogLedger {
    fn record_arrival(&mut self, name: &str, timestamp: f64) {
        log::info!("attendance: {name} arrived at t={timestamp:.1}s");
    }

    fn record_departure(&mut self, name: &str, timestamp: f64) {
        log::info!("attendance: {name} departed at t={timestamp:.1}s");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_ledger_keeps_event_order() {
        let mut ledger = MemoryLedger::new();
        ledger.record_arrival("alice", 1.0);
        ledger.record_departure("alice", 40.0);
        assert_eq!(
            ledger.events(),
            &[
                AttendanceEvent::Arrival {
                    name: "alice".to_string(),
                    timestamp: 1.0
                },
                AttendanceEvent::Departure {
                    name: "alice".to_string(),
                    timestamp: 40.0
                },
            ]
        );
    }
}
