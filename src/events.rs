use std::cmp::Ordering;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Event {
    Arrival { customer: usize },
    Departure { customer: usize },
}

#[derive(Clone, Debug)]
pub struct ScheduledEvent {
    pub time: f64,
    pub event: Event,
}

impl ScheduledEvent {
    pub fn new(time: f64, event: Event) -> Self {
        Self { time, event }
    }
}

impl Ord for ScheduledEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        self.time
            .total_cmp(&other.time)
            .then_with(|| self.event.priority().cmp(&other.event.priority()))
            .then_with(|| self.event.tiebreaker().cmp(&other.event.tiebreaker()))
    }
}

impl PartialOrd for ScheduledEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ScheduledEvent {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ScheduledEvent {}

impl Event {
    fn priority(&self) -> u8 {
        match self {
            Event::Departure { .. } => 0,
            Event::Arrival { .. } => 1,
        }
    }

    fn tiebreaker(&self) -> usize {
        match self {
            Event::Departure { customer } => *customer,
            Event::Arrival { customer } => *customer,
        }
    }
}
