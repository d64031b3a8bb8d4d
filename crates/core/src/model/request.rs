//! Last-request-wins bookkeeping for overlapping loads.

/// Identifies one issued request for a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

/// Whether a settled result was applied or discarded as stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Fresh,
    Stale,
}

impl Applied {
    #[must_use]
    pub fn is_fresh(self) -> bool {
        matches!(self, Self::Fresh)
    }
}

/// Issues tickets for one resource; only the newest ticket may apply its result.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestSeq {
    latest: u64,
}

impl RequestSeq {
    pub fn issue(&mut self) -> Ticket {
        self.latest += 1;
        Ticket(self.latest)
    }

    #[must_use]
    pub fn is_latest(&self, ticket: Ticket) -> bool {
        ticket.0 == self.latest
    }

    #[must_use]
    pub fn check(&self, ticket: Ticket) -> Applied {
        if self.is_latest(ticket) {
            Applied::Fresh
        } else {
            Applied::Stale
        }
    }
}
