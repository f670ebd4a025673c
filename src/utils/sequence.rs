/// Tag handed out for one asynchronous request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

impl Ticket {
    pub fn number(self) -> u64 {
        self.0
    }
}

/// Issues increasing tickets so a late response can be recognised as superseded.
#[derive(Debug, Default)]
pub struct Sequence {
    issued: u64,
}

impl Sequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self) -> Ticket {
        self.issued += 1;
        Ticket(self.issued)
    }

    /// True only for the most recently issued ticket.
    pub fn is_current(&self, ticket: Ticket) -> bool {
        ticket.0 == self.issued
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newer_ticket_supersedes_older() {
        let mut sequence = Sequence::new();
        let first = sequence.issue();
        assert!(sequence.is_current(first));

        let second = sequence.issue();
        assert!(second > first);
        assert!(!sequence.is_current(first));
        assert!(sequence.is_current(second));
    }
}
