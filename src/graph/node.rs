/// DFS discovery state of a tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    NotVisited = 0,
    InProgress = 1,
    Closed = 2,
}

impl From<u64> for Mark {
    fn from(n: u64) -> Self {
        match n {
            0 => Self::NotVisited,
            1 => Self::InProgress,
            2 => Self::Closed,
            _ => unreachable!("marks are taken mod 3"),
        }
    }
}

/// Discovery mark and dependency counter packed into one word,
/// as `count * 3 + mark`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Node(u64);

impl Node {
    const MARKS: u64 = 3;

    pub fn new(count: u64, mark: Mark) -> Self {
        Self(count * Self::MARKS + mark as u64)
    }
    pub fn mark(&self) -> Mark {
        Mark::from(self.0 % Self::MARKS)
    }
    pub fn count(&self) -> u64 {
        self.0 / Self::MARKS
    }
    pub fn marked(self, mark: Mark) -> Self {
        Self::new(self.count(), mark)
    }
    pub fn counted(self, count: u64) -> Self {
        Self::new(count, self.mark())
    }
    pub fn incremented(self) -> Self {
        self.counted(self.count() + 1)
    }
    /// `None` if the counter is already zero.
    pub fn decremented(self) -> Option<Self> {
        self.count().checked_sub(1).map(|n| self.counted(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packing() {
        let node = Node::new(7, Mark::InProgress);
        assert!(node.count() == 7);
        assert!(node.mark() == Mark::InProgress);
        assert!(node.marked(Mark::Closed).count() == 7);
        assert!(node.counted(0).mark() == Mark::InProgress);
        assert!(Node::default().mark() == Mark::NotVisited);
    }

    #[test]
    fn counter_never_underflows() {
        let node = Node::new(1, Mark::Closed);
        let node = node.decremented().unwrap();
        assert!(node.count() == 0);
        assert!(node.mark() == Mark::Closed);
        assert!(node.decremented().is_none());
        assert!(node.incremented().count() == 1);
    }
}
