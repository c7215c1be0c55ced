/// Result of inserting one scan inside a batch transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted { index: usize, server_id: i32 },
    Failed { index: usize, reason: String },
}

/// Per-record outcomes for one batch. The batch may only be committed when
/// every submitted record was inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
    expected: usize,
    outcomes: Vec<InsertOutcome>,
}

impl BatchOutcome {
    pub fn new(expected: usize) -> Self {
        Self {
            expected,
            outcomes: Vec::with_capacity(expected),
        }
    }

    pub fn push(&mut self, outcome: InsertOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn is_committable(&self) -> bool {
        self.outcomes.len() == self.expected
            && self
                .outcomes
                .iter()
                .all(|o| matches!(o, InsertOutcome::Inserted { .. }))
    }

    /// Generated ids in submission order
    pub fn server_ids(&self) -> Vec<i32> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                InsertOutcome::Inserted { server_id, .. } => Some(*server_id),
                InsertOutcome::Failed { .. } => None,
            })
            .collect()
    }

    pub fn first_failure(&self) -> Option<(usize, &str)> {
        self.outcomes.iter().find_map(|o| match o {
            InsertOutcome::Failed { index, reason } => Some((*index, reason.as_str())),
            InsertOutcome::Inserted { .. } => None,
        })
    }
}
