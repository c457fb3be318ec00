use super::types::Status;

impl Status {
    /// Check if transitioning from the current status to the new status is valid.
    ///
    /// Valid transitions:
    /// - `Pending` -> `Running` | `Blocked`
    /// - `Running` -> `Completed` | `Pending` | `Failed` | `Blocked`
    /// - `Completed`, `Failed` and `Blocked` are terminal
    ///
    /// Unlike a no-op write, re-entering the same status is rejected: a job
    /// that is already `Running` cannot be started twice.
    pub fn can_transition_to(&self, new_status: &Status) -> bool {
        match self {
            Status::Pending => matches!(new_status, Status::Running | Status::Blocked),
            Status::Running => matches!(
                new_status,
                Status::Completed | Status::Pending | Status::Failed | Status::Blocked
            ),
            Status::Completed => false,
            Status::Failed => false,
            Status::Blocked => false,
        }
    }

    /// Returns the list of valid statuses this status can transition to.
    pub fn valid_transitions(&self) -> Vec<Status> {
        match self {
            Status::Pending => vec![Status::Running, Status::Blocked],
            Status::Running => vec![
                Status::Completed,
                Status::Pending,
                Status::Failed,
                Status::Blocked,
            ],
            Status::Completed | Status::Failed | Status::Blocked => vec![],
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}
