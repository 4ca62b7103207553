/// Outcome of one statement in a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpenEdgeQueryResult {
    pub(crate) rows_affected: u64,
    pub(crate) command: Option<String>,
}

impl OpenEdgeQueryResult {
    pub fn new(rows_affected: u64) -> Self {
        Self {
            rows_affected,
            command: None,
        }
    }

    pub fn rows_affected(&self) -> u64 {
        self.rows_affected
    }

    /// Leading keyword of the statement (`INSERT`, `SET`, ...), when known.
    pub fn command(&self) -> Option<&str> {
        self.command.as_deref()
    }
}

impl Extend<OpenEdgeQueryResult> for OpenEdgeQueryResult {
    fn extend<T: IntoIterator<Item = OpenEdgeQueryResult>>(&mut self, iter: T) {
        for result in iter {
            self.rows_affected += result.rows_affected;
            if self.command.is_none() {
                self.command = result.command;
            }
        }
    }
}
