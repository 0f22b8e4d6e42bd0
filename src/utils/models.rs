use std::fmt;

/// How many rows of a CSV export were read and how many were left out
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Report {
    /// Data rows, header excluded
    pub read: usize,
    /// Malformed rows
    pub skipped: usize,
}

impl Report {
    pub fn row(&mut self) {
        self.read += 1;
    }

    pub fn skip(&mut self) {
        self.skipped += 1;
    }

    #[must_use]
    pub fn used(&self) -> usize {
        self.read - self.skipped
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ligne(s) lue(s), {} ignorée(s)",
            self.read, self.skipped
        )
    }
}
