//! diagnostic reports
//!
//! Findings of validation and transpilation. A report never aborts anything by itself: callers decide with
//! [Report::is_fatal].

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Warning,
    Error,
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryKind::Warning => f.write_str("warning"),
            EntryKind::Error => f.write_str("error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, derive_new::new)]
pub struct Entry {
    pub kind: EntryKind,
    pub message: String,
}

impl Entry {
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(EntryKind::Warning, message.into())
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(EntryKind::Error, message.into())
    }
}

impl std::fmt::Display for Entry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Ordered list of findings
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct Report {
    pub entries: Vec<Entry>,
}

impl Report {
    pub fn add(&mut self, entry: Entry) {
        tracing::trace!(%entry, "report entry");
        self.entries.push(entry);
    }

    pub fn merge(&mut self, other: Report) {
        for entry in other.entries {
            self.add(entry);
        }
    }

    /// A report containing any error is fatal
    pub fn is_fatal(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Entry> {
        self.entries
            .iter()
            .filter(|entry| entry.kind == EntryKind::Error)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{entry}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn fatal_only_with_errors() {
        let mut report = Report::default();
        assert!(!report.is_fatal());

        report.add(Entry::warning("storage.disks is not supported in cloud-config"));
        assert!(!report.is_fatal());

        let mut other = Report::default();
        other.add(Entry::error("invalid unit content"));
        report.merge(other);

        assert!(report.is_fatal());
        assert_eq!(
            report.to_string(),
            "warning: storage.disks is not supported in cloud-config\nerror: invalid unit content\n"
        );
    }
}
