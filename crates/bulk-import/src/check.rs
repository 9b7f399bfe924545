use serde::Serialize;

use crate::samples::ExpectedStatus;

/// Whether the observed create/match outcome is what the sample expects.
pub fn check_result(status: &ExpectedStatus, new_part: bool) -> bool {
    match status {
        ExpectedStatus::Original | ExpectedStatus::FakeAlternate => new_part,
        ExpectedStatus::AlternateMpn => !new_part,
        ExpectedStatus::Unknown(_) => false,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportRecord {
    pub part_number: String,
    pub pk: u64,
    pub passed: bool,
    /// Cleanup deletes this pk; only the first record holding a pk owns it
    pub delete: bool,
}

/// Per-part results in import order
#[derive(Debug, Default, Clone, Serialize)]
#[serde(transparent)]
pub struct ResultLog {
    records: Vec<ImportRecord>,
}

impl ResultLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an outcome. A part number seen before is overwritten in place.
    pub fn record(&mut self, part_number: &str, pk: u64, passed: bool) -> &ImportRecord {
        let delete = pk != 0 && !self.records.iter().any(|r| r.pk == pk);
        let record = ImportRecord {
            part_number: part_number.to_string(),
            pk,
            passed,
            delete,
        };

        match self
            .records
            .iter()
            .position(|r| r.part_number == part_number)
        {
            Some(index) => {
                self.records[index] = record;
                &self.records[index]
            }
            None => {
                self.records.push(record);
                &self.records[self.records.len() - 1]
            }
        }
    }

    pub fn records(&self) -> &[ImportRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn passed(&self) -> usize {
        self.records.iter().filter(|r| r.passed).count()
    }

    pub fn failed(&self) -> usize {
        self.records.len() - self.passed()
    }

    /// Primary keys cleanup should delete, in import order
    pub fn to_delete(&self) -> impl Iterator<Item = u64> + '_ {
        self.records.iter().filter(|r| r.delete).map(|r| r.pk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_result_new_part_expected() {
        for status in [ExpectedStatus::Original, ExpectedStatus::FakeAlternate] {
            assert!(check_result(&status, true));
            assert!(!check_result(&status, false));
        }
    }

    #[test]
    fn test_check_result_alternate_mpn() {
        assert!(check_result(&ExpectedStatus::AlternateMpn, false));
        assert!(!check_result(&ExpectedStatus::AlternateMpn, true));
    }

    #[test]
    fn test_check_result_unknown_always_fails() {
        let status = ExpectedStatus::Unknown("maybe".into());
        assert!(!check_result(&status, true));
        assert!(!check_result(&status, false));
    }

    #[test]
    fn test_repeated_pk_is_deleted_once() {
        let mut log = ResultLog::new();
        assert!(log.record("A", 5, true).delete);
        assert!(log.record("B", 8, true).delete);
        assert!(!log.record("C", 5, true).delete);

        assert_eq!(log.to_delete().collect::<Vec<_>>(), vec![5, 8]);
    }

    #[test]
    fn test_zero_pk_is_never_deleted() {
        let mut log = ResultLog::new();
        assert!(!log.record("A", 0, false).delete);
        assert!(!log.record("B", 0, false).delete);
        assert_eq!(log.to_delete().count(), 0);
    }

    #[test]
    fn test_same_part_number_overwrites_in_place() {
        let mut log = ResultLog::new();
        log.record("A", 5, false);
        log.record("B", 6, true);
        let again = log.record("A", 5, true);
        // pk 5 was already known when re-recorded
        assert!(!again.delete);

        let numbers: Vec<_> = log.records().iter().map(|r| r.part_number.as_str()).collect();
        assert_eq!(numbers, ["A", "B"]);
        assert_eq!(log.passed(), 2);
        assert_eq!(log.failed(), 0);
    }
}
