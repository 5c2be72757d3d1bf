use serde::Serialize;

/// Number of UIDs reserved per Android user.
pub const PER_USER_RANGE: u32 = 100_000;

/// First UID assigned to an installed application. Lower app-ids belong to
/// the system and are never blocked.
pub const FIRST_APPLICATION_UID: u32 = 10_000;

/// Per-user UID collapsed to the app-id shared by every user profile.
pub fn app_id(uid: u32) -> u32 {
    uid % PER_USER_RANGE
}

/// Whether `uid` belongs to a system component rather than an application.
pub fn is_system_uid(uid: u32) -> bool {
    app_id(uid) < FIRST_APPLICATION_UID
}

/// Result of a best-effort batch. Failures are logged by the caller and
/// reported here; the batch itself never aborts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchOutcome {
    pub applied: usize,
    pub failed: Vec<u32>,
}

impl BatchOutcome {
    pub fn record(&mut self, uid: u32, ok: bool) {
        if ok {
            self.applied += 1;
        } else {
            self.failed.push(uid);
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_id_strips_user() {
        assert_eq!(app_id(10_001), 10_001);
        assert_eq!(app_id(1_010_001), 10_001);
        assert_eq!(app_id(1_000), 1_000);
    }

    #[test]
    fn system_uid_boundary() {
        assert!(is_system_uid(0));
        assert!(is_system_uid(9_999));
        assert!(!is_system_uid(10_000));
        assert!(is_system_uid(1_001_000));
    }

    #[test]
    fn batch_outcome_tracks_failures() {
        let mut out = BatchOutcome::default();
        out.record(1, true);
        out.record(2, false);
        out.record(3, true);
        assert_eq!(out.applied, 2);
        assert_eq!(out.failed, vec![2]);
        assert!(!out.is_complete());
    }
}
