use crate::domain::UserProfile;

pub const DEFAULT_FREE_SCAN_LIMIT: u32 = 1;

/// Lifetime limit on useful AI scans for non-premium profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaPolicy {
    pub free_scan_limit: u32,
}

impl Default for QuotaPolicy {
    fn default() -> Self {
        Self {
            free_scan_limit: DEFAULT_FREE_SCAN_LIMIT,
        }
    }
}

impl QuotaPolicy {
    pub fn new(free_scan_limit: u32) -> Self {
        Self { free_scan_limit }
    }

    pub fn can_scan(&self, profile: &UserProfile) -> bool {
        profile.is_premium || profile.free_scans_used < self.free_scan_limit
    }

    /// `None` means unlimited.
    pub fn scans_remaining(&self, profile: &UserProfile) -> Option<u32> {
        profile
            .plan()
            .scan_limit(self.free_scan_limit)
            .map(|limit| limit.saturating_sub(profile.free_scans_used))
    }

    /// Premium profiles are never charged.
    pub fn charge(&self, profile: &mut UserProfile) {
        if !profile.is_premium {
            profile.free_scans_used = profile.free_scans_used.saturating_add(1);
        }
    }
}
