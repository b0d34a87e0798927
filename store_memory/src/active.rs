//! In-memory implementation of ActiveUserStore.

use voteroll_store::{ActiveUserStore, StoreError};
use voteroll_types::{ActiveUser, MeetingId, Timestamp, UserId};

use crate::MemoryStore;

impl ActiveUserStore for MemoryStore {
    fn active_users(&self, meeting: MeetingId) -> Result<Vec<ActiveUser>, StoreError> {
        let tables = self.tables();
        tables.meeting(meeting)?;
        Ok(tables.active.get(&meeting).cloned().unwrap_or_default())
    }

    fn mark_active(
        &self,
        meeting: MeetingId,
        user: UserId,
        created: Timestamp,
    ) -> Result<bool, StoreError> {
        let mut tables = self.tables();
        tables.meeting(meeting)?;
        let log = tables.active.entry(meeting).or_default();
        if log.iter().any(|entry| entry.user == user) {
            return Ok(false);
        }
        log.push(ActiveUser {
            meeting,
            user,
            created,
        });
        Ok(true)
    }

    fn mark_inactive(&self, meeting: MeetingId, user: UserId) -> Result<bool, StoreError> {
        let mut tables = self.tables();
        tables.meeting(meeting)?;
        let Some(log) = tables.active.get_mut(&meeting) else {
            return Ok(false);
        };
        let before = log.len();
        log.retain(|entry| entry.user != user);
        Ok(log.len() != before)
    }
}
