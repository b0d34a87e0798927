//! In-memory implementation of VoteTransferStore.

use voteroll_store::{StoreError, StoreEvent, VoteTransferStore};
use voteroll_types::{MeetingId, TransferId, UserId, VoteTransfer};

use crate::MemoryStore;

impl VoteTransferStore for MemoryStore {
    fn transfers(&self, meeting: MeetingId) -> Result<Vec<VoteTransfer>, StoreError> {
        let tables = self.tables();
        tables.meeting(meeting)?;
        Ok(tables
            .transfers
            .values()
            .filter(|vt| vt.meeting == meeting)
            .cloned()
            .collect())
    }

    fn get_transfer(&self, transfer: TransferId) -> Result<VoteTransfer, StoreError> {
        self.tables()
            .transfers
            .get(&transfer)
            .cloned()
            .ok_or_else(|| StoreError::not_found("transfer", transfer))
    }

    fn create_transfer(
        &self,
        meeting: MeetingId,
        source: UserId,
        target: UserId,
    ) -> Result<VoteTransfer, StoreError> {
        let created = {
            let mut tables = self.tables();
            tables.meeting(meeting)?;
            tables.check_transfer_slots(meeting, source, target, None)?;
            let vt = VoteTransfer {
                id: TransferId::new(tables.allocate_id()),
                meeting,
                source,
                target,
            };
            tables.transfers.insert(vt.id, vt.clone());
            vt
        };
        self.emit(StoreEvent::TransferCreated {
            meeting,
            transfer: created.id,
            source,
            target,
        });
        Ok(created)
    }

    fn update_transfer(
        &self,
        transfer: TransferId,
        source: UserId,
        target: UserId,
    ) -> Result<VoteTransfer, StoreError> {
        let updated = {
            let mut tables = self.tables();
            let meeting = tables
                .transfers
                .get(&transfer)
                .map(|vt| vt.meeting)
                .ok_or_else(|| StoreError::not_found("transfer", transfer))?;
            tables.check_transfer_slots(meeting, source, target, Some(transfer))?;
            let record = tables
                .transfers
                .get_mut(&transfer)
                .ok_or_else(|| StoreError::not_found("transfer", transfer))?;
            record.source = source;
            record.target = target;
            record.clone()
        };
        self.emit(StoreEvent::TransferUpdated {
            meeting: updated.meeting,
            transfer,
            source,
            target,
        });
        Ok(updated)
    }

    fn delete_transfer(&self, transfer: TransferId) -> Result<VoteTransfer, StoreError> {
        let removed = self
            .tables()
            .transfers
            .remove(&transfer)
            .ok_or_else(|| StoreError::not_found("transfer", transfer))?;
        self.emit(StoreEvent::TransferDeleted {
            meeting: removed.meeting,
            transfer,
            source: removed.source,
            target: removed.target,
        });
        Ok(removed)
    }
}
