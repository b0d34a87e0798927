//! In-memory implementation of RegisterStore.

use voteroll_store::{RegisterStore, StoreError, StoreEvent};
use voteroll_types::{ElectoralRegister, MeetingId, RegisterId, Timestamp, VoterWeights};

use crate::MemoryStore;

impl RegisterStore for MemoryStore {
    fn create_register(
        &self,
        meeting: MeetingId,
        source: &str,
        created: Timestamp,
        weights: VoterWeights,
    ) -> Result<ElectoralRegister, StoreError> {
        let register = {
            let mut tables = self.tables();
            tables.meeting(meeting)?;
            let register = ElectoralRegister {
                id: RegisterId::new(tables.allocate_id()),
                meeting,
                source: source.to_string(),
                created,
                weight_dict: weights,
            };
            tables.registers.insert(register.id, register.clone());
            if let Some(m) = tables.meetings.get_mut(&meeting) {
                m.latest_register = Some(register.id);
            }
            register
        };
        self.emit(StoreEvent::RegisterCreated {
            meeting,
            register: register.id,
            source: register.source.clone(),
        });
        Ok(register)
    }

    fn get_register(&self, register: RegisterId) -> Result<ElectoralRegister, StoreError> {
        self.tables()
            .registers
            .get(&register)
            .cloned()
            .ok_or_else(|| StoreError::not_found("register", register))
    }

    fn latest_register(
        &self,
        meeting: MeetingId,
    ) -> Result<Option<ElectoralRegister>, StoreError> {
        let tables = self.tables();
        let latest = tables.meeting(meeting)?.latest_register;
        Ok(latest.and_then(|id| tables.registers.get(&id).cloned()))
    }

    fn registers(&self, meeting: MeetingId) -> Result<Vec<ElectoralRegister>, StoreError> {
        let tables = self.tables();
        tables.meeting(meeting)?;
        Ok(tables
            .registers
            .values()
            .filter(|r| r.meeting == meeting)
            .cloned()
            .collect())
    }
}
