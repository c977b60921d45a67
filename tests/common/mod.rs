#![allow(dead_code)]

// Banking fixtures shared by the integration tests and kept deliberately
// small: an account aggregate, its change type, and the wiring helpers.

use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use uow_es::{
    ChangeMapper, CommitId, CommitIdGenerator, Contract, ContractResolver, EventId,
    EventSourcedAggregate, EventSourcedAggregateMapper, MemoryEventStore, RecordedChange,
    RecordedChangeMapper, Result, TypeNameResolver, UnitOfWork, unsupported_change,
};

pub fn account_contract() -> Contract {
    Contract::new("banking.account")
}

pub fn fixture_when() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2016, 1, 1, 14, 55, 0).single().unwrap()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum AccountEvent {
    Opened { account_id: String, balance: i64 },
    BalanceIncreased { transaction_id: u64, amount: i64 },
    BalanceDecreased { transaction_id: u64, amount: i64 },
}

#[derive(Clone, Debug)]
pub struct AccountChange {
    pub event: AccountEvent,
    pub metadata: Option<Value>,
    pub event_id: Option<EventId>,
    pub version: Option<i64>,
    pub when: DateTime<Utc>,
}

impl AccountChange {
    pub fn pending(event: AccountEvent, metadata: Option<Value>) -> Self {
        Self {
            event,
            metadata,
            event_id: None,
            version: None,
            when: fixture_when(),
        }
    }
}

impl RecordedChange for AccountChange {
    type Event = AccountEvent;
    type Metadata = Value;

    fn event(&self) -> &AccountEvent {
        &self.event
    }

    fn metadata(&self) -> Option<&Value> {
        self.metadata.as_ref()
    }

    fn event_id(&self) -> Option<EventId> {
        self.event_id
    }

    fn version(&self) -> Option<i64> {
        self.version
    }

    fn when(&self) -> DateTime<Utc> {
        self.when
    }

    fn from_stored(
        event_id: EventId,
        event: AccountEvent,
        when: DateTime<Utc>,
        metadata: Option<Value>,
        version: i64,
    ) -> Self {
        Self {
            event,
            metadata,
            event_id: Some(event_id),
            version: Some(version),
            when,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Account {
    id: String,
    balance: i64,
    version: i64,
    changes: Vec<AccountChange>,
    committed_events: Vec<AccountEvent>,
}

impl Account {
    pub fn open(id: &str, balance: i64) -> Self {
        let mut account = Self::blank();
        account.record(
            AccountEvent::Opened {
                account_id: id.to_string(),
                balance,
            },
            None,
        );
        account
    }

    pub fn increase_balance(&mut self, transaction_id: u64, amount: i64) {
        self.record(
            AccountEvent::BalanceIncreased {
                transaction_id,
                amount,
            },
            None,
        );
    }

    pub fn decrease_balance(&mut self, transaction_id: u64, amount: i64) {
        self.record(
            AccountEvent::BalanceDecreased {
                transaction_id,
                amount,
            },
            None,
        );
    }

    pub fn decrease_balance_audited(&mut self, transaction_id: u64, amount: i64, audit: Value) {
        self.record(
            AccountEvent::BalanceDecreased {
                transaction_id,
                amount,
            },
            Some(audit),
        );
    }

    /// Applies an already-built change, for tests that pin explicit event ids
    /// or versions on a change.
    pub fn record_prepared(&mut self, change: AccountChange) {
        self.apply(&change.event);
        self.version += 1;
        self.changes.push(change);
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn balance(&self) -> i64 {
        self.balance
    }

    pub fn version(&self) -> i64 {
        self.version
    }

    pub fn changes(&self) -> &[AccountChange] {
        &self.changes
    }

    pub fn committed_events(&self) -> &[AccountEvent] {
        &self.committed_events
    }

    fn blank() -> Self {
        Self {
            id: String::new(),
            balance: 0,
            version: -1,
            changes: Vec::new(),
            committed_events: Vec::new(),
        }
    }

    fn record(&mut self, event: AccountEvent, metadata: Option<Value>) {
        self.apply(&event);
        self.version += 1;
        self.changes.push(AccountChange::pending(event, metadata));
    }

    fn apply(&mut self, event: &AccountEvent) {
        match event {
            AccountEvent::Opened {
                account_id,
                balance,
            } => {
                self.id = account_id.clone();
                self.balance = *balance;
            }
            AccountEvent::BalanceIncreased { amount, .. } => self.balance += amount,
            AccountEvent::BalanceDecreased { amount, .. } => self.balance -= amount,
        }
    }
}

impl EventSourcedAggregate for Account {
    type Id = String;
    type Change = AccountChange;

    fn aggregate_id(&self) -> String {
        self.id.clone()
    }

    fn aggregate_version(&self) -> i64 {
        self.version
    }

    fn pending_changes(&self) -> &[AccountChange] {
        &self.changes
    }

    fn clear_pending_changes(&mut self) {
        for change in self.changes.drain(..) {
            self.committed_events.push(change.event);
        }
    }

    fn for_reconstitution() -> Self {
        Self::blank()
    }

    fn reconstitute(&mut self, changes: Vec<AccountChange>) {
        for change in changes {
            self.apply(&change.event);
            self.version = change.version.unwrap_or(self.version + 1);
            self.committed_events.push(change.event);
        }
        self.changes.clear();
    }
}

/// Per-variant event contracts, the way a production codebase would name its
/// stored events.
pub struct AccountEventResolver;

impl ContractResolver<AccountEvent> for AccountEventResolver {
    fn resolve_from_object(&self, event: &AccountEvent) -> Contract {
        Contract::new(match event {
            AccountEvent::Opened { .. } => "banking.account-opened",
            AccountEvent::BalanceIncreased { .. } => "banking.balance-increased",
            AccountEvent::BalanceDecreased { .. } => "banking.balance-decreased",
        })
    }
}

/// A change mapper that recognizes only account openings, for exercising the
/// unsupported-change failure path.
pub struct OpenedOnlyChangeMapper;

impl ChangeMapper for OpenedOnlyChangeMapper {
    type Change = AccountChange;
    type Event = AccountEvent;
    type Metadata = Value;

    fn read_event(&self, change: &AccountChange) -> Result<AccountEvent> {
        match &change.event {
            AccountEvent::Opened { .. } => Ok(change.event.clone()),
            other => Err(unsupported_change(other)),
        }
    }

    fn read_metadata(&self, change: &AccountChange) -> Result<Option<Value>> {
        Ok(change.metadata.clone())
    }

    fn event_id(&self, change: &AccountChange) -> Option<EventId> {
        change.event_id
    }

    fn event_version(&self, change: &AccountChange) -> Option<i64> {
        change.version
    }

    fn read_when(&self, change: &AccountChange) -> DateTime<Utc> {
        change.when
    }

    fn write_change(
        &self,
        event_id: EventId,
        event: AccountEvent,
        when: DateTime<Utc>,
        metadata: Option<Value>,
        version: i64,
    ) -> Result<AccountChange> {
        match event {
            AccountEvent::Opened { .. } => Ok(AccountChange {
                event,
                metadata,
                event_id: Some(event_id),
                version: Some(version),
                when,
            }),
            other => Err(unsupported_change(&other)),
        }
    }
}

/// Hands out a scripted sequence of commit ids, then panics; keeps journal
/// assertions deterministic.
pub struct ScriptedCommitIds {
    remaining: Mutex<VecDeque<CommitId>>,
}

impl ScriptedCommitIds {
    pub fn new(ids: impl IntoIterator<Item = &'static str>) -> Self {
        let remaining = ids
            .into_iter()
            .map(|raw| CommitId::from_uuid(Uuid::parse_str(raw).expect("fixture uuid")))
            .collect();
        Self {
            remaining: Mutex::new(remaining),
        }
    }
}

impl CommitIdGenerator for ScriptedCommitIds {
    fn generate_commit_id(&self) -> CommitId {
        self.remaining
            .lock()
            .expect("scripted commit ids poisoned")
            .pop_front()
            .expect("ran out of scripted commit ids")
    }
}

pub type BankingStore = MemoryEventStore<String, AccountEvent, Value>;
pub type BankingUow = UnitOfWork<
    BankingStore,
    EventSourcedAggregateMapper<Account>,
    RecordedChangeMapper<AccountChange>,
>;

pub fn unit_of_work(store: BankingStore) -> BankingUow {
    UnitOfWork::new(
        store,
        EventSourcedAggregateMapper::new(account_contract()),
        RecordedChangeMapper::new(),
        Box::new(AccountEventResolver),
        Box::new(TypeNameResolver),
    )
}

pub fn opened_only_unit_of_work(
    store: BankingStore,
) -> UnitOfWork<BankingStore, EventSourcedAggregateMapper<Account>, OpenedOnlyChangeMapper> {
    UnitOfWork::new(
        store,
        EventSourcedAggregateMapper::new(account_contract()),
        OpenedOnlyChangeMapper,
        Box::new(AccountEventResolver),
        Box::new(TypeNameResolver),
    )
}
