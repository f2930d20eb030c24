//! Application services for the task ledger.

mod ledger;

pub use ledger::{
    CreateTaskRequest, TaskLedgerError, TaskLedgerResult, TaskLedgerService,
    TransitionTaskRequest,
};
