//! Shared type definitions for the relay workflow middleware.
//!
//! The models defined here are the contract between the capability registry,
//! the execution engine, and any caller that submits workflows. Parameter and
//! metadata maps intentionally preserve authoring order (via `IndexMap`) so
//! generated input forms and execution reports render in a predictable
//! sequence.

pub mod capability;
pub mod response;
pub mod workflow;

pub use capability::{CapabilityDescriptor, InvocationSpec};
pub use response::{
    ActionStatus, ActionTiming, CompletedResponse, ConfirmationResponse, ExecutionResponse, ExecutionResult, FailedResponse,
    RunReport, RunStatus, StepError,
};
pub use workflow::{Action, ExecutionOptions, FailurePolicy, ParamSpec, Workflow};
