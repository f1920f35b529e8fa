pub mod policy;

pub use policy::{
    CheckOutcome, DomainCheck, PolicyDecision, PolicyGate, PolicyHandle, ReasonCode, Verdict,
};
