//! Collaborator seams for the deployment orchestrator.
//!
//! The orchestrator never talks to a node or an explorer directly. It drives
//! a [`NetworkProvider`] and a [`VerificationService`], both of which must be
//! safe to share between concurrent deployment runs.

mod provider;
mod verifier;

pub use provider::NetworkProvider;
pub use verifier::VerificationService;
