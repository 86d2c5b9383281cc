/// Wallet records and their stored byte representation.
pub mod wallet;

/// Table of ledger operations, plus typed commands built from loosely typed
/// invocation arguments.
pub mod command;

/// The store boundary the ledger is written against, plus an in-memory
/// implementation that stages writes per invocation and commits them atomically.
pub mod store;

/// Wallet operations: create, read, update, delete, transfer, and a full scan.
///
/// NOTE: the ledger never coordinates its own writes. A transfer is atomic only
/// because the store commits everything staged during one invocation together.
pub mod ledger;

/// Runs commands as single invocations against a store, committing on success.
pub mod processor;

/// Bootstraps the ledger for the `wallet-ledger` binary. Kept in the library so
/// the integration tests can drive it.
pub mod bin_utils;
