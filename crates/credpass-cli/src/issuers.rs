//! # Issuer Registry Subcommands
//!
//! Listing is open to verifiers and governors; registration and
//! deregistration require `--as governor:<address>`.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use credpass_core::Address;

use crate::print_json;
use crate::session::Session;

/// Arguments for `credpass issuers`.
#[derive(Args, Debug)]
pub struct IssuersArgs {
    #[command(subcommand)]
    pub command: IssuersCommand,
}

#[derive(Subcommand, Debug)]
pub enum IssuersCommand {
    /// List issuer registrations.
    List,
    /// Register an issuer, or rename an existing one.
    Register {
        #[arg(value_parser = Address::parse)]
        address: Address,
        name: String,
    },
    /// Withdraw an issuer's registration.
    Deregister {
        #[arg(value_parser = Address::parse)]
        address: Address,
    },
}

/// Execute `credpass issuers`.
pub fn run_issuers(args: &IssuersArgs, session: &Session) -> Result<u8> {
    let service = session.service();
    let principal = session.principal();
    match &args.command {
        IssuersCommand::List => {
            let issuers = session.block_on(service.list_issuers(principal))?;
            print_json(&issuers)?;
        }
        IssuersCommand::Register { address, name } => {
            let registration = session
                .block_on(service.register_issuer(principal, *address, name))
                .with_context(|| format!("failed to register {address}"))?;
            session.persist()?;
            println!("OK: {} registered as \"{}\"", registration.address, registration.name);
        }
        IssuersCommand::Deregister { address } => {
            session
                .block_on(service.deregister_issuer(principal, *address))
                .with_context(|| format!("failed to deregister {address}"))?;
            session.persist()?;
            println!("OK: {address} deregistered");
        }
    }
    Ok(0)
}
