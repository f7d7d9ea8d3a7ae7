use crate::error::CliError;
use crate::output::{print_output, OutputFormat};
use crate::storage::Storage;
use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use freenet_scaffold::ComposableState;
use serde::Serialize;
use std::fmt;
use supply_core::{Amount, ContractParameters, ContractTerms, Invocation, Stage};

/// Read-only views of the stored contract.
#[derive(Subcommand)]
pub enum InspectCommands {
    /// Show the lifecycle stage, terms and balances
    Status,
    /// List the applied invocations in order
    Journal,
    /// Replay the journal and audit the balances
    Verify,
}

#[derive(Serialize)]
struct StatusOutput {
    stage: Stage,
    terms: Option<ContractTerms>,
    buyer_balance: Option<Amount>,
    supplier_balance: Option<Amount>,
    signal: Option<&'static str>,
    delivered_1: bool,
    realized_2: bool,
    journal_length: usize,
    audit: Option<String>,
}

impl fmt::Display for StatusOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {}", "Stage:".bold(), self.stage)?;
        if let Some(terms) = &self.terms {
            writeln!(f, "{}", "Terms:".bold())?;
            for (field, amount) in terms.entries() {
                writeln!(f, "  {:<16} {}", field.key(), amount)?;
            }
        }
        writeln!(f, "{}", "Balances:".bold())?;
        for (name, balance) in [
            ("buyer_balance", self.buyer_balance),
            ("supplier_balance", self.supplier_balance),
        ] {
            let shown = balance.map_or_else(|| "-".to_string(), |b| b.to_string());
            writeln!(f, "  {:<16} {}", name, shown)?;
        }
        writeln!(f, "{} {}", "Signal:".bold(), self.signal.unwrap_or("unset"))?;
        writeln!(f, "{} {}", "Journal:".bold(), self.journal_length)?;
        match &self.audit {
            None => write!(f, "{} {}", "Audit:".bold(), "ok".green()),
            Some(problem) => write!(f, "{} {}", "Audit:".bold(), problem.red()),
        }
    }
}

#[derive(Serialize)]
struct JournalEntry {
    index: usize,
    function: String,
    args: Vec<String>,
}

#[derive(Serialize)]
struct JournalOutput {
    entries: Vec<JournalEntry>,
}

impl fmt::Display for JournalOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entries.is_empty() {
            return write!(f, "journal is empty");
        }
        let lines: Vec<String> = self
            .entries
            .iter()
            .map(|entry| {
                let invocation = Invocation::new(entry.function.as_str(), entry.args.iter().cloned());
                format!("{:>3}. {}", entry.index, invocation)
            })
            .collect();
        write!(f, "{}", lines.join("\n"))
    }
}

#[derive(Serialize)]
struct VerifyOutput {
    verified: bool,
    journal_length: usize,
}

impl fmt::Display for VerifyOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} journal of {} invocation(s) replays to the stored state",
            "verified:".green(),
            self.journal_length
        )
    }
}

pub fn execute(command: InspectCommands, storage: &Storage, format: OutputFormat) -> Result<()> {
    let state = storage.load()?;
    match command {
        InspectCommands::Status => {
            let snapshot = state.snapshot()?;
            let audit = snapshot.audit().err().map(|e| e.to_string());
            let output = StatusOutput {
                stage: snapshot.stage(),
                terms: snapshot.terms,
                buyer_balance: snapshot.buyer_balance,
                supplier_balance: snapshot.supplier_balance,
                signal: snapshot.signal.map(|s| s.as_str()),
                delivered_1: snapshot.delivered_1,
                realized_2: snapshot.realized_2,
                journal_length: state.journal().len(),
                audit,
            };
            print_output(&output, format)
        }
        InspectCommands::Journal => {
            let entries = state
                .journal()
                .iter()
                .enumerate()
                .map(|(i, invocation)| JournalEntry {
                    index: i + 1,
                    function: invocation.function.clone(),
                    args: invocation.args.clone(),
                })
                .collect();
            print_output(&JournalOutput { entries }, format)
        }
        InspectCommands::Verify => {
            state
                .verify(&state, &ContractParameters)
                .map_err(CliError::Verification)?;
            let output = VerifyOutput {
                verified: true,
                journal_length: state.journal().len(),
            };
            print_output(&output, format)
        }
    }
}
