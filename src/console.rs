/// Stateless presentation collaborator.
///
/// Owns no data: every function renders its arguments to stdout (or reads
/// one line from stdin) and returns. The engine's correctness never depends
/// on anything in this module.
use crate::ledger::{RequestRecord, ResultLedger};
use std::io::{self, Write};

const SEPARATOR_WIDTH: usize = 72;

#[derive(Debug, Clone, Copy)]
pub enum Status {
    Info,
    Success,
    Error,
    Wait,
    Request,
}

impl Status {
    fn symbol(self) -> &'static str {
        match self {
            Self::Info => "►",
            Self::Success => "✓",
            Self::Error => "✗",
            Self::Wait => "◆",
            Self::Request => "→",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Success => "SUCCESS",
            Self::Error => "ERROR",
            Self::Wait => "WAIT",
            Self::Request => "REQUEST",
        }
    }
}

pub fn status(kind: Status, message: &str) {
    println!("  {} [{:8}] {}", kind.symbol(), kind.label(), message);
}

pub fn separator() {
    println!("{}", "─".repeat(SEPARATOR_WIDTH));
}

pub fn banner() {
    println!();
    println!("  ROTOR - cloud egress IP rotation probe");
    println!("  Providers: API Gateway | Compute Instances");
    println!();
}

/// Provider selection offered by the interactive menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Gateway,
    Instance,
    Inspect,
    Quit,
}

/// Displays the provider menu and reads a choice. End of input counts as
/// quitting, so a closed stdin ends the program gracefully.
pub fn menu() -> MenuChoice {
    println!("  [1] API Gateway rotation");
    println!("      Uses terraform-deployed regional gateway endpoints");
    println!("  [2] Compute instance rotation");
    println!("      Routes requests through deployed instances per region");
    println!("  [3] View current IPs");
    println!("      Probes the pool once without running a rotation");
    println!("  [Q] Quit");
    println!();

    loop {
        let Some(line) = prompt_line("Select option [1/2/3/Q]") else {
            return MenuChoice::Quit;
        };
        match line.to_lowercase().as_str() {
            "1" | "gateway" | "aws" => return MenuChoice::Gateway,
            "2" | "instance" | "gcp" => return MenuChoice::Instance,
            "3" | "view" => return MenuChoice::Inspect,
            "q" | "quit" | "exit" => return MenuChoice::Quit,
            other => println!("  Invalid choice {:?}. Please enter 1, 2, 3, or Q.", other),
        }
    }
}

/// Asks a yes/no question; an empty answer or end of input means yes.
pub fn prompt_yes_no(question: &str) -> bool {
    let Some(line) = prompt_line(&format!("{} [Y/n]", question)) else {
        return true;
    };
    matches!(line.to_lowercase().as_str(), "" | "y" | "yes")
}

// Prints the prompt, reads one trimmed line. None means stdin is closed or
// unreadable.
fn prompt_line(prompt: &str) -> Option<String> {
    print!("  → {}: ", prompt);
    let _ = io::stdout().flush();

    let mut line = String::new();
    match io::stdin().read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line.trim().to_string()),
    }
}

pub fn record_block(record: &RequestRecord) {
    let status_code = record
        .status_code
        .map(|code| code.to_string())
        .unwrap_or_else(|| "-".to_string());

    println!("        Region:        {}", record.region);
    println!("        IP Address:    {}", record.ip_address);
    println!("        Status Code:   {}", status_code);
    println!("        Response Time: {:.2} ms", record.elapsed_ms);
    println!("        Outcome:       {}", record.outcome);
}

pub fn progress(current: u32, total: u32) {
    if current < total {
        println!("        [{}/{}] next rotation in progress...", current, total);
    } else {
        println!("        [{}/{}] all rotations complete", current, total);
    }
    println!();
}

pub fn run_summary(ledger: &ResultLedger) {
    separator();
    status(
        Status::Success,
        &format!(
            "All requests completed: {} successes out of {} attempts",
            ledger.successes(),
            ledger.len()
        ),
    );
}
