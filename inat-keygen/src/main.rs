//! Inat license token generator.
//!
//! Offline admin tool: the signing secret is embedded, so tokens are
//! produced locally and sent to the customer by mail. Never ship this
//! binary to customers.
//!
//! Usage:
//!   inat-keygen generate --license-type professional --name "Acme AG" --valid-until 2027-01-01
//!   inat-keygen verify INAT-XXXX-....
//!   inat-keygen fingerprint

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use inat_license::{
    ANY_MACHINE, LicenseRecord, LicenseType, MachineFingerprint, decode_and_verify, encode,
};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "inat-keygen")]
#[command(about = "Generates and verifies Inat license tokens")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a signed license token
    Generate {
        /// Kind of license to issue
        #[arg(long, value_enum)]
        license_type: TypeArg,

        /// Customer name (truncated to 20 characters)
        #[arg(long)]
        name: String,

        /// Expiry date as YYYY-MM-DD; omit for a never-expiring license
        #[arg(long)]
        valid_until: Option<String>,

        /// Machine fingerprint to bind to; omit for any machine,
        /// or pass "self" to bind to this machine
        #[arg(long)]
        hardware_id: Option<String>,
    },

    /// Decode and verify a token
    Verify {
        /// The token, case-insensitive
        token: String,
    },

    /// Print this machine's fingerprint
    Fingerprint,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum TypeArg {
    Trial,
    Professional,
    Enterprise,
    Superuser,
}

impl From<TypeArg> for LicenseType {
    fn from(arg: TypeArg) -> Self {
        match arg {
            TypeArg::Trial => Self::Trial,
            TypeArg::Professional => Self::Professional,
            TypeArg::Enterprise => Self::Enterprise,
            TypeArg::Superuser => Self::Superuser,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::WARN };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    match args.command {
        Command::Generate {
            license_type,
            name,
            valid_until,
            hardware_id,
        } => generate(license_type.into(), &name, valid_until, hardware_id),
        Command::Verify { token } => verify(&token),
        Command::Fingerprint => {
            println!("{}", MachineFingerprint::current());
            Ok(())
        }
    }
}

fn generate(
    license_type: LicenseType,
    name: &str,
    valid_until: Option<String>,
    hardware_id: Option<String>,
) -> Result<()> {
    let valid_until = valid_until
        .map(|s| {
            NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                .with_context(|| format!("invalid expiry date: {s}"))
        })
        .transpose()?;

    if license_type != LicenseType::Superuser && valid_until.is_none() {
        tracing::warn!("issuing a never-expiring {license_type:?} license");
    }

    let hardware_id = match hardware_id.as_deref() {
        None => ANY_MACHINE.to_string(),
        Some("self") => MachineFingerprint::current().id().to_string(),
        Some(id) => id.to_string(),
    };

    let record = LicenseRecord::new(license_type, name, valid_until, &hardware_id);
    if record.customer_name.is_empty() {
        bail!("customer name is empty after normalization");
    }

    println!("{}", encode(&record));
    Ok(())
}

fn verify(token: &str) -> Result<()> {
    match decode_and_verify(token) {
        Ok(record) => {
            println!("valid token");
            println!("  type:       {:?}", record.license_type);
            println!("  customer:   {}", record.customer_name);
            match record.valid_until {
                Some(date) => println!("  valid until: {date}"),
                None => println!("  valid until: forever"),
            }
            println!("  hardware:   {}", record.hardware_id);
            Ok(())
        }
        Err(rejection) => bail!("token rejected: {rejection}"),
    }
}
