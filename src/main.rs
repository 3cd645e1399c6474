use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use ownership_voucher::artifacts::{ArtifactDir, KeyPair, TrustPool};
use ownership_voucher::voucher::{self, Assertion, OwnershipVoucher, Signer};
use std::error::Error;
use std::fs;
use std::process::ExitCode;

#[derive(Parser)]
#[command(author, version, about = "Ownership voucher tool")]
struct OVToolCli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    Sign(SignArgs),
    Verify(VerifyArgs),
    Check(CheckArgs),
}

#[derive(Debug, clap::Args)]
#[command(author, version, long_about = None,
    about = "Sign an ownership voucher for the given serial number using the \
    vendor CA key pair")]
struct SignArgs {
    #[arg(short, long)]
    serial: String,

    /// Pinned domain certificate (PEM)
    #[arg(short, long, default_value = "pdc_pub.pem")]
    pdc: String,

    /// Vendor CA certificate (PEM)
    #[arg(short, long, default_value = "vendorca_pub.pem")]
    cert: String,

    /// Vendor CA private key (PEM)
    #[arg(short, long, default_value = "vendorca_priv.pem")]
    key: String,

    #[arg(short, long, value_parser = parse_assertion)]
    assertion: Option<Assertion>,

    #[arg(short, long)]
    revocation_checks: bool,

    #[arg(long, default_value_t = voucher::VOUCHER_VALIDITY_DAYS)]
    validity_days: i64,

    /// Defaults to ov_<serial>.der
    #[arg(short, long)]
    out: Option<String>,
}

#[derive(Debug, clap::Args)]
#[command(author, version, long_about = None,
    about = "Verify the supplied ownership voucher against the trusted \
    certificates and print its content")]
struct VerifyArgs {
    #[arg(short = 'i', long)]
    voucher: String,

    /// Trusted certificates (PEM bundle)
    #[arg(short, long, default_value = "vendorca_pub.pem")]
    trust: String,

    /// Also reject vouchers outside their validity window
    #[arg(short, long)]
    check_expiry: bool,
}

#[derive(Debug, clap::Args)]
#[command(author, version, long_about = None,
    about = "Load and assemble the security artifacts found in a directory")]
struct CheckArgs {
    #[arg(short, long, default_value = "testdata")]
    artifacts: String,
}

fn main() -> ExitCode {
    let cli = OVToolCli::parse();

    env_logger::builder()
        .format_timestamp(None)
        .format_module_path(false)
        .filter_level(if cli.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .init();

    let res = match &cli.command {
        Command::Sign(args) => sign(args).map(|out| println!("voucher written to {out}")),
        Command::Verify(args) => verify(args),
        Command::Check(args) => check(args),
    };

    match res {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let what = match cli.command {
                Command::Sign(_) => "signing",
                Command::Verify(_) => "verification",
                Command::Check(_) => "check",
            };
            eprintln!("{what} failed: {e}");
            ExitCode::FAILURE
        }
    }
}

fn parse_assertion(s: &str) -> Result<Assertion, String> {
    s.parse().map_err(|e: voucher::FormatError| e.to_string())
}

fn sign(args: &SignArgs) -> Result<String, Box<dyn Error>> {
    let cert = fs::read(&args.cert)?;
    let key = fs::read(&args.key)?;
    let vendor_ca = KeyPair::from_pem(&cert, &key)?;

    let pdc = fs::read_to_string(&args.pdc)?;

    let mut signer = Signer::new(&vendor_ca)
        .revocation_checks(args.revocation_checks)
        .validity(
            Duration::try_days(args.validity_days)
                .ok_or_else(|| format!("validity of {} days out of range", args.validity_days))?,
        );

    if let Some(a) = args.assertion {
        signer = signer.assertion(a);
    }

    let ov = signer.sign(&args.serial, &pdc)?;

    let out = args
        .out
        .clone()
        .unwrap_or_else(|| format!("ov_{}.der", args.serial));
    fs::write(&out, ov)?;

    Ok(out)
}

fn verify(args: &VerifyArgs) -> Result<(), Box<dyn Error>> {
    let ov = fs::read(&args.voucher)?;

    let pool = TrustPool::from_pem(&fs::read(&args.trust)?)?;

    let claims = if args.check_expiry {
        voucher::verify_at(&ov, &pool, Utc::now())?
    } else {
        voucher::verify(&ov, &pool)?
    };

    let j = serde_json::to_string_pretty(&OwnershipVoucher { voucher: claims })?;

    println!("{j}");

    Ok(())
}

fn check(args: &CheckArgs) -> Result<(), Box<dyn Error>> {
    let sa = ArtifactDir::new(&args.artifacts).load()?;

    println!("TLS identity: {:?}", sa.tls_identity());
    println!("trust pool: {:?}", sa.trust_pool());
    println!("vendor CA: {:?}", sa.vendor_ca());

    for id in sa.voucher_ids() {
        println!("voucher: {id}");
    }

    Ok(())
}
