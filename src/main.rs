use std::fs;
use std::net::IpAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use rootca::cert::params::{
    DEFAULT_MAX_PATH_LEN, DEFAULT_VALIDITY_YEARS, DistinguishedName, RootCaConfig,
};
use rootca::issuer::issue_self_signed_root;
use rootca::key::Curve;
use rootca::loader::load_pair;

#[derive(Parser)]
#[command(name = "rootca")]
#[command(version, about = "Bootstrap a self-signed root certificate authority", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Generate a key pair and a self-signed root certificate")]
    Init {
        #[arg(long, default_value = "testdata", help = "Directory for the generated files")]
        out_dir: PathBuf,

        #[arg(long, default_value = "ca-cert.pem", help = "Certificate file name")]
        cert_file: String,

        #[arg(long, default_value = "ca-key.pem", help = "Private key file name")]
        key_file: String,

        #[arg(long, default_value = "ca.org1.example.com", help = "Common name")]
        cn: String,

        #[arg(short = 'C', long, default_value = "CN", help = "Country code")]
        country: String,

        #[arg(short = 'S', long, default_value = "北京", help = "State or province")]
        state: String,

        #[arg(short = 'L', long, default_value = "北京", help = "Locality or city")]
        locality: String,

        #[arg(short, long, default_value = "org1.example.com", help = "Organization")]
        org: String,

        #[arg(short = 'u', long, help = "Organizational unit")]
        ou: Option<String>,

        #[arg(long, default_value_t = DEFAULT_VALIDITY_YEARS, help = "Validity in years")]
        years: u32,

        #[arg(long, default_value_t = DEFAULT_MAX_PATH_LEN, help = "Maximum intermediate CAs below the root")]
        max_path_len: u8,

        #[arg(long, help = "Emit a path length of zero instead of leaving it unset")]
        max_path_len_zero: bool,

        #[arg(long, default_value_t = Curve::P256, help = "Key curve (p256 or p384)")]
        curve: Curve,

        #[arg(long = "dns", help = "DNS subject alternative name (repeatable)")]
        dns_names: Vec<String>,

        #[arg(long = "ip", help = "IP subject alternative name (repeatable)")]
        ip_addresses: Vec<IpAddr>,
    },

    #[command(about = "Load a certificate/key pair and print the certificate")]
    Inspect {
        #[arg(long, default_value = "testdata/ca-cert.pem")]
        cert: PathBuf,

        #[arg(long, default_value = "testdata/ca-key.pem")]
        key: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    match Cli::parse().command {
        Commands::Init {
            out_dir,
            cert_file,
            key_file,
            cn,
            country,
            state,
            locality,
            org,
            ou,
            years,
            max_path_len,
            max_path_len_zero,
            curve,
            dns_names,
            ip_addresses,
        } => {
            let subject = DistinguishedName::builder()
                .common_name(cn)
                .country(country)
                .state(state)
                .locality(locality)
                .organization(org)
                .maybe_organization_unit(ou)
                .build();

            let config = RootCaConfig::builder()
                .curve(curve)
                .subject(subject)
                .validity_years(years)
                .max_path_len(max_path_len)
                .max_path_len_zero(max_path_len_zero)
                .dns_names(dns_names)
                .ip_addresses(ip_addresses)
                .build();

            fs::create_dir_all(&out_dir)
                .with_context(|| format!("creating {}", out_dir.display()))?;
            let root = issue_self_signed_root(&config).context("issuing root certificate")?;
            root.persist(out_dir.join(cert_file), out_dir.join(key_file))
                .context("writing root certificate")?;
        }
        Commands::Inspect { cert, key } => {
            let certificate = load_pair(&cert, &key).context("loading certificate pair")?;
            let subject = certificate.subject();
            let validity = certificate.validity();
            let serial = hex::encode(certificate.serial_number());

            println!("Subject CN:  {}", subject.common_name);
            println!("Issuer CN:   {}", certificate.issuer().common_name);
            println!("Serial:      {serial}");
            println!("Not before:  {}", validity.not_before);
            println!("Not after:   {}", validity.not_after);
            if let Some(bc) = certificate.basic_constraints()? {
                println!("CA:          {}", bc.is_ca);
                match bc.max_path_length {
                    Some(len) => println!("Path length: {len}"),
                    None => println!("Path length: unlimited"),
                }
            }
            println!("Self-signed: {}", certificate.verify_self_signed()?);
        }
    }

    Ok(())
}
