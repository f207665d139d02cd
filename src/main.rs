use anyhow::{Context, Result, bail};
use authcrypt::{Crypter, KdfParams, Prf, format};
use chrono::TimeDelta;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
mod auth;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PrfArg {
    Sha1,
    Sha256,
    Sha512,
}

impl From<PrfArg> for Prf {
    fn from(arg: PrfArg) -> Self {
        match arg {
            PrfArg::Sha1 => Prf::Sha1,
            PrfArg::Sha256 => Prf::Sha256,
            PrfArg::Sha512 => Prf::Sha512,
        }
    }
}

#[derive(Debug, clap::Args)]
struct KdfArgs {
    /// PBKDF2 iterations (default: 10000)
    #[arg(long, global = true, env = "AUTHCRYPT_ITERATIONS")]
    iterations: Option<u32>,

    /// PBKDF2 pseudorandom function (default: sha256)
    #[arg(long, global = true, value_enum, env = "AUTHCRYPT_PRF")]
    prf: Option<PrfArg>,
}

impl KdfArgs {
    fn to_kdf_params(&self) -> Result<KdfParams> {
        let default = KdfParams::default();

        KdfParams::new(
            self.iterations.unwrap_or(default.iterations()),
            self.prf.map(Prf::from).unwrap_or(default.prf()),
        )
        .context("invalid PBKDF2 parameters")
    }
}

#[derive(Debug, Parser)]
#[command(name = "authcrypt")]
#[command(
    version,
    about = "Authenticated AES-CBC + HMAC-SHA512 encryption and PBKDF2 password hashing."
)]
struct Cli {
    #[command(flatten)]
    kdf: KdfArgs,

    /// Log diagnostics to stderr (filter with RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Encrypts text under the password
    #[command(arg_required_else_help = true)]
    Encrypt {
        text: String,

        /// Reject the envelope once this many seconds have passed
        #[arg(long, value_name = "SECONDS")]
        expires_in: Option<i64>,
    },

    /// Decrypts an envelope produced by `encrypt`
    #[command(arg_required_else_help = true)]
    Decrypt {
        envelope: String,

        /// Require an unexpired expiration stamp
        #[arg(long, default_value_t = false)]
        check_expiration: bool,
    },

    /// Hashes a password for storage
    Hash,

    /// Checks a password against a stored hash
    #[command(arg_required_else_help = true)]
    Verify { hash: String },

    /// Derives key material from the password
    Derive {
        /// Base64 salt, at least 8 bytes
        #[arg(long)]
        salt: String,

        /// Number of bytes to derive
        #[arg(long, default_value_t = 32)]
        length: usize,
    },
}

fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "authcrypt=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    // .env is optional
    dotenvy::dotenv().ok();

    let args = Cli::parse();
    if args.verbose {
        init_logging();
    }

    let crypter = Crypter::with_kdf(args.kdf.to_kdf_params()?);

    match args.command {
        Commands::Encrypt { text, expires_in } => {
            let password = auth::read_password()?;
            let envelope = match expires_in {
                Some(secs) => {
                    let ttl = TimeDelta::try_seconds(secs).context("expiration out of range")?;
                    crypter.encrypt_with_password_and_expiration(&text, ttl, &password)?
                }
                None => crypter.encrypt_with_password(&text, &password)?,
            };
            println!("{envelope}");
        }
        Commands::Decrypt {
            envelope,
            check_expiration,
        } => {
            let password = auth::read_password()?;
            let plaintext = if check_expiration {
                crypter.decrypt_with_password_and_expiration(&envelope, &password)?
            } else {
                crypter.decrypt_with_password(&envelope, &password)?
            };
            match plaintext {
                Some(text) => println!("{}", text.as_str()),
                None => bail!("unable to decrypt: wrong password, tampered or expired data"),
            }
        }
        Commands::Hash => {
            let password = auth::read_new_password_with_confirmation()?;
            println!("{}", crypter.hash_password(&password)?);
        }
        Commands::Verify { hash } => {
            let password = auth::read_password()?;
            if crypter.verify_password(&password, &hash)? {
                println!("password matches");
            } else {
                bail!("password does not match");
            }
        }
        Commands::Derive { salt, length } => {
            let password = auth::read_password()?;
            let salt = format::decode(&salt).context("salt must be base64")?;
            let key = crypter.derive_bytes(password.as_bytes(), &salt, length)?;
            println!("{}", format::encode(&key));
        }
    }

    Ok(())
}
