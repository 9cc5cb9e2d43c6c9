//! Developer CLI for the zkLogin handshake.
//!
//! Drives the published `zklogin-core` interface from the command line:
//! `begin` prints the authorization URL a browser host would navigate to,
//! `complete` consumes a pasted redirect URL, and the remaining commands
//! inspect or edit the stored account list. Storage scopes are JSON files
//! under the data dir, so state survives across invocations. Key material
//! and addresses come from the core's in-memory crypto adapter and are for
//! development only.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use eyre::WrapErr as _;
use zklogin_core::chain::{HttpEpochSource, StaticEpoch};
use zklogin_core::platform::memory::{MemoryCrypto, MemoryNavigator};
use zklogin_core::prover::ProverClient;
use zklogin_core::salt::FixedSalt;
use zklogin_core::{
    begin_login, complete_login, AuthParams, OpenIdConfig, OpenIdProvider, ZkLoginHost,
    ZkLoginStore,
};

mod store;

use store::FileStore;

#[derive(Parser)]
#[command(name = "zklogin", about, version)]
struct Cli {
    /// Directory holding the storage scopes.
    #[arg(long, env = "ZKLOGIN_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Begin a login: generate key material, persist setup data, and print
    /// the provider authorization URL.
    Begin {
        /// Identity provider (google, facebook, twitch, kakao, apple,
        /// slack, microsoft).
        #[arg(long)]
        provider: OpenIdProvider,
        /// Authorization endpoint URL for the provider.
        #[arg(long)]
        auth_url: String,
        /// OAuth client id issued by the provider.
        #[arg(long)]
        client_id: String,
        /// Redirect URI registered with the provider.
        #[arg(long, default_value = "http://localhost:3000/")]
        redirect_uri: String,
        /// Extra `key=value` parameters for the authorization URL.
        #[arg(long = "param", value_parser = parse_key_value)]
        params: Vec<(String, String)>,
        /// Endpoint returning `{"epoch": N}`; overrides --epoch.
        #[arg(long)]
        epoch_url: Option<String>,
        /// Fixed current epoch, for offline use.
        #[arg(long, default_value_t = 0)]
        epoch: u64,
    },
    /// Complete a login from the redirect URL the provider produced.
    Complete {
        /// Full redirect URL including the `#id_token=` fragment.
        #[arg(long)]
        redirect_url: String,
        /// zkLogin proving service endpoint.
        #[arg(long, env = "ZKLOGIN_PROVER_URL")]
        prover_url: String,
        /// User salt as a decimal integer.
        #[arg(long)]
        salt: u128,
    },
    /// List stored accounts, newest first.
    Accounts,
    /// Remove one account by address.
    Remove {
        /// The account's address.
        address: String,
    },
    /// Remove every stored account.
    SignOut,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected key=value, got `{raw}`"))
}

fn data_dir(cli_dir: Option<PathBuf>) -> PathBuf {
    cli_dir.unwrap_or_else(|| {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("zklogin")
    })
}

fn host(data_dir: PathBuf, current_url: &str) -> eyre::Result<ZkLoginHost> {
    let storage = FileStore::open(data_dir).wrap_err("opening storage scopes")?;
    Ok(ZkLoginHost::new(
        Arc::new(storage),
        Arc::new(MemoryNavigator::new(current_url)),
        Arc::new(MemoryCrypto::new()),
    ))
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let dir = data_dir(cli.data_dir);

    match cli.command {
        Command::Begin {
            provider,
            auth_url,
            client_id,
            redirect_uri,
            params,
            epoch_url,
            epoch,
        } => {
            let navigator = Arc::new(MemoryNavigator::new(&redirect_uri));
            let storage = FileStore::open(dir).wrap_err("opening storage scopes")?;
            let host = ZkLoginHost::new(
                Arc::new(storage),
                navigator.clone(),
                Arc::new(MemoryCrypto::new()),
            );
            let providers_config = HashMap::from([(
                provider,
                OpenIdConfig {
                    auth_url,
                    client_id,
                    extra_params: params.into_iter().collect::<BTreeMap<_, _>>(),
                },
            )]);
            let auth_params = AuthParams {
                redirect_uri: Some(redirect_uri),
                ..AuthParams::default()
            };

            if let Some(url) = epoch_url {
                begin_login(
                    &host,
                    &HttpEpochSource::new(&url),
                    provider,
                    &providers_config,
                    Some(auth_params),
                    None,
                )
                .await?;
            } else {
                begin_login(
                    &host,
                    &StaticEpoch(epoch),
                    provider,
                    &providers_config,
                    Some(auth_params),
                    None,
                )
                .await?;
            }

            let url = navigator
                .last_navigation()
                .ok_or_else(|| eyre::eyre!("no authorization URL was produced"))?;
            println!("open this URL to authenticate:\n{url}");
        }
        Command::Complete {
            redirect_url,
            prover_url,
            salt,
        } => {
            let host = host(dir, &redirect_url)?;
            let prover = ProverClient::new(&prover_url);
            match complete_login(&host, &prover, &FixedSalt(salt)).await? {
                Some(outcome) => {
                    println!("logged in as {}", outcome.address);
                    println!("{} account(s) stored", outcome.accounts.len());
                }
                None => println!("nothing to complete (no token, no pending setup, or duplicate account)"),
            }
        }
        Command::Accounts => {
            let host = host(dir, "http://localhost:3000/")?;
            let snapshot = ZkLoginStore::new(host)?.snapshot();
            if snapshot.accounts.is_empty() {
                println!("no accounts stored");
            }
            for account in &snapshot.accounts {
                println!(
                    "{}",
                    serde_json::json!({
                        "address": account.user_addr,
                        "provider": account.provider,
                        "sub": account.sub,
                        "aud": account.aud,
                        "maxEpoch": account.max_epoch,
                    })
                );
            }
        }
        Command::Remove { address } => {
            let host = host(dir, "http://localhost:3000/")?;
            let store = ZkLoginStore::new(host)?;
            store.clear_account(&address)?;
            println!("current address: {:?}", store.snapshot().address);
        }
        Command::SignOut => {
            let host = host(dir, "http://localhost:3000/")?;
            ZkLoginStore::new(host)?.sign_out()?;
            println!("signed out");
        }
    }

    Ok(())
}
