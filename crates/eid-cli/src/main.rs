mod render;
mod signer;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use eid_models::{
    ChainId, ExplorerKind, MemberQuery, RosterQuery, RosterSort, SortOrder, SuiNetwork, TribeName, WalletId,
    DEFAULT_AUDIT_PER_PAGE,
};
use eid_sdk::{
    CallbackOutcome, CallbackParams, FileStorage, KeyValueStorage, MemoryStorage, Portal, PortalConfig, RefreshOutcome,
    WalletAccount,
};
use tracing::{debug, info};

use crate::signer::ExternalSigner;

#[derive(Parser, Debug)]
#[command(name = "eid")]
#[command(about = "EID member portal from the terminal")]
#[command(author, version, long_about = None)]
pub struct Cli {
    /// API base URL
    #[arg(long, env = "EID_API_URL")]
    pub api_url: Option<String>,

    /// Network wallets must be connected to (mainnet, testnet, ...)
    #[arg(long, env = "EID_SUI_NETWORK")]
    pub network: Option<SuiNetwork>,

    /// Where the session is kept (defaults to the user config directory)
    #[arg(long, env = "EID_SESSION_FILE")]
    pub session_file: Option<PathBuf>,

    /// Keep the session in memory only
    #[arg(long, conflicts_with = "session_file")]
    pub ephemeral: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Wait until the API answers, printing each retry
    Status,
    /// Print the login URL to open in a browser
    LoginUrl,
    /// Finish a login with the parameters of the callback redirect
    Callback(CallbackArgs),
    /// Show the signed-in profile
    Me,
    /// Show or change the current tribe
    Tribe {
        #[command(subcommand)]
        action: TribeAction,
    },
    /// Link a wallet by signing a server nonce
    Link {
        /// Wallet address
        #[arg(long)]
        address: String,
        /// Chain the wallet is on, e.g. sui:testnet (omit if unknown)
        #[arg(long)]
        chain: Option<ChainId>,
    },
    /// Unlink a wallet by id
    Unlink { id: String },
    /// Voice server account
    Voice {
        #[command(subcommand)]
        action: VoiceAction,
    },
    /// Tribe roster (tribe admins only)
    Roster(RosterArgs),
    /// One roster member with recent activity and notes
    Member(MemberArgs),
    /// Forget the stored session
    Logout,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = true)]
pub struct CallbackArgs {
    /// Full redirect URL
    #[arg(long, conflicts_with_all = ["code", "token"])]
    pub url: Option<String>,
    /// One-time authorization code
    #[arg(long)]
    pub code: Option<String>,
    /// Bearer token
    #[arg(long)]
    pub token: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum TribeAction {
    /// Print the current tribe
    Show,
    /// Select a tribe
    Set { name: String },
    /// Clear the selection
    Clear,
}

#[derive(Subcommand, Debug)]
pub enum VoiceAction {
    /// Does an account exist?
    Status,
    /// Create the account or reset its password
    Create,
}

#[derive(Args, Debug)]
pub struct RosterArgs {
    /// Tribe (defaults to the current tribe)
    #[arg(long)]
    pub tribe: Option<String>,
    /// Filter on username or Discord id
    #[arg(long)]
    pub search: Option<String>,
    /// username, wallet_count or last_login
    #[arg(long, value_parser = RosterSort::parse_keyword)]
    pub sort: Option<RosterSort>,
    /// asc or desc
    #[arg(long, value_parser = SortOrder::parse_keyword)]
    pub order: Option<SortOrder>,
}

#[derive(Args, Debug)]
pub struct MemberArgs {
    /// Discord id of the member
    pub discord_id: String,
    /// Tribe (defaults to the current tribe)
    #[arg(long)]
    pub tribe: Option<String>,
    /// Activity page, starting at 1
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub page: u32,
    /// Activity entries per page
    #[arg(long, default_value_t = DEFAULT_AUDIT_PER_PAGE)]
    pub per_page: u32,
    /// Also show admin notes
    #[arg(long)]
    pub notes: bool,
}

impl MemberArgs {
    fn query(&self) -> anyhow::Result<MemberQuery> {
        Ok(MemberQuery {
            tribe: self.tribe.as_deref().map(TribeName::parse).transpose()?,
            audit_page: self.page,
            audit_per_page: self.per_page,
        })
    }
}

impl RosterArgs {
    fn into_query(self) -> anyhow::Result<RosterQuery> {
        let tribe = self.tribe.as_deref().map(TribeName::parse).transpose()?;
        Ok(RosterQuery {
            tribe,
            search: self.search.filter(|s| !s.trim().is_empty()),
            sort: self.sort.unwrap_or_default(),
            order: self.order.unwrap_or_default(),
        })
    }
}

fn config(cli: &Cli) -> PortalConfig {
    let mut config = PortalConfig::from_env();
    if let Some(url) = &cli.api_url {
        let defaults = PortalConfig::new(url);
        config.api_url = defaults.api_url;
    }
    if let Some(network) = &cli.network {
        config.sui_network = network.clone();
    }
    config
}

fn storage(cli: &Cli) -> Arc<dyn KeyValueStorage> {
    if cli.ephemeral {
        return Arc::new(MemoryStorage::new());
    }
    match cli.session_file.clone().map(FileStorage::open).or_else(FileStorage::default_location) {
        Some(file) => {
            debug!(path = %file.path().display(), "session file");
            Arc::new(file)
        }
        None => {
            info!("no config directory; session will not persist");
            Arc::new(MemoryStorage::new())
        }
    }
}

/// Boot and insist on a loaded identity.
async fn signed_in(portal: &Portal) -> anyhow::Result<()> {
    match portal.boot().await? {
        RefreshOutcome::Loaded => Ok(()),
        RefreshOutcome::SessionEnded => bail!("session expired; log in again at {}", portal.login_url()),
        RefreshOutcome::NoCredential | RefreshOutcome::Superseded => {
            bail!("not logged in; open {} and run `eid callback`", portal.login_url())
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let portal = Portal::new(config(&cli), storage(&cli)).context("invalid configuration")?;

    match cli.command {
        Commands::Status => {
            let mut status = portal.subscribe_reachability();
            let watcher = tokio::spawn(async move {
                while status.changed().await.is_ok() {
                    eprintln!("{}", status.borrow_and_update().status_text());
                }
            });
            let outcome = portal.boot().await;
            watcher.abort();
            println!("{}", portal.reachability().status_text());
            match outcome? {
                RefreshOutcome::Loaded => {
                    if let Some(me) = portal.identity() {
                        println!("signed in as {}", me.username);
                    }
                }
                RefreshOutcome::SessionEnded => println!("stored session was rejected and cleared"),
                _ => println!("not logged in"),
            }
        }
        Commands::LoginUrl => println!("{}", portal.login_url()),
        Commands::Callback(args) => {
            let params = match args.url {
                Some(url) => CallbackParams::from_url(&url)?,
                None => CallbackParams {
                    code: args.code,
                    token: args.token,
                },
            };
            portal.boot().await?;
            match portal.handle_callback(params).await? {
                CallbackOutcome::Authenticated => match portal.identity() {
                    Some(me) => println!("signed in as {}", me.username),
                    None => println!("signed in"),
                },
                CallbackOutcome::LoginRequired => {
                    bail!("login failed; start again at {}", portal.login_url())
                }
            }
        }
        Commands::Me => {
            signed_in(&portal).await?;
            if let Some(me) = portal.identity() {
                let current = portal.current_tribe();
                print!(
                    "{}",
                    render::identity(&me, current.as_ref(), |a| portal.explorer_link(a, ExplorerKind::Address))
                );
            }
        }
        Commands::Tribe { action } => match action {
            TribeAction::Show => match portal.current_tribe() {
                Some(tribe) => println!("{tribe}"),
                None => println!("no tribe selected"),
            },
            TribeAction::Set { name } => {
                let tribe = TribeName::parse(&name)?;
                portal.set_current_tribe(Some(tribe));
                signed_in(&portal).await?;
                match portal.current_tribe() {
                    Some(tribe) => println!("current tribe: {tribe}"),
                    None => bail!("you are not a member of {name}"),
                }
            }
            TribeAction::Clear => portal.set_current_tribe(None),
        },
        Commands::Link { address, chain } => {
            signed_in(&portal).await?;
            let account = WalletAccount {
                address: address.as_str().into(),
                chains: chain.into_iter().collect(),
            };
            let wallet = ExternalSigner::stdio(account);
            portal.link_wallet(&wallet).await?;
            println!("wallet {address} linked");
        }
        Commands::Unlink { id } => {
            signed_in(&portal).await?;
            portal.unlink_wallet(&WalletId::new(&id)).await?;
            println!("wallet {id} unlinked");
        }
        Commands::Voice { action } => {
            signed_in(&portal).await?;
            let server = &portal.config().mumble_server_url;
            match action {
                VoiceAction::Status => print!("{}", render::voice_status(&portal.voice_status().await?, server)),
                VoiceAction::Create => {
                    print!("{}", render::voice_credentials(&portal.create_voice_account().await?, server));
                }
            }
        }
        Commands::Roster(args) => {
            signed_in(&portal).await?;
            let members = portal.roster(args.into_query()?).await?;
            print!("{}", render::roster(&members));
        }
        Commands::Member(args) => {
            signed_in(&portal).await?;
            let member = portal.roster_member(&args.discord_id, args.query()?).await?;
            let notes = if args.notes {
                portal.member_notes(&args.discord_id).await?
            } else {
                Vec::new()
            };
            print!("{}", render::member(&member, &notes));
        }
        Commands::Logout => {
            portal.logout();
            println!("logged out");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    run(Cli::parse()).await
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn link_parses_chain() {
        let cli = Cli::try_parse_from(["eid", "link", "--address", "0xabc", "--chain", "sui:testnet"]).unwrap();
        match cli.command {
            Commands::Link { address, chain } => {
                assert_eq!(address, "0xabc");
                assert_eq!(chain, Some(ChainId::new("sui", "testnet")));
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert!(Cli::try_parse_from(["eid", "link", "--address", "0xabc", "--chain", "testnet"]).is_err());
    }

    #[test]
    fn callback_needs_something_to_work_with() {
        assert!(Cli::try_parse_from(["eid", "callback"]).is_err());
        assert!(Cli::try_parse_from(["eid", "callback", "--url", "http://x/cb?code=1", "--code", "2"]).is_err());
        assert!(Cli::try_parse_from(["eid", "callback", "--code", "1"]).is_ok());
    }

    #[test]
    fn roster_arguments_become_a_query() {
        let cli = Cli::try_parse_from([
            "eid", "roster", "--tribe", " Fire ", "--search", "", "--sort", "last_login", "--order", "desc",
        ])
        .unwrap();
        let Commands::Roster(args) = cli.command else {
            panic!("expected roster");
        };
        let query = args.into_query().unwrap();
        assert_eq!(query.tribe, Some(TribeName::new("Fire")));
        assert_eq!(query.search, None);
        assert_eq!(query.sort, RosterSort::LastLogin);
        assert_eq!(query.order, SortOrder::Desc);

        assert!(Cli::try_parse_from(["eid", "roster", "--sort", "age"]).is_err());
    }

    #[test]
    fn member_arguments_become_a_query() {
        let cli = Cli::try_parse_from(["eid", "member", "42", "--tribe", "Fire", "--page", "2", "--notes"]).unwrap();
        let Commands::Member(args) = cli.command else {
            panic!("expected member");
        };
        assert!(args.notes);
        let query = args.query().unwrap();
        assert_eq!(query.tribe, Some(TribeName::new("Fire")));
        assert_eq!((query.audit_page, query.audit_per_page), (2, 10));

        assert!(Cli::try_parse_from(["eid", "member", "42", "--page", "0"]).is_err());
    }

    #[test]
    fn api_url_flag_overrides_environment() {
        let cli = Cli::try_parse_from(["eid", "--api-url", "http://api.test/", "--network", "devnet", "logout"]).unwrap();
        let config = config(&cli);
        assert_eq!(config.api_url, "http://api.test");
        assert_eq!(config.sui_network, SuiNetwork::Devnet);
    }
}
