use anyhow::Result;
use clap::{Arg, ArgAction, Command};
use jade_leaderboard::{
    models::Leaderboard,
    services::{chain::StalenessCheck, RpcEndpoint, VotingEndpoint},
    utils::{config::ChainConfig, init_logging_with, token_conversion::format_token_amount},
    constants::{TOKEN_DECIMALS, TOTAL_DISPLAY_PLACES},
};
use std::env;
use std::time::Duration;
use tokio::time;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging_with("endpoint_checker=info,jade_leaderboard=warn");

    let matches = Command::new("endpoint-checker")
        .about("Report liveness, round and project data for each RPC endpoint")
        .arg(
            Arg::new("rpc-url")
                .long("rpc-url")
                .short('r')
                .help("Endpoint to check; repeat for several. Defaults to RPC_URLS")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("contract")
                .long("contract")
                .short('c')
                .help("Voting contract address. Defaults to CONTRACT_ADDRESS"),
        )
        .arg(
            Arg::new("watch")
                .long("watch")
                .short('w')
                .help("Repeat the check every N seconds")
                .value_parser(clap::value_parser!(u64)),
        )
        .get_matches();

    let cli_urls: Vec<String> = matches
        .get_many::<String>("rpc-url")
        .map(|urls| urls.cloned().collect())
        .unwrap_or_default();
    let cli_contract = matches.get_one::<String>("contract").cloned();

    dotenvy::dotenv().ok();
    let config = ChainConfig::from_lookup(&|key: &str| match key {
        "RPC_URLS" if !cli_urls.is_empty() => Some(cli_urls.join(",")),
        "CONTRACT_ADDRESS" if cli_contract.is_some() => cli_contract.clone(),
        _ => env::var(key).ok(),
    })?;

    info!("🔗 Checking {} endpoints for contract {}", config.rpc_urls.len(), config.contract_address);

    let Some(secs) = matches.get_one::<u64>("watch").copied() else {
        check_all(&config).await;
        return Ok(());
    };

    let mut interval = time::interval(Duration::from_secs(secs.max(1)));
    let mut iter_count: usize = 0;
    loop {
        interval.tick().await;
        iter_count += 1;
        info!("🔍 Endpoint check iteration {}", iter_count);
        check_all(&config).await;
    }
}

async fn check_all(config: &ChainConfig) {
    let staleness = config
        .stale_leader
        .as_ref()
        .map(|(name, min_votes)| StalenessCheck::leader_below(name, *min_votes));

    let mut healthy = 0;
    for (idx, url) in config.rpc_urls.iter().enumerate() {
        let endpoint = match RpcEndpoint::new(url, config.contract_address) {
            Ok(endpoint) => endpoint,
            Err(e) => {
                error!("❌ [{}] {}", idx + 1, e);
                continue;
            }
        };
        if check_endpoint(idx + 1, &endpoint, staleness.as_ref()).await {
            healthy += 1;
        }
    }

    info!("✅ {}/{} endpoints healthy", healthy, config.rpc_urls.len());
}

/// Logs one endpoint's report. Returns true when it is live and its data
/// passes the staleness check.
async fn check_endpoint(position: usize, endpoint: &RpcEndpoint, staleness: Option<&StalenessCheck>) -> bool {
    let url = endpoint.url();

    let block = match endpoint.block_number().await {
        Ok(block) => block,
        Err(e) => {
            error!("❌ [{}] {} is down: {}", position, url, e);
            return false;
        }
    };

    let round = match endpoint.current_round().await {
        Ok(round) => round.to_string(),
        Err(e) => {
            warn!("[{}] {} could not read currentRound: {}", position, url, e);
            "?".to_string()
        }
    };

    let projects = match endpoint.get_projects().await {
        Ok(projects) => projects,
        Err(e) => {
            error!("❌ [{}] {} could not read getProjects: {}", position, url, e);
            return false;
        }
    };

    let board = Leaderboard::from_projects(&projects);
    let stale = staleness.is_some_and(|check| check.is_stale(&projects));
    info!(
        "[{}] {} block {} round {} | {} active projects, {} total votes{}",
        position,
        url,
        block,
        round,
        board.entries.len(),
        format_token_amount(board.total_raw, TOKEN_DECIMALS, TOTAL_DISPLAY_PLACES),
        if stale { " | STALE" } else { "" }
    );
    if let Some(leader) = board.entries.first() {
        info!("    leader: {} ({}) with {}", leader.name, leader.symbol, leader.display_votes());
    }

    !stale
}
