use alloy::{
    primitives::{Address, U256},
    providers::{DynProvider, Provider, ProviderBuilder},
};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::models::{projects_from_slots, Project};
use crate::utils::config::ChainConfig;
use crate::utils::retry::{retry_fixed, RetryPolicy};

// Read-only surface of the voting contract
alloy::sol! {
    #[sol(rpc)]
    contract JadeVoting {
        function getProjects() external view returns (
            string[20] memory names,
            string[20] memory symbols,
            address[20] memory addrs,
            uint256[20] memory votes
        );
        function currentRound() external view returns (uint256);
    }
}

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("invalid rpc url '{0}'")]
    InvalidUrl(String),

    #[error("no rpc endpoint available ({tried} tried)")]
    NoEndpointAvailable { tried: usize },

    #[error("{call} failed on {endpoint} after {attempts} attempts: {reason}")]
    ReadFailed {
        call: &'static str,
        endpoint: String,
        attempts: u32,
        reason: String,
    },

    #[error("every remaining endpoint returned stale project data ({check})")]
    StaleData { check: String },
}

/// One JSON-RPC endpoint able to serve the voting contract.
#[async_trait]
pub trait VotingEndpoint: Send + Sync {
    fn url(&self) -> &str;

    /// Liveness probe
    async fn block_number(&self) -> anyhow::Result<u64>;

    async fn get_projects(&self) -> anyhow::Result<Vec<Project>>;

    async fn current_round(&self) -> anyhow::Result<u64>;
}

/// Where the bot gets its project table and round label from.
#[async_trait]
pub trait ProjectSource: Send + Sync {
    async fn fetch_projects(&self) -> Result<Vec<Project>, ChainError>;

    /// Never fails; falls back to the last known or configured round.
    async fn fetch_round(&self) -> u64;
}

pub struct RpcEndpoint {
    url: String,
    provider: DynProvider,
    contract: JadeVoting::JadeVotingInstance<DynProvider>,
}

impl RpcEndpoint {
    pub fn new(url: &str, contract_address: Address) -> Result<Self, ChainError> {
        let provider = ProviderBuilder::new()
            .connect_http(url.parse().map_err(|_| ChainError::InvalidUrl(url.to_string()))?)
            .erased();
        let contract = JadeVoting::new(contract_address, provider.clone());

        Ok(Self {
            url: url.to_string(),
            provider,
            contract,
        })
    }
}

#[async_trait]
impl VotingEndpoint for RpcEndpoint {
    fn url(&self) -> &str {
        &self.url
    }

    async fn block_number(&self) -> anyhow::Result<u64> {
        let block = self.provider.get_block_number().await?;
        Ok(block)
    }

    async fn get_projects(&self) -> anyhow::Result<Vec<Project>> {
        let slots = self.contract.getProjects().call().await?;
        Ok(projects_from_slots(
            &slots.names,
            &slots.symbols,
            &slots.addrs,
            &slots.votes,
        ))
    }

    async fn current_round(&self) -> anyhow::Result<u64> {
        let round = self.contract.currentRound().call().await?;
        u64::try_from(round)
            .map_err(|_| anyhow::anyhow!("round counter {} does not fit in u64", round))
    }
}

/// Decides whether an endpoint's project table is lagging behind.
#[derive(Clone)]
pub struct StalenessCheck {
    label: String,
    check: Arc<dyn Fn(&[Project]) -> bool + Send + Sync>,
}

impl StalenessCheck {
    pub fn new(
        label: impl Into<String>,
        check: impl Fn(&[Project]) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            label: label.into(),
            check: Arc::new(check),
        }
    }

    /// Stale when the named project is listed but has fewer than `min_votes`.
    /// A missing project is not evidence either way.
    pub fn leader_below(name: &str, min_votes: U256) -> Self {
        let wanted = name.trim().to_lowercase();
        Self::new(
            format!("{} below {} raw votes", name.trim(), min_votes),
            move |projects| {
                projects
                    .iter()
                    .find(|p| p.is_active() && p.name.trim().to_lowercase() == wanted)
                    .is_some_and(|p| p.raw_votes < min_votes)
            },
        )
    }

    pub fn is_stale(&self, projects: &[Project]) -> bool {
        (self.check)(projects)
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl fmt::Debug for StalenessCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StalenessCheck")
            .field("label", &self.label)
            .finish()
    }
}

/// Reads the voting contract through a prioritised list of endpoints.
///
/// The reader stays bound to the first endpoint that passed a liveness check
/// until a read against it is exhausted, at which point it unbinds and the
/// next call walks the list again from the top.
pub struct ChainReader<E = RpcEndpoint> {
    endpoints: Vec<E>,
    active: RwLock<Option<usize>>,
    retry: RetryPolicy,
    staleness: Option<StalenessCheck>,
    default_round: u64,
    last_round: Mutex<Option<u64>>,
}

impl ChainReader<RpcEndpoint> {
    pub fn from_config(config: &ChainConfig) -> Result<Self, ChainError> {
        let endpoints = config
            .rpc_urls
            .iter()
            .map(|url| RpcEndpoint::new(url, config.contract_address))
            .collect::<Result<Vec<_>, _>>()?;

        let mut reader = Self::new(endpoints, config.retry, config.default_round);
        if let Some((name, min_votes)) = &config.stale_leader {
            reader = reader.with_staleness_check(StalenessCheck::leader_below(name, *min_votes));
        }
        Ok(reader)
    }
}

impl<E: VotingEndpoint> ChainReader<E> {
    pub fn new(endpoints: Vec<E>, retry: RetryPolicy, default_round: u64) -> Self {
        Self {
            endpoints,
            active: RwLock::new(None),
            retry,
            staleness: None,
            default_round,
            last_round: Mutex::new(None),
        }
    }

    pub fn with_staleness_check(mut self, check: StalenessCheck) -> Self {
        self.staleness = Some(check);
        self
    }

    pub fn endpoint_count(&self) -> usize {
        self.endpoints.len()
    }

    pub async fn active_endpoint(&self) -> Option<String> {
        let current = *self.active.read().await;
        current.map(|idx| self.endpoints[idx].url().to_string())
    }

    /// Binds to the first endpoint, in priority order, that answers a block
    /// number request.
    pub async fn connect(&self) -> Result<usize, ChainError> {
        let total = self.endpoints.len();
        for (idx, endpoint) in self.endpoints.iter().enumerate() {
            match endpoint.block_number().await {
                Ok(block) => {
                    info!("🔌 Connected to {} at block {}", endpoint.url(), block);
                    *self.active.write().await = Some(idx);
                    return Ok(idx);
                }
                Err(e) => {
                    warn!(
                        "Endpoint {} failed liveness check ({}/{}): {}",
                        endpoint.url(),
                        idx + 1,
                        total,
                        e
                    );
                }
            }
        }

        self.unbind().await;
        error!("❌ No RPC endpoint available ({} tried)", total);
        Err(ChainError::NoEndpointAvailable { tried: total })
    }

    pub async fn fetch_projects(&self) -> Result<Vec<Project>, ChainError> {
        let current = *self.active.read().await;
        let bound = match current {
            Some(idx) => idx,
            None => self.connect().await?,
        };

        let projects = match self.read_projects(&self.endpoints[bound]).await {
            Ok(projects) => projects,
            Err(e) => {
                self.unbind().await;
                return Err(e);
            }
        };

        let Some(check) = &self.staleness else {
            return Ok(projects);
        };
        if !check.is_stale(&projects) {
            return Ok(projects);
        }

        warn!(
            "Project data from {} looks stale ({}), trying the next endpoint",
            self.endpoints[bound].url(),
            check.label()
        );

        // every other endpoint, starting after the bound one and wrapping
        let total = self.endpoints.len();
        for idx in (1..total).map(|offset| (bound + offset) % total) {
            let candidate = &self.endpoints[idx];
            if let Err(e) = candidate.block_number().await {
                warn!("Endpoint {} failed liveness check: {}", candidate.url(), e);
                continue;
            }
            match self.read_projects(candidate).await {
                Ok(projects) if !check.is_stale(&projects) => {
                    info!("🔁 Switched to {} after stale data", candidate.url());
                    *self.active.write().await = Some(idx);
                    return Ok(projects);
                }
                Ok(_) => warn!("Project data from {} is stale as well", candidate.url()),
                Err(e) => warn!("{}", e),
            }
        }

        self.unbind().await;
        Err(ChainError::StaleData {
            check: check.label().to_string(),
        })
    }

    /// Reads the round counter once. Failures fall back to the last value
    /// seen, then to the configured default.
    pub async fn fetch_round(&self) -> u64 {
        let current = *self.active.read().await;
        if let Some(idx) = current {
            let endpoint = &self.endpoints[idx];
            match endpoint.current_round().await {
                Ok(round) => {
                    *self.last_round.lock().await = Some(round);
                    return round;
                }
                Err(e) => warn!("currentRound failed on {}: {}", endpoint.url(), e),
            }
        }

        let fallback = self.last_round.lock().await.unwrap_or(self.default_round);
        debug!("Using fallback round {}", fallback);
        fallback
    }

    async fn read_projects(&self, endpoint: &E) -> Result<Vec<Project>, ChainError> {
        retry_fixed("getProjects", self.retry, || endpoint.get_projects())
            .await
            .map_err(|e| ChainError::ReadFailed {
                call: "getProjects",
                endpoint: endpoint.url().to_string(),
                attempts: e.attempts,
                reason: e.last_error.to_string(),
            })
    }

    async fn unbind(&self) {
        *self.active.write().await = None;
    }
}

#[async_trait]
impl<E: VotingEndpoint + 'static> ProjectSource for ChainReader<E> {
    async fn fetch_projects(&self) -> Result<Vec<Project>, ChainError> {
        ChainReader::<E>::fetch_projects(self).await
    }

    async fn fetch_round(&self) -> u64 {
        ChainReader::<E>::fetch_round(self).await
    }
}
