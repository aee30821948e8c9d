use mixer_resilience::core::{ConnectionStatus, OnlineFlag};
use mixer_resilience::{AppConfig, ErrorCode, NetworkId, ResilientRunner};
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// RPC node double: each URL replays its scripted failures, then succeeds
#[derive(Default)]
struct FlakyNode {
    script: Mutex<HashMap<String, VecDeque<io::Error>>>,
    calls: Mutex<Vec<String>>,
}

impl FlakyNode {
    fn failing(self, url: &str, kind: io::ErrorKind, message: &str, times: usize) -> Self {
        {
            let mut script = self.script.lock().unwrap();
            let queue = script.entry(url.to_string()).or_default();
            for _ in 0..times {
                queue.push_back(io::Error::new(kind, message.to_string()));
            }
        }
        self
    }

    fn get_balance(&self, url: &str) -> impl Future<Output = Result<u64, io::Error>> {
        self.calls.lock().unwrap().push(url.to_string());
        let next = self
            .script
            .lock()
            .unwrap()
            .get_mut(url)
            .and_then(VecDeque::pop_front);
        async move {
            match next {
                Some(err) => Err(err),
                None => Ok(42_000),
            }
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

fn config(vars: &[(&str, &str)]) -> AppConfig {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    AppConfig::from_lookup(|key| vars.get(key).cloned()).unwrap()
}

fn runner_for(config: &AppConfig, connectivity: Arc<OnlineFlag>) -> ResilientRunner {
    config.runner(config.classifier(connectivity)).unwrap()
}

fn online() -> Arc<OnlineFlag> {
    Arc::new(OnlineFlag::new(true))
}

const DEVNET_NODES: &[(&str, &str)] = &[
    ("MIXER_RPC_DEVNET", "https://a.example, https://b.example"),
    ("MIXER_MAX_RETRIES", "2"),
    ("MIXER_INITIAL_DELAY_MS", "100"),
    ("MIXER_MAX_DELAY_MS", "1000"),
    ("MIXER_RETRY_JITTER", "false"),
];

#[tokio::test(start_paused = true)]
async fn refused_primary_falls_back_to_secondary() {
    let config = config(DEVNET_NODES);
    let runner = runner_for(&config, online());
    let tracker = runner.tracker();
    let node = FlakyNode::default().failing(
        "https://a.example",
        io::ErrorKind::ConnectionRefused,
        "connect ECONNREFUSED 10.0.0.1:8899",
        10,
    );

    let started = Instant::now();
    let balance = runner
        .run(NetworkId::Devnet, &tracker, |ep| node.get_balance(&ep.url))
        .await
        .unwrap();

    assert_eq!(balance, 42_000);
    assert_eq!(
        node.calls(),
        vec![
            "https://a.example",
            "https://a.example",
            "https://a.example",
            "https://b.example",
        ]
    );
    // 100ms + 200ms of backoff on the primary, nothing on the secondary
    assert_eq!(started.elapsed(), Duration::from_millis(300));

    let state = tracker.current();
    assert_eq!(state.status(), ConnectionStatus::Connected);
    assert_eq!(state.current_endpoint().unwrap().id, "devnet-1");
}

#[tokio::test(start_paused = true)]
async fn wallet_rejection_is_not_retried_or_rerouted() {
    let config = config(DEVNET_NODES);
    let runner = runner_for(&config, online());
    let tracker = runner.tracker();
    let node = FlakyNode::default().failing(
        "https://a.example",
        io::ErrorKind::Other,
        "User rejected the request.",
        1,
    );

    let started = Instant::now();
    let err = runner
        .run(NetworkId::Devnet, &tracker, |ep| node.get_balance(&ep.url))
        .await
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::UserRejected);
    assert_eq!(err.message(), ErrorCode::UserRejected.info().message);
    assert_eq!(node.calls(), vec!["https://a.example"]);
    assert_eq!(started.elapsed(), Duration::ZERO);

    let state = tracker.current();
    assert_eq!(state.status(), ConnectionStatus::Error);
    assert_eq!(state.last_error().unwrap().code(), ErrorCode::UserRejected);
}

#[tokio::test(start_paused = true)]
async fn every_endpoint_down_surfaces_last_error() {
    let config = config(DEVNET_NODES);
    let runner = runner_for(&config, online());
    let tracker = runner.tracker();
    let node = FlakyNode::default()
        .failing("https://a.example", io::ErrorKind::Other, "503 Service Unavailable", 10)
        .failing("https://b.example", io::ErrorKind::TimedOut, "request timed out", 10);

    let err = runner
        .run(NetworkId::Devnet, &tracker, |ep| node.get_balance(&ep.url))
        .await
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::Timeout);
    assert_eq!(node.calls().len(), 6);

    let state = tracker.current();
    assert_eq!(state.status(), ConnectionStatus::Error);
    assert_eq!(state.current_endpoint().unwrap().id, "devnet-1");
}

#[tokio::test(start_paused = true)]
async fn fallback_disabled_stays_on_primary() {
    let mut vars = DEVNET_NODES.to_vec();
    vars.push(("MIXER_ENABLE_FALLBACK", "false"));
    let config = config(&vars);
    let runner = runner_for(&config, online());
    let tracker = runner.tracker();
    let node = FlakyNode::default().failing(
        "https://a.example",
        io::ErrorKind::Other,
        "429 Too Many Requests",
        10,
    );

    let err = runner
        .run(NetworkId::Devnet, &tracker, |ep| node.get_balance(&ep.url))
        .await
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::RateLimited);
    assert!(node.calls().iter().all(|url| url == "https://a.example"));
    assert_eq!(node.calls().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn offline_host_classifies_every_failure_as_offline() {
    let config = config(DEVNET_NODES);
    let flag = Arc::new(OnlineFlag::new(false));
    let runner = runner_for(&config, flag.clone());
    let tracker = runner.tracker();
    let node = FlakyNode::default().failing(
        "https://a.example",
        io::ErrorKind::TimedOut,
        "request timed out",
        1,
    );

    let err = runner
        .run(NetworkId::Devnet, &tracker, |ep| node.get_balance(&ep.url))
        .await
        .unwrap_err();

    // OFFLINE is not in the default retry set
    assert_eq!(err.code(), ErrorCode::Offline);
    assert_eq!(node.calls().len(), 1);

    flag.set_online(true);
    let balance = runner
        .run(NetworkId::Devnet, &tracker, |ep| node.get_balance(&ep.url))
        .await
        .unwrap();
    assert_eq!(balance, 42_000);
    assert_eq!(tracker.current().status(), ConnectionStatus::Connected);
}

#[tokio::test]
async fn network_without_endpoints_fails_fast() {
    let mut config = config(&[]);
    config
        .endpoints
        .retain(|ep| ep.network != NetworkId::Localnet);
    let runner = runner_for(&config, online());
    let tracker = runner.tracker();
    let node = FlakyNode::default();

    let err = runner
        .run(NetworkId::Localnet, &tracker, |ep| node.get_balance(&ep.url))
        .await
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::RpcUnavailable);
    assert!(!err.retryable());
    assert!(node.calls().is_empty());
    assert_eq!(tracker.current().status(), ConnectionStatus::Error);
}

#[tokio::test(start_paused = true)]
async fn hung_node_times_out_instead_of_stalling() {
    // Later entries override the shared defaults
    let mut vars = DEVNET_NODES.to_vec();
    vars.push(("MIXER_MAX_RETRIES", "0"));
    vars.push(("MIXER_CONNECT_TIMEOUT_MS", "500"));
    let config = config(&vars);
    let runner = runner_for(&config, online());
    let tracker = runner.tracker();

    let started = Instant::now();
    let err = runner
        .run(NetworkId::Devnet, &tracker, |_| {
            std::future::pending::<Result<u64, io::Error>>()
        })
        .await
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::Timeout);
    // One attempt per endpoint, each abandoned at the deadline
    assert_eq!(started.elapsed(), Duration::from_millis(1_000));

    let state = tracker.current();
    assert_eq!(state.status(), ConnectionStatus::Error);
    assert!(!state.status().is_in_flight());
    assert_eq!(state.last_error().unwrap().code(), ErrorCode::Timeout);
}

#[tokio::test(start_paused = true)]
async fn assume_online_ignores_offline_flag() {
    let mut vars = DEVNET_NODES.to_vec();
    vars.push(("MIXER_ASSUME_ONLINE", "true"));
    let config = config(&vars);
    let runner = runner_for(&config, Arc::new(OnlineFlag::new(false)));
    let tracker = runner.tracker();
    let node = FlakyNode::default().failing(
        "https://a.example",
        io::ErrorKind::TimedOut,
        "request timed out",
        1,
    );

    let balance = runner
        .run(NetworkId::Devnet, &tracker, |ep| node.get_balance(&ep.url))
        .await
        .unwrap();

    // Classified as TIMEOUT and retried, not reported OFFLINE
    assert_eq!(balance, 42_000);
    assert_eq!(node.calls().len(), 2);
}
