//! Shared utilities for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

use scrapoxy_pipeline::pool::{
    ConnectorInfo, ConnectorView, PoolControl, PoolError, PoolResult, ProjectMode, ProjectStatus,
    ProjectView, ProxyRecord, ProxyStatus, ProxyToRemove,
};

/// A fleet call as seen by [`FakePool`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    GetProject,
    SetStatus(ProjectMode),
    Listing,
    Remove(Vec<ProxyToRemove>),
}

struct State {
    views: Vec<ConnectorView>,
    project_status: ProjectStatus,
    listing_delay: Option<Duration>,
    fail_listing: bool,
    fail_removal: bool,
    calls: Vec<Call>,
}

/// In-memory fleet with scriptable answers and a call log.
pub struct FakePool {
    state: Mutex<State>,
}

impl FakePool {
    pub fn new(views: Vec<ConnectorView>) -> Self {
        Self {
            state: Mutex::new(State {
                views,
                project_status: ProjectMode::Hot.into(),
                listing_delay: None,
                fail_listing: false,
                fail_removal: false,
                calls: Vec::new(),
            }),
        }
    }

    /// A fleet with one active connector and `n` usable proxies.
    pub fn healthy(n: usize) -> Self {
        let proxies = (0..n).map(|i| usable_proxy(&format!("proxy-{}", i))).collect();
        Self::new(vec![connector(true, proxies)])
    }

    pub fn with_project_status(self, status: impl Into<ProjectStatus>) -> Self {
        self.state.lock().unwrap().project_status = status.into();
        self
    }

    pub fn with_listing_delay(self, delay: Duration) -> Self {
        self.state.lock().unwrap().listing_delay = Some(delay);
        self
    }

    pub fn set_views(&self, views: Vec<ConnectorView>) {
        self.state.lock().unwrap().views = views;
    }

    pub fn set_fail_listing(&self, fail: bool) {
        self.state.lock().unwrap().fail_listing = fail;
    }

    pub fn set_fail_removal(&self, fail: bool) {
        self.state.lock().unwrap().fail_removal = fail;
    }

    /// Change the project mode behind the pipeline's back.
    pub fn reset_project_status(&self, status: impl Into<ProjectStatus>) {
        self.state.lock().unwrap().project_status = status.into();
    }

    pub fn project_status(&self) -> ProjectStatus {
        self.state.lock().unwrap().project_status.clone()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn listing_calls(&self) -> usize {
        self.count(|c| matches!(c, Call::Listing))
    }

    pub fn status_calls(&self) -> Vec<ProjectMode> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::SetStatus(mode) => Some(mode),
                _ => None,
            })
            .collect()
    }

    pub fn removals(&self) -> Vec<ProxyToRemove> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Remove(items) => Some(items),
                _ => None,
            })
            .flatten()
            .collect()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.state.lock().unwrap().calls.iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: Call) {
        self.state.lock().unwrap().calls.push(call);
    }
}

fn server_error() -> PoolError {
    PoolError::Status {
        status: 500,
        body: "internal error".into(),
    }
}

#[async_trait]
impl PoolControl for FakePool {
    async fn get_project(&self) -> PoolResult<ProjectView> {
        self.record(Call::GetProject);
        Ok(ProjectView {
            id: "project-1".into(),
            name: "test".into(),
            status: self.project_status(),
        })
    }

    async fn set_project_status(&self, status: ProjectMode) -> PoolResult<()> {
        self.record(Call::SetStatus(status));
        self.state.lock().unwrap().project_status = status.into();
        Ok(())
    }

    async fn get_all_connectors_and_proxies(&self) -> PoolResult<Vec<ConnectorView>> {
        self.record(Call::Listing);
        let delay = self.state.lock().unwrap().listing_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let state = self.state.lock().unwrap();
        if state.fail_listing {
            return Err(server_error());
        }
        Ok(state.views.clone())
    }

    async fn ask_proxies_to_remove(&self, items: &[ProxyToRemove]) -> PoolResult<()> {
        self.record(Call::Remove(items.to_vec()));
        if self.state.lock().unwrap().fail_removal {
            return Err(server_error());
        }
        Ok(())
    }
}

pub fn usable_proxy(id: &str) -> ProxyRecord {
    ProxyRecord {
        id: id.into(),
        status: ProxyStatus::Started,
        fingerprint: Some(serde_json::json!({"ip": "203.0.113.7"})),
        removing: false,
    }
}

pub fn starting_proxy(id: &str) -> ProxyRecord {
    ProxyRecord {
        id: id.into(),
        status: ProxyStatus::Starting,
        fingerprint: None,
        removing: false,
    }
}

pub fn connector(active: bool, proxies: Vec<ProxyRecord>) -> ConnectorView {
    ConnectorView {
        connector: ConnectorInfo {
            id: "conn-1".into(),
            name: "datacenter".into(),
            active,
        },
        proxies,
    }
}
