//! HTTP adapter for the remote sync endpoint.
//!
//! Wire format: `POST {base}/api/tasks` for upserts and
//! `DELETE {base}/api/tasks` for deletes, both carrying the full task as a
//! JSON body.

use crate::sync::connectivity::ReachabilitySignal;
use crate::sync::remote::{PushAck, PushMethod, PushRequest, RemoteEndpoint, SyncError};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use std::time::Duration;

const TASKS_PATH: &str = "/api/tasks";
const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Blocking HTTP client for the task service.
#[derive(Debug, Clone)]
pub struct HttpRemoteEndpoint {
    base_url: String,
    tasks_url: String,
    client: Client,
}

impl HttpRemoteEndpoint {
    /// Builds an endpoint rooted at `base_url` (for example
    /// `https://board.example.com`).
    pub fn new(base_url: &str) -> Result<Self, SyncError> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(SyncError::Transport("sync url cannot be empty".to_string()));
        }
        let client = Client::builder()
            .user_agent(concat!("flowboard/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| SyncError::Transport(err.to_string()))?;
        Ok(Self {
            tasks_url: format!("{base_url}{TASKS_PATH}"),
            base_url,
            client,
        })
    }

    pub fn tasks_url(&self) -> &str {
        &self.tasks_url
    }
}

impl RemoteEndpoint for HttpRemoteEndpoint {
    fn endpoint_id(&self) -> &str {
        &self.base_url
    }

    fn push(&self, request: &PushRequest, timeout: Duration) -> Result<PushAck, SyncError> {
        let builder = match request.method {
            PushMethod::Upsert => self.client.post(&self.tasks_url),
            PushMethod::Delete => self.client.delete(&self.tasks_url),
        };
        let response = builder
            .json(&request.task)
            .timeout(timeout)
            .send()
            .map_err(|err| {
                if err.is_timeout() {
                    SyncError::Timeout(timeout)
                } else {
                    SyncError::Transport(err.to_string())
                }
            })?;

        classify_status(request.method, response.status())
    }
}

impl ReachabilitySignal for HttpRemoteEndpoint {
    /// Any HTTP response from the base URL counts as reachable.
    fn is_reachable(&self) -> bool {
        self.client
            .head(&self.base_url)
            .timeout(PROBE_TIMEOUT)
            .send()
            .is_ok()
    }
}

fn classify_status(method: PushMethod, status: StatusCode) -> Result<PushAck, SyncError> {
    let acknowledged = status.is_success()
        || (method == PushMethod::Delete && status == StatusCode::NOT_FOUND);
    if acknowledged {
        Ok(PushAck {
            status: status.as_u16(),
        })
    } else {
        Err(SyncError::Rejected {
            status: status.as_u16(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{classify_status, HttpRemoteEndpoint};
    use crate::model::task::{Priority, Task, TaskContent, TaskStatus};
    use crate::sync::remote::{PushMethod, PushRequest, RemoteEndpoint, SyncError};
    use reqwest::StatusCode;
    use std::time::Duration;

    #[test]
    fn tasks_url_is_joined_without_double_slash() {
        let endpoint = HttpRemoteEndpoint::new(" http://localhost:8080/ ").unwrap();
        assert_eq!(endpoint.tasks_url(), "http://localhost:8080/api/tasks");
        assert_eq!(endpoint.endpoint_id(), "http://localhost:8080");
    }

    #[test]
    fn blank_url_is_rejected() {
        assert!(matches!(
            HttpRemoteEndpoint::new("   "),
            Err(SyncError::Transport(_))
        ));
    }

    #[test]
    fn delete_not_found_counts_as_acknowledged() {
        assert!(classify_status(PushMethod::Delete, StatusCode::NOT_FOUND).is_ok());
        assert!(classify_status(PushMethod::Upsert, StatusCode::CREATED).is_ok());
        assert!(matches!(
            classify_status(PushMethod::Upsert, StatusCode::NOT_FOUND),
            Err(SyncError::Rejected { status: 404 })
        ));
        assert!(matches!(
            classify_status(PushMethod::Delete, StatusCode::INTERNAL_SERVER_ERROR),
            Err(SyncError::Rejected { status: 500 })
        ));
    }

    #[test]
    fn unreachable_endpoint_fails_without_panicking() {
        let endpoint = HttpRemoteEndpoint::new("http://127.0.0.1:1").unwrap();
        let task = Task::new(
            TaskStatus::Todo,
            TaskContent::new("t", "d", Priority::Low).unwrap(),
        );
        let err = endpoint
            .push(&PushRequest::for_task(task), Duration::from_millis(500))
            .unwrap_err();
        assert!(matches!(
            err,
            SyncError::Transport(_) | SyncError::Timeout(_)
        ));
    }
}
