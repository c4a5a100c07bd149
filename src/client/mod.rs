//! Client side of the plank timer: the stopwatch, the save flow and the HTTP API client.

/// HTTP client for the JSON API.
pub mod http;
pub mod manual;
pub mod session;
/// The stopwatch state machine.
pub mod timer;

use futures::future::BoxFuture;
use reqwest::StatusCode;
use thiserror::Error;

use crate::dto::attempt::{CreateAttemptRequest, CreateAttemptResponse, PERSONAL_BEST_MESSAGE};

/// Shown when the server gave no usable reason for a failed save.
pub const SAVE_FAILED_MESSAGE: &str = "Failed to save attempt";
/// Success line for a stored attempt that is not a new best.
pub const ATTEMPT_SAVED_MESSAGE: &str = "Attempt saved!";

/// Result alias for API client calls.
pub type ClientResult<T> = Result<T, ClientError>;

/// Failures talking to the plank service.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Building the HTTP client failed (invalid TLS setup, etc).
    #[error("failed to build HTTP client")]
    ClientBuilder {
        /// Underlying error.
        #[source]
        source: reqwest::Error,
    },
    /// The request never got a response.
    #[error("failed to send request to `{path}`")]
    RequestSend {
        /// Request path.
        path: String,
        /// Transport error.
        #[source]
        source: reqwest::Error,
    },
    /// The service answered with a non-success status.
    #[error("`{path}` answered {status}")]
    Rejected {
        /// Request path.
        path: String,
        /// Status the service answered with.
        status: StatusCode,
        /// `error` field of the response body, when there was one.
        message: Option<String>,
    },
    /// The response body was not the expected JSON.
    #[error("failed to decode response from `{path}`")]
    DecodeResponse {
        /// Request path.
        path: String,
        /// Decoding error.
        #[source]
        source: reqwest::Error,
    },
}

impl ClientError {
    /// Text to show the user: the server's reason when it sent one, `fallback` otherwise.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ClientError::Rejected {
                message: Some(message),
                ..
            } if !message.is_empty() => message.clone(),
            _ => fallback.to_owned(),
        }
    }
}

/// The one call the save flows need, so they can run against a fake in tests.
pub trait AttemptApi: Send + Sync {
    /// Submit one attempt.
    fn create_attempt(
        &self,
        request: CreateAttemptRequest,
    ) -> BoxFuture<'static, ClientResult<CreateAttemptResponse>>;
}

/// Feedback line shown under the timer or the manual entry form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusMessage {
    /// Shown in the success style.
    Success(String),
    /// Shown in the error style.
    Error(String),
}

impl StatusMessage {
    /// Line to display.
    pub fn text(&self) -> &str {
        match self {
            StatusMessage::Success(text) | StatusMessage::Error(text) => text,
        }
    }

    /// Whether the line reports a failure.
    pub fn is_error(&self) -> bool {
        matches!(self, StatusMessage::Error(_))
    }

    /// Success line for a stored attempt.
    pub fn saved(response: &CreateAttemptResponse) -> Self {
        let text = if response.is_personal_best {
            PERSONAL_BEST_MESSAGE
        } else {
            ATTEMPT_SAVED_MESSAGE
        };
        StatusMessage::Success(text.to_owned())
    }

    /// Error line for a failed save.
    pub fn failed(err: &ClientError) -> Self {
        StatusMessage::Error(err.user_message(SAVE_FAILED_MESSAGE))
    }
}

#[cfg(test)]
pub(crate) mod fake {
    //! In-process [`AttemptApi`] used by the client tests.

    use std::sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    use futures::future::BoxFuture;
    use reqwest::StatusCode;
    use uuid::Uuid;

    use super::{AttemptApi, ClientError, ClientResult};
    use crate::dto::attempt::{AttemptView, CreateAttemptRequest, CreateAttemptResponse};

    #[derive(Clone, Copy)]
    pub enum Reply {
        Accept { personal_best: bool },
        Reject(&'static str),
        RejectWithoutBody,
    }

    #[derive(Clone)]
    pub struct FakeApi {
        reply: Arc<Mutex<Reply>>,
        calls: Arc<AtomicUsize>,
        last: Arc<Mutex<Option<CreateAttemptRequest>>>,
    }

    impl FakeApi {
        pub fn new(reply: Reply) -> Self {
            Self {
                reply: Arc::new(Mutex::new(reply)),
                calls: Arc::new(AtomicUsize::new(0)),
                last: Arc::new(Mutex::new(None)),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn last_request(&self) -> Option<CreateAttemptRequest> {
            self.last.lock().unwrap().clone()
        }

        pub fn set_reply(&self, reply: Reply) {
            *self.reply.lock().unwrap() = reply;
        }
    }

    impl AttemptApi for FakeApi {
        fn create_attempt(
            &self,
            request: CreateAttemptRequest,
        ) -> BoxFuture<'static, ClientResult<CreateAttemptResponse>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last.lock().unwrap() = Some(request.clone());
            let reply = *self.reply.lock().unwrap();
            Box::pin(async move {
                let rejected = |message: Option<&str>| ClientError::Rejected {
                    path: "/api/attempts".into(),
                    status: StatusCode::BAD_REQUEST,
                    message: message.map(Into::into),
                };
                match reply {
                    Reply::Accept { personal_best } => {
                        let seconds = request.duration_seconds.unwrap_or_default() as u32;
                        Ok(CreateAttemptResponse {
                            attempt: AttemptView {
                                id: Uuid::new_v4(),
                                user_id: Uuid::new_v4(),
                                duration_seconds: seconds,
                                display: crate::duration::format(seconds.into()),
                                attempted_at: "2026-01-01T00:00:00Z".into(),
                                is_personal_best: personal_best,
                            },
                            is_personal_best: personal_best,
                            message: String::new(),
                        })
                    }
                    Reply::Reject(message) => Err(rejected(Some(message))),
                    Reply::RejectWithoutBody => Err(rejected(None)),
                }
            })
        }
    }
}
