// =============================================================================
// duskgreet — Session Manager Client
//
// Thin greetd client: creates a session for the configured user, answers the
// secret prompt with the submitted password, and starts the configured
// session command on success. The composition core only sees the terminal
// outcome, which it paints into the feedback label.
// =============================================================================

use std::env;
use std::os::unix::net::UnixStream;

use greetd_ipc::codec::SyncCodec;
use greetd_ipc::{AuthMessageType, Request, Response};

use tracing::{error, info};

/// Terminal result of one authentication attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// Credentials accepted and the session start was acknowledged; the
    /// greeter should exit and hand the seat over.
    Success,
    /// Anything else, with a message for the feedback label.
    Failure(String),
}

pub struct SessionClient {
    login_user: String,
    session_command: Vec<String>,
}

impl SessionClient {
    pub fn new(login_user: &str, session_command: &str) -> Self {
        // A command that shlex cannot split is passed through whole.
        let command = shlex::split(session_command)
            .unwrap_or_else(|| vec![session_command.to_string()]);
        Self {
            login_user: login_user.to_string(),
            session_command: command,
        }
    }

    /// Run the full create/answer/start ladder for one submitted secret.
    pub fn authenticate(&self, secret: &str) -> AuthOutcome {
        let socket_path = match env::var("GREETD_SOCK") {
            Ok(path) => path,
            Err(_) => {
                error!("GREETD_SOCK not set; is the session manager running?");
                return AuthOutcome::Failure("Login service unavailable".to_string());
            }
        };

        let mut stream = match UnixStream::connect(&socket_path) {
            Ok(stream) => stream,
            Err(e) => {
                error!("Failed to connect to session manager: {e}");
                return AuthOutcome::Failure("Login service unavailable".to_string());
            }
        };

        info!("Authenticating {}", self.login_user);
        let request = Request::CreateSession {
            username: self.login_user.clone(),
        };
        if let Err(e) = request.write_to(&mut stream) {
            return ipc_failure(&e);
        }

        match Response::read_from(&mut stream) {
            Ok(Response::AuthMessage {
                auth_message_type, ..
            }) if matches!(
                auth_message_type,
                AuthMessageType::Visible | AuthMessageType::Secret
            ) =>
            {
                self.answer_and_start(&mut stream, secret)
            }
            Ok(Response::Success) => self.start_session(&mut stream),
            Ok(Response::AuthMessage { .. }) => {
                self.cancel(&mut stream);
                AuthOutcome::Failure("Unsupported login prompt".to_string())
            }
            Ok(Response::Error { description, .. }) => AuthOutcome::Failure(description),
            Err(e) => ipc_failure(&e),
        }
    }

    fn answer_and_start(&self, stream: &mut UnixStream, secret: &str) -> AuthOutcome {
        let request = Request::PostAuthMessageResponse {
            response: Some(secret.to_string()),
        };
        if let Err(e) = request.write_to(stream) {
            return ipc_failure(&e);
        }

        match Response::read_from(stream) {
            Ok(Response::Success) => self.start_session(stream),
            Ok(Response::Error { description, .. }) => {
                info!("Authentication rejected: {description}");
                self.cancel(stream);
                AuthOutcome::Failure(description)
            }
            Ok(_) => {
                self.cancel(stream);
                AuthOutcome::Failure("Unexpected login response".to_string())
            }
            Err(e) => ipc_failure(&e),
        }
    }

    fn start_session(&self, stream: &mut UnixStream) -> AuthOutcome {
        info!("Starting session: {:?}", self.session_command);
        let request = Request::StartSession {
            cmd: self.session_command.clone(),
            env: vec![],
        };
        if let Err(e) = request.write_to(stream) {
            return ipc_failure(&e);
        }

        match Response::read_from(stream) {
            Ok(Response::Success) => AuthOutcome::Success,
            Ok(Response::Error { description, .. }) => AuthOutcome::Failure(description),
            Ok(_) => AuthOutcome::Failure("Unexpected session response".to_string()),
            Err(e) => ipc_failure(&e),
        }
    }

    /// Best-effort session cancel so a rejected attempt leaves no half-open
    /// session behind.
    fn cancel(&self, stream: &mut UnixStream) {
        let _ = Request::CancelSession.write_to(stream);
        let _ = Response::read_from(stream);
    }
}

fn ipc_failure(e: &dyn std::fmt::Display) -> AuthOutcome {
    error!("Session manager IPC failed: {e}");
    AuthOutcome::Failure("Login service error".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_command_is_shell_split() {
        let client = SessionClient::new("kiosk", "sway --unsupported-gpu");
        assert_eq!(
            client.session_command,
            vec!["sway".to_string(), "--unsupported-gpu".to_string()]
        );
    }

    #[test]
    fn unsplittable_command_passes_through() {
        let client = SessionClient::new("kiosk", "sway \"broken");
        assert_eq!(client.session_command, vec!["sway \"broken".to_string()]);
    }
}
