use crate::domain::{CommandRecord, ContextKey, Destination, NavigationData, ResultRecord};
use crate::infra::{CommandTransport, ExecuteRequest, ExecuteResponse, TransportError};

pub const HELP_TEXT: &str = "\
+--------------------------------------------------------+
|               NEO-BBS COMMAND CENTER                   |
+--------------------------------------------------------+

AVAILABLE COMMANDS:

  /home              Return to home page
  /back              Navigate to previous screen
  /post              Create a new thread
  /read [thread_id]  Read a specific thread
  /news              View latest News Bot bulletin
  /who               List active users (and ghosts)
  /ascii             Upload image as ASCII art
  /help              Show this help message

----------------------------------------------------------

TIP: Use UP/DOWN arrows to navigate history
     Use TAB to autocomplete commands

Happy haunting!";

const NAVIGATION_UNAVAILABLE: &str = "Navigation not available";

/// Host-view hooks handed to the dispatcher. A missing hook turns into an error result.
#[derive(Default)]
pub struct HostCapabilities<'a> {
    pub navigate: Option<&'a mut dyn FnMut(Destination)>,
    pub go_back: Option<&'a mut dyn FnMut()>,
}

impl HostCapabilities<'_> {
    pub fn none() -> Self {
        Self::default()
    }

    fn navigate(&mut self, destination: Destination) -> bool {
        match self.navigate.as_deref_mut() {
            Some(navigate) => {
                tracing::debug!(destination = destination.label(), "navigating");
                navigate(destination);
                true
            }
            None => false,
        }
    }

    fn go_back(&mut self) -> bool {
        match self.go_back.as_deref_mut() {
            Some(go_back) => {
                go_back();
                true
            }
            None => false,
        }
    }
}

/// A command that has to go over the wire. `context` is where its result will land.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RemoteCommand {
    pub context: ContextKey,
    pub command: CommandRecord,
}

impl RemoteCommand {
    pub fn request(&self) -> ExecuteRequest {
        ExecuteRequest {
            command: self.command.name.clone(),
            args: self.command.args.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Dispatch {
    Resolved(ResultRecord),
    Remote(RemoteCommand),
}

/// Resolves local commands and rejects malformed input; everything else becomes a
/// [`RemoteCommand`] to be finished with [`complete`].
pub fn begin(
    command: CommandRecord,
    context: ContextKey,
    host: &mut HostCapabilities<'_>,
) -> Dispatch {
    let raw = command.raw.clone();
    tracing::debug!(command = %command.name, context = %context, "dispatching");

    match command.normalized_name().as_str() {
        "/help" => return Dispatch::Resolved(ResultRecord::info(raw, HELP_TEXT)),
        "/home" => {
            let record = if host.navigate(Destination::Home) {
                ResultRecord::success(raw, "Returning to home page...")
            } else {
                ResultRecord::error(raw, NAVIGATION_UNAVAILABLE)
            };
            return Dispatch::Resolved(record);
        }
        "/back" => {
            let record = if host.go_back() {
                ResultRecord::success(raw, "Navigating back...")
            } else {
                ResultRecord::error(raw, "No previous screen in history")
            };
            return Dispatch::Resolved(record);
        }
        "/read" if command.args.is_empty() => {
            return Dispatch::Resolved(ResultRecord::error(
                raw,
                "ERROR: /read requires a thread ID",
            ));
        }
        _ => {}
    }

    if !command.is_slash_command() {
        return Dispatch::Resolved(ResultRecord::error(
            raw,
            "INVALID COMMAND: Commands must start with /",
        ));
    }

    Dispatch::Remote(RemoteCommand { context, command })
}

/// Turns the remote outcome into exactly one result, invoking host navigation as needed.
pub fn complete(
    command: &CommandRecord,
    outcome: Result<ExecuteResponse, TransportError>,
    host: &mut HostCapabilities<'_>,
) -> ResultRecord {
    let raw = command.raw.clone();
    let response = match outcome {
        Ok(response) => response,
        Err(error) => {
            tracing::warn!(
                command = %command.name,
                %error,
                retryable = error.is_retryable(),
                "remote command failed"
            );
            return ResultRecord::error(raw, transport_error_message(&error));
        }
    };

    if !response.success {
        let message = response
            .message
            .unwrap_or_else(|| "Command failed".to_string());
        return ResultRecord::error(raw, message);
    }

    match command.normalized_name().as_str() {
        "/post" => {
            let data = navigation_data(&response);
            navigate_or_error(
                host,
                Destination::CreateThread(data),
                raw,
                "Opening thread creation interface...".to_string(),
            )
        }
        "/read" => match command.args.first() {
            Some(thread_id) => navigate_or_error(
                host,
                Destination::Thread {
                    id: thread_id.clone(),
                },
                raw,
                format!("Loading thread {thread_id}..."),
            ),
            None => ResultRecord::error(raw, "ERROR: /read requires a thread ID"),
        },
        "/news" => {
            let data = navigation_data(&response);
            navigate_or_error(
                host,
                Destination::News(data),
                raw,
                "Loading News Bot bulletin...".to_string(),
            )
        }
        "/who" => ResultRecord::info(raw, format_user_list(&response.usernames())),
        _ => {
            let message = response
                .message
                .filter(|message| !message.trim().is_empty())
                .unwrap_or_else(|| "Command executed successfully".to_string());
            ResultRecord::success(raw, message)
        }
    }
}

/// Runs both phases inline, blocking on the transport.
pub fn dispatch(
    command: CommandRecord,
    context: ContextKey,
    transport: &dyn CommandTransport,
    host: &mut HostCapabilities<'_>,
) -> ResultRecord {
    match begin(command, context, host) {
        Dispatch::Resolved(record) => record,
        Dispatch::Remote(remote) => {
            let outcome = transport.execute(&remote.request());
            complete(&remote.command, outcome, host)
        }
    }
}

pub fn transport_error_message(error: &TransportError) -> String {
    match error {
        TransportError::NotFound => {
            "UNKNOWN COMMAND: Type /help for available commands".to_string()
        }
        TransportError::Unauthorized => {
            "AUTHENTICATION REQUIRED: Please log in to use this command".to_string()
        }
        TransportError::RateLimited => {
            "SYSTEM OVERLOAD: Rate limit exceeded. Please wait before trying again.".to_string()
        }
        TransportError::Forbidden => {
            "ACCESS DENIED: You do not have permission to perform this action.".to_string()
        }
        TransportError::Api { message } => format!("ERROR: {message}"),
        TransportError::Server { .. } => {
            "SYSTEM ERROR: The server encountered an error. Please try again later.".to_string()
        }
        TransportError::Network(message) => format!("CONNECTION LOST: {message}"),
        TransportError::Unexpected(_) => "SYSTEM ERROR: An unexpected error occurred".to_string(),
    }
}

fn navigate_or_error(
    host: &mut HostCapabilities<'_>,
    destination: Destination,
    raw: String,
    success_message: String,
) -> ResultRecord {
    if host.navigate(destination) {
        ResultRecord::success(raw, success_message)
    } else {
        ResultRecord::error(raw, NAVIGATION_UNAVAILABLE)
    }
}

fn navigation_data(response: &ExecuteResponse) -> NavigationData {
    response
        .data
        .clone()
        .and_then(|data| serde_json::from_value::<NavigationData>(data).ok())
        .unwrap_or_default()
}

fn format_user_list(users: &[String]) -> String {
    if users.is_empty() {
        return "Active users:\n  No users currently active".to_string();
    }

    let lines = users
        .iter()
        .map(|user| format!("  - {user}"))
        .collect::<Vec<_>>()
        .join("\n");
    format!("Active users:\n{lines}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ResultKind, parse_command_line};
    use std::sync::Mutex;

    /// Replays a canned outcome and records every request it sees.
    struct FakeTransport {
        outcome: Result<ExecuteResponse, TransportError>,
        requests: Mutex<Vec<ExecuteRequest>>,
    }

    impl FakeTransport {
        fn replying(outcome: Result<ExecuteResponse, TransportError>) -> Self {
            Self {
                outcome,
                requests: Mutex::new(Vec::new()),
            }
        }

        fn ok(message: Option<&str>, data: Option<serde_json::Value>) -> Self {
            Self::replying(Ok(ExecuteResponse {
                success: true,
                message: message.map(str::to_string),
                data,
            }))
        }

        fn calls(&self) -> usize {
            self.requests.lock().expect("lock").len()
        }
    }

    impl CommandTransport for FakeTransport {
        fn execute(&self, request: &ExecuteRequest) -> Result<ExecuteResponse, TransportError> {
            self.requests.lock().expect("lock").push(request.clone());
            self.outcome.clone()
        }
    }

    fn command(line: &str) -> CommandRecord {
        parse_command_line(line).expect("command")
    }

    fn run(line: &str, transport: &FakeTransport, host: &mut HostCapabilities<'_>) -> ResultRecord {
        dispatch(command(line), ContextKey::home(), transport, host)
    }

    #[test]
    fn help_is_local_info() {
        let transport = FakeTransport::ok(None, None);
        let record = run("/HELP", &transport, &mut HostCapabilities::none());
        assert_eq!(record.kind, ResultKind::Info);
        assert!(record.output.contains("AVAILABLE COMMANDS"));
        assert_eq!(record.command, "/HELP");
        assert_eq!(transport.calls(), 0);
    }

    #[test]
    fn home_requires_navigate_capability() {
        let transport = FakeTransport::ok(None, None);
        let record = run("/home", &transport, &mut HostCapabilities::none());
        assert_eq!(record.kind, ResultKind::Error);

        let mut seen = Vec::new();
        let mut navigate = |destination: Destination| seen.push(destination);
        let mut host = HostCapabilities {
            navigate: Some(&mut navigate),
            go_back: None,
        };
        let record = run("/home", &transport, &mut host);
        assert_eq!(record.kind, ResultKind::Success);
        assert_eq!(seen, vec![Destination::Home]);
        assert_eq!(transport.calls(), 0);
    }

    #[test]
    fn back_without_previous_screen_is_an_error() {
        let transport = FakeTransport::ok(None, None);
        let record = run("/back", &transport, &mut HostCapabilities::none());
        assert_eq!(record.kind, ResultKind::Error);
        assert_eq!(record.output, "No previous screen in history");

        let mut went_back = 0;
        let mut go_back = || went_back += 1;
        let mut host = HostCapabilities {
            navigate: None,
            go_back: Some(&mut go_back),
        };
        let record = run("/back", &transport, &mut host);
        assert_eq!(record.kind, ResultKind::Success);
        drop(host);
        assert_eq!(went_back, 1);
    }

    #[test]
    fn commands_without_slash_never_hit_the_network() {
        let transport = FakeTransport::ok(None, None);
        let record = run("who", &transport, &mut HostCapabilities::none());
        assert_eq!(record.kind, ResultKind::Error);
        assert!(record.output.contains("must start with /"));
        assert_eq!(transport.calls(), 0);
    }

    #[test]
    fn read_without_id_is_rejected_locally() {
        let transport = FakeTransport::ok(None, None);
        let record = run("/read", &transport, &mut HostCapabilities::none());
        assert_eq!(record.kind, ResultKind::Error);
        assert_eq!(transport.calls(), 0);
    }

    #[test]
    fn read_with_id_navigates_to_thread() {
        let transport = FakeTransport::ok(None, None);
        let mut seen = Vec::new();
        let mut navigate = |destination: Destination| seen.push(destination);
        let mut host = HostCapabilities {
            navigate: Some(&mut navigate),
            go_back: None,
        };
        let record = run("/read 42", &transport, &mut host);
        assert_eq!(record.kind, ResultKind::Success);
        assert_eq!(record.output, "Loading thread 42...");
        drop(host);
        assert_eq!(
            seen,
            vec![Destination::Thread {
                id: "42".to_string()
            }]
        );
        let requests = transport.requests.lock().expect("lock");
        assert_eq!(requests[0].command, "/read");
        assert_eq!(requests[0].args, vec!["42".to_string()]);
    }

    #[test]
    fn post_passes_server_payload_through() {
        let transport = FakeTransport::ok(None, Some(serde_json::json!({"board_id": "crypt"})));
        let mut seen = Vec::new();
        let mut navigate = |destination: Destination| seen.push(destination);
        let mut host = HostCapabilities {
            navigate: Some(&mut navigate),
            go_back: None,
        };
        let record = run("/post", &transport, &mut host);
        assert_eq!(record.kind, ResultKind::Success);
        drop(host);
        assert_eq!(
            seen,
            vec![Destination::CreateThread(NavigationData {
                board_id: Some("crypt".to_string()),
                thread_id: None,
            })]
        );
    }

    #[test]
    fn news_without_navigate_degrades_to_error() {
        let transport = FakeTransport::ok(None, None);
        let record = run("/news", &transport, &mut HostCapabilities::none());
        assert_eq!(record.kind, ResultKind::Error);
        assert_eq!(record.output, "Navigation not available");
    }

    #[test]
    fn who_lists_users_or_placeholder() {
        let transport = FakeTransport::ok(
            None,
            Some(serde_json::json!({"users": [{"username": "ghost"}, {"username": "neo"}]})),
        );
        let record = run("/who", &transport, &mut HostCapabilities::none());
        assert_eq!(record.kind, ResultKind::Info);
        assert_eq!(record.output, "Active users:\n  - ghost\n  - neo");

        let empty = FakeTransport::ok(None, None);
        let record = run("/who", &empty, &mut HostCapabilities::none());
        assert_eq!(record.output, "Active users:\n  No users currently active");
    }

    #[test]
    fn generic_success_and_logical_failure_use_server_message() {
        let transport = FakeTransport::ok(Some("Art uploaded"), None);
        let record = run("/ascii cat.png", &transport, &mut HostCapabilities::none());
        assert_eq!(record.kind, ResultKind::Success);
        assert_eq!(record.output, "Art uploaded");

        let transport = FakeTransport::ok(None, None);
        let record = run("/ascii", &transport, &mut HostCapabilities::none());
        assert_eq!(record.output, "Command executed successfully");

        let transport = FakeTransport::replying(Ok(ExecuteResponse {
            success: false,
            message: Some("Board is sealed".to_string()),
            data: None,
        }));
        let record = run("/ascii", &transport, &mut HostCapabilities::none());
        assert_eq!(record.kind, ResultKind::Error);
        assert_eq!(record.output, "Board is sealed");

        let transport = FakeTransport::replying(Ok(ExecuteResponse::default()));
        let record = run("/ascii", &transport, &mut HostCapabilities::none());
        assert_eq!(record.output, "Command failed");
    }

    #[test]
    fn transport_failures_map_to_distinct_errors() {
        let rate_limited = FakeTransport::replying(Err(TransportError::RateLimited));
        let not_found = FakeTransport::replying(Err(TransportError::NotFound));

        let limited = run("/who", &rate_limited, &mut HostCapabilities::none());
        let unknown = run("/zzz", &not_found, &mut HostCapabilities::none());
        assert_eq!(limited.kind, ResultKind::Error);
        assert_eq!(unknown.kind, ResultKind::Error);
        assert!(limited.output.contains("Rate limit"));
        assert!(unknown.output.starts_with("UNKNOWN COMMAND"));
        assert_ne!(limited.output, unknown.output);
    }

    #[test]
    fn every_transport_category_has_its_own_message() {
        let errors = [
            TransportError::NotFound,
            TransportError::Unauthorized,
            TransportError::Forbidden,
            TransportError::RateLimited,
            TransportError::Api {
                message: "bad board".to_string(),
            },
            TransportError::Server { status: 502 },
            TransportError::Network("connection refused".to_string()),
            TransportError::Unexpected("HTTP 418".to_string()),
        ];
        let messages: Vec<String> = errors.iter().map(transport_error_message).collect();
        for (index, message) in messages.iter().enumerate() {
            assert!(!messages[index + 1..].contains(message), "{message}");
        }
        assert_eq!(messages[4], "ERROR: bad board");
        assert_eq!(messages[6], "CONNECTION LOST: connection refused");
    }

    #[test]
    fn begin_hands_off_remote_commands_with_their_context() {
        let context = ContextKey::board("1");
        let outcome = begin(
            command("/who --all"),
            context.clone(),
            &mut HostCapabilities::none(),
        );
        let Dispatch::Remote(remote) = outcome else {
            panic!("expected remote dispatch");
        };
        assert_eq!(remote.context, context);
        assert_eq!(
            remote.request(),
            ExecuteRequest {
                command: "/who".to_string(),
                args: vec!["--all".to_string()],
            }
        );
    }
}
