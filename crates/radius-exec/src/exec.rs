//! Bounded, output-capturing external-program invocation.
//!
//! A program template is expanded against the current request, executed
//! directly (no shell) with the input pair list serialized into the
//! child environment, and its exit disposition is reported as a single
//! integer status: 0 for success, the child's exit code when non-zero,
//! negative when execution could not start or was forcibly terminated.
//! Process-level failures never escape this module as errors or panics.

use radius_pairs::{Attribute, AttributeType, PairList, Request, Value};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Captured-output bound, matching the legacy 1024-byte answer buffer.
pub const OUTPUT_CAP: usize = 1024;

/// Status reported for spawn failures, timeouts, and signal deaths.
pub const EXIT_EXEC_FAILED: i32 = -1;

/// Result of one external-program invocation.
#[derive(Debug)]
pub struct ExecOutcome {
    /// 0 success, >0 child exit code, <0 execution failure.
    pub status: i32,
    /// Captured stdout text, bounded at [`OUTPUT_CAP`]. Empty unless
    /// wait mode completed.
    pub output: String,
    /// Attributes the child declared on stdout as `Name = value` pairs.
    /// Empty unless wait mode completed and the output parsed as pairs.
    pub pairs: PairList,
}

impl ExecOutcome {
    fn failed() -> Self {
        ExecOutcome {
            status: EXIT_EXEC_FAILED,
            output: String::new(),
            pairs: PairList::new(),
        }
    }
}

/// Run `program` for `request`.
///
/// With `wait` set, blocks the calling task until the child exits or
/// `limit` elapses, at which point the child is killed and no partial
/// output is trusted. Without `wait`, returns as soon as the child has
/// been handed off; the runtime reaps it in the background.
pub async fn exec_program(
    program: &str,
    request: &Request,
    wait: bool,
    limit: Duration,
    input: &PairList,
    shell_escape: bool,
) -> ExecOutcome {
    let argv = expand_argv(program, request, shell_escape);
    let Some((path, args)) = argv.split_first() else {
        warn!("External program expanded to an empty command line");
        return ExecOutcome::failed();
    };

    let mut command = Command::new(path);
    command
        .args(args)
        .envs(environment(input))
        .stdin(Stdio::null())
        .stdout(if wait { Stdio::piped() } else { Stdio::null() })
        .stderr(Stdio::null())
        .kill_on_drop(wait);

    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(err) => {
            warn!(program = %path, error = %err, "Failed to execute external program");
            return ExecOutcome::failed();
        }
    };

    if !wait {
        debug!(program = %path, "Handed off external program without waiting");
        return ExecOutcome {
            status: 0,
            output: String::new(),
            pairs: PairList::new(),
        };
    }

    let mut stdout = child.stdout.take();
    let mut raw = Vec::new();
    let waited = timeout(limit, async {
        if let Some(out) = stdout.as_mut() {
            let mut buf = [0u8; 256];
            loop {
                match out.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        // Store up to the cap but keep draining so the
                        // child never blocks on a full pipe.
                        let room = OUTPUT_CAP.saturating_sub(raw.len());
                        raw.extend_from_slice(&buf[..n.min(room)]);
                    }
                }
            }
        }
        child.wait().await
    })
    .await;

    let status = match waited {
        Ok(Ok(exit)) => match exit.code() {
            Some(code) => code,
            None => {
                warn!(program = %path, "External program terminated by signal");
                EXIT_EXEC_FAILED
            }
        },
        Ok(Err(err)) => {
            warn!(program = %path, error = %err, "Failed to reap external program");
            EXIT_EXEC_FAILED
        }
        Err(_) => {
            warn!(
                program = %path,
                timeout_secs = limit.as_secs(),
                "External program exceeded timeout, killing it"
            );
            let _ = child.kill().await;
            return ExecOutcome::failed();
        }
    };

    let output = String::from_utf8_lossy(&raw).into_owned();
    let pairs = match parse_output_pairs(&output) {
        Some(pairs) => pairs,
        None => {
            if !output.is_empty() {
                debug!(program = %path, "External program output is not attribute pairs");
            }
            PairList::new()
        }
    };

    debug!(program = %path, status, "External program finished");
    ExecOutcome {
        status,
        output,
        pairs,
    }
}

/// Split the template into words, then expand `%{Attr-Name}` references
/// within each word, so an expanded value containing spaces stays a
/// single argument.
pub(crate) fn expand_argv(program: &str, request: &Request, shell_escape: bool) -> Vec<String> {
    program
        .split_whitespace()
        .map(|word| expand_word(word, request, shell_escape))
        .collect()
}

fn expand_word(word: &str, request: &Request, shell_escape: bool) -> String {
    let mut out = String::with_capacity(word.len());
    let mut rest = word;
    while let Some(start) = rest.find("%{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let value = lookup(&after[..end], request);
                if shell_escape {
                    out.push_str(&escape_value(&value));
                } else {
                    out.push_str(&value);
                }
                rest = &after[end + 1..];
            }
            None => {
                // Unterminated reference, keep it literally.
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// First matching attribute value for a bare `%{Attr-Name}` reference:
/// the packet list, then the config items. Unknown or absent attributes
/// expand to the empty string.
fn lookup(name: &str, request: &Request) -> String {
    let Some(attr_type) = AttributeType::from_name(name) else {
        return String::new();
    };
    request
        .packet
        .pairs
        .find(attr_type)
        .or_else(|| request.config_items.find(attr_type))
        .map(|pair| pair.value.to_string())
        .unwrap_or_default()
}

/// Backslash-escape anything outside a conservative safe set and drop
/// control characters. The child is executed without a shell, so this
/// protects scripts that pass our arguments onward.
fn escape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        if ch.is_control() {
            continue;
        }
        if ch.is_ascii_alphanumeric() || "@%+=:,./-_ ".contains(ch) {
            out.push(ch);
        } else {
            out.push('\\');
            out.push(ch);
        }
    }
    out
}

/// Serialize input pairs into child environment variables:
/// `User-Name` becomes `USER_NAME`.
pub(crate) fn environment(input: &PairList) -> Vec<(String, String)> {
    input
        .iter()
        .map(|pair| {
            let name: String = pair
                .attr_type
                .name()
                .chars()
                .map(|c| match c {
                    '-' | '/' => '_',
                    c => c.to_ascii_uppercase(),
                })
                .collect();
            (name, pair.value.to_string())
        })
        .collect()
}

/// Parse child stdout as declared attribute pairs, one `Name = value`
/// per line or comma-separated entry. Any entry that is not a
/// well-formed pair for a known attribute makes the whole text plain
/// output instead.
pub(crate) fn parse_output_pairs(text: &str) -> Option<PairList> {
    let mut pairs = PairList::new();
    for token in text.lines().flat_map(|line| line.split(',')) {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        let (name, value) = token.split_once('=')?;
        // Accept both the "=" and ":=" pair operators.
        let name = name.trim().trim_end_matches(':').trim();
        let attr_type = AttributeType::from_name(name)?;
        let value = value.trim();
        let value = if let Some(quoted) = value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
        {
            Value::String(quoted.to_string())
        } else if let Ok(n) = value.parse::<u32>() {
            Value::Integer(n)
        } else {
            Value::String(value.to_string())
        };
        pairs.push(Attribute::new(attr_type, value));
    }
    if pairs.is_empty() {
        None
    } else {
        Some(pairs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use radius_pairs::{Code, Packet};

    fn request_with_user(name: &str) -> Request {
        let mut packet = Packet::new(Code::AccessRequest);
        packet
            .pairs
            .push(Attribute::string(AttributeType::UserName, name));
        Request::new(packet)
    }

    #[test]
    fn test_expand_argv_attribute_reference() {
        let request = request_with_user("alice");
        let argv = expand_argv("/bin/check %{User-Name} --strict", &request, true);
        assert_eq!(argv, vec!["/bin/check", "alice", "--strict"]);
    }

    #[test]
    fn test_expand_argv_missing_attribute_is_empty() {
        let request = request_with_user("alice");
        let argv = expand_argv("prog %{Filter-Id}x %{No-Such}", &request, true);
        assert_eq!(argv, vec!["prog", "x", ""]);
    }

    #[test]
    fn test_expand_word_escapes_shell_metacharacters() {
        let mut request = request_with_user("alice;rm");
        let argv = expand_argv("prog %{User-Name}", &request, true);
        assert_eq!(argv[1], "alice\\;rm");

        // With escaping off, the value passes through untouched.
        request = request_with_user("alice;rm");
        let argv = expand_argv("prog %{User-Name}", &request, false);
        assert_eq!(argv[1], "alice;rm");
    }

    #[test]
    fn test_environment_names() {
        let mut input = PairList::new();
        input.push(Attribute::string(AttributeType::UserName, "bob"));
        input.push(Attribute::integer(AttributeType::NasPort, 7));

        let env = environment(&input);
        assert_eq!(
            env,
            vec![
                ("USER_NAME".to_string(), "bob".to_string()),
                ("NAS_PORT".to_string(), "7".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_output_pairs() {
        let pairs =
            parse_output_pairs("Session-Timeout = 3600, Filter-Id = \"vip users\"\nReply-Message := ok\n")
                .unwrap();
        assert_eq!(pairs.len(), 3);
        assert_eq!(
            pairs.find(AttributeType::SessionTimeout).unwrap().value,
            Value::Integer(3600)
        );
        assert_eq!(
            pairs.find(AttributeType::FilterId).unwrap().value.as_str(),
            Some("vip users")
        );
        assert_eq!(
            pairs.find(AttributeType::ReplyMessage).unwrap().value.as_str(),
            Some("ok")
        );
    }

    #[test]
    fn test_parse_output_pairs_rejects_plaintext() {
        assert!(parse_output_pairs("NT_KEY: 0123456789abcdef0123456789abcdef").is_none());
        assert!(parse_output_pairs("Unknown-Attr = 1").is_none());
        assert!(parse_output_pairs("").is_none());
    }

    #[tokio::test]
    async fn test_wait_captures_output_and_status() {
        let request = request_with_user("alice");
        let input = PairList::new();
        let outcome = exec_program(
            "/bin/echo hello",
            &request,
            true,
            Duration::from_secs(5),
            &input,
            true,
        )
        .await;
        assert_eq!(outcome.status, 0);
        assert_eq!(outcome.output, "hello\n");
        assert!(outcome.pairs.is_empty());
    }

    #[tokio::test]
    async fn test_spawn_failure_is_negative_status() {
        let request = request_with_user("alice");
        let input = PairList::new();
        let outcome = exec_program(
            "/no/such/program",
            &request,
            true,
            Duration::from_secs(5),
            &input,
            true,
        )
        .await;
        assert!(outcome.status < 0);
        assert!(outcome.output.is_empty());
    }

    #[tokio::test]
    async fn test_timeout_kills_child() {
        let request = request_with_user("alice");
        let input = PairList::new();
        let start = std::time::Instant::now();
        let outcome = exec_program(
            "/bin/sleep 30",
            &request,
            true,
            Duration::from_secs(1),
            &input,
            true,
        )
        .await;
        assert!(outcome.status < 0);
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_fire_and_forget_returns_immediately() {
        let request = request_with_user("alice");
        let input = PairList::new();
        let outcome = exec_program(
            "/bin/sleep 10",
            &request,
            false,
            Duration::from_secs(1),
            &input,
            true,
        )
        .await;
        assert_eq!(outcome.status, 0);
        assert!(outcome.output.is_empty());
        assert!(outcome.pairs.is_empty());
    }
}
