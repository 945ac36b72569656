//! The per-stage dispatch state machine.
//!
//! Every pipeline stage entry point gates, resolves sources, invokes
//! the external program, and folds the outcome into a single
//! [`ModuleResult`]. Dispatch is stateless across calls; the validated
//! instance configuration is the only persistent state.

use crate::config::{ConfigError, ExecConfig, ExecInstance};
use crate::exec::exec_program;
use crate::mschap_reply::{integrate_mschap, ChapIntegrationError};
use crate::ntkey::parse_nt_key;
use radius_pairs::{Attribute, AttributeType, Code, Request};
use tracing::{debug, error, warn};

/// Pipeline result codes, in the host's enumeration order. A non-zero
/// child exit status of `n` selects code `n - 1`; zero is reserved for
/// success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleResult {
    /// Immediately reject the request
    Reject,
    /// Module failed
    Fail,
    /// Module succeeded
    Ok,
    /// Module handled the request itself
    Handled,
    /// The request is invalid
    Invalid,
    /// The user is locked out
    Userlock,
    /// The user was not found
    Notfound,
    /// Module performed no operation
    Noop,
    /// Module updated the request
    Updated,
}

impl ModuleResult {
    /// Number of enumerated result codes.
    pub const NUM_CODES: usize = 9;

    fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(ModuleResult::Reject),
            1 => Some(ModuleResult::Fail),
            2 => Some(ModuleResult::Ok),
            3 => Some(ModuleResult::Handled),
            4 => Some(ModuleResult::Invalid),
            5 => Some(ModuleResult::Userlock),
            6 => Some(ModuleResult::Notfound),
            7 => Some(ModuleResult::Noop),
            8 => Some(ModuleResult::Updated),
            _ => None,
        }
    }

    /// Map a child exit status to a result code: 0 is success, negative
    /// is execution failure, and positive values index the enumeration
    /// off by one, falling back to failure when out of range.
    pub fn from_exit_status(status: i32) -> Self {
        if status == 0 {
            return ModuleResult::Ok;
        }
        if status < 0 {
            return ModuleResult::Fail;
        }
        let status = status as usize;
        if status > Self::NUM_CODES {
            return ModuleResult::Fail;
        }
        Self::from_index(status - 1).unwrap_or(ModuleResult::Fail)
    }
}

/// One configured module instance, safe for concurrent dispatch.
#[derive(Debug, Clone)]
pub struct ExecModule {
    instance: ExecInstance,
}

impl ExecModule {
    /// Validate `config` and build a module instance. `name` is the
    /// optional second section name; instances without one are "bare".
    pub fn new(config: ExecConfig, name: Option<&str>) -> Result<Self, ConfigError> {
        Ok(ExecModule {
            instance: config.instantiate(name)?,
        })
    }

    pub fn instance(&self) -> &ExecInstance {
        &self.instance
    }

    pub async fn authenticate(&self, request: &mut Request) -> ModuleResult {
        self.dispatch(request).await
    }

    pub async fn authorize(&self, request: &mut Request) -> ModuleResult {
        self.dispatch(request).await
    }

    pub async fn preacct(&self, request: &mut Request) -> ModuleResult {
        self.dispatch(request).await
    }

    /// Accounting stage. Only a bare instance performs marker-attribute
    /// discovery here; named instances run their configured program.
    pub async fn accounting(&self, request: &mut Request) -> ModuleResult {
        if !self.instance.bare {
            return self.dispatch(request).await;
        }
        self.discover(request).await
    }

    pub async fn pre_proxy(&self, request: &mut Request) -> ModuleResult {
        self.dispatch(request).await
    }

    pub async fn post_proxy(&self, request: &mut Request) -> ModuleResult {
        self.dispatch(request).await
    }

    /// Post-auth stage: Exec-Program / Exec-Program-Wait discovery
    /// first, then the configured program.
    pub async fn post_auth(&self, request: &mut Request) -> ModuleResult {
        self.discover(request).await
    }

    /// String-expansion entry point: run `fmt` as a program and return
    /// its captured output with control characters flattened to spaces.
    /// Requires wait mode; any failure expands to the empty string.
    pub async fn xlat(&self, request: &Request, fmt: &str) -> String {
        let inst = &self.instance;
        if !inst.wait {
            error!(
                instance = inst.log_name(),
                "'wait' must be enabled to use exec expansion"
            );
            return String::new();
        }
        let Some(input) = inst.input.resolve(request) else {
            error!(
                instance = inst.log_name(),
                "Failed to find input pairs for expansion"
            );
            return String::new();
        };

        debug!(instance = inst.log_name(), program = fmt, "Executing");
        let outcome =
            exec_program(fmt, request, true, inst.timeout, input, inst.shell_escape).await;
        debug!(instance = inst.log_name(), status = outcome.status, "Expansion result");
        if outcome.status != 0 {
            return String::new();
        }
        outcome
            .output
            .chars()
            .map(|c| if c.is_control() { ' ' } else { c })
            .collect()
    }

    /// The generic dispatch path shared by most stages.
    async fn dispatch(&self, request: &mut Request) -> ModuleResult {
        let inst = &self.instance;

        let Some(program) = inst.program.as_deref() else {
            error!(instance = inst.log_name(), "We require a program to execute");
            return ModuleResult::Fail;
        };

        // See if we're supposed to execute for this packet type.
        if let Some(code) = inst.packet_code {
            let matched = request.packet.code == code
                || request.reply.as_ref().is_some_and(|r| r.code == code)
                || request.proxy.as_ref().is_some_and(|p| p.code == code)
                || request.proxy_reply.as_ref().is_some_and(|p| p.code == code);
            if !matched {
                debug!(
                    instance = inst.log_name(),
                    packet_type = ?code,
                    "Packet type does not match, not executing"
                );
                return ModuleResult::Noop;
            }
        }

        // The configured source may name a list this request does not
        // have yet; that is a per-request condition, not misconfiguration.
        let Some(input) = inst.input.resolve(request) else {
            warn!(
                instance = inst.log_name(),
                input = ?inst.input,
                "Input pairs do not resolve for this request, not executing"
            );
            return ModuleResult::Noop;
        };
        if input.is_empty() {
            debug!(
                instance = inst.log_name(),
                "Input pairs are empty, no attributes will be passed to the program"
            );
        }

        let mut outcome = exec_program(
            program,
            request,
            inst.wait,
            inst.timeout,
            input,
            inst.shell_escape,
        )
        .await;

        if outcome.status < 0 {
            error!(instance = inst.log_name(), "External program failed");
            return ModuleResult::Fail;
        }

        // Move the declared answer pairs over to the output list. When
        // not waiting there are none.
        if let Some(output) = inst.output {
            if let Some(dest) = output.resolve_mut(request) {
                dest.move_append(&mut outcome.pairs);
            }
        }

        // Helper-output post-processing. Applies to every waited
        // invocation that produced output, not only NTLM helpers; see
        // the integration tests for the consequences.
        if inst.wait && !outcome.output.is_empty() {
            let nt_hash_hash = match parse_nt_key(&outcome.output) {
                Ok(key) => key,
                Err(err) => {
                    debug!(
                        instance = inst.log_name(),
                        error = %err,
                        "Invalid output from authentication helper"
                    );
                    return ModuleResult::Fail;
                }
            };
            match integrate_mschap(&nt_hash_hash, request) {
                // Not-applicable outcomes fall through to the exit
                // status mapping.
                Ok(_) => {}
                Err(ChapIntegrationError::MissingUserName) => {
                    warn!(instance = inst.log_name(), "We require a User-Name for MS-CHAPv2");
                    return ModuleResult::Invalid;
                }
                Err(err) => {
                    warn!(
                        instance = inst.log_name(),
                        error = %err,
                        "MS-CHAP integration failed"
                    );
                    return ModuleResult::Fail;
                }
            }
        }

        ModuleResult::from_exit_status(outcome.status)
    }

    /// Marker-attribute discovery: an Exec-Program (fire-and-forget) or
    /// Exec-Program-Wait (waited) attribute in the reply overrides the
    /// configured program for this one invocation.
    async fn discover(&self, request: &mut Request) -> ModuleResult {
        let inst = &self.instance;

        let marker = request.reply.as_ref().and_then(|reply| {
            if let Some(pair) = reply.pairs.find(AttributeType::ExecProgram) {
                pair.value.as_str().map(|s| (s.to_string(), false))
            } else if let Some(pair) = reply.pairs.find(AttributeType::ExecProgramWait) {
                pair.value.as_str().map(|s| (s.to_string(), true))
            } else {
                None
            }
        });

        let Some((program, wait)) = marker else {
            if inst.program.is_none() {
                return ModuleResult::Noop;
            }
            return self.dispatch(request).await;
        };

        debug!(
            instance = inst.log_name(),
            program = %program,
            wait,
            "Executing discovered program"
        );
        let mut outcome = exec_program(
            &program,
            request,
            wait,
            inst.timeout,
            &request.packet.pairs,
            inst.shell_escape,
        )
        .await;

        // Always add the declared answer pairs to the reply.
        let reply = request.ensure_reply();
        reply.pairs.move_append(&mut outcome.pairs);

        if outcome.status < 0 {
            reply.pairs.push(Attribute::string(
                AttributeType::ReplyMessage,
                "Access denied (external check failed)",
            ));
            reply.code = Code::AccessReject;
            debug!(instance = inst.log_name(), "Login incorrect (external check failed)");
            return ModuleResult::Reject;
        }
        if outcome.status > 0 {
            reply.code = Code::AccessReject;
            debug!(instance = inst.log_name(), "Login incorrect (external check said so)");
            return ModuleResult::Reject;
        }

        ModuleResult::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use radius_pairs::Packet;

    fn module(config: ExecConfig) -> ExecModule {
        ExecModule::new(config, Some("test")).unwrap()
    }

    #[test]
    fn test_exit_status_mapping() {
        assert_eq!(ModuleResult::from_exit_status(0), ModuleResult::Ok);
        assert_eq!(ModuleResult::from_exit_status(-1), ModuleResult::Fail);
        // status - 1 indexes the enumeration.
        assert_eq!(ModuleResult::from_exit_status(1), ModuleResult::Reject);
        assert_eq!(ModuleResult::from_exit_status(5), ModuleResult::Invalid);
        assert_eq!(ModuleResult::from_exit_status(7), ModuleResult::Notfound);
        assert_eq!(ModuleResult::from_exit_status(9), ModuleResult::Updated);
        // Out of range.
        assert_eq!(ModuleResult::from_exit_status(10), ModuleResult::Fail);
        assert_eq!(ModuleResult::from_exit_status(1000), ModuleResult::Fail);
    }

    #[tokio::test]
    async fn test_no_program_is_hard_failure() {
        let module = module(ExecConfig::default());
        let mut request = Request::new(Packet::new(Code::AccessRequest));
        assert_eq!(module.authorize(&mut request).await, ModuleResult::Fail);
    }

    #[tokio::test]
    async fn test_packet_type_gate_skips_execution() {
        // The program does not exist; if the gate failed to stop
        // dispatch this would be Fail, not Noop.
        let module = module(ExecConfig {
            program: Some("/no/such/program".to_string()),
            packet_type: Some("Accounting-Request".to_string()),
            ..Default::default()
        });
        let mut request = Request::new(Packet::new(Code::AccessRequest));
        assert_eq!(module.authorize(&mut request).await, ModuleResult::Noop);
    }

    #[tokio::test]
    async fn test_packet_type_gate_matches_reply_code() {
        let module = module(ExecConfig {
            program: Some("/no/such/program".to_string()),
            packet_type: Some("Access-Accept".to_string()),
            ..Default::default()
        });
        let mut request = Request::new(Packet::new(Code::AccessRequest));
        request.ensure_reply();
        // Gate passes via the reply code, then the spawn fails.
        assert_eq!(module.authorize(&mut request).await, ModuleResult::Fail);
    }

    #[tokio::test]
    async fn test_unresolvable_input_is_noop() {
        let module = module(ExecConfig {
            program: Some("/no/such/program".to_string()),
            input_pairs: "reply".to_string(),
            ..Default::default()
        });
        // No reply exists yet, so the input source does not resolve.
        let mut request = Request::new(Packet::new(Code::AccessRequest));
        assert_eq!(module.authorize(&mut request).await, ModuleResult::Noop);
    }

    #[tokio::test]
    async fn test_post_auth_without_marker_or_program_is_noop() {
        let module = module(ExecConfig::default());
        let mut request = Request::new(Packet::new(Code::AccessRequest));
        request.ensure_reply();
        assert_eq!(module.post_auth(&mut request).await, ModuleResult::Noop);
    }

    #[tokio::test]
    async fn test_named_accounting_uses_configured_path() {
        // A named (non-bare) instance must not do marker discovery at
        // the accounting stage; with no program configured that is a
        // hard failure.
        let module = module(ExecConfig::default());
        let mut request = Request::new(Packet::new(Code::AccountingRequest));
        assert_eq!(module.accounting(&mut request).await, ModuleResult::Fail);
    }

    #[tokio::test]
    async fn test_xlat_requires_wait() {
        let module = ExecModule::new(
            ExecConfig {
                wait: false,
                ..Default::default()
            },
            Some("test"),
        )
        .unwrap();
        let request = Request::new(Packet::new(Code::AccessRequest));
        assert_eq!(module.xlat(&request, "/bin/echo hi").await, "");
    }

    #[tokio::test]
    async fn test_xlat_expands_to_empty_on_failure() {
        let module = module(ExecConfig::default());
        let request = Request::new(Packet::new(Code::AccessRequest));

        // Non-zero exit status.
        assert_eq!(module.xlat(&request, "/bin/false").await, "");
        // Program cannot be spawned at all.
        assert_eq!(module.xlat(&request, "/no/such/program").await, "");
    }

    #[tokio::test]
    async fn test_xlat_flattens_control_characters() {
        let module = module(ExecConfig::default());
        let request = Request::new(Packet::new(Code::AccessRequest));
        let expanded = module.xlat(&request, "/bin/echo hello").await;
        assert_eq!(expanded, "hello ");
    }
}
