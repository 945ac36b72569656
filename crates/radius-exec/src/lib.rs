//! External-program dispatch module for RADIUS request processing
//!
//! This crate lets policy decisions be delegated to an external program:
//! the configured program runs once per request with the selected
//! attribute list in its environment, its exit status maps onto the
//! pipeline's enumerated result codes, and any attributes it declares
//! on stdout are folded back into the request. A dedicated
//! post-processing path understands the `NT_KEY:` output of NTLM
//! helpers and injects the MS-CHAPv2 success attribute into the reply.
//!
//! # Example
//!
//! ```rust,no_run
//! use radius_exec::{ExecConfig, ExecModule, ModuleResult};
//! use radius_pairs::{Code, Packet, Request};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ExecConfig {
//!         program: Some("/usr/bin/ntlm_auth --request-nt-key \
//!                        --username=%{User-Name}".to_string()),
//!         output_pairs: Some("reply".to_string()),
//!         ..Default::default()
//!     };
//!     let module = ExecModule::new(config, Some("ntlm_auth"))?;
//!
//!     let mut request = Request::new(Packet::new(Code::AccessRequest));
//!     match module.authenticate(&mut request).await {
//!         ModuleResult::Ok => println!("accepted"),
//!         other => println!("not accepted: {:?}", other),
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod dispatch;
pub mod exec;
pub mod mschap_reply;
pub mod ntkey;
pub mod source;

pub use config::{ConfigError, ExecConfig, ExecInstance, DEFAULT_TIMEOUT_SECS};
pub use dispatch::{ExecModule, ModuleResult};
pub use exec::{exec_program, ExecOutcome, EXIT_EXEC_FAILED, OUTPUT_CAP};
pub use mschap_reply::{integrate_mschap, ChapIntegration, ChapIntegrationError};
pub use ntkey::{parse_nt_key, NtKeyError, NT_KEY_PREFIX};
pub use source::PairSource;
