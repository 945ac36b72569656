//! RADIUS value-pair data model
//!
//! This crate provides the server-internal representation of RADIUS
//! attributes ("value pairs") that policy modules operate on, plus the
//! MS-CHAPv2 authenticator-response computation defined in RFC 2759.
//!
//! Unlike a wire codec, pairs here carry decoded values (string, octets,
//! integer) and are identified by dictionary numbers, with Microsoft
//! vendor attributes folded into the internal numbering space.
//!
//! # Example
//!
//! ```rust
//! use radius_pairs::{Attribute, AttributeType, Code, Packet, Request};
//!
//! let mut packet = Packet::new(Code::AccessRequest);
//! packet.pairs.push(Attribute::string(AttributeType::UserName, "alice"));
//!
//! let request = Request::new(packet);
//! let user = request.packet.pairs.find(AttributeType::UserName).unwrap();
//! assert_eq!(user.value.as_str(), Some("alice"));
//! ```

pub mod attributes;
pub mod mschap;
pub mod packet;
pub mod request;

pub use attributes::{Attribute, AttributeType, PairList, Value};
pub use mschap::{auth_response, challenge_hash, AUTH_RESPONSE_LEN};
pub use packet::Code;
pub use request::{Packet, Request};
