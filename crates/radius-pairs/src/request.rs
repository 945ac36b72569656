//! The per-transaction request aggregate that policy modules borrow.

use crate::attributes::PairList;
use crate::packet::Code;

/// One protocol message: a packet code plus its attribute list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub code: Code,
    pub pairs: PairList,
}

impl Packet {
    pub fn new(code: Code) -> Self {
        Packet {
            code,
            pairs: PairList::new(),
        }
    }
}

/// Request state for one in-flight protocol transaction.
///
/// Owned by the host pipeline; modules borrow it for the duration of a
/// single dispatch call. The reply and proxy messages exist only once
/// the corresponding processing has happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// The received packet. Always present.
    pub packet: Packet,
    /// The reply being built, once one exists.
    pub reply: Option<Packet>,
    /// The proxied request, when this request was forwarded.
    pub proxy: Option<Packet>,
    /// The reply received from the home server, when proxying occurred.
    pub proxy_reply: Option<Packet>,
    /// Request-scoped policy variables ("config items").
    pub config_items: PairList,
}

impl Request {
    pub fn new(packet: Packet) -> Self {
        Request {
            packet,
            reply: None,
            proxy: None,
            proxy_reply: None,
            config_items: PairList::new(),
        }
    }

    /// The reply message, created as an empty Access-Accept if none
    /// exists yet. Callers that need to reject overwrite the code.
    pub fn ensure_reply(&mut self) -> &mut Packet {
        self.reply.get_or_insert_with(|| Packet::new(Code::AccessAccept))
    }
}
