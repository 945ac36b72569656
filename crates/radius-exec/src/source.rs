//! Symbolic pair-source names and their resolution against a request.

use radius_pairs::{PairList, Request};

/// A named attribute collection within a [`Request`].
///
/// Configuration refers to collections by symbolic name; resolution
/// happens per dispatch because the reply and proxy collections may not
/// exist yet when the instance is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairSource {
    /// The received packet's attributes. Always resolvable.
    Request,
    /// The reply being built, if one exists.
    Reply,
    /// The proxied request, if proxying occurred.
    ProxyRequest,
    /// The home server's reply, if proxying occurred.
    ProxyReply,
    /// Request-scoped policy variables. Always resolvable.
    ConfigItems,
}

impl PairSource {
    /// Map a symbolic name to a source. `"none"` and unrecognized names
    /// mean "no source"; that is a caller decision to reject or accept,
    /// not an error here.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "request" => Some(PairSource::Request),
            "reply" => Some(PairSource::Reply),
            "proxy-request" => Some(PairSource::ProxyRequest),
            "proxy-reply" => Some(PairSource::ProxyReply),
            "config" => Some(PairSource::ConfigItems),
            _ => None,
        }
    }

    /// The list this source names within `request`, if it exists.
    pub fn resolve<'a>(&self, request: &'a Request) -> Option<&'a PairList> {
        match self {
            PairSource::Request => Some(&request.packet.pairs),
            PairSource::Reply => request.reply.as_ref().map(|p| &p.pairs),
            PairSource::ProxyRequest => request.proxy.as_ref().map(|p| &p.pairs),
            PairSource::ProxyReply => request.proxy_reply.as_ref().map(|p| &p.pairs),
            PairSource::ConfigItems => Some(&request.config_items),
        }
    }

    /// Mutable variant of [`resolve`](Self::resolve), used for output
    /// relocation.
    pub fn resolve_mut<'a>(&self, request: &'a mut Request) -> Option<&'a mut PairList> {
        match self {
            PairSource::Request => Some(&mut request.packet.pairs),
            PairSource::Reply => request.reply.as_mut().map(|p| &mut p.pairs),
            PairSource::ProxyRequest => request.proxy.as_mut().map(|p| &mut p.pairs),
            PairSource::ProxyReply => request.proxy_reply.as_mut().map(|p| &mut p.pairs),
            PairSource::ConfigItems => Some(&mut request.config_items),
        }
    }
}
