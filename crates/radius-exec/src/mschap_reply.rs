//! MS-CHAPv2 challenge-response integration.
//!
//! Once an NTLM helper has validated a credential and reported the
//! NT-hash-hash, the peer still expects an MS-CHAP2-Success attribute
//! proving the server knew the password too. This module locates the
//! challenge/response material on the request, computes the
//! authenticator response, and appends the success attribute to the
//! reply.

use radius_pairs::{mschap, Attribute, AttributeType, Request, Value};
use thiserror::Error;
use tracing::debug;

// MS-CHAP2-Response attribute layout (RFC 2548 Section 2.3.2):
// ident(1) flags(1) peer-challenge(16) reserved(8) nt-response(24).
const PEER_CHALLENGE_OFFSET: usize = 2;
const NT_RESPONSE_OFFSET: usize = 26;
const MSCHAP2_RESPONSE_LEN: usize = 50;

/// MS-CHAP-Challenge length for MS-CHAPv2 (RFC 2548 Section 2.1.3).
const AUTH_CHALLENGE_LEN: usize = 16;

/// Response attribute candidates, tried in order.
const RESPONSE_CANDIDATES: [AttributeType; 2] = [
    AttributeType::MsChapResponse,
    AttributeType::MsChap2Response,
];

/// Non-error outcomes of an integration attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChapIntegration {
    /// The MS-CHAP2-Success attribute was appended to the reply.
    Added,
    /// The request carries no MS-CHAP material; nothing to do.
    NotApplicable,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChapIntegrationError {
    /// Missing identity is a protocol violation, not a skippable
    /// condition; it maps to the "invalid" pipeline result.
    #[error("We require a User-Name for MS-CHAPv2")]
    MissingUserName,
    #[error("MS-CHAP response attribute is {0} octets (need {MSCHAP2_RESPONSE_LEN})")]
    MalformedResponse(usize),
    #[error("MS-CHAP-Challenge is {0} octets (need {AUTH_CHALLENGE_LEN})")]
    MalformedChallenge(usize),
}

/// Compute and inject the MS-CHAP2-Success reply attribute.
///
/// Runs only after a successful helper invocation and NT_KEY parse.
/// Absent challenge or response attributes are not errors; the request
/// simply is not an MS-CHAPv2 exchange.
pub fn integrate_mschap(
    nt_hash_hash: &[u8; 16],
    request: &mut Request,
) -> Result<ChapIntegration, ChapIntegrationError> {
    let packet = &request.packet.pairs;

    let Some(challenge) = packet.find(AttributeType::MsChapChallenge) else {
        return Ok(ChapIntegration::NotApplicable);
    };

    let user_name = packet
        .find(AttributeType::UserName)
        .ok_or(ChapIntegrationError::MissingUserName)?;

    let Some(response) = packet.find_any(&RESPONSE_CANDIDATES) else {
        debug!("Found MS-CHAP-Challenge, but no MS-CHAP-Response");
        return Ok(ChapIntegration::NotApplicable);
    };

    // The peer may assert a different identity for the response
    // computation than the RADIUS User-Name.
    let name_attr = packet
        .find(AttributeType::MsChapUserName)
        .unwrap_or(user_name);
    let user_string = name_attr
        .value
        .as_str()
        .ok_or(ChapIntegrationError::MissingUserName)?;

    let response_octets = response
        .value
        .as_octets()
        .filter(|octets| octets.len() >= MSCHAP2_RESPONSE_LEN)
        .ok_or_else(|| {
            ChapIntegrationError::MalformedResponse(
                response.value.as_octets().map_or(0, <[u8]>::len),
            )
        })?;

    let challenge_octets: &[u8; 16] = challenge
        .value
        .as_octets()
        .and_then(|octets| octets.try_into().ok())
        .ok_or_else(|| {
            ChapIntegrationError::MalformedChallenge(
                challenge.value.as_octets().map_or(0, <[u8]>::len),
            )
        })?;

    let mut nt_response = [0u8; 24];
    nt_response.copy_from_slice(&response_octets[NT_RESPONSE_OFFSET..NT_RESPONSE_OFFSET + 24]);
    let mut peer_challenge = [0u8; 16];
    peer_challenge
        .copy_from_slice(&response_octets[PEER_CHALLENGE_OFFSET..PEER_CHALLENGE_OFFSET + 16]);

    let auth_resp = mschap::auth_response(
        user_string,
        nt_hash_hash,
        &nt_response,
        &peer_challenge,
        challenge_octets,
    );

    // MS-CHAP2-Success carries the response's ident byte followed by
    // the 42-byte "S=..." text.
    let mut success = Vec::with_capacity(1 + auth_resp.len());
    success.push(response_octets[0]);
    success.extend_from_slice(&auth_resp);

    request
        .ensure_reply()
        .pairs
        .push(Attribute::new(
            AttributeType::MsChap2Success,
            Value::Octets(success),
        ));

    Ok(ChapIntegration::Added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use radius_pairs::{Code, Packet, PairList};

    const SECRET: [u8; 16] = [0x11; 16];

    fn mschap_request(pairs: PairList) -> Request {
        let mut packet = Packet::new(Code::AccessRequest);
        packet.pairs = pairs;
        Request::new(packet)
    }

    fn full_pairs() -> PairList {
        let mut response = vec![0u8; MSCHAP2_RESPONSE_LEN];
        response[0] = 0x42; // ident
        let mut pairs = PairList::new();
        pairs.push(Attribute::string(AttributeType::UserName, "alice"));
        pairs.push(Attribute::octets(
            AttributeType::MsChapChallenge,
            vec![0xAA; 16],
        ));
        pairs.push(Attribute::octets(AttributeType::MsChap2Response, response));
        pairs
    }

    #[test]
    fn test_no_challenge_is_not_applicable() {
        let mut pairs = full_pairs();
        pairs.remove(AttributeType::MsChapChallenge);
        let mut request = mschap_request(pairs);

        let outcome = integrate_mschap(&SECRET, &mut request).unwrap();
        assert_eq!(outcome, ChapIntegration::NotApplicable);
        assert!(request.reply.is_none());
    }

    #[test]
    fn test_no_response_is_not_applicable() {
        let mut pairs = full_pairs();
        pairs.remove(AttributeType::MsChap2Response);
        let mut request = mschap_request(pairs);

        let outcome = integrate_mschap(&SECRET, &mut request).unwrap();
        assert_eq!(outcome, ChapIntegration::NotApplicable);
    }

    #[test]
    fn test_missing_user_name_is_hard_error() {
        let mut pairs = full_pairs();
        pairs.remove(AttributeType::UserName);
        let mut request = mschap_request(pairs);

        let err = integrate_mschap(&SECRET, &mut request).unwrap_err();
        assert_eq!(err, ChapIntegrationError::MissingUserName);
    }

    #[test]
    fn test_short_response_is_hard_error() {
        let mut pairs = full_pairs();
        pairs.remove(AttributeType::MsChap2Response);
        pairs.push(Attribute::octets(
            AttributeType::MsChap2Response,
            vec![0u8; 30],
        ));
        let mut request = mschap_request(pairs);

        let err = integrate_mschap(&SECRET, &mut request).unwrap_err();
        assert_eq!(err, ChapIntegrationError::MalformedResponse(30));
    }

    #[test]
    fn test_success_attribute_layout() {
        let mut request = mschap_request(full_pairs());

        let outcome = integrate_mschap(&SECRET, &mut request).unwrap();
        assert_eq!(outcome, ChapIntegration::Added);

        let reply = request.reply.as_ref().unwrap();
        let success = reply.pairs.find(AttributeType::MsChap2Success).unwrap();
        let octets = success.value.as_octets().unwrap();
        assert_eq!(octets.len(), 43);
        assert_eq!(octets[0], 0x42); // response ident byte
        assert_eq!(&octets[1..3], b"S=");
        assert!(octets[3..].iter().all(u8::is_ascii_hexdigit));
    }

    #[test]
    fn test_override_identity_preferred() {
        // The MS-CHAP-User-Name identity changes the computed value.
        let mut request_a = mschap_request(full_pairs());
        integrate_mschap(&SECRET, &mut request_a).unwrap();

        let mut pairs = full_pairs();
        pairs.push(Attribute::string(AttributeType::MsChapUserName, "bob"));
        let mut request_b = mschap_request(pairs);
        integrate_mschap(&SECRET, &mut request_b).unwrap();

        let value_of = |request: &Request| {
            request
                .reply
                .as_ref()
                .unwrap()
                .pairs
                .find(AttributeType::MsChap2Success)
                .unwrap()
                .value
                .clone()
        };
        assert_ne!(value_of(&request_a), value_of(&request_b));
    }

    #[test]
    fn test_legacy_response_type_tried_first() {
        let mut response = vec![0u8; MSCHAP2_RESPONSE_LEN];
        response[0] = 0x05;
        let mut pairs = full_pairs();
        pairs.push(Attribute::octets(AttributeType::MsChapResponse, response));
        let mut request = mschap_request(pairs);

        integrate_mschap(&SECRET, &mut request).unwrap();
        let reply = request.reply.as_ref().unwrap();
        let success = reply.pairs.find(AttributeType::MsChap2Success).unwrap();
        // Ident comes from MS-CHAP-Response, the primary candidate.
        assert_eq!(success.value.as_octets().unwrap()[0], 0x05);
    }
}
