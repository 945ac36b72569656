/// Internal numbering space for vendor attributes, matching the
/// convention of folding vendor ID 311 (Microsoft) into the high bits.
const MICROSOFT: u32 = 311 << 16;

/// Attribute dictionary numbers.
///
/// Numbers 1-255 are the RFC 2865/2866 attribute space; numbers above
/// 1000 are server-internal attributes that never appear on the wire;
/// Microsoft vendor attributes (RFC 2548) live at `(311 << 16) | attr`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum AttributeType {
    /// User-Name (1) - RFC 2865
    UserName = 1,
    /// User-Password (2) - RFC 2865
    UserPassword = 2,
    /// NAS-IP-Address (4) - RFC 2865
    NasIpAddress = 4,
    /// NAS-Port (5) - RFC 2865
    NasPort = 5,
    /// Service-Type (6) - RFC 2865
    ServiceType = 6,
    /// Filter-Id (11) - RFC 2865
    FilterId = 11,
    /// Reply-Message (18) - RFC 2865
    ReplyMessage = 18,
    /// State (24) - RFC 2865
    State = 24,
    /// Class (25) - RFC 2865
    Class = 25,
    /// Session-Timeout (27) - RFC 2865
    SessionTimeout = 27,
    /// Idle-Timeout (28) - RFC 2865
    IdleTimeout = 28,
    /// Called-Station-Id (30) - RFC 2865
    CalledStationId = 30,
    /// Calling-Station-Id (31) - RFC 2865
    CallingStationId = 31,
    /// NAS-Identifier (32) - RFC 2865
    NasIdentifier = 32,
    /// Acct-Status-Type (40) - RFC 2866
    AcctStatusType = 40,
    /// Acct-Session-Id (44) - RFC 2866
    AcctSessionId = 44,

    /// Exec-Program (server-internal): fire-and-forget program marker
    ExecProgram = 1038,
    /// Exec-Program-Wait (server-internal): waited program marker
    ExecProgramWait = 1039,
    /// MS-CHAP-User-Name (server-internal): identity override for MS-CHAP
    MsChapUserName = 1143,

    /// MS-CHAP-Response (Microsoft VSA 1) - RFC 2548
    MsChapResponse = MICROSOFT | 1,
    /// MS-CHAP-Challenge (Microsoft VSA 11) - RFC 2548
    MsChapChallenge = MICROSOFT | 11,
    /// MS-CHAP2-Response (Microsoft VSA 25) - RFC 2548
    MsChap2Response = MICROSOFT | 25,
    /// MS-CHAP2-Success (Microsoft VSA 26) - RFC 2548
    MsChap2Success = MICROSOFT | 26,
}

impl AttributeType {
    /// Dictionary name of this attribute.
    pub fn name(self) -> &'static str {
        match self {
            AttributeType::UserName => "User-Name",
            AttributeType::UserPassword => "User-Password",
            AttributeType::NasIpAddress => "NAS-IP-Address",
            AttributeType::NasPort => "NAS-Port",
            AttributeType::ServiceType => "Service-Type",
            AttributeType::FilterId => "Filter-Id",
            AttributeType::ReplyMessage => "Reply-Message",
            AttributeType::State => "State",
            AttributeType::Class => "Class",
            AttributeType::SessionTimeout => "Session-Timeout",
            AttributeType::IdleTimeout => "Idle-Timeout",
            AttributeType::CalledStationId => "Called-Station-Id",
            AttributeType::CallingStationId => "Calling-Station-Id",
            AttributeType::NasIdentifier => "NAS-Identifier",
            AttributeType::AcctStatusType => "Acct-Status-Type",
            AttributeType::AcctSessionId => "Acct-Session-Id",
            AttributeType::ExecProgram => "Exec-Program",
            AttributeType::ExecProgramWait => "Exec-Program-Wait",
            AttributeType::MsChapUserName => "MS-CHAP-User-Name",
            AttributeType::MsChapResponse => "MS-CHAP-Response",
            AttributeType::MsChapChallenge => "MS-CHAP-Challenge",
            AttributeType::MsChap2Response => "MS-CHAP2-Response",
            AttributeType::MsChap2Success => "MS-CHAP2-Success",
        }
    }

    /// Look up an attribute by its dictionary name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "User-Name" => Some(AttributeType::UserName),
            "User-Password" => Some(AttributeType::UserPassword),
            "NAS-IP-Address" => Some(AttributeType::NasIpAddress),
            "NAS-Port" => Some(AttributeType::NasPort),
            "Service-Type" => Some(AttributeType::ServiceType),
            "Filter-Id" => Some(AttributeType::FilterId),
            "Reply-Message" => Some(AttributeType::ReplyMessage),
            "State" => Some(AttributeType::State),
            "Class" => Some(AttributeType::Class),
            "Session-Timeout" => Some(AttributeType::SessionTimeout),
            "Idle-Timeout" => Some(AttributeType::IdleTimeout),
            "Called-Station-Id" => Some(AttributeType::CalledStationId),
            "Calling-Station-Id" => Some(AttributeType::CallingStationId),
            "NAS-Identifier" => Some(AttributeType::NasIdentifier),
            "Acct-Status-Type" => Some(AttributeType::AcctStatusType),
            "Acct-Session-Id" => Some(AttributeType::AcctSessionId),
            "Exec-Program" => Some(AttributeType::ExecProgram),
            "Exec-Program-Wait" => Some(AttributeType::ExecProgramWait),
            "MS-CHAP-User-Name" => Some(AttributeType::MsChapUserName),
            "MS-CHAP-Response" => Some(AttributeType::MsChapResponse),
            "MS-CHAP-Challenge" => Some(AttributeType::MsChapChallenge),
            "MS-CHAP2-Response" => Some(AttributeType::MsChap2Response),
            "MS-CHAP2-Success" => Some(AttributeType::MsChap2Success),
            _ => None,
        }
    }
}
