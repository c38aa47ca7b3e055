use lazy_static::lazy_static;

pub mod label_values {
    /// IPv4 protocol
    pub const PROTOCOL_IPV4: &str = "ipv4";
    /// IPv6 protocol
    pub const PROTOCOL_IPV6: &str = "ipv6";
    /// TCP protocol
    pub const PROTOCOL_TCP: &str = "tcp";
    /// UDP protocol
    pub const PROTOCOL_UDP: &str = "udp";

    /// Dropped status
    pub const STATUS_DROPPED: &str = "dropped";
    /// Translated status
    pub const STATUS_TRANSLATED: &str = "translated";

    /// Header failed validation
    pub const REASON_MALFORMED: &str = "malformed";
    /// Protocol the engine does not translate
    pub const REASON_UNSUPPORTED: &str = "unsupported";
    /// No enabled mapping covers the packet
    pub const REASON_UNMAPPED: &str = "unmapped";
    /// Not enough headroom to grow the header
    pub const REASON_BUFFER: &str = "buffer";
}

lazy_static! {
    /// Counter for the number of packets processed
    pub static ref PACKET_COUNTER: prometheus::IntCounterVec = prometheus::register_int_counter_vec!(
        "clat_packets",
        "Number of packets processed",
        &["protocol", "status"]
    ).unwrap();

    /// Counter for the reasons packets were dropped
    pub static ref DROP_COUNTER: prometheus::IntCounterVec = prometheus::register_int_counter_vec!(
        "clat_packets_dropped",
        "Number of packets dropped, by reason",
        &["protocol", "reason"]
    ).unwrap();
}
