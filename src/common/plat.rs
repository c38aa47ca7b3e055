//! Utilities for handling the PLAT prefix that IPv4 destinations are embedded in

use std::str::FromStr;

use clat_map::PLAT_PREFIX_LEN;
use ipnet::Ipv6Net;

/// Parses a PLAT prefix from a string. Only `/96` networks are accepted.
pub fn parse_plat_prefix(string: &str) -> Result<Ipv6Net, String> {
    // First, parse to an IPv6Net struct
    let net = Ipv6Net::from_str(string).map_err(|err| err.to_string())?;

    // Addresses are always embedded in the last 32 bits
    if net.prefix_len() != PLAT_PREFIX_LEN {
        return Err(format!("Prefix length must be {PLAT_PREFIX_LEN}"));
    }

    // Return the parsed network struct
    Ok(net)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plat_prefix() {
        assert_eq!(
            parse_plat_prefix("64:ff9b::/96"),
            Ok("64:ff9b::/96".parse().unwrap())
        );
        assert_eq!(
            parse_plat_prefix("64:ff9b::/64"),
            Err("Prefix length must be 96".to_string())
        );
        assert!(parse_plat_prefix("64:ff9b::").is_err());
    }
}
