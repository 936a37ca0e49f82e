//! Conversion between canonical values and wire resource records
//!
//! Each [`RecordKind`] has one codec. Declared literals go through
//! [`RecordCodec::canonicalize`] before they are diffed, so that a removal
//! built from a declared value matches the record the server reports back.

use super::{RecordKind, RecordValue, ServiceTarget};
use crate::error::{Error, Result};
use hickory_proto::rr::rdata::{A, AAAA, CNAME, SRV};
use hickory_proto::rr::{Name, RData, Record};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Per-kind translation between values and wire records
pub trait RecordCodec: Send + Sync {
    /// Kind handled by this codec
    fn kind(&self) -> RecordKind;

    /// Turn a declared literal into a canonical value
    fn canonicalize(&self, literal: &str) -> Result<RecordValue>;

    /// Render a value as record data
    fn encode(&self, value: &RecordValue) -> Result<RData>;

    /// Extract the value and TTL carried by an answer record
    fn decode(&self, record: &Record) -> Result<(RecordValue, u32)>;
}

/// Codec for A and AAAA records
#[derive(Debug, Clone, Copy)]
pub struct AddressCodec {
    ipv6: bool,
}

pub(crate) static IPV4_CODEC: AddressCodec = AddressCodec { ipv6: false };
pub(crate) static IPV6_CODEC: AddressCodec = AddressCodec { ipv6: true };

impl AddressCodec {
    fn family(&self) -> &'static str {
        if self.ipv6 { "IPv6" } else { "IPv4" }
    }
}

impl RecordCodec for AddressCodec {
    fn kind(&self) -> RecordKind {
        if self.ipv6 {
            RecordKind::Aaaa
        } else {
            RecordKind::A
        }
    }

    fn canonicalize(&self, literal: &str) -> Result<RecordValue> {
        let stripped = strip_leading_zeros(literal.trim());
        let ip = if self.ipv6 {
            stripped.parse::<Ipv6Addr>().map(IpAddr::V6)
        } else {
            stripped.parse::<Ipv4Addr>().map(IpAddr::V4)
        }
        .map_err(|e| Error::encoding(literal, format!("not an {} address: {e}", self.family())))?;

        Ok(RecordValue::Address(ip))
    }

    fn encode(&self, value: &RecordValue) -> Result<RData> {
        match (self.ipv6, value) {
            (false, RecordValue::Address(IpAddr::V4(ip))) => Ok(RData::A(A(*ip))),
            (true, RecordValue::Address(IpAddr::V6(ip))) => Ok(RData::AAAA(AAAA(*ip))),
            _ => Err(Error::encoding(
                value.to_string(),
                format!("expected an {} address", self.family()),
            )),
        }
    }

    fn decode(&self, record: &Record) -> Result<(RecordValue, u32)> {
        let ip = match (self.ipv6, record.data()) {
            (false, Some(RData::A(a))) => IpAddr::V4(a.0),
            (true, Some(RData::AAAA(aaaa))) => IpAddr::V6(aaaa.0),
            _ => {
                return Err(Error::decode(
                    record,
                    format!("not an {} record", self.kind()),
                ));
            }
        };
        Ok((RecordValue::Address(ip), record.ttl()))
    }
}

/// Codec for CNAME records
#[derive(Debug, Clone, Copy)]
pub struct CanonicalNameCodec;

impl RecordCodec for CanonicalNameCodec {
    fn kind(&self) -> RecordKind {
        RecordKind::Cname
    }

    fn canonicalize(&self, literal: &str) -> Result<RecordValue> {
        parse_fqdn(literal.trim()).map(RecordValue::CanonicalName)
    }

    fn encode(&self, value: &RecordValue) -> Result<RData> {
        match value {
            RecordValue::CanonicalName(name) => Ok(RData::CNAME(CNAME(name.clone()))),
            other => Err(Error::encoding(other.to_string(), "expected a domain name")),
        }
    }

    fn decode(&self, record: &Record) -> Result<(RecordValue, u32)> {
        match record.data() {
            Some(RData::CNAME(cname)) => {
                Ok((RecordValue::CanonicalName(cname.0.clone()), record.ttl()))
            }
            _ => Err(Error::decode(record, "not a CNAME record")),
        }
    }
}

/// Codec for SRV records
///
/// Declared literals use the presentation form `priority weight port target`.
#[derive(Debug, Clone, Copy)]
pub struct ServiceCodec;

impl RecordCodec for ServiceCodec {
    fn kind(&self) -> RecordKind {
        RecordKind::Srv
    }

    fn canonicalize(&self, literal: &str) -> Result<RecordValue> {
        let fields: Vec<&str> = literal.split_whitespace().collect();
        let [priority, weight, port, target] = fields.as_slice() else {
            return Err(Error::encoding(
                literal,
                "expected `priority weight port target`",
            ));
        };

        let number = |field: &str, what: &str| {
            field
                .parse::<u16>()
                .map_err(|e| Error::encoding(literal, format!("invalid {what}: {e}")))
        };

        Ok(RecordValue::Service(ServiceTarget {
            priority: number(*priority, "priority")?,
            weight: number(*weight, "weight")?,
            port: number(*port, "port")?,
            target: parse_fqdn(*target)?,
        }))
    }

    fn encode(&self, value: &RecordValue) -> Result<RData> {
        match value {
            RecordValue::Service(srv) => Ok(RData::SRV(SRV::new(
                srv.priority,
                srv.weight,
                srv.port,
                srv.target.clone(),
            ))),
            other => Err(Error::encoding(other.to_string(), "expected a service tuple")),
        }
    }

    fn decode(&self, record: &Record) -> Result<(RecordValue, u32)> {
        match record.data() {
            Some(RData::SRV(srv)) => Ok((
                RecordValue::Service(ServiceTarget {
                    priority: srv.priority(),
                    weight: srv.weight(),
                    port: srv.port(),
                    target: srv.target().clone(),
                }),
                record.ttl(),
            )),
            _ => Err(Error::decode(record, "not an SRV record")),
        }
    }
}

/// Parse an absolute domain name
pub(crate) fn parse_fqdn(literal: &str) -> Result<Name> {
    if literal.is_empty() {
        return Err(Error::encoding(literal, "empty domain name"));
    }
    let name = Name::from_ascii(literal).map_err(|e| Error::encoding(literal, e))?;
    if !name.is_fqdn() {
        return Err(Error::encoding(
            literal,
            "domain name must be fully qualified (end with '.')",
        ));
    }
    Ok(name)
}

/// Drop leading zeros from every dotted-decimal octet
///
/// Servers store `192.168.001.010` as `192.168.1.10`; a removal has to name
/// the stored form to match. Segments that are not purely decimal (IPv6
/// groups preceding an embedded IPv4 tail) are left untouched.
pub(crate) fn strip_leading_zeros(literal: &str) -> String {
    literal
        .split('.')
        .map(|segment| {
            if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
                let trimmed = segment.trim_start_matches('0');
                if trimmed.is_empty() { "0" } else { trimmed }
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join(".")
}

#[cfg(test)]
mod tests {
    use super::*;
    use hickory_proto::rr::RecordType;

    fn answer(rdata: RData, ttl: u32) -> Record {
        Record::from_rdata(Name::from_ascii("host.example.com.").unwrap(), ttl, rdata)
    }

    #[test]
    fn strips_zero_padding_from_octets() {
        assert_eq!(strip_leading_zeros("192.168.001.010"), "192.168.1.10");
        assert_eq!(strip_leading_zeros("10.000.0.00"), "10.0.0.0");
        assert_eq!(strip_leading_zeros("::ffff:192.000.002.001"), "::ffff:192.0.2.1");
        assert_eq!(strip_leading_zeros("2001:0db8::0001"), "2001:0db8::0001");
    }

    #[test]
    fn canonical_address_renders_without_padding() {
        let value = IPV4_CODEC.canonicalize("192.168.001.010").unwrap();
        assert_eq!(value.to_string(), "192.168.1.10");

        let rdata = IPV4_CODEC.encode(&value).unwrap();
        assert_eq!(rdata.to_string(), "192.168.1.10");

        let v6 = IPV6_CODEC.canonicalize("2001:0DB8:0000::0001").unwrap();
        assert_eq!(v6.to_string(), "2001:db8::1");
    }

    #[test]
    fn address_codec_rejects_wrong_family_and_garbage() {
        assert!(matches!(
            IPV4_CODEC.canonicalize("2001:db8::1"),
            Err(Error::Encoding { .. })
        ));
        assert!(matches!(
            IPV4_CODEC.canonicalize("192.0.2.300"),
            Err(Error::Encoding { .. })
        ));

        let v6 = RecordValue::Address("2001:db8::1".parse().unwrap());
        match IPV4_CODEC.encode(&v6) {
            Err(Error::Encoding { value, .. }) => assert_eq!(value, "2001:db8::1"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn every_kind_round_trips() {
        let cases: Vec<(RecordKind, &str)> = vec![
            (RecordKind::A, "192.0.2.1"),
            (RecordKind::Aaaa, "2001:db8::53"),
            (RecordKind::Cname, "target.example.net."),
            (RecordKind::Srv, "10 60 5060 sip.example.com."),
        ];

        for (kind, literal) in cases {
            let codec = kind.codec();
            let value = codec.canonicalize(literal).unwrap();
            let record = answer(codec.encode(&value).unwrap(), 3600);
            assert_eq!(record.record_type(), kind.record_type());

            let (decoded, ttl) = codec.decode(&record).unwrap();
            assert_eq!(decoded, value, "{kind} value did not survive the wire");
            assert_eq!(ttl, 3600);
        }
    }

    #[test]
    fn canonical_name_requires_absolute_name() {
        assert!(CanonicalNameCodec.canonicalize("target.example.net").is_err());
        assert!(CanonicalNameCodec.canonicalize("").is_err());
        assert!(CanonicalNameCodec.canonicalize("target.example.net.").is_ok());
    }

    #[test]
    fn service_literal_needs_four_fields() {
        assert!(ServiceCodec.canonicalize("10 60 sip.example.com.").is_err());
        assert!(ServiceCodec.canonicalize("10 60 70000 sip.example.com.").is_err());

        let value = ServiceCodec.canonicalize("10 60 5060 sip.example.com.").unwrap();
        assert_eq!(value.to_string(), "10 60 5060 sip.example.com.");
    }

    #[test]
    fn decode_rejects_answers_of_another_type() {
        let cname = answer(
            RData::CNAME(CNAME(Name::from_ascii("other.example.com.").unwrap())),
            300,
        );
        assert_eq!(cname.record_type(), RecordType::CNAME);
        assert!(matches!(
            IPV4_CODEC.decode(&cname),
            Err(Error::Decode { .. })
        ));
        assert!(matches!(ServiceCodec.decode(&cname), Err(Error::Decode { .. })));
    }
}
