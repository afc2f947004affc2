use bon::Builder;
use const_oid::ObjectIdentifier;
use der::asn1::{Any, PrintableStringRef, SetOfVec, Utf8StringRef};
use time::{Duration, OffsetDateTime};
use x509_cert::attr::AttributeTypeAndValue;
use x509_cert::name::{RdnSequence, RelativeDistinguishedName};

use crate::cert::SignatureAlgorithm;
use crate::cert::qcstatements::Psd2Attributes;
use crate::error::EidasKitError;

/// Subject DN attribute OIDs (X.520). `organizationIdentifier` is the
/// attribute ETSI TS 119 495 pairs with the PSD2 QCStatement.
const AT_COMMON_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.3");
const AT_COUNTRY: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.6");
const AT_LOCALITY: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.7");
const AT_STATE: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.8");
const AT_ORGANIZATION: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.10");
const AT_ORGANIZATION_UNIT: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.11");
pub const AT_ORGANIZATION_IDENTIFIER: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.97");

/// Declarative input for certificate creation.
///
/// Constructed once by the caller (typically from a parsed JSON definition)
/// and consumed by the builder. `issuer` defaults to the subject
/// (self-issued), `serial_number` to a random value, and
/// `signature_algorithm` to the signing key's natural algorithm.
#[derive(Clone, Debug, Builder)]
pub struct CertificateDefinition {
    pub subject: DistinguishedName,
    pub issuer: Option<DistinguishedName>,
    pub validity: Validity,
    pub serial_number: Option<Vec<u8>>,
    pub signature_algorithm: Option<SignatureAlgorithm>,
    pub psd2: Option<Psd2Attributes>,
    #[builder(default)]
    pub extensions: Vec<ExtensionParam>,
}

/// Distinguished name carried in a certificate's subject or issuer.
#[derive(Clone, Debug, Builder, Default, PartialEq, Eq)]
pub struct DistinguishedName {
    pub common_name: String,
    pub country: Option<String>,
    pub state: Option<String>,
    pub locality: Option<String>,
    pub organization: Option<String>,
    pub organization_unit: Option<String>,
    /// X.520 organizationIdentifier (OID 2.5.4.97); travels in lockstep with
    /// the PSD2 QCStatement and carries the `PSD<country>-<NCA>-<number>`
    /// string. The engine transports the value without validating its shape.
    pub organization_identifier: Option<String>,
}

impl DistinguishedName {
    /// Converts the distinguished name into an X.509 RDN sequence.
    ///
    /// Attribute order is fixed (C, ST, L, O, OU, organizationIdentifier,
    /// CN) so that encoding the same name twice is byte-identical. Country
    /// is encoded as PrintableString, everything else as UTF8String.
    pub fn as_x509_name(&self) -> Result<RdnSequence, EidasKitError> {
        let mut rdns = Vec::new();
        if let Some(country) = &self.country {
            rdns.push(printable_rdn(AT_COUNTRY, country)?);
        }
        if let Some(state) = &self.state {
            rdns.push(utf8_rdn(AT_STATE, state)?);
        }
        if let Some(locality) = &self.locality {
            rdns.push(utf8_rdn(AT_LOCALITY, locality)?);
        }
        if let Some(organization) = &self.organization {
            rdns.push(utf8_rdn(AT_ORGANIZATION, organization)?);
        }
        if let Some(unit) = &self.organization_unit {
            rdns.push(utf8_rdn(AT_ORGANIZATION_UNIT, unit)?);
        }
        if let Some(org_id) = &self.organization_identifier {
            rdns.push(utf8_rdn(AT_ORGANIZATION_IDENTIFIER, org_id)?);
        }
        rdns.push(utf8_rdn(AT_COMMON_NAME, &self.common_name)?);
        Ok(RdnSequence(rdns))
    }

    /// Creates a `DistinguishedName` from an X.509 RDN sequence.
    pub fn from_x509_name(x509dn: &RdnSequence) -> Self {
        let mut dn = DistinguishedName::default();
        for rdn in x509dn.0.iter() {
            for attr in rdn.0.iter() {
                let Some(value) = decode_directory_string(&attr.value) else {
                    continue;
                };
                match attr.oid {
                    AT_COMMON_NAME => dn.common_name = value,
                    AT_COUNTRY => dn.country = Some(value),
                    AT_STATE => dn.state = Some(value),
                    AT_LOCALITY => dn.locality = Some(value),
                    AT_ORGANIZATION => dn.organization = Some(value),
                    AT_ORGANIZATION_UNIT => dn.organization_unit = Some(value),
                    AT_ORGANIZATION_IDENTIFIER => dn.organization_identifier = Some(value),
                    _ => {}
                }
            }
        }
        dn
    }
}

impl std::fmt::Display for DistinguishedName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CN={}", self.common_name)?;
        if let Some(v) = &self.organization_unit {
            write!(f, ", OU={v}")?;
        }
        if let Some(v) = &self.organization {
            write!(f, ", O={v}")?;
        }
        if let Some(v) = &self.organization_identifier {
            write!(f, ", organizationIdentifier={v}")?;
        }
        if let Some(v) = &self.locality {
            write!(f, ", L={v}")?;
        }
        if let Some(v) = &self.state {
            write!(f, ", ST={v}")?;
        }
        if let Some(v) = &self.country {
            write!(f, ", C={v}")?;
        }
        Ok(())
    }
}

fn utf8_rdn(oid: ObjectIdentifier, value: &str) -> Result<RelativeDistinguishedName, EidasKitError> {
    let string = Utf8StringRef::new(value)?;
    rdn_from(oid, Any::encode_from(&string)?)
}

fn printable_rdn(
    oid: ObjectIdentifier,
    value: &str,
) -> Result<RelativeDistinguishedName, EidasKitError> {
    let string = PrintableStringRef::new(value)?;
    rdn_from(oid, Any::encode_from(&string)?)
}

fn rdn_from(oid: ObjectIdentifier, value: Any) -> Result<RelativeDistinguishedName, EidasKitError> {
    let set = SetOfVec::try_from(vec![AttributeTypeAndValue { oid, value }])?;
    Ok(RelativeDistinguishedName(set))
}

fn decode_directory_string(value: &Any) -> Option<String> {
    if let Ok(s) = value.decode_as::<Utf8StringRef<'_>>() {
        return Some(s.to_string());
    }
    if let Ok(s) = value.decode_as::<PrintableStringRef<'_>>() {
        return Some(s.to_string());
    }
    if let Ok(s) = value.decode_as::<der::asn1::Ia5StringRef<'_>>() {
        return Some(s.to_string());
    }
    None
}

/// Certificate validity period.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Validity {
    pub not_before: OffsetDateTime,
    pub not_after: OffsetDateTime,
}

impl Validity {
    pub fn new(not_before: OffsetDateTime, not_after: OffsetDateTime) -> Self {
        Self {
            not_before,
            not_after,
        }
    }

    /// Creates a validity period starting now for the given number of days.
    pub fn for_days(days: i64) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            not_before: now,
            not_after: now + Duration::days(days),
        }
    }

    pub(crate) fn to_x509(&self) -> Result<x509_cert::time::Validity, EidasKitError> {
        Ok(x509_cert::time::Validity {
            not_before: to_x509_time(self.not_before)?,
            not_after: to_x509_time(self.not_after)?,
        })
    }

    pub(crate) fn from_x509(validity: &x509_cert::time::Validity) -> Self {
        Self {
            not_before: from_x509_time(&validity.not_before),
            not_after: from_x509_time(&validity.not_after),
        }
    }
}

// RFC 5280: UTCTime for dates through 2049, GeneralizedTime from 2050 on.
fn to_x509_time(t: OffsetDateTime) -> Result<x509_cert::time::Time, EidasKitError> {
    if t.year() < 2050 {
        Ok(x509_cert::time::Time::UtcTime(
            der::asn1::UtcTime::from_system_time(t.into())?,
        ))
    } else {
        Ok(x509_cert::time::Time::GeneralTime(
            der::asn1::GeneralizedTime::from_system_time(t.into())?,
        ))
    }
}

fn from_x509_time(t: &x509_cert::time::Time) -> OffsetDateTime {
    match t {
        x509_cert::time::Time::UtcTime(ut) => OffsetDateTime::from(ut.to_system_time()),
        x509_cert::time::Time::GeneralTime(gt) => OffsetDateTime::from(gt.to_system_time()),
    }
}

/// Represents an X.509 extension as an OID, criticality flag and DER value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtensionParam {
    pub oid: ObjectIdentifier,
    pub critical: bool,
    /// DER-encoded extension value
    pub value: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dn_round_trip() {
        let dn = DistinguishedName::builder()
            .common_name("Test PSP".to_string())
            .country("BE".to_string())
            .organization("Example Payments".to_string())
            .organization_identifier("PSDBE-NBB-1234".to_string())
            .build();
        let name = dn.as_x509_name().unwrap();
        assert_eq!(DistinguishedName::from_x509_name(&name), dn);
    }

    #[test]
    fn dn_encoding_is_deterministic() {
        use der::Encode;
        let dn = DistinguishedName::builder()
            .common_name("Test PSP".to_string())
            .country("BE".to_string())
            .build();
        let a = dn.as_x509_name().unwrap().to_der().unwrap();
        let b = dn.as_x509_name().unwrap().to_der().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn validity_x509_round_trip() {
        let validity = Validity::new(
            time::macros::datetime!(2024-01-01 0:00 UTC),
            time::macros::datetime!(2025-01-01 0:00 UTC),
        );
        let x509 = validity.to_x509().unwrap();
        assert_eq!(Validity::from_x509(&x509), validity);
    }
}
