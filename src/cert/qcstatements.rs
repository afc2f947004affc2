//! PSD2 QCStatements codec (ETSI EN 319 412-5 / ETSI TS 119 495).
//!
//! The extension value is a DER `SEQUENCE OF QCStatement` holding exactly two
//! statements: the generic qualified-certificate marker (QcCompliance) and
//! the PSD2 statement, whose info is a structure of roles, NCA name and NCA
//! id. The organization identifier is not part of the statement; ETSI TS
//! 119 495 carries it as the subject DN organizationIdentifier attribute, so
//! encode and decode treat the two as a pair.

use std::collections::BTreeSet;
use std::str::FromStr;

use const_oid::ObjectIdentifier;
use der::asn1::Any;
use der::{Decode, Encode, Sequence};

use crate::cert::params::{DistinguishedName, ExtensionParam};
use crate::error::EidasKitError;

/// id-pe-qcStatements (RFC 3739).
pub const ID_PE_QC_STATEMENTS: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.1.3");
/// id-etsi-qcs-QcCompliance (ETSI EN 319 412-5).
pub const ID_ETSI_QCS_QC_COMPLIANCE: ObjectIdentifier = ObjectIdentifier::new_unwrap("0.4.0.1862.1.1");
/// id-etsi-psd2-qcStatement (ETSI TS 119 495).
pub const ID_ETSI_PSD2_QC_STATEMENT: ObjectIdentifier = ObjectIdentifier::new_unwrap("0.4.0.19495.2");

const ID_PSD2_ROLE_PSP_AS: ObjectIdentifier = ObjectIdentifier::new_unwrap("0.4.0.19495.1.1");
const ID_PSD2_ROLE_PSP_PI: ObjectIdentifier = ObjectIdentifier::new_unwrap("0.4.0.19495.1.2");
const ID_PSD2_ROLE_PSP_AI: ObjectIdentifier = ObjectIdentifier::new_unwrap("0.4.0.19495.1.3");
const ID_PSD2_ROLE_PSP_IC: ObjectIdentifier = ObjectIdentifier::new_unwrap("0.4.0.19495.1.4");

/// Payment-service-provider roles defined by ETSI TS 119 495.
///
/// Declaration order is the ETSI arc order; `Ord` follows it, so a
/// `BTreeSet<PspRole>` always iterates roles in the same order regardless of
/// how the caller listed them. That makes the encoded statement byte-stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PspRole {
    /// PSP_AS: account servicing payment service provider.
    AccountServicing,
    /// PSP_PI: payment initiation service provider.
    PaymentInitiation,
    /// PSP_AI: account information service provider.
    AccountInformation,
    /// PSP_IC: issuer of card-based payment instruments.
    CardIssuing,
}

impl PspRole {
    pub const ALL: [PspRole; 4] = [
        PspRole::AccountServicing,
        PspRole::PaymentInitiation,
        PspRole::AccountInformation,
        PspRole::CardIssuing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PspRole::AccountServicing => "PSP_AS",
            PspRole::PaymentInitiation => "PSP_PI",
            PspRole::AccountInformation => "PSP_AI",
            PspRole::CardIssuing => "PSP_IC",
        }
    }

    pub fn oid(&self) -> ObjectIdentifier {
        match self {
            PspRole::AccountServicing => ID_PSD2_ROLE_PSP_AS,
            PspRole::PaymentInitiation => ID_PSD2_ROLE_PSP_PI,
            PspRole::AccountInformation => ID_PSD2_ROLE_PSP_AI,
            PspRole::CardIssuing => ID_PSD2_ROLE_PSP_IC,
        }
    }

    fn from_oid(oid: ObjectIdentifier) -> Option<Self> {
        match oid {
            ID_PSD2_ROLE_PSP_AS => Some(PspRole::AccountServicing),
            ID_PSD2_ROLE_PSP_PI => Some(PspRole::PaymentInitiation),
            ID_PSD2_ROLE_PSP_AI => Some(PspRole::AccountInformation),
            ID_PSD2_ROLE_PSP_IC => Some(PspRole::CardIssuing),
            _ => None,
        }
    }
}

impl FromStr for PspRole {
    type Err = EidasKitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PSP_AS" => Ok(PspRole::AccountServicing),
            "PSP_PI" => Ok(PspRole::PaymentInitiation),
            "PSP_AI" => Ok(PspRole::AccountInformation),
            "PSP_IC" => Ok(PspRole::CardIssuing),
            other => Err(EidasKitError::UnknownRole(other.to_string())),
        }
    }
}

impl std::fmt::Display for PspRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// PSD2 attribute set carried by a qualified certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Psd2Attributes {
    /// Organization identifier, `PSD<country>-<NCA id>-<authorization>` per
    /// ETSI TS 119 495 §5.2.1. Transported verbatim, not format-checked.
    pub organization_identifier: String,
    /// Full name of the national competent authority.
    pub nca_name: String,
    /// Abbreviated unique identifier of the competent authority.
    pub nca_id: String,
    /// Granted roles; never empty when a statement is encoded.
    pub roles: BTreeSet<PspRole>,
}

/// QCStatement ::= SEQUENCE { statementId OID, statementInfo ANY OPTIONAL }
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
struct QcStatement {
    statement_id: ObjectIdentifier,
    #[asn1(optional = "true")]
    statement_info: Option<Any>,
}

/// RoleOfPSP ::= SEQUENCE { roleOfPspOid OID, roleOfPspName UTF8String }
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
struct RoleOfPsp {
    role_oid: ObjectIdentifier,
    role_name: String,
}

/// PSD2QcType ::= SEQUENCE { rolesOfPSP SEQUENCE OF RoleOfPSP,
///                           nCAName UTF8String, nCAId UTF8String }
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
struct Psd2QcType {
    roles: Vec<RoleOfPsp>,
    nca_name: String,
    nca_id: String,
}

impl Psd2Attributes {
    /// Encodes the QCStatements extension value for this attribute set.
    ///
    /// Deterministic: the same attributes always produce identical bytes,
    /// with roles ordered by the enumeration rather than by input order.
    pub fn to_extension_value(&self) -> Result<Vec<u8>, EidasKitError> {
        if self.roles.is_empty() {
            return Err(EidasKitError::InvalidInput(
                "a PSD2 statement requires at least one role".to_string(),
            ));
        }
        let roles = self
            .roles
            .iter()
            .map(|role| RoleOfPsp {
                role_oid: role.oid(),
                role_name: role.as_str().to_string(),
            })
            .collect();
        let info = Psd2QcType {
            roles,
            nca_name: self.nca_name.clone(),
            nca_id: self.nca_id.clone(),
        };
        let statements = vec![
            QcStatement {
                statement_id: ID_ETSI_QCS_QC_COMPLIANCE,
                statement_info: None,
            },
            QcStatement {
                statement_id: ID_ETSI_PSD2_QC_STATEMENT,
                statement_info: Some(Any::encode_from(&info)?),
            },
        ];
        Ok(statements.to_der()?)
    }

    /// The QCStatements extension (non-critical, standard OID) for this
    /// attribute set.
    pub fn to_extension(&self) -> Result<ExtensionParam, EidasKitError> {
        Ok(ExtensionParam {
            oid: ID_PE_QC_STATEMENTS,
            critical: false,
            value: self.to_extension_value()?,
        })
    }

    /// Decodes a QCStatements extension value, pairing it with the subject
    /// DN that carries the organization identifier.
    ///
    /// Returns `Ok(None)` when the extension holds no PSD2 statement.
    pub fn from_extension_value(
        value: &[u8],
        subject: &DistinguishedName,
    ) -> Result<Option<Self>, EidasKitError> {
        let statements = Vec::<QcStatement>::from_der(value)
            .map_err(|e| EidasKitError::MalformedStatement(e.to_string()))?;
        let Some(psd2) = statements
            .iter()
            .find(|s| s.statement_id == ID_ETSI_PSD2_QC_STATEMENT)
        else {
            return Ok(None);
        };
        let info = psd2.statement_info.as_ref().ok_or_else(|| {
            EidasKitError::MalformedStatement("PSD2 statement has no statementInfo".to_string())
        })?;
        let qc_type: Psd2QcType = info
            .decode_as()
            .map_err(|e| EidasKitError::MalformedStatement(e.to_string()))?;
        let mut roles = BTreeSet::new();
        for role in &qc_type.roles {
            let parsed = PspRole::from_oid(role.role_oid).ok_or_else(|| {
                EidasKitError::MalformedStatement(format!(
                    "unknown PSD2 role OID {}",
                    role.role_oid
                ))
            })?;
            roles.insert(parsed);
        }
        if roles.is_empty() {
            return Err(EidasKitError::MalformedStatement(
                "PSD2 statement has an empty role list".to_string(),
            ));
        }
        let organization_identifier = subject
            .organization_identifier
            .clone()
            .ok_or(EidasKitError::MissingOrganizationIdentifier)?;
        Ok(Some(Psd2Attributes {
            organization_identifier,
            nca_name: qc_type.nca_name.clone(),
            nca_id: qc_type.nca_id.clone(),
            roles,
        }))
    }
}

/// Parse a list of role strings into a role set; duplicates collapse.
pub fn parse_roles<I, S>(names: I) -> Result<BTreeSet<PspRole>, EidasKitError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut roles = BTreeSet::new();
    for name in names {
        roles.insert(name.as_ref().parse::<PspRole>()?);
    }
    Ok(roles)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Psd2Attributes {
        Psd2Attributes {
            organization_identifier: "PSDBE-NBB-1234".to_string(),
            nca_name: "National Bank of Belgium".to_string(),
            nca_id: "NBB".to_string(),
            roles: parse_roles(["PSP_PI", "PSP_AI"]).unwrap(),
        }
    }

    fn subject_with_org_id() -> DistinguishedName {
        DistinguishedName::builder()
            .common_name("Test PSP".to_string())
            .organization_identifier("PSDBE-NBB-1234".to_string())
            .build()
    }

    #[test]
    fn role_table_is_exhaustive() {
        for role in PspRole::ALL {
            assert_eq!(role.as_str().parse::<PspRole>().unwrap(), role);
            assert_eq!(PspRole::from_oid(role.oid()).unwrap(), role);
        }
    }

    #[test]
    fn unknown_role_string_is_rejected() {
        let err = "PSP_XX".parse::<PspRole>().unwrap_err();
        assert!(matches!(err, EidasKitError::UnknownRole(name) if name == "PSP_XX"));
    }

    #[test]
    fn encoding_is_deterministic() {
        let attrs = sample();
        assert_eq!(
            attrs.to_extension_value().unwrap(),
            attrs.to_extension_value().unwrap()
        );
    }

    #[test]
    fn role_input_order_does_not_change_encoding() {
        let mut a = sample();
        a.roles = parse_roles(["PSP_PI", "PSP_AS"]).unwrap();
        let mut b = sample();
        b.roles = parse_roles(["PSP_AS", "PSP_PI"]).unwrap();
        assert_eq!(
            a.to_extension_value().unwrap(),
            b.to_extension_value().unwrap()
        );
    }

    #[test]
    fn encode_decode_round_trip() {
        let attrs = sample();
        let value = attrs.to_extension_value().unwrap();
        let decoded = Psd2Attributes::from_extension_value(&value, &subject_with_org_id())
            .unwrap()
            .unwrap();
        assert_eq!(decoded, attrs);
    }

    #[test]
    fn empty_role_set_cannot_be_encoded() {
        let mut attrs = sample();
        attrs.roles.clear();
        assert!(attrs.to_extension_value().is_err());
    }

    #[test]
    fn decode_without_org_id_attribute_fails() {
        let attrs = sample();
        let value = attrs.to_extension_value().unwrap();
        let bare_subject = DistinguishedName::builder()
            .common_name("Test PSP".to_string())
            .build();
        let err = Psd2Attributes::from_extension_value(&value, &bare_subject).unwrap_err();
        assert!(matches!(err, EidasKitError::MissingOrganizationIdentifier));
    }

    #[test]
    fn garbage_extension_value_is_malformed() {
        let err = Psd2Attributes::from_extension_value(&[0xde, 0xad], &subject_with_org_id())
            .unwrap_err();
        assert!(matches!(err, EidasKitError::MalformedStatement(_)));
    }

    #[test]
    fn compliance_marker_precedes_psd2_statement() {
        let value = sample().to_extension_value().unwrap();
        let statements = Vec::<QcStatement>::from_der(&value).unwrap();
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0].statement_id, ID_ETSI_QCS_QC_COMPLIANCE);
        assert_eq!(statements[1].statement_id, ID_ETSI_PSD2_QC_STATEMENT);
    }
}
