//! Re-signing workflow that amends a certificate's PSD2 attributes.
//!
//! Loads an existing certificate and its private key, replaces the
//! QCStatements extension (and the paired subject organizationIdentifier
//! attribute) with the merged attribute set, then rebuilds and re-signs with
//! the same key. Every other field of the certificate is preserved.

use std::collections::BTreeSet;

use der::Encode;

use crate::cert::Certificate;
use crate::cert::qcstatements::{ID_PE_QC_STATEMENTS, Psd2Attributes, PspRole};
use crate::error::EidasKitError;
use crate::key::KeyPair;

/// Caller-supplied PSD2 changes. `None` keeps the value from the
/// certificate's existing statement; omission never silently drops a
/// previously set value.
#[derive(Debug, Clone, Default)]
pub struct Psd2Amendment {
    pub organization_identifier: Option<String>,
    pub nca_name: Option<String>,
    pub nca_id: Option<String>,
    pub roles: Option<BTreeSet<PspRole>>,
}

/// Amends the PSD2 attributes of a PEM certificate, re-signing with the
/// supplied private key.
///
/// All-or-nothing: any failure returns an error and produces no output. The
/// key must be the one whose public half is embedded in the certificate;
/// anything else fails with [`EidasKitError::KeyCertificateMismatch`] before
/// any re-signing happens.
pub fn amend_psd2(
    cert_pem: &str,
    key_pem: &str,
    passphrase: Option<&str>,
    amendment: &Psd2Amendment,
) -> Result<String, EidasKitError> {
    let certificate = Certificate::from_pem(cert_pem)?;
    let key = KeyPair::from_pkcs8_pem(key_pem, passphrase)?;

    // Integrity gate: refuse to re-sign with an unrelated key.
    let embedded_spki = certificate
        .inner
        .tbs_certificate
        .subject_public_key_info
        .to_der()?;
    if embedded_spki != key.public_key().to_spki_der()? {
        return Err(EidasKitError::KeyCertificateMismatch);
    }

    let mut definition = certificate.to_definition()?;
    let existing = definition.psd2.take();
    // A QCStatements extension without a PSD2 statement survives
    // to_definition opaquely; drop it so the rebuild holds exactly one.
    definition
        .extensions
        .retain(|ext| ext.oid != ID_PE_QC_STATEMENTS);
    definition.psd2 = Some(merge(amendment, existing)?);

    let amended = Certificate::create(&definition, &key)?;
    amended.to_pem()
}

fn merge(
    amendment: &Psd2Amendment,
    existing: Option<Psd2Attributes>,
) -> Result<Psd2Attributes, EidasKitError> {
    let (prev_org, prev_name, prev_id, prev_roles) = match existing {
        Some(prev) => (
            Some(prev.organization_identifier),
            Some(prev.nca_name),
            Some(prev.nca_id),
            Some(prev.roles),
        ),
        None => (None, None, None, None),
    };

    let organization_identifier = amendment
        .organization_identifier
        .clone()
        .or(prev_org)
        .ok_or(EidasKitError::MissingOrganizationIdentifier)?;
    let nca_name = amendment.nca_name.clone().or(prev_name).ok_or_else(|| {
        EidasKitError::InvalidInput(
            "NCA name is required when the certificate has no PSD2 statement".to_string(),
        )
    })?;
    let nca_id = amendment.nca_id.clone().or(prev_id).ok_or_else(|| {
        EidasKitError::InvalidInput(
            "NCA id is required when the certificate has no PSD2 statement".to_string(),
        )
    })?;
    let roles = amendment.roles.clone().or(prev_roles).ok_or_else(|| {
        EidasKitError::InvalidInput(
            "at least one role is required when the certificate has no PSD2 statement".to_string(),
        )
    })?;
    if roles.is_empty() {
        return Err(EidasKitError::InvalidInput(
            "the amended role set must not be empty".to_string(),
        ));
    }

    Ok(Psd2Attributes {
        organization_identifier,
        nca_name,
        nca_id,
        roles,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert::qcstatements::parse_roles;

    fn existing() -> Psd2Attributes {
        Psd2Attributes {
            organization_identifier: "PSDBE-NBB-1234".to_string(),
            nca_name: "National Bank of Belgium".to_string(),
            nca_id: "NBB".to_string(),
            roles: parse_roles(["PSP_PI"]).unwrap(),
        }
    }

    #[test]
    fn omitted_fields_default_from_existing_statement() {
        let amendment = Psd2Amendment {
            roles: Some(parse_roles(["PSP_PI", "PSP_AS"]).unwrap()),
            ..Default::default()
        };
        let merged = merge(&amendment, Some(existing())).unwrap();
        assert_eq!(merged.organization_identifier, "PSDBE-NBB-1234");
        assert_eq!(merged.nca_name, "National Bank of Belgium");
        assert_eq!(merged.nca_id, "NBB");
        assert_eq!(merged.roles, parse_roles(["PSP_AS", "PSP_PI"]).unwrap());
    }

    #[test]
    fn amendment_overrides_existing_values() {
        let amendment = Psd2Amendment {
            nca_name: Some("De Nederlandsche Bank".to_string()),
            nca_id: Some("DNB".to_string()),
            ..Default::default()
        };
        let merged = merge(&amendment, Some(existing())).unwrap();
        assert_eq!(merged.nca_name, "De Nederlandsche Bank");
        assert_eq!(merged.nca_id, "DNB");
        assert_eq!(merged.roles, parse_roles(["PSP_PI"]).unwrap());
    }

    #[test]
    fn fresh_statement_requires_all_fields() {
        let amendment = Psd2Amendment {
            roles: Some(parse_roles(["PSP_PI"]).unwrap()),
            ..Default::default()
        };
        let err = merge(&amendment, None).unwrap_err();
        assert!(matches!(err, EidasKitError::MissingOrganizationIdentifier));
    }

    #[test]
    fn empty_amended_role_set_is_rejected() {
        let amendment = Psd2Amendment {
            roles: Some(BTreeSet::new()),
            ..Default::default()
        };
        let err = merge(&amendment, Some(existing())).unwrap_err();
        assert!(matches!(err, EidasKitError::InvalidInput(_)));
    }
}
