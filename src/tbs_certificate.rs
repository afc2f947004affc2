//! Assembly and signing of the "To Be Signed" certificate body.

use der::Encode;
use der::asn1::{BitString, OctetString};
use rand_core::{OsRng, RngCore};
use x509_cert::Version;
use x509_cert::certificate::{CertificateInner, TbsCertificateInner};
use x509_cert::serial_number::SerialNumber;

use crate::cert::params::{CertificateDefinition, DistinguishedName, ExtensionParam, Validity};
use crate::cert::{Certificate, SignatureAlgorithm};
use crate::error::EidasKitError;
use crate::key::{KeyPair, PublicKey};

/// The unsigned body of an X.509 certificate.
///
/// Built from a [`CertificateDefinition`] plus the subject public key, then
/// consumed by [`TbsCertificate::sign`]. Any mutation of the body
/// invalidates a previously computed signature, so amendments always rebuild
/// and re-sign.
#[derive(Debug)]
pub struct TbsCertificate {
    /// Certificate serial number
    pub serial_number: Vec<u8>,
    /// Certificate signature algorithm
    pub signature_algorithm: SignatureAlgorithm,
    /// Certificate issuer distinguished name
    pub issuer: DistinguishedName,
    /// Validity window
    pub validity: Validity,
    /// Certificate subject distinguished name
    pub subject: DistinguishedName,
    /// Subject's public key
    pub subject_public_key: PublicKey,
    /// Certificate extensions
    pub extensions: Vec<ExtensionParam>,
}

impl TbsCertificate {
    /// Assembles an unsigned certificate body from a declarative definition.
    ///
    /// Self-issued unless the definition names a distinct issuer. A missing
    /// serial number is filled with a random value from the OS RNG. When the
    /// definition carries PSD2 attributes, the QCStatements extension is
    /// encoded and the paired organizationIdentifier attribute is written
    /// into the subject DN.
    pub fn build(
        definition: &CertificateDefinition,
        public_key: &PublicKey,
        signature_algorithm: SignatureAlgorithm,
    ) -> Result<Self, EidasKitError> {
        if definition.validity.not_after <= definition.validity.not_before {
            return Err(EidasKitError::InvalidValidityPeriod(format!(
                "not_after ({}) must be later than not_before ({})",
                definition.validity.not_after, definition.validity.not_before
            )));
        }

        let mut subject = definition.subject.clone();
        let mut extensions = definition.extensions.clone();
        if let Some(psd2) = &definition.psd2 {
            subject.organization_identifier = Some(psd2.organization_identifier.clone());
            extensions.push(psd2.to_extension()?);
        }

        let serial_number = match &definition.serial_number {
            Some(serial) => serial.clone(),
            None => random_serial(),
        };
        let issuer = definition.issuer.clone().unwrap_or_else(|| subject.clone());

        Ok(Self {
            serial_number,
            signature_algorithm,
            issuer,
            validity: definition.validity,
            subject,
            subject_public_key: public_key.clone(),
            extensions,
        })
    }

    /// Converts the body into the `x509-cert` representation for DER
    /// encoding.
    pub fn to_tbs_certificate_inner(&self) -> Result<TbsCertificateInner, EidasKitError> {
        let algorithm_id: x509_cert::spki::AlgorithmIdentifierOwned =
            self.signature_algorithm.into();

        let mut extensions = Vec::with_capacity(self.extensions.len());
        for ext in &self.extensions {
            extensions.push(x509_cert::ext::Extension {
                extn_id: ext.oid,
                critical: ext.critical,
                extn_value: OctetString::new(ext.value.clone())?,
            });
        }

        Ok(TbsCertificateInner {
            version: Version::V3,
            serial_number: SerialNumber::new(&self.serial_number)?,
            signature: algorithm_id,
            issuer: self.issuer.as_x509_name()?,
            validity: self.validity.to_x509()?,
            subject: self.subject.as_x509_name()?,
            subject_public_key_info: self.subject_public_key.to_spki()?,
            issuer_unique_id: None,
            subject_unique_id: None,
            // RFC 5280: Extensions ::= SEQUENCE SIZE (1..MAX), so an empty
            // list omits the field instead of encoding an empty SEQUENCE.
            extensions: (!extensions.is_empty()).then_some(extensions),
        })
    }

    /// Signs the body, producing a complete certificate.
    ///
    /// The signature is computed over the exact DER encoding of the body;
    /// the same encoding is embedded in the result, so the signature stays
    /// valid for the serialized certificate. Fails with
    /// [`EidasKitError::IncompatibleSignatureAlgorithm`] when the key cannot
    /// produce signatures of the body's declared algorithm.
    pub fn sign(&self, key: &KeyPair) -> Result<Certificate, EidasKitError> {
        let tbs_inner = self.to_tbs_certificate_inner()?;
        let tbs_der = tbs_inner.to_der()?;
        let signature = key.sign(&tbs_der, &self.signature_algorithm)?;

        let inner = CertificateInner {
            tbs_certificate: tbs_inner,
            signature_algorithm: self.signature_algorithm.into(),
            signature: BitString::from_bytes(&signature)?,
        };
        Ok(Certificate { inner })
    }
}

// 16 random bytes with the two top bits forced to 01: positive INTEGER,
// no leading zero, stable encoded length.
fn random_serial() -> Vec<u8> {
    let mut bytes = [0u8; 16];
    OsRng.fill_bytes(&mut bytes);
    bytes[0] = (bytes[0] & 0x3f) | 0x40;
    bytes.to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::KeyPair;
    use time::macros::datetime;

    fn definition() -> CertificateDefinition {
        CertificateDefinition::builder()
            .subject(
                DistinguishedName::builder()
                    .common_name("Test PSP".to_string())
                    .build(),
            )
            .validity(Validity::new(
                datetime!(2024-01-01 0:00 UTC),
                datetime!(2025-01-01 0:00 UTC),
            ))
            .build()
    }

    #[test]
    fn inverted_validity_is_rejected() {
        let key = KeyPair::generate_ecdsa_p256();
        let mut def = definition();
        def.validity = Validity::new(
            datetime!(2025-01-01 0:00 UTC),
            datetime!(2024-01-01 0:00 UTC),
        );
        let err = TbsCertificate::build(
            &def,
            &key.public_key(),
            SignatureAlgorithm::Sha256WithECDSA,
        )
        .unwrap_err();
        assert!(matches!(err, EidasKitError::InvalidValidityPeriod(_)));
    }

    #[test]
    fn missing_serial_is_generated_positive() {
        let key = KeyPair::generate_ecdsa_p256();
        let tbs = TbsCertificate::build(
            &definition(),
            &key.public_key(),
            SignatureAlgorithm::Sha256WithECDSA,
        )
        .unwrap();
        assert_eq!(tbs.serial_number.len(), 16);
        assert_eq!(tbs.serial_number[0] & 0xc0, 0x40);
    }

    #[test]
    fn empty_extension_list_omits_the_field() {
        let key = KeyPair::generate_ecdsa_p256();
        let tbs = TbsCertificate::build(
            &definition(),
            &key.public_key(),
            SignatureAlgorithm::Sha256WithECDSA,
        )
        .unwrap();
        let inner = tbs.to_tbs_certificate_inner().unwrap();
        assert!(inner.extensions.is_none());
    }

    #[test]
    fn sign_rejects_foreign_algorithm() {
        let key = KeyPair::generate_ecdsa_p256();
        let tbs = TbsCertificate::build(
            &definition(),
            &key.public_key(),
            SignatureAlgorithm::Sha256WithRSA,
        )
        .unwrap();
        let err = tbs.sign(&key).unwrap_err();
        assert!(matches!(
            err,
            EidasKitError::IncompatibleSignatureAlgorithm(_)
        ));
    }
}
