pub mod params;
pub mod qcstatements;

use std::fmt::Write as _;

use der::{Decode, Encode, EncodePem};
use x509_cert::certificate::CertificateInner;

use crate::error::EidasKitError;
pub type Result<T> = std::result::Result<T, EidasKitError>;

use crate::key::{KeyPair, PublicKey};
use crate::tbs_certificate::TbsCertificate;
use params::{CertificateDefinition, DistinguishedName, ExtensionParam, Validity};
use qcstatements::{ID_PE_QC_STATEMENTS, Psd2Attributes};

/// Represents the supported signature algorithms for certificates.
///
/// This enum provides a mapping to the corresponding OIDs for each algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    /// SHA-256 with RSA encryption.
    Sha256WithRSA,
    /// SHA-256 with ECDSA.
    Sha256WithECDSA,
    /// SHA-384 with ECDSA.
    Sha384WithECDSA,
    /// Ed25519.
    Ed25519,
}

impl From<SignatureAlgorithm> for x509_cert::spki::AlgorithmIdentifierOwned {
    fn from(value: SignatureAlgorithm) -> Self {
        match value {
            // RFC 5912 requires an explicit NULL parameter for RSA.
            SignatureAlgorithm::Sha256WithRSA => x509_cert::spki::AlgorithmIdentifierOwned {
                oid: const_oid::db::rfc5912::SHA_256_WITH_RSA_ENCRYPTION,
                parameters: Some(der::Any::from(der::AnyRef::NULL)),
            },
            SignatureAlgorithm::Sha256WithECDSA => x509_cert::spki::AlgorithmIdentifierOwned {
                oid: const_oid::db::rfc5912::ECDSA_WITH_SHA_256,
                parameters: None,
            },
            SignatureAlgorithm::Sha384WithECDSA => x509_cert::spki::AlgorithmIdentifierOwned {
                oid: const_oid::db::rfc5912::ECDSA_WITH_SHA_384,
                parameters: None,
            },
            SignatureAlgorithm::Ed25519 => x509_cert::spki::AlgorithmIdentifierOwned {
                oid: const_oid::db::rfc8410::ID_ED_25519,
                parameters: None,
            },
        }
    }
}

impl SignatureAlgorithm {
    /// The natural signature algorithm for a signing key.
    pub fn default_for(key: &KeyPair) -> Self {
        match key {
            KeyPair::Rsa { .. } => SignatureAlgorithm::Sha256WithRSA,
            KeyPair::EcdsaP256 { .. } => SignatureAlgorithm::Sha256WithECDSA,
            KeyPair::EcdsaP384 { .. } => SignatureAlgorithm::Sha384WithECDSA,
            KeyPair::Ed25519 { .. } => SignatureAlgorithm::Ed25519,
        }
    }

    pub fn from_oid(oid: const_oid::ObjectIdentifier) -> Result<Self> {
        match oid {
            const_oid::db::rfc5912::SHA_256_WITH_RSA_ENCRYPTION => {
                Ok(SignatureAlgorithm::Sha256WithRSA)
            }
            const_oid::db::rfc5912::ECDSA_WITH_SHA_256 => Ok(SignatureAlgorithm::Sha256WithECDSA),
            const_oid::db::rfc5912::ECDSA_WITH_SHA_384 => Ok(SignatureAlgorithm::Sha384WithECDSA),
            const_oid::db::rfc8410::ID_ED_25519 => Ok(SignatureAlgorithm::Ed25519),
            other => Err(EidasKitError::UnsupportedAlgorithm(format!(
                "signature algorithm {other}"
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SignatureAlgorithm::Sha256WithRSA => "sha256WithRSAEncryption",
            SignatureAlgorithm::Sha256WithECDSA => "ecdsa-with-SHA256",
            SignatureAlgorithm::Sha384WithECDSA => "ecdsa-with-SHA384",
            SignatureAlgorithm::Ed25519 => "Ed25519",
        }
    }
}

/// An immutable signed X.509 certificate.
///
/// Created by [`Certificate::create`] or parsed from PEM; never mutated in
/// place. Amending PSD2 attributes produces a new certificate via
/// [`crate::amend::amend_psd2`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    /// The inner representation of the certificate.
    pub inner: CertificateInner,
}

impl Certificate {
    /// Builds and signs a certificate from a declarative definition.
    ///
    /// Self-signed unless the definition names a distinct issuer; the
    /// signature algorithm defaults to the signing key's natural one.
    pub fn create(definition: &CertificateDefinition, key: &KeyPair) -> Result<Self> {
        let algorithm = definition
            .signature_algorithm
            .unwrap_or_else(|| SignatureAlgorithm::default_for(key));
        let tbs = TbsCertificate::build(definition, &key.public_key(), algorithm)?;
        tbs.sign(key)
    }

    /// Encodes the certificate into DER format.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        self.inner
            .to_der()
            .map_err(|e| EidasKitError::EncodingError(e.to_string()))
    }

    /// Encodes the certificate into PEM format.
    pub fn to_pem(&self) -> Result<String> {
        self.inner
            .to_pem(pkcs8::LineEnding::LF)
            .map_err(|e| EidasKitError::EncodingError(e.to_string()))
    }

    /// Parses a DER-encoded certificate.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let inner = CertificateInner::from_der(der)
            .map_err(|e| EidasKitError::MalformedCertificate(e.to_string()))?;
        Ok(Certificate { inner })
    }

    /// Parses a PEM-encoded certificate.
    ///
    /// Fails with [`EidasKitError::MalformedPem`] when no `CERTIFICATE`
    /// block is present and [`EidasKitError::MalformedCertificate`] when the
    /// block's DER structure is invalid.
    pub fn from_pem(pem_text: &str) -> Result<Self> {
        let der = crate::pem_utils::pem_to_der(pem_text, "CERTIFICATE")?;
        Self::from_der(&der)
    }

    pub fn subject(&self) -> DistinguishedName {
        DistinguishedName::from_x509_name(&self.inner.tbs_certificate.subject)
    }

    pub fn issuer(&self) -> DistinguishedName {
        DistinguishedName::from_x509_name(&self.inner.tbs_certificate.issuer)
    }

    pub fn validity(&self) -> Validity {
        Validity::from_x509(&self.inner.tbs_certificate.validity)
    }

    pub fn serial_number(&self) -> Vec<u8> {
        self.inner
            .tbs_certificate
            .serial_number
            .as_bytes()
            .to_vec()
    }

    pub fn signature_algorithm(&self) -> Result<SignatureAlgorithm> {
        SignatureAlgorithm::from_oid(self.inner.signature_algorithm.oid)
    }

    /// The subject public key embedded in the certificate.
    pub fn public_key(&self) -> Result<PublicKey> {
        PublicKey::from_spki(&self.inner.tbs_certificate.subject_public_key_info)
    }

    /// All extensions as opaque OID/critical/value triples.
    pub fn extensions(&self) -> Vec<ExtensionParam> {
        self.inner
            .tbs_certificate
            .extensions
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|ext| ExtensionParam {
                oid: ext.extn_id,
                critical: ext.critical,
                value: ext.extn_value.as_bytes().to_vec(),
            })
            .collect()
    }

    /// Raw value of the QCStatements extension, when present.
    pub fn qc_statements_value(&self) -> Option<Vec<u8>> {
        self.extensions()
            .into_iter()
            .find(|ext| ext.oid == ID_PE_QC_STATEMENTS)
            .map(|ext| ext.value)
    }

    /// The decoded PSD2 attribute set, or `None` when the certificate
    /// carries no PSD2 statement.
    pub fn psd2_attributes(&self) -> Result<Option<Psd2Attributes>> {
        match self.qc_statements_value() {
            None => Ok(None),
            Some(value) => Psd2Attributes::from_extension_value(&value, &self.subject()),
        }
    }

    /// Extracts a declarative definition reproducing this certificate.
    ///
    /// The QCStatements extension is folded back into the `psd2` block so a
    /// rebuild regenerates it; all other extensions are carried opaquely.
    pub fn to_definition(&self) -> Result<CertificateDefinition> {
        let psd2 = self.psd2_attributes()?;
        let extensions = self
            .extensions()
            .into_iter()
            .filter(|ext| !(psd2.is_some() && ext.oid == ID_PE_QC_STATEMENTS))
            .collect();
        Ok(CertificateDefinition {
            subject: self.subject(),
            issuer: Some(self.issuer()),
            validity: self.validity(),
            serial_number: Some(self.serial_number()),
            signature_algorithm: Some(self.signature_algorithm()?),
            psd2,
            extensions,
        })
    }

    /// Verifies the certificate signature over the exact DER encoding of the
    /// to-be-signed body.
    pub fn verify_signature(&self, public_key: &PublicKey) -> Result<()> {
        let tbs_der = self.inner.tbs_certificate.to_der()?;
        let algorithm = self.signature_algorithm()?;
        let signature = self.inner.signature.as_bytes().ok_or_else(|| {
            EidasKitError::MalformedCertificate(
                "signature BIT STRING has unused bits".to_string(),
            )
        })?;
        public_key.verify(&tbs_der, signature, &algorithm)
    }

    /// Renders a human-readable dump of the certificate, including a labeled
    /// PSD2 section when a statement is present.
    ///
    /// An undecodable QCStatements extension falls back to a raw hex dump
    /// instead of aborting the whole description.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        let subject = self.subject();
        let validity = self.validity();
        let _ = writeln!(out, "Certificate:");
        let _ = writeln!(out, "    Subject: {subject}");
        let _ = writeln!(out, "    Issuer: {}", self.issuer());
        let _ = writeln!(out, "    Serial Number: {}", hex_colon(&self.serial_number()));
        let _ = writeln!(out, "    Not Before: {}", validity.not_before);
        let _ = writeln!(out, "    Not After: {}", validity.not_after);
        let _ = writeln!(
            out,
            "    Public Key: {}",
            self.public_key()
                .map(|pk| pk.summary())
                .unwrap_or_else(|_| "unknown".to_string())
        );
        let _ = writeln!(
            out,
            "    Signature Algorithm: {}",
            self.signature_algorithm()
                .map(|alg| alg.name())
                .unwrap_or("unknown")
        );
        if let Some(value) = self.qc_statements_value() {
            let _ = writeln!(out, "    QCStatements:");
            match Psd2Attributes::from_extension_value(&value, &subject) {
                Ok(Some(psd2)) => {
                    let _ = writeln!(out, "        Qualified Certificate Statement (QcCompliance)");
                    let _ = writeln!(out, "        PSD2 Statement (ETSI TS 119 495):");
                    let _ = writeln!(
                        out,
                        "            Organization Identifier: {}",
                        psd2.organization_identifier
                    );
                    let _ = writeln!(out, "            NCA Name: {}", psd2.nca_name);
                    let _ = writeln!(out, "            NCA Id: {}", psd2.nca_id);
                    let roles: Vec<&str> = psd2.roles.iter().map(|r| r.as_str()).collect();
                    let _ = writeln!(out, "            Roles: {}", roles.join(", "));
                }
                Ok(None) => {
                    let _ = writeln!(out, "        (no PSD2 statement)");
                    let _ = writeln!(out, "        Raw value: {}", hex_colon(&value));
                }
                Err(_) => {
                    let _ = writeln!(out, "        (undecodable statement)");
                    let _ = writeln!(out, "        Raw value: {}", hex_colon(&value));
                }
            }
        }
        out
    }
}

fn hex_colon(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(":")
}
