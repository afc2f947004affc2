use thiserror::Error;

/// Represents errors that can occur in the eidaskit library.
///
/// Every variant is terminal for the operation that raised it: all failures
/// reflect a deterministic input defect, never a transient condition, so
/// callers should report rather than retry.
#[derive(Debug, Error, Clone)]
pub enum EidasKitError {
    /// No recognizable PEM block of the expected kind was found.
    #[error("Malformed PEM: {0}")]
    MalformedPem(String),

    /// A certificate block was present but its DER structure is invalid.
    #[error("Malformed certificate: {0}")]
    MalformedCertificate(String),

    /// A private-key container was present but could not be parsed.
    #[error("Malformed private key: {0}")]
    MalformedKey(String),

    /// The QCStatements extension does not match the expected ASN.1 shape.
    #[error("Malformed QCStatement: {0}")]
    MalformedStatement(String),

    /// The requested algorithm or parameter combination is not supported.
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The private-key container is encrypted but no passphrase was supplied.
    #[error("Private key is encrypted but no passphrase was supplied")]
    PassphraseRequired,

    /// Decryption of the private key failed, usually a wrong passphrase.
    #[error("Invalid passphrase: private key decryption failed")]
    InvalidPassphrase,

    /// The supplied private key does not match the certificate's public key.
    #[error("Private key does not match the certificate's embedded public key")]
    KeyCertificateMismatch,

    /// A role string outside the PSD2 role enumeration was supplied.
    #[error("Unknown PSD2 role: {0:?} (expected PSP_AS, PSP_PI, PSP_AI or PSP_IC)")]
    UnknownRole(String),

    /// A PSD2 statement is present but the subject DN lacks the paired
    /// organizationIdentifier attribute.
    #[error("Subject DN has no organizationIdentifier attribute (OID 2.5.4.97)")]
    MissingOrganizationIdentifier,

    /// The validity window is empty or inverted.
    #[error("Invalid validity period: {0}")]
    InvalidValidityPeriod(String),

    /// The signature algorithm cannot be used with the signing key's type.
    #[error("Incompatible signature algorithm: {0}")]
    IncompatibleSignatureAlgorithm(String),

    /// Error due to invalid input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Error during data encoding.
    #[error("Failed to encode data: {0}")]
    EncodingError(String),
}

impl From<der::Error> for EidasKitError {
    /// DER failures on the encode path; decode paths map errors explicitly
    /// so the malformed-input variants keep their context.
    fn from(err: der::Error) -> Self {
        EidasKitError::EncodingError(err.to_string())
    }
}

impl From<rsa::Error> for EidasKitError {
    fn from(err: rsa::Error) -> Self {
        EidasKitError::EncodingError(err.to_string())
    }
}
