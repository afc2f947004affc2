//! # eidaskit - eIDAS/PSD2 Qualified Certificates in Pure Rust
//!
//! eidaskit issues, inspects and amends X.509 certificates carrying the
//! eIDAS/PSD2 qualified-certificate attributes of ETSI EN 319 412-5 and
//! ETSI TS 119 495: the QCStatements extension naming a payment service
//! provider's national competent authority and granted roles, paired with
//! the subject DN organizationIdentifier attribute. It is built entirely
//! with rustcrypto libraries, with no dependencies on ring or openssl.
//!
//! ## What it covers
//!
//! - **Key material**: RSA, ECDSA (P-256/P-384) and Ed25519 key pairs;
//!   PKCS#8 PEM encoding, optionally passphrase-encrypted (PBES2).
//! - **Certificate creation**: a declarative [`cert::params::CertificateDefinition`]
//!   plus a key pair yields a signed certificate, including the PSD2
//!   QCStatements extension when attributes are supplied.
//! - **Inspection**: PEM parsing, structural round trips and a
//!   human-readable dump with a decoded PSD2 section.
//! - **Amendment**: [`amend::amend_psd2`] replaces a certificate's PSD2
//!   attributes and re-signs it with its own key, preserving every other
//!   field.
//!
//! Out of scope: revocation (CRL/OCSP), chain building and HSM-backed keys.
//!
//! ## Creating a PSD2 certificate
//!
//! ```rust,no_run
//! use eidaskit::{
//!     cert::Certificate,
//!     cert::params::{CertificateDefinition, DistinguishedName, Validity},
//!     cert::qcstatements::{Psd2Attributes, parse_roles},
//!     key::KeyPair,
//! };
//!
//! # fn main() -> Result<(), eidaskit::error::EidasKitError> {
//! let key_pair = KeyPair::generate_ecdsa_p256();
//!
//! let subject = DistinguishedName::builder()
//!     .common_name("Example Payments".to_string())
//!     .country("BE".to_string())
//!     .build();
//!
//! let psd2 = Psd2Attributes {
//!     organization_identifier: "PSDBE-NBB-1234".to_string(),
//!     nca_name: "National Bank of Belgium".to_string(),
//!     nca_id: "NBB".to_string(),
//!     roles: parse_roles(["PSP_PI", "PSP_AI"])?,
//! };
//!
//! let definition = CertificateDefinition::builder()
//!     .subject(subject)
//!     .validity(Validity::for_days(365))
//!     .psd2(psd2)
//!     .build();
//!
//! let certificate = Certificate::create(&definition, &key_pair)?;
//! println!("{}", certificate.to_pem()?);
//! println!("{}", certificate.describe());
//!
//! // Private key, encrypted under a passphrase.
//! let key_pem = key_pair.to_pkcs8_pem(Some("Welcome123"))?;
//! println!("{key_pem}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Amending PSD2 attributes
//!
//! ```rust,no_run
//! use eidaskit::amend::{Psd2Amendment, amend_psd2};
//! use eidaskit::cert::qcstatements::parse_roles;
//!
//! # fn main() -> Result<(), eidaskit::error::EidasKitError> {
//! # let (cert_pem, key_pem) = (String::new(), String::new());
//! let amendment = Psd2Amendment {
//!     roles: Some(parse_roles(["PSP_PI", "PSP_AS"])?),
//!     ..Default::default()
//! };
//! let amended_pem = amend_psd2(&cert_pem, &key_pem, Some("Welcome123"), &amendment)?;
//! println!("{amended_pem}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Every failure is a deterministic input defect surfaced as a specific
//! [`error::EidasKitError`] variant naming the offending field or value:
//!
//! ```rust
//! use eidaskit::{error::EidasKitError, key::KeyPair};
//!
//! match KeyPair::from_pkcs8_pem("invalid pem data", None) {
//!     Ok(_) => println!("Key imported successfully"),
//!     Err(EidasKitError::MalformedKey(msg)) => println!("Failed to decode key: {msg}"),
//!     Err(e) => println!("Other error: {e}"),
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`key`]: Key generation and PKCS#8 private-key import/export
//! - [`cert`]: Certificate creation, encoding/decoding and the PSD2 codec
//! - [`amend`]: The PSD2 attribute re-signing workflow
//! - [`passphrase`]: Passphrase precedence resolution
//! - [`pem_utils`]: Label-checked PEM encoding helpers
//! - [`error`]: Error types
//! - [`tbs_certificate`]: Low-level certificate body assembly and signing

pub mod amend;
pub mod cert;
pub mod error;
pub mod key;
pub mod passphrase;
pub mod pem_utils;
pub mod tbs_certificate;
