use eidaskit::cert::params::{CertificateDefinition, DistinguishedName, Validity};
use eidaskit::cert::qcstatements::{Psd2Attributes, parse_roles};
use time::macros::datetime;

pub fn test_validity() -> Validity {
    Validity::new(
        datetime!(2024-01-01 0:00 UTC),
        datetime!(2025-01-01 0:00 UTC),
    )
}

pub fn test_subject() -> DistinguishedName {
    DistinguishedName::builder()
        .common_name("Test PSP".to_string())
        .country("BE".to_string())
        .organization("Example Payments".to_string())
        .build()
}

pub fn belgian_psd2() -> Psd2Attributes {
    Psd2Attributes {
        organization_identifier: "PSDBE-NBB-1234".to_string(),
        nca_name: "National Bank of Belgium".to_string(),
        nca_id: "NBB".to_string(),
        roles: parse_roles(["PSP_PI", "PSP_AI"]).unwrap(),
    }
}

pub fn definition_without_psd2() -> CertificateDefinition {
    CertificateDefinition::builder()
        .subject(test_subject())
        .validity(test_validity())
        .build()
}

pub fn definition_with_psd2() -> CertificateDefinition {
    CertificateDefinition::builder()
        .subject(test_subject())
        .validity(test_validity())
        .psd2(belgian_psd2())
        .build()
}
