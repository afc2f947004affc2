use crate::error::EidasKitError;

/// Convert DER-encoded data into a PEM-encoded string with the provided label.
pub fn der_to_pem(der: &[u8], label: &str) -> String {
    let pem = pem::Pem::new(label, der);
    pem::encode_config(&pem, pem::EncodeConfig::new())
}

/// Extract the DER contents of a PEM block, checking that its label matches.
pub fn pem_to_der(pem_str: &str, expected_label: &str) -> Result<Vec<u8>, EidasKitError> {
    let pem = pem::parse(pem_str).map_err(|e| EidasKitError::MalformedPem(e.to_string()))?;
    if pem.tag() != expected_label {
        return Err(EidasKitError::MalformedPem(format!(
            "expected a {expected_label} block, found {:?}",
            pem.tag()
        )));
    }
    Ok(pem.contents().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_mismatch_is_malformed_pem() {
        let pem = der_to_pem(&[0x30, 0x00], "CERTIFICATE REQUEST");
        let err = pem_to_der(&pem, "CERTIFICATE").unwrap_err();
        assert!(matches!(err, EidasKitError::MalformedPem(_)));
    }

    #[test]
    fn round_trip_preserves_contents() {
        let der = vec![0x30, 0x03, 0x02, 0x01, 0x01];
        let pem = der_to_pem(&der, "CERTIFICATE");
        assert_eq!(pem_to_der(&pem, "CERTIFICATE").unwrap(), der);
    }
}
