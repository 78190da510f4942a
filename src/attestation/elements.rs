// Copyright 2023 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use super::tlv::{Tag, TlvReader, Value};
use bitmask::*;

const CERTIFICATION_DECLARATION_TAG: u8 = 1;
const ATTESTATION_NONCE_TAG: u8 = 2;
const TIMESTAMP_TAG: u8 = 3;
const FIRMWARE_INFO_TAG: u8 = 4;

/// Size of the nonce the commissioner sends in the attestation request.  The
/// decoder takes the embedded nonce as is.
pub const ATTESTATION_NONCE_LEN: usize = 32;

/// Maximum number of vendor-reserved elements retained from a payload
pub const MAX_VENDOR_RESERVED: usize = 2;

bitmask! {
    #[derive(Debug)]
    mask ElementsSet: u8 where flags Elements {
        CertDeclaration = 0x01,
        Nonce           = 0x02,
        Timestamp       = 0x04,
        FirmwareInfo    = 0x08,
        VendorReserved  = 0x10,
    }
}

/// The attestation-elements structure a device signs during commissioning
#[derive(Debug, PartialEq)]
pub struct AttestationElements {
    pub certification_declaration: Vec<u8>, // 1, bytes
    pub attestation_nonce: Vec<u8>,         // 2, bytes
    pub timestamp: u32,                     // 3, uint
    pub firmware_information: Option<Vec<u8>>, // 4, bytes
    pub vendor_reserved: Vec<Vec<u8>>,      // fully-qualified tags, bytes
    pub vendor_id: u16,
    pub profile_num: u16,

    elements_set: ElementsSet,
}

impl Default for AttestationElements {
    fn default() -> Self {
        Self::new()
    }
}

impl AttestationElements {
    pub fn new() -> Self {
        Self {
            certification_declaration: Default::default(),
            attestation_nonce: Default::default(),
            timestamp: 0,
            firmware_information: None,
            vendor_reserved: Default::default(),
            vendor_id: 0,
            profile_num: 0,
            elements_set: ElementsSet::none(),
        }
    }

    /// Decode a TLV encoded attestation-elements structure
    pub fn decode(buf: &[u8]) -> Result<AttestationElements, Error> {
        let mut r = TlvReader::new(buf);

        match r.next_element()? {
            Some(e) if e.tag == Tag::Anonymous && e.value == Value::Structure => {}
            Some(_) => return Err(Error::Syntax("expecting anonymous structure".to_string())),
            None => return Err(Error::UnexpectedEnd("empty payload".to_string())),
        }

        let mut ae: AttestationElements = Default::default();

        ae.parse(&mut r)?;

        if !r.is_at_end() {
            return Err(Error::Syntax("trailing bytes after attestation elements".to_string()));
        }

        ae.validate()?;

        Ok(ae)
    }

    fn parse(&mut self, r: &mut TlvReader<'_>) -> Result<(), Error> {
        let mut last_context_tag: Option<u8> = None;

        loop {
            let e = r
                .next_element()?
                .ok_or_else(|| Error::UnexpectedEnd("unterminated structure".to_string()))?;

            if e.value == Value::EndOfContainer {
                return Ok(());
            }

            if e.value.is_container_start() {
                return Err(Error::Syntax(format!(
                    "unexpected {} in attestation elements",
                    e.value.type_name()
                )));
            }

            match e.tag {
                Tag::Context(n) => {
                    if let Some(last) = last_context_tag {
                        if n <= last {
                            return Err(Error::Syntax(format!(
                                "context tag {n} out of order after {last}"
                            )));
                        }
                    }
                    last_context_tag = Some(n);

                    match n {
                        CERTIFICATION_DECLARATION_TAG => {
                            self.set_certification_declaration(&e.value)?
                        }
                        ATTESTATION_NONCE_TAG => self.set_attestation_nonce(&e.value)?,
                        TIMESTAMP_TAG => self.set_timestamp(&e.value)?,
                        FIRMWARE_INFO_TAG => self.set_firmware_information(&e.value)?,
                        unknown => {
                            return Err(Error::UnknownElement(format!(
                                "context tag {unknown} in attestation elements"
                            )))
                        }
                    }
                }
                Tag::FullyQualified {
                    vendor_id,
                    profile_num,
                    ..
                } => self.add_vendor_reserved(vendor_id, profile_num, &e.value)?,
                other => {
                    return Err(Error::Syntax(format!(
                        "unexpected tag {other:?} in attestation elements"
                    )))
                }
            }
        }
    }

    fn set_certification_declaration(&mut self, v: &Value) -> Result<(), Error> {
        if self.elements_set.contains(Elements::CertDeclaration) {
            return Err(Error::DuplicatedElement("certification-declaration".to_string()));
        }

        self.certification_declaration = to_bstr(v, "certification-declaration")?;

        self.elements_set.set(Elements::CertDeclaration);

        Ok(())
    }

    fn set_attestation_nonce(&mut self, v: &Value) -> Result<(), Error> {
        if self.elements_set.contains(Elements::Nonce) {
            return Err(Error::DuplicatedElement("attestation-nonce".to_string()));
        }

        // length is left to the comparison with the expected nonce
        self.attestation_nonce = to_bstr(v, "attestation-nonce")?;

        self.elements_set.set(Elements::Nonce);

        Ok(())
    }

    fn set_timestamp(&mut self, v: &Value) -> Result<(), Error> {
        if self.elements_set.contains(Elements::Timestamp) {
            return Err(Error::DuplicatedElement("timestamp".to_string()));
        }

        let x = match v {
            Value::Unsigned(u) => u32::try_from(*u)
                .map_err(|_| Error::Sema(format!("timestamp: {u} out of range")))?,
            other => {
                return Err(Error::TypeMismatch(format!(
                    "timestamp: expecting unsigned integer, got {}",
                    other.type_name()
                )))
            }
        };

        self.timestamp = x;

        self.elements_set.set(Elements::Timestamp);

        Ok(())
    }

    fn set_firmware_information(&mut self, v: &Value) -> Result<(), Error> {
        if self.elements_set.contains(Elements::FirmwareInfo) {
            return Err(Error::DuplicatedElement("firmware-information".to_string()));
        }

        self.firmware_information = Some(to_bstr(v, "firmware-information")?);

        self.elements_set.set(Elements::FirmwareInfo);

        Ok(())
    }

    fn add_vendor_reserved(
        &mut self,
        vendor_id: u16,
        profile_num: u16,
        v: &Value,
    ) -> Result<(), Error> {
        if self.elements_set.contains(Elements::VendorReserved) {
            // all the vendor-reserved elements must share the same profile
            if vendor_id != self.vendor_id || profile_num != self.profile_num {
                return Err(Error::Sema(format!(
                    "vendor-reserved element {vendor_id:#06x}/{profile_num:#06x} does not \
                     match {:#06x}/{:#06x}",
                    self.vendor_id, self.profile_num
                )));
            }
        }

        if self.vendor_reserved.len() == MAX_VENDOR_RESERVED {
            return Err(Error::Sema(format!(
                "more than {MAX_VENDOR_RESERVED} vendor-reserved elements"
            )));
        }

        self.vendor_reserved.push(to_bstr(v, "vendor-reserved")?);
        self.vendor_id = vendor_id;
        self.profile_num = profile_num;

        self.elements_set.set(Elements::VendorReserved);

        Ok(())
    }

    fn validate(&self) -> Result<(), Error> {
        // firmware-information and vendor-reserved are optional
        let mandatory_elements = [
            (Elements::CertDeclaration, "certification-declaration"),
            (Elements::Nonce, "attestation-nonce"),
            (Elements::Timestamp, "timestamp"),
        ];

        for (c, n) in mandatory_elements.iter() {
            if !self.elements_set.contains(*c) {
                return Err(Error::MissingElement(n.to_string()));
            }
        }

        Ok(())
    }
}

fn to_bstr(v: &Value, n: &str) -> Result<Vec<u8>, Error> {
    match v {
        Value::Bytes(b) => Ok(b.to_vec()),
        other => Err(Error::TypeMismatch(format!(
            "{n}: expecting byte string, got {}",
            other.type_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attestation::tlv::TlvWriter;

    const TEST_CD: [u8; 8] = [0xCD; 8];
    const TEST_NONCE: [u8; ATTESTATION_NONCE_LEN] = [0x4E; ATTESTATION_NONCE_LEN];
    const TEST_TIMESTAMP: u32 = 0x2A2B_2C2D;

    fn vendor_tag(vendor_id: u16, profile_num: u16, tag_num: u32) -> Tag {
        Tag::FullyQualified {
            vendor_id,
            profile_num,
            tag_num,
        }
    }

    fn mandatory(w: &mut TlvWriter) -> &mut TlvWriter {
        w.start_structure(Tag::Anonymous)
            .put_bytes(Tag::Context(1), &TEST_CD)
            .put_bytes(Tag::Context(2), &TEST_NONCE)
            .put_u32(Tag::Context(3), TEST_TIMESTAMP)
    }

    #[test]
    fn decode_mandatory_only() {
        let mut w = TlvWriter::new();
        let buf = mandatory(&mut w).end_container().finish();

        let ae = AttestationElements::decode(&buf).unwrap();

        assert_eq!(ae.certification_declaration, TEST_CD);
        assert_eq!(ae.attestation_nonce, TEST_NONCE);
        assert_eq!(ae.timestamp, TEST_TIMESTAMP);
        assert!(ae.firmware_information.is_none());
        assert!(ae.vendor_reserved.is_empty());
    }

    #[test]
    fn decode_all_elements() {
        let mut w = TlvWriter::new();
        let buf = mandatory(&mut w)
            .put_bytes(Tag::Context(4), b"fw")
            .put_bytes(vendor_tag(0xFFF1, 0x003E, 1), b"vr1")
            .put_bytes(vendor_tag(0xFFF1, 0x003E, 0x10000), b"vr2")
            .end_container()
            .finish();

        let ae = AttestationElements::decode(&buf).unwrap();

        assert_eq!(ae.firmware_information.as_deref(), Some(&b"fw"[..]));
        assert_eq!(ae.vendor_reserved, vec![b"vr1".to_vec(), b"vr2".to_vec()]);
        assert_eq!(ae.vendor_id, 0xFFF1);
        assert_eq!(ae.profile_num, 0x003E);
    }

    #[test]
    fn missing_timestamp() {
        let buf = TlvWriter::new()
            .start_structure(Tag::Anonymous)
            .put_bytes(Tag::Context(1), &TEST_CD)
            .put_bytes(Tag::Context(2), &TEST_NONCE)
            .end_container()
            .finish();

        let r = AttestationElements::decode(&buf);
        assert_eq!(r, Err(Error::MissingElement("timestamp".to_string())));
    }

    #[test]
    fn context_tags_out_of_order() {
        let buf = TlvWriter::new()
            .start_structure(Tag::Anonymous)
            .put_bytes(Tag::Context(2), &TEST_NONCE)
            .put_bytes(Tag::Context(1), &TEST_CD)
            .put_u32(Tag::Context(3), TEST_TIMESTAMP)
            .end_container()
            .finish();

        assert!(matches!(
            AttestationElements::decode(&buf),
            Err(Error::Syntax(_))
        ));
    }

    #[test]
    fn unknown_context_tag() {
        let mut w = TlvWriter::new();
        let buf = mandatory(&mut w)
            .put_bytes(Tag::Context(5), b"?")
            .end_container()
            .finish();

        assert!(matches!(
            AttestationElements::decode(&buf),
            Err(Error::UnknownElement(_))
        ));
    }

    #[test]
    fn short_nonce_kept_as_is() {
        let buf = TlvWriter::new()
            .start_structure(Tag::Anonymous)
            .put_bytes(Tag::Context(1), &TEST_CD)
            .put_bytes(Tag::Context(2), &TEST_NONCE[..31])
            .put_u32(Tag::Context(3), TEST_TIMESTAMP)
            .end_container()
            .finish();

        let ae = AttestationElements::decode(&buf).unwrap();
        assert_eq!(ae.attestation_nonce, &TEST_NONCE[..31]);
    }

    #[test]
    fn timestamp_wrong_type() {
        let buf = TlvWriter::new()
            .start_structure(Tag::Anonymous)
            .put_bytes(Tag::Context(1), &TEST_CD)
            .put_bytes(Tag::Context(2), &TEST_NONCE)
            .put_i8(Tag::Context(3), 1)
            .end_container()
            .finish();

        assert!(matches!(
            AttestationElements::decode(&buf),
            Err(Error::TypeMismatch(_))
        ));
    }

    #[test]
    fn timestamp_out_of_range() {
        let buf = TlvWriter::new()
            .start_structure(Tag::Anonymous)
            .put_bytes(Tag::Context(1), &TEST_CD)
            .put_bytes(Tag::Context(2), &TEST_NONCE)
            .put_u64(Tag::Context(3), u64::from(u32::MAX) + 1)
            .end_container()
            .finish();

        assert!(matches!(
            AttestationElements::decode(&buf),
            Err(Error::Sema(_))
        ));
    }

    #[test]
    fn too_many_vendor_reserved() {
        let mut w = TlvWriter::new();
        let buf = mandatory(&mut w)
            .put_bytes(vendor_tag(0xFFF1, 1, 1), b"a")
            .put_bytes(vendor_tag(0xFFF1, 1, 2), b"b")
            .put_bytes(vendor_tag(0xFFF1, 1, 3), b"c")
            .end_container()
            .finish();

        assert!(matches!(
            AttestationElements::decode(&buf),
            Err(Error::Sema(_))
        ));
    }

    #[test]
    fn mixed_vendor_reserved_profiles() {
        let mut w = TlvWriter::new();
        let buf = mandatory(&mut w)
            .put_bytes(vendor_tag(0xFFF1, 1, 1), b"a")
            .put_bytes(vendor_tag(0xFFF2, 1, 2), b"b")
            .end_container()
            .finish();

        assert!(matches!(
            AttestationElements::decode(&buf),
            Err(Error::Sema(_))
        ));
    }

    #[test]
    fn nested_container() {
        let mut w = TlvWriter::new();
        let buf = mandatory(&mut w)
            .start_array(Tag::Context(4))
            .end_container()
            .end_container()
            .finish();

        assert!(matches!(
            AttestationElements::decode(&buf),
            Err(Error::Syntax(_))
        ));
    }

    #[test]
    fn not_a_structure() {
        let buf = TlvWriter::new()
            .put_str(Tag::Anonymous, "hello")
            .finish();

        assert!(matches!(
            AttestationElements::decode(&buf),
            Err(Error::Syntax(_))
        ));
    }

    #[test]
    fn unterminated_structure() {
        let mut w = TlvWriter::new();
        let buf = mandatory(&mut w).finish();

        assert!(matches!(
            AttestationElements::decode(&buf),
            Err(Error::UnexpectedEnd(_))
        ));
    }

    #[test]
    fn trailing_bytes() {
        let mut w = TlvWriter::new();
        let buf = mandatory(&mut w).end_container().put_raw(&[0x00]).finish();

        assert!(matches!(
            AttestationElements::decode(&buf),
            Err(Error::Syntax(_))
        ));
    }

    #[test]
    fn empty_payload() {
        assert!(matches!(
            AttestationElements::decode(&[]),
            Err(Error::UnexpectedEnd(_))
        ));
    }
}
