//! Definition block (DSDT/SSDT) header and checksum validation.

use crate::error::AmlError;
use crate::method::MethodTable;
use crate::node::AmlNode;

/// Standard ACPI System Description Table header.
///
/// This 36-byte header is present at the start of every ACPI table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SdtHeader {
    /// 4-byte ASCII signature identifying the table type.
    pub signature: [u8; 4],
    /// Total length of the table, including the header, in bytes.
    pub length: u32,
    /// Revision of the table structure. For definition blocks a revision
    /// below 2 means integers are 32 bits wide.
    pub revision: u8,
    /// Checksum byte. The entire table, including the header, must sum to zero.
    pub checksum: u8,
    /// OEM-supplied identification string.
    pub oem_id: [u8; 6],
    /// OEM-supplied table identification string.
    pub oem_table_id: [u8; 8],
    /// OEM-supplied revision number.
    pub oem_revision: u32,
    /// Vendor ID of the utility that created the table.
    pub creator_id: u32,
    /// Revision of the utility that created the table.
    pub creator_revision: u32,
}

impl SdtHeader {
    /// The size of an SDT header in bytes.
    pub const SIZE: usize = 36;

    /// Reads an [`SdtHeader`] from the start of `data`.
    ///
    /// Returns `None` if the slice is shorter than [`SdtHeader::SIZE`] bytes.
    #[must_use]
    pub fn read_from_bytes(data: &[u8]) -> Option<Self> {
        let header: &[u8; Self::SIZE] = data.get(..Self::SIZE)?.try_into().ok()?;
        let array = |at: usize| -> [u8; 4] {
            [header[at], header[at + 1], header[at + 2], header[at + 3]]
        };
        let mut oem_id = [0; 6];
        oem_id.copy_from_slice(&header[10..16]);
        let mut oem_table_id = [0; 8];
        oem_table_id.copy_from_slice(&header[16..24]);

        Some(Self {
            signature: array(0),
            length: u32::from_le_bytes(array(4)),
            revision: header[8],
            checksum: header[9],
            oem_id,
            oem_table_id,
            oem_revision: u32::from_le_bytes(array(24)),
            creator_id: u32::from_le_bytes(array(28)),
            creator_revision: u32::from_le_bytes(array(32)),
        })
    }

    /// Returns the signature as text, or `"????"` if it is not ASCII.
    #[must_use]
    pub fn signature_str(&self) -> &str {
        core::str::from_utf8(&self.signature).unwrap_or("????")
    }
}

/// Validate the checksum of a byte slice.
///
/// ACPI tables are designed so that the sum of all bytes in the table equals
/// zero (mod 256).
#[must_use]
pub fn validate_checksum(data: &[u8]) -> bool {
    data.iter().fold(0u8, |sum, &byte| sum.wrapping_add(byte)) == 0
}

/// A validated DSDT or SSDT.
#[derive(Debug, Clone, Copy)]
pub struct DefinitionBlock<'a> {
    header: SdtHeader,
    data: &'a [u8],
}

impl<'a> DefinitionBlock<'a> {
    /// Validates a table image.
    ///
    /// Bytes past the header's length are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`AmlError::TruncatedData`] if the header cannot be read or
    /// claims more bytes than `table` holds, [`AmlError::InvalidSignature`]
    /// for anything but `DSDT` or `SSDT`, and [`AmlError::InvalidChecksum`]
    /// if the bytes do not sum to zero.
    pub fn new(table: &'a [u8]) -> Result<Self, AmlError> {
        let header = SdtHeader::read_from_bytes(table).ok_or(AmlError::TruncatedData)?;
        if !matches!(&header.signature, b"DSDT" | b"SSDT") {
            return Err(AmlError::InvalidSignature);
        }

        let length = usize::try_from(header.length).map_err(|_| AmlError::TruncatedData)?;
        if length < SdtHeader::SIZE {
            return Err(AmlError::TruncatedData);
        }
        let data = table.get(..length).ok_or(AmlError::TruncatedData)?;
        if !validate_checksum(data) {
            return Err(AmlError::InvalidChecksum);
        }

        log::debug!(
            "{} {:?} rev {}: {} bytes of AML",
            header.signature_str(),
            core::str::from_utf8(&header.oem_table_id).unwrap_or(""),
            header.revision,
            length - SdtHeader::SIZE,
        );
        Ok(Self { header, data })
    }

    /// Returns the table header.
    #[must_use]
    pub fn header(&self) -> &SdtHeader {
        &self.header
    }

    /// Returns the AML body following the header.
    #[must_use]
    pub fn aml(&self) -> &'a [u8] {
        &self.data[SdtHeader::SIZE..]
    }

    /// Collects the method signatures declared in the body.
    #[must_use]
    pub fn scan_methods(&self) -> MethodTable {
        MethodTable::scan(self.aml())
    }

    /// Parses the body into a `TermList` tree.
    ///
    /// # Errors
    ///
    /// See [`crate::parse_term_list`].
    pub fn parse(&self, methods: &'a MethodTable) -> Result<AmlNode<'a>, AmlError> {
        crate::parse_term_list(self.aml(), methods)
    }
}
