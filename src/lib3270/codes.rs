//! TN3270 protocol constants and codes
//!
//! Command codes, order codes, Write Control Character bits, AID
//! (Attention Identifier) keys and field attribute bits used by the
//! 3270 data stream.
//!
//! # References
//! - RFC 1576: TN3270 Current Practices
//! - IBM 3270 Data Stream Programmer's Reference (GA23-0059)

// Commands (remote forms)
pub const CMD_WRITE: u8 = 0xF1;
pub const CMD_ERASE_WRITE: u8 = 0xF5;
pub const CMD_ERASE_WRITE_ALTERNATE: u8 = 0x7E;
pub const CMD_READ_BUFFER: u8 = 0xF2;
pub const CMD_READ_MODIFIED: u8 = 0xF6;
pub const CMD_READ_MODIFIED_ALL: u8 = 0x6E;

/// Lowest byte of the remote command range. Bytes below it that are not a
/// known command are shifted up by this amount before dispatch.
pub const CMD_RANGE_BASE: u8 = 0xF0;

// Orders, interleaved with data after the WCC
pub const ORDER_SF: u8 = 0x1D;    // Start Field
pub const ORDER_SFE: u8 = 0x29;   // Start Field Extended
pub const ORDER_SBA: u8 = 0x11;   // Set Buffer Address
pub const ORDER_SA: u8 = 0x28;    // Set Attribute
pub const ORDER_MF: u8 = 0x2C;    // Modify Field
pub const ORDER_IC: u8 = 0x13;    // Insert Cursor
pub const ORDER_PT: u8 = 0x05;    // Program Tab
pub const ORDER_RA: u8 = 0x3C;    // Repeat to Address
pub const ORDER_EUA: u8 = 0x12;   // Erase Unprotected to Address
pub const ORDER_GE: u8 = 0x08;    // Graphic Escape

// WCC bits
pub const WCC_KEYBOARD_RESTORE: u8 = 0x01;
pub const WCC_SOUND_ALARM: u8 = 0x02;
pub const WCC_START_PRINTER: u8 = 0x04;
pub const WCC_PRINT: u8 = 0x08;
pub const WCC_ERASE_ALL_UNPROTECTED: u8 = 0x40;

// Function keys
pub const AID_PF1: u8 = 0xF1;
pub const AID_PF2: u8 = 0xF2;
pub const AID_PF3: u8 = 0xF3;
pub const AID_PF4: u8 = 0xF4;
pub const AID_PF5: u8 = 0xF5;
pub const AID_PF6: u8 = 0xF6;
pub const AID_PF7: u8 = 0xF7;
pub const AID_PF8: u8 = 0xF8;
pub const AID_PF9: u8 = 0xF9;
pub const AID_PF10: u8 = 0x7A;
pub const AID_PF11: u8 = 0x7B;
pub const AID_PF12: u8 = 0x7C;

// Program attention keys
pub const AID_PA1: u8 = 0x6C;
pub const AID_PA2: u8 = 0x6E;
pub const AID_PA3: u8 = 0x6B;

// Special keys
pub const AID_CLEAR: u8 = 0x6D;
pub const AID_ENTER: u8 = 0x7D;

// Field attribute bits
pub const ATTR_PROTECTED: u8 = 0x20;
pub const ATTR_NUMERIC: u8 = 0x10;
/// Protected and numeric together: the cursor skips the field
pub const ATTR_SKIP: u8 = 0x30;
/// Intensity bits, see [`DISPLAY_NORMAL`] and friends
pub const ATTR_DISPLAY: u8 = 0x0C;
pub const ATTR_MDT: u8 = 0x01;

pub const DISPLAY_NORMAL: u8 = 0x00;
pub const DISPLAY_DETECTABLE: u8 = 0x04;
pub const DISPLAY_INTENSIFIED: u8 = 0x08;
pub const DISPLAY_HIDDEN: u8 = 0x0C;

/// Extended attribute type carrying a basic 3270 field attribute (SFE/SA/MF)
pub const XA_3270: u8 = 0xC0;

/// Host null byte written by erase operations
pub const HOST_NULL: u8 = 0x00;
/// EBCDIC blank written at field-start cells
pub const HOST_BLANK: u8 = 0x40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandCode {
    Write = CMD_WRITE as isize,
    EraseWrite = CMD_ERASE_WRITE as isize,
    EraseWriteAlternate = CMD_ERASE_WRITE_ALTERNATE as isize,
    ReadBuffer = CMD_READ_BUFFER as isize,
    ReadModified = CMD_READ_MODIFIED as isize,
    ReadModifiedAll = CMD_READ_MODIFIED_ALL as isize,
}

impl CommandCode {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            CMD_WRITE => Some(Self::Write),
            CMD_ERASE_WRITE => Some(Self::EraseWrite),
            CMD_ERASE_WRITE_ALTERNATE => Some(Self::EraseWriteAlternate),
            CMD_READ_BUFFER => Some(Self::ReadBuffer),
            CMD_READ_MODIFIED => Some(Self::ReadModified),
            CMD_READ_MODIFIED_ALL => Some(Self::ReadModifiedAll),
            _ => None,
        }
    }

    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Map a raw command byte into the remote command range.
    ///
    /// Known command codes pass through untouched. Any other byte below
    /// 0xF0 is shifted up by 0xF0 (wrapping), so the local channel forms
    /// `0x01`/`0x05` land on Write and Erase/Write.
    pub fn normalize(value: u8) -> u8 {
        if Self::from_u8(value).is_some() || value >= CMD_RANGE_BASE {
            value
        } else {
            value.wrapping_add(CMD_RANGE_BASE)
        }
    }

    /// True for the commands that carry a WCC and orders
    pub fn is_write(self) -> bool {
        matches!(self, Self::Write | Self::EraseWrite | Self::EraseWriteAlternate)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderCode {
    StartField = ORDER_SF as isize,
    StartFieldExtended = ORDER_SFE as isize,
    SetBufferAddress = ORDER_SBA as isize,
    SetAttribute = ORDER_SA as isize,
    ModifyField = ORDER_MF as isize,
    InsertCursor = ORDER_IC as isize,
    ProgramTab = ORDER_PT as isize,
    RepeatToAddress = ORDER_RA as isize,
    EraseUnprotectedToAddress = ORDER_EUA as isize,
    GraphicEscape = ORDER_GE as isize,
}

impl OrderCode {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            ORDER_SF => Some(Self::StartField),
            ORDER_SFE => Some(Self::StartFieldExtended),
            ORDER_SBA => Some(Self::SetBufferAddress),
            ORDER_SA => Some(Self::SetAttribute),
            ORDER_MF => Some(Self::ModifyField),
            ORDER_IC => Some(Self::InsertCursor),
            ORDER_PT => Some(Self::ProgramTab),
            ORDER_RA => Some(Self::RepeatToAddress),
            ORDER_EUA => Some(Self::EraseUnprotectedToAddress),
            ORDER_GE => Some(Self::GraphicEscape),
            _ => None,
        }
    }

    pub fn to_u8(self) -> u8 {
        self as u8
    }
}

/// Attention keys the operator can send
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AidKey {
    Enter,
    Clear,
    PA1,
    PA2,
    PA3,
    PF1, PF2, PF3, PF4, PF5, PF6,
    PF7, PF8, PF9, PF10, PF11, PF12,
}

impl AidKey {
    const PF_KEYS: [AidKey; 12] = [
        Self::PF1, Self::PF2, Self::PF3, Self::PF4, Self::PF5, Self::PF6,
        Self::PF7, Self::PF8, Self::PF9, Self::PF10, Self::PF11, Self::PF12,
    ];

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            AID_ENTER => Some(Self::Enter),
            AID_CLEAR => Some(Self::Clear),
            AID_PA1 => Some(Self::PA1),
            AID_PA2 => Some(Self::PA2),
            AID_PA3 => Some(Self::PA3),
            AID_PF1 => Some(Self::PF1),
            AID_PF2 => Some(Self::PF2),
            AID_PF3 => Some(Self::PF3),
            AID_PF4 => Some(Self::PF4),
            AID_PF5 => Some(Self::PF5),
            AID_PF6 => Some(Self::PF6),
            AID_PF7 => Some(Self::PF7),
            AID_PF8 => Some(Self::PF8),
            AID_PF9 => Some(Self::PF9),
            AID_PF10 => Some(Self::PF10),
            AID_PF11 => Some(Self::PF11),
            AID_PF12 => Some(Self::PF12),
            _ => None,
        }
    }

    /// Wire byte sent as the first byte of an inbound record
    pub fn to_u8(self) -> u8 {
        match self {
            Self::Enter => AID_ENTER,
            Self::Clear => AID_CLEAR,
            Self::PA1 => AID_PA1,
            Self::PA2 => AID_PA2,
            Self::PA3 => AID_PA3,
            Self::PF1 => AID_PF1,
            Self::PF2 => AID_PF2,
            Self::PF3 => AID_PF3,
            Self::PF4 => AID_PF4,
            Self::PF5 => AID_PF5,
            Self::PF6 => AID_PF6,
            Self::PF7 => AID_PF7,
            Self::PF8 => AID_PF8,
            Self::PF9 => AID_PF9,
            Self::PF10 => AID_PF10,
            Self::PF11 => AID_PF11,
            Self::PF12 => AID_PF12,
        }
    }

    /// Program function key by number (1-12)
    pub fn pf(number: u8) -> Option<Self> {
        let index = usize::from(number).checked_sub(1)?;
        Self::PF_KEYS.get(index).copied()
    }

    /// Program attention key by number (1-3)
    pub fn pa(number: u8) -> Option<Self> {
        match number {
            1 => Some(Self::PA1),
            2 => Some(Self::PA2),
            3 => Some(Self::PA3),
            _ => None,
        }
    }

    /// Keys for which the host may legitimately answer with no orders at all
    pub fn allows_empty_reply(self) -> bool {
        matches!(self, Self::PA1 | Self::PA2 | Self::PA3 | Self::Clear)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_code_conversion() {
        assert_eq!(CommandCode::from_u8(CMD_WRITE), Some(CommandCode::Write));
        assert_eq!(CommandCode::Write.to_u8(), CMD_WRITE);
        assert_eq!(CommandCode::from_u8(0xFF), None);
        assert!(CommandCode::EraseWriteAlternate.is_write());
        assert!(!CommandCode::ReadModified.is_write());
    }

    #[test]
    fn test_command_normalization() {
        // Channel command forms land on their remote equivalents
        assert_eq!(CommandCode::normalize(0x01), CMD_WRITE);
        assert_eq!(CommandCode::normalize(0x05), CMD_ERASE_WRITE);
        // Known remote codes below 0xF0 are kept as-is
        assert_eq!(CommandCode::normalize(CMD_ERASE_WRITE_ALTERNATE), CMD_ERASE_WRITE_ALTERNATE);
        assert_eq!(CommandCode::normalize(CMD_READ_MODIFIED_ALL), CMD_READ_MODIFIED_ALL);
        assert_eq!(CommandCode::normalize(0xF3), 0xF3);
        // Wrapping is deterministic
        assert_eq!(CommandCode::normalize(0xC1), 0xB1);
    }

    #[test]
    fn test_order_code_conversion() {
        assert_eq!(OrderCode::from_u8(ORDER_SF), Some(OrderCode::StartField));
        assert_eq!(OrderCode::StartField.to_u8(), ORDER_SF);
        assert_eq!(OrderCode::from_u8(0xFF), None);
    }

    #[test]
    fn test_aid_key_conversion() {
        assert_eq!(AidKey::from_u8(AID_ENTER), Some(AidKey::Enter));
        assert_eq!(AidKey::Enter.to_u8(), AID_ENTER);
        assert_eq!(AidKey::from_u8(AID_PF1), Some(AidKey::PF1));
        assert_eq!(AidKey::PF1.to_u8(), AID_PF1);
        assert_eq!(AidKey::from_u8(0x60), None);
    }

    #[test]
    fn test_numbered_keys() {
        assert_eq!(AidKey::pf(1), Some(AidKey::PF1));
        assert_eq!(AidKey::pf(12), Some(AidKey::PF12));
        assert_eq!(AidKey::pf(0), None);
        assert_eq!(AidKey::pf(13), None);
        assert_eq!(AidKey::pa(2), Some(AidKey::PA2));
        assert_eq!(AidKey::pa(4), None);
    }

    #[test]
    fn test_empty_reply_keys() {
        assert!(AidKey::Clear.allows_empty_reply());
        assert!(AidKey::PA3.allows_empty_reply());
        assert!(!AidKey::Enter.allows_empty_reply());
        assert!(!AidKey::PF3.allows_empty_reply());
    }
}
