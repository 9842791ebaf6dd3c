//! Field attribute model for 3270
//!
//! A field attribute is carried by a single byte on the wire (from the SF
//! order, or an `0xC0` pair inside SFE/SA/MF). This module decodes that byte
//! into a typed view and re-encodes it, passing through any bits the model
//! does not track.

use super::codes::*;

/// Protection class of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldType {
    #[default]
    Unprotected,
    Protected,
    /// Protected and numeric: the cursor skips over it
    SkipProtected,
}

/// Display intensity of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Intensity {
    #[default]
    Normal,
    High,
    /// Non-display (password style)
    Zero,
}

impl Intensity {
    fn from_display_bits(bits: u8) -> Self {
        match bits & ATTR_DISPLAY {
            DISPLAY_INTENSIFIED => Self::High,
            DISPLAY_HIDDEN => Self::Zero,
            _ => Self::Normal,
        }
    }

    fn to_display_bits(self) -> u8 {
        match self {
            Self::Normal => DISPLAY_NORMAL,
            Self::High => DISPLAY_INTENSIFIED,
            Self::Zero => DISPLAY_HIDDEN,
        }
    }
}

/// 3270 Field Attribute
///
/// Decoded view of one attribute byte. `raw` keeps the byte as originally
/// parsed so that untracked bits survive a round trip through [`to_byte`].
///
/// [`to_byte`]: FieldAttribute::to_byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FieldAttribute {
    field_type: FieldType,
    numeric: bool,
    intensity: Intensity,
    modified: bool,
    raw: u8,
}

impl FieldAttribute {
    /// Decode an attribute byte
    pub fn from_byte(value: u8) -> Self {
        let field_type = if value & ATTR_SKIP == ATTR_SKIP {
            FieldType::SkipProtected
        } else if value & ATTR_PROTECTED != 0 {
            FieldType::Protected
        } else {
            FieldType::Unprotected
        };

        Self {
            field_type,
            numeric: value & ATTR_NUMERIC != 0,
            intensity: Intensity::from_display_bits(value),
            modified: value & ATTR_MDT != 0,
            raw: value,
        }
    }

    /// Encode back to a wire byte
    pub fn to_byte(&self) -> u8 {
        let mut value = self.raw & !(ATTR_SKIP | ATTR_DISPLAY | ATTR_MDT);

        match self.field_type {
            FieldType::Unprotected => {}
            FieldType::Protected => value |= ATTR_PROTECTED,
            FieldType::SkipProtected => value |= ATTR_SKIP,
        }
        if self.numeric {
            value |= ATTR_NUMERIC;
        }

        // Both 0x00 and 0x04 decode as normal; keep whichever the host sent
        if Intensity::from_display_bits(self.raw) == self.intensity {
            value |= self.raw & ATTR_DISPLAY;
        } else {
            value |= self.intensity.to_display_bits();
        }

        if self.modified {
            value |= ATTR_MDT;
        }
        value
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    pub fn set_field_type(&mut self, field_type: FieldType) {
        self.field_type = field_type;
        if field_type == FieldType::SkipProtected {
            self.numeric = true;
        }
    }

    /// Check if field is protected (including skip fields)
    pub fn is_protected(&self) -> bool {
        self.field_type != FieldType::Unprotected
    }

    /// Check if field is numeric
    pub fn is_numeric(&self) -> bool {
        self.numeric
    }

    pub fn set_numeric(&mut self, numeric: bool) {
        self.numeric = numeric;
    }

    pub fn intensity(&self) -> Intensity {
        self.intensity
    }

    pub fn set_intensity(&mut self, intensity: Intensity) {
        self.intensity = intensity;
    }

    /// Check if field is hidden (non-display)
    pub fn is_hidden(&self) -> bool {
        self.intensity == Intensity::Zero
    }

    /// Check if Modified Data Tag (MDT) is set
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Set the Modified Data Tag (MDT)
    pub fn set_modified(&mut self, modified: bool) {
        self.modified = modified;
    }
}
