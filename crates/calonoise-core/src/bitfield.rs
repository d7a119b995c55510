//! Cell identifier bit fields.
//!
//! A readout packs several indices (system, layer, eta bin, phi bin, ...)
//! into one 64-bit cell id. The layout is given as a comma-separated list:
//!
//! - `name:width` places the field right after the previous one,
//! - `name:offset:width` places it at an explicit bit offset,
//! - a negative width marks a signed (two's complement) field.
//!
//! `"system:4,layer:8,eta:9,phi:-10"` is a 31-bit layout with a signed phi index.

use crate::error::{NoiseError, Result};

/// One named field inside a cell id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitField {
    pub name: String,
    pub offset: u32,
    pub width: u32,
    pub signed: bool,
}

impl BitField {
    fn low_mask(&self) -> u64 {
        if self.width == 64 {
            u64::MAX
        } else {
            (1u64 << self.width) - 1
        }
    }

    fn min_value(&self) -> i64 {
        if self.signed {
            if self.width == 64 {
                i64::MIN
            } else {
                -(1i64 << (self.width - 1))
            }
        } else {
            0
        }
    }

    fn max_value(&self) -> i64 {
        match (self.signed, self.width) {
            (true, w) => ((1u64 << (w - 1)) - 1) as i64,
            (false, 64) => i64::MAX,
            (false, w) => ((1u64 << w) - 1) as i64,
        }
    }

    /// Extract this field from `id`.
    pub fn value(&self, id: u64) -> i64 {
        let raw = (id >> self.offset) & self.low_mask();
        if self.signed && self.width < 64 && raw & (1u64 << (self.width - 1)) != 0 {
            (raw | !self.low_mask()) as i64
        } else {
            raw as i64
        }
    }

    /// Write `value` into this field of `id`.
    pub fn insert(&self, id: u64, value: i64) -> Result<u64> {
        if value < self.min_value() || value > self.max_value() {
            return Err(NoiseError::BitField(format!(
                "value {value} does not fit field {} ({}{} bits)",
                self.name,
                if self.signed { "signed " } else { "" },
                self.width
            )));
        }
        let mask = self.low_mask() << self.offset;
        Ok((id & !mask) | (((value as u64) & self.low_mask()) << self.offset))
    }
}

/// Decoder for a cell id layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitFieldCoder {
    description: String,
    fields: Vec<BitField>,
}

impl BitFieldCoder {
    /// Parse a layout description.
    pub fn new(description: &str) -> Result<Self> {
        let mut fields: Vec<BitField> = Vec::new();
        let mut next_offset: u32 = 0;
        let mut used: u64 = 0;

        for element in description.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let parts: Vec<&str> = element.split(':').map(str::trim).collect();
            let (name, offset, width) = match parts.as_slice() {
                [name, width] => (*name, next_offset, parse_width(element, width)?),
                [name, offset, width] => {
                    let offset = offset.parse::<u32>().map_err(|_| {
                        NoiseError::BitField(format!("bad offset in '{element}'"))
                    })?;
                    (*name, offset, parse_width(element, width)?)
                }
                _ => {
                    return Err(NoiseError::BitField(format!(
                        "cannot parse field '{element}', expected name:width or name:offset:width"
                    )));
                }
            };
            let (width, signed) = (width.unsigned_abs(), width < 0);
            if name.is_empty() {
                return Err(NoiseError::BitField(format!("empty field name in '{element}'")));
            }
            if width == 0 || offset.checked_add(width).is_none_or(|end| end > 64) {
                return Err(NoiseError::BitField(format!(
                    "field '{name}' at offset {offset} with width {width} does not fit 64 bits"
                )));
            }
            if fields.iter().any(|f| f.name == name) {
                return Err(NoiseError::BitField(format!("duplicate field '{name}'")));
            }
            let field = BitField {
                name: name.to_string(),
                offset,
                width,
                signed,
            };
            let mask = field.low_mask() << offset;
            if used & mask != 0 {
                return Err(NoiseError::BitField(format!(
                    "field '{name}' overlaps another field"
                )));
            }
            used |= mask;
            next_offset = offset + width;
            fields.push(field);
        }

        if fields.is_empty() {
            return Err(NoiseError::BitField(format!(
                "no fields in description '{description}'"
            )));
        }
        Ok(Self {
            description: description.to_string(),
            fields,
        })
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn fields(&self) -> &[BitField] {
        &self.fields
    }

    /// Position of a field, for repeated decoding without name lookups.
    pub fn index(&self, name: &str) -> Result<usize> {
        self.fields
            .iter()
            .position(|f| f.name == name)
            .ok_or_else(|| {
                NoiseError::BitField(format!(
                    "no field '{name}' in id specification '{}'",
                    self.description
                ))
            })
    }

    /// Decode the field at `index` (see [`index`](Self::index)).
    pub fn get_at(&self, id: u64, index: usize) -> i64 {
        self.fields[index].value(id)
    }

    /// Decode a field by name.
    pub fn get(&self, id: u64, name: &str) -> Result<i64> {
        Ok(self.get_at(id, self.index(name)?))
    }

    /// Return `id` with field `name` replaced by `value`.
    pub fn set(&self, id: u64, name: &str, value: i64) -> Result<u64> {
        self.fields[self.index(name)?].insert(id, value)
    }

    /// Build an id from `(field, value)` pairs; unspecified fields are 0.
    pub fn encode(&self, values: &[(&str, i64)]) -> Result<u64> {
        values
            .iter()
            .try_fold(0u64, |id, (name, value)| self.set(id, name, *value))
    }

    /// Human-readable `field:value` rendering of an id.
    pub fn value_string(&self, id: u64) -> String {
        self.fields
            .iter()
            .map(|f| format!("{}:{}", f.name, f.value(id)))
            .collect::<Vec<_>>()
            .join(",")
    }
}

fn parse_width(element: &str, width: &str) -> Result<i32> {
    width
        .parse::<i32>()
        .map_err(|_| NoiseError::BitField(format!("bad width in '{element}'")))
}
