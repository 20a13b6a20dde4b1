use anyhow::{Result, anyhow, bail};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A Kubernetes resource quantity (`"2"`, `"500m"`, `"8Gi"`, `"1e3"`).
///
/// The original text is kept verbatim so a manifest serializes back exactly
/// as it was written. Numeric views are computed on demand.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Quantity(String);

/// Exact value of a parsed quantity as `num / den`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Ratio {
    num: u128,
    den: u128,
}

impl Quantity {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// CPU in millicores (1000 = 1 core). Fractional millicores round up.
    pub fn cpu_millis(&self) -> Result<u64> {
        self.in_units(1000)
    }

    /// Memory in bytes. Fractional bytes round up.
    pub fn bytes(&self) -> Result<u64> {
        self.in_units(1)
    }

    /// A whole, non-negative count (e.g. number of pods).
    pub fn count(&self) -> Result<u64> {
        let ratio = parse(&self.0)?;
        if ratio.num % ratio.den != 0 {
            bail!("quantity '{}' is not a whole number", self.0);
        }
        to_u64(ratio.num / ratio.den, &self.0)
    }

    fn in_units(&self, per_unit: u128) -> Result<u64> {
        let ratio = parse(&self.0)?;
        let scaled = ratio
            .num
            .checked_mul(per_unit)
            .ok_or_else(|| overflow(&self.0))?;
        to_u64(scaled.div_ceil(ratio.den), &self.0)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for Quantity {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

fn overflow(text: &str) -> anyhow::Error {
    anyhow!("quantity '{}' is too large", text)
}

fn to_u64(value: u128, text: &str) -> Result<u64> {
    u64::try_from(value).map_err(|_| overflow(text))
}

/// Parse `<sign?><digits>[.<digits>]<suffix?>` into an exact ratio.
fn parse(text: &str) -> Result<Ratio> {
    let s = text;
    if s.is_empty() {
        bail!("quantity must not be empty");
    }
    if s.trim() != s {
        bail!("quantity '{}' must not have surrounding whitespace", text);
    }
    if s.starts_with('-') {
        bail!("quantity '{}' must not be negative", text);
    }
    let s = s.strip_prefix('+').unwrap_or(s);

    let split = s
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(s.len());
    let (number, suffix) = s.split_at(split);

    let (int_part, frac_part) = number.split_once('.').unwrap_or((number, ""));
    if int_part.is_empty() && frac_part.is_empty() {
        bail!("quantity '{}' has no numeric part", text);
    }
    if frac_part.contains('.') {
        bail!("quantity '{}' has more than one decimal point", text);
    }

    let mut num: u128 = 0;
    for c in int_part.chars().chain(frac_part.chars()) {
        let digit = u128::from(c as u8 - b'0');
        num = num
            .checked_mul(10)
            .and_then(|n| n.checked_add(digit))
            .ok_or_else(|| overflow(text))?;
    }
    let den = pow(10, frac_part.len() as u32, text)?;
    let ratio = Ratio { num, den };

    apply_suffix(ratio, suffix, text)
}

fn pow(base: u128, exp: u32, text: &str) -> Result<u128> {
    base.checked_pow(exp).ok_or_else(|| overflow(text))
}

fn apply_suffix(ratio: Ratio, suffix: &str, text: &str) -> Result<Ratio> {
    let scale = |factor: u128| -> Result<Ratio> {
        Ok(Ratio {
            num: ratio.num.checked_mul(factor).ok_or_else(|| overflow(text))?,
            den: ratio.den,
        })
    };

    match suffix {
        "" => Ok(ratio),
        "m" => Ok(Ratio {
            num: ratio.num,
            den: ratio.den.checked_mul(1000).ok_or_else(|| overflow(text))?,
        }),
        "k" => scale(pow(10, 3, text)?),
        "M" => scale(pow(10, 6, text)?),
        "G" => scale(pow(10, 9, text)?),
        "T" => scale(pow(10, 12, text)?),
        "P" => scale(pow(10, 15, text)?),
        "E" => scale(pow(10, 18, text)?),
        "Ki" => scale(1 << 10),
        "Mi" => scale(1 << 20),
        "Gi" => scale(1 << 30),
        "Ti" => scale(1 << 40),
        "Pi" => scale(1 << 50),
        "Ei" => scale(1 << 60),
        _ => {
            let exponent = suffix
                .strip_prefix(['e', 'E'])
                .and_then(|e| e.parse::<i32>().ok())
                .ok_or_else(|| anyhow!("quantity '{}' has unknown suffix '{}'", text, suffix))?;
            let factor = pow(10, exponent.unsigned_abs(), text)?;
            if exponent >= 0 {
                scale(factor)
            } else {
                Ok(Ratio {
                    num: ratio.num,
                    den: ratio.den.checked_mul(factor).ok_or_else(|| overflow(text))?,
                })
            }
        }
    }
}

// --- serde ---

impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

struct QuantityVisitor;

impl<'de> Visitor<'de> for QuantityVisitor {
    type Value = Quantity;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a quantity string or number")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Quantity, E> {
        Ok(Quantity::new(v))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Quantity, E> {
        Ok(Quantity(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Quantity, E> {
        Ok(Quantity(v.to_string()))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Quantity, E> {
        Ok(Quantity(v.to_string()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Quantity, E> {
        Ok(Quantity(v.to_string()))
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(QuantityVisitor)
    }
}
