use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::{BridgeError, BridgeResult};

const GRADIENT_PREFIX: &str = "linear-gradient";

/// An RGB colour parsed from a `#rrggbb` code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub [u8; 3]);

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "#{r:02x}{g:02x}{b:02x}")
    }
}

/// A background descriptor the external tool knows how to paint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Background {
    /// Fill the removed region with one colour.
    Solid(Rgb),
    /// Vertical blend from the first to the second colour of the descriptor.
    LinearGradient { start: Rgb, end: Rgb },
}

impl Background {
    /// Classify a descriptor the same way the tool does.
    ///
    /// Values starting with `linear-gradient` need at least two `#rrggbb` codes and use the
    /// first two. Anything else needs at least one code and uses the first.
    pub fn parse(value: &str) -> BridgeResult<Self> {
        let trimmed = value.trim();
        let mut colors = hex_colors(trimmed);

        if trimmed.starts_with(GRADIENT_PREFIX) {
            match (colors.next(), colors.next()) {
                (Some(start), Some(end)) => Ok(Self::LinearGradient { start, end }),
                _ => Err(invalid(
                    value,
                    "gradient background requires at least two hex colors",
                )),
            }
        } else {
            colors.next().map(Self::Solid).ok_or_else(|| {
                invalid(
                    value,
                    "use a hex color code like #ffffff or a linear-gradient(...)",
                )
            })
        }
    }
}

/// `#` followed by six hex digits, anywhere in the descriptor.
static HEX_COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#([0-9a-fA-F]{6})").expect("hex colour pattern is valid"));

/// Colour codes in the order they appear, left to right.
fn hex_colors(value: &str) -> impl Iterator<Item = Rgb> + '_ {
    HEX_COLOR
        .captures_iter(value)
        .filter_map(|captures| captures.get(1))
        .filter_map(|digits| parse_hex(digits.as_str()))
}

fn parse_hex(digits: &str) -> Option<Rgb> {
    let value = u32::from_str_radix(digits, 16).ok()?;
    let [_, r, g, b] = value.to_be_bytes();
    Some(Rgb([r, g, b]))
}

fn invalid(value: &str, reason: &str) -> BridgeError {
    BridgeError::InvalidBackground {
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
