/*!

  Free-form metadata attached to gates, such as their position on the canvas.

*/

/// The key of an attribute on a gate, like `x` or `pinned`
pub type AttributeKey = String;
/// An attribute may carry a string value: `x = 120`
pub type AttributeValue = Option<String>;

/// Key for the horizontal canvas position
pub const POS_X: &str = "x";
/// Key for the vertical canvas position
pub const POS_Y: &str = "y";

#[derive(Debug, Clone, PartialEq, Eq)]
/// An attribute adds presentation information to a gate. Evaluation never reads it.
pub struct Attribute {
    k: AttributeKey,
    v: AttributeValue,
}

impl Attribute {
    /// Create a new attribute pair
    pub fn new(k: AttributeKey, v: AttributeValue) -> Self {
        Self { k, v }
    }

    /// Get the key of the attribute
    pub fn key(&self) -> &AttributeKey {
        &self.k
    }

    /// Get the value of the attribute
    pub fn value(&self) -> &AttributeValue {
        &self.v
    }

    /// Map attribute key-value pairs to the Attribute struct
    pub fn from_pairs(
        iter: impl Iterator<Item = (AttributeKey, AttributeValue)>,
    ) -> impl Iterator<Item = Self> {
        iter.map(|(k, v)| Self::new(k, v))
    }
}

impl std::fmt::Display for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(value) = &self.v {
            write!(f, "(* {} = \"{}\" *)", self.k, value)
        } else {
            write!(f, "(* {} *)", self.k)
        }
    }
}

/// Parses a canvas position out of the `x`/`y` attributes of a gate.
pub fn position(attrs: impl Iterator<Item = Attribute>) -> Option<(i64, i64)> {
    let mut x = None;
    let mut y = None;
    for attr in attrs {
        let parsed = attr.value().as_deref().and_then(|v| v.parse::<i64>().ok());
        match attr.key().as_str() {
            POS_X => x = parsed,
            POS_Y => y = parsed,
            _ => (),
        }
    }
    Some((x?, y?))
}
