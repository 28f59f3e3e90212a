/// A generic boxed error type.
pub type AnyError = Box<dyn std::error::Error + Send + Sync>;

/// A convenient Result alias returning `AnyError`.
pub type AnyResult<T> = std::result::Result<T, AnyError>;

/// Stable identifier of one playable item on the upstream platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct MediaId(pub String);

impl MediaId {
    /// Accepts a bare id or any of the common watch URL shapes.
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        let id = if let Some(rest) = split_after(input, "v=") {
            rest.split(['&', '#']).next()
        } else if let Some(rest) = ["youtu.be/", "/shorts/", "/live/", "/embed/"]
            .iter()
            .find_map(|marker| split_after(input, marker))
        {
            rest.split(['?', '&', '/', '#']).next()
        } else {
            Some(input)
        }?;

        if id.is_empty() || id.chars().any(char::is_whitespace) {
            return None;
        }
        Some(Self(id.to_string()))
    }
}

impl From<String> for MediaId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::ops::Deref for MediaId {
    type Target = str;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Display for MediaId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of an ordered collection (playlist, mix) on the upstream platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ListingId(pub String);

impl ListingId {
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        let id = match split_after(input, "list=") {
            Some(rest) => rest.split(['&', '#']).next()?,
            None => input,
        };

        if id.is_empty() || id.chars().any(char::is_whitespace) {
            return None;
        }
        Some(Self(id.to_string()))
    }
}

impl From<String> for ListingId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::ops::Deref for ListingId {
    type Target = str;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Display for ListingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn split_after<'a>(input: &'a str, marker: &str) -> Option<&'a str> {
    input.find(marker).map(|idx| &input[idx + marker.len()..])
}
