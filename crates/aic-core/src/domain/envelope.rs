//! One message consumed from the broker.

/// The body of a consumed broker message plus the metadata the player uses.
///
/// Ownership moves to whichever task forwards or decodes it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Envelope {
    /// Raw message body, forwarded untouched to device endpoints.
    pub body: Vec<u8>,
    /// `true` when the producer set a content-type property.  Recording
    /// requests are only decoded when this hint is present.
    pub has_content_type: bool,
}

impl Envelope {
    pub fn new(body: Vec<u8>, has_content_type: bool) -> Self {
        Self {
            body,
            has_content_type,
        }
    }
}
