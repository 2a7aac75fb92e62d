/// Advice to the host on how to react to a failed bar lookup.
///
/// The converters never retry on their own; the host reads this
/// classification and decides whether to fall back, back off or abort.
///
/// | Class | Try another provider? | Retry same provider later? |
/// |-------|-----------------------|----------------------------|
/// | `NextProvider` | Yes | No |
/// | `WithBackoff` | Yes | Yes |
/// | `Never` | No | No |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// The provider does not know the asset. Another provider may.
    NextProvider,

    /// Transport failure or a non-zero provider status.
    ///
    /// The same request may succeed once the provider recovers, so the host
    /// can back off and retry, or fail over in the meantime.
    WithBackoff,

    /// Malformed or unexpected response shape.
    ///
    /// Usually a provider contract change; retrying won't help until someone
    /// looks at it.
    Never,
}
