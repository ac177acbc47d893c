/// Classification for retry policy.
///
/// Used by the resolver to decide what happens after a provider fails.
///
/// | Class | Try Next Provider? | Degraded fallback allowed? |
/// |-------|-------------------|----------------------------|
/// | `Never` | No | No |
/// | `NextProvider` | Yes | Yes, once the chain is exhausted |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Never retry - bad identifier or unknown asset.
    /// Asking a different provider won't change the answer.
    Never,

    /// Try the next provider in the chain.
    ///
    /// Used for rate limiting, upstream outages and local network faults.
    NextProvider,
}
