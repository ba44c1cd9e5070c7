/// Classification for retry policy.
///
/// Used to determine how the feed client should respond to a failed attempt.
///
/// # Behavior Summary
///
/// | Class | Switch Proxy Tier? | Consumes Retry Slot? |
/// |-------|-------------------|----------------------|
/// | `EscalateProxy` | Yes (if a further tier exists) | No |
/// | `WithBackoff` | No | Yes |
/// | `Never` | No | Fails immediately |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Route around the failure through the next proxy tier.
    ///
    /// Used for reachability problems: CORS rejections, network errors,
    /// timeouts and rate limiting. The switch happens immediately, without a
    /// backoff delay. When the request is already on the last tier, the
    /// client treats the error as [`RetryClass::WithBackoff`].
    EscalateProxy,

    /// Retry on the same tier after an exponential, jittered delay.
    WithBackoff,

    /// Never retry - the request itself is broken or already exhausted.
    Never,
}
