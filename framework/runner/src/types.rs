/// Recommended error type for your suite `main` function and any shared code that you write for
/// hooks. This type is compatible with the [crate::definition::HookResult] type so you can use `?`
/// to propagate errors.
pub type InfraTunnelResult<T> = anyhow::Result<T>;
