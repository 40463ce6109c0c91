
/// Fails the first `failures` calls, then returns the attempt index.
pub fn flaky(
    calls: &std::sync::atomic::AtomicUsize,
    failures: usize,
) -> impl FnMut() -> std::future::Ready<Result<usize, String>> + '_ {
    move || {
        let n = calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        std::future::ready(if n < failures {
            Err(format!("attempt {} failed", n + 1))
        } else {
            Ok(n)
        })
    }
}
