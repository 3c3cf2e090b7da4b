//! Programming-error checks with a build-selected mode
//!
//! Checks halt the program when enabled and compile to nothing otherwise.
//! They are enabled in debug builds and in any build with the `checked`
//! feature. Turning them off changes observable behaviour: a violated check
//! no longer panics, and the arena falls back to clamping its cursor.

/// Whether programming-error checks are active in this build.
pub const ENABLED: bool = cfg!(any(debug_assertions, feature = "checked"));

/// Halt with `message` if `condition` is false and checks are enabled.
#[inline(always)]
#[track_caller]
pub fn check(condition: bool, message: &str) {
    if ENABLED && !condition {
        violated(message);
    }
}

#[cold]
#[inline(never)]
#[track_caller]
fn violated(message: &str) -> ! {
    tracing::error!(target: "pagearena::checks", reason = message, "programming error");
    panic!("arena programming error: {message}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passing_check_is_silent() {
        check(true, "never fires");
    }

    #[test]
    #[cfg_attr(not(any(debug_assertions, feature = "checked")), ignore)]
    #[should_panic(expected = "arena programming error: boom")]
    fn failing_check_halts_when_enabled() {
        check(false, "boom");
    }

    #[test]
    #[cfg_attr(any(debug_assertions, feature = "checked"), ignore)]
    fn failing_check_is_noop_when_disabled() {
        check(false, "compiled out");
    }
}
