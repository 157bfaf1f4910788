//! Unix signal handling (SIGINT).
//!
//! The first SIGINT asks a watching session to stop after its current pass,
//! so pending debug traces still get written.  A second one kills us.

use std::sync::atomic::{AtomicBool, Ordering};

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

#[cfg(unix)]
fn sigint_action(handler: libc::sighandler_t) {
    // Safety: registering a signal handler is libc unsafe code.
    unsafe {
        let mut sa: libc::sigaction = std::mem::zeroed();
        sa.sa_sigaction = handler;
        libc::sigaction(libc::SIGINT, &sa, std::ptr::null_mut());
    }
}

#[cfg(unix)]
extern "C" fn sigint_handler(_sig: libc::c_int) {
    INTERRUPTED.store(true, Ordering::SeqCst);
    sigint_action(libc::SIG_DFL);
}

pub fn register_sigint() {
    #[cfg(unix)]
    sigint_action(sigint_handler as libc::sighandler_t);
}

pub fn interrupted() -> bool {
    INTERRUPTED.load(Ordering::SeqCst)
}
