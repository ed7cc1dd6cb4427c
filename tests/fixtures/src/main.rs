//! Inferior driven by the live debugger tests.
//!
//! Given a path argument, it writes the address of `breakpoint_target`
//! there before stopping itself, so a test knows where to put a breakpoint.
//! It exits 0 only if `breakpoint_target` still computes the right answer.
use std::hint::black_box;

#[inline(never)]
#[no_mangle]
pub extern "C" fn breakpoint_target(x: u64) -> u64 {
    black_box(x).wrapping_mul(3)
}

fn main() {
    if let Some(path) = std::env::args().nth(1) {
        let address = breakpoint_target as usize;
        if std::fs::write(&path, format!("{address:#x}")).is_err() {
            std::process::exit(2);
        }
    }

    println!("MINIDBG_FIXTURE_READY");

    // Stop so the debugger gets a stop inside our own code after exec.
    unsafe {
        libc::raise(libc::SIGSTOP);
    }

    let answer = black_box(breakpoint_target as extern "C" fn(u64) -> u64)(black_box(14));
    std::process::exit(if answer == 42 { 0 } else { 1 });
}
