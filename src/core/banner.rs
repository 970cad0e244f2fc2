//! Startup banner

use super::config::BackpressurePolicy;

pub fn print_banner(host: &str, port: u16, policy: BackpressurePolicy) {
    println!();
    println!(
        "  \x1b[1m\x1b[36mfanout\x1b[0m \x1b[90mv{}\x1b[0m",
        env!("CARGO_PKG_VERSION")
    );
    println!();
    println!(
        "  \x1b[32m➜\x1b[0m  \x1b[1m{:<14}\x1b[0m http://{}:{}",
        "Admin HTTP:", host, port
    );
    println!(
        "  \x1b[32m➜\x1b[0m  \x1b[1m{:<14}\x1b[0m ws://{}:{}/ws",
        "Sessions:", host, port
    );
    println!(
        "  \x1b[32m➜\x1b[0m  \x1b[1m{:<14}\x1b[0m {}",
        "Backpressure:", policy
    );
    println!();
}
