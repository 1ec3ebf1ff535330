use env_logger::Env;

pub const TRACING_ENV: &str = "FUZZY_MERGE_TRACING";

pub fn tracing_requested() -> bool {
    std::env::var(TRACING_ENV)
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

pub fn init_tracing_from_env() {
    // Bridge log:: macros into tracing so existing code keeps working
    let _ = tracing_log::LogTracer::init();
    // Configure subscriber from RUST_LOG or default to info
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_level(true)
        .with_thread_names(true)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// env_logger by default; the tracing subscriber when `FUZZY_MERGE_TRACING` is set.
pub fn init_logging() {
    if tracing_requested() {
        init_tracing_from_env();
    } else {
        let _ = env_logger::Builder::from_env(Env::default().default_filter_or("info"))
            .try_init();
    }
}
