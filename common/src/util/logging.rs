use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use indicatif_log_bridge::LogWrapper;
use log::{info, warn, LevelFilter};
use std::future::Future;
use std::sync::OnceLock;
use std::time::{Duration, Instant};

static MULTI: OnceLock<MultiProgress> = OnceLock::new();

pub fn init(log_level: LevelFilter) {
    let logger = env_logger::builder()
        .filter_level(log_level)
        .parse_default_env() // Allow overriding log level through RUST_LOG env var
        .build();
    let level = logger.filter();

    let multi = MULTI.get_or_init(MultiProgress::new).clone();

    if LogWrapper::new(multi, logger).try_init().is_ok() {
        log::set_max_level(level);
    } else {
        warn!(target: "main", "Logger was already initialized");
    }
}

fn spinner(task_desc: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner()
        .with_message(format!("{}...", task_desc));
    if let Ok(style) = ProgressStyle::with_template("{spinner:.white} [{elapsed:.green}] {msg}") {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(100));

    // Set up connection with log library so that progress bars don't jump around
    match MULTI.get() {
        Some(multi) => multi.add(pb),
        None => pb,
    }
}

fn finish(target: &str, task_desc: &str, pb: ProgressBar, start_time: Instant) {
    pb.finish_and_clear();
    if let Some(multi) = MULTI.get() {
        multi.remove(&pb);
    }
    let elapsed = indicatif::HumanDuration(start_time.elapsed());
    info!(target: target, "{} finished (took {})", task_desc, elapsed);
}

pub fn run_with_spinner<'a, F, Out>(
    target: &'a str, task_desc: &'a str, function: F,
) -> Out where
    F: FnOnce() -> Out,
{
    let start_time = Instant::now();
    let pb = spinner(task_desc);

    let out = function();

    finish(target, task_desc, pb, start_time);
    out
}

pub async fn run_with_spinner_async<'a, F, Out>(
    target: &'a str, task_desc: &'a str, future: F,
) -> Out where
    F: Future<Output = Out>,
{
    let start_time = Instant::now();
    let pb = spinner(task_desc);

    let out = future.await;

    finish(target, task_desc, pb, start_time);
    out
}
